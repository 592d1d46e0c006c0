use eframe::egui::{self, Button, RichText, TextEdit, Widget};

use crate::{
    alarm::{AlarmController, Status},
    audio::AudioOutput,
};

/// The controls under the face: time field, enabled checkbox, stop button and
/// status line.
#[derive(Debug, Default)]
pub struct AlarmPanel {
    text: String,
}

impl AlarmPanel {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Re-reads the time field into the controller, done whenever the panel
    /// is shown again. An empty field is an invalid time like any other and
    /// clears the target.
    pub fn apply<A: AudioOutput>(&self, alarm: &mut AlarmController<A>) {
        // a bad time is reported through the status line
        let _ = alarm.set_target(&self.text);
    }

    pub fn show<A: AudioOutput>(&mut self, ui: &mut egui::Ui, alarm: &mut AlarmController<A>) {
        ui.horizontal(|ui| {
            ui.label("Alarm");
            if TextEdit::singleline(&mut self.text)
                .hint_text("07:00")
                .desired_width(60.0)
                .char_limit(8)
                .ui(&mut *ui)
                .lost_focus()
            {
                let _ = alarm.set_target(&self.text);
            }

            let mut enabled = alarm.state().armed();
            if ui.checkbox(&mut enabled, "enabled").changed() {
                if enabled {
                    alarm.arm(&self.text);
                } else if alarm.stop_enabled() {
                    // unchecking while ringing is the same as pressing stop
                    alarm.stop();
                } else {
                    alarm.disarm();
                }
            }

            if ui
                .add_enabled(alarm.stop_enabled(), Button::new("stop"))
                .clicked()
            {
                alarm.stop();
            }
        });

        let status = alarm.status();
        let text = RichText::new(status.to_string()).small();
        ui.label(match status {
            Status::InvalidFormat => text.color(ui.visuals().warn_fg_color),
            Status::Ringing(_) => text.strong(),
            _ => text,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{
        tests::{controller, ALL_SOUNDS},
        AlarmTime,
    };

    #[test]
    fn applying_a_time_sets_the_target() {
        let (mut alarm, _audio) = controller(ALL_SOUNDS);
        AlarmPanel::new("6:45").apply(&mut alarm);
        assert_eq!(alarm.state().target(), AlarmTime::new(6, 45));
        assert_eq!(alarm.status(), Status::TargetSet(AlarmTime::new(6, 45).unwrap()));
    }

    #[test]
    fn applying_an_empty_field_clears_the_target() {
        let (mut alarm, _audio) = controller(ALL_SOUNDS);
        assert!(alarm.arm("07:00"));
        AlarmPanel::default().apply(&mut alarm);
        assert_eq!(alarm.state().target(), None);
        assert!(!alarm.state().armed());
        assert_eq!(alarm.status(), Status::InvalidFormat);
    }
}
