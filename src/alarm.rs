//! The one-shot alarm.
//!
//! ```text
//!             arm()               check() matches
//!  Unarmed ──────────► Armed ─────────────────────► Ringing
//!     ▲                  │                             │
//!     └──── disarm() ────┘                             │
//!     ▲                                                │
//!     └─────────────── stop() / disarm() ──────────────┘
//! ```
//!
//! - **Unarmed:** nothing will ring. A target may still be set.
//! - **Armed:** a valid target is set and [`AlarmController::check`] compares it
//!   against the wall clock every tick.
//! - **Ringing:** the alarm sound is looping. Stopping it also disarms, the
//!   alarm has to be armed again to ring the next day.
//!
//! A fire is remembered for [`DEBOUNCE_SECONDS`] so the matching minute can't
//! ring twice, whatever happens to the armed and ringing flags in between.

use std::{fmt, rc::Rc, str::FromStr};

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use log::{error, info, warn};
use thiserror::Error;

use crate::{
    assets::{AssetKind, AssetRequest, AssetResolver, ResolvedAsset, Trace},
    audio::{AudioOutput, PlaybackError},
    notice::Notice,
    selection::{AssetCategory, VARIANTS},
};

pub const DEBOUNCE_SECONDS: i64 = 60;

/// An hour and minute of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlarmTime {
    hour: u32,
    minute: u32,
}

impl AlarmTime {
    #[must_use]
    pub const fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    #[must_use]
    pub const fn hour(self) -> u32 {
        self.hour
    }

    #[must_use]
    pub const fn minute(self) -> u32 {
        self.minute
    }

    /// whether `time` is inside this minute
    pub fn matches(self, time: &impl Timelike) -> bool {
        time.hour() == self.hour && time.minute() == self.minute
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("expected HH:MM")]
    Format,
    #[error("hour {0} is out of range")]
    Hour(u32),
    #[error("minute {0} is out of range")]
    Minute(u32),
    #[error("second {0} is out of range")]
    Second(u32),
}

impl FromStr for AlarmTime {
    type Err = TimeParseError;

    /// `H:M` or `H:M:S` with one or two digits per field. Seconds are
    /// checked and then dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s
            .trim()
            .split(':')
            .map(parse_field)
            .collect::<Result<Vec<_>, _>>()?;
        let (hour, minute, second) = match fields[..] {
            [hour, minute] => (hour, minute, 0),
            [hour, minute, second] => (hour, minute, second),
            _ => return Err(TimeParseError::Format),
        };
        if hour > 23 {
            return Err(TimeParseError::Hour(hour));
        }
        if minute > 59 {
            return Err(TimeParseError::Minute(minute));
        }
        if second > 59 {
            return Err(TimeParseError::Second(second));
        }
        Ok(Self { hour, minute })
    }
}

fn parse_field(field: &str) -> Result<u32, TimeParseError> {
    if (1..=2).contains(&field.len()) && field.bytes().all(|b| b.is_ascii_digit()) {
        field.parse().map_err(|_| TimeParseError::Format)
    } else {
        Err(TimeParseError::Format)
    }
}

/// the line shown under the alarm controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Unset,
    TargetSet(AlarmTime),
    Armed(AlarmTime),
    Ringing(AlarmTime),
    InvalidFormat,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "alarm unset"),
            Self::TargetSet(time) => write!(f, "alarm set for {time}"),
            Self::Armed(time) => write!(f, "alarm armed for {time}"),
            Self::Ringing(time) => write!(f, "alarm ringing ({time}), press stop"),
            Self::InvalidFormat => write!(f, "invalid time format (e.g. 07:00 / 18:30)"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SoundLoadError {
    #[error("couldn't find {request}:\n{trace}")]
    Unresolved { request: AssetRequest, trace: Trace },
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Everything the alarm knows. Only [`AlarmController`] changes it.
#[derive(Debug)]
pub struct AlarmState<H> {
    armed: bool,
    target: Option<AlarmTime>,
    ringing: bool,
    last_triggered_at: Option<NaiveDateTime>,
    active_audio: Option<H>,
}

impl<H> Default for AlarmState<H> {
    fn default() -> Self {
        Self {
            armed: false,
            target: None,
            ringing: false,
            last_triggered_at: None,
            active_audio: None,
        }
    }
}

impl<H> AlarmState<H> {
    #[must_use]
    pub const fn armed(&self) -> bool {
        self.armed
    }

    #[must_use]
    pub const fn target(&self) -> Option<AlarmTime> {
        self.target
    }

    #[must_use]
    pub const fn ringing(&self) -> bool {
        self.ringing
    }

    #[must_use]
    pub const fn last_triggered_at(&self) -> Option<NaiveDateTime> {
        self.last_triggered_at
    }

    #[must_use]
    pub const fn active_audio(&self) -> Option<&H> {
        self.active_audio.as_ref()
    }
}

pub struct AlarmController<A: AudioOutput> {
    state: AlarmState<A::Handle>,
    audio: A,
    resolver: Rc<AssetResolver>,
    selected_sound: usize,
    /// which variant `state.active_audio` was loaded from
    loaded_sound: Option<usize>,
    status: Status,
    notices: Vec<Notice>,
    /// the target and time of the last failed fire that was reported
    reported_failure: Option<(AlarmTime, NaiveDateTime)>,
}

impl<A: AudioOutput> AlarmController<A> {
    #[must_use]
    pub fn new(audio: A, resolver: Rc<AssetResolver>, sound: usize) -> Self {
        Self {
            state: AlarmState::default(),
            audio,
            resolver,
            selected_sound: sound.min(VARIANTS - 1),
            loaded_sound: None,
            status: Status::Unset,
            notices: Vec::new(),
            reported_failure: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &AlarmState<A::Handle> {
        &self.state
    }

    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// the manual stop control is only usable while ringing
    #[must_use]
    pub const fn stop_enabled(&self) -> bool {
        self.state.ringing
    }

    #[must_use]
    pub const fn selected_sound(&self) -> usize {
        self.selected_sound
    }

    /// notices queued since the last call, oldest first
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Loads the selected sound ahead of time so the first fire doesn't have
    /// to.
    pub fn preload(&mut self) -> bool {
        match self.load_selected() {
            Ok(()) => true,
            Err(e) => {
                warn!("{e}");
                self.report(Notice::warning("Couldn't load alarm sound", e.to_string()));
                false
            }
        }
    }

    /// Parses `text` as the alarm time.
    ///
    /// An invalid time clears the target, and since an armed alarm needs one it
    /// disarms as well.
    ///
    /// # Errors
    /// if `text` isn't a valid `HH:MM` time
    pub fn set_target(&mut self, text: &str) -> Result<AlarmTime, TimeParseError> {
        match text.parse::<AlarmTime>() {
            Ok(target) => {
                self.state.target = Some(target);
                self.refresh_status();
                info!("alarm target set to {target}");
                Ok(target)
            }
            Err(e) => {
                warn!("invalid alarm time {text:?}: {e}");
                if self.state.armed {
                    self.disarm();
                }
                self.state.target = None;
                self.status = Status::InvalidFormat;
                Err(e)
            }
        }
    }

    /// Sets the target from `text` and arms. Returns false and stays unarmed if
    /// `text` isn't a valid time.
    pub fn arm(&mut self, text: &str) -> bool {
        let Ok(target) = self.set_target(text) else {
            return false;
        };
        self.state.armed = true;
        self.refresh_status();
        info!("alarm armed for {target}");
        true
    }

    pub fn disarm(&mut self) {
        if self.state.ringing {
            self.halt_playback();
            self.state.ringing = false;
        }
        self.state.armed = false;
        self.state.target = None;
        self.state.last_triggered_at = None;
        self.status = Status::Unset;
        info!("alarm disarmed");
    }

    /// Called every tick. Returns true if the alarm started ringing.
    pub fn check(&mut self, now: NaiveDateTime) -> bool {
        if !self.state.armed || self.state.ringing {
            return false;
        }
        let Some(target) = self.state.target else {
            return false;
        };
        if !target.matches(&now) {
            return false;
        }
        // the comparison is per minute, so without this every tick of the minute would fire
        if let Some(last) = self.state.last_triggered_at {
            if now.signed_duration_since(last) < TimeDelta::seconds(DEBOUNCE_SECONDS) {
                return false;
            }
        }
        self.fire(now)
    }

    /// Starts the alarm sound looping. Nothing changes if the sound can't be
    /// loaded or played, the failure is reported as a notice instead.
    ///
    /// A failed fire is retried on every tick of the minute but only reported
    /// once per target within [`DEBOUNCE_SECONDS`].
    pub fn fire(&mut self, now: NaiveDateTime) -> bool {
        let queued = self.notices.len();
        let fired = self.try_fire(now);
        if fired {
            self.reported_failure = None;
        } else if self.notices.len() > queued {
            if self.failure_reported(now) {
                self.notices.truncate(queued);
            } else if let Some(target) = self.state.target {
                self.reported_failure = Some((target, now));
            }
        }
        fired
    }

    fn failure_reported(&self, now: NaiveDateTime) -> bool {
        self.reported_failure.is_some_and(|(target, at)| {
            self.state.target == Some(target)
                && now.signed_duration_since(at) < TimeDelta::seconds(DEBOUNCE_SECONDS)
        })
    }

    fn try_fire(&mut self, now: NaiveDateTime) -> bool {
        if !self.state.armed || self.state.ringing {
            warn!("refusing to fire an alarm that is unarmed or already ringing");
            return false;
        }
        if !self.ensure_sound() {
            return false;
        }
        let Some(handle) = self.state.active_audio.as_ref() else {
            return false;
        };
        if let Err(e) = self.audio.play_looping(handle) {
            error!("couldn't play the alarm: {e}");
            self.report(Notice::error("Alarm playback error", e.to_string()));
            return false;
        }
        self.state.ringing = true;
        self.state.last_triggered_at = Some(now);
        self.refresh_status();
        info!("alarm ringing at {now}");
        true
    }

    /// Silences a ringing alarm and disarms it.
    pub fn stop(&mut self) -> bool {
        if !self.state.ringing {
            return false;
        }
        self.halt_playback();
        self.state.ringing = false;
        self.state.armed = false;
        self.refresh_status();
        info!("alarm stopped");
        true
    }

    /// Switches to sound variant `index`, loading it right away.
    ///
    /// A ringing alarm keeps ringing with the new sound. If the new sound can't
    /// be loaded a ringing alarm goes quiet, otherwise the old sound stays
    /// loaded for the next fire.
    pub fn reload_active_sound(&mut self, index: usize) -> bool {
        if index >= VARIANTS {
            warn!("there is no alarm sound {index}");
            return false;
        }
        let was_ringing = self.state.ringing;
        if was_ringing {
            self.halt_playback();
        }
        self.selected_sound = index;
        if let Err(e) = self.load_selected() {
            if was_ringing {
                self.state.ringing = false;
                self.refresh_status();
                error!("alarm silenced, {e}");
                self.report(Notice::error(
                    "Alarm stopped",
                    format!("the new alarm sound couldn't be loaded\n{e}"),
                ));
            } else {
                warn!("{e}");
                self.report(Notice::warning("Couldn't load alarm sound", e.to_string()));
            }
            return false;
        }
        if was_ringing {
            if let Some(handle) = self.state.active_audio.as_ref() {
                if let Err(e) = self.audio.play_looping(handle) {
                    self.state.ringing = false;
                    self.refresh_status();
                    error!("couldn't resume the alarm: {e}");
                    self.report(Notice::error("Alarm playback error", e.to_string()));
                    return false;
                }
            }
        }
        true
    }

    /// Stops and releases the sound. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.state.active_audio.take() {
            self.audio.stop(&handle);
            self.audio.dispose(handle);
        }
        self.state.ringing = false;
        self.loaded_sound = None;
    }

    fn ensure_sound(&mut self) -> bool {
        if self.state.active_audio.is_some() && self.loaded_sound == Some(self.selected_sound) {
            return true;
        }
        match self.load_selected() {
            Ok(()) => true,
            Err(e) if self.state.active_audio.is_some() => {
                warn!("{e}, keeping the previous alarm sound");
                self.report(Notice::warning(
                    "Couldn't load alarm sound",
                    format!("{e}\nthe previous sound is used instead"),
                ));
                true
            }
            Err(e) => {
                error!("{e}");
                self.report(Notice::error("Couldn't load alarm sound", e.to_string()));
                false
            }
        }
    }

    fn load_selected(&mut self) -> Result<(), SoundLoadError> {
        let request = AssetCategory::AlarmSound.request(self.selected_sound);
        let resolution = self.resolver.resolve(&request, AssetKind::AudioBytes);
        let Some(bytes) = resolution.asset.and_then(ResolvedAsset::into_audio) else {
            return Err(SoundLoadError::Unresolved {
                request,
                trace: resolution.trace,
            });
        };
        let handle = self.audio.load(bytes)?;
        if let Some(previous) = self.state.active_audio.replace(handle) {
            self.audio.stop(&previous);
            self.audio.dispose(previous);
        }
        self.loaded_sound = Some(self.selected_sound);
        Ok(())
    }

    fn halt_playback(&mut self) {
        if let Some(handle) = self.state.active_audio.as_ref() {
            self.audio.stop(handle);
        }
    }

    fn refresh_status(&mut self) {
        self.status = match self.state.target {
            Some(time) if self.state.ringing => Status::Ringing(time),
            Some(time) if self.state.armed => Status::Armed(time),
            Some(time) => Status::TargetSet(time),
            None => Status::Unset,
        };
    }

    fn report(&mut self, notice: Notice) {
        // the same failure repeats every tick while its minute lasts
        if self.notices.last() != Some(&notice) {
            self.notices.push(notice);
        }
    }
}

impl<A: AudioOutput> Drop for AlarmController<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A fake device and a sound source shared with the other modules' tests.
#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, collections::HashMap};

    use chrono::NaiveDate;

    use super::*;
    use crate::{
        assets::SourceKind,
        notice::Severity,
        sources::{AssetSource, SourceError},
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Load(String),
        Play(String),
        Stop(String),
        Dispose(String),
    }

    #[derive(Default)]
    struct Device {
        calls: Vec<Call>,
        names: HashMap<u64, String>,
        playing: Vec<u64>,
        fail_play: bool,
    }

    #[derive(Clone, Default)]
    pub(crate) struct FakeAudio(Rc<RefCell<Device>>);

    impl FakeAudio {
        fn playing(&self) -> Vec<String> {
            let device = self.0.borrow();
            device
                .playing
                .iter()
                .map(|id| device.names[id].clone())
                .collect()
        }

        fn calls(&self) -> Vec<Call> {
            self.0.borrow().calls.clone()
        }

        pub(crate) fn plays(&self) -> usize {
            self.calls()
                .iter()
                .filter(|call| matches!(call, Call::Play(_)))
                .count()
        }
    }

    impl AudioOutput for FakeAudio {
        type Handle = u64;

        fn load(&mut self, bytes: Vec<u8>) -> Result<u64, PlaybackError> {
            let mut device = self.0.borrow_mut();
            let name = String::from_utf8(bytes).unwrap();
            let id = device.names.len() as u64 + 1;
            device.names.insert(id, name.clone());
            device.calls.push(Call::Load(name));
            Ok(id)
        }

        fn play_looping(&mut self, handle: &u64) -> Result<(), PlaybackError> {
            let mut device = self.0.borrow_mut();
            if device.fail_play {
                return Err(PlaybackError::Device("unplugged".to_string()));
            }
            device.playing.push(*handle);
            let name = device.names[handle].clone();
            device.calls.push(Call::Play(name));
            Ok(())
        }

        fn stop(&mut self, handle: &u64) {
            let mut device = self.0.borrow_mut();
            device.playing.retain(|id| id != handle);
            let name = device.names[handle].clone();
            device.calls.push(Call::Stop(name));
        }

        fn dispose(&mut self, handle: u64) {
            let mut device = self.0.borrow_mut();
            let name = device.names[&handle].clone();
            device.calls.push(Call::Dispose(name));
        }
    }

    /// serves the listed sound files, their bytes are their names
    struct Sounds(&'static [&'static str]);

    impl AssetSource for Sounds {
        fn kind(&self) -> SourceKind {
            SourceKind::EmbeddedComponent
        }

        fn locate(&self, request: &AssetRequest) -> String {
            request.to_string()
        }

        fn fetch(&self, request: &AssetRequest) -> Result<Vec<u8>, SourceError> {
            if self.0.iter().any(|name| *name == request.filename()) {
                Ok(request.filename().as_bytes().to_vec())
            } else {
                Err(SourceError::NotEmbedded(request.to_string()))
            }
        }
    }

    pub(crate) const ALL_SOUNDS: &[&str] = &["alarm_1.wav", "alarm_2.wav", "alarm_3.wav"];

    pub(crate) fn controller(available: &'static [&'static str]) -> (AlarmController<FakeAudio>, FakeAudio) {
        let audio = FakeAudio::default();
        let resolver = Rc::new(AssetResolver::new(vec![Box::new(Sounds(available))]));
        (AlarmController::new(audio.clone(), resolver, 0), audio)
    }

    pub(crate) fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn parses_alarm_times() {
        let parse = |s: &str| s.parse::<AlarmTime>();
        assert_eq!(parse("07:00"), Ok(AlarmTime::new(7, 0).unwrap()));
        assert_eq!(parse("7:5"), Ok(AlarmTime::new(7, 5).unwrap()));
        assert_eq!(parse(" 18:30 "), Ok(AlarmTime::new(18, 30).unwrap()));
        assert_eq!(parse("23:59:59"), Ok(AlarmTime::new(23, 59).unwrap()));
        assert_eq!(parse("00:00"), Ok(AlarmTime::new(0, 0).unwrap()));
        assert_eq!(parse("25:99"), Err(TimeParseError::Hour(25)));
        assert_eq!(parse("12:60"), Err(TimeParseError::Minute(60)));
        assert_eq!(parse("12:00:61"), Err(TimeParseError::Second(61)));
        for bad in ["", "7", "ab:cd", "07:00:00:00", "007:00", "-1:00", "7 :00", "07:"] {
            assert_eq!(parse(bad), Err(TimeParseError::Format), "{bad:?}");
        }
        assert_eq!(AlarmTime::new(7, 5).unwrap().to_string(), "07:05");
    }

    #[test]
    fn set_target_reports_status() {
        let (mut alarm, _) = controller(ALL_SOUNDS);
        assert_eq!(alarm.set_target("07:00"), Ok(AlarmTime::new(7, 0).unwrap()));
        assert_eq!(alarm.state().target(), AlarmTime::new(7, 0));
        assert_eq!(alarm.status().to_string(), "alarm set for 07:00");

        assert!(alarm.set_target("25:99").is_err());
        assert_eq!(alarm.state().target(), None);
        assert_eq!(alarm.status(), Status::InvalidFormat);
    }

    #[test]
    fn arm_needs_a_valid_time() {
        let (mut alarm, _) = controller(ALL_SOUNDS);
        assert!(!alarm.arm("soon"));
        assert!(!alarm.state().armed());
        assert_eq!(alarm.status(), Status::InvalidFormat);

        assert!(alarm.arm("6:30"));
        assert!(alarm.state().armed());
        assert_eq!(alarm.status().to_string(), "alarm armed for 06:30");

        // an invalid edit while armed disarms
        assert!(alarm.set_target("6:3x").is_err());
        assert!(!alarm.state().armed());
    }

    #[test]
    fn fires_once_at_the_first_matching_tick() {
        let (mut alarm, audio) = controller(ALL_SOUNDS);
        assert!(alarm.arm("07:00"));
        let ticks = [
            at(1, 6, 59, 59),
            at(1, 7, 0, 0),
            at(1, 7, 0, 30),
            at(1, 7, 1, 0),
        ];
        let fired: Vec<_> = ticks
            .into_iter()
            .map(|now| alarm.check(now))
            .collect();
        assert_eq!(fired, [false, true, false, false]);
        assert_eq!(audio.plays(), 1);
        assert!(alarm.state().ringing());
        assert!(alarm.stop_enabled());
        assert_eq!(alarm.state().last_triggered_at(), Some(at(1, 7, 0, 0)));
        assert_eq!(alarm.status(), Status::Ringing(AlarmTime::new(7, 0).unwrap()));
        assert_eq!(audio.playing(), ["alarm_1.wav"]);
    }

    #[test]
    fn debounce_holds_across_rearming() {
        let (mut alarm, audio) = controller(ALL_SOUNDS);
        assert!(alarm.arm("07:00"));
        assert!(alarm.check(at(1, 7, 0, 0)));
        assert!(alarm.stop());

        // armed again inside the same minute, still within 60s of the fire
        assert!(alarm.arm("07:00"));
        assert!(!alarm.check(at(1, 7, 0, 45)));
        // minute moved on
        assert!(!alarm.check(at(1, 7, 1, 5)));
        assert_eq!(audio.plays(), 1);

        assert!(alarm.check(at(2, 7, 0, 0)));
        assert_eq!(audio.plays(), 2);
    }

    #[test]
    fn stop_is_one_shot() {
        let (mut alarm, audio) = controller(ALL_SOUNDS);
        assert!(!alarm.stop());
        assert!(alarm.arm("07:00"));
        assert!(alarm.check(at(1, 7, 0, 0)));
        assert!(alarm.stop());
        assert!(!alarm.state().armed());
        assert!(!alarm.state().ringing());
        assert!(!alarm.stop_enabled());
        assert!(audio.playing().is_empty());
        // the sound stays loaded for next time
        assert!(alarm.state().active_audio().is_some());
        assert!(!alarm.check(at(2, 7, 0, 0)));
    }

    #[test]
    fn disarm_while_ringing_silences_and_forgets() {
        let (mut alarm, audio) = controller(ALL_SOUNDS);
        assert!(alarm.arm("07:00"));
        assert!(alarm.check(at(1, 7, 0, 0)));
        alarm.disarm();
        assert!(audio.playing().is_empty());
        assert!(!alarm.state().armed());
        assert_eq!(alarm.state().target(), None);
        assert_eq!(alarm.state().last_triggered_at(), None);
        assert_eq!(alarm.status(), Status::Unset);

        // nothing remembers the earlier fire, so the same minute rings again
        assert!(alarm.arm("07:00"));
        assert!(alarm.check(at(1, 7, 0, 30)));
    }

    #[test]
    fn switching_sound_while_ringing_keeps_ringing() {
        let (mut alarm, audio) = controller(ALL_SOUNDS);
        assert!(alarm.arm("07:00"));
        assert!(alarm.check(at(1, 7, 0, 0)));
        assert!(alarm.reload_active_sound(1));
        assert_eq!(audio.playing(), ["alarm_2.wav"]);
        assert!(alarm.state().ringing());
        assert_eq!(alarm.status(), Status::Ringing(AlarmTime::new(7, 0).unwrap()));
        assert_eq!(alarm.selected_sound(), 1);
        let calls = audio.calls();
        let stop_old = calls
            .iter()
            .position(|c| *c == Call::Stop("alarm_1.wav".to_string()))
            .unwrap();
        let play_new = calls
            .iter()
            .position(|c| *c == Call::Play("alarm_2.wav".to_string()))
            .unwrap();
        assert!(stop_old < play_new);
        assert!(calls.contains(&Call::Dispose("alarm_1.wav".to_string())));
    }

    #[test]
    fn switching_to_missing_sound_while_ringing_goes_quiet() {
        let (mut alarm, audio) = controller(&["alarm_1.wav", "alarm_2.wav"]);
        assert!(alarm.arm("07:00"));
        assert!(alarm.check(at(1, 7, 0, 0)));
        assert!(!alarm.reload_active_sound(2));
        assert!(!alarm.state().ringing());
        assert!(alarm.state().armed());
        assert!(audio.playing().is_empty());
        assert_eq!(alarm.status(), Status::Armed(AlarmTime::new(7, 0).unwrap()));
        let notices = alarm.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, Severity::Error);
        assert!(notices[0].body.contains("resources/alarm_3.wav"));
        assert!(alarm.take_notices().is_empty());
    }

    #[test]
    fn failed_selection_keeps_previous_sound() {
        let (mut alarm, audio) = controller(&["alarm_1.wav"]);
        assert!(alarm.preload());
        assert!(!alarm.reload_active_sound(2));
        assert_eq!(alarm.take_notices()[0].severity, Severity::Warning);

        assert!(alarm.arm("07:00"));
        assert!(alarm.check(at(1, 7, 0, 0)));
        assert_eq!(audio.playing(), ["alarm_1.wav"]);
    }

    #[test]
    fn playback_failure_leaves_alarm_quiet() {
        let (mut alarm, audio) = controller(ALL_SOUNDS);
        audio.0.borrow_mut().fail_play = true;
        assert!(alarm.arm("07:00"));
        assert!(!alarm.check(at(1, 7, 0, 0)));
        assert!(!alarm.check(at(1, 7, 0, 1)));
        assert!(!alarm.state().ringing());
        assert!(alarm.state().armed());
        assert_eq!(alarm.state().last_triggered_at(), None);
        // the repeated failure is only reported once
        let notices = alarm.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Alarm playback error");

        audio.0.borrow_mut().fail_play = false;
        assert!(alarm.check(at(1, 7, 0, 2)));
    }

    #[test]
    fn failing_minute_reports_once_even_when_drained_every_tick() {
        let (mut alarm, audio) = controller(ALL_SOUNDS);
        audio.0.borrow_mut().fail_play = true;
        assert!(alarm.arm("07:00"));
        let mut reported = 0;
        for second in 0..60 {
            assert!(!alarm.check(at(1, 7, 0, second)));
            reported += alarm.take_notices().len();
        }
        assert_eq!(reported, 1);
        assert_eq!(audio.plays(), 0);

        // the next day is a new failure
        assert!(!alarm.check(at(2, 7, 0, 0)));
        assert_eq!(alarm.take_notices().len(), 1);

        // so is a different target
        assert!(alarm.arm("07:01"));
        assert!(!alarm.check(at(2, 7, 1, 0)));
        assert_eq!(alarm.take_notices().len(), 1);
    }

    #[test]
    fn missing_sound_cannot_fire() {
        let (mut alarm, audio) = controller(&[]);
        assert!(!alarm.preload());
        assert!(alarm.arm("07:00"));
        assert!(!alarm.check(at(1, 7, 0, 0)));
        assert!(!alarm.state().ringing());
        assert_eq!(audio.plays(), 0);
        assert!(!alarm.take_notices().is_empty());
    }

    #[test]
    fn fire_requires_armed() {
        let (mut alarm, audio) = controller(ALL_SOUNDS);
        assert!(!alarm.fire(at(1, 7, 0, 0)));
        assert_eq!(audio.plays(), 0);
        assert!(!alarm.state().ringing());
    }

    #[test]
    fn dropping_releases_a_ringing_sound() {
        let (mut alarm, audio) = controller(ALL_SOUNDS);
        assert!(alarm.arm("07:00"));
        assert!(alarm.check(at(1, 7, 0, 0)));
        drop(alarm);
        assert!(audio.playing().is_empty());
        let calls = audio.calls();
        assert_eq!(
            calls[calls.len() - 2..],
            [
                Call::Stop("alarm_1.wav".to_string()),
                Call::Dispose("alarm_1.wav".to_string())
            ]
        );
    }
}
