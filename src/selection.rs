use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::assets::{AssetKind, AssetRequest};

/// folder every catalog asset lives in
pub const ASSET_FOLDER: &str = "resources";

/// how many variants each category offers
pub const VARIANTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Face,
    HourHand,
    MinuteHand,
    AlarmSound,
}

impl AssetCategory {
    pub const ALL: [Self; 4] = [Self::Face, Self::HourHand, Self::MinuteHand, Self::AlarmSound];
    pub const IMAGES: [Self; 3] = [Self::Face, Self::HourHand, Self::MinuteHand];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Face => "Face",
            Self::HourHand => "Hour hand",
            Self::MinuteHand => "Minute hand",
            Self::AlarmSound => "Alarm sound",
        }
    }

    #[must_use]
    pub const fn kind(self) -> AssetKind {
        match self {
            Self::AlarmSound => AssetKind::AudioBytes,
            Self::Face | Self::HourHand | Self::MinuteHand => AssetKind::Image,
        }
    }

    #[must_use]
    pub const fn candidates(self) -> [&'static str; VARIANTS] {
        match self {
            Self::Face => ["face_1.png", "face_2.png", "face_3.png"],
            Self::HourHand => ["hour_hand_1.png", "hour_hand_2.png", "hour_hand_3.png"],
            Self::MinuteHand => ["minute_hand_1.png", "minute_hand_2.png", "minute_hand_3.png"],
            Self::AlarmSound => ["alarm_1.wav", "alarm_2.wav", "alarm_3.wav"],
        }
    }

    /// what the menu shows for a variant
    #[must_use]
    pub const fn variant_label(self, index: usize) -> &'static str {
        let labels = match self {
            Self::Face => ["Cream", "Slate", "White"],
            Self::HourHand | Self::MinuteHand => ["Bronze", "Red", "Blue"],
            Self::AlarmSound => ["Chime", "High chime", "Low chime"],
        };
        if index < VARIANTS {
            labels[index]
        } else {
            "?"
        }
    }

    /// the lookup for variant `index`, clamped to the last variant
    #[must_use]
    pub fn request(self, index: usize) -> AssetRequest {
        AssetRequest::new(ASSET_FOLDER, self.candidates()[index.min(VARIANTS - 1)])
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which variant is picked for each category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSelection {
    pub face: usize,
    pub hour_hand: usize,
    pub minute_hand: usize,
    pub alarm_sound: usize,
}

impl AssetSelection {
    /// out of range indices are replaced by the first variant
    #[must_use]
    pub fn sanitized(self) -> Self {
        let check = |category: AssetCategory, index: usize| {
            if index < VARIANTS {
                index
            } else {
                warn!("{category} variant {index} doesn't exist, using the first one");
                0
            }
        };
        Self {
            face: check(AssetCategory::Face, self.face),
            hour_hand: check(AssetCategory::HourHand, self.hour_hand),
            minute_hand: check(AssetCategory::MinuteHand, self.minute_hand),
            alarm_sound: check(AssetCategory::AlarmSound, self.alarm_sound),
        }
    }

    #[must_use]
    pub const fn get(&self, category: AssetCategory) -> usize {
        match category {
            AssetCategory::Face => self.face,
            AssetCategory::HourHand => self.hour_hand,
            AssetCategory::MinuteHand => self.minute_hand,
            AssetCategory::AlarmSound => self.alarm_sound,
        }
    }

    /// Returns true only if the selection actually changed, so the caller
    /// reloads nothing but the affected category.
    pub fn set(&mut self, category: AssetCategory, index: usize) -> bool {
        if index >= VARIANTS {
            warn!("ignoring {category} variant {index}");
            return false;
        }
        let slot = match category {
            AssetCategory::Face => &mut self.face,
            AssetCategory::HourHand => &mut self.hour_hand,
            AssetCategory::MinuteHand => &mut self.minute_hand,
            AssetCategory::AlarmSound => &mut self.alarm_sound,
        };
        let changed = *slot != index;
        *slot = index;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_changes_only() {
        let mut selection = AssetSelection::default();
        assert!(!selection.set(AssetCategory::Face, 0));
        assert!(selection.set(AssetCategory::Face, 2));
        assert!(!selection.set(AssetCategory::Face, 2));
        assert!(!selection.set(AssetCategory::AlarmSound, 3));
        assert_eq!(selection.get(AssetCategory::Face), 2);
        assert_eq!(selection.get(AssetCategory::HourHand), 0);
        assert_eq!(selection.get(AssetCategory::AlarmSound), 0);
    }

    #[test]
    fn requests_point_into_resources() {
        let request = AssetCategory::MinuteHand.request(1);
        assert_eq!(request.to_string(), "resources/minute_hand_2.png");
        assert_eq!(
            AssetCategory::AlarmSound.request(7).filename(),
            "alarm_3.wav"
        );
    }

    #[test]
    fn only_the_alarm_sound_is_audio() {
        for category in AssetCategory::IMAGES {
            assert_eq!(category.kind(), AssetKind::Image);
        }
        assert_eq!(AssetCategory::AlarmSound.kind(), AssetKind::AudioBytes);
    }

    #[test]
    fn sanitized_resets_out_of_range() {
        let selection = AssetSelection {
            face: 1,
            hour_hand: 9,
            minute_hand: 2,
            alarm_sound: 3,
        }
        .sanitized();
        assert_eq!(
            selection,
            AssetSelection {
                face: 1,
                hour_hand: 0,
                minute_hand: 2,
                alarm_sound: 0,
            }
        );
    }
}
