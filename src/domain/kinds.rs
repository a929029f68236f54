//! Closed vocabularies used across the script model.
//!
//! Every enum here has a stable wire value (`as_str`) that is also its serde
//! representation. Wire values are a storage contract and must never change.
//! Human-readable labels and colors live in
//! [`presentation`](crate::domain::presentation), keyed by these wire values.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Error returned when a wire value does not name a known variant.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Generates `as_str`, `ALL`, `Display` and `FromStr` from a table of
/// `Variant => "wire"` pairs.
macro_rules! wire_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stable wire value of this variant.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(UnknownVariant::new($kind, other)),
                }
            }
        }
    };
}

/// The structural role of a [`Section`](crate::Section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    /// An act.
    Act,
    /// A scene within an act.
    Scene,
    /// A preset or set change.
    Preset,
    /// A song or musical number.
    SongNumber,
    /// Anything else.
    Custom,
}

wire_enum!(SectionType, "section type", {
    Act => "act",
    Scene => "scene",
    Preset => "preset",
    SongNumber => "song_number",
    Custom => "custom",
});

/// What a [`LineElement`](crate::LineElement) holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    /// A run of non-space characters.
    Word,
    /// The empty text between two adjacent separators.
    Space,
    /// A token made only of punctuation characters.
    Punctuation,
}

wire_enum!(ElementType, "element type", {
    Word => "word",
    Space => "space",
    Punctuation => "punctuation",
});

/// Whether a cue sits before or after its anchor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueOffset {
    /// Immediately before the element is spoken.
    Before,
    /// Immediately after the element is spoken.
    After,
}

wire_enum!(CueOffset, "cue offset", {
    Before => "before",
    After => "after",
});

/// The department a cue is called for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Department {
    /// Lighting (LX).
    Lighting,
    /// Sound (SFX).
    Sound,
    /// Flying.
    Fly,
    /// Stage automation.
    Automation,
    /// Set / crew.
    Set,
    /// Cue lights.
    Cuelight,
}

/// The call made to a department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// An early heads-up, only used for set changes.
    Warning,
    /// Get ready.
    Standby,
    /// Execute.
    Go,
}

impl Action {
    /// The name a caller shouts for this action: `WARNING`, `STANDBY` or `GO`.
    #[must_use]
    pub const fn general_name(self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::Standby => "STANDBY",
            Self::Go => "GO",
        }
    }
}

/// One of the thirteen department/action combinations a cue can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueType {
    /// LX standby.
    LightingStandby,
    /// LX go.
    LightingGo,
    /// Sound standby.
    SoundStandby,
    /// Sound go.
    SoundGo,
    /// Fly standby.
    FlyStandby,
    /// Fly go.
    FlyGo,
    /// Automation standby.
    AutomationStandby,
    /// Automation go.
    AutomationGo,
    /// Set warning.
    SetWarning,
    /// Set standby.
    SetStandby,
    /// Set go.
    SetGo,
    /// Cuelight standby.
    CuelightStandby,
    /// Cuelight go.
    CuelightGo,
}

wire_enum!(CueType, "cue type", {
    LightingStandby => "lighting_standby",
    LightingGo => "lighting_go",
    SoundStandby => "sound_standby",
    SoundGo => "sound_go",
    FlyStandby => "fly_standby",
    FlyGo => "fly_go",
    AutomationStandby => "automation_standby",
    AutomationGo => "automation_go",
    SetWarning => "set_warning",
    SetStandby => "set_standby",
    SetGo => "set_go",
    CuelightStandby => "cuelight_standby",
    CuelightGo => "cuelight_go",
});

impl CueType {
    /// The department this cue is called for.
    #[must_use]
    pub const fn department(self) -> Department {
        match self {
            Self::LightingStandby | Self::LightingGo => Department::Lighting,
            Self::SoundStandby | Self::SoundGo => Department::Sound,
            Self::FlyStandby | Self::FlyGo => Department::Fly,
            Self::AutomationStandby | Self::AutomationGo => Department::Automation,
            Self::SetWarning | Self::SetStandby | Self::SetGo => Department::Set,
            Self::CuelightStandby | Self::CuelightGo => Department::Cuelight,
        }
    }

    /// The action called.
    #[must_use]
    pub const fn action(self) -> Action {
        match self {
            Self::SetWarning => Action::Warning,
            Self::LightingStandby
            | Self::SoundStandby
            | Self::FlyStandby
            | Self::AutomationStandby
            | Self::SetStandby
            | Self::CuelightStandby => Action::Standby,
            Self::LightingGo
            | Self::SoundGo
            | Self::FlyGo
            | Self::AutomationGo
            | Self::SetGo
            | Self::CuelightGo => Action::Go,
        }
    }

    /// Whether crew can be alerted for this cue with a haptic pulse.
    ///
    /// Only set cues are delivered to crew members' wearables.
    #[must_use]
    pub const fn supports_haptic(self) -> bool {
        matches!(self.department(), Department::Set)
    }
}

/// Highlight colors for lines and words. The wire value is the hex color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkColor {
    /// `#FFFF00`
    #[serde(rename = "#FFFF00")]
    Yellow,
    /// `#FF69B4`
    #[serde(rename = "#FF69B4")]
    Pink,
    /// `#90EE90`
    #[serde(rename = "#90EE90")]
    Green,
    /// `#87CEEB`
    #[serde(rename = "#87CEEB")]
    Blue,
    /// `#FFA500`
    #[serde(rename = "#FFA500")]
    Orange,
    /// `#DDA0DD`
    #[serde(rename = "#DDA0DD")]
    Purple,
}

wire_enum!(MarkColor, "mark color", {
    Yellow => "#FFFF00",
    Pink => "#FF69B4",
    Green => "#90EE90",
    Blue => "#87CEEB",
    Orange => "#FFA500",
    Purple => "#DDA0DD",
});

/// Where a crew member is stationed, for haptic alert routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageLocation {
    /// Orchestra pit.
    Pit,
    /// Left wing.
    LeftWing,
    /// Right wing.
    RightWing,
    /// Upstage.
    Upstage,
    /// Downstage.
    Downstage,
    /// Stage left.
    StageLeft,
    /// Stage right.
    StageRight,
    /// Upstage left.
    UpstageLeft,
    /// Upstage right.
    UpstageRight,
    /// Downstage left.
    DownstageLeft,
    /// Downstage right.
    DownstageRight,
    /// Centre stage.
    CenterStage,
}

wire_enum!(StageLocation, "stage location", {
    Pit => "pit",
    LeftWing => "left_wing",
    RightWing => "right_wing",
    Upstage => "upstage",
    Downstage => "downstage",
    StageLeft => "stage_left",
    StageRight => "stage_right",
    UpstageLeft => "upstage_left",
    UpstageRight => "upstage_right",
    DownstageLeft => "downstage_left",
    DownstageRight => "downstage_right",
    CenterStage => "center_stage",
});
