//! Display metadata for the model's enums.
//!
//! These are pure lookup tables keyed by each enum's wire value, so a
//! rendering layer can resolve labels and colors from stored data alone. The
//! domain types never depend on anything in here.

use crate::domain::kinds::{Action, CueType, MarkColor, SectionType};

/// A human-readable label plus a hex color tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    /// Label shown to the user.
    pub label: &'static str,
    /// Hex color, e.g. `#FF6B6B`.
    pub color: &'static str,
}

const fn entry(label: &'static str, color: &'static str) -> Presentation {
    Presentation { label, color }
}

const SECTION_TYPES: &[(&str, Presentation)] = &[
    ("act", entry("Act", "#FF6B6B")),
    ("scene", entry("Scene", "#4ECDC4")),
    ("preset", entry("Preset/Set Change", "#45B7D1")),
    ("song_number", entry("Song/Musical Number", "#96CEB4")),
    ("custom", entry("Custom", "#FECA57")),
];

const LIGHTING: &str = "#FFD700";
const SOUND: &str = "#FF6B6B";
const FLY: &str = "#4ECDC4";
const AUTOMATION: &str = "#45B7D1";
const SET: &str = "#944ECD";
const CUELIGHT: &str = "#CD4EBC";

const CUE_TYPES: &[(&str, Presentation)] = &[
    ("lighting_standby", entry("LX Standby", LIGHTING)),
    ("lighting_go", entry("LX GO", LIGHTING)),
    ("sound_standby", entry("SFX Standby", SOUND)),
    ("sound_go", entry("SFX GO", SOUND)),
    ("fly_standby", entry("Fly Standby", FLY)),
    ("fly_go", entry("Fly GO", FLY)),
    ("automation_standby", entry("Auto Standby", AUTOMATION)),
    ("automation_go", entry("Auto GO", AUTOMATION)),
    ("set_warning", entry("Set Warning", SET)),
    ("set_standby", entry("Set Standby", SET)),
    ("set_go", entry("Set GO", SET)),
    ("cuelight_standby", entry("Cuelight Standby", CUELIGHT)),
    ("cuelight_go", entry("Cuelight GO", CUELIGHT)),
];

const MARK_COLORS: &[(&str, Presentation)] = &[
    ("#FFFF00", entry("Yellow", "#FFFF00")),
    ("#FF69B4", entry("Pink", "#FF69B4")),
    ("#90EE90", entry("Green", "#90EE90")),
    ("#87CEEB", entry("Blue", "#87CEEB")),
    ("#FFA500", entry("Orange", "#FFA500")),
    ("#DDA0DD", entry("Purple", "#DDA0DD")),
];

/// Cue stack color for standby and warning calls.
pub const STACK_STANDBY: &str = "#FFA500";
/// Cue stack color for go calls.
pub const STACK_GO: &str = "#008000";

fn lookup(table: &[(&str, Presentation)], wire: &str) -> Option<Presentation> {
    table
        .iter()
        .find(|(key, _)| *key == wire)
        .map(|(_, presentation)| *presentation)
}

/// Look up a section type by wire value (e.g. `"act"`).
#[must_use]
pub fn section_type(wire: &str) -> Option<Presentation> {
    lookup(SECTION_TYPES, wire)
}

/// Look up a cue type by wire value (e.g. `"lighting_standby"`).
#[must_use]
pub fn cue_type(wire: &str) -> Option<Presentation> {
    lookup(CUE_TYPES, wire)
}

/// Look up a mark color by wire value (e.g. `"#FFFF00"`).
#[must_use]
pub fn mark_color(wire: &str) -> Option<Presentation> {
    lookup(MARK_COLORS, wire)
}

/// The color a cue occupies in the running cue stack: orange while standing
/// by, green once called.
#[must_use]
pub fn cue_stack_color(wire: &str) -> Option<&'static str> {
    let kind = wire.parse::<CueType>().ok()?;
    Some(match kind.action() {
        Action::Warning | Action::Standby => STACK_STANDBY,
        Action::Go => STACK_GO,
    })
}

/// Convenience accessors for callers already holding a typed value.
pub trait Presented {
    /// Label and color for this value.
    fn presentation(&self) -> Presentation;
}

impl Presented for SectionType {
    fn presentation(&self) -> Presentation {
        section_type(self.as_str()).unwrap_or(entry("Custom", "#FECA57"))
    }
}

impl Presented for CueType {
    fn presentation(&self) -> Presentation {
        cue_type(self.as_str()).unwrap_or(entry(self.as_str(), CUELIGHT))
    }
}

impl Presented for MarkColor {
    fn presentation(&self) -> Presentation {
        mark_color(self.as_str()).unwrap_or(entry(self.as_str(), self.as_str()))
    }
}
