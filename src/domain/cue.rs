use uuid::Uuid;

use crate::domain::kinds::{CueOffset, CueType, StageLocation};

/// Where a cue sits relative to the elements of its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CuePosition {
    /// Index of the anchor element within the line.
    pub element_index: usize,
    /// Whether the cue is called before or after the anchor element.
    pub offset: CueOffset,
}

impl CuePosition {
    /// Anchor before the element at `element_index`.
    #[must_use]
    pub const fn before(element_index: usize) -> Self {
        Self {
            element_index,
            offset: CueOffset::Before,
        }
    }

    /// Anchor after the element at `element_index`.
    #[must_use]
    pub const fn after(element_index: usize) -> Self {
        Self {
            element_index,
            offset: CueOffset::After,
        }
    }

    /// Check this position against a line with `element_count` elements.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeAnchor`] if the index is not in
    /// `0..element_count`.
    pub const fn validate(self, element_count: usize) -> Result<Self, OutOfRangeAnchor> {
        if self.element_index < element_count {
            Ok(self)
        } else {
            Err(OutOfRangeAnchor {
                element_index: self.element_index,
                element_count,
            })
        }
    }
}

/// A cue anchor points past the end of its line.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
#[error("cue anchor {element_index} is out of range for a line of {element_count} elements")]
pub struct OutOfRangeAnchor {
    /// The requested element index.
    pub element_index: usize,
    /// How many elements the line had.
    pub element_count: usize,
}

/// Whether a cue's anchor is still trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorStatus {
    /// The anchor refers to the intended element.
    #[default]
    Anchored,
    /// The line was re-decomposed and the anchor word could not be found
    /// again. The position still holds the last known index.
    Orphaned,
}

/// A crew member to pulse when a haptic-capable cue fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HapticTarget {
    /// Where the crew member is stationed.
    pub location: StageLocation,
    /// Crew identifier, starting at 0, independent of location.
    pub crew_id: u32,
}

/// A timing cue anchored to a word in a line.
///
/// The cue refers to its line by id only. Removing a cue never affects the
/// line, while removing the line removes the cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub(crate) id: Uuid,
    pub(crate) line_id: Uuid,
    pub(crate) position: CuePosition,
    pub(crate) status: AnchorStatus,
    pub(crate) kind: CueType,
    /// Free text shown on the call, e.g. `LX Q5 GO`.
    pub label: String,
    /// Free-form notes.
    pub notes: String,
    pub(crate) alert_sound: Option<String>,
    pub(crate) has_alert: bool,
    pub(crate) haptic: Option<HapticTarget>,
}

impl Cue {
    pub(crate) fn new_with_uuid(
        id: Uuid,
        line_id: Uuid,
        position: CuePosition,
        kind: CueType,
        label: String,
    ) -> Self {
        Self {
            id,
            line_id,
            position,
            status: AnchorStatus::Anchored,
            kind,
            label,
            notes: String::new(),
            alert_sound: None,
            has_alert: false,
            haptic: None,
        }
    }

    /// The cue's unique identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The id of the line this cue is anchored to.
    #[must_use]
    pub const fn line_id(&self) -> Uuid {
        self.line_id
    }

    /// The anchor within the line.
    #[must_use]
    pub const fn position(&self) -> CuePosition {
        self.position
    }

    /// Whether the anchor survived the last edit of its line.
    #[must_use]
    pub const fn status(&self) -> AnchorStatus {
        self.status
    }

    /// Shorthand for `status() == AnchorStatus::Orphaned`.
    #[must_use]
    pub const fn is_orphaned(&self) -> bool {
        matches!(self.status, AnchorStatus::Orphaned)
    }

    /// Which department and action this cue calls.
    #[must_use]
    pub const fn kind(&self) -> CueType {
        self.kind
    }

    /// Change the cue type.
    ///
    /// A haptic target is dropped if the new type cannot deliver one.
    pub fn set_kind(&mut self, kind: CueType) {
        self.kind = kind;
        if !kind.supports_haptic() {
            self.haptic = None;
        }
    }

    /// Whether an external alert should fire for this cue.
    #[must_use]
    pub const fn has_alert(&self) -> bool {
        self.has_alert
    }

    /// The sound asset the alert should play, if one was chosen.
    #[must_use]
    pub fn alert_sound(&self) -> Option<&str> {
        self.alert_sound.as_deref()
    }

    /// Turn the alert on, optionally naming a sound asset.
    pub fn set_alert(&mut self, sound: Option<String>) {
        self.has_alert = true;
        self.alert_sound = sound;
    }

    /// Turn the alert off and forget the sound.
    pub fn clear_alert(&mut self) {
        self.has_alert = false;
        self.alert_sound = None;
    }

    /// The crew member to pulse, if any.
    #[must_use]
    pub const fn haptic(&self) -> Option<HapticTarget> {
        self.haptic
    }

    /// Route a haptic alert to a crew member.
    ///
    /// Returns `false` and leaves the cue unchanged if this cue type cannot
    /// deliver haptics.
    pub fn set_haptic(&mut self, target: HapticTarget) -> bool {
        if !self.kind.supports_haptic() {
            return false;
        }
        self.haptic = Some(target);
        true
    }

    /// Stop routing haptic alerts for this cue.
    pub fn clear_haptic(&mut self) {
        self.haptic = None;
    }

    pub(crate) fn anchor_at(&mut self, position: CuePosition) {
        self.position = position;
        self.status = AnchorStatus::Anchored;
    }

    pub(crate) fn orphan(&mut self) {
        self.status = AnchorStatus::Orphaned;
    }
}
