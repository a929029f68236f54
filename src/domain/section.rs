use std::ops::RangeInclusive;

use uuid::Uuid;

use crate::domain::{LineNumber, kinds::SectionType};

/// The lines a section spans.
///
/// An open section has no end yet; its effective end is resolved against the
/// script's current lines every time it is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionRange {
    /// Runs from `start` to the last line of the script.
    OpenFrom {
        /// First line, inclusive.
        start: LineNumber,
    },
    /// Runs from `start` to `end`, both inclusive.
    Bounded {
        /// First line, inclusive.
        start: LineNumber,
        /// Last line, inclusive. Never less than `start`.
        end: LineNumber,
    },
}

impl SectionRange {
    /// A closed range.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRange`] if `end` is before `start`.
    pub const fn bounded(start: LineNumber, end: LineNumber) -> Result<Self, InvalidRange> {
        if end.get() < start.get() {
            Err(InvalidRange { start, end })
        } else {
            Ok(Self::Bounded { start, end })
        }
    }

    /// First line of the range.
    #[must_use]
    pub const fn start(self) -> LineNumber {
        match self {
            Self::OpenFrom { start } | Self::Bounded { start, .. } => start,
        }
    }

    /// Last line, if the range has been closed.
    #[must_use]
    pub const fn end(self) -> Option<LineNumber> {
        match self {
            Self::OpenFrom { .. } => None,
            Self::Bounded { end, .. } => Some(end),
        }
    }

    /// Resolve the range against the script's last line.
    ///
    /// Returns `None` for an open range whose start lies beyond `last_line`,
    /// or when the script has no lines at all.
    #[must_use]
    pub fn resolve(self, last_line: Option<LineNumber>) -> Option<RangeInclusive<LineNumber>> {
        match self {
            Self::Bounded { start, end } => Some(start..=end),
            Self::OpenFrom { start } => {
                let last = last_line?;
                (start <= last).then_some(start..=last)
            }
        }
    }
}

/// A section's end would precede its start.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
#[error("invalid section range: end line {end} is before start line {start}")]
pub struct InvalidRange {
    /// The section's start line.
    pub start: LineNumber,
    /// The rejected end line.
    pub end: LineNumber,
}

/// Whether a section still covers any lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionStatus {
    /// The range refers to existing lines.
    #[default]
    Active,
    /// Every line in the range was removed. The section is kept with its last
    /// range and covers nothing until it is closed, reopened or reattached
    /// through the script at existing lines, or deleted.
    Detached,
}

/// A labelled range of lines: an act, a scene, a song, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub(crate) id: Uuid,
    /// Title shown in navigation, e.g. `Act II`.
    pub title: String,
    pub(crate) kind: SectionType,
    pub(crate) range: SectionRange,
    pub(crate) status: SectionStatus,
    /// Free-form notes.
    pub notes: String,
}

impl Section {
    /// Start a new open section at `start`.
    ///
    /// A new UUID is generated.
    #[must_use]
    pub fn open(start: LineNumber, kind: SectionType, title: impl Into<String>) -> Self {
        Self::open_with_uuid(Uuid::new_v4(), start, kind, title.into())
    }

    /// As [`Section::open`], with a caller-chosen id.
    #[must_use]
    pub fn open_with_uuid(
        id: Uuid,
        start: LineNumber,
        kind: SectionType,
        title: String,
    ) -> Self {
        Self {
            id,
            title,
            kind,
            range: SectionRange::OpenFrom { start },
            status: SectionStatus::Active,
            notes: String::new(),
        }
    }

    /// The section's unique identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// What kind of section this is.
    #[must_use]
    pub const fn kind(&self) -> SectionType {
        self.kind
    }

    /// Change what kind of section this is.
    pub const fn set_kind(&mut self, kind: SectionType) {
        self.kind = kind;
    }

    /// The section's range.
    #[must_use]
    pub const fn range(&self) -> SectionRange {
        self.range
    }

    /// First line, inclusive.
    #[must_use]
    pub const fn start_line_number(&self) -> LineNumber {
        self.range.start()
    }

    /// Last line, inclusive, once the section is closed.
    #[must_use]
    pub const fn end_line_number(&self) -> Option<LineNumber> {
        self.range.end()
    }

    /// Whether the section has no end yet.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.range, SectionRange::OpenFrom { .. })
    }

    /// Whether the section lost all of its lines.
    #[must_use]
    pub const fn status(&self) -> SectionStatus {
        self.status
    }

    /// Close the section at `end`.
    ///
    /// This only edits the range. A detached section stays detached; use
    /// [`Script::close_section`](crate::Script::close_section) to bring it
    /// back.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRange`] if `end` is before the start line. The
    /// section is left unchanged.
    pub fn close(&mut self, end: LineNumber) -> Result<(), InvalidRange> {
        self.range = SectionRange::bounded(self.range.start(), end)?;
        Ok(())
    }

    /// Remove the end line, making the section open again.
    pub const fn reopen(&mut self) {
        self.range = SectionRange::OpenFrom {
            start: self.range.start(),
        };
    }

    /// The lines this section covers in a script whose last line is
    /// `last_line`. Detached sections cover nothing.
    #[must_use]
    pub fn effective_range(
        &self,
        last_line: Option<LineNumber>,
    ) -> Option<RangeInclusive<LineNumber>> {
        match self.status {
            SectionStatus::Active => self.range.resolve(last_line),
            SectionStatus::Detached => None,
        }
    }

    /// Whether `line` falls within this section.
    #[must_use]
    pub fn covers(&self, line: LineNumber, last_line: Option<LineNumber>) -> bool {
        self.effective_range(last_line)
            .is_some_and(|range| range.contains(&line))
    }

    /// Whether the two sections partially overlap, with neither containing
    /// the other. Nesting is not crossing.
    #[must_use]
    pub fn crosses(&self, other: &Self, last_line: Option<LineNumber>) -> bool {
        let (Some(a), Some(b)) = (
            self.effective_range(last_line),
            other.effective_range(last_line),
        ) else {
            return false;
        };
        let overlaps = a.start() <= b.end() && b.start() <= a.end();
        let a_contains_b = a.start() <= b.start() && b.end() <= a.end();
        let b_contains_a = b.start() <= a.start() && a.end() <= b.end();
        overlaps && !a_contains_b && !b_contains_a
    }

    pub(crate) const fn set_range(&mut self, range: SectionRange) {
        self.range = range;
    }

    pub(crate) const fn detach(&mut self) {
        self.status = SectionStatus::Detached;
    }

    pub(crate) const fn reattach(&mut self) {
        self.status = SectionStatus::Active;
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn n(number: usize) -> LineNumber {
        LineNumber::try_from(number).unwrap()
    }

    #[test]
    fn opens_without_end() {
        let section = Section::open(n(10), SectionType::Act, "Act II");
        assert!(section.is_open());
        assert_eq!(section.start_line_number(), n(10));
        assert_eq!(section.end_line_number(), None);
    }

    #[test]
    fn close_before_start_is_rejected_and_leaves_section_unchanged() {
        let mut section = Section::open(n(10), SectionType::Scene, "1.2");
        let before = section.clone();

        let err = section.close(n(9)).unwrap_err();

        assert_eq!(
            err,
            InvalidRange {
                start: n(10),
                end: n(9)
            }
        );
        assert_eq!(section, before);
    }

    #[test]
    fn close_on_start_line_is_allowed() {
        let mut section = Section::open(n(4), SectionType::Preset, "Blackout");
        section.close(n(4)).unwrap();
        assert_eq!(section.end_line_number(), Some(n(4)));
    }

    #[test]
    fn reopen_drops_the_end() {
        let mut section = Section::open(n(1), SectionType::Act, "Act I");
        section.close(n(5)).unwrap();
        section.reopen();
        assert!(section.is_open());
        assert_eq!(section.start_line_number(), n(1));
    }

    #[test_case(10, true; "start")]
    #[test_case(25, true; "middle")]
    #[test_case(40, true; "end")]
    #[test_case(9, false; "before")]
    #[test_case(41, false; "after")]
    fn bounded_coverage(line: usize, expected: bool) {
        let mut section = Section::open(n(10), SectionType::Act, "Act II");
        section.close(n(40)).unwrap();
        assert_eq!(section.covers(n(line), Some(n(100))), expected);
    }

    #[test]
    fn open_section_extends_to_last_line() {
        let section = Section::open(n(10), SectionType::Act, "Act II");
        assert!(section.covers(n(50), Some(n(50))));
        assert!(!section.covers(n(51), Some(n(50))));
        assert!(!section.covers(n(10), None));
    }

    #[test]
    fn detached_section_covers_nothing() {
        let mut section = Section::open(n(3), SectionType::Custom, "gone");
        section.detach();
        assert!(!section.covers(n(3), Some(n(10))));
    }

    #[test]
    fn nesting_is_not_crossing() {
        let mut scene = Section::open(n(1), SectionType::Scene, "1.1");
        scene.close(n(20)).unwrap();
        let mut song = Section::open(n(5), SectionType::SongNumber, "Overture");
        song.close(n(10)).unwrap();
        let mut straddle = Section::open(n(15), SectionType::Preset, "Shift");
        straddle.close(n(25)).unwrap();

        let last = Some(n(30));
        assert!(!scene.crosses(&song, last));
        assert!(!song.crosses(&scene, last));
        assert!(scene.crosses(&straddle, last));
        assert!(!song.crosses(&straddle, last));
    }
}
