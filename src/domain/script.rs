//! The script aggregate.
//!
//! A [`Script`] exclusively owns its [`Line`]s and [`Section`]s; each line
//! exclusively owns its elements and cues. Dropping or removing an owner
//! drops everything beneath it. Every structural mutation validates in full
//! before writing, so a rejected call leaves the script untouched.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    Config, LineNumber,
    cue::{Cue, CuePosition, HapticTarget, OutOfRangeAnchor},
    kinds::{CueType, MarkColor, SectionType},
    line::{Line, RebaseReport},
    section::{InvalidRange, Section, SectionRange, SectionStatus},
};

/// Structural violations rejected by the script aggregate.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Another line already has this number.
    #[error("line number {0} is already used in this script")]
    DuplicateLineNumber(LineNumber),

    /// A section would end before it starts.
    #[error(transparent)]
    InvalidRange(#[from] InvalidRange),

    /// A cue anchor does not name an element of its line.
    #[error(transparent)]
    OutOfRangeAnchor(#[from] OutOfRangeAnchor),

    /// No line has this id.
    #[error("line {0} not found")]
    LineNotFound(Uuid),

    /// No line has this number.
    #[error("no line numbered {0}")]
    LineNumberNotFound(LineNumber),

    /// No section has this id.
    #[error("section {0} not found")]
    SectionNotFound(Uuid),

    /// No cue has this id.
    #[error("cue {0} not found")]
    CueNotFound(Uuid),

    /// The line has no element at this position.
    #[error("line {line} has no element at position {position}")]
    ElementNotFound {
        /// The line addressed.
        line: LineNumber,
        /// The missing position.
        position: usize,
    },

    /// The section is detached and its start line no longer exists.
    #[error("section {section_id} is detached: its start line {start} no longer exists")]
    SectionDetached {
        /// The detached section.
        section_id: Uuid,
        /// The missing start line.
        start: LineNumber,
    },

    /// Haptic alerts were requested for a cue type that cannot deliver them.
    #[error("{0} cues cannot deliver haptic alerts")]
    HapticNotSupported(CueType),
}

/// How removing a line changed one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRepair {
    /// The affected section.
    pub section_id: Uuid,
    /// The range before the removal.
    pub before: SectionRange,
    /// The repaired range, or `None` if no line of the section remains and
    /// it was detached.
    pub after: Option<SectionRange>,
}

/// The result of removing a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRemoval {
    /// The removed line, with the elements and cues it took with it.
    pub line: Line,
    /// Sections whose range had to be repaired.
    pub repairs: Vec<RangeRepair>,
}

/// A performance script: ordered lines plus the sections laid over them.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    id: Uuid,
    /// Display name of the script.
    pub name: String,
    date_added: DateTime<Utc>,

    /// Lines, keyed and ordered by line number.
    lines: BTreeMap<LineNumber, Line>,

    /// Lookup from line id to line number.
    line_index: HashMap<Uuid, LineNumber>,

    sections: Vec<Section>,

    config: Config,
}

impl Script {
    /// Create an empty script with the default configuration.
    ///
    /// A new UUID is generated and the current time is recorded.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::new_with_uuid(Uuid::new_v4(), name.into(), Utc::now(), Config::default())
    }

    /// Create an empty script with caller-chosen identity and configuration.
    #[must_use]
    pub fn new_with_uuid(
        id: Uuid,
        name: String,
        date_added: DateTime<Utc>,
        config: Config,
    ) -> Self {
        Self {
            id,
            name,
            date_added,
            lines: BTreeMap::new(),
            line_index: HashMap::new(),
            sections: Vec::new(),
            config,
        }
    }

    /// The script's unique identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// When the script was created.
    #[must_use]
    pub const fn date_added(&self) -> DateTime<Utc> {
        self.date_added
    }

    /// The editing configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the editing configuration. Existing elements are not
    /// re-decomposed.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Lines in line-number order.
    pub fn lines(&self) -> impl Iterator<Item = &Line> + '_ {
        self.lines.values()
    }

    /// Number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The highest line number, if there are any lines.
    #[must_use]
    pub fn last_line_number(&self) -> Option<LineNumber> {
        self.lines.keys().next_back().copied()
    }

    /// A line by id.
    #[must_use]
    pub fn line(&self, line_id: Uuid) -> Option<&Line> {
        let number = self.line_index.get(&line_id)?;
        self.lines.get(number)
    }

    /// Mutable access to a line by id.
    ///
    /// Line identity and numbering cannot be changed through the returned
    /// reference.
    pub fn line_mut(&mut self, line_id: Uuid) -> Option<&mut Line> {
        let number = self.line_index.get(&line_id)?;
        self.lines.get_mut(number)
    }

    /// A line by number.
    #[must_use]
    pub fn line_by_number(&self, number: LineNumber) -> Option<&Line> {
        self.lines.get(&number)
    }

    fn require_line_mut(&mut self, line_id: Uuid) -> Result<&mut Line, Error> {
        let number = self
            .line_index
            .get(&line_id)
            .ok_or(Error::LineNotFound(line_id))?;
        self.lines
            .get_mut(number)
            .ok_or(Error::LineNotFound(line_id))
    }

    /// Add a line with the given number, decomposing its text immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateLineNumber`] if the number is already used.
    pub fn add_line(
        &mut self,
        number: LineNumber,
        content: impl Into<String>,
    ) -> Result<&mut Line, Error> {
        self.add_line_with_uuid(Uuid::new_v4(), number, content.into())
    }

    /// As [`Script::add_line`], with a caller-chosen line id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateLineNumber`] if the number is already used.
    #[instrument(skip(self, content))]
    pub fn add_line_with_uuid(
        &mut self,
        id: Uuid,
        number: LineNumber,
        content: String,
    ) -> Result<&mut Line, Error> {
        if self.lines.contains_key(&number) {
            return Err(Error::DuplicateLineNumber(number));
        }
        let line = Line::new_with_uuid(id, number, content, self.config.decompose_options());
        self.insert_line(line)
    }

    /// Add a line numbered one past the current last line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateLineNumber`] only if the last line number is
    /// already the largest representable one.
    pub fn append_line(&mut self, content: impl Into<String>) -> Result<&mut Line, Error> {
        let number = self.next_line_number();
        self.add_line_with_uuid(Uuid::new_v4(), number, content.into())
    }

    fn next_line_number(&self) -> LineNumber {
        let Some(last) = self.last_line_number() else {
            return LineNumber::FIRST;
        };
        last.get()
            .checked_add(1)
            .and_then(|next| LineNumber::try_from(next).ok())
            .unwrap_or(last)
    }

    /// Insert a fully built line, e.g. one restored from storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateLineNumber`] if the number is already used.
    pub(crate) fn insert_line(&mut self, line: Line) -> Result<&mut Line, Error> {
        let number = line.number;
        if self.lines.contains_key(&number) {
            return Err(Error::DuplicateLineNumber(number));
        }
        self.line_index.insert(line.id, number);
        Ok(self.lines.entry(number).or_insert(line))
    }

    /// Remove a line together with its elements and cues.
    ///
    /// Sections are never removed. A section whose start or end was the
    /// removed line is shrunk to the remaining lines in its range; a section
    /// left with no lines is detached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LineNotFound`] if there is no such line.
    #[instrument(skip(self))]
    pub fn remove_line(&mut self, line_id: Uuid) -> Result<LineRemoval, Error> {
        let number = self
            .line_index
            .remove(&line_id)
            .ok_or(Error::LineNotFound(line_id))?;
        let line = self
            .lines
            .remove(&number)
            .ok_or(Error::LineNotFound(line_id))?;

        let mut repairs = Vec::new();
        for section in &mut self.sections {
            if let Some(repair) = repair_range(section, number, &self.lines) {
                if repair.after.is_none() {
                    tracing::warn!(section = %section.title, line = %number, "section lost all of its lines");
                }
                repairs.push(repair);
            }
        }

        tracing::debug!(
            line = %number,
            cues = line.cues.len(),
            repairs = repairs.len(),
            "removed line"
        );
        Ok(LineRemoval { line, repairs })
    }

    /// Replace a line's text, rebuilding its elements and rebasing its cues.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LineNotFound`] if there is no such line.
    #[instrument(skip(self, content))]
    pub fn set_line_content(
        &mut self,
        line_id: Uuid,
        content: impl Into<String>,
    ) -> Result<RebaseReport, Error> {
        let options = self.config.decompose_options();
        let window = self.config.rebase_window();
        let line = self.require_line_mut(line_id)?;
        Ok(line.set_content(content, options, window))
    }

    /// Change line numbers in bulk.
    ///
    /// `mapping` sends old numbers to new ones; lines not mentioned keep
    /// their number. Section bounds are mapped the same way. Either every
    /// change applies or none does.
    ///
    /// # Errors
    ///
    /// - [`Error::LineNumberNotFound`] if a mapped number is not in use
    /// - [`Error::DuplicateLineNumber`] if two lines would share a number
    /// - [`Error::InvalidRange`] if a closed section would end before it
    ///   starts
    #[instrument(skip(self, mapping), fields(changes = mapping.len()))]
    pub fn renumber_lines(&mut self, mapping: &BTreeMap<LineNumber, LineNumber>) -> Result<(), Error> {
        if let Some(missing) = mapping.keys().find(|old| !self.lines.contains_key(old)) {
            return Err(Error::LineNumberNotFound(*missing));
        }

        let remap = |number: LineNumber| mapping.get(&number).copied().unwrap_or(number);

        let mut renumbered: BTreeMap<LineNumber, LineNumber> = BTreeMap::new();
        for &old in self.lines.keys() {
            let new = remap(old);
            if renumbered.insert(new, old).is_some() {
                return Err(Error::DuplicateLineNumber(new));
            }
        }

        let ranges = self
            .sections
            .iter()
            .map(|section| match section.range {
                SectionRange::OpenFrom { start } => Ok(SectionRange::OpenFrom {
                    start: remap(start),
                }),
                SectionRange::Bounded { start, end } => {
                    SectionRange::bounded(remap(start), remap(end))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Validated; apply.
        let mut old_lines = std::mem::take(&mut self.lines);
        for (new, old) in renumbered {
            if let Some(mut line) = old_lines.remove(&old) {
                line.number = new;
                self.line_index.insert(line.id, new);
                self.lines.insert(new, line);
            }
        }
        for (section, range) in self.sections.iter_mut().zip(ranges) {
            section.set_range(range);
        }

        let misplaced = self.misplaced_cues();
        if !misplaced.is_empty() {
            tracing::error!(count = misplaced.len(), "cues reference a line other than their own");
        }
        Ok(())
    }

    /// Cues whose `line_id` does not match the line holding them, as
    /// `(cue id, holding line id)`.
    pub(crate) fn misplaced_cues(&self) -> Vec<(Uuid, Uuid)> {
        self.lines
            .values()
            .flat_map(|line| {
                line.cues
                    .iter()
                    .filter(move |cue| cue.line_id != line.id)
                    .map(move |cue| (cue.id, line.id))
            })
            .collect()
    }

    /// Anchor a new cue to a line.
    ///
    /// # Errors
    ///
    /// - [`Error::LineNotFound`] if there is no such line
    /// - [`Error::OutOfRangeAnchor`] if the position does not name an
    ///   element of the line
    pub fn attach_cue(
        &mut self,
        line_id: Uuid,
        position: CuePosition,
        kind: CueType,
        label: impl Into<String>,
    ) -> Result<&mut Cue, Error> {
        let line = self.require_line_mut(line_id)?;
        Ok(line.attach_cue(position, kind, label)?)
    }

    /// Every cue in the script, in line order.
    pub fn cues(&self) -> impl Iterator<Item = &Cue> + '_ {
        self.lines.values().flat_map(|line| line.cues.iter())
    }

    /// Cues whose anchor was lost when their line was edited.
    pub fn orphaned_cues(&self) -> impl Iterator<Item = &Cue> + '_ {
        self.cues().filter(|cue| cue.is_orphaned())
    }

    /// A cue by id.
    #[must_use]
    pub fn cue(&self, cue_id: Uuid) -> Option<&Cue> {
        self.cues().find(|cue| cue.id == cue_id)
    }

    fn line_holding_cue(&mut self, cue_id: Uuid) -> Result<&mut Line, Error> {
        self.lines
            .values_mut()
            .find(|line| line.cues.iter().any(|cue| cue.id == cue_id))
            .ok_or(Error::CueNotFound(cue_id))
    }

    /// Mutable access to a cue's label, notes and alert settings.
    pub fn cue_mut(&mut self, cue_id: Uuid) -> Option<&mut Cue> {
        self.lines
            .values_mut()
            .find_map(|line| line.cue_mut(cue_id))
    }

    /// Remove a cue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CueNotFound`] if there is no such cue.
    pub fn detach_cue(&mut self, cue_id: Uuid) -> Result<Cue, Error> {
        self.line_holding_cue(cue_id)?
            .detach_cue(cue_id)
            .ok_or(Error::CueNotFound(cue_id))
    }

    /// Move a cue to a new anchor on the same line, clearing any orphaned
    /// status.
    ///
    /// # Errors
    ///
    /// - [`Error::CueNotFound`] if there is no such cue
    /// - [`Error::OutOfRangeAnchor`] if the position does not name an
    ///   element of the cue's line
    pub fn reanchor_cue(&mut self, cue_id: Uuid, position: CuePosition) -> Result<(), Error> {
        let line = self.line_holding_cue(cue_id)?;
        if line.reanchor_cue(cue_id, position)? {
            Ok(())
        } else {
            Err(Error::CueNotFound(cue_id))
        }
    }

    /// Route a cue's haptic alert to a crew member.
    ///
    /// # Errors
    ///
    /// - [`Error::CueNotFound`] if there is no such cue
    /// - [`Error::HapticNotSupported`] if the cue type cannot deliver haptics
    pub fn set_cue_haptic(&mut self, cue_id: Uuid, target: HapticTarget) -> Result<(), Error> {
        let cue = self.cue_mut(cue_id).ok_or(Error::CueNotFound(cue_id))?;
        if cue.set_haptic(target) {
            Ok(())
        } else {
            Err(Error::HapticNotSupported(cue.kind))
        }
    }

    /// Highlight a single word of a line.
    ///
    /// # Errors
    ///
    /// - [`Error::LineNotFound`] if there is no such line
    /// - [`Error::ElementNotFound`] if the line has no such element
    pub fn mark_element(
        &mut self,
        line_id: Uuid,
        position: usize,
        color: Option<MarkColor>,
    ) -> Result<(), Error> {
        let line = self.require_line_mut(line_id)?;
        if line.mark_element(position, color) {
            Ok(())
        } else {
            Err(Error::ElementNotFound {
                line: line.number,
                position,
            })
        }
    }

    /// Sections in the order they were opened.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// A section by id.
    #[must_use]
    pub fn section(&self, section_id: Uuid) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == section_id)
    }

    /// Mutable access to a section.
    ///
    /// Range changes made through the returned reference are not checked
    /// against the script's lines; [`Script::validate`] reports bounds that
    /// name missing lines.
    pub fn section_mut(&mut self, section_id: Uuid) -> Option<&mut Section> {
        self.sections
            .iter_mut()
            .find(|section| section.id == section_id)
    }

    /// Open a new section starting at an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LineNumberNotFound`] if no line has that number.
    pub fn open_section(
        &mut self,
        start: LineNumber,
        kind: SectionType,
        title: impl Into<String>,
    ) -> Result<&mut Section, Error> {
        self.insert_section(Section::open(start, kind, title))
    }

    pub(crate) fn insert_section(&mut self, section: Section) -> Result<&mut Section, Error> {
        let start = section.start_line_number();
        if !self.lines.contains_key(&start) {
            return Err(Error::LineNumberNotFound(start));
        }
        self.sections.push(section);
        let index = self.sections.len() - 1;
        Ok(&mut self.sections[index])
    }

    /// Restore a section from storage without checking its bounds.
    pub(crate) fn restore_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Close a section at an existing line.
    ///
    /// A detached section whose start line exists again becomes active.
    ///
    /// # Errors
    ///
    /// - [`Error::SectionNotFound`] if there is no such section
    /// - [`Error::LineNumberNotFound`] if no line has number `end`
    /// - [`Error::SectionDetached`] if the section is detached and its start
    ///   line is still missing
    /// - [`Error::InvalidRange`] if `end` is before the section's start
    ///
    /// On error the section is left unchanged.
    pub fn close_section(&mut self, section_id: Uuid, end: LineNumber) -> Result<(), Error> {
        if !self.lines.contains_key(&end) {
            return Err(Error::LineNumberNotFound(end));
        }
        let section = self.reattachable_section_mut(section_id)?;
        section.close(end)?;
        section.reattach();
        Ok(())
    }

    /// Remove a section's end so it runs to the last line of the script.
    ///
    /// A detached section whose start line exists again becomes active.
    ///
    /// # Errors
    ///
    /// - [`Error::SectionNotFound`] if there is no such section
    /// - [`Error::SectionDetached`] if the section is detached and its start
    ///   line is still missing
    pub fn reopen_section(&mut self, section_id: Uuid) -> Result<(), Error> {
        let section = self.reattachable_section_mut(section_id)?;
        section.reopen();
        section.reattach();
        Ok(())
    }

    /// Give a section a new range over existing lines, making it active.
    ///
    /// This is how a detached section whose start line is gone is repaired.
    /// With `end` of `None` the section is open.
    ///
    /// # Errors
    ///
    /// - [`Error::SectionNotFound`] if there is no such section
    /// - [`Error::LineNumberNotFound`] if `start` or `end` is not a line
    /// - [`Error::InvalidRange`] if `end` is before `start`
    ///
    /// On error the section is left unchanged.
    pub fn reattach_section(
        &mut self,
        section_id: Uuid,
        start: LineNumber,
        end: Option<LineNumber>,
    ) -> Result<(), Error> {
        if let Some(missing) = std::iter::once(start)
            .chain(end)
            .find(|number| !self.lines.contains_key(number))
        {
            return Err(Error::LineNumberNotFound(missing));
        }
        let range = match end {
            Some(end) => SectionRange::bounded(start, end)?,
            None => SectionRange::OpenFrom { start },
        };
        let section = self
            .section_mut(section_id)
            .ok_or(Error::SectionNotFound(section_id))?;
        section.set_range(range);
        section.reattach();
        Ok(())
    }

    /// The section, provided it is active or its start line exists again.
    fn reattachable_section_mut(&mut self, section_id: Uuid) -> Result<&mut Section, Error> {
        let section = self
            .sections
            .iter_mut()
            .find(|section| section.id == section_id)
            .ok_or(Error::SectionNotFound(section_id))?;
        let start = section.start_line_number();
        if section.status == SectionStatus::Detached && !self.lines.contains_key(&start) {
            return Err(Error::SectionDetached { section_id, start });
        }
        Ok(section)
    }

    /// Delete a section. Lines are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SectionNotFound`] if there is no such section.
    pub fn remove_section(&mut self, section_id: Uuid) -> Result<Section, Error> {
        let index = self
            .sections
            .iter()
            .position(|section| section.id == section_id)
            .ok_or(Error::SectionNotFound(section_id))?;
        Ok(self.sections.remove(index))
    }

    /// Every active section whose range contains `line`.
    ///
    /// An open section extends to the script's current last line.
    #[must_use]
    pub fn sections_covering(&self, line: LineNumber) -> Vec<&Section> {
        let last = self.last_line_number();
        self.sections
            .iter()
            .filter(|section| section.covers(line, last))
            .collect()
    }
}

/// Shrink or detach `section` after line `removed` disappeared from `lines`.
fn repair_range(
    section: &mut Section,
    removed: LineNumber,
    lines: &BTreeMap<LineNumber, Line>,
) -> Option<RangeRepair> {
    if section.status == SectionStatus::Detached {
        return None;
    }
    let before = section.range;
    let after = match before {
        SectionRange::OpenFrom { start } if start == removed => lines
            .range(removed..)
            .next()
            .map(|(&start, _)| SectionRange::OpenFrom { start }),
        SectionRange::Bounded { start, end } if start == removed || end == removed => {
            let mut remaining = lines.range(start..=end).map(|(&number, _)| number);
            let first = remaining.next();
            let last = remaining.next_back().or(first);
            first
                .zip(last)
                .map(|(start, end)| SectionRange::Bounded { start, end })
        }
        _ => return None,
    };

    match after {
        Some(range) => section.set_range(range),
        None => section.detach(),
    }
    Some(RangeRepair {
        section_id: section.id,
        before,
        after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cue::AnchorStatus;

    fn n(number: usize) -> LineNumber {
        LineNumber::try_from(number).unwrap()
    }

    fn script_with_lines(count: usize) -> Script {
        let mut script = Script::new("Hamlet");
        for i in 1..=count {
            script.add_line(n(i), format!("line {i} text")).unwrap();
        }
        script
    }

    fn id_of(script: &Script, number: usize) -> Uuid {
        script.line_by_number(n(number)).unwrap().id()
    }

    #[test]
    fn duplicate_line_number_is_rejected() {
        let mut script = script_with_lines(3);
        let err = script.add_line(n(2), "again").unwrap_err();
        assert_eq!(err, Error::DuplicateLineNumber(n(2)));
        assert_eq!(script.line_count(), 3);
        assert_eq!(script.line_by_number(n(2)).unwrap().content(), "line 2 text");
    }

    #[test]
    fn lines_iterate_in_number_order() {
        let mut script = Script::new("Out of order");
        script.add_line(n(3), "c").unwrap();
        script.add_line(n(1), "a").unwrap();
        script.add_line(n(2), "b").unwrap();

        let contents: Vec<_> = script.lines().map(Line::content).collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
    }

    #[test]
    fn append_line_numbers_after_last() {
        let mut script = Script::new("Append");
        assert_eq!(script.append_line("first").unwrap().number(), n(1));
        script.add_line(n(10), "tenth").unwrap();
        assert_eq!(script.append_line("next").unwrap().number(), n(11));
    }

    #[test]
    fn lookup_by_id() {
        let mut script = script_with_lines(2);
        let id = id_of(&script, 2);
        assert_eq!(script.line(id).unwrap().number(), n(2));
        script.line_mut(id).unwrap().notes = "pause".to_string();
        assert_eq!(script.line(id).unwrap().notes, "pause");
        assert!(script.line(Uuid::new_v4()).is_none());
    }

    #[test]
    fn attach_cue_checks_line_and_anchor() {
        let mut script = script_with_lines(1);
        let line_id = id_of(&script, 1);

        let err = script
            .attach_cue(Uuid::new_v4(), CuePosition::after(0), CueType::SoundGo, "SQ 1")
            .unwrap_err();
        assert!(matches!(err, Error::LineNotFound(_)));

        let err = script
            .attach_cue(line_id, CuePosition::after(3), CueType::SoundGo, "SQ 1")
            .unwrap_err();
        assert_eq!(
            err,
            Error::OutOfRangeAnchor(OutOfRangeAnchor {
                element_index: 3,
                element_count: 3
            })
        );

        let cue_id = script
            .attach_cue(line_id, CuePosition::after(2), CueType::SoundGo, "SQ 1")
            .unwrap()
            .id();
        assert_eq!(script.cue(cue_id).unwrap().line_id(), line_id);
    }

    #[test]
    fn removing_a_line_cascades_to_its_cues_only() {
        let mut script = script_with_lines(3);
        let doomed = id_of(&script, 2);
        let survivor = id_of(&script, 3);
        script
            .attach_cue(doomed, CuePosition::before(0), CueType::FlyGo, "Fly 1")
            .unwrap();
        let kept = script
            .attach_cue(survivor, CuePosition::before(0), CueType::FlyGo, "Fly 2")
            .unwrap()
            .id();
        let section_id = script
            .open_section(n(1), SectionType::Act, "Act I")
            .unwrap()
            .id();

        let removal = script.remove_line(doomed).unwrap();

        assert_eq!(removal.line.cues().len(), 1);
        assert!(removal.repairs.is_empty());
        assert_eq!(script.line_count(), 2);
        assert_eq!(script.cues().count(), 1);
        assert!(script.cue(kept).is_some());
        assert!(script.section(section_id).is_some());
        assert!(script.line(doomed).is_none());
    }

    #[test]
    fn removing_start_line_moves_section_start_forward() {
        let mut script = script_with_lines(6);
        let section_id = script
            .open_section(n(2), SectionType::Scene, "1.2")
            .unwrap()
            .id();
        script.close_section(section_id, n(5)).unwrap();

        let removal = script.remove_line(id_of(&script, 2)).unwrap();

        let section = script.section(section_id).unwrap();
        assert_eq!(section.start_line_number(), n(3));
        assert_eq!(section.end_line_number(), Some(n(5)));
        assert_eq!(removal.repairs.len(), 1);
        assert_eq!(
            removal.repairs[0].after,
            Some(SectionRange::Bounded {
                start: n(3),
                end: n(5)
            })
        );
    }

    #[test]
    fn removing_end_line_moves_section_end_back() {
        let mut script = script_with_lines(6);
        let section_id = script
            .open_section(n(2), SectionType::Scene, "1.2")
            .unwrap()
            .id();
        script.close_section(section_id, n(5)).unwrap();

        script.remove_line(id_of(&script, 5)).unwrap();

        assert_eq!(
            script.section(section_id).unwrap().end_line_number(),
            Some(n(4))
        );
    }

    #[test]
    fn removing_inner_line_leaves_range_alone() {
        let mut script = script_with_lines(6);
        let section_id = script
            .open_section(n(2), SectionType::Scene, "1.2")
            .unwrap()
            .id();
        script.close_section(section_id, n(5)).unwrap();

        let removal = script.remove_line(id_of(&script, 3)).unwrap();

        assert!(removal.repairs.is_empty());
        assert_eq!(
            script.section(section_id).unwrap().range(),
            SectionRange::Bounded {
                start: n(2),
                end: n(5)
            }
        );
    }

    #[test]
    fn removing_only_line_of_section_detaches_it() {
        let mut script = script_with_lines(3);
        let section_id = script
            .open_section(n(2), SectionType::Preset, "Blackout")
            .unwrap()
            .id();
        script.close_section(section_id, n(2)).unwrap();

        let removal = script.remove_line(id_of(&script, 2)).unwrap();

        assert_eq!(removal.repairs[0].after, None);
        let section = script.section(section_id).unwrap();
        assert_eq!(section.status(), SectionStatus::Detached);
        assert!(script.sections_covering(n(1)).is_empty());
        assert!(script.sections_covering(n(3)).is_empty());
    }

    #[test]
    fn closing_a_detached_section_at_restored_lines_reattaches_it() {
        let mut script = script_with_lines(3);
        let section_id = script
            .open_section(n(2), SectionType::Scene, "S")
            .unwrap()
            .id();
        script.close_section(section_id, n(2)).unwrap();
        script.remove_line(id_of(&script, 2)).unwrap();
        script.add_line(n(2), "back again").unwrap();

        script.close_section(section_id, n(3)).unwrap();

        let section = script.section(section_id).unwrap();
        assert_eq!(section.status(), SectionStatus::Active);
        assert_eq!(section.end_line_number(), Some(n(3)));
        assert_eq!(script.sections_covering(n(2)).len(), 1);
        assert!(script.validate().is_empty());
    }

    #[test]
    fn detached_section_with_missing_start_rejects_close_and_reopen() {
        let mut script = script_with_lines(3);
        let section_id = script
            .open_section(n(2), SectionType::Scene, "S")
            .unwrap()
            .id();
        script.close_section(section_id, n(2)).unwrap();
        script.remove_line(id_of(&script, 2)).unwrap();
        let before = script.section(section_id).unwrap().clone();

        let expected = Error::SectionDetached {
            section_id,
            start: n(2),
        };
        assert_eq!(script.close_section(section_id, n(3)).unwrap_err(), expected);
        assert_eq!(script.reopen_section(section_id).unwrap_err(), expected);
        assert_eq!(script.section(section_id).unwrap(), &before);
    }

    #[test]
    fn reattach_moves_a_detached_section_onto_existing_lines() {
        let mut script = script_with_lines(4);
        let section_id = script
            .open_section(n(2), SectionType::SongNumber, "Overture")
            .unwrap()
            .id();
        script.close_section(section_id, n(2)).unwrap();
        script.remove_line(id_of(&script, 2)).unwrap();

        assert_eq!(
            script
                .reattach_section(section_id, n(2), None)
                .unwrap_err(),
            Error::LineNumberNotFound(n(2))
        );
        assert_eq!(
            script
                .reattach_section(section_id, n(4), Some(n(3)))
                .unwrap_err(),
            Error::InvalidRange(InvalidRange {
                start: n(4),
                end: n(3)
            })
        );

        script.reattach_section(section_id, n(3), None).unwrap();

        let section = script.section(section_id).unwrap();
        assert_eq!(section.status(), SectionStatus::Active);
        assert!(section.is_open());
        assert_eq!(script.sections_covering(n(4)).len(), 1);
        assert!(script.sections_covering(n(1)).is_empty());
    }

    #[test]
    fn removing_open_section_start_moves_to_next_line() {
        let mut script = script_with_lines(4);
        let section_id = script
            .open_section(n(4), SectionType::Act, "Act II")
            .unwrap()
            .id();

        script.remove_line(id_of(&script, 4)).unwrap();
        assert_eq!(
            script.section(section_id).unwrap().status(),
            SectionStatus::Detached
        );

        let mut script = script_with_lines(4);
        let section_id = script
            .open_section(n(2), SectionType::Act, "Act II")
            .unwrap()
            .id();
        script.remove_line(id_of(&script, 2)).unwrap();
        assert_eq!(
            script.section(section_id).unwrap().start_line_number(),
            n(3)
        );
    }

    #[test]
    fn open_and_close_require_existing_lines() {
        let mut script = script_with_lines(5);
        let err = script
            .open_section(n(9), SectionType::Act, "Act I")
            .unwrap_err();
        assert_eq!(err, Error::LineNumberNotFound(n(9)));

        let id = script
            .open_section(n(3), SectionType::Act, "Act I")
            .unwrap()
            .id();
        assert_eq!(
            script.close_section(id, n(9)).unwrap_err(),
            Error::LineNumberNotFound(n(9))
        );
        assert_eq!(
            script.close_section(id, n(2)).unwrap_err(),
            Error::InvalidRange(InvalidRange {
                start: n(3),
                end: n(2)
            })
        );
        assert!(script.section(id).unwrap().is_open());

        let unknown = Uuid::new_v4();
        assert_eq!(
            script.close_section(unknown, n(4)).unwrap_err(),
            Error::SectionNotFound(unknown)
        );
    }

    #[test]
    fn renumber_applies_mapping_to_lines_and_sections() {
        let mut script = script_with_lines(3);
        let first = id_of(&script, 1);
        let cue_id = script
            .attach_cue(first, CuePosition::after(0), CueType::LightingGo, "LX 1")
            .unwrap()
            .id();
        let section_id = script
            .open_section(n(1), SectionType::Act, "Act I")
            .unwrap()
            .id();
        script.close_section(section_id, n(3)).unwrap();

        let mapping = BTreeMap::from([(n(1), n(10)), (n(2), n(20)), (n(3), n(30))]);
        script.renumber_lines(&mapping).unwrap();

        let numbers: Vec<_> = script.lines().map(|line| line.number().get()).collect();
        assert_eq!(numbers, vec![10, 20, 30]);
        assert_eq!(script.line(first).unwrap().number(), n(10));
        assert_eq!(script.cue(cue_id).unwrap().line_id(), first);
        assert_eq!(
            script.section(section_id).unwrap().range(),
            SectionRange::Bounded {
                start: n(10),
                end: n(30)
            }
        );
        assert!(script.misplaced_cues().is_empty());
    }

    #[test]
    fn renumber_can_swap_lines() {
        let mut script = script_with_lines(2);
        let one = id_of(&script, 1);
        let mapping = BTreeMap::from([(n(1), n(2)), (n(2), n(1))]);
        script.renumber_lines(&mapping).unwrap();
        assert_eq!(script.line(one).unwrap().number(), n(2));
    }

    #[test]
    fn renumber_collision_is_atomic() {
        let mut script = script_with_lines(3);
        let before = script.clone();

        let mapping = BTreeMap::from([(n(1), n(3))]);
        let err = script.renumber_lines(&mapping).unwrap_err();

        assert_eq!(err, Error::DuplicateLineNumber(n(3)));
        assert_eq!(script, before);
    }

    #[test]
    fn renumber_rejects_unknown_source() {
        let mut script = script_with_lines(2);
        let mapping = BTreeMap::from([(n(7), n(8))]);
        assert_eq!(
            script.renumber_lines(&mapping).unwrap_err(),
            Error::LineNumberNotFound(n(7))
        );
    }

    #[test]
    fn renumber_rejects_inverted_section() {
        let mut script = script_with_lines(4);
        let section_id = script
            .open_section(n(1), SectionType::Scene, "1.1")
            .unwrap()
            .id();
        script.close_section(section_id, n(2)).unwrap();
        let before = script.clone();

        let mapping = BTreeMap::from([(n(1), n(5))]);
        let err = script.renumber_lines(&mapping).unwrap_err();

        assert!(matches!(err, Error::InvalidRange(_)));
        assert_eq!(script, before);
    }

    #[test]
    fn editing_line_rebases_and_orphans() {
        let mut script = Script::new("Edit");
        let line_id = script
            .add_line(n(1), "one two three four five")
            .unwrap()
            .id();
        let cue_id = script
            .attach_cue(line_id, CuePosition::after(4), CueType::LightingGo, "LX 3")
            .unwrap()
            .id();

        let report = script.set_line_content(line_id, "one two three").unwrap();

        assert_eq!(report.orphaned, vec![cue_id]);
        assert_eq!(script.orphaned_cues().count(), 1);
        assert_eq!(
            script.cue(cue_id).unwrap().status(),
            AnchorStatus::Orphaned
        );

        script
            .reanchor_cue(cue_id, CuePosition::after(2))
            .unwrap();
        assert_eq!(script.orphaned_cues().count(), 0);
    }

    #[test]
    fn detach_and_missing_cues() {
        let mut script = script_with_lines(1);
        let line_id = id_of(&script, 1);
        let cue_id = script
            .attach_cue(line_id, CuePosition::before(1), CueType::CuelightGo, "CL 1")
            .unwrap()
            .id();

        assert_eq!(script.detach_cue(cue_id).unwrap().id(), cue_id);
        assert_eq!(
            script.detach_cue(cue_id).unwrap_err(),
            Error::CueNotFound(cue_id)
        );
        assert_eq!(
            script
                .reanchor_cue(cue_id, CuePosition::before(0))
                .unwrap_err(),
            Error::CueNotFound(cue_id)
        );
    }

    #[test]
    fn haptic_requires_set_cue() {
        use crate::domain::kinds::StageLocation;

        let mut script = script_with_lines(1);
        let line_id = id_of(&script, 1);
        let lx = script
            .attach_cue(line_id, CuePosition::before(0), CueType::LightingGo, "LX 1")
            .unwrap()
            .id();
        let set = script
            .attach_cue(line_id, CuePosition::before(0), CueType::SetGo, "Truck in")
            .unwrap()
            .id();
        let target = HapticTarget {
            location: StageLocation::LeftWing,
            crew_id: 0,
        };

        assert_eq!(
            script.set_cue_haptic(lx, target).unwrap_err(),
            Error::HapticNotSupported(CueType::LightingGo)
        );
        script.set_cue_haptic(set, target).unwrap();
        assert_eq!(script.cue(set).unwrap().haptic(), Some(target));
    }

    #[test]
    fn mark_element_reports_missing_position() {
        let mut script = script_with_lines(1);
        let line_id = id_of(&script, 1);
        script
            .mark_element(line_id, 1, Some(MarkColor::Green))
            .unwrap();
        assert_eq!(
            script.mark_element(line_id, 8, None).unwrap_err(),
            Error::ElementNotFound {
                line: n(1),
                position: 8
            }
        );
    }

    #[test]
    fn remove_section_leaves_lines() {
        let mut script = script_with_lines(2);
        let id = script
            .open_section(n(1), SectionType::Custom, "Notes")
            .unwrap()
            .id();
        assert_eq!(script.remove_section(id).unwrap().id(), id);
        assert_eq!(script.line_count(), 2);
        assert_eq!(
            script.remove_section(id).unwrap_err(),
            Error::SectionNotFound(id)
        );
    }
}
