use uuid::Uuid;

use crate::domain::{
    LineNumber,
    cue::{Cue, CuePosition, OutOfRangeAnchor},
    decompose::{self, DecomposeOptions},
    kinds::{CueType, ElementType, MarkColor},
};

/// One addressable piece of a line: a word, a space or punctuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineElement {
    pub(crate) id: Uuid,
    pub(crate) position: usize,
    pub(crate) content: String,
    pub(crate) kind: ElementType,
    pub(crate) is_marked: bool,
    pub(crate) mark_color: Option<MarkColor>,
}

impl LineElement {
    pub(crate) fn new_with_uuid(
        id: Uuid,
        position: usize,
        content: String,
        kind: ElementType,
    ) -> Self {
        Self {
            id,
            position,
            content,
            kind,
            is_marked: false,
            mark_color: None,
        }
    }

    /// The element's unique identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Zero-based index within the line.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// The element text. Empty for a space.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// How the element was classified.
    #[must_use]
    pub const fn kind(&self) -> ElementType {
        self.kind
    }

    /// Whether the word is highlighted.
    #[must_use]
    pub const fn is_marked(&self) -> bool {
        self.is_marked
    }

    /// The highlight color, if one was chosen.
    #[must_use]
    pub const fn mark_color(&self) -> Option<MarkColor> {
        self.mark_color
    }
}

/// A cue that moved when its line was re-decomposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueMove {
    /// The cue that moved.
    pub cue_id: Uuid,
    /// Anchor index before the edit.
    pub from: usize,
    /// Anchor index after the edit.
    pub to: usize,
}

/// What happened to a line's cues when its elements were rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebaseReport {
    /// Cues whose anchor word was found at a different index.
    pub moved: Vec<CueMove>,
    /// Cues whose anchor word could not be found. They are kept, flagged as
    /// orphaned, and need the caller's attention.
    pub orphaned: Vec<Uuid>,
    /// Old positions of highlighted words that could not be found in the new
    /// text. Their highlight is gone.
    pub dropped_marks: Vec<usize>,
}

impl RebaseReport {
    /// No cue was orphaned by the edit.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty()
    }
}

/// Stored line text no longer matches its elements.
///
/// This happens after an element is edited on its own. It is a warning for
/// manual reconciliation; the stored text is never rewritten to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructionMismatch {
    /// The affected line.
    pub line_id: Uuid,
    /// The line's stored `content`.
    pub stored: String,
    /// The text rebuilt from the elements.
    pub reconstructed: String,
}

/// One line of script text together with its elements and cues.
///
/// Elements are always materialized: every constructor decomposes the text
/// before returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub(crate) id: Uuid,
    pub(crate) number: LineNumber,
    pub(crate) content: String,
    pub(crate) elements: Vec<LineElement>,
    pub(crate) cues: Vec<Cue>,
    pub(crate) is_marked: bool,
    pub(crate) mark_color: Option<MarkColor>,
    /// Free-form notes.
    pub notes: String,
}

impl Line {
    /// Construct a line, decomposing `content` with default options.
    ///
    /// A new UUID is generated.
    #[must_use]
    pub fn new(number: LineNumber, content: impl Into<String>) -> Self {
        Self::new_with_uuid(
            Uuid::new_v4(),
            number,
            content.into(),
            DecomposeOptions::default(),
        )
    }

    /// Construct a line with a caller-chosen id and decomposition options.
    #[must_use]
    pub fn new_with_uuid(
        id: Uuid,
        number: LineNumber,
        content: String,
        options: DecomposeOptions,
    ) -> Self {
        let elements = materialize(&content, options);
        Self {
            id,
            number,
            content,
            elements,
            cues: Vec::new(),
            is_marked: false,
            mark_color: None,
            notes: String::new(),
        }
    }

    /// The line's unique identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The line number within the owning script.
    #[must_use]
    pub const fn number(&self) -> LineNumber {
        self.number
    }

    /// The raw text. This is the source of truth for display and editing.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Elements in position order.
    #[must_use]
    pub fn elements(&self) -> &[LineElement] {
        &self.elements
    }

    /// The element at `position`.
    #[must_use]
    pub fn element(&self, position: usize) -> Option<&LineElement> {
        self.elements.get(position)
    }

    /// Cues anchored to this line, in the order they were attached.
    #[must_use]
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// A cue on this line by id.
    #[must_use]
    pub fn cue(&self, cue_id: Uuid) -> Option<&Cue> {
        self.cues.iter().find(|cue| cue.id == cue_id)
    }

    /// Mutable access to a cue's label, notes and alert settings.
    pub fn cue_mut(&mut self, cue_id: Uuid) -> Option<&mut Cue> {
        self.cues.iter_mut().find(|cue| cue.id == cue_id)
    }

    /// Whether the whole line is highlighted.
    #[must_use]
    pub const fn is_marked(&self) -> bool {
        self.is_marked
    }

    /// The line's highlight color, if one was chosen.
    #[must_use]
    pub const fn mark_color(&self) -> Option<MarkColor> {
        self.mark_color
    }

    /// Highlight the line.
    pub const fn mark(&mut self, color: Option<MarkColor>) {
        self.is_marked = true;
        self.mark_color = color;
    }

    /// Remove the line highlight.
    pub const fn unmark(&mut self) {
        self.is_marked = false;
        self.mark_color = None;
    }

    /// Highlight a single element.
    ///
    /// Returns `false` if there is no element at `position`.
    pub fn mark_element(&mut self, position: usize, color: Option<MarkColor>) -> bool {
        let Some(element) = self.elements.get_mut(position) else {
            return false;
        };
        element.is_marked = true;
        element.mark_color = color;
        true
    }

    /// Remove the highlight from a single element.
    ///
    /// Returns `false` if there is no element at `position`.
    pub fn unmark_element(&mut self, position: usize) -> bool {
        let Some(element) = self.elements.get_mut(position) else {
            return false;
        };
        element.is_marked = false;
        element.mark_color = None;
        true
    }

    /// Rebuild the text from the elements.
    #[must_use]
    pub fn reconstruct_content(&self) -> String {
        decompose::reconstruct(
            self.elements
                .iter()
                .map(|element| (element.position, element.content.as_str())),
        )
    }

    /// Compare the stored text to the text rebuilt from the elements.
    #[must_use]
    pub fn reconstruction_mismatch(&self) -> Option<ReconstructionMismatch> {
        let reconstructed = self.reconstruct_content();
        (reconstructed != self.content).then(|| ReconstructionMismatch {
            line_id: self.id,
            stored: self.content.clone(),
            reconstructed,
        })
    }

    /// Edit the text of one element without touching the stored content.
    ///
    /// The element is reclassified. Returns `false` if there is no element at
    /// `position`. Afterwards [`Line::reconstruction_mismatch`] reports the
    /// divergence.
    pub fn set_element_content(
        &mut self,
        position: usize,
        text: impl Into<String>,
        options: DecomposeOptions,
    ) -> bool {
        let Some(element) = self.elements.get_mut(position) else {
            return false;
        };
        element.content = text.into();
        element.kind = decompose::classify(&element.content, options);
        true
    }

    /// Replace the text, rebuild the elements and rebase every cue.
    ///
    /// See [`Line::redecompose`] for how cues are rebased.
    pub fn set_content(
        &mut self,
        content: impl Into<String>,
        options: DecomposeOptions,
        rebase_window: usize,
    ) -> RebaseReport {
        self.content = content.into();
        self.redecompose(options, rebase_window)
    }

    /// Rebuild the elements from the stored text and rebase every cue.
    ///
    /// Each anchored cue looks for its old anchor word in the new elements,
    /// starting at its old index and working outwards (−1, +1, −2, +2, …) up
    /// to `rebase_window` positions away. A cue whose word is not found is
    /// flagged as orphaned and keeps its last index. Cues that were already
    /// orphaned are left alone.
    ///
    /// Word highlights follow their word the same way; a highlight whose word
    /// is not found is listed in [`RebaseReport::dropped_marks`].
    pub fn redecompose(&mut self, options: DecomposeOptions, rebase_window: usize) -> RebaseReport {
        let old = std::mem::replace(&mut self.elements, materialize(&self.content, options));
        let mut report = RebaseReport::default();

        for marked in old.iter().filter(|element| element.is_marked) {
            let target = stable_match(&old, &self.elements, marked.position, rebase_window)
                .and_then(|to| self.elements.get_mut(to));
            match target {
                Some(element) => {
                    element.is_marked = true;
                    element.mark_color = element.mark_color.or(marked.mark_color);
                }
                None => {
                    tracing::debug!(line = %self.number, position = marked.position, "word highlight dropped");
                    report.dropped_marks.push(marked.position);
                }
            }
        }

        for cue in &mut self.cues {
            if cue.is_orphaned() {
                continue;
            }
            let from = cue.position.element_index;
            match stable_match(&old, &self.elements, from, rebase_window) {
                Some(to) => {
                    if to != from {
                        tracing::debug!(cue = %cue.id, from, to, "rebased cue anchor");
                        report.moved.push(CueMove {
                            cue_id: cue.id,
                            from,
                            to,
                        });
                    }
                    cue.anchor_at(CuePosition {
                        element_index: to,
                        offset: cue.position.offset,
                    });
                }
                None => {
                    tracing::warn!(cue = %cue.id, line = %self.number, from, "cue anchor orphaned");
                    cue.orphan();
                    report.orphaned.push(cue.id);
                }
            }
        }

        report
    }

    /// Anchor a new cue to this line.
    ///
    /// Several cues may share an anchor.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeAnchor`] if the position does not name an element
    /// of this line.
    pub fn attach_cue(
        &mut self,
        position: CuePosition,
        kind: CueType,
        label: impl Into<String>,
    ) -> Result<&mut Cue, OutOfRangeAnchor> {
        self.attach_cue_with_uuid(Uuid::new_v4(), position, kind, label.into())
    }

    /// As [`Line::attach_cue`], with a caller-chosen cue id.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeAnchor`] if the position does not name an element
    /// of this line.
    pub fn attach_cue_with_uuid(
        &mut self,
        id: Uuid,
        position: CuePosition,
        kind: CueType,
        label: String,
    ) -> Result<&mut Cue, OutOfRangeAnchor> {
        let position = position.validate(self.elements.len())?;
        self.cues
            .push(Cue::new_with_uuid(id, self.id, position, kind, label));
        let index = self.cues.len() - 1;
        Ok(&mut self.cues[index])
    }

    /// Remove a cue from this line, returning it.
    pub fn detach_cue(&mut self, cue_id: Uuid) -> Option<Cue> {
        let index = self.cues.iter().position(|cue| cue.id == cue_id)?;
        Some(self.cues.remove(index))
    }

    /// Move a cue to a new anchor, clearing any orphaned status.
    ///
    /// Returns `Ok(false)` if the cue is not on this line.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeAnchor`] if the position does not name an element
    /// of this line. The cue is left unchanged.
    pub fn reanchor_cue(
        &mut self,
        cue_id: Uuid,
        position: CuePosition,
    ) -> Result<bool, OutOfRangeAnchor> {
        let position = position.validate(self.elements.len())?;
        let Some(cue) = self.cue_mut(cue_id) else {
            return Ok(false);
        };
        cue.anchor_at(position);
        Ok(true)
    }
}

fn materialize(content: &str, options: DecomposeOptions) -> Vec<LineElement> {
    decompose::decompose(content, options)
        .into_iter()
        .map(|token| {
            LineElement::new_with_uuid(
                Uuid::new_v4(),
                token.position,
                token.text.to_string(),
                token.kind,
            )
        })
        .collect()
}

/// Find the old anchor word in the new elements, searching outwards from
/// `index` and preferring the earlier position at equal distance.
fn stable_match(
    old: &[LineElement],
    new: &[LineElement],
    index: usize,
    window: usize,
) -> Option<usize> {
    let target = old.get(index)?.content.as_str();
    let matches = |candidate: usize| new.get(candidate).is_some_and(|e| e.content == target);

    (0..=window).find_map(|distance| {
        let below = index.checked_sub(distance).filter(|&c| matches(c));
        let above = (distance > 0)
            .then(|| index + distance)
            .filter(|&c| matches(c));
        below.or(above)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{cue::AnchorStatus, kinds::CueOffset};

    fn line(text: &str) -> Line {
        Line::new(LineNumber::FIRST, text)
    }

    fn rebase(line: &mut Line, text: &str) -> RebaseReport {
        line.set_content(text, DecomposeOptions::default(), 3)
    }

    #[test]
    fn elements_are_materialized_on_construction() {
        let line = line("LX Q5 standby GO");
        assert_eq!(line.elements().len(), 4);
        assert!(
            line.elements()
                .iter()
                .all(|element| element.kind() == ElementType::Word)
        );
        assert_eq!(line.reconstruct_content(), "LX Q5 standby GO");
        assert_eq!(line.reconstruction_mismatch(), None);
    }

    #[test]
    fn attach_cue_rejects_out_of_range_anchor() {
        let mut line = line("one two three");
        let err = line
            .attach_cue(CuePosition::before(3), CueType::SoundGo, "SQ 1")
            .unwrap_err();
        assert_eq!(err.element_index, 3);
        assert_eq!(err.element_count, 3);
        assert!(line.cues().is_empty());
    }

    #[test]
    fn cues_may_share_an_anchor() {
        let mut line = line("one two three");
        let line_id = line.id();
        line.attach_cue(CuePosition::after(1), CueType::LightingStandby, "LX 1")
            .unwrap();
        let cue = line
            .attach_cue(CuePosition::after(1), CueType::SoundStandby, "SQ 1")
            .unwrap();
        assert_eq!(cue.line_id(), line_id);
        assert_eq!(line.cues().len(), 2);
    }

    #[test]
    fn rebase_follows_word_when_text_is_inserted_before_it() {
        let mut line = line("to be or not");
        let cue_id = line
            .attach_cue(CuePosition::after(3), CueType::LightingGo, "LX 7")
            .unwrap()
            .id();

        let report = rebase(&mut line, "oh to be or not");

        assert_eq!(
            report.moved,
            vec![CueMove {
                cue_id,
                from: 3,
                to: 4
            }]
        );
        assert!(report.is_clean());
        let cue = line.cue(cue_id).unwrap();
        assert_eq!(cue.position().element_index, 4);
        assert_eq!(cue.position().offset, CueOffset::After);
    }

    #[test]
    fn rebase_keeps_anchor_in_place_when_word_is_unchanged() {
        let mut line = line("alpha beta gamma");
        let cue_id = line
            .attach_cue(CuePosition::before(1), CueType::FlyGo, "Fly 2")
            .unwrap()
            .id();

        let report = rebase(&mut line, "alpha beta delta");

        assert!(report.moved.is_empty());
        assert!(report.orphaned.is_empty());
        assert_eq!(line.cue(cue_id).unwrap().position().element_index, 1);
    }

    #[test]
    fn rebase_prefers_earlier_match_at_equal_distance() {
        let mut line = line("a x b");
        let cue_id = line
            .attach_cue(CuePosition::after(1), CueType::SetGo, "Set 1")
            .unwrap()
            .id();

        let report = rebase(&mut line, "x q x");

        assert_eq!(report.moved.len(), 1);
        assert_eq!(line.cue(cue_id).unwrap().position().element_index, 0);
    }

    #[test]
    fn shrinking_line_orphans_cue_without_deleting_it() {
        let mut line = line("one two three four five");
        let cue_id = line
            .attach_cue(CuePosition::after(4), CueType::LightingGo, "LX 9")
            .unwrap()
            .id();

        let report = rebase(&mut line, "one two three");

        assert_eq!(report.orphaned, vec![cue_id]);
        let cue = line.cue(cue_id).expect("orphaned cue is kept");
        assert_eq!(cue.status(), AnchorStatus::Orphaned);
        assert_eq!(cue.position().element_index, 4);
    }

    #[test]
    fn window_bounds_the_search() {
        let mut line = line("target a b c");
        let cue_id = line
            .attach_cue(CuePosition::before(0), CueType::SoundStandby, "SQ 4")
            .unwrap()
            .id();

        let report = line.set_content("p q r s target", DecomposeOptions::default(), 2);
        assert_eq!(report.orphaned, vec![cue_id]);

        let mut line = Line::new(LineNumber::FIRST, "target a b c");
        let cue_id = line
            .attach_cue(CuePosition::before(0), CueType::SoundStandby, "SQ 4")
            .unwrap()
            .id();
        let report = line.set_content("p q r s target", DecomposeOptions::default(), 4);
        assert!(report.is_clean());
        assert_eq!(line.cue(cue_id).unwrap().position().element_index, 4);
    }

    #[test]
    fn orphaned_cues_are_not_rebased_again() {
        let mut line = line("one two three four five");
        let cue_id = line
            .attach_cue(CuePosition::after(4), CueType::LightingGo, "LX 9")
            .unwrap()
            .id();
        rebase(&mut line, "one two");

        let report = rebase(&mut line, "one two three four five");
        assert!(report.orphaned.is_empty());
        assert!(line.cue(cue_id).unwrap().is_orphaned());
    }

    #[test]
    fn reanchor_validates_against_current_elements() {
        let mut line = line("one two");
        let cue_id = line
            .attach_cue(CuePosition::after(1), CueType::AutomationGo, "Auto 1")
            .unwrap()
            .id();

        assert!(line.reanchor_cue(cue_id, CuePosition::before(2)).is_err());
        assert_eq!(line.cue(cue_id).unwrap().position(), CuePosition::after(1));

        assert_eq!(line.reanchor_cue(Uuid::new_v4(), CuePosition::before(0)), Ok(false));
    }

    #[test]
    fn element_edit_surfaces_mismatch_without_rewriting_content() {
        let mut line = line("the quick fox");
        assert!(line.set_element_content(1, "slow", DecomposeOptions::default()));

        let mismatch = line.reconstruction_mismatch().unwrap();
        assert_eq!(mismatch.stored, "the quick fox");
        assert_eq!(mismatch.reconstructed, "the slow fox");
        assert_eq!(line.content(), "the quick fox");

        assert!(!line.set_element_content(9, "x", DecomposeOptions::default()));
    }

    #[test]
    fn marking() {
        let mut line = line("mark my words");
        line.mark(Some(MarkColor::Pink));
        assert!(line.is_marked());
        assert_eq!(line.mark_color(), Some(MarkColor::Pink));

        assert!(line.mark_element(2, Some(MarkColor::Yellow)));
        assert!(line.element(2).unwrap().is_marked());
        assert!(!line.mark_element(3, None));

        line.unmark();
        assert!(!line.is_marked());
        assert!(line.unmark_element(2));
        assert_eq!(line.element(2).unwrap().mark_color(), None);
    }

    #[test]
    fn word_highlights_follow_their_word_across_edits() {
        let mut line = line("once more unto the breach");
        assert!(line.mark_element(4, Some(MarkColor::Green)));
        assert!(line.mark_element(1, None));

        let report = rebase(&mut line, "once unto the breach dear friends");

        let breach = line.element(3).unwrap();
        assert_eq!(breach.content(), "breach");
        assert!(breach.is_marked());
        assert_eq!(breach.mark_color(), Some(MarkColor::Green));
        assert_eq!(report.dropped_marks, vec![1]);
        assert_eq!(
            line.elements().iter().filter(|e| e.is_marked()).count(),
            1
        );
    }

    #[test]
    fn detach_removes_only_that_cue() {
        let mut line = line("a b");
        let first = line
            .attach_cue(CuePosition::before(0), CueType::SoundGo, "SQ 1")
            .unwrap()
            .id();
        let second = line
            .attach_cue(CuePosition::after(1), CueType::SoundGo, "SQ 2")
            .unwrap()
            .id();

        let removed = line.detach_cue(first).unwrap();
        assert_eq!(removed.id(), first);
        assert!(line.cue(second).is_some());
        assert!(line.detach_cue(first).is_none());
    }
}
