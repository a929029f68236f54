//! Non-fatal findings about a script.
//!
//! Structural violations are rejected when they are attempted (see
//! [`script::Error`](crate::domain::script::Error)). What remains are states
//! the model allows but that need a person to look at them: cues that lost
//! their word, lines whose elements were edited apart from their text, and
//! sections that drifted away from the lines they describe.

use std::fmt;

use uuid::Uuid;

use crate::domain::{
    LineNumber, Script,
    line::ReconstructionMismatch,
    section::{SectionRange, SectionStatus},
};

/// Something in a script that needs the caller's attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A cue's anchor word disappeared when its line was edited.
    OrphanedCueAnchor {
        /// The line holding the cue.
        line: LineNumber,
        /// The orphaned cue.
        cue_id: Uuid,
        /// The cue's label.
        label: String,
    },
    /// A line's elements no longer rebuild its stored text.
    ReconstructionMismatch {
        /// The affected line.
        line: LineNumber,
        /// Stored and rebuilt text.
        detail: ReconstructionMismatch,
    },
    /// A cue's `line_id` names a different line than the one holding it.
    MisplacedCue {
        /// The cue.
        cue_id: Uuid,
        /// The line that holds it.
        held_by: Uuid,
    },
    /// A section lost every line it covered.
    DetachedSection {
        /// The section.
        section_id: Uuid,
        /// The section's title.
        title: String,
    },
    /// A section bound names a line that does not exist.
    DanglingSectionBound {
        /// The section.
        section_id: Uuid,
        /// The section's title.
        title: String,
        /// The missing line.
        line: LineNumber,
    },
    /// Two sections partially overlap without one containing the other.
    CrossingSections {
        /// The section opened first.
        first: Uuid,
        /// The section opened later.
        second: Uuid,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrphanedCueAnchor { line, label, .. } => {
                write!(f, "line {line}: cue '{label}' lost its anchor word")
            }
            Self::ReconstructionMismatch { line, detail } => write!(
                f,
                "line {line}: elements read '{}' but the line reads '{}'",
                detail.reconstructed, detail.stored
            ),
            Self::MisplacedCue { cue_id, held_by } => {
                write!(f, "cue {cue_id} is held by line {held_by} but refers elsewhere")
            }
            Self::DetachedSection { title, .. } => {
                write!(f, "section '{title}' no longer covers any line; reattach or remove it")
            }
            Self::DanglingSectionBound { title, line, .. } => {
                write!(f, "section '{title}' refers to missing line {line}")
            }
            Self::CrossingSections { first, second } => {
                write!(f, "sections {first} and {second} partially overlap")
            }
        }
    }
}

impl Script {
    /// Collect every [`Diagnostic`] for this script, in line order then
    /// section order.
    #[must_use]
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for line in self.lines() {
            if let Some(detail) = line.reconstruction_mismatch() {
                diagnostics.push(Diagnostic::ReconstructionMismatch {
                    line: line.number(),
                    detail,
                });
            }
            for cue in line.cues().iter().filter(|cue| cue.is_orphaned()) {
                diagnostics.push(Diagnostic::OrphanedCueAnchor {
                    line: line.number(),
                    cue_id: cue.id(),
                    label: cue.label.clone(),
                });
            }
        }

        diagnostics.extend(
            self.misplaced_cues()
                .into_iter()
                .map(|(cue_id, held_by)| Diagnostic::MisplacedCue { cue_id, held_by }),
        );

        for section in self.sections() {
            if section.status() == SectionStatus::Detached {
                diagnostics.push(Diagnostic::DetachedSection {
                    section_id: section.id(),
                    title: section.title.clone(),
                });
                continue;
            }
            let bounds = match section.range() {
                SectionRange::OpenFrom { start } => vec![start],
                SectionRange::Bounded { start, end } => vec![start, end],
            };
            for bound in bounds {
                if self.line_by_number(bound).is_none() {
                    diagnostics.push(Diagnostic::DanglingSectionBound {
                        section_id: section.id(),
                        title: section.title.clone(),
                        line: bound,
                    });
                }
            }
        }

        if self.config().warn_crossing_sections {
            let last = self.last_line_number();
            let sections = self.sections();
            for (i, first) in sections.iter().enumerate() {
                for second in &sections[i + 1..] {
                    if first.crosses(second, last) {
                        diagnostics.push(Diagnostic::CrossingSections {
                            first: first.id(),
                            second: second.id(),
                        });
                    }
                }
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Config, CuePosition,
        kinds::{CueType, SectionType},
    };

    fn n(number: usize) -> LineNumber {
        LineNumber::try_from(number).unwrap()
    }

    fn script_with_lines(count: usize) -> Script {
        let mut script = Script::new("Validate");
        for i in 1..=count {
            script.add_line(n(i), format!("word{i} another")).unwrap();
        }
        script
    }

    #[test]
    fn clean_script_has_no_diagnostics() {
        let mut script = script_with_lines(3);
        let id = script
            .open_section(n(1), SectionType::Act, "Act I")
            .unwrap()
            .id();
        script.close_section(id, n(3)).unwrap();
        assert!(script.validate().is_empty());
    }

    #[test]
    fn reports_orphaned_cue() {
        let mut script = script_with_lines(1);
        let line_id = script.line_by_number(n(1)).unwrap().id();
        let cue_id = script
            .attach_cue(line_id, CuePosition::after(1), CueType::SoundGo, "SQ 2")
            .unwrap()
            .id();
        script.set_line_content(line_id, "gone").unwrap();

        assert_eq!(
            script.validate(),
            vec![Diagnostic::OrphanedCueAnchor {
                line: n(1),
                cue_id,
                label: "SQ 2".to_string(),
            }]
        );
    }

    #[test]
    fn reports_reconstruction_mismatch() {
        let mut script = script_with_lines(1);
        let line_id = script.line_by_number(n(1)).unwrap().id();
        let options = script.config().decompose_options();
        script
            .line_mut(line_id)
            .unwrap()
            .set_element_content(1, "edited", options);

        let diagnostics = script.validate();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].to_string(),
            "line 1: elements read 'word1 edited' but the line reads 'word1 another'"
        );
    }

    #[test]
    fn reports_detached_and_dangling_sections() {
        let mut script = script_with_lines(3);
        let lonely = script
            .open_section(n(2), SectionType::Preset, "Shift")
            .unwrap()
            .id();
        script.close_section(lonely, n(2)).unwrap();
        let line_two = script.line_by_number(n(2)).unwrap().id();
        script.remove_line(line_two).unwrap();

        let drifting = script
            .open_section(n(1), SectionType::Scene, "1.1")
            .unwrap()
            .id();
        script.section_mut(drifting).unwrap().close(n(9)).unwrap();

        let diagnostics = script.validate();
        assert!(diagnostics.contains(&Diagnostic::DetachedSection {
            section_id: lonely,
            title: "Shift".to_string(),
        }));
        assert!(diagnostics.contains(&Diagnostic::DanglingSectionBound {
            section_id: drifting,
            title: "1.1".to_string(),
            line: n(9),
        }));
    }

    #[test]
    fn crossing_sections_respect_config() {
        let mut script = script_with_lines(10);
        let a = script
            .open_section(n(1), SectionType::Scene, "A")
            .unwrap()
            .id();
        script.close_section(a, n(6)).unwrap();
        let b = script
            .open_section(n(4), SectionType::Scene, "B")
            .unwrap()
            .id();
        script.close_section(b, n(9)).unwrap();
        let nested = script
            .open_section(n(2), SectionType::SongNumber, "Song")
            .unwrap()
            .id();
        script.close_section(nested, n(3)).unwrap();

        assert_eq!(
            script.validate(),
            vec![Diagnostic::CrossingSections {
                first: a,
                second: b
            }]
        );

        let mut config = Config::default();
        config.warn_crossing_sections = false;
        script.set_config(config);
        assert!(script.validate().is_empty());
    }
}
