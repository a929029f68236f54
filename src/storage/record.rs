//! Plain-old-data mirrors of the domain types.
//!
//! Field names are camelCase and enum values use their wire form, so a
//! document written by one version of the crate stays readable by the next.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Config, Cue, CuePosition, HapticTarget, Line, LineElement, LineNumber, Script, Section,
    SectionRange, SectionStatus,
    cue::AnchorStatus,
    kinds::{CueOffset, CueType, ElementType, MarkColor, SectionType, StageLocation},
};

/// A whole script, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct ScriptRecord {
    /// Script id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Creation time.
    pub date_added: DateTime<Utc>,
    /// Lines in line-number order.
    pub lines: Vec<LineRecord>,
    /// Sections in the order they were opened.
    pub sections: Vec<SectionRecord>,
}

/// A stored line with the elements and cues it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    /// Line id.
    pub id: Uuid,
    /// Line number, unique within the script.
    pub line_number: LineNumber,
    /// Raw text.
    pub content: String,
    /// Whether the whole line is highlighted.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_marked: bool,
    /// Highlight color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_color: Option<MarkColor>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    /// Elements in position order.
    pub elements: Vec<ElementRecord>,
    /// Cues anchored to this line.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cues: Vec<CueRecord>,
}

/// A stored line element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    /// Element id.
    pub id: Uuid,
    /// Zero-based index within the line.
    pub position: usize,
    /// Element text.
    pub content: String,
    /// Word, space or punctuation.
    pub element_type: ElementType,
    /// Whether the element is highlighted.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_marked: bool,
    /// Highlight color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_color: Option<MarkColor>,
}

/// A stored cue anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuePositionRecord {
    /// Index of the anchor element.
    pub element_index: usize,
    /// `before` or `after`.
    pub offset: CueOffset,
}

/// A stored crew haptic target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HapticRecord {
    /// Where the crew member is stationed.
    pub location: StageLocation,
    /// Crew identifier.
    pub crew_id: u32,
}

/// A stored cue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueRecord {
    /// Cue id.
    pub id: Uuid,
    /// Id of the owning line.
    pub line_id: Uuid,
    /// Anchor within the line.
    pub position: CuePositionRecord,
    /// Whether the anchor was lost in an edit.
    #[serde(default, skip_serializing_if = "is_false")]
    pub orphaned: bool,
    /// Department and action.
    pub cue_type: CueType,
    /// Call text.
    pub label: String,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    /// Whether an external alert should fire.
    #[serde(default, skip_serializing_if = "is_false")]
    pub has_alert: bool,
    /// Alert sound asset name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_sound: Option<String>,
    /// Crew member to pulse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub haptic: Option<HapticRecord>,
}

/// A stored section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    /// Section id.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Act, scene, ...
    #[serde(rename = "type")]
    pub section_type: SectionType,
    /// First line, inclusive.
    pub start_line_number: LineNumber,
    /// Last line, inclusive. Absent while the section is open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line_number: Option<LineNumber>,
    /// Whether the section lost all of its lines.
    #[serde(default, skip_serializing_if = "is_false")]
    pub detached: bool,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

const fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1", rename_all = "camelCase")]
    V1 {
        id: Uuid,
        name: String,
        date_added: DateTime<Utc>,
        #[serde(default)]
        lines: Vec<LineRecord>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        sections: Vec<SectionRecord>,
    },
}

impl From<Versions> for ScriptRecord {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                id,
                name,
                date_added,
                lines,
                sections,
            } => Self {
                id,
                name,
                date_added,
                lines,
                sections,
            },
        }
    }
}

impl From<ScriptRecord> for Versions {
    fn from(record: ScriptRecord) -> Self {
        let ScriptRecord {
            id,
            name,
            date_added,
            lines,
            sections,
        } = record;
        Self::V1 {
            id,
            name,
            date_added,
            lines,
            sections,
        }
    }
}

impl From<&Script> for ScriptRecord {
    fn from(script: &Script) -> Self {
        Self {
            id: script.id(),
            name: script.name.clone(),
            date_added: script.date_added(),
            lines: script.lines().map(LineRecord::from).collect(),
            sections: script.sections().iter().map(SectionRecord::from).collect(),
        }
    }
}

impl From<&Line> for LineRecord {
    fn from(line: &Line) -> Self {
        Self {
            id: line.id,
            line_number: line.number,
            content: line.content.clone(),
            is_marked: line.is_marked,
            mark_color: line.mark_color,
            notes: line.notes.clone(),
            elements: line.elements.iter().map(ElementRecord::from).collect(),
            cues: line.cues.iter().map(CueRecord::from).collect(),
        }
    }
}

impl From<&LineElement> for ElementRecord {
    fn from(element: &LineElement) -> Self {
        Self {
            id: element.id,
            position: element.position,
            content: element.content.clone(),
            element_type: element.kind,
            is_marked: element.is_marked,
            mark_color: element.mark_color,
        }
    }
}

impl From<&Cue> for CueRecord {
    fn from(cue: &Cue) -> Self {
        Self {
            id: cue.id,
            line_id: cue.line_id,
            position: CuePositionRecord {
                element_index: cue.position.element_index,
                offset: cue.position.offset,
            },
            orphaned: cue.is_orphaned(),
            cue_type: cue.kind,
            label: cue.label.clone(),
            notes: cue.notes.clone(),
            has_alert: cue.has_alert,
            alert_sound: cue.alert_sound.clone(),
            haptic: cue.haptic.map(|target| HapticRecord {
                location: target.location,
                crew_id: target.crew_id,
            }),
        }
    }
}

impl From<&Section> for SectionRecord {
    fn from(section: &Section) -> Self {
        Self {
            id: section.id,
            title: section.title.clone(),
            section_type: section.kind,
            start_line_number: section.start_line_number(),
            end_line_number: section.end_line_number(),
            detached: section.status == SectionStatus::Detached,
            notes: section.notes.clone(),
        }
    }
}

/// A stored document breaks a structural rule of the model.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidRecord {
    /// Two lines share a number.
    #[error("line number {0} appears more than once")]
    DuplicateLineNumber(LineNumber),

    /// Two entities share an id.
    #[error("id {0} appears more than once")]
    DuplicateId(Uuid),

    /// Element positions are not `0..n` in order.
    #[error("line {line}: element at index {index} has position {position}")]
    ElementPosition {
        /// The line holding the element.
        line: LineNumber,
        /// The element's index in the stored list.
        index: usize,
        /// The position it claims.
        position: usize,
    },

    /// A line has no elements.
    #[error("line {0} has no elements")]
    NoElements(LineNumber),

    /// A cue names a line other than the one holding it.
    #[error("line {line}: cue {cue_id} belongs to line {claimed}")]
    CueLine {
        /// The line holding the cue.
        line: LineNumber,
        /// The cue.
        cue_id: Uuid,
        /// The line id the cue claims.
        claimed: Uuid,
    },

    /// An anchored cue points past the end of its line.
    #[error("line {line}: cue {cue_id} is anchored to missing element {element_index}")]
    CueAnchor {
        /// The line holding the cue.
        line: LineNumber,
        /// The cue.
        cue_id: Uuid,
        /// The missing index.
        element_index: usize,
    },

    /// A cue type that cannot deliver haptics has a haptic target.
    #[error("cue {cue_id}: {kind} cues cannot deliver haptic alerts")]
    Haptic {
        /// The cue.
        cue_id: Uuid,
        /// Its type.
        kind: CueType,
    },

    /// A section ends before it starts.
    #[error("section {section_id}: end line {end} is before start line {start}")]
    SectionRange {
        /// The section.
        section_id: Uuid,
        /// Its start line.
        start: LineNumber,
        /// Its end line.
        end: LineNumber,
    },
}

impl ScriptRecord {
    /// Rebuild the domain script, checking every structural rule.
    ///
    /// Elements are taken as stored rather than re-derived from the line
    /// text, so independent element edits survive and show up in
    /// [`Script::validate`].
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidRecord`] found.
    pub fn into_script(self, config: Config) -> Result<Script, InvalidRecord> {
        let mut ids = HashSet::new();
        let mut claim = |id: Uuid| {
            if ids.insert(id) {
                Ok(())
            } else {
                Err(InvalidRecord::DuplicateId(id))
            }
        };

        let mut script = Script::new_with_uuid(self.id, self.name, self.date_added, config);

        for record in self.lines {
            claim(record.id)?;
            for element in &record.elements {
                claim(element.id)?;
            }
            for cue in &record.cues {
                claim(cue.id)?;
            }
            let number = record.line_number;
            let line = record.into_line()?;
            script
                .insert_line(line)
                .map_err(|_| InvalidRecord::DuplicateLineNumber(number))?;
        }

        for record in self.sections {
            claim(record.id)?;
            script.restore_section(record.into_section()?);
        }

        Ok(script)
    }
}

impl LineRecord {
    fn into_line(self) -> Result<Line, InvalidRecord> {
        let number = self.line_number;
        if self.elements.is_empty() {
            return Err(InvalidRecord::NoElements(number));
        }

        let elements = self
            .elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| {
                if element.position != index {
                    return Err(InvalidRecord::ElementPosition {
                        line: number,
                        index,
                        position: element.position,
                    });
                }
                let mut restored = LineElement::new_with_uuid(
                    element.id,
                    element.position,
                    element.content,
                    element.element_type,
                );
                restored.is_marked = element.is_marked;
                restored.mark_color = element.mark_color;
                Ok(restored)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let element_count = elements.len();
        let cues = self
            .cues
            .into_iter()
            .map(|cue| cue.into_cue(self.id, number, element_count))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Line {
            id: self.id,
            number,
            content: self.content,
            elements,
            cues,
            is_marked: self.is_marked,
            mark_color: self.mark_color,
            notes: self.notes,
        })
    }
}

impl CueRecord {
    fn into_cue(
        self,
        line_id: Uuid,
        line: LineNumber,
        element_count: usize,
    ) -> Result<Cue, InvalidRecord> {
        if self.line_id != line_id {
            return Err(InvalidRecord::CueLine {
                line,
                cue_id: self.id,
                claimed: self.line_id,
            });
        }
        let position = CuePosition {
            element_index: self.position.element_index,
            offset: self.position.offset,
        };
        // Orphaned cues keep their last index, which may no longer exist.
        if !self.orphaned && position.validate(element_count).is_err() {
            return Err(InvalidRecord::CueAnchor {
                line,
                cue_id: self.id,
                element_index: position.element_index,
            });
        }
        if self.haptic.is_some() && !self.cue_type.supports_haptic() {
            return Err(InvalidRecord::Haptic {
                cue_id: self.id,
                kind: self.cue_type,
            });
        }

        let mut cue = Cue::new_with_uuid(self.id, line_id, position, self.cue_type, self.label);
        if self.orphaned {
            cue.status = AnchorStatus::Orphaned;
        }
        cue.notes = self.notes;
        cue.has_alert = self.has_alert;
        cue.alert_sound = self.alert_sound;
        cue.haptic = self.haptic.map(|haptic| HapticTarget {
            location: haptic.location,
            crew_id: haptic.crew_id,
        });
        Ok(cue)
    }
}

impl SectionRecord {
    fn into_section(self) -> Result<Section, InvalidRecord> {
        let mut section = Section::open_with_uuid(
            self.id,
            self.start_line_number,
            self.section_type,
            self.title,
        );
        if let Some(end) = self.end_line_number {
            let range = SectionRange::bounded(self.start_line_number, end).map_err(|_| {
                InvalidRecord::SectionRange {
                    section_id: self.id,
                    start: self.start_line_number,
                    end,
                }
            })?;
            section.set_range(range);
        }
        if self.detached {
            section.detach();
        }
        section.notes = self.notes;
        Ok(section)
    }
}
