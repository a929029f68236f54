use promptly::{
    LineNumber, Script,
    domain::{kinds::MarkColor, presentation},
};
use tracing::instrument;
use uuid::Uuid;

use super::{Document, terminal::Colorize};

/// Parse a mark color by name (`yellow`) or hex value (`#FFFF00`).
pub fn parse_mark_color(s: &str) -> Result<MarkColor, String> {
    MarkColor::ALL
        .iter()
        .copied()
        .find(|color| {
            color.as_str().eq_ignore_ascii_case(s)
                || presentation::mark_color(color.as_str())
                    .is_some_and(|p| p.label.eq_ignore_ascii_case(s))
        })
        .ok_or_else(|| format!("unknown mark color '{s}'"))
}

/// Resolve a line number to the line's id.
pub fn line_id(script: &Script, number: LineNumber) -> anyhow::Result<Uuid> {
    script
        .line_by_number(number)
        .map(promptly::Line::id)
        .ok_or_else(|| anyhow::anyhow!("Line {number} not found"))
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Add a line
    Add(Add),

    /// Replace a line's text, rebasing its cues
    Edit(Edit),

    /// Replace the text of a single element without touching the line text
    Element(Element),

    /// Highlight a line or one of its elements
    Mark(Mark),

    /// Remove a line with its elements and cues
    Remove(Remove),
}

impl Command {
    pub fn run(self, document: &Document) -> anyhow::Result<()> {
        let mut script = document.load()?;
        match self {
            Self::Add(command) => command.run(&mut script)?,
            Self::Edit(command) => command.run(&mut script)?,
            Self::Element(command) => command.run(&mut script)?,
            Self::Mark(command) => command.run(&mut script)?,
            Self::Remove(command) => {
                if !command.run(&mut script)? {
                    return Ok(());
                }
            }
        }
        document.save(&script)
    }
}

#[derive(Debug, clap::Parser)]
pub struct Add {
    /// The line text
    content: String,

    /// Line number to use (defaults to one past the last line)
    #[arg(long)]
    at: Option<LineNumber>,
}

impl Add {
    #[instrument(skip(script))]
    fn run(self, script: &mut Script) -> anyhow::Result<()> {
        let line = match self.at {
            Some(number) => script.add_line(number, self.content)?,
            None => script.append_line(self.content)?,
        };
        println!(
            "{}",
            format!(
                "Added line {} ({} elements)",
                line.number(),
                line.elements().len()
            )
            .success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Edit {
    /// The line to edit
    line: LineNumber,

    /// The new text
    content: String,
}

impl Edit {
    #[instrument(skip(script))]
    fn run(self, script: &mut Script) -> anyhow::Result<()> {
        let id = line_id(script, self.line)?;
        let report = script.set_line_content(id, self.content)?;

        for moved in &report.moved {
            let label = script.cue(moved.cue_id).map_or("", |cue| cue.label.as_str());
            println!(
                "{}",
                format!(
                    "  Cue '{label}' moved from element {} to {}",
                    moved.from, moved.to
                )
                .info()
            );
        }
        for cue_id in &report.orphaned {
            let label = script.cue(*cue_id).map_or("", |cue| cue.label.as_str());
            eprintln!(
                "{}",
                format!("⚠️  Cue '{label}' lost its anchor; use 'promptly cue reanchor'")
                    .warning()
            );
        }
        if !report.dropped_marks.is_empty() {
            eprintln!(
                "{}",
                format!(
                    "⚠️  {} highlighted word(s) no longer appear and lost their highlight",
                    report.dropped_marks.len()
                )
                .warning()
            );
        }
        println!("{}", format!("Updated line {}", self.line).success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Element {
    /// The line holding the element
    line: LineNumber,

    /// Zero-based element position
    position: usize,

    /// The new element text
    text: String,
}

impl Element {
    #[instrument(skip(script))]
    fn run(self, script: &mut Script) -> anyhow::Result<()> {
        let id = line_id(script, self.line)?;
        let options = script.config().decompose_options();
        let line = script
            .line_mut(id)
            .ok_or_else(|| anyhow::anyhow!("Line {} not found", self.line))?;
        if !line.set_element_content(self.position, self.text, options) {
            anyhow::bail!(
                "Line {} has no element at position {}",
                self.line,
                self.position
            );
        }
        if let Some(mismatch) = line.reconstruction_mismatch() {
            eprintln!(
                "{}",
                format!(
                    "⚠️  Elements now read '{}' but the line reads '{}'",
                    mismatch.reconstructed, mismatch.stored
                )
                .warning()
            );
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Mark {
    /// The line to highlight
    line: LineNumber,

    /// Highlight only the element at this position
    #[arg(long)]
    element: Option<usize>,

    /// Highlight color, by name or hex value
    #[arg(long, value_parser = parse_mark_color)]
    color: Option<MarkColor>,

    /// Remove the highlight instead
    #[arg(long, conflicts_with = "color")]
    clear: bool,
}

impl Mark {
    #[instrument(skip(script))]
    fn run(self, script: &mut Script) -> anyhow::Result<()> {
        let id = line_id(script, self.line)?;
        match (self.element, self.clear) {
            (Some(position), false) => script.mark_element(id, position, self.color)?,
            (Some(position), true) => {
                let line = script
                    .line_mut(id)
                    .ok_or_else(|| anyhow::anyhow!("Line {} not found", self.line))?;
                if !line.unmark_element(position) {
                    anyhow::bail!("Line {} has no element at position {position}", self.line);
                }
            }
            (None, clear) => {
                let line = script
                    .line_mut(id)
                    .ok_or_else(|| anyhow::anyhow!("Line {} not found", self.line))?;
                if clear {
                    line.unmark();
                } else {
                    line.mark(self.color);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Remove {
    /// The line to remove
    line: LineNumber,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Remove {
    /// Returns `false` if the user cancelled.
    #[instrument(skip(script))]
    fn run(self, script: &mut Script) -> anyhow::Result<bool> {
        let id = line_id(script, self.line)?;
        let cue_count = script.line(id).map_or(0, |line| line.cues().len());

        if cue_count > 0 && !self.yes {
            let proceed = dialoguer::Confirm::new()
                .with_prompt(format!(
                    "Line {} has {cue_count} cue(s) that will be removed with it. Proceed?",
                    self.line
                ))
                .default(false)
                .interact()?;
            if !proceed {
                println!("Cancelled");
                return Ok(false);
            }
        }

        let removal = script.remove_line(id)?;
        for repair in &removal.repairs {
            let title = script
                .section(repair.section_id)
                .map_or("", |section| section.title.as_str());
            match repair.after {
                Some(range) => println!(
                    "{}",
                    format!(
                        "  Section '{title}' now spans {}",
                        super::section::range_label(range)
                    )
                    .info()
                ),
                None => eprintln!(
                    "{}",
                    format!("⚠️  Section '{title}' no longer covers any line").warning()
                ),
            }
        }
        println!(
            "{}",
            format!(
                "✅ Removed line {} and {} cue(s)",
                self.line,
                removal.line.cues().len()
            )
            .success()
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("yellow", MarkColor::Yellow; "name")]
    #[test_case("Purple", MarkColor::Purple; "capitalised name")]
    #[test_case("#90EE90", MarkColor::Green; "hex")]
    #[test_case("#87ceeb", MarkColor::Blue; "lowercase hex")]
    fn mark_colors(input: &str, expected: MarkColor) {
        assert_eq!(parse_mark_color(input).unwrap(), expected);
    }

    #[test]
    fn unknown_mark_color() {
        assert!(parse_mark_color("mauve").is_err());
    }
}
