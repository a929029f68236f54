use promptly::{
    LineNumber, Section, SectionRange, SectionStatus,
    domain::{kinds::SectionType, presentation::Presented},
};
use tracing::instrument;
use uuid::Uuid;

use super::{Document, terminal::Colorize};

/// A short human-readable rendering of a range.
pub fn range_label(range: SectionRange) -> String {
    match range {
        SectionRange::OpenFrom { start } => format!("lines {start}-"),
        SectionRange::Bounded { start, end } if start == end => format!("line {start}"),
        SectionRange::Bounded { start, end } => format!("lines {start}-{end}"),
    }
}

/// One line describing a section: kind, title, range and id.
pub fn describe(section: &Section, last_line: Option<LineNumber>) -> String {
    let kind = section.kind().presentation();
    let range = match (section.status(), section.effective_range(last_line)) {
        (SectionStatus::Detached, _) => "detached".warning(),
        (SectionStatus::Active, Some(resolved)) if section.is_open() => {
            format!("lines {}-{} (open)", resolved.start(), resolved.end())
        }
        (SectionStatus::Active, _) => range_label(section.range()),
    };
    format!(
        "{:<20} {:<24} {:<20} {}",
        kind.label.tagged(kind.color),
        section.title,
        range,
        section.id().to_string().dim()
    )
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Open a section at an existing line
    Open(Open),

    /// Close a section at an existing line
    Close(Close),

    /// Remove a section's end line so it runs to the end of the script
    Reopen(Reopen),

    /// Move a section onto existing lines, repairing a detached section
    Reattach(Reattach),

    /// Delete a section; its lines are kept
    Remove(Remove),

    /// List every section
    List,
}

impl Command {
    pub fn run(self, document: &Document) -> anyhow::Result<()> {
        let mut script = document.load()?;
        match self {
            Self::Open(command) => {
                let title = command.title.clone();
                let section = script.open_section(command.start, command.kind, command.title)?;
                let id = section.id();
                if let Some(end) = command.end {
                    script.close_section(id, end)?;
                }
                println!("{}", format!("Opened section '{title}' ({id})").success());
            }
            Self::Close(command) => {
                script.close_section(command.id, command.end)?;
                println!(
                    "{}",
                    format!("Closed section at line {}", command.end).success()
                );
            }
            Self::Reopen(command) => {
                script.reopen_section(command.id)?;
                println!("{}", "Reopened section".success());
            }
            Self::Reattach(command) => {
                script.reattach_section(command.id, command.start, command.end)?;
                println!(
                    "{}",
                    format!("Section now starts at line {}", command.start).success()
                );
            }
            Self::Remove(command) => {
                let section = script.remove_section(command.id)?;
                println!(
                    "{}",
                    format!("✅ Removed section '{}'", section.title).success()
                );
            }
            Self::List => {
                list(&script);
                return Ok(());
            }
        }
        document.save(&script)
    }
}

#[instrument(skip(script))]
fn list(script: &promptly::Script) {
    if script.sections().is_empty() {
        println!("{}", "No sections".dim());
        return;
    }
    let last = script.last_line_number();
    for section in script.sections() {
        println!("{}", describe(section, last));
    }
}

#[derive(Debug, clap::Parser)]
pub struct Open {
    /// The first line of the section
    start: LineNumber,

    /// The section title
    title: String,

    /// What kind of section this is
    #[arg(long = "type", default_value = "scene")]
    kind: SectionType,

    /// Close the section at this line straight away
    #[arg(long)]
    end: Option<LineNumber>,
}

#[derive(Debug, clap::Parser)]
pub struct Close {
    /// The section to close
    id: Uuid,

    /// The last line of the section
    end: LineNumber,
}

#[derive(Debug, clap::Parser)]
pub struct Reopen {
    /// The section to reopen
    id: Uuid,
}

#[derive(Debug, clap::Parser)]
pub struct Reattach {
    /// The section to move
    id: Uuid,

    /// The new first line
    start: LineNumber,

    /// The new last line; without it the section is open
    #[arg(long)]
    end: Option<LineNumber>,
}

#[derive(Debug, clap::Parser)]
pub struct Remove {
    /// The section to delete
    id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(number: usize) -> LineNumber {
        LineNumber::try_from(number).unwrap()
    }

    #[test]
    fn range_labels() {
        assert_eq!(
            range_label(SectionRange::OpenFrom { start: n(4) }),
            "lines 4-"
        );
        assert_eq!(
            range_label(SectionRange::Bounded {
                start: n(2),
                end: n(2)
            }),
            "line 2"
        );
        assert_eq!(
            range_label(SectionRange::Bounded {
                start: n(2),
                end: n(9)
            }),
            "lines 2-9"
        );
    }
}
