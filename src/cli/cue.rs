use promptly::{
    Cue, CuePosition, HapticTarget, LineNumber, Script,
    domain::{
        kinds::{CueType, StageLocation},
        presentation::{self, Presented},
    },
};
use tracing::instrument;
use uuid::Uuid;

use super::{Document, line::line_id, parse_position, terminal::Colorize};

/// One line describing a cue: type, label, anchor and id.
pub fn describe(script: &Script, cue: &Cue) -> String {
    let kind = cue.kind().presentation();
    let stack = presentation::cue_stack_color(cue.kind().as_str()).unwrap_or(kind.color);
    let line = script
        .line(cue.line_id())
        .map_or_else(|| "?".to_string(), |line| line.number().to_string());
    let position = cue.position();
    let mut anchor = format!("line {line}, {} {}", position.offset, position.element_index);
    if cue.is_orphaned() {
        anchor = format!("{anchor} (orphaned)").warning();
    }
    format!(
        "{:<8} {:<18} {:<16} {:<24} {}",
        cue.kind().action().general_name().tagged(stack),
        kind.label.tagged(kind.color),
        cue.label,
        anchor,
        cue.id().to_string().dim()
    )
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Anchor a new cue to a word
    Add(Add),

    /// Delete a cue
    Remove(Remove),

    /// Move a cue to a new anchor on its line
    Reanchor(Reanchor),

    /// Change a cue's type, dropping a haptic target the new type cannot use
    Retype(Retype),

    /// Turn a cue's external alert on or off
    Alert(Alert),

    /// Route a set cue's haptic alert to a crew member
    Haptic(Haptic),

    /// List cues
    List(List),
}

impl Command {
    pub fn run(self, document: &Document) -> anyhow::Result<()> {
        let mut script = document.load()?;
        match self {
            Self::Add(command) => command.run(&mut script)?,
            Self::Remove(command) => {
                let cue = script.detach_cue(command.id)?;
                println!("{}", format!("✅ Removed cue '{}'", cue.label).success());
            }
            Self::Reanchor(command) => {
                script.reanchor_cue(command.id, command.position)?;
                println!(
                    "{}",
                    format!(
                        "Cue anchored {} element {}",
                        command.position.offset, command.position.element_index
                    )
                    .success()
                );
            }
            Self::Retype(command) => {
                script
                    .cue_mut(command.id)
                    .ok_or_else(|| anyhow::anyhow!("Cue {} not found", command.id))?
                    .set_kind(command.kind);
                println!("{}", format!("Cue is now {}", command.kind).success());
            }
            Self::Alert(command) => command.run(&mut script)?,
            Self::Haptic(command) => command.run(&mut script)?,
            Self::List(command) => {
                command.run(&script);
                return Ok(());
            }
        }
        document.save(&script)
    }
}

#[derive(Debug, clap::Parser)]
pub struct Add {
    /// The line to anchor to
    line: LineNumber,

    /// The anchor, e.g. `before:0` or `after:3`
    #[arg(value_parser = parse_position)]
    position: CuePosition,

    /// The call text, e.g. `LX Q5`
    label: String,

    /// Cue type, e.g. `lighting_go`
    #[arg(long = "type", default_value = "lighting_go")]
    kind: CueType,
}

impl Add {
    #[instrument(skip(script))]
    fn run(self, script: &mut Script) -> anyhow::Result<()> {
        let id = line_id(script, self.line)?;
        let cue = script.attach_cue(id, self.position, self.kind, self.label)?;
        println!(
            "{}",
            format!("Added cue '{}' ({})", cue.label, cue.id()).success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Remove {
    /// The cue to delete
    id: Uuid,
}

#[derive(Debug, clap::Parser)]
pub struct Reanchor {
    /// The cue to move
    id: Uuid,

    /// The new anchor, e.g. `after:2`
    #[arg(value_parser = parse_position)]
    position: CuePosition,
}

#[derive(Debug, clap::Parser)]
pub struct Retype {
    /// The cue
    id: Uuid,

    /// The new cue type
    kind: CueType,
}

#[derive(Debug, clap::Parser)]
pub struct Alert {
    /// The cue
    id: Uuid,

    /// Sound asset to play
    #[arg(long)]
    sound: Option<String>,

    /// Turn the alert off
    #[arg(long, conflicts_with = "sound")]
    clear: bool,
}

impl Alert {
    fn run(self, script: &mut Script) -> anyhow::Result<()> {
        let cue = script
            .cue_mut(self.id)
            .ok_or_else(|| anyhow::anyhow!("Cue {} not found", self.id))?;
        if self.clear {
            cue.clear_alert();
        } else {
            cue.set_alert(self.sound);
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Haptic {
    /// The cue
    id: Uuid,

    /// Where the crew member is stationed
    #[arg(long, required_unless_present = "clear")]
    location: Option<StageLocation>,

    /// Crew identifier
    #[arg(long, default_value_t = 0)]
    crew: u32,

    /// Stop routing haptic alerts for this cue
    #[arg(long, conflicts_with = "location")]
    clear: bool,
}

impl Haptic {
    fn run(self, script: &mut Script) -> anyhow::Result<()> {
        if self.clear {
            script
                .cue_mut(self.id)
                .ok_or_else(|| anyhow::anyhow!("Cue {} not found", self.id))?
                .clear_haptic();
            return Ok(());
        }
        let Some(location) = self.location else {
            anyhow::bail!("--location is required");
        };
        script.set_cue_haptic(
            self.id,
            HapticTarget {
                location,
                crew_id: self.crew,
            },
        )?;
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct List {
    /// Only list cues that lost their anchor
    #[arg(long)]
    orphaned: bool,

    /// Only list cues of this type
    #[arg(long = "type")]
    kind: Option<CueType>,
}

impl List {
    fn run(self, script: &Script) {
        let cues: Vec<&Cue> = script
            .cues()
            .filter(|cue| !self.orphaned || cue.is_orphaned())
            .filter(|cue| self.kind.is_none_or(|kind| cue.kind() == kind))
            .collect();

        if cues.is_empty() {
            println!("{}", "No cues".dim());
            return;
        }
        for cue in cues {
            println!("{}", describe(script, cue));
        }
    }
}
