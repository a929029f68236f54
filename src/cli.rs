use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

mod cue;
mod init;
mod line;
mod section;
mod show;
mod terminal;
mod validate;

use anyhow::Context;
use clap::ArgAction;
use promptly::{Config, CuePosition, LineNumber, Script, domain::kinds::CueOffset, storage};
use tracing::instrument;

use self::terminal::Colorize;

/// The name of the configuration file read from the script's directory.
const CONFIG_FILE: &str = "promptly.toml";

/// Parse a cue anchor written as `before:N` or `after:N`.
fn parse_position(s: &str) -> Result<CuePosition, String> {
    let (offset, index) = s
        .split_once(':')
        .ok_or_else(|| format!("expected 'before:N' or 'after:N', got '{s}'"))?;
    let offset: CueOffset = offset.trim().parse().map_err(|e| format!("{e}"))?;
    let element_index = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid element index '{index}'"))?;
    Ok(CuePosition {
        element_index,
        offset,
    })
}

/// Parse a renumbering pair written as `OLD=NEW`.
fn parse_renumbering(s: &str) -> Result<(LineNumber, LineNumber), String> {
    let (old, new) = s
        .split_once('=')
        .ok_or_else(|| format!("expected 'OLD=NEW', got '{s}'"))?;
    let old = old.parse().map_err(|e| format!("{e}"))?;
    let new = new.parse().map_err(|e| format!("{e}"))?;
    Ok((old, new))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The script document to operate on
    #[arg(short, long, default_value = "script.yaml", global = true)]
    file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let document = Document::new(self.file);
        self.command.run(&document)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// A script document on disk and the configuration that sits next to it.
#[derive(Debug)]
pub struct Document {
    path: PathBuf,
}

impl Document {
    const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn config_path(&self) -> PathBuf {
        self.path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(CONFIG_FILE)
    }

    /// The configuration, or defaults if there is no config file.
    fn config(&self) -> anyhow::Result<Config> {
        let path = self.config_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        Config::load(&path).map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))
    }

    fn load(&self) -> anyhow::Result<Script> {
        let config = self.config()?;
        match storage::load(&self.path, config) {
            Err(storage::LoadError::NotFound) => anyhow::bail!(
                "no script at {} (run 'promptly init' first)",
                self.path.display()
            ),
            result => result.with_context(|| format!("failed to load {}", self.path.display())),
        }
    }

    fn save(&self, script: &Script) -> anyhow::Result<()> {
        storage::save(script, &self.path)
            .with_context(|| format!("failed to save {}", self.path.display()))
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Create a new, empty script document
    Init(init::Command),

    /// Add, edit, mark or remove lines
    #[command(subcommand)]
    Line(line::Command),

    /// Change line numbers in bulk
    Renumber(Renumber),

    /// Attach, move or remove cues
    #[command(subcommand)]
    Cue(cue::Command),

    /// Open, close or remove sections
    #[command(subcommand)]
    Section(section::Command),

    /// List the sections covering a line
    Covering(Covering),

    /// Print the script
    Show(show::Command),

    /// Report orphaned cues, text mismatches and section drift
    Validate(validate::Command),
}

impl Command {
    fn run(self, document: &Document) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(document)?,
            Self::Line(command) => command.run(document)?,
            Self::Renumber(command) => command.run(document)?,
            Self::Cue(command) => command.run(document)?,
            Self::Section(command) => command.run(document)?,
            Self::Covering(command) => command.run(document)?,
            Self::Show(command) => command.run(document)?,
            Self::Validate(command) => command.run(document)?,
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Renumber {
    /// Explicit changes, e.g. `12=10 13=11`
    #[arg(value_parser = parse_renumbering, conflicts_with = "compact")]
    changes: Vec<(LineNumber, LineNumber)>,

    /// Close every gap, numbering lines 1, 2, 3, ... in their current order
    #[arg(long)]
    compact: bool,
}

impl Renumber {
    #[instrument(skip(document))]
    fn run(self, document: &Document) -> anyhow::Result<()> {
        let mut script = document.load()?;

        let mapping: BTreeMap<LineNumber, LineNumber> = if self.compact {
            script
                .lines()
                .zip(1_usize..)
                .map(|(line, new)| Ok((line.number(), LineNumber::try_from(new)?)))
                .collect::<anyhow::Result<_>>()?
        } else {
            self.changes.into_iter().collect()
        };

        if mapping.is_empty() {
            anyhow::bail!("nothing to renumber: pass OLD=NEW pairs or --compact");
        }

        script.renumber_lines(&mapping)?;
        document.save(&script)?;

        let changed = mapping.iter().filter(|(old, new)| old != new).count();
        println!("{}", format!("Renumbered {changed} line(s)").success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Covering {
    /// The line number to look up
    line: LineNumber,
}

impl Covering {
    fn run(self, document: &Document) -> anyhow::Result<()> {
        let script = document.load()?;
        let sections = script.sections_covering(self.line);

        if sections.is_empty() {
            println!("{}", format!("No section covers line {}", self.line).dim());
            return Ok(());
        }
        for section in sections {
            println!("{}", section::describe(section, script.last_line_number()));
        }
        Ok(())
    }
}
