use promptly::Diagnostic;
use serde_json::json;
use tracing::instrument;

use super::{Document, terminal::Colorize};

#[derive(Debug, clap::Parser)]
#[command(about = "Report orphaned cues, text mismatches and section drift")]
pub struct Command {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Summary,
}

/// A stable, machine-readable name for each kind of finding.
const fn code(diagnostic: &Diagnostic) -> &'static str {
    match diagnostic {
        Diagnostic::OrphanedCueAnchor { .. } => "orphaned_cue_anchor",
        Diagnostic::ReconstructionMismatch { .. } => "reconstruction_mismatch",
        Diagnostic::MisplacedCue { .. } => "misplaced_cue",
        Diagnostic::DetachedSection { .. } => "detached_section",
        Diagnostic::DanglingSectionBound { .. } => "dangling_section_bound",
        Diagnostic::CrossingSections { .. } => "crossing_sections",
    }
}

impl Command {
    #[instrument(level = "debug", skip(document))]
    pub fn run(self, document: &Document) -> anyhow::Result<()> {
        let script = document.load()?;
        let diagnostics = script.validate();

        if !self.quiet {
            match self.output {
                OutputFormat::Table => Self::output_table(&diagnostics),
                OutputFormat::Json => Self::output_json(&diagnostics)?,
                OutputFormat::Summary => Self::output_summary(&diagnostics),
            }
        }

        // Exit with appropriate code
        if !diagnostics.is_empty() {
            std::process::exit(2);
        }
        Ok(())
    }

    fn output_table(diagnostics: &[Diagnostic]) {
        if diagnostics.is_empty() {
            println!("{}", "✅ No issues found".success());
            return;
        }
        for diagnostic in diagnostics {
            println!(
                "{} {:<24} {diagnostic}",
                "⚠️ ".warning(),
                code(diagnostic).dim()
            );
        }
        println!();
        println!(
            "{}",
            format!("{} issue(s) found", diagnostics.len()).warning()
        );
    }

    fn output_json(diagnostics: &[Diagnostic]) -> anyhow::Result<()> {
        let issues: Vec<_> = diagnostics
            .iter()
            .map(|diagnostic| {
                json!({
                    "code": code(diagnostic),
                    "message": diagnostic.to_string(),
                })
            })
            .collect();
        let output = json!({
            "valid": diagnostics.is_empty(),
            "issues": issues,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_summary(diagnostics: &[Diagnostic]) {
        let count = |name: &str| diagnostics.iter().filter(|d| code(d) == name).count();
        println!("Orphaned cues:           {}", count("orphaned_cue_anchor"));
        println!("Reconstruction mismatch: {}", count("reconstruction_mismatch"));
        println!("Misplaced cues:          {}", count("misplaced_cue"));
        println!("Detached sections:       {}", count("detached_section"));
        println!("Dangling section bounds: {}", count("dangling_section_bound"));
        println!("Crossing sections:       {}", count("crossing_sections"));
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn codes_are_distinct() {
        let id = Uuid::new_v4();
        let codes = [
            code(&Diagnostic::MisplacedCue {
                cue_id: id,
                held_by: id,
            }),
            code(&Diagnostic::DetachedSection {
                section_id: id,
                title: String::new(),
            }),
            code(&Diagnostic::CrossingSections {
                first: id,
                second: id,
            }),
        ];
        assert_eq!(
            codes,
            ["misplaced_cue", "detached_section", "crossing_sections"]
        );
    }
}
