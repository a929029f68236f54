use std::fs;

use promptly::{Config, Script};
use tracing::instrument;

use super::{Document, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Display name of the script
    name: String,

    /// Also write a default `promptly.toml` next to the script
    #[arg(long)]
    with_config: bool,

    /// Seed the script from a plain-text file, one line per line
    #[arg(long, value_name = "PATH")]
    from: Option<std::path::PathBuf>,
}

impl Command {
    #[instrument(skip(document))]
    pub fn run(self, document: &Document) -> anyhow::Result<()> {
        if document.path().exists() {
            anyhow::bail!(
                "Script already initialized (found existing {})",
                document.path().display()
            );
        }

        let config = if self.with_config {
            let config = Config::default();
            let path = document.config_path();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            config
                .save(&path)
                .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", path.display()))?;
            println!("  Created: {}", path.display());
            config
        } else {
            document.config()?
        };

        let mut script = Script::new(self.name);
        script.set_config(config);

        if let Some(source) = &self.from {
            let text = fs::read_to_string(source)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", source.display()))?;
            for line in text.lines() {
                script.append_line(line)?;
            }
        }

        document.save(&script)?;

        println!(
            "{}",
            format!(
                "Initialized '{}' in {} ({} lines)",
                script.name,
                document.path().display(),
                script.line_count()
            )
            .success()
        );
        Ok(())
    }
}
