use promptly::{
    Line, Script,
    domain::{kinds::CueOffset, presentation::Presented},
    storage,
};
use tracing::instrument;

use super::{Document, cue, section, terminal::Colorize};

#[derive(Debug, clap::Parser)]
#[command(about = "Print the script with its cues and sections")]
pub struct Command {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,

    /// Show element positions under each line
    #[arg(long)]
    elements: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Command {
    #[instrument(level = "debug", skip(document))]
    pub fn run(self, document: &Document) -> anyhow::Result<()> {
        let script = document.load()?;
        match self.output {
            OutputFormat::Pretty => self.output_pretty(&script),
            OutputFormat::Json => println!("{}", storage::to_json(&script)?),
        }
        Ok(())
    }

    fn output_pretty(&self, script: &Script) {
        println!("# {}", script.name);
        println!(
            "{}\n",
            format!(
                "{} lines, {} cues, {} sections",
                script.line_count(),
                script.cues().count(),
                script.sections().len()
            )
            .dim()
        );

        let last = script.last_line_number();
        for line in script.lines() {
            for section in script
                .sections()
                .iter()
                .filter(|section| section.start_line_number() == line.number())
            {
                println!("{}", section::describe(section, last));
            }
            println!("{:>5}  {}", line.number().to_string().dim(), render(line));
            if self.elements {
                let positions: Vec<String> = line
                    .elements()
                    .iter()
                    .map(|element| format!("{}:{}", element.position(), element.content()))
                    .collect();
                println!("       {}", positions.join(" ").dim());
            }
            for cue in line.cues() {
                println!("       {}", cue::describe(script, cue));
            }
        }
    }
}

/// The line text with cue markers and highlights inserted around elements.
fn render(line: &Line) -> String {
    let mut pieces = Vec::with_capacity(line.elements().len());
    for element in line.elements() {
        let markers = |offset: CueOffset| -> String {
            line.cues()
                .iter()
                .filter(|cue| {
                    !cue.is_orphaned()
                        && cue.position().element_index == element.position()
                        && cue.position().offset == offset
                })
                .map(|cue| {
                    let tag = cue.kind().presentation();
                    format!("[{}]", cue.label).tagged(tag.color)
                })
                .collect()
        };

        let mut text = element.content().to_string();
        if element.is_marked() {
            text = match element.mark_color() {
                Some(color) => text.tagged(color.as_str()),
                None => text.warning(),
            };
        }
        pieces.push(format!(
            "{}{text}{}",
            markers(CueOffset::Before),
            markers(CueOffset::After)
        ));
    }
    let rendered = pieces.join(" ");
    match (line.is_marked(), line.mark_color()) {
        (true, Some(color)) => rendered.tagged(color.as_str()),
        (true, None) => rendered.warning(),
        (false, _) => rendered,
    }
}
