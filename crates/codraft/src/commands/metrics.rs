//! Metrics command: count a text the way limits are measured.

use clap::Args;
use codraft_core::{LimitUnit, TextMetrics};
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use super::{TextInput, print_json};

/// Arguments for the `metrics` subcommand.
#[derive(Args, Debug)]
pub struct MetricsArgs {
    /// Text to measure
    #[command(flatten)]
    pub input: TextInput,

    /// Print only the count for this unit
    #[arg(long, value_enum)]
    pub unit: Option<LimitUnit>,
}

/// Print word, sentence, paragraph and line counts.
#[instrument(name = "cmd_metrics", skip_all)]
pub fn cmd_metrics(
    args: MetricsArgs,
    global_json: bool,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    let text = args.input.read(max_input)?;
    let metrics = TextMetrics::of(&text);
    debug!(?metrics, "measured text");

    match (args.unit, global_json) {
        (Some(unit), true) => {
            print_json(&serde_json::json!({ "unit": unit, "count": metrics.get(unit) }))?;
        }
        (Some(unit), false) => println!("{}", metrics.get(unit)),
        (None, true) => print_json(&metrics)?,
        (None, false) => {
            println!("{}: {}", "Words".dimmed(), metrics.words);
            println!("{}: {}", "Sentences".dimmed(), metrics.sentences);
            println!("{}: {}", "Paragraphs".dimmed(), metrics.paragraphs);
            println!("{}: {}", "Lines".dimmed(), metrics.lines);
        }
    }
    Ok(())
}
