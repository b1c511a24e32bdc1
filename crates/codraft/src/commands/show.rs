//! Show command: print a draft's current text.

use clap::Args;
use codraft_core::{Draft, DraftId, DraftStore, Drafts, TextMetrics};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::instrument;

use super::print_json;

/// Arguments for the `show` subcommand.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Draft to show
    pub id: DraftId,

    /// Print only the text, without the header
    #[arg(long)]
    pub raw: bool,
}

#[derive(Serialize)]
struct Shown {
    #[serde(flatten)]
    draft: Draft,
    state: &'static str,
    text: String,
    metrics: TextMetrics,
}

/// Print the draft's newest snapshot.
#[instrument(name = "cmd_show", skip_all, fields(draft = %args.id))]
pub fn cmd_show<S: DraftStore>(
    args: ShowArgs,
    global_json: bool,
    drafts: &Drafts<S>,
) -> anyhow::Result<()> {
    let draft = drafts.draft(args.id)?;
    let text = drafts.current_text(args.id)?;

    if global_json {
        return print_json(&Shown {
            state: draft.state().as_str(),
            metrics: TextMetrics::of(&text),
            draft,
            text,
        });
    }

    if !args.raw {
        println!("{} {}", draft.title.bold(), format!("[{}]", draft.category).dimmed());
        println!(
            "{}: {}  {}: {}  {}: {}",
            "Limit".dimmed(),
            draft.limit,
            "State".dimmed(),
            draft.state().as_str(),
            "Creator".dimmed(),
            draft.creator
        );
        println!();
    }
    println!("{text}");
    Ok(())
}
