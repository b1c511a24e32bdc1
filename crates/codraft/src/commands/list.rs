//! List and mine commands: browse drafts.

use clap::Args;
use codraft_core::{Draft, DraftState, DraftStore, Drafts, UserId};
use owo_colors::OwoColorize;
use tracing::instrument;

use super::{print_json, require_actor};

/// Arguments for the `list` subcommand.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only show drafts still accepting contributions
    #[arg(long)]
    pub open: bool,
}

/// Arguments for the `mine` subcommand.
#[derive(Args, Debug, Default)]
pub struct MineArgs {}

/// List every draft, newest first.
#[instrument(name = "cmd_list", skip_all)]
pub fn cmd_list<S: DraftStore>(
    args: ListArgs,
    global_json: bool,
    drafts: &Drafts<S>,
) -> anyhow::Result<()> {
    let mut listed = drafts.list_drafts()?;
    if args.open {
        listed.retain(|d| d.state() == DraftState::Open);
    }

    if global_json {
        return print_json(&listed);
    }
    if listed.is_empty() {
        println!("{}", "No drafts yet.".dimmed());
    }
    for draft in &listed {
        print_row(draft);
    }
    Ok(())
}

/// List drafts `actor` created, then drafts they contributed to.
#[instrument(name = "cmd_mine", skip_all)]
pub fn cmd_mine<S: DraftStore>(
    _args: MineArgs,
    global_json: bool,
    drafts: &Drafts<S>,
    actor: Option<&UserId>,
) -> anyhow::Result<()> {
    let user = require_actor(actor)?;
    let mine = drafts.drafts_for_user(user)?;

    if global_json {
        return print_json(&mine);
    }

    for (heading, group) in [("Created", &mine.created), ("Contributed to", &mine.contributed)] {
        println!("{}", heading.bold().underline());
        if group.is_empty() {
            println!("  {}", "(none)".dimmed());
        }
        for draft in group {
            print!("  ");
            print_row(draft);
        }
    }
    Ok(())
}

fn print_row(draft: &Draft) {
    let state = match draft.state() {
        DraftState::Open => "open".green().to_string(),
        DraftState::Completed => "completed".yellow().to_string(),
    };
    println!(
        "{}  {}  {}  {}  {}",
        draft.id.dimmed(),
        draft.title.bold(),
        format!("[{}]", draft.category).dimmed(),
        draft.limit,
        state
    );
}
