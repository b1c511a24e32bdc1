//! Complete command: close a draft.

use anyhow::Context;
use clap::Args;
use codraft_core::{DraftId, DraftStore, Drafts, UserId};
use owo_colors::OwoColorize;
use tracing::instrument;

use super::{print_json, require_actor};

/// Arguments for the `complete` subcommand.
#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// Draft to close
    pub id: DraftId,
}

/// Mark the draft completed. Only its creator may.
#[instrument(name = "cmd_complete", skip_all, fields(draft = %args.id))]
pub fn cmd_complete<S: DraftStore>(
    args: CompleteArgs,
    global_json: bool,
    drafts: &Drafts<S>,
    actor: Option<&UserId>,
) -> anyhow::Result<()> {
    let actor = require_actor(actor)?;
    drafts
        .complete_draft(args.id, actor)
        .with_context(|| format!("could not complete {}", args.id))?;

    if global_json {
        print_json(&serde_json::json!({ "id": args.id, "state": "completed" }))?;
    } else {
        println!("{} {}", "Completed".green(), args.id);
    }
    Ok(())
}
