//! Contribute command: propose a new full text for a draft.

use anyhow::Context;
use clap::Args;
use codraft_core::{DraftId, DraftStore, Drafts, UserId};
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use super::{TextInput, print_json, require_actor};

/// Arguments for the `contribute` subcommand.
#[derive(Args, Debug)]
pub struct ContributeArgs {
    /// Draft to contribute to
    pub id: DraftId,

    /// The complete new text, previous text included
    #[command(flatten)]
    pub input: TextInput,
}

/// Submit a contribution as `actor`.
#[instrument(name = "cmd_contribute", skip_all, fields(draft = %args.id))]
pub fn cmd_contribute<S: DraftStore>(
    args: ContributeArgs,
    global_json: bool,
    drafts: &Drafts<S>,
    actor: Option<&UserId>,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    let author = require_actor(actor)?;
    let proposed = args.input.read(max_input)?;
    debug!(author = %author, bytes = proposed.len(), "submitting contribution");

    let added = drafts
        .add_contribution(args.id, author, &proposed)
        .with_context(|| format!("contribution to {} rejected", args.id))?;

    if global_json {
        print_json(&added)?;
    } else {
        let unit = drafts.draft(args.id)?.limit.unit;
        println!(
            "{} +{} {unit} ({})",
            "Accepted".green(),
            added.delta,
            added.contribution_id.dimmed()
        );
    }
    Ok(())
}
