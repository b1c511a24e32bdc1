//! New command: start a draft.

use anyhow::Context;
use clap::Args;
use codraft_core::config::DefaultLimit;
use codraft_core::{DraftStore, Drafts, LimitUnit, NewDraft, UserId};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{TextInput, print_json, require_actor};

/// Arguments for the `new` subcommand.
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Title of the draft (at most 50 characters)
    #[arg(long)]
    pub title: String,

    /// Category, e.g. a genre or topic (at most 50 characters)
    #[arg(long)]
    pub category: String,

    /// Unit each contribution is measured in
    #[arg(long, value_enum, requires = "quantity")]
    pub unit: Option<LimitUnit>,

    /// Units a single contribution may add
    #[arg(long, allow_negative_numbers = true)]
    pub quantity: Option<i64>,

    /// Opening text
    #[command(flatten)]
    pub input: TextInput,
}

#[derive(Serialize)]
struct Created {
    id: String,
    title: String,
    limit: String,
}

/// Create a draft owned by `actor`, seeded with the opening text.
#[instrument(name = "cmd_new", skip_all, fields(title = %args.title))]
pub fn cmd_new<S: DraftStore>(
    args: NewArgs,
    global_json: bool,
    drafts: &Drafts<S>,
    actor: Option<&UserId>,
    default_limit: Option<DefaultLimit>,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    let creator = require_actor(actor)?;
    let initial_text = args.input.read(max_input)?;

    let (unit, quantity) = match (args.unit, args.quantity, default_limit) {
        (Some(unit), Some(quantity), _) => (unit, quantity),
        (None, Some(quantity), Some(default)) => (default.unit, quantity),
        (None, Some(_), None) => {
            anyhow::bail!("--quantity needs --unit unless `default_limit` is set in config")
        }
        (None, None, Some(default)) => {
            let limit = default
                .to_limit()
                .context("invalid `default_limit` in config")?;
            (limit.unit, i64::from(limit.quantity))
        }
        _ => anyhow::bail!(
            "no contribution limit: pass --unit and --quantity, or set `default_limit` in config"
        ),
    };
    debug!(%unit, quantity, "creating draft");

    let id = drafts
        .create_draft(
            creator,
            NewDraft {
                title: args.title,
                category: args.category,
                unit,
                quantity,
                initial_text,
            },
        )
        .context("could not create draft")?;
    let draft = drafts.draft(id)?;

    if global_json {
        print_json(&Created {
            id: id.to_string(),
            title: draft.title,
            limit: draft.limit.to_string(),
        })?;
    } else {
        println!("{id}");
        eprintln!(
            "{} \"{}\" ({} per contribution)",
            "Created".green(),
            draft.title,
            draft.limit
        );
    }
    Ok(())
}
