//! Verify command: re-check a draft's stored history.

use clap::Args;
use codraft_core::{DraftId, DraftStore, Drafts};
use owo_colors::OwoColorize;
use tracing::instrument;

use super::print_json;

/// Arguments for the `verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Draft to verify
    pub id: DraftId,
}

/// Fail if any stored step breaks the prefix or limit rules.
#[instrument(name = "cmd_verify", skip_all, fields(draft = %args.id))]
pub fn cmd_verify<S: DraftStore>(
    args: VerifyArgs,
    global_json: bool,
    drafts: &Drafts<S>,
) -> anyhow::Result<()> {
    let audit = drafts.verify_history(args.id)?;

    if global_json {
        print_json(&audit)?;
    } else if audit.is_clean() {
        println!(
            "{} {} snapshots, every step valid",
            "PASS:".green(),
            audit.snapshots
        );
    } else {
        for violation in &audit.violations {
            println!(
                "{} #{} {}: {}",
                "FAIL:".red(),
                violation.seq,
                violation.kind,
                violation.message
            );
        }
    }

    if !audit.is_clean() {
        anyhow::bail!(
            "{} of {} snapshots in {} are invalid",
            audit.violations.len(),
            audit.snapshots,
            args.id
        );
    }
    Ok(())
}
