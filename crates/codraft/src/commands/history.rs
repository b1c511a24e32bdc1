//! History command: list a draft's contributions.

use clap::Args;
use codraft_core::{DraftId, DraftStore, Drafts, text};
use owo_colors::OwoColorize;
use tracing::instrument;

use super::print_json;

/// Arguments for the `history` subcommand.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Draft whose history to list
    pub id: DraftId,

    /// Print each snapshot's full text
    #[arg(long)]
    pub full: bool,

    /// Show at most N contributions
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,
}

/// List contributions, newest first.
#[instrument(name = "cmd_history", skip_all, fields(draft = %args.id))]
pub fn cmd_history<S: DraftStore>(
    args: HistoryArgs,
    global_json: bool,
    drafts: &Drafts<S>,
) -> anyhow::Result<()> {
    let unit = drafts.draft(args.id)?.limit.unit;
    let mut history = drafts.list_history(args.id)?;
    if let Some(n) = args.limit {
        history.truncate(n);
    }

    if global_json {
        return print_json(&history);
    }

    for contribution in &history {
        println!(
            "{} {} {} {}",
            format!("#{}", contribution.seq).bold(),
            contribution.timestamp.format("%Y-%m-%d %H:%M:%S").dimmed(),
            contribution.author.cyan(),
            format!("({} {unit})", text::measure(&contribution.text, unit)).dimmed()
        );
        if args.full {
            println!("{}", contribution.text);
            println!();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use codraft_core::UserId;

    #[test]
    fn lists_and_truncates() {
        let (drafts, id, _) = testing::drafts_with_one();
        drafts
            .add_contribution(id, &UserId::from("bo"), "The cat sat. It purred.")
            .unwrap();
        let args = HistoryArgs {
            id,
            full: true,
            limit: Some(1),
        };
        assert!(cmd_history(args, false, &drafts).is_ok());
        let args = HistoryArgs {
            id,
            full: false,
            limit: None,
        };
        assert!(cmd_history(args, true, &drafts).is_ok());
    }
}
