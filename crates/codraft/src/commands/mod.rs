//! Command implementations.
//!
//! Commands that touch drafts are generic over the store so they can be
//! exercised against [`MemoryStore`](codraft_core::MemoryStore) in tests; the
//! binary always hands them a [`FileStore`].

use std::io::Read;

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use codraft_core::{Config, Drafts, FileStore, UserId};

pub mod complete;
pub mod contribute;
pub mod history;
pub mod info;
pub mod list;
pub mod metrics;
pub mod new;
#[cfg(feature = "mcp")]
pub mod serve;
pub mod show;
pub mod verify;

/// Where a command reads its text from.
#[derive(Args, Debug, Default)]
pub struct TextInput {
    /// File holding the text, or `-` to read stdin
    #[arg(value_name = "FILE", required_unless_present = "text")]
    pub file: Option<Utf8PathBuf>,

    /// Give the text inline instead of in a file
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,
}

impl TextInput {
    /// Read the text, enforcing the size limit.
    pub fn read(&self, max_bytes: Option<usize>) -> anyhow::Result<String> {
        match (&self.text, &self.file) {
            (Some(text), _) => {
                check_size("--text", text.len(), max_bytes)?;
                Ok(text.clone())
            }
            (None, Some(path)) if path.as_str() == "-" => read_stdin(max_bytes),
            (None, Some(path)) => read_input_file(path, max_bytes),
            (None, None) => bail!("no text given: pass a FILE, `-` for stdin, or --text"),
        }
    }
}

/// Read a file after checking its size against the configured limit.
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    let metadata =
        std::fs::metadata(path.as_std_path()).with_context(|| format!("failed to read {path}"))?;
    check_size(path.as_str(), usize::try_from(metadata.len()).unwrap_or(usize::MAX), max_bytes)?;

    std::fs::read_to_string(path.as_std_path()).with_context(|| format!("failed to read {path}"))
}

fn read_stdin(max_bytes: Option<usize>) -> anyhow::Result<String> {
    let mut text = String::new();
    let stdin = std::io::stdin().lock();
    match max_bytes {
        Some(max) => {
            let cap = u64::try_from(max).unwrap_or(u64::MAX).saturating_add(1);
            stdin
                .take(cap)
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            check_size("stdin", text.len(), max_bytes)?;
        }
        None => {
            let mut stdin = stdin;
            stdin
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
        }
    }
    Ok(text)
}

fn check_size(source: &str, size: usize, max_bytes: Option<usize>) -> anyhow::Result<()> {
    if let Some(max) = max_bytes
        && size > max
    {
        bail!("input too large: {source} is {size} bytes (limit: {max} bytes)");
    }
    Ok(())
}

/// Open the file-backed draft store named by the configuration.
pub fn open_drafts(config: &Config) -> anyhow::Result<Drafts<FileStore>> {
    let Some(dir) = config.resolved_data_dir() else {
        bail!("no data directory: set `data_dir` in config or CODRAFT_DATA_DIR");
    };
    let store = FileStore::open(&dir).with_context(|| format!("failed to open drafts in {dir}"))?;
    tracing::debug!(data_dir = %dir, "draft store ready");
    Ok(Drafts::new(store).with_max_append_attempts(config.append_attempts()))
}

/// The user a command acts as: `--as`, else the configured `user`.
pub fn resolve_actor(flag: Option<&str>, config: &Config) -> Option<UserId> {
    flag.or(config.user.as_deref())
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .map(UserId::from)
}

/// Fail unless an acting user is known.
pub fn require_actor(actor: Option<&UserId>) -> anyhow::Result<&UserId> {
    actor.context("no user given: pass --as USER or set CODRAFT_USER")
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use codraft_core::{DraftId, Drafts, LimitUnit, MemoryStore, NewDraft, UserId};

    pub(crate) fn drafts_with_one() -> (Drafts<MemoryStore>, DraftId, UserId) {
        let drafts = Drafts::new(MemoryStore::new());
        let ada = UserId::from("ada");
        let id = drafts
            .create_draft(
                &ada,
                NewDraft {
                    title: "The Cat".to_string(),
                    category: "fiction".to_string(),
                    unit: LimitUnit::Words,
                    quantity: 5,
                    initial_text: "The cat sat.".to_string(),
                },
            )
            .unwrap();
        (drafts, id, ada)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn inline_text_respects_limit() {
        let input = TextInput {
            file: None,
            text: Some("The cat sat.".to_string()),
        };
        assert_eq!(input.read(None).unwrap(), "The cat sat.");
        let err = input.read(Some(4)).unwrap_err();
        assert!(err.to_string().contains("input too large"));
    }

    #[test]
    fn file_over_limit_is_refused_before_reading() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("big.txt")).unwrap();
        std::fs::write(path.as_std_path(), "x".repeat(64)).unwrap();

        assert!(read_input_file(&path, Some(63)).is_err());
        assert_eq!(read_input_file(&path, Some(64)).unwrap().len(), 64);
        assert_eq!(read_input_file(&path, None).unwrap().len(), 64);
    }

    #[test]
    fn actor_flag_beats_config() {
        let config = Config {
            user: Some("from-config".to_string()),
            ..Config::default()
        };
        assert_eq!(resolve_actor(Some("bo"), &config), Some(UserId::from("bo")));
        assert_eq!(
            resolve_actor(None, &config),
            Some(UserId::from("from-config"))
        );
        assert_eq!(resolve_actor(Some("  "), &Config::default()), None);
        assert!(require_actor(None).is_err());
    }

    #[test]
    fn open_drafts_uses_configured_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let config = Config {
            data_dir: Some(dir.clone()),
            ..Config::default()
        };
        let drafts = open_drafts(&config).unwrap();
        assert_eq!(drafts.store().dir(), dir.join("drafts"));
    }
}
