use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::types::{CorpusStats, SeenFlag, TieMode, TokenCounts};
use super::TokenStore;
use crate::error::{BayesError, Result};
use crate::tokenizer::Token;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct Snapshot {
    corpus: CorpusStats,
    tokens: BTreeMap<Token, TokenCounts>,
    seen: BTreeMap<String, String>,
}

/// Token store held in memory, optionally persisted as JSON
///
/// With a snapshot path, the file is loaded on [`MemoryStore::open`] and
/// rewritten on untie whenever the session changed anything. Writes go to
/// a temporary file first and are moved into place.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Snapshot,
    path: Option<PathBuf>,
    mode: Option<TieMode>,
    dirty: bool,
}

impl MemoryStore {
    /// Empty store without persistence
    pub fn new() -> Self {
        Self::default()
    }

    /// Store backed by a snapshot file; a missing file means an empty store
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let data = if path.exists() {
            let content = fs::read(&path)?;
            let data: Snapshot = serde_json::from_slice(&content)?;
            info!(
                "Loaded token store {} ({} tokens, {} spam, {} ham)",
                path.display(),
                data.tokens.len(),
                data.corpus.spam_count,
                data.corpus.ham_count
            );
            data
        } else {
            debug!("Token store {} does not exist yet", path.display());
            Snapshot::default()
        };

        Ok(Self {
            data,
            path: Some(path),
            mode: None,
            dirty: false,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of distinct tokens held
    pub fn token_count(&self) -> usize {
        self.data.tokens.len()
    }

    /// Every token with its counts, ordered by token id
    pub fn tokens(&self) -> impl Iterator<Item = (&Token, &TokenCounts)> {
        self.data.tokens.iter()
    }

    /// Write pending changes to the snapshot file, if any
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(path) = &self.path {
            write_snapshot(path, &self.data)?;
        }
        self.dirty = false;
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        if self.mode == Some(TieMode::ReadOnly) {
            return Err(BayesError::Store(
                "token store is tied read-only".to_string(),
            ));
        }
        Ok(())
    }
}

fn write_snapshot(path: &Path, data: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            BayesError::Store(format!("Failed to create directory {:?}: {}", parent, e))
        })?;
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, serde_json::to_vec(data)?)?;
    fs::rename(&tmp_path, path)?;

    debug!(
        "Saved token store {} ({} tokens)",
        path.display(),
        data.tokens.len()
    );
    Ok(())
}

fn apply_delta(count: u32, delta: i32) -> u32 {
    (count as i64 + delta as i64).clamp(0, u32::MAX as i64) as u32
}

impl TokenStore for MemoryStore {
    fn tie(&mut self, mode: TieMode) -> Result<()> {
        if self.mode.is_some() {
            return Err(BayesError::Store("token store is already tied".to_string()));
        }
        self.mode = Some(mode);
        Ok(())
    }

    fn untie(&mut self) -> Result<()> {
        self.mode = None;
        self.flush()
    }

    fn get(&self, token: &Token) -> Result<Option<TokenCounts>> {
        Ok(self.data.tokens.get(token).copied())
    }

    fn corpus_counts(&self) -> Result<CorpusStats> {
        Ok(self.data.corpus)
    }

    fn set_corpus_counts(&mut self, delta_spam: i64, delta_ham: i64) -> Result<()> {
        self.check_writable()?;
        let corpus = &mut self.data.corpus;
        corpus.spam_count = corpus.spam_count.saturating_add_signed(delta_spam);
        corpus.ham_count = corpus.ham_count.saturating_add_signed(delta_ham);
        self.dirty = true;
        Ok(())
    }

    fn bump_counts(
        &mut self,
        tokens: &[Token],
        delta_spam: i32,
        delta_ham: i32,
        atime: i64,
    ) -> Result<()> {
        self.check_writable()?;

        for token in tokens {
            let counts = self.data.tokens.entry(*token).or_insert(TokenCounts {
                spam_count: 0,
                ham_count: 0,
                atime,
            });
            counts.spam_count = apply_delta(counts.spam_count, delta_spam);
            counts.ham_count = apply_delta(counts.ham_count, delta_ham);
            counts.atime = counts.atime.max(atime);

            if counts.spam_count == 0 && counts.ham_count == 0 {
                self.data.tokens.remove(token);
            }
        }

        self.dirty = true;
        Ok(())
    }

    fn touch(&mut self, tokens: &[Token], atime: i64) -> Result<()> {
        for token in tokens {
            if let Some(counts) = self.data.tokens.get_mut(token) {
                if atime > counts.atime {
                    counts.atime = atime;
                    self.dirty = true;
                }
            }
        }
        Ok(())
    }

    fn get_seen(&self, msgid: &str) -> Result<Option<String>> {
        Ok(self.data.seen.get(msgid).cloned())
    }

    fn put_seen(&mut self, msgid: &str, flag: SeenFlag) -> Result<()> {
        self.check_writable()?;
        self.data
            .seen
            .insert(msgid.to_string(), flag.as_str().to_string());
        self.dirty = true;
        Ok(())
    }

    fn delete_seen(&mut self, msgid: &str) -> Result<()> {
        self.check_writable()?;
        if self.data.seen.remove(msgid).is_some() {
            self.dirty = true;
        }
        Ok(())
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Store a raw seen value, bypassing flag validation
    pub(crate) fn put_raw_seen(&mut self, msgid: &str, value: &str) {
        self.data.seen.insert(msgid.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tok(text: &str) -> Token {
        Token::from_text(text)
    }

    #[test]
    fn test_bump_creates_and_accumulates() {
        let mut store = MemoryStore::new();
        store.bump_counts(&[tok("a"), tok("b")], 1, 0, 100).unwrap();
        store.bump_counts(&[tok("a")], 0, 2, 50).unwrap();

        let a = store.get(&tok("a")).unwrap().unwrap();
        assert_eq!((a.spam_count, a.ham_count, a.atime), (1, 2, 100));
        assert_eq!(store.token_count(), 2);
    }

    #[test]
    fn test_counts_saturate_and_empty_tokens_vanish() {
        let mut store = MemoryStore::new();
        store.bump_counts(&[tok("a")], 1, 0, 100).unwrap();
        store.bump_counts(&[tok("a")], -3, 0, 100).unwrap();
        assert!(store.get(&tok("a")).unwrap().is_none());

        store.bump_counts(&[tok("b")], 0, -1, 100).unwrap();
        assert!(store.get(&tok("b")).unwrap().is_none());
    }

    #[test]
    fn test_corpus_counts_saturate() {
        let mut store = MemoryStore::new();
        store.set_corpus_counts(1, 0).unwrap();
        store.set_corpus_counts(-1, -1).unwrap();
        assert_eq!(store.corpus_counts().unwrap(), CorpusStats::default());
    }

    #[test]
    fn test_touch_only_moves_forward() {
        let mut store = MemoryStore::new();
        store.bump_counts(&[tok("a")], 1, 0, 100).unwrap();
        store.touch(&[tok("a"), tok("missing")], 50).unwrap();
        assert_eq!(store.get(&tok("a")).unwrap().unwrap().atime, 100);
        store.touch(&[tok("a")], 200).unwrap();
        assert_eq!(store.get(&tok("a")).unwrap().unwrap().atime, 200);
        assert!(store.get(&tok("missing")).unwrap().is_none());
    }

    #[test]
    fn test_read_only_tie_rejects_writes() {
        let mut store = MemoryStore::new();
        store.tie(TieMode::ReadOnly).unwrap();

        assert!(store.bump_counts(&[tok("a")], 1, 0, 1).is_err());
        assert!(store.set_corpus_counts(1, 0).is_err());
        assert!(store.put_seen("id", SeenFlag::Spam).is_err());
        assert!(store.touch(&[tok("a")], 1).is_ok());

        store.untie().unwrap();
        assert!(store.bump_counts(&[tok("a")], 1, 0, 1).is_ok());
    }

    #[test]
    fn test_double_tie_fails() {
        let mut store = MemoryStore::new();
        store.tie(TieMode::ReadWrite).unwrap();
        assert!(store.tie(TieMode::ReadOnly).is_err());
    }

    #[test]
    fn test_seen_flags() {
        let mut store = MemoryStore::new();
        store.put_seen("msg@example", SeenFlag::Ham).unwrap();
        assert_eq!(store.get_seen("msg@example").unwrap().as_deref(), Some("h"));
        store.delete_seen("msg@example").unwrap();
        assert!(store.get_seen("msg@example").unwrap().is_none());
    }

    #[test]
    fn test_snapshot_persists_on_untie() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db").join("bayes.json");

        let mut store = MemoryStore::open(&path).unwrap();
        store.tie(TieMode::ReadWrite).unwrap();
        store.set_corpus_counts(1, 0).unwrap();
        store.bump_counts(&[tok("cheap")], 1, 0, 1_700_000_000).unwrap();
        store.put_seen("id@example", SeenFlag::Spam).unwrap();
        store.untie().unwrap();
        assert!(path.exists());

        let reloaded = MemoryStore::open(&path).unwrap();
        assert_eq!(reloaded.corpus_counts().unwrap().spam_count, 1);
        assert_eq!(
            reloaded.get(&tok("cheap")).unwrap(),
            Some(TokenCounts {
                spam_count: 1,
                ham_count: 0,
                atime: 1_700_000_000
            })
        );
        assert_eq!(reloaded.get_seen("id@example").unwrap().as_deref(), Some("s"));
    }

    #[test]
    fn test_clean_session_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bayes.json");

        let mut store = MemoryStore::open(&path).unwrap();
        store.tie(TieMode::ReadOnly).unwrap();
        store.corpus_counts().unwrap();
        store.untie().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bayes.json");
        fs::write(&path, b"{not json").unwrap();

        assert!(matches!(MemoryStore::open(&path), Err(BayesError::Json(_))));
    }
}
