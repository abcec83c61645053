//! Token storage
//!
//! The classifier talks to its backing store through the [`TokenStore`]
//! trait:
//! - [`memory`]: in-memory store with an optional JSON snapshot
//!
//! Every call that reads or writes the store does so inside a
//! [`StoreSession`], which ties the store on open and unties it when
//! closed or dropped.

pub mod memory;
pub mod types;

use std::ops::{Deref, DerefMut};
use tracing::warn;

use crate::error::Result;
use crate::tokenizer::Token;

pub use memory::MemoryStore;
pub use types::{CorpusStats, SeenFlag, TieMode, TokenCounts};

/// Backing store for token counts, corpus totals and seen flags
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore {
    /// Acquire the store for a batch of operations
    fn tie(&mut self, _mode: TieMode) -> Result<()> {
        Ok(())
    }

    /// Release the store, committing pending writes
    fn untie(&mut self) -> Result<()> {
        Ok(())
    }

    fn get(&self, token: &Token) -> Result<Option<TokenCounts>>;

    /// Counts for several tokens, in input order
    fn get_all(&self, tokens: &[Token]) -> Result<Vec<Option<TokenCounts>>> {
        tokens.iter().map(|t| self.get(t)).collect()
    }

    fn corpus_counts(&self) -> Result<CorpusStats>;

    /// Adjust the corpus totals; results saturate at zero
    fn set_corpus_counts(&mut self, delta_spam: i64, delta_ham: i64) -> Result<()>;

    /// Adjust the counts of every token, creating missing ones
    ///
    /// Counts saturate at zero and the access time only moves forward.
    fn bump_counts(
        &mut self,
        tokens: &[Token],
        delta_spam: i32,
        delta_ham: i32,
        atime: i64,
    ) -> Result<()>;

    /// Move the access time of known tokens forward
    fn touch(&mut self, tokens: &[Token], atime: i64) -> Result<()>;

    /// Raw seen flag of a message; may be malformed
    fn get_seen(&self, msgid: &str) -> Result<Option<String>>;

    fn put_seen(&mut self, msgid: &str, flag: SeenFlag) -> Result<()>;

    fn delete_seen(&mut self, msgid: &str) -> Result<()>;
}

/// Scoped tie of a [`TokenStore`]
///
/// Dereferences to the store. Prefer [`StoreSession::close`] so untie
/// errors reach the caller; a dropped session unties and only logs.
pub struct StoreSession<'a, S: TokenStore + ?Sized> {
    store: &'a mut S,
    released: bool,
}

impl<'a, S: TokenStore + ?Sized> StoreSession<'a, S> {
    pub fn open(store: &'a mut S, mode: TieMode) -> Result<Self> {
        store.tie(mode)?;
        Ok(Self {
            store,
            released: false,
        })
    }

    pub fn close(mut self) -> Result<()> {
        self.released = true;
        self.store.untie()
    }
}

impl<S: TokenStore + ?Sized> Deref for StoreSession<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.store
    }
}

impl<S: TokenStore + ?Sized> DerefMut for StoreSession<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.store
    }
}

impl<S: TokenStore + ?Sized> Drop for StoreSession<'_, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.store.untie() {
            warn!("Failed to untie token store: {}", e);
        }
    }
}
