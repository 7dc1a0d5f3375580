//! Per-model document tracking.
//!
//! Instead of a side table keyed by object identity, every document handed
//! out by a model carries its own tracking state together with the key of the
//! model instance that produced it. Saving or incrementing through a
//! different model instance is rejected as unmanaged.

use crate::core::{DocError, DocId, Document, IdentityRef, Result};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_MODEL_KEY: AtomicU64 = AtomicU64::new(1);

/// Opaque handle naming one model instance within this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelKey(u64);

impl ModelKey {
    pub(crate) fn next() -> Self {
        Self(NEXT_MODEL_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Whether a tracked document has reached the store yet.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackState {
    /// Created in memory, never inserted.
    New,
    /// Loaded from, or inserted into, the store. `baseline` is a deep copy of
    /// the state at that moment.
    Fetched { baseline: Document },
}

/// A document managed by a model. Dereferences to the underlying
/// [`Document`] for field access.
///
/// Deliberately not `Clone`: a copy would share the original's tracking
/// decision without being the same document.
#[derive(Debug)]
pub struct TrackedDocument {
    owner: ModelKey,
    state: TrackState,
    doc: Document,
}

impl TrackedDocument {
    pub(crate) fn new_document(owner: ModelKey, doc: Document) -> Self {
        Self {
            owner,
            state: TrackState::New,
            doc,
        }
    }

    pub(crate) fn fetched(owner: ModelKey, doc: Document) -> Self {
        let baseline = doc.clone();
        Self {
            owner,
            state: TrackState::Fetched { baseline },
            doc,
        }
    }

    /// Records a successful first insert: the document takes the store's
    /// identity and becomes Fetched with a fresh baseline.
    pub(crate) fn mark_inserted(&mut self, id: DocId) {
        self.doc.set_id(Some(id));
        self.state = TrackState::Fetched {
            baseline: self.doc.clone(),
        };
    }

    pub(crate) fn ensure_owned_by(&self, owner: ModelKey, collection: &str) -> Result<()> {
        if self.owner != owner {
            return Err(DocError::UnmanagedObject {
                collection: collection.to_string(),
            });
        }
        Ok(())
    }

    pub fn state(&self) -> &TrackState {
        &self.state
    }

    pub fn is_new(&self) -> bool {
        matches!(self.state, TrackState::New)
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self.state, TrackState::Fetched { .. })
    }

    /// Snapshot taken at load or insert time; `None` for new documents.
    pub fn baseline(&self) -> Option<&Document> {
        match &self.state {
            TrackState::New => None,
            TrackState::Fetched { baseline } => Some(baseline),
        }
    }

    /// True when the in-memory state differs from the baseline. New
    /// documents always count as modified.
    pub fn is_modified(&self) -> bool {
        self.baseline().is_none_or(|baseline| baseline != &self.doc)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Gives up tracking and returns the plain document.
    pub fn into_document(self) -> Document {
        self.doc
    }
}

impl Deref for TrackedDocument {
    type Target = Document;

    fn deref(&self) -> &Document {
        &self.doc
    }
}

impl DerefMut for TrackedDocument {
    fn deref_mut(&mut self) -> &mut Document {
        &mut self.doc
    }
}

impl IdentityRef for TrackedDocument {
    fn to_doc_id(&self) -> Result<DocId> {
        self.doc.to_doc_id()
    }
}

/// Target of an increment: an identity, its string form, or a live tracked
/// document whose in-memory field is updated alongside the store.
pub enum DocRef<'a> {
    Id(DocId),
    Str(&'a str),
    Tracked(&'a mut TrackedDocument),
}

impl From<DocId> for DocRef<'_> {
    fn from(id: DocId) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a str> for DocRef<'a> {
    fn from(id: &'a str) -> Self {
        Self::Str(id)
    }
}

impl<'a> From<&'a String> for DocRef<'a> {
    fn from(id: &'a String) -> Self {
        Self::Str(id.as_str())
    }
}

impl<'a> From<&'a mut TrackedDocument> for DocRef<'a> {
    fn from(doc: &'a mut TrackedDocument) -> Self {
        Self::Tracked(doc)
    }
}
