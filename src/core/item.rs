//! Work items and their identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a submitted work item
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Wrap a raw identifier
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier value
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of submitted data.
///
/// Fields are private: an item cannot be changed once it has been built,
/// only read by the worker that dequeues it or reclaimed with
/// [`WorkItem::into_payload`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem<P> {
    id: ItemId,
    payload: P,
}

impl<P> WorkItem<P> {
    /// Create an item with a caller-assigned id
    pub fn new(id: u64, payload: P) -> Self {
        Self::with_id(ItemId::new(id), payload)
    }

    /// Create an item from an existing [`ItemId`]
    pub fn with_id(id: ItemId, payload: P) -> Self {
        Self { id, payload }
    }

    /// Item identifier
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Borrow the payload
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consume the item and return its payload
    pub fn into_payload(self) -> P {
        self.payload
    }
}
