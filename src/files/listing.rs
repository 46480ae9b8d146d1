//! Listing synchronization
//!
//! Fetches a directory's entries and orders them folders-first while keeping
//! the server's order within each group. Every fetch takes a ticket from the
//! [`ListingSequencer`]; only the newest ticket may be applied, so a fetch for a
//! directory the user has already left is dropped when it resolves.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::error::FileError;
use super::path_utils::RemoteDir;
use super::types::Entry;
use crate::api::FileApi;

/// Folders first; server order is otherwise kept (stable sort).
pub fn sort_listing(entries: &mut [Entry]) {
    entries.sort_by_key(|entry| !entry.is_folder);
}

/// Fetch and order the entries of `dir`.
pub async fn fetch_listing(api: &dyn FileApi, dir: &RemoteDir) -> Result<Vec<Entry>, FileError> {
    let mut entries = api.list_folder(dir).await?;
    sort_listing(&mut entries);
    debug!("Listed {} entries in {}", entries.len(), dir);
    Ok(entries)
}

/// A pending fetch: which directory it is for and its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingTicket {
    pub generation: u64,
    pub dir: RemoteDir,
}

/// Monotonic generation counter for listing fetches.
///
/// Generation 0 is reserved for "nothing fetched yet".
#[derive(Debug, Default)]
pub struct ListingSequencer {
    counter: AtomicU64,
}

impl ListingSequencer {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    /// Issue a ticket for `dir`, superseding every earlier ticket.
    pub fn issue(&self, dir: RemoteDir) -> ListingTicket {
        let generation = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        ListingTicket { generation, dir }
    }

    /// Latest generation handed out.
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Whether `ticket` is still the newest one.
    pub fn is_current(&self, ticket: &ListingTicket) -> bool {
        ticket.generation == self.current()
    }
}
