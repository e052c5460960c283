//! Session management module.
//!
//! This module provides the paginated result sessions, the store that
//! owns them, and the background task that expires them.

mod id;
mod paging;
mod pruner;
mod store;
mod tags;

pub use id::SessionId;
pub use paging::{Record, Session};
pub use pruner::{Pruner, PrunerState, DEFAULT_PRUNE_INTERVAL};
pub use store::{SessionStore, StoreConfig, DEFAULT_PAGE_SIZE, DEFAULT_TTL, MAX_TTL};
pub use tags::{Tag, Tags};
