//! # session-pager
//!
//! Paginated, time-limited result session store.
//!
//! A long-running query or diagnostic stream writes its output into a
//! [`Session`]. Clients hold only the session's opaque ID and read the
//! output back in fixed-size pages until the session's deadline passes,
//! after which a background [`Pruner`] discards it.
//!
//! ## Features
//!
//! - **Unguessable handles**: 128-bit random session IDs
//! - **Pagination**: fixed-size pages with a next-page hint for polling clients
//! - **Expiry**: per-session deadlines enforced by a cancellable periodic sweep
//! - **Concurrency**: many readers, short exclusive sections for inserts and removal
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use session_pager::{Pruner, SessionStore, Tags};
//!
//! #[tokio::main]
//! async fn main() -> session_pager::Result<()> {
//!     session_pager::logging::try_init().ok();
//!
//!     let store = Arc::new(SessionStore::new());
//!     let pruner = Pruner::spawn(Arc::clone(&store), Duration::from_secs(1));
//!
//!     let tags = Tags::try_from_pairs([("task", "cpu_alert")])?;
//!     let session = store.create(tags)?;
//!     session.extend(["first line", "second line"])?;
//!     session.finish()?;
//!
//!     let page = store.get(&session.id())?.get_page(0)?;
//!     println!("{} records, next page {}", page.len(), session.page());
//!
//!     pruner.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;

// Re-export commonly used types
pub use error::{PagerError, Result};
pub use session::{
    Pruner, PrunerState, Record, Session, SessionId, SessionStore, StoreConfig, Tag, Tags,
};
