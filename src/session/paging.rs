//! A single paginated result session.

use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::{SessionId, Tags};
use crate::error::PagerError;
use crate::Result;

/// One opaque content record produced into a session.
///
/// The core never looks inside a record; encoding is left to whoever
/// serves the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(String);

impl Record {
    pub fn new(content: impl Into<String>) -> Self {
        Self(content.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Record {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Record {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default)]
struct RecordLog {
    records: Vec<Record>,
    finished: bool,
}

/// Paginated, append-only output of one logical query.
///
/// Identity, tags and timing are fixed at creation. Records are appended by
/// a producer and read back one page at a time; both go through the same
/// lock, so a reader never sees a page half-written.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    tags: Tags,
    created_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    expires_at: Instant,
    page_size: usize,
    log: RwLock<RecordLog>,
}

impl Session {
    /// Create a session that expires `ttl` from now.
    ///
    /// `ttl` must be non-zero and `page_size` at least one; the store
    /// configuration guarantees both.
    pub(crate) fn new(id: SessionId, tags: Tags, ttl: Duration, page_size: usize) -> Self {
        let created_at = Utc::now();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);

        Self {
            id,
            tags,
            created_at,
            deadline: created_at + chrono::Duration::milliseconds(ttl_ms),
            expires_at: Instant::now() + ttl,
            page_size: page_size.max(1),
            log: RwLock::new(RecordLog::default()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Absolute instant after which the session is no longer served.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Monotonic counterpart of [`deadline`](Self::deadline), used for pruning.
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The page a client should request next.
    ///
    /// While the producer is running this is the first page that is not yet
    /// full. Once finished it points one past the last page holding records,
    /// where the client reads an empty page marking the end of the stream.
    ///
    /// A poisoned record lock reports page 0 rather than failing; the
    /// following [`get_page`](Self::get_page) call surfaces the fault.
    pub fn page(&self) -> usize {
        match self.log.read() {
            Ok(log) => self.next_page(&log),
            Err(_) => {
                tracing::error!(session_id = %self.id, "record lock poisoned, reporting page 0");
                0
            }
        }
    }

    fn next_page(&self, log: &RecordLog) -> usize {
        if log.finished {
            log.records.len().div_ceil(self.page_size)
        } else {
            log.records.len() / self.page_size
        }
    }

    /// Return the records of page `page`.
    ///
    /// While the producer is running only full pages are served; a page
    /// that is still filling fails with [`PagerError::OutOfRange`] so a
    /// client never caches it as final. Once finished, the last page may be
    /// short, and the page just past it (the [`page`](Self::page) hint) is
    /// empty. Negative pages and pages beyond that hint are out of range.
    pub fn get_page(&self, page: i64) -> Result<Vec<Record>> {
        let log = self.read_log()?;
        let available = log.records.len();
        let out_of_range = || PagerError::OutOfRange { page, available };

        let index = usize::try_from(page).map_err(|_| out_of_range())?;
        let servable = if log.finished {
            index <= self.next_page(&log)
        } else {
            index < self.next_page(&log)
        };
        if !servable {
            return Err(out_of_range());
        }

        let start = index.saturating_mul(self.page_size).min(available);
        let end = start.saturating_add(self.page_size).min(available);
        Ok(log.records[start..end].to_vec())
    }

    /// Append one record produced by the stream feeding this session.
    pub fn append(&self, record: impl Into<Record>) -> Result<()> {
        self.extend(std::iter::once(record.into()))
    }

    /// Append a batch of records atomically with respect to page reads.
    pub fn extend<I>(&self, records: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Record>,
    {
        let mut log = self.write_log()?;
        if log.finished {
            return Err(PagerError::InvalidRequest(format!(
                "session {} is finished and accepts no more records",
                self.id
            )));
        }
        log.records.extend(records.into_iter().map(Into::into));
        Ok(())
    }

    /// Mark the stream as exhausted. Calling it again is a no-op.
    pub fn finish(&self) -> Result<()> {
        self.write_log()?.finished = true;
        Ok(())
    }

    /// Whether the producer has finished. A poisoned lock reads as
    /// unfinished and is logged.
    pub fn is_finished(&self) -> bool {
        self.read_log()
            .map(|l| l.finished)
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "reporting session as unfinished");
                false
            })
    }

    /// Number of records produced so far. A poisoned lock reads as zero and
    /// is logged.
    pub fn len(&self) -> usize {
        self.read_log()
            .map(|l| l.records.len())
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "reporting session as empty");
                0
            })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_log(&self) -> Result<RwLockReadGuard<'_, RecordLog>> {
        self.log
            .read()
            .map_err(|_| PagerError::StoreFault(format!("record lock poisoned for {}", self.id)))
    }

    fn write_log(&self) -> Result<RwLockWriteGuard<'_, RecordLog>> {
        self.log
            .write()
            .map_err(|_| PagerError::StoreFault(format!("record lock poisoned for {}", self.id)))
    }
}
