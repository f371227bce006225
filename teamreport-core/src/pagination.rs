//! Cursor-following collection of paginated listings.
//!
//! Team API listings signal completion in one of two ways: an explicit
//! `has_more` flag next to a cursor, or an empty/absent cursor. Both are
//! normalized into [`Continuation`] when a [`Page`] is built, so the
//! [`Collector`] loop only ever sees `More(cursor)` or `Done`. Failures travel
//! on the `Result` channel and never double as a completion signal.

use async_trait::async_trait;
use tracing::debug;

use crate::config::PaginationConfig;
use crate::{ReportError, Result};

/// Opaque continuation token returned by a paginated call.
///
/// A cursor is only meaningful to the listing that produced it and is never
/// persisted between runs.
#[derive(Clone, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    /// Wraps a raw cursor, treating an empty string as "no cursor".
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() { None } else { Some(Self(raw)) }
    }

    /// Raw token to send back to the API.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Cursors can be long; the length is enough to tell them apart in logs.
        write!(f, "Cursor(len={})", self.0.len())
    }
}

/// Whether another page follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Fetch the next page with this cursor
    More(Cursor),
    /// The listing is complete
    Done,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub entries: Vec<T>,
    pub continuation: Continuation,
}

impl<T> Page<T> {
    /// Builds a page from an API that signals completion with an empty or
    /// absent cursor.
    pub fn from_cursor(entries: Vec<T>, cursor: Option<String>) -> Self {
        let continuation = cursor
            .and_then(Cursor::new)
            .map_or(Continuation::Done, Continuation::More);
        Self {
            entries,
            continuation,
        }
    }

    /// Builds a page from an API that signals completion with `has_more`.
    ///
    /// # Errors
    /// Returns a transport error when `has_more` is set but no cursor came
    /// with it.
    pub fn from_has_more(
        endpoint: &str,
        entries: Vec<T>,
        has_more: bool,
        cursor: Option<String>,
    ) -> Result<Self> {
        if !has_more {
            return Ok(Self::last(entries));
        }
        match cursor.and_then(Cursor::new) {
            Some(cursor) => Ok(Self {
                entries,
                continuation: Continuation::More(cursor),
            }),
            None => Err(ReportError::protocol(
                endpoint,
                "response has more pages but carries no cursor",
            )),
        }
    }

    /// Builds the final page of a listing.
    pub const fn last(entries: Vec<T>) -> Self {
        Self {
            entries,
            continuation: Continuation::Done,
        }
    }

    /// Returns true when no page follows this one.
    pub const fn is_last(&self) -> bool {
        matches!(self.continuation, Continuation::Done)
    }
}

/// A paginated listing the [`Collector`] can drain.
#[async_trait]
pub trait PageSource: Sync {
    /// Entity type carried by each page
    type Item: Send;

    /// Endpoint name used in logs and errors
    fn endpoint(&self) -> &str;

    /// Fetches the first page.
    async fn first(&self) -> Result<Page<Self::Item>>;

    /// Fetches the page following `cursor`.
    async fn next(&self, cursor: &Cursor) -> Result<Page<Self::Item>>;
}

/// Drains paginated listings into complete, order-preserving sequences.
#[derive(Debug, Clone, Copy)]
pub struct Collector {
    max_pages: u32,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(&PaginationConfig::default())
    }
}

impl Collector {
    /// Creates a collector bounded by the configured page cap.
    pub const fn new(config: &PaginationConfig) -> Self {
        Self {
            max_pages: config.max_pages,
        }
    }

    /// Fetches every page of `source` and concatenates the entries.
    ///
    /// Issues exactly one `first` call and one `next` call per continuation
    /// cursor. Entries keep page order and in-page order.
    ///
    /// # Errors
    /// Any fetch error aborts the walk; entries gathered so far are dropped
    /// so a partial listing is never returned as complete. A listing that is
    /// still reporting more pages once `max_pages` pages were fetched fails
    /// with [`ReportError::PageLimitExceeded`].
    pub async fn collect<S>(&self, source: &S) -> Result<Vec<S::Item>>
    where
        S: PageSource + ?Sized,
    {
        let endpoint = source.endpoint();
        debug!("Fetching first page of {}", endpoint);

        let mut items = Vec::new();
        let mut page = source.first().await?;
        let mut fetched: u32 = 1;

        loop {
            let Page {
                entries,
                continuation,
            } = page;
            items.extend(entries);

            let cursor = match continuation {
                Continuation::Done => {
                    debug!(
                        "Finished {} after {} page(s), {} entries",
                        endpoint,
                        fetched,
                        items.len()
                    );
                    return Ok(items);
                }
                Continuation::More(cursor) => cursor,
            };

            if fetched >= self.max_pages {
                return Err(ReportError::page_limit(endpoint, self.max_pages));
            }

            debug!("Fetching page {} of {}", fetched.saturating_add(1), endpoint);
            page = source.next(&cursor).await?;
            fetched = fetched.saturating_add(1);
        }
    }
}
