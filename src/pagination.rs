//! Lazy continuation of multi-page list responses.
//!
//! A paginated verb is modeled as one forward-only sequence of items
//! spanning all pages. Pages are fetched strictly on demand: nothing is
//! requested until the iterator is first advanced, and no page is
//! fetched while the current one still has items. The sequence is
//! single-pass; restarting means re-invoking the verb from page one.

use crate::error::{HarvestError, Result};

/// One page of a list response: its items plus the resumption token
/// for the next page, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items of this page, in document order.
    pub items: Vec<T>,
    /// Token for the next page. `None` means the result is complete.
    pub token: Option<String>,
}

impl<T> Page<T> {
    /// Create a page.
    #[must_use]
    pub fn new(items: Vec<T>, token: Option<String>) -> Self {
        Self { items, token }
    }

    /// Create a final page with no continuation.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self { items, token: None }
    }
}

/// Iterator driving the resumption-token protocol.
///
/// Built from two fetch behaviors: `first` obtains page one, `next`
/// obtains the page behind a token. An absent (or blank) token is the
/// only termination condition. A fetch error is yielded once, in
/// sequence position, and ends the iteration; items already yielded
/// are not rolled back.
pub struct ResumptionIter<T, F, N> {
    first: Option<F>,
    next: N,
    buffer: std::vec::IntoIter<T>,
    token: Option<String>,
    done: bool,
}

impl<T, F, N> ResumptionIter<T, F, N>
where
    F: FnOnce() -> Result<Page<T>>,
    N: FnMut(&str) -> Result<Page<T>>,
{
    /// Create the iterator. No fetch happens until the first
    /// [`Iterator::next`] call.
    pub fn new(first: F, next: N) -> Self {
        Self {
            first: Some(first),
            next,
            buffer: Vec::new().into_iter(),
            token: None,
            done: false,
        }
    }

    /// Store a fetched page, dropping a blank token so it can never be
    /// mistaken for "more data follows".
    fn load(&mut self, page: Page<T>) {
        self.buffer = page.items.into_iter();
        self.token = page.token.filter(|t| !t.trim().is_empty());
    }
}

impl<T, F, N> Iterator for ResumptionIter<T, F, N>
where
    F: FnOnce() -> Result<Page<T>>,
    N: FnMut(&str) -> Result<Page<T>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if let Some(item) = self.buffer.next() {
                return Some(Ok(item));
            }

            let fetched = if let Some(first) = self.first.take() {
                first()
            } else if let Some(token) = self.token.take() {
                tracing::debug!(token = %token, "fetching continuation page");
                (self.next)(&token)
            } else {
                self.done = true;
                return None;
            };

            match fetched {
                Ok(page) => self.load(page),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
