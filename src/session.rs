// Copyright 2026 Content Hub Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Paginated search session.
//!
//! Each fetch is split into a `begin_*` step that yields a [`PageTicket`]
//! and [`SearchSession::complete`] which applies the provider's outcome.
//! Tickets carry the session generation they were issued under plus a
//! sequence number of their own; a fresh search or a reset advances the
//! generation, and only the ticket currently in flight is ever applied.

use tracing::debug;
use tracing::warn;

use crate::history::SearchHistory;
use crate::model::ContentItem;
use crate::model::SearchFilter;
use crate::provider::Page;
use crate::provider::PageRequest;
use crate::provider::SearchError;
use crate::provider::SearchProvider;
use crate::query::parse_query;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    First,
    Next,
}

#[derive(Debug, PartialEq, Eq)]
pub struct PageTicket {
    generation: u64,
    seq: u64,
    kind: FetchKind,
    pub request: PageRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// First page stored; holds the number of items.
    Replaced(usize),
    /// Next page appended; holds the number of new items.
    Appended(usize),
    /// Nothing to do: a fetch is in flight or the results are exhausted.
    Skipped,
    /// The ticket belongs to a superseded search and was discarded.
    Stale,
}

#[derive(Debug, Clone)]
pub struct SearchSession {
    page_size: usize,
    filter: SearchFilter,
    items: Vec<ContentItem>,
    cursor: Option<String>,
    has_more: bool,
    total: usize,
    generation: u64,
    next_seq: u64,
    /// Sequence number of the ticket currently in flight.
    in_flight: Option<u64>,
}

impl SearchSession {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            filter: SearchFilter::default(),
            items: Vec::new(),
            cursor: None,
            has_more: false,
            total: 0,
            generation: 0,
            next_seq: 0,
            in_flight: None,
        }
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Start a new top-level search. Any fetch still in flight is
    /// superseded.
    pub fn begin_search(&mut self, query: &str) -> PageTicket {
        self.generation += 1;
        let seq = self.issue();
        self.filter = parse_query(query);
        self.cursor = None;
        PageTicket {
            generation: self.generation,
            seq,
            kind: FetchKind::First,
            request: self.page_request(None),
        }
    }

    /// Start fetching the next page, or `None` when a fetch is already in
    /// flight or there is nothing more to load.
    pub fn begin_load_more(&mut self) -> Option<PageTicket> {
        if self.in_flight.is_some() || !self.has_more {
            return None;
        }
        let cursor = self.cursor.clone()?;
        let seq = self.issue();
        Some(PageTicket {
            generation: self.generation,
            seq,
            kind: FetchKind::Next,
            request: self.page_request(Some(cursor)),
        })
    }

    fn issue(&mut self) -> u64 {
        self.next_seq += 1;
        self.in_flight = Some(self.next_seq);
        self.next_seq
    }

    fn page_request(&self, cursor: Option<String>) -> PageRequest {
        PageRequest {
            keywords: self.filter.keyword.clone(),
            content_type: self.filter.content_type,
            num: self.page_size,
            cursor,
        }
    }

    /// Apply the outcome of a ticket's fetch.
    pub fn complete(
        &mut self,
        ticket: PageTicket,
        outcome: Result<Page, SearchError>,
    ) -> Result<Applied, SearchError> {
        if self.in_flight != Some(ticket.seq) || ticket.generation != self.generation {
            debug!(
                ticket = ticket.seq,
                generation = ticket.generation,
                current = self.generation,
                "dropping stale page"
            );
            return Ok(Applied::Stale);
        }
        self.in_flight = None;

        match (ticket.kind, outcome) {
            (FetchKind::First, Ok(page)) => {
                let count = page.items.len();
                self.items = page.items;
                self.total = count;
                self.has_more = page.next_cursor.is_some();
                self.cursor = page.next_cursor;
                debug!(count, has_more = self.has_more, "first page loaded");
                Ok(Applied::Replaced(count))
            }
            (FetchKind::First, Err(err)) => {
                warn!(error = %err, "search failed");
                self.items.clear();
                self.total = 0;
                self.has_more = false;
                self.cursor = None;
                Err(err)
            }
            (FetchKind::Next, Ok(page)) => {
                let count = page.items.len();
                self.items.extend(page.items);
                self.total = self.items.len();
                self.has_more = page.next_cursor.is_some();
                self.cursor = page.next_cursor;
                debug!(count, has_more = self.has_more, "next page loaded");
                Ok(Applied::Appended(count))
            }
            (FetchKind::Next, Err(err)) => {
                warn!(error = %err, "load more failed");
                Err(err)
            }
        }
    }

    /// Run a fresh search to completion. A non-blank query is recorded in
    /// `history` once the first page has loaded.
    pub fn search<P: SearchProvider + ?Sized>(
        &mut self,
        provider: &P,
        history: &mut SearchHistory,
        query: &str,
    ) -> Result<Applied, SearchError> {
        let ticket = self.begin_search(query);
        let outcome = provider.fetch_page(&ticket.request);
        let applied = self.complete(ticket, outcome)?;
        history.add_search(query);
        Ok(applied)
    }

    pub fn load_more<P: SearchProvider + ?Sized>(
        &mut self,
        provider: &P,
    ) -> Result<Applied, SearchError> {
        let Some(ticket) = self.begin_load_more() else {
            return Ok(Applied::Skipped);
        };
        let outcome = provider.fetch_page(&ticket.request);
        self.complete(ticket, outcome)
    }

    pub fn reset(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.filter = SearchFilter::default();
        self.items.clear();
        self.cursor = None;
        self.has_more = false;
        self.total = 0;
    }
}
