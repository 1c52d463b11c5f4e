//! Paged query iterator

use super::types::{PageOptions, PagedItem, PaginationState};
use crate::client::ApiClient;
use crate::decode::{CsvDecoder, JsonDecoder, Record, RecordDecoder};
use crate::error::{Error, Result};
use crate::query::Query;
use crate::response::QueryResponse;
use crate::types::ContentType;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Lazy sequence of items over all pages of a query.
///
/// Built through [`ApiClient::paged_query`]. The query is validated when the
/// pager is built, so a bad query fails before any HTTP call.
pub struct PagedQuery<'a> {
    client: &'a ApiClient,
    query: Query,
    options: PageOptions,
    state: PaginationState,
    buffer: VecDeque<PagedItem>,
}

impl<'a> PagedQuery<'a> {
    pub(crate) fn new(client: &'a ApiClient, query: &Query, options: PageOptions) -> Result<Self> {
        let kind = query.kind().ok_or_else(|| {
            Error::invalid_query(
                "Unknown query type None. Unable to page query.",
                query.to_value(),
            )
        })?;

        if !kind.is_pageable() {
            return Err(Error::invalid_query(
                format!("Queries of kind {kind} cannot be paged"),
                query.to_value(),
            ));
        }
        if query.is_aggregate() {
            return Err(Error::invalid_query(
                "Paging over aggregate queries (output.count) is not supported",
                query.to_value(),
            ));
        }
        if options.batch_size == 0 {
            return Err(Error::invalid_query(
                "batch_size must be greater than zero",
                query.to_value(),
            ));
        }

        let mut query = query.clone();
        if let Some(embedded) = query.embedded_limit() {
            warn!("Ignoring limit {embedded} set in the query body, use the paging limit instead");
        }
        query.set("limit", options.page_limit())?;

        Ok(Self {
            client,
            query,
            options,
            state: PaginationState::new(),
            buffer: VecDeque::new(),
        })
    }

    /// Query as it will be sent for the next page
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Running state
    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Next item, fetching a new page when the current one is used up.
    ///
    /// Returns `None` once paging is over. After an error nothing more is
    /// yielded.
    pub async fn next(&mut self) -> Option<Result<PagedItem>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.state.done {
                return None;
            }
            if self.state.limit_reached(self.options.limit) {
                self.state.mark_done();
                return None;
            }
            if let Err(e) = self.fetch_page().await {
                self.state.mark_done();
                return Some(Err(e));
            }
        }
    }

    /// Drain every remaining item
    pub async fn collect_all(mut self) -> Result<Vec<PagedItem>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item?);
        }
        Ok(items)
    }

    /// Turn the pager into a `Stream`
    pub fn into_stream(self) -> BoxStream<'a, Result<PagedItem>> {
        stream::unfold(self, |mut pager| async move {
            pager.next().await.map(|item| (item, pager))
        })
        .boxed()
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let response = self.client.query(&self.query, None).await?;
        self.state.pages += 1;
        debug!(
            page = self.state.pages,
            returned = ?response.returned_count(),
            total = ?response.total_count(),
            "Fetched page"
        );

        if self.options.raw {
            self.state.yielded += page_count(&response);
            self.buffer.push_back(PagedItem::Response(response.clone()));
        } else if response.is_json() {
            match self.options.field.clone() {
                Some(field) => {
                    let records = JsonDecoder::with_field(field).decode(&response)?;
                    self.accept_all(records);
                }
                None => {
                    let records = JsonDecoder::new().decode(&response)?;
                    self.state.yielded += page_count(&response);
                    self.buffer.extend(records.into_iter().map(PagedItem::from));
                }
            }
        } else if response.content_type() == ContentType::Csv {
            match CsvDecoder::new().decode(&response) {
                Ok(records) => self.accept_all(records),
                Err(e) => {
                    warn!("Could not decode CSV page, yielding the raw response: {e}");
                    self.buffer.push_back(PagedItem::Response(response));
                    self.state.mark_done();
                    return Ok(());
                }
            }
        } else {
            debug!("No item support for this content type, yielding the raw response");
            self.buffer.push_back(PagedItem::Response(response));
            self.state.mark_done();
            return Ok(());
        }

        self.advance(&response)
    }

    /// Queue decoded records, honoring `unique` and `limit`
    fn accept_all(&mut self, records: Vec<Record>) {
        for record in records {
            if self.state.limit_reached(self.options.limit) {
                break;
            }

            if !record.is_countable() {
                if !self.state.header_sent {
                    self.state.header_sent = true;
                    self.buffer.push_back(PagedItem::from(record));
                }
                continue;
            }

            let item = PagedItem::from(record);

            if self.options.unique {
                if let Some(key) = item.dedup_key() {
                    if !self.state.first_sighting(key) {
                        continue;
                    }
                }
            }

            self.state.yielded += 1;
            self.buffer.push_back(item);
        }
    }

    /// Decide whether to stop, otherwise move the cursor
    fn advance(&mut self, response: &QueryResponse) -> Result<()> {
        if self.state.limit_reached(self.options.limit) {
            debug!("Limit reached after {} items", self.state.yielded);
            self.state.mark_done();
            return Ok(());
        }

        if response
            .total_count()
            .is_some_and(|total| total <= self.state.yielded as u64)
        {
            debug!("All {} items seen", self.state.yielded);
            self.state.mark_done();
            return Ok(());
        }

        match response.next_page_start() {
            Some(cursor) if response.has_more_results() => {
                self.query.set("page_start", cursor)?;
            }
            _ => self.state.mark_done(),
        }
        Ok(())
    }
}

impl std::fmt::Debug for PagedQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedQuery")
            .field("query", &self.query)
            .field("options", &self.options)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Items a whole page counts for; one when the server does not say
fn page_count(response: &QueryResponse) -> usize {
    response
        .returned_count()
        .map_or(1, |n| usize::try_from(n).unwrap_or(usize::MAX))
}
