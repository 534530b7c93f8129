use crate::{
    checkpoint::{Checkpoint, TokenStore},
    error::Result,
    listing_api::ListingApi,
    models::listing::Post,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Receives each fetched page, in order, for one source identifier.
#[async_trait(?Send)]
pub trait PageSink {
    async fn accept(&mut self, source: &str, items: Vec<Post>) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchStats {
    pub requests: usize,
    pub items: usize,
    /// The remote ran out of pages before the item cap was reached.
    pub exhausted: bool,
    /// A stored `Done` checkpoint meant nothing was requested.
    pub skipped: bool,
}

pub struct ListingFetcher {
    api: ListingApi,
    page_size: u32,
    store: Option<Arc<dyn TokenStore>>,
}

impl ListingFetcher {
    pub fn new(api: ListingApi, page_size: u32) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
            store: None,
        }
    }

    /// Resume from, and record progress to, `store`.
    pub fn with_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Whether fetches continue from stored checkpoints.
    pub fn resumes(&self) -> bool {
        self.store.is_some()
    }

    /// Pages through `source` newest-first until `max_items` items have been
    /// handed to `sink` or the remote has no further pages.
    #[instrument(skip(self, sink), fields(source = %source, max_items = max_items))]
    pub async fn fetch_source(
        &self,
        source: &str,
        max_items: usize,
        sink: &mut dyn PageSink,
    ) -> Result<FetchStats> {
        let mut stats = FetchStats::default();
        let mut after = match &self.store {
            Some(store) => match store.load(source).await? {
                Checkpoint::Fresh => None,
                Checkpoint::Resume { after } => {
                    info!(%after, "Resuming from checkpoint");
                    Some(after)
                }
                Checkpoint::Done => {
                    info!("Checkpoint marks source as done. Skipping.");
                    stats.skipped = true;
                    return Ok(stats);
                }
            },
            None => None,
        };

        while stats.items < max_items {
            let remaining = max_items - stats.items;
            let limit = u32::try_from(remaining).map_or(self.page_size, |r| r.min(self.page_size));

            let page = self.api.fetch_page(source, limit, after.as_deref()).await?;
            stats.requests += 1;

            let next = page.next_token().map(str::to_string);
            let mut items = page.items;
            let page_was_empty = items.is_empty();
            items.truncate(remaining);
            stats.items += items.len();

            debug!(
                page = stats.requests,
                items = items.len(),
                total = stats.items,
                "Fetched listing page"
            );

            if !items.is_empty() {
                sink.accept(source, items).await?;
            }

            let exhausted = page_was_empty || next.is_none();
            if let Some(store) = &self.store {
                let checkpoint = match &next {
                    Some(token) if !exhausted => Checkpoint::Resume {
                        after: token.clone(),
                    },
                    _ => Checkpoint::Done,
                };
                store.save(source, &checkpoint).await?;
            }

            if exhausted {
                info!(
                    requests = stats.requests,
                    items = stats.items,
                    "No continuation token. Stopping pagination."
                );
                stats.exhausted = true;
                break;
            }
            after = next;
        }

        info!(
            requests = stats.requests,
            items = stats.items,
            "Finished fetching source"
        );
        Ok(stats)
    }
}
