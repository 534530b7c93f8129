use crate::{
    checkpoint::TokenStore,
    config::{PathsConfig, ReaderConfig},
    error::Result,
    fetcher::{ListingFetcher, PageSink},
    listing_api::ListingApi,
    models::listing::Post,
    normalize::{ExtractMode, extract_text},
    sink,
};
use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::time::sleep;
use tracing::{debug, info, instrument};

pub const DEFAULT_POST_LIMIT: usize = 10_000;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Items to fetch per source identifier.
    pub max_items: usize,
    /// Truncate each category file before fetching into it.
    pub clobber: bool,
    /// Pause before each source identifier's fetch loop.
    pub request_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_POST_LIMIT,
            clobber: true,
            request_delay: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub path: PathBuf,
    pub lines: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub categories: BTreeMap<String, CategorySummary>,
    pub requests: usize,
}

impl RunSummary {
    pub fn files(&self) -> Vec<PathBuf> {
        self.categories.values().map(|c| c.path.clone()).collect()
    }
}

/// Appends the title line of every fetched post to one category file.
struct CategoryWriter<'a> {
    category: &'a str,
    path: &'a Path,
    lines: usize,
}

#[async_trait(?Send)]
impl PageSink for CategoryWriter<'_> {
    async fn accept(&mut self, source: &str, items: Vec<Post>) -> Result<()> {
        for post in &items {
            let line = extract_text(post, ExtractMode::TitleOnly);
            sink::append_line(self.path, &line).await?;
            self.lines += 1;
        }
        debug!(
            source,
            category = self.category,
            written = items.len(),
            total = self.lines,
            "Appended page to category file"
        );
        Ok(())
    }
}

pub struct ReaderPipeline {
    fetcher: ListingFetcher,
    categories: BTreeMap<String, Vec<String>>,
    paths: PathsConfig,
}

impl ReaderPipeline {
    pub fn new(
        fetcher: ListingFetcher,
        categories: BTreeMap<String, Vec<String>>,
        paths: PathsConfig,
    ) -> Self {
        Self {
            fetcher,
            categories,
            paths,
        }
    }

    pub fn from_config(config: &ReaderConfig, store: Option<Arc<dyn TokenStore>>) -> Result<Self> {
        let api = ListingApi::new(&config.api)?;
        let mut fetcher = ListingFetcher::new(api, config.api.page_size);
        if let Some(store) = store {
            fetcher = fetcher.with_store(store);
        }
        Ok(Self::new(
            fetcher,
            config.categories.clone(),
            config.paths.clone(),
        ))
    }

    /// Fetches every configured category in turn. The first error aborts the
    /// whole run, leaving later categories untouched.
    ///
    /// A resuming fetcher never truncates: lines from earlier pages, and from
    /// sources already marked done, stay in the category files.
    #[instrument(skip(self), fields(max_items = options.max_items, clobber = options.clobber))]
    pub async fn run(&self, options: &RunOptions) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::default();

        let clobber = options.clobber && !self.fetcher.resumes();
        if options.clobber && !clobber {
            info!("Resuming from checkpoints, appending to existing category files");
        }

        for (category, sources) in &self.categories {
            info!(category = %category, sources = sources.len(), "Now working on category");
            let path = self.paths.category_file(category);

            if clobber {
                sink::truncate(&path).await?;
            }

            let mut writer = CategoryWriter {
                category,
                path: &path,
                lines: 0,
            };

            for source in sources {
                sleep(options.request_delay).await;
                info!(category = %category, source = %source, "Reading source");
                let stats = self
                    .fetcher
                    .fetch_source(source, options.max_items, &mut writer)
                    .await?;
                summary.requests += stats.requests;
                info!(
                    category = %category,
                    source = %source,
                    items = stats.items,
                    exhausted = stats.exhausted,
                    "Source classed into category"
                );
            }

            let lines = writer.lines;
            summary
                .categories
                .insert(category.clone(), CategorySummary { path, lines });
        }

        info!(
            categories = summary.categories.len(),
            requests = summary.requests,
            duration = ?start_time.elapsed(),
            "Finished reading all categories"
        );
        Ok(summary)
    }
}
