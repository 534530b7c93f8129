use anyhow::{Context, Result};
use dotenv::dotenv;
use reader::{
    ReaderError,
    checkpoint::FileTokenStore,
    classify::{ClassMap, Classifier, SelfPostClassifier},
    config,
    fetcher::ListingFetcher,
    listing_api::ListingApi,
};
use std::{io, sync::Arc};
use tracing::info;
use utils::{errors::RUN_ABORTED, tracing::run_with_tracing};

const SOURCE: &str = "bitcoin";
const POST_LIMIT: usize = 1000;

#[tokio::main]
async fn main() {
    dotenv().ok();

    run_with_tracing("classify", run).await;
}

async fn run() -> Result<()> {
    let mut config = config::load()?;
    config.api.user_agent = "DSTK-RedditReader/0.1".to_string();
    let datasets = &config.paths.datasets_dir;

    let classes = ClassMap::new([
        ('1', datasets.join("Exp01-reddit-bitcoin-faqs.txt")),
        ('2', datasets.join("Exp01-reddit-bitcoin-nonfaqs.txt")),
    ])?;

    let api = ListingApi::new(&config.api)?;
    let fetcher = ListingFetcher::new(api, config.api.page_size).with_store(Arc::new(
        FileTokenStore::new(config.paths.checkpoints_dir.join("classify")),
    ));

    let stdin = io::stdin();
    let classifier = Classifier::new(stdin.lock(), io::stdout(), classes);
    let mut sink = SelfPostClassifier::new(classifier);

    match fetcher.fetch_source(SOURCE, POST_LIMIT, &mut sink).await {
        Ok(_) | Err(ReaderError::InputClosed) => {}
        Err(e) => return Err(e).context(RUN_ABORTED),
    }

    info!(
        evaluated = sink.evaluated(),
        written = sink.written(),
        "Classification session finished"
    );
    Ok(())
}
