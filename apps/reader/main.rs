use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use reader::{
    checkpoint::{FileTokenStore, TokenStore},
    config,
    pipeline::{DEFAULT_POST_LIMIT, ReaderPipeline, RunOptions},
    sink::copy_outputs,
};
use std::sync::Arc;
use tracing::info;
use utils::{
    errors::{COPY_OUTPUT_FAILED, RUN_ABORTED},
    tracing::run_with_tracing,
};

/// Reads the newest posts of every configured source into one text file per category
#[derive(Parser, Debug)]
#[command(name = "reader")]
struct Cli {
    /// How many posts to read from each source
    #[arg(short = 'n', long = "post-limit", default_value_t = DEFAULT_POST_LIMIT)]
    post_limit: usize,

    /// Append to existing category files instead of truncating them first
    #[arg(long = "no-clobber")]
    no_clobber: bool,

    /// Continue each source from its stored checkpoint. Implies --no-clobber
    #[arg(long)]
    resume: bool,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    run_with_tracing("reader", || run(cli)).await;
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load()?;

    let store: Option<Arc<dyn TokenStore>> = if cli.resume {
        Some(Arc::new(FileTokenStore::new(&config.paths.checkpoints_dir)))
    } else {
        None
    };

    let pipeline = ReaderPipeline::from_config(&config, store)?;
    let options = RunOptions {
        max_items: cli.post_limit,
        clobber: !cli.no_clobber && !cli.resume,
        request_delay: config.api.request_delay(),
    };

    let summary = pipeline.run(&options).await.context(RUN_ABORTED)?;
    for (category, written) in &summary.categories {
        info!(
            category = %category,
            lines = written.lines,
            path = %written.path.display(),
            "Category written"
        );
    }

    if let Some(destination) = &config.copy_destination {
        copy_outputs(&summary.files(), destination)
            .await
            .context(COPY_OUTPUT_FAILED)?;
    }

    Ok(())
}
