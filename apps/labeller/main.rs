use anyhow::{Result, bail};
use clap::Parser;
use dotenv::dotenv;
use labeller::{config, segment::Segmenter};
use tracing::info;
use utils::tracing::run_with_tracing;

/// Cuts raw text files into fixed-length records, optionally labelled for training
#[derive(Parser, Debug)]
#[command(name = "labeller")]
struct Cli {
    /// Text file inside the datasets directory to clean
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    file: Option<String>,

    /// Clean every .txt file in the datasets directory
    #[arg(long)]
    all: bool,

    /// Index into the configured output labels; writes a CSV instead of a .txc file
    #[arg(short, long)]
    label: Option<usize>,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    run_with_tracing("labeller", || async move { run(cli) }).await;
}

fn run(cli: Cli) -> Result<()> {
    let config = config::load()?;
    let segmenter = Segmenter::from_config(&config);

    if cli.all {
        let summaries = segmenter.clean_all(cli.label)?;
        info!(
            files = summaries.len(),
            records = summaries.iter().map(|s| s.records).sum::<usize>(),
            datasets_dir = %segmenter.datasets_dir().display(),
            "Done."
        );
        return Ok(());
    }

    let Some(file) = cli.file else {
        bail!("no input file given");
    };
    segmenter.clean(&file, cli.label)?;
    info!("Done.");
    Ok(())
}
