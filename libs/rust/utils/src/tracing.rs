use futures::{Future, FutureExt};
use ::tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn setup_tracing() {
    let mut filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // HTTP/networking crates
    for directive in ["hyper_util=off", "reqwest=off"] {
        if let Ok(directive) = directive.parse() {
            filter_layer = filter_layer.add_directive(directive);
        }
    }

    // Ensure the fmt layer logs to the console
    let fmt_layer = fmt::layer()
        .with_line_number(true)
        .compact()
        .with_writer(std::io::stdout);

    // try_init so tests and repeated calls don't panic on a second global subscriber
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}

/// Runs a top-level operation the way the toolkit binaries expect: any error or
/// panic is logged and swallowed, so the process still exits normally.
pub async fn run_with_tracing<F, Fut>(name: &str, future: F)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), anyhow::Error>>,
{
    setup_tracing();

    let result = std::panic::AssertUnwindSafe(future()).catch_unwind().await;

    match result {
        Ok(Ok(())) => info!(operation = name, "Finished"),
        Ok(Err(e)) => error!(operation = name, error = ?e, "Exception"),
        Err(e) => capture_panic_details(e),
    }
}

fn capture_panic_details(e: Box<dyn std::any::Any + Send>) {
    let backtrace = backtrace::Backtrace::new();
    if let Some(s) = e.downcast_ref::<&str>() {
        error!(panic_message = *s, backtrace = ?backtrace, "Panic occurred with message");
    } else if let Some(s) = e.downcast_ref::<String>() {
        error!(panic_message = s, backtrace = ?backtrace, "Panic occurred with message");
    } else {
        error!(backtrace = ?backtrace, "Panic occurred but the payload is not a string");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn swallows_errors() {
        run_with_tracing("failing", || async {
            Err::<(), anyhow::Error>(anyhow::anyhow!("boom"))
        })
        .await;
    }

    #[tokio::test]
    async fn swallows_panics() {
        run_with_tracing("panicking", || async {
            if true {
                panic!("kaboom");
            }
            Ok::<(), anyhow::Error>(())
        })
        .await;
    }
}
