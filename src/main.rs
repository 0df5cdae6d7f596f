//! Crosscheck CLI entry point

#[tokio::main]
async fn main() {
    // Structured logging to stderr with env-based filter, defaulting to warn so the live table stays readable
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    crosscheck::cli::run().await;
}
