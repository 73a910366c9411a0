use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sitetxt_crawler=info,sitetxt_markdown=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    sitetxt_crawler::Cli::parse().run().await
}
