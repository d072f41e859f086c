// Workbench entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr; stdout carries the report tables)
// 2. Load config (base dir from the first CLI argument, default cwd)
// 3. Build the page fetcher (HTTP, or fixtures in offline mode)
// 4. Run the pipeline stages in sequence
// 5. Render tables to stdout, export CSV if configured

use downfield::app;
use downfield::config;
use downfield::report;
use downfield::scrape::fetch::{BoardFetcher, FixtureFetcher, HttpFetcher};

use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("downfield starting up");

    let base_dir = match std::env::args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("failed to determine working directory")?,
    };

    let config = config::load_config(&base_dir).context("failed to load configuration")?;
    info!(
        "config loaded: seasons {}-{}, {} board(s)",
        config.seasons.first,
        config.seasons.last,
        config.boards.len()
    );

    let fetcher: Box<dyn BoardFetcher> = if config.fetch.offline {
        // Validation guarantees fixture_dir is set in offline mode
        let dir = config
            .fetch
            .fixture_dir
            .as_deref()
            .context("offline mode without fixture_dir")?;
        info!("offline mode: serving pages from {dir}");
        Box::new(FixtureFetcher::new(base_dir.join(dir)))
    } else {
        Box::new(
            HttpFetcher::new(
                &config.fetch.user_agent,
                Duration::from_secs(config.fetch.timeout_secs),
            )
            .context("failed to build HTTP client")?,
        )
    };

    let outcome = app::run(&base_dir, &config, fetcher.as_ref()).await?;

    print!("{}", report::render_metrics_table(&outcome.metrics));
    println!();
    print!("{}", report::render_stability_table(&outcome.stability));
    for board in &outcome.boards {
        println!();
        print!("{}", report::render_board_summary(board));
    }
    if let Some(rec) = &outcome.reconciliation {
        println!();
        print!("{}", report::render_reconciliation(rec));
    }

    if let Some(dir) = &config.data.export_dir {
        let written = report::export_csv(
            &base_dir.join(dir),
            &outcome.metrics,
            &outcome.stability,
            outcome.reconciliation.as_ref(),
        )
        .context("failed to export CSV tables")?;
        info!("exported {} CSV file(s)", written.len());
    }

    info!("downfield finished");
    Ok(())
}

/// Initialize tracing to stderr so stdout stays clean for the tables.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("downfield=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
