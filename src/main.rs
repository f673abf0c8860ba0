//! quakemap - Render the live USGS earthquake feed on a Leaflet map.
//!
//! Markers are sized by magnitude and colored by depth, with a depth legend.
//! The map can be written once as a standalone HTML page or served over HTTP.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

mod cli;
mod client;
mod errors;
mod leaflet;
mod legend;
mod map;
mod models;
mod output;
mod pipeline;
mod popup;
mod server;
mod style;

use cli::{Cli, Command};
use client::FeedSource;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Render(args) => cmd_render(&args),
        Command::Serve(args) => cmd_serve(args).map(|()| ExitCode::SUCCESS),
        Command::List(args) => cmd_list(args).map(|()| ExitCode::SUCCESS),
        Command::Legend => cmd_legend().map(|()| ExitCode::SUCCESS),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the `render` command - fetch once and write the map page.
///
/// The page is written even when the fetch fails. The pipeline has already
/// logged that failure, so it only shows up here as a failing exit status.
fn cmd_render(args: &cli::RenderArgs) -> Result<ExitCode> {
    let client = args
        .feed
        .client()
        .context("failed to create feed client")?;
    let config = args.map.config();

    tracing::debug!("rendering feed {}", client.url());
    let (page, report) = pipeline::render_page(&client, &config, &args.feed.label());
    tracing::debug!("legend drawn: {}", report.legend);

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            page.write_to(&mut BufWriter::new(file))
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(
                "wrote map with {} markers to {}",
                page.markers().len(),
                path.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            page.write_to(&mut handle).context("failed to write map page")?;
        }
    }

    if !report.fetched() {
        return Ok(ExitCode::FAILURE);
    }
    if report.skipped > 0 {
        tracing::warn!("{} feed entries skipped", report.skipped);
    }

    Ok(ExitCode::SUCCESS)
}

/// Execute the `serve` command - start the web server.
fn cmd_serve(args: cli::ServeArgs) -> Result<()> {
    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
        feed_url: args.feed.url(),
        feed_label: args.feed.label(),
        map: args.map.config(),
    };

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🌍 quakemap\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{url}\x1b[0m");
    println!("  Feed:    {}", args.feed.label());
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Run the async server on tokio runtime
    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config))
}

/// Execute the `list` command - print styled earthquakes.
fn cmd_list(args: cli::ListArgs) -> Result<()> {
    let client = args
        .feed
        .client()
        .context("failed to create feed client")?;

    let feed = client
        .fetch()
        .context("failed to fetch earthquake feed")?;

    let (mut quakes, skipped) = pipeline::collect_quakes(&feed);
    if skipped > 0 {
        tracing::debug!("{} feed entries skipped", skipped);
    }

    // Largest first
    quakes.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    quakes.truncate(args.limit);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_quakes(&mut handle, &quakes, args.format)?;

    Ok(())
}

/// Execute the `legend` command - print the depth legend.
fn cmd_legend() -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write!(handle, "{}", legend::legend_table(legend::legend()))?;
    Ok(())
}
