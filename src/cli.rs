//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::client::{FeedType, UsgsClient};
use crate::errors::QuakemapError;
use crate::map::{ControlPosition, LatLng, LegendPolicy, MapConfig, MAX_ZOOM};
use crate::output::Format;

/// Render the live USGS earthquake feed on a Leaflet map.
#[derive(Parser, Debug)]
#[command(name = "quakemap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the feed once and write the map page
    Render(RenderArgs),

    /// Serve the map page, redrawn on every load
    Serve(ServeArgs),

    /// List earthquakes with their marker styling
    List(ListArgs),

    /// Print the depth legend
    Legend,
}

/// Where the feed comes from.
#[derive(Args, Debug, Clone)]
pub struct FeedArgs {
    /// Summary feed to fetch
    #[arg(long, default_value = "all_week", value_parser = parse_feed_type)]
    pub feed: FeedType,

    /// Fetch this GeoJSON URL instead of a USGS summary feed
    #[arg(long)]
    pub feed_url: Option<String>,
}

impl FeedArgs {
    /// Build the feed client these arguments describe.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn client(&self) -> Result<UsgsClient, QuakemapError> {
        match &self.feed_url {
            Some(url) => UsgsClient::with_url(url.clone()),
            None => UsgsClient::new(self.feed),
        }
    }

    /// URL the feed is fetched from.
    #[must_use]
    pub fn url(&self) -> String {
        self.feed_url.clone().unwrap_or_else(|| self.feed.url())
    }

    /// Human-readable name of the feed for page titles.
    #[must_use]
    pub fn label(&self) -> String {
        self.feed_url.clone().unwrap_or_else(|| self.feed.name())
    }
}

/// Map appearance.
#[derive(Args, Debug, Clone)]
pub struct MapArgs {
    /// Map center: lat,lon
    #[arg(long, default_value = "0,0", value_parser = parse_center)]
    pub center: LatLng,

    /// Initial zoom level
    #[arg(
        long,
        default_value = "2",
        value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_ZOOM))
    )]
    pub zoom: u8,

    /// Corner for the legend: topleft, topright, bottomleft, bottomright
    #[arg(long, default_value = "bottomright", value_parser = parse_position)]
    pub legend_position: ControlPosition,

    /// When to draw the legend: on-success or always
    #[arg(long, default_value = "on-success", value_parser = parse_legend_policy)]
    pub legend: LegendPolicy,
}

impl MapArgs {
    /// Map configuration for these arguments.
    #[must_use]
    pub fn config(&self) -> MapConfig {
        MapConfig {
            center: self.center,
            zoom: self.zoom,
            legend_position: self.legend_position,
            legend_policy: self.legend,
            ..MapConfig::world()
        }
    }
}

/// Arguments for the `render` command.
#[derive(Parser, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    #[command(flatten)]
    pub map: MapArgs,

    /// Write the page here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Arguments for the `serve` command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    #[command(flatten)]
    pub map: MapArgs,

    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}

/// Arguments for the `list` command.
#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    /// Maximum number of earthquakes to show
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Parse a feed type from string.
fn parse_feed_type(s: &str) -> Result<FeedType, String> {
    s.parse()
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

/// Parse a map center from string.
fn parse_center(s: &str) -> Result<LatLng, String> {
    s.parse()
}

/// Parse a legend position from string.
fn parse_position(s: &str) -> Result<ControlPosition, String> {
    s.parse()
}

/// Parse a legend policy from string.
fn parse_legend_policy(s: &str) -> Result<LegendPolicy, String> {
    s.parse()
}
