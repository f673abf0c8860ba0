//! Terminal listing of styled earthquakes.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats. Each
//! entry carries the same band, color and radius the map would use.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::EarthquakeFeature;
use crate::style::{DepthBand, marker_radius};

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// One earthquake with its map styling, as emitted in JSON/NDJSON output.
#[derive(Debug, Clone, Serialize)]
pub struct StyledQuake<'a> {
    pub place: &'a str,
    pub magnitude: f64,
    pub depth_km: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub time: Option<DateTime<Utc>>,
    pub band: DepthBand,
    pub color: &'static str,
    pub radius: f64,
}

impl<'a> From<&'a EarthquakeFeature> for StyledQuake<'a> {
    fn from(q: &'a EarthquakeFeature) -> Self {
        let band = DepthBand::classify(q.depth);
        Self {
            place: &q.place,
            magnitude: q.magnitude,
            depth_km: q.depth,
            latitude: q.latitude,
            longitude: q.longitude,
            time: q.time,
            band,
            color: band.color(),
            radius: marker_radius(q.magnitude),
        }
    }
}

/// ANSI color closest to a depth band's map color.
fn band_ansi(band: DepthBand) -> &'static str {
    match band {
        DepthBand::Shallow => "\x1b[92m",
        DepthBand::Intermediate => "\x1b[93m",
        DepthBand::Deep => "\x1b[38;5;208m",
        DepthBand::VeryDeep => "\x1b[91m",
    }
}

/// Write earthquakes in human-readable format, colored by depth band.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, quakes: &[EarthquakeFeature]) -> io::Result<()> {
    for quake in quakes {
        let styled = StyledQuake::from(quake);
        let color = band_ansi(styled.band);
        let time = styled
            .time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".into());

        writeln!(
            writer,
            "{BOLD}M{mag:<4}{RESET} │ \
             {color}● {name:<6}{RESET} │ \
             {DIM}{depth:>6.1}km{RESET} │ \
             {DIM}r={radius:<5}{RESET} │ \
             {time} UTC │ \
             {place}",
            mag = styled.magnitude,
            name = styled.band.color_name(),
            depth = styled.depth_km,
            radius = styled.radius,
            place = styled.place,
        )?;
    }
    Ok(())
}

/// Write earthquakes as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, quakes: &[EarthquakeFeature]) -> io::Result<()> {
    let output: Vec<StyledQuake<'_>> = quakes.iter().map(StyledQuake::from).collect();
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write earthquakes as newline-delimited JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, quakes: &[EarthquakeFeature]) -> io::Result<()> {
    for quake in quakes {
        let json = serde_json::to_string(&StyledQuake::from(quake))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write earthquakes in the given format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_quakes<W: Write>(
    writer: &mut W,
    quakes: &[EarthquakeFeature],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, quakes),
        Format::Json => write_json(writer, quakes),
        Format::Ndjson => write_ndjson(writer, quakes),
    }
}
