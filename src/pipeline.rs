//! Feed-to-map pipeline.
//!
//! Sets up the map, fetches the feed once, and draws one styled marker with
//! a popup per earthquake. There is no retry: a failed fetch is logged and
//! the map is left without markers.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::client::FeedSource;
use crate::leaflet::LeafletPage;
use crate::legend::{legend, legend_html};
use crate::map::{LegendPolicy, MapConfig, MapWidget};
use crate::models::{EarthquakeFeature, FeatureCollection};
use crate::popup::format_popup;
use crate::style::MarkerStyle;

/// What a pipeline run drew.
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Markers added to the map
    pub markers: usize,
    /// Feed entries skipped for missing or invalid fields
    pub skipped: usize,
    /// Whether the legend control was added
    pub legend: bool,
    /// Feed title from its metadata
    pub title: Option<String>,
    /// When the feed was generated
    pub generated: Option<DateTime<Utc>>,
    /// Fetch failure, if the feed could not be retrieved
    pub fetch_error: Option<String>,
}

impl RenderReport {
    /// Whether the feed was fetched.
    #[must_use]
    pub fn fetched(&self) -> bool {
        self.fetch_error.is_none()
    }
}

/// Convert feed entries to drawable earthquakes, skipping incomplete ones.
///
/// Returns the earthquakes and the number of entries skipped.
#[must_use]
pub fn collect_quakes(feed: &FeatureCollection) -> (Vec<EarthquakeFeature>, usize) {
    let mut quakes = Vec::with_capacity(feed.features.len());
    let mut skipped = 0;

    for feature in &feed.features {
        match EarthquakeFeature::try_from(feature) {
            Ok(quake) => quakes.push(quake),
            Err(e) => {
                warn!("skipping feature: {}", e);
                skipped += 1;
            }
        }
    }

    (quakes, skipped)
}

/// Run the pipeline: set up `map`, fetch from `source`, draw the feed.
pub fn render_feed<S, M>(source: &S, map: &mut M, config: &MapConfig) -> RenderReport
where
    S: FeedSource + ?Sized,
    M: MapWidget + ?Sized,
{
    map.set_view(config.center, config.zoom);
    map.add_tile_layer(&config.tiles);

    let mut report = RenderReport::default();

    match source.fetch() {
        Ok(feed) => {
            let (quakes, skipped) = collect_quakes(&feed);
            debug!("drawing {} markers ({} skipped)", quakes.len(), skipped);

            map.add_geojson_layer(&quakes, &MarkerStyle::for_feature, &format_popup);

            report.markers = quakes.len();
            report.skipped = skipped;
            report.title = feed.title().map(str::to_string);
            report.generated = feed.generated();
            info!("rendered {} earthquakes", report.markers);
        }
        Err(e) => {
            error!("error fetching earthquake data: {}", e);
            report.fetch_error = Some(e.to_string());
        }
    }

    if report.fetched() || config.legend_policy == LegendPolicy::Always {
        map.add_legend(config.legend_position, &|| legend_html(legend()));
        report.legend = true;
    }

    report
}

/// Default page title when the feed carries none.
const DEFAULT_TITLE: &str = "Earthquakes";

/// Run the pipeline against a fresh Leaflet page.
///
/// The page is titled after the feed and gets a one-line summary of the
/// run, so a failed fetch is visible on the page itself.
pub fn render_page<S>(
    source: &S,
    config: &MapConfig,
    feed_label: &str,
) -> (LeafletPage, RenderReport)
where
    S: FeedSource + ?Sized,
{
    let mut page = LeafletPage::new(DEFAULT_TITLE);
    let report = render_feed(source, &mut page, config);

    if let Some(title) = &report.title {
        page.set_title(title.clone());
    }
    page.set_subtitle(summary_line(&report, feed_label));

    (page, report)
}

/// One-line description of a pipeline run.
#[must_use]
pub fn summary_line(report: &RenderReport, feed_label: &str) -> String {
    if let Some(err) = &report.fetch_error {
        return format!("Feed {feed_label} unavailable: {err}");
    }

    let generated = report
        .generated
        .map(|t| format!(" · generated {}", t.format("%Y-%m-%d %H:%M UTC")))
        .unwrap_or_default();
    format!(
        "Feed {feed_label} · {} earthquakes{generated}",
        report.markers
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;
    use crate::errors::QuakemapError;
    use crate::map::{ControlPosition, LatLng, PopupFn, StyleFn, TileLayer};

    /// Feed source returning a canned result.
    struct StubFeed(Option<&'static str>);

    impl FeedSource for StubFeed {
        fn fetch(&self) -> Result<FeatureCollection, QuakemapError> {
            match self.0 {
                Some(json) => Ok(serde_json::from_str(json)?),
                None => Err(QuakemapError::Api {
                    status: 503,
                    message: "service unavailable".into(),
                }),
            }
        }
    }

    /// Map that records every call made to it.
    #[derive(Default)]
    struct RecordingMap {
        view: Option<(LatLng, u8)>,
        tile_layers: usize,
        markers: Vec<(MarkerStyle, String)>,
        legend: Option<(ControlPosition, String)>,
    }

    impl MapWidget for RecordingMap {
        fn set_view(&mut self, center: LatLng, zoom: u8) {
            self.view = Some((center, zoom));
        }

        fn add_tile_layer(&mut self, _layer: &TileLayer) {
            self.tile_layers += 1;
        }

        fn add_geojson_layer(
            &mut self,
            features: &[EarthquakeFeature],
            style: StyleFn<'_>,
            popup: PopupFn<'_>,
        ) {
            for quake in features {
                self.markers.push((style(quake), popup(quake)));
            }
        }

        fn add_legend(&mut self, position: ControlPosition, content: &dyn Fn() -> String) {
            self.legend = Some((position, content()));
        }
    }

    /// Counts error-level events.
    pub(crate) struct ErrorCounter(pub(crate) Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for ErrorCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Run the pipeline and count the errors it logs.
    fn render_counting_errors(
        source: &StubFeed,
        map: &mut RecordingMap,
        config: &MapConfig,
    ) -> (RenderReport, usize) {
        let errors = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ErrorCounter(errors.clone()));
        let report = tracing::subscriber::with_default(subscriber, || {
            render_feed(source, map, config)
        });
        (report, errors.load(Ordering::SeqCst))
    }

    const ONE_QUAKE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "id": "x1",
            "properties": {"place": "X", "mag": 6},
            "geometry": {"type": "Point", "coordinates": [140.0, 35.0, 5]}
        }]
    }"#;

    #[test]
    fn test_single_feature_end_to_end() {
        let mut map = RecordingMap::default();
        let (report, errors) =
            render_counting_errors(&StubFeed(Some(ONE_QUAKE)), &mut map, &MapConfig::world());

        assert_eq!(errors, 0);
        assert_eq!(report.markers, 1);
        assert_eq!(map.markers.len(), 1);

        let (style, popup) = &map.markers[0];
        assert!((style.radius - 30.0).abs() < f64::EPSILON);
        assert_eq!(style.fill_color, "#00FF00");
        assert!(popup.contains('X'));

        assert_eq!(map.view, Some((LatLng { lat: 0.0, lon: 0.0 }, 2)));
        assert_eq!(map.tile_layers, 1);
        let (position, html) = map.legend.as_ref().unwrap();
        assert_eq!(*position, ControlPosition::BottomRight);
        assert!(html.contains("50+"));
    }

    #[test]
    fn test_fetch_failure_logs_once_and_draws_nothing() {
        let mut map = RecordingMap::default();
        let (report, errors) =
            render_counting_errors(&StubFeed(None), &mut map, &MapConfig::world());

        assert_eq!(errors, 1);
        assert!(map.markers.is_empty());
        assert!(!report.fetched());
        assert!(report.fetch_error.unwrap().contains("503"));

        // Default policy gates the legend on a successful fetch
        assert!(map.legend.is_none());
        assert!(!report.legend);

        // Map setup happens before the fetch
        assert_eq!(map.tile_layers, 1);
    }

    #[test]
    fn test_legend_always_policy_on_failure() {
        let config = MapConfig {
            legend_policy: LegendPolicy::Always,
            legend_position: ControlPosition::TopRight,
            ..MapConfig::world()
        };
        let mut map = RecordingMap::default();
        let (report, errors) = render_counting_errors(&StubFeed(None), &mut map, &config);

        assert_eq!(errors, 1);
        assert!(map.markers.is_empty());
        assert!(report.legend);
        assert_eq!(map.legend.unwrap().0, ControlPosition::TopRight);
    }

    #[test]
    fn test_malformed_features_are_skipped() {
        let mut map = RecordingMap::default();
        let source = StubFeed(Some(include_str!("../tools/sample_feed.json")));
        let (report, errors) = render_counting_errors(&source, &mut map, &MapConfig::world());

        assert_eq!(errors, 0);
        assert_eq!(report.markers, 2);
        // Null magnitude, two coordinates, null depth, null properties and
        // a string magnitude are skipped without failing the feed
        assert_eq!(report.skipped, 5);
        assert_eq!(report.title.as_deref(), Some("USGS All Earthquakes, Past Week"));
        assert!(report.generated.is_some());

        // Deep Tonga event is red
        assert_eq!(map.markers[1].0.fill_color, "#FF0000");
        assert!(map.markers[0].1.contains("10km NE of Nowhere, CA"));
    }

    #[test]
    fn test_invalid_collection_is_a_fetch_failure() {
        let mut map = RecordingMap::default();
        let source = StubFeed(Some("{\"features\": []}"));
        let (report, errors) = render_counting_errors(&source, &mut map, &MapConfig::world());

        assert_eq!(errors, 1);
        assert!(!report.fetched());
        assert!(map.markers.is_empty());
    }

    #[test]
    fn test_render_page_titles_and_summarizes() {
        let source = StubFeed(Some(include_str!("../tools/sample_feed.json")));
        let (page, report) = render_page(&source, &MapConfig::world(), "all_week");

        assert_eq!(page.markers().len(), report.markers);

        let html = page.render().unwrap();
        assert!(html.contains(r#""legend":{"position":"bottomright""#));
        assert!(html.contains("<title>USGS All Earthquakes, Past Week</title>"));
        assert!(html.contains("Feed all_week · 2 earthquakes · generated 2025-10-18"));
    }

    #[test]
    fn test_summary_line_on_failure() {
        let report = RenderReport {
            fetch_error: Some("HTTP request failed".into()),
            ..RenderReport::default()
        };
        assert_eq!(
            summary_line(&report, "4.5_day"),
            "Feed 4.5_day unavailable: HTTP request failed"
        );
    }
}
