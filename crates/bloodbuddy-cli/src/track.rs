//! `bloodbuddy track`: replays a recorded position track through the map
//! view's event loop and prints every frame the map would draw.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bloodbuddy_app::{
    DonorSearch, GeolocationTracker, MapView, MarkerKind, NavigationController, PositionSource,
    PositionStream, RouteOverlayController, SearchLocation, SearchOutcome, SpeechSynthesizer,
    TrackerEvent, TrackerOptions,
};
use bloodbuddy_core::{AppConfig, BloodGroup, PositionSample, ResultLimit, SearchFilter};
use clap::Args;
use futures::stream::StreamExt;
use tokio::sync::{mpsc, watch};

use crate::output::{describe_frame, print_donor_table, print_route};

#[derive(Debug, Args)]
pub(crate) struct TrackArgs {
    /// JSON array of position samples, oldest first
    #[arg(long)]
    pub file: PathBuf,
    #[arg(long)]
    pub blood_group: BloodGroup,
    /// Maximum number of donors: 10, 20, 50 or 100
    #[arg(long, value_parser = crate::parse_limit)]
    pub limit: Option<ResultLimit>,
    /// Route to the donor at this row of the first result table
    #[arg(long)]
    pub donor: Option<usize>,
    /// Enter navigation mode once the route is known
    #[arg(long, requires = "donor")]
    pub navigate: bool,
    /// Narrate navigation instructions
    #[arg(long)]
    pub voice: bool,
}

/// Parses a recorded track.
///
/// # Errors
///
/// Returns an error if the text is not a non-empty JSON array of samples.
pub(crate) fn parse_track(raw: &str) -> anyhow::Result<Vec<PositionSample>> {
    let samples: Vec<PositionSample> = serde_json::from_str(raw)
        .context("track file is not a JSON array of position samples")?;
    if samples.is_empty() {
        anyhow::bail!("track file has no samples");
    }
    Ok(samples)
}

/// Plays recorded samples back as if the device produced them.
struct Replay(Vec<PositionSample>);

impl PositionSource for Replay {
    fn watch(&self, _options: &TrackerOptions) -> PositionStream {
        futures::stream::iter(self.0.clone().into_iter().map(Ok)).boxed()
    }
}

/// Prints what a speech engine would say.
struct LogSpeech;

impl SpeechSynthesizer for LogSpeech {
    fn speak(&self, text: &str) {
        tracing::info!(text, "speaking instruction");
        println!("\u{1f50a} {text}");
    }

    fn cancel(&self) {
        tracing::debug!("speech cancelled");
    }
}

/// Replays the track in `args.file`.
///
/// The first sample seeds a search around it; the rest are fed through the
/// position tracker while the map view's event loop routes, refreshes and
/// narrates.
///
/// # Errors
///
/// Returns an error if the track cannot be read, a client cannot be built,
/// the initial search fails, or `--donor` names a row that does not exist.
pub(crate) async fn run_track(config: &AppConfig, args: &TrackArgs) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let samples = parse_track(&raw)?;
    let (first, rest) = samples
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("track file has no samples"))?;

    let filter = SearchFilter {
        blood_group: Some(args.blood_group),
        limit: args.limit.unwrap_or(config.default_limit),
    };
    let speech: Option<Arc<dyn SpeechSynthesizer>> = if args.voice {
        Some(Arc::new(LogSpeech))
    } else {
        None
    };
    let mut view = MapView::new(
        DonorSearch::new(
            Arc::new(crate::registry_client(config)?),
            Arc::new(crate::geocoder_client(config)?),
            filter,
            config.refresh_threshold_km,
        ),
        RouteOverlayController::new(crate::routing_client(config)?),
        NavigationController::new(None, speech),
        config.tile_url.as_str(),
    );

    view.handle_tracker_event(TrackerEvent::Update(*first));
    match view
        .search_mut()
        .search(SearchLocation::Here(first.coordinate))
        .await
    {
        SearchOutcome::Updated(_) => print_donor_table(&view.search().rows()),
        SearchOutcome::Failed(err) => anyhow::bail!("initial search failed: {err}"),
        other => anyhow::bail!("initial search did not complete: {other:?}"),
    }

    if let Some(index) = args.donor {
        if !view.select_donor(index) {
            anyhow::bail!("no donor at row {index}");
        }
        view.settle().await;
        match view.routes().summary() {
            Some(summary) => print_route(&summary),
            None => tracing::warn!(index, "no route to the selected donor"),
        }
        if args.navigate && !view.toggle_navigation() {
            tracing::warn!("navigation needs a route; staying on the map");
        }
    }

    let source = Replay(rest.to_vec());
    let positions = GeolocationTracker::start(
        &source,
        TrackerOptions::with_timeout_ms(config.geolocation_timeout_ms),
    );
    let (commands_tx, commands) = mpsc::channel(1);
    drop(commands_tx);

    let (snapshots, mut frames) = watch::channel(view.snapshot());
    let printer = tokio::spawn(async move {
        while frames.changed().await.is_ok() {
            println!("{}", describe_frame(&frames.borrow_and_update()));
        }
    });

    let last = view.run(Some(positions), commands, &snapshots).await;
    drop(snapshots);
    printer.await?;

    let donors = last
        .markers
        .iter()
        .filter(|m| m.kind == MarkerKind::Donor)
        .count();
    println!(
        "replayed {} sample(s); {donors} donor(s) on the map, {} registry queries issued",
        samples.len(),
        view.search().queries_issued()
    );
    Ok(())
}
