//! Photo Capture CLI
//!
//! Runs the standalone capture page against a camera, hands the photo to the
//! main flow, and optionally submits it for detection.

use clap::Parser;
use photo_capture::{
    capture::{CaptureError, CaptureSession, FacingMode, FileConfig, MediaDevices, VideoSink},
    handoff::{FileStore, Handoff},
    host::{CaptureController, CaptureHost, ConsoleView, IntakeFlow, UiElements},
    metrics::SessionMetrics,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Polls between "not ready" captures while the stream warms up.
const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(200);
const CAPTURE_ATTEMPTS: u32 = 25;

#[derive(Debug, Parser)]
#[command(name = "photo-capture", version, about = "Capture a photo for identification")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera to open: front or back
    #[arg(long)]
    facing: Option<FacingMode>,

    /// Where the photo was taken
    #[arg(long)]
    location: Option<String>,

    /// Submit the photo to the detection server
    #[arg(long)]
    submit: bool,

    /// Keep refreshing the reports feed after submitting
    #[arg(long, requires = "submit")]
    watch: bool,

    /// Directory holding the handoff file
    #[arg(long)]
    handoff_dir: Option<PathBuf>,

    /// Frames the simulated camera reports no size for
    #[cfg(not(feature = "camera"))]
    #[arg(long, default_value_t = 3)]
    warm_up: u32,

    /// Print session metrics on exit
    #[arg(long)]
    metrics: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Photo Capture v{}", photo_capture::VERSION);

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    if let Some(facing) = args.facing {
        config.capture.facing_mode = facing;
    }
    if let Some(dir) = &args.handoff_dir {
        config.handoff.dir = dir.clone();
    }
    config.validate()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
        })?;
    }

    let metrics = SessionMetrics::new()?;
    let mut handoff = Handoff::new(FileStore::in_dir(&config.handoff.dir)?);

    #[cfg(feature = "camera")]
    let session = {
        use photo_capture::capture::{NokhwaDevices, NokhwaSink};
        info!("Using hardware camera");
        CaptureSession::new(NokhwaDevices::new(), NokhwaSink::new(), config.capture.clone())
    };
    #[cfg(not(feature = "camera"))]
    let session = {
        use photo_capture::capture::{MockDevices, MockSink};
        info!("Using simulated camera");
        let devices = MockDevices::new();
        devices.feed().warm_up(args.warm_up);
        CaptureSession::new(devices, MockSink::new(), config.capture.clone())
    };
    let session = session.with_metrics(metrics.clone());

    let handed_off = capture_page(session, &args, &shutdown, &mut handoff).await?;

    if handed_off && !shutdown.load(Ordering::SeqCst) {
        main_page(&args, &config, &shutdown, &mut handoff).await?;
    }

    if args.metrics {
        print!("{}", metrics.encode()?);
    }
    Ok(())
}

/// Standalone capture page: open, capture once ready, use the photo.
async fn capture_page<D, V>(
    session: CaptureSession<D, V>,
    args: &Args,
    shutdown: &AtomicBool,
    handoff: &mut Handoff<FileStore>,
) -> Result<bool, Box<dyn Error>>
where
    D: MediaDevices,
    V: VideoSink<Stream = D::Stream>,
{
    let elements = UiElements::complete(CaptureHost::StandalonePage);
    let mut controller = CaptureController::new(session, elements, ConsoleView::new());

    controller.on_open().await?;

    let mut captured = false;
    for attempt in 1..=CAPTURE_ATTEMPTS {
        if shutdown.load(Ordering::SeqCst) {
            warn!("Interrupted, closing camera");
            break;
        }
        match controller.on_capture() {
            Ok(()) => {
                captured = true;
                break;
            }
            Err(CaptureError::NotReady(reason)) => {
                info!(attempt, reason = reason.as_str(), "Camera warming up");
                tokio::time::sleep(CAPTURE_RETRY_DELAY).await;
            }
            Err(e) => {
                controller.on_teardown();
                return Err(e.into());
            }
        }
    }

    if !captured {
        controller.on_teardown();
        return Ok(false);
    }

    let handed_off = controller.on_use_photo(args.location.as_deref(), handoff)?;
    controller.on_teardown();
    Ok(handed_off)
}

/// Main page: pick up the handed-off photo and submit it.
async fn main_page(
    args: &Args,
    config: &FileConfig,
    shutdown: &AtomicBool,
    handoff: &mut Handoff<FileStore>,
) -> Result<(), Box<dyn Error>> {
    let mut view = ConsoleView::new();
    let mut intake = IntakeFlow::new();
    let location = intake.restore(handoff, &mut view)?;

    if !args.submit {
        info!(
            path = %handoff.store().path().display(),
            "Photo ready; run with --submit to send it for detection"
        );
        // Put it back for a later run.
        if let Some(image) = intake.image() {
            handoff.put(image, location.as_deref())?;
        }
        return Ok(());
    }

    submit(intake, location, config, shutdown, &mut view, args.watch).await
}

#[cfg(feature = "http")]
async fn submit(
    mut intake: IntakeFlow,
    location: Option<String>,
    config: &FileConfig,
    shutdown: &AtomicBool,
    view: &mut ConsoleView,
    watch: bool,
) -> Result<(), Box<dyn Error>> {
    use photo_capture::upload::{AutoRefresh, HttpClient};

    let client = HttpClient::new(&config.upload)?;
    intake.submit(location.as_deref(), &client, view).await?;

    if !watch {
        return Ok(());
    }

    let mut refresh = AutoRefresh::from_config(&config.refresh);
    refresh.start();
    while !shutdown.load(Ordering::SeqCst) {
        match refresh.next(&client).await {
            Some(Ok(page)) => {
                println!(
                    "{} reports, {} with detections",
                    page.stats.total_reports, page.stats.criminals_detected
                );
                for report in &page.reports {
                    println!(
                        "  {}  {}  {}  {}",
                        report.short_id(),
                        report.detection_time,
                        report.location,
                        report.status
                    );
                }
            }
            Some(Err(e)) => warn!("Reports refresh failed: {}", e),
            None => break,
        }
    }
    refresh.stop();
    Ok(())
}

#[cfg(not(feature = "http"))]
async fn submit(
    _intake: IntakeFlow,
    _location: Option<String>,
    _config: &FileConfig,
    _shutdown: &AtomicBool,
    _view: &mut ConsoleView,
    _watch: bool,
) -> Result<(), Box<dyn Error>> {
    Err("built without the `http` feature; cannot submit".into())
}
