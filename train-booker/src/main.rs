use std::process::ExitCode;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use train_booker::booking::{BookingConfig, BookingSequencer};
use train_booker::captcha::{CaptchaSolver, PromptSolver, normalize_code};
use train_booker::driver::ScriptedDriver;
use train_booker::request::BookingRequest;
use train_booker::site::SiteProfile;
use train_booker::snapshot::SnapshotWriter;
use train_booker::status::Status;
use train_booker::stop::StopSignal;

const DEFAULT_REQUEST: &str = "data/request.json";
const DEFAULT_REPLAY: &str = "data/replay.json";
const CAPTCHA_IMAGE: &str = "captcha.png";

/// Captcha source picked at startup.
enum Solver {
    /// Same code for every attempt (`BOOKING_CAPTCHA_CODE`).
    Fixed(String),
    Prompt(PromptSolver),
}

impl CaptchaSolver for Solver {
    async fn solve(&self, image: &[u8]) -> Option<String> {
        match self {
            Solver::Fixed(code) => Some(code.clone()),
            Solver::Prompt(prompt) => prompt.solve(image).await,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn booking_config() -> BookingConfig {
    let config = BookingConfig::default();
    match std::env::var("BOOKING_MAX_ATTEMPTS") {
        Ok(value) => match value.parse() {
            Ok(n) => config.with_max_attempts(n),
            Err(e) => {
                warn!(%value, error = %e, "Ignoring invalid BOOKING_MAX_ATTEMPTS");
                config
            }
        },
        Err(_) => config,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "train_booker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let request_path = env_or("BOOKING_REQUEST", DEFAULT_REQUEST);
    let request = match BookingRequest::load(&request_path).await {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let replay_path = env_or("BOOKING_REPLAY", DEFAULT_REPLAY);
    let driver = match ScriptedDriver::from_file(&replay_path) {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let solver = match std::env::var("BOOKING_CAPTCHA_CODE")
        .ok()
        .as_deref()
        .and_then(normalize_code)
    {
        Some(code) => Solver::Fixed(code),
        None => Solver::Prompt(PromptSolver::new(CAPTCHA_IMAGE)),
    };

    let (status_tx, mut status_rx) = tokio::sync::mpsc::unbounded_channel::<Status>();
    let printer = tokio::spawn(async move {
        while let Some(status) = status_rx.recv().await {
            println!("{status}");
        }
    });

    let stop = StopSignal::new();
    let ctrl_c_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping after the current step");
            ctrl_c_stop.stop();
        }
    });

    let site = match std::env::var("BOOKING_SITE") {
        Ok(path) => match SiteProfile::load(&path).await {
            Ok(site) => site,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        },
        Err(_) => SiteProfile::default(),
    };

    let snapshot_dir = env_or("BOOKING_SNAPSHOT_DIR", ".");
    let sequencer = BookingSequencer::new(driver, solver, site, booking_config())
        .with_snapshots(SnapshotWriter::new(snapshot_dir))
        .with_status(status_tx);

    info!(
        request = %request_path,
        replay = %replay_path,
        dry_run = request.dry_run,
        "Starting booking"
    );

    let result = match sequencer.open_session().await {
        Ok(()) => sequencer.run_until_booked(&request, &stop).await,
        Err(e) => {
            eprintln!("failed to open booking site: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Dropping the sequencer closes the status channel
    drop(sequencer);
    let _ = printer.await;

    println!("{result}");
    if let Some(path) = result.snapshot() {
        println!("screenshot: {}", path.display());
    }

    if result.is_completed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
