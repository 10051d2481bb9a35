//! Surfscan main entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  ImageDirCamera    HeadlessDisplay   OperatorStop   FileConfig │
//! │  OpencvCamera      OpencvWindow      (StopPort)     (Config)   │
//! │  (CameraPort)      (DisplayPort)     LogEventSink   S7Client   │
//! │                                      (EventSink)    (PlcClient)│
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          InspectionLoop (pure orchestration)           │    │
//! │  │  RedMaskExtractor · DecisionPolicy · VerdictEncoder    │    │
//! │  │  Session (Active FieldbusSession | Simulated)          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

use surfscan::adapters::config_file::FileConfig;
use surfscan::adapters::display::HeadlessDisplay;
use surfscan::adapters::image_dir_camera::ImageDirCamera;
use surfscan::adapters::log_sink::LogEventSink;
use surfscan::adapters::stop::OperatorStop;
use surfscan::app::events::LoopStats;
use surfscan::app::ports::ConfigPort;
use surfscan::app::service::InspectionLoop;
use surfscan::config::InspectionConfig;
use surfscan::fieldbus::{S7Client, S7Endpoint, Session};
use surfscan::vision::feature::RedMaskExtractor;

type Inspection = InspectionLoop<S7Client, RedMaskExtractor>;

// ── CLI ───────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "surfscan", version, about = "Camera surface inspection reporting to an S7 PLC")]
struct Cli {
    #[arg(long, short, help = "TOML configuration file (defaults apply when absent)")]
    config: Option<PathBuf>,

    #[arg(long, help = "Replay images from this directory instead of the live camera")]
    source: Option<PathBuf>,

    #[arg(long, help = "Restart the image directory when it is exhausted")]
    loop_source: bool,

    #[arg(long, help = "Minimum time between replayed frames")]
    frame_interval_ms: Option<u64>,

    #[arg(long, help = "Write annotated frames as PNG into this directory (headless only)")]
    snapshots: Option<PathBuf>,

    #[arg(long, default_value_t = 1, help = "Keep one snapshot every N frames")]
    snapshot_every: u64,

    #[arg(long, help = "Stop after this many cycles")]
    max_cycles: Option<u64>,

    #[arg(long, help = "Print the effective configuration as JSON and exit")]
    print_config: bool,
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Logging ────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("╔══════════════════════════════════════╗");
    info!("║  Surfscan v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = FileConfig::new(cli.config.clone())
        .load()
        .context("invalid configuration")?;
    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    info!(
        "PLC {} rack {} slot {} DB{} | threshold {}",
        config.endpoint(),
        config.rack,
        config.slot,
        config.db_number,
        config.score_threshold
    );

    // ── 3. Fieldbus (falls back to simulation) ────────────────
    let session = Session::establish(S7Client::new(S7Endpoint::from_config(&config)), &config);
    let mut inspection = InspectionLoop::new(&config, session, RedMaskExtractor::new())?;

    // ── 4. Operator input ─────────────────────────────────────
    let stop = OperatorStop::install();

    // ── 5. Run ────────────────────────────────────────────────
    let stats = match &cli.source {
        Some(dir) => replay(&cli, dir, &mut inspection, stop)?,
        None => live(&cli, &config, &mut inspection, stop)?,
    };
    info!(
        "Exit: {} cycles, {} defects, {} write failures",
        stats.cycles, stats.defects, stats.writes_failed
    );
    Ok(())
}

/// Bench mode: image directory in, log and PNG snapshots out.
fn replay(cli: &Cli, dir: &Path, inspection: &mut Inspection, mut stop: OperatorStop) -> Result<LoopStats> {
    let interval = cli.frame_interval_ms.map(Duration::from_millis);
    let mut camera = ImageDirCamera::open(dir, cli.loop_source, interval)?;
    let mut display = match &cli.snapshots {
        Some(out) => {
            std::fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
            HeadlessDisplay::with_snapshots(out.clone(), cli.snapshot_every)
        }
        None => HeadlessDisplay::new(),
    };
    let mut sink = LogEventSink::new();
    Ok(inspection.run(&mut camera, &mut display, &mut stop, &mut sink, cli.max_cycles))
}

#[cfg(feature = "opencv")]
fn live(cli: &Cli, config: &InspectionConfig, inspection: &mut Inspection, mut stop: OperatorStop) -> Result<LoopStats> {
    use surfscan::adapters::opencv_io::{OpencvCamera, OpencvWindow};

    let mut camera = OpencvCamera::open(config.camera_index)?;
    let mut window = OpencvWindow::new(stop.clone());
    let mut sink = LogEventSink::new();
    Ok(inspection.run(&mut camera, &mut window, &mut stop, &mut sink, cli.max_cycles))
}

#[cfg(not(feature = "opencv"))]
fn live(_cli: &Cli, config: &InspectionConfig, _inspection: &mut Inspection, _stop: OperatorStop) -> Result<LoopStats> {
    anyhow::bail!(
        "camera #{} needs the `opencv` feature; pass --source <dir> to replay images",
        config.camera_index
    )
}
