//! Persistent Window simulator - Entry Point
//!
//! Drives a headless window over a document and prints one JSON line per
//! event, so scrolling behaviour can be inspected without an editor.

use clap::Parser;
use persistent_window::config::ResolvedConfig;
use persistent_window::metrics::{CellMeasureSurface, TextMetricsCache};
use persistent_window::model::{AppError, BlockManifest, BlockRange};
use persistent_window::store::MemoryBlockStore;
use persistent_window::window::{FetchOutcome, FetchTicket, HeadlessContainer, HeadlessSurface};
use persistent_window::PersistentWindow;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// Persistent Window simulator - replay scroll positions against a document
#[derive(Parser, Debug)]
#[command(name = "pwin")]
#[command(version)]
#[command(about = "Simulate the persistent window scrolling through a markdown document")]
pub struct Args {
    /// Markdown file to open (a synthetic document is used if not provided)
    pub file: Option<PathBuf>,

    /// Number of synthetic one-line blocks when no file is given
    #[arg(long, default_value = "1000")]
    pub blocks: usize,

    /// JSON array of block manifests to open instead of markdown
    #[arg(long, conflicts_with = "file")]
    pub manifest: Option<PathBuf>,

    /// Scroll offset in pixels (repeat for a sequence)
    #[arg(long = "scroll-to", value_name = "PX")]
    pub scroll_to: Vec<f64>,

    /// Milliseconds between consecutive scroll events
    #[arg(long, default_value = "16")]
    pub step: u64,

    /// Container width in pixels
    #[arg(long, default_value = "600")]
    pub width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value = "800")]
    pub viewport_height: f64,

    /// Blocks buffered on each side of the visible span
    #[arg(long)]
    pub buffer: Option<usize>,

    /// Maximum blocks mounted at once
    #[arg(long)]
    pub max_loaded: Option<usize>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// One line of simulator output.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum SimEvent {
    #[serde(rename_all = "camelCase")]
    Opened {
        doc_id: String,
        blocks: usize,
        total_height: f64,
    },
    #[serde(rename_all = "camelCase")]
    Scroll {
        at_ms: u64,
        scroll_top: f64,
        mode: String,
        dimmed: bool,
    },
    #[serde(rename_all = "camelCase")]
    Fetch {
        at_ms: u64,
        range: BlockRange,
        outcome: String,
    },
    #[serde(rename_all = "camelCase")]
    Closed {
        at_ms: u64,
        loaded: Option<BlockRange>,
        total_height: f64,
    },
}

type Window = PersistentWindow<HeadlessSurface, HeadlessContainer>;

struct Simulator<W: Write> {
    window: Window,
    store: MemoryBlockStore,
    start: Instant,
    now: Instant,
    out: W,
}

impl<W: Write> Simulator<W> {
    fn at_ms(&self) -> u64 {
        u64::try_from(self.now.duration_since(self.start).as_millis()).unwrap_or(u64::MAX)
    }

    fn emit(&mut self, event: &SimEvent) -> Result<(), AppError> {
        let line = serde_json::to_string(event).map_err(|e| AppError::Input(e.to_string()))?;
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    fn run_fetch(&mut self, ticket: Option<FetchTicket>) -> Result<(), AppError> {
        let Some(ticket) = ticket else {
            return Ok(());
        };
        let outcome = match self.window.fetch_and_apply(&mut self.store, &ticket) {
            FetchOutcome::Applied(_) => "applied".to_string(),
            FetchOutcome::Discarded => "discarded".to_string(),
            FetchOutcome::Failed(err) => format!("failed: {err}"),
        };
        let event = SimEvent::Fetch {
            at_ms: self.at_ms(),
            range: ticket.range,
            outcome,
        };
        self.emit(&event)
    }

    fn open(&mut self, path: &Path) -> Result<(), AppError> {
        let ticket = self.window.open(&mut self.store, path, self.now)?;
        let event = SimEvent::Opened {
            doc_id: self
                .window
                .doc_id()
                .map(|id| id.as_str().to_string())
                .unwrap_or_default(),
            blocks: self.window.manifests().len(),
            total_height: self.window.total_height(),
        };
        self.emit(&event)?;
        self.run_fetch(ticket)
    }

    fn scroll(&mut self, scroll_top: f64) -> Result<(), AppError> {
        self.window.on_scroll(scroll_top, self.now);
        let ticket = self.window.on_animation_frame(self.now);
        let event = SimEvent::Scroll {
            at_ms: self.at_ms(),
            scroll_top,
            mode: self
                .window
                .coordinator()
                .map(|c| c.mode().to_string())
                .unwrap_or_default(),
            dimmed: self.window.is_dimmed(),
        };
        self.emit(&event)?;
        self.run_fetch(ticket)
    }

    /// Advance to the next deadline and run the timers, until none is left.
    fn drain_timers(&mut self) -> Result<(), AppError> {
        while let Some(deadline) = self.window.next_deadline() {
            self.now = self.now.max(deadline);
            let ticket = self.window.on_timer(&mut self.store, self.now);
            self.run_fetch(ticket)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), AppError> {
        let loaded = self.window.loaded_range();
        let total_height = self.window.total_height();
        self.window.close(&mut self.store, self.now)?;
        let event = SimEvent::Closed {
            at_ms: self.at_ms(),
            loaded,
            total_height,
        };
        self.emit(&event)
    }
}

fn synthetic_markdown(blocks: usize) -> String {
    (0..blocks)
        .map(|i| format!("Block {i}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Register the requested document and return the path to open.
fn load_document(args: &Args, store: &mut MemoryBlockStore) -> Result<PathBuf, AppError> {
    let to_input = |e: persistent_window::model::StoreError| AppError::Input(e.to_string());

    if let Some(path) = &args.manifest {
        let raw = std::fs::read_to_string(path)?;
        let manifests: Vec<BlockManifest> =
            serde_json::from_str(&raw).map_err(|e| AppError::Input(e.to_string()))?;
        store.insert_manifests(path, manifests).map_err(to_input)?;
        return Ok(path.clone());
    }

    if let Some(path) = &args.file {
        let markdown = std::fs::read_to_string(path)?;
        store.insert_markdown(path, &markdown).map_err(to_input)?;
        return Ok(path.clone());
    }

    let path = PathBuf::from("synthetic.md");
    store
        .insert_markdown(&path, &synthetic_markdown(args.blocks))
        .map_err(to_input)?;
    Ok(path)
}

fn resolve_config(args: &Args) -> Result<ResolvedConfig, AppError> {
    // Defaults → Config File → Env Vars → CLI Args
    let config_file = persistent_window::config::load_config_with_precedence(args.config.clone())?;
    let merged = persistent_window::config::merge_config(config_file)?;
    let with_env = persistent_window::config::apply_env_overrides(merged);
    Ok(persistent_window::config::apply_cli_overrides(
        with_env,
        args.buffer,
        args.max_loaded,
        args.log_file.clone(),
    ))
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    persistent_window::logging::init(&config.log_file_path)?;
    info!(config = ?config, "Configuration loaded and resolved");

    let mut store = MemoryBlockStore::new();
    let path = load_document(&args, &mut store)?;

    let window = PersistentWindow::new(
        config.window,
        HeadlessSurface::new(),
        HeadlessContainer::new(),
        TextMetricsCache::new(Box::new(CellMeasureSurface::default())),
        args.width,
        args.viewport_height,
    );
    let start = Instant::now();
    let mut sim = Simulator {
        window,
        store,
        start,
        now: start,
        out: std::io::stdout().lock(),
    };

    sim.open(&path)?;
    for scroll_top in &args.scroll_to {
        sim.scroll(*scroll_top)?;
        sim.now += Duration::from_millis(args.step);
    }
    sim.drain_timers()?;
    sim.close()?;

    Ok(())
}
