use std::fs::File;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use simplelog::{Config, LevelFilter, WriteLogger};
use winit::event_loop::EventLoop;

use dualslide::panic_handler::initialize_panic_handler;
use dualslide::pdf::{BoundaryPolicy, Coordinator, DisplayRole, Document, MupdfDocument};
use dualslide::presenter::{HostConfig, PanelKind, PresenterApp, Session, blit};
use dualslide::settings;

const DEMO_PRESENTATION: &str = "demo_presentation/demo.pdf";

/// Present a PDF deck on an audience window and a notes window
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// PDF to present
    #[arg(default_value = DEMO_PRESENTATION)]
    pdf: PathBuf,

    /// Pages per slide step
    #[arg(long)]
    step: Option<usize>,

    /// Notes display offset from the main display
    #[arg(long)]
    offset: Option<usize>,

    /// What happens at the first and last page
    #[arg(long, value_parser = parse_policy)]
    policy: Option<BoundaryPolicy>,

    /// Read settings from this file instead of the user config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render every page on demand only
    #[arg(long)]
    no_prefetch: bool,

    #[arg(long, default_value = "dualslide.log")]
    log_file: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

fn parse_policy(value: &str) -> Result<BoundaryPolicy, String> {
    match value {
        "clamp" => Ok(BoundaryPolicy::Clamp),
        "reject" => Ok(BoundaryPolicy::Reject),
        other => Err(format!("unknown policy '{other}', expected clamp or reject")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("cannot create log file {}", cli.log_file.display()))?,
    )?;
    initialize_panic_handler();

    info!("Starting dualslide");

    match &cli.config {
        Some(path) => settings::load_settings_from_path(path),
        None => settings::load_settings(),
    }
    settings::update(|s| {
        if let Some(step) = cli.step {
            s.navigation_step = step;
        }
        if let Some(offset) = cli.offset {
            s.display_offset = offset;
        }
        if let Some(policy) = cli.policy {
            s.boundary_policy = policy;
        }
        if cli.no_prefetch {
            s.prefetch = false;
        }
    });
    let settings = settings::current();

    let document = MupdfDocument::open(&cli.pdf)
        .with_context(|| format!("cannot open {}", cli.pdf.display()))?;
    let title = document.title().unwrap_or_else(|| {
        cli.pdf
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dualslide".to_string())
    });

    let document: Rc<dyn Document> = Rc::new(document);
    let coordinator = Coordinator::new(document, settings.coordinator_config())
        .with_context(|| format!("{} has no pages", cli.pdf.display()))?;

    let mut session = Session::new(coordinator);
    if settings.prefetch {
        session = session.with_prefetch(MupdfDocument::opener(&cli.pdf), settings.render_workers);
    }
    if settings.show_elapsed_time {
        session = session.with_panel(DisplayRole::Notes, PanelKind::ElapsedTime);
    }

    let background = blit::parse_colour(&settings.background).unwrap_or_else(|| {
        warn!("invalid background {:?}, using black", settings.background);
        0
    });
    let hosts = vec![
        HostConfig {
            role: DisplayRole::Main,
            title: title.clone(),
            background,
        },
        HostConfig {
            role: DisplayRole::Notes,
            title,
            background,
        },
    ];

    let event_loop = EventLoop::new()?;
    let mut app = PresenterApp::new(session, hosts);
    event_loop.run_app(&mut app)?;

    info!("Exiting dualslide");
    Ok(())
}
