// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use photobooth::collage;
use photobooth::config::Config;
use photobooth::hardware::TriggerInput;
use photobooth::hardware::fake::{FakeButtons, FakeCamera, FakeCloud, FakePreview, FakePrinter};
use photobooth::scheduler::SessionScheduler;
use photobooth::status::StatusLine;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Unattended photobooth kiosk appliance")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the kiosk (default)
    Run {
        /// Configuration file (default: configuration.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate the configuration file and print the effective settings
    CheckConfig {
        /// Configuration file (default: configuration.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Compose existing shots into a collage
    Compose {
        /// Source shots, in quadrant order (up to 4)
        input: Vec<PathBuf>,

        /// Output file path
        #[arg(short, long, default_value = "collage.jpg")]
        output: PathBuf,

        /// Foreground image composited on top
        #[arg(short, long)]
        foreground: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photobooth=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::CheckConfig { config }) => check_config(config),
        Some(Commands::Compose {
            input,
            output,
            foreground,
        }) => compose(input, output, foreground),
        Some(Commands::Run { config }) => run_kiosk(config),
        None => run_kiosk(None),
    }
}

/// Load the configuration, warning instead of failing when the file is
/// absent (first boot on a fresh appliance)
fn load_config(path: Option<PathBuf>) -> Config {
    let path = path.unwrap_or_else(|| PathBuf::from("configuration.json"));
    match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Using default configuration");
            Config::default()
        }
    }
}

fn run_kiosk(config: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    info!(version = env!("GIT_VERSION"), "Photobooth starting");

    let config = load_config(config);
    let status = StatusLine::new();

    // Composition root: the pipeline only sees the collaborator traits.
    // This build wires the fake hardware; an appliance image swaps in
    // the GPIO/camera/OAuth adapters here.
    let buttons = FakeButtons::new(config.enable_hardware_buttons);
    if !buttons.has_buttons() {
        warn!("No hardware buttons found, expecting on-screen triggers");
    }

    let mut scheduler = SessionScheduler::new(
        config,
        Box::new(buttons),
        Box::new(FakeCamera::new()),
        Box::new(FakeCloud::new()),
        Box::new(FakePreview::default()),
        Box::new(FakePrinter::default()),
        status,
    );

    let stop = scheduler.stop_handle();
    ctrlc::set_handler(move || {
        stop.store(true, std::sync::atomic::Ordering::SeqCst);
    })?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(scheduler.run());

    info!("Photobooth stopped");
    Ok(())
}

fn check_config(path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.unwrap_or_else(|| PathBuf::from("configuration.json"));
    let config = Config::load(&path)?;

    println!("{} is valid", path.display());
    println!();
    println!("  archive dir:        {}", config.archive_dir.display());
    println!("  local archive:      {}", config.local_archive);
    println!("  removable fan-out:  {}", config.archive_to_all_removable_drives);
    println!("  upload enabled:     {}", config.enable_upload);
    println!("  email enabled:      {}", config.enable_email);
    println!("  print enabled:      {}", config.enable_print);
    println!("  countdown:          {}s", config.countdown_seconds);
    println!("  collage shots:      {}", config.collage_shots);

    if config.local_archive && !config.archive_dir.exists() {
        println!();
        println!(
            "warning: archive dir {} does not exist yet",
            config.archive_dir.display()
        );
    }
    Ok(())
}

fn compose(
    input: Vec<PathBuf>,
    output: PathBuf,
    foreground: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    use image::GenericImageView;

    if input.is_empty() || input.len() > 4 {
        return Err(format!("expected 1-4 source shots, got {}", input.len()).into());
    }

    // all shots share the first one's dimensions on the grid
    let first = image::open(&input[0])?;
    let shot_size = first.dimensions();

    collage::compose_files(&input, shot_size, foreground.as_deref(), &output)?;
    println!("Collage saved: {}", output.display());
    Ok(())
}
