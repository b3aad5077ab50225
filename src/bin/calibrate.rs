use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::time::Duration;
use stickpad::calibration::{CalibrationSession, CalibrationSettings};
use stickpad::config::{ConfigStore, DEFAULT_CONFIG_PATH};
use stickpad::controller::GilrsStick;
use stickpad::runtime::kill_switch::{self, KillKey};
use stickpad::telemetry;
use tracing::{info, warn};

/// Discovers axes, hat and buttons of the connected stick and saves them
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Config file to update
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Key that skips the current binding
    #[arg(long, default_value = "s")]
    skip_key: KillKey,

    /// Seconds before a button step is skipped on its own
    #[arg(long)]
    timeout: Option<u64>,

    #[arg(long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::setup(cli.debug)?;

    let store = ConfigStore::new(&cli.config);
    let mut document = store
        .load()
        .await
        .map_err(|e| eyre!("Failed to load config: {}", e))?;

    let stick = GilrsStick::open().map_err(|e| eyre!("Failed to open joystick: {}", e))?;
    if !kill_switch::keyboard_available() {
        warn!("Keyboard is not readable, use --timeout to skip bindings");
    }

    let settings = CalibrationSettings {
        skip_key: cli.skip_key,
        timeout: cli.timeout.map(Duration::from_secs),
        ..CalibrationSettings::default()
    };
    let mut session = CalibrationSession::new(stick, kill_switch::platform_probe(), settings);
    let report = session
        .run(&mut document)
        .await
        .map_err(|e| eyre!("Calibration failed: {}", e))?;

    println!("\nChecking for conflicts...");
    if !report.button_conflicts.is_empty() {
        println!("\nWARNING: Found button conflicts:");
        for conflict in &report.button_conflicts {
            println!("{conflict}");
        }
    }
    if !report.axis_conflicts.is_empty() {
        println!("\nWARNING: Found axis conflicts:");
        for conflict in &report.axis_conflicts {
            println!("{conflict}");
        }
    }
    if !report.has_conflicts() {
        println!("No conflicts found.");
    }

    store
        .save(&document)
        .await
        .map_err(|e| eyre!("Failed to save config: {}", e))?;
    info!("Config saved to {}", store.path().display());
    println!("\nRun stickpad-monitor to test the configuration, then stickpad to start the controller.");
    Ok(())
}
