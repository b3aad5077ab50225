use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use stickpad::config::{ConfigStore, ControllerConfig, DEFAULT_CONFIG_PATH};
use stickpad::controller::GilrsStick;
use stickpad::mapping::Normalizer;
use stickpad::monitor::{self, REFRESH_INTERVAL};
use stickpad::runtime::StopSignal;
use stickpad::telemetry;

/// Shows processed stick values live, Ctrl+C to quit
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Config file to load
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::setup(false)?;

    let document = ConfigStore::new(&cli.config)
        .load()
        .await
        .map_err(|e| eyre!("Failed to load config: {}", e))?;
    let config = ControllerConfig::load(&document);

    let mut stick = GilrsStick::open().map_err(|e| eyre!("Failed to open joystick: {}", e))?;
    let mut normalizer = Normalizer::new(&config);

    let signal = StopSignal::new();
    let _ctrl_c = signal.listen_for_ctrl_c();

    monitor::run(&mut stick, &mut normalizer, &signal, REFRESH_INTERVAL).await?;
    Ok(())
}
