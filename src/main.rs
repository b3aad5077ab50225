use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use stickpad::config::{ConfigStore, ControllerConfig, DEFAULT_CONFIG_PATH};
use stickpad::controller::GilrsStick;
use stickpad::pad::{PadGuard, VirtualPad};
use stickpad::runtime::kill_switch::{self, KillKeyWatcher};
use stickpad::runtime::{log_banner, Runtime, RuntimeSettings, StopSignal};
use stickpad::telemetry;
use tracing::info;

/// Maps a flight stick onto a virtual Xbox 360 controller
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Log control values every tick
    #[arg(long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::setup(cli.debug)?;

    let document = ConfigStore::new(DEFAULT_CONFIG_PATH)
        .load()
        .await
        .map_err(|e| eyre!("Failed to load config: {}", e))?;
    let config = ControllerConfig::load(&document);

    let stick = GilrsStick::open().map_err(|e| eyre!("Failed to open joystick: {}", e))?;
    let pad = PadGuard::new(connect_pad()?);

    let signal = StopSignal::new();
    let _ctrl_c = signal.listen_for_ctrl_c();
    let watcher = match config.kill_switch.key {
        Some(key) if kill_switch::keyboard_available() => Some(
            KillKeyWatcher::spawn(key, kill_switch::platform_probe, signal.clone())
                .map_err(|e| eyre!("Failed to start kill key watcher: {}", e))?,
        ),
        _ => None,
    };

    log_banner(&config.kill_switch);

    let runtime = Runtime::start(
        Box::new(stick),
        pad,
        &config,
        signal,
        RuntimeSettings::default(),
    );
    let stopped = runtime.run_until_stopped().await.cleanup();

    if let Some(watcher) = watcher {
        watcher.join();
    }
    info!(
        "Exited after {} ticks ({})",
        stopped.ticks(),
        stopped
            .stop_reason()
            .map_or_else(|| "no reason".to_string(), |r| r.to_string())
    );
    Ok(())
}

#[cfg(windows)]
fn connect_pad() -> Result<Box<dyn VirtualPad>> {
    let pad = stickpad::pad::vigem::ViGEmPad::connect()
        .map_err(|e| eyre!("Failed to connect virtual pad: {}", e))?;
    Ok(Box::new(pad))
}

#[cfg(not(windows))]
fn connect_pad() -> Result<Box<dyn VirtualPad>> {
    tracing::warn!("ViGEm is only available on Windows, pad output is logged instead");
    Ok(Box::new(stickpad::pad::trace_pad::TracePad::new()))
}
