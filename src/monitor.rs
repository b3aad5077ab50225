//! Live view of processed stick values for checking a config

use crate::controller::{HatPosition, StickSnapshot, StickSource};
use crate::mapping::{ControlValues, Normalizer};
use crate::runtime::StopSignal;
use std::fmt::Write as _;
use std::io::Write as _;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

pub const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

const BAR_CELLS: usize = 21;

const CONTROLS: [(&str, &str); 4] = [
    ("Roll", "roll"),
    ("Pitch", "pitch"),
    ("Yaw", "yaw"),
    ("Throttle", "throttle"),
];

/// `value` in `[-1, 1]` as a left-filled bar of 21 cells
pub fn bar(value: f32) -> String {
    let value = crate::mapping::normalizer::clamp_unit(value);
    let filled = (((value + 1.0) * 10.0) as usize).min(BAR_CELLS);
    format!("{}{}", "█".repeat(filled), " ".repeat(BAR_CELLS - filled))
}

/// Arrows for a hat position, `centered` when at rest
pub fn hat_direction((x, y): HatPosition) -> String {
    let mut direction = String::new();
    if y > 0 {
        direction.push('↑');
    }
    if y < 0 {
        direction.push('↓');
    }
    if x > 0 {
        direction.push('→');
    }
    if x < 0 {
        direction.push('←');
    }
    if direction.is_empty() {
        direction.push_str("centered");
    }
    direction
}

/// One screen of monitor output
pub fn render_state(controls: &ControlValues, snapshot: &StickSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Flight Controls ===");
    for (label, name) in CONTROLS {
        let value = controls.get(name);
        let _ = writeln!(out, "{label:>12}: {value:>6.2} |{}|", bar(value));
    }

    let _ = writeln!(out, "\n=== Active Buttons ===");
    let pressed: Vec<String> = snapshot
        .pressed_buttons()
        .iter()
        .map(u32::to_string)
        .collect();
    let pressed = if pressed.is_empty() {
        "None".to_string()
    } else {
        pressed.join(" ")
    };
    let _ = writeln!(out, "Pressed: {pressed}");

    if let Some(hat) = snapshot.hat(0) {
        let _ = writeln!(out, "\n=== Hat Switch ===");
        let _ = writeln!(
            out,
            "X/Y: {:>3}/{:<3} {}",
            hat.0,
            hat.1,
            hat_direction(hat)
        );
    }
    out
}

/// Redraws the view until the signal trips
pub async fn run<S: StickSource>(
    source: &mut S,
    normalizer: &mut Normalizer,
    signal: &StopSignal,
    interval: Duration,
) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    // clear screen, hide cursor
    write!(stdout, "\x1b[2J\x1b[?25l")?;

    while !signal.is_triggered() {
        let snapshot = source.snapshot();
        let controls = normalizer.process(&snapshot);
        // home, draw, clear the rest
        write!(stdout, "\x1b[H{}\x1b[J", render_state(&controls, &snapshot))?;
        stdout.flush()?;

        tokio::select! {
            _ = signal.triggered() => {}
            _ = sleep(interval) => {}
        }
    }

    writeln!(stdout, "\x1b[?25h")?;
    info!("Monitor stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_fills_from_the_left() {
        assert_eq!(bar(-1.0), " ".repeat(21));
        assert_eq!(bar(0.0), format!("{}{}", "█".repeat(10), " ".repeat(11)));
        assert_eq!(bar(1.0), "█".repeat(20) + " ");
        assert_eq!(bar(7.0), bar(1.0));
        assert_eq!(bar(f32::NAN), bar(0.0));
    }

    #[test]
    fn hat_arrows() {
        assert_eq!(hat_direction((0, 0)), "centered");
        assert_eq!(hat_direction((1, 1)), "↑→");
        assert_eq!(hat_direction((-1, -1)), "↓←");
    }

    #[test]
    fn renders_controls_buttons_and_hat() {
        let mut controls = ControlValues::default();
        controls.insert("roll", 0.5);
        controls.insert("throttle", -1.0);
        let snapshot = StickSnapshot {
            buttons: vec![false, true, false, true],
            hats: vec![(0, 1)],
            ..StickSnapshot::default()
        };

        let screen = render_state(&controls, &snapshot);
        assert!(screen.contains("        Roll:   0.50 |"));
        assert!(screen.contains("    Throttle:  -1.00 |"));
        assert!(screen.contains("Pressed: 1 3"));
        assert!(screen.contains("X/Y:   0/1   ↑"));
    }

    #[test]
    fn no_buttons_and_no_hat() {
        let screen = render_state(&ControlValues::default(), &StickSnapshot::default());
        assert!(screen.contains("Pressed: None"));
        assert!(!screen.contains("Hat Switch"));
    }
}
