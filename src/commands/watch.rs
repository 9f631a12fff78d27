//! Watch command - repeat tracking cycles on a fixed interval

use crate::commands::print_report;
use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::schedule::{self, ScheduleSettings, WatchSummary};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{self, IsTerminal, Write};
use tracing::info;

/// Watch options
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Hours between cycles (config default when unset)
    pub interval_hours: Option<f64>,
    /// Skip the confirmation for sub-hour intervals
    pub assume_yes: bool,
    /// Print cycle reports as JSON lines
    pub json: bool,
}

/// Run tracking cycles until interrupted.
///
/// Returns `None` when the operator declines a sub-hour interval.
pub async fn cmd_watch(ctx: &AppContext, options: WatchOptions) -> Result<Option<WatchSummary>> {
    let interval_hours = options
        .interval_hours
        .unwrap_or(ctx.config.schedule.interval_hours);
    let settings = ScheduleSettings::from_hours(interval_hours, ctx.config.schedule.poll_secs)?;

    if schedule::needs_confirmation(interval_hours) && !options.assume_yes {
        if !io::stdin().is_terminal() {
            return Err(Error::Validation(
                "intervals under 1 hour need confirmation; pass --yes to skip it".to_string(),
            ));
        }
        eprintln!("Warning: Checking too frequently may result in your IP being blocked");
        if !prompt_confirm("Do you want to continue? (y/n): ")? {
            return Ok(None);
        }
    }

    info!("Price tracker scheduled to run every {} hours", interval_hours);
    if !options.json {
        println!("Price tracker scheduled to run every {} hours", interval_hours);
        println!("Press Ctrl+C to stop");
    }

    let json = options.json;
    let summary = schedule::run_forever(ctx, settings, |report| {
        if json {
            match serde_json::to_string(report) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Failed to serialize cycle report: {}", e),
            }
        } else {
            print_report(report);
        }
    })
    .await?;

    if !json {
        println!("\nPrice tracker stopped");
    }
    Ok(Some(summary))
}

/// Read a single y/n key, prompting on stderr
fn prompt_confirm(label: &str) -> Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "{}", label)?;
    stderr.flush()?;

    let answer = {
        let _raw_mode = RawModeGuard::new()?;
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        break false
                    }
                    KeyCode::Char('y') | KeyCode::Char('Y') => break true,
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Enter | KeyCode::Esc => {
                        break false
                    }
                    _ => {}
                }
            }
        }
    };

    writeln!(stderr, "{}", if answer { "y" } else { "n" })?;
    Ok(answer)
}

struct RawModeGuard;

impl RawModeGuard {
    fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
