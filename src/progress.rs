//! Tracking-cycle progress bar and a log writer that keeps it pinned.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        mp
    })
}

fn emit_line(line: &str) {
    let line = line.trim_end_matches('\r');
    let mp = multi_progress();
    // a hidden target (stderr not a terminal) swallows println
    if mp.is_hidden() {
        eprintln!("{}", line);
    } else {
        let _ = mp.println(line);
    }
}

/// Progress over the products of one tracking cycle.
///
/// The bar is removed from the terminal when dropped.
pub struct CycleProgress {
    bar: ProgressBar,
}

impl CycleProgress {
    pub fn new(products: usize) -> Self {
        let bar = multi_progress().add(ProgressBar::new(products as u64));
        if let Ok(style) =
            ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}")
        {
            bar.set_style(style);
        }
        Self { bar }
    }

    /// Show which product is being checked
    pub fn checking(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    /// Show the pacing pause
    pub fn pausing(&self) {
        self.bar.set_message("waiting before next product");
    }

    pub fn advance(&self) {
        self.bar.inc(1);
    }
}

impl Drop for CycleProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
        multi_progress().remove(&self.bar);
    }
}

/// `MakeWriter` that prints log lines above any active progress bar
#[derive(Default, Clone)]
pub struct LogWriterFactory;

pub struct LogWriter {
    buffer: String,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.push_str(&String::from_utf8_lossy(buf));

        while let Some(idx) = self.buffer.find('\n') {
            emit_line(&self.buffer[..idx]);
            self.buffer.drain(..idx + 1);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            emit_line(&self.buffer);
            self.buffer.clear();
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            buffer: String::new(),
        }
    }
}
