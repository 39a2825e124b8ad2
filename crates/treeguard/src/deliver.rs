//! Hands a finished cycle to the outside world: stdout, notification,
//! report file.

use crate::notify::Notifier;
use crate::render::{render_report, NoPaint, Paint, Tone};
use crate::sink::ReportFile;
use chrono::Local;
use std::io::Write;
use tracing::warn;
use treeguard_core::{CycleOutcome, Persistence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Once,
    Watch,
}

pub struct Delivery {
    pub paint: Box<dyn Paint>,
    pub notifier: Box<dyn Notifier>,
    pub report_file: Option<ReportFile>,
    pub show_size: bool,
}

impl Delivery {
    pub fn deliver(&self, outcome: &CycleOutcome, mode: Mode) {
        if !outcome.failures.is_empty() {
            warn!(count = outcome.failures.len(), "some files could not be read this cycle");
        }

        if !outcome.report.has_changes() {
            match mode {
                Mode::Watch => {
                    print!("\r✔ No changes detected at {}", Local::now().format("%H:%M:%S"));
                    let _ = std::io::stdout().flush();
                }
                Mode::Once => println!("{}", render_report(&outcome.report, self.paint.as_ref(), self.show_size)),
            }
            return;
        }

        if mode == Mode::Watch {
            println!();
        }
        println!("{}", render_report(&outcome.report, self.paint.as_ref(), self.show_size));

        self.notifier
            .notify("treeguard alert", &outcome.report.counts().summary_line());

        if let Some(file) = &self.report_file {
            let plain = render_report(&outcome.report, &NoPaint, self.show_size);
            if let Err(e) = file.append(&plain) {
                warn!(path = %file.path().display(), error = %e, "cannot write report file");
            }
        }

        match &outcome.persistence {
            Persistence::Saved => println!(
                "{}",
                self.paint.paint(
                    &format!("\nSnapshot updated at {}", Local::now().format("%H:%M:%S")),
                    Tone::Info,
                )
            ),
            Persistence::Failed(reason) => eprintln!(
                "warning: snapshot not saved ({reason}); the baseline is stale and these changes will be reported again"
            ),
            Persistence::Unchanged => {}
        }
    }
}
