//! Desktop notifications, selected once at startup.

use std::process::Command;
use tracing::{debug, warn};

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}

/// Shells out to the platform notification helper.
pub struct DesktopNotifier {
    program: &'static str,
}

impl DesktopNotifier {
    pub fn detect() -> Option<Self> {
        let program = if cfg!(target_os = "macos") {
            "osascript"
        } else {
            "notify-send"
        };
        on_path(program).then_some(Self { program })
    }

    fn command(&self, title: &str, body: &str) -> Command {
        let mut cmd = Command::new(self.program);
        if self.program == "osascript" {
            let script = format!(
                "display notification {:?} with title {:?}",
                body, title
            );
            cmd.arg("-e").arg(script);
        } else {
            cmd.arg(title).arg(body);
        }
        cmd
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        match self.command(title, body).output() {
            Ok(out) if out.status.success() => debug!(program = self.program, "notification sent"),
            Ok(out) => warn!(
                program = self.program,
                status = %out.status,
                stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                "notification failed"
            ),
            Err(e) => warn!(program = self.program, error = %e, "notification failed"),
        }
    }
}

pub fn select_notifier(enabled: bool) -> Box<dyn Notifier> {
    if !enabled {
        return Box::new(NoopNotifier);
    }
    match DesktopNotifier::detect() {
        Some(n) => Box::new(n),
        None => {
            debug!("no notification helper found; notifications disabled");
            Box::new(NoopNotifier)
        }
    }
}

fn on_path(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}
