//! Opens an exported file in the platform's default application.

use std::path::Path;
use std::process::Command;

/// Launches the default viewer for `path`. Failures are logged, never returned.
pub(crate) fn open_best_effort(path: &Path) {
    match viewer_command(path).spawn() {
        Ok(_child) => log::debug!("Opened {} in default viewer", path.display()),
        Err(e) => log::warn!("Could not open {}: {e}", path.display()),
    }
}

fn viewer_command(path: &Path) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        // Empty title argument so `start` does not treat a quoted path as the title
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}
