//! Command-line runner for the dashboard layering lint.
//!
//! ```text
//! architecture-lint [BACKEND_DIR]
//! ```
//!
//! Without an argument the lint checks `backend/` under the nearest
//! directory whose `Cargo.toml` declares a `[workspace]`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let backend_dir = match std::env::args_os().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => match locate_backend() {
            Some(dir) => dir,
            None => {
                report("no workspace Cargo.toml found above the current directory");
                return ExitCode::FAILURE;
            }
        },
    };

    match architecture_lint::lint_backend_sources(&backend_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

fn report(message: &str) {
    let _ = writeln!(io::stderr().lock(), "architecture-lint: {message}");
}

fn locate_backend() -> Option<PathBuf> {
    let starts = [
        std::env::var_os("CARGO_WORKSPACE_DIR").map(PathBuf::from),
        std::env::current_dir().ok(),
        Some(PathBuf::from(env!("CARGO_MANIFEST_DIR"))),
    ];
    starts
        .iter()
        .flatten()
        .find_map(|start| start.ancestors().find(|dir| is_workspace_root(dir)))
        .map(|root| root.join("backend"))
}

fn is_workspace_root(dir: &Path) -> bool {
    std::fs::read_to_string(dir.join("Cargo.toml"))
        .is_ok_and(|manifest| manifest.lines().any(|line| line.trim() == "[workspace]"))
}
