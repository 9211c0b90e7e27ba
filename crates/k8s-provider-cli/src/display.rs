//! Display formatting for CLI output
//!
//! Diagnostics go to stderr, states and rendered documents to stdout so the
//! output of `read`, `apply` and `manifest` can be piped.

use console::style;
use k8s_provider_core::{Diagnostics, Severity};
use serde_json::Value;

use crate::error::{CliError, Result};

/// Print diagnostics grouped by severity, errors first
pub fn diagnostics(diags: &Diagnostics) {
    let (errors, warnings): (Vec<_>, Vec<_>) =
        diags.iter().partition(|d| d.severity == Severity::Error);

    for diag in errors.iter().chain(warnings.iter()) {
        let label = match diag.severity {
            Severity::Error => style("Error:").red().bold(),
            Severity::Warning => style("Warning:").yellow().bold(),
        };
        match &diag.attribute {
            Some(path) => eprintln!("{} {} ({})", label, diag.summary, style(path).dim()),
            None => eprintln!("{} {}", label, diag.summary),
        }
        if !diag.detail.is_empty() {
            for line in diag.detail.lines() {
                eprintln!("  {}", line);
            }
        }
    }
}

/// Print a state or schema as pretty JSON
pub fn json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print diagnostics and fail when any of them is an error
pub fn check(operation: &str, diags: &Diagnostics) -> Result<()> {
    diagnostics(diags);
    let errors = diags.errors().count();
    if errors > 0 {
        return Err(CliError::provider(operation, errors));
    }
    Ok(())
}

/// Print the state of a finished operation, if any
pub fn state(state: Option<&Value>) -> Result<()> {
    match state {
        Some(state) => json(state),
        None => Ok(()),
    }
}

/// One line of `types` output
pub fn type_line(category: &str, name: &str) {
    println!("{:<12} {}", style(category).cyan(), name);
}
