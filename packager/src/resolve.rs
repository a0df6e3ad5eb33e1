//! The `resolve` subcommand.
//!
//! Prints the artefact pair for an architecture without touching the
//! network. Output is written to stdout (human-readable by default, JSON
//! with `--json`).

use crate::artefact::catalogue::select_artifacts;
use crate::cli::ResolveArgs;
use crate::error::Result;
use crate::output::artifact_lines;
use std::io::Write;

/// Print the artefacts selected for `args`.
///
/// # Errors
///
/// Returns an error if:
/// - the architecture has no artefacts
/// - JSON serialisation fails
/// - writing to stdout fails
pub fn run_resolve(args: &ResolveArgs, stdout: &mut dyn Write) -> Result<()> {
    let arch = args.arch()?;
    let artifacts = select_artifacts(arch)?;
    log::debug!("resolved {arch} to {}", arch.vendor_token());

    if args.json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&artifacts)?)?;
    } else {
        writeln!(stdout, "{arch} ({})", arch.vendor_token())?;
        for line in artifact_lines(&artifacts) {
            writeln!(stdout, "  {line}")?;
        }
    }
    Ok(())
}
