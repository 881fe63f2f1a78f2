//! Audit sampling for loader iterations.

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Append one JSON line describing a loader iteration to the sample file.
///
/// A `None` path disables sampling; errors opening or writing the file are
/// surfaced to the caller, which treats them as non-fatal.
pub fn write_audit_sample<P: AsRef<Path>, T: Serialize>(
    path: Option<P>,
    payload: &T,
) -> anyhow::Result<()> {
    if let Some(audit_path) = path {
        let json = serde_json::to_string(payload)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&audit_path)?;
        writeln!(file, "{}", json)?;
    }
    Ok(())
}
