//! Utilities related to writing results.

use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tracing::info;

/// Writes a value as pretty printed JSON to a file, or to stdout when no file
/// is given.
pub fn write_json<T>(value: &T, dest: Option<&Path>) -> anyhow::Result<()>
where
    T: Serialize + ?Sized,
{
    let output = serde_json::to_string_pretty(value).with_context(|| "serializing result")?;

    match dest {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("creating output file: {}", path.display()))?;
            file.write_all(output.as_bytes())?;
            info!("Wrote result to {}.", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", output)?;
        }
    }

    Ok(())
}
