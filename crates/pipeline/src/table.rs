//! JSON Lines tables
//!
//! One JSON object per line. `None` fields are written as `null` and read
//! back as `None`, so missing statistics survive a round trip.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use glacis_core::{Error, Result};

/// Write `rows` as JSON Lines to `writer`
pub fn write_rows<T: Serialize, W: Write>(writer: W, rows: &[T]) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read JSON Lines rows from `reader`; blank lines are skipped
pub fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut rows = Vec::new();
    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line)
            .map_err(|e| Error::Other(format!("line {}: {e}", index + 1)))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Create or truncate `path` and write `rows` to it
pub fn write_table<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let path = path.as_ref();
    write_rows(File::create(path)?, rows)?;
    debug!(path = %path.display(), rows = rows.len(), "table written");
    Ok(())
}

pub fn read_table<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    read_rows(File::open(path)?)
}
