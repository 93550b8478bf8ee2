use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    io::{BufReader, BufWriter, Write},
    path::Path,
};
use tempfile::NamedTempFile;
use tracing::debug;

/// Load a whole JSON document from `path`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing JSON from {}", path.display()))
}

/// Replace `path` with `value`, pretty-printed (two-space indent, trailing newline).
///
/// The JSON is written to a temp file in the same directory and renamed over
/// `path`, so readers see either the old file or the complete new one.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    {
        let mut w = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut w, value)
            .with_context(|| format!("serializing JSON for {}", path.display()))?;
        w.write_all(b"\n")?;
        w.flush()?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(path)
        .with_context(|| format!("renaming temp file over {}", path.display()))?;
    debug!(path = %path.display(), "wrote");
    Ok(())
}
