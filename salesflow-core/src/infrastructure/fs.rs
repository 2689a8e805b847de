// salesflow-core/src/infrastructure/fs.rs

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use crate::infrastructure::error::InfrastructureError;

/// Writes `content` to `path` through a temporary file in the same directory,
/// then renames it into place. Readers see the old file or the new one, never a
/// partial write. Missing parent directories are created.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    atomic_write_with(path, |writer| {
        writer.write_all(content.as_ref())?;
        Ok(())
    })
}

/// Same guarantee as [`atomic_write`], for content produced by a writer callback
/// (CSV serializers). If the callback fails, the target is left untouched.
pub fn atomic_write_with<P, F>(path: P, fill: F) -> Result<(), InfrastructureError>
where
    P: AsRef<Path>,
    F: FnOnce(&mut dyn Write) -> Result<(), InfrastructureError>,
{
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    // Same directory, so the final rename never crosses filesystems
    let temp_file = tempfile::NamedTempFile::new_in(parent)?;
    let mut writer = BufWriter::new(temp_file);
    fill(&mut writer)?;

    let temp_file = writer
        .into_inner()
        .map_err(|e| InfrastructureError::Io(e.into_error()))?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Deletes `path` if it is there. Returns whether a file was removed.
pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> Result<bool, InfrastructureError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(InfrastructureError::Io(e)),
    }
}
