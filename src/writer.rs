use crate::config::PrivacyPolicy;
use crate::error::{MergeError, Result};
use crate::types::Row;
use csv::{Terminator, WriterBuilder};
use std::fs::{self, Permissions};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

/// Output column order: participant id, then the first row's fields in
/// order (minus dropped ones), with the key column forced into second place
/// when the first row does not carry it.
pub fn output_headers(rows: &[Row], policy: &PrivacyPolicy, key_column: &str) -> Vec<String> {
    let id_column = policy.id_column.as_str();
    let Some(first) = rows.first() else {
        return vec![id_column.to_string(), key_column.to_string()];
    };

    let mut headers = vec![id_column.to_string()];
    headers.extend(
        first
            .fields()
            .filter(|f| *f != id_column && !policy.is_dropped(f))
            .map(str::to_string),
    );
    if !headers.iter().any(|h| h == key_column) {
        headers.insert(1, key_column.to_string());
    }
    headers
}

/// Mode the output file should end up with. A file being replaced keeps its
/// own permissions; a new file gets the usual 0644 rather than the staging
/// file's owner-only mode.
fn output_permissions(path: &Path) -> Option<Permissions> {
    if let Ok(meta) = fs::metadata(path) {
        return Some(meta.permissions());
    }
    new_file_permissions()
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

/// Write `rows` under `headers` to `path`, replacing any existing file.
///
/// The CSV is staged in a temporary file next to `path` and renamed into
/// place once complete. Fields absent from a row are written blank; fields
/// not in `headers` are ignored. Returns the number of data rows written.
#[instrument(skip(headers, rows), fields(path = %path.display(), columns = headers.len()))]
pub fn write_rows(path: &Path, headers: &[String], rows: &[Row]) -> Result<usize> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let staging = NamedTempFile::new_in(dir)?;
    debug!(staging = %staging.path().display(), "Staging output");

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(staging);

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(headers.iter().map(|h| row.get(h).unwrap_or("")))?;
    }

    let staging = writer
        .into_inner()
        .map_err(|e| MergeError::Io(e.into_error()))?;
    if let Some(permissions) = output_permissions(path) {
        staging.as_file().set_permissions(permissions)?;
    }
    staging.persist(path)?;

    info!(rows = rows.len(), "Wrote output file");
    Ok(rows.len())
}
