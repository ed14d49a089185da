use crate::error::{MergeError, Result};
use crate::types::{Dataset, Row};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

const BOM: char = '\u{feff}';

/// How the header block of an input file is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// Record 0 holds the field names; data starts at record 1.
    Single,
    /// Record 0 holds short field names, record 1 a human-readable
    /// description of each column. The description row is discarded.
    Described,
}

impl HeaderLayout {
    /// Consume the header block and return the field names, or `None` for an empty file.
    fn read_header(
        self,
        records: &mut StringRecordsIntoIter<File>,
        path: &Path,
    ) -> Result<Option<Vec<String>>> {
        let Some(first) = next_record(records, path)? else {
            return Ok(None);
        };
        let fields = header_names(&first);

        if self == HeaderLayout::Described {
            match next_record(records, path)? {
                Some(descriptions) => {
                    debug!(columns = descriptions.len(), "Skipped description row");
                }
                None => warn!(path = %path.display(), "Description row missing"),
            }
        }

        Ok(Some(fields))
    }
}

fn header_names(record: &StringRecord) -> Vec<String> {
    record
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if i == 0 {
                name.trim_start_matches(BOM).to_string()
            } else {
                name.to_string()
            }
        })
        .collect()
}

fn next_record(
    records: &mut StringRecordsIntoIter<File>,
    path: &Path,
) -> Result<Option<StringRecord>> {
    records.next().transpose().map_err(|source| MergeError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Build a row under `fields`, padding short records with blanks and
/// truncating long ones to the header width.
fn record_to_row(fields: &[String], record: &StringRecord) -> Row {
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| (field.as_str(), record.get(i).unwrap_or("")))
        .collect()
}

/// Read a delimited file into a [`Dataset`].
#[instrument(skip_all, fields(path = %path.display(), layout = ?layout))]
pub fn load_dataset(path: &Path, layout: HeaderLayout) -> Result<Dataset> {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| MergeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let mut records = reader.into_records();

    let Some(fields) = layout.read_header(&mut records, path)? else {
        warn!("Input file is empty");
        return Ok(Dataset::default());
    };

    let mut rows = Vec::new();
    let mut reshaped = 0usize;
    while let Some(record) = next_record(&mut records, path)? {
        if record.len() != fields.len() {
            reshaped += 1;
        }
        rows.push(record_to_row(&fields, &record));
    }

    if reshaped > 0 {
        debug!(reshaped, "Padded or truncated records to header width");
    }
    info!(rows = rows.len(), columns = fields.len(), "Loaded dataset");
    Ok(Dataset::new(fields, rows))
}

/// Load an input the run cannot do without; a missing file is fatal.
pub fn load_required(path: &Path, layout: HeaderLayout) -> Result<Dataset> {
    if !path.is_file() {
        return Err(MergeError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    load_dataset(path, layout)
}

/// Load an input that may be absent; `Ok(None)` when the file does not exist.
pub fn load_optional(path: &Path, layout: HeaderLayout) -> Result<Option<Dataset>> {
    if !path.is_file() {
        warn!(path = %path.display(), "Optional input not found, skipping");
        return Ok(None);
    }
    load_dataset(path, layout).map(Some)
}
