//! CSV-backed recipient list.
//!
//! The file has a header row with the columns `Nombre`, `Telefono` and
//! `Estado`. Extra columns are allowed and are carried through rewrites
//! untouched. A leading UTF-8 byte-order mark is accepted and preserved.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use tracing::{debug, info, instrument, warn};

use crate::errors::SenderError;
use crate::recipient::{DeliveryStatus, Recipient, SkipReason, SkipRecord};

pub const NAME_COLUMN: &str = "Nombre";
pub const PHONE_COLUMN: &str = "Telefono";
pub const STATUS_COLUMN: &str = "Estado";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Result of reading the source: rows to dispatch plus the rows left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub eligible: Vec<Recipient>,
    pub skipped: Vec<SkipRecord>,
}

impl LoadReport {
    /// Names shared by more than one eligible row, in first-seen order.
    ///
    /// Status is written back by name, so the first success marks every
    /// row with that name as sent.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for recipient in &self.eligible {
            let name = recipient.name.as_str();
            if !seen.insert(name) && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        duplicates
    }
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    name: usize,
    phone: usize,
    status: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, String> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| format!("missing column '{column}' in header {headers:?}"))
        };
        Ok(Self {
            name: find(NAME_COLUMN)?,
            phone: find(PHONE_COLUMN)?,
            status: find(STATUS_COLUMN)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RecipientSource {
    path: PathBuf,
}

impl RecipientSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every row and splits them into eligible and skipped.
    ///
    /// A row is eligible when its status is `Not Send` and both name and
    /// phone are non-empty. Phone format is not checked here.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<LoadReport, SenderError> {
        let raw = fs::read(&self.path).map_err(|e| SenderError::source_read(&self.path, e))?;
        let body = raw.strip_prefix(UTF8_BOM).unwrap_or(&raw);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(body);

        let headers = reader
            .headers()
            .map_err(|e| SenderError::source_read(&self.path, e))?
            .clone();
        debug!("Columns found: {:?}", headers);
        let columns = Columns::locate(&headers).map_err(|e| SenderError::source_read(&self.path, e))?;

        let mut report = LoadReport::default();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| SenderError::source_read(&self.path, e))?;
            report.total_rows += 1;

            let cell = |i: usize| record.get(i).unwrap_or("").trim().to_string();
            let name = cell(columns.name);
            let phone = cell(columns.phone);
            let status = cell(columns.status);

            let parsed = status.parse::<DeliveryStatus>().ok();
            let reason = match parsed {
                Some(s) if s.is_dispatchable() => {
                    if name.is_empty() || phone.is_empty() {
                        Some(SkipReason::IncompleteData)
                    } else {
                        None
                    }
                }
                _ => Some(SkipReason::StatusNotNotSent),
            };

            match reason {
                Some(reason) => {
                    debug!(row = index + 1, %name, %status, "Skipping row: {}", reason);
                    report.skipped.push(SkipRecord {
                        name,
                        phone,
                        status,
                        reason,
                    });
                }
                None => {
                    debug!(row = index + 1, %name, "Row queued for dispatch");
                    report.eligible.push(Recipient {
                        name,
                        phone,
                        status: DeliveryStatus::NotSent,
                    });
                }
            }
        }

        for name in report.duplicate_names() {
            warn!(
                "Several pending rows are named '{}'; the first successful send marks all of them",
                name
            );
        }
        info!(
            "Read {} rows: {} eligible, {} skipped",
            report.total_rows,
            report.eligible.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Sets the status of every row whose trimmed name equals `recipient_name`.
    ///
    /// Rows that do not match are copied byte for byte, as are the header,
    /// the byte-order mark and the line terminators. The new content is
    /// written to a temporary file next to the source and renamed over it.
    /// Returns the number of rows updated; nothing is written when it is zero.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn persist_status(
        &self,
        recipient_name: &str,
        new_status: DeliveryStatus,
    ) -> Result<usize, SenderError> {
        let target = recipient_name.trim();
        let raw = fs::read(&self.path).map_err(|e| SenderError::source_read(&self.path, e))?;
        let bom_len = if raw.starts_with(UTF8_BOM) { UTF8_BOM.len() } else { 0 };
        let body = &raw[bom_len..];

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(body);
        let headers = reader
            .headers()
            .map_err(|e| SenderError::source_read(&self.path, e))?
            .clone();
        let columns = Columns::locate(&headers).map_err(|e| SenderError::source_read(&self.path, e))?;

        let mut output = Vec::with_capacity(raw.len() + 8);
        // BOM plus header, up to where the first record starts
        let mut copied_up_to = reader.position().byte() as usize;
        output.extend_from_slice(&raw[..bom_len + copied_up_to]);

        let mut updated = 0usize;
        let mut record = StringRecord::new();
        loop {
            let start_before = reader.position().byte() as usize;
            let more = reader
                .read_record(&mut record)
                .map_err(|e| SenderError::source_read(&self.path, e))?;
            if !more {
                break;
            }
            let start = record
                .position()
                .map(|p| p.byte() as usize)
                .unwrap_or(start_before);
            let end = reader.position().byte() as usize;
            // the recorded start may sit before blank lines the reader skipped
            let start = start
                + body[start..end]
                    .iter()
                    .take_while(|b| **b == b'\r' || **b == b'\n')
                    .count();

            let name_matches = record.get(columns.name).map(str::trim) == Some(target);
            if !name_matches {
                continue;
            }

            // blank lines and anything else between records stay as they were
            output.extend_from_slice(&body[copied_up_to..start]);
            let original = &body[start..end];
            let rewritten = rewrite_status(&record, columns.status, new_status)
                .map_err(|e| SenderError::source_write(&self.path, e))?;
            output.extend_from_slice(&rewritten);
            output.extend_from_slice(line_terminator(original));
            copied_up_to = end;
            updated += 1;
        }
        output.extend_from_slice(&body[copied_up_to..]);

        if updated == 0 {
            warn!("No row named '{}' found; source left untouched", target);
            return Ok(0);
        }

        self.replace_contents(&output)?;
        info!("Marked {} row(s) for '{}' as {}", updated, target, new_status);
        Ok(updated)
    }

    fn replace_contents(&self, contents: &[u8]) -> Result<(), SenderError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| SenderError::source_write(&self.path, e))?;
        tmp.write_all(contents)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| SenderError::source_write(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| SenderError::source_write(&self.path, e.error))?;
        Ok(())
    }
}

/// Serializes `record` with its status cell replaced, without a terminator.
fn rewrite_status(
    record: &StringRecord,
    status_index: usize,
    status: DeliveryStatus,
) -> Result<Vec<u8>, csv::Error> {
    let mut fields: Vec<&str> = record.iter().collect();
    if fields.len() <= status_index {
        fields.resize(status_index + 1, "");
    }
    fields[status_index] = status.as_str();

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(&fields)?;
    let mut bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    Ok(bytes)
}

/// The terminator the original record ended with, if any.
fn line_terminator(raw_record: &[u8]) -> &'static [u8] {
    if raw_record.ends_with(b"\r\n") {
        b"\r\n"
    } else if raw_record.ends_with(b"\n") {
        b"\n"
    } else if raw_record.ends_with(b"\r") {
        b"\r"
    } else {
        b""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminator_detection() {
        assert_eq!(line_terminator(b"a,b\r\n"), b"\r\n");
        assert_eq!(line_terminator(b"a,b\n"), b"\n");
        assert_eq!(line_terminator(b"a,b\r"), b"\r");
        assert_eq!(line_terminator(b"a,b"), b"");
    }

    #[test]
    fn rewrite_replaces_only_status_cell() {
        let record = StringRecord::from(vec!["Ana", "+14155551234", "Not Send", "x"]);
        let bytes = rewrite_status(&record, 2, DeliveryStatus::Sent).unwrap();
        assert_eq!(bytes, b"Ana,+14155551234,Sent,x");
    }

    #[test]
    fn rewrite_quotes_fields_that_need_it() {
        let record = StringRecord::from(vec!["Perez, Ana", "+1 415 555 1234", "Not Send"]);
        let bytes = rewrite_status(&record, 2, DeliveryStatus::Error).unwrap();
        assert_eq!(bytes, b"\"Perez, Ana\",+1 415 555 1234,Error");
    }

    #[test]
    fn rewrite_pads_short_rows() {
        let record = StringRecord::from(vec!["Ana", "+14155551234"]);
        let bytes = rewrite_status(&record, 2, DeliveryStatus::Sent).unwrap();
        assert_eq!(bytes, b"Ana,+14155551234,Sent");
    }

    #[test]
    fn missing_column_is_reported() {
        let headers = StringRecord::from(vec!["Nombre", "Telefono"]);
        let err = Columns::locate(&headers).unwrap_err();
        assert!(err.contains("Estado"));
    }
}
