// 🧩 Tabular Merge Engine - many spreadsheets in, one spreadsheet out
//
// Each input's first sheet becomes rows (row 0 = header). The header of the
// first input with a non-empty first row is kept once; every input then
// contributes its rows after the first, in input order.
//
// Known limitation: rows are not aligned or padded. Inputs whose columns
// differ are concatenated as-is.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use log::{debug, info};
use rust_xlsxwriter::{Workbook, XlsxError};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

use crate::error::{RegistryError, Result};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_MIME: &str = "application/vnd.ms-excel";

pub const DEFAULT_MERGED_FILE_NAME: &str = "merged_data.xlsx";
pub const MERGED_SHEET_NAME: &str = "Merged Data";

// ============================================================================
// CELLS & ROWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            // Serial day number, as the sheet stores it
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            other => Cell::Text(other.to_string()),
        }
    }
}

pub type Row = Vec<Cell>;

/// Build a text row
pub fn text_row(values: &[&str]) -> Row {
    values.iter().map(|v| Cell::from(*v)).collect()
}

// ============================================================================
// UPLOAD SCREENING (boundary, before the engine)
// ============================================================================

/// A user-selected file
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Read a file from disk, inferring its MIME type from the extension
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let mime_type = mime_for_file_name(&name).unwrap_or("application/octet-stream").to_string();

        Ok(Upload { name, mime_type, bytes })
    }
}

pub fn is_spreadsheet_mime(mime: &str) -> bool {
    mime == XLSX_MIME || mime == XLS_MIME
}

/// MIME type for a spreadsheet file name, by extension
pub fn mime_for_file_name(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    if lower.ends_with(".xlsx") {
        Some(XLSX_MIME)
    } else if lower.ends_with(".xls") {
        Some(XLS_MIME)
    } else {
        None
    }
}

#[derive(Debug, Default)]
pub struct UploadScreening {
    /// Spreadsheets, in selection order
    pub accepted: Vec<Upload>,
    /// Names of the rejected files
    pub rejected: Vec<String>,
}

impl UploadScreening {
    /// Fault to surface when anything was rejected
    pub fn fault(&self) -> Option<RegistryError> {
        (!self.rejected.is_empty()).then(|| RegistryError::FileType {
            rejected: self.rejected.len(),
        })
    }
}

/// Keep spreadsheet uploads, preserving selection order
pub fn screen_uploads(uploads: Vec<Upload>) -> UploadScreening {
    let mut screening = UploadScreening::default();
    for upload in uploads {
        if is_spreadsheet_mime(&upload.mime_type) {
            screening.accepted.push(upload);
        } else {
            debug!("Rejecting {} ({})", upload.name, upload.mime_type);
            screening.rejected.push(upload.name);
        }
    }
    screening
}

// ============================================================================
// READ / WRITE
// ============================================================================

/// Rows of the first sheet. Trailing empty cells are trimmed, so a row's
/// length is the position of its last non-empty cell.
pub fn read_rows(bytes: &[u8]) -> std::result::Result<Vec<Row>, calamine::Error> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok(Vec::new()),
    };

    // Range starts at the first used cell; keep column positions from A
    let leading_columns = range.start().map_or(0, |(_, col)| col as usize);

    let rows = range
        .rows()
        .map(|cells| {
            let mut row: Row = vec![Cell::Empty; leading_columns];
            row.extend(cells.iter().map(Cell::from));
            while row.last().map_or(false, Cell::is_empty) {
                row.pop();
            }
            row
        })
        .collect();

    Ok(rows)
}

/// Serialize rows into a single-sheet xlsx workbook
pub fn write_rows(sheet_name: &str, rows: &[Row]) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (r, row) in rows.iter().enumerate() {
        let r = u32::try_from(r).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (c, cell) in row.iter().enumerate() {
            let c = u16::try_from(c).map_err(|_| XlsxError::RowColumnLimitError)?;
            match cell {
                Cell::Empty => {}
                Cell::Text(text) => {
                    worksheet.write_string(r, c, text)?;
                }
                Cell::Number(number) => {
                    worksheet.write_number(r, c, *number)?;
                }
                Cell::Bool(flag) => {
                    worksheet.write_boolean(r, c, *flag)?;
                }
            }
        }
    }

    workbook.save_to_buffer()
}

// ============================================================================
// MERGE
// ============================================================================

/// Header-reconciling concatenation over already-parsed inputs
pub fn merge_rows<I>(inputs: I) -> Vec<Row>
where
    I: IntoIterator<Item = Vec<Row>>,
{
    let mut header: Option<Row> = None;
    let mut data: Vec<Row> = Vec::new();

    for rows in inputs {
        let mut rows = rows.into_iter();
        let Some(first) = rows.next() else {
            continue;
        };
        if header.is_none() && !first.is_empty() {
            header = Some(first);
        }
        // Any later first row is a duplicate header
        data.extend(rows);
    }

    match header {
        Some(header) => {
            let mut merged = Vec::with_capacity(data.len() + 1);
            merged.push(header);
            merged.extend(data);
            merged
        }
        None => data,
    }
}

/// Merge spreadsheet buffers into one. Any unreadable input aborts the merge.
pub fn merge<B: AsRef<[u8]>>(buffers: &[B]) -> Result<Vec<u8>> {
    let mut parsed = Vec::with_capacity(buffers.len());
    for (index, buffer) in buffers.iter().enumerate() {
        let rows = read_rows(buffer.as_ref())
            .map_err(|e| RegistryError::merge(format!("input #{}", index + 1), e))?;
        parsed.push(rows);
    }

    let merged = merge_rows(parsed);
    write_rows(MERGED_SHEET_NAME, &merged).map_err(|e| RegistryError::merge("merged output", e))
}

/// Result of merging uploads, ready to be offered for download
#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub input_count: usize,
    /// Rows written, header included
    pub row_count: usize,
}

/// Merge uploads in selection order under a caller-chosen file name
pub fn merge_uploads(uploads: &[Upload], file_name: Option<&str>) -> Result<MergeOutput> {
    let mut parsed = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let rows = read_rows(&upload.bytes).map_err(|e| RegistryError::merge(&upload.name, e))?;
        debug!("Read {} row(s) from {}", rows.len(), upload.name);
        parsed.push(rows);
    }

    let merged = merge_rows(parsed);
    let bytes = write_rows(MERGED_SHEET_NAME, &merged).map_err(|e| RegistryError::merge("merged output", e))?;

    let file_name = file_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_MERGED_FILE_NAME)
        .to_string();

    info!("Merged {} file(s) into {} ({} rows)", uploads.len(), file_name, merged.len());

    Ok(MergeOutput {
        file_name,
        bytes,
        input_count: uploads.len(),
        row_count: merged.len(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
