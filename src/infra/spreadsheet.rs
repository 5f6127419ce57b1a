//! Workbook writer for catalog exports.

use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

use crate::application::export::sheet::{CellValue, SheetCell};

const SHEET_NAME: &str = "Menu";

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("failed to build workbook: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("failed to persist workbook: {0}")]
    Io(#[from] std::io::Error),
}

/// Render `cells` into an `.xlsx` file at `path`.
///
/// The workbook is written to a temporary file in the same directory and then
/// renamed, so pollers never observe a partially written export.
pub fn write_workbook(path: &Path, cells: &[SheetCell]) -> Result<(), SpreadsheetError> {
    let bytes = render_workbook(cells)?;

    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::Builder::new()
        .prefix(".export-")
        .suffix(".xlsx")
        .tempfile_in(directory)?;
    staged.write_all(&bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}

pub fn render_workbook(cells: &[SheetCell]) -> Result<Vec<u8>, SpreadsheetError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for cell in cells {
        match &cell.value {
            CellValue::Counter(value) => {
                worksheet.write_number(cell.row, cell.col, f64::from(*value))?;
            }
            CellValue::Text(value) => {
                worksheet.write_string(cell.row, cell.col, value.as_str())?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workbook_is_written_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu.xlsx");
        let cells = vec![
            SheetCell {
                row: 0,
                col: 0,
                value: CellValue::Counter(1),
            },
            SheetCell {
                row: 0,
                col: 1,
                value: CellValue::Text("Lunch".into()),
            },
        ];

        write_workbook(&path, &cells).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"), "xlsx files are zip archives");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".export-"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
