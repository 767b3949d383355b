use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Worksheet;
use std::path::Path;

/// Cell values of one worksheet, at absolute (row, column) positions.
#[derive(Debug, Clone)]
pub struct SheetContents {
    pub name: String,
    pub cells: Vec<(u32, u16, Data)>,
}

/// Cell as text: strings trimmed, `2.0` rendered as `2`, empty cells as "".
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        Data::Int(n) => n.to_string(),
        Data::Float(n) => n.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Rows of the first worksheet as text, paired with 1-based sheet row numbers.
pub fn read_first_sheet(path: &Path) -> Result<Vec<(usize, Vec<String>)>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook at {}", path.display()))?;
    let Some(name) = workbook.sheet_names().first().cloned() else {
        bail!("Workbook {} has no worksheets", path.display());
    };
    let range = workbook
        .worksheet_range(&name)
        .with_context(|| format!("Failed to read sheet '{}' of {}", name, path.display()))?;

    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    Ok(range
        .rows()
        .enumerate()
        .map(|(index, row)| (first_row + index + 1, row.iter().map(cell_text).collect()))
        .collect())
}

/// Every worksheet of a workbook, in workbook order.
pub fn read_sheets(path: &Path) -> Result<Vec<SheetContents>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook at {}", path.display()))?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("Failed to read sheet '{}' of {}", name, path.display()))?;
        let (row0, col0) = range.start().unwrap_or((0, 0));
        let cells = range
            .used_cells()
            .map(|(row, col, value)| (row0 + row as u32, (col0 as usize + col) as u16, value.clone()))
            .collect();
        sheets.push(SheetContents { name, cells });
    }
    Ok(sheets)
}

/// Write cell values back; numbers stay numbers.
pub fn write_cells(worksheet: &mut Worksheet, cells: &[(u32, u16, Data)]) -> Result<()> {
    for (row, col, value) in cells {
        let written = match value {
            Data::Empty => continue,
            Data::Int(n) => worksheet.write_number(*row, *col, *n as f64),
            Data::Float(n) => worksheet.write_number(*row, *col, *n),
            Data::Bool(b) => worksheet.write_boolean(*row, *col, *b),
            Data::String(text) => worksheet.write_string(*row, *col, text),
            other => worksheet.write_string(*row, *col, cell_text(other)),
        };
        written.with_context(|| format!("write cell ({row},{col})"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(2.0)), "2");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Int(-1)), "-1");
        assert_eq!(cell_text(&Data::String("  Olena ".to_string())), "Olena");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_read_sheets_keeps_order_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        let mut workbook = Workbook::new();
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("Notes").unwrap();
            sheet.write_string(0, 0, "kick-off moved").unwrap();
            sheet.write_number(2, 1, 7.0).unwrap();
        }
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("Other").unwrap();
            sheet.write_string(0, 0, "x").unwrap();
        }
        workbook.save(&path).unwrap();

        let sheets = read_sheets(&path).unwrap();
        let names: Vec<_> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Notes", "Other"]);
        assert!(sheets[0]
            .cells
            .iter()
            .any(|(row, col, value)| (*row, *col) == (2, 1) && cell_text(value) == "7"));

        let rows = read_first_sheet(&path).unwrap();
        assert_eq!(rows[0], (1, vec!["kick-off moved".to_string(), String::new()]));
    }
}
