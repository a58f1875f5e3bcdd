use std::io::Read;

use camino::Utf8Path;
use csv::ReaderBuilder;

use crate::error::HierarchyError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Vec<String>>,
    width: usize,
}

impl Table {
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = Vec<C>>,
        C: Into<String>,
    {
        let mut rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| cell.into().trim().to_string())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { rows, width }
    }

    pub fn from_tsv_path(path: &Utf8Path, skip_lines: usize) -> Result<Self, HierarchyError> {
        let input_error = |message: String| HierarchyError::InputRead {
            path: path.as_std_path().to_path_buf(),
            message,
        };
        let file =
            std::fs::File::open(path.as_std_path()).map_err(|err| input_error(err.to_string()))?;
        let rows = read_tsv_rows(file, skip_lines).map_err(|err| input_error(err.to_string()))?;
        Ok(Self::from_rows(rows))
    }

    pub fn from_tsv_reader<R: Read>(reader: R, skip_lines: usize) -> Result<Self, HierarchyError> {
        let rows = read_tsv_rows(reader, skip_lines).map_err(|err| HierarchyError::InputRead {
            path: "<reader>".into(),
            message: err.to_string(),
        })?;
        Ok(Self::from_rows(rows))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

fn read_tsv_rows<R: Read>(reader: R, skip_lines: usize) -> Result<Vec<Vec<String>>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records().skip(skip_lines) {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|cell| cell.trim_matches('\u{feff}').to_string())
                .collect::<Vec<_>>(),
        );
    }
    Ok(rows)
}
