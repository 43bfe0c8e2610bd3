use crate::error::{DriverError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// In-memory view of one simulation output file: named columns over rows of
/// f64 values. Rows are never mutated after loading.
#[derive(Clone, Debug)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl Table {
    /// Load a whitespace-delimited output file against a declared schema.
    ///
    /// The first line is the header the executable prints and is skipped.
    /// Every remaining non-blank line must hold exactly one value per
    /// declared column; a disagreement is an error rather than a silent
    /// misalignment of data and labels.
    pub fn from_path(path: &Path, columns: &[String]) -> Result<Table> {
        if !path.is_file() {
            return Err(DriverError::OutputNotFound(path.to_path_buf()));
        }

        let reader = BufReader::new(File::open(path)?);
        let mut rows = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            // Line 1 is the header.
            if idx == 0 {
                continue;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            rows.push(parse_row(trimmed, idx + 1, columns.len())?);
        }

        if rows.is_empty() {
            return Err(DriverError::EmptyTable(path.to_path_buf()));
        }

        Ok(Table {
            columns: columns.to_vec(),
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DriverError::UnknownColumn(name.to_string()))
    }

    /// Copy out one column by name.
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Keep every `stride`-th row, starting from the first, preserving order.
    /// A stride of 1 is the identity.
    pub fn decimate(&self, stride: usize) -> Table {
        let stride = stride.max(1);
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().step_by(stride).cloned().collect(),
        }
    }
}

fn parse_row(line: &str, line_number: usize, expected: usize) -> Result<Vec<f64>> {
    let mut row = Vec::with_capacity(expected);
    for token in line.split_whitespace() {
        let value = token.parse::<f64>().map_err(|_| DriverError::InvalidNumber {
            line: line_number,
            token: token.to_string(),
        })?;
        row.push(value);
    }

    if row.len() != expected {
        return Err(DriverError::ColumnCountMismatch {
            line: line_number,
            expected,
            found: row.len(),
        });
    }

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn schema(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_rows_and_skips_header() {
        let file = write_file("Time v i\n0.0 -65.0 0.5\n0.1 -64.5 0.4\n");
        let table = Table::from_path(file.path(), &schema(&["Time", "v", "i"])).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column("v").unwrap(), vec![-65.0, -64.5]);
    }

    #[test]
    fn known_values_land_at_expected_positions() {
        let file = write_file(
            "Time v i\n\
             0.0 1.0 10.0\n\
             0.1 2.0 20.0\n\
             0.2 3.0 30.0\n\
             0.3 4.0 40.0\n\
             0.4 5.0 50.0\n",
        );
        let table = Table::from_path(file.path(), &schema(&["Time", "v", "i"])).unwrap();
        assert_eq!(table.num_rows(), 5);
        assert_eq!(table.column("Time").unwrap(), vec![0.0, 0.1, 0.2, 0.3, 0.4]);
        assert_eq!(table.column("v").unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(table.column("i").unwrap()[3], 40.0);
    }

    #[test]
    fn rejects_column_count_mismatch() {
        let file = write_file("Time v\n0.0 -65.0\n0.1 -64.5 99.0\n");
        let err = Table::from_path(file.path(), &schema(&["Time", "v"])).unwrap_err();
        match err {
            DriverError::ColumnCountMismatch {
                line,
                expected,
                found,
            } => {
                assert_eq!(line, 3);
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_non_numeric_token() {
        let file = write_file("Time v\n0.0 nan?\n");
        let err = Table::from_path(file.path(), &schema(&["Time", "v"])).unwrap_err();
        assert!(matches!(err, DriverError::InvalidNumber { line: 2, .. }));
    }

    #[test]
    fn header_only_file_is_empty() {
        let file = write_file("Time v\n");
        let err = Table::from_path(file.path(), &schema(&["Time", "v"])).unwrap_err();
        assert!(matches!(err, DriverError::EmptyTable(_)));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = Table::from_path(Path::new("/no/such/run.txt"), &schema(&["Time"])).unwrap_err();
        assert!(matches!(err, DriverError::OutputNotFound(_)));
    }

    #[test]
    fn blank_lines_are_ignored() {
        let file = write_file("Time v\n0.0 1.0\n\n0.1 2.0\n   \n");
        let table = Table::from_path(file.path(), &schema(&["Time", "v"])).unwrap();
        assert_eq!(table.num_rows(), 2);
    }

    #[test]
    fn decimate_keeps_every_nth_row_in_order() {
        let file = write_file(
            "Time v\n0 10\n1 11\n2 12\n3 13\n4 14\n5 15\n6 16\n",
        );
        let table = Table::from_path(file.path(), &schema(&["Time", "v"])).unwrap();
        let thinned = table.decimate(3);
        assert_eq!(thinned.column("Time").unwrap(), vec![0.0, 3.0, 6.0]);
        assert_eq!(thinned.column("v").unwrap(), vec![10.0, 13.0, 16.0]);
    }

    #[test]
    fn decimate_stride_one_is_identity() {
        let file = write_file("Time v\n0 10\n1 11\n");
        let table = Table::from_path(file.path(), &schema(&["Time", "v"])).unwrap();
        assert_eq!(table.decimate(1).num_rows(), table.num_rows());
        // Stride 0 is clamped instead of panicking.
        assert_eq!(table.decimate(0).num_rows(), table.num_rows());
    }

    #[test]
    fn unknown_column_is_an_error() {
        let file = write_file("Time v\n0 10\n");
        let table = Table::from_path(file.path(), &schema(&["Time", "v"])).unwrap();
        assert!(matches!(
            table.column("w"),
            Err(DriverError::UnknownColumn(_))
        ));
    }
}
