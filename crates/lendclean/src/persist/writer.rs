//! CSV writers for the cleaned dataset and the lookup table.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use crate::error::{LendcleanError, Result};
use crate::provenance::LookupTable;
use crate::table::Dataset;

const LOOKUP_HEADER: [&str; 3] = ["Column", "Original", "Imputed"];

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| LendcleanError::io(parent, e))?;
        }
    }
    let file = File::create(path).map_err(|e| LendcleanError::io(path, e))?;
    Ok(BufWriter::new(file))
}

/// Write a dataset as CSV: index column first, missing values as empty cells.
pub fn write_table(dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_writer(create_file(path)?);

    writer.write_record(dataset.headers())?;
    for row in 0..dataset.row_count() {
        writer.write_record(dataset.record(row))?;
    }
    writer.flush().map_err(|e| LendcleanError::io(path, e))?;

    tracing::info!(
        path = %path.display(),
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "Wrote table"
    );
    Ok(())
}

/// Write the lookup table with a `Column,Original,Imputed` header.
pub fn write_lookup(lookup: &LookupTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(create_file(path)?);

    writer.write_record(LOOKUP_HEADER)?;
    for record in lookup.iter() {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|e| LendcleanError::io(path, e))?;

    tracing::info!(path = %path.display(), records = lookup.len(), "Wrote lookup table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::{LookupRecord, LookupRules, build_lookup};
    use crate::table::{Column, Value};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_write_table_layout() {
        let ds = Dataset::from_columns([
            ("customer_id", Column::new(vec![Value::text("c1"), Value::text("c2")])),
            ("int_rate", Column::new(vec![Value::Float(0.5), Value::Missing])),
            ("salary_can_cover", Column::new(vec![Value::Bool(true), Value::Bool(false)])),
            (
                "issue_date",
                Column::new(vec![
                    Value::Date(NaiveDate::from_ymd_opt(2016, 3, 17).unwrap()),
                    Value::Missing,
                ]),
            ),
        ])
        .unwrap()
        .with_index("customer_id")
        .unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("clean.csv");
        write_table(&ds, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "customer_id,int_rate,salary_can_cover,issue_date\n\
             c1,0.5,True,2016-03-17\n\
             c2,,False,\n"
        );
    }

    #[test]
    fn test_write_lookup() {
        let before = Dataset::from_columns([(
            "int_rate",
            Column::new(vec![Value::Missing, Value::Float(0.2)]),
        )])
        .unwrap();
        let after = Dataset::from_columns([(
            "int_rate",
            Column::new(vec![Value::Float(0.1), Value::Float(0.2)]),
        )])
        .unwrap();
        let lookup = build_lookup(&before, &after, &LookupRules::default()).unwrap();
        assert_eq!(lookup.records(), &[LookupRecord::new("int_rate", "missing", "0.1 (median)")]);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lookup.csv");
        write_lookup(&lookup, &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Column,Original,Imputed\nint_rate,missing,0.1 (median)\n"
        );
    }

    #[test]
    fn test_empty_lookup_keeps_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lookup.csv");
        write_lookup(&LookupTable::default(), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Column,Original,Imputed\n");
    }
}
