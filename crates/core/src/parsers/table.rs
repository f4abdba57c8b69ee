//! Loading the semicolon-delimited source tables.

use std::io::Read;
use std::path::Path;

use thiserror::Error;

use super::RawTable;
use crate::model::Metadata;

pub const DELIMITER: u8 = b';';

#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("{0}")]
    Csv(#[from] csv::Error),
    #[error("metadata table has no data row")]
    EmptyMetadata,
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(DELIMITER)
        .has_headers(true)
        // Row width is checked by the timeline parser, which knows the row.
        .flexible(true)
        .trim(csv::Trim::All);
    builder
}

fn collect<R: Read>(mut reader: csv::Reader<R>) -> Result<RawTable, TableLoadError> {
    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, _>>()?;
    Ok(RawTable::new(headers, rows))
}

/// Read a table from any reader.
pub fn read_table<R: Read>(reader: R) -> Result<RawTable, TableLoadError> {
    collect(reader_builder().from_reader(reader))
}

pub fn read_table_path(path: &Path) -> Result<RawTable, TableLoadError> {
    collect(reader_builder().from_path(path)?)
}

/// Read the single-row metadata table into label/value pairs.
///
/// Rows after the first are ignored.
pub fn read_metadata<R: Read>(reader: R) -> Result<Metadata, TableLoadError> {
    metadata_from_table(read_table(reader)?)
}

pub fn read_metadata_path(path: &Path) -> Result<Metadata, TableLoadError> {
    metadata_from_table(read_table_path(path)?)
}

fn metadata_from_table(table: RawTable) -> Result<Metadata, TableLoadError> {
    let RawTable { headers, rows } = table;
    let first = rows.into_iter().next().ok_or(TableLoadError::EmptyMetadata)?;
    let entries = headers
        .into_iter()
        .zip(first.into_iter().chain(std::iter::repeat(String::new())))
        .collect();
    Ok(Metadata::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_semicolon_table() {
        let input = "time;dose;comment;anxiety\n10:00;0;ok;2\n10:15;MDMA:100; fine ;4\n";
        let table = read_table(input.as_bytes()).unwrap();
        assert_eq!(table.headers, ["time", "dose", "comment", "anxiety"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], ["10:15", "MDMA:100", "fine", "4"]);
        assert_eq!(table.column("dose"), Some(1));
    }

    #[test]
    fn short_rows_are_passed_through() {
        let input = "time;dose;anxiety\n10:00;0\n";
        let table = read_table(input.as_bytes()).unwrap();
        assert_eq!(table.rows[0].len(), 2);
    }

    #[test]
    fn reads_metadata_pairs() {
        let input = "age;weight;setting\n27;70kg;home, with a sitter\n";
        let metadata = read_metadata(input.as_bytes()).unwrap();
        assert_eq!(metadata.entries().len(), 3);
        assert_eq!(metadata.get("setting"), Some("home, with a sitter"));
    }

    #[test]
    fn metadata_without_rows_errors() {
        let result = read_metadata("age;weight\n".as_bytes());
        assert!(matches!(result, Err(TableLoadError::EmptyMetadata)));
    }
}
