//! # Spreadsheet I/O
//!
//! Reads the identifier column of the input sheet and writes the result
//! sheet. Both are headered CSV files.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::pubchem::model::{NscId, ResultRecord};

/// Default name of the identifier column.
pub const DEFAULT_ID_COLUMN: &str = "NSCID";

#[derive(Debug, Error)]
pub enum TabularError {
    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Column '{column}' not found in {} (available: {available})", path.display())]
    MissingColumn {
        column: String,
        path: PathBuf,
        available: String,
    },
}

/// Column names of the result sheet.
const OUTPUT_HEADER: [&str; 5] = ["NSCID", "SID", "Version", "CID", "Synonyms"];

/// One output row, in [`OUTPUT_HEADER`] order.
#[derive(Debug, Serialize)]
struct OutputRow {
    nscid: String,
    sid: String,
    version: String,
    cid: String,
    synonyms: String,
}

impl From<&ResultRecord> for OutputRow {
    fn from(record: &ResultRecord) -> Self {
        Self {
            nscid: record.nsc_id.to_string(),
            sid: record.sid.to_string(),
            version: record.version.to_string(),
            cid: record.cid.to_string(),
            synonyms: record.synonyms.to_string(),
        }
    }
}

/// Reads `column` from the CSV at `path`, in row order.
///
/// The header is matched case-insensitively after trimming. Blank cells are
/// skipped with a warning; every other cell becomes one identifier, kept
/// verbatim.
pub fn read_identifiers(path: &Path, column: &str) -> Result<Vec<NscId>, TabularError> {
    let file = File::open(path).map_err(|source| TabularError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source: csv::Error| TabularError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader.headers().map_err(csv_err)?.clone();
    let wanted = column.trim();
    let index = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| TabularError::MissingColumn {
            column: wanted.to_string(),
            path: path.to_path_buf(),
            available: headers.iter().collect::<Vec<_>>().join(", "),
        })?;

    let mut identifiers = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(csv_err)?;
        match record.get(index) {
            Some(cell) if !cell.trim().is_empty() => identifiers.push(NscId::new(cell)),
            _ => log::warn!("Row {}: empty {} cell skipped", row + 2, wanted),
        }
    }

    log::info!("Read {} identifiers from {}", identifiers.len(), path.display());
    Ok(identifiers)
}

/// Writes `records` to `path` with columns `NSCID, SID, Version, CID, Synonyms`.
///
/// Parent directories are created as needed; an existing file is replaced.
pub fn write_records(path: &Path, records: &[ResultRecord]) -> Result<(), TabularError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let csv_err = |source: csv::Error| TabularError::Csv {
        path: path.to_path_buf(),
        source,
    };
    // The header is written by hand so an empty batch still gets one.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;
    writer.write_record(OUTPUT_HEADER).map_err(csv_err)?;
    for record in records {
        writer.serialize(OutputRow::from(record)).map_err(csv_err)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubchem::model::Lookup;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_column_in_order() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "in.csv", "Name,NSCID\nfoo,740\nbar,NSC 3053\nbaz,123.0\n");
        let ids = read_identifiers(&path, "NSCID").unwrap();
        let raw: Vec<&str> = ids.iter().map(NscId::as_str).collect();
        assert_eq!(raw, vec!["740", "NSC 3053", "123.0"]);
    }

    #[test]
    fn column_match_ignores_case_and_whitespace() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "in.csv", " nscid ,other\n1,x\n2,y\n");
        assert_eq!(read_identifiers(&path, "NSCID").unwrap().len(), 2);
    }

    #[test]
    fn blank_cells_are_skipped() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "in.csv", "NSCID,other\n1,a\n ,b\n3\n");
        let ids = read_identifiers(&path, "NSCID").unwrap();
        assert_eq!(ids, vec![NscId::new("1"), NscId::new("3")]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "in.csv", "A,B\n1,2\n");
        match read_identifiers(&path, "NSCID") {
            Err(TabularError::MissingColumn { column, available, .. }) => {
                assert_eq!(column, "NSCID");
                assert_eq!(available, "A, B");
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = read_identifiers(&dir.path().join("nope.csv"), "NSCID").unwrap_err();
        assert!(matches!(err, TabularError::Open { .. }));
    }

    #[test]
    fn writes_fixed_columns_and_sentinels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let records = vec![
            ResultRecord {
                nsc_id: NscId::new("740"),
                sid: Lookup::Found(12345),
                version: Lookup::Found(2),
                cid: Lookup::Found(126941),
                synonyms: Lookup::Found("methotrexate, amethopterin".to_string()),
            },
            ResultRecord::not_found(NscId::new("99999")),
        ];
        write_records(&path, &records).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "NSCID,SID,Version,CID,Synonyms",
                "740,12345,2,126941,\"methotrexate, amethopterin\"",
                "99999,Not Found,Not Found,Not Found,Not Found",
            ]
        );
    }

    #[test]
    fn empty_batch_still_gets_a_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "NSCID,SID,Version,CID,Synonyms\n");
    }

    #[test]
    fn rewriting_replaces_previous_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records(&path, &[ResultRecord::not_found(NscId::new("1"))]).unwrap();
        write_records(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "NSCID,SID,Version,CID,Synonyms\n");
    }
}
