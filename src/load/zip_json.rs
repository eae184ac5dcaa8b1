use serde_json::{Map, Value};
use std::io::{BufReader, Read, Seek};
use tracing::{debug, warn};
use zip::ZipArchive;

use super::RawTable;
use crate::error::{PipelineError, Result};

type Record = Map<String, Value>;

/// Open a zip archive and decode its first entry as a JSON array of flat
/// records.
///
/// Headers follow the key order of the first record; keys that only show up
/// later are appended. `null` and absent keys become empty cells.
pub fn read_zipped_json<R: Read + Seek>(reader: R) -> Result<RawTable> {
    let mut archive = ZipArchive::new(reader)?;
    if archive.len() == 0 {
        return Err(PipelineError::parse("zip archive has no entries"));
    }
    if archive.len() > 1 {
        warn!(entries = archive.len(), "zip archive has extra entries, reading the first only");
    }

    let entry = archive.by_index(0)?;
    let name = entry.name().to_string();
    debug!(entry = %name, size = entry.size(), "decoding zip entry");
    let records: Vec<Record> = serde_json::from_reader(BufReader::new(entry))?;

    records_to_table(&records)
        .map_err(|e| PipelineError::parse(format!("entry {}: {}", name, e)))
}

fn records_to_table(records: &[Record]) -> std::result::Result<RawTable, String> {
    let mut headers: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    if headers.is_empty() {
        return Err("no columns in JSON records".into());
    }

    let mut rows = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let row = headers
            .iter()
            .map(|h| match record.get(h) {
                None | Some(Value::Null) => Ok(String::new()),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
                Some(_) => Err(format!("record {} has a nested value in `{}`", idx, h)),
            })
            .collect::<std::result::Result<Vec<String>, String>>()?;
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

    /// Build an in-memory zip with one entry per `(name, content)` pair.
    pub(crate) fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buf));
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            for (name, content) in entries {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    pub(crate) const LONG_JSON: &str = r#"[
        {"unit": "YR", "sex": "F", "age": "Y65", "country": "PT", "year": 2011, "life_expectancy": 21.3, "flag": "e", "flag_detail": "estimated"},
        {"unit": "YR", "sex": "F", "age": "Y65", "country": "DE", "year": 2011, "life_expectancy": 21.0, "flag": null, "flag_detail": null},
        {"unit": "YR", "sex": "F", "age": "Y65", "country": "PT", "year": 2010, "life_expectancy": null, "flag": ":", "flag_detail": "not available"}
    ]"#;

    #[test]
    fn reads_first_entry() {
        let bytes = zip_bytes(&[("eurostat_life_expect.json", LONG_JSON)]);
        let table = read_zipped_json(Cursor::new(bytes)).unwrap();
        assert_eq!(
            table.headers,
            vec!["unit", "sex", "age", "country", "year", "life_expectancy", "flag", "flag_detail"]
        );
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0][3], "PT");
        assert_eq!(table.rows[0][4], "2011");
        assert_eq!(table.rows[0][5], "21.3");
        assert_eq!(table.rows[1][6], "");
        assert_eq!(table.rows[2][5], "");
    }

    #[test]
    fn later_keys_are_appended() {
        let json = r#"[{"a": "1"}, {"b": 2, "a": "3"}]"#;
        let bytes = zip_bytes(&[("data.json", json), ("ignored.json", "not json")]);
        let table = read_zipped_json(Cursor::new(bytes)).unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1", ""], vec!["3", "2"]]);
    }

    #[test]
    fn empty_array_is_parse_error() {
        let bytes = zip_bytes(&[("data.json", "[]")]);
        let err = read_zipped_json(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[test]
    fn nested_values_are_rejected() {
        let bytes = zip_bytes(&[("data.json", r#"[{"a": [1, 2]}]"#)]);
        let err = read_zipped_json(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(ref m) if m.contains("nested")));
    }

    #[test]
    fn empty_archive_is_parse_error() {
        let bytes = zip_bytes(&[]);
        let err = read_zipped_json(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[test]
    fn not_a_zip() {
        let err = read_zipped_json(Cursor::new(b"plain text".to_vec())).unwrap_err();
        assert!(matches!(err, PipelineError::Zip(_)));
    }
}
