use arrow::{
    compute::concat_batches,
    csv::{ReaderBuilder, WriterBuilder},
    record_batch::RecordBatch,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};
use tracing::info;

use crate::clean::observation_schema;
use crate::error::{PipelineError, Result};

/// Write `batch` as UTF-8 CSV with a header row and no index column.
///
/// The data goes to a temporary file next to `path` which is then renamed
/// over it, so an existing file is replaced only once the write succeeded.
/// The parent directory must already exist.
#[tracing::instrument(level = "info", skip(batch, path), fields(path = %path.as_ref().display()))]
pub fn write_observations<P: AsRef<Path>>(batch: &RecordBatch, path: P) -> Result<()> {
    let path = path.as_ref();

    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new().with_header(true).build(&mut buf);
        writer.write(batch)?;
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".life_expectancy")
        .suffix(".csv.tmp")
        .tempfile_in(dir)?;
    tmp.write_all(&buf)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| PipelineError::Io(e.error))?;

    info!(rows = batch.num_rows(), bytes = buf.len(), "wrote observations");
    Ok(())
}

/// Never matches, so empty text cells read back as `""` rather than null.
static NO_NULLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\s\S]").unwrap());

/// Read a file produced by [`write_observations`] back into one batch.
pub fn read_observations<P: AsRef<Path>>(path: P) -> Result<RecordBatch> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PipelineError::from_open(e, path))?;
    let mut reader = BufReader::new(file);

    let schema = observation_schema();
    let expected: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    let mut header = String::new();
    reader.read_line(&mut header)?;
    let found: Vec<&str> = header.trim_end_matches(['\r', '\n']).split(',').collect();
    if found != expected {
        return Err(PipelineError::parse(format!(
            "{}: header `{}` does not match `{}`",
            path.display(),
            header.trim_end(),
            expected.join(",")
        )));
    }

    let batches = ReaderBuilder::new(schema.clone())
        .with_header(false)
        .with_null_regex(NO_NULLS.clone())
        .build(reader)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::{clean_long, clean_wide, tests::strings};
    use crate::filter::filter_region;
    use crate::load::{load_source, RawTable, SourceFormat};
    use crate::region::Region;
    use crate::test_util::{fixture, init_test_logging};
    use std::fs;
    use tempfile::tempdir;

    fn cleaned_fixture() -> RecordBatch {
        let raw = load_source(fixture("eu_life_expectancy_raw.tsv"), SourceFormat::Tsv).unwrap();
        clean_wide(&raw).unwrap()
    }

    #[test]
    fn write_then_read_back_is_equal() {
        init_test_logging();
        let dir = tempdir().unwrap();
        let path = dir.path().join("all.csv");
        let batch = cleaned_fixture();

        write_observations(&batch, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next(), Some("unit,sex,age,region,year,value"));
        assert_eq!(text.lines().count(), batch.num_rows() + 1);
        assert!(text.lines().nth(1).unwrap().starts_with("YR,F,Y65,DE,2011,21"));

        let back = read_observations(&path).unwrap();
        assert_eq!(back, batch);
    }

    #[test]
    fn empty_dimension_survives_read_back() {
        let raw = RawTable {
            headers: vec!["unit,sex,age,geo\\time".into(), "2010".into()],
            rows: vec![vec!["YR,,Y65,PT".into(), "80.1".into()]],
        };
        let batch = clean_wide(&raw).unwrap();
        assert_eq!(strings(&batch, "sex"), vec![""]);

        let dir = tempdir().unwrap();
        let path = dir.path().join("blank_sex.csv");
        write_observations(&batch, &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap().lines().nth(1).unwrap(),
            "YR,,Y65,PT,2010,80.1"
        );

        let back = read_observations(&path).unwrap();
        assert_eq!(back, batch);
        assert_eq!(strings(&back, "sex"), vec![""]);

        // A null JSON field in the long layout reaches the writer the same way.
        let long = RawTable {
            headers: ["unit", "sex", "age", "country", "year", "life_expectancy"]
                .map(String::from)
                .to_vec(),
            rows: vec![["", "F", "Y65", "PT", "2011", "21.3"].map(String::from).to_vec()],
        };
        let batch = clean_long(&long).unwrap();
        write_observations(&batch, &path).unwrap();
        assert_eq!(read_observations(&path).unwrap(), batch);
    }

    #[test]
    fn refiltering_written_output_is_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pt.csv");
        let pt = filter_region(&cleaned_fixture(), Region::PT).unwrap();
        write_observations(&pt, &path).unwrap();

        let back = read_observations(&path).unwrap();
        assert_eq!(filter_region(&back, Region::PT).unwrap(), pt);
    }

    #[test]
    fn empty_table_keeps_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let empty = RecordBatch::new_empty(observation_schema());
        write_observations(&empty, &path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap().trim_end(),
            "unit,sex,age,region,year,value"
        );
        assert_eq!(read_observations(&path).unwrap().num_rows(), 0);
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "stale contents\n").unwrap();
        write_observations(&cleaned_fixture(), &path).unwrap();
        assert_eq!(read_observations(&path).unwrap().num_rows(), 8);

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn missing_parent_directory_propagates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("out.csv");
        let err = write_observations(&cleaned_fixture(), &path).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
        assert!(!path.exists());
    }

    #[test]
    fn reads_expected_fixture() {
        let batch = read_observations(fixture("pt_life_expectancy_expected.csv")).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.schema(), observation_schema());
    }

    #[test]
    fn rejects_foreign_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(matches!(read_observations(&path), Err(PipelineError::Parse(_))));
        assert!(matches!(
            read_observations(dir.path().join("missing.csv")),
            Err(PipelineError::NotFound { .. })
        ));
    }
}
