// CSV file reading

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use tracing::debug;

use crate::error::Result;
use crate::execution::batch::RecordBatch;
use crate::storage::{projection_indices, DataSource, ScanConfig};
use crate::types::{Schema, SchemaRef};

/// Rows sampled when inferring column types
const SCHEMA_INFERENCE_ROWS: usize = 100;

/// Data source over a CSV file with a header row
///
/// Column types are inferred from the first rows and memoized, so repeated
/// schema lookups do not touch the file again.
#[derive(Debug)]
pub struct CsvDataSource {
    path: PathBuf,
    config: ScanConfig,
    schema: OnceLock<SchemaRef>,
}

impl CsvDataSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_config(path, ScanConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(path: P, config: ScanConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
            schema: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn infer_schema(&self) -> Result<Schema> {
        let (schema, _) = Format::default()
            .with_header(true)
            .infer_schema(File::open(&self.path)?, Some(SCHEMA_INFERENCE_ROWS))?;
        Schema::try_from(&schema)
    }
}

impl DataSource for CsvDataSource {
    fn schema(&self) -> Result<SchemaRef> {
        if let Some(schema) = self.schema.get() {
            return Ok(schema.clone());
        }
        let schema = Arc::new(self.infer_schema()?);
        Ok(self.schema.get_or_init(|| schema).clone())
    }

    fn scan(&self, projection: &[String]) -> Result<Vec<RecordBatch>> {
        let schema = self.schema()?;

        let mut builder = ReaderBuilder::new(schema.to_arrow())
            .with_header(true)
            .with_batch_size(self.config.batch_size);
        if !projection.is_empty() {
            builder = builder.with_projection(projection_indices(&schema, projection));
        }

        let mut batches = Vec::new();
        for batch in builder.build(File::open(&self.path)?)? {
            batches.push(RecordBatch::from_arrow(&batch?)?);
        }

        debug!(
            path = %self.path.display(),
            batches = batches.len(),
            rows = batches.iter().map(|b| b.num_rows()).sum::<usize>(),
            "read csv file"
        );
        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::field_names;
    use crate::types::{ArrowType, ScalarValue};
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("employee.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    const EMPLOYEE_CSV: &str = "id,country,salary\n1,ES,100\n2,ES,200\n3,FR,50\n4,ES,300\n";

    #[test]
    fn test_infers_schema() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvDataSource::new(write_csv(&dir, EMPLOYEE_CSV));
        let schema = source.schema().unwrap();
        assert_eq!(field_names(&schema), vec!["id", "country", "salary"]);
        assert_eq!(schema.fields()[0].data_type(), ArrowType::Int64);
        assert_eq!(schema.fields()[1].data_type(), ArrowType::Utf8);
    }

    #[test]
    fn test_schema_is_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, EMPLOYEE_CSV);
        let source = CsvDataSource::new(&path);
        let first = source.schema().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &source.schema().unwrap()));
    }

    #[test]
    fn test_scan_with_projection() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvDataSource::with_config(
            write_csv(&dir, EMPLOYEE_CSV),
            ScanConfig {
                batch_size: 3,
                ..ScanConfig::default()
            },
        );
        let batches = source
            .scan(&["salary".to_string(), "country".to_string()])
            .unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(field_names(batches[0].schema()), vec!["country", "salary"]);
        assert_eq!(
            batches[1].column(1).unwrap().get_value(0).unwrap(),
            Some(ScalarValue::Int64(300))
        );
    }
}
