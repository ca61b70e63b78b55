use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use super::model::FeatureMatrix;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Write a feature matrix to disk.  Dispatch by extension.
///
/// * `.csv`            – header `file,<columns…>`, one line per row
/// * `.parquet`/`.pq`  – `file` Utf8 column plus one Float64 column each
pub fn write_matrix(matrix: &FeatureMatrix, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => write_csv(matrix, path),
        "parquet" | "pq" => write_parquet(matrix, path),
        other => bail!("Unsupported output extension: .{other}"),
    }
}

pub fn write_csv(matrix: &FeatureMatrix, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV output")?;
    writer
        .write_record(matrix.header())
        .context("writing CSV header")?;
    for (file, row) in matrix.files.iter().zip(&matrix.values) {
        let record = std::iter::once(file.clone()).chain(row.iter().map(|v| v.to_string()));
        writer.write_record(record).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

pub fn write_parquet(matrix: &FeatureMatrix, path: &Path) -> Result<()> {
    let batch = to_record_batch(matrix)?;
    let file = std::fs::File::create(path).context("creating parquet output")?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Columnar view of the matrix: `file` first, then every feature.
pub fn to_record_batch(matrix: &FeatureMatrix) -> Result<RecordBatch> {
    let mut fields = vec![Field::new(FeatureMatrix::FILE_COLUMN, DataType::Utf8, false)];
    fields.extend(
        matrix
            .columns
            .iter()
            .map(|c| Field::new(c.as_str(), DataType::Float64, false)),
    );
    let schema = Arc::new(Schema::new(fields));

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(matrix.width() + 1);
    arrays.push(Arc::new(StringArray::from(
        matrix.files.iter().map(String::as_str).collect::<Vec<_>>(),
    )));
    for col in 0..matrix.width() {
        let values: Vec<f64> = matrix.values.iter().map(|row| row[col]).collect();
        arrays.push(Arc::new(Float64Array::from(values)));
    }

    RecordBatch::try_new(schema, arrays).context("building record batch")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureMatrix {
        let mut m = FeatureMatrix::with_columns(vec!["(0.996, 2.0]".into(), "(2.0, 3.0]".into()]);
        m.push_row("a.pdf", vec![10.0, 0.0]);
        m.push_row("b.pdf", vec![0.0, 2.5]);
        m
    }

    #[test]
    fn csv_round_trips_header_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_matrix(&sample(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("file,\"(0.996, 2.0]\",\"(2.0, 3.0]\""));
        assert_eq!(lines.next(), Some("a.pdf,10,0"));
        assert_eq!(lines.next(), Some("b.pdf,0,2.5"));
    }

    #[test]
    fn record_batch_has_file_column_first() {
        let batch = to_record_batch(&sample()).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 3);
        assert_eq!(batch.schema().field(0).name(), "file");
        assert_eq!(batch.schema().field(2).data_type(), &DataType::Float64);
    }

    #[test]
    fn parquet_output_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.parquet");
        write_matrix(&sample(), &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        assert!(write_matrix(&sample(), &dir.path().join("out.xlsx")).is_err());
    }
}
