//! CSV Result Table
//!
//! Excel-dialect CSV: comma delimited, `\n` line endings, fields quoted only
//! when they contain the delimiter, a quote or a line break.

use pinbench_core::ResultRecord;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Streaming writer for the result table
pub struct CsvTable<W: Write> {
    writer: W,
    columns: Vec<String>,
    rows: usize,
}

impl CsvTable<BufWriter<File>> {
    /// Create `path` and write the header row.
    pub fn create(path: impl AsRef<Path>, columns: Vec<String>) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), columns)
    }
}

impl<W: Write> CsvTable<W> {
    /// Wrap `writer` and write the header row.
    pub fn new(mut writer: W, columns: Vec<String>) -> io::Result<Self> {
        write_row(&mut writer, columns.iter().map(String::as_str))?;
        Ok(Self {
            writer,
            columns,
            rows: 0,
        })
    }

    /// Header columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Append one record in header order; columns the record lacks stay empty.
    pub fn write_record(&mut self, record: &ResultRecord) -> io::Result<()> {
        let values: Vec<String> = self
            .columns
            .iter()
            .map(|column| record.get(column).map(ToString::to_string).unwrap_or_default())
            .collect();
        write_row(&mut self.writer, values.iter().map(String::as_str))?;
        self.rows += 1;
        Ok(())
    }

    /// Flush buffered rows to the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn write_row<'a, W: Write>(writer: &mut W, fields: impl Iterator<Item = &'a str>) -> io::Result<()> {
    let line = fields.map(escape_field).collect::<Vec<_>>().join(",");
    writeln!(writer, "{line}")
}

/// Quote a field if it needs quoting, doubling embedded quotes.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinbench_core::FieldValue;

    fn columns() -> Vec<String> {
        ["filename", "query", "P(query)", "time"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn header_then_rows() {
        let mut table = CsvTable::new(Vec::new(), columns()).unwrap();
        let record = ResultRecord::with_columns(columns())
            .preset("filename", "models/a#1.blog")
            .preset("query", "query Smokes(A), Cancer(A);")
            .preset("P(query)", 0.25)
            .preset("time", FieldValue::NotApplicable);
        table.write_record(&record).unwrap();
        assert_eq!(table.rows(), 1);

        let text = String::from_utf8(table.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "filename,query,P(query),time\nmodels/a#1.blog,\"query Smokes(A), Cancer(A);\",0.25,-2\n"
        );
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("{A:0.1;B:0.2}"), "{A:0.1;B:0.2}");
    }
}
