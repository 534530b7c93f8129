use crate::error::{LabellerError, Result};
use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
};

/// One fixed-length chunk of text and the name of its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    pub text: String,
    pub label: String,
}

impl ChunkRecord {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LabellerError::io(parent, e))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LabellerError::io(path, e))
}

/// Appends two-column `(text, label)` rows using the Excel CSV dialect.
pub struct RowWriter {
    inner: csv::Writer<File>,
}

impl RowWriter {
    pub fn append(path: &Path) -> Result<Self> {
        let file = open_append(path)?;
        let inner = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);
        Ok(Self { inner })
    }

    pub fn write(&mut self, record: &ChunkRecord) -> Result<()> {
        self.inner
            .write_record([record.text.as_str(), record.label.as_str()])?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.inner.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

/// Appends plain `\n`-terminated lines.
pub struct LineWriter {
    inner: BufWriter<File>,
    path: std::path::PathBuf,
}

impl LineWriter {
    pub fn append(path: &Path) -> Result<Self> {
        Ok(Self {
            inner: BufWriter::new(open_append(path)?),
            path: path.to_path_buf(),
        })
    }

    pub fn write(&mut self, line: &str) -> Result<()> {
        writeln!(self.inner, "{line}").map_err(|e| LabellerError::io(&self.path, e))
    }

    pub fn finish(mut self) -> Result<()> {
        self.inner
            .flush()
            .map_err(|e| LabellerError::io(&self.path, e))
    }
}

/// Bulk-appends already labelled rows to `path`.
pub fn write_rows(path: &Path, rows: &[ChunkRecord]) -> Result<()> {
    let mut writer = RowWriter::append(path)?;
    for row in rows {
        writer.write(row)?;
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_appended_and_quoted_when_needed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debugging.csv");

        write_rows(
            &path,
            &[
                ChunkRecord::new("A positive sentence.", "1.0"),
                ChunkRecord::new("say \"hi\"", "0.0"),
            ],
        )
        .unwrap();
        write_rows(&path, &[ChunkRecord::new("later", "1.0")]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "A positive sentence.,1.0\r\n\"say \"\"hi\"\"\",0.0\r\nlater,1.0\r\n"
        );
    }

    #[test]
    fn every_row_reads_back_as_text_and_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.csv");

        write_rows(
            &path,
            &[
                ChunkRecord::new("plain", "Spam"),
                ChunkRecord::new("with, comma", ""),
                ChunkRecord::new("", "Not Spam"),
            ],
        )
        .unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.len() == 2));
        assert_eq!(&rows[1][0], "with, comma");
        assert_eq!(&rows[1][1], "");
    }

    #[test]
    fn lines_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txc");

        let mut writer = LineWriter::append(&path).unwrap();
        writer.write("a b").unwrap();
        writer.finish().unwrap();
        let mut writer = LineWriter::append(&path).unwrap();
        writer.write("c d").unwrap();
        writer.finish().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a b\nc d\n");
    }
}
