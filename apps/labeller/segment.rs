use crate::{
    config::LabellerConfig,
    error::{LabellerError, Result},
    writer::{ChunkRecord, LineWriter, RowWriter, write_rows},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Splits `text` on whitespace into records of exactly `chunk_size` tokens.
/// Commas are stripped from each record and the trailing partial chunk is dropped.
pub fn segment(text: &str, chunk_size: usize) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(LabellerError::ZeroChunkSize);
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    Ok(tokens
        .chunks_exact(chunk_size)
        .map(|chunk| chunk.join(" ").replace(',', ""))
        .collect())
}

/// `text_from_papers.txt.example` -> `text_from_papers`
fn output_stem(file_name: &str) -> &str {
    file_name.split(".txt").next().unwrap_or(file_name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub records: usize,
    pub dropped_tokens: usize,
}

pub struct Segmenter {
    datasets_dir: PathBuf,
    max_sentence_length: usize,
    output_labels: Vec<String>,
}

impl Segmenter {
    pub fn new(
        datasets_dir: impl Into<PathBuf>,
        max_sentence_length: usize,
        output_labels: Vec<String>,
    ) -> Self {
        Self {
            datasets_dir: datasets_dir.into(),
            max_sentence_length,
            output_labels,
        }
    }

    pub fn from_config(config: &LabellerConfig) -> Self {
        Self::new(
            &config.datasets_dir,
            config.max_sentence_length,
            config.output_labels.clone(),
        )
    }

    fn label_name(&self, index: usize) -> Result<&str> {
        self.output_labels
            .get(index)
            .map(String::as_str)
            .ok_or(LabellerError::UnknownLabel {
                index,
                available: self.output_labels.len(),
            })
    }

    /// Cuts `<datasets_dir>/<file_name>` into fixed-length records.
    ///
    /// Without a label the records go to `<stem>.txc`, one per line. With a
    /// label index they go to `<stem>.csv` as `(text, label name)` rows. Both
    /// outputs are appended to, never truncated.
    #[instrument(skip(self), fields(max_sentence_length = self.max_sentence_length))]
    pub fn clean(&self, file_name: &str, label: Option<usize>) -> Result<CleanSummary> {
        let label_name = label.map(|index| self.label_name(index)).transpose()?;

        let input = self.datasets_dir.join(file_name);
        let text = fs::read_to_string(&input).map_err(|e| LabellerError::io(&input, e))?;
        let total_tokens = text.split_whitespace().count();
        let records = segment(&text, self.max_sentence_length)?;

        let stem = output_stem(file_name);
        let output = match label_name {
            None => {
                let output = self.datasets_dir.join(format!("{stem}.txc"));
                let mut writer = LineWriter::append(&output)?;
                for record in &records {
                    writer.write(record)?;
                    debug!(record = %record, "Wrote");
                }
                writer.finish()?;
                output
            }
            Some(label_name) => {
                let output = self.datasets_dir.join(format!("{stem}.csv"));
                let mut writer = RowWriter::append(&output)?;
                for record in records.iter() {
                    writer.write(&ChunkRecord::new(record.as_str(), label_name))?;
                    debug!(label = label_name, record = %record, "Wrote");
                }
                writer.finish()?;
                output
            }
        };

        let summary = CleanSummary {
            input,
            output,
            records: records.len(),
            dropped_tokens: total_tokens - records.len() * self.max_sentence_length,
        };
        info!(
            file_name,
            records = summary.records,
            dropped_tokens = summary.dropped_tokens,
            output = %summary.output.display(),
            "Cleaned and written to disk"
        );
        Ok(summary)
    }

    /// Runs [`Segmenter::clean`] over every `*.txt` file in the datasets
    /// directory, in name order. A file that fails is logged and skipped.
    pub fn clean_all(&self, label: Option<usize>) -> Result<Vec<CleanSummary>> {
        let entries = fs::read_dir(&self.datasets_dir)
            .map_err(|e| LabellerError::io(&self.datasets_dir, e))?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "txt"))
            .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();
        names.sort();

        let mut summaries = Vec::with_capacity(names.len());
        for name in names {
            match self.clean(&name, label) {
                Ok(summary) => summaries.push(summary),
                Err(e) => warn!(file_name = %name, error = %e, "Skipping file"),
            }
        }
        Ok(summaries)
    }

    /// Bulk-appends pre-labelled rows to `<datasets_dir>/<file_name>`.
    pub fn write_rows(&self, rows: &[ChunkRecord], file_name: &str) -> Result<()> {
        write_rows(&self.datasets_dir.join(file_name), rows)
    }

    pub fn datasets_dir(&self) -> &Path {
        &self.datasets_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn chunks_strip_commas_and_drop_remainder() {
        let records = segment("a b, c d e", 2).unwrap();
        assert_eq!(records, vec!["a b", "c d"]);
    }

    #[test]
    fn lines_are_joined_before_splitting() {
        let records = segment("one two\nthree\r\nfour five\n", 2).unwrap();
        assert_eq!(records, vec!["one two", "three four"]);
    }

    #[test]
    fn exact_multiple_keeps_last_chunk() {
        assert_eq!(segment("a b c d", 2).unwrap().len(), 2);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(matches!(segment("a b", 0), Err(LabellerError::ZeroChunkSize)));
    }

    #[test]
    fn stem_cuts_at_first_txt() {
        assert_eq!(output_stem("text_from_papers.txt.example"), "text_from_papers");
        assert_eq!(output_stem("tech.txt"), "tech");
        assert_eq!(output_stem("notes"), "notes");
    }

    proptest! {
        #[test]
        fn emits_floor_l_over_n_records_of_n_tokens(
            tokens in prop::collection::vec("[a-z]{1,6}", 0..200),
            chunk_size in 1usize..20,
        ) {
            let text = tokens.join(" ");
            let records = segment(&text, chunk_size).unwrap();

            prop_assert_eq!(records.len(), tokens.len() / chunk_size);
            for (i, record) in records.iter().enumerate() {
                let expected = tokens[i * chunk_size..(i + 1) * chunk_size].join(" ");
                prop_assert_eq!(record, &expected);
            }
        }
    }
}
