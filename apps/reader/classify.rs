use crate::{
    error::{ReaderError, Result},
    fetcher::PageSink,
    models::listing::Post,
    normalize::{ExtractMode, extract_text},
    sink,
};
use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    io::{BufRead, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

pub const SKIP_KEY: char = '0';

/// Single-character keys mapped to the file each class is appended to.
#[derive(Debug, Clone)]
pub struct ClassMap {
    classes: BTreeMap<char, PathBuf>,
}

impl ClassMap {
    pub fn new(entries: impl IntoIterator<Item = (char, PathBuf)>) -> Result<Self> {
        let classes: BTreeMap<char, PathBuf> = entries.into_iter().collect();
        if classes.contains_key(&SKIP_KEY) {
            return Err(ReaderError::Config(format!(
                "'{SKIP_KEY}' is reserved for skipping and cannot name a class"
            )));
        }
        if classes.is_empty() {
            return Err(ReaderError::Config("at least one class is required".to_string()));
        }
        Ok(Self { classes })
    }

    pub fn path(&self, key: char) -> Option<&Path> {
        self.classes.get(&key).map(PathBuf::as_path)
    }

    fn prompt(&self) -> String {
        let mut prompt =
            format!("This text can be classified as one of the following, or {SKIP_KEY} to skip: \n");
        for (key, path) in &self.classes {
            prompt.push_str(&format!("{key} for {}\n", path.display()));
        }
        prompt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Skip,
    Class(char),
}

impl Choice {
    pub fn parse(input: &str, classes: &ClassMap) -> Result<Self> {
        let trimmed = input.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(SKIP_KEY), None) => Ok(Choice::Skip),
            (Some(key), None) if classes.path(key).is_some() => Ok(Choice::Class(key)),
            _ => Err(ReaderError::InvalidChoice(trimmed.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Written { key: char, path: PathBuf },
    Skipped,
    /// The operator closed the input stream.
    Exhausted,
}

pub struct Classifier<R, W> {
    input: R,
    output: W,
    classes: ClassMap,
}

impl<R: BufRead, W: Write> Classifier<R, W> {
    pub fn new(input: R, output: W, classes: ClassMap) -> Self {
        Self {
            input,
            output,
            classes,
        }
    }

    fn say(&mut self, text: &str) -> Result<()> {
        self.output
            .write_all(text.as_bytes())
            .and_then(|_| self.output.flush())
            .map_err(|e| ReaderError::io("<prompt>", e))
    }

    /// Shows `text`, asks for a class and appends it to the chosen file.
    /// Unrecognised answers are rejected and the question is asked again.
    pub async fn classify(&mut self, text: &str) -> Result<Outcome> {
        self.say(&format!("\n====\n{text}\n====\n\n"))?;
        let prompt = self.classes.prompt();

        loop {
            self.say(&prompt)?;
            self.say("Which class does this text belong to? \n>")?;

            let mut answer = String::new();
            let read = self
                .input
                .read_line(&mut answer)
                .map_err(|e| ReaderError::io("<stdin>", e))?;
            if read == 0 {
                return Ok(Outcome::Exhausted);
            }

            match Choice::parse(&answer, &self.classes) {
                Ok(Choice::Skip) => return Ok(Outcome::Skipped),
                Ok(Choice::Class(key)) => {
                    let Some(path) = self.classes.path(key).map(Path::to_path_buf) else {
                        continue;
                    };
                    sink::append_line(&path, text).await?;
                    self.say(&format!("\nWrote to {}\n", path.display()))?;
                    return Ok(Outcome::Written { key, path });
                }
                Err(e) => {
                    warn!(error = %e, "Rejected classification input");
                    self.say(&format!("{e}. Try again.\n"))?;
                }
            }
        }
    }
}

/// Feeds self-posts from the fetch loop to an operator, one at a time.
pub struct SelfPostClassifier<R, W> {
    classifier: Classifier<R, W>,
    evaluated: usize,
    written: usize,
}

impl<R: BufRead, W: Write> SelfPostClassifier<R, W> {
    pub fn new(classifier: Classifier<R, W>) -> Self {
        Self {
            classifier,
            evaluated: 0,
            written: 0,
        }
    }

    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

#[async_trait(?Send)]
impl<R: BufRead, W: Write> PageSink for SelfPostClassifier<R, W> {
    async fn accept(&mut self, source: &str, items: Vec<Post>) -> Result<()> {
        for post in items {
            self.evaluated += 1;
            if !post.is_self {
                continue;
            }

            let text = extract_text(&post, ExtractMode::TitleAndBody);
            match self.classifier.classify(&text).await? {
                Outcome::Written { .. } => self.written += 1,
                Outcome::Skipped => {}
                Outcome::Exhausted => return Err(ReaderError::InputClosed),
            }
            info!(source, evaluated = self.evaluated, written = self.written, "Posts evaluated");
        }
        Ok(())
    }
}
