//! Text cleaning and windowed splitting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{PreprocessError, PreprocessResult};
use super::Preprocessor;
use crate::core::models::{Document, SPLIT_ID_KEY};

/// Unit a document is split into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitBy {
    #[default]
    Word,
    Sentence,
    Passage,
}

impl SplitBy {
    fn separator(&self) -> &'static str {
        match self {
            Self::Word | Self::Sentence => " ",
            Self::Passage => "\n\n",
        }
    }
}

impl fmt::Display for SplitBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Word => "word",
            Self::Sentence => "sentence",
            Self::Passage => "passage",
        };
        f.write_str(name)
    }
}

impl FromStr for SplitBy {
    type Err = PreprocessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" | "words" => Ok(Self::Word),
            "sentence" | "sentences" => Ok(Self::Sentence),
            "passage" | "passages" | "paragraph" => Ok(Self::Passage),
            other => Err(PreprocessError::UnknownSplitUnit(other.to_string())),
        }
    }
}

/// Splitter settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub clean_whitespace: bool,
    pub clean_empty_lines: bool,
    pub split_by: SplitBy,
    /// Units per produced document
    pub split_length: usize,
    /// Units shared between consecutive documents
    pub split_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            clean_whitespace: true,
            clean_empty_lines: true,
            split_by: SplitBy::Word,
            split_length: 200,
            split_overlap: 0,
        }
    }
}

/// Cleans document text and splits it into overlapping windows.
#[derive(Clone, Debug)]
pub struct DocumentSplitter {
    config: SplitterConfig,
}

impl DocumentSplitter {
    /// # Errors
    ///
    /// `split_length` must be positive and larger than `split_overlap`.
    pub fn new(config: SplitterConfig) -> PreprocessResult<Self> {
        if config.split_length == 0 {
            return Err(PreprocessError::invalid_config("split_length must be at least 1"));
        }
        if config.split_overlap >= config.split_length {
            return Err(PreprocessError::invalid_config(format!(
                "split_overlap ({}) must be smaller than split_length ({})",
                config.split_overlap, config.split_length
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Apply the configured cleaning steps.
    pub fn clean(&self, text: &str) -> String {
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();

        if self.config.clean_whitespace {
            lines = lines
                .iter()
                .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
                .collect();
        }

        if self.config.clean_empty_lines {
            let mut kept: Vec<String> = Vec::with_capacity(lines.len());
            for line in lines {
                let blank = line.trim().is_empty();
                let previous_blank = kept.last().map_or(true, |l| l.trim().is_empty());
                if blank && previous_blank {
                    continue;
                }
                kept.push(line);
            }
            lines = kept;
        }

        lines.join("\n").trim().to_string()
    }

    /// Break cleaned text into units.
    fn units<'t>(&self, text: &'t str) -> Vec<&'t str> {
        match self.config.split_by {
            SplitBy::Word => text.split_whitespace().collect(),
            SplitBy::Sentence => split_sentences(text),
            SplitBy::Passage => text
                .split("\n\n")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Windowed chunks of the cleaned text.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let cleaned = self.clean(text);
        let units = self.units(&cleaned);
        if units.is_empty() {
            return Vec::new();
        }

        let length = self.config.split_length;
        let step = length - self.config.split_overlap;
        let separator = self.config.split_by.separator();

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + length).min(units.len());
            chunks.push(units[start..end].join(separator));
            if end == units.len() {
                break;
            }
            start += step;
        }
        chunks
    }
}

impl Preprocessor for DocumentSplitter {
    fn process(&self, document: Document) -> PreprocessResult<Vec<Document>> {
        let chunks = self.split_text(&document.content);
        Ok(chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                Document::new(chunk)
                    .with_meta(document.meta.clone())
                    .with_meta_entry(SPLIT_ID_KEY, i)
            })
            .collect())
    }
}

/// Sentence boundaries: `.`, `!` or `?` followed by whitespace or end of text.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_boundary {
                let end = i + c.len_utf8();
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = end;
            }
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}
