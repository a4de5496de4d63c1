//! SRT block parsing and serialization.
//!
//! Parsing is best-effort: a block needs an index line, a timestamp line and
//! at least one text line. Neither the index nor the timestamp is validated.

use regex::Regex;
use std::sync::LazyLock;

static BLOCK_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\n+").expect("block separator pattern is valid"));

/// One subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionBlock {
    pub index: String,
    pub timestamp: String,
    pub text: String,
}

impl CaptionBlock {
    pub fn render(&self) -> String {
        format!("{}\n{}\n{}", self.index, self.timestamp, self.text)
    }

    /// Same index and timestamp, new text
    pub fn with_text(&self, text: String) -> Self {
        Self {
            index: self.index.clone(),
            timestamp: self.timestamp.clone(),
            text,
        }
    }
}

/// A raw block that did not have enough lines to be a caption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedBlock {
    /// 1-based position among the raw blocks of the document
    pub position: usize,
    pub raw: String,
}

/// Parsed subtitle document, in playback order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<CaptionBlock>,
    pub malformed: Vec<MalformedBlock>,
}

impl Document {
    pub fn parse(content: &str) -> Self {
        let mut document = Self::default();

        for (idx, raw) in split_blocks(content).into_iter().enumerate() {
            // Whitespace between separators, or an empty document
            if raw.is_empty() {
                continue;
            }
            match parse_block(&raw) {
                Some(block) => document.blocks.push(block),
                None => document.malformed.push(MalformedBlock {
                    position: idx + 1,
                    raw,
                }),
            }
        }

        document
    }

    pub fn render(&self) -> String {
        render_blocks(&self.blocks)
    }
}

/// Split a document into trimmed raw blocks on runs of blank lines.
pub fn split_blocks(content: &str) -> Vec<String> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    BLOCK_SEPARATOR
        .split(normalized.trim())
        .map(|block| block.trim().to_string())
        .collect()
}

/// Decompose a raw block into index, timestamp and text.
pub fn parse_block(raw: &str) -> Option<CaptionBlock> {
    let lines: Vec<&str> = raw.trim().split('\n').collect();
    if lines.len() < 3 {
        return None;
    }

    Some(CaptionBlock {
        index: lines[0].to_string(),
        timestamp: lines[1].to_string(),
        text: lines[2..].join("\n"),
    })
}

/// Join blocks with a blank line between them, no trailing separator.
pub fn render_blocks(blocks: &[CaptionBlock]) -> String {
    blocks
        .iter()
        .map(CaptionBlock::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}
