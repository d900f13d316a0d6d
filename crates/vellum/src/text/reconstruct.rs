use crate::error::VellumError;
use crate::types::OcrToken;
use serde::Serialize;
use std::fmt;

/// Hierarchy level at which a token stream went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLevel {
    Block,
    Paragraph,
    Line,
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Block => "block",
            Self::Paragraph => "paragraph",
            Self::Line => "line",
        })
    }
}

/// Where and why reconstruction stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Truncation {
    /// Index of the first token that was not consumed.
    pub position: usize,
    pub level: HierarchyLevel,
    /// Index the token asked for.
    pub requested: usize,
    /// Number of containers that existed at that level.
    pub available: usize,
}

impl Truncation {
    pub fn to_error(&self) -> VellumError {
        VellumError::MalformedTokenStream {
            position: self.position,
            message: format!(
                "{} index {} skips past {} existing {}(s)",
                self.level, self.requested, self.available, self.level
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Line {
    pub words: Vec<String>,
}

impl Line {
    pub fn text(&self) -> String {
        self.words.join(" ").trim().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub lines: Vec<Line>,
}

impl Paragraph {
    pub fn text(&self) -> String {
        join_trimmed(self.lines.iter().map(Line::text))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Block {
    pub paragraphs: Vec<Paragraph>,
}

impl Block {
    pub fn text(&self) -> String {
        join_trimmed(self.paragraphs.iter().map(Paragraph::text))
    }
}

/// A page rebuilt from its token stream: blocks of paragraphs of lines of words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub blocks: Vec<Block>,
    /// Set when the stream violated the hierarchy and the rest was dropped.
    pub truncation: Option<Truncation>,
}

impl Document {
    /// Plain text: words joined by spaces, everything above by newlines,
    /// trimmed at every level. Empty containers keep their slot.
    pub fn text(&self) -> String {
        join_trimmed(self.blocks.iter().map(Block::text))
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn paragraph_count(&self) -> usize {
        self.blocks.iter().map(|b| b.paragraphs.len()).sum()
    }

    pub fn line_count(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|b| &b.paragraphs)
            .map(|p| p.lines.len())
            .sum()
    }

    pub fn word_count(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|b| &b.paragraphs)
            .flat_map(|p| &p.lines)
            .map(|l| l.words.iter().filter(|w| !w.is_empty()).count())
            .sum()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncation.is_some()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

fn join_trimmed(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join("\n").trim().to_string()
}

/// Resolve `index` against `containers`: append when it is the next slot,
/// address an existing one when lower, refuse when it skips ahead.
fn slot<T: Default>(containers: &mut Vec<T>, index: usize) -> Option<&mut T> {
    if index == containers.len() {
        containers.push(T::default());
    }
    containers.get_mut(index)
}

/// Rebuild the page hierarchy from a flat token stream in one pass.
///
/// Each token's block, paragraph and line indices are resolved in that order.
/// An index equal to the current number of containers opens a new one, a
/// lower index addresses an existing one, and a higher index is a gap: the
/// remaining stream is dropped and the partial document is returned with a
/// [`Truncation`] record.
///
/// Structural tokens with empty text land in their slot like any other token;
/// they vanish in the trimmed text output.
///
/// # Example
///
/// ```rust
/// use vellum::text::reconstruct;
/// use vellum::types::OcrToken;
///
/// let tokens = vec![
///     OcrToken::word("Hello", 0, 0, 0),
///     OcrToken::word("world", 0, 0, 0),
///     OcrToken::word("Bye", 0, 0, 1),
/// ];
/// assert_eq!(reconstruct(&tokens).text(), "Hello world\nBye");
/// ```
pub fn reconstruct(tokens: &[OcrToken]) -> Document {
    let mut document = Document::default();

    for (position, token) in tokens.iter().enumerate() {
        let gap = |level, requested, available| Truncation {
            position,
            level,
            requested,
            available,
        };

        let available = document.blocks.len();
        let Some(block) = slot(&mut document.blocks, token.block_index) else {
            document.truncation = Some(gap(HierarchyLevel::Block, token.block_index, available));
            break;
        };

        let available = block.paragraphs.len();
        let Some(paragraph) = slot(&mut block.paragraphs, token.paragraph_index) else {
            document.truncation = Some(gap(HierarchyLevel::Paragraph, token.paragraph_index, available));
            break;
        };

        let available = paragraph.lines.len();
        let Some(line) = slot(&mut paragraph.lines, token.line_index) else {
            document.truncation = Some(gap(HierarchyLevel::Line, token.line_index, available));
            break;
        };

        line.words.push(token.text.clone());
    }

    if let Some(truncation) = &document.truncation {
        tracing::warn!(
            position = truncation.position,
            total = tokens.len(),
            error = %truncation.to_error(),
            "token stream truncated, keeping partial text"
        );
    }

    document
}
