//! Splitting line text into addressable elements, and putting it back.
//!
//! Decomposition splits on the single separator `' '`, keeping empty pieces,
//! so it is exactly inverted by joining the pieces with `' '` again:
//!
//! ```
//! use promptly::domain::decompose::{decompose, reconstruct, DecomposeOptions};
//!
//! let text = "LX Q5  standby GO";
//! let tokens = decompose(text, DecomposeOptions::default());
//! assert_eq!(tokens.len(), 5);
//! assert_eq!(reconstruct(tokens.iter().map(|t| (t.position, t.text))), text);
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::kinds::ElementType;

/// The separator between elements.
pub const SEPARATOR: char = ' ';

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\p{P}+$").expect("punctuation pattern is valid"));

/// Knobs for decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecomposeOptions {
    /// Type tokens made only of punctuation as [`ElementType::Punctuation`]
    /// rather than [`ElementType::Word`].
    pub classify_punctuation: bool,
}

impl Default for DecomposeOptions {
    fn default() -> Self {
        Self {
            classify_punctuation: true,
        }
    }
}

/// One piece of a decomposed line, borrowing from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Zero-based index in split order.
    pub position: usize,
    /// The piece of text, empty for a space.
    pub text: &'a str,
    /// How the piece was classified.
    pub kind: ElementType,
}

/// Classify a single piece of split text.
#[must_use]
pub fn classify(text: &str, options: DecomposeOptions) -> ElementType {
    if text.is_empty() {
        ElementType::Space
    } else if options.classify_punctuation && PUNCTUATION.is_match(text) {
        ElementType::Punctuation
    } else {
        ElementType::Word
    }
}

/// Split `text` into tokens at positions `0..n`.
///
/// Always yields at least one token: the empty string decomposes into a
/// single space.
#[must_use]
pub fn decompose(text: &str, options: DecomposeOptions) -> Vec<Token<'_>> {
    text.split(SEPARATOR)
        .enumerate()
        .map(|(position, text)| Token {
            position,
            text,
            kind: classify(text, options),
        })
        .collect()
}

/// Join pieces in ascending position order with a single separator.
///
/// The pieces need not arrive sorted.
pub fn reconstruct<'a, I>(pieces: I) -> String
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut pieces: Vec<_> = pieces.into_iter().collect();
    pieces.sort_by_key(|(position, _)| *position);

    let mut out = String::new();
    for (i, (_, text)) in pieces.into_iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(text);
    }
    out
}
