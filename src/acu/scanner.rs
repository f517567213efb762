//! Splits a token stream into top-level declaration blocks.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::acu::{
    ParseError,
    lexer::{Spanned, Token},
};

/// The four kinds of declaration block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// `@budget`
    Budget,
    /// `@subbudget`
    SubBudget,
    /// `@title`
    Title,
    /// `@lineitem`
    LineItem,
}

impl BlockKind {
    /// The marker written for this kind, without the `@`.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::SubBudget => "subbudget",
            Self::Title => "title",
            Self::LineItem => "lineitem",
        }
    }

    /// Recognizes a marker, accepting the Spanish keywords and a hyphenated
    /// `sub-budget`/`line-item` spelling.
    #[must_use]
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "budget" | "presupuesto" => Some(Self::Budget),
            "subbudget" | "sub-budget" | "subpresupuesto" => Some(Self::SubBudget),
            "title" | "titulo" => Some(Self::Title),
            "lineitem" | "line-item" | "partida" => Some(Self::LineItem),
            _ => None,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A declaration block: its kind, the line of its marker, and the tokens
/// between its outer braces.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Kind of the block.
    pub kind: BlockKind,
    /// Line of the block marker.
    pub line: usize,
    /// Tokens strictly inside the outer braces.
    pub body: Vec<Spanned>,
}

/// Groups tokens into blocks, matching nested braces.
///
/// # Errors
///
/// - [`ParseError::UnknownBlockType`] for a marker that is not one of the
///   four kinds.
/// - [`ParseError::MalformedBlock`] for tokens outside any block, a marker not
///   followed by `{`, unbalanced braces, or a block that does not close before
///   the next marker or the end of the input.
pub fn scan(tokens: Vec<Spanned>) -> Result<Vec<Block>, ParseError> {
    let mut blocks = Vec::new();
    let mut tokens = tokens.into_iter().peekable();

    while let Some(Spanned { token, line }) = tokens.next() {
        let marker = match token {
            Token::Marker(marker) => marker,
            other => {
                return Err(ParseError::MalformedBlock {
                    line,
                    reason: format!("expected a block marker, found '{}'", other.describe()),
                });
            }
        };
        let kind = BlockKind::from_marker(&marker)
            .ok_or(ParseError::UnknownBlockType { line, marker })?;

        match tokens.next() {
            Some(Spanned {
                token: Token::OpenBrace,
                ..
            }) => {}
            other => {
                return Err(ParseError::MalformedBlock {
                    line: other.as_ref().map_or(line, |spanned| spanned.line),
                    reason: format!("expected '{{' after @{kind}"),
                });
            }
        }

        let mut depth = 0_usize;
        let mut body = Vec::new();
        loop {
            let Some(spanned) = tokens.next() else {
                return Err(unterminated(kind, line));
            };
            match spanned.token {
                Token::OpenBrace => depth += 1,
                Token::CloseBrace if depth == 0 => break,
                Token::CloseBrace => depth -= 1,
                Token::Marker(_) => return Err(unterminated(kind, line)),
                _ => {}
            }
            body.push(spanned);
        }

        debug!(%kind, line, tokens = body.len(), "scanned block");
        blocks.push(Block { kind, line, body });
    }

    Ok(blocks)
}

fn unterminated(kind: BlockKind, line: usize) -> ParseError {
    ParseError::MalformedBlock {
        line,
        reason: format!("@{kind} block is never closed"),
    }
}
