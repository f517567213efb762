use thiserror::Error;

use crate::{acu::scanner::BlockKind, domain::Category};

/// Errors raised while reading ACU text.
///
/// Every variant carries the 1-based source line of the offending block or
/// value. A malformed document fails as a whole; nothing is recovered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The text does not form well-delimited blocks.
    #[error("line {line}: malformed block: {reason}")]
    MalformedBlock {
        /// Line the problem was detected on.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// A block marker is not one of the recognized kinds.
    #[error("line {line}: unknown block type '@{marker}'")]
    UnknownBlockType {
        /// Line of the marker.
        line: usize,
        /// The marker, without its `@`.
        marker: String,
    },

    /// A block holds a field its kind does not define.
    #[error("line {line}: unknown field '{field}' in {block} block")]
    UnknownField {
        /// Kind of the enclosing block.
        block: BlockKind,
        /// Line of the field.
        line: usize,
        /// The field name as written.
        field: String,
    },

    /// A field is given more than once, possibly under different aliases.
    #[error("line {line}: field '{field}' is given more than once in {block} block")]
    DuplicateField {
        /// Kind of the enclosing block.
        block: BlockKind,
        /// Line of the repeated occurrence.
        line: usize,
        /// Canonical field name.
        field: &'static str,
    },

    /// A required field is absent.
    #[error("line {line}: {block} block is missing required field '{field}'")]
    MissingField {
        /// Kind of the block.
        block: BlockKind,
        /// Line of the block.
        line: usize,
        /// Canonical field name.
        field: &'static str,
    },

    /// A value does not convert to the type its field requires.
    #[error("line {line}: field '{field}' in {block} block: expected {expected}, found '{found}'")]
    FieldType {
        /// Kind of the enclosing block.
        block: BlockKind,
        /// Line of the value.
        line: usize,
        /// Canonical field name.
        field: &'static str,
        /// Description of the expected type.
        expected: &'static str,
        /// The value as written.
        found: String,
    },

    /// A title's level is not an integer between 1 and the deepest level.
    #[error("line {line}: invalid title level '{level}', expected 1 to {max}")]
    InvalidLevel {
        /// Line of the title block.
        line: usize,
        /// The level as written.
        level: String,
        /// Deepest allowed level.
        max: usize,
    },

    /// A resource entry lacks its code or description.
    #[error("line {line}: {category} entry {entry} is missing required field '{field}'")]
    ResourceFieldMissing {
        /// Line of the entry.
        line: usize,
        /// Category list holding the entry.
        category: Category,
        /// 1-based index of the entry within its category.
        entry: usize,
        /// Canonical field name.
        field: &'static str,
    },

    /// The document has no budget block.
    #[error("document has no budget block")]
    MissingBudget,

    /// The document has more than one budget block.
    #[error("line {line}: second budget block, the first one is at line {first}")]
    DuplicateBudget {
        /// Line of the extra budget block.
        line: usize,
        /// Line of the first budget block.
        first: usize,
    },
}

impl ParseError {
    /// Line the error refers to, if any.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedBlock { line, .. }
            | Self::UnknownBlockType { line, .. }
            | Self::UnknownField { line, .. }
            | Self::DuplicateField { line, .. }
            | Self::MissingField { line, .. }
            | Self::FieldType { line, .. }
            | Self::InvalidLevel { line, .. }
            | Self::ResourceFieldMissing { line, .. }
            | Self::DuplicateBudget { line, .. } => Some(*line),
            Self::MissingBudget => None,
        }
    }
}
