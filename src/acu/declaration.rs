//! Typed decoding of declaration blocks.
//!
//! This is the last stage that looks at a block on its own. Everything that
//! depends on the blocks before it (codes, ownership, defaults) is resolved by
//! the parser.

use crate::{
    acu::{
        ParseError,
        fields::{Body, FieldName, Fields, Scalar, parse_body},
        resources::parse_resources,
        scanner::{Block, BlockKind},
    },
    domain::{Resources, code::MAX_LEVEL},
};

pub(crate) const NAME: FieldName = FieldName::new("name", &["nombre"]);
pub(crate) const CLIENT: FieldName = FieldName::new("client", &["cliente"]);
pub(crate) const LOCATION: FieldName = FieldName::new("location", &["lugar"]);
pub(crate) const CURRENCY: FieldName = FieldName::new("currency", &["moneda"]);
pub(crate) const DESCRIPTION: FieldName =
    FieldName::new("description", &["descripcion", "desc"]);
pub(crate) const UNIT: FieldName = FieldName::new("unit", &["unidad"]);
pub(crate) const YIELD: FieldName = FieldName::new("yield", &["rendimiento"]);

/// A decoded block, before codes and ownership are assigned.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `@budget{code, ...}`
    Budget {
        /// Header code.
        code: String,
        /// Display name.
        name: String,
        /// Optional client.
        client: Option<String>,
        /// Optional location.
        location: Option<String>,
        /// Currency, if written.
        currency: Option<String>,
    },
    /// `@subbudget{code, ...}`
    SubBudget {
        /// Header code.
        code: String,
        /// Display name.
        name: String,
    },
    /// `@title{level, ...}`
    Title {
        /// Validated level, 1 to [`MAX_LEVEL`].
        level: u8,
        /// Display name.
        name: String,
    },
    /// `@lineitem{...}`
    LineItem {
        /// Description of the work.
        description: String,
        /// Unit of measure.
        unit: String,
        /// Yield, if written.
        yield_factor: Option<f64>,
        /// Resource lists.
        resources: Resources,
    },
}

impl Declaration {
    /// Decodes a scanned block.
    ///
    /// # Errors
    ///
    /// Fails on malformed field syntax, a missing header or required field,
    /// an unknown or duplicated field, a value of the wrong type, an invalid
    /// title level or an incomplete resource entry.
    pub fn decode(block: &Block) -> Result<Self, ParseError> {
        let Body { header, fields } = parse_body(block)?;
        let mut fields = Fields::new(block.kind, block.line, fields);

        let declaration = match block.kind {
            BlockKind::Budget => Self::Budget {
                code: require_header(block, header, "code")?.raw,
                name: fields.require_text(NAME)?,
                client: fields.text(CLIENT)?,
                location: fields.text(LOCATION)?,
                currency: fields.text(CURRENCY)?,
            },
            BlockKind::SubBudget => Self::SubBudget {
                code: require_header(block, header, "code")?.raw,
                name: fields.require_text(NAME)?,
            },
            BlockKind::Title => Self::Title {
                level: level(block, header)?,
                name: fields.require_text(NAME)?,
            },
            // the header of a line item is a free-form label and is dropped
            BlockKind::LineItem => Self::LineItem {
                description: fields.require_text(DESCRIPTION)?,
                unit: fields.require_text(UNIT)?,
                yield_factor: fields.number(YIELD)?,
                resources: parse_resources(&mut fields)?,
            },
        };

        fields.finish()?;
        Ok(declaration)
    }
}

fn require_header(
    block: &Block,
    header: Option<Scalar>,
    field: &'static str,
) -> Result<Scalar, ParseError> {
    header.ok_or(ParseError::MissingField {
        block: block.kind,
        line: block.line,
        field,
    })
}

fn level(block: &Block, header: Option<Scalar>) -> Result<u8, ParseError> {
    let header = require_header(block, header, "level")?;
    header
        .raw
        .parse::<u8>()
        .ok()
        .filter(|level| (1..=MAX_LEVEL).contains(&usize::from(*level)))
        .ok_or(ParseError::InvalidLevel {
            line: header.line,
            level: header.raw,
            max: MAX_LEVEL,
        })
}
