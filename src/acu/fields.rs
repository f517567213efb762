//! Field extraction from block bodies.
//!
//! A body is an optional positional header token followed by comma-separated
//! `key = value` fields. A value is a scalar (quoted string, number or bare
//! token) or a brace-delimited group, whose items are again fields or nested
//! groups. Values are kept as written; converting them is up to the caller,
//! through [`Fields`].

use crate::acu::{
    ParseError,
    lexer::{Spanned, Token},
    scanner::{Block, BlockKind},
};

/// A single value as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    /// The text of the value, with quotes removed and escapes resolved.
    pub raw: String,
    /// Whether the value was quoted.
    pub quoted: bool,
    /// Line of the value.
    pub line: usize,
}

/// The value of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A string, number or bare token.
    Scalar(Scalar),
    /// A `{ ... }` group.
    Group(Group),
}

impl Value {
    fn describe(&self) -> String {
        match self {
            Self::Scalar(scalar) => scalar.raw.clone(),
            Self::Group(_) => "{...}".to_string(),
        }
    }
}

/// A brace-delimited group of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Line of the opening brace.
    pub line: usize,
    /// Items in the order written.
    pub items: Vec<Item>,
}

/// An item inside a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A `key = value` pair.
    Field(Field),
    /// A nested group without a key.
    Group(Group),
}

/// A `key = value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// The key as written.
    pub key: String,
    /// Line of the key.
    pub line: usize,
    /// The value.
    pub value: Value,
}

/// The parsed body of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    /// Positional token before the first field, such as a budget code or a
    /// title level.
    pub header: Option<Scalar>,
    /// Top-level fields in the order written.
    pub fields: Vec<Field>,
}

/// Parses the body of a block.
///
/// # Errors
///
/// Returns [`ParseError::MalformedBlock`] if the body does not follow the
/// field syntax.
pub fn parse_body(block: &Block) -> Result<Body, ParseError> {
    let mut cursor = Cursor {
        tokens: &block.body,
        pos: 0,
        kind: block.kind,
        line: block.line,
    };

    let mut header = None;
    let mut fields = Vec::new();
    while let Some(spanned) = cursor.peek() {
        if cursor.at_field() {
            fields.push(cursor.field()?);
        } else if header.is_none() && fields.is_empty() && is_scalar(&spanned.token) {
            header = Some(cursor.scalar()?);
        } else {
            return Err(cursor.unexpected(spanned, "expected 'key = value'"));
        }

        match cursor.peek() {
            None => break,
            Some(Spanned {
                token: Token::Comma,
                ..
            }) => cursor.pos += 1,
            Some(other) => return Err(cursor.unexpected(other, "expected ','")),
        }
    }

    Ok(Body { header, fields })
}

const fn is_scalar(token: &Token) -> bool {
    matches!(token, Token::Str(_) | Token::Number(_) | Token::Ident(_))
}

struct Cursor<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    kind: BlockKind,
    line: usize,
}

impl<'t> Cursor<'t> {
    fn peek(&self) -> Option<&'t Spanned> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&'t Spanned> {
        let spanned = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(spanned)
    }

    fn at_field(&self) -> bool {
        matches!(
            (
                self.tokens.get(self.pos).map(|spanned| &spanned.token),
                self.tokens.get(self.pos + 1).map(|spanned| &spanned.token),
            ),
            (Some(Token::Ident(_)), Some(Token::Equals))
        )
    }

    fn unexpected(&self, spanned: &Spanned, expectation: &str) -> ParseError {
        ParseError::MalformedBlock {
            line: spanned.line,
            reason: format!(
                "{expectation} in {} block, found '{}'",
                self.kind,
                spanned.token.describe()
            ),
        }
    }

    fn end_of_block(&self, expectation: &str) -> ParseError {
        ParseError::MalformedBlock {
            line: self.tokens.last().map_or(self.line, |spanned| spanned.line),
            reason: format!("{expectation} before the end of the {} block", self.kind),
        }
    }

    fn scalar(&mut self) -> Result<Scalar, ParseError> {
        let spanned = self
            .bump()
            .ok_or_else(|| self.end_of_block("expected a value"))?;
        let (raw, quoted) = match &spanned.token {
            Token::Str(text) => (text.clone(), true),
            Token::Number(raw) | Token::Ident(raw) => (raw.clone(), false),
            _ => return Err(self.unexpected(spanned, "expected a value")),
        };
        Ok(Scalar {
            raw,
            quoted,
            line: spanned.line,
        })
    }

    // caller has checked `at_field`
    fn field(&mut self) -> Result<Field, ParseError> {
        let (key, line) = match self.bump() {
            Some(Spanned {
                token: Token::Ident(key),
                line,
            }) => (key.clone(), *line),
            _ => return Err(self.end_of_block("expected a field name")),
        };
        self.pos += 1; // '='

        let value = match self.peek() {
            Some(Spanned {
                token: Token::OpenBrace,
                line,
            }) => {
                let line = *line;
                self.pos += 1;
                Value::Group(self.group(line)?)
            }
            Some(_) => Value::Scalar(self.scalar()?),
            None => return Err(self.end_of_block(&format!("expected a value for '{key}'"))),
        };

        Ok(Field { key, line, value })
    }

    // the opening brace has been consumed
    fn group(&mut self, line: usize) -> Result<Group, ParseError> {
        let mut items = Vec::new();
        loop {
            let Some(spanned) = self.peek() else {
                return Err(self.end_of_block("expected '}'"));
            };
            match spanned.token {
                Token::CloseBrace => {
                    self.pos += 1;
                    return Ok(Group { line, items });
                }
                Token::OpenBrace => {
                    self.pos += 1;
                    items.push(Item::Group(self.group(spanned.line)?));
                }
                _ if self.at_field() => items.push(Item::Field(self.field()?)),
                _ => return Err(self.unexpected(spanned, "expected 'key = value' or '{'")),
            }

            match self.peek() {
                Some(Spanned {
                    token: Token::Comma,
                    ..
                }) => self.pos += 1,
                Some(Spanned {
                    token: Token::CloseBrace,
                    ..
                }) => {}
                Some(other) => return Err(self.unexpected(other, "expected ',' or '}'")),
                None => return Err(self.end_of_block("expected '}'")),
            }
        }
    }
}

/// A field name with the alternative spellings it is accepted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldName {
    /// The name written by the serializer and used in diagnostics.
    pub canonical: &'static str,
    /// Other accepted spellings.
    pub aliases: &'static [&'static str],
}

impl FieldName {
    /// A field name with its aliases.
    #[must_use]
    pub const fn new(canonical: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { canonical, aliases }
    }

    fn matches(&self, key: &str) -> bool {
        self.canonical == key || self.aliases.contains(&key)
    }
}

/// Typed access to the fields of one block or group.
///
/// Each field is taken at most once; whatever is left when the block has been
/// decoded is reported by [`Fields::finish`].
#[derive(Debug)]
pub struct Fields {
    block: BlockKind,
    line: usize,
    fields: Vec<Option<Field>>,
}

impl Fields {
    /// Wraps the fields of a block (or of a group inside it) starting at
    /// `line`.
    #[must_use]
    pub fn new(block: BlockKind, line: usize, fields: Vec<Field>) -> Self {
        Self {
            block,
            line,
            fields: fields.into_iter().map(Some).collect(),
        }
    }

    /// Line the fields start on.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Removes the field with the given name, under any of its spellings.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::DuplicateField`] if it is given more than once.
    pub fn take(&mut self, name: FieldName) -> Result<Option<Field>, ParseError> {
        let mut found: Option<usize> = None;
        for (index, slot) in self.fields.iter().enumerate() {
            let Some(field) = slot else { continue };
            if !name.matches(&field.key) {
                continue;
            }
            if found.is_some() {
                return Err(ParseError::DuplicateField {
                    block: self.block,
                    line: field.line,
                    field: name.canonical,
                });
            }
            found = Some(index);
        }
        Ok(found.and_then(|index| self.fields[index].take()))
    }

    /// A scalar field as text.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate field or if the value is a group.
    pub fn text(&mut self, name: FieldName) -> Result<Option<String>, ParseError> {
        match self.take(name)? {
            None => Ok(None),
            Some(Field {
                value: Value::Scalar(scalar),
                ..
            }) => Ok(Some(scalar.raw)),
            Some(field) => Err(self.type_error(name, &field, "a text value")),
        }
    }

    /// A scalar field that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingField`] if the field is absent, otherwise
    /// fails like [`Fields::text`].
    pub fn require_text(&mut self, name: FieldName) -> Result<String, ParseError> {
        self.text(name)?.ok_or(ParseError::MissingField {
            block: self.block,
            line: self.line,
            field: name.canonical,
        })
    }

    /// A numeric field. Quoted numbers are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::FieldType`] if the value is not a finite number.
    pub fn number(&mut self, name: FieldName) -> Result<Option<f64>, ParseError> {
        let Some(field) = self.take(name)? else {
            return Ok(None);
        };
        if let Value::Scalar(scalar) = &field.value {
            if let Ok(number) = scalar.raw.trim().parse::<f64>() {
                if number.is_finite() {
                    return Ok(Some(number));
                }
            }
        }
        Err(self.type_error(name, &field, "a number"))
    }

    /// A group field.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::FieldType`] if the value is a scalar.
    pub fn group(&mut self, name: FieldName) -> Result<Option<Group>, ParseError> {
        match self.take(name)? {
            None => Ok(None),
            Some(Field {
                value: Value::Group(group),
                ..
            }) => Ok(Some(group)),
            Some(field) => Err(self.type_error(name, &field, "a '{...}' group")),
        }
    }

    /// Checks that every field has been taken.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownField`] for the first field left over.
    pub fn finish(self) -> Result<(), ParseError> {
        match self.fields.into_iter().flatten().next() {
            None => Ok(()),
            Some(field) => Err(ParseError::UnknownField {
                block: self.block,
                line: field.line,
                field: field.key,
            }),
        }
    }

    fn type_error(&self, name: FieldName, field: &Field, expected: &'static str) -> ParseError {
        ParseError::FieldType {
            block: self.block,
            line: field.line,
            field: name.canonical,
            expected,
            found: field.value.describe(),
        }
    }
}
