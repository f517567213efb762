//! Rendering of the budget model back into ACU text.
//!
//! The output always uses the English keywords, quotes every string and
//! writes every field the parser would otherwise default, so that parsing the
//! output reproduces the document field for field.

use std::fmt::{self, Write};

use crate::domain::{
    Budget, Category, Config, LineItem, ParsedDocument, ResourceEntry, SubBudget, Title,
};

/// Renders a whole document through [`fmt::Display`].
///
/// The budget block comes first, followed by the sub-budget, title and line
/// item blocks in their declaration order.
#[derive(Debug, Clone, Copy)]
pub struct Writer<'a> {
    document: &'a ParsedDocument,
    indent: usize,
}

impl<'a> Writer<'a> {
    /// A writer using the indentation of the given configuration.
    #[must_use]
    pub const fn new(document: &'a ParsedDocument, config: &Config) -> Self {
        Self {
            document,
            indent: config.indent(),
        }
    }

    /// Overrides the number of spaces per nesting level.
    #[must_use]
    pub const fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

impl fmt::Display for Writer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let document = self.document;
        write_budget(f, &document.budget, self.indent)?;

        let mut blocks: Vec<(usize, Decl<'_>)> = document
            .sub_budgets
            .iter()
            .map(|sub_budget| (sub_budget.position, Decl::SubBudget(sub_budget)))
            .chain(
                document
                    .titles
                    .iter()
                    .map(|title| (title.position, Decl::Title(title))),
            )
            .chain(
                document
                    .line_items
                    .iter()
                    .map(|item| (item.position, Decl::LineItem(item))),
            )
            .collect();
        blocks.sort_by_key(|(position, _)| *position);

        for (_, block) in blocks {
            f.write_char('\n')?;
            match block {
                Decl::SubBudget(sub_budget) => write_sub_budget(f, sub_budget, self.indent)?,
                Decl::Title(title) => write_title(f, title, self.indent)?,
                Decl::LineItem(item) => write_line_item(f, item, self.indent)?,
            }
        }
        Ok(())
    }
}

enum Decl<'a> {
    SubBudget(&'a SubBudget),
    Title(&'a Title),
    LineItem(&'a LineItem),
}

/// Renders a document as ACU text.
#[must_use]
pub fn to_string(document: &ParsedDocument, config: &Config) -> String {
    Writer::new(document, config).to_string()
}

/// Writes a `@budget` block.
///
/// # Errors
///
/// Fails only if the underlying writer fails.
pub fn write_budget<W: Write>(out: &mut W, budget: &Budget, indent: usize) -> fmt::Result {
    let pad = " ".repeat(indent);
    writeln!(out, "@budget{{{},", header(&budget.code))?;
    writeln!(out, "{pad}name = {},", quote(&budget.name))?;
    if let Some(client) = &budget.client {
        writeln!(out, "{pad}client = {},", quote(client))?;
    }
    if let Some(location) = &budget.location {
        writeln!(out, "{pad}location = {},", quote(location))?;
    }
    writeln!(out, "{pad}currency = {},", quote(&budget.currency))?;
    writeln!(out, "}}")
}

/// Writes a `@subbudget` block.
///
/// # Errors
///
/// Fails only if the underlying writer fails.
pub fn write_sub_budget<W: Write>(
    out: &mut W,
    sub_budget: &SubBudget,
    indent: usize,
) -> fmt::Result {
    let pad = " ".repeat(indent);
    writeln!(out, "@subbudget{{{},", header(&sub_budget.code))?;
    writeln!(out, "{pad}name = {},", quote(&sub_budget.name))?;
    writeln!(out, "}}")
}

/// Writes a `@title` block. The generated code is not written.
///
/// # Errors
///
/// Fails only if the underlying writer fails.
pub fn write_title<W: Write>(out: &mut W, title: &Title, indent: usize) -> fmt::Result {
    let pad = " ".repeat(indent);
    writeln!(out, "@title{{{},", title.level)?;
    writeln!(out, "{pad}name = {},", quote(&title.name))?;
    writeln!(out, "}}")
}

/// Writes a `@lineitem` block. Empty resource categories are omitted.
///
/// # Errors
///
/// Fails only if the underlying writer fails.
pub fn write_line_item<W: Write>(out: &mut W, item: &LineItem, indent: usize) -> fmt::Result {
    let pad = " ".repeat(indent);
    writeln!(out, "@lineitem{{")?;
    writeln!(out, "{pad}description = {},", quote(&item.description))?;
    writeln!(out, "{pad}unit = {},", quote(&item.unit))?;
    writeln!(out, "{pad}yield = {},", item.yield_factor)?;
    for (category, entries) in item.resources.iter() {
        if entries.is_empty() {
            continue;
        }
        writeln!(out, "{pad}{category} = {{")?;
        for entry in entries {
            writeln!(out, "{pad}{pad}{},", entry_group(category, entry))?;
        }
        writeln!(out, "{pad}}},")?;
    }
    writeln!(out, "}}")
}

fn entry_group(category: Category, entry: &ResourceEntry) -> String {
    let mut group = format!(
        "{{code = {}, desc = {}, unit = {}, quantity = {}, price = {}",
        quote(&entry.code),
        quote(&entry.description),
        quote(&entry.unit),
        entry.quantity,
        entry.price,
    );
    if let Some(crew) = entry.crew.filter(|_| category.uses_crew()) {
        let _ = write!(group, ", crew = {crew}");
    }
    group.push('}');
    group
}

/// A header token, left bare when it lexes back to the same text.
fn header(code: &str) -> String {
    let mut chars = code.chars();
    let bare = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphanumeric() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || "_-./%".contains(c))
        && !code.contains("//")
        && !code.ends_with('/');
    if bare { code.to_string() } else { quote(code) }
}

/// A double-quoted string literal.
fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::acu::parse;

    #[test_case("P-001", "P-001"; "plain code")]
    #[test_case("0101001", "0101001"; "numeric code")]
    #[test_case("01.02", "01.02"; "dotted code")]
    #[test_case("", "\"\""; "empty")]
    #[test_case("-5", "\"-5\""; "leading dash")]
    #[test_case("a b", "\"a b\""; "space")]
    #[test_case("a//b", "\"a//b\""; "comment marker")]
    #[test_case("a/", "\"a/\""; "trailing slash")]
    #[test_case("Ñandú", "\"Ñandú\""; "non-ascii")]
    fn header_quoting(code: &str, expected: &str) {
        assert_eq!(header(code), expected);
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("say \"hi\"\n\tC:\\"), r#""say \"hi\"\n\tC:\\""#);
    }

    #[test]
    fn line_item_layout() {
        let document = parse(
            r#"@budget{P1, name = "x"}
            @title{1, name = "A"}
            @partida{descripcion = "Wall", unidad = m2, rendimiento = 2.5,
                mano_obra = { {codigo = L1, desc = "Mason", unidad = hh, cantidad = 1, precio = 20, cuadrilla = 2} }}"#,
        )
        .unwrap();
        let mut text = String::new();
        write_line_item(&mut text, &document.line_items[0], 2).unwrap();
        assert_eq!(
            text,
            "@lineitem{\n  description = \"Wall\",\n  unit = \"m2\",\n  yield = 2.5,\n  labor = {\n    {code = \"L1\", desc = \"Mason\", unit = \"hh\", quantity = 1, price = 20, crew = 2},\n  },\n}\n"
        );
    }

    #[test]
    fn document_layout() {
        let source = "@budget{P1,\n  name = \"House\",\n  currency = \"PEN\",\n}\n\n@subbudget{S1,\n  name = \"Main\",\n}\n\n@title{1,\n  name = \"A\",\n}\n";
        let document = parse(source).unwrap();
        assert_eq!(to_string(&document, &Config::default()), source);
    }

    #[test]
    fn round_trip_with_escapes_and_aliases() {
        let document = parse(
            r#"
            @presupuesto{"P 1", nombre = 'It\'s "big"', lugar = "Line\nTwo"}
            @partida{descripcion = "tab\there", unidad = u}
            @titulo{1, nombre = "A"}
            @subpresupuesto{S1, nombre = "Second"}
            @titulo{2, nombre = "B"}
            @partida{descripcion = "x", unidad = u,
                equipos = { {codigo = E1, desc = "Mixer", cuadrilla = 0.5, cantidad = 3} },
                subcontratos = { {codigo = S, desc = "Roof", precio = 1e3} }}
            "#,
        )
        .unwrap();
        let text = to_string(&document, &Config::default());
        assert_eq!(parse(&text).unwrap(), document);
    }
}
