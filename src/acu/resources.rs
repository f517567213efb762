//! Resource lists of a line item.
//!
//! Each category field holds a group of entry groups:
//!
//! ```text
//! labor = {
//!     {code = "L1", desc = "Foreman", unit = "hh", quantity = 0.1, price = 25, crew = 1},
//!     {code = "L2", desc = "Laborer", unit = "hh", quantity = 2, price = 18},
//! },
//! ```

use crate::{
    acu::{
        ParseError,
        fields::{FieldName, Fields, Group, Item},
        scanner::BlockKind,
    },
    domain::{Category, ResourceEntry, Resources},
};

const CODE: FieldName = FieldName::new("code", &["codigo"]);
const DESCRIPTION: FieldName = FieldName::new("desc", &["description", "descripcion"]);
const UNIT: FieldName = FieldName::new("unit", &["unidad"]);
const QUANTITY: FieldName = FieldName::new("quantity", &["cantidad"]);
const PRICE: FieldName = FieldName::new("price", &["precio"]);
const CREW: FieldName = FieldName::new("crew", &["cuadrilla"]);

/// Field name of a category list.
#[must_use]
pub const fn category_field(category: Category) -> FieldName {
    FieldName::new(category.keyword(), category.aliases())
}

/// Takes the four category lists out of a line item's fields.
///
/// # Errors
///
/// - [`ParseError::FieldType`] if a category is not a group of entry groups.
/// - [`ParseError::ResourceFieldMissing`] if an entry lacks its code or
///   description.
pub fn parse_resources(fields: &mut Fields) -> Result<Resources, ParseError> {
    let mut resources = Resources::default();
    for category in Category::ALL {
        if let Some(group) = fields.group(category_field(category))? {
            *resources.get_mut(category) = parse_category(category, group)?;
        }
    }
    Ok(resources)
}

fn parse_category(category: Category, group: Group) -> Result<Vec<ResourceEntry>, ParseError> {
    group
        .items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Item::Group(entry) => parse_entry(category, index + 1, entry),
            Item::Field(field) => Err(ParseError::FieldType {
                block: BlockKind::LineItem,
                line: field.line,
                field: category.keyword(),
                expected: "a list of '{...}' entries",
                found: format!("{} = ...", field.key),
            }),
        })
        .collect()
}

// unknown fields and nested groups inside an entry are ignored
fn parse_entry(category: Category, index: usize, entry: Group) -> Result<ResourceEntry, ParseError> {
    let line = entry.line;
    let entry_fields = entry
        .items
        .into_iter()
        .filter_map(|item| match item {
            Item::Field(field) => Some(field),
            Item::Group(_) => None,
        })
        .collect();
    let mut fields = Fields::new(BlockKind::LineItem, line, entry_fields);

    let missing = |field: &'static str| ParseError::ResourceFieldMissing {
        line,
        category,
        entry: index,
        field,
    };

    let code = fields.text(CODE)?.ok_or_else(|| missing(CODE.canonical))?;
    let description = fields
        .text(DESCRIPTION)?
        .ok_or_else(|| missing(DESCRIPTION.canonical))?;
    let crew = if category.uses_crew() {
        fields.number(CREW)?
    } else {
        None
    };

    Ok(ResourceEntry {
        code,
        description,
        unit: fields.text(UNIT)?.unwrap_or_default(),
        quantity: fields.number(QUANTITY)?.unwrap_or(0.0),
        price: fields.number(PRICE)?.unwrap_or(0.0),
        crew,
    })
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::acu::{fields::parse_body, lexer::tokenize, scanner::scan};

    fn resources(body: &str) -> Result<Resources, ParseError> {
        let blocks = scan(tokenize(&format!("@lineitem{{ {body} }}"))?)?;
        let parsed = parse_body(&blocks[0])?;
        let mut fields = Fields::new(BlockKind::LineItem, 1, parsed.fields);
        parse_resources(&mut fields)
    }

    #[test]
    fn parses_all_categories() {
        let parsed = resources(
            r#"
            labor = { {code = "L1", desc = "Laborer", unit = "hh", quantity = 2, price = 10, crew = 3} },
            materiales = {
                {codigo = 0213, descripcion = "Cement", unidad = bag, cantidad = 5, precio = 4},
                {code = "M2", desc = "Sand"},
            },
            equipment = { {code = "E1", desc = "Mixer", cuadrilla = 0.5} },
            subcontracts = {},
            "#,
        )
        .unwrap();

        assert_eq!(parsed.labor.len(), 1);
        assert_eq!(parsed.labor[0].crew, Some(3.0));
        assert_eq!(parsed.materials.len(), 2);
        assert_eq!(parsed.materials[0].code, "0213");
        assert_eq!(parsed.materials[0].unit, "bag");
        assert_eq!(parsed.materials[1].unit, "");
        assert!(parsed.materials[1].quantity.abs() < f64::EPSILON);
        assert_eq!(parsed.equipment[0].crew, Some(0.5));
        assert!(parsed.subcontracts.is_empty());
    }

    #[test_case("materials"; "materials")]
    #[test_case("subcontracts"; "subcontracts")]
    fn crew_is_ignored_outside_labor_and_equipment(category: &str) {
        let parsed = resources(&format!(
            "{category} = {{ {{code = \"X\", desc = \"x\", quantity = 1, crew = 4}} }}"
        ))
        .unwrap();
        assert!(parsed.iter().all(|(_, entries)| entries.iter().all(|e| e.crew.is_none())));
    }

    #[test]
    fn unknown_entry_fields_are_ignored() {
        let parsed = resources(
            "labor = { {code = \"L1\", desc = \"x\", supplier = \"ACME\", extra = { a = 1 }} }",
        )
        .unwrap();
        assert_eq!(parsed.labor.len(), 1);
    }

    #[test_case("{desc = \"x\"}", "code"; "missing code")]
    #[test_case("{code = \"L1\"}", "desc"; "missing description")]
    fn missing_entry_fields(entry: &str, field: &str) {
        let error = resources(&format!(
            "equipment = {{ {{code = \"E1\", desc = \"ok\"}}, {entry} }}"
        ))
        .unwrap_err();
        let ParseError::ResourceFieldMissing {
            line,
            category,
            entry,
            field: missing,
        } = error
        else {
            panic!("expected a missing resource field");
        };
        assert_eq!((line, category, entry, missing), (1, Category::Equipment, 2, field));
    }

    #[test]
    fn entries_must_be_groups() {
        let error = resources("labor = { code = \"L1\" }").unwrap_err();
        assert!(matches!(error, ParseError::FieldType { field: "labor", .. }));
    }

    #[test]
    fn non_numeric_price_is_a_type_error() {
        let error = resources("labor = { {code = \"L1\", desc = \"x\", price = cheap} }").unwrap_err();
        assert!(matches!(error, ParseError::FieldType { field: "price", .. }));
    }
}
