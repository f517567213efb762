//! The parsed budget model.
//!
//! Everything in here is plain value data: it is produced by a single parse
//! pass and never mutated by the later stages, which only derive read-only
//! views (the assembled tree and the cost rollup) from it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Code;

/// The root document of a costed project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Budget code, written as the header token of the `@budget` block.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Client the budget is prepared for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Site or city of the works.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Currency code every price is expressed in.
    pub currency: String,
}

/// An optional grouping of titles under the budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubBudget {
    /// Sub-budget code, written as the header token of the block.
    pub code: String,
    /// Display name.
    pub name: String,
    /// 1-based declaration order among sub-budgets.
    pub order: usize,
    /// Position among the element blocks of the document.
    pub position: usize,
}

/// An organizational node of the budget outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    /// Nesting level, 1 to [`MAX_LEVEL`](crate::domain::code::MAX_LEVEL).
    pub level: u8,
    /// Sequence number at this level, starting at 1 under each parent.
    pub number: u32,
    /// Generated dotted code.
    pub code: Code,
    /// Display name.
    pub name: String,
    /// Code of the enclosing title, `None` for level 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Code>,
    /// Code of the owning sub-budget, if any was declared before this title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_budget: Option<String>,
    /// Position among the element blocks of the document.
    pub position: usize,
}

/// A priced unit of work (a "partida").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Generated code: the enclosing title's code plus a sequence segment.
    pub code: Code,
    /// Sequence number under the enclosing title.
    pub number: u32,
    /// Code of the enclosing title.
    ///
    /// `None` means the item was declared before any title. That is accepted,
    /// but it is not the recommended way of writing a budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Code>,
    /// Code of the owning sub-budget, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_budget: Option<String>,
    /// Description of the work.
    pub description: String,
    /// Unit the work is measured in.
    pub unit: String,
    /// Yield ("rendimiento"), applied uniformly to every resource cost.
    #[serde(rename = "yield")]
    pub yield_factor: f64,
    /// The priced resources, grouped by category.
    pub resources: Resources,
    /// Position among the element blocks of the document.
    pub position: usize,
}

impl LineItem {
    /// Whether the item was declared outside of any title.
    #[must_use]
    pub const fn is_untitled(&self) -> bool {
        self.title.is_none()
    }
}

/// The four resource categories of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Labor ("mano de obra").
    Labor,
    /// Materials.
    Materials,
    /// Equipment and tools.
    Equipment,
    /// Subcontracted work.
    Subcontracts,
}

impl Category {
    /// All categories, in the order they are written.
    pub const ALL: [Self; 4] = [
        Self::Labor,
        Self::Materials,
        Self::Equipment,
        Self::Subcontracts,
    ];

    /// The keyword used for this category in ACU text.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Labor => "labor",
            Self::Materials => "materials",
            Self::Equipment => "equipment",
            Self::Subcontracts => "subcontracts",
        }
    }

    /// Keywords accepted for this category, the canonical one first.
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Labor => &["labor", "mano_obra"],
            Self::Materials => &["materials", "materiales"],
            Self::Equipment => &["equipment", "equipos"],
            Self::Subcontracts => &["subcontracts", "subcontratos"],
        }
    }

    /// Whether a crew size may override the quantity of entries in this
    /// category.
    #[must_use]
    pub const fn uses_crew(self) -> bool {
        matches!(self, Self::Labor | Self::Equipment)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The resource lists of a line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    /// Labor entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labor: Vec<ResourceEntry>,
    /// Material entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<ResourceEntry>,
    /// Equipment entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<ResourceEntry>,
    /// Subcontract entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcontracts: Vec<ResourceEntry>,
}

impl Resources {
    /// The entries of one category.
    #[must_use]
    pub fn get(&self, category: Category) -> &[ResourceEntry] {
        match category {
            Category::Labor => &self.labor,
            Category::Materials => &self.materials,
            Category::Equipment => &self.equipment,
            Category::Subcontracts => &self.subcontracts,
        }
    }

    /// Mutable access to the entries of one category.
    pub fn get_mut(&mut self, category: Category) -> &mut Vec<ResourceEntry> {
        match category {
            Category::Labor => &mut self.labor,
            Category::Materials => &mut self.materials,
            Category::Equipment => &mut self.equipment,
            Category::Subcontracts => &mut self.subcontracts,
        }
    }

    /// Iterate over every category with its entries, in writing order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[ResourceEntry])> {
        Category::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }

    /// Whether no category holds any entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, entries)| entries.is_empty())
    }
}

/// A single priced input of a line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Resource code.
    pub code: String,
    /// Resource description.
    pub description: String,
    /// Unit of the resource.
    pub unit: String,
    /// Quantity per unit of work.
    pub quantity: f64,
    /// Unit price.
    pub price: f64,
    /// Crew size ("cuadrilla"), only read for labor and equipment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crew: Option<f64>,
}

impl ResourceEntry {
    /// The quantity used for costing in the given category.
    ///
    /// For labor and equipment a positive crew size replaces the quantity.
    #[must_use]
    pub fn effective_quantity(&self, category: Category) -> f64 {
        match self.crew {
            Some(crew) if category.uses_crew() && crew > 0.0 => crew,
            _ => self.quantity,
        }
    }
}

/// The result of parsing one ACU document.
///
/// This is the only object handed to collaborators such as persistence sinks
/// and report renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// The root budget.
    pub budget: Budget,
    /// Sub-budgets in declaration order.
    #[serde(default)]
    pub sub_budgets: Vec<SubBudget>,
    /// Titles in declaration order.
    #[serde(default)]
    pub titles: Vec<Title>,
    /// Line items in declaration order.
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl ParsedDocument {
    /// Line items declared outside of any title.
    pub fn untitled_line_items(&self) -> impl Iterator<Item = &LineItem> {
        self.line_items.iter().filter(|item| item.is_untitled())
    }

    /// Deepest title level used, zero when there are no titles.
    #[must_use]
    pub fn max_level(&self) -> u8 {
        self.titles.iter().map(|title| title.level).max().unwrap_or(0)
    }
}
