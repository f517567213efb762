//! Cost computation and rollup.
//!
//! A line item's cost per category is the sum of `quantity * price` over its
//! entries, multiplied by the item's yield. Labor and equipment entries use
//! their crew size instead of the quantity when one is given. Subtotals are
//! then summed bottom-up through the [`BudgetTree`].

use std::ops::{Add, AddAssign};

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::domain::{
    budget::{Category, LineItem, ParsedDocument},
    tree::{BudgetTree, Element, NodeId},
};

/// Costs split by resource category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryCosts {
    /// Labor cost.
    pub labor: f64,
    /// Materials cost.
    pub materials: f64,
    /// Equipment cost.
    pub equipment: f64,
    /// Subcontracts cost.
    pub subcontracts: f64,
}

impl CategoryCosts {
    /// Cost of one category.
    #[must_use]
    pub const fn get(&self, category: Category) -> f64 {
        match category {
            Category::Labor => self.labor,
            Category::Materials => self.materials,
            Category::Equipment => self.equipment,
            Category::Subcontracts => self.subcontracts,
        }
    }

    const fn slot(&mut self, category: Category) -> &mut f64 {
        match category {
            Category::Labor => &mut self.labor,
            Category::Materials => &mut self.materials,
            Category::Equipment => &mut self.equipment,
            Category::Subcontracts => &mut self.subcontracts,
        }
    }

    /// Sum over all categories.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.labor + self.materials + self.equipment + self.subcontracts
    }
}

impl Add for CategoryCosts {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for CategoryCosts {
    fn add_assign(&mut self, rhs: Self) {
        for category in Category::ALL {
            *self.slot(category) += rhs.get(category);
        }
    }
}

/// Errors raised while costing line items.
#[derive(Debug, Error, PartialEq)]
pub enum CostError {
    /// A quantity, price, crew size or yield is negative.
    #[error("line item {item}: negative {field} ({value}){}", resource_context(.category.as_ref(), .resource.as_deref()))]
    NegativeValue {
        /// Code of the line item.
        item: String,
        /// Category of the offending entry, `None` for the item's yield.
        category: Option<Category>,
        /// Code of the offending resource entry.
        resource: Option<String>,
        /// Name of the negative field.
        field: &'static str,
        /// The negative value.
        value: f64,
    },
}

fn resource_context(category: Option<&Category>, resource: Option<&str>) -> String {
    match (category, resource) {
        (Some(category), Some(resource)) => format!(" in {category} resource {resource}"),
        _ => String::new(),
    }
}

/// Computes the cost of a line item per category.
///
/// # Errors
///
/// Returns [`CostError::NegativeValue`] if the yield or any quantity, price or
/// crew size is negative. Values are never clamped.
pub fn line_item_costs(item: &LineItem) -> Result<CategoryCosts, CostError> {
    if item.yield_factor < 0.0 {
        return Err(CostError::NegativeValue {
            item: item.code.to_string(),
            category: None,
            resource: None,
            field: "yield",
            value: item.yield_factor,
        });
    }

    let mut costs = CategoryCosts::default();
    for (category, entries) in item.resources.iter() {
        let mut sum = 0.0;
        for entry in entries {
            let negative = [
                ("quantity", entry.quantity),
                ("price", entry.price),
                ("crew", entry.crew.unwrap_or(0.0)),
            ]
            .into_iter()
            .find(|(_, value)| *value < 0.0);
            if let Some((field, value)) = negative {
                return Err(CostError::NegativeValue {
                    item: item.code.to_string(),
                    category: Some(category),
                    resource: Some(entry.code.clone()),
                    field,
                    value,
                });
            }
            sum += entry.effective_quantity(category) * entry.price;
        }
        *costs.slot(category) = sum * item.yield_factor;
    }
    Ok(costs)
}

/// Sum of all line item costs, computed without the tree.
///
/// For any document that assembles, this equals [`CostRollup::total`].
///
/// # Errors
///
/// See [`line_item_costs`].
pub fn flat_total(items: &[LineItem]) -> Result<f64, CostError> {
    items
        .iter()
        .map(|item| line_item_costs(item).map(|costs| costs.total()))
        .sum()
}

/// Cost subtotals for every node of a [`BudgetTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct CostRollup {
    /// Indexed by [`NodeId::index`].
    nodes: Vec<CategoryCosts>,
    total: CategoryCosts,
}

impl CostRollup {
    /// Costs every line item and rolls the sums up through the tree.
    ///
    /// A title's subtotal is the sum of its direct line items and of its child
    /// titles' subtotals; the grand total is the sum over the roots.
    ///
    /// # Errors
    ///
    /// See [`line_item_costs`].
    #[instrument(level = "debug", skip_all, fields(nodes = tree.len()))]
    pub fn compute(tree: &BudgetTree<'_>) -> Result<Self, CostError> {
        let mut nodes = vec![CategoryCosts::default(); tree.len()];
        let mut total = CategoryCosts::default();
        for &root in tree.roots() {
            total += rollup(tree, root, &mut nodes)?;
        }
        tracing::debug!(total = total.total(), "rolled up costs");
        Ok(Self { nodes, total })
    }

    /// Subtotal of a node split by category.
    ///
    /// # Panics
    ///
    /// Panics if the id belongs to a different tree.
    #[must_use]
    pub fn costs(&self, id: NodeId) -> CategoryCosts {
        self.nodes[id.index()]
    }

    /// Subtotal of a node.
    #[must_use]
    pub fn subtotal(&self, id: NodeId) -> f64 {
        self.costs(id).total()
    }

    /// Grand total split by category.
    #[must_use]
    pub const fn by_category(&self) -> CategoryCosts {
        self.total
    }

    /// Grand total of the budget.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.total.total()
    }
}

// post-order: children are summed before their parent is stored
fn rollup(
    tree: &BudgetTree<'_>,
    id: NodeId,
    nodes: &mut [CategoryCosts],
) -> Result<CategoryCosts, CostError> {
    let mut costs = match tree.node(id).element() {
        Element::LineItem(item) => line_item_costs(item)?,
        Element::SubBudget(_) | Element::Title(_) => CategoryCosts::default(),
    };
    for &child in tree.children(id) {
        costs += rollup(tree, child, nodes)?;
    }
    nodes[id.index()] = costs;
    Ok(costs)
}

/// Headline figures of a budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Number of sub-budgets.
    pub sub_budgets: usize,
    /// Number of titles.
    pub titles: usize,
    /// Number of line items.
    pub line_items: usize,
    /// Deepest title level used.
    pub max_level: u8,
    /// Grand total split by category.
    pub by_category: CategoryCosts,
    /// Grand total.
    pub total: f64,
}

impl Summary {
    /// Summarizes a document and its rollup.
    #[must_use]
    pub fn new(document: &ParsedDocument, rollup: &CostRollup) -> Self {
        Self {
            sub_budgets: document.sub_budgets.len(),
            titles: document.titles.len(),
            line_items: document.line_items.len(),
            max_level: document.max_level(),
            by_category: rollup.by_category(),
            total: rollup.total(),
        }
    }
}
