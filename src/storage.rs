//! Collaborators that consume a parsed budget.
//!
//! The core hands a [`ParsedDocument`] to a [`PersistenceSink`], and an
//! assembled, costed [`Report`] to a [`ReportRenderer`]. Neither trait is
//! used by the parser itself; retries, transactions and presentation belong
//! to the implementations.

mod json;

pub use json::{JsonStore, StoreError, StoredDocument, fingerprint};

use crate::domain::{Budget, BudgetTree, CostRollup, ParsedDocument};

/// Accepts parsed documents for safekeeping.
pub trait PersistenceSink {
    /// What the sink hands back for a stored document, such as an id.
    type Receipt;

    /// Why a document could not be stored.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Stores one document.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if the document could not be stored.
    fn persist(&self, document: &ParsedDocument) -> Result<Self::Receipt, Self::Error>;
}

/// A read-only view of an assembled and costed budget.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a, 'doc> {
    /// The root budget.
    pub budget: &'a Budget,
    /// The assembled outline.
    pub tree: &'a BudgetTree<'doc>,
    /// Subtotals for every node of `tree`.
    pub costs: &'a CostRollup,
    /// Currency every amount is expressed in.
    pub currency: &'a str,
}

impl<'a, 'doc> Report<'a, 'doc> {
    /// A report over a document's outline and costs.
    #[must_use]
    pub fn new(budget: &'a Budget, tree: &'a BudgetTree<'doc>, costs: &'a CostRollup) -> Self {
        Self {
            budget,
            tree,
            costs,
            currency: &budget.currency,
        }
    }
}

/// Presents a [`Report`].
pub trait ReportRenderer {
    /// Why rendering failed.
    type Error;

    /// Renders the report.
    ///
    /// # Errors
    ///
    /// Returns the renderer's error if the output could not be produced.
    fn render(&mut self, report: &Report<'_, '_>) -> Result<(), Self::Error>;
}
