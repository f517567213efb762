//! Domain model of a construction budget.
//!
//! This module contains the parsed budget types, the hierarchical codes
//! assigned to titles and line items, the assembled outline and the cost
//! rollup computed over it.

/// Budgets, sub-budgets, titles, line items and their resources.
pub mod budget;
pub use budget::{
    Budget, Category, LineItem, ParsedDocument, ResourceEntry, Resources, SubBudget, Title,
};

/// Hierarchical dotted codes.
pub mod code;
pub use code::{Code, Error as CodeError};

mod config;
pub use config::{Config, ConfigError};

pub mod cost;
pub use cost::{CategoryCosts, CostError, CostRollup, Summary};

pub mod tree;
pub use tree::{AssemblyError, BudgetTree, Element, NodeId};
