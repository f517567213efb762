//! Plain-text construction budgets
//!
//! Budgets are written in the ACU format: `@budget`, `@subbudget`, `@title`
//! and `@lineitem` blocks with comma-separated fields. A document is parsed
//! into flat lists of elements with generated hierarchical codes, assembled
//! into an outline, and costed bottom-up.
//!
//! ```
//! let document = acu::parse(
//!     r#"
//!     @budget{P-001, name = "House"}
//!     @title{1, name = "EARTHWORKS"}
//!     @lineitem{description = "Excavation", unit = "m3", yield = 2,
//!         materials = { {code = "M1", desc = "Sand", unit = "m3", quantity = 1.5, price = 10} }}
//!     "#,
//! )?;
//!
//! let tree = acu::BudgetTree::assemble(&document)?;
//! let costs = acu::CostRollup::compute(&tree)?;
//! assert_eq!(costs.total(), 30.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod acu;
pub use acu::{
    ParseError, Source, Validation, Writer, parse, parse_with_config, to_string, validate,
    validate_many,
};

pub mod domain;
pub use domain::{
    AssemblyError, Budget, BudgetTree, Category, Code, Config, CostError, CostRollup,
    LineItem, ParsedDocument, Summary,
};

pub mod storage;
pub use storage::{JsonStore, PersistenceSink, Report, ReportRenderer};
