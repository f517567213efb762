//! The ACU text format.
//!
//! Reading a document goes through these stages, each in its own module:
//!
//! 1. [`lexer`] turns text into tokens, dropping whitespace and comments.
//! 2. [`scanner`] groups tokens into `@kind{ ... }` blocks.
//! 3. [`fields`] reads a block body into a header and `key = value` fields.
//! 4. [`resources`] reads the resource lists of a line item.
//! 5. [`declaration`] decodes each block into a typed declaration.
//! 6. The parser assigns codes with a [`CodeGenerator`] and collects the
//!    declarations into a [`ParsedDocument`](crate::domain::ParsedDocument).
//!
//! [`writer`] goes the other way.
//!
//! ```text
//! @budget{P-001, name = "House", currency = "PEN"}
//!
//! @title{1, name = "EARTHWORKS"}
//! @lineitem{
//!     description = "Excavation",
//!     unit = "m3",
//!     yield = 25,
//!     labor = {
//!         {code = "L1", desc = "Laborer", unit = "hh", quantity = 2, price = 18.5, crew = 3},
//!     },
//! }
//! ```

pub mod declaration;
mod error;
pub mod fields;
pub mod lexer;
pub mod numbering;
mod parser;
pub mod resources;
pub mod scanner;
mod validate;
pub mod writer;

pub use error::ParseError;
pub use numbering::CodeGenerator;
pub use parser::{parse, parse_with_config};
pub use scanner::BlockKind;
pub use validate::{Source, Validation, validate, validate_many};
pub use writer::{Writer, to_string};
