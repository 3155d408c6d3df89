//! Registry markup tree, parser and walker.
pub mod ast;
pub mod parser;
pub mod walker;

pub use ast::{SchemaChild, SchemaNode};
pub use parser::{load_document, parse_document, ParseError};
pub use walker::{walk, Ancestry, Visitor};
