//! Viewdef compiler - view DDL generation and introspection
//!
//! Two independent, stateless directions:
//! - [`generate_single_table_view`] / [`generate_join_view`] turn source
//!   tables into `CREATE VIEW` text and fail loudly on bad input.
//! - [`introspect`] reads existing view SQL back into a
//!   [`viewdef_model::ViewSpec`] and never fails; what it cannot recover is
//!   reported through `editable`.

mod generator;
mod introspector;
mod tokenizer;

pub use generator::{
    generate_join_view, generate_single_table_view, generate_view, InvalidSpecError,
    ROW_ID_COLUMN, ROW_NUMBER_PREFIX,
};
pub use introspector::introspect;
pub use tokenizer::tokenize_predicates;
