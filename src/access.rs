//! Access layer for tuple-oriented operations.
//!
//! This module provides the typed-row model that the storage layer persists:
//!
//! - **DataType** / **Field**: supported column types and their values
//! - **TupleDesc**: an ordered, immutable row schema
//! - **Tuple**: one row, with an optional record identity once stored
//! - **TupleIterator**: the pull-based iteration contract consumed by
//!   query operators
//!
//! Rows are fixed width: every field serializes to a width determined by its
//! type alone, so a page can address slots by arithmetic.

pub mod scan;
pub mod tuple;
pub mod value;

pub use scan::TupleIterator;
pub use tuple::{FieldDef, Tuple, TupleDesc};
pub use value::{DataType, Field, STRING_LEN};
