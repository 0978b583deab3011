//! SQL construction: identifier whitelist, parameter values, and the
//! dynamic statement builder.

pub mod builder;
pub mod ident;
pub mod value;

pub use builder::SqlBuilder;
pub use ident::{SortEntity, SortOrder};
pub use value::SqlValue;
