//! Built-in rule catalogs

pub mod markup;
pub mod source;
