pub mod convert;
pub mod converter;
pub mod core;
pub mod errors;
pub mod graph;
pub mod package;
pub mod utils;
pub mod validate;
