pub mod consolidate;
pub mod find_quotes;
pub mod pairs;
pub mod writer;
