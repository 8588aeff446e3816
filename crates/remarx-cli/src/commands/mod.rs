pub mod evaluate;
pub mod find_quotes;
pub mod model;
