pub mod driver;
pub mod queries;
pub mod schema;
