//! Detection of likely quotations between a reuse corpus and an original
//! corpus, using sentence embeddings and an approximate nearest-neighbor
//! forest.

pub mod ann;
pub mod config;
pub mod context;
pub mod corpus;
pub mod db;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod output;
pub mod quotation;
pub mod runtime;

pub use error::{RemarxError, Result};
