pub mod cache;
pub mod embedder;
pub mod encoder;
pub mod matrix;
pub mod provider;
