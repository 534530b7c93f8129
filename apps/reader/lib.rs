pub mod checkpoint;
pub mod classify;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod listing_api;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod sink;

pub use error::{ReaderError, Result};
