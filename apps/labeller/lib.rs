pub mod config;
pub mod error;
pub mod segment;
pub mod writer;

pub use error::{LabellerError, Result};
