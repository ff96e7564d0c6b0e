//! Core types and traits shared by the loader, splitter, models and evaluator

pub mod error;
pub mod traits;
pub mod types;

pub use self::error::*;
pub use self::traits::*;
pub use self::types::*;
