mod error;

pub mod models;
pub mod search;

pub use error::*;
