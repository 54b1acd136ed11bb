pub mod error;
pub mod export;
pub mod maintenance;

pub use error::{AdminError, Result};
