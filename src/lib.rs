pub mod error;
pub mod geometry;
pub mod math;
pub mod path;
pub mod segment;

pub use error::{GeopathError, Result};
