#![warn(missing_docs)]
//!Shroud: linear algebra and comparison building blocks over secret values

pub mod compare;
pub mod linalg;

pub use shroud_shared_types::{Composition, Numeric, NumericError};
