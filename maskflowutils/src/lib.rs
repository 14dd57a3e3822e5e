//!
//! # Maskflow Internal Utilities Crate
//!

pub mod ser;
pub use ser::*;
