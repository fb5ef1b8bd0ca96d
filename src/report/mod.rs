//! Dashboard report assembly and rendering.

pub mod assemble;
pub mod generator;

pub use assemble::*;
pub use generator::*;
