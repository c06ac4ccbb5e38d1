// Utility functions

pub mod decode;
pub mod logger;

pub use decode::*;
pub use logger::*;
