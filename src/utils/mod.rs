mod file;
mod hash;
mod validation;

pub use file::*;
pub use hash::*;
pub use validation::*;
