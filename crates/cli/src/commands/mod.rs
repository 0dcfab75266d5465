pub mod build;
pub mod index;
pub mod util;

pub use build::*;
pub use index::*;
pub use util::*;
