pub mod enums;
pub mod markers;
pub mod report;

pub use enums::*;
pub use markers::*;
pub use report::*;
