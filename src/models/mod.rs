pub mod enums;
pub mod payload;
pub mod result;

pub use enums::*;
pub use payload::*;
pub use result::*;
