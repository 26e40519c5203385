pub mod contracts;
pub mod error;
pub mod fetch;
pub mod source;

pub use contracts::*;
pub use error::*;
pub use fetch::*;
pub use source::*;
