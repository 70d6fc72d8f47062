pub mod document;
pub mod events;

pub use document::*;
pub use events::*;
