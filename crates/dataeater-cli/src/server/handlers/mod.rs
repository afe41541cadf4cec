//! API request handlers.

mod dataset;
mod favorites;
mod mutations;
mod view;

pub use dataset::*;
pub use favorites::*;
pub use mutations::*;
pub use view::*;
