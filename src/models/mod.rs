pub mod analytics;
pub mod generation;
pub mod idea;
pub mod vote;

pub use analytics::*;
pub use generation::*;
pub use idea::*;
pub use vote::*;
