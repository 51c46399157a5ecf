pub mod analytics;
pub mod generation;
pub mod health;
pub mod ideas;
pub mod votes;
