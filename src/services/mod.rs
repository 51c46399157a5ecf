pub mod analytics_service;
pub mod generation_service;
pub mod vote_service;
