pub mod runner_service;
pub mod scoring_service;
pub mod stats_service;
