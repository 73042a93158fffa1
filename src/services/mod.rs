pub mod attempt_service;
pub mod sampler;
pub mod scoring_service;
