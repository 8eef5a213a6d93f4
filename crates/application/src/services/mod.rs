//! Application services - Use cases orchestrating ports

mod resilience_test_service;

pub use resilience_test_service::{ResilienceTestService, ScenarioReport, ScenarioRequest};
