// Library for tests to access modules

pub mod aggregator;
pub mod config;
pub mod escalation;
pub mod health;
pub mod models;
pub mod monitor;
pub mod poller;
pub mod registry;
pub mod routes;
pub mod thresholds;
pub mod version;
