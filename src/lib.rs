pub mod auth;
pub mod authz;
pub mod configuration;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod sessions;
pub mod startup;
pub mod store;
pub mod telemetry;
