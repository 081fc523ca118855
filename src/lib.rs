pub mod config;
pub mod constants;
pub mod extractors;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod scoring;
pub mod state;
pub mod validation;
