//! Serving layer: env configuration, bootstrap, the gym's job definitions,
//! and the HTTP endpoint the job runtime talks to.

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod jobs;
pub mod services;
