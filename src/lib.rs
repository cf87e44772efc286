pub mod config;
pub mod espn;
pub mod handler;
pub mod model;
pub mod reconcile;
pub mod server;
pub mod store;
pub mod trigger;
