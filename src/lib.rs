#![recursion_limit = "256"]

pub mod app;
pub mod clock;
pub mod config;
pub mod http_client;
pub mod model;
pub mod resource;
pub mod resources;
pub mod schedule;
pub mod state;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use app::App;
pub use config::AppConfig;
pub use http_client::{DeviceClient, HttpDeviceClient};
pub use model::Model;
