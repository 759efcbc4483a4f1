//! hibo: a dashboard of boxes described by a JSON or YAML file.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod feeds;
pub mod model;
pub mod server;

pub use config::{Config, ConfigFormat};
pub use dashboard::Dashboard;
pub use error::ConfigError;
pub use model::{BoxId, DashboardBox, Geometry};
