use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

use crate::{
    config::Config,
    error::ConfigError,
    model::{self, DashboardBox},
};

/// Immutable result of one config load: the document and the boxes built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    config: Config,
    boxes: Vec<DashboardBox>,
}

/// What the page receives from `/api/dashboard`.
#[derive(Debug, Serialize)]
pub struct DashboardView<'a> {
    pub config: Map<String, Value>,
    pub boxes: &'a [DashboardBox],
}

impl Dashboard {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_config(Config::load_from_file(path)?)
    }

    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let boxes = model::build_all(config.raw_boxes())?;
        Ok(Dashboard { config, boxes })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn boxes(&self) -> &[DashboardBox] {
        &self.boxes
    }

    pub fn find_box(&self, id: &str) -> Option<&DashboardBox> {
        self.boxes.iter().find(|b| b.id.matches(id))
    }

    pub fn view(&self) -> DashboardView<'_> {
        DashboardView {
            config: self.config.settings(),
            boxes: &self.boxes,
        }
    }
}
