//! User preferences that survive restarts.

use crate::constants::GRID_SIZE;
use crate::graph::Grid;
use crate::render::Theme;
use serde::{Deserialize, Serialize};

/// Storage key under which the settings are persisted.
pub const SETTINGS_KEY: &str = "studio_settings";

/// Editor preferences persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Grid cell size in canvas pixels
    pub grid_size: i32,
    /// Whether node placement and moves snap to the grid
    pub snap_to_grid: bool,
    /// Whether the grid is drawn
    pub show_grid: bool,
    /// Canvas colour scheme
    pub theme: Theme,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            snap_to_grid: true,
            show_grid: true,
            theme: Theme::Dark,
        }
    }
}

impl EditorSettings {
    /// Grid settings for a diagram.
    pub fn grid(&self) -> Grid {
        Grid {
            size: self.grid_size.max(1),
            snap_enabled: self.snap_to_grid,
        }
    }

    /// Serialize the settings to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore settings from JSON, falling back to defaults for anything unreadable.
    pub fn from_json_or_default(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|err| {
            log::warn!("ignoring unreadable settings: {err}");
            Self::default()
        })
    }
}
