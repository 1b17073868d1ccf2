//! Desktop configuration.

use crate::error::SettingsError;
use crate::window::MAX_WORKSPACES;
use kite_core::Color;
use serde::{Deserialize, Serialize};

/// Desktop-wide settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopSettings {
    /// Number of workspaces, `1..=32`.
    pub workspace_count: usize,
    pub desktop_color: Color,
    /// Width of window borders, in pixels.
    pub border_width: i32,
    /// Color of newly created views.
    pub default_view_color: Color,
}

impl Default for DesktopSettings {
    fn default() -> Self {
        DesktopSettings {
            workspace_count: 4,
            desktop_color: Color::from_rgb8(51, 102, 152),
            border_width: 5,
            default_view_color: Color::PANEL,
        }
    }
}

impl DesktopSettings {
    /// Parses and validates settings.
    pub fn from_json(json: &str) -> Result<DesktopSettings, SettingsError> {
        let settings: DesktopSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.workspace_count == 0 || self.workspace_count > MAX_WORKSPACES {
            return Err(SettingsError::WorkspaceCount {
                count: self.workspace_count,
                max: MAX_WORKSPACES,
            });
        }
        Ok(())
    }
}
