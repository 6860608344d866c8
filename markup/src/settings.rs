use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::Distance;

const DEFAULT_RENDER_DISTANCE: Distance = Distance::const_meters(300.0);

/// Preferences that persist between sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Markings farther than this from the camera aren't drawn
    pub render_distance: Distance,
    pub show_tooltips: bool,
    /// Ask before deleting every line at a node
    pub delete_warnings: bool,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            render_distance: DEFAULT_RENDER_DISTANCE,
            show_tooltips: true,
            delete_warnings: true,
        }
    }
}

impl Settings {
    /// Missing or broken files give the defaults.
    pub fn load(path: &str) -> Settings {
        let mut settings: Settings = abstutil::maybe_read_json(path);
        if settings.render_distance < Distance::ZERO {
            settings.render_distance = DEFAULT_RENDER_DISTANCE;
        }
        settings
    }

    pub fn save(&self, path: &str) -> Result<()> {
        abstutil::write_json(path, self)
    }

    /// Takes whatever was typed in. Negative distances reset to the default; text that isn't a
    /// number leaves the setting alone. Returns the distance now in effect.
    pub fn set_render_distance(&mut self, input: &str) -> Distance {
        if let Ok(meters) = input.trim().parse::<f64>() {
            if meters.is_finite() {
                self.render_distance = if meters < 0.0 {
                    DEFAULT_RENDER_DISTANCE
                } else {
                    Distance::meters(meters)
                };
            }
        }
        self.render_distance
    }
}
