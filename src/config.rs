//! Tunables for a scene. Defaults reproduce the classic look: a 600px tall
//! teal canvas, one shape per second, gravity 1.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Interval used whenever the spawn rate cannot produce a usable period.
pub const DEFAULT_SPAWN_INTERVAL_MS: u32 = 1000;

/// Edge length (and diameter) of every regular shape.
pub const SHAPE_SIZE: f64 = 100.0;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SceneConfig {
    pub initial_gravity: u32,
    pub initial_shapes_per_second: u32,
    pub max_shapes_per_second: u32,
    /// Canvas width in px; `None` follows the window's inner width.
    pub surface_width: Option<u32>,
    pub surface_height: u32,
    /// Vertical spawn position for timer spawns (above the visible area).
    pub spawn_y: f64,
    /// Horizontal inset keeping timer spawns away from the canvas edges.
    pub spawn_margin: f64,
    pub area_per_shape: u64,
    pub background: u32,
    pub timer_includes_random_polygon: bool,
    pub canvas_id: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            initial_gravity: 1,
            initial_shapes_per_second: 1,
            max_shapes_per_second: 60,
            surface_width: None,
            surface_height: 600,
            spawn_y: -100.0,
            spawn_margin: 50.0,
            area_per_shape: 1000,
            background: 0x1099bb,
            timer_includes_random_polygon: false,
            canvas_id: "shapes-canvas".to_string(),
        }
    }
}

impl SceneConfig {
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self, crate::SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Clamp values that would otherwise break the spawn loop or gravity.
    pub fn sanitized(mut self) -> Self {
        self.initial_gravity = self.initial_gravity.max(1);
        self.max_shapes_per_second = self.max_shapes_per_second.max(1);
        self.initial_shapes_per_second = self
            .initial_shapes_per_second
            .clamp(1, self.max_shapes_per_second);
        self
    }
}

/// Period between spawn-timer firings for a given rate.
pub fn spawn_interval_ms(shapes_per_second: u32) -> u32 {
    if shapes_per_second == 0 {
        return DEFAULT_SPAWN_INTERVAL_MS;
    }
    (1000 / shapes_per_second).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_is_symmetric_in_rate() {
        assert_eq!(spawn_interval_ms(1), 1000);
        assert_eq!(spawn_interval_ms(2), 500);
        assert_eq!(spawn_interval_ms(4), 250);
        // going back down reproduces the same periods
        assert_eq!(spawn_interval_ms(2), 500);
        assert_eq!(spawn_interval_ms(1), 1000);
    }

    #[test]
    fn zero_rate_falls_back_to_default() {
        assert_eq!(spawn_interval_ms(0), DEFAULT_SPAWN_INTERVAL_MS);
    }

    #[test]
    fn very_high_rate_never_yields_zero_period() {
        assert_eq!(spawn_interval_ms(5000), 1);
    }

    #[test]
    fn sanitized_clamps_degenerate_values() {
        let cfg = SceneConfig {
            initial_gravity: 0,
            initial_shapes_per_second: 0,
            max_shapes_per_second: 0,
            ..SceneConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.initial_gravity, 1);
        assert_eq!(cfg.max_shapes_per_second, 1);
        assert_eq!(cfg.initial_shapes_per_second, 1);
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn from_json_fills_missing_fields_with_defaults() {
        let cfg = SceneConfig::from_json(r#"{ "initial_gravity": 3 }"#).unwrap();
        assert_eq!(cfg.initial_gravity, 3);
        assert_eq!(cfg.surface_height, 600);
    }
}
