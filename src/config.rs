use geo_types::Point;

use crate::location::LocationOptions;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechConfig {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    /// Initial view centre, before the first position fix.
    pub center: Point<f64>,
    pub zoom: u8,
    pub max_zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: Point::new(-119.6982, 34.4208),
            zoom: 13,
            max_zoom: 19,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TourConfig {
    pub speech: SpeechConfig,
    pub location: LocationOptions,
    pub map: MapConfig,
}
