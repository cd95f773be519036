use std::fmt;

use geo_types::Point;
use serde::{Deserialize, Serialize};

const CONTENT_SEPARATOR: char = '•';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopId(u32);

impl StopId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authored shape of a stop, as it appears in tour files.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StopRecord {
    id: StopId,
    name: String,
    lat: f64,
    lng: f64,
    radius: f64,
    #[serde(default)]
    narration: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    points_of_interest: Vec<String>,
}

/// A fixed point of the tour. `coord` is x = longitude, y = latitude.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "StopRecord")]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub coord: Point<f64>,
    /// Trigger radius in meters.
    pub radius: f64,
    pub narration: String,
    pub content: String,
    pub points_of_interest: Vec<String>,
}

impl From<StopRecord> for Stop {
    fn from(r: StopRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            coord: Point::new(r.lng, r.lat),
            radius: r.radius,
            narration: r.narration,
            content: r.content,
            points_of_interest: r.points_of_interest,
        }
    }
}

impl Stop {
    pub fn new(id: StopId, name: &str, lat: f64, lng: f64, radius: f64) -> Self {
        Self {
            id,
            name: name.to_owned(),
            coord: Point::new(lng, lat),
            radius,
            narration: String::new(),
            content: String::new(),
            points_of_interest: vec![],
        }
    }

    pub fn with_narration(mut self, narration: &str) -> Self {
        self.narration = narration.to_owned();
        self
    }

    pub fn lat(&self) -> f64 {
        self.coord.y()
    }

    pub fn lng(&self) -> f64 {
        self.coord.x()
    }

    /// Display content split into its bullet items.
    pub fn content_items(&self) -> Vec<&str> {
        self.content
            .split(CONTENT_SEPARATOR)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    }
}
