use anyhow::Context;
use chrono::{DateTime, Utc};
use geo_types::Point;

/// A single fix from the location source. Superseded by the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub coord: Point<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl PositionSample {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            coord: Point::new(lng, lat),
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn lat(&self) -> f64 {
        self.coord.y()
    }

    pub fn lng(&self) -> f64 {
        self.coord.x()
    }

    /// Parses a trace line of the form `lat,lng[,rfc3339 timestamp]`.
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let entries = s.split(',').map(str::trim).collect::<Vec<_>>();

        if entries.len() < 2 || entries.len() > 3 {
            anyhow::bail!("Expected `lat,lng[,timestamp]`, got {} fields", entries.len());
        }

        let lat = entries[0]
            .parse::<f64>()
            .context("Failed to parse latitude")?;
        let lng = entries[1]
            .parse::<f64>()
            .context("Failed to parse longitude")?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            anyhow::bail!("Coordinate out of range: {lat},{lng}");
        }

        let sample = Self::new(lat, lng);

        match entries.get(2) {
            Some(ts) => {
                let timestamp = DateTime::parse_from_rfc3339(ts)
                    .context("Failed to parse timestamp")?
                    .with_timezone(&Utc);
                Ok(sample.at(timestamp))
            }
            None => Ok(sample),
        }
    }
}
