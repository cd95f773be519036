pub mod io;
pub mod position;
pub mod stop;

use std::{collections::HashSet, fmt, path::Path};

use anyhow::{anyhow, Context};
use itertools::Itertools;
use serde::Deserialize;

use crate::tour::stop::{Stop, StopId};

const BUILTIN_TOUR: &str = include_str!("../../data/sb-coastal-heritage.json");

/// An authored, immutable tour. Stop order is the intended visit order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default)]
    pub distance: String,
    pub stops: Vec<Stop>,
}

impl Tour {
    pub fn read<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        io::read_tour(path)
    }

    /// The Santa Barbara Coastal Heritage tour bundled with the crate.
    pub fn builtin() -> anyhow::Result<Self> {
        let tour: Tour =
            serde_json::from_str(BUILTIN_TOUR).context("Built-in tour is not valid JSON")?;
        tour.validate()?;
        Ok(tour)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(id) = self.stops.iter().map(|s| s.id).duplicates().next() {
            return Err(anyhow!("Duplicate stop id {id}"));
        }

        for stop in &self.stops {
            if !stop.radius.is_finite() || stop.radius <= 0.0 {
                return Err(anyhow!(
                    "Stop {} ({}) has invalid radius {}",
                    stop.id,
                    stop.name,
                    stop.radius
                ));
            }
        }

        Ok(())
    }

    pub fn stop(&self, id: StopId) -> Option<&Stop> {
        self.stops.iter().find(|s| s.id == id)
    }

    pub fn progress(&self, completed: &HashSet<StopId>) -> Progress {
        Progress {
            completed: self
                .stops
                .iter()
                .filter(|s| completed.contains(&s.id))
                .count(),
            total: self.stops.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stop {} of {}", self.completed, self.total)
    }
}
