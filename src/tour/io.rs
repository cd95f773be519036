use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::Context;

use crate::tour::{position::PositionSample, Tour};

pub fn read_tour<P: AsRef<Path>>(path: P) -> anyhow::Result<Tour> {
    let f = File::open(&path)
        .with_context(|| format!("Failed to open tour file {}", path.as_ref().display()))?;
    let rdr = BufReader::new(f);

    let tour: Tour = serde_json::from_reader(rdr).context("Failed to parse tour definition")?;
    tour.validate()?;

    Ok(tour)
}

pub fn read_trace<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<PositionSample>> {
    let f = File::open(&path)
        .with_context(|| format!("Failed to open trace file {}", path.as_ref().display()))?;
    let rdr = BufReader::new(f);

    let mut samples = vec![];
    for (idx, l) in rdr.lines().enumerate() {
        let line = l?;
        let line = line.trim();

        // Skip comments and blank lines
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let sample = PositionSample::parse(line)
            .with_context(|| format!("Invalid trace line {}", idx + 1))?;
        samples.push(sample);
    }

    Ok(samples)
}
