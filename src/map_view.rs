use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Context;
use geo_types::Point;
use log::debug;
use serde::Serialize;

use crate::{
    config::MapConfig,
    tour::stop::{Stop, StopId},
};

pub const PENDING_COLOR: &str = "#3b82f6";
pub const COMPLETED_COLOR: &str = "#10b981";
pub const POSITION_COLOR: &str = "#ef4444";

const STOP_ICON_SIZE: u32 = 32;
const POSITION_ICON_SIZE: u32 = 20;
const CIRCLE_FILL_OPACITY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CircleHandle(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerIcon {
    pub color: &'static str,
    pub label: Option<String>,
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleStyle {
    pub color: &'static str,
    pub fill_opacity: f64,
}

/// Rendering backend for the tour map.
pub trait MapSurface {
    fn add_marker(&mut self, at: Point<f64>, icon: MarkerIcon, popup: Option<String>)
        -> MarkerHandle;
    fn set_marker_icon(&mut self, marker: MarkerHandle, icon: MarkerIcon);
    fn move_marker(&mut self, marker: MarkerHandle, to: Point<f64>);
    fn remove_marker(&mut self, marker: MarkerHandle);

    fn add_circle(&mut self, center: Point<f64>, radius: f64, style: CircleStyle) -> CircleHandle;
    fn set_circle_style(&mut self, circle: CircleHandle, style: CircleStyle);
    fn remove_circle(&mut self, circle: CircleHandle);

    fn zoom(&self) -> u8;
    fn set_view(&mut self, center: Point<f64>, zoom: u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopStatus {
    Pending,
    Completed,
}

impl StopStatus {
    fn color(self) -> &'static str {
        match self {
            StopStatus::Pending => PENDING_COLOR,
            StopStatus::Completed => COMPLETED_COLOR,
        }
    }
}

struct StopPrimitives {
    marker: MarkerHandle,
    circle: CircleHandle,
    status: StopStatus,
}

fn stop_icon(stop: &Stop, status: StopStatus) -> MarkerIcon {
    MarkerIcon {
        color: status.color(),
        label: Some(stop.id.to_string()),
        size: STOP_ICON_SIZE,
    }
}

fn circle_style(status: StopStatus) -> CircleStyle {
    CircleStyle {
        color: status.color(),
        fill_opacity: CIRCLE_FILL_OPACITY,
    }
}

/// Mirrors tour progress onto a [`MapSurface`].
///
/// Each stop gets one marker and one geofence circle, created on first sight
/// and restyled in place afterwards. The live position has a single marker
/// that is moved, never recreated.
pub struct MapSyncView<S> {
    surface: S,
    stops: HashMap<StopId, StopPrimitives>,
    position_marker: Option<MarkerHandle>,
}

impl<S: MapSurface> MapSyncView<S> {
    pub fn new(mut surface: S, config: &MapConfig) -> Self {
        surface.set_view(config.center, config.zoom);
        Self {
            surface,
            stops: HashMap::new(),
            position_marker: None,
        }
    }

    pub fn sync(
        &mut self,
        stops: &[Stop],
        position: Option<Point<f64>>,
        completed: &HashSet<StopId>,
    ) {
        for stop in stops {
            let status = if completed.contains(&stop.id) {
                StopStatus::Completed
            } else {
                StopStatus::Pending
            };

            match self.stops.get_mut(&stop.id) {
                Some(prims) => {
                    if prims.status != status {
                        debug!("Stop {} is now {status:?}", stop.id);
                        self.surface
                            .set_marker_icon(prims.marker, stop_icon(stop, status));
                        self.surface
                            .set_circle_style(prims.circle, circle_style(status));
                        prims.status = status;
                    }
                }
                None => {
                    let marker = self.surface.add_marker(
                        stop.coord,
                        stop_icon(stop, status),
                        Some(stop.name.clone()),
                    );
                    let circle =
                        self.surface
                            .add_circle(stop.coord, stop.radius, circle_style(status));
                    self.stops.insert(
                        stop.id,
                        StopPrimitives {
                            marker,
                            circle,
                            status,
                        },
                    );
                }
            }
        }

        if let Some(position) = position {
            match self.position_marker {
                Some(marker) => self.surface.move_marker(marker, position),
                None => {
                    let icon = MarkerIcon {
                        color: POSITION_COLOR,
                        label: None,
                        size: POSITION_ICON_SIZE,
                    };
                    self.position_marker = Some(self.surface.add_marker(position, icon, None));
                }
            }

            let zoom = self.surface.zoom();
            self.surface.set_view(position, zoom);
        }
    }

    /// Removes every primitive this view created.
    pub fn teardown(&mut self) {
        for (_, prims) in self.stops.drain() {
            self.surface.remove_marker(prims.marker);
            self.surface.remove_circle(prims.circle);
        }

        if let Some(marker) = self.position_marker.take() {
            self.surface.remove_marker(marker);
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPrimitive {
    pub at: Point<f64>,
    pub icon: MarkerIcon,
    pub popup: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CirclePrimitive {
    pub center: Point<f64>,
    pub radius: f64,
    pub style: CircleStyle,
}

#[derive(Serialize)]
struct MapFeature {
    kind: &'static str,
    color: &'static str,
    label: Option<String>,
    popup: Option<String>,
    radius: Option<f64>,
    fill_opacity: Option<f64>,
    #[serde(serialize_with = "geojson::ser::serialize_geometry")]
    geometry: Point<f64>,
}

/// In-memory surface that can be exported as a GeoJSON feature collection.
#[derive(Debug, Clone)]
pub struct GeoJsonSurface {
    markers: BTreeMap<MarkerHandle, MarkerPrimitive>,
    circles: BTreeMap<CircleHandle, CirclePrimitive>,
    center: Point<f64>,
    zoom: u8,
    max_zoom: u8,
    next_id: u64,
    created: usize,
}

impl GeoJsonSurface {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            markers: BTreeMap::new(),
            circles: BTreeMap::new(),
            center: config.center,
            zoom: config.zoom,
            max_zoom: config.max_zoom,
            next_id: 1,
            created: 0,
        }
    }

    fn next_handle(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.created += 1;
        id
    }

    pub fn markers(&self) -> impl Iterator<Item = &MarkerPrimitive> {
        self.markers.values()
    }

    pub fn circles(&self) -> impl Iterator<Item = &CirclePrimitive> {
        self.circles.values()
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<&MarkerPrimitive> {
        self.markers.get(&handle)
    }

    pub fn center(&self) -> Point<f64> {
        self.center
    }

    /// Total primitives ever created, including removed ones.
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.circles.is_empty()
    }

    pub fn to_geojson(&self) -> anyhow::Result<String> {
        let circles = self.circles.values().map(|c| MapFeature {
            kind: "geofence",
            color: c.style.color,
            label: None,
            popup: None,
            radius: Some(c.radius),
            fill_opacity: Some(c.style.fill_opacity),
            geometry: c.center,
        });
        let markers = self.markers.values().map(|m| MapFeature {
            kind: "marker",
            color: m.icon.color,
            label: m.icon.label.clone(),
            popup: m.popup.clone(),
            radius: None,
            fill_opacity: None,
            geometry: m.at,
        });

        let features: Vec<MapFeature> = circles.chain(markers).collect();

        geojson::ser::to_feature_collection_string(&features).context("Failed to serialize map")
    }
}

impl MapSurface for GeoJsonSurface {
    fn add_marker(
        &mut self,
        at: Point<f64>,
        icon: MarkerIcon,
        popup: Option<String>,
    ) -> MarkerHandle {
        let handle = MarkerHandle(self.next_handle());
        self.markers
            .insert(handle, MarkerPrimitive { at, icon, popup });
        handle
    }

    fn set_marker_icon(&mut self, marker: MarkerHandle, icon: MarkerIcon) {
        if let Some(m) = self.markers.get_mut(&marker) {
            m.icon = icon;
        }
    }

    fn move_marker(&mut self, marker: MarkerHandle, to: Point<f64>) {
        if let Some(m) = self.markers.get_mut(&marker) {
            m.at = to;
        }
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        self.markers.remove(&marker);
    }

    fn add_circle(&mut self, center: Point<f64>, radius: f64, style: CircleStyle) -> CircleHandle {
        let handle = CircleHandle(self.next_handle());
        self.circles.insert(
            handle,
            CirclePrimitive {
                center,
                radius,
                style,
            },
        );
        handle
    }

    fn set_circle_style(&mut self, circle: CircleHandle, style: CircleStyle) {
        if let Some(c) = self.circles.get_mut(&circle) {
            c.style = style;
        }
    }

    fn remove_circle(&mut self, circle: CircleHandle) {
        self.circles.remove(&circle);
    }

    fn zoom(&self) -> u8 {
        self.zoom
    }

    fn set_view(&mut self, center: Point<f64>, zoom: u8) {
        self.center = center;
        self.zoom = zoom.min(self.max_zoom);
    }
}
