use std::collections::VecDeque;
use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info};
use thiserror::Error;

use crate::{
    session::{EventSink, TourEvent},
    tour::{io::read_trace, position::PositionSample},
};

/// Acquisition preferences passed to a [`LocationSource`].
///
/// `high_accuracy` and `timeout` are hints for live sources; a replayed trace
/// only honours `maximum_age`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationOptions {
    pub high_accuracy: bool,
    /// Oldest acceptable fix, relative to the newest one seen. Zero accepts every fix.
    pub maximum_age: TimeDelta,
    pub timeout: TimeDelta,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: TimeDelta::zero(),
            timeout: TimeDelta::seconds(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable")]
    Unavailable,
    #[error("timed out acquiring location")]
    Timeout,
    #[error("location services are not supported")]
    Unsupported,
}

impl LocationError {
    /// Notice shown to the user when acquisition fails.
    pub fn alert_message(&self) -> &'static str {
        match self {
            LocationError::Unsupported => "Geolocation is not supported by this device.",
            _ => "Unable to access location. Please enable location services.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Push source of position fixes.
///
/// Fixes and asynchronous failures are delivered as [`TourEvent`]s through the
/// sink handed over on subscribe. After `unsubscribe` nothing more is sent.
pub trait LocationSource {
    fn subscribe(
        &mut self,
        options: &LocationOptions,
        sink: EventSink,
    ) -> Result<SubscriptionId, LocationError>;

    fn unsubscribe(&mut self, id: SubscriptionId);
}

struct Subscription {
    id: SubscriptionId,
    options: LocationOptions,
    sink: EventSink,
    newest: Option<DateTime<Utc>>,
}

/// Replays a recorded trace, one fix per [`TraceSource::advance`] call.
pub struct TraceSource {
    samples: VecDeque<PositionSample>,
    subscription: Option<Subscription>,
    next_id: u64,
}

impl TraceSource {
    pub fn new(samples: Vec<PositionSample>) -> Self {
        Self {
            samples: samples.into(),
            subscription: None,
            next_id: 1,
        }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self::new(read_trace(path)?))
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }

    /// Pushes the next fix to the subscriber. Returns false once the trace is
    /// exhausted or nobody is subscribed.
    pub fn advance(&mut self) -> bool {
        let Some(sub) = self.subscription.as_mut() else {
            return false;
        };

        while let Some(sample) = self.samples.pop_front() {
            if is_stale(&sample, sub.newest, sub.options.maximum_age) {
                debug!("Dropping stale fix {sample:?}");
                continue;
            }

            if let Some(ts) = sample.timestamp {
                sub.newest = Some(sub.newest.map_or(ts, |newest| newest.max(ts)));
            }

            sub.sink.emit(TourEvent::Position(sample));
            return true;
        }

        false
    }
}

fn is_stale(
    sample: &PositionSample,
    newest: Option<DateTime<Utc>>,
    maximum_age: TimeDelta,
) -> bool {
    if maximum_age <= TimeDelta::zero() {
        return false;
    }

    match (sample.timestamp, newest) {
        (Some(ts), Some(newest)) => newest - ts > maximum_age,
        _ => false,
    }
}

impl LocationSource for TraceSource {
    fn subscribe(
        &mut self,
        options: &LocationOptions,
        sink: EventSink,
    ) -> Result<SubscriptionId, LocationError> {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        info!(
            "Replaying {} trace fixes (subscription {}, accuracy {}, timeout {}s, max age {}s)",
            self.samples.len(),
            id.0,
            if options.high_accuracy { "high" } else { "coarse" },
            options.timeout.num_seconds(),
            options.maximum_age.num_seconds()
        );

        self.subscription = Some(Subscription {
            id,
            options: *options,
            sink,
            newest: None,
        });

        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        if self.subscription.as_ref().is_some_and(|s| s.id == id) {
            info!("Trace subscription {} released", id.0);
            self.subscription = None;
        }
    }
}
