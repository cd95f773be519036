use std::{collections::HashSet, sync::mpsc::Sender};

use log::{debug, info, warn};

use crate::{
    location::LocationError,
    speech::SpeechSignal,
    tour::{
        position::PositionSample,
        stop::{Stop, StopId},
    },
    trigger::{evaluate, next_pending_stop, TriggerResult},
};

/// Everything that can happen to a tour session.
#[derive(Debug, Clone, PartialEq)]
pub enum TourEvent {
    Start,
    Position(PositionSample),
    LocationFailed(LocationError),
    End,
    Speech(SpeechSignal),
    ReplayNarration,
    StopNarration,
}

/// Work the session asks its collaborators to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Subscribe,
    Unsubscribe,
    Speak(String),
    CancelSpeech,
    Alert(String),
}

/// Sending half of the inbound event queue, handed to collaborators.
#[derive(Debug, Clone)]
pub struct EventSink(Sender<TourEvent>);

impl EventSink {
    pub fn new(sender: Sender<TourEvent>) -> Self {
        Self(sender)
    }

    pub fn emit(&self, event: TourEvent) {
        if let Err(err) = self.0.send(event) {
            warn!("Event queue closed, dropping {:?}", err.0);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TourPhase<'a> {
    NotStarted,
    Touring {
        active: Option<&'a Stop>,
        next: &'a Stop,
    },
    Complete,
}

/// Mutable state of one tour run, from start until end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourSession {
    started: bool,
    position: Option<PositionSample>,
    current_stop: Option<StopId>,
    completed: HashSet<StopId>,
    last_triggered: Option<StopId>,
    speaking: bool,
    /// Cleared when the location source fails; fixes are ignored until the next start.
    tracking: bool,
}

impl TourSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: TourEvent, stops: &[Stop]) -> Vec<Effect> {
        match event {
            TourEvent::Start => {
                if self.started && self.tracking {
                    debug!("Tour already started");
                    return vec![];
                }
                if self.started {
                    info!("Resuming location updates");
                } else {
                    info!("Tour started with {} stops", stops.len());
                }
                self.started = true;
                self.tracking = true;
                vec![Effect::Subscribe]
            }
            TourEvent::End => {
                info!(
                    "Tour ended after {} of {} stops",
                    self.completed.len(),
                    stops.len()
                );
                *self = Self::default();
                vec![Effect::Unsubscribe, Effect::CancelSpeech]
            }
            TourEvent::Position(sample) => self.on_position(sample, stops),
            TourEvent::LocationFailed(err) => {
                if !self.started || !self.tracking {
                    debug!("Ignoring location failure while not tracking: {err}");
                    return vec![];
                }

                warn!("Location acquisition failed: {err}");
                let effects = vec![
                    Effect::Alert(err.alert_message().to_owned()),
                    Effect::Unsubscribe,
                ];

                if self.position.is_none() {
                    // Never got a fix, so the tour never really started.
                    *self = Self::default();
                } else {
                    self.tracking = false;
                }

                effects
            }
            TourEvent::Speech(signal) => {
                if !self.started {
                    debug!("Ignoring speech signal outside a tour: {signal:?}");
                    return vec![];
                }
                self.speaking = signal == SpeechSignal::Started;
                vec![]
            }
            TourEvent::ReplayNarration => {
                if self.speaking {
                    return vec![];
                }
                match self.current_stop(stops) {
                    Some(stop) => vec![Effect::Speak(stop.narration.clone())],
                    None => vec![],
                }
            }
            TourEvent::StopNarration => {
                self.speaking = false;
                vec![Effect::CancelSpeech]
            }
        }
    }

    fn on_position(&mut self, sample: PositionSample, stops: &[Stop]) -> Vec<Effect> {
        if !self.started || !self.tracking {
            debug!("Ignoring fix while not tracking: {sample:?}");
            return vec![];
        }

        self.position = Some(sample);

        match evaluate(sample.coord, stops, self.last_triggered) {
            TriggerResult::NoTrigger => vec![],
            TriggerResult::Triggered { stop, distance } => {
                info!(
                    "Reached stop {} ({}) at {distance:.1}m",
                    stop.id, stop.name
                );
                self.completed.insert(stop.id);
                self.current_stop = Some(stop.id);
                self.last_triggered = Some(stop.id);
                vec![Effect::Speak(stop.narration.clone())]
            }
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn position(&self) -> Option<&PositionSample> {
        self.position.as_ref()
    }

    pub fn completed(&self) -> &HashSet<StopId> {
        &self.completed
    }

    pub fn last_triggered(&self) -> Option<StopId> {
        self.last_triggered
    }

    pub fn current_stop<'a>(&self, stops: &'a [Stop]) -> Option<&'a Stop> {
        let id = self.current_stop?;
        stops.iter().find(|s| s.id == id)
    }

    pub fn next_stop<'a>(&self, stops: &'a [Stop]) -> Option<&'a Stop> {
        next_pending_stop(stops, &self.completed)
    }

    pub fn phase<'a>(&self, stops: &'a [Stop]) -> TourPhase<'a> {
        if !self.started {
            return TourPhase::NotStarted;
        }

        match self.next_stop(stops) {
            Some(next) => TourPhase::Touring {
                active: self.current_stop(stops),
                next,
            },
            None => TourPhase::Complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_stops() -> Vec<Stop> {
        vec![
            Stop::new(StopId::new(1), "Stearns Wharf", 34.4087, -119.6857, 75.0)
                .with_narration("Welcome to the wharf."),
            Stop::new(StopId::new(2), "Funk Zone", 34.4036, -119.6916, 100.0)
                .with_narration("This is the Funk Zone."),
        ]
    }

    fn ids(session: &TourSession) -> Vec<u32> {
        let mut ids: Vec<u32> = session.completed().iter().map(|id| id.get()).collect();
        ids.sort();
        ids
    }

    fn fix(lat: f64, lng: f64) -> TourEvent {
        TourEvent::Position(PositionSample::new(lat, lng))
    }

    fn started(stops: &[Stop]) -> TourSession {
        let mut session = TourSession::new();
        assert_eq!(session.apply(TourEvent::Start, stops), vec![Effect::Subscribe]);
        session
    }

    #[test]
    fn walks_the_two_stop_scenario() {
        let stops = scenario_stops();
        let mut session = started(&stops);

        let effects = session.apply(fix(34.4087, -119.6857), &stops);
        assert_eq!(effects, vec![Effect::Speak("Welcome to the wharf.".to_owned())]);
        assert_eq!(ids(&session), vec![1]);
        assert_eq!(session.current_stop(&stops).map(|s| s.id.get()), Some(1));

        let effects = session.apply(fix(34.4087, -119.6857), &stops);
        assert!(effects.is_empty());

        let effects = session.apply(fix(34.4036, -119.6916), &stops);
        assert_eq!(effects, vec![Effect::Speak("This is the Funk Zone.".to_owned())]);
        assert_eq!(ids(&session), vec![1, 2]);
        assert!(session.next_stop(&stops).is_none());
        assert_eq!(session.phase(&stops), TourPhase::Complete);
    }

    #[test]
    fn sticky_guard_survives_leaving_the_geofence() {
        let stops = scenario_stops();
        let mut session = started(&stops);
        let at_wharf = PositionSample::new(34.4087, -119.6857);
        let elsewhere = PositionSample::new(34.4200, -119.7000);

        assert_eq!(session.apply(TourEvent::Position(at_wharf), &stops).len(), 1);
        assert!(session.apply(TourEvent::Position(elsewhere), &stops).is_empty());
        assert!(session.apply(TourEvent::Position(at_wharf), &stops).is_empty());
        assert_eq!(session.last_triggered(), Some(StopId::new(1)));
    }

    #[test]
    fn fixes_before_start_are_ignored() {
        let stops = scenario_stops();
        let mut session = TourSession::new();

        let effects = session.apply(fix(34.4087, -119.6857), &stops);
        assert!(effects.is_empty());
        assert!(session.completed().is_empty());
        assert!(session.position().is_none());
    }

    #[test]
    fn start_twice_subscribes_once() {
        let stops = scenario_stops();
        let mut session = started(&stops);
        assert!(session.apply(TourEvent::Start, &stops).is_empty());
    }

    #[test]
    fn end_resets_to_a_fresh_session() {
        let stops = scenario_stops();
        let mut session = started(&stops);
        session.apply(fix(34.4087, -119.6857), &stops);
        session.apply(TourEvent::Speech(SpeechSignal::Started), &stops);

        let effects = session.apply(TourEvent::End, &stops);
        assert_eq!(effects, vec![Effect::Unsubscribe, Effect::CancelSpeech]);
        assert_eq!(session, TourSession::new());
        assert_eq!(session.phase(&stops), TourPhase::NotStarted);

        // A restart fires the first stop again.
        session.apply(TourEvent::Start, &stops);
        let effects = session.apply(fix(34.4087, -119.6857), &stops);
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn failure_before_first_fix_cancels_start() {
        let stops = scenario_stops();
        let mut session = started(&stops);

        let failure = TourEvent::LocationFailed(LocationError::PermissionDenied);
        let effects = session.apply(failure, &stops);
        assert_eq!(
            effects,
            vec![
                Effect::Alert(
                    "Unable to access location. Please enable location services.".to_owned()
                ),
                Effect::Unsubscribe
            ]
        );
        assert!(!session.is_started());
    }

    #[test]
    fn failure_mid_tour_stops_tracking_but_keeps_progress() {
        let stops = scenario_stops();
        let mut session = started(&stops);
        session.apply(fix(34.4087, -119.6857), &stops);

        let effects = session.apply(TourEvent::LocationFailed(LocationError::Timeout), &stops);
        assert_eq!(
            effects,
            vec![
                Effect::Alert(
                    "Unable to access location. Please enable location services.".to_owned()
                ),
                Effect::Unsubscribe
            ]
        );
        assert!(session.is_started());
        assert!(!session.is_tracking());
        assert_eq!(ids(&session), vec![1]);

        // Late fixes are dropped and a repeated failure is not re-reported.
        assert!(session.apply(fix(34.4036, -119.6916), &stops).is_empty());
        assert!(session
            .apply(TourEvent::LocationFailed(LocationError::Timeout), &stops)
            .is_empty());
        assert_eq!(ids(&session), vec![1]);

        // Starting again resubscribes without losing progress.
        assert_eq!(session.apply(TourEvent::Start, &stops), vec![Effect::Subscribe]);
        let effects = session.apply(fix(34.4036, -119.6916), &stops);
        assert_eq!(effects, vec![Effect::Speak("This is the Funk Zone.".to_owned())]);
        assert_eq!(ids(&session), vec![1, 2]);
    }

    #[test]
    fn speech_signals_after_end_are_ignored() {
        let stops = scenario_stops();
        let mut session = started(&stops);
        session.apply(TourEvent::End, &stops);

        assert!(session.apply(TourEvent::Speech(SpeechSignal::Started), &stops).is_empty());
        assert!(!session.is_speaking());
        assert_eq!(session, TourSession::new());
    }

    #[test]
    fn speech_signals_drive_playback_flag() {
        let stops = scenario_stops();
        let mut session = started(&stops);

        session.apply(TourEvent::Speech(SpeechSignal::Started), &stops);
        assert!(session.is_speaking());
        session.apply(TourEvent::Speech(SpeechSignal::Failed), &stops);
        assert!(!session.is_speaking());
        session.apply(TourEvent::Speech(SpeechSignal::Started), &stops);
        session.apply(TourEvent::Speech(SpeechSignal::Ended), &stops);
        assert!(!session.is_speaking());
    }

    #[test]
    fn replay_needs_a_current_stop_and_silence() {
        let stops = scenario_stops();
        let mut session = started(&stops);
        assert!(session.apply(TourEvent::ReplayNarration, &stops).is_empty());

        session.apply(fix(34.4087, -119.6857), &stops);
        session.apply(TourEvent::Speech(SpeechSignal::Started), &stops);
        assert!(session.apply(TourEvent::ReplayNarration, &stops).is_empty());

        let effects = session.apply(TourEvent::StopNarration, &stops);
        assert_eq!(effects, vec![Effect::CancelSpeech]);
        assert!(!session.is_speaking());

        let effects = session.apply(TourEvent::ReplayNarration, &stops);
        assert_eq!(effects, vec![Effect::Speak("Welcome to the wharf.".to_owned())]);
    }

    #[test]
    fn phase_reports_next_stop_between_stops() {
        let stops = scenario_stops();
        let mut session = started(&stops);

        match session.phase(&stops) {
            TourPhase::Touring { active, next } => {
                assert!(active.is_none());
                assert_eq!(next.id, StopId::new(1));
            }
            other => panic!("unexpected phase {other:?}"),
        }

        session.apply(fix(34.4087, -119.6857), &stops);
        match session.phase(&stops) {
            TourPhase::Touring { active, next } => {
                assert_eq!(active.map(|s| s.id), Some(StopId::new(1)));
                assert_eq!(next.id, StopId::new(2));
            }
            other => panic!("unexpected phase {other:?}"),
        }
    }

    #[test]
    fn empty_tour_is_complete_immediately() {
        let mut session = TourSession::new();
        session.apply(TourEvent::Start, &[]);
        assert!(session.apply(fix(0.0, 0.0), &[]).is_empty());
        assert_eq!(session.phase(&[]), TourPhase::Complete);
    }
}
