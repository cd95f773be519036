use std::sync::mpsc::{self, Receiver};

use log::{error, warn};

use crate::{
    config::TourConfig,
    location::{LocationSource, SubscriptionId},
    map_view::{MapSurface, MapSyncView},
    session::{Effect, EventSink, TourEvent, TourPhase, TourSession},
    speech::{Narrator, SpeechOutput},
    tour::{Progress, Tour},
};

/// Single-threaded driver for a tour.
///
/// Collaborators push events into an inbound queue; [`TourController::process`]
/// drains it in arrival order, applies each event to the session and carries
/// out the resulting effects before looking at the next one.
pub struct TourController<L, S, M> {
    tour: Tour,
    config: TourConfig,
    session: TourSession,
    location: L,
    narrator: Narrator<S>,
    map: MapSyncView<M>,
    subscription: Option<SubscriptionId>,
    sink: EventSink,
    events: Receiver<TourEvent>,
    alerts: Vec<String>,
}

impl<L, S, M> TourController<L, S, M>
where
    L: LocationSource,
    S: SpeechOutput,
    M: MapSurface,
{
    pub fn new(tour: Tour, config: TourConfig, location: L, speech: S, surface: M) -> Self {
        let (tx, rx) = mpsc::channel();

        Self {
            narrator: Narrator::new(speech, config.speech),
            map: MapSyncView::new(surface, &config.map),
            tour,
            config,
            session: TourSession::new(),
            location,
            subscription: None,
            sink: EventSink::new(tx),
            events: rx,
            alerts: vec![],
        }
    }

    pub fn sink(&self) -> EventSink {
        self.sink.clone()
    }

    /// Queues `event` and processes everything pending.
    pub fn dispatch(&mut self, event: TourEvent) {
        self.sink.emit(event);
        self.process();
    }

    pub fn process(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle(event);
        }
    }

    fn handle(&mut self, event: TourEvent) {
        let effects = self.session.apply(event, &self.tour.stops);
        for effect in effects {
            self.execute(effect);
        }

        if self.session.is_started() {
            self.map.sync(
                &self.tour.stops,
                self.session.position().map(|p| p.coord),
                self.session.completed(),
            );
        } else {
            self.map.teardown();
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Subscribe => {
                match self
                    .location
                    .subscribe(&self.config.location, self.sink.clone())
                {
                    Ok(id) => self.subscription = Some(id),
                    Err(err) => {
                        error!("Failed to subscribe to location updates: {err}");
                        self.sink.emit(TourEvent::LocationFailed(err));
                    }
                }
            }
            Effect::Unsubscribe => {
                if let Some(id) = self.subscription.take() {
                    self.location.unsubscribe(id);
                }
            }
            Effect::Speak(text) => self.narrator.speak(&text, &self.sink),
            Effect::CancelSpeech => self.narrator.cancel(&self.sink),
            Effect::Alert(message) => {
                warn!("{message}");
                self.alerts.push(message);
            }
        }
    }

    /// User-visible notices raised since the last call.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    pub fn session(&self) -> &TourSession {
        &self.session
    }

    pub fn phase(&self) -> TourPhase<'_> {
        self.session.phase(&self.tour.stops)
    }

    pub fn progress(&self) -> Progress {
        self.tour.progress(self.session.completed())
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    pub fn location_mut(&mut self) -> &mut L {
        &mut self.location
    }

    pub fn speech(&self) -> &S {
        self.narrator.output()
    }

    pub fn speech_mut(&mut self) -> &mut S {
        self.narrator.output_mut()
    }

    pub fn map(&self) -> &M {
        self.map.surface()
    }
}
