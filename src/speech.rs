use log::{debug, info};

use crate::{
    config::SpeechConfig,
    session::{EventSink, TourEvent},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: &str, config: &SpeechConfig) -> Self {
        Self {
            text: text.to_owned(),
            rate: config.rate,
            pitch: config.pitch,
            volume: config.volume,
        }
    }
}

/// Lifecycle signals reported by a speech output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechSignal {
    Started,
    Ended,
    Failed,
}

/// Text-to-speech collaborator. Lifecycle signals go back through `signals`
/// as [`TourEvent::Speech`].
pub trait SpeechOutput {
    fn speak(&mut self, utterance: Utterance, signals: &EventSink);
    fn cancel(&mut self, signals: &EventSink);
}

/// Keeps at most one utterance alive on the wrapped output.
pub struct Narrator<S> {
    output: S,
    config: SpeechConfig,
}

impl<S: SpeechOutput> Narrator<S> {
    pub fn new(output: S, config: SpeechConfig) -> Self {
        Self { output, config }
    }

    pub fn speak(&mut self, text: &str, signals: &EventSink) {
        self.output.cancel(signals);
        self.output.speak(Utterance::new(text, &self.config), signals);
    }

    pub fn cancel(&mut self, signals: &EventSink) {
        self.output.cancel(signals);
    }

    pub fn output(&self) -> &S {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut S {
        &mut self.output
    }
}

/// Writes narrations to the log instead of an audio device. Playback finishes
/// as soon as it starts.
#[derive(Debug, Default)]
pub struct LogSpeech {
    spoken: usize,
}

impl LogSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> usize {
        self.spoken
    }
}

impl SpeechOutput for LogSpeech {
    fn speak(&mut self, utterance: Utterance, signals: &EventSink) {
        signals.emit(TourEvent::Speech(SpeechSignal::Started));
        info!("Narrating (rate {}): {}", utterance.rate, utterance.text);
        self.spoken += 1;
        signals.emit(TourEvent::Speech(SpeechSignal::Ended));
    }

    fn cancel(&mut self, _signals: &EventSink) {
        debug!("Nothing to cancel");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl SpeechOutput for Recorder {
        fn speak(&mut self, utterance: Utterance, _signals: &EventSink) {
            self.calls.push(format!("speak:{}", utterance.text));
        }

        fn cancel(&mut self, _signals: &EventSink) {
            self.calls.push("cancel".to_owned());
        }
    }

    #[test]
    fn narrator_cancels_before_speaking() {
        let (tx, _rx) = mpsc::channel();
        let sink = EventSink::new(tx);
        let mut narrator = Narrator::new(Recorder::default(), SpeechConfig::default());

        narrator.speak("one", &sink);
        narrator.speak("two", &sink);

        assert_eq!(
            narrator.output().calls,
            vec!["cancel", "speak:one", "cancel", "speak:two"]
        );
    }

    #[test]
    fn utterance_uses_configured_voice() {
        let config = SpeechConfig {
            rate: 1.2,
            ..SpeechConfig::default()
        };
        let utterance = Utterance::new("hello", &config);

        assert_eq!(utterance.rate, 1.2);
        assert_eq!(utterance.pitch, 1.0);
        assert_eq!(utterance.volume, 1.0);
    }

    #[test]
    fn log_speech_reports_start_then_end() {
        let (tx, rx) = mpsc::channel();
        let sink = EventSink::new(tx);
        let mut speech = LogSpeech::new();

        speech.speak(Utterance::new("hi", &SpeechConfig::default()), &sink);

        let signals: Vec<TourEvent> = rx.try_iter().collect();
        assert_eq!(
            signals,
            vec![
                TourEvent::Speech(SpeechSignal::Started),
                TourEvent::Speech(SpeechSignal::Ended)
            ]
        );
        assert_eq!(speech.spoken(), 1);
    }
}
