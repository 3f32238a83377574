use heapless::Deque;
use log::debug;

use super::{InputSource, Intent, RawInput};

/// Upper bound for the sliding magnitude window.
pub const MAX_WINDOW: usize = 16;
const READY_QUEUE_LEN: usize = 4;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct GestureConfig {
    continuous_gap_ms: u32,
    cooldown_ms: u32,
    noise_floor: u32,
    window_len: u8,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            continuous_gap_ms: 60,
            cooldown_ms: 100,
            noise_floor: 5,
            window_len: 8,
        }
    }
}

impl GestureConfig {
    pub const fn with_continuous_gap_ms(mut self, continuous_gap_ms: u32) -> Self {
        self.continuous_gap_ms = continuous_gap_ms;
        self
    }

    pub const fn with_cooldown_ms(mut self, cooldown_ms: u32) -> Self {
        self.cooldown_ms = cooldown_ms;
        self
    }

    pub const fn with_noise_floor(mut self, noise_floor: u32) -> Self {
        self.noise_floor = noise_floor;
        self
    }

    pub const fn with_window_len(mut self, window_len: u8) -> Self {
        self.window_len = window_len;
        self
    }

    pub const fn continuous_gap_ms(&self) -> u32 {
        self.continuous_gap_ms
    }

    pub const fn cooldown_ms(&self) -> u32 {
        self.cooldown_ms
    }

    fn window_len(&self) -> usize {
        (self.window_len as usize).clamp(1, MAX_WINDOW)
    }
}

/// How the samples behind an intent arrived.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamKind {
    /// Isolated events: wheel clicks or keys.
    Discrete,
    /// Dense event runs: trackpad swipes and inertial scroll.
    Continuous,
}

/// Intent emitted by [`GestureNormalizer`], attributed to the sample that
/// carried the gesture's impulse.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NormalizedIntent {
    pub intent: Intent,
    pub at_ms: u64,
    pub magnitude: u32,
    pub source: InputSource,
    pub stream: StreamKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Sample {
    at_ms: u64,
    magnitude: u32,
}

#[derive(Debug)]
struct Gesture {
    forward: bool,
    window: Deque<Sample, MAX_WINDOW>,
    peak: Sample,
    last: Sample,
    before_last: Option<Sample>,
    samples: u32,
    emitted: bool,
    /// Cleared by an emission; set again once the magnitude rises.
    armed: bool,
}

impl Gesture {
    fn start(forward: bool, sample: Sample) -> Self {
        let mut window = Deque::new();
        let _ = window.push_back(sample);
        Self {
            forward,
            window,
            peak: sample,
            last: sample,
            before_last: None,
            samples: 1,
            emitted: false,
            armed: true,
        }
    }

    fn record(&mut self, sample: Sample, window_len: usize) {
        while self.window.len() >= window_len {
            let _ = self.window.pop_front();
        }
        let _ = self.window.push_back(sample);

        if sample.magnitude > self.peak.magnitude {
            self.peak = sample;
        }
        if sample.magnitude > self.last.magnitude {
            self.armed = true;
        }
        self.before_last = Some(self.last);
        self.last = sample;
        self.samples = self.samples.saturating_add(1);
    }

    fn window_max(&self) -> u32 {
        self.window
            .iter()
            .map(|sample| sample.magnitude)
            .max()
            .unwrap_or(0)
    }

    fn intent(&self) -> Intent {
        if self.forward {
            Intent::Advance
        } else {
            Intent::Retreat
        }
    }

    fn stream(&self) -> StreamKind {
        if self.samples > 1 {
            StreamKind::Continuous
        } else {
            StreamKind::Discrete
        }
    }
}

/// Turns wheel and keyboard events into at most one intent per gesture impulse.
///
/// Wheel samples closer together than the continuous gap form one gesture.
/// Inside a gesture an intent fires when the magnitude turns down right after
/// a strict local maximum that is also the window's peak. After firing, the
/// gesture must rise again before it can fire a second time, so a flat or
/// decaying inertia tail never counts as a new impulse. A gesture that never
/// turned down fires once when it closes. Every emission respects the cooldown.
#[derive(Debug)]
pub struct GestureNormalizer {
    config: GestureConfig,
    gesture: Option<Gesture>,
    last_emit_ms: Option<u64>,
    ready: Deque<NormalizedIntent, READY_QUEUE_LEN>,
}

impl GestureNormalizer {
    pub const fn new(config: GestureConfig) -> Self {
        Self {
            config,
            gesture: None,
            last_emit_ms: None,
            ready: Deque::new(),
        }
    }

    pub const fn config(&self) -> GestureConfig {
        self.config
    }

    pub fn push(&mut self, event: RawInput) {
        match event.source {
            InputSource::Keyboard => self.push_key(event),
            InputSource::Wheel => self.push_wheel(event),
        }
    }

    /// Closes a gesture that has gone quiet and returns the next ready intent.
    pub fn poll(&mut self, now_ms: u64) -> Option<NormalizedIntent> {
        let gap = self.config.continuous_gap_ms as u64;
        if self
            .gesture
            .as_ref()
            .is_some_and(|gesture| now_ms.saturating_sub(gesture.last.at_ms) >= gap)
        {
            self.close_gesture();
        }

        self.ready.pop_front()
    }

    /// Whether a gesture is still open or intents are waiting to be polled.
    pub fn has_pending(&self) -> bool {
        self.gesture.is_some() || !self.ready.is_empty()
    }

    pub fn reset(&mut self) {
        self.gesture = None;
        self.last_emit_ms = None;
        self.ready.clear();
    }

    fn push_key(&mut self, event: RawInput) {
        self.close_gesture();

        let intent = if event.magnitude >= 0 {
            Intent::Advance
        } else {
            Intent::Retreat
        };
        let _ = self.emit(NormalizedIntent {
            intent,
            at_ms: event.at_ms,
            magnitude: event.magnitude.unsigned_abs(),
            source: InputSource::Keyboard,
            stream: StreamKind::Discrete,
        });
    }

    fn push_wheel(&mut self, event: RawInput) {
        let magnitude = event.magnitude.unsigned_abs();
        if magnitude < self.config.noise_floor {
            debug!(
                "gesture: dropped below noise floor at_ms={} magnitude={}",
                event.at_ms, event.magnitude
            );
            return;
        }

        let forward = event.is_forward();
        let sample = Sample {
            at_ms: event.at_ms,
            magnitude,
        };
        let gap = self.config.continuous_gap_ms as u64;

        let joins_current = self.gesture.as_ref().is_some_and(|gesture| {
            gesture.forward == forward && event.at_ms.saturating_sub(gesture.last.at_ms) < gap
        });
        if !joins_current {
            self.close_gesture();
            self.gesture = Some(Gesture::start(forward, sample));
            return;
        }

        let window_len = self.config.window_len();
        let Some(gesture) = self.gesture.as_mut() else {
            return;
        };
        let previous = gesture.last;
        let rose_into_previous = gesture
            .before_last
            .is_none_or(|before| previous.magnitude > before.magnitude);
        gesture.record(sample, window_len);

        let turned_at_peak = gesture.armed
            && rose_into_previous
            && sample.magnitude < previous.magnitude
            && previous.magnitude >= gesture.window_max();
        if !turned_at_peak {
            return;
        }

        let candidate = NormalizedIntent {
            intent: gesture.intent(),
            at_ms: previous.at_ms,
            magnitude: previous.magnitude,
            source: InputSource::Wheel,
            stream: StreamKind::Continuous,
        };
        if self.emit(candidate)
            && let Some(gesture) = self.gesture.as_mut()
        {
            gesture.emitted = true;
            gesture.armed = false;
        }
    }

    fn close_gesture(&mut self) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        if gesture.emitted {
            return;
        }

        let _ = self.emit(NormalizedIntent {
            intent: gesture.intent(),
            at_ms: gesture.peak.at_ms,
            magnitude: gesture.peak.magnitude,
            source: InputSource::Wheel,
            stream: gesture.stream(),
        });
    }

    fn emit(&mut self, candidate: NormalizedIntent) -> bool {
        let cooldown = self.config.cooldown_ms as u64;
        if let Some(last) = self.last_emit_ms
            && candidate.at_ms.saturating_sub(last) < cooldown
        {
            debug!(
                "gesture: cooldown suppressed {:?} at_ms={} last_emit_ms={}",
                candidate.intent, candidate.at_ms, last
            );
            return false;
        }

        if self.ready.is_full() {
            let _ = self.ready.pop_front();
        }
        let _ = self.ready.push_back(candidate);
        self.last_emit_ms = Some(candidate.at_ms);

        debug!(
            "gesture: emit {:?} at_ms={} magnitude={} stream={:?} source={:?}",
            candidate.intent, candidate.at_ms, candidate.magnitude, candidate.stream, candidate.source
        );
        true
    }
}

impl Default for GestureNormalizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}
