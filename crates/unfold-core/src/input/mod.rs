//! Input abstraction layer.

pub mod gesture;
pub mod mock;


/// Magnitude carried by keyboard navigation keys.
pub const KEY_MAGNITUDE: i32 = 100;

/// Physical origin of a raw input event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputSource {
    Wheel,
    Keyboard,
}

/// One raw wheel or keyboard event. Positive magnitude means forward.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RawInput {
    pub at_ms: u64,
    pub source: InputSource,
    pub magnitude: i32,
}

impl RawInput {
    pub const fn wheel(at_ms: u64, delta: i32) -> Self {
        Self {
            at_ms,
            source: InputSource::Wheel,
            magnitude: delta,
        }
    }

    pub const fn key_forward(at_ms: u64) -> Self {
        Self {
            at_ms,
            source: InputSource::Keyboard,
            magnitude: KEY_MAGNITUDE,
        }
    }

    pub const fn key_backward(at_ms: u64) -> Self {
        Self {
            at_ms,
            source: InputSource::Keyboard,
            magnitude: -KEY_MAGNITUDE,
        }
    }

    pub const fn is_forward(&self) -> bool {
        self.magnitude > 0
    }
}

/// Discrete navigation command derived from raw input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Intent {
    Advance,
    Retreat,
}

/// Polled input provider.
pub trait InputProvider {
    type Error;

    fn poll_event(&mut self) -> Result<Option<RawInput>, Self::Error>;
}
