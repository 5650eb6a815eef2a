//! Status LED
//!
//! Blinks the generator status on a single GPIO. The LED is advanced by a
//! periodic `tick`, so it needs no timer of its own.

use synchron_core::status::{BlinkPattern, GeneratorStatus};
use synchron_core::traits::StatusIndicator;
use synchron_hal::OutputPin;

/// Status LED on a GPIO pin
pub struct StatusLed<P> {
    pin: P,
    /// If true, LED on = pin LOW
    inverted: bool,
    status: GeneratorStatus,
    pattern: BlinkPattern,
    elapsed_ms: u32,
}

impl<P: OutputPin> StatusLed<P> {
    /// Create a status LED showing `Starting`
    ///
    /// # Arguments
    /// - `pin`: The GPIO pin driving the LED
    /// - `inverted`: If true, the LED is lit when the pin is LOW
    pub fn new(pin: P, inverted: bool) -> Self {
        let status = GeneratorStatus::Starting;
        let mut led = Self {
            pin,
            inverted,
            status,
            pattern: status.pattern(),
            elapsed_ms: 0,
        };
        led.apply();
        led
    }

    /// Current status
    pub fn status(&self) -> GeneratorStatus {
        self.status
    }

    /// Whether the LED is lit right now
    pub fn is_lit(&self) -> bool {
        self.pin.is_set_high() != self.inverted
    }

    /// Advance the blink pattern by `delta_ms`
    pub fn tick(&mut self, delta_ms: u32) {
        let cycle = self.pattern.cycle_ms();
        if cycle > 0 {
            self.elapsed_ms = (self.elapsed_ms % cycle + delta_ms % cycle) % cycle;
        }
        self.apply();
    }

    /// Restart the current pattern from its on phase
    ///
    /// Used to align the running flash with the telegram.
    pub fn restart(&mut self) {
        self.elapsed_ms = 0;
        self.apply();
    }

    fn apply(&mut self) {
        let on = self.pattern.is_on_at(self.elapsed_ms);
        self.pin.set_state(on != self.inverted);
    }
}

impl<P: OutputPin> StatusIndicator for StatusLed<P> {
    fn show(&mut self, status: GeneratorStatus) {
        if status == self.status {
            return;
        }
        self.status = status;
        self.pattern = status.pattern();
        self.restart();
    }
}
