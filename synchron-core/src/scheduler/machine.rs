//! Telegram scheduler state machine
//!
//! Owns the phase state and decides, for every notification from the pulse
//! interrupt, when the next telegram has to start. The firmware task only
//! waits, sleeps and writes; every timing decision is made here so it can
//! be exercised on the host with simulated pulse trains.
//!
//! ```text
//!   Bootstrapping ──BoundaryFound──▶ SteadyState ◀──PulseReceived── PulseLost
//!                                         │                            ▲
//!                                         └────────PulseTimeout────────┘
//! ```

use super::bootstrap::Bootstrap;
use super::jitter::JitterStats;
use super::phase::{lead_ticks, ms_to_ticks, PhaseLock, PulseVerdict};
use crate::config::{GeneratorConfig, PULSE_PERIOD_MS};
use crate::error::{ConfigurationFault, Fault};
use crate::status::GeneratorStatus;
use crate::telegram::{encode_with_sentinel, Telegram, TELEGRAM_LEN};
use crate::time::TimeValidity;
use crate::traits::TimeSource;
use crate::Ticks;

/// Scheduler states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerState {
    /// Looking for the first second boundary
    Bootstrapping,
    /// Locked to the pulse, one telegram per pulse
    SteadyState,
    /// Watchdog expired, waiting for the pulse to come back
    PulseLost,
}

/// Events driving the scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerEvent {
    /// Time source crossed a second boundary
    BoundaryFound,
    /// A valid pulse notification arrived
    PulseReceived,
    /// No notification within the watchdog window
    PulseTimeout,
}

impl SchedulerState {
    /// Next state for an event; unlisted pairs keep the current state
    pub fn transition(self, event: SchedulerEvent) -> Self {
        use SchedulerEvent::*;
        use SchedulerState::*;

        match (self, event) {
            (Bootstrapping, BoundaryFound) => SteadyState,
            (SteadyState, PulseTimeout) => PulseLost,
            (PulseLost, PulseReceived) => SteadyState,
            (state, _) => state,
        }
    }

    /// Status shown on the indicator
    pub fn status(&self) -> GeneratorStatus {
        match self {
            SchedulerState::Bootstrapping => GeneratorStatus::Starting,
            SchedulerState::SteadyState => GeneratorStatus::Running,
            SchedulerState::PulseLost => GeneratorStatus::PulseLost,
        }
    }
}

/// Timing constants, in platform ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchedulerTiming {
    /// Pulse period
    pub period: Ticks,
    /// Time to transmit one telegram
    pub lead: Ticks,
    /// Maximum wait for a pulse notification
    pub watchdog: Ticks,
    /// Maximum tolerated wake-up lateness
    pub jitter_budget: Ticks,
    /// Deadline for finding the first second boundary
    pub bootstrap_timeout: Ticks,
    /// Monitor byte for unset time
    pub unset_monitor: u8,
}

impl SchedulerTiming {
    /// Derive tick constants from the configuration
    pub fn from_config(config: &GeneratorConfig, tick_hz: u64) -> Result<Self, ConfigurationFault> {
        config.validate()?;

        let period = ms_to_ticks(PULSE_PERIOD_MS, tick_hz);
        let lead = lead_ticks(&config.serial_config(), TELEGRAM_LEN, tick_hz);
        if lead >= period {
            return Err(ConfigurationFault::LeadExceedsPeriod);
        }

        Ok(Self {
            period,
            lead,
            watchdog: period * config.watchdog_percent as u64 / 100,
            jitter_budget: ms_to_ticks(config.jitter_budget_ms, tick_hz),
            bootstrap_timeout: ms_to_ticks(config.bootstrap_timeout_ms, tick_hz),
            unset_monitor: config.unset_monitor_byte(),
        })
    }
}

/// What to do with a pulse notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseAction {
    /// Sleep until `wake`, then transmit the next second's telegram
    Transmit {
        wake: Ticks,
        verdict: PulseVerdict,
        /// First pulse after a pulse-lost period
        recovered: bool,
    },
    /// Drop the notification
    Ignore,
}

/// Result of comparing the actual wake-up with the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeVerdict {
    /// Within the jitter budget; carries the lateness
    OnTime(Ticks),
    /// Beyond the jitter budget; the telegram must be skipped
    Late(Ticks),
}

/// Running counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchedulerStats {
    /// Telegrams handed to the transport
    pub telegrams: u32,
    /// Pulse periods that passed without a notification
    pub missed_pulses: u32,
    /// Notifications rejected as too close to the previous one
    pub spurious_pulses: u32,
    /// Cycles skipped because the wake-up was too late
    pub late_wakes: u32,
    /// Transitions into the pulse-lost state
    pub pulse_lost_events: u32,
}

/// Phase-locked telegram scheduler
pub struct TelegramScheduler {
    state: SchedulerState,
    timing: SchedulerTiming,
    bootstrap: Bootstrap,
    phase: Option<PhaseLock>,
    consecutive_timeouts: u32,
    stats: SchedulerStats,
    jitter: JitterStats,
}

impl TelegramScheduler {
    /// Create a scheduler that starts bootstrapping at `start`
    pub fn new(timing: SchedulerTiming, start: Ticks) -> Self {
        Self {
            state: SchedulerState::Bootstrapping,
            bootstrap: Bootstrap::new(start, timing.bootstrap_timeout),
            timing,
            phase: None,
            consecutive_timeouts: 0,
            stats: SchedulerStats::default(),
            jitter: JitterStats::new(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn timing(&self) -> &SchedulerTiming {
        &self.timing
    }

    pub fn phase(&self) -> Option<&PhaseLock> {
        self.phase.as_ref()
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn jitter(&self) -> &JitterStats {
        &self.jitter
    }

    /// Watchdogs expired since the last accepted pulse
    pub fn consecutive_timeouts(&self) -> u32 {
        self.consecutive_timeouts
    }

    /// Feed one poll of the time source while bootstrapping
    ///
    /// Returns the baseline tick when the boundary is found. Outside
    /// bootstrapping this is a no-op returning `None`.
    pub fn poll_boundary(
        &mut self,
        second: u8,
        now: Ticks,
    ) -> Result<Option<Ticks>, ConfigurationFault> {
        if self.state != SchedulerState::Bootstrapping {
            return Ok(None);
        }

        match self.bootstrap.poll(second, now)? {
            Some(baseline) => {
                self.phase = Some(PhaseLock::new(
                    baseline,
                    self.timing.period,
                    self.timing.lead,
                )?);
                self.state = self.state.transition(SchedulerEvent::BoundaryFound);
                Ok(Some(baseline))
            }
            None => Ok(None),
        }
    }

    /// Handle a pulse notification carrying the tick captured in the ISR
    pub fn on_pulse(&mut self, pulse: Ticks) -> PulseAction {
        let phase = match self.phase.as_mut() {
            Some(phase) if self.state != SchedulerState::Bootstrapping => phase,
            _ => return PulseAction::Ignore,
        };

        let verdict = phase.accept_pulse(pulse);
        match verdict {
            PulseVerdict::Spurious => {
                self.stats.spurious_pulses = self.stats.spurious_pulses.saturating_add(1);
                return PulseAction::Ignore;
            }
            PulseVerdict::Missed(n) => {
                self.stats.missed_pulses = self.stats.missed_pulses.saturating_add(n);
            }
            PulseVerdict::First | PulseVerdict::OnTime => {}
        }

        let recovered = self.state == SchedulerState::PulseLost;
        self.state = self.state.transition(SchedulerEvent::PulseReceived);
        self.consecutive_timeouts = 0;

        PulseAction::Transmit {
            wake: phase.wake_tick(pulse),
            verdict,
            recovered,
        }
    }

    /// Handle an expired watchdog
    ///
    /// Returns `Fault::PulseLost` on the transition into the pulse-lost
    /// state only, so the fault is reported once per outage.
    pub fn on_timeout(&mut self) -> Option<Fault> {
        if self.state == SchedulerState::Bootstrapping {
            return None;
        }

        self.consecutive_timeouts = self.consecutive_timeouts.saturating_add(1);
        if self.state == SchedulerState::SteadyState {
            self.state = self.state.transition(SchedulerEvent::PulseTimeout);
            self.stats.pulse_lost_events = self.stats.pulse_lost_events.saturating_add(1);
            Some(Fault::PulseLost)
        } else {
            None
        }
    }

    /// Compare the actual wake-up with its target
    pub fn check_wake(&mut self, wake: Ticks, now: Ticks) -> WakeVerdict {
        let delta = now.wrapping_sub(wake) as i64;
        let lateness = if delta < 0 { 0 } else { delta as Ticks };
        self.jitter.record(lateness);

        if lateness > self.timing.jitter_budget {
            self.stats.late_wakes = self.stats.late_wakes.saturating_add(1);
            WakeVerdict::Late(lateness)
        } else {
            WakeVerdict::OnTime(lateness)
        }
    }

    /// Tick at which to read the clock for the telegram following `pulse`
    ///
    /// Half a period after the pulse: the local tick may drift up to half a
    /// period from the pulse between resyncs and still read the right second.
    pub fn reading_tick(&self, pulse: Ticks) -> Ticks {
        pulse.wrapping_add(self.timing.period / 2)
    }

    /// Encode the telegram for the second about to begin
    ///
    /// `source` must read the second that contains the pulse, e.g. the
    /// clock at [`reading_tick`](Self::reading_tick).
    pub fn compose<S: TimeSource + ?Sized>(&self, source: &S) -> Telegram {
        let (now, validity) = source.current_local_time();
        let unset = self.timing.unset_monitor;

        match now.next_second() {
            Ok(next) => encode_with_sentinel(Some(&next), validity, unset),
            Err(_) => encode_with_sentinel(None, TimeValidity::Unset, unset),
        }
    }

    /// Count a telegram handed to the transport
    pub fn record_sent(&mut self) {
        self.stats.telegrams = self.stats.telegrams.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{TimeSample, MAX_YEAR};

    const TICK_HZ: u64 = 1_000_000;

    struct FixedTime(TimeSample, TimeValidity);

    impl TimeSource for FixedTime {
        fn current_local_time(&self) -> (TimeSample, TimeValidity) {
            (self.0, self.1)
        }
    }

    fn timing() -> SchedulerTiming {
        SchedulerTiming::from_config(&GeneratorConfig::default(), TICK_HZ).unwrap()
    }

    /// Scheduler already past bootstrap with its boundary at `baseline`
    fn locked(baseline: Ticks) -> TelegramScheduler {
        let mut s = TelegramScheduler::new(timing(), baseline - 10);
        assert_eq!(s.poll_boundary(0, baseline - 10), Ok(None));
        assert_eq!(s.poll_boundary(1, baseline), Ok(Some(baseline)));
        s
    }

    #[test]
    fn test_state_transitions() {
        use SchedulerEvent::*;
        use SchedulerState::*;

        assert_eq!(Bootstrapping.transition(BoundaryFound), SteadyState);
        assert_eq!(Bootstrapping.transition(PulseReceived), Bootstrapping);
        assert_eq!(Bootstrapping.transition(PulseTimeout), Bootstrapping);
        assert_eq!(SteadyState.transition(PulseReceived), SteadyState);
        assert_eq!(SteadyState.transition(PulseTimeout), PulseLost);
        assert_eq!(PulseLost.transition(PulseTimeout), PulseLost);
        assert_eq!(PulseLost.transition(PulseReceived), SteadyState);
    }

    #[test]
    fn test_timing_from_defaults() {
        let t = timing();
        assert_eq!(t.period, 1_000_000);
        assert_eq!(t.lead, 17_708);
        assert_eq!(t.watchdog, 1_500_000);
        assert_eq!(t.jitter_budget, 50_000);
        assert_eq!(t.bootstrap_timeout, 3_000_000);
        assert_eq!(t.unset_monitor, b'?');
    }

    #[test]
    fn test_timing_rejects_slow_baudrate() {
        // 170 bits at 150 baud take more than a second
        let config = GeneratorConfig {
            baudrate: 150,
            ..GeneratorConfig::default()
        };
        assert_eq!(
            SchedulerTiming::from_config(&config, TICK_HZ),
            Err(ConfigurationFault::LeadExceedsPeriod)
        );
    }

    #[test]
    fn test_bootstrap_then_steady_state() {
        let s = locked(2_000_000);
        assert_eq!(s.state(), SchedulerState::SteadyState);
        assert_eq!(s.state().status(), GeneratorStatus::Running);
        assert_eq!(s.phase().map(|p| p.baseline()), Some(2_000_000));
    }

    #[test]
    fn test_bootstrap_stall_is_fatal() {
        let mut s = TelegramScheduler::new(timing(), 0);
        assert_eq!(s.poll_boundary(7, 0), Ok(None));
        assert_eq!(
            s.poll_boundary(7, 3_000_001),
            Err(ConfigurationFault::ClockStalled)
        );
        assert_eq!(s.state(), SchedulerState::Bootstrapping);
    }

    #[test]
    fn test_pulses_ignored_while_bootstrapping() {
        let mut s = TelegramScheduler::new(timing(), 0);
        assert_eq!(s.on_pulse(500_000), PulseAction::Ignore);
        assert_eq!(s.on_timeout(), None);
    }

    #[test]
    fn test_wake_instants_are_drift_free() {
        let mut s = locked(1_000_000);
        let t = *s.timing();
        let first = 1_250_000;

        let mut previous = None;
        for n in 0..1000u64 {
            let pulse = first + n * t.period;
            let wake = match s.on_pulse(pulse) {
                PulseAction::Transmit { wake, .. } => wake,
                PulseAction::Ignore => panic!("pulse {} ignored", n),
            };
            assert_eq!(wake, pulse + t.period - t.lead);
            if let Some(prev) = previous {
                assert_eq!(wake - prev, t.period);
            }
            previous = Some(wake);
        }
        assert_eq!(s.stats().missed_pulses, 0);
    }

    #[test]
    fn test_pulse_lost_and_recovery() {
        let mut s = locked(1_000_000);
        let period = s.timing().period;

        assert!(matches!(s.on_pulse(1_000_000), PulseAction::Transmit { .. }));

        // Three periods of silence: two watchdog windows of 1.5 periods
        assert_eq!(s.on_timeout(), Some(Fault::PulseLost));
        assert_eq!(s.state(), SchedulerState::PulseLost);
        assert_eq!(s.state().status(), GeneratorStatus::PulseLost);
        assert_eq!(s.on_timeout(), None);
        assert_eq!(s.consecutive_timeouts(), 2);

        match s.on_pulse(1_000_000 + 4 * period) {
            PulseAction::Transmit {
                wake,
                verdict,
                recovered,
            } => {
                assert!(recovered);
                assert_eq!(verdict, PulseVerdict::Missed(3));
                assert_eq!(wake, 1_000_000 + 5 * period - s.timing().lead);
            }
            PulseAction::Ignore => panic!("recovery pulse ignored"),
        }

        assert_eq!(s.state(), SchedulerState::SteadyState);
        assert_eq!(s.consecutive_timeouts(), 0);
        assert_eq!(s.stats().pulse_lost_events, 1);
        assert_eq!(s.stats().missed_pulses, 3);

        // Next cycle is ordinary again
        assert!(matches!(
            s.on_pulse(1_000_000 + 5 * period),
            PulseAction::Transmit {
                verdict: PulseVerdict::OnTime,
                recovered: false,
                ..
            }
        ));
    }

    #[test]
    fn test_spurious_pulse_dropped() {
        let mut s = locked(1_000_000);
        assert!(matches!(s.on_pulse(1_000_000), PulseAction::Transmit { .. }));
        assert_eq!(s.on_pulse(1_000_300), PulseAction::Ignore);
        assert_eq!(s.stats().spurious_pulses, 1);
        assert!(matches!(
            s.on_pulse(2_000_000),
            PulseAction::Transmit {
                verdict: PulseVerdict::OnTime,
                ..
            }
        ));
    }

    #[test]
    fn test_check_wake() {
        let mut s = locked(1_000_000);
        assert_eq!(s.check_wake(5_000, 4_000), WakeVerdict::OnTime(0));
        assert_eq!(s.check_wake(5_000, 55_000), WakeVerdict::OnTime(50_000));
        assert_eq!(s.check_wake(5_000, 55_001), WakeVerdict::Late(50_001));
        assert_eq!(s.stats().late_wakes, 1);
        assert_eq!(s.jitter().max(), Some(50_001));
    }

    #[test]
    fn test_compose_announces_next_second() {
        let s = locked(1_000_000);
        let now = TimeSample::new(2023, 8, 6, 16, 3, 59).unwrap();

        let telegram = s.compose(&FixedTime(now, TimeValidity::Fresh));
        assert_eq!(telegram.as_str(), "OAL2308067160400\r");

        let telegram = s.compose(&FixedTime(now, TimeValidity::Stale));
        assert_eq!(telegram.as_str(), "OML2308067160400\r");

        let telegram = s.compose(&FixedTime(now, TimeValidity::Unset));
        assert_eq!(telegram.as_str(), "O?L000000F000000\r");
    }

    #[test]
    fn test_compose_at_end_of_range_falls_back() {
        let s = locked(1_000_000);
        let now = TimeSample::new(MAX_YEAR, 12, 31, 23, 59, 59).unwrap();
        let telegram = s.compose(&FixedTime(now, TimeValidity::Fresh));
        assert_eq!(telegram.as_str(), "O?L000000F000000\r");
    }

    #[test]
    fn test_reading_tick_is_mid_period() {
        let s = locked(1_000_000);
        assert_eq!(s.reading_tick(3_000_000), 3_500_000);
        assert_eq!(s.reading_tick(u64::MAX), 499_999);
    }

    #[test]
    fn test_record_sent() {
        let mut s = locked(1_000_000);
        s.record_sent();
        s.record_sent();
        assert_eq!(s.stats().telegrams, 2);
    }
}
