//! Wake-up lateness tracking

use heapless::HistoryBuffer;

use crate::Ticks;

/// Number of recent wake-ups kept
pub const JITTER_HISTORY: usize = 16;

/// Lateness of recent wake-ups, in ticks
pub struct JitterStats {
    history: HistoryBuffer<Ticks, JITTER_HISTORY>,
}

impl JitterStats {
    pub fn new() -> Self {
        Self {
            history: HistoryBuffer::new(),
        }
    }

    /// Record the lateness of one wake-up
    pub fn record(&mut self, lateness: Ticks) {
        self.history.write(lateness);
    }

    /// Largest lateness in the window
    pub fn max(&self) -> Option<Ticks> {
        self.history.as_slice().iter().copied().max()
    }

    /// Most recent lateness
    pub fn latest(&self) -> Option<Ticks> {
        self.history.recent().copied()
    }

    /// Number of samples in the window
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.len() == 0
    }
}

impl Default for JitterStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let stats = JitterStats::new();
        assert!(stats.is_empty());
        assert_eq!(stats.max(), None);
        assert_eq!(stats.latest(), None);
    }

    #[test]
    fn test_window_drops_old_samples() {
        let mut stats = JitterStats::new();
        stats.record(900);
        for i in 0..JITTER_HISTORY as u64 {
            stats.record(i);
        }
        assert_eq!(stats.len(), JITTER_HISTORY);
        assert_eq!(stats.max(), Some(JITTER_HISTORY as u64 - 1));
        assert_eq!(stats.latest(), Some(JITTER_HISTORY as u64 - 1));
    }
}
