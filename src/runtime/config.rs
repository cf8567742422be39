use crate::bridge::BridgeConfig;

/// Runtime configuration.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Config {
    /// Sets the number of scheduler ticks after which the scheduler will poll for
    /// external events (wakeups from other threads and results delivered by
    /// the blocking worker).
    ///
    /// A scheduler "tick" corresponds to one `poll` invocation on a task. By default,
    /// the event interval is `61`. Which means that at most `61` futures will be polled
    /// before polling for events.
    ///
    /// This number is intentionally set to a prime number close to a power of 2 so to avoid
    /// unintentional synchronizations with events that may occur at a predictable frequency.
    pub(crate) event_interval: u32,
    /// Configuration used to start the process-wide bridge, if this is the
    /// first runtime to call [`spawn_blocking`](crate::task::spawn_blocking).
    pub(crate) bridge: BridgeConfig,
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    /// Panics if `interval` is zero.
    #[must_use]
    pub fn event_interval(mut self, interval: u32) -> Self {
        assert!(interval > 0, "the event interval must be greater than zero");
        self.event_interval = interval;
        self
    }

    #[must_use]
    pub fn bridge(mut self, bridge: BridgeConfig) -> Self {
        self.bridge = bridge;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            event_interval: 61,
            bridge: BridgeConfig::default(),
        }
    }
}
