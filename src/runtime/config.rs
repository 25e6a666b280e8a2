use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

const DEFAULT_DELAY_SECS: u64 = 1;
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Pause applied before each item is revealed, in whole seconds.
///
/// Always positive. Construct via [`DelayConfig::from_secs`] or [`DelayConfig::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DelayConfig {
    secs: u64,
}

impl DelayConfig {
    pub fn from_secs(secs: u64) -> Result<Self> {
        if secs == 0 {
            bail!("delay must be greater than 0 seconds");
        }
        Ok(Self { secs })
    }

    /// Parses user-entered text such as `"3"`, `" 10 "` or `"5s"`.
    ///
    /// Only the leading integer is read, after an optional sign; anything
    /// following it is ignored, so `"1.5"` means one second. Text without a
    /// leading integer, or whose integer is not positive, is rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let digits_end = unsigned
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(unsigned.len());
        let digits = &unsigned[..digits_end];
        if digits.is_empty() {
            bail!("delay {trimmed:?} does not start with an integer");
        }

        let secs: u64 = digits
            .parse()
            .with_context(|| format!("delay {trimmed:?} is out of range"))?;
        if negative || secs == 0 {
            bail!("delay must be greater than 0 seconds, got {trimmed:?}");
        }
        Self::from_secs(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.secs
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.secs)
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            secs: DEFAULT_DELAY_SECS,
        }
    }
}

impl fmt::Display for DelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.secs)
    }
}

/// Runtime configuration for a [`crate::SequentialDelayProcessor`].
///
/// All instances must be constructed via [`ProcessorConfig::builder`] or [`ProcessorConfig::new`]
/// so invariants are validated before any consumer observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    delay: DelayConfig,
    event_capacity: usize,
}

pub struct ProcessorConfigParams {
    pub delay: DelayConfig,
    pub event_capacity: usize,
}

impl ProcessorConfig {
    /// Returns a builder to incrementally construct and validate a configuration.
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values.
    pub fn new(params: ProcessorConfigParams) -> Result<Self> {
        let ProcessorConfigParams {
            delay,
            event_capacity,
        } = params;

        let config = Self {
            delay,
            event_capacity,
        };

        config.validate()?;
        Ok(config)
    }

    /// Delay used by runs started before any call to `set_delay`.
    pub fn delay(&self) -> DelayConfig {
        self.delay
    }

    /// Number of lifecycle events buffered per subscriber before slow readers lag.
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        if self.delay.as_secs() == 0 {
            bail!("delay must be greater than 0 seconds");
        }

        if self.event_capacity == 0 {
            bail!("event_capacity must be greater than 0");
        }

        Ok(())
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            delay: DelayConfig::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ProcessorConfigBuilder {
    delay: Option<DelayConfig>,
    delay_secs: Option<u64>,
    event_capacity: Option<usize>,
}

impl ProcessorConfigBuilder {
    pub fn delay(mut self, delay: DelayConfig) -> Self {
        self.delay = Some(delay);
        self.delay_secs = None;
        self
    }

    /// Raw seconds; validated when [`Self::build`] runs.
    pub fn delay_secs(mut self, secs: u64) -> Self {
        self.delay_secs = Some(secs);
        self.delay = None;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Result<ProcessorConfig> {
        let delay = match (self.delay, self.delay_secs) {
            (Some(delay), _) => delay,
            (None, Some(secs)) => DelayConfig::from_secs(secs).context("invalid delay")?,
            (None, None) => DelayConfig::default(),
        };

        let params = ProcessorConfigParams {
            delay,
            event_capacity: self.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY),
        };

        ProcessorConfig::new(params)
    }
}
