use std::time::Duration;

/// TTL applied when a caller does not pick one (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// TTL for volatile data such as stock levels or balances (1 minute).
pub const SHORT_TTL: Duration = Duration::from_secs(60);

/// TTL for rarely changing data such as categories (30 minutes).
pub const LONG_TTL: Duration = Duration::from_secs(1800);

/// Interval between background sweeps of expired entries (5 minutes).
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Named TTL presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TtlClass {
    Short,
    #[default]
    Default,
    Long,
}

impl TtlClass {
    /// Returns the built-in duration for this preset.
    pub fn duration(self) -> Duration {
        match self {
            TtlClass::Short => SHORT_TTL,
            TtlClass::Default => DEFAULT_TTL,
            TtlClass::Long => LONG_TTL,
        }
    }
}
