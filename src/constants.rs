pub const SECONDS_PER_DAY: u64 = 86_400;

/// Decimals of the native currency on every supported EVM chain
pub const NATIVE_DECIMALS: u32 = 18;

pub const DEFAULT_LOOKBACK_DAYS: f64 = 1.0;
pub const DEFAULT_MAX_BLOCKS: u64 = 1_000;
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_INTER_BATCH_DELAY_MS: u64 = 200;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Gas utilization is computed in basis points before the final float conversion
pub const UTILIZATION_SCALE: u64 = 10_000;
