pub mod config_loader;
pub mod units;

pub use config_loader::*;
pub use units::{format_units, to_biguint, to_f64_lossy};
