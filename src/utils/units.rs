use alloy_primitives::U256;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::Serializer;

/// Widen a chain quantity into an unbounded integer
pub fn to_biguint(value: U256) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes::<32>())
}

/// Exact decimal rendering of an integer amount with `decimals` fractional digits.
///
/// Trailing fractional zeros are trimmed: `20000` wei with 18 decimals becomes
/// `0.00000000000002`, and whole amounts print without a fraction.
pub fn format_units(amount: &BigUint, decimals: u32) -> String {
    let scale = BigUint::from(10u32).pow(decimals);
    let whole = amount / &scale;
    let frac = amount % &scale;

    if frac.is_zero() {
        return whole.to_string();
    }

    let digits = frac.to_string();
    let padded = format!("{:0>width$}", digits, width = decimals as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}

/// Lossy conversion used only at the display boundary
pub fn to_f64_lossy(value: &BigUint) -> f64 {
    value.to_f64().unwrap_or(f64::INFINITY)
}

pub fn serialize_biguint<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

pub fn serialize_opt_biguint<S: Serializer>(value: &Option<BigUint>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_some(&v.to_string()),
        None => serializer.serialize_none(),
    }
}
