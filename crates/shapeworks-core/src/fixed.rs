use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits. All simulation
/// time (seconds, charge timers, reader timestamps) is carried in this type.
pub type Fixed64 = I32F32;

/// Ticks count calls to [`crate::engine::Engine::step`].
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and logging.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Checked division for Fixed64 that returns None on zero divisor or overflow.
#[inline]
pub fn checked_div_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_div(b)
}

/// Duration in seconds of one operation at `rate` operations per second.
///
/// Returns `None` for non-positive rates.
#[inline]
pub fn period_of(rate: Fixed64) -> Option<Fixed64> {
    if rate <= Fixed64::ZERO {
        return None;
    }
    checked_div_64(Fixed64::from_num(1), rate)
}
