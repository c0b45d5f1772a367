//! Constants

/// Phase Frequency Detector frequency, Hz.
/// REFin = 30 MHz, R counter = 1, no doubler, no divide-by-2.
pub const REF_FREQ: u32 = 30_000_000;

/// The fractional modulus is fixed at 2^25:
/// 12 MSB bits live in R0, 13 LSB bits live in R1.
pub const FRES_BITS: u32 = 25;

/// MSB fractional word width (R0, DB14:DB3)
pub const FRAC_MSB_BITS: u32 = 12;

/// LSB fractional word width (R1, DB27:DB15)
pub const FRAC_LSB_BITS: u32 = 13;

/// The deviation word is a 16-bit two's complement value,
/// so positive ramps have 15 bits of magnitude.
pub const DEV_BITS: u32 = 15;

/// Largest deviation word usable for an up-ramp
pub const DEV_MAX: u32 = (1 << DEV_BITS) - 1;

/// DEV_OFFSET is a 4-bit field (R5, DB22:DB19)
pub const DEV_OFFSET_MAX: u8 = 15;

/// Frequency resolution, Hz
/// f RES = f PFD / 2^25
pub const FRES_HZ: f64 = REF_FREQ as f64 / (1u32 << FRES_BITS) as f64;

/// CLK2 divider used for the ramp timer.
/// Timer = CLK1 × CLK2 / f PFD
pub const CLK2_DIV: u16 = 1;

/// Ramp duration is converted to whole microseconds when the
/// per-step deviation is derived.
pub const MICROS_PER_SECOND: f64 = 1_000_000.0;
