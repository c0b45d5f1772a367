//! Sweep configuration / register word calculations

use crate::{constants::*, errors::*, register::*};


/// Ramp shape
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum Waveform {
    Sawtooth,
    Triangular,
}

/// High level description of one FMCW sweep.
#[derive(Debug,Copy,Clone,PartialEq)]
pub struct SweepSpec {
    pub waveform: Waveform,
    /// Ramp start frequency, Hz
    pub start_hz: f64,
    /// Ramp span, Hz
    pub bandwidth_hz: f64,
    /// Ramp duration, seconds
    pub ramp_s: f64,
    /// Delay between sawtooth ramps, delay clock cycles.
    /// Ignored for triangular ramps.
    pub ramp_delay: u16,
}

impl SweepSpec {
    /// Describe a sweep, rejecting parameters that can never be encoded.
    pub fn new(
        waveform: Waveform,
        start_hz: f64,
        bandwidth_hz: f64,
        ramp_s: f64,
        ramp_delay: u16,
    ) -> Result<Self, EncodingError> {
        let spec = SweepSpec { waveform, start_hz, bandwidth_hz, ramp_s, ramp_delay };
        spec.validate()?;
        Ok(spec)
    }

    /// Checks the parameters on their own,
    /// derived values are checked by [`RampParams::compute`].
    pub fn validate(self: &Self) -> Result<(), EncodingError> {
        if !(self.start_hz.is_finite() && self.bandwidth_hz.is_finite() && self.ramp_s.is_finite()) {
            return Err(EncodingError::NonFinite);
        }
        if self.start_hz < 0.0 { return Err(EncodingError::NegativeStartFrequency); }
        if self.bandwidth_hz <= 0.0 { return Err(EncodingError::NonPositiveBandwidth); }
        if self.ramp_s <= 0.0 { return Err(EncodingError::NonPositiveRampDuration); }
        Ok(())
    }

    /// R7 is only used for delayed sawtooth ramps
    #[inline]
    pub fn uses_ramp_delay(self: &Self) -> bool {
        self.ramp_delay > 0 && self.waveform == Waveform::Sawtooth
    }
}


/// Values derived from a [`SweepSpec`], exactly as they are programmed.
///
/// f OUT = [INT + (FRAC MSB × 2^13 + FRAC LSB) / 2^25] × f PFD
/// f DEV = DEV × f RES × 2^DEV_OFFSET
/// Timer = CLK1 × CLK2 / f PFD
#[derive(Debug,Copy,Clone,PartialEq)]
pub struct RampParams {
    /// INT
    pub n: u16,
    /// 12 MSB of FRAC
    pub frac_msb: u16,
    /// 13 LSB of FRAC
    pub frac_lsb: u16,
    /// Requested per-step deviation, whole Hz
    pub fdev: u32,
    /// Steps per ramp
    pub steps: u32,
    /// Step timer divider
    pub clk1: u16,
    pub dev_offset: u8,
    /// Deviation word
    pub dev: u16,
}

impl RampParams {

    /// Derive register values for a sweep.
    ///
    /// Truncation happens where the device arithmetic truncates:
    /// INT, both FRAC words, the per-step deviation, the step count and
    /// the deviation word. CLK1 is rounded to the nearest PFD cycle.
    pub fn compute(spec: &SweepSpec) -> Result<Self, EncodingError> {
        spec.validate()?;

        let f_pfd = REF_FREQ as f64;

        // RF OUT / f PFD = INT + FRAC / 2^25
        let ratio = spec.start_hz / f_pfd;
        let n = ratio as u32;
        let msb_scaled = (ratio - n as f64) * (1u32 << FRAC_MSB_BITS) as f64;
        let frac_msb = msb_scaled as u32;
        let frac_lsb = ((msb_scaled - frac_msb as f64) * (1u32 << FRAC_LSB_BITS) as f64) as u32;

        let fdev = finite(spec.bandwidth_hz / (spec.ramp_s * MICROS_PER_SECOND))? as u32;
        if fdev == 0 { return Err(EncodingError::ZeroDeviation); }

        let steps = finite(spec.bandwidth_hz / fdev as f64)? as u32;
        if steps == 0 { return Err(EncodingError::ZeroSteps); }

        let timer = finite(spec.ramp_s / steps as f64)?;
        let clk1 = finite(f_pfd * timer)?;
        let clk1 = (clk1 + 0.5) as u32;

        let dev_offset = deviation_offset(fdev);
        let dev = (fdev as f64 / (FRES_HZ * (1u32 << dev_offset) as f64)) as u32;

        Ok(RampParams {
            n: n as u16,
            frac_msb: frac_msb as u16,
            frac_lsb: frac_lsb as u16,
            fdev,
            steps,
            clk1: clk1 as u16,
            dev_offset,
            dev: dev as u16,
        })
    }

    /// Programmed start frequency, Hz
    pub fn f_start_hz(self: &Self) -> f64 {
        let frac = ((self.frac_msb as u32) << FRAC_LSB_BITS) | self.frac_lsb as u32;
        (self.n as f64 + frac as f64 / (1u32 << FRES_BITS) as f64) * REF_FREQ as f64
    }

    /// Programmed per-step deviation, Hz
    pub fn f_dev_hz(self: &Self) -> f64 {
        self.dev as f64 * FRES_HZ * (1u32 << self.dev_offset) as f64
    }

    /// Programmed ramp span, Hz
    pub fn bandwidth_hz(self: &Self) -> f64 {
        self.f_dev_hz() * self.steps as f64
    }

    /// Programmed step period, seconds
    pub fn step_s(self: &Self) -> f64 {
        self.clk1 as f64 * CLK2_DIV as f64 / REF_FREQ as f64
    }
}


/// Smallest DEV_OFFSET that brings the deviation word into 15 bits,
/// i.e. max(0, ceil(log2(fdev / (f RES × 2^15)))).
///
/// Searched on the truncated word itself so an exact power of two
/// cannot produce a word of 2^15.
pub fn deviation_offset(fdev: u32) -> u8 {
    let mut offset = 0u8;
    while offset < DEV_OFFSET_MAX
        && (fdev as f64 / (FRES_HZ * (1u32 << offset) as f64)) as u32 > DEV_MAX
    {
        offset += 1;
    }
    offset
}

#[inline]
fn finite(x: f64) -> Result<f64, EncodingError> {
    if x.is_finite() { Ok(x) } else { Err(EncodingError::NonFinite) }
}


impl RegisterSet {

    /// Register set for a sweep.
    /// Fixed settings: 8/9 prescaler, R = 1, CSR on, CP current 14,
    /// ramp divider CLK2 = 1, MUXOUT readback, ramp started by R0.
    pub fn for_sweep(spec: &SweepSpec) -> Result<Self, EncodingError> {
        let p = RampParams::compute(spec)?;
        Ok(RegisterSet::from_params(spec, &p))
    }

    /// Pack precomputed ramp values.
    pub fn from_params(spec: &SweepSpec, p: &RampParams) -> Self {
        let ramp_mode = match spec.waveform {
            Waveform::Sawtooth => RampMode::ContinuousSawtooth,
            Waveform::Triangular => RampMode::ContinuousTriangular,
        };

        let rs = RegisterSet::default()
            // R6
            .set(StepWord(p.steps))

            // R5
            .set(DeviationOffset(p.dev_offset))
            .set(Deviation(p.dev))

            // R4
            .set(SigmaDeltaMode(0))
            .set(RampStatus(3))
            .set(ClockDividerMode::RampDivider)
            .set(Clk2Divider(CLK2_DIV))

            // R3
            .set(ramp_mode)
            .set(PdPolarity::Positive)
            .set(PowerDown::Disabled)
            .set(ChargePumpThreeState::Disabled)
            .set(CounterReset::Disabled)

            // R2
            .set(CycleSlipReduction::Enabled)
            .set(ChargePumpCurrent(14))
            .set(Prescaler::Pr89)
            .set(Rdiv2::Disabled)
            .set(RefDoubler::Disabled)
            .set(RCounter(1))
            .set(Clk1Divider(p.clk1))

            // R1
            .set(FracLsb(p.frac_lsb))

            // R0
            .set(RampOn::Enabled)
            .set(Muxout::READBACK)
            .set(Int(p.n))
            .set(FracMsb(p.frac_msb))
            ;

        if spec.uses_ramp_delay() {
            rs.set(FastRamp::Enabled)
              .set(RampDelayFastLock::Enabled)
              .set(RampDelay::Enabled)
              .set(DelayClockSelect::PfdClk1)
              .set(DelayStartWord(spec.ramp_delay))
        } else {
            rs
        }
    }

    /// Read ramp values back from the registers.
    pub fn ramp_params(self: &Self) -> RampParams {
        let n: Int = self.get();
        let frac_msb: FracMsb = self.get();
        let frac_lsb: FracLsb = self.get();
        let steps: StepWord = self.get();
        let clk1: Clk1Divider = self.get();
        let dev_offset: DeviationOffset = self.get();
        let dev: Deviation = self.get();
        let dev_hz = dev.0 as f64 * FRES_HZ * (1u32 << dev_offset.0) as f64;

        RampParams {
            n: n.0,
            frac_msb: frac_msb.0,
            frac_lsb: frac_lsb.0,
            fdev: dev_hz as u32,
            steps: steps.0,
            clk1: clk1.0,
            dev_offset: dev_offset.0,
            dev: dev.0,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn saw(start_hz: f64, bandwidth_hz: f64, ramp_s: f64, ramp_delay: u16) -> SweepSpec {
        SweepSpec::new(Waveform::Sawtooth, start_hz, bandwidth_hz, ramp_s, ramp_delay).unwrap()
    }

    #[test]
    fn reference_scenario() {
        // 30 MHz × 5.5, 150 MHz over 1 ms
        let spec = saw(165_000_000.0, 150_000_000.0, 1e-3, 0);
        let p = RampParams::compute(&spec).unwrap();
        assert_eq!(p.n, 5);
        assert_eq!(p.frac_msb, 2048);
        assert_eq!(p.frac_lsb, 0);
        assert_eq!(p.fdev, 150_000);
        assert_eq!(p.steps, 1000);
        assert_eq!(p.clk1, 30);
        assert_eq!(p.dev_offset, 3);
        assert_eq!(p.dev, 20971);

        let rs = RegisterSet::for_sweep(&spec).unwrap();
        let words: Vec<u32> = rs.words().collect();
        assert_eq!(words, vec![
            0x0000_1F46, // R6
            0x001A_8F5D, // R5
            0x0078_0084, // R4
            0x0000_0043, // R3
            0x1E40_80F2, // R2
            0x0000_0001, // R1
            0xF802_C000, // R0
        ]);
    }

    #[test]
    fn ramp_delay_adds_r7_for_sawtooth_only() {
        let rs = RegisterSet::for_sweep(&saw(165e6, 150e6, 1e-3, 100)).unwrap();
        let words: Vec<u32> = rs.words().collect();
        assert_eq!(words.len(), 8);
        assert_eq!(words[0], (1 << 18) | (1 << 17) | (1 << 16) | (1 << 15) | (100 << 3) | 7);

        let tri = SweepSpec::new(Waveform::Triangular, 165e6, 150e6, 1e-3, 100).unwrap();
        let rs = RegisterSet::for_sweep(&tri).unwrap();
        let addrs: Vec<u8> = rs.sequence().map(|r| r.address()).collect();
        assert_eq!(addrs, vec![6, 5, 4, 3, 2, 1, 0]);
        let mode: RampMode = rs.get();
        assert_eq!(mode, RampMode::ContinuousTriangular);
    }

    #[test]
    fn address_order_and_tags_hold_across_inputs() {
        let cases = [
            (Waveform::Sawtooth, 5.8e9, 250e6, 1e-3, 0),
            (Waveform::Sawtooth, 5.8e9, 250e6, 1e-3, 12),
            (Waveform::Triangular, 5.725e9, 50e6, 2e-3, 7),
            (Waveform::Sawtooth, 1.0e9, 1e6, 1e-4, 1),
            (Waveform::Triangular, 0.0, 10e6, 5e-4, 0),
        ];
        for &(wf, start, bw, t, del) in cases.iter() {
            let spec = SweepSpec::new(wf, start, bw, t, del).unwrap();
            let rs = RegisterSet::for_sweep(&spec).unwrap();
            let expected: Vec<u8> = if spec.uses_ramp_delay() {
                vec![7, 6, 5, 4, 3, 2, 1, 0]
            } else {
                vec![6, 5, 4, 3, 2, 1, 0]
            };
            let addrs: Vec<u8> = rs.sequence().map(|r| r.address()).collect();
            assert_eq!(addrs, expected, "{:?}", spec);
            for (w, a) in rs.words().zip(expected.iter()) {
                assert_eq!(w & ADDRESS_MASK, *a as u32);
            }
        }
    }

    #[test]
    fn fractional_words_fit_their_fields() {
        let mut start = 5.6e9;
        while start < 6.0e9 {
            let p = RampParams::compute(&saw(start, 150e6, 1e-3, 0)).unwrap();
            assert!((p.frac_msb as u32) < (1 << FRAC_MSB_BITS));
            assert!((p.frac_lsb as u32) < (1 << FRAC_LSB_BITS));
            start += 7_777_777.7;
        }
    }

    #[test]
    fn frac_lsb_comes_from_msb_remainder() {
        // 1/3 of the PFD above 150 MHz: 0x555 then 0xAAA...
        let p = RampParams::compute(&saw(160_000_000.0, 150e6, 1e-3, 0)).unwrap();
        assert_eq!(p.n, 5);
        assert_eq!(p.frac_msb, 1365);
        assert_eq!(p.frac_lsb, 2730);
        assert!((p.f_start_hz() - 160_000_000.0).abs() < 2.0 * FRES_HZ);
    }

    #[test]
    fn deviation_offset_is_minimal() {
        for &fdev in [1u32, 1000, 29_296, 29_297, 58_593, 58_594, 150_000, 234_375, 1_000_000, 5_000_000].iter() {
            let off = deviation_offset(fdev);
            let word = |k: u8| (fdev as f64 / (FRES_HZ * (1u32 << k) as f64)) as u32;
            assert!(word(off) <= DEV_MAX, "fdev {} offset {}", fdev, off);
            if off > 0 {
                assert!(word(off - 1) > DEV_MAX, "fdev {} offset {} not minimal", fdev, off);
            }
        }
        assert_eq!(deviation_offset(1000), 0);
        assert_eq!(deviation_offset(150_000), 3);
    }

    #[test]
    fn deviation_word_at_exact_power_of_two_stays_in_15_bits() {
        // 234 375 Hz is exactly 2^18 × f RES: ceil(log2(2^3)) = 3 would give DEV = 2^15
        let fdev = 234_375u32;
        assert_eq!(fdev as f64 / FRES_HZ, (1u32 << 18) as f64);
        assert_eq!(deviation_offset(fdev), 4);

        // 234.375 MHz over 1 ms
        let p = RampParams::compute(&saw(5.8e9, 234_375_000.0, 1e-3, 0)).unwrap();
        assert_eq!(p.fdev, fdev);
        assert_eq!(p.dev_offset, 4);
        assert_eq!(p.dev, 16384);
    }

    #[test]
    fn encoding_is_deterministic() {
        let spec = saw(5.8e9, 250e6, 1.5e-3, 42);
        let a: Vec<u32> = RegisterSet::for_sweep(&spec).unwrap().words().collect();
        let b: Vec<u32> = RegisterSet::for_sweep(&spec).unwrap().words().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_specs_are_rejected() {
        assert_eq!(
            SweepSpec::new(Waveform::Sawtooth, 5.8e9, 0.0, 1e-3, 0),
            Err(EncodingError::NonPositiveBandwidth)
        );
        assert_eq!(
            SweepSpec::new(Waveform::Sawtooth, 5.8e9, 150e6, -1e-3, 0),
            Err(EncodingError::NonPositiveRampDuration)
        );
        assert_eq!(
            SweepSpec::new(Waveform::Sawtooth, -1.0, 150e6, 1e-3, 0),
            Err(EncodingError::NegativeStartFrequency)
        );
        assert_eq!(
            SweepSpec::new(Waveform::Sawtooth, f64::NAN, 150e6, 1e-3, 0),
            Err(EncodingError::NonFinite)
        );

        // 500 Hz over 1 ms is below 1 Hz per microsecond
        let tiny = SweepSpec { waveform: Waveform::Sawtooth, start_hz: 5.8e9, bandwidth_hz: 500.0, ramp_s: 1e-3, ramp_delay: 0 };
        assert_eq!(RampParams::compute(&tiny), Err(EncodingError::ZeroDeviation));
        assert_eq!(RegisterSet::for_sweep(&tiny), Err(EncodingError::ZeroDeviation));

        let bad = SweepSpec { bandwidth_hz: f64::INFINITY, ..tiny };
        assert_eq!(RampParams::compute(&bad), Err(EncodingError::NonFinite));
    }

    #[test]
    fn readback_matches_programmed_values() {
        let spec = saw(5.8e9, 250e6, 1e-3, 0);
        let p = RampParams::compute(&spec).unwrap();
        let rs = RegisterSet::from_params(&spec, &p);
        let back = rs.ramp_params();
        assert_eq!(back.n, p.n);
        assert_eq!(back.frac_msb, p.frac_msb);
        assert_eq!(back.frac_lsb, p.frac_lsb);
        assert_eq!(back.steps, p.steps);
        assert_eq!(back.clk1, p.clk1);
        assert_eq!(back.dev_offset, p.dev_offset);
        assert_eq!(back.dev, p.dev);

        assert!((p.f_start_hz() - 5.8e9).abs() < 2.0 * FRES_HZ);
        assert!((p.bandwidth_hz() - 250e6).abs() / 250e6 < 1e-3);
        assert!((p.step_s() - 1e-6).abs() < 1e-9);
    }
}
