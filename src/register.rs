//! ADF4158 registers
//!
//! Every register is a 32-bit word, clocked in MSB first. The three
//! control bits (DB2:DB0) select the destination latch, the rest of the
//! word holds the bit fields declared below.

use core::marker::PhantomData;

/// Register number marker types
macro_rules! gen_register_marker {
    ($r:ident, $n:tt) => {
        /// Register address marker
        #[derive(Debug,Copy,Clone,PartialEq,Eq)]
        pub struct $r {}

        impl Default for Reg<$r> { #[inline] fn default() -> Self { Reg { w: $n, phantom: PhantomData::default() } } }
    }
}

gen_register_marker!(R0, 0);
gen_register_marker!(R1, 1);
gen_register_marker!(R2, 2);
gen_register_marker!(R3, 3);
gen_register_marker!(R4, 4);
gen_register_marker!(R5, 5);
gen_register_marker!(R6, 6);
gen_register_marker!(R7, 7);


/// Control bits mask, DB2:DB0
pub const ADDRESS_MASK: u32 = 0b111;

/// Single config register
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub struct Reg<R> {
    /// Config register word
    pub w: u32,
    phantom: PhantomData<R>,
}

/// Bit operations on 32bit words
impl<R> Reg<R> {
    #[inline]
    pub fn get<F>(self: &Self) -> F
    where F: Sized + BitField<R> + From<u32>
    {
        F::from(
            (self.w >> F::offset()) & F::mask()
        )
    }

    /// Values wider than the field are truncated to the field width,
    /// neighbouring fields and control bits are left intact.
    #[inline]
    pub fn set<F>(mut self: Self, f: F) -> Self
    where F: Sized + BitField<R> + Into<u32>
    {
        let fbits = (f.into() & F::mask()) << F::offset();
        let rbits = self.w & (! ( F::mask() << F::offset() ));
        self.w = rbits | fbits;
        self
    }

    /// Control bits, DB2:DB0
    #[inline]
    pub fn address(self: &Self) -> u8 {
        (self.w & ADDRESS_MASK) as u8
    }
}


/// One register tagged with its address, in the form it is shifted out.
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum Register {
    R0(Reg<R0>),
    R1(Reg<R1>),
    R2(Reg<R2>),
    R3(Reg<R3>),
    R4(Reg<R4>),
    R5(Reg<R5>),
    R6(Reg<R6>),
    R7(Reg<R7>),
}

impl Register {
    /// Register value in device format
    #[inline]
    pub fn word(self: &Self) -> u32 {
        match self {
            Register::R0(r) => r.w,
            Register::R1(r) => r.w,
            Register::R2(r) => r.w,
            Register::R3(r) => r.w,
            Register::R4(r) => r.w,
            Register::R5(r) => r.w,
            Register::R6(r) => r.w,
            Register::R7(r) => r.w,
        }
    }

    /// Address the word is latched into
    #[inline]
    pub fn address(self: &Self) -> u8 {
        (self.word() & ADDRESS_MASK) as u8
    }
}


/// Full set of config registers used for a ramp.
/// Defaults to all config bits set to 0 and no R7.
///
/// R7 (delay register) is only shifted out when it has been touched,
/// setting any R7 field makes it part of the write sequence.
#[derive(Debug,Copy,Clone,Default,PartialEq,Eq)]
pub struct RegisterSet {
    pub r0: Reg<R0>,
    pub r1: Reg<R1>,
    pub r2: Reg<R2>,
    pub r3: Reg<R3>,
    pub r4: Reg<R4>,
    pub r5: Reg<R5>,
    pub r6: Reg<R6>,
    pub r7: Option<Reg<R7>>,
}

/// Type-indexed register access
pub trait RIdx<R> {
    fn r(self: &Self) -> Reg<R>;
    fn update_r<F>(self: Self, f: F) -> Self where F: FnOnce(Reg<R>) -> Reg<R>;
}

macro_rules! gen_register_index {
    ($r:ident, $f:tt) => {
        impl RIdx<$r> for RegisterSet {
            #[inline]
            fn r(self: &Self) -> Reg<$r> { self.$f }
            #[inline]
            fn update_r<F>(mut self: Self, f: F) -> Self where F: FnOnce(Reg<$r>) -> Reg<$r> {
                self.$f = f(self.$f);
                self
            }
        }
    }
}

gen_register_index!(R0, r0);
gen_register_index!(R1, r1);
gen_register_index!(R2, r2);
gen_register_index!(R3, r3);
gen_register_index!(R4, r4);
gen_register_index!(R5, r5);
gen_register_index!(R6, r6);

impl RIdx<R7> for RegisterSet {
    #[inline]
    fn r(self: &Self) -> Reg<R7> { self.r7.unwrap_or_default() }
    #[inline]
    fn update_r<F>(mut self: Self, f: F) -> Self where F: FnOnce(Reg<R7>) -> Reg<R7> {
        self.r7 = Some(f(self.r7.unwrap_or_default()));
        self
    }
}


impl RegisterSet {

    /// Registers in the order they must be written:
    /// R7 (if present), R6, R5, R4, R3, R2, R1, R0.
    /// R0 goes last, it double buffers the rest and starts the ramp.
    #[inline]
    pub fn sequence(self: &Self) -> Sequence {
        Sequence { rs: *self, next: 0 }
    }

    /// Register values in device format, in write order.
    #[inline]
    pub fn words(self: &Self) -> impl Iterator<Item = u32> {
        self.sequence().map(|r| r.word())
    }

    /// Get register bitfield value
    #[inline]
    pub fn get<F,R>(self: &Self) -> F
    where F: Sized + BitField<R> + From<u32>,
          Self: RIdx<R>
    {
        F::from(
            (self.r().w >> F::offset()) & F::mask()
        )
    }

    /// Update register bitfield
    #[inline]
    pub fn set<F,R>(self: Self, f: F) -> Self
    where F: Sized + BitField<R> + Into<u32>,
          Self: RIdx<R>
    {
        self.update_r(|r| r.set(f))
    }
}


/// Write-order iterator over a [`RegisterSet`]
#[derive(Debug,Clone)]
pub struct Sequence {
    rs: RegisterSet,
    next: u8,
}

impl Iterator for Sequence {
    type Item = Register;

    fn next(&mut self) -> Option<Register> {
        loop {
            let item = match self.next {
                0 => self.rs.r7.map(Register::R7),
                1 => Some(Register::R6(self.rs.r6)),
                2 => Some(Register::R5(self.rs.r5)),
                3 => Some(Register::R4(self.rs.r4)),
                4 => Some(Register::R3(self.rs.r3)),
                5 => Some(Register::R2(self.rs.r2)),
                6 => Some(Register::R1(self.rs.r1)),
                7 => Some(Register::R0(self.rs.r0)),
                _ => return None,
            };
            self.next += 1;
            if item.is_some() {
                return item;
            }
        }
    }
}



/// Bit operations on 32bit words
pub trait BitField<R> {
    /// Number of bits in the bit field
    fn num_bits() -> u8;

    /// Offset from 0
    fn offset() -> u8;

    #[inline]
    fn mask() -> u32 {
        !(0xFFFFFFFFu32 << Self::num_bits())
    }
}

/// Generate BitField implementation
macro_rules! gen_bitfield_impl {
	($r:ty, $n:ident, $nb:tt, $off:tt) => {
        impl BitField<$r> for $n {
            #[inline] fn num_bits() -> u8 { $nb }
            #[inline] fn offset() -> u8 { $off }
        }
    }
}

/// Small bitfield-encoded numbes boilerplate
macro_rules! gen_bitfield_struct {
	($(#[$meta:meta])*, $r:ty, $n:ident, $v:ty, $nb:tt, $off:tt) => {
        $(#[$meta])*
        #[derive(Debug,Copy,Clone,PartialEq,Eq)]
        pub struct $n(pub $v);

        gen_bitfield_impl!($r, $n, $nb, $off);

        impl From<u32> for $n { #[inline] fn from(x: u32) -> Self { $n(x as $v) } }
        impl From<$n> for u32 { #[inline] fn from(x: $n) -> u32 { x.0 as u32 } }
	};
}

/// Enumerated bitfields, variants must cover every value of the field.
/// The variant after `;` takes whatever is left.
macro_rules! gen_bitfield_enum {
	($(#[$meta:meta])*, $r:ty, $n:ident, $nb:tt, $off:tt,
     { $($(#[$vmeta:meta])* $v:ident = $val:literal),* ; $(#[$lmeta:meta])* $last:ident }) => {
        $(#[$meta])*
        #[derive(Debug,Copy,Clone,PartialEq,Eq)]
        pub enum $n {
            $($(#[$vmeta])* $v = $val,)*
            $(#[$lmeta])* $last,
        }

        gen_bitfield_impl!($r, $n, $nb, $off);

        impl From<u32> for $n {
            #[inline]
            fn from(x: u32) -> Self {
                match x & <$n as BitField<$r>>::mask() {
                    $($val => $n::$v,)*
                    _ => $n::$last,
                }
            }
        }
        impl From<$n> for u32 { #[inline] fn from(x: $n) -> u32 { x as u32 } }
    }
}


// Register 0, FRAC/INT register

gen_bitfield_enum!(
    /// Setting DB31 to 1 starts the ramp, 0 stops it.
    , R0, RampOn, 1, 31,
    { Disabled = 0; Enabled }
);

gen_bitfield_struct!(
    /// The on-chip multiplexer is controlled by Bits[DB30:DB27].
    , R0, Muxout, u8, 4, 27
);

impl Muxout {
    pub const THREE_STATE: Muxout = Muxout(0b0000);
    pub const DVDD: Muxout = Muxout(0b0001);
    pub const DGND: Muxout = Muxout(0b0010);
    pub const R_DIVIDER: Muxout = Muxout(0b0011);
    pub const N_DIVIDER: Muxout = Muxout(0b0100);
    pub const DIGITAL_LOCK_DETECT: Muxout = Muxout(0b0110);
    pub const SERIAL_DATA: Muxout = Muxout(0b0111);
    pub const CLK_DIVIDER: Muxout = Muxout(0b1010);
    pub const FAST_LOCK_SWITCH: Muxout = Muxout(0b1100);
    pub const R_DIVIDER_2: Muxout = Muxout(0b1101);
    pub const N_DIVIDER_2: Muxout = Muxout(0b1110);
    /// Ramp status / readback to MUXOUT
    pub const READBACK: Muxout = Muxout(0b1111);
}

gen_bitfield_struct!(
    /// The 12 INT bits (Bits[DB26:DB15]) set the integer part of the
    /// feedback division factor. Values from 23 to 4095 are allowed
    /// with the 4/5 prescaler, 75 to 4095 with the 8/9 prescaler.
    , R0, Int, u16, 12, 15
);

gen_bitfield_struct!(
    /// The 12 MSB FRAC bits (Bits[DB14:DB3]). Together with the 13 LSB
    /// bits in R1 they form the 25-bit fractional numerator, the modulus
    /// is fixed at 2^25.
    , R0, FracMsb, u16, 12, 3
);


// Register 1, LSB FRAC register

gen_bitfield_struct!(
    /// The 13 LSB FRAC bits (Bits[DB27:DB15]).
    , R1, FracLsb, u16, 13, 15
);


// Register 2, R divider register

gen_bitfield_enum!(
    /// Setting DB28 to 1 enables cycle slip reduction. The PFD signal
    /// must have a 50% duty cycle for CSR to work.
    , R2, CycleSlipReduction, 1, 28,
    { Disabled = 0; Enabled }
);

gen_bitfield_struct!(
    /// Charge pump current setting, Bits[DB27:DB24].
    /// Should match the current the loop filter is designed with.
    , R2, ChargePumpCurrent, u8, 4, 24
);

gen_bitfield_enum!(
    /// Dual-modulus prescaler, DB22. 8/9 is required above 3 GHz.
    , R2, Prescaler, 1, 22,
    {
        /// INT N MIN = 23
        Pr45 = 0;
        /// INT N MIN = 75
        Pr89
    }
);

gen_bitfield_enum!(
    /// Reference divide-by-2, DB21
    , R2, Rdiv2, 1, 21,
    { Disabled = 0; Enabled }
);

gen_bitfield_enum!(
    /// Reference doubler, DB20
    , R2, RefDoubler, 1, 20,
    { Disabled = 0; Enabled }
);

gen_bitfield_struct!(
    /// The 5-bit R counter (Bits[DB19:DB15]) divides REFin down to the
    /// PFD reference clock. Division ratios from 1 to 32 are allowed.
    , R2, RCounter, u8, 5, 15
);

gen_bitfield_struct!(
    /// 12-bit CLK1 divider (Bits[DB14:DB3]).
    /// Ramp step period = CLK1 × CLK2 / f PFD
    , R2, Clk1Divider, u16, 12, 3
);


// Register 3, function register

gen_bitfield_enum!(
    /// Bits[DB11:DB10] select the ramp shape.
    , R3, RampMode, 2, 10,
    {
        ContinuousSawtooth = 0,
        ContinuousTriangular = 1,
        SingleSawtoothBurst = 2;
        SingleRampBurst
    }
);

gen_bitfield_enum!(
    /// DB6 sets the phase detector polarity. Positive for a passive or
    /// noninverting active loop filter.
    , R3, PdPolarity, 1, 6,
    { Negative = 0; Positive }
);

gen_bitfield_enum!(
    /// DB5, power-down
    , R3, PowerDown, 1, 5,
    { Disabled = 0; Enabled }
);

gen_bitfield_enum!(
    /// DB4, charge pump three-state
    , R3, ChargePumpThreeState, 1, 4,
    { Disabled = 0; Enabled }
);

gen_bitfield_enum!(
    /// DB3, R and N counter reset
    , R3, CounterReset, 1, 3,
    { Disabled = 0; Enabled }
);


// Register 4, test register

gen_bitfield_struct!(
    /// Σ-Δ modulator mode, Bits[DB30:DB26]. 0 is normal operation.
    , R4, SigmaDeltaMode, u8, 5, 26
);

gen_bitfield_struct!(
    /// Ramp status routed to MUXOUT, Bits[DB25:DB21].
    , R4, RampStatus, u8, 5, 21
);

gen_bitfield_enum!(
    /// Bits[DB20:DB19] select what the 12-bit CLK2 divider is used for.
    , R4, ClockDividerMode, 2, 19,
    {
        Off = 0,
        FastLock = 1,
        Reserved = 2;
        RampDivider
    }
);

gen_bitfield_struct!(
    /// 12-bit CLK2 divider, Bits[DB18:DB7]
    , R4, Clk2Divider, u16, 12, 7
);


// Register 5, deviation register

gen_bitfield_struct!(
    /// 4-bit deviation offset, Bits[DB22:DB19].
    /// f DEV = DEV × f RES × 2^DEV_OFFSET
    , R5, DeviationOffset, u8, 4, 19
);

gen_bitfield_struct!(
    /// 16-bit deviation word, Bits[DB18:DB3], two's complement.
    , R5, Deviation, u16, 16, 3
);


// Register 6, step register

gen_bitfield_struct!(
    /// 20-bit step word, Bits[DB22:DB3]: number of steps per ramp.
    , R6, StepWord, u32, 20, 3
);


// Register 7, delay register

gen_bitfield_enum!(
    , R7, FastRamp, 1, 18,
    { Disabled = 0; Enabled }
);

gen_bitfield_enum!(
    , R7, RampDelayFastLock, 1, 17,
    { Disabled = 0; Enabled }
);

gen_bitfield_enum!(
    /// DB16 inserts a delay between consecutive ramps.
    , R7, RampDelay, 1, 16,
    { Disabled = 0; Enabled }
);

gen_bitfield_enum!(
    /// DB15 selects the delay clock: f PFD or f PFD × CLK1.
    , R7, DelayClockSelect, 1, 15,
    { Pfd = 0; PfdClk1 }
);

gen_bitfield_struct!(
    /// 12-bit delay start word, Bits[DB14:DB3]
    , R7, DelayStartWord, u16, 12, 3
);


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registers_carry_only_the_address() {
        let rs = RegisterSet::default();
        let addrs: Vec<u8> = rs.sequence().map(|r| r.address()).collect();
        assert_eq!(addrs, vec![6, 5, 4, 3, 2, 1, 0]);
        for r in rs.sequence() {
            assert_eq!(r.word(), r.address() as u32);
        }
    }

    #[test]
    fn touching_r7_adds_it_to_the_front() {
        let rs = RegisterSet::default().set(RampDelay::Enabled);
        let addrs: Vec<u8> = rs.sequence().map(|r| r.address()).collect();
        assert_eq!(addrs, vec![7, 6, 5, 4, 3, 2, 1, 0]);
        assert_eq!(rs.words().next(), Some((1 << 16) | 7));
    }

    #[test]
    fn r0_field_positions() {
        let r = Reg::<R0>::default()
            .set(RampOn::Enabled)
            .set(Muxout::READBACK)
            .set(Int(5))
            .set(FracMsb(2048));
        assert_eq!(r.w, (1 << 31) | (15 << 27) | (5 << 15) | (2048 << 3));
        assert_eq!(r.w, 0xF802_C000);
        assert_eq!(r.get::<Int>(), Int(5));
        assert_eq!(r.get::<FracMsb>(), FracMsb(2048));
        assert_eq!(r.get::<RampOn>(), RampOn::Enabled);
    }

    #[test]
    fn r1_frac_lsb_position() {
        let r = Reg::<R1>::default().set(FracLsb(0x1FFF));
        assert_eq!(r.w, (0x1FFF << 15) | 1);
    }

    #[test]
    fn r2_field_positions() {
        let r = Reg::<R2>::default()
            .set(CycleSlipReduction::Enabled)
            .set(ChargePumpCurrent(14))
            .set(Prescaler::Pr89)
            .set(RCounter(1))
            .set(Clk1Divider(30));
        assert_eq!(r.w, 0x1E40_80F2);
        assert_eq!(r.get::<Rdiv2>(), Rdiv2::Disabled);
        assert_eq!(r.get::<RefDoubler>(), RefDoubler::Disabled);
    }

    #[test]
    fn r3_ramp_mode_position() {
        let saw = Reg::<R3>::default().set(RampMode::ContinuousSawtooth).set(PdPolarity::Positive);
        let tri = Reg::<R3>::default().set(RampMode::ContinuousTriangular).set(PdPolarity::Positive);
        assert_eq!(saw.w, 0x43);
        assert_eq!(tri.w, 0x443);
        assert_eq!(Reg::<R3>::default().set(RampMode::SingleRampBurst).w, (3 << 10) | 3);
    }

    #[test]
    fn r4_field_positions() {
        let r = Reg::<R4>::default()
            .set(SigmaDeltaMode(0))
            .set(RampStatus(3))
            .set(ClockDividerMode::RampDivider)
            .set(Clk2Divider(1));
        assert_eq!(r.w, (3 << 21) | (3 << 19) | (1 << 7) | 4);
        assert_eq!(r.get::<ClockDividerMode>(), ClockDividerMode::RampDivider);
    }

    #[test]
    fn r5_r6_r7_field_positions() {
        let r5 = Reg::<R5>::default().set(DeviationOffset(3)).set(Deviation(20971));
        assert_eq!(r5.w, (3 << 19) | (20971 << 3) | 5);

        let r6 = Reg::<R6>::default().set(StepWord(1000));
        assert_eq!(r6.w, (1000 << 3) | 6);

        let r7 = Reg::<R7>::default()
            .set(FastRamp::Enabled)
            .set(RampDelayFastLock::Enabled)
            .set(RampDelay::Enabled)
            .set(DelayClockSelect::PfdClk1)
            .set(DelayStartWord(100));
        assert_eq!(r7.w, (1 << 18) | (1 << 17) | (1 << 16) | (1 << 15) | (100 << 3) | 7);
    }

    #[test]
    fn oversized_values_are_masked_to_the_field() {
        let r = Reg::<R0>::default().set(FracMsb(0xFFFF));
        assert_eq!(r.get::<FracMsb>(), FracMsb(0x0FFF));
        assert_eq!(r.get::<Int>(), Int(0));
        assert_eq!(r.address(), 0);

        let r = Reg::<R7>::default().set(DelayStartWord(0xFFFF));
        assert_eq!(r.get::<DelayClockSelect>(), DelayClockSelect::Pfd);
        assert_eq!(r.address(), 7);
    }

    #[test]
    fn set_replaces_previous_field_value() {
        let r = Reg::<R3>::default()
            .set(RampMode::SingleRampBurst)
            .set(RampMode::ContinuousTriangular);
        assert_eq!(r.get::<RampMode>(), RampMode::ContinuousTriangular);
        assert_eq!(r.w, (1 << 10) | 3);
    }
}
