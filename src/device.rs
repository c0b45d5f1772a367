//! Device lifecycle and register write sequencing

use log::{debug, error, info, warn};

use crate::config::*;
use crate::errors::*;
use crate::register::*;
use crate::transport::*;


/// Driver lifecycle
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum DriverState {
    /// `initialize` not called yet
    Uninitialized,
    /// CE low, LE high
    Idle,
    /// CE high
    Enabled,
    /// Register sequence in progress
    Configuring,
    /// A register write failed, chip contents are unknown
    Fault,
}

/// Levels the driver last put on the control lines
#[derive(Debug,Copy,Clone,Default,PartialEq,Eq)]
pub struct DeviceState {
    /// CE high
    pub enabled: bool,
    /// LE high
    pub latch_asserted: bool,
}


/// ADF4158 device
pub struct Adf4158<BUS, IO> {
    bus: BUS,
    io: IO,
    dev: DeviceId,
    lines: DeviceState,
    state: DriverState,
}


impl<BUS, IO> Adf4158<BUS, IO>
where BUS: BusTransport,
      IO: DigitalIo,
{
    /// Creates the device (uninitialized, no output).
    ///
    /// `bus` - serial bus the synthesizer is on, as [`DeviceId::SYNTH`]
    /// `io` - GPIO block carrying CE and LE
    pub fn new(bus: BUS, io: IO) -> Self {
        Adf4158 {
            bus,
            io,
            dev: DeviceId::SYNTH,
            lines: DeviceState::default(),
            state: DriverState::Uninitialized,
        }
    }

    /// Brings the bus and GPIO up and parks the device: CE low, LE high.
    /// This is also the only way out of [`DriverState::Fault`].
    pub fn initialize(self: &mut Self) -> Result<(), Error> {
        match self.bring_up() {
            Ok(()) => {
                self.lines = DeviceState { enabled: false, latch_asserted: true };
                self.state = DriverState::Idle;
                info!("ADF4158 initialized");
                Ok(())
            }
            Err(e) => {
                error!("ADF4158 initialization failed");
                if self.state != DriverState::Fault {
                    self.state = DriverState::Uninitialized;
                }
                Err(e)
            }
        }
    }

    fn bring_up(self: &mut Self) -> Result<(), Error> {
        self.bus.init().map_err(|_| Error::Initialization)?;
        self.io.init().map_err(|_| Error::Initialization)?;
        self.io.clear_pin(LogicalPin::ChipEnable).map_err(|_| Error::Initialization)?;
        self.io.set_pin(LogicalPin::LatchEnable).map_err(|_| Error::Initialization)?;
        Ok(())
    }

    /// Powers up the device, depending on the status of the power-down bits.
    /// Does nothing if CE is already high.
    pub fn enable_device(self: &mut Self) -> Result<(), Error> {
        self.ready()?;
        if self.lines.enabled {
            return Ok(());
        }
        self.io.set_pin(LogicalPin::ChipEnable).map_err(|_| Error::Pin)?;
        self.lines.enabled = true;
        if self.state == DriverState::Idle {
            self.state = DriverState::Enabled;
        }
        Ok(())
    }

    /// Powers down the device and puts the charge pump into three-state mode.
    pub fn shutdown(self: &mut Self) -> Result<(), Error> {
        if self.state == DriverState::Uninitialized {
            return Err(Error::NotInitialized);
        }
        self.io.clear_pin(LogicalPin::ChipEnable).map_err(|_| Error::Pin)?;
        self.lines.enabled = false;
        if self.state != DriverState::Fault {
            self.state = DriverState::Idle;
        }
        Ok(())
    }

    /// Programs a sweep: encodes it, powers the device up and writes the
    /// whole register sequence, R0 last.
    ///
    /// Encoding errors are reported before the hardware is touched.
    /// A failed write leaves the device in [`DriverState::Fault`],
    /// registers written before it stay latched.
    pub fn configure_sweep(self: &mut Self, spec: &SweepSpec) -> Result<RampParams, Error> {
        let params = RampParams::compute(spec).map_err(|e| {
            warn!("rejected sweep: {}", e);
            Error::from(e)
        })?;
        let rs = RegisterSet::from_params(spec, &params);

        self.ready()?;
        self.enable_device()?;

        self.state = DriverState::Configuring;
        self.write_register_set(&rs)?;
        self.state = DriverState::Enabled;

        info!(
            "ADF4158 sweep configured: N={} FRAC={}/{} steps={} DEV={}<<{} CLK1={}",
            params.n, params.frac_msb, params.frac_lsb,
            params.steps, params.dev, params.dev_offset, params.clk1
        );
        Ok(params)
    }

    /// Writes all registers in the set, in sequence order.
    /// Stops at the first failed word.
    pub fn write_register_set(self: &mut Self, rs: &RegisterSet) -> Result<(), Error> {
        for r in rs.sequence() {
            self.write_register(r.word())?;
        }
        Ok(())
    }

    /// Data is clocked into the 32-bit shift register
    /// on each rising edge of CLK. The data is clocked in MSB first.
    ///
    /// Data is transferred from the shift register to one of eight latches
    /// on the rising edge of LE. The destination latch is determined by
    /// the state of the three control bits (C3, C2, and C1) in the shift
    /// register.
    ///
    /// Blocking implementation. Any failure faults the device.
    pub fn write_register(self: &mut Self, w: u32) -> Result<(), Error> {
        self.ready()?;
        match self.shift_out(w) {
            Ok(()) => {
                debug!("R{} <= {:#010x}", w & ADDRESS_MASK, w);
                Ok(())
            }
            Err(e) => {
                error!("R{} write failed, device faulted", w & ADDRESS_MASK);
                self.state = DriverState::Fault;
                Err(e)
            }
        }
    }

    #[inline(always)]
    fn shift_out(self: &mut Self, w: u32) -> Result<(), Error> {
        self.io.clear_pin(LogicalPin::LatchEnable).map_err(|_| Error::Transfer)?;
        self.lines.latch_asserted = false;

        self.bus.select(self.dev).map_err(|_| Error::Transfer)?;
        // CS is released even when the frame fails, LE stays low
        let sent = self.bus.transfer(&w.to_be_bytes());
        let released = self.bus.deselect(self.dev);
        sent.map_err(|_| Error::Transfer)?;
        released.map_err(|_| Error::Transfer)?;

        self.io.set_pin(LogicalPin::LatchEnable).map_err(|_| Error::Transfer)?;
        self.lines.latch_asserted = true;
        Ok(())
    }

    fn ready(self: &Self) -> Result<(), Error> {
        match self.state {
            DriverState::Uninitialized => Err(Error::NotInitialized),
            DriverState::Fault => Err(Error::Faulted),
            _ => Ok(()),
        }
    }

    #[inline]
    pub fn state(self: &Self) -> DriverState {
        self.state
    }

    /// True after a failed write, until the next successful `initialize`
    #[inline]
    pub fn is_faulted(self: &Self) -> bool {
        self.state == DriverState::Fault
    }

    #[inline]
    pub fn device_state(self: &Self) -> DeviceState {
        self.lines
    }

    /// Give the collaborators back
    pub fn release(self) -> (BUS, IO) {
        (self.bus, self.io)
    }
}
