//! Bus and control line collaborators
//!
//! The driver only needs "shift these bytes out to device N" and
//! "drive logical pin P". Adapters for embedded-hal SPI / output pins
//! and for a 16-bit GPIO data register are provided.

use embedded_hal:: {
    digital::v2::OutputPin,
    blocking::spi::Write,
};


/// Chip-select line on the SPI controller
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub struct DeviceId(pub u8);

impl DeviceId {
    /// Slave select 0, where the synthesizer sits
    pub const SYNTH: DeviceId = DeviceId(0);
}


/// Logical GPIO lines, numbered by their bit in the GPIO data register.
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum LogicalPin {
    /// CE, powers the synthesizer up
    ChipEnable = 0,
    /// LE, rising edge latches the shift register
    LatchEnable = 1,
    /// Sampling finished, to FPGA
    SamplingDone = 2,
    /// Ramp programmed, to FPGA
    RampConfigured = 3,
    /// Software reset for the next radar run, to FPGA
    SoftwareReset = 4,
}

impl LogicalPin {
    /// Bit in the GPIO data register
    #[inline]
    pub fn mask(self: Self) -> u16 {
        1 << (self as u16)
    }
}


/// Serial bus, blocking / polling mode.
pub trait BusTransport {
    type Error;

    /// Bring the bus controller up
    fn init(&mut self) -> Result<(), Self::Error> { Ok(()) }

    fn select(&mut self, dev: DeviceId) -> Result<(), Self::Error>;

    fn deselect(&mut self, dev: DeviceId) -> Result<(), Self::Error>;

    /// Shift `bytes` out, first byte first. Returns once the last bit is out.
    fn transfer(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// General purpose outputs addressed by logical pin.
pub trait DigitalIo {
    type Error;

    /// Bring the GPIO block up
    fn init(&mut self) -> Result<(), Self::Error> { Ok(()) }

    /// Drive the pin high
    fn set_pin(&mut self, pin: LogicalPin) -> Result<(), Self::Error>;

    /// Drive the pin low
    fn clear_pin(&mut self, pin: LogicalPin) -> Result<(), Self::Error>;
}


/// embedded-hal SPI bus with an active low chip-select pin.
///
/// `spi` - SPI device (`MOSI` => `DATA`, `CLK` => `CLK`, `CPHA` = 0)
/// `cs` - chip select, the only device on this bus
pub struct SpiTransport<SPI, CS> {
    spi: SPI,
    cs: CS,
}

/// Transport error, embedded-hal error types are erased
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum SpiTransportError {
    Spi,
    ChipSelect,
}

impl<SPI, CS> SpiTransport<SPI, CS>
where SPI: Write<u8>,
      CS: OutputPin,
{
    pub fn new(spi: SPI, cs: CS) -> Self {
        SpiTransport { spi, cs }
    }

    /// Give the bus and the pin back
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS> BusTransport for SpiTransport<SPI, CS>
where SPI: Write<u8>,
      CS: OutputPin,
{
    type Error = SpiTransportError;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.cs.set_high().map_err(|_| SpiTransportError::ChipSelect)
    }

    fn select(&mut self, _dev: DeviceId) -> Result<(), Self::Error> {
        self.cs.set_low().map_err(|_| SpiTransportError::ChipSelect)
    }

    fn deselect(&mut self, _dev: DeviceId) -> Result<(), Self::Error> {
        self.cs.set_high().map_err(|_| SpiTransportError::ChipSelect)
    }

    fn transfer(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.spi.write(bytes).map_err(|_| SpiTransportError::Spi)
    }
}


/// CE and LE wired to two embedded-hal output pins.
/// The application handshake lines are not available here.
pub struct ControlPins<CE, LE> {
    pin_ce: CE,
    pin_le: LE,
}

#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum ControlPinError {
    /// The pin could not be driven
    Pin,
    /// No such line on this board
    Unsupported(LogicalPin),
}

impl<CE, LE> ControlPins<CE, LE>
where CE: OutputPin,
      LE: OutputPin,
{
    /// `pin_ce` - "chip enable" pin
    /// `pin_le` - "load enable" pin
    pub fn new(pin_ce: CE, pin_le: LE) -> Self {
        ControlPins { pin_ce, pin_le }
    }

    pub fn release(self) -> (CE, LE) {
        (self.pin_ce, self.pin_le)
    }
}

impl<CE, LE> DigitalIo for ControlPins<CE, LE>
where CE: OutputPin,
      LE: OutputPin,
{
    type Error = ControlPinError;

    fn set_pin(&mut self, pin: LogicalPin) -> Result<(), Self::Error> {
        match pin {
            LogicalPin::ChipEnable => self.pin_ce.set_high().map_err(|_| ControlPinError::Pin),
            LogicalPin::LatchEnable => self.pin_le.set_high().map_err(|_| ControlPinError::Pin),
            other => Err(ControlPinError::Unsupported(other)),
        }
    }

    fn clear_pin(&mut self, pin: LogicalPin) -> Result<(), Self::Error> {
        match pin {
            LogicalPin::ChipEnable => self.pin_ce.set_low().map_err(|_| ControlPinError::Pin),
            LogicalPin::LatchEnable => self.pin_le.set_low().map_err(|_| ControlPinError::Pin),
            other => Err(ControlPinError::Unsupported(other)),
        }
    }
}


/// 16-bit GPIO channel: a data register plus a direction register.
pub trait PortRegister {
    type Error;

    /// Direction bits, 1 = input, 0 = output
    fn set_direction(&mut self, inputs: u16) -> Result<(), Self::Error>;

    fn read(&mut self) -> Result<u16, Self::Error>;

    fn write(&mut self, value: u16) -> Result<(), Self::Error>;
}

/// Logical pins on one 16-bit GPIO channel, updated read-modify-write.
pub struct MaskedGpio<P> {
    port: P,
}

impl<P: PortRegister> MaskedGpio<P> {
    pub fn new(port: P) -> Self {
        MaskedGpio { port }
    }

    pub fn release(self) -> P {
        self.port
    }

    /// Replace the bits selected by `mask` with those of `value`
    pub fn write_pins(&mut self, mask: u16, value: u16) -> Result<(), P::Error> {
        let current = self.port.read()?;
        self.port.write((current & !mask) | (value & mask))
    }
}

impl<P: PortRegister> DigitalIo for MaskedGpio<P> {
    type Error = P::Error;

    /// All 16 lines become outputs, driven low.
    fn init(&mut self) -> Result<(), Self::Error> {
        self.port.set_direction(0x0000)?;
        self.port.write(0x0000)
    }

    fn set_pin(&mut self, pin: LogicalPin) -> Result<(), Self::Error> {
        self.write_pins(pin.mask(), pin.mask())
    }

    fn clear_pin(&mut self, pin: LogicalPin) -> Result<(), Self::Error> {
        self.write_pins(pin.mask(), 0)
    }
}
