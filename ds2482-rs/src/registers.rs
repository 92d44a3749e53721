use crate::{
    Ds2482, Ds2482Error, Ds2482Result,
    commands::{
        CHANNEL_SELECT_CMD, CONFIG_REG, DEVICE_RESET_CMD, SET_READ_PTR_CMD, STATUS_REG,
        WRITE_CONFIG_CMD,
    },
    traits::Interact,
};
use bitfield_struct::bitfield;
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

/// Builder for creating a [`Ds2482`] instance with custom configuration.
pub struct Ds2482Builder {
    retries: u8,
    address_pins: u8,
    config: DeviceConfiguration,
}

impl Default for Ds2482Builder {
    fn default() -> Self {
        Ds2482Builder {
            retries: 20,
            address_pins: 0,
            config: DeviceConfiguration::new(),
        }
    }
}

impl Ds2482Builder {
    /// Sets the busy-poll budget.
    ///
    /// The bridge is polled once per millisecond while it reports busy;
    /// `retries` polls without the busy bit clearing fail the operation
    /// with [`Timeout`](Ds2482Error::Timeout).
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    /// Selects the I2C address from the AD1/AD0 strap pins (0..=3).
    pub fn with_address_pins(mut self, pins: u8) -> Self {
        self.address_pins = pins & 0x03;
        self
    }

    /// Sets the device configuration written during [`build`](Self::build).
    pub fn with_config(mut self, config: DeviceConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Builds a new [`Ds2482`]: resets the bridge and writes the requested
    /// configuration.
    pub fn build<I: I2c<SevenBitAddress>, D: DelayNs>(
        self,
        i2c: I,
        delay: D,
    ) -> Ds2482Result<Ds2482<I, D>, I::Error> {
        let mut dev = Ds2482 {
            i2c,
            addr: 0x18 | self.address_pins,
            delay,
            retries: self.retries,
            channel: Channel::Io0,
        };
        dev.device_reset()?;
        dev.configure(self.config)?;
        Ok(dev)
    }
}

impl<I: I2c<SevenBitAddress>, D: DelayNs> Ds2482<I, D> {
    /// Get the status of the bridge.
    pub fn get_status(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        let mut stat = DeviceStatus::default();
        stat.read(self)?;
        Ok(stat)
    }

    /// Reset the bridge.
    ///
    /// Performs a global reset of device state machine logic, which in turn
    /// selects IO0 as the active 1-Wire channel. Terminates any ongoing
    /// 1-Wire communication.
    pub fn device_reset(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        self.i2c.write(self.addr, &[DEVICE_RESET_CMD])?;
        let status = self.wait_ready(false)?;
        self.channel = Channel::Io0;
        Ok(status)
    }

    /// Write the configuration register and verify the echoed value.
    ///
    /// The wire byte carries the one's complement of the configuration in
    /// its upper nibble; the bridge echoes the accepted configuration with
    /// the upper nibble zero. An echo that differs from the requested value
    /// fails with [`ConfigurationMismatch`](Ds2482Error::ConfigurationMismatch).
    pub fn configure(&mut self, config: DeviceConfiguration) -> Ds2482Result<(), I::Error> {
        let mut echo = config;
        echo.write(self)?;
        if echo.0 != config.0 {
            return Err(Ds2482Error::ConfigurationMismatch);
        }
        Ok(())
    }

    /// Select the active 1-Wire IO channel (DS2482-800 only).
    ///
    /// A no-op if `channel` is already selected. The selection code read
    /// back is intentionally different from the code written; a mismatch
    /// fails with [`ChannelSelectionFailed`](Ds2482Error::ChannelSelectionFailed).
    /// Returns the read-back code.
    pub fn select_channel(&mut self, channel: Channel) -> Ds2482Result<u8, I::Error> {
        if self.channel == channel {
            return Ok(channel.read_code());
        }
        self.wait_ready(true)?;
        let mut echo = [0; 1];
        self.i2c.write_read(
            self.addr,
            &[CHANNEL_SELECT_CMD, channel.write_code()],
            &mut echo,
        )?;
        if echo[0] != channel.read_code() {
            return Err(Ds2482Error::ChannelSelectionFailed);
        }
        self.channel = channel;
        Ok(echo[0])
    }

    /// The currently selected 1-Wire IO channel.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub(crate) fn wait_ready(&mut self, set_pointer: bool) -> Ds2482Result<DeviceStatus, I::Error> {
        if set_pointer {
            self.i2c.write(self.addr, &[SET_READ_PTR_CMD, STATUS_REG])?;
        }
        let mut tries = 0;
        loop {
            let mut buf = [0; 1];
            self.i2c.read(self.addr, &mut buf)?;
            let status = DeviceStatus::from(buf[0]);
            if !status.onewire_busy() {
                break Ok(status);
            }
            if tries >= self.retries {
                break Err(Ds2482Error::Timeout);
            }
            tries += 1;
            self.delay.delay_ms(1);
        }
    }
}

/// Status register of the DS2482.
///
/// The read-only status register is the general means for the DS2482 to
/// report bit-type data from the 1-Wire side, 1-Wire busy status, and its
/// own reset status to the host processor. All 1-Wire communication
/// commands and the Device Reset command position the read pointer at the
/// status register for the host processor to read with minimal protocol
/// overhead. Status information is updated during the execution of certain
/// commands only.
#[bitfield(u8)]
pub struct DeviceStatus {
    /// The 1WB bit reports whether the 1-Wire line is busy. During 1-Wire
    /// communication 1WB is 1; once the command is completed, 1WB returns
    /// to its default 0. No 1-Wire communication command is accepted while
    /// 1WB is 1.
    pub onewire_busy: bool,
    /// The PPD bit is updated with every 1-Wire Reset command. If the
    /// DS2482 detects a logic 0 on the 1-Wire line during the
    /// presence-detect cycle, the PPD bit is set to 1. This bit returns to
    /// its default 0 if there is no presence pulse during a subsequent
    /// 1-Wire Reset command.
    pub present_pulse_detect: bool,
    /// The SD bit is updated with every 1-Wire Reset command. If the DS2482
    /// detects a logic 0 on the 1-Wire line during the short-detect sample
    /// window of the presence-detect cycle, the SD bit is set to 1. If the
    /// 1-Wire line is shorted, the PPD bit is also set.
    pub short_detect: bool,
    /// The LL bit reports the logic state of the active 1-Wire line without
    /// initiating any 1-Wire communication. The line is sampled every time
    /// the status register is read.
    pub logic_level: bool,
    /// If the RST bit is 1, the DS2482 has performed an internal reset
    /// cycle, either caused by a power-on reset or from executing the
    /// Device Reset command. The RST bit is cleared automatically by a
    /// Write Configuration command.
    pub device_reset: bool,
    /// The SBR bit reports the logic state of the active 1-Wire line
    /// sampled at the first read time slot of a 1-Wire Single Bit or 1-Wire
    /// Triplet command.
    pub single_bit_result: bool,
    /// The TSB bit reports the logic state of the active 1-Wire line
    /// sampled at the second read time slot of a 1-Wire Triplet command.
    /// This bit is updated only with a 1-Wire Triplet command and has no
    /// function with other commands.
    pub triplet_second_bit: bool,
    /// Whenever a 1-Wire Triplet command is executed, this bit reports the
    /// search direction that was chosen by the third time slot of the
    /// triplet. This bit is updated only with a 1-Wire Triplet command and
    /// has no function with other commands.
    pub branch_dir_taken: bool,
}

impl Interact for DeviceStatus {
    const WRITE_ADDR: u8 = 0x0;

    const READ_PTR: u8 = STATUS_REG;

    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        let mut buf = [0; 1];
        dev.i2c
            .write_read(dev.addr, &[SET_READ_PTR_CMD, Self::READ_PTR], &mut buf)?;
        self.0 = buf[0];
        Ok(())
    }

    // The status register is read-only.
    fn write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        _dev: &mut Ds2482<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        Ok(())
    }
}

#[bitfield(u8, into = cfg_to_u8)]
/// # Configuration register of the DS2482
///
/// The DS2482 supports three 1-Wire features that are enabled or selected
/// through the configuration register:
/// - Active Pullup (APU)
/// - Strong Pullup (SPU)
/// - 1-Wire Speed (1WS)
///
/// APU, SPU, and 1WS can be selected in any combination. While APU and 1WS
/// maintain their states, SPU returns to its inactive state as soon as the
/// strong pullup has ended. The register is written through a wire byte
/// whose upper nibble must be the one's complement of the lower nibble;
/// when read, the upper nibble is always 0h.
///
/// After a device reset (power-up cycle or initiated by the Device Reset
/// command), the configuration register reads 00h.
pub struct DeviceConfiguration {
    /// The APU bit controls whether an active pullup (low-impedance
    /// transistor) or a passive pullup (resistor) is used to drive the
    /// 1-Wire line from low to high. When APU = 0, active pullup is
    /// disabled (resistor mode). Enabling active pullup is generally
    /// recommended for best 1-Wire bus performance.
    pub active_pullup: bool,
    reserved0: bool,
    /// The SPU bit activates the strong pullup function prior to a 1-Wire
    /// Write Byte or 1-Wire Single Bit command. Strong pullup is commonly
    /// used with parasitically powered devices that need extra power during
    /// an operation, e.g., a temperature conversion or EEPROM copy. The SPU
    /// bit must be set immediately prior to issuing the command that puts
    /// the 1-Wire device into the state where it needs the extra power.
    pub strong_pullup: bool,
    /// The 1WS bit determines the timing of any 1-Wire communication
    /// generated by the DS2482. All 1-Wire slave devices support standard
    /// speed (1WS = 0); many can also communicate at overdrive speed. To
    /// change speed, the device on the bus needs to receive an
    /// Overdrive-Skip or Overdrive-Match ROM command, and the DS2482 must
    /// take part in the speed change to stay synchronized.
    pub onewire_speed: bool,
    #[bits(4)]
    reserved: u8,
}

// Wire format of a configuration write: the upper nibble carries the one's
// complement of the lower nibble, or the bridge rejects the byte.
const fn cfg_to_u8(cfg: u8) -> u8 {
    (cfg & 0x0f) | ((!cfg & 0x0f) << 4)
}

impl DeviceConfiguration {
    /// Raw register bits, without the complement nibble applied.
    pub(crate) const fn raw(self) -> u8 {
        self.0
    }
}

impl Interact for DeviceConfiguration {
    const WRITE_ADDR: u8 = WRITE_CONFIG_CMD;
    const READ_PTR: u8 = CONFIG_REG;

    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        let mut buf = [0; 1];
        dev.i2c
            .write_read(dev.addr, &[SET_READ_PTR_CMD, Self::READ_PTR], &mut buf)?;
        self.0 = buf[0];
        Ok(())
    }

    fn write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        dev.wait_ready(true)?;
        let mut buf = [0; 1];
        dev.i2c
            .write_read(dev.addr, &[Self::WRITE_ADDR, u8::from(*self)], &mut buf)?;
        self.0 = buf[0];
        Ok(())
    }
}

/// 1-Wire IO channels of the DS2482-800.
///
/// The single-channel DS2482-100 only has [`Channel::Io0`]. A device reset
/// always selects IO0.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Channel {
    /// IO0, the channel selected after a device reset.
    #[default]
    Io0 = 0,
    /// IO1
    Io1,
    /// IO2
    Io2,
    /// IO3
    Io3,
    /// IO4
    Io4,
    /// IO5
    Io5,
    /// IO6
    Io6,
    /// IO7
    Io7,
}

// (write, read-back) selection codes, indexed by channel number.
const CHANNEL_CODES: [(u8, u8); 8] = [
    (0xf0, 0xb8),
    (0xe1, 0xb1),
    (0xd2, 0xaa),
    (0xc3, 0xa3),
    (0xb4, 0x9c),
    (0xa5, 0x95),
    (0x96, 0x8e),
    (0x87, 0x87),
];

impl Channel {
    /// Channel for a zero-based channel number, `None` past IO7.
    pub const fn new(num: u8) -> Option<Self> {
        match num {
            0 => Some(Channel::Io0),
            1 => Some(Channel::Io1),
            2 => Some(Channel::Io2),
            3 => Some(Channel::Io3),
            4 => Some(Channel::Io4),
            5 => Some(Channel::Io5),
            6 => Some(Channel::Io6),
            7 => Some(Channel::Io7),
            _ => None,
        }
    }

    /// Selection code written to the channel selection register.
    pub const fn write_code(self) -> u8 {
        CHANNEL_CODES[self as usize].0
    }

    /// Code expected when the channel selection register is read back after
    /// selecting this channel.
    pub const fn read_code(self) -> u8 {
        CHANNEL_CODES[self as usize].1
    }
}
