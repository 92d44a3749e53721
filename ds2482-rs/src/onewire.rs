use crate::{
    Ds2482, Ds2482Error, Ds2482Result, Rom,
    commands::{
        ONEWIRE_MATCH_ROM_CMD, ONEWIRE_READ_BYTE_CMD, ONEWIRE_RESET_CMD, ONEWIRE_SINGLE_BIT_CMD,
        ONEWIRE_SKIP_ROM_CMD, ONEWIRE_TRIPLET_CMD, ONEWIRE_WRITE_BYTE_CMD, READ_DATA_REG,
        SET_READ_PTR_CMD,
    },
    registers::DeviceStatus,
};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

/// How devices on the 1-Wire bus are addressed after a bus reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// Skip ROM: address every device on the bus at once. With more than
    /// one device present, any subsequent read collides.
    Skip,
    /// Match ROM: address the single device with the given ROM.
    Match(Rom),
}

impl<I: I2c<SevenBitAddress>, D: DelayNs> Ds2482<I, D> {
    /// Generate a 1-Wire reset/presence-detect cycle on the active channel.
    ///
    /// Fails with [`ShortCircuit`](Ds2482Error::ShortCircuit) if the line is
    /// shorted, and with [`NoDevicePresent`](Ds2482Error::NoDevicePresent)
    /// if no device answers with a presence pulse.
    pub fn onewire_reset(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        self.wait_ready(true)?;
        self.i2c.write(self.addr, &[ONEWIRE_RESET_CMD])?;
        let status = self.wait_ready(false)?;
        if status.short_detect() {
            Err(Ds2482Error::ShortCircuit)
        } else if !status.present_pulse_detect() {
            Err(Ds2482Error::NoDevicePresent)
        } else {
            Ok(status)
        }
    }

    /// Reset the bridge and then the 1-Wire bus.
    ///
    /// The usual initialization sequence: a global device reset (which also
    /// selects IO0) followed by a reset/presence-detect cycle on the bus.
    pub fn reset(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        self.device_reset()?;
        self.onewire_reset()
    }

    /// Write a single byte to the active 1-Wire channel. Returns the status
    /// after the eight generated time slots have completed.
    pub fn write_byte(&mut self, byte: u8) -> Ds2482Result<DeviceStatus, I::Error> {
        self.wait_ready(true)?;
        self.i2c
            .write(self.addr, &[ONEWIRE_WRITE_BYTE_CMD, byte])?;
        self.wait_ready(false)
    }

    /// Read a single byte from the active 1-Wire channel.
    ///
    /// Generates eight read time slots, then moves the read pointer to the
    /// read data register to fetch the result.
    pub fn read_byte(&mut self) -> Ds2482Result<u8, I::Error> {
        self.wait_ready(true)?;
        self.i2c.write(self.addr, &[ONEWIRE_READ_BYTE_CMD])?;
        self.wait_ready(false)?;
        let mut buf = [0; 1];
        self.i2c
            .write_read(self.addr, &[SET_READ_PTR_CMD, READ_DATA_REG], &mut buf)?;
        Ok(buf[0])
    }

    /// Write a block of bytes to the active 1-Wire channel, byte by byte.
    pub fn write_block(&mut self, data: &[u8]) -> Ds2482Result<(), I::Error> {
        for &byte in data {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Fill `buf` with bytes read from the active 1-Wire channel.
    pub fn read_block(&mut self, buf: &mut [u8]) -> Ds2482Result<(), I::Error> {
        for byte in buf.iter_mut() {
            *byte = self.read_byte()?;
        }
        Ok(())
    }

    /// Generate a single 1-Wire time slot. A `set_high` slot doubles as a
    /// read slot; the return value is the sampled line state.
    pub fn single_bit(&mut self, set_high: bool) -> Ds2482Result<bool, I::Error> {
        self.wait_ready(true)?;
        self.i2c.write(
            self.addr,
            &[ONEWIRE_SINGLE_BIT_CMD, if set_high { 0x80 } else { 0x0 }],
        )?;
        Ok(self.wait_ready(false)?.single_bit_result())
    }

    /// Generate a triplet: two read time slots followed by one write time
    /// slot whose value depends on the read slots and `direction`.
    ///
    /// Returns the raw status; the caller decodes
    /// [`single_bit_result`](DeviceStatus::single_bit_result),
    /// [`triplet_second_bit`](DeviceStatus::triplet_second_bit) and
    /// [`branch_dir_taken`](DeviceStatus::branch_dir_taken).
    pub fn triplet(&mut self, direction: bool) -> Ds2482Result<DeviceStatus, I::Error> {
        self.wait_ready(true)?;
        self.i2c.write(
            self.addr,
            &[ONEWIRE_TRIPLET_CMD, if direction { 0x80 } else { 0x0 }],
        )?;
        self.wait_ready(false)
    }

    /// Reset the bus and address devices according to `addressing`.
    ///
    /// A matched ROM must have a nonzero family code, else the call fails
    /// with [`InvalidRom`](Ds2482Error::InvalidRom) before any bus traffic.
    pub fn address(&mut self, addressing: Addressing) -> Ds2482Result<(), I::Error> {
        match addressing {
            Addressing::Skip => {
                self.onewire_reset()?;
                self.write_byte(ONEWIRE_SKIP_ROM_CMD)?;
            }
            Addressing::Match(rom) => {
                if rom.family() == 0 {
                    return Err(Ds2482Error::InvalidRom);
                }
                self.onewire_reset()?;
                self.write_byte(ONEWIRE_MATCH_ROM_CMD)?;
                self.write_block(rom.as_bytes())?;
            }
        }
        Ok(())
    }

    /// Address the device with the given ROM and send `payload`.
    pub fn match_and_send(&mut self, rom: &Rom, payload: &[u8]) -> Ds2482Result<(), I::Error> {
        self.address(Addressing::Match(*rom))?;
        self.write_block(payload)
    }

    /// Address all devices on the bus and send `payload`.
    pub fn skip_and_send(&mut self, payload: &[u8]) -> Ds2482Result<(), I::Error> {
        self.address(Addressing::Skip)?;
        self.write_block(payload)
    }
}
