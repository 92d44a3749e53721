use crate::{
    Ds2482Error, Ds2482Result, Rom,
    commands::{
        ONEWIRE_MATCH_ROM_CMD, ONEWIRE_READ_BYTE_CMD, ONEWIRE_RESET_CMD, ONEWIRE_SINGLE_BIT_CMD,
        ONEWIRE_SKIP_ROM_CMD, ONEWIRE_TRIPLET_CMD, ONEWIRE_WRITE_BYTE_CMD, READ_DATA_REG,
        SET_READ_PTR_CMD,
    },
    onewire::Addressing,
    registers::DeviceStatus,
    registers_async::Ds2482Async,
};
use embedded_hal_async::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

impl<I: I2c<SevenBitAddress>, D: DelayNs> Ds2482Async<I, D> {
    /// Generate a 1-Wire reset/presence-detect cycle on the active channel.
    ///
    /// Fails with [`ShortCircuit`](Ds2482Error::ShortCircuit) if the line is
    /// shorted, and with [`NoDevicePresent`](Ds2482Error::NoDevicePresent)
    /// if no device answers with a presence pulse.
    pub async fn onewire_reset(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        self.wait_ready(true).await?;
        self.i2c.write(self.addr, &[ONEWIRE_RESET_CMD]).await?;
        let status = self.wait_ready(false).await?;
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
    pub async fn reset(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        self.device_reset().await?;
        self.onewire_reset().await
    }

    /// Write a single byte to the active 1-Wire channel. Returns the status
    /// after the eight generated time slots have completed.
    pub async fn write_byte(&mut self, byte: u8) -> Ds2482Result<DeviceStatus, I::Error> {
        self.wait_ready(true).await?;
        self.i2c
            .write(self.addr, &[ONEWIRE_WRITE_BYTE_CMD, byte])
            .await?;
        self.wait_ready(false).await
    }

    /// Read a single byte from the active 1-Wire channel.
    ///
    /// Generates eight read time slots, then moves the read pointer to the
    /// read data register to fetch the result.
    pub async fn read_byte(&mut self) -> Ds2482Result<u8, I::Error> {
        self.wait_ready(true).await?;
        self.i2c.write(self.addr, &[ONEWIRE_READ_BYTE_CMD]).await?;
        self.wait_ready(false).await?;
        let mut buf = [0; 1];
        self.i2c
            .write_read(self.addr, &[SET_READ_PTR_CMD, READ_DATA_REG], &mut buf)
            .await?;
        Ok(buf[0])
    }

    /// Write a block of bytes to the active 1-Wire channel, byte by byte.
    pub async fn write_block(&mut self, data: &[u8]) -> Ds2482Result<(), I::Error> {
        for &byte in data {
            self.write_byte(byte).await?;
        }
        Ok(())
    }

    /// Fill `buf` with bytes read from the active 1-Wire channel.
    pub async fn read_block(&mut self, buf: &mut [u8]) -> Ds2482Result<(), I::Error> {
        for byte in buf.iter_mut() {
            *byte = self.read_byte().await?;
        }
        Ok(())
    }

    /// Generate a single 1-Wire time slot. A `set_high` slot doubles as a
    /// read slot; the return value is the sampled line state.
    pub async fn single_bit(&mut self, set_high: bool) -> Ds2482Result<bool, I::Error> {
        self.wait_ready(true).await?;
        self.i2c
            .write(
                self.addr,
                &[ONEWIRE_SINGLE_BIT_CMD, if set_high { 0x80 } else { 0x0 }],
            )
            .await?;
        Ok(self.wait_ready(false).await?.single_bit_result())
    }

    /// Generate a triplet: two read time slots followed by one write time
    /// slot whose value depends on the read slots and `direction`.
    ///
    /// Returns the raw status; the caller decodes
    /// [`single_bit_result`](DeviceStatus::single_bit_result),
    /// [`triplet_second_bit`](DeviceStatus::triplet_second_bit) and
    /// [`branch_dir_taken`](DeviceStatus::branch_dir_taken).
    pub async fn triplet(&mut self, direction: bool) -> Ds2482Result<DeviceStatus, I::Error> {
        self.wait_ready(true).await?;
        self.i2c
            .write(
                self.addr,
                &[ONEWIRE_TRIPLET_CMD, if direction { 0x80 } else { 0x0 }],
            )
            .await?;
        self.wait_ready(false).await
    }

    /// Reset the bus and address devices according to `addressing`.
    ///
    /// A matched ROM must have a nonzero family code, else the call fails
    /// with [`InvalidRom`](Ds2482Error::InvalidRom) before any bus traffic.
    pub async fn address(&mut self, addressing: Addressing) -> Ds2482Result<(), I::Error> {
        match addressing {
            Addressing::Skip => {
                self.onewire_reset().await?;
                self.write_byte(ONEWIRE_SKIP_ROM_CMD).await?;
            }
            Addressing::Match(rom) => {
                if rom.family() == 0 {
                    return Err(Ds2482Error::InvalidRom);
                }
                self.onewire_reset().await?;
                self.write_byte(ONEWIRE_MATCH_ROM_CMD).await?;
                self.write_block(rom.as_bytes()).await?;
            }
        }
        Ok(())
    }

    /// Address the device with the given ROM and send `payload`.
    pub async fn match_and_send(
        &mut self,
        rom: &Rom,
        payload: &[u8],
    ) -> Ds2482Result<(), I::Error> {
        self.address(Addressing::Match(*rom)).await?;
        self.write_block(payload).await
    }

    /// Address all devices on the bus and send `payload`.
    pub async fn skip_and_send(&mut self, payload: &[u8]) -> Ds2482Result<(), I::Error> {
        self.address(Addressing::Skip).await?;
        self.write_block(payload).await
    }
}
