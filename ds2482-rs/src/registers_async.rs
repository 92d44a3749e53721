use crate::{
    Ds2482Error, Ds2482Result,
    commands::{
        CHANNEL_SELECT_CMD, DEVICE_RESET_CMD, SET_READ_PTR_CMD, STATUS_REG, WRITE_CONFIG_CMD,
    },
    registers::{Channel, DeviceConfiguration, DeviceStatus},
    traits::Interact,
    traits_async::InteractAsync,
};
use embedded_hal_async::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

/// A DS2482 I2C to 1-Wire bridge device, over the asynchronous traits.
///
/// Takes ownership of an I2C bus (implementing the
/// [`I2c`](embedded_hal_async::i2c::I2c) trait) and a timer object
/// implementing the [`DelayNs`](embedded_hal_async::delay::DelayNs) trait.
pub struct Ds2482Async<I, D> {
    pub(crate) i2c: I,
    pub(crate) addr: u8,
    pub(crate) delay: D,
    pub(crate) retries: u8,
    pub(crate) channel: Channel,
}

impl<I, D> Ds2482Async<I, D> {
    /// Creates a new instance of [`Ds2482Async`] with the given I2C
    /// interface.
    pub fn new(i2c: I, delay: D) -> Self {
        Self {
            i2c,
            addr: 0x18,
            delay,
            retries: 20,
            channel: Channel::Io0,
        }
    }

    /// Set the busy-poll budget.
    ///
    /// The budget bounds how long the host waits for the bridge to report
    /// ready before an operation fails with
    /// [`Timeout`](Ds2482Error::Timeout); one poll per millisecond.
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    /// Select the I2C address from the AD1/AD0 strap pins (0..=3).
    pub fn with_address_pins(mut self, pins: u8) -> Self {
        self.addr = 0x18 | (pins & 0x03);
        self
    }
}

impl<I: I2c<SevenBitAddress>, D: DelayNs> Ds2482Async<I, D> {
    /// Get the status of the bridge.
    pub async fn get_status(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        let mut stat = DeviceStatus::default();
        stat.async_read(self).await?;
        Ok(stat)
    }

    /// Reset the bridge.
    ///
    /// Performs a global reset of device state machine logic, which in turn
    /// selects IO0 as the active 1-Wire channel. Terminates any ongoing
    /// 1-Wire communication.
    pub async fn device_reset(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        self.i2c.write(self.addr, &[DEVICE_RESET_CMD]).await?;
        let status = self.wait_ready(false).await?;
        self.channel = Channel::Io0;
        Ok(status)
    }

    /// Write the configuration register and verify the echoed value.
    ///
    /// The wire byte carries the one's complement of the configuration in
    /// its upper nibble; the bridge echoes the accepted configuration with
    /// the upper nibble zero. An echo that differs from the requested value
    /// fails with [`ConfigurationMismatch`](Ds2482Error::ConfigurationMismatch).
    pub async fn configure(&mut self, config: DeviceConfiguration) -> Ds2482Result<(), I::Error> {
        let mut echo = config;
        echo.async_write(self).await?;
        if echo.raw() != config.raw() {
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
    pub async fn select_channel(&mut self, channel: Channel) -> Ds2482Result<u8, I::Error> {
        if self.channel == channel {
            return Ok(channel.read_code());
        }
        self.wait_ready(true).await?;
        let mut echo = [0; 1];
        self.i2c
            .write_read(
                self.addr,
                &[CHANNEL_SELECT_CMD, channel.write_code()],
                &mut echo,
            )
            .await?;
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

    pub(crate) async fn wait_ready(
        &mut self,
        set_pointer: bool,
    ) -> Ds2482Result<DeviceStatus, I::Error> {
        if set_pointer {
            self.i2c
                .write(self.addr, &[SET_READ_PTR_CMD, STATUS_REG])
                .await?;
        }
        let mut tries = 0;
        loop {
            let mut buf = [0; 1];
            self.i2c.read(self.addr, &mut buf).await?;
            let status = DeviceStatus::from(buf[0]);
            if !status.onewire_busy() {
                break Ok(status);
            }
            if tries >= self.retries {
                break Err(Ds2482Error::Timeout);
            }
            tries += 1;
            self.delay.delay_ms(1).await;
        }
    }
}

impl InteractAsync for DeviceStatus {
    async fn async_read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482Async<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        let mut buf = [0; 1];
        dev.i2c
            .write_read(dev.addr, &[SET_READ_PTR_CMD, <Self as Interact>::READ_PTR], &mut buf)
            .await?;
        *self = DeviceStatus::from(buf[0]);
        Ok(())
    }

    // The status register is read-only.
    async fn async_write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        _dev: &mut Ds2482Async<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        Ok(())
    }
}

impl InteractAsync for DeviceConfiguration {
    async fn async_read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482Async<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        let mut buf = [0; 1];
        dev.i2c
            .write_read(dev.addr, &[SET_READ_PTR_CMD, <Self as Interact>::READ_PTR], &mut buf)
            .await?;
        *self = DeviceConfiguration::from(buf[0]);
        Ok(())
    }

    async fn async_write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482Async<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        dev.wait_ready(true).await?;
        let mut buf = [0; 1];
        dev.i2c
            .write_read(dev.addr, &[WRITE_CONFIG_CMD, u8::from(*self)], &mut buf)
            .await?;
        *self = DeviceConfiguration::from(buf[0]);
        Ok(())
    }
}
