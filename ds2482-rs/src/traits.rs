use crate::{Ds2482, Ds2482Error};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

/// Trait for reading and writing registers of the DS2482 I2C 1-Wire master.
pub trait Interact {
    /// Command code that writes this register.
    const WRITE_ADDR: u8;
    /// Pointer code that selects this register for reading.
    const READ_PTR: u8;

    /// Read the register value from the DS2482.
    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>>;
    /// Write the register value to the DS2482.
    fn write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>>;
}
