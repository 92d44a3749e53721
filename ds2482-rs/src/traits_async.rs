#![allow(async_fn_in_trait)]
use crate::{Ds2482Async, Ds2482Error, traits::Interact};
use embedded_hal_async::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

/// Trait for reading and writing registers of the DS2482 asynchronously.
///
/// Register addresses are shared with the blocking [`Interact`] impl.
pub trait InteractAsync: Interact {
    /// Read the register value from the DS2482 asynchronously.
    async fn async_read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482Async<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>>;
    /// Write the register value to the DS2482 asynchronously.
    async fn async_write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482Async<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>>;
}
