#![no_std]
#![deny(missing_docs)]

/*! # DS2482
 *
 * A no-std driver for the Analog Devices DS2482-100 and DS2482-800 I2C to
 * 1-Wire bridge devices.
 *
 * The bridge exposes a multi-drop 1-Wire bus through a small register set
 * reached over I2C: a command is written, the status register is polled
 * until the 1-Wire activity has ended, and the result is read back. On top
 * of these primitives the crate implements ROM addressing (skip/match), the
 * binary-tree Search ROM algorithm for enumerating an unknown device
 * population ([`RomSearch`]), the single-device Read ROM shortcut, and
 * CRC-8 validation of ROM codes ([`Crc8`]).
 *
 * [`Ds2482`] wraps a blocking I2C bus; [`Ds2482Async`] is the same driver
 * over the asynchronous embedded-hal traits.
 */

#[cfg(test)]
extern crate std;

mod commands;
mod crc;
mod error;
mod onewire;
mod onewire_async;
mod registers;
mod registers_async;
mod rom;
mod search;
mod search_async;
mod traits;
mod traits_async;

pub use commands::{
    ONEWIRE_MATCH_ROM_CMD, ONEWIRE_READ_ROM_CMD, ONEWIRE_SEARCH_ROM_CMD, ONEWIRE_SKIP_ROM_CMD,
};
pub use crc::Crc8;
pub use error::Ds2482Error;
pub use onewire::Addressing;
pub use registers::{Channel, DeviceConfiguration, DeviceStatus, Ds2482Builder};
pub use registers_async::Ds2482Async;
pub use rom::{ParseRomError, ROM_SIZE, Rom};
pub use search::{RomSearch, SearchState};
pub use search_async::RomSearchAsync;
pub use traits::Interact;
pub use traits_async::InteractAsync;

/// Results of DS2482 function calls.
pub type Ds2482Result<T, E> = Result<T, Ds2482Error<E>>;

/// A DS2482 I2C to 1-Wire bridge device.
///
/// Takes ownership of an I2C bus (implementing the
/// [`I2c`](embedded_hal::i2c::I2c) trait) and a timer object implementing
/// the [`DelayNs`](embedded_hal::delay::DelayNs) trait.
///
/// All operations are strictly sequential: the bridge supports a single
/// command in flight, so every method takes `&mut self` and runs its
/// busy-wait to completion before returning.
pub struct Ds2482<I, D> {
    pub(crate) i2c: I,
    pub(crate) addr: u8,
    pub(crate) delay: D,
    pub(crate) retries: u8,
    pub(crate) channel: Channel,
}

impl<I, D> Ds2482<I, D> {
    /// Creates a new instance of [`Ds2482`] with the given I2C interface.
    pub fn new(i2c: I, delay: D) -> Self {
        Ds2482 {
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
