#[derive(Debug)]
/// DS2482 driver errors.
pub enum Ds2482Error<E> {
    /// I2C bus errors.
    I2c(E),
    /// The busy-poll budget was exhausted while the bridge stayed busy.
    Timeout,
    /// A short circuit was detected on the 1-Wire line.
    ShortCircuit,
    /// No presence pulse was detected after a 1-Wire reset.
    NoDevicePresent,
    /// The configuration register read-back did not match the written value.
    ConfigurationMismatch,
    /// The channel selection register read-back did not match the expected
    /// code for the requested channel.
    ChannelSelectionFailed,
    /// A ROM has a zero family code, either supplied by the caller or
    /// assembled from a discovery pass.
    InvalidRom,
    /// Both read slots of a triplet reported 1, a combination no device
    /// population can produce.
    BadSearchResult,
    /// A discovered or directly read ROM failed CRC-8 validation.
    CrcMismatch,
}

impl<E> From<E> for Ds2482Error<E> {
    fn from(value: E) -> Self {
        Self::I2c(value)
    }
}
