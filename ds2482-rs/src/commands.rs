//! Command and register pointer codes for the DS2482.

/// Performs a global reset of the device state machine logic, which in turn
/// selects IO0 as the active 1-Wire channel. Terminates any ongoing 1-Wire
/// communication. Leaves the read pointer at the status register for busy
/// polling.
pub(crate) const DEVICE_RESET_CMD: u8 = 0xf0;

/// Sets the read pointer to the register selected by the pointer code.
/// Overwrites the read pointer position of any 1-Wire communication command
/// in progress.
pub(crate) const SET_READ_PTR_CMD: u8 = 0xe1;

/// Writes a new configuration byte. The new data is accepted only if the
/// upper nibble is the one's complement of the lower nibble; when read, the
/// upper nibble is always 0h. Leaves the read pointer at the configuration
/// register so the write can be verified.
pub(crate) const WRITE_CONFIG_CMD: u8 = 0xd2;

/// Sets the 1-Wire IO channel for subsequent 1-Wire communication commands
/// (DS2482-800). The selection code read back differs from the code written.
/// Leaves the read pointer at the channel selection register.
pub(crate) const CHANNEL_SELECT_CMD: u8 = 0xc3;

/// Generates a reset/presence-detect cycle at the selected IO channel. The
/// state of the 1-Wire line is sampled during the cycle and reported through
/// the PPD and SD status bits.
pub(crate) const ONEWIRE_RESET_CMD: u8 = 0xb4;

/// Generates a single 1-Wire time slot with the bit value given by the
/// parameter byte. The logic level at the 1-Wire line is sampled and SBR is
/// updated.
pub(crate) const ONEWIRE_SINGLE_BIT_CMD: u8 = 0x87;

/// Writes a single data byte to the selected 1-Wire IO channel.
pub(crate) const ONEWIRE_WRITE_BYTE_CMD: u8 = 0xa5;

/// Generates eight read time slots on the selected 1-Wire IO channel and
/// stores the result in the read data register.
pub(crate) const ONEWIRE_READ_BYTE_CMD: u8 = 0x96;

/// Generates three time slots: two read time slots and one write time slot.
/// The type of write time slot depends on the result of the read time slots
/// and the direction byte: both read slots 0 writes the direction bit, read
/// slots 0/1 write a 0, read slots 1/0 write a 1, and both read slots 1 (the
/// error case) write a 1.
pub(crate) const ONEWIRE_TRIPLET_CMD: u8 = 0x78;

/// Read pointer code of the status register.
pub(crate) const STATUS_REG: u8 = 0xf0;

/// Read pointer code of the read data register.
pub(crate) const READ_DATA_REG: u8 = 0xe1;

/// Read pointer code of the channel selection register. A Channel Select
/// command already leaves the read pointer here, so the driver never has to
/// move it explicitly.
#[allow(dead_code)]
pub(crate) const CHANNEL_REG: u8 = 0xd2;

/// Read pointer code of the configuration register.
pub(crate) const CONFIG_REG: u8 = 0xc3;

/// Command to search for devices on the 1-Wire bus. A full search requires
/// 64 triplet commands after this byte to identify and address one device.
pub const ONEWIRE_SEARCH_ROM_CMD: u8 = 0xf0;

/// Command to read the ROM of the only device on the bus. With more than one
/// device present, a data collision occurs when all devices attempt to
/// respond at the same time.
pub const ONEWIRE_READ_ROM_CMD: u8 = 0x33;

/// Command to match a specific ROM address in 1-Wire communication. Only the
/// device that exactly matches the 64-bit ROM sequence responds to the
/// subsequent function command; all other devices wait for a reset pulse.
pub const ONEWIRE_MATCH_ROM_CMD: u8 = 0x55;

/// Command to skip ROM addressing and address all devices on the bus
/// simultaneously without sending out any ROM code information.
pub const ONEWIRE_SKIP_ROM_CMD: u8 = 0xcc;
