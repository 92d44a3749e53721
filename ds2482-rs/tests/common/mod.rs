//! A simulated DS2482 bridge with a population of 1-Wire devices behind it.
//!
//! Implements the blocking I2C traits so a [`ds2482::Ds2482`] can drive it
//! like real hardware: commands update the simulated registers and the wire
//! state machine, reads return the register the read pointer sits on. The
//! 1-Wire side models the open-drain bus, so simultaneous responders
//! wire-AND their bits, which is what the search algorithm relies on.

use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};
use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

const DEVICE_RESET_CMD: u8 = 0xf0;
const SET_READ_PTR_CMD: u8 = 0xe1;
const WRITE_CONFIG_CMD: u8 = 0xd2;
const CHANNEL_SELECT_CMD: u8 = 0xc3;
const ONEWIRE_RESET_CMD: u8 = 0xb4;
const ONEWIRE_SINGLE_BIT_CMD: u8 = 0x87;
const ONEWIRE_WRITE_BYTE_CMD: u8 = 0xa5;
const ONEWIRE_READ_BYTE_CMD: u8 = 0x96;
const ONEWIRE_TRIPLET_CMD: u8 = 0x78;

const STATUS_REG: u8 = 0xf0;
const READ_DATA_REG: u8 = 0xe1;
const CHANNEL_REG: u8 = 0xd2;
const CONFIG_REG: u8 = 0xc3;

const SEARCH_ROM: u8 = 0xf0;
const READ_ROM: u8 = 0x33;
const MATCH_ROM: u8 = 0x55;
const SKIP_ROM: u8 = 0xcc;

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

/// Wire-level state of the simulated 1-Wire bus.
enum WireState {
    Idle,
    /// A reset was issued; the next wire byte is a ROM command.
    RomCommand,
    /// Search in progress: remaining candidates and the current bit index.
    Search { candidates: Vec<[u8; 8]>, bit: u8 },
    /// Match ROM: collecting the eight address bytes.
    Match { bytes: Vec<u8> },
    /// Read ROM: streaming the wired-AND of all device ROMs.
    ReadRom { idx: usize },
    /// Devices addressed; payload bytes are absorbed.
    Addressed,
}

struct Inner {
    devices: Vec<[u8; 8]>,
    wire: WireState,
    pointer: u8,
    config: u8,
    channel: u8, // read-back code of the selected channel
    data: u8,
    presence: bool,
    rst: bool,
    sbr: bool,
    tsb: bool,
    dir: bool,
    payload: Vec<u8>,
}

/// Cloneable handle to the simulated bridge; clones share state, so a test
/// can keep one handle for assertions after moving the other into the
/// driver.
#[derive(Clone)]
pub struct BridgeSim {
    inner: Rc<RefCell<Inner>>,
}

impl BridgeSim {
    pub fn new(devices: &[[u8; 8]]) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                devices: devices.to_vec(),
                wire: WireState::Idle,
                pointer: STATUS_REG,
                config: 0,
                channel: CHANNEL_CODES[0].1,
                data: 0,
                presence: false,
                rst: true,
                sbr: false,
                tsb: false,
                dir: false,
                payload: Vec::new(),
            })),
        }
    }

    /// Payload bytes the addressed devices received so far.
    pub fn payload(&self) -> Vec<u8> {
        self.inner.borrow().payload.clone()
    }

    /// Read-back code of the currently selected channel.
    pub fn channel(&self) -> u8 {
        self.inner.borrow().channel
    }

    /// Logical configuration register value.
    pub fn config(&self) -> u8 {
        self.inner.borrow().config
    }
}

impl Inner {
    fn status(&self) -> u8 {
        let mut status = 0;
        if self.presence {
            status |= 1 << 1;
        }
        if self.rst {
            status |= 1 << 4;
        }
        if self.sbr {
            status |= 1 << 5;
        }
        if self.tsb {
            status |= 1 << 6;
        }
        if self.dir {
            status |= 1 << 7;
        }
        status // never busy, never shorted
    }

    fn handle_write(&mut self, bytes: &[u8]) {
        match bytes[0] {
            DEVICE_RESET_CMD => {
                self.wire = WireState::Idle;
                self.pointer = STATUS_REG;
                self.channel = CHANNEL_CODES[0].1;
                self.config = 0;
                self.rst = true;
                self.presence = false;
                self.sbr = false;
                self.tsb = false;
                self.dir = false;
            }
            SET_READ_PTR_CMD => self.pointer = bytes[1],
            WRITE_CONFIG_CMD => {
                let byte = bytes[1];
                // The bridge only accepts a complement-nibble byte.
                if byte >> 4 == !byte & 0x0f {
                    self.config = byte & 0x0f;
                    self.rst = false;
                }
                self.pointer = CONFIG_REG;
            }
            CHANNEL_SELECT_CMD => {
                if let Some((_, read)) = CHANNEL_CODES.iter().find(|(write, _)| *write == bytes[1])
                {
                    self.channel = *read;
                }
                self.pointer = CHANNEL_REG;
            }
            ONEWIRE_RESET_CMD => {
                self.presence = !self.devices.is_empty();
                self.wire = WireState::RomCommand;
                self.pointer = STATUS_REG;
            }
            ONEWIRE_WRITE_BYTE_CMD => {
                self.wire_byte(bytes[1]);
                self.pointer = STATUS_REG;
            }
            ONEWIRE_READ_BYTE_CMD => {
                self.data = self.wire_read();
                self.pointer = STATUS_REG;
            }
            ONEWIRE_SINGLE_BIT_CMD => {
                // Nothing drives the idle line, so the written bit reads back.
                self.sbr = bytes[1] & 0x80 != 0;
                self.pointer = STATUS_REG;
            }
            ONEWIRE_TRIPLET_CMD => {
                self.triplet(bytes[1] & 0x80 != 0);
                self.pointer = STATUS_REG;
            }
            other => panic!("unexpected I2C command byte {other:#04x}"),
        }
    }

    fn wire_byte(&mut self, byte: u8) {
        self.wire = match std::mem::replace(&mut self.wire, WireState::Idle) {
            WireState::RomCommand => match byte {
                SEARCH_ROM => WireState::Search {
                    candidates: self.devices.clone(),
                    bit: 0,
                },
                READ_ROM => WireState::ReadRom { idx: 0 },
                MATCH_ROM => WireState::Match { bytes: Vec::new() },
                SKIP_ROM => WireState::Addressed,
                other => panic!("unexpected ROM command {other:#04x}"),
            },
            WireState::Match { mut bytes } => {
                bytes.push(byte);
                if bytes.len() == 8 {
                    WireState::Addressed
                } else {
                    WireState::Match { bytes }
                }
            }
            WireState::Addressed => {
                self.payload.push(byte);
                WireState::Addressed
            }
            WireState::Idle => WireState::Idle, // byte on an idle bus goes nowhere
            WireState::Search { .. } => panic!("write byte during a search"),
            WireState::ReadRom { .. } => panic!("write byte during a ROM read"),
        };
    }

    fn wire_read(&mut self) -> u8 {
        match &mut self.wire {
            WireState::ReadRom { idx } => {
                // All devices answer a Read ROM at once; the open-drain bus
                // wire-ANDs their bits.
                let byte = self.devices.iter().fold(0xff, |acc, rom| acc & rom[*idx]);
                *idx = (*idx + 1) % 8;
                byte
            }
            _ => 0xff, // nothing driving the line
        }
    }

    fn triplet(&mut self, direction: bool) {
        let WireState::Search { candidates, bit } = &mut self.wire else {
            panic!("triplet outside a search");
        };
        let idx = (*bit / 8) as usize;
        let mask = 1u8 << (*bit % 8);
        let any_zero = candidates.iter().any(|rom| rom[idx] & mask == 0);
        let any_one = candidates.iter().any(|rom| rom[idx] & mask != 0);
        // Read slots: the line reads 1 only if no candidate pulls it low.
        // The first slot carries the bit, the second its complement.
        let sbr = !any_zero;
        let tsb = !any_one;
        let taken = match (sbr, tsb) {
            (false, false) => direction,
            (false, true) => false,
            (true, false) => true,
            (true, true) => true,
        };
        candidates.retain(|rom| (rom[idx] & mask != 0) == taken);
        *bit += 1;
        self.sbr = sbr;
        self.tsb = tsb;
        self.dir = taken;
    }

    fn handle_read(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte = match self.pointer {
                STATUS_REG => self.status(),
                READ_DATA_REG => self.data,
                CHANNEL_REG => self.channel,
                CONFIG_REG => self.config,
                other => panic!("read from unknown register {other:#04x}"),
            };
        }
    }
}

impl ErrorType for BridgeSim {
    type Error = Infallible;
}

impl I2c<SevenBitAddress> for BridgeSim {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        assert_eq!(address, 0x18, "unexpected I2C address");
        let mut inner = self.inner.borrow_mut();
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => inner.handle_write(bytes),
                Operation::Read(buf) => inner.handle_read(buf),
            }
        }
        Ok(())
    }
}
