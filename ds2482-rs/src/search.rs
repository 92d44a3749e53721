use crate::{
    Crc8, Ds2482, Ds2482Error, Ds2482Result, Rom,
    commands::{ONEWIRE_READ_ROM_CMD, ONEWIRE_SEARCH_ROM_CMD},
    rom::ROM_SIZE,
};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

/// State carried between discovery passes of the ROM search.
///
/// Each pass reconstructs one ROM and records the bit position of the last
/// branch where several devices disagreed and the 0 branch was taken. The
/// next pass steers back down the recorded path and takes the 1 branch at
/// that position, enumerating the device tree by elimination.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchState {
    last_found: Option<Rom>,
    last_conflict: u8,
}

impl SearchState {
    /// Fresh state for a full enumeration.
    pub fn new() -> Self {
        Self::default()
    }

    /// State primed to walk only the subtree of devices whose family code
    /// is already fixed: the previous ROM carries the family byte and the
    /// conflict marker sits past the last ROM bit, so every probe steers by
    /// the seeded ROM.
    pub fn for_family(family: u8) -> Self {
        Self {
            last_found: Some(Rom::from([family, 0, 0, 0, 0, 0, 0, 0])),
            last_conflict: 64,
        }
    }

    /// The most recently discovered ROM, if any.
    pub fn last_found(&self) -> Option<Rom> {
        self.last_found
    }

    /// Bit position of the last unresolved branch of the previous pass; 0
    /// once the enumeration is exhausted.
    pub fn last_conflict(&self) -> u8 {
        self.last_conflict
    }

    /// Probe direction for the given bit position: steer by the previous
    /// ROM below the conflict marker, take the unexplored 1 branch at the
    /// marker, and default to 0 beyond it.
    pub(crate) fn direction(&self, bit: u8) -> bool {
        match &self.last_found {
            Some(prev) if bit < self.last_conflict => prev.bit(bit),
            _ => bit == self.last_conflict,
        }
    }

    /// Store the outcome of a completed pass.
    pub(crate) fn record(&mut self, rom: Rom, pending: u8) {
        self.last_found = Some(rom);
        self.last_conflict = pending;
    }
}

impl<I: I2c<SevenBitAddress>, D: DelayNs> Ds2482<I, D> {
    /// Run one discovery pass of the [1-Wire search algorithm](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html),
    /// reconstructing the ROM of one device.
    ///
    /// Issues a bus reset, the Search ROM command, and 64 triplets, one per
    /// ROM bit, low bit of the family code first. Each triplet reports the
    /// two read slots (SBR and TSB) and the direction the bridge wrote
    /// (DIR); the direction fed into the triplet comes from `state`.
    ///
    /// On success the assembled ROM and the position of the last unresolved
    /// branch are stored back into `state`; a marker of 0 means no branch
    /// is left and the enumeration is complete.
    pub fn search_pass(&mut self, state: &mut SearchState) -> Ds2482Result<Rom, I::Error> {
        self.onewire_reset()?;
        self.write_byte(ONEWIRE_SEARCH_ROM_CMD)?;
        let mut rom = [0u8; ROM_SIZE];
        let mut pending = 0;
        for bit in 0..64u8 {
            let idx = (bit / 8) as usize;
            let mask = 1 << (bit % 8);
            let status = self.triplet(state.direction(bit))?;
            let sbr = status.single_bit_result();
            let tsb = status.triplet_second_bit();
            let dir = status.branch_dir_taken();
            if sbr && tsb {
                return Err(Ds2482Error::BadSearchResult);
            }
            if !sbr && !tsb && !dir {
                pending = bit; // only the last unresolved branch matters
            }
            if dir {
                rom[idx] |= mask;
            } else {
                rom[idx] &= !mask;
            }
        }
        if rom[0] == 0 {
            return Err(Ds2482Error::InvalidRom);
        }
        if !Crc8::validate(&rom) {
            return Err(Ds2482Error::CrcMismatch);
        }
        let rom = Rom::from(rom);
        state.record(rom, pending);
        Ok(rom)
    }

    /// Enumerate every device on the bus into `found`.
    ///
    /// Returns the number of devices discovered. Stops early once `found`
    /// is full; size it for the largest population the bus can carry. Any
    /// pass failure aborts the whole enumeration.
    pub fn search_all(&mut self, found: &mut [Rom]) -> Ds2482Result<usize, I::Error> {
        let mut search = RomSearch::new(self);
        let mut count = 0;
        while count < found.len() {
            match search.next()? {
                Some(rom) => {
                    found[count] = rom;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    /// Enumerate the devices with the given family code into `found`.
    ///
    /// Returns the number of devices discovered; 0 (not an error) when the
    /// bus has devices but none of this family.
    pub fn search_by_family(&mut self, family: u8, found: &mut [Rom]) -> Ds2482Result<usize, I::Error> {
        let mut search = RomSearch::with_family(self, family);
        let mut count = 0;
        while count < found.len() {
            match search.next()? {
                Some(rom) => {
                    found[count] = rom;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    /// Read the ROM of the only device on the bus without a tree search.
    ///
    /// Issues a bus reset and the Read ROM command, then reads the eight
    /// ROM bytes with the CRC running incrementally. The same validity
    /// checks as a discovery pass apply.
    pub fn read_rom(&mut self) -> Ds2482Result<Rom, I::Error> {
        self.onewire_reset()?;
        self.write_byte(ONEWIRE_READ_ROM_CMD)?;
        let mut rom = [0u8; ROM_SIZE];
        let mut crc = Crc8::default();
        for byte in rom.iter_mut() {
            *byte = self.read_byte()?;
            crc.update(*byte);
        }
        if rom[0] == 0 {
            return Err(Ds2482Error::InvalidRom);
        }
        if crc.value() != 0 {
            return Err(Ds2482Error::CrcMismatch);
        }
        Ok(Rom::from(rom))
    }
}

/// A structure for searching devices on the 1-Wire bus behind a [`Ds2482`].
///
/// Wraps the per-pass [`SearchState`] bookkeeping; [`next`](RomSearch::next)
/// can be called repeatedly to find all devices, or all devices of one
/// family when built with [`with_family`](RomSearch::with_family).
pub struct RomSearch<'a, I, D> {
    bridge: &'a mut Ds2482<I, D>,
    state: SearchState,
    family: Option<u8>,
    matched: bool,
    done: bool,
}

impl<'a, I, D> RomSearch<'a, I, D> {
    /// Creates a new [`RomSearch`] enumerating the whole bus.
    pub fn new(bridge: &'a mut Ds2482<I, D>) -> Self {
        Self {
            bridge,
            state: SearchState::new(),
            family: None,
            matched: false,
            done: false,
        }
    }

    /// Creates a new [`RomSearch`] enumerating only devices with the given
    /// family code.
    pub fn with_family(bridge: &'a mut Ds2482<I, D>, family: u8) -> Self {
        Self {
            bridge,
            state: SearchState::for_family(family),
            family: Some(family),
            matched: false,
            done: false,
        }
    }

    /// Search state after the most recent pass.
    pub fn state(&self) -> &SearchState {
        &self.state
    }
}

impl<I: I2c<SevenBitAddress>, D: DelayNs> RomSearch<'_, I, D> {
    /// Discovers the next device on the bus.
    ///
    /// Returns `None` once the search is exhausted; after that, the search
    /// should be dropped.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Ds2482Result<Option<Rom>, I::Error> {
        while !self.done {
            let rom = self.bridge.search_pass(&mut self.state)?;
            match self.family {
                None => {
                    self.done = self.state.last_conflict == 0;
                    return Ok(Some(rom));
                }
                Some(family) => {
                    let matched = rom.family() == family;
                    self.matched |= matched;
                    // Stop once the remaining ambiguity falls inside the
                    // family byte, or the seeded branch turned out empty.
                    self.done = self.state.last_conflict <= 7 || !self.matched;
                    if matched {
                        return Ok(Some(rom));
                    }
                }
            }
        }
        Ok(None)
    }
}
