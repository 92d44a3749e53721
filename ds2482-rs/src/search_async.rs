use crate::{
    Crc8, Ds2482Error, Ds2482Result, Rom,
    commands::{ONEWIRE_READ_ROM_CMD, ONEWIRE_SEARCH_ROM_CMD},
    registers_async::Ds2482Async,
    rom::ROM_SIZE,
    search::SearchState,
};
use embedded_hal_async::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

impl<I: I2c<SevenBitAddress>, D: DelayNs> Ds2482Async<I, D> {
    /// Run one discovery pass of the [1-Wire search algorithm](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html),
    /// reconstructing the ROM of one device.
    ///
    /// The asynchronous twin of [`Ds2482::search_pass`](crate::Ds2482::search_pass).
    pub async fn search_pass(&mut self, state: &mut SearchState) -> Ds2482Result<Rom, I::Error> {
        self.onewire_reset().await?;
        self.write_byte(ONEWIRE_SEARCH_ROM_CMD).await?;
        let mut rom = [0u8; ROM_SIZE];
        let mut pending = 0;
        for bit in 0..64u8 {
            let idx = (bit / 8) as usize;
            let mask = 1 << (bit % 8);
            let status = self.triplet(state.direction(bit)).await?;
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
    /// is full. Any pass failure aborts the whole enumeration.
    pub async fn search_all(&mut self, found: &mut [Rom]) -> Ds2482Result<usize, I::Error> {
        let mut search = RomSearchAsync::new(self);
        let mut count = 0;
        while count < found.len() {
            match search.next().await? {
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
    pub async fn search_by_family(
        &mut self,
        family: u8,
        found: &mut [Rom],
    ) -> Ds2482Result<usize, I::Error> {
        let mut search = RomSearchAsync::with_family(self, family);
        let mut count = 0;
        while count < found.len() {
            match search.next().await? {
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
    pub async fn read_rom(&mut self) -> Ds2482Result<Rom, I::Error> {
        self.onewire_reset().await?;
        self.write_byte(ONEWIRE_READ_ROM_CMD).await?;
        let mut rom = [0u8; ROM_SIZE];
        let mut crc = Crc8::default();
        for byte in rom.iter_mut() {
            *byte = self.read_byte().await?;
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

/// A structure for asynchronous searching of devices on the 1-Wire bus
/// behind a [`Ds2482Async`].
///
/// Wraps the per-pass [`SearchState`] bookkeeping;
/// [`next`](RomSearchAsync::next) can be called repeatedly to find all
/// devices, or all devices of one family when built with
/// [`with_family`](RomSearchAsync::with_family).
pub struct RomSearchAsync<'a, I, D> {
    bridge: &'a mut Ds2482Async<I, D>,
    state: SearchState,
    family: Option<u8>,
    matched: bool,
    done: bool,
}

impl<I, D> core::fmt::Debug for RomSearchAsync<'_, I, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RomSearchAsync")
            .field("state", &self.state)
            .field("family", &self.family)
            .field("matched", &self.matched)
            .field("done", &self.done)
            .finish()
    }
}

impl<'a, I, D> RomSearchAsync<'a, I, D> {
    /// Creates a new [`RomSearchAsync`] enumerating the whole bus.
    pub fn new(bridge: &'a mut Ds2482Async<I, D>) -> Self {
        Self {
            bridge,
            state: SearchState::new(),
            family: None,
            matched: false,
            done: false,
        }
    }

    /// Creates a new [`RomSearchAsync`] enumerating only devices with the
    /// given family code.
    pub fn with_family(bridge: &'a mut Ds2482Async<I, D>, family: u8) -> Self {
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

impl<I: I2c<SevenBitAddress>, D: DelayNs> RomSearchAsync<'_, I, D> {
    /// Discovers the next device on the bus.
    ///
    /// Returns `None` once the search is exhausted; after that, the search
    /// should be dropped.
    #[allow(clippy::should_implement_trait)]
    pub async fn next(&mut self) -> Ds2482Result<Option<Rom>, I::Error> {
        while !self.done {
            let rom = self.bridge.search_pass(&mut self.state).await?;
            match self.family {
                None => {
                    self.done = self.state.last_conflict() == 0;
                    return Ok(Some(rom));
                }
                Some(family) => {
                    let matched = rom.family() == family;
                    self.matched |= matched;
                    // Stop once the remaining ambiguity falls inside the
                    // family byte, or the seeded branch turned out empty.
                    self.done = self.state.last_conflict() <= 7 || !self.matched;
                    if matched {
                        return Ok(Some(rom));
                    }
                }
            }
        }
        Ok(None)
    }
}
