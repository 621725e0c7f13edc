use embedded_storage::nor_flash::{
    MultiwriteNorFlash, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};

/// A single erasable flash unit. Which variant a page uses is decided once by the
/// [`EraseMode`](crate::config::EraseMode) of the [`Config`](crate::config::Config).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EraseUnit {
    /// Page erase addressed by the page base address.
    PageAddress(u32),
    /// Page erase addressed by the page number.
    PageNumber(u32),
    /// Sector erase addressed by the sector number.
    SectorNumber(u32),
}

/// The flash primitives the store is built on. All operations are synchronous and blocking.
///
/// `erase` and `program_halfword` are always bracketed by `unlock` and `lock`, one primitive at a
/// time. `disable_cache` and `enable_cache` surround every public store operation, for parts that
/// need the instruction cache turned off while the flash is busy.
pub trait Platform {
    type Error;

    /// Erases exactly one page or sector. Must succeed on an already erased unit.
    fn erase(&mut self, unit: EraseUnit) -> Result<(), Self::Error>;

    /// Programs a little-endian half-word at a 2-byte aligned address. Bits only go from 1 to 0.
    fn program_halfword(&mut self, address: u32, value: u16) -> Result<(), Self::Error>;

    /// Memory mapped flash never fails here.
    fn read_halfword(&mut self, address: u32) -> Result<u16, Self::Error>;

    /// Reads the little-endian word at a 4-byte aligned address.
    fn read_word(&mut self, address: u32) -> Result<u32, Self::Error>;

    fn unlock(&mut self) {}

    fn lock(&mut self) {}

    fn disable_cache(&mut self) {}

    fn enable_cache(&mut self) {}
}

impl<T: Platform> Platform for &mut T {
    type Error = T::Error;

    fn erase(&mut self, unit: EraseUnit) -> Result<(), Self::Error> {
        (**self).erase(unit)
    }

    fn program_halfword(&mut self, address: u32, value: u16) -> Result<(), Self::Error> {
        (**self).program_halfword(address, value)
    }

    fn read_halfword(&mut self, address: u32) -> Result<u16, Self::Error> {
        (**self).read_halfword(address)
    }

    fn read_word(&mut self, address: u32) -> Result<u32, Self::Error> {
        (**self).read_word(address)
    }

    fn unlock(&mut self) {
        (**self).unlock()
    }

    fn lock(&mut self) {
        (**self).lock()
    }

    fn disable_cache(&mut self) {
        (**self).disable_cache()
    }

    fn enable_cache(&mut self) {
        (**self).enable_cache()
    }
}

/// Largest `WRITE_SIZE` a wrapped flash may have. Half-words are padded to one write unit.
const MAX_WRITE_SIZE: usize = 32;

/// Adapts any [`MultiwriteNorFlash`] to [`Platform`].
///
/// Addresses are offsets into the wrapped flash. Numbered erase units are mapped to the byte
/// range `number * page_size .. (number + 1) * page_size`, which assumes uniform pages starting at
/// offset 0. A unit whose range doesn't fit into `u32` fails with
/// [`NorFlashErrorKind::OutOfBounds`]; errors of the wrapped flash are reduced to their kind. The status half-word of a page is programmed twice (`Receiving`, then `Active`),
/// hence the multi-write requirement.
pub struct NorFlashPlatform<F> {
    inner: F,
    page_size: u32,
}

impl<F: MultiwriteNorFlash> NorFlashPlatform<F> {
    pub fn new(inner: F, page_size: u32) -> Self {
        const {
            assert!(F::WRITE_SIZE <= MAX_WRITE_SIZE);
            assert!(F::WRITE_SIZE.is_power_of_two());
            assert!(F::READ_SIZE <= 4 && F::READ_SIZE.is_power_of_two());
        };

        Self { inner, page_size }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut F {
        &mut self.inner
    }

    pub fn into_inner(self) -> F {
        self.inner
    }

    fn unit_range(&self, unit: EraseUnit) -> Result<(u32, u32), NorFlashErrorKind> {
        let from = match unit {
            EraseUnit::PageAddress(address) => Some(address),
            EraseUnit::PageNumber(number) | EraseUnit::SectorNumber(number) => {
                number.checked_mul(self.page_size)
            }
        };

        from.and_then(|from| Some((from, from.checked_add(self.page_size)?)))
            .ok_or(NorFlashErrorKind::OutOfBounds)
    }
}

impl<F: MultiwriteNorFlash> Platform for NorFlashPlatform<F> {
    type Error = NorFlashErrorKind;

    fn erase(&mut self, unit: EraseUnit) -> Result<(), Self::Error> {
        let (from, to) = self.unit_range(unit)?;
        self.inner.erase(from, to).map_err(|e| e.kind())
    }

    fn program_halfword(&mut self, address: u32, value: u16) -> Result<(), Self::Error> {
        let bytes = value.to_le_bytes();
        if F::WRITE_SIZE <= bytes.len() {
            return self.inner.write(address, &bytes).map_err(|e| e.kind());
        }

        // pad to a full write unit, 0xFF leaves the neighbouring bytes untouched
        let write_size = F::WRITE_SIZE as u32;
        let aligned = address / write_size * write_size;
        let pivot = (address - aligned) as usize;
        let mut buf = [0xFFu8; MAX_WRITE_SIZE];
        buf[pivot..pivot + bytes.len()].copy_from_slice(&bytes);
        self.inner
            .write(aligned, &buf[..F::WRITE_SIZE])
            .map_err(|e| e.kind())
    }

    fn read_halfword(&mut self, address: u32) -> Result<u16, Self::Error> {
        let word = self.read_word(address & !0b11)?;
        if address & 0b10 == 0 {
            Ok(word as u16)
        } else {
            Ok((word >> 16) as u16)
        }
    }

    fn read_word(&mut self, address: u32) -> Result<u32, Self::Error> {
        let mut buf = [0u8; 4];
        self.inner.read(address, &mut buf).map_err(|e| e.kind())?;
        Ok(u32::from_le_bytes(buf))
    }
}
