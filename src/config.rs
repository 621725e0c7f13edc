use crate::error::Error;
use crate::platform::EraseUnit;
use crate::raw::{Page, SLOT_SIZE};

/// How the flash driver expects an erase to be addressed. Depends on the MCU family, e.g. STM32F1
/// erases pages by address, STM32G4 and STM32L4 by page number, STM32F4 and STM32F7 by sector.
#[derive(strum::Display, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EraseMode {
    ByAddress,
    ByNumber,
    BySector,
}

impl EraseMode {
    pub(crate) const fn unit(&self, location: &PageLocation) -> EraseUnit {
        match self {
            EraseMode::ByAddress => EraseUnit::PageAddress(location.address),
            EraseMode::ByNumber => EraseUnit::PageNumber(location.number),
            EraseMode::BySector => EraseUnit::SectorNumber(location.number),
        }
    }
}

/// Base address and page (or sector) number of one of the two pages.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PageLocation {
    pub address: u32,
    pub number: u32,
}

/// Placement of the two pages in flash.
///
/// Page 1 defaults to the page directly following page 0.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub(crate) page_size: u32,
    pub(crate) erase_mode: EraseMode,
    pub(crate) page0: PageLocation,
    pub(crate) page1: PageLocation,
}

impl Config {
    /// Usage: `Config::new(0x0800_4000, 1, 16 * 1024, EraseMode::BySector)`
    ///
    /// Tip: [`Config::validate`] is const, so a misplaced page can be caught at compile time:
    ///   `const _: () = assert!(CONFIG.validate().is_ok());`
    pub const fn new(
        page0_address: u32,
        page0_number: u32,
        page_size: u32,
        erase_mode: EraseMode,
    ) -> Self {
        Self {
            page_size,
            erase_mode,
            page0: PageLocation {
                address: page0_address,
                number: page0_number,
            },
            page1: PageLocation {
                address: page0_address.wrapping_add(page_size),
                number: page0_number.wrapping_add(1),
            },
        }
    }

    /// Places page 1 `offset` pages behind page 0, for parts where the pages must not be adjacent
    /// (e.g. to skip a sector of a different size).
    pub const fn with_page1_offset(mut self, offset: u32) -> Self {
        self.page1 = PageLocation {
            address: self
                .page0
                .address
                .wrapping_add(offset.wrapping_mul(self.page_size)),
            number: self.page0.number.wrapping_add(offset),
        };
        self
    }

    /// Places page 1 explicitly.
    pub const fn with_page1(mut self, address: u32, number: u32) -> Self {
        self.page1 = PageLocation { address, number };
        self
    }

    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    pub const fn erase_mode(&self) -> EraseMode {
        self.erase_mode
    }

    pub const fn page0(&self) -> PageLocation {
        self.page0
    }

    pub const fn page1(&self) -> PageLocation {
        self.page1
    }

    /// Number of records one page can hold. The first 4-byte unit carries the page status.
    pub const fn capacity(&self) -> u32 {
        self.page_size / SLOT_SIZE - 1
    }

    pub const fn validate(&self) -> Result<(), Error> {
        if self.page_size % SLOT_SIZE != 0 || self.page_size < 2 * SLOT_SIZE {
            return Err(Error::InvalidPageSize);
        }

        let (first, second) = if self.page0.address <= self.page1.address {
            (self.page0, self.page1)
        } else {
            (self.page1, self.page0)
        };

        if first.address % SLOT_SIZE != 0 || second.address % SLOT_SIZE != 0 {
            return Err(Error::InvalidPageAddress);
        }

        match first.address.checked_add(self.page_size) {
            Some(end) if end <= second.address => {}
            _ => return Err(Error::InvalidPageAddress),
        }

        if second.address.checked_add(self.page_size).is_none() {
            return Err(Error::InvalidPageAddress);
        }

        Ok(())
    }

    pub(crate) const fn pages(&self) -> [Page; 2] {
        [
            Page {
                address: self.page0.address,
                size: self.page_size,
                erase_unit: self.erase_mode.unit(&self.page0),
            },
            Page {
                address: self.page1.address,
                size: self.page_size,
                erase_unit: self.erase_mode.unit(&self.page1),
            },
        ]
    }
}
