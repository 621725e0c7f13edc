use crate::platform::EraseUnit;

/// Every record, and the status header, occupies one 4-byte unit.
pub(crate) const SLOT_SIZE: u32 = 4;
pub(crate) const HALFWORD_SIZE: u32 = 2;
pub(crate) const ERASED_WORD: u32 = u32::MAX;

/// Unit 0 carries the page status, records start at unit 1.
pub(crate) const FIRST_SLOT: u32 = 1;

/// `0xFFFF` reads back from every torn record whose id half-word was never programmed, so it can
/// never be a variable id.
pub(crate) const RESERVED_ID: u16 = u16::MAX;

/// The first half-word of a page.
#[derive(strum::FromRepr, strum::Display, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum PageStatus {
    // All bits set, default state after flash erase.
    Erased = 0xFFFF,

    // Latest values are being copied into this page. The sibling page is still authoritative.
    Receiving = 0xEEEE,

    // Authoritative page for reads and writes.
    Active = 0x0000,

    // Never programmed. Any half-word that isn't one of the above decodes to this.
    Corrupt = 0x5555,
}

impl From<u16> for PageStatus {
    fn from(val: u16) -> Self {
        PageStatus::from_repr(val).unwrap_or(PageStatus::Corrupt)
    }
}

#[derive(strum::Display, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PageIndex {
    Page0 = 0,
    Page1 = 1,
}

impl PageIndex {
    pub(crate) const fn sibling(self) -> PageIndex {
        match self {
            PageIndex::Page0 => PageIndex::Page1,
            PageIndex::Page1 => PageIndex::Page0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Page {
    pub(crate) address: u32,
    pub(crate) size: u32,
    pub(crate) erase_unit: EraseUnit,
}

impl Page {
    /// Number of 4-byte units, including the status unit.
    pub(crate) const fn unit_count(&self) -> u32 {
        self.size / SLOT_SIZE
    }

    pub(crate) const fn unit_address(&self, unit: u32) -> u32 {
        self.address + unit * SLOT_SIZE
    }
}

/// A `(value, id)` record. The value is the low half-word and is programmed first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) value: u16,
    pub(crate) id: u16,
}

impl From<u32> for Slot {
    fn from(word: u32) -> Self {
        Self {
            value: word as u16,
            id: (word >> 16) as u16,
        }
    }
}
