use crate::Eeprom;
use crate::error::Error;
use crate::platform::Platform;
use crate::raw::{ERASED_WORD, FIRST_SLOT, HALFWORD_SIZE, Page, PageIndex, PageStatus, Slot};
#[cfg(feature = "defmt")]
use defmt::trace;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Operation {
    Read,
    Write,
}

/// Picks the page an operation has to use.
///
/// Reads always go to the `Active` page. While a page transfer is in flight the sibling of the
/// `Active` page is `Receiving`, and writes have to land there instead of in the page that is
/// being drained. Two `Active` pages are a contradiction and nothing is valid.
pub(crate) fn select_valid_page(
    operation: Operation,
    status: [PageStatus; 2],
) -> Result<PageIndex, Error> {
    use PageStatus::{Active, Receiving};

    match (operation, status) {
        (_, [Active, Active]) => Err(Error::NoValidPage),
        (Operation::Read, [Active, _]) => Ok(PageIndex::Page0),
        (Operation::Read, [_, Active]) => Ok(PageIndex::Page1),
        (Operation::Write, [Receiving, Active]) => Ok(PageIndex::Page0),
        (Operation::Write, [_, Active]) => Ok(PageIndex::Page1),
        (Operation::Write, [Active, Receiving]) => Ok(PageIndex::Page1),
        (Operation::Write, [Active, _]) => Ok(PageIndex::Page0),
        _ => Err(Error::NoValidPage),
    }
}

// flash primitives
impl<T: Platform, const N: usize> Eeprom<T, N> {
    pub(crate) fn page(&self, index: PageIndex) -> Page {
        self.pages[index as usize]
    }

    pub(crate) fn read_word(&mut self, address: u32) -> Result<u32, Error> {
        self.hal.read_word(address).map_err(|_| Error::FlashError)
    }

    pub(crate) fn read_halfword(&mut self, address: u32) -> Result<u16, Error> {
        self.hal.read_halfword(address).map_err(|_| Error::FlashError)
    }

    pub(crate) fn program_halfword(&mut self, address: u32, value: u16) -> Result<(), Error> {
        self.hal.unlock();
        let result = self.hal.program_halfword(address, value);
        self.hal.lock();
        result.map_err(|_| Error::FlashError)
    }

    pub(crate) fn page_status(&mut self, index: PageIndex) -> Result<PageStatus, Error> {
        let address = self.page(index).address;
        Ok(PageStatus::from(self.read_halfword(address)?))
    }

    pub(crate) fn page_statuses(&mut self) -> Result<[PageStatus; 2], Error> {
        Ok([
            self.page_status(PageIndex::Page0)?,
            self.page_status(PageIndex::Page1)?,
        ])
    }

    pub(crate) fn set_page_status(
        &mut self,
        index: PageIndex,
        status: PageStatus,
    ) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        trace!("set_page_status: {} -> {}", index, status);

        #[cfg(feature = "debug-logs")]
        println!("internal: set_page_status: {index} -> {status}");

        let address = self.page(index).address;
        self.program_halfword(address, status as u16)
    }

    pub(crate) fn is_page_erased(&mut self, index: PageIndex) -> Result<bool, Error> {
        let page = self.page(index);
        for unit in 0..page.unit_count() {
            if self.read_word(page.unit_address(unit))? != ERASED_WORD {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub(crate) fn erase_page(&mut self, index: PageIndex) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        trace!("erase_page: {}", index);

        #[cfg(feature = "debug-logs")]
        println!("internal: erase_page: {index}");

        let unit = self.page(index).erase_unit;
        self.hal.unlock();
        let result = self.hal.erase(unit);
        self.hal.lock();
        result.map_err(|_| Error::FlashError)
    }

    /// Erasing wears the flash, so pages that are already blank are left alone.
    pub(crate) fn erase_page_if_dirty(&mut self, index: PageIndex) -> Result<(), Error> {
        if self.is_page_erased(index)? {
            return Ok(());
        }
        self.erase_page(index)
    }

    /// Index of the first blank unit, which is where the next record goes.
    pub(crate) fn append_point(&mut self, index: PageIndex) -> Result<Option<u32>, Error> {
        let page = self.page(index);
        for unit in 0..page.unit_count() {
            if self.read_word(page.unit_address(unit))? == ERASED_WORD {
                return Ok(Some(unit));
            }
        }
        Ok(None)
    }
}

// write path, read path and page transfer
impl<T: Platform, const N: usize> Eeprom<T, N> {
    pub(crate) fn find_valid_page(&mut self, operation: Operation) -> Result<PageIndex, Error> {
        let status = self.page_statuses()?;
        select_valid_page(operation, status)
    }

    /// Appends a record to the page that currently accepts writes. Returns `PageFull` if there is
    /// no blank unit left.
    ///
    /// The value is programmed before the id. A record torn in between keeps an id of `0xFFFF` and
    /// is never matched by a read.
    pub(crate) fn append(&mut self, id: u16, value: u16) -> Result<(), Error> {
        let index = self.find_valid_page(Operation::Write)?;

        #[cfg(feature = "defmt")]
        trace!("append: {} @{}: {:#x}", id, index, value);

        #[cfg(feature = "debug-logs")]
        println!("internal: append: id {id} @{index}: 0x{value:04x}");

        let unit = self.append_point(index)?.ok_or(Error::PageFull)?;
        let address = self.page(index).unit_address(unit);

        self.program_halfword(address, value)?;
        self.program_halfword(address + HALFWORD_SIZE, id)
    }

    /// Scans the readable page from its end, the newest record of `id` wins.
    pub(crate) fn read(&mut self, id: u16) -> Result<u16, Error> {
        let index = self.find_valid_page(Operation::Read)?;
        self.find_record(index, id)?.ok_or(Error::VariableNotFound)
    }

    /// Newest value of `id` in one page, regardless of the page status.
    pub(crate) fn find_record(
        &mut self,
        index: PageIndex,
        id: u16,
    ) -> Result<Option<u16>, Error> {
        let page = self.page(index);

        for unit in (FIRST_SLOT..page.unit_count()).rev() {
            let slot = Slot::from(self.read_word(page.unit_address(unit))?);
            if slot.id == id {
                return Ok(Some(slot.value));
            }
        }

        Ok(None)
    }

    /// Copies the latest value of every variable into the reserve page, then retires the full one.
    ///
    /// The triggering variable is written first, into the first record of the reserve page. That
    /// record is the anchor recovery uses to finish an interrupted transfer, see
    /// [`Eeprom::replay`].
    pub(crate) fn transfer(&mut self, id: u16, value: u16) -> Result<(), Error> {
        let source = self.find_valid_page(Operation::Read)?;
        let destination = source.sibling();

        #[cfg(feature = "defmt")]
        trace!("transfer: {} -> {}", source, destination);

        #[cfg(feature = "debug-logs")]
        println!("internal: transfer: {source} -> {destination}");

        self.set_page_status(destination, PageStatus::Receiving)?;

        self.append(id, value)?;

        self.copy_variables(destination)?;

        self.erase_page(source)?;

        self.set_page_status(destination, PageStatus::Active)
    }

    /// Appends the value of every variable from the readable page to `destination`, unless
    /// `destination` already holds a record of it. Variables that were never written are skipped.
    ///
    /// The readable page doesn't change while `destination` is `Receiving`, so an existing record
    /// is either the anchor or an identical copy. Each variable occupies at most one record.
    pub(crate) fn copy_variables(&mut self, destination: PageIndex) -> Result<(), Error> {
        let ids = self.ids;
        for id in ids {
            if self.find_record(destination, id)?.is_some() {
                continue;
            }

            match self.read(id) {
                Ok(value) => self.append(id, value)?,
                Err(Error::VariableNotFound) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
