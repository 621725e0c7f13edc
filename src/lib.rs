#![doc = include_str!("../README.md")]
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

pub mod config;
pub mod error;
mod get;
mod internal;
pub mod platform;
mod raw;
mod recovery;
mod set;

pub use get::Get;
pub use raw::{PageIndex, PageStatus};
pub use set::Set;

use crate::config::Config;
use crate::error::Error;
use crate::internal::Operation;
use crate::platform::Platform;
use crate::raw::{FIRST_SLOT, Page, RESERVED_ID};
#[cfg(feature = "defmt")]
use defmt::warn;

/// Snapshot of both page headers and the fill level of the active page, in records.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Statistics {
    pub pages: [PageStatus; 2],
    pub active_page: Option<PageIndex>,
    pub used_slots: u32,
    pub free_slots: u32,
    pub capacity: u32,
}

/// Two-page EEPROM emulation for `N` 16-bit variables.
///
/// Nothing is cached, every read scans the flash. The struct only holds the page geometry and the
/// id table, and stays the same size regardless of how often variables are written.
pub struct Eeprom<T: Platform, const N: usize> {
    pub(crate) hal: T,
    pub(crate) config: Config,
    pub(crate) pages: [Page; 2],
    pub(crate) ids: [u16; N],
    pub(crate) faulted: bool,
}

impl<T: Platform, const N: usize> Eeprom<T, N> {
    /// Validates the configuration and the id table, then runs [`Eeprom::init`].
    ///
    /// `ids` lists every variable the store manages, in the order they are copied during a page
    /// transfer. Ids have to be unique and `0xFFFF` is reserved. A page has to hold at least
    /// `N + 1` records.
    pub fn new(config: Config, ids: [u16; N], hal: T) -> Result<Eeprom<T, N>, Error> {
        config.validate()?;

        for (i, id) in ids.iter().enumerate() {
            if *id == RESERVED_ID || ids[..i].contains(id) {
                return Err(Error::InvalidIdTable);
            }
        }

        // one record per variable plus a spare for a record torn by a power loss
        if N as u64 >= config.capacity() as u64 {
            return Err(Error::InsufficientCapacity);
        }

        let mut eeprom = Self {
            hal,
            config,
            pages: config.pages(),
            ids,
            faulted: false,
        };

        eeprom.init()?;

        Ok(eeprom)
    }

    /// Mimics a cold start: reads both page headers and completes or rolls back an interrupted
    /// page transfer, formatting the store if the headers make no sense.
    ///
    /// Afterwards exactly one page is `Active` and the other one is blank. Calling it again
    /// without writes in between doesn't touch the flash.
    pub fn init(&mut self) -> Result<(), Error> {
        let result = self.with_cache_disabled(|eeprom| eeprom.recover());
        self.track_fault(result)?;
        self.faulted = false;
        Ok(())
    }

    /// Read the latest value of a variable.
    pub fn read_variable(&mut self, id: u16) -> Result<u16, Error> {
        self.check_id(id)?;
        self.with_cache_disabled(|eeprom| eeprom.read(id))
    }

    /// Append a new value of a variable, transferring all variables to the other page if the
    /// active one is full.
    ///
    /// After a flash error all writes are refused with [`Error::FlashError`] until
    /// [`Eeprom::init`] or [`Eeprom::format`] succeeded, because the pages might be left in the
    /// middle of a transfer.
    pub fn write_variable(&mut self, id: u16, value: u16) -> Result<(), Error> {
        self.check_id(id)?;

        if self.faulted {
            return Err(Error::FlashError);
        }

        let result = self.with_cache_disabled(|eeprom| match eeprom.append(id, value) {
            Err(Error::PageFull) => eeprom.transfer(id, value),
            other => other,
        });
        self.track_fault(result)
    }

    /// Get a variable converted to `R`.
    ///
    /// Supported types are u16, i16, u8, i8 and bool.
    pub fn get<R>(&mut self, id: u16) -> Result<R, Error>
    where
        Eeprom<T, N>: Get<R>,
    {
        Get::get(self, id)
    }

    /// Set a variable from `R`. Every type is stored as a single 16-bit value.
    pub fn set<R>(&mut self, id: u16, value: R) -> Result<(), Error>
    where
        Eeprom<T, N>: Set<R>,
    {
        Set::set(self, id, value)
    }

    /// Erases both pages and marks page 0 active. All variables are lost.
    pub fn format(&mut self) -> Result<(), Error> {
        let result = self.with_cache_disabled(|eeprom| eeprom.format_pages());
        self.track_fault(result)?;
        self.faulted = false;
        Ok(())
    }

    /// Returns the page states and the fill level of the active page.
    pub fn statistics(&mut self) -> Result<Statistics, Error> {
        self.with_cache_disabled(|eeprom| {
            let pages = eeprom.page_statuses()?;
            let capacity = eeprom.config.capacity();
            let active_page = internal::select_valid_page(Operation::Read, pages).ok();

            let used_slots = match active_page {
                Some(index) => match eeprom.append_point(index)? {
                    Some(unit) => unit.saturating_sub(FIRST_SLOT),
                    None => capacity,
                },
                None => 0,
            };

            Ok(Statistics {
                pages,
                active_page,
                used_slots,
                free_slots: capacity - used_slots,
                capacity,
            })
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ids(&self) -> &[u16; N] {
        &self.ids
    }

    /// Direct access to the flash driver, e.g. to share it with other parts of the firmware.
    /// Writing to the two pages behind the back of the store breaks its invariants.
    pub fn platform(&self) -> &T {
        &self.hal
    }

    pub fn platform_mut(&mut self) -> &mut T {
        &mut self.hal
    }

    pub fn release(self) -> T {
        self.hal
    }

    fn check_id(&self, id: u16) -> Result<(), Error> {
        if self.ids.contains(&id) {
            Ok(())
        } else {
            Err(Error::InvalidId)
        }
    }

    fn with_cache_disabled<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.hal.disable_cache();
        let result = f(self);
        self.hal.enable_cache();
        result
    }

    fn track_fault<R>(&mut self, result: Result<R, Error>) -> Result<R, Error> {
        if let Err(Error::FlashError) = result {
            #[cfg(feature = "defmt")]
            warn!("flash error, writes disabled until init");

            self.faulted = true;
        }
        result
    }
}
