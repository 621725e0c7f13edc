use crate::Eeprom;
use crate::error::Error;
use crate::platform::Platform;
use crate::raw::{PageIndex, PageStatus};
#[cfg(feature = "defmt")]
use defmt::{trace, warn};

/// What has to happen at startup to get back to one `Active` and one `Erased` page.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Repair {
    /// Steady state, only make sure the idle page is blank. A power loss while erasing it can
    /// leave an `Erased` status in front of stale records.
    EnsureErased { idle: PageIndex },

    /// A transfer copied everything and erased the old page, only the final status is missing.
    Activate { receiving: PageIndex },

    /// A transfer was interrupted while copying. The old page is still `Active` and complete.
    Replay { receiving: PageIndex },

    /// No well defined state, start over. The only repair that loses data.
    Format,
}

impl Repair {
    pub(crate) fn plan(status: [PageStatus; 2]) -> Repair {
        use PageStatus::{Active, Erased, Receiving};

        match status {
            [Erased, Active] => Repair::EnsureErased {
                idle: PageIndex::Page0,
            },
            [Active, Erased] => Repair::EnsureErased {
                idle: PageIndex::Page1,
            },
            [Receiving, Erased] => Repair::Activate {
                receiving: PageIndex::Page0,
            },
            [Erased, Receiving] => Repair::Activate {
                receiving: PageIndex::Page1,
            },
            [Receiving, Active] => Repair::Replay {
                receiving: PageIndex::Page0,
            },
            [Active, Receiving] => Repair::Replay {
                receiving: PageIndex::Page1,
            },
            // both erased on first use, both receiving or both active can't happen under correct
            // operation, and any other status is corrupt
            _ => Repair::Format,
        }
    }
}

impl<T: Platform, const N: usize> Eeprom<T, N> {
    /// Inspects both page headers and finishes or undoes whatever was interrupted by a power loss.
    ///
    /// If a repair fails, the store is formatted rather than left in a state where it can't be
    /// used. A failing format is returned to the caller.
    pub(crate) fn recover(&mut self) -> Result<(), Error> {
        let status = self.page_statuses()?;
        let repair = Repair::plan(status);

        #[cfg(feature = "defmt")]
        trace!("recover: {} {} -> {}", status[0], status[1], repair);

        #[cfg(feature = "debug-logs")]
        println!(
            "recovery: recover: [{}, {}] -> {repair:?}",
            status[0], status[1]
        );

        match self.repair(repair) {
            Ok(()) => Ok(()),
            Err(_e) if repair == Repair::Format => Err(_e),
            Err(_e) => {
                #[cfg(feature = "defmt")]
                warn!("recover: {} failed: {}, formatting", repair, _e);

                #[cfg(feature = "debug-logs")]
                println!("recovery: {repair:?} failed: {_e:?}, formatting");

                self.format_pages()
            }
        }
    }

    fn repair(&mut self, repair: Repair) -> Result<(), Error> {
        match repair {
            Repair::EnsureErased { idle } => self.erase_page_if_dirty(idle),
            Repair::Activate { receiving } => {
                self.erase_page_if_dirty(receiving.sibling())?;
                self.set_page_status(receiving, PageStatus::Active)
            }
            Repair::Replay { receiving } => self.replay(receiving),
            Repair::Format => self.format_pages(),
        }
    }

    /// Completes an interrupted transfer into `receiving`.
    ///
    /// The first record of the receiving page belongs to the variable that triggered the transfer
    /// and holds its newest value. Variables already present in the receiving page, the anchor
    /// included, are not copied again, everything else comes from the still `Active` sibling.
    ///
    /// The old page is erased before the receiving page is marked `Active`. A power loss in
    /// between leaves `Receiving`/`Erased`, which only needs [`Repair::Activate`], whereas two
    /// `Active` pages would have to be formatted.
    pub(crate) fn replay(&mut self, receiving: PageIndex) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        trace!("replay: {}", receiving);

        #[cfg(feature = "debug-logs")]
        println!("recovery: replay: {receiving}");

        self.copy_variables(receiving)?;

        self.erase_page(receiving.sibling())?;

        self.set_page_status(receiving, PageStatus::Active)
    }

    /// Erases both pages and marks page 0 `Active`.
    pub(crate) fn format_pages(&mut self) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        warn!("format");

        #[cfg(feature = "debug-logs")]
        println!("recovery: format");

        self.erase_page_if_dirty(PageIndex::Page0)?;
        self.erase_page_if_dirty(PageIndex::Page1)?;
        self.set_page_status(PageIndex::Page0, PageStatus::Active)
    }
}
