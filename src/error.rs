use thiserror::Error;

/// Errors that can occur during EEPROM emulation. Marked as non-exhaustive to allow for future
/// additions without breaking the API. A caller would likely only need to handle
/// `VariableNotFound` at runtime, the configuration errors are static.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The page size has to be a multiple of 4 bytes and hold at least one record.
    #[error("invalid page size")]
    InvalidPageSize,

    /// Page addresses have to be 4-byte aligned and the two pages must not overlap.
    #[error("invalid page address")]
    InvalidPageAddress,

    /// The id table contains a duplicate or the reserved id `0xFFFF`.
    #[error("invalid id table")]
    InvalidIdTable,

    /// A page can't hold one record per configured variable plus one spare record, so a page
    /// transfer interrupted by a power loss might not fit.
    #[error("insufficient page capacity")]
    InsufficientCapacity,

    /// An erase, program or read of the provided [`Platform`](crate::platform::Platform) failed.
    /// Flash errors are never retried.
    #[error("internal flash error")]
    FlashError,

    /// Used internally to trigger a page transfer. Only returned to the caller if the transfer
    /// itself ran out of space.
    #[error("page full")]
    PageFull,

    /// Neither page carries a status that allows the requested operation. Call
    /// [`Eeprom::init`](crate::Eeprom::init) or [`Eeprom::format`](crate::Eeprom::format).
    #[error("no valid page")]
    NoValidPage,

    /// The id is not part of the id table. Checked before any flash access.
    #[error("invalid id")]
    InvalidId,

    /// The variable has never been written, or its last value was lost by a format.
    #[error("variable not found")]
    VariableNotFound,

    /// The stored 16-bit value does not fit into the requested type.
    #[error("value out of range")]
    ValueOutOfRange,
}
