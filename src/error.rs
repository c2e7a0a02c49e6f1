use embedded_storage::nor_flash::NorFlashErrorKind;

/// Errors returned by screen configuration and storage operations.
///
/// Drawing never fails: out-of-range coordinates are clipped and short glyph
/// bit sequences are truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum Error {
    /// An index or block number is outside its valid range.
    #[display("index out of bounds")]
    IndexOutOfBounds,

    /// A position table does not map every physical address exactly once.
    #[display("position table is not a bijection over the panel slots")]
    InvalidPositionTable,

    /// Quarter-turn rotations need a square panel.
    #[display("rotation needs a square panel")]
    RotationUnsupported,

    /// The shared screen state has already been split into a controller and refresher.
    #[display("screen already split into a controller and refresher")]
    AlreadySplit,

    /// A buffer had the wrong number of bytes.
    #[display("buffer length {actual} does not match expected {expected}")]
    BufferLength {
        /// Bytes the operation needs.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },

    /// A payload does not fit into a storage record.
    #[display("payload of {_0} bytes does not fit into a storage record")]
    PayloadTooLarge(#[error(not(source))] usize),

    /// Every storage block already holds another key.
    #[display("no free storage block")]
    StorageFull,

    /// A stored record failed its length or CRC check.
    #[display("stored record is corrupted")]
    StorageCorrupted,

    /// A storage region does not start or end on an erase-block boundary.
    #[display("storage region is not aligned to erase blocks")]
    StorageMisaligned,

    /// The underlying flash device reported an error.
    #[display("flash error: {_0:?}")]
    Flash(#[error(not(source))] NorFlashErrorKind),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
