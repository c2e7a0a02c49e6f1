//! Key/value persistence on NOR flash, used to keep the screen across power cycles.
//!
//! [`Storage`] is the narrow interface the screen persists through. [`FlashStorage`]
//! implements it on top of any [`embedded_storage`] NOR flash by giving each key its own
//! erase block. A block holds one record:
//!
//! ```text
//! offset  size  field
//! 0       4     magic 'SCRN' (u32 LE)
//! 4       4     FNV-1a hash of the key (u32 LE)
//! 8       2     payload length (u16 LE)
//! 10      n     payload
//! 10+n    4     CRC-32 of bytes 0..10+n (u32 LE)
//! ```
//!
//! Blocks whose magic does not match are free. A record with a bad length or CRC is
//! reported as [`Error::StorageCorrupted`] rather than returned.
//!
//! # Example
//!
//! ```rust
//! use led_screen::storage::{FlashStorage, MemoryFlash, Storage};
//!
//! # fn main() -> led_screen::Result<()> {
//! let mut storage = FlashStorage::at_end(MemoryFlash::<4096>::new(), 2)?;
//! storage.save("brightness", &[128])?;
//!
//! let mut buf = [0_u8; 1];
//! assert_eq!(storage.load("brightness", &mut buf)?, Some(1));
//! assert_eq!(buf, [128]);
//! assert_eq!(storage.load("data", &mut buf)?, None);
//! # Ok(())
//! # }
//! ```

mod memory_flash;

use crc32fast::Hasher;
use embedded_storage::nor_flash::{NorFlash, NorFlashError};

pub use memory_flash::MemoryFlash;

use crate::{Error, Result};

const MAGIC: u32 = 0x5343_524E; // 'SCRN'
const HEADER_SIZE: usize = 4 + 4 + 2; // Magic + KeyHash + PayloadLen
const CRC_SIZE: usize = 4;
/// Largest record [`FlashStorage`] reads or writes in one piece.
pub const RECORD_BUFFER_SIZE: usize = 4096;
/// Largest payload a record can hold (also limited by the flash's erase block size).
pub const MAX_PAYLOAD_SIZE: usize = RECORD_BUFFER_SIZE - HEADER_SIZE - CRC_SIZE;

/// Persistent key/value store.
pub trait Storage {
    /// Copy the value stored under `key` into the front of `buf`.
    ///
    /// Returns the value's length, or `None` if nothing is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLength`] if `buf` is too short for the stored value,
    /// [`Error::StorageCorrupted`] if the value fails its integrity check, or the
    /// device's error.
    fn load(&mut self, key: &str, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Store `bytes` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageFull`], [`Error::PayloadTooLarge`], or the device's error.
    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn load(&mut self, key: &str, buf: &mut [u8]) -> Result<Option<usize>> {
        (**self).load(key, buf)
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        (**self).save(key, bytes)
    }
}

/// [`Storage`] on a region of NOR flash, one erase block per key.
///
/// ⚠️ **Warning**: on microcontrollers that run from the same flash, keep the region
/// clear of the firmware image; [`FlashStorage::at_end`] places it at the very end.
pub struct FlashStorage<F> {
    flash: F,
    base: u32,
    blocks: u32,
}

impl<F: NorFlash> FlashStorage<F> {
    /// Use `blocks` erase blocks starting at byte offset `base`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageMisaligned`] if `base` is not on an erase-block boundary,
    /// and [`Error::IndexOutOfBounds`] if the region runs past the end of the flash.
    pub fn new(flash: F, base: u32, blocks: u32) -> Result<Self> {
        let erase_size = erase_size::<F>()?;
        if base % erase_size != 0 {
            return Err(Error::StorageMisaligned);
        }
        let end = blocks
            .checked_mul(erase_size)
            .and_then(|len| len.checked_add(base))
            .ok_or(Error::IndexOutOfBounds)?;
        if usize::try_from(end).map_err(|_| Error::IndexOutOfBounds)? > flash.capacity() {
            return Err(Error::IndexOutOfBounds);
        }
        Ok(Self {
            flash,
            base,
            blocks,
        })
    }

    /// Use the last `blocks` erase blocks of the flash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if the flash has fewer than `blocks` blocks.
    pub fn at_end(flash: F, blocks: u32) -> Result<Self> {
        let erase_size = erase_size::<F>()?;
        let capacity = u32::try_from(flash.capacity()).map_err(|_| Error::IndexOutOfBounds)?;
        let len = blocks
            .checked_mul(erase_size)
            .ok_or(Error::IndexOutOfBounds)?;
        let base = capacity.checked_sub(len).ok_or(Error::IndexOutOfBounds)?;
        // Round down so a capacity that is not a whole number of blocks still works.
        Self::new(flash, base - base % erase_size, blocks)
    }

    /// Number of erase blocks, i.e. the number of distinct keys this store can hold.
    #[must_use]
    pub const fn blocks(&self) -> u32 {
        self.blocks
    }

    /// The underlying flash.
    pub const fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Give back the underlying flash.
    pub fn into_inner(self) -> F {
        self.flash
    }

    /// Erase the record stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns the device's error.
    pub fn clear(&mut self, key: &str) -> Result<()> {
        let mut record = [0_u8; RECORD_BUFFER_SIZE];
        if let Some(block) = self.find_block(key_hash(key), &mut record)?.found {
            self.erase_block(block)?;
            info!("Flash: Cleared block {}", block);
        }
        Ok(())
    }

    fn block_offset(&self, block: u32) -> u32 {
        // `new` checked that every block fits below u32::MAX.
        self.base + block * F::ERASE_SIZE as u32
    }

    fn read_len() -> usize {
        F::ERASE_SIZE.min(RECORD_BUFFER_SIZE)
    }

    fn read_block(&mut self, block: u32, record: &mut [u8; RECORD_BUFFER_SIZE]) -> Result<()> {
        let offset = self.block_offset(block);
        self.flash
            .read(offset, &mut record[..Self::read_len()])
            .map_err(|err| Error::Flash(err.kind()))
    }

    fn erase_block(&mut self, block: u32) -> Result<()> {
        let offset = self.block_offset(block);
        self.flash
            .erase(offset, offset + F::ERASE_SIZE as u32)
            .map_err(|err| Error::Flash(err.kind()))
    }

    /// Scan the blocks for `hash`, noting the first free block on the way.
    ///
    /// On a match, `record` holds that block's contents.
    fn find_block(
        &mut self,
        hash: u32,
        record: &mut [u8; RECORD_BUFFER_SIZE],
    ) -> Result<BlockSearch> {
        let mut search = BlockSearch::default();
        for block in 0..self.blocks {
            self.read_block(block, record)?;
            let magic = read_u32(record, 0);
            if magic != MAGIC {
                search.free.get_or_insert(block);
                continue;
            }
            if read_u32(record, 4) == hash {
                search.found = Some(block);
                return Ok(search);
            }
        }
        Ok(search)
    }
}

impl<F: NorFlash> Storage for FlashStorage<F> {
    fn load(&mut self, key: &str, buf: &mut [u8]) -> Result<Option<usize>> {
        let mut record = [0_u8; RECORD_BUFFER_SIZE];
        let Some(block) = self.find_block(key_hash(key), &mut record)?.found else {
            debug!("Flash: No data for key");
            return Ok(None);
        };

        let payload_len = usize::from(u16::from_le_bytes([record[8], record[9]]));
        let crc_offset = HEADER_SIZE + payload_len;
        if crc_offset + CRC_SIZE > Self::read_len() {
            error!(
                "Flash: Invalid payload length {} at block {}",
                payload_len, block
            );
            return Err(Error::StorageCorrupted);
        }

        let stored_crc = read_u32(&record, crc_offset);
        let computed_crc = compute_crc(&record[..crc_offset]);
        if stored_crc != computed_crc {
            error!(
                "Flash: CRC mismatch at block {} (expected {}, found {})",
                block, computed_crc, stored_crc
            );
            return Err(Error::StorageCorrupted);
        }

        let actual = buf.len();
        let target = buf.get_mut(..payload_len).ok_or(Error::BufferLength {
            expected: payload_len,
            actual,
        })?;
        target.copy_from_slice(&record[HEADER_SIZE..crc_offset]);
        info!("Flash: Loaded {} bytes from block {}", payload_len, block);
        Ok(Some(payload_len))
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        let record_len = HEADER_SIZE + bytes.len() + CRC_SIZE;
        let payload_len = u16::try_from(bytes.len())
            .ok()
            .filter(|_| record_len <= Self::read_len())
            .ok_or(Error::PayloadTooLarge(bytes.len()))?;

        let hash = key_hash(key);
        let mut record = [0xFF_u8; RECORD_BUFFER_SIZE];
        let search = self.find_block(hash, &mut record)?;
        let block = search.found.or(search.free).ok_or_else(|| {
            error!("Flash: No free block among {}", self.blocks);
            Error::StorageFull
        })?;

        record.fill(0xFF);
        record[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        record[4..8].copy_from_slice(&hash.to_le_bytes());
        record[8..10].copy_from_slice(&payload_len.to_le_bytes());
        record[HEADER_SIZE..HEADER_SIZE + bytes.len()].copy_from_slice(bytes);
        let crc_offset = HEADER_SIZE + bytes.len();
        let crc = compute_crc(&record[..crc_offset]);
        record[crc_offset..record_len].copy_from_slice(&crc.to_le_bytes());

        // Erased bytes read 0xFF, so padding to the write granularity changes nothing.
        let padded = record
            .get(..record_len.next_multiple_of(F::WRITE_SIZE))
            .ok_or(Error::PayloadTooLarge(bytes.len()))?;
        self.erase_block(block)?;
        let offset = self.block_offset(block);
        self.flash
            .write(offset, padded)
            .map_err(|err| Error::Flash(err.kind()))?;

        info!("Flash: Saved {} bytes to block {}", bytes.len(), block);
        Ok(())
    }
}

#[derive(Default)]
struct BlockSearch {
    found: Option<u32>,
    free: Option<u32>,
}

fn erase_size<F: NorFlash>() -> Result<u32> {
    u32::try_from(F::ERASE_SIZE).map_err(|_| Error::IndexOutOfBounds)
}

fn read_u32(record: &[u8], offset: usize) -> u32 {
    let mut bytes = [0_u8; 4];
    if let Some(source) = record.get(offset..offset + 4) {
        bytes.copy_from_slice(source);
    }
    u32::from_le_bytes(bytes)
}

/// Compute FNV-1a hash of a storage key.
const fn key_hash(key: &str) -> u32 {
    const FNV_PRIME: u32 = 16_777_619;
    const FNV_OFFSET: u32 = 2_166_136_261;

    let bytes = key.as_bytes();
    let mut hash = FNV_OFFSET;
    let mut index = 0;
    while index < bytes.len() {
        hash ^= bytes[index] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        index += 1;
    }
    hash
}

/// Compute CRC32 checksum.
fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
