use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashErrorKind, ReadNorFlash, check_erase, check_read, check_write,
};

/// RAM-backed NOR flash for host builds, previews, and tests.
///
/// Behaves like the real thing where it matters: erased bytes read `0xFF`, writes can
/// only clear bits, and offsets must respect the read/write/erase granularity.
/// [`set_fail_writes`](Self::set_fail_writes) makes every write and erase fail, to
/// exercise error paths.
#[derive(Clone, Debug)]
pub struct MemoryFlash<const SIZE: usize> {
    bytes: [u8; SIZE],
    fail_writes: bool,
    erase_count: u32,
}

impl<const SIZE: usize> MemoryFlash<SIZE> {
    /// Fully erased flash.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: [0xFF; SIZE],
            fail_writes: false,
            erase_count: 0,
        }
    }

    /// Make every subsequent write and erase fail (or succeed again).
    pub const fn set_fail_writes(&mut self, fail_writes: bool) {
        self.fail_writes = fail_writes;
    }

    /// Number of erase operations performed so far.
    #[must_use]
    pub const fn erase_count(&self) -> u32 {
        self.erase_count
    }

    /// Raw contents.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SIZE] {
        &self.bytes
    }

    /// Raw contents, for simulating bit rot.
    pub const fn as_bytes_mut(&mut self) -> &mut [u8; SIZE] {
        &mut self.bytes
    }
}

impl<const SIZE: usize> Default for MemoryFlash<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize> ErrorType for MemoryFlash<SIZE> {
    type Error = NorFlashErrorKind;
}

impl<const SIZE: usize> ReadNorFlash for MemoryFlash<SIZE> {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        check_read(&*self, offset, bytes.len())?;
        let start = offset as usize;
        bytes.copy_from_slice(&self.bytes[start..start + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        SIZE
    }
}

impl<const SIZE: usize> NorFlash for MemoryFlash<SIZE> {
    const WRITE_SIZE: usize = 4;
    const ERASE_SIZE: usize = 1024;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        check_erase(&*self, from, to)?;
        if self.fail_writes {
            return Err(NorFlashErrorKind::Other);
        }
        self.bytes[from as usize..to as usize].fill(0xFF);
        self.erase_count = self.erase_count.wrapping_add(1);
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        check_write(&*self, offset, bytes.len())?;
        if self.fail_writes {
            return Err(NorFlashErrorKind::Other);
        }
        let start = offset as usize;
        for (cell, &byte) in self.bytes[start..start + bytes.len()].iter_mut().zip(bytes) {
            *cell &= byte;
        }
        Ok(())
    }
}
