//! MSB-first bit packing shared by glyph tables, packed buffer transport, and panel scans.
//!
//! [`read_bytes`] and [`pack_bits`] are exact inverses for any whole number of bytes:
//!
//! ```rust
//! use led_screen::bits::{pack_bits, read_bytes};
//!
//! let bits = read_bytes::<16>(&[0b1010_0000, 0xFF]);
//! assert_eq!(&bits[..8], &[1, 0, 1, 0, 0, 0, 0, 0]);
//! assert_eq!(pack_bits::<2>(&bits).as_slice(), &[0b1010_0000, 0xFF]);
//! ```

use heapless::Vec;

/// Iterate the bits of `bytes` as 0/1 values, most significant bit of each byte first.
pub fn unpacked(bytes: &[u8]) -> impl Iterator<Item = u8> + '_ {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1))
}

/// Unpack `bytes` into one 0/1 value per bit, MSB first.
///
/// Output beyond `CAP` values is dropped.
#[must_use]
pub fn read_bytes<const CAP: usize>(bytes: &[u8]) -> Vec<u8, CAP> {
    let mut bits = Vec::new();
    for bit in unpacked(bytes) {
        if bits.push(bit).is_err() {
            warn!("bits: read_bytes truncated at {} bits", CAP);
            break;
        }
    }
    bits
}

/// Pack 0/1 values (any non-zero counts as 1) eight per byte, MSB first.
///
/// A trailing partial byte is padded with zero bits. Output beyond `CAP` bytes is dropped.
#[must_use]
pub fn pack_bits<const CAP: usize>(bits: &[u8]) -> Vec<u8, CAP> {
    let mut bytes = Vec::new();
    for chunk in bits.chunks(8) {
        if bytes.push(pack_byte(chunk.iter().map(|&bit| bit != 0))).is_err() {
            warn!("bits: pack_bits truncated at {} bytes", CAP);
            break;
        }
    }
    bytes
}

/// Pack flags into `out` MSB first and return the number of bytes written.
///
/// Stops when `out` is full.
pub fn pack_into(flags: impl IntoIterator<Item = bool>, out: &mut [u8]) -> usize {
    let mut flags = flags.into_iter().peekable();
    let mut written = 0;
    for byte in out.iter_mut() {
        if flags.peek().is_none() {
            break;
        }
        *byte = pack_byte(flags.by_ref().take(8));
        written += 1;
    }
    written
}

fn pack_byte(flags: impl Iterator<Item = bool>) -> u8 {
    flags
        .chain(core::iter::repeat(false))
        .take(8)
        .fold(0, |byte, flag| (byte << 1) | u8::from(flag))
}
