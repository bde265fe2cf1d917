//! Packed-bit allocation bitmaps.
//!
//! Unit `i` of a region starting at byte offset `start` lives at byte
//! `start + i/8`, bit `i%8` (`Lsb0`). 0 = free, 1 = used.

use std::io::{Read, Seek, SeekFrom, Write};

use bitvec::prelude::*;

use crate::error::{FsError, Result};

/// Bytes needed to hold `units` bits.
pub fn byte_len(units: i32) -> usize {
    (units as usize + 7) / 8
}

/// Write an all-free bitmap of `units` bits at `start`.
pub fn init<F>(file: &mut F, start: u64, units: i32) -> Result<()>
where
    F: Write + Seek,
{
    file.seek(SeekFrom::Start(start))?;
    file.write_all(&vec![0u8; byte_len(units)])?;
    Ok(())
}

/// Load the whole region into memory.
pub fn load<F>(file: &mut F, start: u64, units: i32) -> Result<BitVec<u8, Lsb0>>
where
    F: Read + Seek,
{
    file.seek(SeekFrom::Start(start))?;
    let mut buf = vec![0u8; byte_len(units)];
    file.read_exact(&mut buf)?;
    let mut bits = BitVec::<u8, Lsb0>::from_vec(buf);
    bits.truncate(units as usize);
    Ok(bits)
}

/// Whether unit `index` is marked used.
pub fn is_used<F>(file: &mut F, start: u64, index: i32) -> Result<bool>
where
    F: Read + Seek,
{
    let mut byte = [0u8; 1];
    file.seek(SeekFrom::Start(start + index as u64 / 8))?;
    file.read_exact(&mut byte)?;
    Ok(byte.view_bits::<Lsb0>()[index as usize % 8])
}

/// Mark unit `index` used, rewriting only the byte that holds it.
pub fn set_used<F>(file: &mut F, start: u64, index: i32) -> Result<()>
where
    F: Read + Write + Seek,
{
    let byte_offset = start + index as u64 / 8;
    let mut byte = [0u8; 1];
    file.seek(SeekFrom::Start(byte_offset))?;
    file.read_exact(&mut byte)?;
    byte.view_bits_mut::<Lsb0>().set(index as usize % 8, true);
    file.seek(SeekFrom::Start(byte_offset))?;
    file.write_all(&byte)?;
    Ok(())
}

/// Scan from unit 0, mark the first free unit used in place and return its
/// index.
pub fn find_and_mark<F>(file: &mut F, start: u64, units: i32, what: &str) -> Result<i32>
where
    F: Read + Write + Seek,
{
    let bits = load(file, start, units)?;
    let index = bits
        .first_zero()
        .ok_or_else(|| FsError::NoSpace(format!("no free {what} left (capacity {units})")))?;
    set_used(file, start, index as i32)?;
    Ok(index as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn bits_pack_eight_per_byte() {
        assert_eq!(byte_len(1), 1);
        assert_eq!(byte_len(8), 1);
        assert_eq!(byte_len(9), 2);

        let mut image = Cursor::new(vec![0xFFu8; 16]);
        init(&mut image, 4, 20).unwrap();
        // 20 bits round up to 3 zeroed bytes
        assert_eq!(&image.get_ref()[4..7], &[0, 0, 0]);
        assert_eq!(image.get_ref()[3], 0xFF);
        assert_eq!(image.get_ref()[7], 0xFF);
    }

    #[test]
    fn scan_marks_in_order_and_reports_exhaustion() {
        let mut image = Cursor::new(vec![0u8; 8]);
        init(&mut image, 0, 10).unwrap();
        for expected in 0..10 {
            let got = find_and_mark(&mut image, 0, 10, "unit").unwrap();
            assert_eq!(got, expected);
            assert!(is_used(&mut image, 0, expected).unwrap());
        }
        let err = find_and_mark(&mut image, 0, 10, "unit").unwrap_err();
        assert!(matches!(err, FsError::NoSpace(_)));
    }

    #[test]
    fn set_used_touches_one_byte() {
        let mut image = Cursor::new(vec![0u8; 4]);
        set_used(&mut image, 0, 9).unwrap();
        assert_eq!(image.get_ref()[1], 0b0000_0010);
        assert_eq!(image.get_ref()[0], 0);
    }
}
