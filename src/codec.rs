//! Fixed-width binary codec for on-disk records.
//!
//! Every record type stored in a disk image implements [DiskRecord]: it is
//! built from fixed-width primitives and `[u8; N]` arrays only, so a value
//! always encodes to exactly [DiskRecord::WIDTH] bytes. Encoding uses
//! bincode's legacy configuration (fixed-width integers, little-endian),
//! the same convention in both directions for a given image.

use std::io::{Read, Seek, SeekFrom, Write};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{FsError, Result};

pub trait DiskRecord: Serialize + DeserializeOwned {
    /// Encoded width in bytes. The width is a layout constant: changing it
    /// changes the image format.
    const WIDTH: usize;

    /// Write this record at `offset`, touching exactly [Self::WIDTH] bytes.
    fn encode<F>(&self, file: &mut F, offset: u64) -> Result<()>
    where
        F: Write + Seek,
    {
        file.seek(SeekFrom::Start(offset))?;
        let config = bincode::config::legacy();
        let bytes = bincode::serde::encode_to_vec(self, config)
            .map_err(|e| FsError::Decode(e.to_string()))?;
        debug_assert_eq!(bytes.len(), Self::WIDTH);
        file.write_all(&bytes)?;
        Ok(())
    }

    /// Read the record stored at `offset`, consuming exactly [Self::WIDTH]
    /// bytes.
    fn decode<F>(file: &mut F, offset: u64) -> Result<Self>
    where
        F: Read + Seek,
    {
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; Self::WIDTH];
        file.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                FsError::ShortRead {
                    offset,
                    needed: Self::WIDTH,
                }
            } else {
                FsError::Io(e)
            }
        })?;
        let config = bincode::config::legacy();
        let (record, _) = bincode::serde::decode_from_slice(&buf, config)
            .map_err(|e| FsError::Decode(e.to_string()))?;
        Ok(record)
    }
}

/// Encode a name into a fixed-width, NUL-padded field. Rejects names that
/// do not fit.
pub fn fixed_name<const N: usize>(name: &str) -> Result<[u8; N]> {
    let bytes = name.as_bytes();
    if bytes.is_empty() {
        return Err(FsError::Parameter("name must not be empty".into()));
    }
    if bytes.len() > N {
        return Err(FsError::Parameter(format!(
            "name {name:?} exceeds the {N}-byte field"
        )));
    }
    let mut out = [0u8; N];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

/// Decode a NUL-padded name field, trimming padding and surrounding
/// whitespace.
pub fn name_str(field: &[u8]) -> String {
    String::from_utf8_lossy(field)
        .trim_matches(char::from(0))
        .trim()
        .to_string()
}

/// Encoded width of one value, measured by serializing it. Used by tests to
/// pin [DiskRecord::WIDTH] constants to the real layout.
#[cfg(test)]
pub(crate) fn measured_width<T: Serialize>(value: &T) -> usize {
    bincode::serde::encode_to_vec(value, bincode::config::legacy())
        .expect("record must serialize")
        .len()
}
