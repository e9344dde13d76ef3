//! Just enough NBT to pull a single long out of a chunk.
//!
//! The walker reads a big-endian named compound and skips every payload it
//! does not need, so only the requested path is ever materialised.

use std::io::{self, Read};

use thiserror::Error;

const TAG_END: u8 = 0;
const TAG_BYTE: u8 = 1;
const TAG_SHORT: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_LONG: u8 = 4;
const TAG_FLOAT: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_BYTE_ARRAY: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_LIST: u8 = 9;
const TAG_COMPOUND: u8 = 10;
const TAG_INT_ARRAY: u8 = 11;
const TAG_LONG_ARRAY: u8 = 12;

/// Compounds nested deeper than this are rejected.
const MAX_DEPTH: usize = 512;

#[derive(Debug, Error)]
pub enum NbtError {
    #[error("unexpected end of data")]
    Truncated,
    #[error("io error: {0}")]
    Io(io::Error),
    #[error("unknown tag type {0}")]
    UnknownTag(u8),
    #[error("root tag is type {0}, expected a compound")]
    NotCompound(u8),
    #[error("negative length {0}")]
    NegativeLength(i32),
    #[error("compounds nested too deeply")]
    TooDeep,
    #[error("tag {0} has type {1}, expected a long")]
    NotLong(String, u8),
}

impl From<io::Error> for NbtError {
    fn from(value: io::Error) -> Self {
        if value.kind() == io::ErrorKind::UnexpectedEof {
            NbtError::Truncated
        } else {
            NbtError::Io(value)
        }
    }
}

/// Finds the long at `path` (compound names from the root) in an NBT stream.
///
/// Returns `Ok(None)` when some element of the path is missing.
pub fn find_long<R: Read>(reader: R, path: &[&str]) -> Result<Option<i64>, NbtError> {
    let mut walker = Walker { reader };
    let root = walker.u8()?;
    if root != TAG_COMPOUND {
        return Err(NbtError::NotCompound(root));
    }
    walker.skip_name()?;
    walker.find_in_compound(path, 0)
}

struct Walker<R> {
    reader: R,
}

impl<R: Read> Walker<R> {
    fn find_in_compound(&mut self, path: &[&str], depth: usize) -> Result<Option<i64>, NbtError> {
        if depth > MAX_DEPTH {
            return Err(NbtError::TooDeep);
        }
        let Some((wanted, rest)) = path.split_first() else {
            return Ok(None);
        };
        loop {
            let tag = self.u8()?;
            if tag == TAG_END {
                return Ok(None);
            }
            let name = self.string()?;
            if name != *wanted {
                self.skip_payload(tag, depth)?;
                continue;
            }
            if rest.is_empty() {
                return match tag {
                    TAG_LONG => Ok(Some(self.i64()?)),
                    TAG_INT => Ok(Some(i64::from(self.i32()?))),
                    other => Err(NbtError::NotLong(name, other)),
                };
            }
            if tag != TAG_COMPOUND {
                return Ok(None);
            }
            return self.find_in_compound(rest, depth + 1);
        }
    }

    fn skip_payload(&mut self, tag: u8, depth: usize) -> Result<(), NbtError> {
        if depth > MAX_DEPTH {
            return Err(NbtError::TooDeep);
        }
        match tag {
            TAG_BYTE => self.skip(1),
            TAG_SHORT => self.skip(2),
            TAG_INT | TAG_FLOAT => self.skip(4),
            TAG_LONG | TAG_DOUBLE => self.skip(8),
            TAG_BYTE_ARRAY => {
                let len = self.len()?;
                self.skip(len)
            }
            TAG_INT_ARRAY => {
                let len = self.len()?;
                self.skip(len * 4)
            }
            TAG_LONG_ARRAY => {
                let len = self.len()?;
                self.skip(len * 8)
            }
            TAG_STRING => self.skip_name(),
            TAG_LIST => {
                let element = self.u8()?;
                let len = self.len()?;
                for _ in 0..len {
                    self.skip_payload(element, depth + 1)?;
                }
                Ok(())
            }
            TAG_COMPOUND => loop {
                let inner = self.u8()?;
                if inner == TAG_END {
                    return Ok(());
                }
                self.skip_name()?;
                self.skip_payload(inner, depth + 1)?;
            },
            other => Err(NbtError::UnknownTag(other)),
        }
    }

    fn skip(&mut self, count: u64) -> Result<(), NbtError> {
        let copied = io::copy(&mut (&mut self.reader).take(count), &mut io::sink())?;
        if copied < count {
            return Err(NbtError::Truncated);
        }
        Ok(())
    }

    fn skip_name(&mut self) -> Result<(), NbtError> {
        let len = self.u16()?;
        self.skip(u64::from(len))
    }

    fn string(&mut self) -> Result<String, NbtError> {
        let len = usize::from(self.u16()?);
        let mut buf = vec![0; len];
        self.reader.read_exact(&mut buf)?;
        // Modified UTF-8 only differs for NUL and supplementary characters,
        // neither of which appear in the names we look for.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn len(&mut self) -> Result<u64, NbtError> {
        let len = self.i32()?;
        u64::try_from(len).map_err(|_| NbtError::NegativeLength(len))
    }

    fn u8(&mut self) -> Result<u8, NbtError> {
        let mut buf = [0; 1];
        self.reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn u16(&mut self) -> Result<u16, NbtError> {
        let mut buf = [0; 2];
        self.reader.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn i32(&mut self) -> Result<i32, NbtError> {
        let mut buf = [0; 4];
        self.reader.read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    fn i64(&mut self) -> Result<i64, NbtError> {
        let mut buf = [0; 8];
        self.reader.read_exact(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(tag: u8, name: &str, out: &mut Vec<u8>) {
        out.push(tag);
        out.extend_from_slice(&(name.len() as u16).to_be_bytes());
        out.extend_from_slice(name.as_bytes());
    }

    fn chunk_with_noise(inhabited: i64) -> Vec<u8> {
        let mut out = Vec::new();
        named(TAG_COMPOUND, "", &mut out);
        named(TAG_INT, "DataVersion", &mut out);
        out.extend_from_slice(&3465i32.to_be_bytes());
        named(TAG_STRING, "Status", &mut out);
        out.extend_from_slice(&4u16.to_be_bytes());
        out.extend_from_slice(b"full");
        named(TAG_LIST, "sections", &mut out);
        out.push(TAG_COMPOUND);
        out.extend_from_slice(&1i32.to_be_bytes());
        named(TAG_LONG_ARRAY, "data", &mut out);
        out.extend_from_slice(&2i32.to_be_bytes());
        out.extend_from_slice(&[0xAA; 16]);
        out.push(TAG_END);
        named(TAG_LONG, "InhabitedTime", &mut out);
        out.extend_from_slice(&inhabited.to_be_bytes());
        out.push(TAG_END);
        out
    }

    #[test]
    fn test_finds_long_after_skipping_siblings() {
        let data = chunk_with_noise(42_000);
        assert_eq!(
            find_long(data.as_slice(), &["InhabitedTime"]).unwrap(),
            Some(42_000)
        );
        assert_eq!(find_long(data.as_slice(), &["Level", "InhabitedTime"]).unwrap(), None);
    }

    #[test]
    fn test_nested_path() {
        let mut data = Vec::new();
        named(TAG_COMPOUND, "", &mut data);
        named(TAG_COMPOUND, "Level", &mut data);
        named(TAG_BYTE, "TerrainPopulated", &mut data);
        data.push(1);
        named(TAG_LONG, "InhabitedTime", &mut data);
        data.extend_from_slice(&7i64.to_be_bytes());
        data.push(TAG_END);
        data.push(TAG_END);

        assert_eq!(
            find_long(data.as_slice(), &["Level", "InhabitedTime"]).unwrap(),
            Some(7)
        );
    }

    #[test]
    fn test_truncated_input() {
        let data = chunk_with_noise(1);
        let cut = &data[..data.len() - 6];
        assert!(matches!(
            find_long(cut, &["InhabitedTime"]),
            Err(NbtError::Truncated)
        ));
    }

    #[test]
    fn test_root_must_be_compound() {
        assert!(matches!(
            find_long([TAG_INT, 0, 0].as_slice(), &["x"]),
            Err(NbtError::NotCompound(TAG_INT))
        ));
    }
}
