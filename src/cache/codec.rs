//! Encoding of arrays into compressed blobs.
//!
//! A blob is a gzip stream wrapping a small header (magic, format version,
//! element type, and element count) followed by the elements in little-endian
//! order. The element type and count are checked on the way back in, so an
//! array always decodes to exactly the type and length it was written with.

use std::io;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;

use byteorder::LittleEndian;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

/// The magic bytes at the start of every decompressed blob.
pub const MAGIC: &[u8; 4] = b"FCOV";

/// The current format version.
pub const VERSION: u8 = 1;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to encoding or decoding a blob.
#[derive(Debug)]
pub enum Error {
    /// An I/O error (including a corrupt compressed stream).
    Io(io::Error),

    /// The blob does not start with the expected magic bytes.
    InvalidMagic([u8; 4]),

    /// The blob was written by an unsupported format version.
    UnsupportedVersion(u8),

    /// The blob holds a different element type than requested.
    ElementMismatch {
        /// The requested element type.
        expected: &'static str,

        /// The tag found in the blob.
        found: u8,
    },

    /// The blob declares more elements than it can be held in memory.
    TooLarge(u64),

    /// The blob continues past its declared number of elements.
    TrailingData,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::InvalidMagic(magic) => write!(f, "invalid magic bytes: {magic:?}"),
            Error::UnsupportedVersion(version) => {
                write!(f, "unsupported format version: {version}")
            }
            Error::ElementMismatch { expected, found } => write!(
                f,
                "element type mismatch: expected {expected}, found {}",
                tag_name(*found)
            ),
            Error::TooLarge(count) => write!(f, "declared element count is too large: {count}"),
            Error::TrailingData => write!(f, "data continues past the declared element count"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Elements
////////////////////////////////////////////////////////////////////////////////////////

mod private {
    /// Seals [`Element`](super::Element).
    pub trait Sealed {}

    impl Sealed for u32 {}
    impl Sealed for f32 {}
    impl Sealed for u64 {}
}

/// A type that can be stored in a blob.
pub trait Element: private::Sealed + Copy + Sized {
    /// The tag identifying the element type within a blob.
    const TAG: u8;

    /// The name of the element type.
    const NAME: &'static str;

    /// Writes one element.
    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()>;

    /// Reads one element.
    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self>;
}

impl Element for u32 {
    const TAG: u8 = 1;
    const NAME: &'static str = "u32";

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(*self)
    }

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        reader.read_u32::<LittleEndian>()
    }
}

impl Element for f32 {
    const TAG: u8 = 2;
    const NAME: &'static str = "f32";

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_f32::<LittleEndian>(*self)
    }

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        reader.read_f32::<LittleEndian>()
    }
}

impl Element for u64 {
    const TAG: u8 = 3;
    const NAME: &'static str = "u64";

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u64::<LittleEndian>(*self)
    }

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        reader.read_u64::<LittleEndian>()
    }
}

/// Gets the name of the element type behind a tag.
fn tag_name(tag: u8) -> String {
    if tag == <u32 as Element>::TAG {
        String::from(<u32 as Element>::NAME)
    } else if tag == <f32 as Element>::TAG {
        String::from(<f32 as Element>::NAME)
    } else if tag == <u64 as Element>::TAG {
        String::from(<u64 as Element>::NAME)
    } else {
        format!("unknown tag {tag}")
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Encoding and decoding
////////////////////////////////////////////////////////////////////////////////////////

/// Encodes `values` as a compressed blob into `writer`.
///
/// The writer is returned once the compressed stream has been finished.
pub fn encode<T, W>(values: &[T], writer: W) -> Result<W>
where
    T: Element,
    W: Write,
{
    let mut encoder = GzEncoder::new(writer, Compression::default());

    encoder.write_all(MAGIC)?;
    encoder.write_u8(VERSION)?;
    encoder.write_u8(T::TAG)?;
    encoder.write_u64::<LittleEndian>(values.len() as u64)?;

    for value in values {
        value.write_to(&mut encoder)?;
    }

    Ok(encoder.finish()?)
}

/// Decodes a compressed blob from `reader`.
pub fn decode<T, R>(reader: R) -> Result<Vec<T>>
where
    T: Element,
    R: Read,
{
    let mut decoder = BufReader::new(GzDecoder::new(reader));

    let mut magic = [0u8; 4];
    decoder.read_exact(&mut magic)?;

    if &magic != MAGIC {
        return Err(Error::InvalidMagic(magic));
    }

    let version = decoder.read_u8()?;

    if version != VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    let tag = decoder.read_u8()?;

    if tag != T::TAG {
        return Err(Error::ElementMismatch {
            expected: T::NAME,
            found: tag,
        });
    }

    let count = decoder.read_u64::<LittleEndian>()?;
    let count = usize::try_from(count).map_err(|_| Error::TooLarge(count))?;

    // The declared count is not trusted for the allocation: a corrupt header
    // runs out of data long before it runs out of memory.
    let mut values = Vec::with_capacity(count.min(1 << 20));

    for _ in 0..count {
        values.push(T::read_from(&mut decoder)?);
    }

    let mut rest = [0u8; 1];
    if decoder.read(&mut rest)? != 0 {
        return Err(Error::TrailingData);
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: Element + std::fmt::Debug + PartialEq>(values: Vec<T>) {
        let bytes = encode(&values, Vec::new()).unwrap();
        let decoded = decode::<T, _>(&bytes[..]).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_arrays_survive_compression() {
        roundtrip::<u32>(vec![]);
        roundtrip::<u32>(vec![0; 1_000]);
        roundtrip::<u32>(vec![0, 1, 2, u32::MAX, 7]);
        roundtrip::<f32>(vec![]);
        roundtrip::<f32>(vec![0.0; 1_000]);
        roundtrip::<f32>(vec![0.0, 0.25, 1.5, f32::MAX, f32::MIN_POSITIVE]);
        roundtrip::<u64>(vec![1, 5, 3, 7]);
    }

    #[test]
    fn test_blobs_are_compressed() -> Result<()> {
        let bytes = encode(&vec![0u32; 100_000], Vec::new())?;
        assert!(bytes.len() < 4_000);
        Ok(())
    }

    #[test]
    fn test_decoding_the_wrong_element_type_fails() -> Result<()> {
        let bytes = encode(&[1u32, 2, 3], Vec::new())?;
        let err = decode::<f32, _>(&bytes[..]).unwrap_err();

        assert_eq!(
            err.to_string(),
            "element type mismatch: expected f32, found u32"
        );

        Ok(())
    }

    #[test]
    fn test_truncated_blobs_fail() -> Result<()> {
        let bytes = encode(&[1u32, 2, 3], Vec::new())?;
        assert!(decode::<u32, _>(&bytes[..bytes.len() / 2]).is_err());
        Ok(())
    }

    #[test]
    fn test_foreign_data_fails() -> Result<()> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"JAVA\x01\x01")?;
        let bytes = encoder.finish()?;

        let err = decode::<u32, _>(&bytes[..]).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic(_)));

        let err = decode::<u32, _>(&b"not gzip at all"[..]).unwrap_err();
        assert!(matches!(err, Error::Io(_)));

        Ok(())
    }
}
