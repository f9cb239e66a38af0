//! Bitstream I/O utilities for header parsing.
//!
//! Provides a bounds-checked big-endian bit reader over header bytes, the
//! variable-length integer coding used by UHD frame headers, and normalization
//! of little-endian and 14-bit core frames to plain big-endian 16-bit words.

use std::borrow::Cow;
use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter, UnsignedInteger};

/// Big-endian bit reader over a header held in memory.
///
/// Reads and skips past the end of the slice fail with `UnexpectedEof`.
#[derive(Debug)]
pub struct BsIoSliceReader<'a> {
    bits: BitReader<io::Cursor<&'a [u8]>, BigEndian>,
    len_bits: u64,
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self {
            bits: BitReader::new(io::Cursor::new(buf)),
            len_bits: buf.len() as u64 * 8,
        }
    }

    fn ensure_available(&mut self, op: &str, n: u32) -> io::Result<()> {
        let pos = self.position()?;
        if pos + u64::from(n) > self.len_bits {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{op}({n}) at bit {pos} of {}", self.len_bits),
            ));
        }

        Ok(())
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        self.ensure_available("get", 1)?;
        self.bits.read_bit()
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        self.ensure_available("get_n", n)?;
        self.bits.read_unsigned_var(n)
    }

    /// Reads an unsigned integer whose width is chosen by a unary prefix of up
    /// to three set bits.
    ///
    /// With `add_offsets`, the value ranges of the narrower widths are stacked
    /// below the selected one so that every code has a unique value.
    pub fn get_unsigned_var_int(&mut self, widths: &[u32; 4], add_offsets: bool) -> io::Result<u32> {
        let mut index = 0;
        while index < 3 && self.get()? {
            index += 1;
        }

        let offset = if add_offsets {
            widths[..index].iter().map(|&width| 1u32 << width).sum()
        } else {
            0
        };

        Ok(offset + self.get_n::<u32>(widths[index])?)
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u32) -> io::Result<()> {
        self.ensure_available("skip_n", n)?;
        self.bits.skip(n)
    }

    /// Bits read so far.
    #[inline(always)]
    pub fn position(&mut self) -> io::Result<u64> {
        self.bits.position_in_bits()
    }
}

/// Converts a core frame header to big-endian 16-bit word layout.
///
/// Little-endian frames (first byte `0xFE` or `0xFF`) get each 16-bit word
/// byte-swapped. 14-bit frames (first byte `0x1F` once big-endian) carry 14
/// payload bits per 16-bit word; the two most significant bits of every word
/// are dropped and the rest packed back to back. A trailing odd byte is
/// discarded in both conversions.
pub fn normalize_frame(frame: &[u8]) -> io::Result<Cow<'_, [u8]>> {
    let little_endian = matches!(frame.first(), Some(0xFE | 0xFF));
    let fourteen_bit = matches!(frame.first(), Some(0x1F | 0xFF));

    if !little_endian && !fourteen_bit {
        return Ok(Cow::Borrowed(frame));
    }

    let words = frame.chunks_exact(2).map(|pair| {
        if little_endian {
            u16::from_le_bytes([pair[0], pair[1]])
        } else {
            u16::from_be_bytes([pair[0], pair[1]])
        }
    });

    if !fourteen_bit {
        return Ok(Cow::Owned(words.flat_map(u16::to_be_bytes).collect()));
    }

    let mut writer = BitWriter::<Vec<u8>, BigEndian>::new(Vec::with_capacity(frame.len()));
    for word in words {
        writer.write_unsigned_var(14, word & 0x3FFF)?;
    }
    writer.byte_align()?;

    Ok(Cow::Owned(writer.into_writer()))
}

#[test]
fn unsigned_var_int_offsets() -> anyhow::Result<()> {
    const WIDTHS: [u32; 4] = [2, 4, 6, 8];

    // 0b0_11: index 0, value 3
    let mut reader = BsIoSliceReader::from_slice(&[0b0110_0000]);
    assert_eq!(reader.get_unsigned_var_int(&WIDTHS, true)?, 3);

    // 0b10_0001: index 1, value 1 + (1 << 2)
    let mut reader = BsIoSliceReader::from_slice(&[0b1000_0100]);
    assert_eq!(reader.get_unsigned_var_int(&WIDTHS, true)?, 5);

    let mut reader = BsIoSliceReader::from_slice(&[0b1000_0100]);
    assert_eq!(reader.get_unsigned_var_int(&WIDTHS, false)?, 1);

    // 0b111 then 8 bits: index 3 with all three narrower ranges stacked below
    let mut reader = BsIoSliceReader::from_slice(&[0b1110_0000, 0b0100_0000]);
    assert_eq!(reader.get_unsigned_var_int(&WIDTHS, true)?, 4 + 16 + 64 + 2);
    Ok(())
}

#[test]
fn skip_past_end_is_an_error() {
    let mut reader = BsIoSliceReader::from_slice(&[0xAA, 0x55]);
    assert!(reader.skip_n(12).is_ok());
    assert!(reader.skip_n(5).is_err());
}

#[test]
fn normalize_word_modes() -> anyhow::Result<()> {
    let be16 = [0x7F, 0xFE, 0x80, 0x01, 0x12, 0x34];
    assert!(matches!(normalize_frame(&be16)?, Cow::Borrowed(_)));

    let le16 = [0xFE, 0x7F, 0x01, 0x80, 0x34, 0x12];
    assert_eq!(&*normalize_frame(&le16)?, &be16[..]);

    // 14-bit words 0x1FFF 0xE800 0x07F1 0x0000 carry the 32-bit sync word
    let be14 = [0x1F, 0xFF, 0xE8, 0x00, 0x07, 0xF1, 0x00, 0x00];
    let normalized = normalize_frame(&be14)?;
    assert_eq!(&normalized[..4], &[0x7F, 0xFE, 0x80, 0x01]);
    assert_eq!(normalized.len(), 7);

    let le14 = [0xFF, 0x1F, 0x00, 0xE8, 0xF1, 0x07, 0x00, 0x00];
    assert_eq!(normalize_frame(&le14)?, normalized);
    Ok(())
}
