//! DTS:X (UHD) frame table of contents.
//!
//! Every UHD frame starts with an FTOC. Sync frames carry the stream
//! parameters and a CRC; non-sync frames only carry chunk sizes and rely on
//! the audio chunk id of the preceding frames.

use crate::process::parse::ParserState;
use crate::structs::format::{CodecVariant, DecodedHeader, FrameGeometry};
use crate::structs::sync::{FrameFamily, SYNC_FTOC, SYNC_FTOC_NON_SYNC};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::crc::Crc16Ccitt;
use crate::utils::errors::HeaderError;

/// Largest FTOC the header size field can describe.
pub const FTOC_MAX_HEADER_SIZE: usize = 5408;

/// Smallest FTOC that covers its own size field.
pub const FTOC_MIN_HEADER_SIZE: usize = 5;

/// Bytes read before the header size is decoded. The widest size field ends
/// in the sixth byte.
pub const UHD_SIZE_PREFIX_LEN: usize = 6;

/// Size prefix of a reader that only handles UHD frames.
pub const UHD_ONLY_SIZE_PREFIX_LEN: usize = 7;

/// Sample rate assumed for non-sync frames until a sync frame is seen.
pub const UHD_DEFAULT_SAMPLE_RATE: u32 = 48_000;

const HEADER_SIZE_WIDTHS: [u32; 4] = [5, 8, 10, 12];
const METADATA_CHUNK_SIZE_WIDTHS: [u32; 4] = [6, 9, 12, 15];
const AUDIO_CHUNK_ID_WIDTHS: [u32; 4] = [2, 4, 6, 8];
const AUDIO_CHUNK_SIZE_WIDTHS: [u32; 4] = [9, 11, 13, 16];

const BASE_DURATION_BY_INDEX: [u32; 3] = [512, 480, 384];
const CLOCK_RATE_BY_INDEX: [u32; 3] = [32000, 44100, 48000];

fn read_sync(reader: &mut BsIoSliceReader) -> Result<bool, HeaderError> {
    match reader.get_n::<u32>(32)? {
        SYNC_FTOC => Ok(true),
        SYNC_FTOC_NON_SYNC => Ok(false),
        word => Err(HeaderError::InvalidSyncWord(word)),
    }
}

fn read_size_field(reader: &mut BsIoSliceReader) -> Result<usize, HeaderError> {
    let size = reader.get_unsigned_var_int(&HEADER_SIZE_WIDTHS, true)? as usize + 1;
    let min = reader.position()?.div_ceil(8) as usize;
    if size < min {
        return Err(HeaderError::UhdHeaderSizeTooSmall { size, min });
    }

    Ok(size)
}

/// Reads the FTOC size from the first bytes of a sync or non-sync frame.
pub fn read_header_size(prefix: &[u8]) -> Result<usize, HeaderError> {
    let reader = &mut BsIoSliceReader::from_slice(prefix);
    read_sync(reader)?;

    read_size_field(reader)
}

/// Stream parameters carried by sync frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UhdTiming {
    pub sample_rate: u32,
    pub sample_count: u32,
}

#[derive(Debug, Clone)]
pub struct FtocHeader {
    pub header_size: usize,
    /// Set on sync frames only.
    pub timing: Option<UhdTiming>,
    pub metadata_chunk_size: usize,
    pub audio_chunk_id: u32,
    pub audio_chunk_size: usize,
}

impl FtocHeader {
    /// Reads an FTOC. `chunk_id` is the audio chunk id in effect from the
    /// previous frame; non-sync frames keep it.
    pub fn read(_state: &ParserState, header: &[u8], chunk_id: u32) -> Result<Self, HeaderError> {
        let reader = &mut BsIoSliceReader::from_slice(header);
        let sync_frame = read_sync(reader)?;
        let header_size = read_size_field(reader)?;

        if header.len() < header_size {
            let family = if sync_frame {
                FrameFamily::UhdSync
            } else {
                FrameFamily::UhdNonSync
            };
            return Err(HeaderError::Truncated {
                family,
                len: header.len(),
                min: header_size,
            });
        }

        let mut timing = None;
        let mut metadata_chunk_size = 0;
        let mut audio_chunk_id = chunk_id;

        if sync_frame {
            let residue = Crc16Ccitt::checksum(&header[..header_size]);
            if residue != 0 {
                return Err(HeaderError::FtocCrcMismatch(residue));
            }

            timing = Some(Self::read_stream_parameters(reader)?);
            metadata_chunk_size =
                reader.get_unsigned_var_int(&METADATA_CHUNK_SIZE_WIDTHS, true)? as usize;
            audio_chunk_id = reader.get_unsigned_var_int(&AUDIO_CHUNK_ID_WIDTHS, true)?;
        }

        let audio_chunk_size = if audio_chunk_id != 0 {
            reader.get_unsigned_var_int(&AUDIO_CHUNK_SIZE_WIDTHS, true)? as usize
        } else {
            0
        };

        Ok(Self {
            header_size,
            timing,
            metadata_chunk_size,
            audio_chunk_id,
            audio_chunk_size,
        })
    }

    fn read_stream_parameters(reader: &mut BsIoSliceReader) -> Result<UhdTiming, HeaderError> {
        if !reader.get()? {
            return Err(HeaderError::PartialChannelMix);
        }

        let index = reader.get_n::<u8>(2)?;
        let base_duration = *BASE_DURATION_BY_INDEX
            .get(index as usize)
            .ok_or(HeaderError::InvalidBaseDuration(index))?;
        let frame_duration = base_duration * (reader.get_n::<u32>(3)? + 1);

        let index = reader.get_n::<u8>(2)?;
        let clock_rate = *CLOCK_RATE_BY_INDEX
            .get(index as usize)
            .ok_or(HeaderError::InvalidClockRate(index))?;

        // Timestamp
        if reader.get()? {
            reader.skip_n(32 + 4)?;
        }

        let multiplier = 1 << reader.get_n::<u32>(2)?;

        Ok(UhdTiming {
            sample_rate: clock_rate * multiplier,
            sample_count: frame_duration * multiplier,
        })
    }

    pub fn is_sync_frame(&self) -> bool {
        self.timing.is_some()
    }

    pub fn frame_size(&self) -> usize {
        self.header_size + self.metadata_chunk_size + self.audio_chunk_size
    }

    pub fn decoded(&self) -> DecodedHeader {
        let timing = self.timing.unwrap_or(UhdTiming {
            sample_rate: 0,
            sample_count: 0,
        });

        DecodedHeader {
            codec: CodecVariant::DtsUhd,
            channel_count: Some(2),
            sample_rate: self.timing.map(|timing| timing.sample_rate),
            bitrate: None,
            geometry: FrameGeometry {
                frame_size: self.frame_size(),
                sample_count: timing.sample_count,
                sample_rate: timing.sample_rate,
            },
            chunk_id: self.audio_chunk_id,
        }
    }
}
