use log::trace;

use crate::structs::core::{CORE_HEADER_SIZE, CoreHeader};
use crate::structs::extss::{self, ExtssHeader};
use crate::structs::format::DecodedHeader;
use crate::structs::sync::FrameFamily;
use crate::structs::uhd::{self, FtocHeader};
use crate::utils::errors::HeaderError;

/// Decodes frame headers for the reader.
///
/// The reader owns no knowledge of header layouts: it asks the decoder how
/// long a header is and, once the header is buffered, what it describes.
pub trait HeaderDecoder {
    /// Total header size for a frame of `family`, given the bytes accumulated
    /// so far. These are the sync word alone for core frames and a fixed size
    /// prefix for the variable-length families.
    fn header_size(&self, family: FrameFamily, prefix: &[u8]) -> Result<usize, HeaderError>;

    /// Decodes a complete header. `chunk_id` is the UHD audio chunk id carried
    /// from the previous frame; the returned header holds the id to carry on.
    fn decode(
        &self,
        family: FrameFamily,
        header: &[u8],
        chunk_id: u32,
    ) -> Result<DecodedHeader, HeaderError>;
}

/// Decoder for the standard DTS, DTS-HD and DTS:X header layouts.
#[derive(Debug, Default)]
pub struct DtsHeaderDecoder {
    state: ParserState,
}

impl DtsHeaderDecoder {
    /// Sets the failure level for validation errors.
    ///
    /// - `log::Level::Error`: Only fail on Error level messages (default)
    /// - `log::Level::Warn`: Fail on Warning level and above (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.state.fail_level = level;
    }
}

impl HeaderDecoder for DtsHeaderDecoder {
    fn header_size(&self, family: FrameFamily, prefix: &[u8]) -> Result<usize, HeaderError> {
        let size = match family {
            FrameFamily::Core => CORE_HEADER_SIZE,
            FrameFamily::ExtensionSubstream => extss::read_header_size(prefix)?,
            FrameFamily::UhdSync | FrameFamily::UhdNonSync => uhd::read_header_size(prefix)?,
        };
        trace!("{family} header size {size}");

        Ok(size)
    }

    fn decode(
        &self,
        family: FrameFamily,
        header: &[u8],
        chunk_id: u32,
    ) -> Result<DecodedHeader, HeaderError> {
        let decoded = match family {
            FrameFamily::Core => CoreHeader::read(&self.state, header)?.decoded(chunk_id),
            FrameFamily::ExtensionSubstream => {
                ExtssHeader::read(&self.state, header)?.decoded(chunk_id)
            }
            FrameFamily::UhdSync | FrameFamily::UhdNonSync => {
                FtocHeader::read(&self.state, header, chunk_id)?.decoded()
            }
        };

        Ok(decoded)
    }
}

/// Validation settings shared by the header readers.
#[derive(Debug, Clone)]
pub struct ParserState {
    pub fail_level: log::Level,
}

impl Default for ParserState {
    fn default() -> Self {
        Self {
            fail_level: log::Level::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::EXAMPLE_CORE_FRAME;
    use crate::process::test_streams::{ExtssFrame, UhdSyncFrame, extss_frame, uhd_sync_frame};
    use crate::structs::format::CodecVariant;

    #[test]
    fn dispatch_by_family() -> anyhow::Result<()> {
        let decoder = DtsHeaderDecoder::default();

        let size = decoder.header_size(FrameFamily::Core, &EXAMPLE_CORE_FRAME[..4])?;
        let core = decoder.decode(FrameFamily::Core, &EXAMPLE_CORE_FRAME[..size], 0)?;
        assert_eq!(core.codec, CodecVariant::Dts);
        assert_eq!(core.geometry.frame_size, 96);

        let frame = extss_frame(&ExtssFrame::default());
        let size = decoder.header_size(FrameFamily::ExtensionSubstream, &frame[..7])?;
        let extss = decoder.decode(FrameFamily::ExtensionSubstream, &frame[..size], 1)?;
        assert_eq!(extss.codec, CodecVariant::DtsExpress);
        assert_eq!(extss.chunk_id, 1);

        let frame = uhd_sync_frame(&UhdSyncFrame::default());
        let size = decoder.header_size(FrameFamily::UhdSync, &frame[..6])?;
        let uhd = decoder.decode(FrameFamily::UhdSync, &frame[..size], 0)?;
        assert_eq!(uhd.codec, CodecVariant::DtsUhd);
        assert_eq!(uhd.geometry.frame_size, frame.len());
        Ok(())
    }

    #[test]
    fn strict_mode_rejects_warnings() -> anyhow::Result<()> {
        let mut decoder = DtsHeaderDecoder::default();
        let frame = crate::process::test_streams::core_frame(64, 15, 2, 13, 0);
        decoder.decode(FrameFamily::Core, &frame[..CORE_HEADER_SIZE], 0)?;

        decoder.set_fail_level(log::Level::Warn);
        assert!(matches!(
            decoder.decode(FrameFamily::Core, &frame[..CORE_HEADER_SIZE], 0),
            Err(HeaderError::CoreFrameSizeTooLow(63))
        ));
        Ok(())
    }
}
