use log::{debug, trace};

use crate::process::output::{ExtractorOutput, SampleMetadata, TrackIdGenerator, TrackOutput};
use crate::process::parse::{DtsHeaderDecoder, HeaderDecoder};
use crate::process::scan::{SyncMatch, SyncScanner};
use crate::structs::core::CORE_HEADER_SIZE;
use crate::structs::extss::{EXTSS_HEADER_SIZE_MAX, EXTSS_SIZE_PREFIX_LEN};
use crate::structs::format::{DecodedHeader, Format};
use crate::structs::sync::FrameFamily;
use crate::structs::uhd::{
    FTOC_MAX_HEADER_SIZE, FTOC_MIN_HEADER_SIZE, UHD_DEFAULT_SAMPLE_RATE, UHD_ONLY_SIZE_PREFIX_LEN,
    UHD_SIZE_PREFIX_LEN,
};
use crate::utils::errors::ReadError;
use crate::utils::scratch::ScratchBuffer;
use crate::utils::timing::TimestampTracker;

/// Largest frame accepted, in bytes.
pub const MAX_FRAME_SIZE: usize = 1 << 20;

/// Frame families a reader handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReaderMode {
    /// Core, extension substream and UHD frames.
    #[default]
    Full,
    /// UHD frames only. Everything else is skipped as noise.
    UhdOnly,
}

impl ReaderMode {
    /// Whether a sync word of `family` starts a frame. Non-sync UHD frames
    /// need a preceding sync frame.
    pub fn accepts(&self, family: FrameFamily, uhd_in_sync: bool) -> bool {
        match family {
            FrameFamily::UhdSync => true,
            FrameFamily::UhdNonSync => uhd_in_sync,
            FrameFamily::Core | FrameFamily::ExtensionSubstream => *self == ReaderMode::Full,
        }
    }

    /// Bytes read before the UHD header size is decoded.
    pub fn uhd_size_prefix_len(&self) -> usize {
        match self {
            ReaderMode::Full => UHD_SIZE_PREFIX_LEN,
            ReaderMode::UhdOnly => UHD_ONLY_SIZE_PREFIX_LEN,
        }
    }

    /// Largest header of any accepted family.
    pub fn scratch_capacity(&self) -> usize {
        match self {
            ReaderMode::Full => CORE_HEADER_SIZE
                .max(EXTSS_HEADER_SIZE_MAX)
                .max(FTOC_MAX_HEADER_SIZE),
            ReaderMode::UhdOnly => FTOC_MAX_HEADER_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReaderConfig {
    pub mode: ReaderMode,
    /// Language tag copied into every published format.
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    FindingSync,
    ReadingCoreHeader,
    FindingExtssHeaderSize,
    ReadingExtssHeader,
    FindingUhdHeaderSize,
    ReadingUhdHeader,
    ReadingSample,
}

/// Incremental reader for DTS elementary streams.
///
/// Input arrives in chunks of any size through [`consume`](Self::consume).
/// Complete frames are written to the track output as samples: the frame
/// bytes, header included, followed by the sample metadata. Headers split
/// across chunks are accumulated in a scratch buffer sized once for the
/// largest header of any accepted family; payload bytes go straight from the
/// input to the output.
#[derive(Debug)]
pub struct DtsReader<O, D = DtsHeaderDecoder> {
    config: ReaderConfig,
    decoder: D,
    output: Option<O>,
    format_id: String,
    format: Option<Format>,

    state: ReaderState,
    scanner: SyncScanner,
    scratch: ScratchBuffer,
    family: FrameFamily,
    /// Target length of the header being accumulated.
    header_size: usize,
    /// Bytes of the current frame written to the output.
    bytes_read: usize,
    sample_size: usize,
    sample_duration_us: i64,

    uhd_in_sync: bool,
    uhd_chunk_id: u32,
    uhd_sample_count: u32,
    uhd_sample_rate: u32,

    timestamps: TimestampTracker,
}

impl<O: TrackOutput> DtsReader<O> {
    pub fn new(config: ReaderConfig) -> Self {
        Self::with_decoder(config, DtsHeaderDecoder::default())
    }
}

impl<O: TrackOutput, D: HeaderDecoder> DtsReader<O, D> {
    pub fn with_decoder(config: ReaderConfig, decoder: D) -> Self {
        let scratch = ScratchBuffer::with_capacity(config.mode.scratch_capacity());

        Self {
            config,
            decoder,
            output: None,
            format_id: String::new(),
            format: None,
            state: ReaderState::FindingSync,
            scanner: SyncScanner::default(),
            scratch,
            family: FrameFamily::Core,
            header_size: 0,
            bytes_read: 0,
            sample_size: 0,
            sample_duration_us: 0,
            uhd_in_sync: false,
            uhd_chunk_id: 0,
            uhd_sample_count: 0,
            uhd_sample_rate: UHD_DEFAULT_SAMPLE_RATE,
            timestamps: TimestampTracker::default(),
        }
    }

    /// Registers the audio track. Must be called once before any input is
    /// consumed.
    pub fn create_tracks<E>(
        &mut self,
        extractor_output: &mut E,
        id_generator: &mut TrackIdGenerator,
    ) -> Result<(), ReadError>
    where
        E: ExtractorOutput<Track = O>,
    {
        id_generator.generate_new_id();
        let track_id = id_generator.track_id()?;
        self.format_id = id_generator.format_id()?.to_owned();
        self.output = Some(extractor_output.track(track_id));

        debug!("Created track {track_id} (format id {})", self.format_id);
        Ok(())
    }

    /// Starts an upstream packet. A timestamp, if given, stamps the next frame
    /// to complete.
    pub fn packet_started(&mut self, time_us: Option<i64>) {
        self.timestamps.packet_started(time_us);
    }

    pub fn packet_finished(&mut self, _is_end_of_input: bool) {}

    /// Drops all partial progress after a discontinuity. The published format
    /// is kept.
    pub fn seek(&mut self) {
        self.state = ReaderState::FindingSync;
        self.scanner.reset();
        self.scratch.clear();
        self.header_size = 0;
        self.bytes_read = 0;
        self.sample_size = 0;
        self.sample_duration_us = 0;
        self.uhd_in_sync = false;
        self.uhd_chunk_id = 0;
        self.uhd_sample_count = 0;
        self.uhd_sample_rate = UHD_DEFAULT_SAMPLE_RATE;
        self.timestamps.reset();

        debug!("Seek: reader reset");
    }

    /// Consumes one chunk of the elementary stream.
    ///
    /// Returns once the whole chunk has been buffered or written out. Errors
    /// are not recoverable within the stream; call [`seek`](Self::seek) to
    /// resynchronize.
    pub fn consume(&mut self, data: &[u8]) -> Result<(), ReadError> {
        if self.output.is_none() {
            return Err(ReadError::TracksNotCreated);
        }

        let mut pos = 0;
        while pos < data.len() {
            match self.state {
                ReaderState::FindingSync => self.find_sync(data, &mut pos),
                ReaderState::FindingExtssHeaderSize => {
                    if self.read_header(data, &mut pos, EXTSS_SIZE_PREFIX_LEN) {
                        let size = self.decoder.header_size(self.family, self.scratch.as_slice())?;
                        self.header_size =
                            self.check_header_size(size, EXTSS_SIZE_PREFIX_LEN, EXTSS_HEADER_SIZE_MAX)?;
                        self.state = ReaderState::ReadingExtssHeader;

                        if self.scratch.len() == self.header_size {
                            self.finish_header()?;
                        }
                    }
                }
                ReaderState::FindingUhdHeaderSize => self.find_uhd_header_size(data, &mut pos)?,
                ReaderState::ReadingCoreHeader
                | ReaderState::ReadingExtssHeader
                | ReaderState::ReadingUhdHeader => {
                    if self.read_header(data, &mut pos, self.header_size) {
                        self.finish_header()?;
                    }
                }
                ReaderState::ReadingSample => self.read_sample(data, &mut pos)?,
            }
        }

        Ok(())
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Timestamp the next completed frame will carry.
    pub fn timestamp_us(&self) -> Option<i64> {
        self.timestamps.current()
    }

    /// Last published format.
    pub fn format(&self) -> Option<&Format> {
        self.format.as_ref()
    }

    pub fn output(&self) -> Option<&O> {
        self.output.as_ref()
    }

    pub fn decoder_mut(&mut self) -> &mut D {
        &mut self.decoder
    }

    fn find_sync(&mut self, data: &[u8], pos: &mut usize) {
        let mode = self.config.mode;
        let uhd_in_sync = self.uhd_in_sync;
        let (consumed, found) = self
            .scanner
            .scan(&data[*pos..], |family| mode.accepts(family, uhd_in_sync));
        *pos += consumed;

        let Some(SyncMatch { word, family }) = found else {
            return;
        };
        trace!("Found {family} sync word {word:#010X}");

        self.scratch.seed(word);
        self.family = family;
        self.state = match family {
            FrameFamily::Core => {
                self.header_size = CORE_HEADER_SIZE;
                ReaderState::ReadingCoreHeader
            }
            FrameFamily::ExtensionSubstream => ReaderState::FindingExtssHeaderSize,
            FrameFamily::UhdSync => {
                self.uhd_in_sync = true;
                ReaderState::FindingUhdHeaderSize
            }
            FrameFamily::UhdNonSync => ReaderState::FindingUhdHeaderSize,
        };
    }

    /// Accumulates header bytes up to `target_len`. Returns whether the
    /// target was reached.
    fn read_header(&mut self, data: &[u8], pos: &mut usize, target_len: usize) -> bool {
        *pos += self.scratch.continue_read(&data[*pos..], target_len);
        self.scratch.len() == target_len
    }

    fn find_uhd_header_size(&mut self, data: &[u8], pos: &mut usize) -> Result<(), ReadError> {
        let prefix_len = self.config.mode.uhd_size_prefix_len();
        let read = self.scratch.continue_read(&data[*pos..], prefix_len);
        *pos += read;
        if self.scratch.len() < prefix_len {
            return Ok(());
        }

        let size = self.decoder.header_size(self.family, self.scratch.as_slice())?;
        let size = self.check_header_size(size, FTOC_MIN_HEADER_SIZE, FTOC_MAX_HEADER_SIZE)?;
        self.state = ReaderState::ReadingUhdHeader;

        match self.config.mode {
            ReaderMode::Full => {
                // At most one byte past a minimal header, always taken from
                // this chunk since the prefix just completed.
                let excess = prefix_len.saturating_sub(size);
                debug_assert!(excess <= read);
                if excess > 0 {
                    trace!("Returning {excess} bytes read past the {size} byte UHD header");
                    *pos -= excess;
                    self.scratch.truncate(size);
                }
                self.header_size = size;
            }
            ReaderMode::UhdOnly => {
                self.header_size = size.max(prefix_len);
            }
        }

        if self.scratch.len() == self.header_size {
            self.finish_header()?;
        }

        Ok(())
    }

    fn check_header_size(&self, size: usize, min: usize, max: usize) -> Result<usize, ReadError> {
        let max = max.min(self.scratch.capacity());
        if size < min || size > max {
            return Err(ReadError::HeaderSizeOutOfRange {
                family: self.family,
                size,
                min,
                max,
            });
        }

        Ok(size)
    }

    /// Decodes the buffered header, updates the format and writes the header
    /// as the first bytes of the sample.
    fn finish_header(&mut self) -> Result<(), ReadError> {
        let decoded = self
            .decoder
            .decode(self.family, self.scratch.as_slice(), self.uhd_chunk_id)?;
        self.uhd_chunk_id = decoded.chunk_id;

        let mut geometry = decoded.geometry;
        match self.family {
            FrameFamily::Core => {
                match self.format.as_ref().map(|format| format.matches(&decoded)) {
                    None => self.publish_format(&decoded)?,
                    Some(false) => debug!(
                        "Core header changed to {:?} ch, {:?} Hz; format kept",
                        decoded.channel_count, decoded.sample_rate
                    ),
                    Some(true) => {}
                }
            }
            FrameFamily::ExtensionSubstream => self.update_format(&decoded)?,
            FrameFamily::UhdSync => {
                self.update_format(&decoded)?;
                self.uhd_sample_count = geometry.sample_count;
                self.uhd_sample_rate = geometry.sample_rate;
            }
            FrameFamily::UhdNonSync => {
                geometry.sample_count = self.uhd_sample_count;
                geometry.sample_rate = self.uhd_sample_rate;
            }
        }

        let header_len = self.scratch.len();
        if geometry.frame_size < header_len || geometry.frame_size > MAX_FRAME_SIZE {
            return Err(ReadError::FrameSizeOutOfRange {
                size: geometry.frame_size,
                min: header_len,
                max: MAX_FRAME_SIZE,
            });
        }

        self.sample_size = geometry.frame_size;
        self.sample_duration_us = geometry.duration_us();

        let output = self.output.as_mut().ok_or(ReadError::TracksNotCreated)?;
        output.sample_data(self.scratch.as_slice())?;
        self.bytes_read = header_len;
        self.scratch.clear();
        self.state = ReaderState::ReadingSample;

        if self.bytes_read == self.sample_size {
            self.finish_sample()?;
        }

        Ok(())
    }

    fn read_sample(&mut self, data: &[u8], pos: &mut usize) -> Result<(), ReadError> {
        let to_read = (data.len() - *pos).min(self.sample_size - self.bytes_read);

        let output = self.output.as_mut().ok_or(ReadError::TracksNotCreated)?;
        output.sample_data(&data[*pos..*pos + to_read])?;
        *pos += to_read;
        self.bytes_read += to_read;

        if self.bytes_read == self.sample_size {
            self.finish_sample()?;
        }

        Ok(())
    }

    fn finish_sample(&mut self) -> Result<(), ReadError> {
        let time_us = self.timestamps.complete_frame(self.sample_duration_us);

        let output = self.output.as_mut().ok_or(ReadError::TracksNotCreated)?;
        output.sample_metadata(SampleMetadata {
            time_us,
            key_frame: true,
            size: self.sample_size,
            offset: 0,
        })?;
        trace!(
            "{} frame of {} bytes at {time_us:?} us",
            self.family, self.sample_size
        );

        self.bytes_read = 0;
        self.state = ReaderState::FindingSync;
        Ok(())
    }

    fn update_format(&mut self, decoded: &DecodedHeader) -> Result<(), ReadError> {
        if self
            .format
            .as_ref()
            .is_some_and(|format| format.matches(decoded))
        {
            return Ok(());
        }

        self.publish_format(decoded)
    }

    fn publish_format(&mut self, decoded: &DecodedHeader) -> Result<(), ReadError> {
        let format = Format::from_header(&self.format_id, decoded, self.config.language.as_deref());
        debug!("Publishing format {format}");

        let output = self.output.as_mut().ok_or(ReadError::TracksNotCreated)?;
        output.format(&format)?;
        self.format = Some(format);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::EXAMPLE_CORE_FRAME;
    use crate::process::output::{MemoryExtractorOutput, MemoryTrackOutput};
    use crate::process::test_streams::*;
    use crate::structs::format::{CodecVariant, FrameGeometry};
    use crate::utils::errors::HeaderError;

    type MemoryReader<D = DtsHeaderDecoder> = DtsReader<MemoryTrackOutput, D>;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn reader_with<D: HeaderDecoder>(mode: ReaderMode, decoder: D) -> anyhow::Result<MemoryReader<D>> {
        init_logging();
        let config = ReaderConfig {
            mode,
            language: Some("eng".to_owned()),
        };
        let mut reader = DtsReader::with_decoder(config, decoder);
        let mut extractor = MemoryExtractorOutput::default();
        reader.create_tracks(&mut extractor, &mut TrackIdGenerator::new(Some(1), 256, 8192))?;
        assert_eq!(extractor.track_ids, [256]);

        Ok(reader)
    }

    fn reader(mode: ReaderMode) -> anyhow::Result<MemoryReader> {
        reader_with(mode, DtsHeaderDecoder::default())
    }

    fn feed<D: HeaderDecoder>(
        reader: &mut MemoryReader<D>,
        data: &[u8],
        chunk_len: usize,
    ) -> anyhow::Result<()> {
        for chunk in data.chunks(chunk_len) {
            reader.consume(chunk)?;
        }
        Ok(())
    }

    fn output<D: HeaderDecoder>(reader: &MemoryReader<D>) -> &MemoryTrackOutput {
        reader.output().unwrap()
    }

    fn sizes(output: &MemoryTrackOutput) -> Vec<usize> {
        output.samples.iter().map(|sample| sample.size).collect()
    }

    /// Frames of every family, including a 5-byte UHD frame shorter than the
    /// UHD size prefix.
    fn mixed_stream() -> Vec<u8> {
        let mut stream = EXAMPLE_CORE_FRAME.to_vec();
        stream.extend(extss_frame(&ExtssFrame::default()));
        stream.extend(uhd_sync_frame(&UhdSyncFrame::default()));
        stream.extend(uhd_non_sync_frame(8, Some(50)));
        stream.extend(uhd_sync_frame(&UhdSyncFrame {
            chunk_id: 0,
            ..Default::default()
        }));
        stream.extend(uhd_non_sync_frame(5, None));
        stream.extend_from_slice(EXAMPLE_CORE_FRAME);
        stream
    }

    #[test]
    fn mixed_stream_in_one_chunk() -> anyhow::Result<()> {
        let stream = mixed_stream();
        let mut reader = reader(ReaderMode::Full)?;
        reader.packet_started(Some(0));
        reader.consume(&stream)?;

        let output = output(&reader);
        assert_eq!(sizes(output), [96, 64, 124, 58, 24, 5, 96]);
        assert_eq!(output.data, stream);
        assert_eq!(output.pending_len(), 0);
        assert!(output.samples.iter().all(|sample| sample.key_frame));

        let times = output
            .samples
            .iter()
            .map(|sample| sample.time_us)
            .collect::<Vec<_>>();
        let expected: [Option<i64>; 7] =
            [0, 10_666, 21_332, 41_332, 61_332, 81_332, 101_332].map(Some);
        assert_eq!(times, expected);
        assert_eq!(reader.timestamp_us(), Some(111_998));

        let codecs = output
            .formats
            .iter()
            .map(|format| format.codec)
            .collect::<Vec<_>>();
        assert_eq!(
            codecs,
            [
                CodecVariant::Dts,
                CodecVariant::DtsExpress,
                CodecVariant::DtsUhd
            ]
        );
        assert_eq!(output.formats[0].id, "1/256");
        assert_eq!(output.formats[0].language.as_deref(), Some("eng"));
        assert_eq!(reader.state(), ReaderState::FindingSync);
        Ok(())
    }

    #[test]
    fn chunk_boundaries_do_not_matter() -> anyhow::Result<()> {
        let stream = mixed_stream();

        let mut whole = reader(ReaderMode::Full)?;
        whole.packet_started(Some(500));
        whole.consume(&stream)?;

        for chunk_len in [1, 2, 3, 5, 6, 7, 13, 64, 97] {
            let mut chunked = reader(ReaderMode::Full)?;
            chunked.packet_started(Some(500));
            feed(&mut chunked, &stream, chunk_len)?;

            assert_eq!(output(&chunked), output(&whole), "chunk length {chunk_len}");
        }
        Ok(())
    }

    #[test]
    fn noise_before_first_sync_is_skipped() -> anyhow::Result<()> {
        let stream = mixed_stream();
        let mut noisy = payload(37, 5);
        noisy.extend_from_slice(&stream);

        let mut clean = reader(ReaderMode::Full)?;
        clean.consume(&stream)?;

        let mut reader = reader(ReaderMode::Full)?;
        feed(&mut reader, &noisy, 11)?;
        assert_eq!(output(&reader), output(&clean));
        Ok(())
    }

    #[test]
    fn uhd_over_read_is_returned_to_input() -> anyhow::Result<()> {
        let sync = uhd_sync_frame(&UhdSyncFrame {
            chunk_id: 0,
            ..Default::default()
        });
        let short = uhd_non_sync_frame(5, None);
        let mut stream = sync.clone();
        stream.extend_from_slice(&short);
        stream.extend_from_slice(EXAMPLE_CORE_FRAME);

        // 29 puts the over-read byte at the start of a chunk
        for chunk_len in [1, 6, 28, 29, 30, stream.len()] {
            let mut reader = reader(ReaderMode::Full)?;
            feed(&mut reader, &stream, chunk_len)?;

            let output = output(&reader);
            assert_eq!(sizes(output), [sync.len(), 5, 96], "chunk length {chunk_len}");
            assert_eq!(output.sample_bytes(1), Some(&short[..]));
            assert_eq!(output.data.len(), stream.len());
        }
        Ok(())
    }

    #[test]
    fn format_republished_only_on_change() -> anyhow::Result<()> {
        let stereo = extss_frame(&ExtssFrame::default());
        let surround = extss_frame(&ExtssFrame {
            channel_count: 6,
            ..Default::default()
        });
        let mut reader = reader(ReaderMode::Full)?;

        for _ in 0..3 {
            reader.consume(&stereo)?;
        }
        assert_eq!(output(&reader).formats.len(), 1);

        reader.consume(&surround)?;
        reader.consume(&surround)?;
        let formats = &output(&reader).formats;
        assert_eq!(formats.len(), 2);
        assert_eq!(formats[1].channel_count, Some(6));
        assert_eq!(reader.format(), formats.last());
        Ok(())
    }

    #[test]
    fn core_format_is_published_once() -> anyhow::Result<()> {
        let mut reader = reader(ReaderMode::Full)?;
        reader.consume(EXAMPLE_CORE_FRAME)?;
        reader.consume(&core_frame(128, 15, 2, 8, 0))?;

        let output = output(&reader);
        assert_eq!(sizes(output), [96, 128]);
        assert_eq!(output.formats.len(), 1);
        assert_eq!(output.formats[0].channel_count, Some(6));
        Ok(())
    }

    #[test]
    fn timestamps_extrapolate_from_packet_start() -> anyhow::Result<()> {
        let mut reader = reader(ReaderMode::Full)?;
        reader.consume(&extss_frame(&ExtssFrame::default()))?;
        assert_eq!(output(&reader).samples[0].time_us, None);

        reader.packet_started(Some(1_000));
        for duration_code in 0..3 {
            reader.consume(&extss_frame(&ExtssFrame {
                duration_code,
                ..Default::default()
            }))?;
        }
        reader.packet_finished(false);

        let times = output(&reader).samples[1..]
            .iter()
            .map(|sample| sample.time_us)
            .collect::<Vec<_>>();
        assert_eq!(times, [Some(1_000), Some(11_666), Some(32_999)]);
        assert_eq!(reader.timestamp_us(), Some(64_999));
        Ok(())
    }

    #[test]
    fn seek_discards_partial_header() -> anyhow::Result<()> {
        let frame = extss_frame(&ExtssFrame::default());
        let mut reader = reader(ReaderMode::Full)?;
        reader.packet_started(Some(42));

        reader.consume(&frame[..10])?;
        assert_eq!(reader.state(), ReaderState::ReadingExtssHeader);
        reader.seek();
        assert_eq!(reader.state(), ReaderState::FindingSync);
        assert_eq!(reader.timestamp_us(), None);

        reader.consume(&frame)?;
        reader.seek();
        reader.consume(&frame)?;

        let output = output(&reader);
        assert_eq!(sizes(output), [64, 64]);
        assert_eq!(output.data, [frame.clone(), frame].concat());
        assert_eq!(output.samples[0].time_us, None);
        assert_eq!(output.formats.len(), 1);
        Ok(())
    }

    #[test]
    fn seek_requires_new_uhd_sync_frame() -> anyhow::Result<()> {
        let sync = uhd_sync_frame(&UhdSyncFrame::default());
        let non_sync = uhd_non_sync_frame(8, Some(50));
        let mut reader = reader(ReaderMode::Full)?;

        reader.consume(&sync)?;
        reader.consume(&non_sync)?;
        reader.seek();
        reader.consume(&non_sync)?;
        reader.consume(&sync)?;

        assert_eq!(sizes(output(&reader)), [124, 58, 124]);
        Ok(())
    }

    #[test]
    fn uhd_only_mode() -> anyhow::Result<()> {
        let sync = uhd_sync_frame(&UhdSyncFrame::default());
        let non_sync = uhd_non_sync_frame(8, Some(50));
        let mut stream = non_sync.clone();
        stream.extend_from_slice(EXAMPLE_CORE_FRAME);
        stream.extend(extss_frame(&ExtssFrame::default()));
        stream.extend_from_slice(&sync);
        stream.extend_from_slice(&non_sync);

        for chunk_len in [1, 7, stream.len()] {
            let mut reader = reader(ReaderMode::UhdOnly)?;
            reader.packet_started(Some(0));
            feed(&mut reader, &stream, chunk_len)?;

            let output = output(&reader);
            assert_eq!(sizes(output), [124, 58]);
            assert_eq!(output.data, [sync.clone(), non_sync.clone()].concat());
            assert_eq!(output.formats.len(), 1);
            assert_eq!(output.samples[1].time_us, Some(20_000));
        }
        Ok(())
    }

    #[test]
    fn uhd_only_rejects_frames_shorter_than_size_prefix() -> anyhow::Result<()> {
        let mut stream = uhd_sync_frame(&UhdSyncFrame {
            chunk_id: 0,
            ..Default::default()
        });
        stream.extend(uhd_non_sync_frame(5, None));
        stream.extend_from_slice(EXAMPLE_CORE_FRAME);

        let mut reader = reader(ReaderMode::UhdOnly)?;
        assert!(matches!(
            reader.consume(&stream),
            Err(ReadError::FrameSizeOutOfRange { size: 5, min: 7, .. })
        ));
        Ok(())
    }

    /// Decodes every header as an 18-byte core header of a fixed frame.
    struct FixedDecoder {
        frame_size: usize,
        sample_count: u32,
    }

    impl HeaderDecoder for FixedDecoder {
        fn header_size(&self, _: FrameFamily, _: &[u8]) -> Result<usize, HeaderError> {
            Ok(CORE_HEADER_SIZE)
        }

        fn decode(
            &self,
            family: FrameFamily,
            header: &[u8],
            chunk_id: u32,
        ) -> Result<DecodedHeader, HeaderError> {
            assert_eq!(family, FrameFamily::Core);
            assert_eq!(header.len(), CORE_HEADER_SIZE);

            Ok(DecodedHeader {
                codec: CodecVariant::Dts,
                channel_count: Some(2),
                sample_rate: Some(48_000),
                bitrate: None,
                geometry: FrameGeometry {
                    frame_size: self.frame_size,
                    sample_count: self.sample_count,
                    sample_rate: 48_000,
                },
                chunk_id,
            })
        }
    }

    #[test]
    fn frame_delivered_in_three_chunks() -> anyhow::Result<()> {
        let decoder = FixedDecoder {
            frame_size: 40,
            sample_count: 100,
        };
        let mut reader = reader_with(ReaderMode::Full, decoder)?;
        let mut frame = EXAMPLE_CORE_FRAME[..CORE_HEADER_SIZE].to_vec();
        frame.extend(payload(22, 0));

        reader.packet_started(Some(1_000_000));
        reader.consume(&frame[..10])?;
        assert_eq!(reader.state(), ReaderState::ReadingCoreHeader);
        reader.consume(&frame[10..15])?;
        reader.consume(&frame[15..])?;

        let output = output(&reader);
        assert_eq!(
            output.samples,
            [SampleMetadata {
                time_us: Some(1_000_000),
                key_frame: true,
                size: 40,
                offset: 0,
            }]
        );
        assert_eq!(output.data, frame);
        assert_eq!(reader.timestamp_us(), Some(1_002_083));
        Ok(())
    }

    #[test]
    fn header_only_frame_completes_at_chunk_end() -> anyhow::Result<()> {
        let decoder = FixedDecoder {
            frame_size: CORE_HEADER_SIZE,
            sample_count: 0,
        };
        let mut reader = reader_with(ReaderMode::Full, decoder)?;
        reader.consume(&EXAMPLE_CORE_FRAME[..CORE_HEADER_SIZE])?;

        assert_eq!(sizes(output(&reader)), [CORE_HEADER_SIZE]);
        assert_eq!(reader.state(), ReaderState::FindingSync);
        Ok(())
    }

    #[test]
    fn frame_size_out_of_range() -> anyhow::Result<()> {
        for frame_size in [0, 17, MAX_FRAME_SIZE + 1] {
            let decoder = FixedDecoder {
                frame_size,
                sample_count: 0,
            };
            let mut reader = reader_with(ReaderMode::Full, decoder)?;
            assert!(matches!(
                reader.consume(EXAMPLE_CORE_FRAME),
                Err(ReadError::FrameSizeOutOfRange { size, .. }) if size == frame_size
            ));
        }
        Ok(())
    }

    #[test]
    fn extss_header_size_below_prefix() -> anyhow::Result<()> {
        let mut reader = reader(ReaderMode::Full)?;
        let prefix = [0x64, 0x58, 0x20, 0x25, 0x00, 0x00, 0xA0, 0x00];
        assert!(matches!(
            reader.consume(&prefix),
            Err(ReadError::HeaderSizeOutOfRange {
                family: FrameFamily::ExtensionSubstream,
                size: 6,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn corrupt_ftoc_is_a_header_error() -> anyhow::Result<()> {
        let mut frame = uhd_sync_frame(&UhdSyncFrame::default());
        frame[10] ^= 0x01;

        let mut reader = reader(ReaderMode::Full)?;
        assert!(matches!(
            reader.consume(&frame),
            Err(ReadError::Header(HeaderError::FtocCrcMismatch(_)))
        ));
        Ok(())
    }

    #[test]
    fn consume_requires_tracks() {
        let mut reader = MemoryReader::new(ReaderConfig::default());
        assert!(matches!(
            reader.consume(EXAMPLE_CORE_FRAME),
            Err(ReadError::TracksNotCreated)
        ));
        assert!(reader.output().is_none());
    }

    #[test]
    fn scratch_capacity_by_mode() {
        assert_eq!(ReaderMode::Full.scratch_capacity(), FTOC_MAX_HEADER_SIZE);
        assert_eq!(ReaderMode::UhdOnly.scratch_capacity(), FTOC_MAX_HEADER_SIZE);
        assert!(!ReaderMode::UhdOnly.accepts(FrameFamily::Core, true));
        assert!(!ReaderMode::Full.accepts(FrameFamily::UhdNonSync, false));
        assert!(ReaderMode::Full.accepts(FrameFamily::UhdNonSync, true));
    }
}
