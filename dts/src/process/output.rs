//! Track registration and sample output.
//!
//! The reader forwards frame bytes and per-frame metadata to a [`TrackOutput`]
//! obtained once, at setup, from an [`ExtractorOutput`]. Both are implemented
//! by the consumer of the reader; [`MemoryExtractorOutput`] and
//! [`MemoryTrackOutput`] keep everything in memory.

use anyhow::Result;

use crate::structs::format::Format;
use crate::utils::errors::ReadError;

/// Metadata of one completed sample (one frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleMetadata {
    /// Presentation time in microseconds, unset if no packet timestamp has
    /// been seen yet.
    pub time_us: Option<i64>,
    /// Every DTS frame is independently decodable, so this is always set.
    pub key_frame: bool,
    /// Sample size in bytes.
    pub size: usize,
    /// Bytes between the end of the sample and the last byte passed to
    /// [`TrackOutput::sample_data`].
    pub offset: usize,
}

/// Receives the output of one track.
pub trait TrackOutput {
    /// Publishes a new format. Called before the first sample and whenever
    /// the stream parameters change.
    fn format(&mut self, format: &Format) -> Result<()>;

    /// Appends bytes to the sample currently being written.
    fn sample_data(&mut self, data: &[u8]) -> Result<()>;

    /// Completes the sample whose bytes were written since the last call.
    fn sample_metadata(&mut self, metadata: SampleMetadata) -> Result<()>;
}

/// Registry handing out a [`TrackOutput`] per track.
pub trait ExtractorOutput {
    type Track: TrackOutput;

    fn track(&mut self, track_id: u32) -> Self::Track;
}

/// Generates track ids and format ids for the elementary streams of one
/// program.
///
/// Format ids are `"<program>/<track>"`, or just the track id when there is
/// no program number.
#[derive(Debug, Clone)]
pub struct TrackIdGenerator {
    format_id_prefix: String,
    first_track_id: u32,
    track_id_increment: u32,
    track_id: Option<u32>,
    format_id: Option<String>,
}

impl TrackIdGenerator {
    pub fn new(program_number: Option<u32>, first_track_id: u32, track_id_increment: u32) -> Self {
        Self {
            format_id_prefix: program_number
                .map(|number| format!("{number}/"))
                .unwrap_or_default(),
            first_track_id,
            track_id_increment,
            track_id: None,
            format_id: None,
        }
    }

    pub fn generate_new_id(&mut self) {
        let track_id = match self.track_id {
            Some(track_id) => track_id + self.track_id_increment,
            None => self.first_track_id,
        };

        self.track_id = Some(track_id);
        self.format_id = Some(format!("{}{track_id}", self.format_id_prefix));
    }

    pub fn track_id(&self) -> Result<u32, ReadError> {
        self.track_id.ok_or(ReadError::TrackIdNotGenerated)
    }

    pub fn format_id(&self) -> Result<&str, ReadError> {
        self.format_id
            .as_deref()
            .ok_or(ReadError::TrackIdNotGenerated)
    }
}

/// Track output that records everything it receives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTrackOutput {
    pub track_id: u32,
    pub formats: Vec<Format>,
    pub data: Vec<u8>,
    pub samples: Vec<SampleMetadata>,
}

impl MemoryTrackOutput {
    pub fn new(track_id: u32) -> Self {
        Self {
            track_id,
            ..Default::default()
        }
    }

    /// Bytes of the completed sample at `index`.
    pub fn sample_bytes(&self, index: usize) -> Option<&[u8]> {
        let size = self.samples.get(index)?.size;
        let start = self.samples[..index]
            .iter()
            .map(|sample| sample.size)
            .sum::<usize>();

        self.data.get(start..start + size)
    }

    /// Bytes written for a sample that has not completed yet.
    pub fn pending_len(&self) -> usize {
        let completed = self.samples.iter().map(|sample| sample.size).sum::<usize>();
        self.data.len() - completed
    }
}

impl TrackOutput for MemoryTrackOutput {
    fn format(&mut self, format: &Format) -> Result<()> {
        self.formats.push(format.clone());
        Ok(())
    }

    fn sample_data(&mut self, data: &[u8]) -> Result<()> {
        self.data.extend_from_slice(data);
        Ok(())
    }

    fn sample_metadata(&mut self, metadata: SampleMetadata) -> Result<()> {
        anyhow::ensure!(
            metadata.size + metadata.offset <= self.pending_len(),
            "sample of {} bytes completed with only {} bytes written",
            metadata.size + metadata.offset,
            self.pending_len()
        );
        self.samples.push(metadata);
        Ok(())
    }
}

/// Registry that records the ids of the tracks it creates.
#[derive(Debug, Default)]
pub struct MemoryExtractorOutput {
    pub track_ids: Vec<u32>,
}

impl ExtractorOutput for MemoryExtractorOutput {
    type Track = MemoryTrackOutput;

    fn track(&mut self, track_id: u32) -> MemoryTrackOutput {
        self.track_ids.push(track_id);
        MemoryTrackOutput::new(track_id)
    }
}

#[test]
fn track_ids_follow_program_and_increment() -> anyhow::Result<()> {
    let mut ids = TrackIdGenerator::new(Some(1), 0x100, 0x2000);
    assert!(matches!(ids.track_id(), Err(ReadError::TrackIdNotGenerated)));
    assert!(ids.format_id().is_err());

    ids.generate_new_id();
    assert_eq!(ids.track_id()?, 0x100);
    assert_eq!(ids.format_id()?, "1/256");

    ids.generate_new_id();
    assert_eq!(ids.track_id()?, 0x2100);
    assert_eq!(ids.format_id()?, "1/8448");

    let mut ids = TrackIdGenerator::new(None, 7, 1);
    ids.generate_new_id();
    assert_eq!(ids.format_id()?, "7");
    Ok(())
}

#[test]
fn memory_output_splits_samples() -> anyhow::Result<()> {
    let mut output = MemoryExtractorOutput::default().track(3);
    output.sample_data(&[1, 2])?;
    output.sample_data(&[3])?;
    assert_eq!(output.pending_len(), 3);

    let metadata = SampleMetadata {
        time_us: None,
        key_frame: true,
        size: 3,
        offset: 0,
    };
    output.sample_metadata(metadata)?;
    output.sample_data(&[4, 5])?;
    output.sample_metadata(SampleMetadata { size: 2, ..metadata })?;

    assert_eq!(output.sample_bytes(0), Some(&[1u8, 2, 3][..]));
    assert_eq!(output.sample_bytes(1), Some(&[4u8, 5][..]));
    assert_eq!(output.sample_bytes(2), None);
    assert_eq!(output.pending_len(), 0);

    assert!(output.sample_metadata(metadata).is_err());
    Ok(())
}
