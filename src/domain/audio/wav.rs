//! RIFF/WAVE packaging for mono 16-bit PCM, and the matching reader used for
//! engine output.

use std::io::Cursor;

const RIFF_HEADER_LEN: u32 = 44;
const PCM_FORMAT: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const CHANNELS: u16 = 1;

#[derive(Debug, thiserror::Error)]
pub enum WavError {
    #[error("failed to parse WAV: {0}")]
    Parse(#[from] hound::Error),
    #[error("unsupported sample format {format:?} with {bits} bits per sample")]
    UnsupportedFormat {
        format: hound::SampleFormat,
        bits: u16,
    },
}

/// Samples as they were stored in the container.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    Int16(Vec<i16>),
    Float32(Vec<f32>),
}

impl SampleBuffer {
    pub fn len(&self) -> usize {
        match self {
            Self::Int16(samples) => samples.len(),
            Self::Float32(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coerce to signed 16-bit PCM. Float samples are treated as normalized
    /// to [-1.0, 1.0] and clamped.
    pub fn into_i16(self) -> Vec<i16> {
        match self {
            Self::Int16(samples) => samples,
            Self::Float32(samples) => samples
                .into_iter()
                .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedWav {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: SampleBuffer,
}

/// Encode mono 16-bit PCM samples as a complete WAV byte stream.
///
/// Pure: identical input always yields byte-identical output.
pub fn encode_wav(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = sample_rate.saturating_mul(block_align as u32);
    let data_size = u32::try_from(samples.len() * block_align as usize).unwrap_or(u32::MAX);
    let riff_size = data_size.saturating_add(RIFF_HEADER_LEN - 8);

    let mut wav = Vec::with_capacity(RIFF_HEADER_LEN as usize + data_size as usize);

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&riff_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    wav.extend_from_slice(&CHANNELS.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }

    wav
}

/// Decode a WAV byte stream holding 16-bit PCM or 32-bit float samples.
///
/// Multi-channel streams are returned interleaved; callers decide whether they
/// accept them.
pub fn decode_wav(bytes: &[u8]) -> Result<DecodedWav, WavError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => {
            SampleBuffer::Int16(reader.samples::<i16>().collect::<Result<_, _>>()?)
        }
        (hound::SampleFormat::Float, 32) => {
            SampleBuffer::Float32(reader.samples::<f32>().collect::<Result<_, _>>()?)
        }
        (format, bits) => return Err(WavError::UnsupportedFormat { format, bits }),
    };

    Ok(DecodedWav {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        samples,
    })
}
