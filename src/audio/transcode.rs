use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("unrecognized audio container: {0}")]
    Probe(String),

    #[error("no decodable audio track in segment")]
    NoTrack,

    #[error("audio decode failed: {0}")]
    Decode(String),

    #[error("decoded segment contained no samples")]
    Empty,

    #[error("WAV encode failed: {0}")]
    Encode(String),
}

/// Converts a raw container segment into the canonical encoding the
/// transcription engine expects.
///
/// Implementations are CPU-bound and synchronous; callers run them on a
/// blocking thread, never inside the session's mutation critical section.
pub trait AudioTranscoder: Send + Sync {
    fn transcode(&self, container: &[u8]) -> Result<Vec<u8>, TranscodeError>;
}

/// Decodes whatever container the client recorder produced (WebM, OGG, MP3,
/// WAV) via symphonia and re-encodes it as 16-bit mono WAV at the target
/// rate.
pub struct SymphoniaTranscoder {
    target_sample_rate: u32,
}

impl SymphoniaTranscoder {
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    fn decode_all(&self, container: &[u8]) -> Result<(Vec<i16>, u32, u16), TranscodeError> {
        let stream = MediaSourceStream::new(
            Box::new(Cursor::new(container.to_vec())),
            Default::default(),
        );

        let probed = symphonia::default::get_probe()
            .format(
                &Hint::new(),
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| TranscodeError::Probe(e.to_string()))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(TranscodeError::NoTrack)?;
        let track_id = track.id;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| TranscodeError::Decode(e.to_string()))?;

        let mut samples: Vec<i16> = Vec::new();
        let mut sample_buf: Option<SampleBuffer<i16>> = None;
        let mut sample_rate = 0u32;
        let mut channels = 0u16;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(TranscodeError::Decode(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    if sample_buf.is_none() {
                        let spec = *decoded.spec();
                        sample_rate = spec.rate;
                        channels = spec.channels.count() as u16;
                        sample_buf = Some(SampleBuffer::<i16>::new(decoded.capacity() as u64, spec));
                    }
                    if let Some(buf) = &mut sample_buf {
                        buf.copy_interleaved_ref(decoded);
                        samples.extend_from_slice(buf.samples());
                    }
                }
                // Corrupt packets happen on recorder hiccups; skip them.
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(e) => return Err(TranscodeError::Decode(e.to_string())),
            }
        }

        if samples.is_empty() {
            return Err(TranscodeError::Empty);
        }

        Ok((samples, sample_rate, channels))
    }

    /// Sum left and right channels (no division, preserves volume).
    fn downmix_to_mono(samples: Vec<i16>, channels: u16) -> Vec<i16> {
        match channels {
            0 | 1 => samples,
            2 => samples
                .chunks_exact(2)
                .map(|pair| {
                    let sum = pair[0] as i32 + pair[1] as i32;
                    sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16
                })
                .collect(),
            // Multichannel sources: keep the first channel.
            n => samples.iter().step_by(n as usize).copied().collect(),
        }
    }

    /// Downsample by decimation. Upsampling is never attempted.
    fn decimate(samples: Vec<i16>, source_rate: u32, target_rate: u32) -> (Vec<i16>, u32) {
        if source_rate <= target_rate {
            return (samples, source_rate);
        }
        let ratio = source_rate / target_rate;
        if ratio <= 1 {
            return (samples, source_rate);
        }
        let downsampled: Vec<i16> = samples.iter().step_by(ratio as usize).copied().collect();
        (downsampled, source_rate / ratio)
    }

    fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, TranscodeError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| TranscodeError::Encode(e.to_string()))?;
            for &sample in samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| TranscodeError::Encode(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| TranscodeError::Encode(e.to_string()))?;
        }

        Ok(cursor.into_inner())
    }
}

impl Default for SymphoniaTranscoder {
    fn default() -> Self {
        Self::new(16000)
    }
}

impl AudioTranscoder for SymphoniaTranscoder {
    fn transcode(&self, container: &[u8]) -> Result<Vec<u8>, TranscodeError> {
        let (samples, sample_rate, channels) = self.decode_all(container)?;

        debug!(
            "Decoded segment: {} samples, {}Hz, {} channels",
            samples.len(),
            sample_rate,
            channels
        );

        let mono = Self::downmix_to_mono(samples, channels);
        let (resampled, out_rate) = Self::decimate(mono, sample_rate, self.target_sample_rate);

        Self::encode_wav(&resampled, out_rate)
    }
}
