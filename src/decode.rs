//! Audio decoding: WAV via `hound`, MP3 via `minimp3`.
//!
//! The container is sniffed from the leading bytes; file names and MIME
//! types are not consulted.

use std::io::Cursor;

use hound::SampleFormat;

use crate::dsp::buffer::AudioBuffer;
use crate::error::DecodeError;

/// Detected container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
}

/// Identify the container from its magic bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<AudioFormat> {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        return Some(AudioFormat::Wav);
    }
    if bytes.starts_with(b"ID3") {
        return Some(AudioFormat::Mp3);
    }
    // MPEG frame sync: 11 set bits
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0 {
        return Some(AudioFormat::Mp3);
    }
    None
}

/// Decode a complete WAV or MP3 file into interleaved f32 PCM.
pub fn decode_audio(bytes: &[u8]) -> Result<AudioBuffer, DecodeError> {
    match sniff_format(bytes) {
        Some(AudioFormat::Wav) => decode_wav(bytes),
        Some(AudioFormat::Mp3) => decode_mp3(bytes),
        None => Err(DecodeError::UnknownFormat),
    }
}

fn decode_wav(bytes: &[u8]) -> Result<AudioBuffer, DecodeError> {
    let reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| DecodeError::Wav(e.to_string()))?;
    let spec = reader.spec();

    let data: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(wav_err)?,
        (SampleFormat::Int, 8) => read_int::<i8, _>(reader, 128.0)?,
        (SampleFormat::Int, 16) => read_int::<i16, _>(reader, 32768.0)?,
        (SampleFormat::Int, 24) => read_int::<i32, _>(reader, 8_388_608.0)?,
        (SampleFormat::Int, 32) => read_int::<i32, _>(reader, 2_147_483_648.0)?,
        (format, bits) => {
            let kind = match format {
                SampleFormat::Float => "float",
                SampleFormat::Int => "integer",
            };
            return Err(DecodeError::UnsupportedFormat { bits, kind });
        }
    };

    if data.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(AudioBuffer::new(data, spec.sample_rate, spec.channels))
}

fn read_int<S, R>(reader: hound::WavReader<R>, full_scale: f32) -> Result<Vec<f32>, DecodeError>
where
    S: hound::Sample + Into<i32>,
    R: std::io::Read,
{
    reader
        .into_samples::<S>()
        .map(|s| s.map(|v| v.into() as f32 / full_scale))
        .collect::<Result<_, _>>()
        .map_err(wav_err)
}

fn wav_err(e: hound::Error) -> DecodeError {
    DecodeError::Wav(e.to_string())
}

fn decode_mp3(bytes: &[u8]) -> Result<AudioBuffer, DecodeError> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
    let mut data = Vec::new();
    let mut sample_rate = 0u32;
    let mut channels = 0u16;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if channels == 0 {
                    sample_rate = frame.sample_rate as u32;
                    channels = frame.channels as u16;
                }
                data.extend(frame.data.iter().map(|&s| s as f32 / 32768.0));
            }
            Err(minimp3::Error::Eof) => break,
            Err(minimp3::Error::SkippedData) => continue,
            Err(e) => return Err(DecodeError::Mp3(format!("{e:?}"))),
        }
    }

    if data.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(AudioBuffer::new(data, sample_rate, channels))
}
