//! Symphonia Decoder - 基于 symphonia 的音频解码器
//!
//! 不依赖扩展名提示，由 probe 自行识别容器（提供方返回 MP3，测试使用 WAV）。
//! 解码是纯 CPU 工作，放到 blocking 线程池执行。

use async_trait::async_trait;
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioDecoderPort, DecodeError, DecodedAudio};

#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

fn decode_to_pcm(data: Vec<u8>) -> Result<DecodedAudio, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::InvalidInput("audio data is empty".to_string()));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::InvalidInput(format!("Unrecognized audio format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| DecodeError::DecodingError("No audio track found".to_string()))?;
    let track_id = track.id;

    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count() as u8);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::DecodingError(format!("Decoder creation failed: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                return Err(DecodeError::DecodingError(format!(
                    "Packet read error: {}",
                    e
                )));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(error = %e, "Decode error (skipping packet)");
                continue;
            }
            Err(e) => {
                return Err(DecodeError::DecodingError(e.to_string()));
            }
        };

        // MP3 的参数可能要到第一帧才知道
        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count() as u8);

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    let sample_rate =
        sample_rate.ok_or_else(|| DecodeError::DecodingError("Unknown sample rate".to_string()))?;
    let channels =
        channels.ok_or_else(|| DecodeError::DecodingError("Unknown channel count".to_string()))?;
    if sample_rate == 0 || channels == 0 {
        return Err(DecodeError::DecodingError(
            "Invalid stream parameters".to_string(),
        ));
    }

    let frames = (samples.len() / channels as usize) as u64;
    let duration_ms = frames * 1000 / sample_rate as u64;

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
        duration_ms,
    })
}

#[async_trait]
impl AudioDecoderPort for SymphoniaDecoder {
    async fn decode(&self, data: &[u8]) -> Result<DecodedAudio, DecodeError> {
        let data = data.to_vec();
        let size = data.len();

        let decoded = tokio::task::spawn_blocking(move || decode_to_pcm(data))
            .await
            .map_err(|e| DecodeError::DecodingError(format!("Decode task failed: {}", e)))??;

        tracing::debug!(
            input_size = size,
            sample_rate = decoded.sample_rate,
            channels = decoded.channels,
            duration_ms = decoded.duration_ms,
            "Audio decoded"
        );

        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 0.5 秒 16kHz 双声道 16 位 PCM，左右声道分别为固定值
    fn create_test_wav() -> Vec<u8> {
        let sample_rate: u32 = 16000;
        let num_channels: u16 = 2;
        let bits_per_sample: u16 = 16;
        let num_frames = sample_rate as usize / 2;

        let data_size = num_frames * (bits_per_sample as usize / 8) * num_channels as usize;
        let mut wav = Vec::with_capacity(44 + data_size);

        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&((36 + data_size) as u32).to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&num_channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        let block_align = num_channels * (bits_per_sample / 8);
        wav.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&bits_per_sample.to_le_bytes());

        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(data_size as u32).to_le_bytes());
        for _ in 0..num_frames {
            wav.extend_from_slice(&8192i16.to_le_bytes());
            wav.extend_from_slice(&(-8192i16).to_le_bytes());
        }

        wav
    }

    #[tokio::test]
    async fn test_decode_wav() {
        let decoded = SymphoniaDecoder::new().decode(&create_test_wav()).await.unwrap();

        assert_eq!(decoded.sample_rate, 16000);
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.frames(), 8000);
        assert_eq!(decoded.duration_ms, 500);
        assert!((decoded.samples[0] - 0.25).abs() < 1e-3);
        assert!((decoded.samples[1] + 0.25).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_decode_rejects_garbage() {
        let decoder = SymphoniaDecoder::new();
        assert!(matches!(
            decoder.decode(&[]).await,
            Err(DecodeError::InvalidInput(_))
        ));
        assert!(decoder.decode(b"definitely not audio at all").await.is_err());
    }
}
