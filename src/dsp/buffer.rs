//! Decoded audio held in memory.

/// Interleaved f32 PCM at its native sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved samples, `frames() * channels` long.
    pub data: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    pub fn new(data: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        AudioBuffer {
            data,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Create from interleaved 16-bit signed PCM.
    pub fn from_i16(pcm: &[i16], sample_rate: u32, channels: u16) -> Self {
        let data = pcm.iter().map(|&s| s as f32 / 32768.0).collect();
        AudioBuffer::new(data, sample_rate, channels)
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// De-interleave one channel. Out-of-range channels yield nothing.
    pub fn channel(&self, index: usize) -> Vec<f32> {
        let channels = self.channels as usize;
        if index >= channels {
            return Vec::new();
        }
        self.data
            .iter()
            .skip(index)
            .step_by(channels)
            .copied()
            .collect()
    }

    /// Average all channels down to one.
    pub fn to_mono(&self) -> Vec<f32> {
        let channels = self.channels as usize;
        self.data
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_i16_scales() {
        let buf = AudioBuffer::from_i16(&[0, 16384, -16384, 32767], 44100, 1);
        assert_eq!(buf.frames(), 4);
        assert!(buf.data[0].abs() < 0.001);
        assert!((buf.data[1] - 0.5).abs() < 0.001);
        assert!((buf.data[2] + 0.5).abs() < 0.001);
    }

    #[test]
    fn stereo_channels_split() {
        let buf = AudioBuffer::new(vec![1.0, -1.0, 0.5, -0.5, 0.25, -0.25], 48000, 2);
        assert_eq!(buf.frames(), 3);
        assert_eq!(buf.channel(0), vec![1.0, 0.5, 0.25]);
        assert_eq!(buf.channel(1), vec![-1.0, -0.5, -0.25]);
        assert!(buf.channel(2).is_empty());
        assert_eq!(buf.to_mono(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn duration_from_frames() {
        let buf = AudioBuffer::new(vec![0.0; 44100 * 2], 44100, 2);
        assert!((buf.duration() - 1.0).abs() < 1e-12);
        assert!(!buf.is_empty());
    }
}
