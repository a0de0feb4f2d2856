//! Band Filter - fourth-order bandpass per band
//!
//! Each band runs two identical biquad sections in series, tuned to the
//! band's center frequency with a constant 0 dB peak gain. A tone at the
//! center passes at unit level, so the level thresholds stay comparable
//! between bands, while the skirts fall off at 24 dB per octave. One section
//! alone is not steep enough to keep a full-scale bass tone under the high
//! band's floor.
//!
//! Filters are designed against the capture's actual sample rate. A filter
//! tuned for a different rate silently mistunes the band, so callers rebuild
//! it whenever the stream (re)starts.

use std::f32::consts::PI;

use crate::band::BandSettings;
use crate::error::{CoreError, Result};

/// Biquad section (transposed direct form II)
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let out = input * self.b0 + self.z1;

        // Anti-denormal: tiny DC offset
        self.z1 = input * self.b1 + self.z2 - self.a1 * out + 1e-25;
        self.z2 = input * self.b2 - self.a2 * out + 1e-25;

        out
    }
}

/// Biquad sections cascaded per band
pub const FILTER_SECTIONS: usize = 2;

/// Stateful bandpass transform for one band
#[derive(Debug, Clone)]
pub struct BandFilter {
    sections: [Biquad; FILTER_SECTIONS],
    center_hz: f32,
    q: f32,
    sample_rate: u32,
}

impl BandFilter {
    /// Design a bandpass filter (RBJ, constant 0 dB peak gain).
    pub fn bandpass(center_hz: f32, q: f32, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(CoreError::InvalidFilter(
                "sample rate must be positive".to_string(),
            ));
        }
        let nyquist = sample_rate as f32 / 2.0;
        if !center_hz.is_finite() || center_hz <= 0.0 || center_hz >= nyquist {
            return Err(CoreError::InvalidFilter(format!(
                "center frequency {} Hz outside (0, {}) Hz",
                center_hz, nyquist
            )));
        }
        if !q.is_finite() || q <= 0.0 {
            return Err(CoreError::InvalidFilter(format!(
                "quality factor must be positive, got {}",
                q
            )));
        }

        let w0 = 2.0 * PI * center_hz / sample_rate as f32;
        let alpha = w0.sin() / (2.0 * q);
        let cw0 = w0.cos();

        let inv_a0 = 1.0 / (1.0 + alpha);

        let section = Biquad {
            b0: alpha * inv_a0,
            b1: 0.0,
            b2: -alpha * inv_a0,
            a1: (-2.0 * cw0) * inv_a0,
            a2: (1.0 - alpha) * inv_a0,
            z1: 0.0,
            z2: 0.0,
        };

        Ok(Self {
            sections: [section; FILTER_SECTIONS],
            center_hz,
            q,
            sample_rate,
        })
    }

    /// Design a filter for a band's settings
    pub fn for_band(settings: &BandSettings, sample_rate: u32) -> Result<Self> {
        Self::bandpass(settings.center_hz, settings.q, sample_rate)
    }

    /// Filter a single sample
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.sections
            .iter_mut()
            .fold(input, |sample, section| section.process(sample))
    }

    /// Sample rate this filter was designed for
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Center frequency in Hz
    pub fn center_hz(&self) -> f32 {
        self.center_hz
    }

    /// Quality factor
    pub fn q(&self) -> f32 {
        self.q
    }
}

/// Run one sample through an optional filter. A band without a filter has no signal.
#[inline]
pub fn filter_sample(filter: Option<&mut BandFilter>, input: f32) -> f32 {
    match filter {
        Some(f) => f.process(input),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::Band;
    use crate::level::{rms, rms_db};

    fn sine(freq: f32, sample_rate: u32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin() * amplitude)
            .collect()
    }

    fn steady_state_gain(filter: &mut BandFilter, freq: f32) -> f32 {
        let sr = filter.sample_rate();
        let input = sine(freq, sr, sr as usize, 0.5);
        let output: Vec<f32> = input.iter().map(|&s| filter.process(s)).collect();
        // Skip the first half to let the transient settle
        let half = input.len() / 2;
        rms(&output[half..]) / rms(&input[half..])
    }

    #[test]
    fn test_center_frequency_passes_at_unity() {
        let mut filter = BandFilter::bandpass(100.0, 1.0, 48_000).unwrap();
        let gain = steady_state_gain(&mut filter, 100.0);
        assert!((gain - 1.0).abs() < 0.05, "gain at center was {}", gain);
    }

    #[test]
    fn test_other_band_is_attenuated() {
        let mut high = BandFilter::bandpass(2000.0, 3.0, 48_000).unwrap();
        let gain = steady_state_gain(&mut high, 100.0);
        assert!(gain < 0.002, "2 kHz band leaked {} of a 100 Hz tone", gain);

        let mut low = BandFilter::bandpass(100.0, 1.0, 48_000).unwrap();
        let gain = steady_state_gain(&mut low, 2000.0);
        assert!(gain < 0.01, "100 Hz band leaked {} of a 2 kHz tone", gain);
    }

    #[test]
    fn test_full_scale_bass_stays_below_high_floor() {
        let high = BandSettings::default_for(Band::High);
        let mut filter = BandFilter::for_band(&high, 48_000).unwrap();
        let input = sine(100.0, 48_000, 48_000, 1.0);
        let output: Vec<f32> = input.iter().map(|&s| filter.process(s)).collect();

        // Onset included: every short window stays well under the floor
        for (i, window) in output.chunks(128).enumerate() {
            let level = rms_db(window);
            assert!(
                level < high.min_threshold_db - 6.0,
                "window {} reached {} dB",
                i,
                level
            );
        }
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(BandFilter::bandpass(100.0, 1.0, 0).is_err());
        assert!(BandFilter::bandpass(30_000.0, 1.0, 48_000).is_err());
        assert!(BandFilter::bandpass(-5.0, 1.0, 48_000).is_err());
        assert!(BandFilter::bandpass(100.0, 0.0, 48_000).is_err());
        assert!(BandFilter::bandpass(f32::NAN, 1.0, 48_000).is_err());
    }

    #[test]
    fn test_missing_filter_is_silent() {
        assert_eq!(filter_sample(None, 0.75), 0.0);

        let mut filter = BandFilter::bandpass(100.0, 1.0, 44_100).unwrap();
        let out = filter_sample(Some(&mut filter), 0.75);
        assert!(out != 0.0);
    }
}
