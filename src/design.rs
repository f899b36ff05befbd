//! Turns a [`ChainSettings`] snapshot into coefficients for the three stages of the chain.
//!
//! Everything in here is called from the audio thread, so nothing allocates and nothing
//! panics. Out of range inputs trip a debug assertion and are then clamped into range.

use biquad::{Coefficients, ToHertz, Type};
use nih_plug::{nih_debug_assert, nih_debug_assert_failure};
use std::f32::consts::PI;

use crate::biquad::SectionCoefficients;
use crate::settings::{ChainSettings, Slope};

/// A cut stage never has more sections than this.
pub const MAX_CUT_SECTIONS: usize = 4;

/// Fallback used when the host hands us a nonsensical sample rate.
const FALLBACK_SAMPLE_RATE: f32 = 44_100.0;
/// Lowest frequency a filter is designed for.
const MIN_FREQUENCY_HZ: f32 = 1.0;
/// Keeps the design frequency just below Nyquist.
const MAX_NYQUIST_RATIO: f32 = 0.499;
const MIN_QUALITY: f32 = 0.01;

/// The ordered second order sections of one Butterworth cut filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutCoefficients {
    sections: [SectionCoefficients; MAX_CUT_SECTIONS],
    len: usize,
}

impl CutCoefficients {
    pub fn as_slice(&self) -> &[SectionCoefficients] {
        &self.sections[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<&SectionCoefficients> {
        self.as_slice().get(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CutKind {
    LowCut,
    HighCut,
}

/// The peaking filter, a single cookbook peaking EQ section.
pub fn peak_filter(settings: &ChainSettings, sample_rate: f32) -> SectionCoefficients {
    let sample_rate = checked_sample_rate(sample_rate);
    let freq = checked_frequency(settings.peak_freq_hz, sample_rate);

    nih_debug_assert!(settings.peak_quality > 0.0);
    let quality = if settings.peak_quality.is_finite() {
        settings.peak_quality.max(MIN_QUALITY)
    } else {
        1.0
    };

    nih_debug_assert!(settings.peak_gain_db.is_finite());
    let gain_db = if settings.peak_gain_db.is_finite() {
        settings.peak_gain_db
    } else {
        0.0
    };

    design_section(Type::PeakingEQ(gain_db), sample_rate, freq, quality)
}

/// Butterworth high-pass at the low cut frequency.
pub fn low_cut_filter(settings: &ChainSettings, sample_rate: f32) -> CutCoefficients {
    cut_filter(
        CutKind::LowCut,
        settings.low_cut_freq_hz,
        settings.low_cut_slope,
        sample_rate,
    )
}

/// Butterworth low-pass at the high cut frequency.
pub fn high_cut_filter(settings: &ChainSettings, sample_rate: f32) -> CutCoefficients {
    cut_filter(
        CutKind::HighCut,
        settings.high_cut_freq_hz,
        settings.high_cut_slope,
        sample_rate,
    )
}

/// Quality factor of section `section` in a Butterworth filter with `sections` second order
/// sections. The pole pairs of an order `2N` prototype sit at `(2k + 1) * pi / 4N`.
pub fn butterworth_quality(section: usize, sections: usize) -> f32 {
    let angle = (2 * section + 1) as f32 * PI / (4 * sections) as f32;
    1.0 / (2.0 * angle.cos())
}

fn cut_filter(kind: CutKind, freq: f32, slope: Slope, sample_rate: f32) -> CutCoefficients {
    let sample_rate = checked_sample_rate(sample_rate);
    let freq = checked_frequency(freq, sample_rate);

    let len = slope.sections();
    let mut sections = [SectionCoefficients::IDENTITY; MAX_CUT_SECTIONS];
    for (index, section) in sections.iter_mut().take(len).enumerate() {
        let filter_type = match kind {
            CutKind::LowCut => Type::HighPass,
            CutKind::HighCut => Type::LowPass,
        };
        *section = design_section(
            filter_type,
            sample_rate,
            freq,
            butterworth_quality(index, len),
        );
    }

    CutCoefficients { sections, len }
}

fn design_section(
    filter_type: Type<f32>,
    sample_rate: f32,
    freq: f32,
    quality: f32,
) -> SectionCoefficients {
    match Coefficients::<f32>::from_params(filter_type, sample_rate.hz(), freq.hz(), quality) {
        Ok(coefficients) => {
            let coefficients = SectionCoefficients::from(coefficients);
            if coefficients.is_finite() {
                coefficients
            } else {
                nih_debug_assert_failure!("Non-finite coefficients for {} Hz", freq);
                SectionCoefficients::IDENTITY
            }
        }
        Err(err) => {
            nih_debug_assert_failure!("Could not design a filter at {} Hz: {:?}", freq, err);
            SectionCoefficients::IDENTITY
        }
    }
}

fn checked_sample_rate(sample_rate: f32) -> f32 {
    nih_debug_assert!(sample_rate.is_finite() && sample_rate > 0.0);
    if sample_rate.is_finite() && sample_rate > 0.0 {
        sample_rate
    } else {
        FALLBACK_SAMPLE_RATE
    }
}

fn checked_frequency(freq: f32, sample_rate: f32) -> f32 {
    let max = sample_rate * MAX_NYQUIST_RATIO;
    nih_debug_assert!(freq > 0.0 && freq < sample_rate / 2.0);
    if freq.is_finite() {
        freq.clamp(MIN_FREQUENCY_HZ.min(max), max)
    } else {
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    const SAMPLE_RATE: f32 = 44_100.0;

    fn gain_db(sections: &[SectionCoefficients], freq: f64) -> f64 {
        let magnitude: f64 = sections
            .iter()
            .map(|section| section.magnitude_for_frequency(freq, SAMPLE_RATE as f64))
            .product();
        20.0 * magnitude.log10()
    }

    #[test]
    fn butterworth_qualities_match_known_values() {
        assert_approx_eq!(f32, butterworth_quality(0, 1), 0.707_106_8, epsilon = 1e-5);
        assert_approx_eq!(f32, butterworth_quality(0, 2), 0.541_196_1, epsilon = 1e-5);
        assert_approx_eq!(f32, butterworth_quality(1, 2), 1.306_563, epsilon = 1e-5);
        assert_approx_eq!(f32, butterworth_quality(3, 4), 2.562_915_6, epsilon = 1e-4);
    }

    #[test]
    fn cut_filters_have_one_section_per_slope_step() {
        for slope in Slope::ALL {
            let settings = ChainSettings {
                low_cut_slope: slope,
                high_cut_slope: slope,
                ..ChainSettings::default()
            };

            assert_eq!(low_cut_filter(&settings, SAMPLE_RATE).len(), slope.sections());
            assert_eq!(high_cut_filter(&settings, SAMPLE_RATE).len(), slope.sections());
        }
    }

    #[test]
    fn design_is_deterministic() {
        let settings = ChainSettings {
            peak_freq_hz: 2500.0,
            peak_gain_db: 7.5,
            peak_quality: 3.0,
            low_cut_freq_hz: 90.0,
            high_cut_freq_hz: 9000.0,
            low_cut_slope: Slope::Db36,
            high_cut_slope: Slope::Db48,
        };

        assert_eq!(peak_filter(&settings, SAMPLE_RATE), peak_filter(&settings, SAMPLE_RATE));
        assert_eq!(
            low_cut_filter(&settings, SAMPLE_RATE),
            low_cut_filter(&settings, SAMPLE_RATE)
        );
        assert_eq!(
            high_cut_filter(&settings, SAMPLE_RATE),
            high_cut_filter(&settings, SAMPLE_RATE)
        );
    }

    #[test]
    fn cascade_is_three_db_down_at_the_cutoff() {
        for slope in Slope::ALL {
            let settings = ChainSettings {
                low_cut_freq_hz: 1000.0,
                high_cut_freq_hz: 1000.0,
                low_cut_slope: slope,
                high_cut_slope: slope,
                ..ChainSettings::default()
            };

            let low_cut = low_cut_filter(&settings, SAMPLE_RATE);
            let high_cut = high_cut_filter(&settings, SAMPLE_RATE);

            assert_approx_eq!(f64, gain_db(low_cut.as_slice(), 1000.0), -3.01, epsilon = 0.5);
            assert_approx_eq!(f64, gain_db(high_cut.as_slice(), 1000.0), -3.01, epsilon = 0.5);

            // Passband stays flat
            assert_approx_eq!(f64, gain_db(low_cut.as_slice(), 15_000.0), 0.0, epsilon = 0.5);
            assert_approx_eq!(f64, gain_db(high_cut.as_slice(), 50.0), 0.0, epsilon = 0.5);
        }
    }

    #[test]
    fn slope_sets_the_attenuation_one_octave_out() {
        for slope in Slope::ALL {
            let settings = ChainSettings {
                low_cut_freq_hz: 1000.0,
                low_cut_slope: slope,
                ..ChainSettings::default()
            };
            let low_cut = low_cut_filter(&settings, SAMPLE_RATE);

            // |H|^2 = 1 / (1 + (fc / f)^2n) for an order n Butterworth high-pass
            let expected = -10.0 * (1.0 + 2f64.powi(2 * slope.order() as i32)).log10();
            assert_approx_eq!(f64, gain_db(low_cut.as_slice(), 500.0), expected, epsilon = 1.0);
        }
    }

    #[test]
    fn neutral_peak_is_flat() {
        for (freq, quality) in [(100.0, 0.1), (750.0, 1.0), (8000.0, 10.0)] {
            let settings = ChainSettings {
                peak_freq_hz: freq,
                peak_quality: quality,
                peak_gain_db: 0.0,
                ..ChainSettings::default()
            };
            let peak = peak_filter(&settings, SAMPLE_RATE);

            for probe in [20.0, 440.0, 1000.0, 5000.0, 19_000.0] {
                assert_approx_eq!(f64, gain_db(&[peak], probe), 0.0, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn peak_reaches_its_gain_at_the_center_frequency() {
        let settings = ChainSettings {
            peak_freq_hz: 1000.0,
            peak_gain_db: 12.0,
            peak_quality: 2.0,
            ..ChainSettings::default()
        };
        let peak = peak_filter(&settings, SAMPLE_RATE);

        assert_approx_eq!(f64, gain_db(&[peak], 1000.0), 12.0, epsilon = 0.05);
        assert!(gain_db(&[peak], 100.0).abs() < 0.5);
    }

    #[test]
    fn invalid_input_is_clamped_instead_of_failing() {
        let settings = ChainSettings {
            peak_quality: 0.0,
            high_cut_freq_hz: 30_000.0,
            low_cut_freq_hz: -5.0,
            ..ChainSettings::default()
        };

        assert!(peak_filter(&settings, SAMPLE_RATE).is_finite());
        assert!(high_cut_filter(&settings, SAMPLE_RATE)
            .as_slice()
            .iter()
            .all(SectionCoefficients::is_finite));
        assert!(low_cut_filter(&settings, f32::NAN)
            .as_slice()
            .iter()
            .all(SectionCoefficients::is_finite));
    }
}
