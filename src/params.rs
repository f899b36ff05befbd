use nih_plug::prelude::*;
use nih_plug_iced::IcedState;
use std::sync::Arc;

use crate::editor;
use crate::settings::{self, ChainSettings, Slope};

#[derive(Params)]
pub struct SimpleEqParams {
    /// The editor state, saved together with the parameter state so the custom scaling can be
    /// restored.
    #[persist = "editor-state"]
    pub editor_state: Arc<IcedState>,

    #[id = "lowcut_freq"]
    pub low_cut_freq: FloatParam,
    #[id = "lowcut_slope"]
    pub low_cut_slope: EnumParam<Slope>,

    #[id = "peak_freq"]
    pub peak_freq: FloatParam,
    #[id = "peak_gain"]
    pub peak_gain: FloatParam,
    #[id = "peak_quality"]
    pub peak_quality: FloatParam,

    #[id = "highcut_freq"]
    pub high_cut_freq: FloatParam,
    #[id = "highcut_slope"]
    pub high_cut_slope: EnumParam<Slope>,
}

impl SimpleEqParams {
    /// Reads the current values into a plain snapshot. Safe to call from the audio thread.
    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            peak_freq_hz: self.peak_freq.value(),
            peak_gain_db: self.peak_gain.value(),
            peak_quality: self.peak_quality.value(),
            low_cut_freq_hz: self.low_cut_freq.value(),
            high_cut_freq_hz: self.high_cut_freq.value(),
            low_cut_slope: self.low_cut_slope.value(),
            high_cut_slope: self.high_cut_slope.value(),
        }
    }
}

fn frequency_param(name: &'static str, default: f32) -> FloatParam {
    FloatParam::new(
        name,
        default,
        FloatRange::Skewed {
            min: 20.0,
            max: 20_000.0,
            factor: FloatRange::skew_factor(-2.0),
        },
    )
    .with_unit(" Hz")
    .with_value_to_string(formatters::v2s_f32_hz_then_khz(2))
    .with_string_to_value(formatters::s2v_f32_hz_then_khz())
}

impl Default for SimpleEqParams {
    fn default() -> Self {
        Self {
            editor_state: editor::default_state(),

            low_cut_freq: frequency_param(settings::LOW_CUT_FREQ, settings::DEFAULT_LOW_CUT_FREQ_HZ),
            low_cut_slope: EnumParam::new(settings::LOW_CUT_SLOPE, Slope::Db12),

            peak_freq: frequency_param(settings::PEAK_FREQ, settings::DEFAULT_PEAK_FREQ_HZ),
            peak_gain: FloatParam::new(
                settings::PEAK_GAIN,
                settings::DEFAULT_PEAK_GAIN_DB,
                FloatRange::Linear {
                    min: -24.0,
                    max: 24.0,
                },
            )
            .with_step_size(0.5)
            .with_unit(" dB")
            .with_value_to_string(formatters::v2s_f32_rounded(1)),
            peak_quality: FloatParam::new(
                settings::PEAK_QUALITY,
                settings::DEFAULT_PEAK_QUALITY,
                FloatRange::Skewed {
                    min: 0.1,
                    max: 10.0,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_step_size(0.05)
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            high_cut_freq: frequency_param(
                settings::HIGH_CUT_FREQ,
                settings::DEFAULT_HIGH_CUT_FREQ_HZ,
            ),
            high_cut_slope: EnumParam::new(settings::HIGH_CUT_SLOPE, Slope::Db12),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_default_snapshot() {
        let params = SimpleEqParams::default();
        assert_eq!(params.chain_settings(), ChainSettings::default());
    }

    #[test]
    fn parameters_use_the_host_facing_names() {
        let params = SimpleEqParams::default();
        assert_eq!(params.peak_freq.name(), "Peak Freq");
        assert_eq!(params.peak_gain.name(), "Peak Gain");
        assert_eq!(params.peak_quality.name(), "Peak Quality");
        assert_eq!(params.low_cut_freq.name(), "LowCut Freq");
        assert_eq!(params.high_cut_freq.name(), "HighCut Freq");
        assert_eq!(params.low_cut_slope.name(), "LowCut Slope");
        assert_eq!(params.high_cut_slope.name(), "HighCut Slope");
    }
}
