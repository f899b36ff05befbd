use nih_plug::prelude::Enum;

/// Parameter names as they are exposed to the host.
pub const PEAK_FREQ: &str = "Peak Freq";
pub const PEAK_GAIN: &str = "Peak Gain";
pub const PEAK_QUALITY: &str = "Peak Quality";
pub const LOW_CUT_FREQ: &str = "LowCut Freq";
pub const HIGH_CUT_FREQ: &str = "HighCut Freq";
pub const LOW_CUT_SLOPE: &str = "LowCut Slope";
pub const HIGH_CUT_SLOPE: &str = "HighCut Slope";

pub const DEFAULT_PEAK_FREQ_HZ: f32 = 750.0;
pub const DEFAULT_PEAK_GAIN_DB: f32 = 0.0;
pub const DEFAULT_PEAK_QUALITY: f32 = 1.0;
pub const DEFAULT_LOW_CUT_FREQ_HZ: f32 = 20.0;
pub const DEFAULT_HIGH_CUT_FREQ_HZ: f32 = 20_000.0;

/// Roll-off of a cut filter. Every step adds one second order section to the cascade.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slope {
    #[name = "12 dB/Oct"]
    Db12,
    #[name = "24 dB/Oct"]
    Db24,
    #[name = "36 dB/Oct"]
    Db36,
    #[name = "48 dB/Oct"]
    Db48,
}

impl Slope {
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Builds a slope from a raw choice index. Out of range values are clamped to `0..=3`.
    pub fn from_choice(choice: f32) -> Self {
        let index = if choice.is_finite() {
            choice.round().clamp(0.0, 3.0) as usize
        } else {
            0
        };

        Self::ALL[index]
    }

    pub fn index(self) -> usize {
        match self {
            Slope::Db12 => 0,
            Slope::Db24 => 1,
            Slope::Db36 => 2,
            Slope::Db48 => 3,
        }
    }

    /// Number of cascaded second order sections, `1..=4`.
    pub fn sections(self) -> usize {
        self.index() + 1
    }

    /// Order of the Butterworth prototype, two poles per section.
    pub fn order(self) -> usize {
        2 * self.sections()
    }

    pub fn db_per_octave(self) -> f32 {
        12.0 * self.sections() as f32
    }
}

/// Plain snapshot of everything the coefficient factory needs. Built once per block and
/// thrown away afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSettings {
    pub peak_freq_hz: f32,
    pub peak_gain_db: f32,
    pub peak_quality: f32,
    pub low_cut_freq_hz: f32,
    pub high_cut_freq_hz: f32,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            peak_freq_hz: DEFAULT_PEAK_FREQ_HZ,
            peak_gain_db: DEFAULT_PEAK_GAIN_DB,
            peak_quality: DEFAULT_PEAK_QUALITY,
            low_cut_freq_hz: DEFAULT_LOW_CUT_FREQ_HZ,
            high_cut_freq_hz: DEFAULT_HIGH_CUT_FREQ_HZ,
            low_cut_slope: Slope::Db12,
            high_cut_slope: Slope::Db12,
        }
    }
}

impl ChainSettings {
    /// Builds a snapshot from a parameter name to value lookup. Names the lookup doesn't know
    /// keep their default value, slope choices are rounded to the nearest valid index.
    pub fn from_values(lookup: impl Fn(&str) -> Option<f32>) -> Self {
        let defaults = Self::default();
        let slope = |name: &str, default: Slope| lookup(name).map_or(default, Slope::from_choice);

        Self {
            peak_freq_hz: lookup(PEAK_FREQ).unwrap_or(defaults.peak_freq_hz),
            peak_gain_db: lookup(PEAK_GAIN).unwrap_or(defaults.peak_gain_db),
            peak_quality: lookup(PEAK_QUALITY).unwrap_or(defaults.peak_quality),
            low_cut_freq_hz: lookup(LOW_CUT_FREQ).unwrap_or(defaults.low_cut_freq_hz),
            high_cut_freq_hz: lookup(HIGH_CUT_FREQ).unwrap_or(defaults.high_cut_freq_hz),
            low_cut_slope: slope(LOW_CUT_SLOPE, defaults.low_cut_slope),
            high_cut_slope: slope(HIGH_CUT_SLOPE, defaults.high_cut_slope),
        }
    }
}
