use crate::chain::{ChainPosition, FilterChain};
use crate::design::{self, CutCoefficients};
use crate::settings::ChainSettings;

/// Recomputes coefficients from a [`ChainSettings`] snapshot and installs them into every
/// channel's chain. Runs on the audio thread once per block.
#[derive(Debug, Clone)]
pub struct ChainUpdater {
    sample_rate: f32,
    /// The settings the chains were last updated with, to skip redundant work.
    current: Option<ChainSettings>,
}

impl ChainUpdater {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            current: None,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// The next update recomputes everything for the new rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.current = None;
        }
    }

    /// Updates `chains` if `settings` differ from the last applied snapshot. Returns whether
    /// anything was installed.
    pub fn update(&mut self, settings: &ChainSettings, chains: &mut [FilterChain]) -> bool {
        if self.current.as_ref() == Some(settings) {
            return false;
        }

        self.force_update(settings, chains);
        true
    }

    /// Recomputes and installs all coefficients regardless of what was applied before.
    pub fn force_update(&mut self, settings: &ChainSettings, chains: &mut [FilterChain]) {
        let peak = design::peak_filter(settings, self.sample_rate);
        let low_cut = design::low_cut_filter(settings, self.sample_rate);
        let high_cut = design::high_cut_filter(settings, self.sample_rate);

        for chain in chains.iter_mut() {
            chain.replace_coefficients(ChainPosition::Peak, 0, peak);
            chain.set_bypassed(ChainPosition::Peak, 0, false);

            update_cut_filter(chain, ChainPosition::LowCut, &low_cut);
            update_cut_filter(chain, ChainPosition::HighCut, &high_cut);
        }

        self.current = Some(*settings);
    }
}

/// Bypasses the whole stage, then enables exactly the sections the slope asks for. Each section
/// gets its coefficients before it is un-bypassed.
fn update_cut_filter(chain: &mut FilterChain, position: ChainPosition, cut: &CutCoefficients) {
    for section in 0..position.section_count() {
        chain.set_bypassed(position, section, true);
    }

    for (section, coefficients) in cut.as_slice().iter().enumerate() {
        chain.replace_coefficients(position, section, *coefficients);
        chain.set_bypassed(position, section, false);
    }
}
