use nih_plug::nih_debug_assert_failure;
use std::array;
use std::sync::Arc;

use crate::biquad::{SectionCoefficients, SectionSlot, SectionState};
use crate::design::MAX_CUT_SECTIONS;

/// The three fixed stages of a chain, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    LowCut,
    Peak,
    HighCut,
}

impl ChainPosition {
    pub const ALL: [ChainPosition; 3] = [
        ChainPosition::LowCut,
        ChainPosition::Peak,
        ChainPosition::HighCut,
    ];

    pub fn index(self) -> usize {
        match self {
            ChainPosition::LowCut => 0,
            ChainPosition::Peak => 1,
            ChainPosition::HighCut => 2,
        }
    }

    /// How many sections the stage at this position owns.
    pub fn section_count(self) -> usize {
        match self {
            ChainPosition::LowCut | ChainPosition::HighCut => MAX_CUT_SECTIONS,
            ChainPosition::Peak => 1,
        }
    }
}

/// Coefficient and bypass state of every section in a chain. This is the part of a
/// [`FilterChain`] other threads may look at, so it lives behind an [`Arc`].
///
/// There must only ever be a single writer, which is the audio thread driving the
/// [`ChainUpdater`][crate::updater::ChainUpdater]. Readers such as the response analyzer can
/// inspect it at any time.
#[derive(Debug)]
pub struct ChainCoefficients {
    /// Indexed by [`ChainPosition::index()`]. The peak stage only uses its first slot.
    stages: [[SectionSlot; MAX_CUT_SECTIONS]; 3],
}

impl ChainCoefficients {
    /// Every section starts out bypassed, holding the identity coefficients.
    pub fn new() -> Self {
        Self {
            stages: array::from_fn(|_| array::from_fn(|_| SectionSlot::new())),
        }
    }

    pub fn section(&self, position: ChainPosition, section: usize) -> Option<&SectionSlot> {
        if section < position.section_count() {
            self.stages[position.index()].get(section)
        } else {
            None
        }
    }

    /// The sections belonging to the stage at `position`.
    pub fn stage(&self, position: ChainPosition) -> &[SectionSlot] {
        &self.stages[position.index()][..position.section_count()]
    }

    /// Atomically swaps the coefficients of one section. Non-finite coefficients are replaced
    /// by the identity so they can never reach the audio buffer.
    pub fn replace_coefficients(
        &self,
        position: ChainPosition,
        section: usize,
        coefficients: SectionCoefficients,
    ) {
        let Some(slot) = self.section(position, section) else {
            nih_debug_assert_failure!("No section {} in the {:?} stage", section, position);
            return;
        };

        if coefficients.is_finite() {
            slot.store(coefficients);
        } else {
            nih_debug_assert_failure!("Non-finite coefficients for {:?} {}", position, section);
            slot.store(SectionCoefficients::IDENTITY);
        }
    }

    pub fn set_bypassed(&self, position: ChainPosition, section: usize, bypassed: bool) {
        match self.section(position, section) {
            Some(slot) => slot.set_bypassed(bypassed),
            None => {
                nih_debug_assert_failure!("No section {} in the {:?} stage", section, position);
            }
        }
    }

    /// Out of range sections count as bypassed.
    pub fn is_bypassed(&self, position: ChainPosition, section: usize) -> bool {
        self.section(position, section)
            .map_or(true, SectionSlot::is_bypassed)
    }

    pub fn coefficients(
        &self,
        position: ChainPosition,
        section: usize,
    ) -> Option<SectionCoefficients> {
        self.section(position, section).map(SectionSlot::load)
    }

    /// Number of sections currently taking part in processing at `position`.
    pub fn enabled_sections(&self, position: ChainPosition) -> usize {
        self.stage(position)
            .iter()
            .filter(|slot| !slot.is_bypassed())
            .count()
    }

    /// Calls `f` with a consistent snapshot of the coefficients of every section that isn't
    /// bypassed, in processing order.
    pub fn for_each_active(&self, mut f: impl FnMut(ChainPosition, usize, SectionCoefficients)) {
        for position in ChainPosition::ALL {
            for (index, slot) in self.stage(position).iter().enumerate() {
                if !slot.is_bypassed() {
                    f(position, index, slot.load());
                }
            }
        }
    }
}

impl Default for ChainCoefficients {
    fn default() -> Self {
        Self::new()
    }
}

/// A low cut, peak and high cut filter applied to a single channel.
pub struct FilterChain {
    coefficients: Arc<ChainCoefficients>,
    /// Filter memory, parallel to the slots in `coefficients`.
    states: [[SectionState; MAX_CUT_SECTIONS]; 3],
}

impl FilterChain {
    pub fn new() -> Self {
        Self {
            coefficients: Arc::new(ChainCoefficients::new()),
            states: [[SectionState::default(); MAX_CUT_SECTIONS]; 3],
        }
    }

    /// A handle on this chain's coefficients for readers on other threads.
    pub fn shared(&self) -> Arc<ChainCoefficients> {
        self.coefficients.clone()
    }

    pub fn coefficients(&self) -> &ChainCoefficients {
        &self.coefficients
    }

    /// Filters `block` in place. Every section's coefficients are read once per block, so a
    /// concurrent replacement only ever takes effect on a block boundary.
    pub fn process(&mut self, block: &mut [f32]) {
        for position in ChainPosition::ALL {
            let slots = self.coefficients.stage(position);
            let states = &mut self.states[position.index()];

            for (slot, state) in slots.iter().zip(states.iter_mut()) {
                if slot.is_bypassed() {
                    continue;
                }

                let coefficients = slot.load();
                for sample in block.iter_mut() {
                    let filtered = state.process_sample(&coefficients, *sample);
                    if filtered.is_finite() {
                        *sample = filtered;
                    } else {
                        // The input passes through untouched for this sample
                        state.reset();
                    }
                }
            }
        }
    }

    pub fn replace_coefficients(
        &mut self,
        position: ChainPosition,
        section: usize,
        coefficients: SectionCoefficients,
    ) {
        self.coefficients
            .replace_coefficients(position, section, coefficients);
    }

    pub fn set_bypassed(&mut self, position: ChainPosition, section: usize, bypassed: bool) {
        self.coefficients.set_bypassed(position, section, bypassed);
    }

    pub fn is_bypassed(&self, position: ChainPosition, section: usize) -> bool {
        self.coefficients.is_bypassed(position, section)
    }

    /// Bypasses or enables every section of every stage.
    pub fn set_all_bypassed(&mut self, bypassed: bool) {
        for position in ChainPosition::ALL {
            for section in 0..position.section_count() {
                self.set_bypassed(position, section, bypassed);
            }
        }
    }

    /// Clears the filter memory without touching coefficients or bypass state.
    pub fn reset(&mut self) {
        for state in self.states.iter_mut().flatten() {
            state.reset();
        }
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}
