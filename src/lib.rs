use atomic_float::AtomicF32;
use nih_plug::prelude::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub mod biquad;
pub mod chain;
pub mod design;
mod editor;
pub mod params;
pub mod response;
pub mod settings;
pub mod updater;

use crate::chain::FilterChain;
use crate::params::SimpleEqParams;
use crate::updater::ChainUpdater;

/// Sample rate assumed until the host calls `initialize()`.
const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;

/// Low cut, peak and high cut filters, applied to each channel independently.
pub struct SimpleEq {
    params: Arc<SimpleEqParams>,

    /// One chain per channel. Both always hold the same coefficients.
    chains: [FilterChain; 2],
    updater: ChainUpdater,
    /// Shared with the editor so it can evaluate the response at the host's rate.
    sample_rate: Arc<AtomicF32>,
}

impl Default for SimpleEq {
    fn default() -> Self {
        Self {
            params: Arc::new(SimpleEqParams::default()),

            chains: [FilterChain::new(), FilterChain::new()],
            updater: ChainUpdater::new(DEFAULT_SAMPLE_RATE),
            sample_rate: Arc::new(AtomicF32::new(DEFAULT_SAMPLE_RATE)),
        }
    }
}

impl SimpleEq {
    /// Filters every channel in place after bringing the coefficients up to date with the
    /// current parameter values. Channels beyond the second one are left untouched.
    fn process_channels(&mut self, channels: &mut [&mut [f32]]) {
        let settings = self.params.chain_settings();
        self.updater.update(&settings, &mut self.chains);

        for (samples, chain) in channels.iter_mut().zip(self.chains.iter_mut()) {
            chain.process(samples);
        }
    }
}

impl Plugin for SimpleEq {
    const NAME: &'static str = "Simple EQ";
    const VENDOR: &'static str = "Kakeru3";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";

    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            ..AudioIOLayout::const_default()
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            ..AudioIOLayout::const_default()
        },
    ];

    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn editor(&mut self, _async_executor: AsyncExecutor<Self>) -> Option<Box<dyn Editor>> {
        editor::create(
            self.params.clone(),
            self.chains[0].shared(),
            self.sample_rate.clone(),
            self.params.editor_state.clone(),
        )
    }

    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let sample_rate = buffer_config.sample_rate;
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            nih_error!("Refusing to run at a sample rate of {} Hz", sample_rate);
            return false;
        }

        nih_log!("Initializing filters at {} Hz", sample_rate);
        self.sample_rate.store(sample_rate, Ordering::Relaxed);
        self.updater.set_sample_rate(sample_rate);

        let settings = self.params.chain_settings();
        self.updater.force_update(&settings, &mut self.chains);

        true
    }

    fn reset(&mut self) {
        for chain in self.chains.iter_mut() {
            chain.reset();
        }
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        self.process_channels(buffer.as_slice());

        ProcessStatus::Normal
    }
}

impl ClapPlugin for SimpleEq {
    const CLAP_ID: &'static str = "com.kakeru3.simple-eq";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Low cut, peak and high cut equalizer with selectable cut slopes");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Equalizer,
        ClapFeature::Filter,
    ];
}

impl Vst3Plugin for SimpleEq {
    const VST3_CLASS_ID: [u8; 16] = *b"SimpleEqFilterCh";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Eq];
}

nih_export_clap!(SimpleEq);
nih_export_vst3!(SimpleEq);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainPosition;

    #[test]
    fn default_plugin_passes_low_level_signal_through_the_passband() {
        let mut plugin = SimpleEq::default();

        let mut left = vec![0.0f32; 4096];
        let mut right = vec![0.0f32; 4096];
        for (i, (l, r)) in left.iter_mut().zip(right.iter_mut()).enumerate() {
            let phase = 2.0 * std::f32::consts::PI * 1000.0 * i as f32 / DEFAULT_SAMPLE_RATE;
            *l = 0.5 * phase.sin();
            *r = *l;
        }

        {
            let mut channels: [&mut [f32]; 2] = [&mut left, &mut right];
            plugin.process_channels(&mut channels);
        }

        // 1 kHz sits well inside the default 20 Hz - 20 kHz passband
        let tail_peak = left[2048..].iter().fold(0.0f32, |acc, x| acc.max(x.abs()));
        assert!((tail_peak - 0.5).abs() < 0.01, "tail peak was {tail_peak}");
        assert_eq!(left, right);

        for chain in &plugin.chains {
            assert_eq!(chain.coefficients().enabled_sections(ChainPosition::LowCut), 1);
            assert_eq!(chain.coefficients().enabled_sections(ChainPosition::HighCut), 1);
        }
    }

    #[test]
    fn mono_buffers_only_touch_the_first_chain() {
        let mut plugin = SimpleEq::default();
        let mut mono = vec![0.25f32; 256];

        {
            let mut channels: [&mut [f32]; 1] = [&mut mono];
            plugin.process_channels(&mut channels);
        }

        assert!(mono.iter().all(|x| x.is_finite()));
        // Coefficients still go to both chains
        assert_eq!(
            plugin.chains[0].coefficients().coefficients(ChainPosition::Peak, 0),
            plugin.chains[1].coefficients().coefficients(ChainPosition::Peak, 0)
        );
    }
}
