use atomic_float::AtomicF32;
use nih_plug::prelude::{Editor, GuiContext};
use nih_plug_iced::widgets as nih_widgets;
use nih_plug_iced::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::chain::ChainCoefficients;
use crate::params::SimpleEqParams;
use crate::response;

/// Frequencies the response readout is evaluated at.
const READOUT_FREQUENCIES_HZ: [f64; 5] = [50.0, 200.0, 1000.0, 5000.0, 15_000.0];

// Makes sense to also define this here, makes it a bit easier to keep track of
pub(crate) fn default_state() -> Arc<IcedState> {
    IcedState::from_size(600, 480)
}

pub(crate) fn create(
    params: Arc<SimpleEqParams>,
    chain: Arc<ChainCoefficients>,
    sample_rate: Arc<AtomicF32>,
    editor_state: Arc<IcedState>,
) -> Option<Box<dyn Editor>> {
    create_iced_editor::<SimpleEqEditor>(editor_state, (params, chain, sample_rate))
}

struct SimpleEqEditor {
    params: Arc<SimpleEqParams>,
    context: Arc<dyn GuiContext>,

    /// The left channel's coefficients, read for the response readout.
    chain: Arc<ChainCoefficients>,
    sample_rate: Arc<AtomicF32>,

    low_cut_freq_slider_state: nih_widgets::param_slider::State,
    low_cut_slope_slider_state: nih_widgets::param_slider::State,
    peak_freq_slider_state: nih_widgets::param_slider::State,
    peak_gain_slider_state: nih_widgets::param_slider::State,
    peak_quality_slider_state: nih_widgets::param_slider::State,
    high_cut_freq_slider_state: nih_widgets::param_slider::State,
    high_cut_slope_slider_state: nih_widgets::param_slider::State,
}

#[derive(Debug, Clone, Copy)]
enum Message {
    /// Update a parameter's value.
    ParamUpdate(nih_widgets::ParamMessage),
}

/// A row of response values at fixed frequencies, read from the shared chain coefficients.
fn response_readout<'a>(chain: &ChainCoefficients, sample_rate: f32) -> Row<'a, Message> {
    READOUT_FREQUENCIES_HZ
        .iter()
        .fold(Row::new().spacing(20), |row, &freq| {
            let db = response::magnitude_db_at(chain, freq, sample_rate);
            let label = if freq >= 1000.0 {
                format!("{:.0} kHz\n{:+.1} dB", freq / 1000.0, db)
            } else {
                format!("{:.0} Hz\n{:+.1} dB", freq, db)
            };

            row.push(
                Text::new(label)
                    .size(14)
                    .horizontal_alignment(alignment::Horizontal::Center),
            )
        })
}

impl IcedEditor for SimpleEqEditor {
    type Executor = executor::Default;
    type Message = Message;
    type InitializationFlags = (Arc<SimpleEqParams>, Arc<ChainCoefficients>, Arc<AtomicF32>);

    fn new(
        (params, chain, sample_rate): Self::InitializationFlags,
        context: Arc<dyn GuiContext>,
    ) -> (Self, Command<Self::Message>) {
        let editor = SimpleEqEditor {
            params,
            context,

            chain,
            sample_rate,

            low_cut_freq_slider_state: Default::default(),
            low_cut_slope_slider_state: Default::default(),
            peak_freq_slider_state: Default::default(),
            peak_gain_slider_state: Default::default(),
            peak_quality_slider_state: Default::default(),
            high_cut_freq_slider_state: Default::default(),
            high_cut_slope_slider_state: Default::default(),
        };

        (editor, Command::none())
    }

    fn context(&self) -> &dyn GuiContext {
        self.context.as_ref()
    }

    fn update(
        &mut self,
        _window: &mut WindowQueue,
        message: Self::Message,
    ) -> Command<Self::Message> {
        match message {
            Message::ParamUpdate(message) => self.handle_param_message(message),
        }

        Command::none()
    }

    fn view(&mut self) -> Element<'_, Self::Message> {
        let readout = response_readout(&self.chain, self.sample_rate.load(Ordering::Relaxed));

        Column::new()
            .align_items(Alignment::Center)
            .padding(20)
            .spacing(10)
            .push(
                Text::new("Simple EQ")
                    .font(assets::NOTO_SANS_LIGHT)
                    .size(24)
                    .height(30.into())
                    .width(Length::Fill)
                    .horizontal_alignment(alignment::Horizontal::Center)
                    .vertical_alignment(alignment::Vertical::Bottom),
            )
            .push(readout)
            .push(Space::with_height(10.into()))
            .push(
                nih_widgets::ParamSlider::new(
                    &mut self.low_cut_freq_slider_state,
                    &self.params.low_cut_freq,
                )
                .map(Message::ParamUpdate),
            )
            .push(
                nih_widgets::ParamSlider::new(
                    &mut self.low_cut_slope_slider_state,
                    &self.params.low_cut_slope,
                )
                .map(Message::ParamUpdate),
            )
            .push(
                nih_widgets::ParamSlider::new(&mut self.peak_freq_slider_state, &self.params.peak_freq)
                    .map(Message::ParamUpdate),
            )
            .push(
                nih_widgets::ParamSlider::new(&mut self.peak_gain_slider_state, &self.params.peak_gain)
                    .map(Message::ParamUpdate),
            )
            .push(
                nih_widgets::ParamSlider::new(
                    &mut self.peak_quality_slider_state,
                    &self.params.peak_quality,
                )
                .map(Message::ParamUpdate),
            )
            .push(
                nih_widgets::ParamSlider::new(
                    &mut self.high_cut_freq_slider_state,
                    &self.params.high_cut_freq,
                )
                .map(Message::ParamUpdate),
            )
            .push(
                nih_widgets::ParamSlider::new(
                    &mut self.high_cut_slope_slider_state,
                    &self.params.high_cut_slope,
                )
                .map(Message::ParamUpdate),
            )
            .into()
    }

    fn background_color(&self) -> nih_plug_iced::Color {
        nih_plug_iced::Color {
            r: 0.98,
            g: 0.98,
            b: 0.98,
            a: 1.0,
        }
    }
}
