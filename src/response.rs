//! Composite magnitude response of a chain, sampled across the audible range for display.

use nih_plug::prelude::util;

use crate::chain::ChainCoefficients;

pub const MIN_FREQUENCY_HZ: f64 = 20.0;
pub const MAX_FREQUENCY_HZ: f64 = 20_000.0;
/// The curve is drawn between these bounds, in decibels.
pub const RESPONSE_DB_RANGE: (f32, f32) = (-24.0, 24.0);

/// Log-frequency position of pixel column `pixel` in a display `width` columns wide.
pub fn frequency_for_pixel(pixel: usize, width: usize) -> f64 {
    let proportion = pixel as f64 / width.max(1) as f64;
    MIN_FREQUENCY_HZ * (MAX_FREQUENCY_HZ / MIN_FREQUENCY_HZ).powf(proportion)
}

/// Linear magnitude of every non-bypassed section in the chain, multiplied together. Sections
/// whose magnitude isn't finite are treated as pass-through.
pub fn magnitude_at(chain: &ChainCoefficients, freq: f64, sample_rate: f32) -> f64 {
    let mut magnitude = 1.0;
    chain.for_each_active(|_, _, coefficients| {
        let section = coefficients.magnitude_for_frequency(freq, sample_rate as f64);
        if section.is_finite() {
            magnitude *= section;
        }
    });

    magnitude
}

pub fn magnitude_db_at(chain: &ChainCoefficients, freq: f64, sample_rate: f32) -> f32 {
    util::gain_to_db(magnitude_at(chain, freq, sample_rate) as f32)
}

/// The response in decibels for each of `width` pixel columns, left to right.
pub fn response_curve(chain: &ChainCoefficients, sample_rate: f32, width: usize) -> Vec<f32> {
    let mut curve = vec![0.0; width];
    fill_response_curve(chain, sample_rate, &mut curve);
    curve
}

/// Same as [`response_curve()`], writing into an existing buffer. The buffer's length is the
/// display width.
pub fn fill_response_curve(chain: &ChainCoefficients, sample_rate: f32, curve: &mut [f32]) {
    let width = curve.len();
    for (pixel, db) in curve.iter_mut().enumerate() {
        *db = magnitude_db_at(chain, frequency_for_pixel(pixel, width), sample_rate);
    }
}

/// Maps a decibel value onto a vertical extent, [`RESPONSE_DB_RANGE`] spanning `bottom` to
/// `top`. Values outside the range are clamped to the edges.
pub fn map_db_to_y(db: f32, top: f32, bottom: f32) -> f32 {
    let (min_db, max_db) = RESPONSE_DB_RANGE;
    let proportion = (db.clamp(min_db, max_db) - min_db) / (max_db - min_db);
    bottom + (top - bottom) * proportion
}
