use atomic_float::AtomicF32;
use std::f64::consts::PI;
use std::hint;
use std::sync::atomic::{fence, AtomicBool, AtomicU32, Ordering};

/// Normalized second order section, `a0` is always 1.
///
/// The sign convention matches the `biquad` crate:
/// `y[n] = b0 x[n] + b1 x[n-1] + b2 x[n-2] - a1 y[n-1] - a2 y[n-2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl SectionCoefficients {
    /// Passes everything through unchanged.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    pub fn is_finite(&self) -> bool {
        self.b0.is_finite()
            && self.b1.is_finite()
            && self.b2.is_finite()
            && self.a1.is_finite()
            && self.a2.is_finite()
    }

    /// Linear magnitude of the transfer function at `freq` Hz, evaluated on the unit circle.
    pub fn magnitude_for_frequency(&self, freq: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq / sample_rate;
        let (sin_w, cos_w) = w.sin_cos();
        let (sin_2w, cos_2w) = (2.0 * w).sin_cos();

        let (b0, b1, b2) = (self.b0 as f64, self.b1 as f64, self.b2 as f64);
        let (a1, a2) = (self.a1 as f64, self.a2 as f64);

        let num_re = b0 + b1 * cos_w + b2 * cos_2w;
        let num_im = -(b1 * sin_w + b2 * sin_2w);
        let den_re = 1.0 + a1 * cos_w + a2 * cos_2w;
        let den_im = -(a1 * sin_w + a2 * sin_2w);

        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }
}

impl Default for SectionCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<::biquad::Coefficients<f32>> for SectionCoefficients {
    fn from(coefficients: ::biquad::Coefficients<f32>) -> Self {
        Self {
            b0: coefficients.b0,
            b1: coefficients.b1,
            b2: coefficients.b2,
            a1: coefficients.a1,
            a2: coefficients.a2,
        }
    }
}

/// Filter memory of one section. Only ever touched by the audio thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionState {
    z1: f32,
    z2: f32,
}

impl SectionState {
    #[inline]
    pub fn process_sample(&mut self, coefficients: &SectionCoefficients, x: f32) -> f32 {
        // Direct Form II Transposed to keep numerical stability
        let y = coefficients.b0 * x + self.z1;
        self.z1 = coefficients.b1 * x - coefficients.a1 * y + self.z2;
        self.z2 = coefficients.b2 * x - coefficients.a2 * y;
        y
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// Coefficients and bypass flag of one section, shared between the audio thread (the only
/// writer) and any number of readers.
///
/// The coefficient tuple is guarded by a sequence counter: the writer makes it odd while the
/// fields are being stored, and readers retry until they have seen the same even value before
/// and after reading. Readers therefore always get a whole tuple, never a mix of two.
#[derive(Debug)]
pub struct SectionSlot {
    sequence: AtomicU32,
    b0: AtomicF32,
    b1: AtomicF32,
    b2: AtomicF32,
    a1: AtomicF32,
    a2: AtomicF32,
    bypassed: AtomicBool,
}

impl SectionSlot {
    /// A bypassed section holding the identity coefficients.
    pub fn new() -> Self {
        let identity = SectionCoefficients::IDENTITY;
        Self {
            sequence: AtomicU32::new(0),
            b0: AtomicF32::new(identity.b0),
            b1: AtomicF32::new(identity.b1),
            b2: AtomicF32::new(identity.b2),
            a1: AtomicF32::new(identity.a1),
            a2: AtomicF32::new(identity.a2),
            bypassed: AtomicBool::new(true),
        }
    }

    /// Replaces the whole coefficient tuple. Must only be called from a single thread at a time.
    pub fn store(&self, coefficients: SectionCoefficients) {
        let sequence = self.sequence.load(Ordering::Relaxed);
        self.sequence
            .store(sequence.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        self.b0.store(coefficients.b0, Ordering::Relaxed);
        self.b1.store(coefficients.b1, Ordering::Relaxed);
        self.b2.store(coefficients.b2, Ordering::Relaxed);
        self.a1.store(coefficients.a1, Ordering::Relaxed);
        self.a2.store(coefficients.a2, Ordering::Relaxed);

        self.sequence
            .store(sequence.wrapping_add(2), Ordering::Release);
    }

    pub fn load(&self) -> SectionCoefficients {
        loop {
            let before = self.sequence.load(Ordering::Acquire);
            if before & 1 == 1 {
                hint::spin_loop();
                continue;
            }

            let coefficients = SectionCoefficients {
                b0: self.b0.load(Ordering::Relaxed),
                b1: self.b1.load(Ordering::Relaxed),
                b2: self.b2.load(Ordering::Relaxed),
                a1: self.a1.load(Ordering::Relaxed),
                a2: self.a2.load(Ordering::Relaxed),
            };

            fence(Ordering::Acquire);
            if self.sequence.load(Ordering::Relaxed) == before {
                return coefficients;
            }
        }
    }

    pub fn set_bypassed(&self, bypassed: bool) {
        self.bypassed.store(bypassed, Ordering::Release);
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed.load(Ordering::Acquire)
    }
}

impl Default for SectionSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::biquad::{Coefficients, ToHertz, Type};
    use float_cmp::assert_approx_eq;

    fn lowpass(cutoff: f32) -> SectionCoefficients {
        Coefficients::<f32>::from_params(
            Type::LowPass,
            44_100.0_f32.hz(),
            cutoff.hz(),
            std::f32::consts::FRAC_1_SQRT_2,
        )
        .unwrap()
        .into()
    }

    #[test]
    fn identity_passes_samples_through() {
        let mut state = SectionState::default();
        for x in [1.0, -0.5, 0.25, 0.0, 3.0] {
            assert_eq!(state.process_sample(&SectionCoefficients::IDENTITY, x), x);
        }
        assert_approx_eq!(
            f64,
            SectionCoefficients::IDENTITY.magnitude_for_frequency(1234.0, 48_000.0),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn lowpass_magnitude_matches_butterworth_shape() {
        let coefficients = lowpass(1000.0);

        assert_approx_eq!(
            f64,
            coefficients.magnitude_for_frequency(0.0, 44_100.0),
            1.0,
            epsilon = 1e-4
        );
        assert_approx_eq!(
            f64,
            coefficients.magnitude_for_frequency(1000.0, 44_100.0),
            std::f64::consts::FRAC_1_SQRT_2,
            epsilon = 1e-3
        );
        assert!(coefficients.magnitude_for_frequency(10_000.0, 44_100.0) < 0.02);
    }

    #[test]
    fn lowpass_settles_to_dc_gain() {
        let coefficients = lowpass(500.0);
        let mut state = SectionState::default();

        let mut y = 0.0;
        for _ in 0..10_000 {
            y = state.process_sample(&coefficients, 1.0);
        }
        assert_approx_eq!(f32, y, 1.0, epsilon = 1e-3);

        state.reset();
        assert_eq!(state.process_sample(&coefficients, 0.0), 0.0);
    }

    #[test]
    fn slot_starts_bypassed_with_identity() {
        let slot = SectionSlot::new();
        assert!(slot.is_bypassed());
        assert_eq!(slot.load(), SectionCoefficients::IDENTITY);
    }

    #[test]
    fn slot_replaces_the_whole_tuple() {
        let slot = SectionSlot::new();
        let coefficients = lowpass(2000.0);

        slot.store(coefficients);
        slot.set_bypassed(false);

        assert_eq!(slot.load(), coefficients);
        assert!(!slot.is_bypassed());
    }

    #[test]
    fn non_finite_coefficients_are_detected() {
        let mut coefficients = SectionCoefficients::IDENTITY;
        assert!(coefficients.is_finite());

        coefficients.a2 = f32::NAN;
        assert!(!coefficients.is_finite());

        coefficients.a2 = 0.0;
        coefficients.b1 = f32::INFINITY;
        assert!(!coefficients.is_finite());
    }
}
