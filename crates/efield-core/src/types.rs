//! Core types: spatial axes, per-axis field terms and the field model.
//!
//! A [`FieldModel`] always holds exactly one [`FieldTerm`] per axis. Terms
//! are replaced wholesale, never edited field by field.

use std::fmt;

use thiserror::Error;

/// One of the three spatial directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// An axis index outside `0..3` was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Axis index {0} is outside the range 0..3")]
pub struct AxisOutOfRange(pub usize);

impl Axis {
    /// All axes in storage order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Upper-case label used in parameter listings.
    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }

    /// Lower-case name used in configuration keys.
    pub fn key(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl TryFrom<usize> for Axis {
    type Error = AxisOutOfRange;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Axis::ALL.get(index).copied().ok_or(AxisOutOfRange(index))
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The four scalar parameters of a field term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Amplitude,
    AngularFrequency,
    PulseCenter,
    PulseWidth,
}

impl Parameter {
    pub const ALL: [Parameter; 4] = [
        Parameter::Amplitude,
        Parameter::AngularFrequency,
        Parameter::PulseCenter,
        Parameter::PulseWidth,
    ];

    /// Configuration name of the parameter (`E0`, `omega`, `t0`, `sigma`).
    pub fn name(self) -> &'static str {
        match self {
            Parameter::Amplitude => "E0",
            Parameter::AngularFrequency => "omega",
            Parameter::PulseCenter => "t0",
            Parameter::PulseWidth => "sigma",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field parameters for a single axis.
///
/// The default term has zero amplitude and contributes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldTerm {
    /// Amplitude (V/nm).
    amplitude: f64,
    /// Angular frequency (1/ps).
    angular_frequency: f64,
    /// Time of the pulse peak (ps).
    pulse_center: f64,
    /// Width of the Gaussian envelope (ps); zero means no envelope.
    pulse_width: f64,
}

impl FieldTerm {
    pub fn new(amplitude: f64, angular_frequency: f64, pulse_center: f64, pulse_width: f64) -> Self {
        Self {
            amplitude,
            angular_frequency,
            pulse_center,
            pulse_width,
        }
    }

    /// A time-independent field of the given amplitude.
    pub fn constant(amplitude: f64) -> Self {
        Self::new(amplitude, 0.0, 0.0, 0.0)
    }

    /// Replace all four parameters at once.
    pub fn set(&mut self, amplitude: f64, angular_frequency: f64, pulse_center: f64, pulse_width: f64) {
        *self = Self::new(amplitude, angular_frequency, pulse_center, pulse_width);
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn angular_frequency(&self) -> f64 {
        self.angular_frequency
    }

    pub fn pulse_center(&self) -> f64 {
        self.pulse_center
    }

    pub fn pulse_width(&self) -> f64 {
        self.pulse_width
    }

    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Amplitude => self.amplitude,
            Parameter::AngularFrequency => self.angular_frequency,
            Parameter::PulseCenter => self.pulse_center,
            Parameter::PulseWidth => self.pulse_width,
        }
    }

    /// Whether any of the time-dependent parameters is non-zero.
    pub fn is_time_dependent(&self) -> bool {
        self.angular_frequency != 0.0 || self.pulse_center != 0.0 || self.pulse_width != 0.0
    }

    /// Field strength (V/nm) at time `t` (ps).
    ///
    /// With a positive pulse width the oscillation is enveloped by a
    /// Gaussian centred on the pulse centre:
    ///
    /// $E(t) = E_0 \cos(\omega (t - t_0)) \exp\left(-\frac{(t - t_0)^2}{2\sigma^2}\right)$
    ///
    /// otherwise $E(t) = E_0 \cos(\omega t)$, which is static for $\omega = 0$.
    pub fn evaluate(&self, t: f64) -> f64 {
        if self.pulse_width > 0.0 {
            let dt = t - self.pulse_center;
            self.amplitude
                * ((self.angular_frequency * dt).cos()
                    * (-(dt * dt) / (2.0 * self.pulse_width * self.pulse_width)).exp())
        } else {
            self.amplitude * (self.angular_frequency * t).cos()
        }
    }
}

/// The applied field: one term per spatial axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldModel {
    terms: [FieldTerm; 3],
}

impl FieldModel {
    pub fn new(x: FieldTerm, y: FieldTerm, z: FieldTerm) -> Self {
        Self { terms: [x, y, z] }
    }

    pub fn term(&self, axis: Axis) -> &FieldTerm {
        &self.terms[axis.index()]
    }

    /// Replace the term for `axis`.
    pub fn set_term(&mut self, axis: Axis, term: FieldTerm) {
        self.terms[axis.index()] = term;
    }

    /// Iterate over `(axis, term)` pairs in axis order.
    pub fn terms(&self) -> impl Iterator<Item = (Axis, &FieldTerm)> {
        Axis::ALL.into_iter().zip(self.terms.iter())
    }

    /// Whether any axis has a non-zero amplitude.
    ///
    /// Always recomputed from the current terms, since a model can be
    /// overwritten between configuration and broadcast.
    pub fn is_active(&self) -> bool {
        self.terms.iter().any(|term| term.amplitude() != 0.0)
    }

    /// Field strength (V/nm) along `axis` at time `t` (ps).
    pub fn field(&self, axis: Axis, t: f64) -> f64 {
        self.term(axis).evaluate(t)
    }

    /// Field strength along all three axes at time `t`.
    pub fn fields_at(&self, t: f64) -> [f64; 3] {
        [
            self.field(Axis::X, t),
            self.field(Axis::Y, t),
            self.field(Axis::Z, t),
        ]
    }
}
