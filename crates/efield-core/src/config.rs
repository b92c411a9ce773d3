//! Structured configuration and option binding.
//!
//! The modern form carries one section per axis:
//!
//! ```toml
//! [electric-field.x]
//! E0 = 0.5       # V/nm
//! omega = 150.0  # 1/ps
//! t0 = 5.0       # ps
//! sigma = 1.0    # ps
//! ```
//!
//! Every field defaults to zero and can be bound independently. The legacy
//! grammar in [`crate::legacy`] produces the same [`ElectricFieldSection`].

use serde::{Deserialize, Serialize};

use crate::legacy::InputError;
use crate::types::{Axis, FieldModel, FieldTerm};

/// Name of the structured configuration section.
pub const SECTION_NAME: &str = "electric-field";

/// Parameters for one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisSection {
    /// Amplitude (V/nm).
    #[serde(rename = "E0")]
    pub e0: f64,
    /// Angular frequency (1/ps).
    pub omega: f64,
    /// Time of the pulse peak (ps).
    pub t0: f64,
    /// Pulse width (ps); zero disables the envelope.
    pub sigma: f64,
}

impl AxisSection {
    pub fn to_term(&self) -> FieldTerm {
        FieldTerm::new(self.e0, self.omega, self.t0, self.sigma)
    }
}

impl From<&FieldTerm> for AxisSection {
    fn from(term: &FieldTerm) -> Self {
        Self {
            e0: term.amplitude(),
            omega: term.angular_frequency(),
            t0: term.pulse_center(),
            sigma: term.pulse_width(),
        }
    }
}

/// The `electric-field` section: one [`AxisSection`] per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectricFieldSection {
    pub x: AxisSection,
    pub y: AxisSection,
    pub z: AxisSection,
}

impl ElectricFieldSection {
    pub fn axis(&self, axis: Axis) -> &AxisSection {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut AxisSection {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }

    /// Bind the section to a field model.
    ///
    /// Fails if any pulse width is negative.
    pub fn to_model(&self) -> Result<FieldModel, InputError> {
        let mut model = FieldModel::default();
        for axis in Axis::ALL {
            let section = self.axis(axis);
            if section.sigma < 0.0 {
                return Err(InputError::NegativePulseWidth {
                    key: format!("{}/{}/sigma", SECTION_NAME, axis.key()),
                    value: section.sigma,
                });
            }
            model.set_term(axis, section.to_term());
        }
        Ok(model)
    }
}

impl From<&FieldModel> for ElectricFieldSection {
    fn from(model: &FieldModel) -> Self {
        Self {
            x: model.term(Axis::X).into(),
            y: model.term(Axis::Y).into(),
            z: model.term(Axis::Z).into(),
        }
    }
}

/// Structured options for all simulation extensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionOptions {
    #[serde(rename = "electric-field")]
    pub electric_field: ElectricFieldSection,
}
