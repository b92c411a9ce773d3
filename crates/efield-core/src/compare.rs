//! Tolerance-based comparison of two field models.
//!
//! Used for offline regression checks, e.g. between an archive and the
//! configuration it was generated from.

use std::fmt;

use crate::format::format_g;
use crate::types::{Axis, FieldModel, Parameter};

/// Relative and absolute tolerances for [`compare_models`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub relative: f64,
    pub absolute: f64,
}

impl Tolerance {
    /// Exact comparison.
    pub const EXACT: Tolerance = Tolerance {
        relative: 0.0,
        absolute: 0.0,
    };

    pub fn new(relative: f64, absolute: f64) -> Self {
        Self { relative, absolute }
    }

    /// `|x - y| <= max(absolute, relative * max(|x|, |y|))`.
    pub fn accepts(&self, x: f64, y: f64) -> bool {
        let scale = x.abs().max(y.abs());
        (x - y).abs() <= self.absolute.max(self.relative * scale)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(1e-6, 1e-8)
    }
}

/// A parameter that differs beyond tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub axis: Axis,
    pub parameter: Parameter,
    pub left: f64,
    pub right: f64,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "electric-field/{}/{} ({}, {})",
            self.axis.key(),
            self.parameter,
            format_g(self.left),
            format_g(self.right)
        )
    }
}

/// Compare every parameter of every axis, in axis then parameter order.
pub fn compare_models(left: &FieldModel, right: &FieldModel, tolerance: Tolerance) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    for axis in Axis::ALL {
        let (a, b) = (left.term(axis), right.term(axis));
        for parameter in Parameter::ALL {
            let (x, y) = (a.get(parameter), b.get(parameter));
            if !tolerance.accepts(x, y) {
                mismatches.push(Mismatch {
                    axis,
                    parameter,
                    left: x,
                    right: y,
                });
            }
        }
    }
    mismatches
}
