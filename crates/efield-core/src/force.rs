//! Per-timestep force contribution of the applied field.
//!
//! For every axis with a non-zero field, each local particle receives
//! $\Delta f_{i,m} = q_i \, c \, E_m(t)$, where $c$ converts V/nm times `e`
//! into the simulation's force unit. Only the unperturbed charges are used;
//! runs with perturbed charges get the field force of the unperturbed state.

use ndarray::{s, ArrayViewMut2};

use crate::types::{Axis, FieldModel};

/// Add the field force to the first `local_count` rows of `forces`.
///
/// `forces` has one row per particle and one column per axis. Entries are
/// only added to, never overwritten; rows beyond `local_count` belong to
/// other ranks and are left alone. `local_count` is clamped to the particles
/// actually present in `charges` and `forces`. Columns beyond the third are
/// ignored, and a buffer with fewer than three columns is left untouched.
pub fn add_field_forces(
    model: &FieldModel,
    charges: &[f64],
    local_count: usize,
    t: f64,
    conversion: f64,
    mut forces: ArrayViewMut2<'_, f64>,
) {
    if !model.is_active() {
        return;
    }
    if forces.ncols() < Axis::ALL.len() {
        log::error!("force buffer has {} columns, expected 3; field force not applied", forces.ncols());
        return;
    }
    let local_count = local_count.min(charges.len()).min(forces.nrows());
    let charges = &charges[..local_count];

    for axis in Axis::ALL {
        let strength = conversion * model.field(axis, t);
        if strength == 0.0 {
            continue;
        }
        let mut column = forces.slice_mut(s![..local_count, axis.index()]);
        for (f, &q) in column.iter_mut().zip(charges) {
            *f += q * strength;
        }
    }
}
