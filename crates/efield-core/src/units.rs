//! Physical constants for the simulation unit system.
//!
//! Internal units are nm, ps, kJ/mol and the elementary charge `e`. Values
//! are the exact SI-2019 defining constants.

/// Avogadro constant (1/mol).
pub const AVOGADRO: f64 = 6.022_140_76e23;

/// Elementary charge (C).
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Faraday constant (C/mol), $F = e N_A$.
pub const FARADAY: f64 = ELEMENTARY_CHARGE * AVOGADRO;

pub const KILO: f64 = 1e3;

/// Converts a field in V/nm acting on a charge in `e` into a force in
/// kJ mol⁻¹ nm⁻¹.
///
/// One e·V is $e \cdot 1\,\text{J/C}$ per particle; per mole that is
/// $F$ J/mol, hence $F / 1000$ kJ/mol.
pub const FIELD_CONVERSION: f64 = FARADAY / KILO;
