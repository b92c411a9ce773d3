//! Archive record for the applied field.
//!
//! The record has been stable since the first archives that carried a
//! field, and has no version tag of its own. For each axis in the order
//! X, Y, Z it stores:
//!
//! ```text
//! int  n                     ; 1 if the axis has a static term
//! int  nt                    ; 1 if omega, t0 or sigma is non-zero
//! real amplitude[n]
//! real pulse_center[n]
//! real angular_frequency[nt]
//! real pulse_width[nt]
//! ```
//!
//! The arrays are stored as amplitude, pulse centre, frequency, width. This
//! is not the order of the term's parameters and must stay as it is; the
//! layout is shared with every existing archive.
//!
//! Integers are 4-byte big-endian. Reals are big-endian and single or
//! double precision depending on the archive, see [`Precision`].

use std::io::{Read, Write};

use thiserror::Error;

use crate::types::{Axis, FieldModel, FieldTerm};
use crate::xdr::{XdrReader, XdrWriter};

/// Width of the reals stored in an archive.
///
/// Double precision stores the model exactly. Single precision matches
/// archives from mixed-precision builds and rounds every real to `f32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// 4-byte IEEE-754 reals.
    Single,
    /// 8-byte IEEE-754 reals.
    #[default]
    Double,
}

impl Precision {
    pub fn real_size(self) -> usize {
        match self {
            Precision::Single => 4,
            Precision::Double => 8,
        }
    }
}

/// Errors reading or writing the field record.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "Can not handle archives with more than one electric field term per direction \
         (axis {axis}: n = {n}, nt = {nt})"
    )]
    MultipleTerms { axis: Axis, n: i32, nt: i32 },

    #[error("Corrupt electric field record on axis {axis}: n = {n}, nt = {nt}")]
    NegativeCount { axis: Axis, n: i32, nt: i32 },
}

/// Write the field record for `model`.
pub fn write_field_record<W: Write + ?Sized>(
    writer: &mut W,
    model: &FieldModel,
    precision: Precision,
) -> Result<(), ArchiveError> {
    let mut xdr = XdrWriter::new(writer, precision);
    for (_, term) in model.terms() {
        // Every axis is written with a static term, active or not.
        let n = 1;
        let nt = i32::from(term.is_time_dependent());
        xdr.put_int(n)?;
        xdr.put_int(nt)?;
        xdr.put_reals(&[term.amplitude()])?;
        xdr.put_reals(&[term.pulse_center()])?;
        if nt == 1 {
            xdr.put_reals(&[term.angular_frequency()])?;
            xdr.put_reals(&[term.pulse_width()])?;
        }
    }
    log::debug!("wrote electric field record ({:?} precision)", precision);
    Ok(())
}

/// Read a field record.
///
/// Fails on any axis declaring more than one term; such archives cannot be
/// represented by a [`FieldModel`].
pub fn read_field_record<R: Read + ?Sized>(
    reader: &mut R,
    precision: Precision,
) -> Result<FieldModel, ArchiveError> {
    let mut xdr = XdrReader::new(reader, precision);
    let mut model = FieldModel::default();
    for axis in Axis::ALL {
        let n = xdr.get_int()?;
        let nt = xdr.get_int()?;
        if n < 0 || nt < 0 {
            return Err(ArchiveError::NegativeCount { axis, n, nt });
        }
        if n > 1 || nt > 1 {
            return Err(ArchiveError::MultipleTerms { axis, n, nt });
        }
        let (n, nt) = (n as usize, nt as usize);

        // Sized one past the declared count, so index 0 exists (and reads
        // as zero) even for an absent array.
        let mut amplitude = vec![0.0; n + 1];
        let mut pulse_center = vec![0.0; n + 1];
        let mut angular_frequency = vec![0.0; nt + 1];
        let mut pulse_width = vec![0.0; nt + 1];
        xdr.get_reals(&mut amplitude[..n])?;
        xdr.get_reals(&mut pulse_center[..n])?;
        xdr.get_reals(&mut angular_frequency[..nt])?;
        xdr.get_reals(&mut pulse_width[..nt])?;

        if n > 0 {
            model.set_term(
                axis,
                FieldTerm::new(amplitude[0], angular_frequency[0], pulse_center[0], pulse_width[0]),
            );
        }
    }
    log::debug!("read electric field record ({:?} precision)", precision);
    Ok(model)
}

/// Size in bytes of the record [`write_field_record`] produces for `model`.
pub fn record_size(model: &FieldModel, precision: Precision) -> usize {
    model
        .terms()
        .map(|(_, term)| {
            let reals = if term.is_time_dependent() { 4 } else { 2 };
            2 * 4 + reals * precision.real_size()
        })
        .sum()
}
