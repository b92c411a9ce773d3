//! One-shot replication of the field model across a process group.
//!
//! The coordinator's model is authoritative. Every other rank discards what
//! it may have configured locally and installs the coordinator's values
//! verbatim. The exchange is a single blocking collective and must finish
//! before any rank evaluates forces.

use efield_compute::{CommError, Communicator};

use crate::types::{Axis, FieldModel, FieldTerm};

/// Number of scalars exchanged: four parameters for each of three axes.
pub const PAYLOAD_LEN: usize = 12;

/// Pack the model as `[E0; 3]`, `[omega; 3]`, `[t0; 3]`, `[sigma; 3]`.
pub fn pack(model: &FieldModel) -> [f64; PAYLOAD_LEN] {
    let mut payload = [0.0; PAYLOAD_LEN];
    for (axis, term) in model.terms() {
        let m = axis.index();
        payload[m] = term.amplitude();
        payload[3 + m] = term.angular_frequency();
        payload[6 + m] = term.pulse_center();
        payload[9 + m] = term.pulse_width();
    }
    payload
}

/// Inverse of [`pack`].
pub fn unpack(payload: &[f64; PAYLOAD_LEN]) -> FieldModel {
    let mut model = FieldModel::default();
    for axis in Axis::ALL {
        let m = axis.index();
        model.set_term(
            axis,
            FieldTerm::new(payload[m], payload[3 + m], payload[6 + m], payload[9 + m]),
        );
    }
    model
}

/// Replicate the coordinator's model to every rank of `comm`.
pub fn broadcast_model(model: &mut FieldModel, comm: &dyn Communicator) -> Result<(), CommError> {
    let mut payload = if comm.is_coordinator() {
        pack(model)
    } else {
        [0.0; PAYLOAD_LEN]
    };
    comm.broadcast(&mut payload)?;
    if !comm.is_coordinator() {
        *model = unpack(&payload);
    }
    log::debug!(
        "rank {}/{}: electric field parameters distributed",
        comm.rank(),
        comm.size()
    );
    Ok(())
}
