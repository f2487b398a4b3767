// SPDX-License-Identifier: Apache-2.0

//! Primary backend selection (spec §4.2 "Primary backend selection").

use crate::error::Error;
use openhcs_core::backend::{BackendFamily, BackendId};

/// Picks the read backend and mandatory write-backend override (if any)
/// for a plate, given its microscope handler's compatible-backend list in
/// priority order.
///
/// The first compatible backend is always the read backend. If that
/// backend belongs to the virtual family, it is *also* the mandatory write
/// backend, overriding whatever materialization backend the user
/// configured (spec §4.2: "overriding user preference").
#[must_use]
pub fn select_primary_backend(compatible_backends: &[BackendId]) -> Option<PrimarySelection> {
    let read_backend = compatible_backends.first()?.clone();
    let mandatory_write_backend = match read_backend.family() {
        BackendFamily::Virtual => Some(read_backend.clone()),
        BackendFamily::Storage => None,
    };
    Some(PrimarySelection { read_backend, mandatory_write_backend })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimarySelection {
    pub read_backend: BackendId,
    pub mandatory_write_backend: Option<BackendId>,
}

/// Enforces spec §4.2's "fail loudly on attempts to write real paths to a
/// virtual-only plate": given the plate's mandatory write backend (if any)
/// and a user-requested write backend, returns the backend that must
/// actually be used, or an error if the user's request is incompatible.
pub fn resolve_write_backend(
    mandatory_write_backend: Option<&BackendId>,
    requested: &BackendId,
) -> Result<BackendId, Error> {
    match mandatory_write_backend {
        Some(mandatory) if mandatory != requested && requested.family() == BackendFamily::Storage => {
            Err(Error::VirtualOnlyWrite { backend: requested.clone() })
        }
        Some(mandatory) => Ok(mandatory.clone()),
        None => Ok(requested.clone()),
    }
}
