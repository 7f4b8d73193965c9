//! Ownership checks for file access.
//!
//! Authentication answers "who is this"; this check answers "can this
//! identity touch this file". It runs strictly after the existence
//! check, so a missing file is always `NotFound` and a foreign file is
//! always `Forbidden`.

use super::metadata::StoredFile;
use crate::{DepotError, Result};

/// Authorize access to a file for the requesting user.
///
/// Applied identically before download and before delete.
pub fn authorize_file_access(file: &StoredFile, requester_id: i64) -> Result<()> {
    if file.owner_id != requester_id {
        return Err(DepotError::Forbidden(
            "you do not have permission to access this file".to_string(),
        ));
    }
    Ok(())
}
