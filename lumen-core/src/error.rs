//! Error taxonomy for the registry and its collaborators.
//!
//! None of these are fatal. The public `set_fx*` surface logs them and keeps
//! going; the `Result`-returning APIs exist so callers and tests can see
//! exactly what was rejected.

use lumen_types::ValueKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("address {0} is already registered")]
    DuplicateAddress(String),
    #[error("cannot register an empty address")]
    EmptyAddress,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoerceError {
    #[error("expected {expected}, got {found}")]
    TypeMismatch { expected: ValueKind, found: ValueKind },
    #[error("ordinal {0} does not name a variant")]
    UnknownOrdinal(i32),
    #[error("non-finite number {0}")]
    NonFinite(f32),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("no element registered at {0}")]
    AddressNotFound(String),
    #[error("{address} takes {expected} argument(s), got {got}")]
    ArityMismatch {
        address: String,
        expected: usize,
        got: usize,
    },
    #[error("{address}, argument {index}: {reason}")]
    TypeMismatch {
        address: String,
        index: usize,
        reason: CoerceError,
    },
    #[error("element at {0} was dropped without being unregistered")]
    DanglingEntry(String),
    #[error("{address}: call nested {depth} deep, dropped")]
    Reentrant { address: String, depth: u32 },
}

impl DispatchError {
    pub fn address(&self) -> &str {
        match self {
            DispatchError::AddressNotFound(a) | DispatchError::DanglingEntry(a) => a,
            DispatchError::ArityMismatch { address, .. }
            | DispatchError::TypeMismatch { address, .. }
            | DispatchError::Reentrant { address, .. } => address,
        }
    }
}

/// Setup-time failure of an effect that depends on an external component.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    #[error("{effect} requires {collaborator}, which is absent; feature disabled")]
    MissingCollaborator {
        effect: String,
        collaborator: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_address() {
        let e = DispatchError::ArityMismatch {
            address: "/a/b".into(),
            expected: 1,
            got: 2,
        };
        assert_eq!(e.to_string(), "/a/b takes 1 argument(s), got 2");
        assert_eq!(e.address(), "/a/b");

        let e = DispatchError::TypeMismatch {
            address: "/a/c".into(),
            index: 0,
            reason: CoerceError::TypeMismatch {
                expected: ValueKind::Color,
                found: ValueKind::Float,
            },
        };
        assert_eq!(e.to_string(), "/a/c, argument 0: expected color, got float");
    }
}
