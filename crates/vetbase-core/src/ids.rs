//! Strongly Typed Identifiers
//!
//! This module provides type-safe identifier types for vetbase.
//! Using the newtype pattern, these types prevent accidental misuse of
//! different ID types at compile time.
//!
//! # Example
//!
//! ```
//! use vetbase_core::{AppointmentId, CollaboratorId};
//!
//! let appointment = AppointmentId::new();
//! let collaborator = CollaboratorId::new();
//!
//! // Type safety: cannot pass CollaboratorId where AppointmentId is expected
//! fn requires_appointment(id: AppointmentId) -> String {
//!     id.to_string()
//! }
//!
//! let result = requires_appointment(appointment);
//! // requires_appointment(collaborator); // This would not compile!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// The underlying UUID parse error message
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a strongly-typed ID type
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns a reference to the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Consumes the ID, returning the underlying UUID.
            #[must_use]
            pub fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        message: e.to_string(),
                    })
            }
        }
    };
}

define_id! {
    /// Identifier for a tutor (animal owner and invoice payer).
    TutorId
}

define_id! {
    /// Identifier for an animal.
    AnimalId
}

define_id! {
    /// Identifier for a collaborator (veterinarian or assistant).
    CollaboratorId
}

define_id! {
    /// Identifier for an appointment.
    AppointmentId
}

define_id! {
    /// Identifier for an attendance (a billable clinical visit).
    AttendanceId
}

define_id! {
    /// Identifier for a product held in stock.
    ProductId
}

define_id! {
    /// Identifier for an invoice.
    InvoiceId
}

define_id! {
    /// Identifier for an invoice installment.
    InstallmentId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        let a = AppointmentId::new();
        let b = AppointmentId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_roundtrip_through_uuid() {
        let id = CollaboratorId::new();
        let uuid: Uuid = id.into();
        assert_eq!(CollaboratorId::from_uuid(uuid), id);
    }

    #[test]
    fn test_from_str_valid() {
        let id = AppointmentId::new();
        let parsed: AppointmentId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_from_str_invalid() {
        let err = "not-a-uuid".parse::<ProductId>().unwrap_err();
        assert_eq!(err.id_type, "ProductId");
    }

    #[test]
    fn test_serde_transparent() {
        let id = InvoiceId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
