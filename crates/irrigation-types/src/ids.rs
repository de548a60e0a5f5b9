//! Type-safe identifier wrappers for hardware addresses and stored records.
//!
//! Relay pins and ADC inputs are both small integers on the wire, which makes
//! them easy to swap by accident. Each gets its own newtype so the compiler
//! catches a sensor channel passed where a relay pin is expected.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a small unsigned integer.
macro_rules! define_hw_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u8);

        impl $name {
            /// Return the inner numeric value.
            pub const fn into_inner(self) -> u8 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<u8> for $name {
            fn from(value: u8) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u8 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                Self::from(id.0)
            }
        }
    };
}

define_hw_id!(
    /// BCM GPIO number of the digital output driving a zone's pump relay.
    RelayPin
);

define_hw_id!(
    /// Input index on the analog-to-digital converter wired to a zone's
    /// moisture sensor.
    SensorChannel
);

/// Identifier assigned by the event store when a reading is appended.
///
/// Identifiers increase monotonically in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Return the inner row id.
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for RecordId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
