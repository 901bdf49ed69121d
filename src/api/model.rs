//! Purpose: Define the registry wire records and the resource/relation mapping.
//! Exports: `Patient`, `Medication`, `Pharmacy`, `Physician`, `Resource`, `SubResource`.
//! Role: Stable serde models aligned with the registry's camelCase JSON.
//! Invariants: Field names mirror the wire format via serde renames.
//! Invariants: Unknown wire fields (HAL `_links`, paging metadata) are ignored.

use crate::core::dispatch::UNSAVED_ID;
use serde::{Deserialize, Serialize};

/// A record the registry serves under a fixed HAL relation name.
///
/// `REL` is the key under `_embedded` in collection responses; for records
/// nested below a patient it is also the URL segment of the sub-resource.
pub trait Resource {
    const REL: &'static str;

    fn id(&self) -> i64;
}

/// Marker for records fetched through `{base}/{id}/<relation>`.
pub trait SubResource: Resource {}

/// Patient demographics record.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Patient {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
}

impl Patient {
    /// Build a patient that has never been persisted; saving it creates it.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: UNSAVED_ID,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }
}

impl Resource for Patient {
    const REL: &'static str = "patients";

    fn id(&self) -> i64 {
        self.id
    }
}

/// Medication prescribed to a patient.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Medication {
    pub id: i64,
    pub name: String,
    pub dosage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
}

impl Resource for Medication {
    const REL: &'static str = "medications";

    fn id(&self) -> i64 {
        self.id
    }
}

impl SubResource for Medication {}

/// Pharmacy dispensing for a patient.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Pharmacy {
    pub id: i64,
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Resource for Pharmacy {
    const REL: &'static str = "pharmacies";

    fn id(&self) -> i64 {
        self.id
    }
}

impl SubResource for Pharmacy {}

/// Physician treating a patient.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Physician {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
}

impl Resource for Physician {
    const REL: &'static str = "physicians";

    fn id(&self) -> i64 {
        self.id
    }
}

impl SubResource for Physician {}
