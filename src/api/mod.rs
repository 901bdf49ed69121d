//! Purpose: Define the stable public Rust API boundary for Caredex.
//! Exports: Record types, the registry client, and error plumbing for the CLI.
//! Role: Public, additive-only surface; hides envelope and routing internals.
//! Invariants: This module is the only public path to the core modules.

mod client;
mod model;

pub use crate::core::dispatch::{Operation, UNSAVED_ID};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use client::PatientClient;
pub use model::{Medication, Patient, Pharmacy, Physician, Resource, SubResource};
