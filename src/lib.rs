//! Purpose: Shared library crate used by the `caredex` CLI and tests.
//! Exports: `api` (records, registry client, errors) and `core` (envelope, routing).
//! Role: Library backing the binary; `api` is the supported surface.
//! Invariants: Callers reach core types through `api` re-exports.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
