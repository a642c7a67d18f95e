//! Purpose: Library crate backing the `cmdring` CLI and tests.
//! Exports: `api` (device, handles, errors), `core` (ring store and friends).
//! Role: In-memory command log addressed as one contiguous byte stream.
//! Invariants: All device state mutations go through `core::device::Device`.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
