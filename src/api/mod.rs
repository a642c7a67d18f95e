//! Purpose: Define the public Rust API boundary for cmdring.
//! Exports: Device, handles, cursors, seek requests, configuration, and errors.
//! Role: Public, additive-only surface; the CLI and tests use only this path.
//! Invariants: Handles never share cursors; all of them share the device lock.

mod handle;

pub use crate::core::config::DeviceConfig;
pub use crate::core::device::{Cursor, Device, DeviceStats, SeekMode, Teardown};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind, to_errno};
pub use crate::core::offsets::StreamPosition;
pub use crate::core::record::{Record, TERMINATOR};
pub use crate::core::ring::DEFAULT_CAPACITY;
pub use crate::core::seekto::{IOC_SEEKTO, SEEKTO_LEN, SeekTo};
pub use crate::core::transfer::{ByteSink, ByteSource};
pub use handle::Handle;
