// Core modules implementing the record ring, stream addressing, and error modeling.
pub mod accumulator;
pub mod config;
pub mod device;
pub mod error;
pub mod offsets;
pub mod record;
pub mod ring;
pub mod seekto;
pub mod transfer;
