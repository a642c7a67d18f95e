// Command-seek request layout and control-command number decoding.
use crate::core::error::{Error, ErrorKind};

pub const IOC_MAGIC: u8 = 0x16;
pub const IOC_SEEKTO_NR: u8 = 1;
pub const IOC_MAXNR: u8 = 1;
pub const SEEKTO_LEN: usize = 8;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;
const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

const fn iowr(ty: u8, nr: u8, size: usize) -> u32 {
    ((IOC_READ | IOC_WRITE) << IOC_DIRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)
        | ((ty as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
}

/// `_IOWR(0x16, 1, struct { u32, u32 })`.
pub const IOC_SEEKTO: u32 = iowr(IOC_MAGIC, IOC_SEEKTO_NR, SEEKTO_LEN);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeviceCommand {
    SeekTo,
}

pub fn decode_command(cmd: u32) -> Result<DeviceCommand, Error> {
    let ty = ((cmd >> IOC_TYPESHIFT) & 0xFF) as u8;
    let nr = ((cmd >> IOC_NRSHIFT) & 0xFF) as u8;
    if ty != IOC_MAGIC || nr > IOC_MAXNR || cmd != IOC_SEEKTO {
        return Err(Error::new(ErrorKind::NotSupported)
            .with_message(format!("unsupported control command {cmd:#010x}")));
    }
    Ok(DeviceCommand::SeekTo)
}

/// Direct command seek: record `command_index`, byte `byte_offset` within it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SeekTo {
    pub command_index: u32,
    pub byte_offset: u32,
}

impl SeekTo {
    pub fn new(command_index: u32, byte_offset: u32) -> Self {
        Self {
            command_index,
            byte_offset,
        }
    }

    /// Native byte order, matching the in-memory layout of the request struct.
    pub fn encode(&self) -> [u8; SEEKTO_LEN] {
        let mut buf = [0u8; SEEKTO_LEN];
        buf[0..4].copy_from_slice(&self.command_index.to_ne_bytes());
        buf[4..8].copy_from_slice(&self.byte_offset.to_ne_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < SEEKTO_LEN {
            return Err(Error::new(ErrorKind::TransferFault)
                .with_message("command-seek request truncated"));
        }
        Ok(Self {
            command_index: u32::from_ne_bytes(read_4(buf, 0)),
            byte_offset: u32::from_ne_bytes(read_4(buf, 4)),
        })
    }
}

fn read_4(buf: &[u8], offset: usize) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&buf[offset..offset + 4]);
    out
}
