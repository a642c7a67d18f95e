// File-handle style binding of one cursor to a shared device.
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use crate::core::device::{Cursor, Device, SeekMode};
use crate::core::error::Error;
use crate::core::seekto::SeekTo;
use crate::core::transfer::ByteSource;

/// An open handle: a private cursor over the device's logical stream.
#[derive(Clone, Debug)]
pub struct Handle {
    device: Arc<Device>,
    cursor: Cursor,
}

impl Handle {
    pub fn open(device: &Arc<Device>) -> Self {
        Self {
            device: Arc::clone(device),
            cursor: Cursor::new(),
        }
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn seek_to(&mut self, mode: SeekMode, offset: i64) -> Result<u64, Error> {
        self.device.seek(&mut self.cursor, mode, offset)
    }

    pub fn seek_to_command(&mut self, command_index: u32, byte_offset: u32) -> Result<u64, Error> {
        self.device
            .seek_to_command(&mut self.cursor, SeekTo::new(command_index, byte_offset))
    }

    pub fn ioctl<S: ByteSource + ?Sized>(&mut self, cmd: u32, arg: &mut S) -> Result<u64, Error> {
        self.device.ioctl(&mut self.cursor, cmd, arg)
    }

    /// Reads at most `count` bytes from the current record.
    pub fn read_chunk(&mut self, count: usize) -> Result<Vec<u8>, Error> {
        self.device.read_vec(&mut self.cursor, count)
    }

    /// Reads from the cursor until the stream is exhausted.
    pub fn read_stream(&mut self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        while self.device.read(&mut self.cursor, usize::MAX, &mut out)? > 0 {}
        Ok(out)
    }
}

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = buf.len();
        let mut sink = buf;
        Ok(self.device.read(&mut self.cursor, count, &mut sink)?)
    }
}

impl Write for Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.device.write_bytes(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for Handle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (mode, offset) = SeekMode::from_seek_from(pos)?;
        Ok(self.device.seek(&mut self.cursor, mode, offset)?)
    }
}

#[cfg(test)]
mod tests {
    use super::Handle;
    use crate::core::device::Device;
    use std::io::{self, Read, Seek, SeekFrom, Write};
    use std::sync::Arc;

    #[test]
    fn io_traits_drive_the_device() {
        let device = Arc::new(Device::new(10).expect("device"));
        let mut writer = Handle::open(&device);
        writer.write_all(b"a\nbb\nccc\n").expect("write");

        let mut reader = Handle::open(&device);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).expect("read");
        // One write call holds the only terminator check, so this is one record.
        assert_eq!(out, b"a\nbb\nccc\n");
        assert_eq!(device.stats().expect("stats").live_records, 1);

        assert_eq!(reader.seek(SeekFrom::Start(5)).expect("seek"), 5);
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).expect("read");
        assert_eq!(&buf, b"cc");
    }

    #[test]
    fn handles_keep_private_cursors() {
        let device = Arc::new(Device::new(10).expect("device"));
        let mut writer = Handle::open(&device);
        writer.write_all(b"first\n").expect("write");
        writer.write_all(b"second\n").expect("write");

        let mut a = Handle::open(&device);
        let mut b = Handle::open(&device);
        a.seek_to_command(1, 0).expect("seekto");
        assert_eq!(a.position(), 6);
        assert_eq!(b.position(), 0);
        assert_eq!(a.read_stream().expect("read"), b"second\n");
        assert_eq!(b.read_stream().expect("read"), b"first\nsecond\n");
    }

    #[test]
    fn invalid_seek_maps_to_invalid_input() {
        let device = Arc::new(Device::new(10).expect("device"));
        let mut handle = Handle::open(&device);
        let err = handle.seek(SeekFrom::End(1)).expect_err("past end");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        let err = handle.seek(SeekFrom::Start(u64::MAX)).expect_err("too large");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
