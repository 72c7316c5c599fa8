use std::io::{self, Read, Write};

/// Byte budget of the record currently being read or written
///
/// The window does not own the stream: each call borrows it, so the reader and the writer can
/// keep the stream and the window side by side.
#[derive(Debug)]
pub(crate) struct RecordWindow {
    remaining: u32,
}

impl RecordWindow {
    pub(crate) fn new(caplen: u32) -> RecordWindow {
        RecordWindow { remaining: caplen }
    }

    #[inline]
    pub(crate) fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Read at most `remaining` bytes
    ///
    /// Returns `Ok(0)` once the record is consumed. If the stream ends before that,
    /// fails with `ErrorKind::UnexpectedEof`.
    pub(crate) fn read<R: Read>(&mut self, r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = buf.len().min(self.remaining as usize);
        let n = loop {
            match r.read(&mut buf[..max]) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                res => break res?,
            }
        };
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("record truncated, {} bytes missing", self.remaining),
            ));
        }
        self.remaining -= n as u32;
        Ok(n)
    }

    /// Write the part of `buf` that fits in the record
    ///
    /// Returns the number of bytes written and whether `buf` had to be cut.
    pub(crate) fn write<W: Write>(&mut self, w: &mut W, buf: &[u8]) -> io::Result<(usize, bool)> {
        let overflow = buf.len() > self.remaining as usize;
        let buf = if overflow {
            &buf[..self.remaining as usize]
        } else {
            buf
        };
        w.write_all(buf)?;
        self.remaining -= buf.len() as u32;
        Ok((buf.len(), overflow))
    }
}
