use nom::error::{ErrorKind, ParseError};
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by [`PcapReader`](crate::PcapReader) and [`PcapWriter`](crate::PcapWriter)
///
/// The reader and the writer remember the first error they hit and return a clone of it from
/// every later call, so this type is cheap to clone: I/O errors are shared behind an `Arc`.
#[derive(Clone, Debug, Error)]
pub enum PcapError {
    /// Clean end of stream, reached exactly at a record boundary
    #[error("end of stream")]
    Eof,
    /// The stream ended while a header or a record payload was only partially available
    #[error("unexpected end of stream (truncated capture)")]
    UnexpectedEof,
    /// The magic number matches neither byte order of `0xa1b2c3d4`
    #[error("pcap: bad magic number 0x{0:08x}")]
    BadMagic(u32),
    /// More payload was supplied than the current record header declared. The first
    /// `written` bytes were committed to the stream anyway.
    #[error("pcap: write too long ({written} bytes written)")]
    WriteTooLong { written: usize },
    /// A write operation was attempted after `close`
    #[error("pcap: write after close")]
    WriteAfterClose,
    /// Error from the underlying stream
    #[error("I/O error: {0}")]
    Io(#[source] Arc<io::Error>),
    /// Header decoding error
    #[error("nom error: {0:?}")]
    NomError(ErrorKind),
}

impl From<io::Error> for PcapError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => PcapError::UnexpectedEof,
            _ => PcapError::Io(Arc::new(e)),
        }
    }
}

impl From<cookie_factory::GenError> for PcapError {
    fn from(e: cookie_factory::GenError) -> Self {
        match e {
            cookie_factory::GenError::IoError(e) => PcapError::from(e),
            cookie_factory::GenError::BufferTooSmall(n) => PcapError::from(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write, {} bytes not written", n),
            )),
            e => PcapError::from(io::Error::new(
                io::ErrorKind::Other,
                format!("serialization failed: {:?}", e),
            )),
        }
    }
}

impl From<PcapError> for io::Error {
    fn from(e: PcapError) -> Self {
        match e {
            PcapError::Io(inner) => io::Error::new(inner.kind(), PcapError::Io(inner)),
            PcapError::Eof | PcapError::UnexpectedEof => {
                io::Error::new(io::ErrorKind::UnexpectedEof, e)
            }
            PcapError::WriteTooLong { .. } => io::Error::new(io::ErrorKind::InvalidInput, e),
            PcapError::WriteAfterClose => io::Error::new(io::ErrorKind::BrokenPipe, e),
            PcapError::BadMagic(_) | PcapError::NomError(_) => {
                io::Error::new(io::ErrorKind::InvalidData, e)
            }
        }
    }
}

impl<I> ParseError<I> for PcapError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        PcapError::NomError(kind)
    }
    fn append(_input: I, kind: ErrorKind, _other: Self) -> Self {
        PcapError::NomError(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::PcapError;
    use std::io;

    #[test]
    fn test_io_eof_maps_to_unexpected_eof() {
        let e = io::Error::new(io::ErrorKind::UnexpectedEof, "short");
        assert!(matches!(PcapError::from(e), PcapError::UnexpectedEof));
    }

    #[test]
    fn test_into_io_error_kind() {
        let e: io::Error = PcapError::WriteTooLong { written: 3 }.into();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);
        let e: io::Error = PcapError::from(io::Error::from(io::ErrorKind::BrokenPipe)).into();
        assert_eq!(e.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            PcapError::BadMagic(0xdead_beef).to_string(),
            "pcap: bad magic number 0xdeadbeef"
        );
    }
}
