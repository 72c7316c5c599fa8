use cookie_factory::gen_simple;
use log::{debug, trace, warn};
use std::convert::TryFrom;
use std::io::{self, Write};
use std::time::Duration;

use super::header::{PcapHeader, RecordHeader};
use super::window::RecordWindow;
use crate::error::PcapError;
use crate::serialize::{pcap_header_le, record_header_le, ToVec};

/// Sequential writer of legacy pcap data
///
/// Call [`write_header`](PcapWriter::write_header) once, then for each record call
/// [`write_record_header`](PcapWriter::write_record_header) followed by
/// [`write_payload`](PcapWriter::write_payload), supplying at most `caplen` bytes in total.
/// Payload bytes past `caplen` are dropped and reported with `PcapError::WriteTooLong`.
///
/// Output is always little-endian. The first I/O error is remembered and returned by every later
/// call, including [`close`](PcapWriter::close). After `close`, write operations fail with
/// `PcapError::WriteAfterClose`.
///
/// The writer does not own the end of the stream: there is no trailer, so a capture is complete
/// as soon as the last payload is written.
///
/// ## Example
///
/// ```rust
/// use pcap_stream::*;
/// use std::time::Duration;
///
/// # fn run() -> Result<(), PcapError> {
/// let mut writer = PcapWriter::new(Vec::new());
/// writer.write_header(&PcapHeader::with_linktype(Linktype::ETHERNET))?;
/// let frame = [0u8; 60];
/// let record = RecordHeader::new(Duration::from_secs(1), frame.len() as u32, frame.len() as u32);
/// writer.write_record_header(&record)?;
/// writer.write_payload(&frame)?;
/// writer.close()?;
/// assert_eq!(writer.into_inner().len(), 24 + 16 + 60);
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
pub struct PcapWriter<W>
where
    W: Write,
{
    writer: W,
    record: RecordWindow,
    error: Option<PcapError>,
    closed: bool,
}

impl<W> PcapWriter<W>
where
    W: Write,
{
    /// Creates a new `PcapWriter<W>`. Nothing is written until `write_header` is called.
    pub fn new(writer: W) -> PcapWriter<W> {
        PcapWriter {
            writer,
            record: RecordWindow::new(0),
            error: None,
            closed: false,
        }
    }

    /// Write the global header.
    ///
    /// Magic and version are always set to `0xa1b2c3d4` and 2.4. A zero `snaplen` is replaced
    /// by [`DEFAULT_SNAPLEN`](crate::DEFAULT_SNAPLEN); all other fields are written as given.
    pub fn write_header(&mut self, header: &PcapHeader) -> Result<(), PcapError> {
        self.check()?;
        let mut header = header.clone();
        header.fix();
        debug!(
            "pcap: writing header, snaplen {}, linktype {}",
            header.snaplen, header.network
        );
        gen_simple(pcap_header_le(&header), &mut self.writer)
            .map(|_| ())
            .map_err(|e| self.fault(e.into()))
    }

    /// Write a record header, and prepare to accept `record.caplen` bytes of payload.
    ///
    /// The record header is written as given.
    pub fn write_record_header(&mut self, record: &RecordHeader) -> Result<(), PcapError> {
        self.check()?;
        if self.record.remaining() > 0 {
            warn!(
                "pcap: previous record is {} bytes short, capture will be corrupt",
                self.record.remaining()
            );
        }
        gen_simple(record_header_le(record), &mut self.writer)
            .map(|_| ())
            .map_err(|e| self.fault(e.into()))?;
        trace!("pcap: record caplen={} origlen={}", record.caplen, record.origlen);
        self.record = RecordWindow::new(record.caplen);
        Ok(())
    }

    /// Write payload bytes of the current record. Returns the number of bytes written.
    ///
    /// If `buf` is longer than the remaining part of the record, only the bytes that fit are
    /// written, and `PcapError::WriteTooLong` reports how many.
    pub fn write_payload(&mut self, buf: &[u8]) -> Result<usize, PcapError> {
        self.check()?;
        match self.record.write(&mut self.writer, buf) {
            Ok((n, false)) => Ok(n),
            Ok((n, true)) => {
                warn!(
                    "pcap: payload too long, {} of {} bytes written",
                    n,
                    buf.len()
                );
                Err(PcapError::WriteTooLong { written: n })
            }
            Err(e) => Err(self.fault(e.into())),
        }
    }

    /// Write a complete record: a header with `caplen` and `origlen` set to `data.len()`,
    /// followed by `data`.
    pub fn write_packet(&mut self, timestamp: Duration, data: &[u8]) -> Result<(), PcapError> {
        let len = u32::try_from(data.len()).map_err(|_| PcapError::WriteTooLong { written: 0 })?;
        self.write_record_header(&RecordHeader::new(timestamp, len, len))?;
        self.write_payload(data).map(|_| ())
    }

    /// Close the writer. The underlying stream is flushed, but not closed.
    ///
    /// Calling `close` again has no effect. If an error occurred before, it is returned.
    pub fn close(&mut self) -> Result<(), PcapError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.writer.flush().map_err(|e| self.fault(e.into()))
    }

    /// Number of payload bytes still expected for the current record
    pub fn remaining(&self) -> u32 {
        self.record.remaining()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn check(&self) -> Result<(), PcapError> {
        if self.closed {
            return Err(PcapError::WriteAfterClose);
        }
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn fault(&mut self, e: PcapError) -> PcapError {
        self.error = Some(e.clone());
        e
    }
}

impl<W> Write for PcapWriter<W>
where
    W: Write,
{
    /// A buffer longer than the record is written partially: the bytes that fit are reported as
    /// a short write, and the next call fails with `ErrorKind::InvalidInput`.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.write_payload(buf) {
            Ok(n) | Err(PcapError::WriteTooLong { written: n }) if n > 0 => Ok(n),
            res => res.map_err(io::Error::from),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check()?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcap::{PcapReader, DEFAULT_SNAPLEN};
    use crate::Linktype;

    /// Accepts `capacity` bytes, then fails every write. Counts calls.
    struct FailingWriter {
        data: Vec<u8>,
        capacity: usize,
        writes: usize,
        flushes: usize,
    }

    impl FailingWriter {
        fn new(capacity: usize) -> FailingWriter {
            FailingWriter {
                data: Vec::new(),
                capacity,
                writes: 0,
                flushes: 0,
            }
        }
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            if self.data.len() + buf.len() > self.capacity {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_header_is_normalized() {
        let mut writer = PcapWriter::new(Vec::new());
        let hdr = PcapHeader {
            magic_number: 0x1234_5678,
            version_major: 9,
            version_minor: 9,
            thiszone: 0,
            sigfigs: 0,
            snaplen: 0,
            network: Linktype::RAW,
        };
        writer.write_header(&hdr).unwrap();
        let data = writer.into_inner();
        let reader = PcapReader::new(&data[..]).unwrap();
        let parsed = reader.header();
        assert_eq!(parsed.magic_number, 0xa1b2_c3d4);
        assert_eq!((parsed.version_major, parsed.version_minor), (2, 4));
        assert_eq!(parsed.snaplen, DEFAULT_SNAPLEN);
        assert_eq!(parsed.network, Linktype::RAW);
    }

    #[test]
    fn test_write_too_long() {
        let mut writer = PcapWriter::new(Vec::new());
        writer.write_header(&PcapHeader::new()).unwrap();
        let rec = RecordHeader {
            caplen: 4,
            origlen: 4,
            ..RecordHeader::default()
        };
        writer.write_record_header(&rec).unwrap();
        let res = writer.write_payload(&[1, 2, 3, 4, 5, 6]);
        assert!(matches!(res, Err(PcapError::WriteTooLong { written: 4 })));
        // no room left in the record
        let res = writer.write_payload(&[7]);
        assert!(matches!(res, Err(PcapError::WriteTooLong { written: 0 })));
        assert_eq!(writer.write_payload(&[]).unwrap(), 0);
        // not sticky: a new record can be written
        writer.write_record_header(&rec).unwrap();
        assert_eq!(writer.write_payload(&[8, 9, 10, 11]).unwrap(), 4);
        writer.close().unwrap();
        let data = writer.into_inner();
        assert_eq!(data.len(), 24 + 2 * (16 + 4));
        assert_eq!(&data[40..44], &[1, 2, 3, 4]);
        assert_eq!(&data[60..64], &[8, 9, 10, 11]);
    }

    #[test]
    fn test_write_after_close() {
        let mut writer = PcapWriter::new(Vec::new());
        writer.close().unwrap();
        assert!(writer.is_closed());
        assert!(matches!(
            writer.write_header(&PcapHeader::new()),
            Err(PcapError::WriteAfterClose)
        ));
        assert!(matches!(
            writer.write_record_header(&RecordHeader::default()),
            Err(PcapError::WriteAfterClose)
        ));
        assert!(matches!(
            writer.write_payload(&[0]),
            Err(PcapError::WriteAfterClose)
        ));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_close_idempotent() {
        let mut writer = PcapWriter::new(FailingWriter::new(1024));
        writer.write_header(&PcapHeader::new()).unwrap();
        writer.close().unwrap();
        let (writes, flushes) = (writer.get_ref().writes, writer.get_ref().flushes);
        writer.close().unwrap();
        assert_eq!(writer.get_ref().writes, writes);
        assert_eq!(writer.get_ref().flushes, flushes);
    }

    #[test]
    fn test_sticky_error() {
        // room for the header and the record header, not the payload
        let mut writer = PcapWriter::new(FailingWriter::new(24 + 16));
        writer.write_header(&PcapHeader::new()).unwrap();
        writer
            .write_packet(Duration::from_secs(1), &[0u8; 8])
            .expect_err("payload should fail");
        let writes = writer.get_ref().writes;
        for _ in 0..2 {
            assert!(matches!(writer.write_payload(&[0]), Err(PcapError::Io(_))));
            assert!(matches!(
                writer.write_record_header(&RecordHeader::default()),
                Err(PcapError::Io(_))
            ));
            assert!(matches!(writer.close(), Err(PcapError::Io(_))));
        }
        // no retry
        assert_eq!(writer.get_ref().writes, writes);
        assert_eq!(writer.get_ref().flushes, 0);
    }

    #[test]
    fn test_write_trait() {
        let mut writer = PcapWriter::new(Vec::new());
        writer.write_header(&PcapHeader::new()).unwrap();
        writer
            .write_record_header(&RecordHeader {
                caplen: 3,
                origlen: 3,
                ..RecordHeader::default()
            })
            .unwrap();
        writer.write_all(b"abc").unwrap();
        let err = writer.write_all(b"d").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(writer.remaining(), 0);
    }

    #[test]
    fn test_write_trait_short_write() {
        let mut writer = PcapWriter::new(Vec::new());
        writer.write_header(&PcapHeader::new()).unwrap();
        writer
            .write_record_header(&RecordHeader {
                caplen: 4,
                origlen: 6,
                ..RecordHeader::default()
            })
            .unwrap();
        // the committed prefix is reported, not an error
        assert_eq!(Write::write(&mut writer, &[1, 2, 3, 4, 5, 6]).unwrap(), 4);
        let err = Write::write(&mut writer, &[5, 6]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        // write_all stops on the error, after the prefix
        writer
            .write_record_header(&RecordHeader {
                caplen: 2,
                origlen: 2,
                ..RecordHeader::default()
            })
            .unwrap();
        let err = writer.write_all(&[7, 8, 9]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        let data = writer.into_inner();
        assert_eq!(data.len(), 24 + 16 + 4 + 16 + 2);
        assert_eq!(&data[40..44], &[1, 2, 3, 4]);
        assert_eq!(&data[60..62], &[7, 8]);
    }
}
