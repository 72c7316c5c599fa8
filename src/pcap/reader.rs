use log::{debug, trace};
use std::io::{self, Read, Seek, SeekFrom};

use super::header::{
    parse_pcap_header, parse_record_header, PcapHeader, RecordHeader, PCAP_HEADER_SIZE,
    RECORD_HEADER_SIZE,
};
use super::window::RecordWindow;
use crate::endianness::ByteOrder;
use crate::error::PcapError;

type SeekFn<R> = fn(&mut R, i64) -> io::Result<u64>;

/// Sequential reader over legacy pcap data
///
/// ## Pcap Reader
///
/// The global header is read and decoded when the reader is created, and is available through
/// [`header`](PcapReader::header). Its byte order (detected from the magic number) is used for
/// every record of the stream.
///
/// Each call to [`next`](PcapReader::next) advances to the next record and returns its header.
/// The record payload can then be read with [`read_payload`](PcapReader::read_payload), or
/// through the [`Read`] implementation: both return `0` once the `caplen` bytes of the record are
/// consumed. Calling `next` before the payload is fully read skips the unread bytes, by seeking
/// if the reader was built with [`new_seekable`](PcapReader::new_seekable), or by reading and
/// discarding them otherwise.
///
/// `next` returns `PcapError::Eof` when the stream ends exactly at a record boundary. Any error
/// is remembered, and returned again by all following calls.
///
/// ## Example
///
/// ```rust
/// use pcap_stream::*;
///
/// # fn run(file: std::fs::File) -> Result<(), PcapError> {
/// let mut reader = PcapReader::new(file)?;
/// println!("linktype: {}", reader.header().network);
/// let mut buf = [0u8; 2048];
/// loop {
///     match reader.next() {
///         Ok(record) => {
///             println!("record: {} bytes", record.caplen);
///             while reader.read_payload(&mut buf)? > 0 {
///                 // use packet data
///             }
///         }
///         Err(PcapError::Eof) => break,
///         Err(e) => return Err(e),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct PcapReader<R>
where
    R: Read,
{
    header: PcapHeader,
    order: ByteOrder,
    reader: R,
    record: Option<RecordWindow>,
    error: Option<PcapError>,
    seek: Option<SeekFn<R>>,
}

impl<R> PcapReader<R>
where
    R: Read,
{
    /// Creates a new `PcapReader<R>` and reads the global header.
    ///
    /// Returns `PcapError::Eof` if the stream is empty, `PcapError::UnexpectedEof` if it is
    /// shorter than a header, and `PcapError::BadMagic` if this is not a pcap file.
    pub fn new(reader: R) -> Result<PcapReader<R>, PcapError> {
        Self::with_seek(reader, None)
    }

    fn with_seek(mut reader: R, seek: Option<SeekFn<R>>) -> Result<PcapReader<R>, PcapError> {
        let mut buf = [0u8; PCAP_HEADER_SIZE];
        match read_full(&mut reader, &mut buf)? {
            0 => return Err(PcapError::Eof),
            PCAP_HEADER_SIZE => (),
            _ => return Err(PcapError::UnexpectedEof),
        }
        let (order, header) = parse_pcap_header(&buf)?;
        debug!(
            "pcap: version {}.{}, snaplen {}, linktype {}",
            header.version_major, header.version_minor, header.snaplen, header.network
        );
        Ok(PcapReader {
            header,
            order,
            reader,
            record: None,
            error: None,
            seek,
        })
    }

    /// The global header of the file
    pub fn header(&self) -> &PcapHeader {
        &self.header
    }

    /// Byte order used by the file
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Number of unread payload bytes in the current record
    pub fn remaining(&self) -> u32 {
        self.record.as_ref().map_or(0, RecordWindow::remaining)
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Advance to the next record, skipping the unread payload of the current one.
    ///
    /// Returns `PcapError::Eof` at the end of the stream, and `PcapError::UnexpectedEof` if the
    /// stream ends inside a record header or inside skipped payload.
    pub fn next(&mut self) -> Result<RecordHeader, PcapError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        if let Err(e) = self.skip_unread() {
            return Err(self.fault(e));
        }
        let mut buf = [0u8; RECORD_HEADER_SIZE];
        let record = match read_full(&mut self.reader, &mut buf) {
            Ok(0) => Err(PcapError::Eof),
            Ok(RECORD_HEADER_SIZE) => parse_record_header(&buf, self.order),
            Ok(_) => Err(PcapError::UnexpectedEof),
            Err(e) => Err(e),
        };
        match record {
            Ok(record) => {
                trace!(
                    "pcap: record ts={}.{:06} caplen={} origlen={}",
                    record.ts_sec,
                    record.ts_usec,
                    record.caplen,
                    record.origlen
                );
                self.record = Some(RecordWindow::new(record.caplen));
                Ok(record)
            }
            Err(e) => Err(self.fault(e)),
        }
    }

    /// Read payload bytes of the current record.
    ///
    /// Returns `Ok(0)` when the record is consumed, or if there is no current record (before
    /// the first call to `next`, or after the end of the stream). If the stream ends before
    /// `caplen` bytes were read, returns `PcapError::UnexpectedEof`.
    pub fn read_payload(&mut self, buf: &mut [u8]) -> Result<usize, PcapError> {
        match &self.error {
            Some(PcapError::Eof) | None => (),
            Some(e) => return Err(e.clone()),
        }
        let window = match self.record.as_mut() {
            Some(window) => window,
            None => return Ok(0),
        };
        match window.read(&mut self.reader, buf) {
            Ok(n) => Ok(n),
            Err(e) => Err(self.fault(e.into())),
        }
    }

    fn skip_unread(&mut self) -> Result<(), PcapError> {
        let nb = match self.record.take() {
            Some(window) => window.remaining(),
            None => return Ok(()),
        };
        if nb == 0 {
            return Ok(());
        }
        trace!("pcap: skipping {} unread bytes", nb);
        if let Some(seek) = self.seek {
            match seek(&mut self.reader, i64::from(nb)) {
                Ok(_) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(PcapError::UnexpectedEof)
                }
                Err(e) => trace!("pcap: seek failed ({}), discarding instead", e),
            }
        }
        let skipped = io::copy(&mut (&mut self.reader).take(u64::from(nb)), &mut io::sink())?;
        if skipped < u64::from(nb) {
            return Err(PcapError::UnexpectedEof);
        }
        Ok(())
    }

    fn fault(&mut self, e: PcapError) -> PcapError {
        self.record = None;
        self.error = Some(e.clone());
        e
    }

    /// Iterate over the remaining records, returning each header with its payload
    ///
    /// The iterator stops at the end of the stream. An error is returned once, then the
    /// iterator is exhausted.
    pub fn packets(&mut self) -> Packets<'_, R> {
        Packets {
            reader: self,
            done: false,
        }
    }
}

impl<R> PcapReader<R>
where
    R: Read + Seek,
{
    /// Creates a new `PcapReader<R>`, skipping unread payload with `seek` instead of reads.
    pub fn new_seekable(reader: R) -> Result<PcapReader<R>, PcapError> {
        Self::with_seek(reader, Some(seek_forward::<R>))
    }
}

/// Seek `nb` bytes forward, failing with `ErrorKind::UnexpectedEof` if the stream is shorter.
///
/// Seeking past the end is not an error for files or cursors, so the length is checked first.
fn seek_forward<R: Seek>(r: &mut R, nb: i64) -> io::Result<u64> {
    let pos = r.stream_position()?;
    let end = r.seek(SeekFrom::End(0))?;
    let target = pos + nb as u64;
    if target > end {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("record truncated, {} bytes missing", target - end),
        ));
    }
    r.seek(SeekFrom::Start(target))
}

impl<R> Read for PcapReader<R>
where
    R: Read,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_payload(buf).map_err(io::Error::from)
    }
}

/// Read until `buf` is full or the stream ends. Returns the number of bytes read.
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<usize, PcapError> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => (),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Iterator over owned records, see [`PcapReader::packets`]
pub struct Packets<'a, R>
where
    R: Read,
{
    reader: &'a mut PcapReader<R>,
    done: bool,
}

impl<'a, R> Iterator for Packets<'a, R>
where
    R: Read,
{
    type Item = Result<(RecordHeader, Vec<u8>), PcapError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let res = self.reader.next().and_then(|record| {
            // caplen comes from the file, do not trust it for the allocation
            let mut data = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = self.reader.read_payload(&mut chunk)?;
                if n == 0 {
                    break;
                }
                data.extend_from_slice(&chunk[..n]);
            }
            Ok((record, data))
        });
        match res {
            Ok(packet) => Some(Ok(packet)),
            Err(PcapError::Eof) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
