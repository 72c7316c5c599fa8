//! # PCAP stream reader and writer
//!
//! This crate reads and writes capture files in the legacy PCAP format: a 24-byte global header
//! followed by records, each made of a 16-byte record header and its payload.
//!
//! Both sides are sequential and work directly on a [`Read`](std::io::Read) or
//! [`Write`](std::io::Write) stream, without loading the file in memory. Record payloads are
//! transferred in caller-sized chunks, bounded by the length declared in the record header.
//!
//! Files written on little- or big-endian hosts are both accepted: the byte order is detected
//! from the magic number. Files are always written in little-endian order.
//!
//! # Example: copying a capture
//!
//! ```rust
//! use pcap_stream::*;
//! use std::io;
//!
//! fn copy<R: io::Read, W: io::Write>(input: R, output: W) -> Result<usize, PcapError> {
//!     let mut reader = PcapReader::new(input)?;
//!     let mut writer = PcapWriter::new(output);
//!     writer.write_header(reader.header())?;
//!     let mut count = 0;
//!     loop {
//!         match reader.next() {
//!             Ok(record) => {
//!                 writer.write_record_header(&record)?;
//!                 io::copy(&mut reader, &mut writer)?;
//!                 count += 1;
//!             }
//!             Err(PcapError::Eof) => break,
//!             Err(e) => return Err(e),
//!         }
//!     }
//!     writer.close()?;
//!     Ok(count)
//! }
//! ```
//!
//! Errors are sticky: once a reader or a writer has failed, every later call returns the same
//! error, and the instance should be dropped.

mod endianness;
mod error;
mod linktype;
pub use endianness::ByteOrder;
pub use error::*;
pub use linktype::*;

pub mod pcap;
pub use pcap::*;

pub mod serialize;
