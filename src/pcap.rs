//! PCAP file format
//!
//! See <https://wiki.wireshark.org/Development/LibpcapFileFormat> for details.
//!
//! A capture file is a 24-byte global header followed by records, each made of a 16-byte
//! record header and exactly `caplen` bytes of payload. There is no record count, index or
//! trailer: the end of the stream is the end of the capture.
//!
//! [`PcapReader`] decodes such a stream sequentially: the header is parsed on construction, then
//! [`PcapReader::next`] advances from record to record and [`PcapReader::read_payload`] reads the
//! payload of the current record.
//!
//! [`PcapWriter`] is the symmetric encoder. Output is always little-endian.

mod header;
mod reader;
mod window;
mod writer;

pub use header::*;
pub use reader::*;
pub use writer::*;

/// Magic number identifying a pcap file with microsecond timestamps
pub const PCAP_MAGIC: u32 = 0xa1b2_c3d4;

/// Version written by [`PcapWriter`]
pub const PCAP_VERSION_MAJOR: u16 = 2;
pub const PCAP_VERSION_MINOR: u16 = 4;

/// Snapshot length written when the header does not specify one
pub const DEFAULT_SNAPLEN: u32 = 262_144;
