use nom::IResult;
use std::convert::TryFrom;
use std::time::Duration;

use crate::endianness::{ByteOrder, PcapBE, PcapEndianness, PcapLE};
use crate::linktype::Linktype;
use crate::pcap::{PCAP_MAGIC, PCAP_VERSION_MAJOR, PCAP_VERSION_MINOR};
use crate::PcapError;

/// PCAP global header
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PcapHeader {
    /// File format and byte ordering. Once decoded with the byte order of the file, this is
    /// always `0xa1b2c3d4`.
    pub magic_number: u32,
    /// Version major number (currently 2)
    pub version_major: u16,
    /// Version minor number (currently 4)
    pub version_minor: u16,
    /// The correction time in seconds between GMT (UTC) and the local timezone of the following packet header timestamps
    pub thiszone: i32,
    /// In theory, the accuracy of time stamps in the capture; in practice, all tools set it to 0
    pub sigfigs: u32,
    /// max len of captured packets, in octets
    pub snaplen: u32,
    /// Data link type
    pub network: Linktype,
}

impl PcapHeader {
    pub fn new() -> PcapHeader {
        PcapHeader {
            magic_number: PCAP_MAGIC,
            version_major: PCAP_VERSION_MAJOR,
            version_minor: PCAP_VERSION_MINOR,
            thiszone: 0,
            sigfigs: 0,
            snaplen: 0,
            network: Linktype::ETHERNET,
        }
    }

    /// Create a header for the given link type, keeping every other field at its default
    pub fn with_linktype(network: Linktype) -> PcapHeader {
        PcapHeader {
            network,
            ..PcapHeader::new()
        }
    }

    pub const fn size(&self) -> usize {
        PCAP_HEADER_SIZE
    }
}

impl Default for PcapHeader {
    fn default() -> Self {
        PcapHeader::new()
    }
}

/// Size of the serialized global header
pub const PCAP_HEADER_SIZE: usize = 24;

/// Size of a serialized record header
pub const RECORD_HEADER_SIZE: usize = 16;

/// Header preceding the payload of each record
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RecordHeader {
    /// Timestamp, seconds since epoch
    pub ts_sec: u32,
    /// Timestamp, microseconds part
    pub ts_usec: u32,
    /// Number of payload bytes stored in the file after this header
    pub caplen: u32,
    /// Length of the packet as it appeared on the network
    pub origlen: u32,
}

impl RecordHeader {
    /// Create a record header for a packet captured at `timestamp` (since the epoch)
    ///
    /// The format stores seconds on 32 bits: timestamps after 2106-02-07 are clamped to
    /// `u32::MAX` seconds.
    pub fn new(timestamp: Duration, caplen: u32, origlen: u32) -> RecordHeader {
        RecordHeader {
            ts_sec: u32::try_from(timestamp.as_secs()).unwrap_or(u32::MAX),
            ts_usec: timestamp.subsec_micros(),
            caplen,
            origlen,
        }
    }

    /// Capture time, as a duration since the epoch
    pub fn timestamp(&self) -> Duration {
        Duration::from_secs(u64::from(self.ts_sec)) + Duration::from_micros(u64::from(self.ts_usec))
    }

    /// True if the packet was cut to fit the snapshot length
    pub fn is_truncated(&self) -> bool {
        self.caplen < self.origlen
    }

    pub const fn size(&self) -> usize {
        RECORD_HEADER_SIZE
    }
}

fn parse_pcap_header_e<En: PcapEndianness>(i: &[u8]) -> IResult<&[u8], PcapHeader, PcapError> {
    let (i, magic_number) = En::parse_u32(i)?;
    let (i, version_major) = En::parse_u16(i)?;
    let (i, version_minor) = En::parse_u16(i)?;
    let (i, thiszone) = En::parse_i32(i)?;
    let (i, sigfigs) = En::parse_u32(i)?;
    let (i, snaplen) = En::parse_u32(i)?;
    let (i, network) = En::parse_i32(i)?;
    let header = PcapHeader {
        magic_number,
        version_major,
        version_minor,
        thiszone,
        sigfigs,
        snaplen,
        network: Linktype(network),
    };
    Ok((i, header))
}

fn parse_record_header_e<En: PcapEndianness>(
    i: &[u8],
) -> IResult<&[u8], RecordHeader, PcapError> {
    let (i, ts_sec) = En::parse_u32(i)?;
    let (i, ts_usec) = En::parse_u32(i)?;
    let (i, caplen) = En::parse_u32(i)?;
    let (i, origlen) = En::parse_u32(i)?;
    let header = RecordHeader {
        ts_sec,
        ts_usec,
        caplen,
        origlen,
    };
    Ok((i, header))
}

/// Read the PCAP global header
///
/// The byte order is detected from the magic number and returned along with the header, since
/// it applies to every record of the file.
pub fn parse_pcap_header(i: &[u8]) -> Result<(ByteOrder, PcapHeader), PcapError> {
    if i.len() < PCAP_HEADER_SIZE {
        return Err(PcapError::UnexpectedEof);
    }
    let order = ByteOrder::detect([i[0], i[1], i[2], i[3]])?;
    let header = match order {
        ByteOrder::Little => parse_pcap_header_e::<PcapLE>(i),
        ByteOrder::Big => parse_pcap_header_e::<PcapBE>(i),
    };
    finish(header).map(|h| (order, h))
}

/// Read a PCAP record header using the byte order of the file
pub fn parse_record_header(i: &[u8], order: ByteOrder) -> Result<RecordHeader, PcapError> {
    if i.len() < RECORD_HEADER_SIZE {
        return Err(PcapError::UnexpectedEof);
    }
    let header = match order {
        ByteOrder::Little => parse_record_header_e::<PcapLE>(i),
        ByteOrder::Big => parse_record_header_e::<PcapBE>(i),
    };
    finish(header)
}

fn finish<T>(res: IResult<&[u8], T, PcapError>) -> Result<T, PcapError> {
    match res {
        Ok((_rem, v)) => Ok(v),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(e),
        Err(nom::Err::Incomplete(_)) => Err(PcapError::UnexpectedEof),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use hex_literal::hex;

    // ntp.pcap header
    pub const PCAP_HDR: &[u8] = &hex!(
        "
D4 C3 B2 A1 02 00 04 00 00 00 00 00 00 00 00 00
00 00 04 00 01 00 00 00"
    );

    // same header, big-endian
    pub const PCAP_HDR_BE: &[u8] = &hex!(
        "
A1 B2 C3 D4 00 02 00 04 00 00 00 00 00 00 00 00
00 04 00 00 00 00 00 01"
    );

    pub const RECORD_HDR: &[u8] = &hex!("34 7B 5B 5A E1 96 08 00 4A 00 00 00 4A 00 00 00");

    #[test]
    fn test_parse_pcap_header() {
        let (order, hdr) = parse_pcap_header(PCAP_HDR).expect("header parsing failed");
        assert_eq!(order, ByteOrder::Little);
        assert_eq!(hdr.magic_number, 0xa1b2_c3d4);
        assert_eq!(hdr.version_major, 2);
        assert_eq!(hdr.version_minor, 4);
        assert_eq!(hdr.snaplen, 262_144);
        assert_eq!(hdr.network, Linktype::ETHERNET);
    }

    #[test]
    fn test_parse_pcap_header_be() {
        let (order, hdr) = parse_pcap_header(PCAP_HDR_BE).expect("header parsing failed");
        assert_eq!(order, ByteOrder::Big);
        let (_, hdr_le) = parse_pcap_header(PCAP_HDR).unwrap();
        assert_eq!(hdr, hdr_le);
    }

    #[test]
    fn test_parse_pcap_header_short() {
        let res = parse_pcap_header(&PCAP_HDR[..20]);
        assert!(matches!(res, Err(PcapError::UnexpectedEof)));
    }

    #[test]
    fn test_parse_record_header() {
        let rec = parse_record_header(RECORD_HDR, ByteOrder::Little).expect("record parsing failed");
        assert_eq!(rec.ts_sec, 1_515_944_756);
        assert_eq!(rec.ts_usec, 562_913);
        assert_eq!(rec.caplen, 74);
        assert_eq!(rec.origlen, 74);
        assert!(!rec.is_truncated());
    }

    #[test]
    fn test_record_timestamp() {
        let ts = Duration::new(1_515_933_236, 562_913_000);
        let rec = RecordHeader::new(ts, 60, 1514);
        assert_eq!(rec.ts_sec, 1_515_933_236);
        assert_eq!(rec.ts_usec, 562_913);
        assert_eq!(rec.timestamp(), ts);
        assert!(rec.is_truncated());
    }

    #[test]
    fn test_record_timestamp_clamped() {
        let rec = RecordHeader::new(Duration::new(u64::from(u32::MAX) + 10, 1_000), 0, 0);
        assert_eq!(rec.ts_sec, u32::MAX);
        assert_eq!(rec.ts_usec, 1);
    }
}
