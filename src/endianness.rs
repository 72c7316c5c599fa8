use log::debug;
use nom::error::ParseError;
use nom::number::complete::{be_i32, be_u16, be_u32, le_i32, le_u16, le_u32};
use nom::IResult;

use crate::error::PcapError;
use crate::pcap::PCAP_MAGIC;

pub(crate) struct PcapBE;
pub(crate) struct PcapLE;

/// Field decoding for one byte order, selected at compile time by the marker types
pub(crate) trait PcapEndianness {
    const ORDER: ByteOrder;

    fn parse_u16<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u16, E>;
    fn parse_u32<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u32, E>;
    fn parse_i32<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], i32, E>;

    fn u32_from_bytes(i: [u8; 4]) -> u32;
}

impl PcapEndianness for PcapBE {
    const ORDER: ByteOrder = ByteOrder::Big;

    #[inline]
    fn parse_u16<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u16, E> {
        be_u16(i)
    }

    #[inline]
    fn parse_u32<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u32, E> {
        be_u32(i)
    }

    #[inline]
    fn parse_i32<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], i32, E> {
        be_i32(i)
    }

    #[inline]
    fn u32_from_bytes(i: [u8; 4]) -> u32 {
        u32::from_be_bytes(i)
    }
}

impl PcapEndianness for PcapLE {
    const ORDER: ByteOrder = ByteOrder::Little;

    #[inline]
    fn parse_u16<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u16, E> {
        le_u16(i)
    }

    #[inline]
    fn parse_u32<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u32, E> {
        le_u32(i)
    }

    #[inline]
    fn parse_i32<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], i32, E> {
        le_i32(i)
    }

    #[inline]
    fn u32_from_bytes(i: [u8; 4]) -> u32 {
        u32::from_le_bytes(i)
    }
}

/// Byte order of every header field in a capture file
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Find the byte order that decodes `magic` to [`PCAP_MAGIC`]
    ///
    /// Little-endian is tried first, then big-endian. Returns `PcapError::BadMagic` if neither
    /// matches.
    pub fn detect(magic: [u8; 4]) -> Result<ByteOrder, PcapError> {
        let order = if PcapLE::u32_from_bytes(magic) == PCAP_MAGIC {
            PcapLE::ORDER
        } else if PcapBE::u32_from_bytes(magic) == PCAP_MAGIC {
            PcapBE::ORDER
        } else {
            return Err(PcapError::BadMagic(PcapLE::u32_from_bytes(magic)));
        };
        debug!("pcap: detected {:?}-endian capture", order);
        Ok(order)
    }

    #[inline]
    pub fn is_bigendian(self) -> bool {
        self == ByteOrder::Big
    }
}
