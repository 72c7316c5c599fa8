use crate::pcap::*;
use cookie_factory::bytes::{le_i32, le_u16, le_u32};
use cookie_factory::sequence::tuple;
use cookie_factory::{gen, GenError, SerializeFn};
use log::debug;
use std::io::Write;

/// Common trait for all serialization functions
pub trait ToVec {
    /// Serialize to bytes representation (little-endian).
    /// Check values and fix all fields before serializing.
    fn to_vec(&mut self) -> Result<Vec<u8>, GenError> {
        self.fix();
        self.to_vec_raw()
    }

    /// Check and correct all fields: use magic, fix version and other values if possible.
    fn fix(&mut self) {}

    /// Serialize to bytes representation (little-endian). Do not check values
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError>;
}

pub(crate) fn pcap_header_le<W: Write>(h: &PcapHeader) -> impl SerializeFn<W> {
    tuple((
        le_u32(h.magic_number),
        le_u16(h.version_major),
        le_u16(h.version_minor),
        le_i32(h.thiszone),
        le_u32(h.sigfigs),
        le_u32(h.snaplen),
        le_u32(h.network.0 as u32),
    ))
}

// pcap records have no alignment constraints
pub(crate) fn record_header_le<W: Write>(h: &RecordHeader) -> impl SerializeFn<W> {
    tuple((
        le_u32(h.ts_sec),
        le_u32(h.ts_usec),
        le_u32(h.caplen),
        le_u32(h.origlen),
    ))
}

impl ToVec for PcapHeader {
    /// Use magic and version 2.4. Set the default snaplen if none is given, any other value is
    /// kept.
    fn fix(&mut self) {
        self.magic_number = PCAP_MAGIC;
        self.version_major = PCAP_VERSION_MAJOR;
        self.version_minor = PCAP_VERSION_MINOR;
        if self.snaplen == 0 {
            debug!("pcap: no snaplen, using default {}", DEFAULT_SNAPLEN);
            self.snaplen = DEFAULT_SNAPLEN;
        }
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(PCAP_HEADER_SIZE);
        gen(pcap_header_le(self), &mut v).map(|res| res.0.to_vec())
    }
}

impl ToVec for RecordHeader {
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(RECORD_HEADER_SIZE);
        gen(record_header_le(self), &mut v).map(|res| res.0.to_vec())
    }
}
