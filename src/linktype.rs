use rusticata_macros::newtype_enum;

/// Data link type
///
/// Identifies the link-layer header found at the start of every record payload of a
/// capture file. It is stored once, in the global header.
///
/// See <http://www.tcpdump.org/linktypes.html>
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Linktype(pub i32);

newtype_enum! {
impl display Linktype {
    NULL = 0,
    ETHERNET = 1,

    PPP = 9,
    FDDI = 10,

    RAW = 101,
    IEEE802_11 = 105,

    LOOP = 108,
    LINUX_SLL = 113,

    // 802.11 frames preceded by a radiotap header
    IEEE802_11_RADIOTAP = 127,

    // Bluetooth HCI UART frames with a 4-byte direction pseudo-header
    BLUETOOTH_HCI_H4_WITH_PHDR = 201,

    IPV4 = 228,
    IPV6 = 229,

    NFLOG = 239,

    LINUX_SLL2 = 276,
}
}

impl From<u32> for Linktype {
    fn from(v: u32) -> Self {
        Linktype(v as i32)
    }
}
