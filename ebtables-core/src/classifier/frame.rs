use crate::model::MacAddr;

/// The fields of one Ethernet/802.3 frame visible to the classifier's
/// built-in matches, as it would be observed crossing one of the six
/// bridging hooks. Everything past the Ethernet header is opaque payload:
/// extension matches that need deeper protocol fields parse `payload`
/// themselves, the way `ebt_ip.c`/`ebt_arp.c` parse past the Ethernet
/// header in the original.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub hook: crate::model::Hook,
    pub ethproto: u16,
    pub in_if: &'a str,
    pub out_if: &'a str,
    pub logical_in: &'a str,
    pub logical_out: &'a str,
    pub source: MacAddr,
    pub dest: MacAddr,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn len(&self) -> usize {
        14 + self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
