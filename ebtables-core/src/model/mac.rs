use std::fmt;

use crate::error::{EbtError, Result};

use super::MAC_LEN;

/// A 6-byte Ethernet MAC address (also used for `sourcemsk`/`destmsk` masks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct MacAddr(pub [u8; MAC_LEN]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff; MAC_LEN]);
    pub const ZERO: MacAddr = MacAddr([0; MAC_LEN]);

    /// Parse the usual colon-separated hex form (`aa:bb:cc:dd:ee:ff`).
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != MAC_LEN {
            return Err(EbtError::Config(format!("'{s}' is not a 6-byte MAC address")));
        }
        let mut bytes = [0u8; MAC_LEN];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| EbtError::Config(format!("'{s}' is not a valid MAC address")))?;
        }
        Ok(MacAddr(bytes))
    }

    pub fn masked_eq(&self, mask: &MacAddr, other: &MacAddr) -> bool {
        self.0
            .iter()
            .zip(mask.0.iter())
            .zip(other.0.iter())
            .all(|((a, m), b)| a & m == b & m)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_eq_ignores_unmasked_bits() {
        let a = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let b = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0xff]);
        let mask = MacAddr([0xff, 0xff, 0xff, 0xff, 0xff, 0x00]);
        assert!(a.masked_eq(&mask, &b));
    }

    #[test]
    fn masked_eq_respects_masked_bits() {
        let a = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let b = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x56]);
        assert!(!a.masked_eq(&MacAddr::BROADCAST, &b));
    }

    #[test]
    fn parse_accepts_colon_hex_and_rejects_garbage() {
        assert_eq!(
            MacAddr::parse("aa:bb:cc:dd:ee:ff").unwrap(),
            MacAddr([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff])
        );
        assert!(MacAddr::parse("aa:bb:cc").is_err());
        assert!(MacAddr::parse("zz:bb:cc:dd:ee:ff").is_err());
    }
}
