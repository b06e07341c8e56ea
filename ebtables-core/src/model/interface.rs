use std::fmt;

use crate::error::{EbtError, Result};

use super::IFNAME_MAXLEN;

/// An interface name as used by `in`/`out`/`logical_in`/`logical_out`.
///
/// A trailing `+` (displayed) / `\x01` (wire) marks a wildcard prefix match:
/// `eth+` matches `eth0`, `eth1`, and the bare `eth`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct InterfaceName {
    prefix: String,
    wildcard: bool,
}

impl InterfaceName {
    pub fn parse(s: &str) -> Result<Self> {
        let (prefix, wildcard) = match s.strip_suffix('+') {
            Some(p) => (p, true),
            None => (s, false),
        };
        if prefix.len() > IFNAME_MAXLEN {
            return Err(EbtError::Config(format!(
                "interface name '{s}' exceeds {IFNAME_MAXLEN} bytes"
            )));
        }
        Ok(InterfaceName { prefix: prefix.to_string(), wildcard })
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && !self.wildcard
    }

    /// Test a concrete interface name against this pattern, honoring the
    /// wildcard suffix. A lone `+` matches anything.
    pub fn matches(&self, candidate: &str) -> bool {
        if self.wildcard {
            candidate.starts_with(self.prefix.as_str())
        } else {
            candidate == self.prefix
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn has_wildcard(&self) -> bool {
        self.wildcard
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix)?;
        if self.wildcard {
            write!(f, "+")?;
        }
        Ok(())
    }
}
