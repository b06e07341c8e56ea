//! The declarative initial rule-set (spec.md §3: "Table ... additionally
//! defines an initial rule-set"): a TOML tree describing one table's
//! standard-chain policies, user-defined chains, and the built-in-field
//! rules each chain starts with. Deliberately narrower than the full CLI
//! grammar (no per-extension match/watcher/target argument parsing, which
//! is out of scope) — it covers protocol, interface, and MAC criteria plus
//! the four standard verdicts and jumps to a named chain.

use serde::Deserialize;

use crate::error::{EbtError, Result};
use crate::model::{Entry, EntryFlags, Hook, InterfaceName, MacAddr, Target, TargetPayload, Verdict};

#[derive(Debug, Deserialize, Clone)]
pub struct InitialRuleSet {
    pub table: TableSpec,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TableSpec {
    pub name: String,
    #[serde(default)]
    pub chains: Vec<ChainSpec>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainSpec {
    pub name: String,
    /// A standard chain's hook name (`"INPUT"`, `"FORWARD"`, ...). Absent
    /// for a user-defined chain.
    #[serde(default)]
    pub hook: Option<String>,
    /// A standard chain's fallthrough policy (`"accept"` / `"drop"`).
    /// Ignored for user-defined chains, which always fall through to an
    /// implicit `RETURN`.
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RuleSpec {
    #[serde(default)]
    pub protocol: Option<String>,
    /// Accept 802.3-framed traffic (EtherType < 1536) as a protocol match
    /// too, alongside the exact `protocol` equality. Required if `protocol`
    /// is itself below 1536.
    #[serde(default)]
    pub eth_802_3: bool,
    #[serde(default)]
    pub in_interface: Option<String>,
    #[serde(default)]
    pub out_interface: Option<String>,
    #[serde(default)]
    pub logical_in: Option<String>,
    #[serde(default)]
    pub logical_out: Option<String>,
    #[serde(default)]
    pub source_mac: Option<String>,
    #[serde(default)]
    pub dest_mac: Option<String>,
    /// `"accept"` | `"drop"` | `"continue"` | `"return"` | `"jump:<chain>"`.
    pub target: String,
}

impl RuleSpec {
    /// Build the built-in-field [`Entry`] this rule describes. A `jump:`
    /// target is left unresolved as [`TargetPayload::Standard`] with a
    /// placeholder; [`super::loader::load_initial_ruleset`] rewrites it to
    /// the real chain nr once every chain name in the table is known.
    pub(super) fn to_entry(&self) -> Result<Entry> {
        let mut entry = Entry::new(Target::standard(self.parse_target_placeholder()?));

        if let Some(proto) = &self.protocol {
            entry.ethproto = parse_protocol(proto)?;
            entry.bitmask.insert(EntryFlags::PROTO);
            if self.eth_802_3 {
                entry.bitmask.insert(EntryFlags::ETH_802_3);
            } else if entry.ethproto < 1536 {
                return Err(EbtError::Config(format!(
                    "protocol {proto} is < 1536 and requires eth_802_3 = true"
                )));
            }
        }
        if let Some(name) = &self.in_interface {
            entry.in_if = InterfaceName::parse(name)?;
            entry.bitmask.insert(EntryFlags::IN);
        }
        if let Some(name) = &self.out_interface {
            entry.out_if = InterfaceName::parse(name)?;
            entry.bitmask.insert(EntryFlags::OUT);
        }
        if let Some(name) = &self.logical_in {
            entry.logical_in = InterfaceName::parse(name)?;
            entry.bitmask.insert(EntryFlags::LOGICAL_IN);
        }
        if let Some(name) = &self.logical_out {
            entry.logical_out = InterfaceName::parse(name)?;
            entry.bitmask.insert(EntryFlags::LOGICAL_OUT);
        }
        if let Some(mac) = &self.source_mac {
            entry.sourcemac = MacAddr::parse(mac)?;
            entry.sourcemsk = MacAddr::BROADCAST;
            entry.bitmask.insert(EntryFlags::SOURCE_MAC);
        }
        if let Some(mac) = &self.dest_mac {
            entry.destmac = MacAddr::parse(mac)?;
            entry.destmsk = MacAddr::BROADCAST;
            entry.bitmask.insert(EntryFlags::DEST_MAC);
        }
        Ok(entry)
    }

    /// The jump target name, if `target` names a jump, for the loader's
    /// name-to-nr rewrite pass.
    pub(super) fn jump_target_name(&self) -> Option<&str> {
        self.target.strip_prefix("jump:")
    }

    fn parse_target_placeholder(&self) -> Result<Verdict> {
        match self.target.as_str() {
            "accept" => Ok(Verdict::Accept),
            "drop" => Ok(Verdict::Drop),
            "continue" => Ok(Verdict::Continue),
            "return" => Ok(Verdict::Return),
            other if other.starts_with("jump:") => Ok(Verdict::Jump(0)),
            other => Err(EbtError::Config(format!("unknown rule target '{other}'"))),
        }
    }
}

fn parse_protocol(s: &str) -> Result<u16> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let radix = if s.starts_with("0x") { 16 } else { 10 };
    u16::from_str_radix(digits, radix)
        .map_err(|_| EbtError::Config(format!("'{s}' is not a valid ethertype")))
}

impl ChainSpec {
    pub(super) fn hook(&self) -> Result<Option<Hook>> {
        match &self.hook {
            None => Ok(None),
            Some(name) => Hook::from_name(name)
                .map(Some)
                .ok_or_else(|| EbtError::Config(format!("unknown hook '{name}'"))),
        }
    }

    pub(super) fn policy(&self) -> Result<Option<crate::model::Policy>> {
        match self.policy.as_deref() {
            None => Ok(None),
            Some("accept") => Ok(Some(crate::model::Policy::Accept)),
            Some("drop") => Ok(Some(crate::model::Policy::Drop)),
            Some(other) => Err(EbtError::Config(format!("unknown policy '{other}'"))),
        }
    }
}
