//! Counter reconciliation (spec §4.5), grounded on `ebt_deliver_counters`
//! in `communication.c`: replay a chain's [`CounterChangeLog`] against its
//! previously installed counter array to produce the counter array for
//! the edited chain, preserving hit counts across edits that don't touch
//! a given rule.

use crate::error::{EbtError, Result};
use crate::model::{Counter, CounterChangeLog, CounterChangeMode, LogOp};

/// Produce the new counter array for a chain, given the counters it had
/// before this round of edits and the log of what changed.
///
/// The log has exactly one entry per slot in the *new* entry list, in
/// order; `Norm`/`Del`/`Owrite`/`Change` each consume one counter from
/// `old_counters` (in order), while `Zero`/`Add` consume none (the entry
/// is new). Returns `Corrupt` if the log tries to consume more counters
/// than `old_counters` has — a mismatched log is a bug in whatever built
/// it, not a recoverable runtime condition.
pub fn reconcile_chain(old_counters: &[Counter], log: &CounterChangeLog) -> Result<Vec<Counter>> {
    let mut old = old_counters.iter();
    let mut new_counters = Vec::with_capacity(log.len());

    for op in log.ops() {
        match op {
            LogOp::Norm => {
                let c = next(&mut old)?;
                new_counters.push(*c);
            }
            LogOp::Zero | LogOp::Add => {
                new_counters.push(Counter::default());
            }
            LogOp::Del => {
                next(&mut old)?;
            }
            LogOp::Owrite => {
                next(&mut old)?;
                new_counters.push(Counter::default());
            }
            LogOp::Change { packets_delta, packets_mode, bytes_delta, bytes_mode } => {
                let c = next(&mut old)?;
                new_counters.push(Counter {
                    packets: apply_change(c.packets, *packets_delta, *packets_mode),
                    bytes: apply_change(c.bytes, *bytes_delta, *bytes_mode),
                });
            }
        }
    }
    Ok(new_counters)
}

fn next<'a>(iter: &mut std::slice::Iter<'a, Counter>) -> Result<&'a Counter> {
    iter.next()
        .ok_or_else(|| EbtError::Corrupt("counter change log consumed past end of old counter array".to_string()))
}

fn apply_change(old: u64, delta: i64, mode: CounterChangeMode) -> u64 {
    match mode {
        CounterChangeMode::SetAbsolute => delta.max(0) as u64,
        CounterChangeMode::AddSurplus => old.saturating_add(delta.max(0) as u64),
        CounterChangeMode::SubtractSurplus => old.saturating_sub(delta.max(0) as u64),
    }
}
