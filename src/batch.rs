//! Batch Executor
//!
//! Resolves many keys in one logical call.
//!
//! ## Algorithm
//! ```text
//! keys:   [k0, k1, k2, k3, k4]
//!           │   │   │   │   │      route by digest
//!           ▼   ▼   ▼   ▼   ▼
//! groups: node0 ─ positions [0, 2, 3]   (one BATCH_GET each,
//!         node1 ─ positions [1, 4]       run concurrently)
//!
//! reply for a group is aligned with its positions, so slot i is always
//! filled from the sub-reply entry that was sent for keys[i]
//! ```
//!
//! Results are placed by position, never looked up by key, so duplicate keys
//! each receive their own slot and completion order does not matter.
//!
//! Failure policy is all-or-nothing: the call returns only after every
//! sub-request has finished, and fails if any of them failed.

use crossbeam::channel;

use crate::error::{ClientError, Result};
use crate::policy::Policy;
use crate::protocol::{RequestBody, ResponseBody, ResultCode};
use crate::record::{Key, Record};
use crate::session::{check_code, unexpected, Session};

/// Keys bound for one node, with their positions in the caller's list
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BatchGroup {
    pub node: usize,
    pub positions: Vec<usize>,
    pub keys: Vec<Key>,
}

/// Partition keys by destination node, preserving caller order in each group
pub(crate) fn partition(keys: &[Key], route: impl Fn(&Key) -> usize) -> Vec<BatchGroup> {
    let mut groups: Vec<BatchGroup> = Vec::new();
    for (pos, key) in keys.iter().enumerate() {
        let node = route(key);
        match groups.iter_mut().find(|g| g.node == node) {
            Some(group) => {
                group.positions.push(pos);
                group.keys.push(key.clone());
            }
            None => groups.push(BatchGroup {
                node,
                positions: vec![pos],
                keys: vec![key.clone()],
            }),
        }
    }
    groups
}

pub(crate) fn batch_get(
    session: &Session,
    policy: &Policy,
    keys: &[Key],
    bins: Option<Vec<String>>,
) -> Result<Vec<Option<Record>>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let groups = partition(keys, |key| session.route(key));
    tracing::debug!(
        "BATCH_GET {} keys across {} of {} nodes",
        keys.len(),
        groups.len(),
        session.node_count()
    );

    let mut slots: Vec<Option<Record>> = (0..keys.len()).map(|_| None).collect();

    if let [group] = groups.as_slice() {
        let records = fetch_group(session, policy, group, bins)?;
        place(&mut slots, group, records);
        return Ok(slots);
    }

    let (tx, rx) = channel::unbounded();
    crossbeam::scope(|scope| {
        for (idx, group) in groups.iter().enumerate() {
            let tx = tx.clone();
            let bins = bins.clone();
            scope.spawn(move |_| {
                let result = fetch_group(session, policy, group, bins);
                // Receiver outlives the scope, so send cannot fail.
                let _ = tx.send((idx, result));
            });
        }
    })
    .map_err(|_| ClientError::Network("batch worker panicked".to_string()))?;
    drop(tx);

    let mut first_err = None;
    for (idx, result) in rx.iter() {
        match result {
            Ok(records) => place(&mut slots, &groups[idx], records),
            Err(e) => {
                tracing::debug!("BATCH_GET sub-request to node {} failed: {}", groups[idx].node, e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(slots),
    }
}

fn fetch_group(
    session: &Session,
    policy: &Policy,
    group: &BatchGroup,
    bins: Option<Vec<String>>,
) -> Result<Vec<Option<Record>>> {
    let body = RequestBody::BatchGet {
        keys: group.keys.clone(),
        bins,
    };
    let response = check_code(session.send_to(group.node, policy, body)?)?;

    let records = match (response.code, response.body) {
        (ResultCode::Ok, ResponseBody::Batch(records)) => records,
        (_, body) => return Err(unexpected("BATCH_GET", &body)),
    };

    if records.len() != group.keys.len() {
        return Err(ClientError::Protocol(format!(
            "BATCH_GET returned {} results for {} keys",
            records.len(),
            group.keys.len()
        )));
    }
    Ok(records)
}

fn place(slots: &mut [Option<Record>], group: &BatchGroup, records: Vec<Option<Record>>) {
    for (pos, record) in group.positions.iter().zip(records) {
        slots[*pos] = record;
    }
}
