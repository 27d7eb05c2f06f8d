// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Connection compression, reconstruction, and topological ordering.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::model::{ConnectionMap, ConnectionTarget, LiteConnection, MAIN_CONNECTION};

/// Flattens the engine's three-level connection mapping into lite connections,
/// one per {source, kind, output index, target} quadruple.
pub fn compress_connections(connections: &ConnectionMap) -> Vec<LiteConnection> {
    let mut compressed = Vec::new();
    for (source, kinds) in connections {
        for (kind, outputs) in kinds {
            for (output_index, targets) in outputs.iter().enumerate() {
                for target in targets {
                    compressed.push(LiteConnection {
                        from: source.clone(),
                        to: target.node.clone(),
                        kind: (kind != MAIN_CONNECTION).then(|| kind.clone()),
                        output_index: (output_index > 0).then_some(output_index as u32),
                        input_index: (target.index > 0).then_some(target.index),
                    });
                }
            }
        }
    }
    compressed
}

/// Groups lite connections back into the engine's three-level mapping.
///
/// Input-index assignment per (target, kind) pair: explicit indices reserve
/// their slot; implicit connections take the next free slot in arrival order.
/// Two implicit branches converging on a merge therefore land on ports 0 and 1
/// instead of colliding on 0, which would keep the merge from ever firing.
pub fn reconstruct_connections(connections: &[LiteConnection]) -> ConnectionMap {
    let mut reserved: BTreeMap<(String, String), BTreeSet<u32>> = BTreeMap::new();
    for conn in connections {
        if let Some(input_index) = conn.input_index {
            reserved
                .entry((conn.to.clone(), conn.kind().to_owned()))
                .or_default()
                .insert(input_index);
        }
    }

    let mut next_free: BTreeMap<(String, String), u32> = BTreeMap::new();
    let mut map = ConnectionMap::new();

    for conn in connections {
        let pair = (conn.to.clone(), conn.kind().to_owned());
        let input_index = match conn.input_index {
            Some(explicit) => explicit,
            None => {
                let taken = reserved.entry(pair.clone()).or_default();
                let cursor = next_free.entry(pair.clone()).or_insert(0);
                while taken.contains(cursor) {
                    *cursor += 1;
                }
                let assigned = *cursor;
                taken.insert(assigned);
                *cursor += 1;
                assigned
            }
        };

        let outputs = map
            .entry(conn.from.clone())
            .or_default()
            .entry(conn.kind().to_owned())
            .or_default();
        let output_index = conn.output_index() as usize;
        while outputs.len() <= output_index {
            outputs.push(Vec::new());
        }
        outputs[output_index].push(ConnectionTarget {
            node: conn.to.clone(),
            kind: conn.kind().to_owned(),
            index: input_index,
        });
    }

    map
}

/// Kahn's algorithm over every connection kind.
///
/// Acyclic inputs come out in dependency order. A cyclic remainder never
/// reaches in-degree zero and is appended in its input order instead of
/// aborting the sort.
pub fn topo_sort(names: &[String], connections: &[LiteConnection]) -> Vec<String> {
    let known: BTreeSet<&str> = names.iter().map(String::as_str).collect();

    let mut in_degree: BTreeMap<&str, usize> = names.iter().map(|n| (n.as_str(), 0)).collect();
    let mut outgoing: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for conn in connections {
        if !known.contains(conn.from.as_str()) || !known.contains(conn.to.as_str()) {
            continue;
        }
        outgoing
            .entry(conn.from.as_str())
            .or_default()
            .push(conn.to.as_str());
        if let Some(degree) = in_degree.get_mut(conn.to.as_str()) {
            *degree += 1;
        }
    }

    let mut queue: VecDeque<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|name| in_degree.get(name).copied() == Some(0))
        .collect();

    let mut sorted = Vec::with_capacity(names.len());
    let mut placed: BTreeSet<&str> = BTreeSet::new();

    while let Some(name) = queue.pop_front() {
        if !placed.insert(name) {
            continue;
        }
        sorted.push(name.to_owned());
        for next in outgoing.get(name).into_iter().flatten() {
            let degree = in_degree.get_mut(next).expect("known node");
            *degree = degree.saturating_sub(1);
            if *degree == 0 && !placed.contains(next) {
                queue.push_back(next);
            }
        }
    }

    for name in names {
        if !placed.contains(name.as_str()) {
            sorted.push(name.clone());
        }
    }

    sorted
}
