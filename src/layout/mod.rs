// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Auto-layout for new workflows.
//!
//! X comes from layered longest-path assignment, Y from DFS lane fan-out with
//! merge-centering. On cyclic input the result is still finite for every node;
//! the contract is "do not hang", not "be meaningful".

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::model::LiteConnection;

const BASE_X: f64 = 250.0;
const BASE_Y: f64 = 300.0;
const LAYER_SPACING: f64 = 250.0;
const LANE_SPACING: f64 = 200.0;

/// Assigns editor coordinates to every node.
pub fn auto_layout(
    names: &[String],
    connections: &[LiteConnection],
) -> BTreeMap<String, [f64; 2]> {
    let known: BTreeSet<&str> = names.iter().map(String::as_str).collect();

    let mut outgoing: BTreeMap<&str, Vec<(u32, &str)>> = BTreeMap::new();
    let mut incoming: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for conn in connections {
        let (from, to) = (conn.from.as_str(), conn.to.as_str());
        if !known.contains(from) || !known.contains(to) {
            continue;
        }
        outgoing.entry(from).or_default().push((conn.output_index(), to));
        incoming.entry(to).or_default().push(from);
    }
    for children in outgoing.values_mut() {
        children.sort_by(|a, b| a.0.cmp(&b.0));
    }

    let roots: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|name| incoming.get(*name).map_or(true, Vec::is_empty))
        .collect();

    let layers = assign_layers(names, &roots, &outgoing);
    let lanes = assign_lanes(names, &roots, &outgoing, &incoming);

    names
        .iter()
        .map(|name| {
            let layer = layers.get(name.as_str()).copied().unwrap_or(0);
            let lane = lanes.get(name.as_str()).copied().unwrap_or(0.0);
            (
                name.clone(),
                [
                    BASE_X + layer as f64 * LAYER_SPACING,
                    BASE_Y + lane * LANE_SPACING,
                ],
            )
        })
        .collect()
}

/// Longest-path layering: a node sits one layer right of its furthest
/// predecessor. Re-queues on increase; the iteration cap bounds cyclic inputs.
fn assign_layers<'a>(
    names: &'a [String],
    roots: &[&'a str],
    outgoing: &BTreeMap<&'a str, Vec<(u32, &'a str)>>,
) -> BTreeMap<&'a str, usize> {
    let mut layers: BTreeMap<&str, usize> =
        names.iter().map(|name| (name.as_str(), 0)).collect();

    let node_count = names.len();
    let iteration_cap = node_count.saturating_mul(node_count).saturating_add(node_count);
    let mut iterations = 0usize;

    let mut queue: VecDeque<&str> = roots.iter().copied().collect();
    while let Some(name) = queue.pop_front() {
        iterations += 1;
        if iterations > iteration_cap {
            break;
        }
        let next_layer = layers.get(name).copied().unwrap_or(0) + 1;
        for &(_, child) in outgoing.get(name).into_iter().flatten() {
            let child_layer = layers.entry(child).or_insert(0);
            if next_layer > *child_layer {
                *child_layer = next_layer;
                queue.push_back(child);
            }
        }
    }

    layers
}

fn assign_lanes<'a>(
    names: &'a [String],
    roots: &[&'a str],
    outgoing: &BTreeMap<&'a str, Vec<(u32, &'a str)>>,
    incoming: &BTreeMap<&'a str, Vec<&'a str>>,
) -> BTreeMap<&'a str, f64> {
    let mut lanes: BTreeMap<&str, f64> = BTreeMap::new();
    let mut next_root_lane = 0.0f64;

    let mut seeds: Vec<&str> = roots.to_vec();
    // Cycle members have no in-degree-zero entry point; seed them too so every
    // node ends up with a finite lane.
    seeds.extend(
        names
            .iter()
            .map(String::as_str)
            .filter(|name| !roots.contains(name)),
    );

    for seed in seeds {
        if lanes.contains_key(seed) {
            continue;
        }
        let max_in_subtree = dfs_lanes(seed, next_root_lane, outgoing, &mut lanes);
        next_root_lane = max_in_subtree + 2.0;
    }

    center_convergences(names, outgoing, incoming, &mut lanes);
    lanes
}

/// Iterative DFS: a branching node spreads its children symmetrically around
/// its own lane; single-output nodes pass their lane straight through.
/// Returns the maximum lane used in the subtree.
fn dfs_lanes<'a>(
    root: &'a str,
    root_lane: f64,
    outgoing: &BTreeMap<&'a str, Vec<(u32, &'a str)>>,
    lanes: &mut BTreeMap<&'a str, f64>,
) -> f64 {
    let mut max_lane = root_lane;
    let mut stack: Vec<(&str, f64)> = vec![(root, root_lane)];

    while let Some((name, lane)) = stack.pop() {
        if lanes.contains_key(name) {
            continue;
        }
        lanes.insert(name, lane);
        max_lane = max_lane.max(lane);

        let children = outgoing.get(name).map(Vec::as_slice).unwrap_or(&[]);
        let distinct_outputs: BTreeSet<u32> =
            children.iter().map(|(index, _)| *index).collect();

        if distinct_outputs.len() > 1 {
            let count = children.len();
            for (position, &(_, child)) in children.iter().enumerate() {
                let offset = position as f64 - (count as f64 - 1.0) / 2.0;
                stack.push((child, lane + offset));
            }
        } else {
            for &(_, child) in children {
                stack.push((child, lane));
            }
        }
    }

    max_lane
}

/// A convergence node re-centers on the mean of its feeders, and the new lane
/// rides forward through any single-parent chain below it.
fn center_convergences<'a>(
    names: &'a [String],
    outgoing: &BTreeMap<&'a str, Vec<(u32, &'a str)>>,
    incoming: &BTreeMap<&'a str, Vec<&'a str>>,
    lanes: &mut BTreeMap<&'a str, f64>,
) {
    for name in names.iter().map(String::as_str) {
        let feeders = incoming.get(name).map(Vec::as_slice).unwrap_or(&[]);
        if feeders.len() < 2 {
            continue;
        }
        let sum: f64 = feeders
            .iter()
            .map(|feeder| lanes.get(feeder).copied().unwrap_or(0.0))
            .sum();
        let mean = sum / feeders.len() as f64;
        lanes.insert(name, mean);

        let mut cursor = name;
        let mut guard = names.len();
        while guard > 0 {
            guard -= 1;
            let children = outgoing.get(cursor).map(Vec::as_slice).unwrap_or(&[]);
            let [(_, only_child)] = children else { break };
            let only_child = *only_child;
            if incoming.get(only_child).map(Vec::as_slice).unwrap_or(&[]).len() != 1 {
                break;
            }
            lanes.insert(only_child, mean);
            cursor = only_child;
        }
    }
}
