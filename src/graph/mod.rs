// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Workflow graph queries: adjacency, traversals, branches, ranges, zones,
//! segments, and boundary crossings.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::model::{BoundaryConnection, BoundaryDirection, LiteConnection, Segment, Zone};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub node: String,
    pub kind: String,
    pub output_index: u32,
    pub input_index: u32,
}

/// Forward and reverse adjacency over lite connections, all kinds included.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    forward: BTreeMap<String, Vec<Edge>>,
    reverse: BTreeMap<String, Vec<Edge>>,
}

impl FlowGraph {
    pub fn new(connections: &[LiteConnection]) -> Self {
        let mut graph = Self::default();
        for conn in connections {
            graph.forward.entry(conn.from.clone()).or_default().push(Edge {
                node: conn.to.clone(),
                kind: conn.kind().to_owned(),
                output_index: conn.output_index(),
                input_index: conn.input_index(),
            });
            graph.reverse.entry(conn.to.clone()).or_default().push(Edge {
                node: conn.from.clone(),
                kind: conn.kind().to_owned(),
                output_index: conn.output_index(),
                input_index: conn.input_index(),
            });
        }
        graph
    }

    pub fn outgoing(&self, name: &str) -> &[Edge] {
        self.forward.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incoming(&self, name: &str) -> &[Edge] {
        self.reverse.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes reachable by following outgoing edges, starts included.
    pub fn bfs_forward<'a>(
        &self,
        starts: impl IntoIterator<Item = &'a str>,
        max_depth: Option<usize>,
        exclude: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        self.bfs(starts, max_depth, exclude, &self.forward)
    }

    /// Nodes reachable by following incoming edges, starts included.
    pub fn bfs_backward<'a>(
        &self,
        starts: impl IntoIterator<Item = &'a str>,
        max_depth: Option<usize>,
        exclude: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        self.bfs(starts, max_depth, exclude, &self.reverse)
    }

    fn bfs<'a>(
        &self,
        starts: impl IntoIterator<Item = &'a str>,
        max_depth: Option<usize>,
        exclude: &BTreeSet<String>,
        adjacency: &BTreeMap<String, Vec<Edge>>,
    ) -> BTreeSet<String> {
        let mut visited = BTreeSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();

        for start in starts {
            if exclude.contains(start) {
                continue;
            }
            if visited.insert(start.to_owned()) {
                queue.push_back((start.to_owned(), 0));
            }
        }

        while let Some((name, depth)) = queue.pop_front() {
            if max_depth.is_some_and(|cap| depth >= cap) {
                continue;
            }
            for edge in adjacency.get(&name).into_iter().flatten() {
                if exclude.contains(&edge.node) {
                    continue;
                }
                if visited.insert(edge.node.clone()) {
                    queue.push_back((edge.node.clone(), depth + 1));
                }
            }
        }

        visited
    }

    /// The branch hanging off one specific output of a router.
    ///
    /// Collects the immediate targets of that output index, then follows every
    /// downstream output. The router itself is always a member.
    pub fn follow_branch(&self, router: &str, output_index: u32) -> BTreeSet<String> {
        let targets: Vec<&str> = self
            .outgoing(router)
            .iter()
            .filter(|edge| edge.output_index == output_index)
            .map(|edge| edge.node.as_str())
            .collect();

        let mut branch = self.bfs_forward(targets, None, &BTreeSet::new());
        branch.insert(router.to_owned());
        branch
    }

    /// Nodes between `from` and `to`: the intersection of forward-reach of
    /// `from` and backward-reach of `to`, endpoints always included.
    pub fn nodes_between(&self, from: &str, to: &str) -> BTreeSet<String> {
        let ahead = self.bfs_forward([from], None, &BTreeSet::new());
        let behind = self.bfs_backward([to], None, &BTreeSet::new());

        let mut between: BTreeSet<String> = ahead.intersection(&behind).cloned().collect();
        between.insert(from.to_owned());
        between.insert(to.to_owned());
        between
    }
}

/// Assigns every node a zone relative to the focused set.
///
/// Downstream wins over upstream for convergence nodes reachable both ways, so
/// post-merge paths read as downstream.
pub fn classify_zones(
    all_names: &[String],
    focused: &BTreeSet<String>,
    connections: &[LiteConnection],
) -> BTreeMap<String, Zone> {
    let graph = FlowGraph::new(connections);
    let starts: Vec<&str> = focused.iter().map(String::as_str).collect();

    let ahead = graph.bfs_forward(starts.iter().copied(), None, &BTreeSet::new());
    let behind = graph.bfs_backward(starts.iter().copied(), None, &BTreeSet::new());

    let mut zones = BTreeMap::new();
    for name in all_names {
        let zone = if focused.contains(name) {
            Zone::Focused
        } else if ahead.contains(name) {
            Zone::Downstream
        } else if behind.contains(name) {
            Zone::Upstream
        } else {
            Zone::Parallel
        };
        zones.insert(name.clone(), zone);
    }
    zones
}

/// True for branch nodes whose two outputs mean true/false.
pub fn is_if_style(short_type: &str) -> bool {
    matches!(short_type, "if" | "filter")
}

/// One segment per router output that actually reaches members.
///
/// A router is any source with a connection at output index ≥ 1. Segment
/// membership is the branch-followed set minus the router itself.
pub fn detect_segments(
    node_types: &BTreeMap<String, String>,
    connections: &[LiteConnection],
) -> Vec<Segment> {
    let graph = FlowGraph::new(connections);

    let mut max_output: BTreeMap<&str, u32> = BTreeMap::new();
    for conn in connections {
        let entry = max_output.entry(conn.from.as_str()).or_insert(0);
        *entry = (*entry).max(conn.output_index());
    }

    let mut segments = Vec::new();
    for (router, max_index) in max_output {
        if max_index == 0 {
            continue;
        }
        let two_way_branch = max_index == 1
            && node_types
                .get(router)
                .is_some_and(|short_type| is_if_style(short_type));

        for output_index in 0..=max_index {
            let mut members = graph.follow_branch(router, output_index);
            members.remove(router);
            if members.is_empty() {
                continue;
            }

            let label = if two_way_branch {
                let side = if output_index == 0 { "true" } else { "false" };
                format!("{router}: {side} branch")
            } else {
                format!("{router}: output {output_index}")
            };

            segments.push(Segment {
                label,
                router: router.to_owned(),
                output_index,
                nodes: members.into_iter().collect(),
            });
        }
    }
    segments
}

/// Connections straddling the focused set, with their direction.
pub fn boundary_connections(
    focused: &BTreeSet<String>,
    connections: &[LiteConnection],
) -> Vec<BoundaryConnection> {
    let mut boundaries = Vec::new();
    for conn in connections {
        let from_inside = focused.contains(&conn.from);
        let to_inside = focused.contains(&conn.to);
        let direction = match (from_inside, to_inside) {
            (false, true) => BoundaryDirection::Entry,
            (true, false) => BoundaryDirection::Exit,
            _ => continue,
        };
        boundaries.push(BoundaryConnection {
            from: conn.from.clone(),
            to: conn.to.clone(),
            direction,
            kind: conn.kind.clone(),
            output_index: conn.output_index,
            input_index: conn.input_index,
        });
    }
    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(from: &str, to: &str) -> LiteConnection {
        LiteConnection::main(from, to)
    }

    fn conn_out(from: &str, to: &str, output_index: u32) -> LiteConnection {
        let mut conn = LiteConnection::main(from, to);
        if output_index != 0 {
            conn.output_index = Some(output_index);
        }
        conn
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn diamond() -> Vec<LiteConnection> {
        // A→B, A→C, B→D, C→D, D→E
        vec![
            conn("A", "B"),
            conn("A", "C"),
            conn("B", "D"),
            conn("C", "D"),
            conn("D", "E"),
        ]
    }

    #[test]
    fn bfs_forward_respects_depth_and_exclusions() {
        let graph = FlowGraph::new(&diamond());

        let all = graph.bfs_forward(["A"], None, &BTreeSet::new());
        assert_eq!(all, set(&["A", "B", "C", "D", "E"]));

        let shallow = graph.bfs_forward(["A"], Some(1), &BTreeSet::new());
        assert_eq!(shallow, set(&["A", "B", "C"]));

        let without_b = graph.bfs_forward(["A"], None, &set(&["B"]));
        assert_eq!(without_b, set(&["A", "C", "D", "E"]));
    }

    #[test]
    fn bfs_backward_walks_reverse_edges() {
        let graph = FlowGraph::new(&diamond());
        let behind = graph.bfs_backward(["D"], None, &BTreeSet::new());
        assert_eq!(behind, set(&["A", "B", "C", "D"]));
    }

    #[test]
    fn follow_branch_tracks_one_output() {
        // IF output 0 → B → D; output 1 → C.
        let connections = vec![
            conn_out("IF", "B", 0),
            conn_out("IF", "C", 1),
            conn("B", "D"),
        ];
        let graph = FlowGraph::new(&connections);

        assert_eq!(graph.follow_branch("IF", 0), set(&["IF", "B", "D"]));
        assert_eq!(graph.follow_branch("IF", 1), set(&["IF", "C"]));
    }

    #[test]
    fn nodes_between_covers_convergence() {
        let graph = FlowGraph::new(&diamond());
        assert_eq!(graph.nodes_between("A", "D"), set(&["A", "B", "C", "D"]));
    }

    #[test]
    fn nodes_between_disconnected_keeps_endpoints() {
        let graph = FlowGraph::new(&[conn("A", "B")]);
        assert_eq!(graph.nodes_between("B", "A"), set(&["A", "B"]));
    }

    #[test]
    fn zones_classify_chain_around_focus() {
        let connections: Vec<LiteConnection> = (1..10)
            .map(|i| conn(&format!("N{i}"), &format!("N{}", i + 1)))
            .collect();
        let all: Vec<String> = (1..=10).map(|i| format!("N{i}")).collect();

        let zones = classify_zones(&all, &set(&["N5"]), &connections);

        assert_eq!(zones["N5"], Zone::Focused);
        for i in 1..5 {
            assert_eq!(zones[&format!("N{i}")], Zone::Upstream, "N{i}");
        }
        for i in 6..=10 {
            assert_eq!(zones[&format!("N{i}")], Zone::Downstream, "N{i}");
        }
    }

    #[test]
    fn downstream_takes_precedence_over_upstream() {
        // Convergence after the focus: B is both forward- and backward-reachable.
        let connections = vec![conn("F", "B"), conn("B", "F2")];
        let all = names(&["F", "B", "F2", "Lone"]);
        let zones = classify_zones(&all, &set(&["F"]), &connections);
        assert_eq!(zones["B"], Zone::Downstream);
        assert_eq!(zones["Lone"], Zone::Parallel);
    }

    #[test]
    fn segments_label_if_style_and_numbered_outputs() {
        let mut node_types = BTreeMap::new();
        node_types.insert("IF".to_owned(), "if".to_owned());
        node_types.insert("Route".to_owned(), "switch".to_owned());

        let connections = vec![
            conn_out("IF", "Yes", 0),
            conn_out("IF", "No", 1),
            conn_out("Route", "P0", 0),
            conn_out("Route", "P2", 2),
        ];

        let segments = detect_segments(&node_types, &connections);
        let labels: Vec<&str> = segments.iter().map(|s| s.label.as_str()).collect();
        assert!(labels.contains(&"IF: true branch"));
        assert!(labels.contains(&"IF: false branch"));
        assert!(labels.contains(&"Route: output 0"));
        assert!(labels.contains(&"Route: output 2"));
        // Output 1 has no members and is omitted.
        assert!(!labels.iter().any(|l| l.starts_with("Route: output 1")));
    }

    #[test]
    fn boundaries_straddle_the_focus() {
        let connections: Vec<LiteConnection> = (1..10)
            .map(|i| conn(&format!("N{i}"), &format!("N{}", i + 1)))
            .collect();
        let boundaries = boundary_connections(&set(&["N5"]), &connections);

        assert_eq!(boundaries.len(), 2);
        let entry = boundaries
            .iter()
            .find(|b| b.direction == BoundaryDirection::Entry)
            .expect("entry");
        assert_eq!((entry.from.as_str(), entry.to.as_str()), ("N4", "N5"));
        let exit = boundaries
            .iter()
            .find(|b| b.direction == BoundaryDirection::Exit)
            .expect("exit");
        assert_eq!((exit.from.as_str(), exit.to.as_str()), ("N5", "N6"));
    }
}
