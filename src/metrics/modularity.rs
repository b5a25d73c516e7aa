//! Community detection with the Louvain method.
//!
//! Runs on the undirected view of a graph. Nodes are visited in index order
//! (which is unique-name order) and ties between candidate communities go to
//! the lowest community id, so a graph always yields the same partition.

use std::collections::BTreeMap;

use super::{round2, MetricCalculator, MetricInput, MetricOutput, MetricValue};
use crate::graph::CodeGraph;

/// Share of nodes reported for the biggest communities.
const BIGGEST_COMMUNITIES: usize = 5;

/// Minimum gain for a node to change community.
const EPSILON: f64 = 1e-12;

/// A partition of a graph's nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Node names per community, biggest community first.
    pub communities: Vec<Vec<String>>,
    /// Modularity of the partition on the undirected view.
    pub modularity: f64,
}

impl Partition {
    pub fn community_of(&self, node: &str) -> Option<usize> {
        self.communities
            .iter()
            .position(|members| members.iter().any(|m| m == node))
    }
}

/// Weighted undirected graph used between aggregation levels.
#[derive(Debug, Clone)]
struct Level {
    neighbors: Vec<BTreeMap<usize, f64>>,
    self_loops: Vec<f64>,
}

impl Level {
    fn from_graph(graph: &CodeGraph) -> Self {
        let n = graph.node_count();
        let mut neighbors = vec![BTreeMap::new(); n];
        let inner = graph.inner();
        for edge in inner.edge_indices() {
            let Some((a, b)) = inner.edge_endpoints(edge) else {
                continue;
            };
            let (a, b) = (a.index(), b.index());
            if a == b {
                continue;
            }
            // a -> b and b -> a collapse into one undirected edge
            neighbors[a].insert(b, 1.0);
            neighbors[b].insert(a, 1.0);
        }
        Self {
            neighbors,
            self_loops: vec![0.0; n],
        }
    }

    fn len(&self) -> usize {
        self.neighbors.len()
    }

    fn degree(&self, node: usize) -> f64 {
        self.neighbors[node].values().sum::<f64>() + 2.0 * self.self_loops[node]
    }

    /// Local moving phase. Returns the community of every node and whether
    /// any node moved.
    fn move_nodes(&self, resolution: f64) -> (Vec<usize>, bool) {
        let degrees: Vec<f64> = (0..self.len()).map(|i| self.degree(i)).collect();
        let two_m: f64 = degrees.iter().sum();
        let mut community: Vec<usize> = (0..self.len()).collect();
        let mut totals = degrees.clone();
        let mut moved_any = false;

        if two_m == 0.0 {
            return (community, false);
        }

        loop {
            let mut moved = false;
            for node in 0..self.len() {
                let current = community[node];
                let k = degrees[node];
                totals[current] -= k;

                let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
                for (&other, &w) in &self.neighbors[node] {
                    *weights.entry(community[other]).or_default() += w;
                }

                let gain = |c: usize, w: f64| w - resolution * totals[c] * k / two_m;
                let mut best = current;
                let mut best_gain = gain(current, weights.get(&current).copied().unwrap_or(0.0));
                for (&c, &w) in &weights {
                    let g = gain(c, w);
                    if g > best_gain + EPSILON {
                        best = c;
                        best_gain = g;
                    }
                }

                totals[best] += k;
                if best != current {
                    community[node] = best;
                    moved = true;
                    moved_any = true;
                }
            }
            if !moved {
                break;
            }
        }

        (community, moved_any)
    }

    /// Collapse communities into nodes. `community` must already be
    /// renumbered densely.
    fn aggregate(&self, community: &[usize], count: usize) -> Level {
        let mut neighbors = vec![BTreeMap::new(); count];
        let mut self_loops = vec![0.0; count];
        for node in 0..self.len() {
            let c = community[node];
            self_loops[c] += self.self_loops[node];
            for (&other, &w) in &self.neighbors[node] {
                let d = community[other];
                if c == d {
                    // seen once from each end
                    self_loops[c] += w / 2.0;
                } else {
                    *neighbors[c].entry(d).or_default() += w;
                }
            }
        }
        Level {
            neighbors,
            self_loops,
        }
    }
}

/// Renumber community ids densely in order of first appearance.
fn renumber(community: &[usize]) -> (Vec<usize>, usize) {
    let mut ids: BTreeMap<usize, usize> = BTreeMap::new();
    let mut order = Vec::with_capacity(community.len());
    for &c in community {
        let next = ids.len();
        order.push(*ids.entry(c).or_insert(next));
    }
    (order, ids.len())
}

/// Modularity of a node -> community assignment on the undirected view.
fn modularity(level: &Level, membership: &[usize], resolution: f64) -> f64 {
    let degrees: Vec<f64> = (0..level.len()).map(|i| level.degree(i)).collect();
    let two_m: f64 = degrees.iter().sum();
    if two_m == 0.0 {
        return 0.0;
    }

    let mut internal: BTreeMap<usize, f64> = BTreeMap::new();
    let mut totals: BTreeMap<usize, f64> = BTreeMap::new();
    for node in 0..level.len() {
        let c = membership[node];
        *totals.entry(c).or_default() += degrees[node];
        *internal.entry(c).or_default() += 2.0 * level.self_loops[node];
        for (&other, &w) in &level.neighbors[node] {
            if membership[other] == c {
                *internal.entry(c).or_default() += w;
            }
        }
    }

    // internal weights were counted from both ends
    totals
        .iter()
        .map(|(c, total)| {
            let inside = internal.get(c).copied().unwrap_or(0.0);
            inside / two_m - resolution * (total / two_m).powi(2)
        })
        .sum()
}

/// Partition a graph into communities.
pub fn louvain_partition(graph: &CodeGraph, resolution: f64) -> Partition {
    let original = Level::from_graph(graph);
    let mut membership: Vec<usize> = (0..original.len()).collect();
    let mut level = original.clone();

    loop {
        let (community, moved) = level.move_nodes(resolution);
        if !moved {
            break;
        }
        let (community, count) = renumber(&community);
        for m in membership.iter_mut() {
            *m = community[*m];
        }
        level = level.aggregate(&community, count);
    }

    let score = modularity(&original, &membership, resolution);

    let inner = graph.inner();
    let mut groups: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for idx in inner.node_indices() {
        groups
            .entry(membership[idx.index()])
            .or_default()
            .push(inner[idx].clone());
    }
    let mut communities: Vec<Vec<String>> = groups.into_values().collect();
    for members in &mut communities {
        members.sort();
    }
    // biggest first; equal sizes by their smallest member
    communities.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.first().cmp(&b.first())));

    Partition {
        communities,
        modularity: score,
    }
}

/// Louvain communities and modularity per graph.
#[derive(Debug, Clone)]
pub struct LouvainModularity {
    pub resolution: f64,
}

impl Default for LouvainModularity {
    fn default() -> Self {
        Self { resolution: 1.0 }
    }
}

impl MetricCalculator for LouvainModularity {
    fn metric_name(&self) -> &'static str {
        "louvain-modularity"
    }

    fn calculate_from_results(&self, input: &MetricInput<'_>) -> MetricOutput {
        let mut output = MetricOutput::default();

        for graph in &input.graphs {
            let slug = graph.kind().as_str();
            if graph.edge_count() == 0 {
                tracing::debug!(graph = slug, "graph has no edges, louvain skipped");
                continue;
            }

            let partition = louvain_partition(graph, self.resolution);
            let node_count = graph.node_count() as f64;

            let key = format!("louvain-community-{}", slug);
            for (id, members) in partition.communities.iter().enumerate() {
                for member in members {
                    output.insert_local(member, key.as_str(), id);
                }
            }

            let biggest: BTreeMap<String, f64> = partition
                .communities
                .iter()
                .take(BIGGEST_COMMUNITIES)
                .enumerate()
                .map(|(id, members)| (id.to_string(), round2(members.len() as f64 / node_count)))
                .collect();

            output.insert_overall(
                format!("louvain-communities-{}", slug),
                partition.communities.len(),
            );
            output.insert_overall(
                format!("louvain-modularity-{}", slug),
                round2(partition.modularity.max(0.0)),
            );
            output.insert_overall(
                format!("louvain-biggest-communities-{}", slug),
                MetricValue::Map(biggest),
            );
        }

        output
    }
}
