use std::collections::{HashMap, VecDeque};

use crate::error::Result;
use crate::geometry::Line;
use crate::math::{Point2, TOLERANCE};
use crate::skeleton::{Change, NodeId, Nodes, Options, Wavefront};

/// One arc of the straight skeleton: the path a node travelled before it was
/// consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonEdge {
    /// Where the consumed node started.
    pub from: Point2,
    /// Where it was consumed.
    pub to: Point2,
    /// Travel at `from` and at `to`.
    pub travel: [f64; 2],
    /// Nodes at either end of the arc. Nodes joined by a zero-length arc
    /// share one id.
    pub nodes: [NodeId; 2],
    /// The input vertex the consumed node traces back to.
    pub original: NodeId,
}

impl SkeletonEdge {
    /// Length of the arc.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.to - self.from).norm()
    }
}

/// Computes the straight skeleton of rings and chains as a set of arcs.
///
/// The front moves left of each line until every event has been processed.
/// Corners are mitred unless a rounding angle is set.
#[derive(Debug, Clone)]
pub struct SkeletonGraph {
    lines: Vec<Line>,
    options: Options,
}

impl SkeletonGraph {
    /// Creates a new skeleton operation.
    #[must_use]
    pub fn new(lines: Vec<Line>) -> Self {
        Self {
            lines,
            options: Options::default().with_rounding_angle(None),
        }
    }

    /// Sets the reflex corner rounding angle in degrees.
    #[must_use]
    pub fn rounding_angle(mut self, degrees: Option<f64>) -> Self {
        self.options.rounding_angle = degrees;
        self
    }

    /// Executes the skeleton.
    ///
    /// Arcs of zero length are contracted: their end nodes are merged, and
    /// the remaining arcs refer to the merged node, so the skeleton of each
    /// connected input stays connected.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NonFinite` for non-finite input.
    pub fn execute(&self) -> Result<Vec<SkeletonEdge>> {
        let edges = trace(&self.lines, &self.options)?;
        let mut merged: HashMap<NodeId, NodeId> = HashMap::new();
        for edge in edges.iter().filter(|edge| edge.length() <= TOLERANCE) {
            let [a, b] = edge.nodes.map(|id| representative(&merged, id));
            if a != b {
                merged.insert(a, b);
            }
        }
        Ok(edges
            .into_iter()
            .filter(|edge| edge.length() > TOLERANCE)
            .map(|mut edge| {
                edge.nodes = edge.nodes.map(|id| representative(&merged, id));
                edge
            })
            .collect())
    }
}

/// Follows merges from `id` to the node standing in for it.
fn representative(merged: &HashMap<NodeId, NodeId>, mut id: NodeId) -> NodeId {
    while let Some(&next) = merged.get(&id) {
        id = next;
    }
    id
}

/// Runs the wavefront and records every consumed node as an arc, including
/// zero-length ones.
pub(crate) fn trace(lines: &[Line], options: &Options) -> Result<Vec<SkeletonEdge>> {
    let mut edges = Vec::new();
    Wavefront::new(lines.iter().cloned())?.progress(options, |nodes, change| {
        let (consumed, produced) = match change {
            Change::Replaced { consumed, produced } => (consumed, produced),
            Change::Vanished { consumed, at } => (consumed, at),
            Change::Sample { .. } => return,
        };
        edges.extend(arc(nodes, consumed, produced));
    })?;
    Ok(edges)
}

fn arc(nodes: &Nodes, consumed: NodeId, produced: NodeId) -> Option<SkeletonEdge> {
    let (from, to) = (nodes.get(consumed)?, nodes.get(produced)?);
    Some(SkeletonEdge {
        from: from.point(),
        to: to.point(),
        travel: [from.travel(), to.travel()],
        nodes: [consumed, produced],
        original: from.original(),
    })
}

/// Undirected view of skeleton arcs, one vertex per node.
#[derive(Debug, Default)]
pub(crate) struct Graph {
    pub points: Vec<Point2>,
    pub travels: Vec<f64>,
    pub adjacency: Vec<Vec<(usize, f64)>>,
}

impl Graph {
    pub fn from_edges(edges: &[SkeletonEdge]) -> Self {
        let mut graph = Self::default();
        let mut vertices: HashMap<NodeId, usize> = HashMap::new();
        for edge in edges {
            let mut vertex = |id: NodeId, point: Point2, travel: f64| {
                *vertices.entry(id).or_insert_with(|| {
                    graph.points.push(point);
                    graph.travels.push(travel);
                    graph.adjacency.push(Vec::new());
                    graph.points.len() - 1
                })
            };
            let a = vertex(edge.nodes[0], edge.from, edge.travel[0]);
            let b = vertex(edge.nodes[1], edge.to, edge.travel[1]);
            let length = edge.length();
            graph.adjacency[a].push((b, length));
            graph.adjacency[b].push((a, length));
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Connected components among the vertices `keep` admits.
    pub fn components(&self, keep: impl Fn(usize) -> bool) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.len()];
        let mut components = Vec::new();
        for start in 0..self.len() {
            if seen[start] || !keep(start) {
                continue;
            }
            seen[start] = true;
            let mut component = Vec::new();
            let mut queue = VecDeque::from([start]);
            while let Some(vertex) = queue.pop_front() {
                component.push(vertex);
                for &(other, _) in &self.adjacency[vertex] {
                    if !seen[other] && keep(other) {
                        seen[other] = true;
                        queue.push_back(other);
                    }
                }
            }
            components.push(component);
        }
        components
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square(x: f64) -> Line {
        Line::ring(&[(x, 0.0), (x + 10.0, 0.0), (x + 10.0, 10.0), (x, 10.0)])
    }

    #[test]
    fn square_skeleton_meets_at_centre() {
        let edges = SkeletonGraph::new(vec![square(0.0)]).execute().unwrap();
        assert!(!edges.is_empty());
        let centre = Point2::new(5.0, 5.0);
        for edge in &edges {
            assert_abs_diff_eq!(edge.to, centre, epsilon = 1e-9);
            assert_abs_diff_eq!(edge.travel[1], 5.0, epsilon = 1e-9);
        }
        // One arc from each corner, all meeting in one node.
        let corners = edges.iter().filter(|edge| edge.travel[0] < 1e-12).count();
        assert_eq!(corners, 4);
        let graph = Graph::from_edges(&edges);
        assert_eq!(graph.components(|_| true).len(), 1);
        assert_eq!(graph.len(), 5);
    }

    #[test]
    fn arcs_lie_on_bisectors() {
        let rectangle = Line::ring(&[(0.0, 0.0), (20.0, 0.0), (20.0, 6.0), (0.0, 6.0)]);
        let edges = SkeletonGraph::new(vec![rectangle]).execute().unwrap();
        for edge in edges.iter().filter(|edge| edge.travel[0] < 1e-12) {
            let d = edge.to - edge.from;
            assert_abs_diff_eq!(d.x.abs(), d.y.abs(), epsilon = 1e-9);
            assert_abs_diff_eq!(edge.travel[1], 3.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn disjoint_rings_do_not_connect() {
        let edges = SkeletonGraph::new(vec![square(0.0), square(20.0)])
            .execute()
            .unwrap();
        for edge in &edges {
            let left = edge.from.x <= 10.0 && edge.to.x <= 10.0;
            let right = edge.from.x >= 20.0 && edge.to.x >= 20.0;
            assert!(left || right, "{edge:?}");
        }
        let graph = Graph::from_edges(&edges);
        assert_eq!(graph.components(|_| true).len(), 2);
    }
}
