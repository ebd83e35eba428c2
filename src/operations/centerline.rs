use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use super::skeleton_graph::{trace, Graph};
use crate::error::{OperationError, Result};
use crate::geometry::Line;
use crate::skeleton::Options;

/// Default share of a component's maximum travel a skeleton node needs to be
/// kept on a centreline.
pub const DEFAULT_FRACTION: f64 = 0.5;

/// Extracts one centreline per skeleton component.
///
/// The skeleton is pruned to nodes at least `fraction` of the component's
/// deepest travel from the boundary, and the longest path through what
/// remains is returned as an open chain. A sampling interval densifies the
/// skeleton so the pruning threshold cuts arcs closer to where it falls.
#[derive(Debug, Clone)]
pub struct Centerlines {
    lines: Vec<Line>,
    interval: Option<f64>,
    fraction: f64,
}

impl Centerlines {
    /// Creates a new centreline operation.
    #[must_use]
    pub fn new(lines: Vec<Line>) -> Self {
        Self {
            lines,
            interval: None,
            fraction: DEFAULT_FRACTION,
        }
    }

    /// Sets the skeleton sampling interval.
    #[must_use]
    pub fn interval(mut self, interval: f64) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Sets the pruning fraction, in `[0, 1]`.
    #[must_use]
    pub fn fraction(mut self, fraction: f64) -> Self {
        self.fraction = fraction;
        self
    }

    /// Executes the extraction.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidOption` for a fraction outside
    /// `[0, 1]` or a non-positive interval, and `GeometryError::NonFinite`
    /// for non-finite input.
    pub fn execute(&self) -> Result<Vec<Line>> {
        if !(0.0..=1.0).contains(&self.fraction) {
            return Err(OperationError::InvalidOption {
                option: "fraction",
                value: self.fraction,
            }
            .into());
        }
        let mut options = Options::default().with_rounding_angle(None);
        options.interval = self.interval;
        let graph = Graph::from_edges(&trace(&self.lines, &options)?);

        let mut centerlines = Vec::new();
        for component in graph.components(|_| true) {
            let deepest = component
                .iter()
                .map(|&v| graph.travels[v])
                .fold(0.0, f64::max);
            let threshold = self.fraction * deepest;
            let mut keep = vec![false; graph.len()];
            for &v in &component {
                keep[v] = graph.travels[v] >= threshold;
            }
            for part in graph.components(|v| keep[v]) {
                if let Some(line) = longest_path(&graph, &part, &keep) {
                    centerlines.push(line);
                }
            }
        }
        debug!(
            vertices = graph.len(),
            centerlines = centerlines.len(),
            "extracted centerlines"
        );
        Ok(centerlines)
    }
}

/// Longest path through a tree-like part: the farthest vertex from a leaf,
/// then the farthest vertex from that.
fn longest_path(graph: &Graph, part: &[usize], keep: &[bool]) -> Option<Line> {
    let degree = |v: usize| graph.adjacency[v].iter().filter(|(w, _)| keep[*w]).count();
    let start = part
        .iter()
        .copied()
        .find(|&v| degree(v) == 1)
        .or_else(|| part.first().copied())?;
    let (first, _) = dijkstra(graph, start, keep);
    let (last, previous) = dijkstra(graph, first, keep);

    let mut points = vec![graph.points[last]];
    let mut current = last;
    while let Some(prev) = previous[current] {
        points.push(graph.points[prev]);
        current = prev;
    }
    Line::new(points, false).sanitized()
}

#[derive(Debug, Clone, Copy)]
struct Visit {
    distance: f64,
    vertex: usize,
}

impl PartialEq for Visit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Visit {}

impl PartialOrd for Visit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Visit {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behaviour.
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// Shortest distances from `source` over kept vertices; returns the
/// farthest vertex reached and the predecessor of every vertex.
fn dijkstra(graph: &Graph, source: usize, keep: &[bool]) -> (usize, Vec<Option<usize>>) {
    let mut distances = vec![f64::INFINITY; graph.len()];
    let mut previous = vec![None; graph.len()];
    let mut heap = BinaryHeap::new();
    distances[source] = 0.0;
    heap.push(Visit {
        distance: 0.0,
        vertex: source,
    });

    let mut farthest = source;
    while let Some(Visit { distance, vertex }) = heap.pop() {
        if distance > distances[vertex] {
            continue;
        }
        if distance > distances[farthest] {
            farthest = vertex;
        }
        for &(other, length) in &graph.adjacency[vertex] {
            let candidate = distance + length;
            if keep[other] && candidate < distances[other] {
                distances[other] = candidate;
                previous[other] = Some(vertex);
                heap.push(Visit {
                    distance: candidate,
                    vertex: other,
                });
            }
        }
    }
    (farthest, previous)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use approx::assert_abs_diff_eq;

    fn rectangle() -> Line {
        Line::ring(&[(0.0, 0.0), (100.0, 0.0), (100.0, 10.0), (0.0, 10.0)])
    }

    #[test]
    fn rectangle_centerline_runs_along_axis() {
        let lines = Centerlines::new(vec![rectangle()]).execute().unwrap();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert!(!line.closed);
        assert_eq!(line.points.len(), 2);
        let (a, b) = (line.points[0], line.points[1]);
        let (left, right) = if a.x < b.x { (a, b) } else { (b, a) };
        assert_abs_diff_eq!(left, Point2::new(5.0, 5.0), epsilon = 1e-9);
        assert_abs_diff_eq!(right, Point2::new(95.0, 5.0), epsilon = 1e-9);
    }

    #[test]
    fn sampling_extends_into_corners() {
        let lines = Centerlines::new(vec![rectangle()])
            .interval(1.0)
            .execute()
            .unwrap();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        let length: f64 = line.points.windows(2).map(|s| (s[1] - s[0]).norm()).sum();
        // The axis plus spokes down to half depth at either end.
        assert!(length >= 90.0 - 1e-9);
        assert!(line.points.iter().all(|p| p.y > 2.5 - 1e-9 && p.y < 7.5 + 1e-9));
    }

    #[test]
    fn rejects_bad_fraction() {
        assert!(Centerlines::new(vec![rectangle()])
            .fraction(1.5)
            .execute()
            .is_err());
    }

    #[test]
    fn one_centerline_per_polygon() {
        let other = Line::ring(&[(0.0, 20.0), (50.0, 20.0), (50.0, 30.0), (0.0, 30.0)]);
        let lines = Centerlines::new(vec![rectangle(), other]).execute().unwrap();
        assert_eq!(lines.len(), 2);
    }
}
