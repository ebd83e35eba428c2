use super::skeleton_graph::{trace, Graph};
use crate::error::Result;
use crate::geometry::Line;
use crate::math::Point2;
use crate::skeleton::Options;

/// The deepest point of a skeleton component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centerpoint {
    pub point: Point2,
    /// Radius of the largest inscribed circle, which is the travel at which
    /// the front reached the point.
    pub radius: f64,
}

/// Finds, for each connected part of the input, the point furthest from
/// its boundary.
#[derive(Debug, Clone)]
pub struct Centerpoints {
    lines: Vec<Line>,
}

impl Centerpoints {
    /// Creates a new centrepoint operation.
    #[must_use]
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    /// Executes the search, largest radius first.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NonFinite` for non-finite input.
    pub fn execute(&self) -> Result<Vec<Centerpoint>> {
        let options = Options::default().with_rounding_angle(None);
        let graph = Graph::from_edges(&trace(&self.lines, &options)?);
        let mut points: Vec<Centerpoint> = graph
            .components(|_| true)
            .into_iter()
            .filter_map(|component| {
                component
                    .into_iter()
                    .max_by(|&a, &b| graph.travels[a].total_cmp(&graph.travels[b]))
            })
            .map(|vertex| Centerpoint {
                point: graph.points[vertex],
                radius: graph.travels[vertex],
            })
            .collect();
        points.sort_by(|a, b| b.radius.total_cmp(&a.radius));
        Ok(points)
    }
}
