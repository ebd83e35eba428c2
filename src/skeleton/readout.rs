use slotmap::SecondaryMap;

use super::node::{Node, NodeId};
use super::nodes::Nodes;
use crate::geometry::Line;
use crate::math::Point2;

impl Nodes {
    /// Reads the active front out as lines, every node placed at `travel`.
    #[must_use]
    pub fn readout_at(&self, travel: f64) -> Vec<Line> {
        self.readout_with(|id| self.position_at(id, travel))
    }

    /// Reads the active front out with every node at its own travel.
    #[must_use]
    pub fn readout_as_created(&self) -> Vec<Line> {
        self.readout_with(|id| self.get(id).map(Node::point))
    }

    fn readout_with(&self, position: impl Fn(NodeId) -> Option<Point2>) -> Vec<Line> {
        let mut visited: SecondaryMap<NodeId, ()> = SecondaryMap::new();
        let mut lines = Vec::new();

        // Chains first, from their starting terminus.
        let starts: Vec<NodeId> = self
            .active()
            .filter(|&id| self.get(id).is_some_and(|node| node.prev().is_none()))
            .collect();
        for start in starts {
            let ids = self.walk(start, &mut visited);
            lines.extend(self.emit(&ids, false, &position));
        }

        let remaining: Vec<NodeId> = self.active().collect();
        for start in remaining {
            if visited.contains_key(start) {
                continue;
            }
            let ids = self.walk(start, &mut visited);
            lines.extend(self.emit(&ids, true, &position));
        }
        lines
    }

    fn walk(&self, start: NodeId, visited: &mut SecondaryMap<NodeId, ()>) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if visited.insert(id, ()).is_some() {
                break;
            }
            ids.push(id);
            current = self
                .get(id)
                .and_then(|node| node.next())
                .filter(|&next| self.get(next).is_some_and(|node| node.is_active()));
        }
        ids
    }

    fn emit(&self, ids: &[NodeId], closed: bool, position: impl Fn(NodeId) -> Option<Point2>) -> Option<Line> {
        let mut points: Vec<Point2> = Vec::with_capacity(ids.len());
        for point in ids.iter().filter_map(|&id| position(id)) {
            if points
                .last()
                .is_none_or(|last| (point - last).norm() > self.epsilon)
            {
                points.push(point);
            }
        }
        if closed {
            while points.len() > 1
                && points
                    .first()
                    .zip(points.last())
                    .is_some_and(|(first, last)| (first - last).norm() <= self.epsilon)
            {
                points.pop();
            }
        }
        if points.len() < if closed { 3 } else { 2 } {
            return None;
        }
        if self.reversed {
            points.reverse();
        }
        Some(Line::new(points, closed))
    }
}
