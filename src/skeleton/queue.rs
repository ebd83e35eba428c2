use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::node::{NodeId, NormalId};
use crate::math::Point2;

/// What a queued event would do when applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum EventKind {
    /// The edge between two adjacent nodes shrinks to nothing.
    Collapse { edge: [NodeId; 2] },
    /// `node` runs into the edge line with `normal`; `edge` is the piece it
    /// was found against.
    Split {
        node: NodeId,
        edge: [NodeId; 2],
        normal: NormalId,
    },
}

/// A candidate event in the priority queue.
#[derive(Debug, Clone)]
pub(crate) struct Event {
    pub travel: f64,
    pub point: Point2,
    pub kind: EventKind,
    sequence: u64,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behaviour: lowest travel first, then the
        // earliest inserted.
        other
            .travel
            .total_cmp(&self.travel)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Min-priority queue of candidate events keyed by travel.
///
/// Stale entries are never removed eagerly; the engine re-checks each event
/// when it is popped.
#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    heap: BinaryHeap<Event>,
    sequence: u64,
}

impl EventQueue {
    pub fn insert(&mut self, travel: f64, point: Point2, kind: EventKind) {
        self.heap.push(Event {
            travel,
            point,
            kind,
            sequence: self.sequence,
        });
        self.sequence += 1;
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop()
    }

    pub fn peek_travel(&self) -> Option<f64> {
        self.heap.peek().map(|event| event.travel)
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn edge() -> [NodeId; 2] {
        let mut ids: SlotMap<NodeId, ()> = SlotMap::with_key();
        [ids.insert(()), ids.insert(())]
    }

    #[test]
    fn pops_in_travel_order() {
        let mut queue = EventQueue::default();
        let origin = Point2::origin();
        for travel in [3.0, 1.0, 2.0, 0.5] {
            queue.insert(travel, origin, EventKind::Collapse { edge: edge() });
        }
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.peek_travel(), Some(0.5));
        let order: Vec<f64> = std::iter::from_fn(|| queue.pop().map(|e| e.travel)).collect();
        assert_eq!(order, vec![0.5, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn ties_break_by_insertion() {
        let mut queue = EventQueue::default();
        let kind = EventKind::Collapse { edge: edge() };
        queue.insert(1.0, Point2::new(1.0, 0.0), kind);
        queue.insert(1.0, Point2::new(2.0, 0.0), kind);
        queue.insert(0.5, Point2::new(3.0, 0.0), kind);
        let xs: Vec<f64> = std::iter::from_fn(|| queue.pop().map(|e| e.point.x)).collect();
        assert_eq!(xs, vec![3.0, 1.0, 2.0]);
    }
}
