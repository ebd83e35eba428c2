use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use slotmap::{SecondaryMap, SlotMap};
use tracing::trace;

use super::node::{Node, NodeId, NodeKind, NormalId};
use super::queue::{Event, EventKind, EventQueue};
use super::solve::{offset, solve, solve_asym};
use crate::geometry::Line;
use crate::math::polygon_2d::left_normal;
use crate::math::{Point2, Vector2, Vector2Ext};
use crate::spatial::{Aabb, RTree};

/// Normals closer than this to antiparallel leave a node with no finite
/// heading.
const PINCH_EPSILON: f64 = 1e-9;

/// Normals whose cross product is below this are treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-9;

/// Slack, in radians, when comparing a corner's turn against an angle option.
const ANGLE_EPSILON: f64 = 1e-9;

/// Relative tolerance for travel and position comparisons, scaled by the
/// input's coordinate magnitude.
const RELATIVE_EPSILON: f64 = 1e-9;

/// Edge boxes held outside the R-tree before it is rebuilt.
const MIN_PENDING: usize = 32;

/// A change to the front, reported to the caller as it happens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Change {
    /// `consumed` left the front and `produced` took its place.
    Replaced { consumed: NodeId, produced: NodeId },
    /// `consumed` left the front with no successor; `at` is the node
    /// marking the point and travel where it ended.
    Vanished { consumed: NodeId, at: NodeId },
    /// The front was resampled at `travel`.
    Sample { travel: f64 },
}

/// The wavefront engine: an arena of nodes plus the event queue driving
/// them.
///
/// Consumed nodes stay in the arena, inactive, so callbacks and readouts
/// can still look them up.
#[derive(Debug)]
pub struct Nodes {
    arena: SlotMap<NodeId, Node>,
    normals: Vec<Vector2>,
    tracks: Vec<Vec<NodeId>>,
    reach: Vec<Aabb>,
    boxes: Vec<(Aabb, NormalId)>,
    index: RTree<NormalId>,
    indexed: usize,
    queue: EventQueue,
    travel: f64,
    limit: Option<f64>,
    splits: bool,
    pub(crate) reversed: bool,
    pub(crate) epsilon: f64,
    pub(crate) processed: usize,
    pub(crate) stale: usize,
}

#[derive(Debug, Clone, Copy)]
enum Ray {
    Incoming(NodeId),
    Outgoing(NodeId),
}

impl Nodes {
    /// Builds the initial front, one vertex per point, moving left of each
    /// line (or right, when `reversed`).
    pub(crate) fn build(lines: &[Line], reversed: bool, limit: Option<f64>, splits: bool) -> Self {
        let scale = lines
            .iter()
            .flat_map(|line| &line.points)
            .fold(1.0_f64, |scale, p| scale.max(p.x.abs()).max(p.y.abs()));
        let mut nodes = Self {
            arena: SlotMap::with_key(),
            normals: Vec::new(),
            tracks: Vec::new(),
            reach: Vec::new(),
            boxes: Vec::new(),
            index: RTree::default(),
            indexed: 0,
            queue: EventQueue::default(),
            travel: 0.0,
            limit,
            splits,
            reversed,
            epsilon: scale * RELATIVE_EPSILON,
            processed: 0,
            stale: 0,
        };
        for line in lines {
            let line = if reversed { line.reversed() } else { line.clone() };
            nodes.add_line(&line);
        }
        nodes
    }

    fn add_line(&mut self, line: &Line) {
        let points = &line.points;
        let count = points.len();
        let first_normal = self.normals.len();
        for i in 0..line.segment_count() {
            // Lines are sanitised, so every segment has non-zero length.
            let direction = (points[(i + 1) % count] - points[i])
                .normalized_checked()
                .unwrap_or_else(Vector2::x);
            self.push_normal(left_normal(direction));
        }
        #[allow(clippy::cast_possible_truncation)]
        let normal = |i: usize| NormalId((first_normal + i) as u32);

        let ids: Vec<NodeId> = points
            .iter()
            .map(|&p| {
                self.arena
                    .insert_with_key(|key| Node::new(NodeKind::Vertex, p, 0.0, key))
            })
            .collect();
        for (i, &id) in ids.iter().enumerate() {
            let node = &mut self.arena[id];
            if line.closed {
                let before = (i + count - 1) % count;
                node.neighbours = [Some(ids[before]), Some(ids[(i + 1) % count])];
                node.normals = [Some(normal(before)), Some(normal(i))];
            } else {
                node.neighbours = [
                    i.checked_sub(1).map(|j| ids[j]),
                    ids.get(i + 1).copied(),
                ];
                node.normals = [
                    i.checked_sub(1).map(normal),
                    (i + 1 < count).then(|| normal(i)),
                ];
            }
        }
    }

    fn push_normal(&mut self, normal: Vector2) -> NormalId {
        #[allow(clippy::cast_possible_truncation)]
        let id = NormalId(self.normals.len() as u32);
        self.normals.push(normal);
        self.tracks.push(Vec::new());
        self.reach.push(Aabb::EMPTY);
        id
    }

    fn normal(&self, id: NormalId) -> Vector2 {
        self.normals[id.index()]
    }

    // --- Read-only view used by callbacks and readout ---

    /// Returns the node, if the id belongs to this engine.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// Iterates over the nodes currently on the front.
    pub fn active(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.arena
            .iter()
            .filter(|(_, node)| node.active)
            .map(|(id, _)| id)
    }

    /// Travel of the most recently applied event.
    #[must_use]
    pub fn travel(&self) -> f64 {
        self.travel
    }

    /// Unit normal of an edge line.
    #[must_use]
    pub fn normal_vector(&self, id: NormalId) -> Vector2 {
        self.normal(id)
    }

    /// Velocity of a node: the displacement per unit travel that keeps both
    /// adjacent edges moving at unit speed. `None` when the edges are
    /// antiparallel.
    #[must_use]
    pub fn heading(&self, id: NodeId) -> Option<Vector2> {
        self.arena.get(id).and_then(|node| self.heading_of(node))
    }

    fn heading_of(&self, node: &Node) -> Option<Vector2> {
        match node.normals {
            [Some(a), Some(b)] => {
                let (a, b) = (self.normal(a), self.normal(b));
                let denominator = 1.0 + a.dot(&b);
                (denominator > PINCH_EPSILON).then(|| (a + b) / denominator)
            }
            [Some(n), None] | [None, Some(n)] => Some(self.normal(n)),
            [None, None] => None,
        }
    }

    /// Position of a node at `travel`, extrapolated along its heading.
    #[must_use]
    pub fn position_at(&self, id: NodeId, travel: f64) -> Option<Point2> {
        self.arena.get(id).map(|node| self.project(node, travel))
    }

    fn project(&self, node: &Node, travel: f64) -> Point2 {
        match self.heading_of(node) {
            Some(heading) => node.point + heading * (travel - node.travel),
            None => node.point,
        }
    }

    /// Where a node can still get to before the run ends.
    fn path(&self, node: &Node) -> Aabb {
        match self.limit {
            Some(limit) => Aabb::from_points(&[node.point, self.project(node, limit)]),
            None => Aabb::EVERYTHING,
        }
    }

    fn is_reflex(&self, node: &Node) -> bool {
        match node.normals {
            [Some(a), Some(b)] => self.normal(a).wedge(&self.normal(b)) <= PARALLEL_EPSILON,
            _ => false,
        }
    }

    fn splits_front(&self, id: NodeId) -> bool {
        let node = &self.arena[id];
        node.is_terminal() || self.is_reflex(node)
    }

    // --- Construction passes ---

    /// Re-pairs the fronts of nodes sharing an input point, so touching
    /// rings and chains merge there instead of overlapping.
    pub(crate) fn join_coincident<F>(&mut self, callback: &mut F)
    where
        F: FnMut(&Nodes, Change),
    {
        let mut groups: Vec<Vec<NodeId>> = Vec::new();
        let mut lookup: HashMap<[u64; 2], usize> = HashMap::new();
        for id in self.active().collect::<Vec<_>>() {
            let point = self.arena[id].point;
            match lookup.entry([point.x.to_bits(), point.y.to_bits()]) {
                Entry::Occupied(entry) => groups[*entry.get()].push(id),
                Entry::Vacant(entry) => {
                    entry.insert(groups.len());
                    groups.push(vec![id]);
                }
            }
        }
        for group in groups.iter().filter(|group| group.len() > 1) {
            self.join_group(group, callback);
        }
    }

    fn join_group<F>(&mut self, group: &[NodeId], callback: &mut F)
    where
        F: FnMut(&Nodes, Change),
    {
        let centre = self.arena[group[0]].point;
        let angle = |p: Point2| (p - centre).y.atan2((p - centre).x);
        let mut rays: Vec<(f64, Ray)> = Vec::new();
        for &id in group {
            let node = &self.arena[id];
            if let Some(prev) = node.prev() {
                rays.push((angle(self.arena[prev].point), Ray::Incoming(id)));
            }
            if let Some(next) = node.next() {
                rays.push((angle(self.arena[next].point), Ray::Outgoing(id)));
            }
        }
        rays.sort_by(|a, b| a.0.total_cmp(&b.0));
        let count = rays.len();
        if rays.windows(2).any(|pair| pair[1].0 - pair[0].0 < ANGLE_EPSILON) {
            // Overlapping edges leave the pairing ambiguous.
            return;
        }

        // Each outgoing edge pairs with the incoming edge immediately
        // counter-clockwise of it: the front sweeps the sector between them.
        let mut pairs = Vec::new();
        for (i, &(_, ray)) in rays.iter().enumerate() {
            match (ray, rays[(i + 1) % count].1, rays[(i + count - 1) % count].1) {
                (Ray::Outgoing(outgoing), Ray::Incoming(incoming), _) => {
                    pairs.push((incoming, outgoing));
                }
                (Ray::Incoming(_), _, Ray::Outgoing(_)) => {}
                _ => return,
            }
        }
        if pairs.iter().all(|(incoming, outgoing)| incoming == outgoing) {
            return;
        }

        for &id in group {
            self.arena[id].active = false;
        }
        for (incoming, outgoing) in pairs {
            let (from, to) = (&self.arena[incoming], &self.arena[outgoing]);
            let neighbours = [from.prev(), to.next()];
            let normals = [from.normals[0], to.normals[1]];
            let kind = NodeKind::Split {
                source: incoming,
                edge: [incoming, outgoing],
            };
            let original = from.original;
            let id = self
                .arena
                .insert(Node::new(kind, centre, 0.0, original));
            self.link(id, neighbours, normals);
            callback(self, Change::Replaced { consumed: incoming, produced: id });
            if outgoing != incoming {
                callback(self, Change::Replaced { consumed: outgoing, produced: id });
            }
        }
    }

    /// Replaces reflex corners turning more than the rounding angle with a
    /// fan of coincident vertices, or with a two-vertex chamfer when they
    /// turn more than the cutoff angle.
    pub(crate) fn round_corners(&mut self, rounding_angle: Option<f64>, cutoff_angle: Option<f64>) {
        for id in self.active().collect::<Vec<_>>() {
            let node = &self.arena[id];
            let [Some(n0), Some(n1)] = node.normals else {
                continue;
            };
            let (a, b) = (self.normal(n0), self.normal(n1));
            let cross = a.wedge(&b);
            if cross > PARALLEL_EPSILON {
                continue;
            }
            // Clockwise turn from `a` to `b`, in [0, π].
            let sweep = cross.abs().atan2(a.dot(&b));
            let pinched = 1.0 + a.dot(&b) <= PINCH_EPSILON;
            let segments = if cutoff_angle.is_some_and(|c| sweep > c.to_radians() + ANGLE_EPSILON) {
                2
            } else {
                let fan = rounding_angle.map_or(1, |r| fan_segments(sweep, r.to_radians()));
                if pinched {
                    fan.max(2)
                } else {
                    fan
                }
            };
            if segments > 1 {
                self.fan(id, a, sweep, segments);
            }
        }
    }

    fn fan(&mut self, id: NodeId, start: Vector2, sweep: f64, segments: usize) {
        let node = &self.arena[id];
        let (point, original, next, last) = (node.point, node.original, node.next(), node.normals[1]);
        #[allow(clippy::cast_precision_loss)]
        let step = sweep / segments as f64;

        let mut previous = id;
        for k in 1..segments {
            #[allow(clippy::cast_precision_loss)]
            let normal = self.push_normal(start.rotate_by(-step * k as f64));
            self.arena[previous].normals[1] = Some(normal);
            let vertex = self
                .arena
                .insert(Node::new(NodeKind::Vertex, point, 0.0, original));
            self.arena[vertex].normals[0] = Some(normal);
            self.arena[previous].neighbours[1] = Some(vertex);
            self.arena[vertex].neighbours[0] = Some(previous);
            previous = vertex;
        }
        self.arena[previous].normals[1] = last;
        self.arena[previous].neighbours[1] = next;
        if let Some(next) = next {
            self.arena[next].neighbours[0] = Some(previous);
        }
    }

    /// Indexes every edge, then queues the first collapse and split
    /// candidates.
    pub(crate) fn prepare(&mut self) {
        for id in self.active().collect::<Vec<_>>() {
            self.track(id);
        }
        self.reindex();
        self.seed();
    }

    /// Rebuilds the spatial index from the edges of the current front.
    fn reindex(&mut self) {
        self.boxes.clear();
        self.reach.fill(Aabb::EMPTY);
        for id in self.active().collect::<Vec<_>>() {
            self.index_edge(id);
        }
        self.index = RTree::bulk_load(self.boxes.iter().copied());
        self.indexed = self.boxes.len();
    }

    /// Records the box the edge leaving `id` sweeps between now and the
    /// limit. Returns the box when it reaches past everything recorded for
    /// the edge line so far.
    fn index_edge(&mut self, id: NodeId) -> Option<(Aabb, NormalId)> {
        let node = &self.arena[id];
        let (next, normal) = (node.next()?, node.normals[1]?);
        let next = &self.arena[next];
        let until = self.limit.unwrap_or(self.travel);
        // Both ends move linearly, so the edge stays within the hull of
        // where they start and where they end up.
        let sweep = Aabb::from_points(&[
            self.project(node, self.travel),
            self.project(next, self.travel),
            self.project(node, until),
            self.project(next, until),
        ]);
        self.boxes.push((sweep, normal));
        let reach = &mut self.reach[normal.index()];
        let grown = !reach.contains(&sweep);
        *reach = reach.union(&sweep);
        grown.then_some((sweep, normal))
    }

    /// Rebuilds the R-tree once the boxes recorded since the last build
    /// outnumber the ones in it.
    fn refresh_index(&mut self) {
        if self.boxes.len() - self.indexed > self.indexed.max(MIN_PENDING) {
            self.index = RTree::bulk_load(self.boxes.iter().copied());
            self.indexed = self.boxes.len();
        }
    }

    fn seed(&mut self) {
        let ids: Vec<NodeId> = self.active().collect();
        for &id in &ids {
            if let Some(next) = self.arena[id].next() {
                self.collapse([id, next]);
            }
        }
        if self.splits {
            for &id in &ids {
                if self.splits_front(id) {
                    self.split(id);
                }
            }
        }
    }

    fn track(&mut self, id: NodeId) {
        if let Some(normal) = self.arena[id].normals[1] {
            self.tracks[normal.index()].push(id);
        }
    }

    /// Live pieces of the edge line with `normal`.
    fn live_edges(&self, normal: NormalId) -> Vec<[NodeId; 2]> {
        self.tracks[normal.index()]
            .iter()
            .filter_map(|&id| {
                let node = &self.arena[id];
                if node.active && node.normals[1] == Some(normal) {
                    node.next().map(|next| [id, next])
                } else {
                    None
                }
            })
            .collect()
    }

    // --- Candidate solves ---

    /// Queues the collapse of the edge `[a, b]`, if its neighbouring edges
    /// converge on it.
    fn collapse(&mut self, edge: [NodeId; 2]) {
        let [a, b] = edge;
        let (start, end) = (&self.arena[a], &self.arena[b]);
        if (start.point - end.point).norm() <= self.epsilon
            && (start.travel - end.travel).abs() <= self.epsilon
        {
            return;
        }
        let Some(shared) = start.normals[1] else {
            return;
        };
        let m = self.normal(shared);
        let outer_a = start.normals[0].map(|n| self.normal(n));
        let outer_b = end.normals[1].map(|n| self.normal(n));
        let converging = |n: &Vector2| n.wedge(&m).abs() > PARALLEL_EPSILON;

        let solution = match (outer_a.filter(converging), outer_b.filter(converging)) {
            (Some(na), Some(nb)) => solve(
                [na, m, nb],
                [
                    offset(&na, &start.point, start.travel),
                    offset(&m, &start.point, start.travel),
                    offset(&nb, &end.point, end.travel),
                ],
            ),
            // The far end moves straight along the shared normal.
            (Some(na), None) if outer_b.is_none_or(|n| n.dot(&m) > 0.0) => solve_asym(
                na,
                m,
                m,
                [
                    offset(&na, &start.point, start.travel),
                    offset(&m, &start.point, start.travel),
                    m.wedge(&end.point.coords),
                ],
            ),
            (None, Some(nb)) if outer_a.is_none_or(|n| n.dot(&m) > 0.0) => solve_asym(
                nb,
                m,
                m,
                [
                    offset(&nb, &end.point, end.travel),
                    offset(&m, &end.point, end.travel),
                    m.wedge(&start.point.coords),
                ],
            ),
            _ => None,
        };
        let Some((point, travel)) = solution else {
            return;
        };

        let reference = start.travel.max(end.travel).max(self.travel);
        if travel < reference - self.epsilon {
            return;
        }
        if travel < reference + self.epsilon && !self.shrinking(edge) {
            return;
        }
        let travel = travel.max(reference);
        if self.limit.is_some_and(|limit| travel > limit + self.epsilon) {
            return;
        }
        self.queue.insert(travel, point, EventKind::Collapse { edge });
    }

    /// Whether the edge `[a, b]` is getting shorter.
    fn shrinking(&self, [a, b]: [NodeId; 2]) -> bool {
        let Some(normal) = self.arena[a].normals[1] else {
            return false;
        };
        let m = self.normal(normal);
        let direction = Vector2::new(m.y, -m.x);
        match (self.heading(a), self.heading(b)) {
            (Some(ha), Some(hb)) => (hb - ha).dot(&direction) < 0.0,
            _ => true,
        }
    }

    /// Queues every split of the reflex or terminal node `id` against edges
    /// the spatial index places within reach.
    fn split(&mut self, id: NodeId) {
        let node = &self.arena[id];
        let query = self.path(node).expand(self.epsilon);
        let own = node.normals;
        let pending = self.boxes[self.indexed..]
            .iter()
            .filter(|(sweep, _)| sweep.intersects(&query))
            .map(|&(_, normal)| normal);
        let mut seen = HashSet::new();
        let normals: Vec<NormalId> = self
            .index
            .search(&query)
            .copied()
            .chain(pending)
            .filter(|&normal| !own.contains(&Some(normal)) && seen.insert(normal))
            .collect();

        let mut candidates = Vec::new();
        for normal in normals {
            for edge in self.live_edges(normal) {
                if edge.contains(&id) {
                    continue;
                }
                if let Some((point, travel)) = self.solve_split(id, edge, normal) {
                    candidates.push((travel, point, EventKind::Split { node: id, edge, normal }));
                }
            }
        }
        for (travel, point, kind) in candidates {
            self.queue.insert(travel, point, kind);
        }
    }

    /// Queues splits against the edge `[a, b]` for every node whose path
    /// crosses `sweep`. Needed when an edge line reaches somewhere none of
    /// its earlier pieces did, since nodes searched the index before the
    /// piece existed.
    fn split_against(&mut self, edge: [NodeId; 2], normal: NormalId, sweep: &Aabb) {
        let sweep = sweep.expand(self.epsilon);
        let candidates: Vec<_> = self
            .active()
            .filter(|&id| !edge.contains(&id) && self.splits_front(id))
            .filter(|&id| {
                let node = &self.arena[id];
                !node.normals.contains(&Some(normal)) && self.path(node).intersects(&sweep)
            })
            .filter_map(|id| {
                let (point, travel) = self.solve_split(id, edge, normal)?;
                Some((travel, point, EventKind::Split { node: id, edge, normal }))
            })
            .collect();
        for (travel, point, kind) in candidates {
            self.queue.insert(travel, point, kind);
        }
    }

    fn solve_split(&self, id: NodeId, edge: [NodeId; 2], normal: NormalId) -> Option<(Point2, f64)> {
        let node = &self.arena[id];
        let heading = self.heading_of(node)?;
        let ne = self.normal(normal);
        if ne.dot(&heading) >= 1.0 - PARALLEL_EPSILON {
            // The node never catches the edge from in front.
            return None;
        }
        for end in edge {
            let other = &self.arena[end];
            if (other.point - node.point).norm() <= self.epsilon
                && (other.travel - node.travel).abs() <= self.epsilon
            {
                return None;
            }
        }
        let start = &self.arena[edge[0]];
        let x_edge = offset(&ne, &start.point, start.travel);

        let (point, travel) = match node.normals.map(|n| n.map(|n| self.normal(n))) {
            [Some(a), Some(b)] if a.wedge(&b).abs() > PARALLEL_EPSILON => solve(
                [a, b, ne],
                [
                    offset(&a, &node.point, node.travel),
                    offset(&b, &node.point, node.travel),
                    x_edge,
                ],
            )?,
            [a, b] => {
                let n = a.or(b)?;
                solve_asym(
                    n,
                    ne,
                    heading,
                    [
                        offset(&n, &node.point, node.travel),
                        x_edge,
                        heading.wedge(&node.point.coords),
                    ],
                )?
            }
        };

        if travel <= node.travel + self.epsilon || travel < self.travel - self.epsilon {
            return None;
        }
        let travel = travel.max(self.travel);
        if self.limit.is_some_and(|limit| travel > limit + self.epsilon) {
            return None;
        }
        self.brackets(edge, &point).then_some((point, travel))
    }

    /// Whether `point` lies between the trajectories of the edge's two ends.
    fn brackets(&self, [e0, e1]: [NodeId; 2], point: &Point2) -> bool {
        let (start, end) = (&self.arena[e0], &self.arena[e1]);
        let (Some(h0), Some(h1)) = (self.heading_of(start), self.heading_of(end)) else {
            return false;
        };
        (point - start.point).wedge(&h0) >= -self.epsilon
            && (point - end.point).wedge(&h1) <= self.epsilon
    }

    // --- Simulation ---

    /// Pops events in travel order until the queue is exhausted, applying
    /// each one that is still viable.
    pub(crate) fn drain<F>(&mut self, interval: Option<f64>, callback: &mut F)
    where
        F: FnMut(&Nodes, Change),
    {
        let mut samples = 1u32;
        loop {
            let next_travel = self.queue.peek_travel();
            if let Some(step) = interval {
                let sample = f64::from(samples) * step;
                // Past the last event, sampling carries on up to the limit.
                let due = match (next_travel, self.limit) {
                    (Some(next), limit) => {
                        sample < next - self.epsilon
                            && limit.is_none_or(|limit| sample <= limit + self.epsilon)
                    }
                    (None, Some(limit)) => sample <= limit + self.epsilon,
                    (None, None) => false,
                };
                if due {
                    self.sample(sample, callback);
                    samples += 1;
                    continue;
                }
            }
            let Some(event) = self.queue.pop() else {
                break;
            };
            let Some(edge) = self.viable(&event) else {
                self.stale += 1;
                continue;
            };
            let travel = self.travel.max(event.travel);
            self.travel = travel;
            self.processed += 1;
            trace!(travel, kind = ?event.kind, "applying event");
            match event.kind {
                EventKind::Collapse { .. } => {
                    self.apply_collapse(edge, event.point, travel, callback);
                }
                EventKind::Split { node, normal, .. } => {
                    self.apply_split(node, edge, normal, event.point, travel, callback);
                }
            }
        }
    }

    /// Re-checks a popped event, returning the edge it now applies to.
    fn viable(&self, event: &Event) -> Option<[NodeId; 2]> {
        match event.kind {
            EventKind::Collapse { edge: [a, b] } => {
                let (start, end) = (&self.arena[a], &self.arena[b]);
                (start.active && end.active && start.next() == Some(b)).then_some([a, b])
            }
            EventKind::Split { node, normal, .. } => {
                if !self.arena[node].active {
                    return None;
                }
                self.live_edges(normal)
                    .into_iter()
                    .find(|edge| !edge.contains(&node) && self.brackets(*edge, &event.point))
            }
        }
    }

    fn apply_collapse<F>(&mut self, edge: [NodeId; 2], point: Point2, travel: f64, callback: &mut F)
    where
        F: FnMut(&Nodes, Change),
    {
        let [a, b] = edge;
        let prev = self.arena[a].prev();
        let next = self.arena[b].next();
        let normals = [self.arena[a].normals[0], self.arena[b].normals[1]];
        self.arena[a].active = false;
        self.arena[b].active = false;

        if prev == Some(b) || (prev.is_some() && prev == next) {
            // The ring shrinks to nothing.
            let at = self
                .arena
                .insert_with_key(|key| Node::new(NodeKind::Collapse { sources: edge }, point, travel, key));
            self.arena[at].active = false;
            let mut consumed = vec![a, b];
            if let Some(c) = prev.filter(|&c| c != b) {
                self.arena[c].active = false;
                consumed.push(c);
            }
            for id in consumed {
                callback(self, Change::Vanished { consumed: id, at });
            }
            return;
        }

        let id = self
            .arena
            .insert_with_key(|key| Node::new(NodeKind::Collapse { sources: edge }, point, travel, key));
        callback(self, Change::Replaced { consumed: a, produced: id });
        callback(self, Change::Replaced { consumed: b, produced: id });
        self.insert(id, [prev, next], normals, callback);
    }

    fn apply_split<F>(
        &mut self,
        source: NodeId,
        edge: [NodeId; 2],
        normal: NormalId,
        point: Point2,
        travel: f64,
        callback: &mut F,
    ) where
        F: FnMut(&Nodes, Change),
    {
        let [e0, e1] = edge;
        let [prev, next] = self.arena[source].neighbours;
        let [n0, n1] = self.arena[source].normals;
        self.arena[source].active = false;

        let halves = [
            ([prev, Some(e1)], [n0, Some(normal)]),
            ([Some(e0), next], [Some(normal), n1]),
        ];
        let mut folded = Vec::new();
        let mut produced = None;
        for (neighbours, normals) in halves {
            if let [Some(p), Some(n)] = neighbours {
                if p == n {
                    // The piece between them is a sliver that closes here.
                    self.arena[p].active = false;
                    folded.push(p);
                    continue;
                }
            }
            let original = self.arena[source].original;
            let id = self.arena.insert(Node::new(
                NodeKind::Split { source, edge },
                point,
                travel,
                original,
            ));
            produced.get_or_insert(id);
            callback(self, Change::Replaced { consumed: source, produced: id });
            self.insert(id, neighbours, normals, callback);
        }

        if folded.is_empty() {
            return;
        }
        let at = match produced {
            Some(at) => at,
            None => {
                let original = self.arena[source].original;
                let at = self.arena.insert(Node::new(
                    NodeKind::Split { source, edge },
                    point,
                    travel,
                    original,
                ));
                self.arena[at].active = false;
                callback(self, Change::Vanished { consumed: source, at });
                at
            }
        };
        for id in folded {
            callback(self, Change::Vanished { consumed: id, at });
        }
    }

    /// Sets a node's links, splices it into the front and queues the
    /// events its new edges give rise to.
    fn insert<F>(
        &mut self,
        id: NodeId,
        neighbours: [Option<NodeId>; 2],
        normals: [Option<NormalId>; 2],
        callback: &mut F,
    ) where
        F: FnMut(&Nodes, Change),
    {
        self.link(id, neighbours, normals);
        self.track(id);

        if let (true, [Some(prev), Some(next)]) = (self.pinched(id), neighbours) {
            // Antiparallel edges overlap: zip them up to the nearer end.
            let here = self.arena[id].point;
            let travel = self.arena[id].travel;
            let at_prev = self.project(&self.arena[prev], travel);
            let at_next = self.project(&self.arena[next], travel);
            trace!(travel, "zipping pinched node");
            if (at_next - here).norm() <= (at_prev - here).norm() {
                self.apply_collapse([id, next], at_next, travel, callback);
            } else {
                self.apply_collapse([prev, id], at_prev, travel, callback);
            }
            return;
        }

        let grown: Vec<([NodeId; 2], Aabb, NormalId)> = [neighbours[0], Some(id)]
            .into_iter()
            .flatten()
            .filter_map(|start| {
                let end = self.arena[start].next()?;
                let (sweep, normal) = self.index_edge(start)?;
                Some(([start, end], sweep, normal))
            })
            .collect();
        self.refresh_index();

        if let Some(prev) = neighbours[0] {
            self.collapse([prev, id]);
        }
        if let Some(next) = neighbours[1] {
            self.collapse([id, next]);
        }
        if self.splits {
            if self.splits_front(id) {
                self.split(id);
            }
            if self.limit.is_some() {
                for (edge, sweep, normal) in grown {
                    self.split_against(edge, normal, &sweep);
                }
            }
        }
    }

    fn link(&mut self, id: NodeId, neighbours: [Option<NodeId>; 2], normals: [Option<NormalId>; 2]) {
        let node = &mut self.arena[id];
        node.neighbours = neighbours;
        node.normals = normals;
        if let Some(prev) = neighbours[0] {
            self.arena[prev].neighbours[1] = Some(id);
        }
        if let Some(next) = neighbours[1] {
            self.arena[next].neighbours[0] = Some(id);
        }
    }

    /// Whether the node's two edges are antiparallel.
    fn pinched(&self, id: NodeId) -> bool {
        match self.arena[id].normals {
            [Some(a), Some(b)] => 1.0 + self.normal(a).dot(&self.normal(b)) <= PINCH_EPSILON,
            _ => false,
        }
    }

    /// Replaces every active node with a fresh vertex at its position at
    /// `travel` and rebuilds the candidate queue.
    fn sample<F>(&mut self, travel: f64, callback: &mut F)
    where
        F: FnMut(&Nodes, Change),
    {
        self.travel = travel;
        let ids: Vec<NodeId> = self.active().collect();
        let mut copies: SecondaryMap<NodeId, NodeId> = SecondaryMap::new();
        for &id in &ids {
            let point = self.project(&self.arena[id], travel);
            let original = self.arena[id].original;
            let copy = self
                .arena
                .insert(Node::new(NodeKind::Vertex, point, travel, original));
            copies.insert(id, copy);
        }
        for &id in &ids {
            let node = &self.arena[id];
            let neighbours = node
                .neighbours
                .map(|n| n.and_then(|n| copies.get(n).copied()));
            let normals = node.normals;
            let copy = copies[id];
            self.arena[id].active = false;
            let target = &mut self.arena[copy];
            target.neighbours = neighbours;
            target.normals = normals;
            self.track(copy);
            callback(self, Change::Replaced { consumed: id, produced: copy });
        }
        callback(self, Change::Sample { travel });
        self.queue.clear();
        self.reindex();
        self.seed();
    }

    pub(crate) fn queued(&self) -> usize {
        self.queue.len()
    }
}

/// Number of fan segments needed so no step exceeds `step` radians.
fn fan_segments(sweep: f64, step: f64) -> usize {
    if sweep <= step + ANGLE_EPSILON {
        return 1;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let segments = (sweep / step - ANGLE_EPSILON).ceil() as usize;
    segments.max(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn fan_segment_counts() {
        assert_eq!(fan_segments(PI / 2.0, (90.0_f64).to_radians()), 1);
        assert_eq!(fan_segments(PI / 2.0, (15.0_f64).to_radians()), 6);
        assert_eq!(fan_segments(PI, (15.0_f64).to_radians()), 12);
        assert_eq!(fan_segments(0.3, 0.2), 2);
    }

    #[test]
    fn chain_nodes_are_terminal() {
        let chain = Line::chain(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]);
        let nodes = Nodes::build(&[chain], false, None, true);
        let terminals = nodes
            .active()
            .filter(|&id| nodes.get(id).is_some_and(Node::is_terminal))
            .count();
        assert_eq!(terminals, 2);
    }

    #[test]
    fn ring_headings_are_mitres() {
        let square = Line::ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let nodes = Nodes::build(&[square], false, None, true);
        let first = nodes.active().next().unwrap_or_default();
        let heading = nodes.heading(first).unwrap_or_else(Vector2::zeros);
        assert!((heading - Vector2::new(1.0, 1.0)).norm() < 1e-12);
        let corner = nodes.position_at(first, 2.0).unwrap_or_else(Point2::origin);
        assert!((corner - Point2::new(2.0, 2.0)).norm() < 1e-12);
        assert!(nodes.position_at(NodeId::default(), 2.0).is_none());
    }

    #[test]
    fn reflex_corner_is_fanned() {
        let l_shape = Line::ring(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 5.0),
            (5.0, 5.0),
            (5.0, 10.0),
            (0.0, 10.0),
        ]);
        let mut nodes = Nodes::build(&[l_shape], false, None, true);
        nodes.round_corners(Some(15.0), None);
        assert_eq!(nodes.active().count(), 5 + 6);

        let mut chamfered = Nodes::build(&[Line::ring(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 5.0),
            (5.0, 5.0),
            (5.0, 10.0),
            (0.0, 10.0),
        ])], false, None, true);
        chamfered.round_corners(Some(15.0), Some(45.0));
        assert_eq!(chamfered.active().count(), 5 + 2);
    }

    #[test]
    fn touching_squares_merge_when_grown() {
        // Clockwise squares grow outward when moving left.
        let a = Line::ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        let b = Line::ring(&[(10.0, 10.0), (10.0, 20.0), (20.0, 20.0), (20.0, 10.0)]);
        let mut nodes = Nodes::build(&[a, b], false, None, true);
        let mut joined = 0;
        nodes.join_coincident(&mut |_: &Nodes, change| {
            if matches!(change, Change::Replaced { .. }) {
                joined += 1;
            }
        });
        assert_eq!(joined, 4);
        assert_eq!(nodes.active().count(), 8);
        // The two rings now form a single loop.
        let start = nodes.active().next().unwrap_or_default();
        let mut current = start;
        let mut steps = 0;
        loop {
            current = nodes.get(current).and_then(Node::next).unwrap_or(start);
            steps += 1;
            if current == start || steps > 20 {
                break;
            }
        }
        assert_eq!(steps, 8);
    }

    #[test]
    fn touching_squares_stay_apart_when_shrunk() {
        let a = Line::ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let b = Line::ring(&[(10.0, 10.0), (20.0, 10.0), (20.0, 20.0), (10.0, 20.0)]);
        let mut nodes = Nodes::build(&[a, b], false, None, true);
        let mut joined = 0;
        nodes.join_coincident(&mut |_: &Nodes, _| joined += 1);
        assert_eq!(joined, 0);
    }
}
