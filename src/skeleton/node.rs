use crate::math::Point2;

slotmap::new_key_type! {
    /// Unique identifier for a wavefront node in the engine's arena.
    pub struct NodeId;
}

/// Identity of a wavefront edge line.
///
/// Every input edge (and every edge added by corner rounding) gets its own
/// normal. Pieces produced when an edge is split keep the normal of the
/// edge they came from, so the id names the supporting line rather than a
/// single segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalId(pub(crate) u32);

impl NormalId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a node came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An input point, a point inserted by corner rounding, or a resampled
    /// copy of an active node.
    Vertex,
    /// Two adjacent nodes met where their shared edge shrank to nothing.
    Collapse { sources: [NodeId; 2] },
    /// `source` ran into the edge `edge`, dividing the front. For
    /// coincident input points `edge` holds the two vertices whose fronts
    /// were re-paired.
    Split { source: NodeId, edge: [NodeId; 2] },
}

/// A node of the wavefront.
///
/// The position is stored at the travel the node was created at; positions
/// at any other travel follow from the node's heading.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) point: Point2,
    pub(crate) travel: f64,
    pub(crate) neighbours: [Option<NodeId>; 2],
    pub(crate) normals: [Option<NormalId>; 2],
    pub(crate) original: NodeId,
    pub(crate) active: bool,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, point: Point2, travel: f64, original: NodeId) -> Self {
        Self {
            kind,
            point,
            travel,
            neighbours: [None, None],
            normals: [None, None],
            original,
            active: true,
        }
    }

    /// How the node was created.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Position at the node's own travel.
    #[must_use]
    pub fn point(&self) -> Point2 {
        self.point
    }

    /// Travel at which the node came into existence.
    #[must_use]
    pub fn travel(&self) -> f64 {
        self.travel
    }

    /// Previous node along the front.
    #[must_use]
    pub fn prev(&self) -> Option<NodeId> {
        self.neighbours[0]
    }

    /// Next node along the front.
    #[must_use]
    pub fn next(&self) -> Option<NodeId> {
        self.neighbours[1]
    }

    /// Whether the node ends an open chain.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.neighbours.iter().any(Option::is_none)
    }

    /// Whether the node still belongs to the live front.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The input vertex (or collapse) this node traces back to.
    #[must_use]
    pub fn original(&self) -> NodeId {
        self.original
    }

    /// Normals of the incoming and outgoing edges.
    #[must_use]
    pub fn normals(&self) -> [Option<NormalId>; 2] {
        self.normals
    }
}
