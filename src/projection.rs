use petgraph::unionfind::UnionFind;

use fnv::FnvHashMap;

use crate::sides::NodeId;

/// Tracks which vertices of a multigraph have been merged into one
/// another. Every class carries a label, the lowest label of the
/// vertices merged into it, so the outcome of a series of merges does
/// not depend on the order they were made in.
#[derive(Clone)]
pub struct Projection {
    union_find: UnionFind<usize>,
    labels: Vec<NodeId>,
    inverse: Option<InverseProjection>,
}

pub type InverseProjection = FnvHashMap<usize, Vec<usize>>;

impl Projection {
    /// One singleton class per label, with vertex `i` labeled
    /// `labels[i]`.
    pub fn new(labels: Vec<NodeId>) -> Self {
        let union_find = UnionFind::new(labels.len());
        Self {
            union_find,
            labels,
            inverse: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn find(&self, x: usize) -> usize {
        self.union_find.find(x)
    }

    #[inline]
    pub fn find_mut(&mut self, x: usize) -> usize {
        self.union_find.find_mut(x)
    }

    /// Merge the classes of `x` and `y`. Returns false if they
    /// already were the same class.
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        let p_x = self.union_find.find_mut(x);
        let p_y = self.union_find.find_mut(y);
        if p_x == p_y {
            return false;
        }

        let label = self.labels[p_x].min(self.labels[p_y]);
        self.union_find.union(p_x, p_y);
        let rep = self.union_find.find_mut(p_x);
        self.labels[rep] = label;
        self.inverse = None;
        true
    }

    /// The label of the class `x` belongs to
    #[inline]
    pub fn label(&self, x: usize) -> NodeId {
        self.labels[self.find(x)]
    }

    /// Constructs the inverse projection map if it does not already
    /// exist. Returns false if the map already existed and did not
    /// have to be built.
    pub fn build_inverse(&mut self) -> bool {
        if self.inverse.is_some() {
            return false;
        }

        let mut inverse: InverseProjection = FnvHashMap::default();
        let reps = self.union_find.clone().into_labeling();

        for (i, k) in reps.into_iter().enumerate() {
            inverse.entry(k).or_default().push(i);
        }

        self.inverse = Some(inverse);
        true
    }

    /// Given a class representative, return the vertices that were
    /// projected into it. Returns None if the inverse map hasn't been
    /// built.
    pub fn projected_from(&self, x: usize) -> Option<&[usize]> {
        let inverse = self.inverse.as_ref()?;
        let projected = inverse.get(&x)?;
        Some(projected.as_slice())
    }
}
