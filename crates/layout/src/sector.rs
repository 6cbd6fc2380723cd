//! Rectangular sectors and the adjacency graph between them.
//!
//! Sectors live in an arena ([`SectorMap`]) and refer to each other by
//! [`SectorId`] handles. Splitting retires the parent slot and rewires every
//! list that pointed at it, so no handle to a retired sector survives.

use rand::Rng;
use sectorgen_common::GridPos;

use crate::error::LayoutError;
use crate::interval::Interval;

/// A coin flip must exceed this for a horizontal split when both axes are
/// feasible. Vertical splits win ties, so the choice is not fair.
const HORIZONTAL_SPLIT_THRESHOLD: f64 = 0.5;

/// Whether `size` holds two parts of at least `min` plus a one-unit wall.
/// Widened so oversized minimums read as "cannot split".
fn fits_split(size: i32, min: i32) -> bool {
    i64::from(size) >= 2 * i64::from(min) + 1
}

/// Stable handle to a sector inside a [`SectorMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectorId(pub usize);

impl std::fmt::Display for SectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Grid axis. `Horizontal` is the x (column) axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// The two sides bounding a sector along this axis, low coordinate first.
    pub fn sides(self) -> (Side, Side) {
        match self {
            Axis::Horizontal => (Side::Left, Side::Right),
            Axis::Vertical => (Side::Top, Side::Bottom),
        }
    }

    pub fn other(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// Edge of a sector. `Top` faces smaller `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Axis the shared edge runs along. Neighbours on this side must overlap
    /// the sector on this axis.
    pub fn edge_axis(self) -> Axis {
        match self {
            Side::Top | Side::Bottom => Axis::Horizontal,
            Side::Left | Side::Right => Axis::Vertical,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Axis-aligned rectangle of open cells, the unit of partitioning.
#[derive(Debug, Clone)]
pub struct Sector {
    horizontal: Interval,
    vertical: Interval,
    neighbours: [Vec<SectorId>; 4],
    /// Indices into the connection list of the generation run.
    connections: Vec<usize>,
    visited: bool,
}

impl Sector {
    /// Create an unlinked sector covering `horizontal` x `vertical`.
    pub fn new(horizontal: Interval, vertical: Interval) -> Self {
        Self {
            horizontal,
            vertical,
            neighbours: Default::default(),
            connections: Vec::new(),
            visited: false,
        }
    }

    pub fn horizontal(&self) -> Interval {
        self.horizontal
    }

    pub fn vertical(&self) -> Interval {
        self.vertical
    }

    pub fn extent(&self, axis: Axis) -> Interval {
        match axis {
            Axis::Horizontal => self.horizontal,
            Axis::Vertical => self.vertical,
        }
    }

    pub fn width(&self) -> i32 {
        self.horizontal.size()
    }

    pub fn height(&self) -> i32 {
        self.vertical.size()
    }

    pub fn area(&self) -> i64 {
        i64::from(self.width()) * i64::from(self.height())
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        self.horizontal.contains(pos.x) && self.vertical.contains(pos.y)
    }

    /// One unit of width is reserved for the dividing wall.
    pub fn can_split_horizontally(&self, min_width: i32) -> bool {
        fits_split(self.width(), min_width)
    }

    pub fn can_split_vertically(&self, min_height: i32) -> bool {
        fits_split(self.height(), min_height)
    }

    pub fn can_split(&self, min_width: i32, min_height: i32) -> bool {
        self.can_split_horizontally(min_width) || self.can_split_vertically(min_height)
    }

    pub fn neighbours_on(&self, side: Side) -> &[SectorId] {
        &self.neighbours[side.index()]
    }

    /// All neighbours, top, bottom, left, then right.
    pub fn neighbours(&self) -> impl Iterator<Item = SectorId> + '_ {
        Side::ALL
            .into_iter()
            .flat_map(move |side| self.neighbours[side.index()].iter().copied())
    }

    pub fn connections(&self) -> &[usize] {
        &self.connections
    }

    #[cfg(test)]
    pub(crate) fn clear_neighbours(&mut self, side: Side) {
        self.neighbours[side.index()].clear();
    }

    pub fn is_visited(&self) -> bool {
        self.visited
    }

    /// Whether `other` sits on `side` of this sector, one wall apart.
    ///
    /// Only the separation along the side's normal is checked; overlap along
    /// the edge is a separate condition.
    pub fn borders(&self, other: &Sector, side: Side) -> bool {
        match side {
            Side::Left => other.horizontal.max() + 2 == self.horizontal.min(),
            Side::Right => self.horizontal.max() + 2 == other.horizontal.min(),
            Side::Top => other.vertical.max() + 2 == self.vertical.min(),
            Side::Bottom => self.vertical.max() + 2 == other.vertical.min(),
        }
    }

    fn with_extent(&self, axis: Axis, extent: Interval) -> Sector {
        match axis {
            Axis::Horizontal => Sector::new(extent, self.vertical),
            Axis::Vertical => Sector::new(self.horizontal, extent),
        }
    }
}

/// Arena owning every live sector plus the ordered list of active handles.
///
/// Retired slots stay in place as `None` so handles never get reused.
#[derive(Debug, Clone, Default)]
pub struct SectorMap {
    slots: Vec<Option<Sector>>,
    active: Vec<SectorId>,
}

impl SectorMap {
    /// Start a map with a single root sector.
    pub fn new(root: Sector) -> Self {
        Self {
            slots: vec![Some(root)],
            active: vec![SectorId(0)],
        }
    }

    /// Number of live sectors.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Live sector handles in active-list order.
    pub fn ids(&self) -> &[SectorId] {
        &self.active
    }

    pub fn get(&self, id: SectorId) -> Option<&Sector> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: SectorId) -> Option<&mut Sector> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    fn require(&self, id: SectorId) -> Result<&Sector, LayoutError> {
        self.get(id).ok_or(LayoutError::UnknownSector(id))
    }

    /// Live sectors in active-list order.
    pub fn iter(&self) -> impl Iterator<Item = (SectorId, &Sector)> + '_ {
        self.active
            .iter()
            .filter_map(move |&id| self.get(id).map(|sector| (id, sector)))
    }

    /// Neighbours of `id` on all four sides. Empty for unknown handles.
    pub fn neighbours(&self, id: SectorId) -> Vec<SectorId> {
        self.get(id)
            .map(|sector| sector.neighbours().collect())
            .unwrap_or_default()
    }

    pub fn is_neighbour(&self, a: SectorId, b: SectorId) -> bool {
        self.get(a).is_some_and(|sector| sector.neighbours().any(|n| n == b))
    }

    /// Split a sector in two along a randomly chosen axis.
    ///
    /// Horizontal wins when a coin flip exceeds the threshold, or whenever a
    /// vertical split is infeasible. A sector that cannot be split on either
    /// axis is returned unchanged as the only element.
    pub fn split<R: Rng + ?Sized>(
        &mut self,
        id: SectorId,
        min_width: i32,
        min_height: i32,
        rng: &mut R,
    ) -> Result<Vec<SectorId>, LayoutError> {
        let sector = self.require(id)?;
        let horizontal = sector.can_split_horizontally(min_width);
        let vertical = sector.can_split_vertically(min_height);
        if !horizontal && !vertical {
            return Ok(vec![id]);
        }

        if (horizontal && rng.random::<f64>() > HORIZONTAL_SPLIT_THRESHOLD) || !vertical {
            self.split_along(id, Axis::Horizontal, min_width, rng)
        } else {
            self.split_along(id, Axis::Vertical, min_height, rng)
        }
    }

    /// Split a sector across `axis`, leaving a one-unit wall between the two
    /// children. The parent is retired and replaced by its children at the
    /// end of the active list.
    ///
    /// Returns the parent unchanged when the extent on `axis` is too small.
    pub fn split_along<R: Rng + ?Sized>(
        &mut self,
        id: SectorId,
        axis: Axis,
        min_size: i32,
        rng: &mut R,
    ) -> Result<Vec<SectorId>, LayoutError> {
        let span = self.require(id)?.extent(axis);
        if !fits_split(span.size(), min_size) {
            return Ok(vec![id]);
        }

        let space = span.size() - 1;
        let sampled = Interval::new(min_size, space - min_size).sample(rng);
        let (first_len, second_len) = match axis {
            Axis::Horizontal => (space - sampled, sampled),
            Axis::Vertical => (sampled, space - sampled),
        };
        let first_span = Interval::new(span.min(), span.min() + first_len - 1);
        let second_span = Interval::new(span.max() - second_len + 1, span.max());

        let parent = self.slots[id.0]
            .take()
            .ok_or(LayoutError::UnknownSector(id))?;
        let first_id = SectorId(self.slots.len());
        let second_id = SectorId(self.slots.len() + 1);
        let (near, far) = axis.sides();
        let (cross_low, cross_high) = axis.other().sides();

        let mut first = parent.with_extent(axis, first_span);
        let mut second = parent.with_extent(axis, second_span);
        first.neighbours[near.index()] = parent.neighbours_on(near).to_vec();
        first.neighbours[far.index()] = vec![second_id];
        second.neighbours[near.index()] = vec![first_id];
        second.neighbours[far.index()] = parent.neighbours_on(far).to_vec();
        for side in [cross_low, cross_high] {
            first.neighbours[side.index()] =
                self.overlapping(parent.neighbours_on(side), axis, first_span);
            second.neighbours[side.index()] =
                self.overlapping(parent.neighbours_on(side), axis, second_span);
        }
        self.slots.push(Some(first));
        self.slots.push(Some(second));

        for &n in parent.neighbours_on(near) {
            self.replace_neighbour(n, near.opposite(), id, &[first_id]);
        }
        for &n in parent.neighbours_on(far) {
            self.replace_neighbour(n, far.opposite(), id, &[second_id]);
        }
        for side in [cross_low, cross_high] {
            for &n in parent.neighbours_on(side) {
                self.replace_neighbour(n, side.opposite(), id, &[first_id, second_id]);
            }
        }

        if let Some(pos) = self.active.iter().position(|&a| a == id) {
            self.active.remove(pos);
        }
        self.active.push(first_id);
        self.active.push(second_id);

        tracing::trace!(
            parent = %id,
            ?axis,
            first = %first_span,
            second = %second_span,
            "sector split"
        );
        Ok(vec![first_id, second_id])
    }

    /// Entries of `list` whose extent on `axis` overlaps `span`.
    fn overlapping(&self, list: &[SectorId], axis: Axis, span: Interval) -> Vec<SectorId> {
        list.iter()
            .copied()
            .filter(|&n| {
                self.get(n)
                    .is_some_and(|sector| sector.extent(axis).intersects(span))
            })
            .collect()
    }

    /// Replace `old` in `target`'s list on `side` with those `candidates`
    /// that overlap `target` along that edge, keeping the list order.
    fn replace_neighbour(
        &mut self,
        target: SectorId,
        side: Side,
        old: SectorId,
        candidates: &[SectorId],
    ) {
        let axis = side.edge_axis();
        let Some(edge) = self.get(target).map(|sector| sector.extent(axis)) else {
            tracing::warn!(%target, "neighbour link points at a missing sector");
            return;
        };
        let replacements = self.overlapping(candidates, axis, edge);

        let Some(sector) = self.get_mut(target) else {
            return;
        };
        let list = &mut sector.neighbours[side.index()];
        match list.iter().position(|&n| n == old) {
            Some(pos) => {
                list.splice(pos..=pos, replacements);
            }
            None => tracing::warn!(%target, %old, ?side, "missing back-link during split"),
        }
    }

    /// Record connection `index` on both endpoints.
    pub(crate) fn record_connection(&mut self, index: usize, first: SectorId, second: SectorId) {
        for id in [first, second] {
            if let Some(sector) = self.get_mut(id) {
                sector.connections.push(index);
            }
        }
    }

    /// Mark a sector visited. Returns `false` if it already was.
    pub(crate) fn visit(&mut self, id: SectorId) -> Result<bool, LayoutError> {
        let sector = self.get_mut(id).ok_or(LayoutError::UnknownSector(id))?;
        if sector.visited {
            return Ok(false);
        }
        sector.visited = true;
        Ok(true)
    }

    /// Clear traversal state and recorded connections on every live sector.
    pub(crate) fn reset_traversal(&mut self) {
        for sector in self.slots.iter_mut().flatten() {
            sector.visited = false;
            sector.connections.clear();
        }
    }

    /// Check the adjacency invariant for every live sector: each neighbour is
    /// live, links back on the opposite side, sits one wall away and overlaps
    /// along the shared edge.
    pub fn verify_adjacency(&self) -> Result<(), LayoutError> {
        for &id in &self.active {
            let sector = self.require(id)?;
            for side in Side::ALL {
                let list = sector.neighbours_on(side);
                for (i, &n) in list.iter().enumerate() {
                    let broken = |reason: String| LayoutError::BrokenAdjacency { sector: id, reason };
                    if list[..i].contains(&n) {
                        return Err(broken(format!("{side:?} neighbour {n} listed twice")));
                    }
                    let Some(other) = self.get(n) else {
                        return Err(broken(format!("{side:?} neighbour {n} is retired")));
                    };
                    if !self.active.contains(&n) {
                        return Err(broken(format!("{side:?} neighbour {n} is not active")));
                    }
                    if !other.neighbours_on(side.opposite()).contains(&id) {
                        return Err(broken(format!("{side:?} neighbour {n} does not link back")));
                    }
                    let axis = side.edge_axis();
                    if !sector.extent(axis).intersects(other.extent(axis)) {
                        return Err(broken(format!("{side:?} neighbour {n} does not overlap")));
                    }
                    if !sector.borders(other, side) {
                        return Err(broken(format!(
                            "{side:?} neighbour {n} is not one wall away"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
