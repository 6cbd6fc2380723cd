//! Randomized spanning tree over the sector adjacency graph.

use rand::Rng;
use rand::seq::SliceRandom;
use sectorgen_common::GridPos;

use crate::error::LayoutError;
use crate::sector::{Sector, SectorId, SectorMap};

/// Undirected link between two adjacent sectors, realized by one gate tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    pub first: SectorId,
    pub second: SectorId,
    /// Wall cell between the two sectors that becomes passable.
    pub gate: GridPos,
}

impl Connection {
    /// The endpoint opposite `id`, if `id` is an endpoint at all.
    pub fn other(&self, id: SectorId) -> Option<SectorId> {
        if id == self.first {
            Some(self.second)
        } else if id == self.second {
            Some(self.first)
        } else {
            None
        }
    }

    pub fn joins(&self, a: SectorId, b: SectorId) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

/// Pick the gate cell on the border shared by two adjacent sectors.
///
/// Sectors overlapping vertically meet at a wall column; the row is sampled
/// from the overlap. Sectors overlapping horizontally meet at a wall row.
pub fn place_gate<R: Rng + ?Sized>(
    first: (SectorId, &Sector),
    second: (SectorId, &Sector),
    rng: &mut R,
) -> Result<GridPos, LayoutError> {
    let (a_id, a) = first;
    let (b_id, b) = second;
    let side_by_side = a.vertical().intersects(b.vertical());
    let stacked = a.horizontal().intersects(b.horizontal());

    match (side_by_side, stacked) {
        (true, false) => {
            let rows = a.vertical().intersect(b.vertical())?;
            let x = a.horizontal().max().min(b.horizontal().max()) + 1;
            Ok(GridPos::new(x, rows.sample(rng)))
        }
        (false, true) => {
            let columns = a.horizontal().intersect(b.horizontal())?;
            let y = a.vertical().max().min(b.vertical().max()) + 1;
            Ok(GridPos::new(columns.sample(rng), y))
        }
        _ => Err(LayoutError::NotAdjacent {
            first: a_id,
            second: b_id,
        }),
    }
}

/// Connect every sector reachable from a random start, one connection per
/// newly visited sector.
///
/// Traversal is a randomized depth-first walk driven by an explicit stack of
/// `(sector, origin)` pairs, so stack depth does not grow with the graph.
/// Fails with [`LayoutError::DisconnectedGraph`] if any live sector is left
/// unvisited.
pub fn build_spanning_tree<R: Rng + ?Sized>(
    sectors: &mut SectorMap,
    rng: &mut R,
) -> Result<Vec<Connection>, LayoutError> {
    sectors.reset_traversal();
    let mut connections = Vec::new();
    if sectors.is_empty() {
        return Ok(connections);
    }

    let start = sectors.ids()[rng.random_range(0..sectors.len())];
    let mut stack: Vec<(SectorId, Option<SectorId>)> = vec![(start, None)];
    let mut visited = 0usize;

    while let Some((id, origin)) = stack.pop() {
        if !sectors.visit(id)? {
            continue;
        }
        visited += 1;

        if let Some(origin) = origin {
            let connection = connect(sectors, origin, id, rng)?;
            tracing::debug!(
                from = %origin,
                to = %id,
                gate.x = connection.gate.x,
                gate.y = connection.gate.y,
                "sectors connected"
            );
            sectors.record_connection(connections.len(), origin, id);
            connections.push(connection);
        }

        let mut next = sectors.neighbours(id);
        next.shuffle(rng);
        stack.extend(next.into_iter().map(|n| (n, Some(id))));
    }

    if visited != sectors.len() {
        return Err(LayoutError::DisconnectedGraph {
            visited,
            total: sectors.len(),
        });
    }
    Ok(connections)
}

fn connect<R: Rng + ?Sized>(
    sectors: &SectorMap,
    first: SectorId,
    second: SectorId,
    rng: &mut R,
) -> Result<Connection, LayoutError> {
    let a = sectors.get(first).ok_or(LayoutError::UnknownSector(first))?;
    let b = sectors.get(second).ok_or(LayoutError::UnknownSector(second))?;
    let gate = place_gate((first, a), (second, b), rng)?;
    Ok(Connection {
        first,
        second,
        gate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn partitioned(seed: u64, attempts: usize) -> SectorMap {
        let mut map = SectorMap::new(Sector::new(Interval::new(1, 28), Interval::new(1, 18)));
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..attempts {
            let id = map.ids()[rng.random_range(0..map.len())];
            map.split(id, 2, 2, &mut rng).unwrap();
        }
        map
    }

    #[test]
    fn side_by_side_gate_sits_in_wall_column() {
        let left = Sector::new(Interval::new(1, 3), Interval::new(1, 6));
        let right = Sector::new(Interval::new(5, 9), Interval::new(4, 8));
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let gate = place_gate((SectorId(0), &left), (SectorId(1), &right), &mut rng).unwrap();
            assert_eq!(gate.x, 4);
            assert!((4..=6).contains(&gate.y));
        }
    }

    #[test]
    fn stacked_gate_sits_in_wall_row() {
        let top = Sector::new(Interval::new(2, 7), Interval::new(1, 3));
        let bottom = Sector::new(Interval::new(6, 12), Interval::new(5, 9));
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let gate = place_gate((SectorId(0), &bottom), (SectorId(1), &top), &mut rng).unwrap();
            assert_eq!(gate.y, 4);
            assert!((6..=7).contains(&gate.x));
        }
    }

    #[test]
    fn diagonal_sectors_are_not_adjacent() {
        let a = Sector::new(Interval::new(1, 3), Interval::new(1, 3));
        let b = Sector::new(Interval::new(5, 7), Interval::new(5, 7));
        let mut rng = StdRng::seed_from_u64(0);
        let err = place_gate((SectorId(0), &a), (SectorId(1), &b), &mut rng).unwrap_err();
        assert_eq!(
            err,
            LayoutError::NotAdjacent {
                first: SectorId(0),
                second: SectorId(1)
            }
        );
    }

    #[test]
    fn single_sector_needs_no_connections() {
        let mut map = SectorMap::new(Sector::new(Interval::new(1, 1), Interval::new(1, 1)));
        let mut rng = StdRng::seed_from_u64(0);
        let connections = build_spanning_tree(&mut map, &mut rng).unwrap();
        assert!(connections.is_empty());
        assert!(map.get(SectorId(0)).unwrap().is_visited());
    }

    #[test]
    fn unlinked_sectors_report_disconnected_graph() {
        let mut map = SectorMap::new(Sector::new(Interval::new(1, 9), Interval::new(1, 9)));
        let mut rng = StdRng::seed_from_u64(5);
        let children = map.split(SectorId(0), 2, 2, &mut rng).unwrap();
        for &child in &children {
            let sector = map.get_mut(child).unwrap();
            for side in crate::sector::Side::ALL {
                sector.clear_neighbours(side);
            }
        }

        let err = build_spanning_tree(&mut map, &mut rng).unwrap_err();
        assert_eq!(err, LayoutError::DisconnectedGraph { visited: 1, total: 2 });
    }

    #[test]
    fn tree_spans_every_sector() {
        for seed in 0..30 {
            let mut map = partitioned(seed, 60);
            let mut rng = StdRng::seed_from_u64(seed + 1000);
            let connections = build_spanning_tree(&mut map, &mut rng).unwrap();

            assert_eq!(connections.len(), map.len() - 1);
            for (_, sector) in map.iter() {
                assert!(sector.is_visited());
            }
            for c in &connections {
                assert!(map.is_neighbour(c.first, c.second));
            }
        }
    }

    #[test]
    fn every_sector_reached_through_connections() {
        let mut map = partitioned(9, 80);
        let mut rng = StdRng::seed_from_u64(9);
        let connections = build_spanning_tree(&mut map, &mut rng).unwrap();

        // Union the connections and make sure one component remains.
        let ids = map.ids().to_vec();
        let mut reached = vec![ids[0]];
        let mut frontier = vec![ids[0]];
        while let Some(id) = frontier.pop() {
            for c in &connections {
                if let Some(other) = c.other(id) {
                    if !reached.contains(&other) {
                        reached.push(other);
                        frontier.push(other);
                    }
                }
            }
        }
        assert_eq!(reached.len(), ids.len());
    }

    #[test]
    fn connections_recorded_on_both_endpoints() {
        let mut map = partitioned(4, 40);
        let mut rng = StdRng::seed_from_u64(4);
        let connections = build_spanning_tree(&mut map, &mut rng).unwrap();
        for (index, c) in connections.iter().enumerate() {
            assert!(map.get(c.first).unwrap().connections().contains(&index));
            assert!(map.get(c.second).unwrap().connections().contains(&index));
        }
        let recorded: usize = map.iter().map(|(_, s)| s.connections().len()).sum();
        assert_eq!(recorded, connections.len() * 2);
    }

    #[test]
    fn gates_lie_on_shared_border() {
        let mut map = partitioned(21, 70);
        let mut rng = StdRng::seed_from_u64(21);
        let connections = build_spanning_tree(&mut map, &mut rng).unwrap();
        for c in &connections {
            let a = map.get(c.first).unwrap();
            let b = map.get(c.second).unwrap();
            assert!(!a.contains(c.gate) && !b.contains(c.gate));
            let hull_x = a.horizontal().hull(b.horizontal());
            let hull_y = a.vertical().hull(b.vertical());
            assert!(hull_x.contains(c.gate.x) && hull_y.contains(c.gate.y));

            // Stepping across the gate leads from one sector into the other.
            let steps = [GridPos::X, GridPos::Y];
            assert!(steps.iter().any(|&d| {
                (a.contains(c.gate - d) && b.contains(c.gate + d))
                    || (b.contains(c.gate - d) && a.contains(c.gate + d))
            }));
        }
    }

    #[test]
    fn traversal_is_reproducible() {
        let run = |seed| {
            let mut map = partitioned(seed, 50);
            let mut rng = StdRng::seed_from_u64(seed);
            build_spanning_tree(&mut map, &mut rng).unwrap()
        };
        assert_eq!(run(17), run(17));
    }

    #[test]
    fn connection_other_endpoint() {
        let c = Connection {
            first: SectorId(1),
            second: SectorId(2),
            gate: GridPos::new(0, 0),
        };
        assert_eq!(c.other(SectorId(1)), Some(SectorId(2)));
        assert_eq!(c.other(SectorId(2)), Some(SectorId(1)));
        assert_eq!(c.other(SectorId(3)), None);
        assert!(c.joins(SectorId(2), SectorId(1)));
    }
}
