//! Transport graph: per-cell movement costs derived from the map, Dijkstra
//! shortest paths with ascending-cell-id tiebreaking, and a bounded path
//! cache invalidated wholesale on road-tier change.
//!
//! Pathfinding is pure over `(map, road_state)` — it never reads mutable
//! simulation state, matching the ownership split in the data model (the
//! transport component owns its cache; nothing else writes it).

use crate::map::MapData;
use crate::types::CellId;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Cost at or above which an edge is treated as impassable.
pub const IMPASSABLE_THRESHOLD: f64 = 1_000.0;
const PORT_TRANSITION_SURCHARGE: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub path: Vec<CellId>,
    pub cost: f64,
}

impl PathResult {
    pub fn not_found() -> Self {
        Self {
            path: Vec::new(),
            cost: f64::INFINITY,
        }
    }

    pub fn is_found(&self) -> bool {
        self.cost.is_finite()
    }
}

/// Installed once at bootstrap, replaced wholesale by the road-development
/// system. `multiplier(a, b)` returns a value in `(0, 1]` for a land-land
/// edge; callers combine it with the river bonus via `min(..)`, never
/// stacking multipliers.
#[derive(Debug, Clone, Default)]
pub struct RoadState {
    multipliers: HashMap<(CellId, CellId), f64>,
}

impl RoadState {
    pub fn edges(&self) -> impl Iterator<Item = ((CellId, CellId), f64)> + '_ {
        self.multipliers.iter().map(|(&k, &v)| (k, v))
    }
}

impl RoadState {
    pub fn set_edge(&mut self, a: CellId, b: CellId, multiplier: f64) {
        let key = Self::key(a, b);
        self.multipliers.insert(key, multiplier.clamp(0.01, 1.0));
    }

    pub fn multiplier(&self, a: CellId, b: CellId) -> f64 {
        self.multipliers.get(&Self::key(a, b)).copied().unwrap_or(1.0)
    }

    fn key(a: CellId, b: CellId) -> (CellId, CellId) {
        if a.0 <= b.0 { (a, b) } else { (b, a) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct OrderedCost(u64);

impl OrderedCost {
    fn from_f64(v: f64) -> Self {
        Self(v.to_bits())
    }
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    cost: f64,
    cell: CellId,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        OrderedCost::from_f64(self.cost) == OrderedCost::from_f64(other.cost) && self.cell == other.cell
    }
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap via BinaryHeap (max-heap by default), with
        // ascending cell id as the deterministic tiebreak the spec requires.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.cell.0.cmp(&self.cell.0).reverse())
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-cell movement cost, before pairwise averaging: biome cost renormalized
/// plus a steep-height penalty above the map's elevation threshold.
fn cell_movement_cost(map: &MapData, cell: CellId) -> f64 {
    let Some(c) = map.cell(cell) else {
        return f64::INFINITY;
    };
    let biome_cost = map.biome_movement_cost(c.biome);
    let mut cost = biome_cost;
    if c.height > map.steep_elevation_threshold {
        let excess = c.height - map.steep_elevation_threshold;
        cost += excess * excess;
    }
    cost
}

fn euclidean(map: &MapData, a: CellId, b: CellId) -> f64 {
    let (Some(ca), Some(cb)) = (map.cell(a), map.cell(b)) else {
        return f64::INFINITY;
    };
    let dx = ca.center.0 - cb.center.0;
    let dy = ca.center.1 - cb.center.1;
    (dx * dx + dy * dy).sqrt()
}

/// Edge cost between two adjacent cells, or `+inf` if impassable.
fn edge_cost(map: &MapData, road_state: &RoadState, a: CellId, b: CellId) -> f64 {
    let (Some(ca), Some(cb)) = (map.cell(a), map.cell(b)) else {
        return f64::INFINITY;
    };
    let mc_a = cell_movement_cost(map, a);
    let mc_b = cell_movement_cost(map, b);
    if !mc_a.is_finite() || !mc_b.is_finite() {
        return f64::INFINITY;
    }
    let spacing = map.typical_cell_spacing.max(1e-9);
    let dist_norm = euclidean(map, a, b) / spacing;
    let mut cost = 0.5 * (mc_a + mc_b) * dist_norm;

    if ca.is_land && cb.is_land {
        let river_bonus: f64 = if ca.river_id.is_some() && ca.river_id == cb.river_id {
            0.7
        } else {
            1.0
        };
        let road_mult = road_state.multiplier(a, b);
        cost *= river_bonus.min(road_mult).min(1.0);
    } else if ca.is_land != cb.is_land {
        cost += PORT_TRANSITION_SURCHARGE;
    }

    if cost >= IMPASSABLE_THRESHOLD { f64::INFINITY } else { cost }
}

struct PathCache {
    capacity: usize,
    entries: HashMap<(CellId, CellId), PathResult>,
}

impl PathCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
        }
    }

    fn get(&self, from: CellId, to: CellId) -> Option<&PathResult> {
        self.entries.get(&(from, to))
    }

    fn insert(&mut self, from: CellId, to: CellId, result: PathResult) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&(from, to)) {
            // Full discard on overflow, per the cache's stated eviction policy.
            self.entries.clear();
        }
        self.entries.insert((from, to), result);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

pub struct TransportGraph {
    road_state: RoadState,
    cache: PathCache,
}

impl TransportGraph {
    pub fn new(cache_capacity: usize, road_state: RoadState) -> Self {
        Self {
            road_state,
            cache: PathCache::new(cache_capacity.max(1)),
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn set_road_state(&mut self, road_state: RoadState) {
        self.road_state = road_state;
        self.clear_cache();
    }

    pub fn road_state(&self) -> &RoadState {
        &self.road_state
    }

    /// Dijkstra with a lazy-delete binary heap and ascending-cell-id
    /// tiebreak, so repeated runs over identical inputs are bitwise
    /// reproducible. Malformed ids return `PathResult::not_found`, never
    /// panic.
    pub fn find_path(&mut self, map: &MapData, from: CellId, to: CellId) -> PathResult {
        if let Some(cached) = self.cache.get(from, to) {
            return cached.clone();
        }
        let result = self.compute_path(map, from, to);
        self.cache.insert(from, to, result.clone());
        result
    }

    fn compute_path(&self, map: &MapData, from: CellId, to: CellId) -> PathResult {
        if map.cell(from).is_none() || map.cell(to).is_none() {
            return PathResult::not_found();
        }
        if from == to {
            return PathResult { path: vec![from], cost: 0.0 };
        }

        let n = map.cells.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<CellId>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut heap = BinaryHeap::new();

        dist[from.index()] = 0.0;
        heap.push(HeapEntry { cost: 0.0, cell: from });

        while let Some(HeapEntry { cost, cell }) = heap.pop() {
            let idx = cell.index();
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            if cell == to {
                break;
            }
            let Some(c) = map.cell(cell) else { continue };
            let mut neighbors = c.neighbors.clone();
            neighbors.sort_by_key(|n| n.0);
            for neighbor in neighbors {
                let nidx = neighbor.index();
                if nidx >= n || visited[nidx] {
                    continue;
                }
                let ec = edge_cost(map, &self.road_state, cell, neighbor);
                if !ec.is_finite() {
                    continue;
                }
                let candidate = cost + ec;
                if candidate < dist[nidx] {
                    dist[nidx] = candidate;
                    prev[nidx] = Some(cell);
                    heap.push(HeapEntry { cost: candidate, cell: neighbor });
                }
            }
        }

        let final_cost = dist[to.index()];
        if !final_cost.is_finite() {
            return PathResult::not_found();
        }

        let mut path = vec![to];
        let mut cur = to;
        while let Some(p) = prev[cur.index()] {
            path.push(p);
            cur = p;
            if cur == from {
                break;
            }
        }
        path.reverse();
        PathResult { path, cost: final_cost }
    }

    pub fn get_transport_cost(&mut self, map: &MapData, from: CellId, to: CellId) -> f64 {
        self.find_path(map, from, to).cost
    }

    /// All cells reachable from `from` with total cost at most `max_cost`,
    /// as (cell, cost) pairs. Does not use or pollute the path cache since
    /// callers rarely need the full path, only reachability.
    pub fn find_reachable(&self, map: &MapData, from: CellId, max_cost: f64) -> Vec<(CellId, f64)> {
        if map.cell(from).is_none() {
            return Vec::new();
        }
        let n = map.cells.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut visited = vec![false; n];
        let mut heap = BinaryHeap::new();
        dist[from.index()] = 0.0;
        heap.push(HeapEntry { cost: 0.0, cell: from });

        while let Some(HeapEntry { cost, cell }) = heap.pop() {
            let idx = cell.index();
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            if cost > max_cost {
                continue;
            }
            let Some(c) = map.cell(cell) else { continue };
            let mut neighbors = c.neighbors.clone();
            neighbors.sort_by_key(|n| n.0);
            for neighbor in neighbors {
                let nidx = neighbor.index();
                if nidx >= n || visited[nidx] {
                    continue;
                }
                let ec = edge_cost(map, &self.road_state, cell, neighbor);
                if !ec.is_finite() {
                    continue;
                }
                let candidate = cost + ec;
                if candidate <= max_cost && candidate < dist[nidx] {
                    dist[nidx] = candidate;
                    heap.push(HeapEntry { cost: candidate, cell: neighbor });
                }
            }
        }

        let mut out: Vec<(CellId, f64)> = dist
            .into_iter()
            .enumerate()
            .filter(|(_, d)| d.is_finite())
            .map(|(i, d)| (CellId::new(i as u32), d))
            .collect();
        out.sort_by_key(|(cell, _)| cell.0);
        out
    }
}
