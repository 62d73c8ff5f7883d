//! Route optimization: shortest path through a set of waypoints.
//!
//! The waypoints form an implicit complete graph. Every pair of distinct
//! nodes is joined by an edge weighted by Euclidean distance, computed on
//! demand from the coordinates and never stored.
//!
//! The search is Dijkstra's algorithm over a binary min-heap of
//! `(distance, node)` entries. A shorter distance for a queued node is
//! recorded by pushing a fresh entry rather than updating the old one in
//! place; entries whose distance exceeds the node's best known distance
//! are discarded when popped. Equal distances pop in push order, and a
//! candidate only replaces a known distance when it is shorter by more
//! than floating-point rounding, so ties keep the earlier route.
//!
//! This is stage 2 of the pipeline, after path reconstruction.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, trace};

use crate::diagnostics::SearchMetrics;
use crate::types::{PipelineError, Route, Waypoint};

/// Find the shortest route from `start` to `end`.
///
/// Returns the node indices from `start` to `end` inclusive together
/// with the total Euclidean distance. When `start == end` the route is
/// `[start]` with distance `0.0`.
///
/// # Errors
///
/// Returns [`PipelineError::NoPathFound`] if `nodes` is empty or `end`
/// cannot be reached. Returns [`PipelineError::IndexOutOfRange`] if
/// `start` or `end` is not a valid index into `nodes`.
pub fn shortest_path(nodes: &[Waypoint], start: usize, end: usize) -> Result<Route, PipelineError> {
    shortest_path_with_metrics(nodes, start, end).map(|(route, _)| route)
}

/// Find the shortest route and report search counters.
///
/// # Errors
///
/// Same as [`shortest_path`].
pub fn shortest_path_with_metrics(
    nodes: &[Waypoint],
    start: usize,
    end: usize,
) -> Result<(Route, SearchMetrics), PipelineError> {
    let n = nodes.len();
    if n == 0 {
        return Err(PipelineError::NoPathFound { start, end });
    }
    for index in [start, end] {
        if index >= n {
            return Err(PipelineError::IndexOutOfRange { index, len: n });
        }
    }

    let mut metrics = SearchMetrics {
        node_count: n,
        ..SearchMetrics::default()
    };

    if start == end {
        return Ok((Route::new(vec![start], 0.0), metrics));
    }

    let mut best = vec![f64::INFINITY; n];
    let mut previous: Vec<Option<usize>> = vec![None; n];
    let mut queue = Queue::default();

    best[start] = 0.0;
    queue.push(0.0, start);

    while let Some(entry) = queue.pop() {
        let current = entry.node;
        if entry.distance > best[current] {
            metrics.stale_count += 1;
            trace!("skip stale entry for node {current} at {}", entry.distance);
            continue;
        }
        metrics.settled_count += 1;

        if current == end {
            metrics.early_exit = true;
            break;
        }

        let here = nodes[current];
        for (neighbor, &there) in nodes.iter().enumerate() {
            if neighbor == current {
                continue;
            }
            metrics.relaxation_count += 1;
            let candidate = best[current] + here.distance(there);
            if improves(candidate, best[neighbor]) {
                trace!("relax {neighbor} via {current}: {} -> {candidate}", best[neighbor]);
                best[neighbor] = candidate;
                previous[neighbor] = Some(current);
                queue.push(candidate, neighbor);
            }
        }
    }
    metrics.pushed_count = queue.pushed();

    if !best[end].is_finite() {
        return Err(PipelineError::NoPathFound { start, end });
    }

    let path =
        trace_path(&previous, start, end).ok_or(PipelineError::NoPathFound { start, end })?;
    let route = Route::new(path, best[end]);
    metrics.hops = route.hops();
    metrics.distance = route.distance();

    debug!(
        "route {start} -> {end}: {} hops, distance {:.6}, settled {}/{} nodes, {} stale entries",
        metrics.hops, metrics.distance, metrics.settled_count, n, metrics.stale_count,
    );

    Ok((route, metrics))
}

/// Total Euclidean length of an index path over `nodes`.
///
/// Returns `None` if any index is out of range. An empty or
/// single-index path has length `0.0`.
#[must_use]
pub fn path_length(nodes: &[Waypoint], path: &[usize]) -> Option<f64> {
    path.windows(2).try_fold(0.0, |total, pair| {
        let a = nodes.get(pair[0])?;
        let b = nodes.get(pair[1])?;
        Some(total + a.distance(*b))
    })
}

/// Relative slack below which a shorter candidate counts as a tie.
///
/// A detour through a waypoint lying on the straight segment ties the
/// direct edge exactly, but the two sums round independently and the
/// detour can come out an ulp or two shorter.
const TIE_TOLERANCE: f64 = 4.0 * f64::EPSILON;

/// Whether `candidate` beats the best known distance `best` by more than
/// rounding noise.
fn improves(candidate: f64, best: f64) -> bool {
    if best.is_infinite() {
        return candidate < best;
    }
    candidate < best.abs().mul_add(-TIE_TOLERANCE, best)
}

/// Follow predecessor links from `end` back to `start`.
///
/// Returns `None` if the chain breaks or runs longer than the node
/// count, either of which means `end` was not reached from `start`.
fn trace_path(previous: &[Option<usize>], start: usize, end: usize) -> Option<Vec<usize>> {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        current = previous[current]?;
        path.push(current);
        if path.len() > previous.len() {
            return None;
        }
    }
    path.reverse();
    Some(path)
}

/// A priority-queue entry.
///
/// `seq` records push order so that equal distances pop first-in,
/// first-out.
#[derive(Debug, Clone, Copy)]
struct Entry {
    distance: f64,
    seq: u64,
    node: usize,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so `BinaryHeap` (a max-heap) pops the smallest distance,
    // then the smallest sequence number.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-priority queue of `(distance, node)` entries with FIFO tie-break.
#[derive(Debug, Default)]
struct Queue {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl Queue {
    fn push(&mut self, distance: f64, node: usize) {
        self.heap.push(Entry {
            distance,
            seq: self.next_seq,
            node,
        });
        self.next_seq += 1;
    }

    fn pop(&mut self) -> Option<Entry> {
        self.heap.pop()
    }

    /// Total entries ever pushed.
    #[allow(clippy::cast_possible_truncation)]
    const fn pushed(&self) -> usize {
        self.next_seq as usize
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Waypoint> {
        vec![
            Waypoint::new(0.0, 0.0),
            Waypoint::new(1.0, 0.0),
            Waypoint::new(1.0, 1.0),
            Waypoint::new(0.0, 1.0),
        ]
    }

    /// Shortest distance over every simple path from `start` to `end`.
    fn brute_force(nodes: &[Waypoint], start: usize, end: usize) -> f64 {
        fn visit(
            nodes: &[Waypoint],
            current: usize,
            end: usize,
            used: &mut [bool],
            so_far: f64,
            best: &mut f64,
        ) {
            if current == end {
                *best = best.min(so_far);
                return;
            }
            for next in 0..nodes.len() {
                if used[next] {
                    continue;
                }
                used[next] = true;
                let step = nodes[current].distance(nodes[next]);
                visit(nodes, next, end, used, so_far + step, best);
                used[next] = false;
            }
        }

        let mut used = vec![false; nodes.len()];
        used[start] = true;
        let mut best = f64::INFINITY;
        visit(nodes, start, end, &mut used, 0.0, &mut best);
        best
    }

    /// Deterministic pseudo-random coordinates for property-style tests.
    fn scattered(count: usize, seed: u64) -> Vec<Waypoint> {
        let mut state = seed;
        let mut next = || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            #[allow(clippy::cast_precision_loss)]
            let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
            unit.mul_add(20.0, -10.0)
        };
        (0..count).map(|_| Waypoint::new(next(), next())).collect()
    }

    #[test]
    fn unit_square_diagonal_is_direct() {
        let nodes = unit_square();
        let route = shortest_path(&nodes, 0, 2).unwrap();
        assert_eq!(route.path(), &[0, 2]);
        assert!((route.distance() - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn unit_square_side_is_direct() {
        let nodes = unit_square();
        let route = shortest_path(&nodes, 3, 2).unwrap();
        assert_eq!(route.path(), &[3, 2]);
        assert!((route.distance() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn matches_brute_force_for_small_graphs() {
        for count in 2..=6 {
            for seed in 0..5 {
                let nodes = scattered(count, seed * 31 + count as u64);
                for start in 0..count {
                    for end in 0..count {
                        let route = shortest_path(&nodes, start, end).unwrap();
                        let expected = brute_force(&nodes, start, end);
                        assert!(
                            (route.distance() - expected).abs() < 1e-9,
                            "n={count} seed={seed} {start}->{end}: got {}, brute force {expected}",
                            route.distance(),
                        );
                        assert_eq!(route.path().first(), Some(&start));
                        assert_eq!(route.path().last(), Some(&end));
                    }
                }
            }
        }
    }

    #[test]
    fn route_distance_matches_path_length() {
        let nodes = scattered(12, 7);
        let route = shortest_path(&nodes, 1, 9).unwrap();
        let length = path_length(&nodes, route.path()).unwrap();
        assert!((route.distance() - length).abs() < 1e-12);
    }

    #[test]
    fn path_has_no_repeated_nodes() {
        let nodes = scattered(15, 3);
        let route = shortest_path(&nodes, 0, 14).unwrap();
        let mut seen = route.path().to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), route.path().len());
    }

    #[test]
    fn degenerate_route_is_single_node() {
        let nodes = unit_square();
        for k in 0..nodes.len() {
            let (route, metrics) = shortest_path_with_metrics(&nodes, k, k).unwrap();
            assert_eq!(route.path(), &[k]);
            assert!(route.distance().abs() < f64::EPSILON);
            assert_eq!(route.hops(), 0);
            assert_eq!(metrics.settled_count, 0);
        }
    }

    #[test]
    fn single_node_graph() {
        let nodes = [Waypoint::new(4.0, 2.0)];
        let route = shortest_path(&nodes, 0, 0).unwrap();
        assert_eq!(route.path(), &[0]);
    }

    #[test]
    fn out_of_range_indices_fail() {
        let nodes = unit_square();
        assert_eq!(
            shortest_path(&nodes, 4, 0),
            Err(PipelineError::IndexOutOfRange { index: 4, len: 4 }),
        );
        assert_eq!(
            shortest_path(&nodes, 0, 10),
            Err(PipelineError::IndexOutOfRange { index: 10, len: 4 }),
        );
        assert!(matches!(
            shortest_path(&[Waypoint::new(0.0, 0.0)], 0, 1),
            Err(PipelineError::IndexOutOfRange { index: 1, len: 1 }),
        ));
    }

    #[test]
    fn empty_graph_has_no_path() {
        assert_eq!(
            shortest_path(&[], 0, 0),
            Err(PipelineError::NoPathFound { start: 0, end: 0 }),
        );
    }

    #[test]
    fn unreachable_end_has_no_path() {
        // A NaN coordinate makes every edge to it incomparable.
        let nodes = [Waypoint::new(0.0, 0.0), Waypoint::new(f64::NAN, 0.0)];
        assert_eq!(
            shortest_path(&nodes, 0, 1),
            Err(PipelineError::NoPathFound { start: 0, end: 1 }),
        );
    }

    #[test]
    fn collinear_detour_is_not_taken() {
        // Routing through the midpoint ties with the direct edge; only a
        // shorter candidate replaces a predecessor.
        let nodes = [
            Waypoint::new(0.0, 1.0),
            Waypoint::new(1.0, 3.0),
            Waypoint::new(2.0, 5.0),
        ];
        let route = shortest_path(&nodes, 0, 2).unwrap();
        assert_eq!(route.path(), &[0, 2]);
        assert!((route.distance() - 20.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn rounded_collinear_detour_is_not_taken() {
        // sqrt(2) + sqrt(18) rounds below sqrt(32) even though the
        // lengths are equal.
        let nodes = [
            Waypoint::new(0.0, 0.0),
            Waypoint::new(1.0, 1.0),
            Waypoint::new(4.0, 4.0),
        ];
        let route = shortest_path(&nodes, 0, 2).unwrap();
        assert_eq!(route.path(), &[0, 2]);
        assert!((route.distance() - 32.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn evenly_spaced_line_routes_directly() {
        let nodes: Vec<Waypoint> = (0..8_i32)
            .map(|i| Waypoint::new(f64::from(i), f64::from(i)))
            .collect();
        for end in 1..nodes.len() {
            let route = shortest_path(&nodes, 0, end).unwrap();
            assert_eq!(route.path(), &[0, end]);
        }
    }

    #[test]
    fn improves_ignores_rounding_noise() {
        let direct = 32.0_f64.sqrt();
        let detour = 2.0_f64.sqrt() + 18.0_f64.sqrt();
        assert!(!improves(detour, direct));
        assert!(!improves(direct, direct));
        assert!(improves(direct * 0.999, direct));
        assert!(improves(1.0, f64::INFINITY));
        assert!(!improves(f64::NAN, f64::INFINITY));
        assert!(!improves(0.0, 0.0));
    }

    #[test]
    fn search_stops_at_end() {
        // The end is the nearest node to the start, so it settles second.
        let nodes = [
            Waypoint::new(0.0, 0.0),
            Waypoint::new(50.0, 0.0),
            Waypoint::new(1.0, 0.0),
            Waypoint::new(60.0, 0.0),
        ];
        let (route, metrics) = shortest_path_with_metrics(&nodes, 0, 2).unwrap();
        assert_eq!(route.path(), &[0, 2]);
        assert!(metrics.early_exit);
        assert_eq!(metrics.settled_count, 2);
        assert_eq!(metrics.relaxation_count, 3);
        assert_eq!(metrics.pushed_count, 4);
    }

    #[test]
    fn repeated_searches_are_deterministic() {
        let nodes = scattered(20, 11);
        let first = shortest_path(&nodes, 3, 17).unwrap();
        for _ in 0..5 {
            assert_eq!(shortest_path(&nodes, 3, 17).unwrap(), first);
        }
    }

    #[test]
    fn queue_pops_smallest_then_oldest() {
        let mut queue = Queue::default();
        queue.push(2.0, 0);
        queue.push(1.0, 1);
        queue.push(1.0, 2);
        queue.push(0.5, 3);
        let order: Vec<usize> = std::iter::from_fn(|| queue.pop().map(|e| e.node)).collect();
        assert_eq!(order, vec![3, 1, 2, 0]);
        assert_eq!(queue.pushed(), 4);
    }

    #[test]
    fn path_length_checks_indices() {
        let nodes = unit_square();
        assert_eq!(path_length(&nodes, &[]), Some(0.0));
        assert_eq!(path_length(&nodes, &[2]), Some(0.0));
        assert!((path_length(&nodes, &[0, 1, 2]).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(path_length(&nodes, &[0, 7]), None);
    }

    #[test]
    fn agrees_with_materialized_graph_search() {
        use petgraph::algo::dijkstra;
        use petgraph::graph::{NodeIndex, UnGraph};
        use petgraph::visit::EdgeRef;

        let nodes = scattered(10, 42);
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let ids: Vec<NodeIndex> = nodes.iter().map(|_| graph.add_node(())).collect();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                graph.add_edge(ids[i], ids[j], nodes[i].distance(nodes[j]));
            }
        }

        let costs = dijkstra(&graph, ids[0], None, |e| *e.weight());
        for end in 0..nodes.len() {
            let route = shortest_path(&nodes, 0, end).unwrap();
            let expected = costs[&ids[end]];
            assert!(
                (route.distance() - expected).abs() < 1e-9,
                "0->{end}: got {}, petgraph {expected}",
                route.distance(),
            );
        }
    }
}
