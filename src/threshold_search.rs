//! Cheapest path whose weight is still at least a threshold.
//!
//! Dijkstra cannot answer this: the objective is not monotonic in hop count.
//! Instead every simple path between every pair of nodes is enumerated, up
//! to `max_hops` edges. The cost is combinatorial in graph size, which is
//! fine for a single buffered survey patch (tens to low hundreds of edges)
//! and hopeless for a city network. `max_paths` and `time_limit` bound
//! runaway inputs.

use crate::error::RoutingError;
use crate::graph::{Graph, NodeId, PathResult, PathStep};
use log::{info, warn};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How many enumerated paths pass between cancellation/clock checks.
const CHECK_INTERVAL: u64 = 4096;

/// Cooperative cancellation hook, polled between node pairs.
pub trait CancelCheck {
    fn is_cancelled(&self) -> bool;
}

impl<F: Fn() -> bool> CancelCheck for F {
    fn is_cancelled(&self) -> bool {
        self()
    }
}

impl CancelCheck for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdSearch {
    pub threshold: f64,
    pub max_hops: usize,
    pub max_paths: Option<u64>,
    pub time_limit: Option<Duration>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchReport {
    pub best: Option<PathResult>,
    pub pairs_examined: u64,
    pub paths_enumerated: u64,
    /// The path or time budget ran out before every pair was examined.
    pub truncated: bool,
}

enum Stop {
    Cancelled,
    Budget,
}

impl ThresholdSearch {
    pub fn new(threshold: f64, max_hops: usize) -> Self {
        Self {
            threshold,
            max_hops,
            max_paths: None,
            time_limit: None,
        }
    }

    pub fn max_paths(mut self, max_paths: Option<u64>) -> Self {
        self.max_paths = max_paths;
        self
    }

    pub fn time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn run<C>(&self, graph: &Graph, cancel: &C) -> Result<SearchReport, RoutingError>
    where
        C: CancelCheck + ?Sized,
    {
        let n = graph.node_count();
        let mut walker = Walker {
            graph,
            search: self,
            cancel,
            deadline: self.time_limit.map(|limit| Instant::now() + limit),
            on_path: vec![false; n],
            // A simple path has fewer edges than the graph has nodes.
            steps: Vec::with_capacity(self.max_hops.min(n)),
            best: None,
            paths: 0,
        };
        let mut pairs_examined = 0u64;
        let mut truncated = false;

        for source in 0..n {
            if cancel.is_cancelled() {
                return Err(RoutingError::Cancelled);
            }

            walker.on_path[source] = true;
            let flow = walker.walk(source, source, 0.0);
            walker.on_path[source] = false;

            match flow {
                ControlFlow::Continue(()) => {}
                ControlFlow::Break(Stop::Cancelled) => return Err(RoutingError::Cancelled),
                ControlFlow::Break(Stop::Budget) => {
                    warn!(
                        "Threshold search stopped early after {} paths; result may not be optimal",
                        walker.paths
                    );
                    truncated = true;
                    break;
                }
            }
            pairs_examined += (n - source - 1) as u64;
        }

        let best = walker
            .best
            .map(|(_, steps)| PathResult::from_steps(graph, steps));

        info!(
            "Threshold search: {} pairs, {} paths, best {}",
            pairs_examined,
            walker.paths,
            best.as_ref()
                .map(|p| format!("{:.1} (length {:.1} m)", p.weight, p.length))
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(SearchReport {
            best,
            pairs_examined,
            paths_enumerated: walker.paths,
            truncated,
        })
    }
}

struct Walker<'a, C: ?Sized> {
    graph: &'a Graph,
    search: &'a ThresholdSearch,
    cancel: &'a C,
    deadline: Option<Instant>,
    on_path: Vec<bool>,
    steps: Vec<PathStep>,
    best: Option<(f64, Vec<PathStep>)>,
    paths: u64,
}

impl<C: CancelCheck + ?Sized> Walker<'_, C> {
    /// Depth-first over node-simple paths starting at `source`. A path is
    /// recorded for the pair (source, node) only when node > source, so each
    /// unordered pair is visited from its lower-numbered end.
    fn walk(&mut self, source: NodeId, node: NodeId, weight: f64) -> ControlFlow<Stop> {
        let graph = self.graph;
        for &edge_id in graph.incident(node) {
            let edge = graph.edge(edge_id);
            let next = edge.other(node);
            if self.on_path[next] {
                continue;
            }

            let total = weight + edge.weight;
            // Weights are positive, so nothing through here can beat the best.
            if matches!(self.best, Some((best, _)) if total >= best) {
                continue;
            }

            self.steps.push(PathStep {
                edge: edge_id,
                from: node,
                to: next,
            });

            if next > source {
                self.paths += 1;
                if total >= self.search.threshold {
                    self.best = Some((total, self.steps.clone()));
                }
                self.check_budget()?;
            }

            // Once past the threshold any extension is strictly heavier.
            if total < self.search.threshold && self.steps.len() < self.search.max_hops {
                self.on_path[next] = true;
                let flow = self.walk(source, next, total);
                self.on_path[next] = false;
                flow?;
            }

            self.steps.pop();
        }
        ControlFlow::Continue(())
    }

    fn check_budget(&self) -> ControlFlow<Stop> {
        if matches!(self.search.max_paths, Some(max) if self.paths >= max) {
            return ControlFlow::Break(Stop::Budget);
        }
        if self.paths % CHECK_INTERVAL == 0 {
            if self.cancel.is_cancelled() {
                return ControlFlow::Break(Stop::Cancelled);
            }
            if matches!(self.deadline, Some(deadline) if Instant::now() >= deadline) {
                return ControlFlow::Break(Stop::Budget);
            }
        }
        ControlFlow::Continue(())
    }
}

/// Minimum-weight simple path (at most `max_hops` edges) whose weight is at
/// least `threshold`, across all node pairs. Ties go to the first found.
pub fn find_min_path_at_least(graph: &Graph, threshold: f64, max_hops: usize) -> Option<PathResult> {
    let never = || false;
    ThresholdSearch::new(threshold, max_hops)
        .run(graph, &never)
        .ok()
        .and_then(|report| report.best)
}
