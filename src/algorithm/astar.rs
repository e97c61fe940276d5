use super::{construct_path, SearchNode};
use crate::common::{Agent, Constraint, Path};
use crate::map::Map;
use crate::stat::Stats;

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashSet};
use tracing::{debug, instrument, trace};

/// Open-list key. Wrapped in `Reverse` inside the heap, expansion order is
/// ascending f cost, then ascending h cost (deeper nodes first), then
/// arena index, i.e. generation order. This makes the search fully
/// deterministic for a given map and constraint set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    f_cost: usize,
    h_cost: usize,
    index: usize,
}

/// Minimum-cost path for one agent from its start to its goal that violates
/// none of the constraints addressed to it, or `None` if no such path
/// exists within the search horizon.
#[instrument(skip_all, name = "a_star", fields(agent = agent.id, start = format!("{:?}", agent.start), goal = format!("{:?}", agent.goal)), level = "debug")]
pub(crate) fn a_star_search(
    map: &Map,
    agent: &Agent,
    constraints: &BTreeSet<Constraint>,
    stats: &mut Stats,
) -> Option<Path> {
    debug!("constraints: {constraints:?}");

    let horizon = map.size();
    let start_h_cost = map.heuristic[agent.id][agent.start.0][agent.start.1];
    if start_h_cost == usize::MAX {
        // Goal not reachable from the start at all.
        return None;
    }

    let mut arena: Vec<SearchNode> = Vec::new();
    let mut open = BinaryHeap::new();
    // First generated node per (position, time step) wins: with unit edge
    // costs and an admissible heuristic a later arrival can never be
    // cheaper, so states are never reopened or updated.
    let mut visited: HashSet<((usize, usize), usize)> = HashSet::new();

    let start_node = SearchNode {
        position: agent.start,
        g_cost: 0,
        h_cost: start_h_cost,
        time_step: 0,
        parent: None,
    };
    open.push(Reverse(OpenEntry {
        f_cost: start_node.g_cost + start_node.h_cost,
        h_cost: start_node.h_cost,
        index: 0,
    }));
    visited.insert((agent.start, 0));
    arena.push(start_node);

    while let Some(Reverse(entry)) = open.pop() {
        let current = arena[entry.index].clone();
        trace!("expand node: {current:?}");
        stats.low_level_expand_nodes += 1;

        // A constraint set can wall the goal off forever. Once the search
        // runs one full map sweep past t = 0, give up.
        if current.time_step > horizon {
            break;
        }

        if current.position == agent.goal {
            return Some(construct_path(&arena, entry.index));
        }

        let next_g_cost = current.g_cost + 1;
        let next_time_step = current.time_step + 1;

        let mut candidates = map.get_neighbors(current.position.0, current.position.1);
        candidates.push(current.position); // waiting in place costs one step too

        for next_position in candidates {
            if visited.contains(&(next_position, next_time_step)) {
                continue;
            }

            // Check for constraints before recording the candidate, so a
            // forbidden move does not shadow a legal one into the same state.
            if constraints.iter().any(|constraint| {
                constraint.forbids(agent.id, current.position, next_position, next_time_step)
            }) {
                continue;
            }

            let next_h_cost = map.heuristic[agent.id][next_position.0][next_position.1];
            if next_h_cost == usize::MAX {
                continue;
            }

            visited.insert((next_position, next_time_step));
            let index = arena.len();
            let node = SearchNode {
                position: next_position,
                g_cost: next_g_cost,
                h_cost: next_h_cost,
                time_step: next_time_step,
                parent: Some(entry.index),
            };
            open.push(Reverse(OpenEntry {
                f_cost: node.g_cost + node.h_cost,
                h_cost: node.h_cost,
                index,
            }));
            arena.push(node);
        }
    }

    debug!("no path for agent {} within horizon {horizon}", agent.id);
    None
}
