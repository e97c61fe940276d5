mod astar;

pub(crate) use astar::a_star_search;

use crate::common::Path;

/// One state of the time-expanded search: a cell paired with the time step
/// it is reached at. All nodes of a single search invocation live in one
/// arena `Vec` and `parent` is an index into that arena, so back-references
/// stay valid for path reconstruction and everything is freed together when
/// the invocation returns.
#[derive(Debug, Clone)]
pub(crate) struct SearchNode {
    pub(crate) position: (usize, usize),
    pub(crate) g_cost: usize,
    pub(crate) h_cost: usize,
    pub(crate) time_step: usize,
    pub(crate) parent: Option<usize>,
}

fn construct_path(arena: &[SearchNode], goal_index: usize) -> Path {
    let mut path = Vec::new();
    let mut current = Some(goal_index);
    while let Some(index) = current {
        path.push(arena[index].position);
        current = arena[index].parent;
    }
    path.reverse();
    path
}
