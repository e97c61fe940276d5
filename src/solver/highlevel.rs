use crate::algorithm::a_star_search;
use crate::common::{Agent, Collision, Constraint, Path, Solution};
use crate::map::Map;
use crate::stat::Stats;

use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

/// One node of the conflict tree: a full path assignment together with the
/// constraint set it was planned under. Children share nothing with their
/// parent except by value copy.
#[derive(Clone, Eq, PartialEq, Debug)]
pub(super) struct HighLevelNode {
    pub(super) agents: Vec<Agent>,
    pub(super) constraints: BTreeSet<Constraint>,
    pub(super) paths: Vec<Path>,
    pub(super) cost: usize, // Sum over agents of path length - 1
}

impl Ord for HighLevelNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Cost first; ties broken by fewer constraints, then by the paths
        // and constraint sets themselves so the open list stays
        // deterministic and collapses genuinely identical nodes.
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.constraints.len().cmp(&other.constraints.len()))
            .then_with(|| self.paths.cmp(&other.paths))
            .then_with(|| self.constraints.cmp(&other.constraints))
    }
}

impl PartialOrd for HighLevelNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl HighLevelNode {
    /// Root node: every agent planned independently with no constraints.
    /// A failure here means the instance itself is unsolvable.
    pub(super) fn new(agents: &[Agent], map: &Map, stats: &mut Stats) -> Option<Self> {
        let mut paths = Vec::with_capacity(agents.len());
        let mut total_cost = 0;

        for agent in agents {
            let path = a_star_search(map, agent, &BTreeSet::new(), stats)?;
            total_cost += path.len() - 1;
            paths.push(path);
        }

        Some(HighLevelNode {
            agents: agents.to_vec(),
            constraints: BTreeSet::new(),
            paths,
            cost: total_cost,
        })
    }

    /// Child node for one branch of a collision: the parent's constraint
    /// set plus `constraint`, with only the constrained agent replanned.
    /// `None` if that agent has no path left under the grown set.
    pub(super) fn expand(
        &self,
        constraint: Constraint,
        map: &Map,
        stats: &mut Stats,
    ) -> Option<HighLevelNode> {
        let agent_to_update = constraint.agent();
        let mut new_constraints = self.constraints.clone();
        new_constraints.insert(constraint);

        let new_path = a_star_search(map, &self.agents[agent_to_update], &new_constraints, stats)?;
        debug!("replanned agent {agent_to_update} with path {new_path:?}");

        // Paths include the start cell, so the two corrections cancel out.
        let new_cost = self.cost + new_path.len() - self.paths[agent_to_update].len();
        let mut new_paths = self.paths.clone();
        new_paths[agent_to_update] = new_path;

        Some(HighLevelNode {
            agents: self.agents.clone(),
            constraints: new_constraints,
            paths: new_paths,
            cost: new_cost,
        })
    }

    pub(super) fn into_solution(self) -> Solution {
        Solution { paths: self.paths }
    }
}

/// First collision between any two paths, scanning agent pairs in ascending
/// index order and time steps in ascending order. Within one shared time
/// step an edge swap is checked before vertex overlap. After the shorter
/// path ends its agent rests at its goal, so the longer path crossing that
/// cell is a goal collision anchored at the arrival time.
pub(super) fn first_collision(paths: &[Path]) -> Option<Collision> {
    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            let path_i = &paths[i];
            let path_j = &paths[j];

            let (short, long) = if path_i.len() < path_j.len() {
                (i, j)
            } else {
                (j, i)
            };
            let short_len = paths[short].len();
            let long_len = paths[long].len();

            for t in 1..short_len {
                if path_i[t] == path_j[t - 1] && path_i[t - 1] == path_j[t] {
                    return Some(Collision::Edge {
                        agent_1: i,
                        agent_2: j,
                        position_1: path_i[t - 1],
                        position_2: path_i[t],
                        time_step: t,
                    });
                }

                if path_i[t] == path_j[t] {
                    return Some(Collision::Vertex {
                        agent_1: i,
                        agent_2: j,
                        position: path_i[t],
                        time_step: t,
                    });
                }
            }

            let resting = *paths[short].last().unwrap();
            for t in short_len..long_len {
                if paths[long][t] == resting {
                    return Some(Collision::Goal {
                        agent: long,
                        position: resting,
                        time_step: short_len - 1,
                    });
                }
            }
        }
    }

    None
}
