use super::highlevel::{first_collision, HighLevelNode};
use super::Solver;
use crate::common::{Agent, Solution};
use crate::map::Map;
use crate::stat::Stats;

use std::collections::BTreeSet;
use std::time::Instant;
use tracing::debug;

/// Conflict-Based Search: best-first search over a tree of constraint sets.
/// The first node popped without a collision carries a cost-optimal
/// solution, because every child only restricts one agent's feasible paths
/// and node costs are re-derived from optimal single-agent plans.
pub struct CBS {
    agents: Vec<Agent>,
    map: Map,
    stats: Stats,
}

impl CBS {
    pub fn new(agents: Vec<Agent>, map: &Map) -> Self {
        CBS {
            agents,
            map: map.clone(),
            stats: Stats::default(),
        }
    }
}

impl Solver for CBS {
    fn solve(&mut self) -> Option<Solution> {
        let total_solve_start_time = Instant::now();
        let mut open = BTreeSet::new();

        let root = HighLevelNode::new(&self.agents, &self.map, &mut self.stats)?;
        open.insert(root);

        while let Some(current_node) = open.pop_first() {
            let collision = match first_collision(&current_node.paths) {
                Some(collision) => collision,
                None => {
                    self.stats.time_ms = total_solve_start_time.elapsed().as_micros() as usize;
                    self.stats.costs = current_node.cost;
                    self.stats.print();
                    return Some(current_node.into_solution());
                }
            };

            debug!("collision: {collision:?}");
            for constraint in collision.derived_constraints() {
                if let Some(child) = current_node.expand(constraint, &self.map, &mut self.stats) {
                    self.stats.high_level_expand_nodes += 1;
                    open.insert(child);
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::tests::{map_from_str, OPEN_3X3};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .try_init();
    }

    #[test]
    fn test_cbs_crossing_agents_one_wait() {
        init_tracing();
        let agents = vec![
            Agent {
                id: 0,
                start: (0, 1),
                goal: (2, 1),
            },
            Agent {
                id: 1,
                start: (1, 0),
                goal: (1, 2),
            },
        ];
        let map = map_from_str(OPEN_3X3, &agents);
        let solution = CBS::new(agents.clone(), &map).solve().unwrap();

        assert!(solution.verify(&map, &agents));
        // Both direct routes cross (1, 1) at t = 1; the cheapest resolution
        // is one agent losing exactly one step.
        assert_eq!(solution.cost(), 5);
    }

    #[test]
    fn test_cbs_swap_on_open_grid() {
        init_tracing();
        let two_rows = "type octile\n\
                        height 2\n\
                        width 3\n\
                        map\n\
                        ...\n\
                        ...\n";
        let agents = vec![
            Agent {
                id: 0,
                start: (0, 0),
                goal: (0, 2),
            },
            Agent {
                id: 1,
                start: (0, 2),
                goal: (0, 0),
            },
        ];
        let map = map_from_str(two_rows, &agents);
        let solution = CBS::new(agents.clone(), &map).solve().unwrap();

        assert!(solution.verify(&map, &agents));
        // Head-on swap along the top row: one agent has to take the bottom
        // row (or both sidestep), costing two extra steps in total.
        assert_eq!(solution.cost(), 6);
    }

    #[test]
    fn test_cbs_corridor_swap_has_no_solution() {
        init_tracing();
        let corridor = "type octile\n\
                        height 1\n\
                        width 3\n\
                        map\n\
                        ...\n";
        let agents = vec![
            Agent {
                id: 0,
                start: (0, 0),
                goal: (0, 2),
            },
            Agent {
                id: 1,
                start: (0, 2),
                goal: (0, 0),
            },
        ];
        let map = map_from_str(corridor, &agents);
        assert!(CBS::new(agents, &map).solve().is_none());
    }

    #[test]
    fn test_cbs_disconnected_map_fails_at_root() {
        init_tracing();
        let split = "type octile\n\
                     height 1\n\
                     width 3\n\
                     map\n\
                     .@.\n";
        let agents = vec![Agent {
            id: 0,
            start: (0, 0),
            goal: (0, 2),
        }];
        let map = map_from_str(split, &agents);
        assert!(CBS::new(agents, &map).solve().is_none());
    }
}
