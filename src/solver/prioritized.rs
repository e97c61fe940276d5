use super::Solver;
use crate::algorithm::a_star_search;
use crate::common::{Agent, Constraint, Path, Solution};
use crate::map::Map;
use crate::stat::Stats;

use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{info, warn};

/// Decoupled planner: agents are planned once, in ascending index order,
/// each treating all earlier agents' committed paths as moving obstacles.
/// No backtracking; if some agent cannot be planned, the result is the
/// prefix planned so far. Cheap and fast, but neither complete nor optimal.
pub struct PrioritizedSearch {
    agents: Vec<Agent>,
    map: Map,
    stats: Stats,
}

impl PrioritizedSearch {
    pub fn new(agents: Vec<Agent>, map: &Map) -> Self {
        PrioritizedSearch {
            agents,
            map: map.clone(),
            stats: Stats::default(),
        }
    }
}

impl Solver for PrioritizedSearch {
    fn solve(&mut self) -> Option<Solution> {
        let total_solve_start_time = Instant::now();
        let mut paths: Vec<Path> = Vec::with_capacity(self.agents.len());

        for agent in &self.agents {
            let constraints = committed_path_constraints(agent, &paths);
            match a_star_search(&self.map, agent, &constraints, &mut self.stats) {
                Some(path) => paths.push(path),
                None => {
                    // Inherent incompleteness of the strategy: report the
                    // prefix instead of replanning earlier agents.
                    warn!(
                        "no path for agent {} under committed paths, stopping",
                        agent.id
                    );
                    break;
                }
            }
        }

        self.stats.time_ms = total_solve_start_time.elapsed().as_micros() as usize;
        self.stats.costs = paths.iter().map(|path| path.len() - 1).sum();
        self.stats.print();
        info!(
            "prioritized planning finished for {}/{} agents",
            paths.len(),
            self.agents.len()
        );

        Some(Solution { paths })
    }
}

/// Constraints keeping `agent` clear of every already committed path: the
/// occupied cell and the reverse edge at each step, the agent's own goal
/// while a committed path still has to cross it, and any cell a committed
/// agent rests on once arrived.
fn committed_path_constraints(agent: &Agent, committed: &[Path]) -> BTreeSet<Constraint> {
    let mut constraints = BTreeSet::new();

    for path in committed {
        let resting = *path.last().unwrap();
        for j in 1..path.len() {
            constraints.insert(Constraint::Vertex {
                agent: agent.id,
                position: path[j],
                time_step: j,
            });
            constraints.insert(Constraint::Edge {
                agent: agent.id,
                from: path[j],
                to: path[j - 1],
                time_step: j,
            });

            if path[j] == agent.goal {
                // Arriving early would park this agent in the other one's way.
                for a in 0..=j {
                    constraints.insert(Constraint::Vertex {
                        agent: agent.id,
                        position: path[j],
                        time_step: a,
                    });
                }
            }

            if path[j] == resting {
                constraints.insert(Constraint::Goal {
                    agent: agent.id,
                    position: path[j],
                    time_step: j,
                });
            }
        }
    }

    constraints
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
    fn test_prioritized_crossing_second_agent_pays() {
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
        let solution = PrioritizedSearch::new(agents.clone(), &map)
            .solve()
            .unwrap();

        assert_eq!(solution.paths.len(), 2);
        assert!(solution.verify(&map, &agents));
        // Agent 0 keeps its direct route; agent 1 is strictly worse than
        // its unconstrained optimum of 2 moves.
        assert_eq!(solution.paths[0].len(), 3);
        assert_eq!(solution.paths[1].len(), 4);
    }

    #[test]
    fn test_prioritized_corridor_swap_is_partial() {
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
        let solution = PrioritizedSearch::new(agents, &map).solve().unwrap();

        // Agent 0 commits to the corridor; agent 1 can never cross it, so
        // only the first path is returned.
        assert_eq!(solution.paths.len(), 1);
        assert_eq!(solution.paths[0], vec![(0, 0), (0, 1), (0, 2)]);
    }

    #[test]
    fn test_committed_constraints_reserve_goal_cell() {
        let agent = Agent {
            id: 1,
            start: (1, 0),
            goal: (0, 1),
        };
        // Committed path passes through this agent's goal at t = 1.
        let committed = vec![vec![(0, 0), (0, 1), (0, 2)]];
        let constraints = committed_path_constraints(&agent, &committed);

        for time_step in 0..=1 {
            assert!(constraints.contains(&Constraint::Vertex {
                agent: 1,
                position: (0, 1),
                time_step,
            }));
        }
        // The committed agent rests at (0, 2) from t = 2 onward.
        assert!(constraints.contains(&Constraint::Goal {
            agent: 1,
            position: (0, 2),
            time_step: 2,
        }));
    }
}
