use serde::{Deserialize, Serialize};

use crate::map::Map;

/// A path is indexed by time step: `path[t]` is the cell occupied at `t`.
/// `path[0]` is the agent start, the last entry is its goal, and the cost of
/// the path is `path.len() - 1` (number of moves, waits included).
pub type Path = Vec<(usize, usize)>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: usize,
    pub start: (usize, usize),
    pub goal: (usize, usize),
}

impl Agent {
    pub fn verify(&self, map: &Map) -> bool {
        map.in_bounds(self.start)
            && map.in_bounds(self.goal)
            && map.is_passable(self.start.0, self.start.1)
            && map.is_passable(self.goal.0, self.goal.1)
    }
}

/// Space-time restriction on a single agent's motion. The low-level planner
/// ignores constraints whose `agent` field does not match the planning agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constraint {
    /// Agent may not occupy `position` at exactly `time_step`.
    Vertex {
        agent: usize,
        position: (usize, usize),
        time_step: usize,
    },
    /// Agent may not move `from` -> `to`, arriving at `time_step`.
    Edge {
        agent: usize,
        from: (usize, usize),
        to: (usize, usize),
        time_step: usize,
    },
    /// Agent may not occupy `position` at `time_step` or any later time.
    Goal {
        agent: usize,
        position: (usize, usize),
        time_step: usize,
    },
}

impl Constraint {
    /// The agent this constraint is addressed to.
    pub(crate) fn agent(&self) -> usize {
        match *self {
            Constraint::Vertex { agent, .. }
            | Constraint::Edge { agent, .. }
            | Constraint::Goal { agent, .. } => agent,
        }
    }

    /// Whether the move `from_position` -> `to_position` arriving at `time`
    /// is forbidden for `agent` by this constraint.
    pub(crate) fn forbids(
        &self,
        agent: usize,
        from_position: (usize, usize),
        to_position: (usize, usize),
        time: usize,
    ) -> bool {
        match *self {
            Constraint::Vertex {
                agent: a,
                position,
                time_step,
            } => a == agent && position == to_position && time_step == time,
            Constraint::Edge {
                agent: a,
                from,
                to,
                time_step,
            } => a == agent && from == from_position && to == to_position && time_step == time,
            Constraint::Goal {
                agent: a,
                position,
                time_step,
            } => a == agent && position == to_position && time_step <= time,
        }
    }
}

/// First collision found between two paths. Converted into constraints by
/// the high-level search and then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Collision {
    Vertex {
        agent_1: usize,
        agent_2: usize,
        position: (usize, usize),
        time_step: usize,
    },
    /// The agents swap cells across one edge: agent 1 moves
    /// `position_1` -> `position_2` while agent 2 moves the reverse way,
    /// both arriving at `time_step`.
    Edge {
        agent_1: usize,
        agent_2: usize,
        position_1: (usize, usize),
        position_2: (usize, usize),
        time_step: usize,
    },
    /// `agent` crosses the cell where another agent already rests at its
    /// goal; `time_step` is that agent's arrival time.
    Goal {
        agent: usize,
        position: (usize, usize),
        time_step: usize,
    },
}

impl Collision {
    /// Constraints to branch on: one per involved agent for vertex and edge
    /// collisions, a single permanent one for goal collisions.
    pub(crate) fn derived_constraints(&self) -> Vec<Constraint> {
        match *self {
            Collision::Vertex {
                agent_1,
                agent_2,
                position,
                time_step,
            } => vec![
                Constraint::Vertex {
                    agent: agent_1,
                    position,
                    time_step,
                },
                Constraint::Vertex {
                    agent: agent_2,
                    position,
                    time_step,
                },
            ],
            Collision::Edge {
                agent_1,
                agent_2,
                position_1,
                position_2,
                time_step,
            } => vec![
                Constraint::Edge {
                    agent: agent_1,
                    from: position_1,
                    to: position_2,
                    time_step,
                },
                Constraint::Edge {
                    agent: agent_2,
                    from: position_2,
                    to: position_1,
                    time_step,
                },
            ],
            Collision::Goal {
                agent,
                position,
                time_step,
            } => vec![Constraint::Goal {
                agent,
                position,
                time_step,
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub paths: Vec<Path>,
}

impl Solution {
    /// Check every property we promise for a returned solution: paths start
    /// and end at the right cells, every move is a legal grid step, and no
    /// two paths collide on a vertex or an edge. Agents rest at their goal
    /// after their path ends.
    pub fn verify(&self, map: &Map, agents: &[Agent]) -> bool {
        for (agent, path) in agents.iter().zip(&self.paths) {
            if path.is_empty() {
                return false;
            }
            if *path.first().unwrap() != agent.start || *path.last().unwrap() != agent.goal {
                return false;
            }
            for step in 1..path.len() {
                let (prev, curr) = (path[step - 1], path[step]);
                if !map.is_passable(curr.0, curr.1) {
                    return false;
                }
                if prev != curr && !map.get_neighbors(prev.0, prev.1).contains(&curr) {
                    return false;
                }
            }
        }

        for i in 0..self.paths.len() {
            for j in (i + 1)..self.paths.len() {
                let path_i = &self.paths[i];
                let path_j = &self.paths[j];
                let horizon = path_i.len().max(path_j.len());
                for t in 1..horizon {
                    let pos_i = *path_i.get(t).unwrap_or_else(|| path_i.last().unwrap());
                    let pos_j = *path_j.get(t).unwrap_or_else(|| path_j.last().unwrap());
                    if pos_i == pos_j {
                        return false;
                    }
                    if t < path_i.len() && t < path_j.len() {
                        let swap = path_i[t] == path_j[t - 1] && path_i[t - 1] == path_j[t];
                        if swap {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    pub fn cost(&self) -> usize {
        self.paths.iter().map(|path| path.len() - 1).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_constraint_forbids_exact_time_only() {
        let constraint = Constraint::Vertex {
            agent: 0,
            position: (1, 1),
            time_step: 3,
        };
        assert!(constraint.forbids(0, (1, 0), (1, 1), 3));
        assert!(!constraint.forbids(0, (1, 0), (1, 1), 2));
        assert!(!constraint.forbids(0, (1, 0), (1, 1), 4));
        // Other agents are unaffected.
        assert!(!constraint.forbids(1, (1, 0), (1, 1), 3));
    }

    #[test]
    fn test_edge_constraint_forbids_directed_move() {
        let constraint = Constraint::Edge {
            agent: 2,
            from: (0, 0),
            to: (0, 1),
            time_step: 1,
        };
        assert!(constraint.forbids(2, (0, 0), (0, 1), 1));
        // The reverse direction stays legal.
        assert!(!constraint.forbids(2, (0, 1), (0, 0), 1));
        assert!(!constraint.forbids(2, (0, 0), (0, 1), 2));
    }

    #[test]
    fn test_goal_constraint_forbids_at_or_after() {
        let constraint = Constraint::Goal {
            agent: 1,
            position: (2, 2),
            time_step: 4,
        };
        assert!(!constraint.forbids(1, (2, 1), (2, 2), 3));
        assert!(constraint.forbids(1, (2, 1), (2, 2), 4));
        assert!(constraint.forbids(1, (2, 1), (2, 2), 9));
    }

    #[test]
    fn test_edge_collision_derives_mirrored_constraints() {
        let collision = Collision::Edge {
            agent_1: 0,
            agent_2: 1,
            position_1: (0, 0),
            position_2: (0, 1),
            time_step: 2,
        };
        let constraints = collision.derived_constraints();
        assert_eq!(
            constraints,
            vec![
                Constraint::Edge {
                    agent: 0,
                    from: (0, 0),
                    to: (0, 1),
                    time_step: 2,
                },
                Constraint::Edge {
                    agent: 1,
                    from: (0, 1),
                    to: (0, 0),
                    time_step: 2,
                },
            ]
        );
    }

    #[test]
    fn test_goal_collision_derives_single_constraint() {
        let collision = Collision::Goal {
            agent: 3,
            position: (5, 5),
            time_step: 7,
        };
        assert_eq!(
            collision.derived_constraints(),
            vec![Constraint::Goal {
                agent: 3,
                position: (5, 5),
                time_step: 7,
            }]
        );
    }
}
