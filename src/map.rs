use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use crate::common::Agent;

#[derive(Debug, Clone)]
pub struct Tile {
    passable: bool,
    pub neighbors: Vec<(usize, usize)>, // Coordinates of accessible neighbors
}

impl Tile {
    pub fn is_passable(&self) -> bool {
        self.passable
    }
}

/// Grid map in the MovingAI benchmark format. Besides passability it holds
/// the precomputed adjacency lists and, per agent, an exact distance table
/// from every cell to that agent's goal (used as the A* heuristic; exact
/// distances never overestimate, so admissibility holds).
#[derive(Debug, Clone)]
pub struct Map {
    pub height: usize,
    pub width: usize,
    pub grid: Vec<Vec<Tile>>,
    pub heuristic: Vec<Vec<Vec<usize>>>,
}

impl Map {
    pub fn from_file(path: &str, agents: &[Agent]) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), agents)
    }

    pub fn from_reader<R: BufRead>(reader: R, agents: &[Agent]) -> io::Result<Self> {
        let mut lines = reader.lines();

        let _type = lines.next().unwrap()?;
        let height = lines
            .next()
            .unwrap()?
            .split_whitespace()
            .last()
            .unwrap()
            .parse::<usize>()
            .unwrap();
        let width = lines
            .next()
            .unwrap()?
            .split_whitespace()
            .last()
            .unwrap()
            .parse::<usize>()
            .unwrap();
        let _map = lines.next().unwrap()?;

        let mut grid = Vec::with_capacity(height);
        for line in lines.take(height) {
            let row: Vec<char> = line?.chars().collect();
            let tiles_row: Vec<Tile> = row
                .into_iter()
                .map(|ch| Tile {
                    passable: ch == '.',
                    neighbors: Vec::new(),
                })
                .collect();
            grid.push(tiles_row);
        }

        let mut map = Map {
            height,
            width,
            grid,
            heuristic: Vec::new(),
        };
        map.initialize_neighbors();
        for agent in agents {
            map.heuristic.push(map.heuristic_dji(agent.goal));
        }

        Ok(map)
    }

    fn initialize_neighbors(&mut self) {
        for x in 0..self.height {
            for y in 0..self.width {
                if self.grid[x][y].passable {
                    self.grid[x][y].neighbors = self.get_neighbors(x, y);
                }
            }
        }
    }

    pub fn get_neighbors(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let directions = [(-1, 0), (1, 0), (0, -1), (0, 1)]; // Up, down, left, right
        let mut neighbors = Vec::new();

        for &(dx, dy) in &directions {
            let new_x = x as i32 + dx;
            let new_y = y as i32 + dy;
            if new_x >= 0
                && new_y >= 0
                && new_x < self.height as i32
                && new_y < self.width as i32
                && self.grid[new_x as usize][new_y as usize].passable
            {
                neighbors.push((new_x as usize, new_y as usize));
            }
        }

        neighbors
    }

    pub fn in_bounds(&self, position: (usize, usize)) -> bool {
        position.0 < self.height && position.1 < self.width
    }

    pub fn is_passable(&self, x: usize, y: usize) -> bool {
        self.grid[x][y].is_passable()
    }

    /// Number of cells; the low-level search uses this as its time horizon.
    pub fn size(&self) -> usize {
        self.height * self.width
    }

    /// Exact distance from every cell to `goal`, `usize::MAX` where `goal`
    /// is unreachable.
    pub fn heuristic_dji(&self, goal: (usize, usize)) -> Vec<Vec<usize>> {
        let mut heuristic = vec![vec![usize::MAX; self.width]; self.height];
        let mut heap = BinaryHeap::new();

        heuristic[goal.0][goal.1] = 0;
        heap.push((Reverse(0), goal));

        while let Some((Reverse(cost), (x, y))) = heap.pop() {
            if cost > heuristic[x][y] {
                continue;
            }

            for &(new_x, new_y) in &self.grid[x][y].neighbors {
                let next_cost = cost + 1;
                if next_cost < heuristic[new_x][new_y] {
                    heap.push((Reverse(next_cost), (new_x, new_y)));
                    heuristic[new_x][new_y] = next_cost;
                }
            }
        }

        heuristic
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    pub(crate) fn map_from_str(text: &str, agents: &[Agent]) -> Map {
        Map::from_reader(Cursor::new(text), agents).unwrap()
    }

    pub(crate) const OPEN_3X3: &str = "type octile\n\
                                       height 3\n\
                                       width 3\n\
                                       map\n\
                                       ...\n\
                                       ...\n\
                                       ...\n";

    #[test]
    fn test_read_map() {
        let text = "type octile\n\
                    height 3\n\
                    width 3\n\
                    map\n\
                    .@.\n\
                    ...\n\
                    @..\n";
        let map = map_from_str(text, &[]);

        assert_eq!(map.height, 3);
        assert_eq!(map.width, 3);
        assert_eq!(map.size(), 9);

        assert!(map.is_passable(0, 0));
        assert!(!map.is_passable(0, 1));
        assert!(!map.is_passable(2, 0));

        let neighbors = map.get_neighbors(1, 1);
        assert_eq!(neighbors.len(), 3);
        assert!(neighbors.contains(&(1, 0)));
        assert!(neighbors.contains(&(1, 2)));
        assert!(neighbors.contains(&(2, 1)));
    }

    #[test]
    fn test_heuristic_is_exact_distance() {
        let agent = Agent {
            id: 0,
            start: (0, 0),
            goal: (2, 2),
        };
        let map = map_from_str(OPEN_3X3, &[agent]);

        assert_eq!(map.heuristic[0][2][2], 0);
        assert_eq!(map.heuristic[0][0][0], 4);
        assert_eq!(map.heuristic[0][0][2], 2);
    }

    #[test]
    fn test_heuristic_unreachable_is_max() {
        let text = "type octile\n\
                    height 1\n\
                    width 3\n\
                    map\n\
                    .@.\n";
        let agent = Agent {
            id: 0,
            start: (0, 0),
            goal: (0, 2),
        };
        let map = map_from_str(text, &[agent]);
        assert_eq!(map.heuristic[0][0][0], usize::MAX);
        assert_eq!(map.heuristic[0][0][2], 0);
    }
}
