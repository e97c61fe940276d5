mod cbs;
mod highlevel;
mod prioritized;

pub use cbs::CBS;
pub use prioritized::PrioritizedSearch;

use crate::common::Solution;

pub trait Solver {
    /// `None` means no solution exists for the given agents. A returned
    /// solution may hold fewer paths than agents for strategies that can
    /// fail partway (see `PrioritizedSearch`).
    fn solve(&mut self) -> Option<Solution>;
}
