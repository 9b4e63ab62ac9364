use pixel_engine::{AutonomousMove, Direction, Position};

/// Walks a fixed route, one step every `cycles_per_step` update cycles.
#[derive(Debug, Clone)]
pub(crate) struct Patrol {
    route: Vec<Direction>,
    next_step: usize,
    cycles_per_step: u32,
    cycles_waited: u32,
}

impl Patrol {
    pub(crate) fn new(route: Vec<Direction>, cycles_per_step: u32) -> Self {
        Self {
            route,
            next_step: 0,
            cycles_per_step: cycles_per_step.max(1),
            cycles_waited: 0,
        }
    }

    /// Clockwise loop around a `size` x `size` square.
    pub(crate) fn square(size: usize, cycles_per_step: u32) -> Self {
        let route = [
            Direction::Right,
            Direction::Down,
            Direction::Left,
            Direction::Up,
        ]
        .into_iter()
        .flat_map(|direction| std::iter::repeat(direction).take(size))
        .collect();
        Self::new(route, cycles_per_step)
    }
}

impl AutonomousMove for Patrol {
    fn next_move(&mut self, _position: Position) -> Option<Direction> {
        if self.route.is_empty() {
            return None;
        }
        self.cycles_waited += 1;
        if self.cycles_waited < self.cycles_per_step {
            return None;
        }
        self.cycles_waited = 0;
        let direction = self.route[self.next_step];
        self.next_step = (self.next_step + 1) % self.route.len();
        Some(direction)
    }
}
