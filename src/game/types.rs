use serde::Serialize;

pub type PlayerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
  pub x: i32,
  pub y: i32,
}

impl Coordinate {
  pub const fn new(x: i32, y: i32) -> Self {
    Self { x, y }
  }

  pub fn step(self, direction: Direction) -> Self {
    let (dx, dy) = direction.delta();
    Self {
      x: self.x + dx,
      y: self.y + dy,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
  Up,
  Down,
  Left,
  Right,
}

impl Direction {
  pub fn delta(self) -> (i32, i32) {
    match self {
      Direction::Up => (0, -1),
      Direction::Down => (0, 1),
      Direction::Left => (-1, 0),
      Direction::Right => (1, 0),
    }
  }

  pub fn opposite(self) -> Self {
    match self {
      Direction::Up => Direction::Down,
      Direction::Down => Direction::Up,
      Direction::Left => Direction::Right,
      Direction::Right => Direction::Left,
    }
  }

  /// Heading that moves `from` onto `to` in one step, if they are adjacent.
  pub fn between(from: Coordinate, to: Coordinate) -> Option<Self> {
    match (to.x - from.x, to.y - from.y) {
      (0, -1) => Some(Direction::Up),
      (0, 1) => Some(Direction::Down),
      (-1, 0) => Some(Direction::Left),
      (1, 0) => Some(Direction::Right),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
  pub width: i32,
  pub height: i32,
}

impl Bounds {
  pub fn contains(&self, point: Coordinate) -> bool {
    point.x >= 0 && point.y >= 0 && point.x < self.width && point.y < self.height
  }

  pub fn cells(&self) -> impl Iterator<Item = Coordinate> + '_ {
    (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Coordinate::new(x, y)))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LossReason {
  OutOfBounds,
  Collision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
  Playing,
  Lost(LossReason),
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
  pub id: PlayerId,
  pub local: bool,
  pub snake: Vec<Coordinate>,
  pub food: Option<Coordinate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
  pub local_id: PlayerId,
  pub bounds: Bounds,
  pub status: SessionStatus,
  pub players: Vec<PlayerSnapshot>,
}
