use super::codec::{encode_point, Key};
use super::constants::MAX_PENDING_TURNS;
use super::types::{Coordinate, Direction};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct SnakeState {
    // Head-first, never empty.
    body: VecDeque<Coordinate>,
    heading: Direction,
    pending_turns: VecDeque<Direction>,
    growth_pending: u32,
}

impl SnakeState {
    /// Lays out `length` cells in a straight line leading away from `origin`.
    ///
    /// The cell next to `origin` is the tail and the head sits `length` cells
    /// out along `heading`, so the snake starts moving into open space.
    pub fn spawn(origin: Coordinate, length: usize, heading: Direction) -> Self {
        let (dx, dy) = heading.delta();
        let length = length.max(1) as i32;
        let body = (1..=length)
            .rev()
            .map(|i| Coordinate::new(origin.x + dx * i, origin.y + dy * i))
            .collect();
        Self {
            body,
            heading,
            pending_turns: VecDeque::new(),
            growth_pending: 0,
        }
    }

    /// Rebuilds a snake from a head-first body received over the wire.
    pub fn from_body(body: Vec<Coordinate>) -> Option<Self> {
        if body.is_empty() {
            return None;
        }
        let heading = infer_heading(&body).unwrap_or(Direction::Right);
        Some(Self {
            body: body.into(),
            heading,
            pending_turns: VecDeque::new(),
            growth_pending: 0,
        })
    }

    /// Swaps in a freshly received body. Empty bodies are ignored.
    pub fn replace_body(&mut self, body: Vec<Coordinate>) {
        if body.is_empty() {
            return;
        }
        if let Some(heading) = infer_heading(&body) {
            self.heading = heading;
        }
        self.body = body.into();
    }

    pub fn request_turn(&mut self, direction: Direction) {
        if self.pending_turns.len() >= MAX_PENDING_TURNS {
            tracing::debug!(?direction, "turn queue full, dropping turn");
            return;
        }
        self.pending_turns.push_back(direction);
    }

    /// Moves one cell and returns the vacated tail cell, or `None` while growing.
    pub fn advance(&mut self) -> Option<Coordinate> {
        if let Some(turn) = self.pending_turns.pop_front() {
            self.apply_turn(turn);
        }

        let new_head = self.head().step(self.heading);
        self.body.push_front(new_head);

        if self.growth_pending > 0 {
            self.growth_pending -= 1;
            return None;
        }
        self.body.pop_back()
    }

    pub fn grow(&mut self, cells: u32) {
        self.growth_pending = self.growth_pending.saturating_add(cells);
    }

    pub fn head(&self) -> Coordinate {
        self.body[0]
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn growth_pending(&self) -> u32 {
        self.growth_pending
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn occupies_including_head(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.body.iter().copied()
    }

    /// Keys this snake contributes to the danger set: every segment but the head.
    pub fn danger_keys(&self) -> Vec<Key> {
        self.body.iter().skip(1).copied().map(encode_point).collect()
    }

    fn apply_turn(&mut self, turn: Direction) {
        if turn == self.heading.opposite() {
            return;
        }
        self.heading = turn;
    }
}

fn infer_heading(body: &[Coordinate]) -> Option<Direction> {
    match body {
        [head, neck, ..] => Direction::between(*neck, *head),
        _ => None,
    }
}
