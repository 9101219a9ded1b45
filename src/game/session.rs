use super::codec::encode_point;
use super::constants::{
  BOARD_HEIGHT, BOARD_WIDTH, FRAME_INTERVAL_MS, FRAME_INTERVAL_STEP_MS, GROWTH_PER_FOOD,
  MIN_FRAME_INTERVAL_MS, SPAWN_ROW_STRIDE, STARTING_LENGTH,
};
use super::food::FoodRegistry;
use super::occupancy::OccupancyModel;
use super::snake::SnakeState;
use super::types::{
  BoardSnapshot, Bounds, Coordinate, Direction, LossReason, PlayerId, PlayerSnapshot,
  SessionStatus,
};
use crate::protocol::{self, PeerMessage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;


#[derive(Debug, Clone)]
pub struct SessionConfig {
  pub bounds: Bounds,
  pub spawn_origin: Coordinate,
  pub starting_length: usize,
  pub frame_interval: Duration,
}

impl SessionConfig {
  /// Spreads players over distinct rows so simultaneous joins do not overlap.
  pub fn for_player(player_id: PlayerId, bounds: Bounds, frame_interval: Duration) -> Self {
    let rows = bounds.height.max(1) as u64;
    let row = (player_id.wrapping_mul(SPAWN_ROW_STRIDE) % rows) as i32;
    Self {
      bounds,
      spawn_origin: Coordinate::new(0, row),
      starting_length: STARTING_LENGTH,
      frame_interval,
    }
  }
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      bounds: Bounds {
        width: BOARD_WIDTH,
        height: BOARD_HEIGHT,
      },
      spawn_origin: Coordinate::new(0, 0),
      starting_length: STARTING_LENGTH,
      frame_interval: Duration::from_millis(FRAME_INTERVAL_MS),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
  Moved,
  Ate,
  Lost(LossReason),
  Halted,
}

/// One client's view of the shared board.
///
/// The local snake is advanced by `tick`; peers are merged by
/// `handle_peer_message`. Both are called from a single task, so the
/// occupancy model and registries need no locking.
#[derive(Debug)]
pub struct GameSession {
  player_id: PlayerId,
  bounds: Bounds,
  snake: SnakeState,
  peers: HashMap<PlayerId, SnakeState>,
  known_peers: HashSet<PlayerId>,
  foods: FoodRegistry,
  occupancy: OccupancyModel,
  status: SessionStatus,
  frame_interval: Duration,
  outbound: UnboundedSender<String>,
  rng: StdRng,
}

impl GameSession {
  pub fn new(player_id: PlayerId, config: SessionConfig, outbound: UnboundedSender<String>) -> Self {
    Self::with_rng(player_id, config, outbound, StdRng::from_entropy())
  }

  pub fn with_rng(
    player_id: PlayerId,
    config: SessionConfig,
    outbound: UnboundedSender<String>,
    rng: StdRng,
  ) -> Self {
    let snake = SnakeState::spawn(config.spawn_origin, config.starting_length, Direction::Right);
    let mut occupancy = OccupancyModel::new();
    for key in snake.danger_keys() {
      occupancy.mark_occupied(key);
    }

    let mut session = Self {
      player_id,
      bounds: config.bounds,
      snake,
      peers: HashMap::new(),
      known_peers: HashSet::new(),
      foods: FoodRegistry::new(),
      occupancy,
      status: SessionStatus::Playing,
      frame_interval: config.frame_interval,
      outbound,
      rng,
    };
    session.relocate_food();
    tracing::info!(
      player_id,
      head = ?session.snake.head(),
      food = ?session.foods.get(player_id),
      "session started"
    );
    session.announce();
    session
  }

  #[cfg(test)]
  pub fn status(&self) -> SessionStatus {
    self.status
  }

  pub fn frame_interval(&self) -> Duration {
    self.frame_interval
  }

  pub fn food(&self) -> Option<Coordinate> {
    self.foods.get(self.player_id)
  }

  #[cfg(test)]
  pub fn peer_snake(&self, peer_id: PlayerId) -> Option<&SnakeState> {
    self.peers.get(&peer_id)
  }

  #[cfg(test)]
  pub fn peer_food(&self, peer_id: PlayerId) -> Option<Coordinate> {
    self.foods.get(peer_id)
  }

  pub fn request_turn(&mut self, direction: Direction) {
    if self.status != SessionStatus::Playing {
      return;
    }
    self.snake.request_turn(direction);
  }

  pub fn tick(&mut self) -> TickOutcome {
    if self.status != SessionStatus::Playing {
      return TickOutcome::Halted;
    }

    let previous_head = self.snake.head();
    let vacated = self.snake.advance();
    let new_head = self.snake.head();

    if !self.bounds.contains(new_head) {
      return self.lose(LossReason::OutOfBounds);
    }

    // The vacated tail is no longer lethal, so entering it is allowed.
    if let Some(tail) = vacated {
      self.occupancy.clear_occupied(encode_point(tail));
    }
    if self.occupancy.is_occupied(encode_point(new_head)) {
      return self.lose(LossReason::Collision);
    }
    self.occupancy.mark_occupied(encode_point(previous_head));
    self.broadcast_snake();

    if self.food() != Some(new_head) {
      return TickOutcome::Moved;
    }

    self.snake.grow(GROWTH_PER_FOOD);
    self.frame_interval = self
      .frame_interval
      .saturating_sub(Duration::from_millis(FRAME_INTERVAL_STEP_MS))
      .max(Duration::from_millis(MIN_FRAME_INTERVAL_MS));
    self.relocate_food();
    self.broadcast_food();
    tracing::debug!(
      player_id = self.player_id,
      length = self.snake.len(),
      growth_pending = self.snake.growth_pending(),
      frame_ms = self.frame_interval.as_millis() as u64,
      "ate food"
    );
    TickOutcome::Ate
  }

  pub fn handle_peer_message(&mut self, message: PeerMessage) {
    let peer_id = message.player_id();
    if peer_id == self.player_id {
      tracing::warn!(peer_id, "ignoring peer message carrying our own id");
      return;
    }
    let first_contact = self.known_peers.insert(peer_id);

    match message {
      PeerMessage::Snake { body, .. } => self.merge_peer_snake(peer_id, body),
      PeerMessage::Food { food, .. } => {
        let previous = self.foods.set(peer_id, food);
        tracing::trace!(peer_id, ?previous, ?food, "peer food moved");
      }
    }

    if first_contact {
      tracing::info!(peer_id, "new peer, announcing local state");
      self.announce();
    }
  }

  pub fn snapshot(&self) -> BoardSnapshot {
    let mut players = Vec::with_capacity(self.peers.len() + 1);
    players.push(PlayerSnapshot {
      id: self.player_id,
      local: true,
      snake: self.snake.occupies_including_head().collect(),
      food: self.food(),
    });

    let mut peer_ids: Vec<PlayerId> = self.known_peers.iter().copied().collect();
    peer_ids.sort_unstable();
    for peer_id in peer_ids {
      players.push(PlayerSnapshot {
        id: peer_id,
        local: false,
        snake: self
          .peers
          .get(&peer_id)
          .map(|snake| snake.occupies_including_head().collect())
          .unwrap_or_default(),
        food: self.foods.get(peer_id),
      });
    }

    BoardSnapshot {
      local_id: self.player_id,
      bounds: self.bounds,
      status: self.status,
      players,
    }
  }

  fn merge_peer_snake(&mut self, peer_id: PlayerId, body: Vec<Coordinate>) {
    let old_keys = self
      .peers
      .get(&peer_id)
      .map(SnakeState::danger_keys)
      .unwrap_or_default();
    let new_keys = body.iter().skip(1).copied().map(encode_point);
    self.occupancy.replace_all(peer_id, old_keys, new_keys);

    match self.peers.get_mut(&peer_id) {
      Some(snake) => snake.replace_body(body),
      None => {
        if let Some(snake) = SnakeState::from_body(body) {
          self.peers.insert(peer_id, snake);
        }
      }
    }
  }

  fn lose(&mut self, reason: LossReason) -> TickOutcome {
    self.status = SessionStatus::Lost(reason);
    tracing::info!(
      player_id = self.player_id,
      ?reason,
      head = ?self.snake.head(),
      heading = ?self.snake.heading(),
      danger_cells = self.occupancy.len(),
      length = self.snake.len(),
      "local snake lost"
    );
    TickOutcome::Lost(reason)
  }

  fn relocate_food(&mut self) {
    let head = self.snake.head();
    self
      .foods
      .place_food(self.player_id, self.bounds, &self.occupancy, head, &mut self.rng);
  }

  /// Rebroadcasts the local snake and food so a newcomer converges.
  fn announce(&self) {
    if self.status != SessionStatus::Playing {
      return;
    }
    self.broadcast_snake();
    self.broadcast_food();
  }

  fn broadcast_snake(&self) {
    let payload = protocol::encode_snake(self.player_id, self.snake.occupies_including_head());
    self.send(payload);
  }

  fn broadcast_food(&self) {
    if let Some(food) = self.food() {
      self.send(protocol::encode_food(self.player_id, food));
    }
  }

  fn send(&self, payload: String) {
    if self.outbound.send(payload).is_err() {
      tracing::debug!(player_id = self.player_id, "outbound channel closed");
    }
  }
}
