use crate::game::codec::{decode_point, encode_point, Key};
use crate::game::types::{Coordinate, PlayerId};

pub const KIND_SNAKE: &str = "snake";
pub const KIND_FOOD: &str = "food";
pub const IDENTITY_PREFIX: &str = "id:";

const SEPARATOR: char = ',';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerMessage {
  Snake {
    player_id: PlayerId,
    body: Vec<Coordinate>,
  },
  Food {
    player_id: PlayerId,
    food: Coordinate,
  },
}

impl PeerMessage {
  pub fn player_id(&self) -> PlayerId {
    match self {
      PeerMessage::Snake { player_id, .. } | PeerMessage::Food { player_id, .. } => *player_id,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
  Identity(PlayerId),
  Peer(PeerMessage),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
  #[error("empty message")]
  Empty,
  #[error("unknown message kind {0:?}")]
  UnknownKind(String),
  #[error("invalid player id {0:?}")]
  InvalidPlayerId(String),
  #[error("invalid coordinate key {0:?}")]
  InvalidKey(String),
  #[error("snake message for player {0} carries no body")]
  EmptyBody(PlayerId),
  #[error("food message for player {player_id} carries {count} keys, expected 1")]
  FoodArity { player_id: PlayerId, count: usize },
}

/// Builds one comma-delimited wire message.
pub struct Encoder {
  buffer: String,
}

impl Encoder {
  pub fn new(kind: &str, player_id: PlayerId) -> Self {
    let mut buffer = String::with_capacity(64);
    buffer.push_str(kind);
    buffer.push(SEPARATOR);
    buffer.push_str(&player_id.to_string());
    Self { buffer }
  }

  pub fn write_key(&mut self, key: Key) {
    self.buffer.push(SEPARATOR);
    self.buffer.push_str(&key.to_string());
  }

  pub fn into_string(self) -> String {
    self.buffer
  }
}

pub fn encode_snake(player_id: PlayerId, body: impl IntoIterator<Item = Coordinate>) -> String {
  let mut encoder = Encoder::new(KIND_SNAKE, player_id);
  for point in body {
    encoder.write_key(encode_point(point));
  }
  encoder.into_string()
}

pub fn encode_food(player_id: PlayerId, food: Coordinate) -> String {
  let mut encoder = Encoder::new(KIND_FOOD, player_id);
  encoder.write_key(encode_point(food));
  encoder.into_string()
}

pub fn encode_identity(player_id: PlayerId) -> String {
  format!("{IDENTITY_PREFIX}{player_id}")
}

pub fn decode_message(text: &str) -> Result<InboundMessage, ProtocolError> {
  let text = text.trim();
  if text.is_empty() {
    return Err(ProtocolError::Empty);
  }
  if let Some(id) = text.strip_prefix(IDENTITY_PREFIX) {
    return parse_player_id(id).map(InboundMessage::Identity);
  }

  let mut fields = text.split(SEPARATOR);
  let kind = fields.next().unwrap_or_default();
  if kind != KIND_SNAKE && kind != KIND_FOOD {
    return Err(ProtocolError::UnknownKind(kind.to_string()));
  }
  let player_id = parse_player_id(fields.next().unwrap_or_default())?;
  let points = fields
    .map(|field| parse_key(field).map(decode_point))
    .collect::<Result<Vec<_>, _>>()?;

  let message = if kind == KIND_SNAKE {
    if points.is_empty() {
      return Err(ProtocolError::EmptyBody(player_id));
    }
    PeerMessage::Snake {
      player_id,
      body: points,
    }
  } else {
    match points.as_slice() {
      [food] => PeerMessage::Food {
        player_id,
        food: *food,
      },
      _ => {
        return Err(ProtocolError::FoodArity {
          player_id,
          count: points.len(),
        })
      }
    }
  };
  Ok(InboundMessage::Peer(message))
}

fn parse_player_id(field: &str) -> Result<PlayerId, ProtocolError> {
  field
    .trim()
    .parse::<PlayerId>()
    .map_err(|_| ProtocolError::InvalidPlayerId(field.to_string()))
}

fn parse_key(field: &str) -> Result<Key, ProtocolError> {
  field
    .trim()
    .parse::<Key>()
    .map_err(|_| ProtocolError::InvalidKey(field.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::game::codec::encode;

  #[test]
  fn snake_message_lists_head_first_keys() {
    let body = vec![Coordinate::new(5, 5), Coordinate::new(4, 5)];
    let text = encode_snake(7, body.clone());
    assert_eq!(text, format!("snake,7,{},{}", encode(5, 5), encode(4, 5)));

    let message = decode_message(&text).expect("message");
    assert_eq!(
      message,
      InboundMessage::Peer(PeerMessage::Snake { player_id: 7, body })
    );
  }

  #[test]
  fn food_message_carries_one_key() {
    let text = encode_food(3, Coordinate::new(12, 30));
    assert_eq!(text, format!("food,3,{}", encode(12, 30)));
    match decode_message(&text).expect("message") {
      InboundMessage::Peer(PeerMessage::Food { player_id, food }) => {
        assert_eq!(player_id, 3);
        assert_eq!(food, Coordinate::new(12, 30));
      }
      other => panic!("unexpected message {other:?}"),
    }
  }

  #[test]
  fn identity_message_from_relay() {
    assert_eq!(decode_message("id:42"), Ok(InboundMessage::Identity(42)));
    assert_eq!(encode_identity(42), "id:42");
    assert!(matches!(
      decode_message("id:x"),
      Err(ProtocolError::InvalidPlayerId(_))
    ));
  }

  #[test]
  fn unknown_kind_is_rejected() {
    assert_eq!(
      decode_message("chat,1,hello"),
      Err(ProtocolError::UnknownKind("chat".to_string()))
    );
    assert_eq!(decode_message("  "), Err(ProtocolError::Empty));
  }

  #[test]
  fn malformed_numbers_are_rejected() {
    assert!(matches!(
      decode_message("snake,abc,1"),
      Err(ProtocolError::InvalidPlayerId(_))
    ));
    assert!(matches!(
      decode_message("snake,1,2,oops"),
      Err(ProtocolError::InvalidKey(_))
    ));
    assert!(matches!(
      decode_message("food,1,-4"),
      Err(ProtocolError::InvalidKey(_))
    ));
    assert!(matches!(
      decode_message("snake,1,99999999999"),
      Err(ProtocolError::InvalidKey(_))
    ));
  }

  #[test]
  fn payload_shape_is_checked() {
    assert_eq!(decode_message("snake,9"), Err(ProtocolError::EmptyBody(9)));
    assert_eq!(
      decode_message("food,9,1,2"),
      Err(ProtocolError::FoodArity {
        player_id: 9,
        count: 2
      })
    );
  }
}
