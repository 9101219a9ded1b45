mod terminal;

use crate::config::Config;
use crate::game::session::{GameSession, SessionConfig, TickOutcome};
use crate::game::types::{BoardSnapshot, LossReason, PlayerId};
use crate::protocol::{decode_message, InboundMessage};
use crate::transport::ws_client::RelayConnection;
use anyhow::Context;
use terminal::{spawn_input_reader, InputEvent, TerminalRenderer};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{sleep_until, Instant};

/// Anything that can show a board snapshot once per tick.
pub trait BoardView {
    fn draw(&mut self, snapshot: &BoardSnapshot) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientExit {
    Lost(LossReason),
    TransportClosed,
    Quit,
}

impl ClientExit {
    fn message(self) -> &'static str {
        match self {
            ClientExit::Lost(LossReason::OutOfBounds) => "You lose! Your snake left the board.",
            ClientExit::Lost(LossReason::Collision) => "You lose! Your snake hit another snake.",
            ClientExit::TransportClosed => "Connection to the relay closed.",
            ClientExit::Quit => "Bye.",
        }
    }
}

pub async fn run_client_mode(config: &Config) -> anyhow::Result<()> {
    let mut connection = RelayConnection::connect(&config.relay_url).await?;

    let Some(player_id) = wait_for_identity(&mut connection.inbound).await? else {
        println!("{}", ClientExit::TransportClosed.message());
        return Ok(());
    };
    tracing::info!(player_id, "relay assigned identity");

    let session_config = SessionConfig::for_player(player_id, config.bounds, config.frame_interval);
    let mut session = GameSession::new(player_id, session_config, connection.outbound.clone());

    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    let _input_task = spawn_input_reader(input_tx);
    let mut renderer = TerminalRenderer::enter()?;

    let result = drive(
        &mut session,
        &mut renderer,
        &mut connection.inbound,
        &mut input_rx,
    )
    .await;
    drop(input_rx);
    if let Err(error) = &result {
        tracing::error!(player_id, "session failed: {error:#}");
    }
    let restored = renderer.restore();

    let exit = result?;
    restored?;
    tracing::info!(player_id, ?exit, "session ended");
    println!("{}", exit.message());
    Ok(())
}

async fn wait_for_identity(
    inbound: &mut UnboundedReceiver<String>,
) -> anyhow::Result<Option<PlayerId>> {
    while let Some(text) = inbound.recv().await {
        match decode_message(&text).with_context(|| format!("bad message from relay: {text}"))? {
            InboundMessage::Identity(player_id) => return Ok(Some(player_id)),
            InboundMessage::Peer(message) => {
                tracing::debug!(?message, "dropping peer message received before identity");
            }
        }
    }
    Ok(None)
}

/// Runs ticks, peer messages and key presses against one session, one at a time.
async fn drive<V: BoardView>(
    session: &mut GameSession,
    renderer: &mut V,
    inbound: &mut UnboundedReceiver<String>,
    input: &mut UnboundedReceiver<InputEvent>,
) -> anyhow::Result<ClientExit> {
    renderer.draw(&session.snapshot())?;
    let mut next_tick = Instant::now() + session.frame_interval();

    loop {
        tokio::select! {
            _ = sleep_until(next_tick) => {
                let outcome = session.tick();
                renderer.draw(&session.snapshot())?;
                if let TickOutcome::Lost(reason) = outcome {
                    return Ok(ClientExit::Lost(reason));
                }
                next_tick = Instant::now() + session.frame_interval();
            }
            message = inbound.recv() => {
                let Some(text) = message else {
                    return Ok(ClientExit::TransportClosed);
                };
                match decode_message(&text).with_context(|| format!("bad message from relay: {text}"))? {
                    InboundMessage::Peer(message) => session.handle_peer_message(message),
                    InboundMessage::Identity(id) => {
                        tracing::warn!(id, "ignoring repeated identity from relay");
                    }
                }
            }
            Some(event) = input.recv() => match event {
                InputEvent::Turn(direction) => session.request_turn(direction),
                InputEvent::Quit => return Ok(ClientExit::Quit),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::codec::encode;
    use crate::game::types::{Bounds, Coordinate, SessionStatus};
    use std::time::Duration;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

    #[derive(Default)]
    struct RecordingView {
        frames: Vec<BoardSnapshot>,
    }

    impl BoardView for RecordingView {
        fn draw(&mut self, snapshot: &BoardSnapshot) -> anyhow::Result<()> {
            self.frames.push(snapshot.clone());
            Ok(())
        }
    }

    fn make_session(config: SessionConfig) -> GameSession {
        let (tx, _rx) = unbounded_channel();
        GameSession::new(1, config, tx)
    }

    fn feed(lines: &[&str]) -> (UnboundedSender<String>, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        for line in lines {
            tx.send(line.to_string()).unwrap();
        }
        (tx, rx)
    }

    #[tokio::test]
    async fn identity_wait_skips_early_peer_messages() {
        let (_tx, mut inbound) = feed(&["snake,3,5", "food,3,7", "id:4"]);
        assert_eq!(wait_for_identity(&mut inbound).await.unwrap(), Some(4));
    }

    #[tokio::test]
    async fn identity_wait_ends_when_relay_closes() {
        let (tx, mut inbound) = feed(&["snake,3,5"]);
        drop(tx);
        assert_eq!(wait_for_identity(&mut inbound).await.unwrap(), None);
    }

    #[tokio::test]
    async fn identity_wait_fails_on_garbage() {
        let (_tx, mut inbound) = feed(&["hello,1"]);
        let error = wait_for_identity(&mut inbound).await.expect_err("unknown kind");
        assert!(format!("{error:#}").contains("hello"));
    }

    #[tokio::test]
    async fn closed_relay_ends_the_loop_after_applying_pending_messages() {
        let mut session = make_session(SessionConfig::default());
        let mut view = RecordingView::default();
        let peer = format!("snake,2,{},{}", encode(10, 10), encode(9, 10));
        let (tx, mut inbound) = feed(&[peer.as_str(), "id:9"]);
        drop(tx);
        let (_input_tx, mut input) = unbounded_channel();

        let exit = drive(&mut session, &mut view, &mut inbound, &mut input)
            .await
            .unwrap();

        assert_eq!(exit, ClientExit::TransportClosed);
        assert_eq!(session.status(), SessionStatus::Playing);
        assert_eq!(
            session
                .peer_snake(2)
                .map(|snake| snake.head()),
            Some(Coordinate::new(10, 10))
        );
        assert!(!view.frames.is_empty());
    }

    #[tokio::test]
    async fn undecodable_message_is_fatal() {
        let mut session = make_session(SessionConfig::default());
        let mut view = RecordingView::default();
        let (_tx, mut inbound) = feed(&["snake,2,not-a-key"]);
        let (_input_tx, mut input) = unbounded_channel();

        let error = drive(&mut session, &mut view, &mut inbound, &mut input)
            .await
            .expect_err("bad payload");
        assert!(format!("{error:#}").contains("bad message from relay"));
    }

    #[tokio::test]
    async fn quit_key_stops_the_loop() {
        let mut session = make_session(SessionConfig::default());
        let mut view = RecordingView::default();
        let (_tx, mut inbound) = feed(&[]);
        let (input_tx, mut input) = unbounded_channel();
        input_tx.send(InputEvent::Quit).unwrap();

        let exit = drive(&mut session, &mut view, &mut inbound, &mut input)
            .await
            .unwrap();
        assert_eq!(exit, ClientExit::Quit);
    }

    #[tokio::test]
    async fn leaving_the_board_reports_the_loss() {
        let mut session = make_session(SessionConfig {
            bounds: Bounds {
                width: 5,
                height: 3,
            },
            frame_interval: Duration::from_millis(20),
            ..SessionConfig::default()
        });
        let mut view = RecordingView::default();
        let (_tx, mut inbound) = feed(&[]);
        let (_input_tx, mut input) = unbounded_channel();

        let exit = drive(&mut session, &mut view, &mut inbound, &mut input)
            .await
            .unwrap();

        assert_eq!(exit, ClientExit::Lost(LossReason::OutOfBounds));
        let last = view.frames.last().expect("frame drawn after the tick");
        assert_eq!(last.status, SessionStatus::Lost(LossReason::OutOfBounds));
    }
}
