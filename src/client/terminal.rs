use super::BoardView;
use crate::game::types::{BoardSnapshot, Coordinate, Direction, SessionStatus};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue, style};
use std::io::{stdout, Stdout, Write};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

const INPUT_POLL: Duration = Duration::from_millis(50);

const EMPTY_CELL: char = ' ';
const BORDER_CORNER: char = '+';
const BORDER_HORIZONTAL: char = '-';
const BORDER_VERTICAL: char = '|';
const LOCAL_HEAD: char = '@';
const LOCAL_BODY: char = '#';
const PEER_HEAD: char = 'O';
const PEER_BODY: char = 'o';
const LOCAL_FOOD: char = '*';
const PEER_FOOD: char = '+';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Turn(Direction),
    Quit,
}

pub struct TerminalRenderer {
    stdout: Stdout,
    active: bool,
}

impl TerminalRenderer {
    pub fn enter() -> anyhow::Result<Self> {
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
        terminal::enable_raw_mode()?;
        Ok(Self {
            stdout,
            active: true,
        })
    }

    pub fn draw(&mut self, snapshot: &BoardSnapshot) -> anyhow::Result<()> {
        queue!(self.stdout, terminal::Clear(ClearType::All))?;
        for (row, line) in render_rows(snapshot).iter().enumerate() {
            queue!(self.stdout, cursor::MoveTo(0, row as u16), style::Print(line))?;
        }
        self.stdout.flush()?;
        Ok(())
    }

    pub fn restore(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        terminal::disable_raw_mode()?;
        execute!(self.stdout, cursor::Show, LeaveAlternateScreen)?;
        Ok(())
    }
}

impl BoardView for TerminalRenderer {
    fn draw(&mut self, snapshot: &BoardSnapshot) -> anyhow::Result<()> {
        TerminalRenderer::draw(self, snapshot)
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Lays the snapshot out as text rows: a bordered board and a status line.
pub fn render_rows(snapshot: &BoardSnapshot) -> Vec<String> {
    let width = snapshot.bounds.width.max(0) as usize;
    let height = snapshot.bounds.height.max(0) as usize;
    let mut grid = vec![vec![EMPTY_CELL; width]; height];

    let mut put = |point: Coordinate, glyph: char| {
        if point.x >= 0 && point.y >= 0 && (point.x as usize) < width && (point.y as usize) < height
        {
            grid[point.y as usize][point.x as usize] = glyph;
        }
    };

    for player in &snapshot.players {
        if let Some(food) = player.food {
            put(food, if player.local { LOCAL_FOOD } else { PEER_FOOD });
        }
    }
    // Local snake last so it stays visible where views disagree.
    for player in snapshot.players.iter().rev() {
        let (head, body) = if player.local {
            (LOCAL_HEAD, LOCAL_BODY)
        } else {
            (PEER_HEAD, PEER_BODY)
        };
        for (index, point) in player.snake.iter().enumerate().rev() {
            put(*point, if index == 0 { head } else { body });
        }
    }

    let border: String = std::iter::once(BORDER_CORNER)
        .chain(std::iter::repeat(BORDER_HORIZONTAL).take(width))
        .chain(std::iter::once(BORDER_CORNER))
        .collect();

    let mut rows = Vec::with_capacity(height + 3);
    rows.push(border.clone());
    for cells in grid {
        let mut line = String::with_capacity(width + 2);
        line.push(BORDER_VERTICAL);
        line.extend(cells);
        line.push(BORDER_VERTICAL);
        rows.push(line);
    }
    rows.push(border);
    rows.push(status_line(snapshot));
    rows
}

fn status_line(snapshot: &BoardSnapshot) -> String {
    let length = snapshot
        .players
        .iter()
        .find(|player| player.local)
        .map(|player| player.snake.len())
        .unwrap_or(0);
    let peers = snapshot.players.iter().filter(|player| !player.local).count();
    let state = match snapshot.status {
        SessionStatus::Playing => "playing",
        SessionStatus::Lost(_) => "lost",
    };
    format!(
        "player {}  length {}  peers {}  {}  (arrows/WASD, q to quit)",
        snapshot.local_id, length, peers, state
    )
}

pub fn map_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(InputEvent::Quit);
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(InputEvent::Turn(Direction::Up)),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
            Some(InputEvent::Turn(Direction::Down))
        }
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
            Some(InputEvent::Turn(Direction::Left))
        }
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
            Some(InputEvent::Turn(Direction::Right))
        }
        KeyCode::Esc | KeyCode::Char('q') => Some(InputEvent::Quit),
        _ => None,
    }
}

/// Reads the keyboard on a blocking thread until the receiver goes away.
pub fn spawn_input_reader(events: UnboundedSender<InputEvent>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !events.is_closed() {
            match event::poll(INPUT_POLL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(error) => {
                    tracing::warn!(%error, "keyboard poll failed");
                    break;
                }
            }
            let key = match event::read() {
                Ok(Event::Key(key)) => key,
                Ok(_) => continue,
                Err(error) => {
                    tracing::warn!(%error, "keyboard read failed");
                    break;
                }
            };
            if let Some(input) = map_key(key) {
                if events.send(input).is_err() {
                    break;
                }
            }
        }
    })
}
