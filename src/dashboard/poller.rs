//! ==============================================================================
//! poller.rs - dashboard state machine and poll loop
//! ==============================================================================
//!
//! states:
//!     Connecting ──poll ok──▶ Connected
//!         │                      │
//!         └──poll failed──▶ Error ◀┘   (next good poll goes back to Connected)
//!
//! a failed poll leaves the previous frame on screen. the toggle is driven by
//! the user (Enter), not the timer, and trusts the status the server answers
//! with. q or Esc leaves the dashboard and restores the terminal.
//!
//! ==============================================================================

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use super::render;
use super::view::{build_view, DashboardView};
use super::POLLING_RATE;
use crate::client::RelayClient;
use crate::domain::{Reading, SystemStatus};
use crate::error::ClientError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    /// short label shown next to the indicator
    Error(String),
}

impl ConnectionState {
    pub fn label(&self) -> &str {
        match self {
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Connected => "Connected",
            ConnectionState::Error(label) => label,
        }
    }
}

/// how long the loop waits for a key before redrawing
const TICK_RATE: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Toggle,
    Quit,
    Ignore,
}

pub fn key_action(key: &KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }
    match key.code {
        KeyCode::Enter => KeyAction::Toggle,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        _ => KeyAction::Ignore,
    }
}

pub struct Dashboard {
    client: RelayClient,
    connection: ConnectionState,
    status: SystemStatus,
    view: Option<DashboardView>,
}

impl Dashboard {
    pub fn new(client: RelayClient) -> Self {
        Self {
            client,
            connection: ConnectionState::Connecting,
            status: SystemStatus::default(),
            view: None,
        }
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    /// last status the server confirmed
    pub fn status(&self) -> SystemStatus {
        self.status
    }

    pub fn view(&self) -> Option<&DashboardView> {
        self.view.as_ref()
    }

    /// one history query and, on success, a full re-render
    pub async fn poll(&mut self) {
        match self.client.sensor_data().await {
            Ok(data) => self.apply_history(&data),
            Err(e) => {
                warn!("Error fetching data: {}", e);
                let label = match e {
                    ClientError::ServerError(_) => "Server Error",
                    ClientError::NetworkFailure(_) => "Connection Failed",
                };
                self.connection = ConnectionState::Error(label.to_string());
            }
        }
    }

    pub fn apply_history(&mut self, data: &[Reading]) {
        if let Some(view) = build_view(data) {
            self.view = Some(view);
        }
        self.connection = ConnectionState::Connected;
    }

    /// ask for the opposite of the last known status
    pub async fn toggle(&mut self) {
        let requested = self.status.toggled();
        match self.client.control(requested).await {
            Ok(reply) => {
                info!("{}", reply.message);
                self.status = reply.status;
            }
            Err(e) => {
                warn!("Control request failed: {}", e);
                self.connection = ConnectionState::Error("Control Failed".to_string());
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        render::draw(frame, self.view.as_ref(), &self.connection, self.status);
    }

    /// Takes over the terminal until q/Esc is pressed.
    ///
    /// History is polled every `POLLING_RATE` with no backoff: a failing
    /// relay is retried on the next round. Polls run one at a time.
    pub async fn run(mut self) -> Result<()> {
        info!("Dashboard polling {} every {:?}", self.client.base_url(), POLLING_RATE);

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(info);
        }));

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_poll: Option<Instant> = None;

        loop {
            if last_poll.map_or(true, |at| at.elapsed() >= POLLING_RATE) {
                last_poll = Some(Instant::now());
                self.poll().await;
            }

            terminal.draw(|f| self.draw(f))?;

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    match key_action(&key) {
                        KeyAction::Toggle => self.toggle().await,
                        KeyAction::Quit => return Ok(()),
                        KeyAction::Ignore => {}
                    }
                }
            }
        }
    }
}
