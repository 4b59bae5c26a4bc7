//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Synchronous submission through the intake service
//! - The transient submission notification

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use zeroize::Zeroize;

use crate::{DefaultIntakeService, IntakeError};

use super::ui::{
    dashboard::{render_dashboard, DashboardState, RecentSummary},
    form::{render_intake_form, IntakeFormState},
    render_disclaimer, render_notification,
    result::{render_result, ResultState},
};

/// How long the submission notification stays visible.
const NOTIFICATION_TTL: Duration = Duration::from_millis(1500);

/// Rows summarized on the dashboard.
const RECENT_LIMIT: usize = 10;

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    IntakeForm,
    Result,
}

/// Transient banner shown after a submission. Owned by one `App`.
#[derive(Debug)]
struct Notification {
    message: String,
    shown_at: Instant,
}

impl Notification {
    fn submitted(name: &str, now: Instant) -> Self {
        Self {
            message: format!("Your form has been successfully submitted ✔ {}", name.trim()),
            shown_at: now,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= NOTIFICATION_TTL
    }
}

impl Drop for Notification {
    fn drop(&mut self) {
        self.message.zeroize();
    }
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,
    service: DefaultIntakeService,
    dashboard_state: DashboardState,
    form_state: IntakeFormState,
    result_state: ResultState,
    notification: Option<Notification>,
}

impl App {
    /// Create the application around an already-built service.
    #[must_use]
    pub fn new(service: DefaultIntakeService) -> Self {
        let mut app = Self {
            screen: Screen::Dashboard,
            should_quit: false,
            service,
            dashboard_state: DashboardState::default(),
            form_state: IntakeFormState::new(chrono::Local::now().date_naive()),
            result_state: ResultState::default(),
            notification: None,
        };
        app.update_dashboard_state();
        app
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.tick(Instant::now());

            terminal.draw(|f| {
                let banner_height = u16::from(self.notification.is_some());
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Min(0),
                        Constraint::Length(banner_height),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                match self.screen {
                    Screen::Dashboard => render_dashboard(f, chunks[0], &self.dashboard_state),
                    Screen::IntakeForm => render_intake_form(f, chunks[0], &self.form_state),
                    Screen::Result => render_result(f, chunks[0], &self.result_state),
                }

                if let Some(notification) = &self.notification {
                    render_notification(f, chunks[1], &notification.message);
                }
                render_disclaimer(f, chunks[2]);
            })?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Expire the notification once its display time has passed.
    fn tick(&mut self, now: Instant) {
        if self
            .notification
            .as_ref()
            .is_some_and(|n| n.is_expired(now))
        {
            self.notification = None;
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::IntakeForm => self.handle_form_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n') | KeyCode::Char('N') => self.open_form(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.update_dashboard_state(),
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.form_state.clear_sensitive();
                self.screen = Screen::Dashboard;
            }
            KeyCode::Up | KeyCode::BackTab => self.form_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form_state.next_field(),
            KeyCode::Left => self.form_state.cycle_choice(false),
            KeyCode::Right => self.form_state.cycle_choice(true),
            KeyCode::F(2) => self.form_state.load_sample_data(),
            KeyCode::Char(c) => self.form_state.input_char(c),
            KeyCode::Backspace => self.form_state.delete_char(),
            KeyCode::Delete => self.form_state.clear_field(),
            KeyCode::Enter => self.submit_form(Instant::now()),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        let failed = matches!(self.result_state, ResultState::Error { .. });
        match key {
            KeyCode::Enter if failed => self.screen = Screen::IntakeForm,
            KeyCode::Enter | KeyCode::Esc => {
                self.result_state = ResultState::Idle;
                self.update_dashboard_state();
                self.screen = Screen::Dashboard;
            }
            KeyCode::Char('n') | KeyCode::Char('N') if !failed => self.open_form(),
            _ => {}
        }
    }

    fn open_form(&mut self) {
        self.form_state = IntakeFormState::new(chrono::Local::now().date_naive());
        self.screen = Screen::IntakeForm;
    }

    fn submit_form(&mut self, now: Instant) {
        let record = match self.form_state.to_record() {
            Ok(record) => record,
            Err(e) => {
                self.form_state.error_message = Some(e);
                return;
            }
        };

        match self.service.submit(&record) {
            Ok(outcome) => {
                self.notification = Some(Notification::submitted(&record.name, now));
                self.result_state = ResultState::Complete { outcome };
                self.form_state.clear_sensitive();
                self.screen = Screen::Result;
            }
            Err(IntakeError::Validation(problems)) => {
                self.form_state.error_message = Some(problems.join("; "));
            }
            Err(e) => {
                // Form contents are kept so the user can retry.
                tracing::error!("Submission failed: {}", e);
                self.result_state = ResultState::Error {
                    message: e.to_string(),
                };
                self.screen = Screen::Result;
            }
        }
    }

    fn update_dashboard_state(&mut self) {
        self.dashboard_state.model = Some(self.service.model_info());
        self.dashboard_state.table = self.service.destination().to_string();
        self.dashboard_state.submission_count = match self.service.submission_count() {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::warn!("Failed to count stored rows: {}", e);
                None
            }
        };
        self.dashboard_state.recent = self
            .service
            .recent_results(RECENT_LIMIT)
            .map(|rows| RecentSummary::from_rows(&rows))
            .unwrap_or_default();
    }
}
