//! Interactive controller.
//!
//! Runs the poll cycle on a fixed interval, paints each snapshot and reacts to
//! key presses while waiting for the next cycle. A sort key change ranks the
//! current snapshot again right away without sampling. Quitting only takes
//! effect between cycles since a cycle runs to completion before keys are read.

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use herakles_top::{Poller, Snapshot, SortKey};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::ui::{self, UiOptions};

/// What a key press asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Sort(SortKey),
    CycleSort,
}

/// Maps a key press to an action.
pub fn action_for_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::Sort(SortKey::ByCpu)),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Action::Sort(SortKey::ByMem)),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::Sort(SortKey::ByPid)),
        KeyCode::Tab => Some(Action::CycleSort),
        _ => None,
    }
}

/// Result of handling one terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Quit,
    Redraw,
    Ignored,
}

/// Source of terminal events.
pub trait EventSource {
    /// Waits up to `timeout` for the next event. A zero timeout returns only
    /// events that are already queued.
    fn next_event(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

/// Events read from the controlling terminal.
pub struct TerminalEvents;

impl EventSource for TerminalEvents {
    fn next_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if !event::poll(timeout).context("Failed to poll terminal events")? {
            return Ok(None);
        }
        let ev = event::read().context("Failed to read terminal event")?;
        Ok(Some(ev))
    }
}

pub struct App {
    poller: Poller,
    sort: SortKey,
    interval: Duration,
    ui: UiOptions,
}

impl App {
    pub fn new(poller: Poller, sort: SortKey, interval: Duration, ui: UiOptions) -> Self {
        Self {
            poller,
            sort,
            interval,
            ui,
        }
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    /// Applies an action to the session. Returns `true` when the loop should end.
    pub fn apply(&mut self, action: Action, snapshot: &mut Snapshot) -> bool {
        let key = match action {
            Action::Quit => return true,
            Action::Sort(key) => key,
            Action::CycleSort => self.sort.next(),
        };
        if key != self.sort {
            debug!("Sort key changed to {}", key.label());
        }
        self.sort = key;
        snapshot.rerank(key);
        false
    }

    /// Runs the poll/render loop until the user quits.
    pub fn run<B: Backend, E: EventSource>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &mut E,
    ) -> Result<()> {
        info!(
            "Interactive loop started: interval={}ms sort={}",
            self.interval.as_millis(),
            self.sort.label()
        );

        loop {
            let deadline = Instant::now() + self.interval;
            let mut snapshot = self.poller.poll(self.sort);
            self.render(terminal, &snapshot)?;

            if self.wait_for_input(terminal, events, &mut snapshot, deadline)? {
                break;
            }
        }

        info!("Interactive loop stopped after {} cycles", self.poller.state().cycles());
        Ok(())
    }

    fn render<B: Backend>(&self, terminal: &mut Terminal<B>, snapshot: &Snapshot) -> Result<()> {
        terminal
            .draw(|frame| ui::draw(frame, snapshot, self.poller.stats(), &self.ui))
            .context("Failed to draw frame")?;
        Ok(())
    }

    /// Applies one terminal event to the session.
    pub fn handle_event(&mut self, ev: Event, snapshot: &mut Snapshot) -> EventOutcome {
        match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => match action_for_key(key) {
                Some(action) if self.apply(action, snapshot) => EventOutcome::Quit,
                Some(_) => EventOutcome::Redraw,
                None => EventOutcome::Ignored,
            },
            Event::Resize(_, _) => EventOutcome::Redraw,
            _ => EventOutcome::Ignored,
        }
    }

    /// Handles events until `deadline`. Returns `true` on quit.
    ///
    /// Once the deadline has passed the timeout is zero, which still drains
    /// the events already queued. A cycle slower than the interval therefore
    /// still sees a quit key at its end.
    fn wait_for_input<B: Backend, E: EventSource>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &mut E,
        snapshot: &mut Snapshot,
        deadline: Instant,
    ) -> Result<bool> {
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            let Some(ev) = events.next_event(timeout)? else {
                return Ok(false);
            };
            match self.handle_event(ev, snapshot) {
                EventOutcome::Quit => return Ok(true),
                EventOutcome::Redraw => self.render(terminal, snapshot)?,
                EventOutcome::Ignored => {}
            }
        }
    }
}

/// Initialize the terminal for TUI mode
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    io::stdout()
        .execute(EnterAlternateScreen)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(io::stdout());
    Terminal::new(backend).context("Failed to create terminal")
}

/// Restore terminal to normal mode
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    io::stdout()
        .execute(LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    Ok(())
}

/// Runs the interactive monitor, restoring the terminal even if the loop fails.
pub fn run_tui(mut app: App) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = app.run(&mut terminal, &mut TerminalEvents);
    restore_terminal()?;
    terminal.show_cursor().context("Failed to show cursor")?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use herakles_top::{PollerOptions, ProcessMetric, ProcessTable, SystemMetric};
    use ratatui::backend::TestBackend;
    use std::collections::VecDeque;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(action_for_key(key(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(action_for_key(key(KeyCode::Esc)), Some(Action::Quit));
        assert_eq!(
            action_for_key(key(KeyCode::Char('c'))),
            Some(Action::Sort(SortKey::ByCpu))
        );
        assert_eq!(
            action_for_key(key(KeyCode::Char('m'))),
            Some(Action::Sort(SortKey::ByMem))
        );
        assert_eq!(
            action_for_key(key(KeyCode::Char('p'))),
            Some(Action::Sort(SortKey::ByPid))
        );
        assert_eq!(action_for_key(key(KeyCode::Tab)), Some(Action::CycleSort));
        assert_eq!(action_for_key(key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(action_for_key(ctrl_c), Some(Action::Quit));
    }

    fn app(sort: SortKey) -> App {
        let options = PollerOptions {
            proc_root: std::env::temp_dir().join("herakles-top-no-such-proc"),
            ..PollerOptions::default()
        };
        App::new(
            Poller::new(options),
            sort,
            Duration::from_millis(200),
            UiOptions {
                display_limit: 20,
                cpu_warn_percent: 70.0,
                mem_warn_percent: 70.0,
                highlight_pid: None,
            },
        )
    }

    fn snapshot() -> Snapshot {
        let mut processes = ProcessTable::with_capacity(8);
        for (pid, cpu) in [(3, 1.0), (1, 9.0), (2, 5.0)] {
            processes.push(ProcessMetric {
                pid,
                name: format!("p{}", pid),
                state: 'S',
                cpu_metric: cpu,
                mem_metric: 0.0,
            });
        }
        Snapshot {
            cycle: 1,
            taken_at: Local::now(),
            sort: SortKey::ByPid,
            system: SystemMetric::default(),
            processes,
        }
    }

    #[test]
    fn test_sort_action_reranks_current_snapshot() {
        let mut app = app(SortKey::ByPid);
        let mut snap = snapshot();

        assert!(!app.apply(Action::Sort(SortKey::ByCpu), &mut snap));
        assert_eq!(app.sort(), SortKey::ByCpu);
        assert_eq!(snap.sort, SortKey::ByCpu);
        let pids: Vec<u32> = snap.processes.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![1, 2, 3]);
        // No sampling happened.
        assert_eq!(app.poller.state().cycles(), 0);
    }

    #[test]
    fn test_cycle_sort_and_quit() {
        let mut app = app(SortKey::ByMem);
        let mut snap = snapshot();

        assert!(!app.apply(Action::CycleSort, &mut snap));
        assert_eq!(app.sort(), SortKey::ByPid);
        assert!(app.apply(Action::Quit, &mut snap));
    }

    /// Replays queued events and records every timeout it was asked to wait.
    struct ScriptedEvents {
        queue: VecDeque<Event>,
        timeouts: Vec<Duration>,
    }

    impl ScriptedEvents {
        fn new(events: Vec<Event>) -> Self {
            Self {
                queue: events.into(),
                timeouts: Vec::new(),
            }
        }
    }

    impl EventSource for ScriptedEvents {
        fn next_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
            self.timeouts.push(timeout);
            Ok(self.queue.pop_front())
        }
    }

    fn terminal() -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(100, 30)).expect("test terminal")
    }

    #[test]
    fn test_queued_keys_read_after_slow_cycle() {
        let mut app = app(SortKey::ByPid);
        let mut snap = snapshot();
        let mut term = terminal();
        let mut events = ScriptedEvents::new(vec![
            Event::Key(key(KeyCode::Char('m'))),
            Event::Key(key(KeyCode::Char('q'))),
        ]);

        // The cycle already overran its interval.
        let deadline = Instant::now();
        let quit = app
            .wait_for_input(&mut term, &mut events, &mut snap, deadline)
            .expect("wait_for_input");

        assert!(quit);
        assert_eq!(app.sort(), SortKey::ByMem);
        assert_eq!(events.timeouts.len(), 2);
        assert!(events.timeouts.iter().all(|t| t.is_zero()));
    }

    #[test]
    fn test_empty_queue_returns_after_one_check() {
        let mut app = app(SortKey::ByCpu);
        let mut snap = snapshot();
        let mut term = terminal();
        let mut events = ScriptedEvents::new(Vec::new());

        let quit = app
            .wait_for_input(&mut term, &mut events, &mut snap, Instant::now())
            .expect("wait_for_input");

        assert!(!quit);
        assert_eq!(events.timeouts, vec![Duration::ZERO]);
        assert_eq!(app.sort(), SortKey::ByCpu);
    }

    #[test]
    fn test_handle_event_outcomes() {
        let mut app = app(SortKey::ByPid);
        let mut snap = snapshot();

        let release = KeyEvent::new_with_kind(
            KeyCode::Char('q'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        );
        assert_eq!(
            app.handle_event(Event::Key(release), &mut snap),
            EventOutcome::Ignored
        );
        assert_eq!(
            app.handle_event(Event::Key(key(KeyCode::Char('x'))), &mut snap),
            EventOutcome::Ignored
        );
        assert_eq!(
            app.handle_event(Event::Resize(120, 40), &mut snap),
            EventOutcome::Redraw
        );
        assert_eq!(
            app.handle_event(Event::Key(key(KeyCode::Char('c'))), &mut snap),
            EventOutcome::Redraw
        );
        assert_eq!(app.sort(), SortKey::ByCpu);
        assert_eq!(
            app.handle_event(Event::Key(key(KeyCode::Esc)), &mut snap),
            EventOutcome::Quit
        );
    }
}
