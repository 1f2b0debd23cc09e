use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, widgets::Paragraph, Frame, Terminal};
use std::io;
use std::path::Path;

use crate::app::{update, App, Effect, Intent, Mode};
use crate::database::Database;
use crate::models::TaskList;
use crate::view;

/// Maps a key press to an intent. Text entry swallows printable keys, so the
/// mapping depends on the mode.
pub fn intent_for(mode: &Mode, key: KeyEvent) -> Option<Intent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Intent::Quit),
            _ => None,
        };
    }

    match mode {
        Mode::Normal => match key.code {
            KeyCode::Char('q') => Some(Intent::Quit),
            KeyCode::Up | KeyCode::Char('k') => Some(Intent::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(Intent::Down),
            KeyCode::Char('a') => Some(Intent::Add),
            KeyCode::Char('e') => Some(Intent::Edit),
            KeyCode::Char(' ') => Some(Intent::Toggle),
            KeyCode::Char('x') => Some(Intent::Delete),
            _ => None,
        },
        Mode::InputTitle(_) => match key.code {
            KeyCode::Esc => Some(Intent::Cancel),
            KeyCode::Enter => Some(Intent::Confirm),
            KeyCode::Backspace => Some(Intent::Backspace),
            KeyCode::Left => Some(Intent::Left),
            KeyCode::Right => Some(Intent::Right),
            KeyCode::Home => Some(Intent::Home),
            KeyCode::End => Some(Intent::End),
            KeyCode::Char(c) => Some(Intent::Char(c)),
            _ => None,
        },
        Mode::PickPriority { .. } => match key.code {
            KeyCode::Esc => Some(Intent::Cancel),
            KeyCode::Enter => Some(Intent::Confirm),
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Left | KeyCode::Char('h') => {
                Some(Intent::Up)
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Right | KeyCode::Char('l') => {
                Some(Intent::Down)
            }
            _ => None,
        },
        Mode::PickDate { .. } => match key.code {
            KeyCode::Esc => Some(Intent::Cancel),
            KeyCode::Enter => Some(Intent::Confirm),
            KeyCode::Left | KeyCode::Char('h') => Some(Intent::Left),
            KeyCode::Right | KeyCode::Char('l') => Some(Intent::Right),
            KeyCode::Up | KeyCode::Char('k') => Some(Intent::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(Intent::Down),
            _ => None,
        },
    }
}

/// Opens the store and loads the initial state. A store that cannot be opened
/// or read leaves the app running on an empty, memory-only list.
pub fn start(db_path: &Path) -> (App, Option<Database>) {
    let db = match Database::open(db_path) {
        Ok(db) => db,
        Err(e) => {
            log::error!("{e}");
            let status = format!("Storage unavailable, changes will not be saved: {e}");
            return (App::new(TaskList::default(), Some(status)), None);
        }
    };

    match db.load() {
        Ok(tasks) => (App::new(tasks, None), Some(db)),
        Err(e) => {
            log::error!("{e}");
            (App::new(TaskList::default(), Some(format!("Load failed: {e}"))), Some(db))
        }
    }
}

/// Runs the effects of one transition. Returns true when the app should quit.
pub fn apply_effects(app: &mut App, db: Option<&mut Database>, effects: &[Effect]) -> bool {
    let mut db = db;
    let mut quit = false;
    for effect in effects {
        match effect {
            Effect::Persist => {
                if let Some(db) = db.as_deref_mut() {
                    if let Err(e) = db.save(app.tasks.as_slice()) {
                        log::error!("{e}");
                        app.status = Some(format!("Save failed: {e}"));
                    }
                }
            }
            Effect::Quit => quit = true,
        }
    }
    quit
}

fn draw(f: &mut Frame, app: &App) {
    f.render_widget(Paragraph::new(view::lines(app)), f.area());
}

pub fn run_tui(db_path: &Path) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (mut app, mut db) = start(db_path);
    app.input.resize(terminal.size()?.width);
    let res = run_app(&mut terminal, app, db.as_mut());

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(db) = db {
        if let Err(e) = db.close() {
            log::warn!("{e}");
        }
    }

    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    mut db: Option<&mut Database>,
) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, &app))?;

        let intent = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => intent_for(&app.mode, key),
            Event::Resize(width, _) => Some(Intent::Resize(width)),
            _ => None,
        };
        let Some(intent) = intent else { continue };

        let (next, effects) = update(app, intent);
        app = next;
        if apply_effects(&mut app, db.as_deref_mut(), &effects) {
            return Ok(());
        }
    }
}
