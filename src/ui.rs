//! Terminal front end for the session.
//!
//! Implements the `Interaction` seam with line prompts on stdin and a
//! raw-mode crossterm loop for chooser sessions. All decision logic stays in
//! `chooser`; this module only translates key events and repaints
//! `chooser.lines()`.

use std::io::{self, BufRead, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use tracing::debug;

use crate::chooser::{Chooser, ChooserMode, Key, Verdict};
use crate::cli::output;
use crate::errors::{SessionError, SessionResult};
use crate::session::{EditAction, Interaction};

const ACTION_MENU: &str = "\n1. move an existing node\n2. remove an existing node\n3. add a new node\nPlease select an action to perform on the behavior tree (1-3, other to cancel)";

fn mode_color(mode: ChooserMode) -> Color {
    match mode {
        ChooserMode::Select => Color::Blue,
        ChooserMode::Insert => Color::Green,
        ChooserMode::Move => Color::Red,
    }
}

fn instructions(mode: ChooserMode) -> &'static str {
    match mode {
        ChooserMode::Select => {
            "Use the Up/Down arrow keys to select the desired action to operate on."
        }
        ChooserMode::Insert => "Use the Up/Down arrow keys to select where to insert the action.",
        ChooserMode::Move => "Use the Up/Down arrow keys to select the new position for the action.",
    }
}

/// Stdin/stdout implementation of the interaction seam.
#[derive(Debug, Default)]
pub struct TerminalUi;

impl TerminalUi {
    pub fn new() -> Self {
        Self
    }

    fn read_line(&self) -> SessionResult<String> {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

impl Interaction for TerminalUi {
    fn prompt_line(&mut self, prompt: &str) -> SessionResult<String> {
        output::prompt(&format!("{prompt}:"));
        self.read_line()
    }

    fn confirm_change(&mut self) -> SessionResult<bool> {
        output::prompt("Would you like to make a change before I begin? [y/n]:");
        Ok(matches!(self.read_line()?.as_str(), "y" | "Y" | "yes"))
    }

    fn pick_action(&mut self) -> SessionResult<Option<EditAction>> {
        output::prompt(ACTION_MENU);
        Ok(match self.read_line()?.as_str() {
            "1" => Some(EditAction::Move),
            "2" => Some(EditAction::Remove),
            "3" => Some(EditAction::Add),
            _ => None,
        })
    }

    fn run_chooser(&mut self, chooser: Chooser) -> SessionResult<Verdict> {
        run_chooser_session(chooser)
    }
}

/// Runs one chooser session in raw mode until Enter or Escape.
///
/// The terminal is restored on every exit path, including errors.
pub fn run_chooser_session(mut chooser: Chooser) -> SessionResult<Verdict> {
    terminal::enable_raw_mode().map_err(|e| SessionError::Terminal(e.to_string()))?;
    let result = chooser_loop(&mut chooser);
    terminal::disable_raw_mode().map_err(|e| SessionError::Terminal(e.to_string()))?;

    // Leave the final list on screen but drop the highlight
    let mut stdout = io::stdout();
    execute!(stdout, Clear(ClearType::FromCursorDown))
        .map_err(|e| SessionError::Terminal(e.to_string()))?;
    result
}

fn chooser_loop(chooser: &mut Chooser) -> SessionResult<Verdict> {
    let mut stdout = io::stdout();
    let mut painted_rows = 0u16;

    loop {
        painted_rows = paint(&mut stdout, chooser, painted_rows)
            .map_err(|e| SessionError::Terminal(e.to_string()))?;

        let event = event::read().map_err(|e| SessionError::Terminal(e.to_string()))?;
        let key = match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => match code {
                KeyCode::Up => Key::Up,
                KeyCode::Down => Key::Down,
                KeyCode::Enter => Key::Enter,
                KeyCode::Esc => Key::Escape,
                // No other input is accepted mid-session
                _ => continue,
            },
            _ => continue,
        };

        if let Some(verdict) = chooser.handle(key) {
            debug!(?verdict, "chooser session ended");
            return Ok(verdict);
        }
    }
}

/// Repaints the instruction line and the candidate list, returning the number
/// of rows written so the next repaint can rewind.
fn paint(stdout: &mut io::Stdout, chooser: &Chooser, previous_rows: u16) -> io::Result<u16> {
    if previous_rows > 0 {
        execute!(stdout, cursor::MoveUp(previous_rows))?;
    }
    execute!(stdout, Clear(ClearType::FromCursorDown))?;

    let color = mode_color(chooser.mode());
    execute!(
        stdout,
        SetForegroundColor(color),
        Print(instructions(chooser.mode())),
        Print(" Press Enter to confirm. Press Esc to exit at any time.\r\n"),
        ResetColor
    )?;

    let lines = chooser.lines();
    let rows = lines.len() as u16 + 1;
    for (text, under_cursor) in lines {
        if under_cursor {
            execute!(
                stdout,
                SetForegroundColor(color),
                Print(&text),
                ResetColor,
                Print("\r\n")
            )?;
        } else {
            execute!(stdout, Print(&text), Print("\r\n"))?;
        }
    }
    stdout.flush()?;
    Ok(rows)
}
