use std::io::{self, BufRead, Write};

use super::display::{DisplayError, Orientation, render_state};
use crate::RulesEngine;
use crate::controller::SessionController;
use crate::notation;

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Move { from: String, to: String },
    ValidMoves { square: String },
    NewGame,
    Flip,
    History,
    Refresh,
    Quit,
}

impl Command {
    /// Parse a command line. Returns `None` for anything unrecognised.
    ///
    /// Moves are accepted as `m e2 e4`, `e2 e4` or `e2e4`; squares are checked
    /// later by the session.
    fn parse(input: &str) -> Option<Self> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        match parts.as_slice() {
            ["m", from, to] => Some(Command::Move {
                from: from.to_string(),
                to: to.to_string(),
            }),
            ["v", square] => Some(Command::ValidMoves {
                square: square.to_string(),
            }),
            [from, to] if *from != "m" => Some(Command::Move {
                from: from.to_string(),
                to: to.to_string(),
            }),
            ["n"] => Some(Command::NewGame),
            ["f"] => Some(Command::Flip),
            ["h"] => Some(Command::History),
            ["p"] => Some(Command::Refresh),
            ["q"] => Some(Command::Quit),
            [joined] if joined.len() == 4 && joined.is_ascii() => {
                let (from, to) = joined.split_at(2);
                Some(Command::Move {
                    from: from.to_string(),
                    to: to.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Clears the screen and moves cursor to top-left.
#[inline]
fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    write!(w, "\x1B[2J\x1B[H")
}

/// Runs an interactive terminal session on stdin/stdout.
///
/// Shows the board and session state after every command, with a one-line
/// feedback message for the last action.
pub fn run_interactive_terminal<R: RulesEngine>(
    controller: SessionController<R>,
    orientation: Orientation,
) -> Result<(), DisplayError> {
    let stdin = io::stdin();
    run_terminal(controller, orientation, stdin.lock(), &mut io::stdout())
}

fn run_terminal<R: RulesEngine>(
    mut controller: SessionController<R>,
    mut orientation: Orientation,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<(), DisplayError> {
    draw_interface(out, &controller, orientation, "Welcome!")?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let feedback = match Command::parse(&line) {
            Some(Command::Move { from, to }) => match controller.play(&from, &to) {
                Ok(_) => "Move successful!".to_string(),
                Err(e) => format!("Move rejected: {e}"),
            },
            Some(Command::ValidMoves { square }) => match controller.valid_moves(&square) {
                Ok(targets) if targets.is_empty() => format!("No valid moves from {square}"),
                Ok(targets) => {
                    let names: Vec<String> = targets.iter().map(ToString::to_string).collect();
                    format!("Valid moves from {square}: {}", names.join(" "))
                }
                Err(e) => format!("Cannot list moves: {e}"),
            },
            Some(Command::NewGame) => {
                controller.start_new_session();
                "New game started!".to_string()
            }
            Some(Command::Flip) => {
                orientation = orientation.flip();
                "Board flipped".to_string()
            }
            Some(Command::History) => {
                let history = notation::history_lines(controller.current_state().history());
                if history.is_empty() {
                    "No moves yet".to_string()
                } else {
                    history.join("\n")
                }
            }
            Some(Command::Refresh) => String::new(),
            Some(Command::Quit) => break,
            None => "Unknown command".to_string(),
        };

        draw_interface(out, &controller, orientation, &feedback)?;
    }

    Ok(())
}

/// Draws the complete interface: help text, board, session state and feedback.
fn draw_interface<R: RulesEngine>(
    out: &mut impl Write,
    controller: &SessionController<R>,
    orientation: Orientation,
    feedback: &str,
) -> Result<(), DisplayError> {
    clear_screen(out)?;
    writeln!(out, "♟️  Chess Session")?;
    writeln!(out)?;
    writeln!(
        out,
        "Commands: m <from> <to> | <from><to> | v <square> (valid moves) | n (new game) | f (flip) | h (history) | p (refresh) | q (quit)"
    )?;
    writeln!(out)?;

    render_state(out, &controller.current_state(), orientation)?;

    if !feedback.is_empty() {
        writeln!(out)?;
        writeln!(out, "{feedback}")?;
    }
    Ok(())
}
