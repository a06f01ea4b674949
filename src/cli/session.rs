//! Line based input for an interactive session.

use std::io::ErrorKind;

use anyhow::{bail, Result};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin},
    sync::mpsc::Sender,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::Departments,
    tracker::{
        event::{CommandSource, Navigation, TrackerEvent},
        reducer::Direction,
        state::Department,
    },
};

pub const HELP: &str = "\
Commands:
  F<n>                  toggle the n-th department
  toggle <n|name>       same as F<n>, or by name
  up <n|name>           snap to the quarter hour and add 15 minutes
  down <n|name>         snap to the quarter hour and remove 15 minutes
  prev | next | today   move between days
  show                  draw the board again (also an empty line)
  help                  this text
  quit                  save and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Event(TrackerEvent),
    /// Function key outside the configured range. Those are ignored silently.
    Ignored,
    Help,
    Quit,
}

/// Turns one line typed by the user into a command. Department names are checked against the
/// configured set here, so typos never reach the tracker.
pub fn parse_command(line: &str, departments: &Departments) -> Result<SessionCommand> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let word = word.to_lowercase();

    if let Some(key) = word.strip_prefix('f').and_then(|v| v.parse::<usize>().ok()) {
        return Ok(match departments.by_function_key(key) {
            Some(department) => SessionCommand::Event(TrackerEvent::Toggle(department.clone())),
            None => SessionCommand::Ignored,
        });
    }

    let command = match word.as_str() {
        "" | "show" => SessionCommand::Event(TrackerEvent::Refresh),
        "toggle" | "t" => {
            SessionCommand::Event(TrackerEvent::Toggle(resolve(rest, departments)?))
        }
        "up" | "+" => SessionCommand::Event(TrackerEvent::Adjust(
            resolve(rest, departments)?,
            Direction::Up,
        )),
        "down" | "-" => SessionCommand::Event(TrackerEvent::Adjust(
            resolve(rest, departments)?,
            Direction::Down,
        )),
        "prev" | "p" => SessionCommand::Event(TrackerEvent::Navigate(Navigation::Previous)),
        "next" | "n" => SessionCommand::Event(TrackerEvent::Navigate(Navigation::Next)),
        "today" => SessionCommand::Event(TrackerEvent::Navigate(Navigation::Today)),
        "help" | "?" => SessionCommand::Help,
        "quit" | "q" | "exit" => SessionCommand::Quit,
        _ => bail!("Unknown command {word:?}, type help for the list"),
    };
    Ok(command)
}

/// Department by its function key number or by name.
fn resolve(reference: &str, departments: &Departments) -> Result<Department> {
    if reference.is_empty() {
        bail!("Which department? Use its number or name");
    }
    let found = match reference.parse::<usize>() {
        Ok(key) => departments.by_function_key(key),
        Err(_) => departments.find(reference),
    };
    match found {
        Some(v) => Ok(v.clone()),
        None => bail!("Unknown department {reference:?}"),
    }
}

/// Reads commands line by line, until `quit` or the end of input.
pub struct LineCommands<R> {
    departments: Departments,
    input: R,
}

impl LineCommands<BufReader<Stdin>> {
    pub fn stdin(departments: Departments) -> Self {
        Self::new(departments, BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> LineCommands<R> {
    pub fn new(departments: Departments, input: R) -> Self {
        Self { departments, input }
    }
}

impl<R: AsyncBufRead + Unpin> CommandSource for LineCommands<R> {
    async fn run(self, sender: Sender<TrackerEvent>, shutdown: CancellationToken) -> Result<()> {
        let mut lines = self.input.lines();
        loop {
            let line = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Ok(()),
                line = lines.next_line() => line,
            };
            let line = match line {
                Ok(v) => v,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    warn!("Skipping unreadable input line: {e}");
                    println!("Input is not valid text, ignored");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let Some(line) = line else {
                info!("Input closed");
                shutdown.cancel();
                return Ok(());
            };

            match parse_command(&line, &self.departments) {
                Ok(SessionCommand::Event(event)) => {
                    if sender.send(event).await.is_err() {
                        debug!("Tracker stopped listening for commands");
                        return Ok(());
                    }
                }
                Ok(SessionCommand::Ignored) => debug!("Ignoring {line:?}"),
                Ok(SessionCommand::Help) => println!("{HELP}"),
                Ok(SessionCommand::Quit) => {
                    shutdown.cancel();
                    return Ok(());
                }
                Err(e) => println!("{e}"),
            }
        }
    }
}
