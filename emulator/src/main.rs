//! Interactive terminal front-end for the robot core.
//!
//! Keypresses become the single-byte serial commands the real robot
//! receives over its UART; the core's notices, telemetry, and LED frames
//! come back as console lines while the simulated track scrolls under the
//! virtual sensors.

mod session;
mod track;

use std::io::{self, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use session::Session;

enum Input {
    None,
    Byte(u8),
    Quit,
}

fn main() -> io::Result<()> {
    println!("trailbot emulator — keys are command bytes:");
    println!("  S start laps, P pause, C home, X freeze, M manual, R reset, ? help");
    println!("  Y/Q attach/detach telemetry; W/A/D/B pulse in manual mode; Esc quits");

    terminal::enable_raw_mode()?;
    let outcome = run();
    terminal::disable_raw_mode()?;
    outcome
}

fn run() -> io::Result<()> {
    let mut session = Session::new();
    let mut stdout = io::stdout();

    loop {
        let input = poll_input()?;
        let byte = match input {
            Input::Quit => break,
            Input::Byte(byte) => Some(byte),
            Input::None => None,
        };

        for line in session.cycle(byte) {
            // Raw mode needs explicit carriage returns, including inside
            // the multi-line help listing.
            write!(stdout, "{}\r\n", line.replace('\n', "\r\n"))?;
        }
        stdout.flush()?;

        if session.reset_requested() {
            write!(stdout, "-- watchdog reset, fresh boot --\r\n")?;
            stdout.flush()?;
            session = Session::new();
        }
    }

    write!(stdout, "session closed in mode {:?}\r\n", session.mode())?;
    stdout.flush()?;
    Ok(())
}

/// Polls for one keypress; the timeout doubles as the control-cycle pace.
fn poll_input() -> io::Result<Input> {
    if !event::poll(Duration::from_millis(5))? {
        return Ok(Input::None);
    }
    let Event::Key(key) = event::read()? else {
        return Ok(Input::None);
    };
    if key.kind != KeyEventKind::Press {
        return Ok(Input::None);
    }
    if key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
    {
        return Ok(Input::Quit);
    }
    match key.code {
        KeyCode::Char(c) if c.is_ascii() => Ok(Input::Byte(c.to_ascii_uppercase() as u8)),
        _ => Ok(Input::None),
    }
}
