// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::io;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::Event;

const PLAY: &str = "play";
const START: &str = "start";
const STOP: &str = "stop";
const RESET: &str = "reset";
const TEMPO: &str = "tempo";
const SIGNATURE: &str = "sig";
const TOGGLE: &str = "toggle";
const PAINT: &str = "paint";
const HOLD: &str = "hold";
const RELEASE: &str = "release";
const SHOW: &str = "show";

/// A controller that drives the sequencer from lines typed on the keyboard.
/// An empty line is the same as "play", like tapping the space bar.
/// Rows and steps are numbered from 1.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Reads and handles one line. Returns false once the input is exhausted.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Command ({}, {}, {}, {}, {} <bpm>, {} <signature>, {} <row> <step>, {} <row> <from> <to>, {}, {}, {}): ",
            PLAY, START, STOP, RESET, TEMPO, SIGNATURE, TOGGLE, PAINT, HOLD, RELEASE, SHOW,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        match parse(&input) {
            Some(event) => events_tx
                .blocking_send(event)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
            None => warn!(input = input.trim(), "Unrecognized input"),
        }
        Ok(true)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Driver::new()
    }
}

/// Parses a line of input into an event.
fn parse(input: &str) -> Option<Event> {
    let lowered = input.trim().to_lowercase();
    let mut words = lowered.split_whitespace();
    let Some(command) = words.next() else {
        return Some(Event::Play);
    };
    let args: Vec<&str> = words.collect();

    match (command, args.as_slice()) {
        (PLAY, []) => Some(Event::Play),
        (START, []) => Some(Event::Start),
        (STOP, []) => Some(Event::Stop),
        (RESET, []) => Some(Event::Reset),
        (HOLD, []) => Some(Event::Hold),
        (RELEASE, []) => Some(Event::Release),
        (SHOW, []) => Some(Event::Show),
        (TEMPO, [bpm]) => Some(Event::Tempo(bpm.to_string())),
        (SIGNATURE, [id]) => Some(Event::Signature(id.to_string())),
        (TOGGLE, [row, col]) => Some(Event::Toggle {
            row: index(row)?,
            col: index(col)?,
        }),
        (PAINT, [row, from, to]) => Some(Event::Paint {
            row: index(row)?,
            from: index(from)?,
            to: index(to)?,
        }),
        _ => None,
    }
}

/// Converts a 1-based number to an index.
fn index(value: &str) -> Option<usize> {
    value.parse::<usize>().ok()?.checked_sub(1)
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}

            info!("Keyboard input closed.");
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader, BufWriter};

    use tokio::sync::mpsc;

    use super::*;

    fn get_event(event: &str) -> Result<Option<Event>, io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Event>(1);

        let line = format!("{event}\n");
        let reader = BufReader::new(line.as_bytes());
        let writer = BufWriter::new(Vec::new());
        assert!(Driver::monitor_io(&sender, reader, writer)?);

        // Force the sender to close.
        drop(sender);
        Ok(receiver.blocking_recv())
    }

    #[test]
    fn test_keyboard_events() -> Result<(), io::Error> {
        assert_eq!(Some(Event::Play), get_event(PLAY)?);
        assert_eq!(Some(Event::Play), get_event("")?);
        assert_eq!(Some(Event::Start), get_event(START)?);
        assert_eq!(Some(Event::Stop), get_event("  STOP ")?);
        assert_eq!(Some(Event::Reset), get_event(RESET)?);
        assert_eq!(Some(Event::Hold), get_event(HOLD)?);
        assert_eq!(Some(Event::Release), get_event(RELEASE)?);
        assert_eq!(Some(Event::Show), get_event(SHOW)?);
        assert_eq!(
            Some(Event::Tempo("140".to_string())),
            get_event("tempo 140")?
        );
        assert_eq!(
            Some(Event::Signature("7/8".to_string())),
            get_event("sig 7/8")?
        );
        assert_eq!(
            Some(Event::Toggle { row: 0, col: 15 }),
            get_event("toggle 1 16")?
        );
        assert_eq!(
            Some(Event::Paint {
                row: 1,
                from: 0,
                to: 7
            }),
            get_event("paint 2 1 8")?
        );
        Ok(())
    }

    #[test]
    fn test_unrecognized_input() -> Result<(), io::Error> {
        assert_eq!(None, get_event("unrecognized")?);
        assert_eq!(None, get_event("toggle 0 1")?);
        assert_eq!(None, get_event("toggle one two")?);
        assert_eq!(None, get_event("tempo")?);
        assert_eq!(None, get_event("play now")?);
        Ok(())
    }

    #[test]
    fn test_end_of_input() -> Result<(), io::Error> {
        let (sender, _receiver) = mpsc::channel::<Event>(1);
        let reader = BufReader::new(&b""[..]);
        assert!(!Driver::monitor_io(&sender, reader, io::sink())?);
        Ok(())
    }
}
