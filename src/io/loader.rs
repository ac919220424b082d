//! CSV persistence for pre-generated events.
//!
//! Columns: `time,state_type,state_key,new_value,message`. `new_value` is
//! `true`/`false` for boolean state types and an integer otherwise. An
//! empty `message` is filled in from the device registry.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::home::message_for;
use crate::sim::event::{Event, StateType, StateValue};

const HEADER: [&str; 5] = ["time", "state_type", "state_key", "new_value", "message"];

/// Failure while reading an event file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("line {line}: unknown state type `{value}`")]
    UnknownStateType { line: u64, value: String },

    #[error("line {line}: `{value}` is not a valid {state_type} value")]
    InvalidValue {
        line: u64,
        state_type: StateType,
        value: String,
    },
}

#[derive(Debug, Deserialize)]
struct Row {
    time: u64,
    state_type: String,
    state_key: String,
    new_value: String,
    #[serde(default)]
    message: String,
}

/// Loads pre-generated events from a CSV file.
///
/// # Errors
///
/// Returns a [`LoadError`] naming the offending line for malformed rows.
pub fn load_events(path: &Path) -> Result<Vec<Event>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let events = read_events(io::BufReader::new(file))?;
    info!(path = %path.display(), count = events.len(), "loaded events");
    Ok(events)
}

/// Reads pre-generated events from any CSV source.
///
/// # Errors
///
/// See [`load_events`].
pub fn read_events(reader: impl Read) -> Result<Vec<Event>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut events = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);
        let row: Row = record.deserialize(Some(&headers))?;

        let state_type =
            StateType::parse(&row.state_type).ok_or_else(|| LoadError::UnknownStateType {
                line,
                value: row.state_type.clone(),
            })?;
        let new_value =
            parse_value(state_type, &row.new_value).ok_or_else(|| LoadError::InvalidValue {
                line,
                state_type,
                value: row.new_value.clone(),
            })?;
        let message = if row.message.is_empty() {
            message_for(&row.state_key, state_type, new_value)
        } else {
            row.message
        };
        events.push(Event::pregenerated(
            row.time,
            state_type,
            row.state_key,
            new_value,
            message,
        ));
    }
    Ok(events)
}

/// Saves events to a CSV file readable by [`load_events`].
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn save_events(events: &[Event], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_events(events, io::BufWriter::new(file))
}

/// Writes events as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_events(events: &[Event], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;
    for e in events {
        let value = match e.new_value {
            StateValue::Bool(b) => b.to_string(),
            StateValue::Int(i) => i.to_string(),
        };
        wtr.write_record([
            e.time.to_string().as_str(),
            e.state_type.as_str(),
            e.state_key.as_str(),
            value.as_str(),
            e.message.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn parse_value(state_type: StateType, raw: &str) -> Option<StateValue> {
    if state_type.is_integer() {
        raw.parse().ok().map(StateValue::Int)
    } else {
        match raw.to_ascii_lowercase().as_str() {
            "true" => Some(StateValue::Bool(true)),
            "false" => Some(StateValue::Bool(false)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::event::Origin;

    const SAMPLE: &str = "\
time,state_type,state_key,new_value,message
0,temp,outdoorTemp,41,Outdoor Temp is 41
0,door,frontDoor,false,
1800,door,frontDoor,TRUE,Front Door is OPEN
";

    #[test]
    fn reads_booleans_and_integers() {
        let events = read_events(SAMPLE.as_bytes()).expect("valid csv");
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].new_value, StateValue::Int(41));
        assert_eq!(events[1].message, "Front Door is CLOSED");
        assert_eq!(events[2].new_value, StateValue::Bool(true));
        assert!(events.iter().all(|e| e.origin == Origin::Pregenerated));
    }

    #[test]
    fn unknown_state_type_names_the_line() {
        let csv = "time,state_type,state_key,new_value,message\n0,garage,x,true,\n";
        let err = read_events(csv.as_bytes()).expect_err("bad type");
        assert!(matches!(err, LoadError::UnknownStateType { line: 2, .. }));
        assert!(err.to_string().contains("garage"));
    }

    #[test]
    fn value_must_match_state_type() {
        let csv = "time,state_type,state_key,new_value,message\n0,temp,outdoorTemp,true,\n";
        assert!(matches!(
            read_events(csv.as_bytes()),
            Err(LoadError::InvalidValue { state_type: StateType::Temp, .. })
        ));
    }

    #[test]
    fn negative_time_is_a_csv_error() {
        let csv = "time,state_type,state_key,new_value,message\n-5,door,frontDoor,true,\n";
        assert!(matches!(read_events(csv.as_bytes()), Err(LoadError::Csv(_))));
    }

    #[test]
    fn written_events_load_back() {
        let events = read_events(SAMPLE.as_bytes()).expect("valid csv");
        let mut buf = Vec::new();
        write_events(&events, &mut buf).expect("write to vec");
        assert_eq!(read_events(buf.as_slice()).expect("reload"), events);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_events(Path::new("/nonexistent/events.csv")).expect_err("missing");
        assert!(err.to_string().contains("/nonexistent/events.csv"));
    }
}
