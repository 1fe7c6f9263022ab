//! JSON-lines event source.
//!
//! One JSON object per line; values may be numbers, arrays of numbers, or
//! strings. The reader surfaces malformed lines as per-line errors instead
//! of aborting, so one corrupt record cannot discard a whole shard — the
//! caller decides to skip and count it.

use crate::event::{AttrValue, Event};
use crate::utils::error::SourceError;
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Streaming reader over a JSON-lines event file
///
/// **Public** - the pipeline consumes this as `Iterator<Item = Result<Event, _>>`
pub struct EventReader<R: BufRead> {
    reader: R,
    line_no: usize,
    buffer: String,
}

impl EventReader<BufReader<File>> {
    /// Open an events file
    ///
    /// # Errors
    /// * `SourceError::Io` - the file cannot be opened
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        debug!("opening event source: {}", path.display());
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> EventReader<R> {
    /// Wrap any buffered reader (tests use in-memory strings)
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<Event, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            self.line_no += 1;
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(SourceError::Io(e))),
            }
            let line = self.buffer.trim();
            if line.is_empty() {
                continue;
            }
            return Some(parse_event_line(line, self.line_no));
        }
    }
}

fn parse_event_line(line: &str, line_no: usize) -> Result<Event, SourceError> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|source| SourceError::Json {
            line: line_no,
            source,
        })?;

    let serde_json::Value::Object(fields) = value else {
        return Err(SourceError::NotAnObject { line: line_no });
    };

    let mut event = Event::new();
    for (name, value) in fields {
        let attr = attr_from_json(&value).ok_or_else(|| SourceError::BadValue {
            line: line_no,
            name: name.clone(),
        })?;
        event.insert(name, attr);
    }
    Ok(event)
}

fn attr_from_json(value: &serde_json::Value) -> Option<AttrValue> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().map(AttrValue::Num),
        serde_json::Value::String(s) => Some(AttrValue::Str(s.clone())),
        serde_json::Value::Array(items) => {
            let mut seq = Vec::with_capacity(items.len());
            for item in items {
                seq.push(item.as_f64()?);
            }
            Some(AttrValue::NumSeq(seq))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(text: &str) -> Vec<Result<Event, SourceError>> {
        EventReader::new(Cursor::new(text.to_string())).collect()
    }

    #[test]
    fn test_reads_numbers_sequences_and_strings() {
        let events = read_all(r#"{"ht40": [250.0], "nJet40": 3, "component": "SMS-T2bb"}"#);
        assert_eq!(events.len(), 1);
        let event = events[0].as_ref().unwrap();
        assert_eq!(event.get("ht40"), Some(&AttrValue::NumSeq(vec![250.0])));
        assert_eq!(event.get("nJet40"), Some(&AttrValue::Num(3.0)));
        assert_eq!(
            event.get("component"),
            Some(&AttrValue::Str("SMS-T2bb".to_string()))
        );
    }

    #[test]
    fn test_skips_blank_lines() {
        let events = read_all("{\"x\": 1}\n\n{\"x\": 2}\n");
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.is_ok()));
    }

    #[test]
    fn test_malformed_line_is_one_error_not_the_end() {
        let events = read_all("{\"x\": 1}\nnot json\n{\"x\": 3}\n");
        assert_eq!(events.len(), 3);
        assert!(events[0].is_ok());
        assert!(matches!(events[1], Err(SourceError::Json { line: 2, .. })));
        assert!(events[2].is_ok());
    }

    #[test]
    fn test_non_object_line_rejected() {
        let events = read_all("[1, 2, 3]\n");
        assert!(matches!(events[0], Err(SourceError::NotAnObject { line: 1 })));
    }

    #[test]
    fn test_unsupported_value_rejected() {
        let events = read_all(r#"{"x": {"nested": true}}"#);
        assert!(matches!(
            events[0],
            Err(SourceError::BadValue { line: 1, .. })
        ));
    }
}
