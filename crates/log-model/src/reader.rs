//! Sequential JSONL log reader.
//!
//! Yields one decoded event per non-empty, non-comment line. Decoding
//! errors are returned per item so callers can skip bad lines and keep
//! reading.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use dashsub_common::error::{DashsubError, DashsubResult};

use crate::event::LogEvent;

/// Streaming reader over a JSONL drive log.
pub struct LogReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: u64,
}

impl LogReader<BufReader<File>> {
    /// Open a log file for sequential reading.
    pub fn open(path: &Path) -> DashsubResult<Self> {
        if !path.is_file() {
            return Err(DashsubError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LogReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
        }
    }

    /// Number of physical lines consumed so far.
    pub fn lines_read(&self) -> u64 {
        self.line_no
    }
}

impl<R: BufRead> Iterator for LogReader<R> {
    type Item = DashsubResult<LogEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(DashsubError::Io(e))),
            }
            self.line_no += 1;

            // A corrupt line is skipped like any other undecodable event.
            let line = match std::str::from_utf8(&self.buf) {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(DashsubError::malformed(
                        self.line_no,
                        format!("invalid UTF-8: {e}"),
                    )))
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Some(LogEvent::from_json_line(trimmed, self.line_no));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::serialize_events;
    use std::io::Cursor;

    #[test]
    fn test_reads_events_in_order_and_skips_comments() {
        let log = "# {\"schema_version\":\"1.0\"}\n\
                   {\"t\":0,\"type\":\"carState\",\"vEgo\":1.0}\n\
                   \n\
                   {\"t\":10,\"type\":\"deviceState\"}\n\
                   {\"t\":20,\"type\":\"carState\",\"vEgo\":2.0}\n";
        let mut reader = LogReader::new(Cursor::new(log));
        let events: Vec<LogEvent> = reader.by_ref().map(Result::unwrap).collect();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], LogEvent::car_state(0, 1.0));
        assert_eq!(events[1], LogEvent::unrecognized(10, "deviceState"));
        assert_eq!(events[2], LogEvent::car_state(20, 2.0));
        assert_eq!(reader.lines_read(), 5);
    }

    #[test]
    fn test_bad_line_does_not_stop_reading() {
        let log = "{\"t\":0,\"type\":\"carState\",\"vEgo\":1.0}\n\
                   not json at all\n\
                   {\"t\":20,\"type\":\"carState\",\"vEgo\":2.0}\n";
        let results: Vec<_> = LogReader::new(Cursor::new(log)).collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(DashsubError::MalformedEvent { line, .. }) => assert_eq!(*line, 2),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_invalid_utf8_line_is_malformed() {
        let log: &[u8] = b"{\"t\":0,\"type\":\"carState\",\"vEgo\":1.0}\n\
                           {\"t\":5,\"type\":\"carState\",\"note\":\"\xff\xfe\"}\n\
                           {\"t\":10,\"type\":\"carState\",\"vEgo\":2.0}";
        let results: Vec<_> = LogReader::new(Cursor::new(log)).collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), &LogEvent::car_state(0, 1.0));
        match &results[1] {
            Err(e @ DashsubError::MalformedEvent { line, .. }) => {
                assert_eq!(*line, 2);
                assert!(e.is_recoverable());
            }
            other => panic!("unexpected: {other:?}"),
        }
        // Last line has no trailing newline.
        assert_eq!(results[2].as_ref().unwrap(), &LogEvent::car_state(10, 2.0));
    }

    #[test]
    fn test_open_file_roundtrip() {
        let dir = std::env::temp_dir().join("dashsub_test_reader");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rlog.jsonl");

        let events = vec![
            LogEvent::car_state(0, 5.0),
            LogEvent::gps(50_000_000, -23.55, -46.63, 1_705_320_000_000),
            LogEvent::car_state(100_000_000, 6.0),
        ];
        std::fs::write(&path, serialize_events(&events).unwrap()).unwrap();

        let parsed: Vec<LogEvent> = LogReader::open(&path)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(parsed, events);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_open_missing_file() {
        let path = std::env::temp_dir().join("dashsub_test_reader_missing.jsonl");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            LogReader::open(&path),
            Err(DashsubError::FileNotFound { .. })
        ));
    }
}
