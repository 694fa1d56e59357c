//! Raw BLE message log.
//!
//! When enabled, every inbound frame is appended to a per-day file in the
//! configured directory:
//!
//! ```text
//! <dir>/<device>_<YYYYMMDD>_ble_messages.log
//! ```
//!
//! Each line carries a millisecond timestamp, the classified kind, the hex
//! dump and a printable rendering of the payload. Writes happen on a
//! background task so the notification path never blocks on disk I/O.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{Local, NaiveDate, NaiveDateTime};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::protocol::MessageKind;

/// Column the printable rendering starts at.
const STRING_COLUMN: usize = 75;

/// Minimum gap between the hex dump and the printable rendering.
const MIN_PADDING: usize = 2;

struct LogEntry {
    at: NaiveDateTime,
    kind: MessageKind,
    data: Bytes,
}

/// Handle to the background message log writer.
///
/// Cloning is cheap; the writer task exits once every handle is dropped and
/// the queue is drained.
#[derive(Clone)]
pub struct MessageLog {
    sender: mpsc::UnboundedSender<LogEntry>,
}

impl MessageLog {
    /// Starts a writer task appending to files in `dir`.
    ///
    /// The directory is created on the first write. Must be called from
    /// within a tokio runtime.
    #[must_use]
    pub fn spawn(dir: impl Into<PathBuf>, device_name: &str) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let dir = dir.into();
        let device = sanitize_device_name(device_name);
        tokio::spawn(run_writer(dir, device, receiver));
        Self { sender }
    }

    /// Queues a frame for the log. Never blocks.
    pub fn record(&self, kind: MessageKind, data: Bytes) {
        let entry = LogEntry {
            at: Local::now().naive_local(),
            kind,
            data,
        };
        if self.sender.send(entry).is_err() {
            tracing::debug!("message log writer has stopped, dropping {kind} frame");
        }
    }
}

async fn run_writer(dir: PathBuf, device: String, mut entries: mpsc::UnboundedReceiver<LogEntry>) {
    while let Some(entry) = entries.recv().await {
        if let Err(e) = append(&dir, &device, &entry).await {
            tracing::error!("failed to save BLE message to file: {e}");
        }
    }
    tracing::debug!("message log writer stopped");
}

async fn append(dir: &Path, device: &str, entry: &LogEntry) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name(device, entry.at.date()));
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await?;
    let line = format_line(entry.at, entry.kind, &entry.data);
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

/// Replaces every character that is not alphanumeric, `-` or `_` with `_`.
#[must_use]
pub fn sanitize_device_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Returns the log file name for a sanitised device name and day.
#[must_use]
pub fn file_name(device: &str, day: NaiveDate) -> String {
    format!("{device}_{}_ble_messages.log", day.format("%Y%m%d"))
}

/// Formats one log line, including the trailing newline.
#[must_use]
pub fn format_line(at: NaiveDateTime, kind: MessageKind, data: &[u8]) -> String {
    let mut line = format!(
        "[{}] Type: {kind:20} Hex: {}",
        at.format("%Y-%m-%d %H:%M:%S%.3f"),
        hex::encode(data)
    );
    let padding = STRING_COLUMN
        .saturating_sub(line.chars().count())
        .max(MIN_PADDING);
    line.extend(std::iter::repeat_n(' ', padding));
    line.push_str("String: ");
    line.push_str(&printable(data));
    line.push('\n');
    line
}

/// Decodes lossily as UTF-8 and escapes non-printable characters as `\xNN`.
fn printable(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    for c in String::from_utf8_lossy(data).chars() {
        if c == ' ' || !(c.is_control() || c.is_whitespace()) {
            out.push(c);
        } else {
            let _ = write!(out, "\\x{:02x}", u32::from(c));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_milli_opt(14, 5, 7, 42)
            .unwrap()
    }

    #[test]
    fn test_sanitize_device_name() {
        assert_eq!(sanitize_device_name("My iWoc/One"), "My_iWoc_One");
        assert_eq!(sanitize_device_name("bike-01_a"), "bike-01_a");
        assert_eq!(sanitize_device_name("unknown_device"), "unknown_device");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name("My_iWoc", at().date()),
            "My_iWoc_20240309_ble_messages.log"
        );
    }

    #[test]
    fn test_format_line_pads_to_column() {
        let line = format_line(at(), MessageKind::Vin, b"$S$V#@");
        let prefix = "[2024-03-09 14:05:07.042] Type: vin                  Hex: 245324562340";
        assert!(line.starts_with(prefix), "{line}");
        assert_eq!(line.find("String: "), Some(STRING_COLUMN));
        assert!(line.ends_with("String: $S$V#@\n"));
    }

    #[test]
    fn test_format_line_long_hex_keeps_min_gap() {
        let frame = hex::decode("2462245a230193541700000877071a27342340").unwrap();
        let line = format_line(at(), MessageKind::Battery, &frame);
        assert!(line.contains("2340  String: "), "{line}");
    }

    #[test]
    fn test_printable_escapes_control_bytes() {
        assert_eq!(printable(&[b'$', b'b', 0x01, b'#', b'@']), "$b\\x01#@");
        assert_eq!(printable(b"a\tb"), "a\\x09b");
        assert_eq!(printable(&[0xff]), "\u{fffd}");
    }

    #[tokio::test]
    async fn test_message_log_appends() {
        let dir = std::env::temp_dir().join(format!("ble-log-test-{}", std::process::id()));
        let log = MessageLog::spawn(&dir, "Test Bike");
        log.record(MessageKind::Protocol, Bytes::from_static(b"$s$P#1.02#@"));
        log.record(MessageKind::Unknown, Bytes::from_static(b"hello"));
        drop(log);

        let path = dir.join(file_name("Test_Bike", Local::now().date_naive()));
        let mut contents = String::new();
        for _ in 0..50 {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            contents = tokio::fs::read_to_string(&path).await.unwrap_or_default();
            if contents.lines().count() == 2 {
                break;
            }
        }
        let _ = tokio::fs::remove_dir_all(&dir).await;

        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2, "{contents}");
        assert!(lines[0].contains("Type: protocol "));
        assert!(lines[0].ends_with("String: $s$P#1.02#@"));
        assert!(lines[1].contains("Type: unknown "));
    }
}
