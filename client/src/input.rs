//! Line-based keyboard input
//!
//! Stdin is read on a dedicated OS thread, since a blocking read would stall
//! the async runtime. Completed lines are pushed into a channel that the
//! network loop consumes. The reader never touches game state.

use log::{error, warn};
use shared::MAX_NAME_LEN;
use std::io::BufRead;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuessInputError {
    #[error("Invalid input: {0:?} is not a whole number.")]
    NotANumber(String),
    #[error("Invalid input: pick a number between 1 and {upper_bound}.")]
    OutOfRange { upper_bound: i32 },
}

/// Parses a typed guess and checks it against `[1, upper_bound]`
pub fn parse_guess(line: &str, upper_bound: i32) -> Result<i32, GuessInputError> {
    let trimmed = line.trim();
    let value: i32 = trimmed
        .parse()
        .map_err(|_| GuessInputError::NotANumber(trimmed.to_string()))?;

    if (1..=upper_bound).contains(&value) {
        Ok(value)
    } else {
        Err(GuessInputError::OutOfRange { upper_bound })
    }
}

/// Trims a display name and cuts it to [`MAX_NAME_LEN`] characters
pub fn clean_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() > MAX_NAME_LEN {
        warn!("Name is longer than {} characters, truncating", MAX_NAME_LEN);
    }
    trimmed.chars().take(MAX_NAME_LEN).collect()
}

/// Starts a thread forwarding lines from `reader` into a channel.
///
/// The channel closes when the reader hits end of input or fails.
pub fn spawn_line_reader<R>(reader: R, capacity: usize) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity);

    std::thread::spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_guess_accepts_range() {
        assert_eq!(parse_guess("1", 100), Ok(1));
        assert_eq!(parse_guess("100", 100), Ok(100));
        assert_eq!(parse_guess("  73\n", 100), Ok(73));
    }

    #[test]
    fn test_parse_guess_rejects_out_of_range() {
        assert_eq!(
            parse_guess("0", 100),
            Err(GuessInputError::OutOfRange { upper_bound: 100 })
        );
        assert_eq!(
            parse_guess("-4", 100),
            Err(GuessInputError::OutOfRange { upper_bound: 100 })
        );
        assert_eq!(
            parse_guess("101", 100),
            Err(GuessInputError::OutOfRange { upper_bound: 100 })
        );
    }

    #[test]
    fn test_parse_guess_rejects_garbage() {
        assert_eq!(
            parse_guess("abc", 100),
            Err(GuessInputError::NotANumber("abc".to_string()))
        );
        tokio_test::assert_err!(parse_guess("", 100));
        tokio_test::assert_err!(parse_guess("4.5", 100));
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  Ann \n"), "Ann");
        assert_eq!(clean_name(&"é".repeat(100)), "é".repeat(MAX_NAME_LEN));
        assert_eq!(clean_name("   "), "");
    }

    #[tokio::test]
    async fn test_line_reader_forwards_lines_then_closes() {
        let mut lines = spawn_line_reader(Cursor::new("Ann\n42\n"), 4);

        assert_eq!(lines.recv().await.as_deref(), Some("Ann"));
        assert_eq!(lines.recv().await.as_deref(), Some("42"));
        assert_eq!(lines.recv().await, None);
    }
}
