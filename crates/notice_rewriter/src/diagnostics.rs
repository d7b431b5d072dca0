use std::borrow::Cow;
use std::fmt;

/// Budget applied to diagnostic text when no other limit is configured.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 100;

const ELISION: &str = "...";

/// Removes the middle of an over-long message.
///
/// Messages of at most `max_len` bytes are returned unchanged. Longer messages
/// keep their first and last `max_len / 2` bytes around a `...` marker. Cut
/// points are moved inward to the nearest UTF-8 character boundary, so the
/// result may be slightly shorter than the budget.
pub fn trim_message(message: &str, max_len: usize) -> Cow<'_, str> {
    if message.len() <= max_len {
        return Cow::Borrowed(message);
    }

    let half = max_len / 2;
    let mut head_end = half;
    while !message.is_char_boundary(head_end) {
        head_end -= 1;
    }
    let mut tail_start = message.len() - half;
    while !message.is_char_boundary(tail_start) {
        tail_start += 1;
    }

    let mut trimmed = String::with_capacity(head_end + ELISION.len() + half);
    trimmed.push_str(&message[..head_end]);
    trimmed.push_str(ELISION);
    trimmed.push_str(&message[tail_start..]);
    Cow::Owned(trimmed)
}

/// Displays an error through [`trim_message`].
#[derive(Debug)]
pub struct TrimmedError<'a, E: ?Sized> {
    error: &'a E,
    max_len: usize,
}

impl<'a, E: fmt::Display + ?Sized> TrimmedError<'a, E> {
    pub fn new(error: &'a E) -> Self {
        Self::with_limit(error, DEFAULT_MAX_MESSAGE_BYTES)
    }

    pub fn with_limit(error: &'a E, max_len: usize) -> Self {
        Self { error, max_len }
    }
}

impl<E: fmt::Display + ?Sized> fmt::Display for TrimmedError<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.error.to_string();
        f.write_str(&trim_message(&message, self.max_len))
    }
}
