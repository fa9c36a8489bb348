//! Framing for single-object JSON messages.

use std::io::{self, BufReader, Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::error::Category as JsonCategory;
use thiserror::Error;

/// Largest message accepted by [`read_message`].
pub const MAX_MESSAGE_BYTES: u64 = 1024 * 1024;

/// Errors raised while encoding or decoding a message.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The peer closed the stream part way through a message, or the message
    /// exceeded [`MAX_MESSAGE_BYTES`].
    #[error("connection closed before a complete message was received")]
    Truncated,
    /// The bytes received were not a valid message.
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
    /// Reading or writing the underlying stream failed.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// The message could not be serialised.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

impl CodecError {
    fn from_decode(error: serde_json::Error) -> Self {
        match error.classify() {
            JsonCategory::Eof => Self::Truncated,
            JsonCategory::Io => Self::Io(io::Error::from(error)),
            JsonCategory::Syntax | JsonCategory::Data => Self::Malformed(error),
        }
    }
}

/// Serialises a message to its wire representation.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(message).map_err(CodecError::Encode)
}

/// Writes one message and flushes the stream.
///
/// # Errors
///
/// Returns an error if serialisation or writing fails.
pub fn write_message<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<(), CodecError> {
    let bytes = encode(message)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Reads exactly one message from the stream.
///
/// Returns `Ok(None)` when the peer closes the stream without sending
/// anything but whitespace. Reading stops at the closing brace of the first
/// object, so the peer does not need to close its side first.
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] for a partial message,
/// [`CodecError::Malformed`] for invalid JSON or schema mismatches, and
/// [`CodecError::Io`] for transport failures including timeouts.
pub fn read_message<R: Read, T: DeserializeOwned>(reader: R) -> Result<Option<T>, CodecError> {
    let limited = BufReader::new(reader.take(MAX_MESSAGE_BYTES));
    let mut messages = serde_json::Deserializer::from_reader(limited).into_iter::<T>();
    match messages.next() {
        None => Ok(None),
        Some(Ok(message)) => Ok(Some(message)),
        Some(Err(error)) => Err(CodecError::from_decode(error)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::{Request, Response};

    #[test]
    fn encoded_messages_have_no_trailing_newline() {
        let bytes = encode(&Response::success()).expect("encode");
        assert_eq!(bytes.last(), Some(&b'}'));
    }

    #[test]
    fn reads_first_object_and_ignores_the_rest() {
        let input = br#"{"data":"one"} {"data":"two"}"#;
        let response: Response = read_message(Cursor::new(&input[..]))
            .expect("read")
            .expect("message present");
        assert_eq!(response.as_text(), Some("one"));
    }

    #[test]
    fn empty_stream_yields_none() {
        let result: Option<Value> = read_message(Cursor::new(&b"  \n"[..])).expect("read");
        assert!(result.is_none());
    }

    #[test]
    fn partial_object_is_truncated() {
        let result = read_message::<_, Value>(Cursor::new(&br#"{"ctype":"dev"#[..]));
        assert!(matches!(result, Err(CodecError::Truncated)));
    }

    #[rstest]
    #[case::not_json(&b"not json"[..])]
    #[case::missing_fields(&br#"{"itype":"usb"}"#[..])]
    fn invalid_requests_are_malformed(#[case] input: &[u8]) {
        let result = read_message::<_, Request>(Cursor::new(input));
        assert!(matches!(result, Err(CodecError::Malformed(_))), "{result:?}");
    }

    #[test]
    fn write_then_read_preserves_payload() {
        let mut buffer = Vec::new();
        let response = Response::from_value(json!(["COM3", "COM7"]));
        write_message(&mut buffer, &response).expect("write");
        let decoded: Response = read_message(Cursor::new(buffer))
            .expect("read")
            .expect("message present");
        assert_eq!(decoded, response);
    }
}
