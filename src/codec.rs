// Codec for the staff chat line protocol
// Handles the format: <utf-8 text>\n

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::ChatError;

pub struct ChatCodec {
    // Index already scanned for a newline, so partial lines are not rescanned
    next_index: usize,
    max_length: usize,
}

impl Default for ChatCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatCodec {
    pub fn new() -> Self {
        Self::with_max_length(crate::settings::SETTINGS.max_line_length)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            next_index: 0,
            max_length,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

fn line_to_string(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    // Malformed UTF-8 is replaced rather than rejected
    String::from_utf8_lossy(bytes).into_owned()
}

impl Decoder for ChatCodec {
    type Item = String;
    type Error = ChatError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Look for a newline past what we already scanned
        if let Some(offset) = buf[self.next_index..].iter().position(|&b| b == b'\n') {
            let newline_pos = self.next_index + offset;
            self.next_index = 0;
            if newline_pos > self.max_length {
                return Err(ChatError::LineTooLong(self.max_length));
            }
            let line = buf.split_to(newline_pos + 1);
            return Ok(Some(line_to_string(&line[..line.len() - 1])));
        }

        if buf.len() > self.max_length {
            return Err(ChatError::LineTooLong(self.max_length));
        }

        // Not enough data for a full line
        self.next_index = buf.len();
        Ok(None)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        self.next_index = 0;
        if buf.is_empty() {
            return Ok(None);
        }
        // Trailing text without a newline still counts as a line
        let rest = buf.split_to(buf.len());
        Ok(Some(line_to_string(&rest)))
    }
}

impl<T: AsRef<str>> Encoder<T> for ChatCodec {
    type Error = ChatError;

    fn encode(&mut self, line: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = line.as_ref();
        if line.len() > self.max_length {
            return Err(ChatError::LineTooLong(self.max_length));
        }
        dst.reserve(line.len() + 1);
        dst.put(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
