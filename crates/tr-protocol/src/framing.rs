//! Byte stream to command lines.

use tracing::warn;

/// Longest accepted command, in bytes, excluding the terminator.
pub const MAX_COMMAND_LEN: usize = 1024;

/// One unit of framed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete, non-empty command line without its terminator.
    Line(String),
    /// The current command exceeded [`MAX_COMMAND_LEN`] and was discarded.
    Overflow,
}

/// Accumulates bytes until `\n` or `\r`.
///
/// Empty lines are skipped, so `\r\n` terminates a single command. After an
/// overflow everything up to the next `\n` is dropped.
#[derive(Debug, Clone, Default)]
pub struct LineAssembler {
    buf: Vec<u8>,
    discarding: bool,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(MAX_COMMAND_LEN),
            discarding: false,
        }
    }

    /// Bytes buffered for the command in progress.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        if self.discarding {
            if byte == b'\n' {
                self.discarding = false;
            }
            return None;
        }

        match byte {
            b'\n' | b'\r' => {
                if self.buf.is_empty() {
                    return None;
                }
                let line = String::from_utf8_lossy(&self.buf).into_owned();
                self.buf.clear();
                Some(Frame::Line(line))
            }
            _ if self.buf.len() >= MAX_COMMAND_LEN => {
                warn!(limit = MAX_COMMAND_LEN, "command too long, discarding until newline");
                self.buf.clear();
                self.discarding = true;
                Some(Frame::Overflow)
            }
            _ => {
                self.buf.push(byte);
                None
            }
        }
    }

    /// Push every byte of `input`, collecting completed frames.
    pub fn feed(&mut self, input: &[u8]) -> Vec<Frame> {
        input.iter().filter_map(|&b| self.push(b)).collect()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn buffer_never_exceeds_limit(input in prop::collection::vec(any::<u8>(), 0..4096)) {
            let mut asm = LineAssembler::new();
            for b in input {
                if let Some(Frame::Line(l)) = asm.push(b) {
                    prop_assert!(!l.is_empty());
                    prop_assert!(l.len() <= MAX_COMMAND_LEN * 3);
                }
                prop_assert!(asm.pending() <= MAX_COMMAND_LEN);
            }
        }
    }
}
