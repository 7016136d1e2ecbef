use std::io::{self, Read, Write};

/// The byte-stream side of `in_char`/`in_number`/`out_char`/`out_number`,
/// pulled behind a trait so the opcode executor can be driven by something
/// other than a real terminal in tests.
pub trait PietIo {
    /// Read one raw byte. Byte-level, not code-point: a multi-byte UTF-8
    /// character is read and pushed one byte at a time. `Ok(None)` on EOF.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Write a decimal integer with no added separators.
    fn write_number(&mut self, text: &str) -> io::Result<()>;

    /// Write one Unicode scalar value with no added separators.
    fn write_char(&mut self, c: char) -> io::Result<()>;
}

/// The real terminal/pipe I/O `pieti` runs against.
pub struct StdIo {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl StdIo {
    pub fn new() -> Self {
        StdIo { stdin: io::stdin(), stdout: io::stdout() }
    }
}

impl Default for StdIo {
    fn default() -> Self {
        Self::new()
    }
}

impl PietIo for StdIo {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.stdin.lock().read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }

    fn write_number(&mut self, text: &str) -> io::Result<()> {
        write!(self.stdout.lock(), "{text}")
    }

    fn write_char(&mut self, c: char) -> io::Result<()> {
        write!(self.stdout.lock(), "{c}")
    }
}

/// An in-memory `PietIo` for deterministic opcode tests: bytes are consumed
/// off the front of `input`, and everything written lands in `output`.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct FakeIo {
    pub input: std::collections::VecDeque<u8>,
    pub output: String,
}

#[cfg(test)]
impl FakeIo {
    pub(crate) fn with_input(bytes: &[u8]) -> Self {
        FakeIo { input: bytes.iter().copied().collect(), output: String::new() }
    }
}

#[cfg(test)]
impl PietIo for FakeIo {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input.pop_front())
    }

    fn write_number(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        Ok(())
    }

    fn write_char(&mut self, c: char) -> io::Result<()> {
        self.output.push(c);
        Ok(())
    }
}
