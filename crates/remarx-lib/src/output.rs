use std::io::{Cursor, Read, Stderr, Stdin, Stdout, Write};

/// Streams of a `remarx` command.
///
/// Result summaries such as `Found N quote pairs` go to stdout and
/// warnings to stderr. `evaluate -` reads its ground-truth table from stdin.
pub trait ConsoleIO<IN: Read, OUT: Write, ERR: Write> {
    fn stdin(&mut self) -> &mut IN;
    fn stdout(&mut self) -> &mut OUT;
    fn stderr(&mut self) -> &mut ERR;
}

/// Streams of the running `remarx` binary.
pub struct StdIO {
    stdin: Stdin,
    stdout: Stdout,
    stderr: Stderr,
}

impl StdIO {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stdin: std::io::stdin(),
            stdout: std::io::stdout(),
            stderr: std::io::stderr(),
        }
    }
}

impl Default for StdIO {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleIO<Stdin, Stdout, Stderr> for StdIO {
    fn stdin(&mut self) -> &mut Stdin {
        &mut self.stdin
    }

    fn stdout(&mut self) -> &mut Stdout {
        &mut self.stdout
    }

    fn stderr(&mut self) -> &mut Stderr {
        &mut self.stderr
    }
}

/// Captures command output in memory and serves a fixed ground-truth
/// table on stdin.
#[derive(Default)]
pub struct BufferedIO {
    stdin: Cursor<Vec<u8>>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl BufferedIO {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `input` (typically a `reuse_id,original_id` table) on stdin.
    #[must_use]
    pub fn with_stdin(input: impl Into<Vec<u8>>) -> Self {
        Self {
            stdin: Cursor::new(input.into()),
            ..Self::default()
        }
    }

    pub fn stdout_to_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_to_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

impl ConsoleIO<Cursor<Vec<u8>>, Vec<u8>, Vec<u8>> for BufferedIO {
    fn stdin(&mut self) -> &mut Cursor<Vec<u8>> {
        &mut self.stdin
    }

    fn stdout(&mut self) -> &mut Vec<u8> {
        &mut self.stdout
    }

    fn stderr(&mut self) -> &mut Vec<u8> {
        &mut self.stderr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_io_keeps_streams_apart() {
        let mut io = BufferedIO::new();
        writeln!(io.stdout(), "Found 3 quote pairs").unwrap();
        writeln!(io.stderr(), "warning").unwrap();
        assert_eq!(io.stdout_to_string(), "Found 3 quote pairs\n");
        assert_eq!(io.stderr_to_string(), "warning\n");
    }

    #[test]
    fn buffered_io_replays_stdin() {
        let mut io = BufferedIO::with_stdin("reuse_id,original_id\nr1,o1\n");
        let mut input = String::new();
        io.stdin().read_to_string(&mut input).unwrap();
        assert_eq!(input, "reuse_id,original_id\nr1,o1\n");
        assert!(io.stdout_to_string().is_empty());
    }
}
