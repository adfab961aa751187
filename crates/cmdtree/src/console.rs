//! Output and input channels handed to the pipeline and to handlers.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, MutexGuard};

type SharedWrite = Arc<Mutex<Box<dyn Write + Send>>>;
type SharedRead = Arc<Mutex<Box<dyn BufRead + Send>>>;

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cloneable handle to an output channel, an error channel and an input channel.
///
/// Write failures are ignored: a closed stdout must not turn a successful
/// command into a failed one.
#[derive(Clone)]
pub struct Console {
    out: SharedWrite,
    err: SharedWrite,
    input: SharedRead,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

impl Console {
    pub fn new(
        out: impl Write + Send + 'static,
        err: impl Write + Send + 'static,
        input: impl BufRead + Send + 'static,
    ) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
            err: Arc::new(Mutex::new(Box::new(err))),
            input: Arc::new(Mutex::new(Box::new(input))),
        }
    }

    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr(), io::BufReader::new(io::stdin()))
    }

    /// A console writing into memory and reading from `input`.
    pub fn capture(input: &str) -> (Self, Capture) {
        let capture = Capture::default();
        let console = Self::new(
            CaptureWriter {
                own: Arc::clone(&capture.out),
                all: Arc::clone(&capture.all),
            },
            CaptureWriter {
                own: Arc::clone(&capture.err),
                all: Arc::clone(&capture.all),
            },
            io::Cursor::new(input.as_bytes().to_vec()),
        );
        (console, capture)
    }

    pub fn out(&self, text: &str) {
        let mut w = lock(&self.out);
        let _ = w.write_all(text.as_bytes());
        let _ = w.flush();
    }

    pub fn outln(&self, text: &str) {
        let mut w = lock(&self.out);
        let _ = w.write_all(text.as_bytes());
        let _ = w.write_all(b"\n");
        let _ = w.flush();
    }

    pub fn err(&self, text: &str) {
        let mut w = lock(&self.err);
        let _ = w.write_all(text.as_bytes());
        let _ = w.flush();
    }

    pub fn errln(&self, text: &str) {
        let mut w = lock(&self.err);
        let _ = w.write_all(text.as_bytes());
        let _ = w.write_all(b"\n");
        let _ = w.flush();
    }

    /// Next input line without its line terminator; `None` at end of input.
    pub fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        match lock(&self.input).read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(trimmed);
                Some(line)
            }
        }
    }
}

/// Text written to a [`Console::capture`] console.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    out: Arc<Mutex<Vec<u8>>>,
    err: Arc<Mutex<Vec<u8>>>,
    all: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    pub fn out(&self) -> String {
        String::from_utf8_lossy(&lock(&self.out)).into_owned()
    }

    pub fn err(&self) -> String {
        String::from_utf8_lossy(&lock(&self.err)).into_owned()
    }

    /// Output and error text interleaved in write order.
    pub fn all(&self) -> String {
        String::from_utf8_lossy(&lock(&self.all)).into_owned()
    }
}

struct CaptureWriter {
    own: Arc<Mutex<Vec<u8>>>,
    all: Arc<Mutex<Vec<u8>>>,
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.own).extend_from_slice(buf);
        lock(&self.all).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
