//! The channel between the event thread and an intake.
//!
//! Lines typed by the user travel through a bounded pipe to the intake's
//! thread, which reads them with `std::io::BufRead`. Whatever the intake
//! prints goes the other way through an unbounded channel so that printing
//! never stalls the event thread, which drains it onto the screen.
use crossbeam_channel::{self, Receiver, Sender, TrySendError};
use failure::Fail;
use std::io::{self, BufRead, Read, Write};
use std::time::Duration;

pub const DEFAULT_PIPE_CAPACITY: usize = 64;

#[derive(Debug, Fail)]
pub enum ChannelError {
    #[fail(display = "the input pipe must hold at least one line")]
    ZeroCapacity,
}

/// A line `try_post_line` could not send. The line is handed back.
#[derive(Debug, Fail)]
pub enum PostError {
    #[fail(display = "the input pipe is full")]
    Full(String),
    #[fail(display = "nothing reads the input pipe anymore")]
    Disconnected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Out,
    Err,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: Stream,
    pub text: String,
}

/// A write sink whose contents show up on the output surface.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    stream: Stream,
    tx: Sender<OutputChunk>,
}

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let chunk = OutputChunk {
            stream: self.stream,
            text: String::from_utf8_lossy(buf).into_owned(),
        };

        self.tx
            .send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "the output surface is gone"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The event-thread end of the intake's output.
#[derive(Debug)]
pub struct OutputSurface {
    rx: Receiver<OutputChunk>,
}

impl OutputSurface {
    /// Everything printed so far. Never blocks.
    pub fn drain(&self) -> Vec<OutputChunk> {
        self.rx.try_iter().collect()
    }

    /// Waits up to `timeout` for the next chunk.
    pub fn next_timeout(&self, timeout: Duration) -> Option<OutputChunk> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// The intake's end of the input pipe. Reaches end of file once the writer
/// is closed. Dropping it disconnects the pipe.
#[derive(Debug)]
pub struct InputReader {
    rx: Receiver<Vec<u8>>,
    chunk: Vec<u8>,
    pos: usize,
}

impl Read for InputReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let len = available.len().min(buf.len());
        buf[..len].copy_from_slice(&available[..len]);
        self.consume(len);
        Ok(len)
    }
}

impl BufRead for InputReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.chunk.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                // The writer is closed.
                Err(_) => return Ok(&[]),
            }
        }

        Ok(&self.chunk[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.chunk.len());
    }
}

/// The event-thread end of the input pipe.
#[derive(Debug)]
pub struct InputWriter {
    tx: Option<Sender<Vec<u8>>>,
    echo: OutputWriter,
}

fn sender(tx: &Option<Sender<Vec<u8>>>) -> &Sender<Vec<u8>> {
    match tx {
        Some(tx) => tx,
        None => panic!("a line was written to the input pipe after it was closed"),
    }
}

impl InputWriter {
    /// A writer with no pipe behind it. Posting to it panics.
    pub fn closed(echo: OutputWriter) -> InputWriter {
        InputWriter { tx: None, echo }
    }

    /// Sends a typed line to the intake and echoes it to the output. Blocks
    /// while the pipe is full, so only call this from the event thread if
    /// the intake is known to drain it.
    ///
    /// Panics if the pipe is closed or nobody reads it anymore.
    pub fn post_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }

        let tx = sender(&self.tx);
        let line = format!("{}\n", line);
        self.echo.write_all(line.as_bytes()).ok();
        if tx.send(line.into_bytes()).is_err() {
            error!("the input pipe is broken");
            panic!("the input pipe is broken: nothing reads it anymore");
        }
    }

    /// Like `post_line` but never blocks, and reports a reader that went
    /// away instead of panicking.
    pub fn try_post_line(&mut self, line: &str) -> Result<(), PostError> {
        if line.is_empty() {
            return Ok(());
        }

        let tx = sender(&self.tx);
        let bytes = format!("{}\n", line).into_bytes();
        match tx.try_send(bytes.clone()) {
            Ok(()) => {
                self.echo.write_all(&bytes).ok();
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(PostError::Full(line.to_owned())),
            Err(TrySendError::Disconnected(_)) => {
                warn!("the input pipe is broken");
                Err(PostError::Disconnected(line.to_owned()))
            }
        }
    }

    /// Readers see end of file once they have read what is already queued.
    pub fn close(&mut self) {
        self.tx = None;
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }
}

/// The streams handed to an intake.
#[derive(Debug)]
pub struct Io {
    pub out: OutputWriter,
    pub err: OutputWriter,
    pub input: InputReader,
}

/// The writing ends of the output channel, kept by the event thread to build
/// an `Io` for every submission.
#[derive(Debug, Clone)]
pub struct OutputWriters {
    pub out: OutputWriter,
    pub err: OutputWriter,
}

pub fn output_channel() -> (OutputWriters, OutputSurface) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let writers = OutputWriters {
        out: OutputWriter {
            stream: Stream::Out,
            tx: tx.clone(),
        },
        err: OutputWriter {
            stream: Stream::Err,
            tx,
        },
    };

    (writers, OutputSurface { rx })
}

/// Creates an input pipe holding up to `capacity` lines. Posted lines are
/// echoed to `echo`.
pub fn input_pipe(capacity: usize, echo: OutputWriter) -> Result<(InputWriter, InputReader), ChannelError> {
    if capacity == 0 {
        return Err(ChannelError::ZeroCapacity);
    }

    Ok(bounded_pipe(capacity, echo))
}

/// `capacity` must not be zero.
pub(crate) fn bounded_pipe(capacity: usize, echo: OutputWriter) -> (InputWriter, InputReader) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    let reader = InputReader {
        rx,
        chunk: Vec::new(),
        pos: 0,
    };

    (InputWriter { tx: Some(tx), echo }, reader)
}

/// Creates an input pipe and an output channel wired together.
pub fn pipe(capacity: usize) -> Result<(Io, InputWriter, OutputSurface), ChannelError> {
    let (writers, surface) = output_channel();
    let (writer, input) = input_pipe(capacity, writers.out.clone())?;
    let io = Io {
        out: writers.out,
        err: writers.err,
        input,
    };

    Ok((io, writer, surface))
}
