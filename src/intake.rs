//! The backing application that receives submitted arguments.
use crate::io::Io;
use crate::submission::Arguments;
use std::io::{BufRead, Write};
use std::thread::{self, JoinHandle};

/// Receives the arguments of a successful submission.
///
/// Called on the event thread: anything that takes a while (including
/// reading `io.input`, which blocks until the user types a line) belongs on
/// a thread of its own. Each submission gets its own `io.input`; dropping
/// it tells the session that nothing reads the typed lines.
pub trait Intake {
    fn submit_arguments(&mut self, subcommand: &str, arguments: Arguments, io: Io);
}

impl<F> Intake for F
where
    F: FnMut(&str, Arguments, Io),
{
    fn submit_arguments(&mut self, subcommand: &str, arguments: Arguments, io: Io) {
        self(subcommand, arguments, io)
    }
}

/// Prints the arguments it receives, then echoes every input line back until
/// the input pipe is closed.
#[derive(Debug, Default)]
pub struct EchoIntake {
    threads: Vec<JoinHandle<()>>,
}

impl EchoIntake {
    pub fn new() -> EchoIntake {
        EchoIntake::default()
    }

    /// Waits for every spawned echo thread. They finish once the session
    /// closes its input writer.
    pub fn join(&mut self) {
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                error!("an echo thread panicked");
            }
        }
    }
}

fn echo(subcommand: String, arguments: Arguments, io: Io) {
    let Io {
        mut out,
        mut err,
        input,
    } = io;

    // Whole lines at a time so that they never interleave with the echo of
    // typed input. The output surface may go away first; there is nobody
    // left to tell then.
    let mut summary = format!("{}:\n", subcommand);
    for (name, value) in &arguments {
        summary.push_str(&format!("  {} = {}\n", name, value));
    }
    out.write_all(summary.as_bytes()).ok();

    for line in input.lines() {
        match line {
            Ok(line) => {
                out.write_all(format!("{}> {}\n", subcommand, line).as_bytes()).ok();
            }
            Err(e) => {
                err.write_all(format!("{}: {}\n", subcommand, e).as_bytes()).ok();
                break;
            }
        }
    }

    trace!("{}: input closed", subcommand);
}

impl Intake for EchoIntake {
    fn submit_arguments(&mut self, subcommand: &str, arguments: Arguments, io: Io) {
        let subcommand = subcommand.to_owned();
        let spawned = thread::Builder::new()
            .name(format!("intake-{}", subcommand))
            .spawn(move || echo(subcommand, arguments, io));

        match spawned {
            Ok(handle) => self.threads.push(handle),
            Err(e) => error!("failed to spawn an intake thread: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::pipe;
    use pretty_assertions::assert_eq;

    #[test]
    fn closures_are_intakes() {
        let mut seen = Vec::new();
        {
            let mut intake = |sub: &str, args: Arguments, _io: Io| {
                seen.push((sub.to_owned(), args.len()));
            };

            let (io, _writer, _surface) = pipe(1).unwrap();
            intake.submit_arguments("S", Arguments::new(), io);
        }

        assert_eq!(seen, vec![("S".to_owned(), 0)]);
    }

    #[test]
    fn echo_intake_prints_and_echoes() {
        let (io, mut writer, surface) = pipe(2).unwrap();
        let mut intake = EchoIntake::new();
        let mut args = Arguments::new();
        args.insert("amount".to_owned(), "12".to_owned());

        intake.submit_arguments("S", args, io);
        writer.post_line("hi");
        writer.close();
        intake.join();

        let text: String = surface.drain().into_iter().map(|c| c.text).collect();
        let mut lines: Vec<&str> = text.lines().collect();
        // The echo of the typed line races with the intake's output.
        lines.sort();
        assert_eq!(lines, vec!["  amount = 12", "S:", "S> hi", "hi"]);
    }
}
