use crate::form::{FormError, RawArgumentForm, StatusListener};
use crate::intake::Intake;
use crate::io::{self, ChannelError, InputWriter, Io, OutputSurface, OutputWriters, PostError};
use crate::program::Program;
use crate::submission::{process_args, IncompleteError};
use crate::value::ValueStatus;
use failure::Fail;
use std::sync::Arc;

#[derive(Debug, Fail)]
pub enum SessionError {
    #[fail(display = "no such subcommand: {}", _0)]
    UnknownSubcommand(String),
}

/// One run of the form over a program: a form per subcommand, the one
/// currently shown, and the channel to the intake.
///
/// Every successful submission gets an input pipe of its own. The session
/// keeps only the writing end, so an intake that drops its reader
/// disconnects the pipe.
pub struct Session {
    program: Program,
    forms: Vec<RawArgumentForm>,
    current: usize,
    intake: Box<dyn Intake>,
    capacity: usize,
    writers: OutputWriters,
    input: InputWriter,
    output: OutputSurface,
}

impl Session {
    pub fn new(program: Program, intake: Box<dyn Intake>, capacity: usize) -> Result<Session, ChannelError> {
        if capacity == 0 {
            return Err(ChannelError::ZeroCapacity);
        }

        let (writers, output) = io::output_channel();
        let input = InputWriter::closed(writers.out.clone());
        let forms = program
            .shared_subcommands()
            .iter()
            .map(|sub| RawArgumentForm::new(Arc::clone(sub)))
            .collect();

        debug!("session: {} ({} subcommands)", program.name(), program.shared_subcommands().len());
        Ok(Session {
            program,
            forms,
            current: 0,
            intake,
            capacity,
            writers,
            input,
            output,
        })
    }

    #[inline]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Switches the current subcommand. Values entered in the other forms
    /// are kept.
    pub fn select(&mut self, subcommand: &str) -> Result<(), SessionError> {
        let index = self
            .forms
            .iter()
            .position(|form| form.subcommand().name() == subcommand)
            .ok_or_else(|| SessionError::UnknownSubcommand(subcommand.to_owned()))?;

        trace!("session: selected {}", subcommand);
        self.current = index;
        Ok(())
    }

    pub fn current(&self) -> &RawArgumentForm {
        &self.forms[self.current]
    }

    pub fn current_mut(&mut self) -> &mut RawArgumentForm {
        &mut self.forms[self.current]
    }

    pub fn form(&self, subcommand: &str) -> Option<&RawArgumentForm> {
        self.forms.iter().find(|form| form.subcommand().name() == subcommand)
    }

    /// Subscribes `listener` to every form of the session.
    pub fn subscribe<L, F>(&mut self, mut make_listener: F)
    where
        L: StatusListener + 'static,
        F: FnMut() -> L,
    {
        for form in &mut self.forms {
            form.subscribe(Box::new(make_listener()));
        }
    }

    pub fn post_raw_input(&mut self, option: &str, raw: &str) -> Result<ValueStatus, FormError> {
        self.current_mut().post_raw_input(option, raw)
    }

    pub fn set_flag(&mut self, option: &str, selected: bool) -> Result<ValueStatus, FormError> {
        self.current_mut().set_flag(option, selected)
    }

    pub fn select_choice(&mut self, option: &str, choice: Option<&str>) -> Result<ValueStatus, FormError> {
        self.current_mut().select_choice(option, choice)
    }

    /// Processes the current form and hands the arguments to the intake
    /// along with a fresh input pipe. The previous submission's pipe is
    /// closed, so its reader sees end of file. The intake is not called if
    /// required options are missing.
    pub fn submit(&mut self) -> Result<(), IncompleteError> {
        let form = &self.forms[self.current];
        let arguments = process_args(form)?;
        let name = form.subcommand().name().to_owned();

        // `new` refused a zero capacity.
        let (input, reader) = io::bounded_pipe(self.capacity, self.writers.out.clone());

        self.input.close();
        self.input = input;
        let io = Io {
            out: self.writers.out.clone(),
            err: self.writers.err.clone(),
            input: reader,
        };

        debug!("session: submitting {}", name);
        self.intake.submit_arguments(&name, arguments, io);
        Ok(())
    }

    /// Sends a typed line to the last submission's intake. Blocks while the
    /// input pipe is full. Panics if nothing was submitted yet, the pipe is
    /// closed, or the intake dropped its reader.
    pub fn post_line(&mut self, line: &str) {
        self.input.post_line(line);
    }

    /// Never blocks: a full pipe or a reader that went away hands the line
    /// back. Panics if nothing was submitted yet or the pipe is closed.
    pub fn try_post_line(&mut self, line: &str) -> Result<(), PostError> {
        self.input.try_post_line(line)
    }

    #[inline]
    pub fn output(&self) -> &OutputSurface {
        &self.output
    }

    /// Closes the input pipe. The intake reads what is already queued, then
    /// sees end of file.
    pub fn close(&mut self) {
        trace!("session: closing the input pipe");
        self.input.close();
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.input.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::EchoIntake;
    use crate::option::{Opt, OptName};
    use crate::subcommand::Subcommand;
    use crate::submission::Arguments;
    use crate::verifier;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::io::{BufRead, Read};
    use std::rc::Rc;
    use std::time::Duration;

    fn git() -> Program {
        let mut program = Program::new("git", "");
        program.add_option(Opt::flag("version", ""));
        let mut commit = Subcommand::new("commit");
        commit.add_option(Opt::new("amount", "").with_verifier(verifier::whole_number()).required());
        program.add_subcommand(commit);
        program
    }

    fn recording() -> (Box<dyn Intake>, Rc<RefCell<Vec<(String, Arguments)>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&calls);
        let intake = move |sub: &str, args: Arguments, _io: Io| {
            log.borrow_mut().push((sub.to_owned(), args));
        };

        (Box::new(intake), calls)
    }

    /// Keeps every `Io` it is handed without reading from it.
    fn hoarding() -> (Box<dyn Intake>, Rc<RefCell<Vec<Io>>>) {
        let kept = Rc::new(RefCell::new(Vec::new()));
        let store = Rc::clone(&kept);
        let intake = move |_: &str, _: Arguments, io: Io| store.borrow_mut().push(io);
        (Box::new(intake), kept)
    }

    fn read_lines(io: Io) -> Vec<String> {
        io.input.lines().collect::<std::io::Result<Vec<String>>>().unwrap()
    }

    #[test]
    fn forms_survive_switching() {
        let (intake, _) = recording();
        let mut session = Session::new(git(), intake, 4).unwrap();
        assert_eq!(session.current().subcommand().name(), "git");

        session.select("commit").unwrap();
        session.post_raw_input("amount", "3").unwrap();
        session.select("git").unwrap();
        session.set_flag("version", true).unwrap();
        session.select("commit").unwrap();

        assert!(session.current().option_argument("amount").unwrap().is_usable());
        assert!(session.form("git").unwrap().option_argument("version").unwrap().is_usable());
        assert!(matches!(
            session.select("push"),
            Err(SessionError::UnknownSubcommand(_))
        ));
        assert_eq!(session.current().subcommand().name(), "commit");
    }

    #[test]
    fn intake_runs_once_per_successful_submission() {
        let (intake, calls) = recording();
        let mut session = Session::new(git(), intake, 4).unwrap();
        session.select("commit").unwrap();

        assert!(session.submit().is_err());
        assert!(calls.borrow().is_empty());

        session.post_raw_input("amount", "12").unwrap();
        session.submit().unwrap();

        let mut expected = Arguments::new();
        expected.insert("amount".to_owned(), "12".to_owned());
        assert_eq!(*calls.borrow(), vec![("commit".to_owned(), expected)]);
    }

    #[test]
    fn listeners_cover_every_form() {
        let (intake, _) = recording();
        let mut session = Session::new(git(), intake, 4).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        session.subscribe(|| {
            let log = Rc::clone(&seen);
            move |sub: &str, option: &OptName, _: &ValueStatus| {
                log.borrow_mut().push(format!("{}/{}", sub, option));
            }
        });

        session.set_flag("version", true).unwrap();
        session.select("commit").unwrap();
        session.post_raw_input("amount", "1").unwrap();
        assert_eq!(*seen.borrow(), vec!["git/version", "commit/amount"]);
    }

    #[test]
    fn typed_lines_reach_the_intake() {
        let mut session = Session::new(git(), Box::new(EchoIntake::new()), 2).unwrap();
        session.submit().unwrap();
        session.post_line("hello");
        session.close();
        assert!(session.is_closed());

        let mut text = String::new();
        while let Some(chunk) = session.output().next_timeout(Duration::from_secs(5)) {
            text.push_str(&chunk.text);
            if text.contains("git> hello") {
                break;
            }
        }

        assert!(text.contains("git:"), "{}", text);
        assert!(text.contains("git> hello"), "{}", text);
    }

    #[test]
    fn intake_that_drops_its_input_does_not_block() {
        let (intake, calls) = recording();
        let mut session = Session::new(git(), intake, 1).unwrap();
        session.submit().unwrap();
        assert_eq!(calls.borrow().len(), 1);

        // The pipe holds one line; a reader that still existed would make
        // the second post report a full pipe instead.
        for line in &["first", "second"] {
            match session.try_post_line(line) {
                Err(PostError::Disconnected(back)) => assert_eq!(back, *line),
                other => panic!("unexpected: {:?}", other),
            }
        }
    }

    #[test]
    #[should_panic(expected = "nothing reads it anymore")]
    fn blocking_post_to_a_dropped_input_panics() {
        let (intake, _) = recording();
        let mut session = Session::new(git(), intake, 1).unwrap();
        session.submit().unwrap();
        session.post_line("first");
        session.post_line("second");
    }

    #[test]
    #[should_panic(expected = "after it was closed")]
    fn posting_before_any_submission_panics() {
        let (intake, _) = recording();
        let mut session = Session::new(git(), intake, 1).unwrap();
        session.post_line("too early");
    }

    #[test]
    fn each_submission_gets_its_own_input() {
        let (intake, kept) = hoarding();
        let mut session = Session::new(git(), intake, 4).unwrap();

        session.submit().unwrap();
        session.post_line("for the first");
        session.submit().unwrap();
        session.post_line("for the second");
        session.close();

        let mut kept = kept.borrow_mut();
        let second = kept.pop().unwrap();
        let first = kept.pop().unwrap();
        assert_eq!(read_lines(first), vec!["for the first"]);
        assert_eq!(read_lines(second), vec!["for the second"]);
    }

    #[test]
    fn earlier_submission_sees_end_of_file() {
        let (intake, kept) = hoarding();
        let mut session = Session::new(git(), intake, 4).unwrap();

        session.submit().unwrap();
        session.submit().unwrap();
        assert!(!session.is_closed());

        let mut first = kept.borrow_mut().remove(0);
        let mut rest = String::new();
        assert_eq!(first.input.read_to_string(&mut rest).unwrap(), 0);
    }

    #[test]
    fn queued_lines_outlive_close() {
        let (intake, kept) = hoarding();
        let mut session = Session::new(git(), intake, 4).unwrap();
        session.submit().unwrap();
        session.post_line("one");
        session.post_line("two");
        session.close();
        assert!(session.is_closed());

        let io = kept.borrow_mut().pop().unwrap();
        assert_eq!(read_lines(io), vec!["one", "two"]);

        let echoed: String = session.output().drain().into_iter().map(|c| c.text).collect();
        assert_eq!(echoed, "one\ntwo\n");
    }

    #[test]
    fn zero_capacity_is_refused() {
        let (intake, _) = recording();
        assert!(matches!(
            Session::new(git(), intake, 0),
            Err(ChannelError::ZeroCapacity)
        ));
    }
}
