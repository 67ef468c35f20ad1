//! A line-oriented front end: renders the current form as text and reads
//! edits from the user.
use crate::io::{PostError, Stream};
use crate::option::{Opt, OptKind};
use crate::session::Session;
use crate::value::ValueStatus;
use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};
use std::io::{self, BufRead, Write};
use std::time::Duration;

const HELP: &str = "\
commands:
  list                       show the subcommands and the current form
  use <subcommand>           switch to another subcommand
  set <option> = <value>     enter a value (an empty value clears it)
  flag <option>              toggle a flag
  choose <option> = <choice> pick one of the choices (nothing clears it)
  submit                     hand the form over
  help                       show this message
  quit                       leave
after a successful submit, lines go to the running command until `:quit'
or until it stops reading them";

/// How long to wait for the intake's last words after the input is closed.
const LINGER: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Continue,
    Quit,
}

pub struct Terminal<R, W> {
    session: Session,
    input: R,
    output: W,
    colors: bool,
    piping: bool,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(session: Session, input: R, output: W) -> Terminal<R, W> {
        Terminal {
            session,
            input,
            output,
            colors: false,
            piping: false,
        }
    }

    pub fn with_colors(mut self, colors: bool) -> Terminal<R, W> {
        self.colors = colors;
        self
    }

    pub fn into_parts(self) -> (Session, W) {
        (self.session, self.output)
    }

    fn paint(&self, color: Color, text: &str) -> String {
        if self.colors {
            format!("{}{}{}", SetForegroundColor(color), text, SetAttribute(Attribute::Reset))
        } else {
            text.to_owned()
        }
    }

    fn render_status(&self, status: &ValueStatus) -> String {
        match status {
            ValueStatus::Unset => self.paint(Color::DarkGrey, "(unset)"),
            ValueStatus::Pending(_) => self.paint(Color::Yellow, &status.to_string()),
            ValueStatus::Verified(value) => self.paint(Color::Green, value),
            ValueStatus::Invalid { raw, error } => {
                format!("{} {}", raw, self.paint(Color::Red, &format!("({})", error)))
            }
        }
    }

    fn render_option(&mut self, option: &Opt, depth: usize) -> io::Result<()> {
        let kind = match option.kind() {
            OptKind::Text => "text".to_owned(),
            OptKind::Flag => "flag".to_owned(),
            OptKind::Radio { choices } => format!("radio: {}", choices.join("|")),
            OptKind::File { .. } => "file".to_owned(),
            OptKind::Exclusive(_) => "exclusive".to_owned(),
        };

        let status = self
            .session
            .current()
            .option_argument(option.name().as_str())
            .cloned()
            .unwrap_or_default();

        let rendered = self.render_status(&status);
        writeln!(
            self.output,
            "{:indent$}{} {} ({}): {}",
            "",
            if option.is_required() { "*" } else { " " },
            option.name(),
            kind,
            rendered,
            indent = depth * 4 + 2,
        )?;

        if !option.description().is_empty() {
            writeln!(self.output, "{:indent$}{}", "", option.description(), indent = depth * 4 + 6)?;
        }

        if let Some(group) = option.as_exclusive() {
            for child in group.children() {
                self.render_option(child, depth + 1)?;
            }
        }

        Ok(())
    }

    fn list(&mut self) -> io::Result<()> {
        let current = self.session.current().subcommand().name().to_owned();
        let names: Vec<String> = self
            .session
            .program()
            .subcommands()
            .map(|sub| {
                if sub.name() == current {
                    format!("[{}]", sub.name())
                } else {
                    sub.name().to_owned()
                }
            })
            .collect();
        writeln!(self.output, "subcommands: {}", names.join(" "))?;

        let subcommand = self.session.current().shared_subcommand().clone();
        if subcommand.description().is_empty() {
            writeln!(self.output, "{}", subcommand.name())?;
        } else {
            writeln!(self.output, "{} - {}", subcommand.name(), subcommand.description())?;
        }

        for option in subcommand.options() {
            self.render_option(option, 0)?;
        }

        Ok(())
    }

    fn report_status(&mut self, option: &str, status: &ValueStatus) -> io::Result<()> {
        let rendered = self.render_status(status);
        writeln!(self.output, "{}: {}", option, rendered)
    }

    fn error(&mut self, message: &str) -> io::Result<()> {
        let painted = self.paint(Color::Red, message);
        writeln!(self.output, "{}", painted)
    }

    fn toggle_flag(&mut self, option: &str) -> io::Result<()> {
        let is_flag = match self.session.current().subcommand().find(option) {
            Some(opt) => matches!(opt.kind(), OptKind::Flag),
            // Let the form report the unknown option.
            None => true,
        };

        if !is_flag {
            return self.error(&format!("`{}' is not a flag", option));
        }

        let selected = self
            .session
            .current()
            .option_argument(option)
            .map_or(false, ValueStatus::is_usable);

        match self.session.set_flag(option, !selected) {
            Ok(status) => self.report_status(option, &status),
            Err(err) => self.error(&err.to_string()),
        }
    }

    fn choose(&mut self, option: &str, choice: &str) -> io::Result<()> {
        let choices = match self.session.current().subcommand().find(option) {
            Some(opt) => opt.choices().to_vec(),
            None => Vec::new(),
        };

        if !choice.is_empty() && !choices.iter().any(|c| c == choice) {
            return self.error(&format!("`{}' is not one of: {}", choice, choices.join(", ")));
        }

        let choice = if choice.is_empty() { None } else { Some(choice) };
        match self.session.select_choice(option, choice) {
            Ok(status) => self.report_status(option, &status),
            Err(err) => self.error(&err.to_string()),
        }
    }

    fn run_command(&mut self, line: &str) -> io::Result<Next> {
        let line = line.trim();
        let (command, rest) = match line.find(char::is_whitespace) {
            Some(pos) => (&line[..pos], line[pos..].trim()),
            None => (line, ""),
        };

        // `<option> = <value>`
        let assignment = || match rest.find('=') {
            Some(pos) => (rest[..pos].trim(), rest[pos + 1..].trim()),
            None => (rest, ""),
        };

        match command {
            "" => (),
            "list" | "ls" => self.list()?,
            "use" => {
                if let Err(err) = self.session.select(rest) {
                    self.error(&err.to_string())?;
                }
            }
            "set" => {
                let (option, value) = assignment();
                match self.session.post_raw_input(option, value) {
                    Ok(status) => self.report_status(option, &status)?,
                    Err(err) => self.error(&err.to_string())?,
                }
            }
            "flag" => self.toggle_flag(rest)?,
            "choose" => {
                let (option, choice) = assignment();
                self.choose(option, choice)?;
            }
            "submit" => match self.session.submit() {
                Ok(()) => {
                    writeln!(self.output, "submitted; type `:quit' to stop sending input")?;
                    self.piping = true;
                }
                Err(err) => self.error(&err.to_string())?,
            },
            "help" => writeln!(self.output, "{}", HELP)?,
            "quit" | "exit" => return Ok(Next::Quit),
            _ => self.error(&format!("unknown command `{}' (try `help')", command))?,
        }

        Ok(Next::Continue)
    }

    fn pipe_line(&mut self, line: &str) -> io::Result<Next> {
        if line.trim() == ":quit" {
            return Ok(Next::Quit);
        }

        match self.session.try_post_line(line) {
            Ok(()) => (),
            Err(PostError::Full(line)) => {
                self.error(&format!("the command is not keeping up; `{}' was not sent", line))?;
            }
            Err(PostError::Disconnected(_)) => {
                self.error("the command no longer reads its input; back to the form")?;
                self.piping = false;
            }
        }

        Ok(Next::Continue)
    }

    fn show_output(&mut self) -> io::Result<()> {
        for chunk in self.session.output().drain() {
            self.write_chunk(chunk.stream, &chunk.text)?;
        }

        self.output.flush()
    }

    fn write_chunk(&mut self, stream: Stream, text: &str) -> io::Result<()> {
        match stream {
            Stream::Out => write!(self.output, "{}", text),
            Stream::Err => {
                let painted = self.paint(Color::Red, text);
                write!(self.output, "{}", painted)
            }
        }
    }

    fn prompt(&mut self) -> io::Result<()> {
        if !self.piping {
            write!(self.output, "{}> ", self.session.current().subcommand().name())?;
        }

        self.output.flush()
    }

    /// Reads commands until `quit` or the end of the input, then closes the
    /// session's input pipe.
    pub fn run(&mut self) -> io::Result<()> {
        self.list()?;
        loop {
            self.prompt()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }

            let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
            let next = if self.piping {
                self.pipe_line(line)?
            } else {
                self.run_command(line)?
            };

            self.show_output()?;
            if next == Next::Quit {
                break;
            }
        }

        self.session.close();
        while let Some(chunk) = self.session.output().next_timeout(LINGER) {
            self.write_chunk(chunk.stream, &chunk.text)?;
        }

        self.output.flush()
    }
}
