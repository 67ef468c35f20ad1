#[macro_use]
extern crate log;
#[macro_use]
extern crate argform;

use argform::frontend::Terminal;
use argform::io::DEFAULT_PIPE_CAPACITY;
use argform::logger::install_logger;
use argform::macros::{colors_enabled, disable_colors};
use argform::schema::load_schema;
use argform::{verifier, EchoIntake, Session};
use std::path::PathBuf;
use std::process::exit;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "argform",
    about = "Fills in a command's options through a validating form."
)]
struct Args {
    /// The schema describing the program, its subcommands and options.
    #[structopt(parse(from_os_str), required_unless = "list-verifiers")]
    schema: Option<PathBuf>,
    /// How many typed lines may wait for the submitted command (64 by
    /// default).
    #[structopt(long)]
    pipe_capacity: Option<usize>,
    #[structopt(long)]
    no_color: bool,
    /// Log everything, even in release builds.
    #[structopt(short, long)]
    verbose: bool,
    /// Print the names usable after `verify' in a schema.
    #[structopt(long)]
    list_verifiers: bool,
}

fn main() {
    let args = Args::from_args();
    if args.no_color {
        disable_colors();
    }

    if args.list_verifiers {
        for name in verifier::names() {
            println!("{}", name);
        }
        return;
    }

    if let Err(err) = install_logger("argform", args.verbose) {
        print_err!("failed to set up logging: {}", err);
    }

    let path = match args.schema {
        Some(path) => path,
        None => exit(1),
    };

    let program = match load_schema(&path) {
        Ok(program) => program,
        Err(err) => {
            print_err!("{}: {}", path.display(), err);
            exit(1);
        }
    };

    let capacity = args.pipe_capacity.unwrap_or(DEFAULT_PIPE_CAPACITY);
    info!("{}: {} lines of input pipe", path.display(), capacity);
    let session = match Session::new(program, Box::new(EchoIntake::new()), capacity) {
        Ok(session) => session,
        Err(err) => {
            print_err!("{}", err);
            exit(1);
        }
    };

    let stdin = std::io::stdin();
    let mut terminal = Terminal::new(session, stdin.lock(), std::io::stdout()).with_colors(colors_enabled());
    if let Err(err) = terminal.run() {
        print_err!("{}", err);
        exit(1);
    }
}
