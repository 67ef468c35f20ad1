#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate pest_derive;

#[macro_use]
pub mod macros;
pub mod dirs;
pub mod form;
pub mod frontend;
pub mod intake;
pub mod io;
pub mod logger;
pub mod option;
pub mod program;
pub mod schema;
pub mod session;
pub mod subcommand;
pub mod submission;
pub mod value;
pub mod verifier;

pub use form::{FormError, RawArgumentForm, StatusListener};
pub use intake::{EchoIntake, Intake};
pub use io::{ChannelError, Io, PostError};
pub use option::{ExclusiveOptions, ExtensionFilter, Opt, OptKind, OptName};
pub use program::Program;
pub use session::{Session, SessionError};
pub use subcommand::Subcommand;
pub use submission::{process_args, Arguments, IncompleteError};
pub use value::{ValueStatus, VerificationError};
pub use verifier::Verifier;
