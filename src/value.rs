use crate::form::RawArgumentForm;
use crate::option::Opt;
use failure::Fail;
use std::fmt;

/// Raised by a `Verifier` when a raw value does not meet the requirements of
/// an option. The message is meant to be shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Fail)]
#[fail(display = "{}", message)]
pub struct VerificationError {
    message: String,
}

impl VerificationError {
    pub fn new<S: Into<String>>(message: S) -> VerificationError {
        VerificationError {
            message: message.into(),
        }
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The current value of an option and the outcome of verifying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueStatus {
    /// Nothing has been entered (or the entry was cleared).
    Unset,
    /// A raw value arrived and has not been verified yet.
    Pending(String),
    /// The verifier accepted the value.
    Verified(String),
    /// The verifier rejected the value. The raw value is kept for display.
    Invalid {
        raw: String,
        error: VerificationError,
    },
}

impl Default for ValueStatus {
    fn default() -> ValueStatus {
        ValueStatus::Unset
    }
}

impl ValueStatus {
    /// Runs `option`'s verifier over a pending value. Other states are
    /// returned as they are.
    pub fn verify(self, option: &Opt, form: &RawArgumentForm) -> ValueStatus {
        match self {
            ValueStatus::Pending(raw) => match option.verifier().verify(option, form, &raw) {
                Ok(()) => {
                    trace!("{}: verified {:?}", option.name(), raw);
                    ValueStatus::Verified(raw)
                }
                Err(error) => {
                    trace!("{}: rejected {:?}: {}", option.name(), raw, error);
                    ValueStatus::Invalid { raw, error }
                }
            },
            other => other,
        }
    }

    /// Returns the raw value, if any. Invalid values are still returned.
    pub fn raw(&self) -> Option<&str> {
        match self {
            ValueStatus::Unset => None,
            ValueStatus::Pending(raw)
            | ValueStatus::Verified(raw)
            | ValueStatus::Invalid { raw, .. } => Some(raw),
        }
    }

    pub fn error(&self) -> Option<&VerificationError> {
        match self {
            ValueStatus::Invalid { error, .. } => Some(error),
            _ => None,
        }
    }

    #[inline]
    pub fn is_verified(&self) -> bool {
        matches!(self, ValueStatus::Verified(_))
    }

    /// A value can be submitted only if it is verified and not empty.
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.usable_value().is_some()
    }

    pub fn usable_value(&self) -> Option<&str> {
        match self {
            ValueStatus::Verified(raw) if !raw.is_empty() => Some(raw),
            _ => None,
        }
    }
}

impl fmt::Display for ValueStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValueStatus::Unset => write!(f, "(unset)"),
            ValueStatus::Pending(raw) => write!(f, "{} (pending)", raw),
            ValueStatus::Verified(raw) => write!(f, "{}", raw),
            ValueStatus::Invalid { raw, error } => write!(f, "{} ({})", raw, error),
        }
    }
}
