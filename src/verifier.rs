//! Verifiers check a raw string entered for an option.
//!
//! A verifier is stateless and can be shared by any number of options. The
//! standard ones are registered by name in a static table so that schema
//! files can refer to them.
use crate::form::RawArgumentForm;
use crate::option::Opt;
use crate::value::VerificationError;
use nix::unistd::{self, AccessFlags};
use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

type Result = std::result::Result<(), VerificationError>;

pub trait Verify: Send + Sync {
    fn verify(&self, option: &Opt, form: &RawArgumentForm, raw: &str) -> Result;
}

impl<F> Verify for F
where
    F: Fn(&Opt, &RawArgumentForm, &str) -> Result + Send + Sync,
{
    fn verify(&self, option: &Opt, form: &RawArgumentForm, raw: &str) -> Result {
        self(option, form, raw)
    }
}

/// A named, cheaply cloneable handle to a `Verify` implementation.
#[derive(Clone)]
pub struct Verifier {
    name: Arc<str>,
    inner: Arc<dyn Verify>,
}

impl Verifier {
    pub fn new<S, F>(name: S, func: F) -> Verifier
    where
        S: Into<String>,
        F: Fn(&Opt, &RawArgumentForm, &str) -> Result + Send + Sync + 'static,
    {
        Verifier::from_verify(name, func)
    }

    pub fn from_verify<S: Into<String>, V: Verify + 'static>(name: S, verify: V) -> Verifier {
        Verifier {
            name: Arc::from(name.into()),
            inner: Arc::new(verify),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn verify(&self, option: &Opt, form: &RawArgumentForm, raw: &str) -> Result {
        self.inner.verify(option, form, raw)
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Verifier({})", self.name)
    }
}

fn check(ok: bool, message: &str) -> Result {
    if ok {
        Ok(())
    } else {
        Err(VerificationError::new(message))
    }
}

fn parse_whole(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| !value.is_nan())
}

/// Accepts anything.
pub fn passthrough() -> Verifier {
    Verifier::new("passthrough", |_, _, _| Ok(()))
}

pub fn whole_number() -> Verifier {
    Verifier::new("whole", |_, _, raw| {
        check(parse_whole(raw).is_some(), "Expected a whole number")
    })
}

/// Rejects zero.
pub fn negative_whole_number() -> Verifier {
    Verifier::new("negative_whole", |_, _, raw| {
        check(
            matches!(parse_whole(raw), Some(n) if n < 0),
            "Expected a negative whole number",
        )
    })
}

pub fn non_negative_whole_number() -> Verifier {
    Verifier::new("non_negative_whole", |_, _, raw| {
        check(
            matches!(parse_whole(raw), Some(n) if n >= 0),
            "Expected a non-negative whole number",
        )
    })
}

pub fn decimal_number() -> Verifier {
    Verifier::new("decimal", |_, _, raw| {
        check(parse_decimal(raw).is_some(), "Expected a decimal number")
    })
}

/// Rejects zero.
pub fn negative_decimal_number() -> Verifier {
    Verifier::new("negative_decimal", |_, _, raw| {
        check(
            matches!(parse_decimal(raw), Some(n) if n < 0.0),
            "Expected a negative decimal number",
        )
    })
}

pub fn non_negative_decimal_number() -> Verifier {
    Verifier::new("non_negative_decimal", |_, _, raw| {
        check(
            matches!(parse_decimal(raw), Some(n) if n >= 0.0),
            "Expected a non-negative decimal number",
        )
    })
}

/// Strictly `true` or `false`, in any case.
pub fn boolean() -> Verifier {
    Verifier::new("boolean", |_, _, raw| {
        let raw = raw.trim();
        check(
            raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false"),
            "Expected a boolean value",
        )
    })
}

pub fn file_exists() -> Verifier {
    Verifier::new("file_exists", |_, _, raw| match std::fs::metadata(raw) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Err(VerificationError::new("The file does not exist."))
        }
        Err(err) => {
            debug!("file_exists: {}: {}", raw, err);
            Err(VerificationError::new(
                "The existence of this file can't be verified.",
            ))
        }
    })
}

fn accessible(raw: &str, mode: AccessFlags) -> bool {
    unistd::access(Path::new(raw), mode).is_ok()
}

pub fn file_readable() -> Verifier {
    Verifier::new("file_readable", |_, _, raw| {
        check(accessible(raw, AccessFlags::R_OK), "The file cannot be read")
    })
}

pub fn file_writable() -> Verifier {
    Verifier::new("file_writable", |_, _, raw| {
        check(
            accessible(raw, AccessFlags::W_OK),
            "The file cannot be written to",
        )
    })
}

pub fn file_executable() -> Verifier {
    Verifier::new("file_executable", |_, _, raw| {
        check(
            accessible(raw, AccessFlags::X_OK),
            "The file cannot be executed",
        )
    })
}

fn combined_name(combinator: &str, verifiers: &[Verifier]) -> String {
    let names: Vec<&str> = verifiers.iter().map(|v| v.name()).collect();
    format!("{}({})", combinator, names.join(", "))
}

/// Runs `verifiers` in order and stops at the first failure.
pub fn all(verifiers: Vec<Verifier>) -> Verifier {
    let name = combined_name("all", &verifiers);
    Verifier::new(name, move |option, form, raw| {
        for verifier in &verifiers {
            verifier.verify(option, form, raw)?;
        }

        Ok(())
    })
}

fn run_every(verifiers: &[Verifier], option: &Opt, form: &RawArgumentForm, raw: &str) -> Vec<String> {
    verifiers
        .iter()
        .filter_map(|verifier| verifier.verify(option, form, raw).err())
        .map(|err| err.message().to_owned())
        .collect()
}

/// Runs every verifier, even after a failure, and reports all of the
/// failure messages at once (one per line).
pub fn check_all(verifiers: Vec<Verifier>) -> Verifier {
    let name = combined_name("check_all", &verifiers);
    Verifier::new(name, move |option, form, raw| {
        let messages = run_every(&verifiers, option, form, raw);
        if messages.is_empty() {
            Ok(())
        } else {
            Err(VerificationError::new(messages.join("\n")))
        }
    })
}

/// Succeeds at the first verifier that succeeds. If all of them fail, every
/// failure message is reported (one per line).
pub fn any(verifiers: Vec<Verifier>) -> Verifier {
    let name = combined_name("any", &verifiers);
    Verifier::new(name, move |option, form, raw| {
        let mut messages = Vec::new();
        for verifier in &verifiers {
            match verifier.verify(option, form, raw) {
                Ok(()) => return Ok(()),
                Err(err) => messages.push(err.message().to_owned()),
            }
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(VerificationError::new(messages.join("\n")))
        }
    })
}

type VerifierCtor = fn() -> Verifier;
lazy_static! {
    static ref STANDARD_VERIFIERS: BTreeMap<&'static str, VerifierCtor> = {
        let mut verifiers: BTreeMap<&'static str, VerifierCtor> = BTreeMap::new();
        verifiers.insert("passthrough", passthrough);
        verifiers.insert("whole", whole_number);
        verifiers.insert("negative_whole", negative_whole_number);
        verifiers.insert("non_negative_whole", non_negative_whole_number);
        verifiers.insert("decimal", decimal_number);
        verifiers.insert("negative_decimal", negative_decimal_number);
        verifiers.insert("non_negative_decimal", non_negative_decimal_number);
        verifiers.insert("boolean", boolean);
        verifiers.insert("file_exists", file_exists);
        verifiers.insert("file_readable", file_readable);
        verifiers.insert("file_writable", file_writable);
        verifiers.insert("file_executable", file_executable);
        verifiers
    };
}

/// Looks up a standard verifier by its registered name.
pub fn lookup(name: &str) -> Option<Verifier> {
    STANDARD_VERIFIERS.get(name).map(|ctor| ctor())
}

pub fn names() -> impl Iterator<Item = &'static str> {
    STANDARD_VERIFIERS.keys().copied()
}
