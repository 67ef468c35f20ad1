//! Turns a filled-in form into the arguments handed to the intake.
use crate::form::RawArgumentForm;
use crate::subcommand::Subcommand;
use failure::Fail;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Option name to the value given on the form.
pub type Arguments = BTreeMap<String, String>;

/// Some of the required options of a subcommand have no usable value.
#[derive(Debug)]
pub struct IncompleteError {
    subcommand: Arc<Subcommand>,
    missing: BTreeSet<String>,
}

impl IncompleteError {
    pub fn new(subcommand: Arc<Subcommand>, missing: BTreeSet<String>) -> IncompleteError {
        IncompleteError {
            subcommand,
            missing,
        }
    }

    #[inline]
    pub fn subcommand(&self) -> &Subcommand {
        &self.subcommand
    }

    #[inline]
    pub fn missing(&self) -> &BTreeSet<String> {
        &self.missing
    }
}

impl fmt::Display for IncompleteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let missing: Vec<&str> = self.missing.iter().map(String::as_str).collect();
        write!(
            f,
            "Missing required options for '{}': {}",
            self.subcommand.name(),
            missing.join(",")
        )
    }
}

impl Fail for IncompleteError {}

/// An option nested in exclusive groups only counts if every enclosing group
/// is usable; otherwise the conflicting children would all be submitted.
fn groups_allow(form: &RawArgumentForm, option: &str) -> bool {
    let mut current = option;
    while let Some(group) = form.subcommand().group_of(current) {
        let usable = form
            .option_argument(group.name().as_str())
            .map_or(false, |status| status.is_usable());
        if !usable {
            return false;
        }

        current = group.name().as_str();
    }

    true
}

/// Collects the usable values of `form`, or reports the required options
/// that are still missing. The form is left untouched either way.
pub fn process_args(form: &RawArgumentForm) -> Result<Arguments, IncompleteError> {
    let subcommand = form.subcommand();
    let mut args = Arguments::new();
    let mut given_required = BTreeSet::new();
    for (option, status) in form.raw_arguments() {
        let value = match status.usable_value() {
            Some(value) => value,
            None => continue,
        };

        if !groups_allow(form, option.as_str()) {
            trace!("{}: {} skipped: its group is not usable", subcommand.name(), option);
            continue;
        }

        args.insert(option.to_string(), value.to_owned());
        if subcommand.is_option_required(option.as_str()) {
            given_required.insert(option.to_string());
        }
    }

    let required: BTreeSet<String> = subcommand
        .required_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    if given_required != required {
        let missing = required.difference(&given_required).cloned().collect();
        return Err(IncompleteError::new(
            Arc::clone(form.shared_subcommand()),
            missing,
        ));
    }

    debug!("{}: arguments: {:?}", subcommand.name(), args);
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::Opt;
    use crate::verifier;
    use pretty_assertions::assert_eq;

    fn form_with(options: Vec<Opt>) -> RawArgumentForm {
        let mut sub = Subcommand::new("S");
        for option in options {
            sub.add_option(option);
        }

        RawArgumentForm::new(Arc::new(sub))
    }

    fn arguments(pairs: &[(&str, &str)]) -> Arguments {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn only_usable_values_are_submitted() {
        let mut form = form_with(vec![
            Opt::new("amount", "").with_verifier(verifier::whole_number()).required(),
            Opt::new("count", "").with_verifier(verifier::whole_number()),
            Opt::new("note", ""),
            Opt::flag("verbose", ""),
        ]);

        form.post_raw_input("amount", "12").unwrap();
        form.post_raw_input("count", "many").unwrap();
        form.set_flag("verbose", true).unwrap();

        let expected = arguments(&[("amount", "12"), ("verbose", "selected")]);
        assert_eq!(process_args(&form).unwrap(), expected);
        // Nothing changes on a second run.
        assert_eq!(process_args(&form).unwrap(), expected);
    }

    #[test]
    fn missing_required_options() {
        let mut form = form_with(vec![
            Opt::new("amount", "").with_verifier(verifier::whole_number()).required(),
            Opt::new("target", "").required(),
            Opt::new("note", ""),
        ]);

        form.post_raw_input("amount", "abc").unwrap();
        form.post_raw_input("note", "hello").unwrap();

        let err = process_args(&form).unwrap_err();
        assert_eq!(err.subcommand().name(), "S");
        assert_eq!(
            err.missing().iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["amount", "target"]
        );
        assert_eq!(err.to_string(), "Missing required options for 'S': amount,target");

        // The form survives the failure.
        assert_eq!(form.option_argument("note").and_then(|s| s.usable_value()), Some("hello"));
        assert_eq!(form.option_argument("amount").and_then(|s| s.raw()), Some("abc"));
    }

    #[test]
    fn required_exclusive_group() {
        let mut form = form_with(vec![Opt::exclusive(
            "message",
            "",
            vec![Opt::new("entry", ""), Opt::new("file", "")],
        )
        .required()]);

        let err = process_args(&form).unwrap_err();
        assert_eq!(err.missing().iter().collect::<Vec<_>>(), vec!["message"]);

        form.post_raw_input("entry", "fix typo").unwrap();
        assert_eq!(
            process_args(&form).unwrap(),
            arguments(&[("entry", "fix typo"), ("message", "entry:fix typo")])
        );

        form.post_raw_input("file", "/tmp/msg").unwrap();
        assert!(process_args(&form).is_err());
    }

    #[test]
    fn conflicting_children_of_an_optional_group_are_dropped() {
        let mut form = form_with(vec![Opt::exclusive(
            "message",
            "",
            vec![Opt::new("entry", ""), Opt::new("file", "")],
        )]);

        form.post_raw_input("entry", "fix typo").unwrap();
        form.post_raw_input("file", "/tmp/msg").unwrap();
        assert_eq!(process_args(&form).unwrap(), Arguments::new());
    }
}
