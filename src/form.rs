use crate::option::{OptName, FLAG_SELECTED, FLAG_UNSELECTED};
use crate::subcommand::Subcommand;
use crate::value::ValueStatus;
use failure::Fail;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Fail)]
pub enum FormError {
    #[fail(display = "'{}' has no option named '{}'", subcommand, option)]
    UnknownOption { subcommand: String, option: String },
    #[fail(display = "'{}' takes its value from its options, not from input", _0)]
    DerivedValue(String),
}

/// Notified whenever the status of an option in a form changes.
pub trait StatusListener {
    fn status_changed(&mut self, subcommand: &str, option: &OptName, status: &ValueStatus);
}

impl<F> StatusListener for F
where
    F: FnMut(&str, &OptName, &ValueStatus),
{
    fn status_changed(&mut self, subcommand: &str, option: &OptName, status: &ValueStatus) {
        self(subcommand, option, status)
    }
}

/// Holds the arguments entered for a subcommand during a session.
pub struct RawArgumentForm {
    subcommand: Arc<Subcommand>,
    arguments: HashMap<OptName, ValueStatus>,
    listeners: Vec<Box<dyn StatusListener>>,
}

impl RawArgumentForm {
    pub fn new(subcommand: Arc<Subcommand>) -> RawArgumentForm {
        RawArgumentForm {
            subcommand,
            arguments: HashMap::new(),
            listeners: Vec::new(),
        }
    }

    #[inline]
    pub fn subcommand(&self) -> &Subcommand {
        &self.subcommand
    }

    #[inline]
    pub fn shared_subcommand(&self) -> &Arc<Subcommand> {
        &self.subcommand
    }

    pub fn subscribe(&mut self, listener: Box<dyn StatusListener>) {
        self.listeners.push(listener);
    }

    /// Returns the status of an option, or `None` if nothing has been
    /// recorded for it yet.
    pub fn option_argument(&self, option: &str) -> Option<&ValueStatus> {
        self.arguments.get(option)
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.arguments.contains_key(option)
    }

    pub fn raw_arguments(&self) -> impl Iterator<Item = (&OptName, &ValueStatus)> {
        self.arguments.iter()
    }

    /// Records the status of an option, notifies the listeners and
    /// recomputes the exclusive groups the option is nested in.
    ///
    /// Recording a status equal to the current one does nothing.
    pub fn set_option_argument(&mut self, option: &OptName, status: ValueStatus) {
        let subcommand = Arc::clone(&self.subcommand);
        let mut next = Some((option.clone(), status));
        while let Some((name, status)) = next.take() {
            if self.arguments.get(&name) == Some(&status) {
                break;
            }

            trace!("{}: {} = {}", subcommand.name(), name, status);
            for listener in &mut self.listeners {
                listener.status_changed(subcommand.name(), &name, &status);
            }

            self.arguments.insert(name.clone(), status);
            next = subcommand
                .group_of(name.as_str())
                .map(|group| (group.name().clone(), group.validate("", self)));
        }
    }

    /// Handles a raw string entered for `option`.
    pub fn post_raw_input(&mut self, option: &str, raw: &str) -> Result<ValueStatus, FormError> {
        let subcommand = Arc::clone(&self.subcommand);
        let opt = subcommand
            .find(option)
            .ok_or_else(|| FormError::UnknownOption {
                subcommand: subcommand.name().to_owned(),
                option: option.to_owned(),
            })?;

        if opt.as_exclusive().is_some() {
            return Err(FormError::DerivedValue(option.to_owned()));
        }

        let status = opt.validate(raw, self);
        self.set_option_argument(opt.name(), status.clone());
        Ok(status)
    }

    pub fn set_flag(&mut self, option: &str, selected: bool) -> Result<ValueStatus, FormError> {
        let raw = if selected { FLAG_SELECTED } else { FLAG_UNSELECTED };
        self.post_raw_input(option, raw)
    }

    /// Selects one of the choices of a radio option, or clears it.
    pub fn select_choice(&mut self, option: &str, choice: Option<&str>) -> Result<ValueStatus, FormError> {
        self.post_raw_input(option, choice.unwrap_or(""))
    }
}

impl fmt::Debug for RawArgumentForm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RawArgumentForm")
            .field("subcommand", &self.subcommand.name())
            .field("arguments", &self.arguments)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
