use crate::form::RawArgumentForm;
use crate::value::{ValueStatus, VerificationError};
use crate::verifier::{self, Verifier};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// The value a selected flag submits.
pub const FLAG_SELECTED: &str = "selected";
/// Posting this (or anything but `FLAG_SELECTED`) to a flag clears it.
pub const FLAG_UNSELECTED: &str = "unselected";

/// The name of an option. Options are identified by their name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptName(String);

impl OptName {
    pub fn new<S: Into<String>>(name: S) -> OptName {
        OptName(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for OptName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OptName {
    fn from(name: &str) -> OptName {
        OptName::new(name)
    }
}

impl From<String> for OptName {
    fn from(name: String) -> OptName {
        OptName(name)
    }
}

impl fmt::Display for OptName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Narrows down the listing of an external file chooser, e.g.
/// `("JAR File", ["*.jar", "*.JAR"])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    pub description: String,
    pub patterns: Vec<String>,
}

impl ExtensionFilter {
    pub fn new<S: Into<String>>(description: S, patterns: Vec<String>) -> ExtensionFilter {
        ExtensionFilter {
            description: description.into(),
            patterns,
        }
    }
}

#[derive(Debug, Clone)]
pub enum OptKind {
    /// Free text.
    Text,
    /// On or off. Never fails verification.
    Flag,
    /// One of a fixed set of choices, or none.
    Radio { choices: Vec<String> },
    /// A filesystem path. Browsing is left to the front end.
    File {
        start_dir: Option<PathBuf>,
        filters: Vec<ExtensionFilter>,
    },
    /// At most one of the children may be given.
    Exclusive(ExclusiveOptions),
}

/// A named parameter of a subcommand.
#[derive(Debug, Clone)]
pub struct Opt {
    name: OptName,
    description: String,
    required: bool,
    verifier: Verifier,
    kind: OptKind,
}

impl Opt {
    fn with_kind<N: Into<OptName>, D: Into<String>>(name: N, description: D, kind: OptKind) -> Opt {
        Opt {
            name: name.into(),
            description: description.into(),
            required: false,
            verifier: verifier::passthrough(),
            kind,
        }
    }

    /// A free-text option. Optional and accepting anything until told
    /// otherwise.
    pub fn new<N: Into<OptName>, D: Into<String>>(name: N, description: D) -> Opt {
        Opt::with_kind(name, description, OptKind::Text)
    }

    pub fn flag<N: Into<OptName>, D: Into<String>>(name: N, description: D) -> Opt {
        Opt::with_kind(name, description, OptKind::Flag)
    }

    pub fn radio<N, D, S>(name: N, description: D, choices: Vec<S>) -> Opt
    where
        N: Into<OptName>,
        D: Into<String>,
        S: Into<String>,
    {
        let choices = choices.into_iter().map(Into::into).collect();
        Opt::with_kind(name, description, OptKind::Radio { choices })
    }

    pub fn file<N: Into<OptName>, D: Into<String>>(
        name: N,
        description: D,
        start_dir: Option<PathBuf>,
        filters: Vec<ExtensionFilter>,
    ) -> Opt {
        Opt::with_kind(name, description, OptKind::File { start_dir, filters })
    }

    /// A group of options of which at most one may be given. The group's
    /// status mirrors the chosen child.
    pub fn exclusive<N: Into<OptName>, D: Into<String>>(
        name: N,
        description: D,
        children: Vec<Opt>,
    ) -> Opt {
        let mut opt = Opt::with_kind(
            name,
            description,
            OptKind::Exclusive(ExclusiveOptions { children }),
        );
        opt.verifier = exclusivity();
        opt
    }

    pub fn required(mut self) -> Opt {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Opt {
        self.required = false;
        self
    }

    pub fn with_description<D: Into<String>>(mut self, description: D) -> Opt {
        self.description = description.into();
        self
    }

    /// Sets the verifier. A verifier given to an exclusive group runs after
    /// the exclusivity check instead of replacing it.
    pub fn with_verifier(mut self, verifier: Verifier) -> Opt {
        self.verifier = match self.kind {
            OptKind::Exclusive(_) => verifier::all(vec![exclusivity(), verifier]),
            _ => verifier,
        };
        self
    }

    #[inline]
    pub fn name(&self) -> &OptName {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[inline]
    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    #[inline]
    pub fn kind(&self) -> &OptKind {
        &self.kind
    }

    pub fn as_exclusive(&self) -> Option<&ExclusiveOptions> {
        match &self.kind {
            OptKind::Exclusive(group) => Some(group),
            _ => None,
        }
    }

    /// Takes the option called `name` out of this group or any group
    /// nested in it.
    pub(crate) fn remove_nested(&mut self, name: &str) -> Option<Opt> {
        let group = match &mut self.kind {
            OptKind::Exclusive(group) => group,
            _ => return None,
        };

        if let Some(pos) = group.children.iter().position(|child| child.name().as_str() == name) {
            return Some(group.children.remove(pos));
        }

        group.children.iter_mut().find_map(|child| child.remove_nested(name))
    }

    /// The names of this option and of every option nested in it.
    pub(crate) fn names(&self) -> Vec<&OptName> {
        let mut names = vec![self.name()];
        if let Some(group) = self.as_exclusive() {
            for child in group.children() {
                names.extend(child.names());
            }
        }

        names
    }

    pub fn choices(&self) -> &[String] {
        match &self.kind {
            OptKind::Radio { choices } => choices,
            _ => &[],
        }
    }

    pub fn start_dir(&self) -> Option<&Path> {
        match &self.kind {
            OptKind::File { start_dir, .. } => start_dir.as_deref(),
            _ => None,
        }
    }

    pub fn filters(&self) -> &[ExtensionFilter] {
        match &self.kind {
            OptKind::File { filters, .. } => filters,
            _ => &[],
        }
    }

    /// Computes the status of this option after `raw` has been entered.
    ///
    /// Exclusive groups ignore `raw`: their status is derived from the
    /// statuses of their children in `form`.
    pub fn validate(&self, raw: &str, form: &RawArgumentForm) -> ValueStatus {
        match &self.kind {
            OptKind::Flag if raw == FLAG_SELECTED => ValueStatus::Verified(FLAG_SELECTED.to_owned()),
            OptKind::Flag => ValueStatus::Unset,
            OptKind::Exclusive(group) => match group.display_value(form) {
                Some(shown) => ValueStatus::Pending(shown).verify(self, form),
                None => ValueStatus::Unset,
            },
            _ if raw.is_empty() => ValueStatus::Unset,
            _ => ValueStatus::Pending(raw.to_owned()).verify(self, form),
        }
    }
}

impl PartialEq for Opt {
    fn eq(&self, other: &Opt) -> bool {
        self.name == other.name
    }
}

impl Eq for Opt {}

impl Hash for Opt {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} : {}", self.name, self.description)
    }
}

#[derive(Debug, Clone)]
pub struct ExclusiveOptions {
    children: Vec<Opt>,
}

impl ExclusiveOptions {
    #[inline]
    pub fn children(&self) -> &[Opt] {
        &self.children
    }

    /// Children whose value in `form` is usable, in declaration order.
    pub fn chosen<'a>(&'a self, form: &RawArgumentForm) -> Vec<&'a Opt> {
        self.children
            .iter()
            .filter(|child| {
                form.option_argument(child.name().as_str())
                    .map_or(false, ValueStatus::is_usable)
            })
            .collect()
    }

    /// `child:value` for every chosen child, or `None` if nothing is chosen.
    fn display_value(&self, form: &RawArgumentForm) -> Option<String> {
        let shown: Vec<String> = self
            .chosen(form)
            .iter()
            .filter_map(|child| {
                form.option_argument(child.name().as_str())
                    .and_then(ValueStatus::usable_value)
                    .map(|value| format!("{}:{}", child.name(), value))
            })
            .collect();

        if shown.is_empty() {
            None
        } else {
            Some(shown.join(", "))
        }
    }

    fn check(&self, form: &RawArgumentForm) -> Result<(), VerificationError> {
        let chosen = self.chosen(form);
        if chosen.len() > 1 {
            let names: Vec<&str> = chosen.iter().map(|child| child.name().as_str()).collect();
            return Err(VerificationError::new(format!(
                "Only one option allowed to be selected. The options '{}' have all been selected",
                names.join(",")
            )));
        }

        Ok(())
    }
}

/// Fails if more than one child of the verified exclusive group is given.
fn exclusivity() -> Verifier {
    Verifier::new("exclusive", |option, form, _| match option.as_exclusive() {
        Some(group) => group.check(form),
        None => Ok(()),
    })
}
