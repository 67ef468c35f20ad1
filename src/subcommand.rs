use crate::option::{Opt, OptName};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A collection of options meant for one subcommand, e.g. `commit`, `add`
/// and `push` under `git`.
#[derive(Debug, Clone)]
pub struct Subcommand {
    name: String,
    description: String,
    options: HashMap<OptName, Opt>,
    required: BTreeSet<OptName>,
    /// Maps every option nested in an exclusive group to the group.
    groups: HashMap<OptName, OptName>,
}

impl Subcommand {
    pub fn new<S: Into<String>>(name: S) -> Subcommand {
        Subcommand {
            name: name.into(),
            description: String::new(),
            options: HashMap::new(),
            required: BTreeSet::new(),
            groups: HashMap::new(),
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Subcommand {
        self.description = description.into();
        self
    }

    pub fn set_description<S: Into<String>>(&mut self, description: S) {
        self.description = description.into();
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Adds an option. An option with the same name is silently replaced and
    /// returned. Names are unique across nesting: any option (top-level or
    /// inside a group) that shares a name with `option` or with one of its
    /// children is removed first.
    pub fn add_option(&mut self, option: Opt) -> Option<Opt> {
        let mut replaced = None;
        for name in option.names() {
            let old = match self.remove_any(name.as_str()) {
                Some(old) => old,
                None => continue,
            };

            debug!("{}: option `{}' overwritten", self.name, old.name());
            if old.name() == option.name() {
                replaced = Some(old);
            }
        }

        if option.is_required() {
            self.required.insert(option.name().clone());
        }

        self.index_group(&option);
        self.options.insert(option.name().clone(), option);
        replaced
    }

    /// Removes `name` wherever it is, together with anything nested in it.
    fn remove_any(&mut self, name: &str) -> Option<Opt> {
        let old = match self.options.remove(name) {
            Some(old) => {
                self.required.remove(name);
                old
            }
            None => {
                let outermost = self.outermost_group(name)?;
                self.groups.remove(name);
                self.options.get_mut(outermost.as_str())?.remove_nested(name)?
            }
        };

        self.unindex_group(&old);
        Some(old)
    }

    fn outermost_group(&self, name: &str) -> Option<OptName> {
        let mut group = self.groups.get(name)?;
        while let Some(outer) = self.groups.get(group.as_str()) {
            group = outer;
        }

        Some(group.clone())
    }

    fn index_group(&mut self, option: &Opt) {
        if let Some(group) = option.as_exclusive() {
            for child in group.children() {
                self.groups.insert(child.name().clone(), option.name().clone());
                self.index_group(child);
            }
        }
    }

    fn unindex_group(&mut self, option: &Opt) {
        if let Some(group) = option.as_exclusive() {
            for child in group.children() {
                self.groups.remove(child.name());
                self.unindex_group(child);
            }
        }
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn is_option_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    /// Returns a top-level option.
    pub fn option(&self, name: &str) -> Option<&Opt> {
        self.options.get(name)
    }

    /// Returns an option by name, looking into exclusive groups as well.
    pub fn find(&self, name: &str) -> Option<&Opt> {
        if let Some(option) = self.options.get(name) {
            return Some(option);
        }

        let group = self.groups.get(name)?;
        self.find(group.as_str())?
            .as_exclusive()?
            .children()
            .iter()
            .find(|child| child.name().as_str() == name)
    }

    /// Returns the exclusive group `name` is nested in, if any.
    pub fn group_of(&self, name: &str) -> Option<&Opt> {
        self.groups.get(name).and_then(|group| self.find(group.as_str()))
    }

    /// Top-level options sorted by name.
    pub fn options(&self) -> Vec<&Opt> {
        let mut options: Vec<&Opt> = self.options.values().collect();
        options.sort_by(|a, b| a.name().cmp(b.name()));
        options
    }

    #[inline]
    pub fn required_names(&self) -> &BTreeSet<OptName> {
        &self.required
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl PartialEq for Subcommand {
    fn eq(&self, other: &Subcommand) -> bool {
        self.name == other.name
    }
}

impl Eq for Subcommand {}

impl Hash for Subcommand {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}
