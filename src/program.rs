use crate::option::Opt;
use crate::subcommand::Subcommand;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A program is a collection of options and subcommands.
///
/// The program's own options live in a subcommand named after the program,
/// which always comes first.
#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    description: String,
    icon: Option<PathBuf>,
    /// Shared with the forms once a session starts.
    subcommands: Vec<Arc<Subcommand>>,
}

impl Program {
    pub fn new<N: Into<String>, D: Into<String>>(name: N, description: D) -> Program {
        let name = name.into();
        let description = description.into();
        let itself = Subcommand::new(name.clone()).with_description(description.clone());
        Program {
            name,
            description,
            icon: None,
            subcommands: vec![Arc::new(itself)],
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description<D: Into<String>>(&mut self, description: D) {
        self.description = description.into();
        Arc::make_mut(&mut self.subcommands[0]).set_description(self.description.clone());
    }

    pub fn set_icon<P: Into<PathBuf>>(&mut self, icon: P) {
        self.icon = Some(icon.into());
    }

    pub fn icon(&self) -> Option<&Path> {
        self.icon.as_deref()
    }

    /// Adds an option to the program itself.
    pub fn add_option(&mut self, option: Opt) -> Option<Opt> {
        Arc::make_mut(&mut self.subcommands[0]).add_option(option)
    }

    /// Returns `false` (and drops `subcommand`) if the name is already taken.
    pub fn add_subcommand(&mut self, subcommand: Subcommand) -> bool {
        if self.subcommand(subcommand.name()).is_some() {
            warn!("{}: subcommand `{}' already exists", self.name, subcommand.name());
            return false;
        }

        self.subcommands.push(Arc::new(subcommand));
        true
    }

    pub fn program_options(&self) -> &Subcommand {
        &self.subcommands[0]
    }

    pub fn subcommand(&self, name: &str) -> Option<&Subcommand> {
        self.subcommands
            .iter()
            .find(|sub| sub.name() == name)
            .map(|sub| &**sub)
    }

    /// The program's own subcommand first, then the others in the order
    /// they were added.
    pub fn subcommands(&self) -> impl Iterator<Item = &Subcommand> {
        self.subcommands.iter().map(|sub| &**sub)
    }

    pub(crate) fn shared_subcommands(&self) -> &[Arc<Subcommand>] {
        &self.subcommands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn program_is_its_own_subcommand() {
        let mut program = Program::new("git", "The stupid content tracker");
        program.add_option(Opt::flag("version", "Print the version").required());

        let itself = program.program_options();
        assert_eq!(itself.name(), "git");
        assert_eq!(itself.description(), "The stupid content tracker");
        assert!(itself.is_option_required("version"));
        assert_eq!(program.subcommand("git"), Some(itself));
    }

    #[test]
    fn subcommand_names_are_unique() {
        let mut program = Program::new("git", "");
        assert!(program.add_subcommand(Subcommand::new("commit")));
        assert!(program.add_subcommand(Subcommand::new("push")));
        assert!(!program.add_subcommand(Subcommand::new("commit")));
        assert!(!program.add_subcommand(Subcommand::new("git")));

        let names: Vec<&str> = program.subcommands().map(Subcommand::name).collect();
        assert_eq!(names, vec!["git", "commit", "push"]);
    }

    #[test]
    fn icon_and_description() {
        let mut program = Program::new("jrunner", "old");
        assert!(program.icon().is_none());
        program.set_icon("icons/jrunner.png");
        program.set_description("Runs an executable JAR");

        assert_eq!(program.icon(), Some(Path::new("icons/jrunner.png")));
        assert_eq!(program.program_options().description(), "Runs an executable JAR");
    }
}
