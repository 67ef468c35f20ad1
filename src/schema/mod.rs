//! Reads a program description from a text file.
//!
//! ```text
//! program "Quick Git" "Collection of Git shortcuts" icon "git.png"
//! option "amount" "How many" required verify whole
//! subcommand "commit" "Record changes" {
//!     exclusive "message" "Commit message" required {
//!         option "entry" "One-line message"
//!         file "from file" "Message file" verify all(file_exists, file_readable)
//!     }
//! }
//! ```
use crate::option::{ExtensionFilter, Opt};
use crate::program::Program;
use crate::subcommand::Subcommand;
use crate::verifier::{self, Verifier};
use failure::{Fail, ResultExt};
use pest::iterators::Pair;
use pest::Parser;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[grammar = "schema/schema.pest"]
struct SchemaParser;

#[derive(Debug, Fail)]
pub enum SchemaError {
    #[fail(display = "syntax error: {}", _0)]
    Syntax(String),
    #[fail(display = "line {}: unknown verifier `{}'", line, name)]
    UnknownVerifier { name: String, line: usize },
    #[fail(display = "line {}: subcommand `{}' is defined twice", line, name)]
    DuplicateSubcommand { name: String, line: usize },
}

fn line_of(pair: &Pair<Rule>) -> usize {
    pair.as_span().start_pos().line_col().0
}

fn visit_string(pair: Pair<Rule>) -> String {
    let chars = pair.into_inner().next().unwrap().as_str();
    let mut s = String::with_capacity(chars.len());
    let mut escaped = false;
    for ch in chars.chars() {
        if escaped {
            s.push(match ch {
                'n' => '\n',
                't' => '\t',
                _ => ch,
            });
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else {
            s.push(ch);
        }
    }

    s
}

fn visit_list(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner().map(visit_string).collect()
}

fn visit_expr(pair: Pair<Rule>) -> Result<Verifier, SchemaError> {
    let pair = pair.into_inner().next().unwrap();
    match pair.as_rule() {
        Rule::ident => verifier::lookup(pair.as_str()).ok_or_else(|| SchemaError::UnknownVerifier {
            name: pair.as_str().to_owned(),
            line: line_of(&pair),
        }),
        Rule::call => {
            let mut inner = pair.into_inner();
            let combinator = inner.next().unwrap().as_str();
            let args = inner.map(visit_expr).collect::<Result<Vec<_>, _>>()?;
            Ok(match combinator {
                "all" => verifier::all(args),
                "check_all" => verifier::check_all(args),
                "any" => verifier::any(args),
                _ => unreachable!(),
            })
        }
        _ => unreachable!(),
    }
}

fn visit_option(pair: Pair<Rule>) -> Result<Opt, SchemaError> {
    let rule = pair.as_rule();
    let mut inner = pair.into_inner();
    let name = visit_string(inner.next().unwrap());
    let mut description = String::new();
    let mut required = false;
    let mut verifier = None;
    let mut choices = Vec::new();
    let mut start = None;
    let mut filters = Vec::new();
    let mut children = Vec::new();
    for pair in inner {
        match pair.as_rule() {
            Rule::string => description = visit_string(pair),
            Rule::required => required = true,
            Rule::verify => verifier = Some(visit_expr(pair.into_inner().next().unwrap())?),
            Rule::list => choices.extend(visit_list(pair)),
            Rule::start => {
                start = Some(PathBuf::from(visit_string(pair.into_inner().next().unwrap())));
            }
            Rule::filter => {
                let mut inner = pair.into_inner();
                let description = visit_string(inner.next().unwrap());
                let patterns = visit_list(inner.next().unwrap());
                filters.push(ExtensionFilter::new(description, patterns));
            }
            _ => children.push(visit_option(pair)?),
        }
    }

    let mut option = match rule {
        Rule::text => Opt::new(name, description),
        Rule::flag => Opt::flag(name, description),
        Rule::radio => Opt::radio(name, description, choices),
        Rule::file => Opt::file(name, description, start, filters),
        Rule::exclusive => Opt::exclusive(name, description, children),
        _ => unreachable!(),
    };

    if required {
        option = option.required();
    }

    if let Some(verifier) = verifier {
        option = option.with_verifier(verifier);
    }

    Ok(option)
}

fn visit_subcommand(pair: Pair<Rule>) -> Result<Subcommand, SchemaError> {
    let mut inner = pair.into_inner();
    let mut subcommand = Subcommand::new(visit_string(inner.next().unwrap()));
    for pair in inner {
        match pair.as_rule() {
            Rule::string => subcommand.set_description(visit_string(pair)),
            _ => {
                subcommand.add_option(visit_option(pair)?);
            }
        }
    }

    Ok(subcommand)
}

fn visit_program(pair: Pair<Rule>) -> Program {
    let mut inner = pair.into_inner();
    let mut program = Program::new(visit_string(inner.next().unwrap()), "");
    for pair in inner {
        match pair.as_rule() {
            Rule::string => program.set_description(visit_string(pair)),
            Rule::icon => program.set_icon(visit_string(pair.into_inner().next().unwrap())),
            _ => unreachable!(),
        }
    }

    program
}

pub fn parse_schema(text: &str) -> Result<Program, SchemaError> {
    let mut pairs = SchemaParser::parse(Rule::schema, text)
        .map_err(|err| SchemaError::Syntax(err.to_string()))?;
    let mut inner = pairs.next().unwrap().into_inner();
    let mut program = visit_program(inner.next().unwrap());
    for pair in inner {
        match pair.as_rule() {
            Rule::subcommand => {
                let line = line_of(&pair);
                let subcommand = visit_subcommand(pair)?;
                let name = subcommand.name().to_owned();
                if !program.add_subcommand(subcommand) {
                    return Err(SchemaError::DuplicateSubcommand { name, line });
                }
            }
            Rule::EOI => (),
            _ => {
                program.add_option(visit_option(pair)?);
            }
        }
    }

    debug!(
        "schema: {} with {} subcommands",
        program.name(),
        program.subcommands().count()
    );
    Ok(program)
}

pub fn load_schema(path: &Path) -> Result<Program, failure::Error> {
    let text = fs::read_to_string(path)
        .with_context(|_| format!("failed to read {}", path.display()))?;
    Ok(parse_schema(&text)?)
}
