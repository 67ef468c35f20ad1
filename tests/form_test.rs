use argform::schema::parse_schema;
use argform::*;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn form_with(options: Vec<Opt>) -> RawArgumentForm {
    let mut sub = Subcommand::new("S");
    for option in options {
        sub.add_option(option);
    }

    RawArgumentForm::new(Arc::new(sub))
}

fn status<'a>(form: &'a RawArgumentForm, option: &str) -> &'a ValueStatus {
    form.option_argument(option).unwrap_or(&ValueStatus::Unset)
}

fn message(status: &ValueStatus) -> String {
    status.error().map(|e| e.message().to_owned()).unwrap_or_default()
}

fn amount() -> Opt {
    Opt::new("amount", "").with_verifier(verifier::whole_number()).required()
}

#[test]
fn whole_amount_is_submitted() {
    let mut form = form_with(vec![amount()]);
    form.post_raw_input("amount", "12").unwrap();

    let mut expected = Arguments::new();
    expected.insert("amount".to_owned(), "12".to_owned());
    assert_eq!(process_args(&form).unwrap(), expected);
}

#[test]
fn invalid_amount_blocks_submission() {
    let mut form = form_with(vec![amount()]);
    form.post_raw_input("amount", "abc").unwrap();
    assert_eq!(message(status(&form, "amount")), "Expected a whole number");

    let err = process_args(&form).unwrap_err();
    assert_eq!(err.subcommand().name(), "S");
    assert_eq!(err.missing().iter().collect::<Vec<_>>(), vec!["amount"]);
}

#[test]
fn exclusive_group_mirrors_then_rejects() {
    let mut form = form_with(vec![Opt::exclusive(
        "group",
        "",
        vec![Opt::new("ex1", ""), Opt::new("ex2", "")],
    )]);

    form.post_raw_input("ex1", "one").unwrap();
    assert_eq!(status(&form, "group"), &ValueStatus::Verified("ex1:one".to_owned()));

    form.post_raw_input("ex2", "two").unwrap();
    let group = status(&form, "group");
    assert!(!group.is_verified());
    let message = message(group);
    assert!(message.contains("ex1") && message.contains("ex2"), "{}", message);
}

#[test]
fn check_all_reports_each_failure() {
    let checked = verifier::check_all(vec![
        verifier::whole_number(),
        verifier::non_negative_whole_number(),
    ]);
    let mut form = form_with(vec![Opt::new("n", "").with_verifier(checked)]);

    form.post_raw_input("n", "-3").unwrap();
    assert_eq!(message(status(&form, "n")), "Expected a non-negative whole number");

    form.post_raw_input("n", "x").unwrap();
    assert_eq!(
        message(status(&form, "n")),
        "Expected a whole number\nExpected a non-negative whole number"
    );
}

#[test]
fn required_set_follows_construction() {
    let mut sub = Subcommand::new("S");
    sub.add_option(amount());
    sub.add_option(Opt::new("note", ""));
    sub.add_option(Opt::flag("verbose", "").required());
    sub.add_option(Opt::new("note", "again").required());
    sub.add_option(Opt::flag("verbose", "again"));

    let required: Vec<&str> = sub.required_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(required, vec!["amount", "note"]);
    assert_eq!(sub.len(), 3);
}

#[test]
fn group_child_takes_over_a_top_level_name() {
    let mut form = form_with(vec![
        Opt::new("entry", "").required(),
        Opt::exclusive("g", "", vec![Opt::new("entry", ""), Opt::new("other", "")]),
    ]);

    form.post_raw_input("entry", "x").unwrap();
    assert_eq!(status(&form, "g"), &ValueStatus::Verified("entry:x".to_owned()));

    let mut expected = Arguments::new();
    expected.insert("entry".to_owned(), "x".to_owned());
    expected.insert("g".to_owned(), "entry:x".to_owned());
    assert_eq!(process_args(&form).unwrap(), expected);
}

#[test]
fn reposting_is_idempotent() {
    let changes = Rc::new(RefCell::new(0));
    let mut form = form_with(vec![amount(), Opt::new("note", "")]);
    let counter = Rc::clone(&changes);
    form.subscribe(Box::new(move |_: &str, _: &OptName, _: &ValueStatus| {
        *counter.borrow_mut() += 1;
    }));

    form.post_raw_input("amount", "7").unwrap();
    form.post_raw_input("note", "x").unwrap();
    let first = process_args(&form).unwrap();
    form.post_raw_input("amount", "7").unwrap();
    form.post_raw_input("note", "x").unwrap();

    assert_eq!(*changes.borrow(), 2);
    assert_eq!(process_args(&form).unwrap(), first);
    assert_eq!(process_args(&form).unwrap(), first);
}

#[test]
fn schema_to_intake() {
    let program = parse_schema(
        r#"
        program "jrunner" "Runs an executable JAR"
        subcommand "run" {
            option "heap" "Maximum heap in MB" required verify all(whole, non_negative_whole)
            radio "gc" "Collector" ["G1", "Serial"]
            flag "verbose"
        }
        "#,
    )
    .unwrap();

    let calls = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&calls);
    let intake = move |sub: &str, args: Arguments, _io: Io| {
        log.borrow_mut().push((sub.to_owned(), args));
    };

    let mut session = Session::new(program, Box::new(intake), 4).unwrap();
    session.select("run").unwrap();
    session.post_raw_input("heap", "-512").unwrap();
    session.select_choice("gc", Some("G1")).unwrap();
    session.set_flag("verbose", true).unwrap();

    let err = session.submit().unwrap_err();
    assert_eq!(err.to_string(), "Missing required options for 'run': heap");

    session.post_raw_input("heap", "512").unwrap();
    session.submit().unwrap();

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    let (sub, args) = &calls[0];
    assert_eq!(sub, "run");
    let pairs: Vec<(&str, &str)> = args.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    assert_eq!(pairs, vec![("gc", "G1"), ("heap", "512"), ("verbose", "selected")]);
}
