use std::sync::{Arc, Mutex};

use super::*;
use crate::{Context, Error, Match, Matches};

const INPUT: &str = "the lakers are from la";

fn collection(spans: &[(usize, usize, &str)]) -> Matches {
    let input: Arc<str> = Arc::from(INPUT);
    let mut matches = Matches::new(Arc::clone(&input));
    for &(start, end, name) in spans {
        matches.push(Match::new(start, end, Arc::clone(&input)).with_name(name)).unwrap();
    }
    matches
}

fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &str, priority: i32, dependency: &[&str]) -> FnRule {
    let log = Arc::clone(log);
    let label = name.to_string();
    FnRule::new(name, move |_, _| {
        log.lock().unwrap().push(label.clone());
        None
    })
    .with_priority(priority)
    .with_dependency(dependency.iter().map(|d| d.to_string()).collect())
}

fn spans(matches: &Matches) -> Vec<(usize, usize)> {
    matches.sorted().iter().map(|m| m.span()).collect()
}

#[test]
fn priority_then_dependency_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut rules = Rules::new();
    rules
        .load(recorder(&log, "late", -5, &[]))
        .load(recorder(&log, "b", 0, &["a"]))
        .load(recorder(&log, "a", 0, &[]))
        .load(recorder(&log, "c", 0, &[]))
        .load(recorder(&log, "early", 10, &[]))
        .load(recorder(&log, "d", 0, &["b", "unknown"]));

    let mut matches = collection(&[]);
    let fired = rules.execute_all_rules(&mut matches, &Context::new()).unwrap();
    assert!(fired.is_empty());
    assert_eq!(*log.lock().unwrap(), vec!["early", "a", "c", "b", "d", "late"]);
}

#[test]
fn configuration_errors_leave_matches_untouched() {
    let remove_all = || {
        rule! {
            name: "remove-all",
            consequence: [Consequence::RemoveMatch],
            when: |matches, _context| { Some(Response::Matches(matches.iter().cloned().collect())) },
        }
    };

    let mut duplicated = Rules::new();
    duplicated.load(remove_all().with_priority(5)).load(remove_all()).load(remove_all());
    let mut matches = collection(&[(4, 10, "team")]);
    let err = duplicated.execute_all_rules(&mut matches, &Context::new()).unwrap_err();
    assert!(matches!(err, Error::DuplicateRule { priority: 0, .. }));
    assert_eq!(matches.len(), 1);

    let mut cyclic = Rules::new();
    cyclic
        .load(remove_all().with_priority(5))
        .load(rule! { name: "x", dependency: ["y"], when: |_m, _c| { None } })
        .load(rule! { name: "y", dependency: ["x"], when: |_m, _c| { None } });
    let err = cyclic.execute_all_rules(&mut matches, &Context::new()).unwrap_err();
    match err {
        Error::CyclicDependency { priority, rules } => {
            assert_eq!(priority, 0);
            assert_eq!(rules, vec!["x", "y"]);
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(matches.len(), 1);
}

#[test]
fn disabled_and_falsy_rules_do_not_fire() {
    let mut rules = Rules::new();
    rules
        .load(
            rule! { name: "off", consequence: [Consequence::RemoveMatch],
                when: |m, _c| { Some(Response::Matches(m.iter().cloned().collect())) } }
            .enabled_when(|ctx| ctx.is_set("enable")),
        )
        .load(rule! { name: "empty", consequence: [Consequence::RemoveMatch],
            when: |_m, _c| { Some(Response::Matches(Vec::new())) } });

    let mut matches = collection(&[(4, 10, "team")]);
    let fired = rules.execute_all_rules(&mut matches, &Context::new()).unwrap();
    assert!(fired.is_empty());
    assert_eq!(matches.len(), 1);

    let fired = rules.execute_all_rules(&mut matches, &Context::new().with("enable", true)).unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].0, "off");
    assert!(matches.is_empty());
}

#[test]
fn consequences_rename_tag_and_append() {
    let mut matches = collection(&[(4, 10, "team"), (20, 22, "city")]);
    let team = matches.named("team")[0].clone();

    let renamed = Consequence::RenameMatch("club".into()).apply(&mut matches, vec![team]).unwrap();
    assert_eq!(renamed.len(), 1);
    assert!(matches.named("team").is_empty());
    assert_eq!(matches.named("club").len(), 1);

    let city = matches.named("city");
    Consequence::AppendTags(vec!["place".into()]).apply(&mut matches, city).unwrap();
    let city = matches.tagged("place");
    assert_eq!(city.len(), 1);
    Consequence::RemoveTags(vec!["place".into()]).apply(&mut matches, city).unwrap();
    assert!(matches.tagged("place").is_empty());

    let extra = Arc::new(Match::new(0, 3, Arc::from(INPUT)));
    let appended = Consequence::AppendMatch(Some("article".into())).apply(&mut matches, vec![extra]).unwrap();
    assert_eq!(appended.len(), 1);
    assert_eq!(matches.named("article").len(), 1);
    let again = matches.named("article");
    assert!(Consequence::AppendMatch(None).apply(&mut matches, again).unwrap().is_empty());
    assert_eq!(matches.len(), 3);
}

#[test]
fn per_consequence_responses() {
    let rule = rule! {
        name: "split",
        consequence: [Consequence::RemoveMatch, Consequence::RenameMatch("renamed".into())],
        when: |m, _c| { Some(Response::PerConsequence(vec![m.named("a"), m.named("b")])) },
    };
    let mut rules = Rules::new();
    rules.load(rule);
    let mut matches = collection(&[(0, 3, "a"), (4, 10, "b")]);
    rules.execute_all_rules(&mut matches, &Context::new()).unwrap();
    assert_eq!(matches.names(), vec!["renamed"]);
}

#[test]
fn conflict_solver_keeps_longest() {
    // "la" inside "lakers" loses; the standalone "la" has no conflict.
    let mut matches = collection(&[(4, 6, "la"), (4, 10, "lakers"), (20, 22, "la")]);
    let mut rules = Rules::new();
    rules.load(ConflictSolver);
    rules.execute_all_rules(&mut matches, &Context::new()).unwrap();
    assert_eq!(spans(&matches), vec![(4, 10), (20, 22)]);
}

#[test]
fn conflict_solver_keeps_equal_lengths() {
    let mut matches = collection(&[(4, 8, "x"), (6, 10, "y")]);
    let response = ConflictSolver.when(&matches, &Context::new());
    assert!(response.is_none());
    let mut rules = Rules::new();
    rules.load(ConflictSolver);
    rules.execute_all_rules(&mut matches, &Context::new()).unwrap();
    assert_eq!(matches.len(), 2);
}

#[test]
fn custom_conflict_solver_precedence() {
    let input: Arc<str> = Arc::from(INPUT);
    let mut matches = Matches::new(Arc::clone(&input));
    let mut short = Match::new(4, 6, Arc::clone(&input)).with_name("short");
    // The shorter match claims victory over anything it overlaps.
    short.conflict_solver = Some(Arc::new(|_: &Match, _: &Match| Resolution::RemoveSecond));
    matches.push(short).unwrap();
    matches.push(Match::new(4, 10, Arc::clone(&input)).with_name("long")).unwrap();

    let mut rules = Rules::new();
    rules.load(ConflictSolver);
    rules.execute_all_rules(&mut matches, &Context::new()).unwrap();
    assert_eq!(matches.names(), vec!["short"]);

    // A solver without opinion defers to the other side, then to the default.
    let mut matches = Matches::new(Arc::clone(&input));
    let mut short = Match::new(4, 6, Arc::clone(&input)).with_name("short");
    short.conflict_solver = Some(Arc::new(|_: &Match, _: &Match| Resolution::Default));
    let mut long = Match::new(4, 10, Arc::clone(&input)).with_name("long");
    long.conflict_solver = Some(Arc::new(|_: &Match, _: &Match| Resolution::KeepBoth));
    matches.push(short).unwrap();
    matches.push(long).unwrap();
    rules.execute_all_rules(&mut matches, &Context::new()).unwrap();
    assert_eq!(matches.len(), 2);
}

#[test]
fn private_matches_are_ignored_then_removed() {
    let input: Arc<str> = Arc::from(INPUT);
    let mut matches = Matches::new(Arc::clone(&input));
    matches.push(Match::new(4, 10, Arc::clone(&input)).with_private(true)).unwrap();
    matches.push(Match::new(4, 6, Arc::clone(&input)).with_name("la")).unwrap();

    let mut rules = Rules::new();
    rules.load(PrivateRemover).load(ConflictSolver);
    let fired = rules.execute_all_rules(&mut matches, &Context::new()).unwrap();
    assert_eq!(fired.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(), vec!["PrivateRemover"]);
    assert_eq!(matches.names(), vec!["la"]);
}

struct Uppercase;

impl Rule for Uppercase {
    fn when(&self, _matches: &Matches, _context: &Context) -> Option<Response> {
        Some(Response::Triggered)
    }
}

#[test]
fn type_rules_are_named_after_their_type() {
    assert!(rule_name::<Uppercase>().ends_with("Uppercase"));
    assert_eq!(Uppercase.name(), rule_name::<Uppercase>());
    let mut rules = Rules::new();
    rules.load(Uppercase);
    let mut matches = collection(&[]);
    let fired = rules.execute_all_rules(&mut matches, &Context::new()).unwrap();
    assert!(matches!(fired[0].1, Response::Triggered));
}
