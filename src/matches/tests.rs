use std::sync::Arc;

use super::{Match, Matches};
use crate::{Error, Value};

const INPUT: &str = "One Two Three Four";

fn sample() -> (Matches, Vec<Arc<Match>>) {
    let input: Arc<str> = Arc::from(INPUT);
    let mut matches = Matches::new(Arc::clone(&input));
    let spans = [(0, 3, "one", "odd"), (4, 7, "two", "even"), (8, 13, "three", "odd"), (14, 18, "four", "even")];
    let pushed = spans
        .iter()
        .map(|&(start, end, name, tag)| {
            matches.push(Match::new(start, end, Arc::clone(&input)).with_name(name).with_tags([tag])).unwrap()
        })
        .collect();
    (matches, pushed)
}

#[test]
fn lookups_by_name_tag_and_position() {
    let (matches, pushed) = sample();
    assert_eq!(matches.named("two").len(), 1);
    assert_eq!(matches.tagged("odd").len(), 2);
    assert!(Arc::ptr_eq(&matches.starting(8)[0], &pushed[2]));
    assert!(Arc::ptr_eq(&matches.ending(18)[0], &pushed[3]));
    assert!(Arc::ptr_eq(&matches.at_index(5)[0], &pushed[1]));
    assert!(matches.at_index(3).is_empty());
    assert_eq!(matches.names(), vec!["one", "two", "three", "four"]);
    assert_eq!(matches.tags(), vec!["odd", "even"]);
}

#[test]
fn indexes_follow_mutations_after_first_query() {
    let (mut matches, pushed) = sample();
    assert_eq!(matches.named("three").len(), 1);
    assert!(matches.remove(&pushed[2]));
    assert!(!matches.remove(&pushed[2]));
    assert!(matches.named("three").is_empty());
    assert!(matches.at_index(10).is_empty());

    let again = matches.push(Match::new(8, 13, Arc::from(INPUT)).with_name("three")).unwrap();
    assert!(Arc::ptr_eq(&matches.named("three")[0], &again));
    assert_eq!(matches.len(), 4);
}

#[test]
fn previous_next_and_range() {
    let (matches, pushed) = sample();
    let prev = matches.previous(&pushed[2]);
    assert_eq!(prev.len(), 1);
    assert!(Arc::ptr_eq(&prev[0], &pushed[1]));
    let next = matches.next(&pushed[2]);
    assert!(Arc::ptr_eq(&next[0], &pushed[3]));
    assert!(matches.previous(&pushed[0]).is_empty());
    assert!(matches.next(&pushed[3]).is_empty());

    let names: Vec<_> = matches.range(5, Some(9)).iter().filter_map(|m| m.name.clone()).collect();
    assert_eq!(names, vec!["two", "three"]);
    assert_eq!(matches.range(0, None).len(), 4);
}

#[test]
fn conflicting_excludes_self() {
    let (mut matches, pushed) = sample();
    let wide = matches.push(Match::new(2, 9, Arc::from(INPUT))).unwrap();
    let conflicts = matches.conflicting(&wide);
    assert_eq!(conflicts.len(), 3);
    assert!(!conflicts.iter().any(|m| Arc::ptr_eq(m, &wide)));
    assert_eq!(matches.conflicting(&pushed[3]).len(), 0);
}

#[test]
fn chain_walks_over_separators_only() {
    let (matches, pushed) = sample();
    let after = matches.chain_after(pushed[0].end, " ", |_| true);
    assert_eq!(after.len(), 3);
    let before = matches.chain_before(pushed[3].start, " ", |_| true);
    assert_eq!(before.len(), 3);
    assert!(Arc::ptr_eq(&before[0], &pushed[2]));
    // "Three" is odd: the walk stops on its first uncovered character.
    assert!(matches.chain_before(pushed[3].start, " ", |m| m.tagged("even")).is_empty());
    assert!(matches.chain_after(3, "", |_| true).is_empty());
}

#[test]
fn holes_between_matches() {
    let input: Arc<str> = Arc::from("abc def ghi");
    let mut matches = Matches::new(Arc::clone(&input));
    matches.push(Match::new(4, 7, Arc::clone(&input))).unwrap();
    let holes: Vec<_> = matches.holes(0, None, "", |_| false).iter().map(|h| h.span()).collect();
    assert_eq!(holes, vec![(0, 4), (7, 11)]);
    let holes: Vec<_> = matches.holes(0, None, " ", |_| false).iter().map(|h| h.span()).collect();
    assert_eq!(holes, vec![(0, 3), (8, 11)]);
    let holes: Vec<_> = matches.holes(0, None, "", |_| true).iter().map(|h| h.span()).collect();
    assert_eq!(holes, vec![(0, 11)]);
}

#[test]
fn to_dict_collapses_repeated_names() {
    let input: Arc<str> = Arc::from("a b a c");
    let mut matches = Matches::new(Arc::clone(&input));
    for (start, name) in [(0, "x"), (2, "y"), (4, "x"), (6, "x")] {
        matches.push(Match::new(start, start + 1, Arc::clone(&input)).with_name(name)).unwrap();
    }
    matches.push(Match::new(0, 7, Arc::clone(&input))).unwrap();

    let dict = matches.to_dict(true, false, false);
    assert_eq!(dict.len(), 2);
    assert_eq!(dict.get("x"), Some(&Value::from(vec!["a", "c"])));
    assert_eq!(dict.get("y"), Some(&Value::from("b")));
    assert_eq!(dict.matches("x").len(), 3);
    assert_eq!(dict.values_list("x").len(), 2);

    let first = matches.to_dict(false, true, false);
    assert_eq!(first.get("x"), Some(&Value::from("a")));
    assert!(first.matches("x").is_empty());

    let listed = matches.to_dict(false, false, true);
    assert_eq!(listed.get("y"), Some(&Value::from(vec!["b"])));
}

#[test]
fn to_dict_extends_list_values() {
    let input: Arc<str> = Arc::from("1 2 3");
    let mut matches = Matches::new(Arc::clone(&input));
    matches.push(Match::new(0, 1, Arc::clone(&input)).with_name("n").with_value(vec![1, 2])).unwrap();
    matches.push(Match::new(2, 3, Arc::clone(&input)).with_name("n").with_value(3)).unwrap();
    matches.push(Match::new(4, 5, Arc::clone(&input)).with_name("n").with_value(3)).unwrap();

    let dict = matches.to_dict(false, false, false);
    assert_eq!(dict.get("n"), Some(&Value::from(vec![1, 2, 3])));
}

#[test]
fn markers_are_kept_apart() {
    let input: Arc<str> = Arc::from("[group] title");
    let mut matches = Matches::new(Arc::clone(&input));
    let marker = Match::new(0, 7, Arc::clone(&input)).with_marker(true);
    assert!(matches!(matches.push(marker.clone()), Err(Error::MarkerMismatch { .. })));
    matches.markers.push(marker).unwrap();
    assert!(matches.markers.push(Match::new(8, 13, Arc::clone(&input))).is_err());
    assert_eq!(matches.markers.at_index(3).len(), 1);
    assert!(matches.is_empty());
}

#[test]
fn value_resolution_order() {
    let input: Arc<str> = Arc::from("S01E02");
    let raw = Match::new(4, 6, Arc::clone(&input));
    assert_eq!(raw.value(), Value::from("02"));
    let formatted = raw.clone().with_formatter(|v| Value::Int(v.as_str().and_then(|s| s.parse().ok()).unwrap_or(0)));
    assert_eq!(formatted.value(), Value::Int(2));
    let forced = formatted.with_value("two");
    assert_eq!(forced.value(), Value::from("two"));
}

#[test]
fn initiator_follows_parents() {
    let input: Arc<str> = Arc::from("abcdef");
    let root = Arc::new(Match::new(0, 6, Arc::clone(&input)).with_name("root"));
    let mut middle = Match::new(0, 3, Arc::clone(&input));
    middle.parent = Some(Arc::clone(&root));
    let mut leaf = Match::new(1, 2, Arc::clone(&input));
    leaf.parent = Some(Arc::new(middle));
    assert_eq!(leaf.initiator().name.as_deref(), Some("root"));
    assert_eq!(root.initiator().span(), (0, 6));
}

#[test]
fn crop_and_split() {
    let input: Arc<str> = Arc::from("abc.def-ghi");
    let m = Match::new(0, 11, Arc::clone(&input)).with_name("title");

    let spans = |pieces: Vec<Match>| pieces.iter().map(Match::span).collect::<Vec<_>>();
    assert_eq!(spans(m.crop(&[(3, 4)])), vec![(0, 3), (4, 11)]);
    assert_eq!(spans(m.crop(&[(0, 4), (7, 11)])), vec![(4, 7)]);
    assert_eq!(spans(m.crop(&[(0, 11)])), Vec::<(usize, usize)>::new());
    assert_eq!(spans(m.crop(&[(20, 30)])), vec![(0, 11)]);

    let pieces = m.split(".-");
    assert_eq!(spans(pieces.clone()), vec![(0, 3), (4, 7), (8, 11)]);
    assert_eq!(pieces[1].raw(), "def");
    assert_eq!(pieces[1].name.as_deref(), Some("title"));
}

#[test]
fn names_walks_children() {
    let input: Arc<str> = Arc::from("S01E02");
    let mut parent = Match::new(0, 6, Arc::clone(&input)).with_name("episode");
    parent.children.push(Match::new(1, 3, Arc::clone(&input)).with_name("season"));
    parent.children.push(Match::new(4, 6, Arc::clone(&input)).with_name("episode"));
    assert_eq!(parent.names(), vec!["episode", "season"]);
    assert_eq!(parent.children_named("season").len(), 1);
    assert_eq!(parent.to_string(), "<S01E02:(0, 6)+name=episode>");
}
