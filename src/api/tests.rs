use super::*;
use crate::{Value, rule};

fn spans(matches: &Matches) -> Vec<(usize, usize)> {
    matches.sorted().iter().map(|m| m.span()).collect()
}

#[test]
fn longest_literal_wins_overlaps() {
    let rebulk = Rebulk::new().string(["lakers", "la"], PatternOptions::new().name("team")).unwrap();
    let matches = rebulk.matches("the lakers are from la").unwrap();
    assert_eq!(spans(&matches), vec![(4, 10), (20, 22)]);
    assert_eq!(matches.named("team").len(), 2);
}

#[test]
fn chain_yields_named_children() {
    let rebulk = Rebulk::new()
        .chain(PatternOptions::new().children(true))
        .regex([r"S(?P<season>\d+)"], PatternOptions::new().children(true))
        .unwrap()
        .regex([r"E(?P<episode>\d+)"], PatternOptions::new().children(true))
        .unwrap()
        .repeater("+")
        .unwrap()
        .close()
        .unwrap();

    let matches = rebulk.matches("Show.S01E02E03.mkv").unwrap();
    let season: Vec<String> = matches.named("season").iter().map(|m| m.raw().to_string()).collect();
    let episodes: Vec<String> = matches.named("episode").iter().map(|m| m.raw().to_string()).collect();
    assert_eq!(season, vec!["01"]);
    assert_eq!(episodes, vec!["02", "03"]);
}

#[test]
fn chain_builder_requires_parts() {
    let err = Rebulk::new().chain(PatternOptions::new()).repeater("+").unwrap_err();
    assert!(matches!(err, Error::EmptyChain));
    let err = Rebulk::new().chain(PatternOptions::new()).close().unwrap_err();
    assert!(matches!(err, Error::EmptyChain));
    let err = Rebulk::new()
        .chain(PatternOptions::new())
        .string(["a"], PatternOptions::new())
        .unwrap()
        .repeater("{2 3}")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRepeater(_)));
}

#[test]
fn defaults_layer_under_instance_options() {
    let rebulk = Rebulk::new()
        .defaults(PatternOptions::new().tag("all"))
        .string_defaults(PatternOptions::new().name("word").tag("string"))
        .regex_defaults(PatternOptions::new().name("number"))
        .string(["foo"], PatternOptions::new())
        .unwrap()
        .string(["bar"], PatternOptions::new().name("bar"))
        .unwrap()
        .regex([r"\d+"], PatternOptions::new())
        .unwrap();

    let matches = rebulk.matches("foo bar 42").unwrap();
    let foo = &matches.named("word")[0];
    assert_eq!(foo.raw(), "foo");
    assert_eq!(foo.tags, vec!["all", "string"]);
    assert_eq!(matches.named("bar").len(), 1);
    let number = &matches.named("number")[0];
    assert_eq!(number.raw(), "42");
    assert_eq!(number.tags, vec!["all"]);
}

#[test]
fn disabled_child_engines_are_skipped() {
    let child = Rebulk::new()
        .string(["bar"], PatternOptions::new().name("bar"))
        .unwrap()
        .rule(rule! { name: "child-rule", when: |_m, _c| { None } })
        .disabled(|context| context.is_set("no-child"));
    let rebulk = Rebulk::new().string(["foo"], PatternOptions::new().name("foo")).unwrap().rebulk(child);

    let matches = rebulk.matches("foo bar").unwrap();
    assert_eq!(matches.names(), vec!["foo", "bar"]);
    let rules = rebulk.effective_rules(&Context::new());
    assert_eq!(rules.names(), vec!["ConflictSolver", "PrivateRemover", "child-rule"]);

    let context = Context::new().with("no-child", true);
    let matches = rebulk.matches_with("foo bar", &context).unwrap();
    assert_eq!(matches.names(), vec!["foo"]);
    assert_eq!(rebulk.effective_patterns(&context).len(), 1);
    assert_eq!(rebulk.effective_rules(&context).len(), 2);
}

#[test]
fn disabled_engine_returns_nothing() {
    let rebulk = Rebulk::new()
        .string(["foo"], PatternOptions::new())
        .unwrap()
        .disabled(|context| context.is_set("off"));
    assert_eq!(rebulk.matches("foo").unwrap().len(), 1);
    assert!(rebulk.matches_with("foo", &Context::new().with("off", true)).unwrap().is_empty());
}

#[test]
fn markers_are_kept_apart() {
    let rebulk = Rebulk::new()
        .regex([r"\[[^\]]*\]"], PatternOptions::new().name("group").marker(true))
        .unwrap()
        .string(["abc"], PatternOptions::new().name("word"))
        .unwrap();
    let matches = rebulk.matches("[abc] abc").unwrap();
    assert_eq!(matches.markers.len(), 1);
    assert_eq!(matches.markers.named("group")[0].span(), (0, 5));
    // Markers never conflict with regular matches.
    assert_eq!(spans(&matches), vec![(1, 4), (6, 9)]);
}

#[test]
fn functional_patterns_and_rules() {
    let rebulk = Rebulk::new()
        .functional(
            |input, _| input.find("42").map(|start| Found::from(start..start + 2)).into_iter().collect(),
            PatternOptions::new().name("answer").formatter(|v| Value::Int(v.as_str().map_or(0, |s| s.len() as i64))),
        )
        .rule(rule! {
            name: "tag-answer",
            consequence: [crate::Consequence::AppendTags(vec!["found".into()])],
            when: |matches, _c| { Some(crate::Response::Matches(matches.named("answer"))) },
        });
    let matches = rebulk.matches("is it 42?").unwrap();
    let answer = &matches.tagged("found")[0];
    assert_eq!(answer.span(), (6, 8));
    assert_eq!(answer.value(), Value::Int(2));
}

#[test]
fn metrics_cover_every_pattern() {
    let rebulk = Rebulk::new()
        .string(["lakers", "la"], PatternOptions::new())
        .unwrap()
        .regex([r"\d+"], PatternOptions::new())
        .unwrap();
    let RunResult { matches, metrics } =
        rebulk.matches_with_metrics("the lakers are from la", &Context::new()).unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(metrics.patterns.len(), 2);
    assert_eq!(metrics.patterns[0].produced, 3);
    assert_eq!(metrics.patterns[1].produced, 0);
    assert_eq!(metrics.fired, vec!["ConflictSolver"]);
}

#[test]
fn without_default_rules_keeps_overlaps() {
    let rebulk = Rebulk::without_default_rules().string(["lakers", "la"], PatternOptions::new()).unwrap();
    let matches = rebulk.matches("the lakers are from la").unwrap();
    assert_eq!(spans(&matches), vec![(4, 6), (4, 10), (20, 22)]);
}

fn mixed_engine() -> Rebulk {
    Rebulk::new()
        .string(["café", "déjà"], PatternOptions::new().name("word").ignore_case(true))
        .unwrap()
        .regex([r"(?P<number>\d+)"], PatternOptions::new().name("numeric").every(true))
        .unwrap()
        .functional(
            |input, _| {
                input
                    .char_indices()
                    .filter(|(_, c)| !c.is_ascii() && !c.is_alphabetic())
                    .map(|(start, c)| Found::new(start, start + c.len_utf8()))
                    .collect()
            },
            PatternOptions::new().name("symbol"),
        )
        .chain(PatternOptions::new().name("episode"))
        .regex([r"S\d+"], PatternOptions::new())
        .unwrap()
        .regex([r"E\d+"], PatternOptions::new())
        .unwrap()
        .repeater("+")
        .unwrap()
        .close()
        .unwrap()
}

const MIXED_INPUT: &str = "Café · DÉJÀ vu · S01E02E03 42 ünïcode";

fn summary(matches: &Matches) -> Vec<((usize, usize), Option<String>, Value)> {
    matches.iter().map(|m| (m.span(), m.name.clone(), m.value())).collect()
}

#[test]
fn spans_stay_inside_the_input() {
    let matches = mixed_engine().matches(MIXED_INPUT).unwrap();
    assert!(matches.named("word").len() >= 2);
    assert_eq!(matches.named("symbol").len(), 2);
    assert_eq!(matches.named("episode").len(), 1);

    let mut stack: Vec<&Match> = matches.iter().chain(matches.markers.iter()).map(|m| m.as_ref()).collect();
    while let Some(m) = stack.pop() {
        assert!(m.start < m.end, "{m}");
        assert!(m.end <= MIXED_INPUT.len(), "{m}");
        assert!(MIXED_INPUT.is_char_boundary(m.start) && MIXED_INPUT.is_char_boundary(m.end), "{m}");
        stack.extend(m.children.iter());
    }
}

#[test]
fn repeated_runs_are_identical() {
    let rebulk = mixed_engine();
    let first = rebulk.matches(MIXED_INPUT).unwrap();
    let second = rebulk.matches(MIXED_INPUT).unwrap();
    assert!(!first.is_empty());
    assert_eq!(summary(&first), summary(&second));
}
