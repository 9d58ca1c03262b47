//! Behavioural properties of the step engine and finaliser.

use std::sync::Arc;

use test_case::test_case;
use thicket::grammar::expr::*;
use thicket::{Forest, GrammarBuilder, Rejection, finalise, parse};

fn forest<T: Clone>(expr: Expr<char, T>) -> Forest<char, T> {
    let grammar = GrammarBuilder::new().build(expr).unwrap();
    Forest::new(Arc::new(grammar))
}

fn accepts<T: Clone>(expr: Expr<char, T>, input: &str) -> bool {
    let mut forest = forest(expr);
    for symbol in input.chars() {
        parse(symbol, &mut forest).unwrap();
    }
    finalise(&mut forest, None, None)
}

// =============================================================================
// Empty grammar
// =============================================================================

#[test]
fn test_empty_grammar_accepts_no_input() {
    let mut forest = forest::<()>(empty());
    let mut tokens = vec![()];
    let mut error = String::new();
    assert!(finalise(&mut forest, Some(&mut tokens), Some(&mut error)));
    assert!(tokens.is_empty());
    assert!(error.is_empty());
}

#[test_case("a"; "one symbol")]
#[test_case("abc"; "several symbols")]
fn test_empty_grammar_rejects_input(input: &str) {
    assert!(!accepts::<()>(empty(), input));
}

// =============================================================================
// Terminal sets
// =============================================================================

#[test_case('a', true; "first member")]
#[test_case('c', true; "last member")]
#[test_case('d', false; "non member")]
#[test_case(',', false; "punctuation")]
fn test_terminal_any_membership(symbol: char, member: bool) {
    let mut forest = forest::<()>(terminal_any(['a', 'b', 'c']));
    forest.feed(symbol).unwrap();
    assert_eq!(forest.consumed(), 1);
    assert_eq!(finalise(&mut forest, None, None), member);
}

#[test_case('a', false; "first member")]
#[test_case('c', false; "last member")]
#[test_case('d', true; "non member")]
#[test_case(',', true; "punctuation")]
fn test_terminal_not_membership(symbol: char, accepted: bool) {
    let mut forest = forest::<()>(terminal_not(['a', 'b', 'c']));
    forest.feed(symbol).unwrap();
    assert_eq!(finalise(&mut forest, None, None), accepted);
}

#[test_case(""; "nothing")]
#[test_case("ab"; "two symbols")]
fn test_terminal_consumes_exactly_one(input: &str) {
    assert!(!accepts::<()>(terminal_any(['a', 'b']), input));
}

#[test_case("", false; "nothing")]
#[test_case("x", true; "one symbol")]
#[test_case("xy", false; "two symbols")]
#[test_case("xyz", false; "three symbols")]
fn test_terminal_not_consumes_exactly_one(input: &str, accepted: bool) {
    assert_eq!(accepts::<()>(terminal_not(['a', 'b']), input), accepted);
}

#[test]
fn test_any_matches_every_symbol() {
    for symbol in ['a', '\n', '"', '\0'] {
        assert!(accepts::<()>(any(), &symbol.to_string()));
    }
}

#[test_case("AB", true; "full literal")]
#[test_case("A", false; "prefix")]
#[test_case("AC", false; "mismatch")]
#[test_case("ABB", false; "overrun")]
fn test_terminal_literal(input: &str, accepted: bool) {
    assert_eq!(accepts::<()>(terminal(['A', 'B']), input), accepted);
}

// =============================================================================
// Barriers
// =============================================================================

#[test]
fn test_barrier_consumes_nothing() {
    let mut forest = forest::<()>(barrier_any(['0']) + any());
    forest.feed('0').unwrap();
    assert_eq!(forest.consumed(), 1);
    assert!(finalise(&mut forest, None, None));
}

#[test]
fn test_barrier_rejects_other_lookahead() {
    assert!(!accepts::<()>(barrier_any(['0']) + any(), "1"));
    assert!(accepts::<()>(barrier_not(['0']) + any(), "1"));
}

#[test]
fn test_barrier_disambiguates_alternatives() {
    // Without the barrier, "ab" would match both alternatives
    let expr = (terminal_any(['a']) + any()).emit(1)
        | (terminal_any(['a']) + barrier_not(['b']) + any()).emit(2);
    let mut forest = forest(expr);
    forest.feed_all("ab".chars()).unwrap();
    assert_eq!(forest.finish(), Ok(vec![1]));

    let expr = (terminal_any(['a']) + any()).emit(1) | (terminal_any(['a']) + any()).emit(2);
    assert!(!accepts(expr, "ab"));
}

// =============================================================================
// Sequences and alternations
// =============================================================================

#[test_case("xy", true; "both match")]
#[test_case("xx", false; "second fails")]
#[test_case("yy", false; "first fails")]
#[test_case("x", false; "truncated")]
fn test_sequence_composition(input: &str, accepted: bool) {
    let expr = sequence([terminal_any(['x']), terminal_any(['y'])]);
    assert_eq!(accepts::<()>(expr, input), accepted);
}

#[test]
fn test_alternatives_explored_in_parallel() {
    let expr = (terminal(['a', 'b', 'c']).emit("abc") | terminal(['a', 'b', 'd']).emit("abd"))
        + terminal_any(['!']);
    let mut forest = forest(expr);
    forest.feed_all("ab".chars()).unwrap();
    assert_eq!(forest.live_branches(), 2);
    forest.feed_all("d!".chars()).unwrap();
    assert_eq!(forest.finish(), Ok(vec!["abd"]));
}

#[test]
fn test_ambiguous_literal_split() {
    let expr = (terminal(['A']) + terminal(['B'])).emit(1) | terminal(['A', 'B']).emit(2);
    let mut forest = forest(expr);
    parse('A', &mut forest).unwrap();
    parse('B', &mut forest).unwrap();
    let mut tokens = Vec::new();
    let mut error = String::new();
    assert!(!finalise(&mut forest, Some(&mut tokens), Some(&mut error)));
    assert!(!error.is_empty());
    assert!(tokens.is_empty());
}

#[test]
fn test_ambiguity_reported_as_such() {
    let expr = (terminal(['A']) + terminal(['B'])).emit(1) | terminal(['A', 'B']).emit(2);
    let mut forest = forest(expr);
    forest.feed_all("AB".chars()).unwrap();
    assert!(matches!(
        forest.finish(),
        Err(Rejection::Ambiguous { derivations: 2, .. })
    ));
}

#[test]
fn test_silent_ambiguity_is_still_ambiguous() {
    let mut forest = forest::<()>((terminal(['A']) + terminal(['B'])) | terminal(['A', 'B']));
    forest.feed_all("AB".chars()).unwrap();
    assert_eq!(
        forest.finish(),
        Err(Rejection::Ambiguous {
            derivations: 2,
            consumed: 2
        })
    );
}

#[test]
fn test_nested_repetition_counts_every_split() {
    // Each split of "aaaa" into non-empty runs is its own derivation
    let mut forest = forest::<()>(terminal_any(['a']).many().many());
    forest.feed_all("aaaa".chars()).unwrap();
    assert_eq!(
        forest.finish(),
        Err(Rejection::Ambiguous {
            derivations: 8,
            consumed: 4
        })
    );
}

#[test]
fn test_ambiguity_inside_capture_survives_the_capture() {
    let inner = terminal_any(['a']).emit(1) | terminal_any(['a']).emit(2);
    let mut forest = forest(inner.capture(|tokens: Vec<u32>| tokens.iter().sum::<u32>() * 10));
    forest.feed('a').unwrap();
    assert!(matches!(
        forest.finish(),
        Err(Rejection::Ambiguous { derivations: 2, .. })
    ));
}

// =============================================================================
// Repetition
// =============================================================================

fn t_run() -> Expr<char, ()> {
    terminal_any(['T']) + recurse(terminal_any(['T']) | empty()) + terminal_any(['T'])
}

#[test_case(2)]
#[test_case(3)]
#[test_case(4)]
#[test_case(5)]
#[test_case(6)]
#[test_case(7)]
#[test_case(8)]
fn test_recursive_repetition_accepts_runs(len: usize) {
    let mut forest = forest(t_run());
    forest.feed_all(std::iter::repeat_n('T', len)).unwrap();
    assert_eq!(forest.finish(), Ok(vec![]));
}

#[test_case(""; "empty")]
#[test_case("T"; "single")]
#[test_case("TTx"; "trailing junk")]
fn test_recursive_repetition_rejects(input: &str) {
    assert!(!accepts(t_run(), input));
}

#[test_case(0, ""; "zero times")]
#[test_case(3, "aaa"; "three times")]
fn test_fixed_repetition(count: usize, input: &str) {
    assert!(accepts::<()>(terminal_any(['a']).repeat(count), input));
    assert!(!accepts::<()>(terminal_any(['a']).repeat(count), &format!("{input}a")));
}

#[test]
fn test_optional() {
    let expr = || terminal_any::<char, ()>(['-']).optional() + terminal_any(['1']);
    assert!(accepts(expr(), "-1"));
    assert!(accepts(expr(), "1"));
    assert!(!accepts(expr(), "--1"));
}

#[test]
fn test_right_recursive_rule() {
    let mut builder = GrammarBuilder::<char, u32>::new();
    let list = builder.declare("list");
    builder
        .define(
            list,
            terminal_any(['x']).emit(1) + reference(list) | terminal_any(['.']).emit(0),
        )
        .unwrap();
    let grammar = builder.build(reference(list)).unwrap();
    let mut forest = Forest::new(Arc::new(grammar));
    forest.feed_all("xxxx.".chars()).unwrap();
    assert_eq!(forest.finish(), Ok(vec![1, 1, 1, 1, 0]));
}

#[test]
fn test_deep_nesting_within_default_limits() {
    let mut builder = GrammarBuilder::<char, ()>::new();
    let nested = builder.declare("nested");
    builder
        .define(
            nested,
            terminal_any(['(']) + reference(nested) + terminal_any([')']) | terminal_any(['x']),
        )
        .unwrap();
    let grammar = builder.build(reference(nested)).unwrap();
    let mut forest = Forest::new(Arc::new(grammar));
    let depth = 1100;
    let input = std::iter::repeat_n('(', depth)
        .chain(['x'])
        .chain(std::iter::repeat_n(')', depth));
    forest.feed_all(input).unwrap();
    assert!(forest.aborted().is_none());
    assert_eq!(forest.finish(), Ok(vec![]));
}

#[test]
fn test_right_recursion_stays_shallow() {
    // The sequence frame is released before its last child, so a long list
    // never approaches the recursion limit
    let mut builder = GrammarBuilder::<char, ()>::new();
    let list = builder.declare("list");
    builder
        .define(list, terminal_any(['x']) + reference(list) | empty())
        .unwrap();
    let grammar = builder.build(reference(list)).unwrap();
    let mut forest = Forest::new(Arc::new(grammar));
    forest.feed_all(std::iter::repeat_n('x', 4096)).unwrap();
    assert!(forest.branches().iter().all(|branch| branch.depth() <= 2));
    assert_eq!(forest.finish(), Ok(vec![]));
}

// =============================================================================
// Emission
// =============================================================================

#[test]
fn test_emissions_follow_completion_order() {
    let inner = terminal_any(['b']).emit("b");
    let expr = (terminal_any(['a']).emit("a") + inner).emit("ab") + terminal_any(['c']).emit("c");
    let mut forest = forest(expr);
    forest.feed_all("abc".chars()).unwrap();
    assert_eq!(forest.finish(), Ok(vec!["a", "b", "ab", "c"]));
}

#[test]
fn test_capture_replaces_inner_tokens() {
    let digit = terminal_any(['0', '1', '2', '3'])
        .emit_with(|s: &[char]| s[0].to_digit(10).unwrap_or_default());
    let sum = (digit.clone() + terminal_any(['+']) + digit)
        .capture(|tokens: Vec<u32>| tokens.iter().sum::<u32>());
    let mut forest = forest(terminal_any(['[']).emit(100) + sum + terminal_any([']']));
    forest.feed_all("[1+3]".chars()).unwrap();
    assert_eq!(forest.finish(), Ok(vec![100, 4]));
}

#[test]
fn test_emit_with_sees_matched_symbols() {
    let word = terminal_not([' ']).many().emit_with(|s: &[char]| s.iter().collect::<String>());
    let mut forest = forest(word.clone() + terminal_any([' ']) + word);
    forest.feed_all("hello world".chars()).unwrap();
    assert_eq!(
        forest.finish(),
        Ok(vec!["hello".to_string(), "world".to_string()])
    );
}

#[test]
fn test_custom_hook_traces_consumed_symbols() {
    use std::sync::Mutex;

    let seen = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&seen);
    let hook = custom::<char, (), _>(false, true, move |s: &char| {
        sink.lock().unwrap().push(*s);
    });
    let mut forest = forest(hook.many() + terminal_any(['!']));
    forest.feed_all("abc!".chars()).unwrap();
    assert!(finalise(&mut forest, None, None));
    // The hook consumes any symbol, so '!' is also offered to it
    assert_eq!(*seen.lock().unwrap(), "abc!");
}

#[test]
fn test_hook_with_both_flags_may_pass_through() {
    let hook = || custom::<char, (), _>(true, true, |_: &char| {});
    // Passes without input, then 'x' matches
    assert!(accepts(hook() + terminal_any(['x']), "x"));
    // Consumes 'y', then 'x' matches
    assert!(accepts(hook() + terminal_any(['x']), "yx"));
    assert!(!accepts(hook() + terminal_any(['x']), "yyx"));
}

#[test]
fn test_hook_with_both_flags_is_ambiguous_when_both_forms_fit() {
    let mut forest = forest::<()>(custom(true, true, |_: &char| {}) + any().optional());
    forest.feed('x').unwrap();
    assert!(matches!(
        forest.finish(),
        Err(Rejection::Ambiguous { derivations: 2, .. })
    ));
}

#[test_case(""; "no input")]
#[test_case("a"; "one symbol")]
fn test_hook_without_flags_never_matches(input: &str) {
    let never = || custom::<char, (), _>(false, false, |_: &char| {});
    assert!(!accepts(never() + any(), input));
    assert!(!accepts(never(), input));
}

#[test]
fn test_failing_hook_still_sees_lookahead() {
    use std::sync::Mutex;

    let seen = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&seen);
    let never = custom::<char, (), _>(false, false, move |s: &char| {
        sink.lock().unwrap().push(*s);
    });
    let mut forest = forest(never | terminal_any(['q']));
    forest.feed('q').unwrap();
    assert_eq!(forest.finish(), Ok(vec![]));
    assert_eq!(*seen.lock().unwrap(), "q");
}

// =============================================================================
// CSV capture
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Csv {
    Cell(String),
    Line,
}

fn unquote(symbols: &[char]) -> String {
    match symbols {
        ['"', inner @ .., '"'] => inner.iter().collect::<String>().replace("\"\"", "\""),
        bare => bare.iter().collect(),
    }
}

fn csv() -> Expr<char, Csv> {
    let bare = barrier_not(['"']) + terminal_not([',', '"', '\n']).many();
    let quoted = terminal_any(['"'])
        + (terminal_not(['"']) | terminal(['"', '"'])).many()
        + terminal_any(['"']);
    let cell = (bare | quoted).emit_with(|s: &[char]| Csv::Cell(unquote(s)));
    let line = (cell.clone() + (terminal_any([',']) + cell).many() + terminal_any(['\n']))
        .emit(Csv::Line);
    line.many()
}

#[test]
fn test_csv_header_cells() {
    let mut forest = forest(csv());
    for symbol in "a,b\n".chars() {
        parse(symbol, &mut forest).unwrap();
    }
    let mut tokens = Vec::new();
    assert!(finalise(&mut forest, Some(&mut tokens), None));
    assert_eq!(
        tokens,
        vec![
            Csv::Cell("a".into()),
            Csv::Cell("b".into()),
            Csv::Line
        ]
    );
}

#[test]
fn test_csv_quoted_cells() {
    let mut forest = forest(csv());
    forest
        .feed_all("\"x,y\",\"say \"\"hi\"\"\"\n1,\n".chars())
        .unwrap();
    assert_eq!(
        forest.finish(),
        Ok(vec![
            Csv::Cell("x,y".into()),
            Csv::Cell("say \"hi\"".into()),
            Csv::Line,
            Csv::Cell("1".into()),
            Csv::Cell(String::new()),
            Csv::Line,
        ])
    );
}

#[test_case("a,b"; "missing newline")]
#[test_case("\"open\n"; "unterminated quote")]
#[test_case("a\"b\n"; "stray quote")]
fn test_csv_rejects(input: &str) {
    assert!(!accepts(csv(), input));
}

// =============================================================================
// Forest monotonicity
// =============================================================================

#[test]
fn test_forest_depends_only_on_consumed_prefix() {
    let expr = || {
        (terminal(['a', 'b', 'c']).emit(1) | terminal(['a', 'b', 'd']).emit(2) | any().many().emit(3))
            + terminal_any(['.'])
    };
    let mut left = forest(expr());
    let mut right = forest(expr());
    for (l, r) in "abc.".chars().zip("abd.".chars()) {
        if l == r {
            left.feed(l).unwrap();
            right.feed(r).unwrap();
            assert_eq!(left.live_branches(), right.live_branches());
        } else {
            break;
        }
    }
    assert_eq!(left.consumed(), 2);
}

#[test]
fn test_dead_forest_never_revives() {
    let mut forest = forest::<()>(terminal(['o', 'k']));
    forest.feed_all("x".chars()).unwrap();
    assert!(forest.is_dead());
    forest.feed_all("ok".chars()).unwrap();
    assert!(forest.is_dead());
    assert!(!finalise(&mut forest, None, None));
}
