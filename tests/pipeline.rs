use ltl2buchi::{graph::io::read_graph_str, prelude::*};
use pretty_assertions::assert_eq;

fn valuation(values: &[(&str, bool)]) -> Map<String, bool> {
    values.iter().map(|(a, v)| (a.to_string(), *v)).collect()
}

#[test_log::test]
fn until_accepts_prefixes_of_a_followed_by_b() {
    let session = Session::new();
    let (a, b) = (session.prop("a".to_string()), session.prop("b".to_string()));
    let automaton = Translator::new(&session)
        .translate(&session.until(&a, &b))
        .unwrap();

    let initial = [automaton.initial()];
    let waiting = automaton.step(&initial, &valuation(&[("a", true), ("b", false)]));
    assert!(!waiting.is_empty());
    let stuck = automaton.step(&initial, &valuation(&[("a", false), ("b", false)]));
    assert!(stuck.is_empty());

    let done = automaton.step(&waiting, &valuation(&[("a", false), ("b", true)]));
    assert!(!done.is_empty());
    let after = automaton.step(&done, &valuation(&[("a", false), ("b", false)]));
    assert!(!after.is_empty());
}

#[test_log::test]
fn unsatisfiable_formula_reduces_to_the_empty_graph() {
    let session = Session::new();
    let a = session.prop("a".to_string());
    let contradiction = session.and(&a, &session.not(&a));
    let translator =
        Translator::new(&session).with_options(TranslationOptions::default().with_rewrite(false));

    let mut graph = translator.translate_to_graph(&contradiction).unwrap();
    assert_eq!(graph.size(), 1);
    assert_eq!(graph.edge_count(), 0);

    let summary = reduce(&mut graph);
    assert_eq!(summary.removed_nodes, 1);
    assert!(graph.is_empty());
}

#[test_log::test]
fn translated_graphs_survive_writing_and_reduction() {
    let session = Session::new();
    let (p, q) = (session.prop("p".to_string()), session.prop("q".to_string()));
    let formulas = [
        session.always(&session.eventually(&p)),
        session.until(&p, &session.next(&q)),
        session.and(&session.eventually(&p), &session.eventually(&q)),
        session.release(&p, &session.or(&q, &session.next(&p))),
    ];

    for formula in &formulas {
        let graph = Translator::new(&session).translate_to_graph(formula).unwrap();
        let text = graph.to_string();
        let mut reread = read_graph_str(&text).unwrap();
        assert_eq!(reread.to_string(), text);

        let nodes = reread.size();
        reduce(&mut reread);
        assert!(reread.size() <= nodes);
        // every formula above is satisfiable, so an accepting cycle survives
        assert!(!reread.is_empty(), "{formula} lost its language");

        let reduced = reread.to_string();
        let again = reduce(&mut reread);
        assert_eq!(again.removed_nodes + again.cleared_marks, 0);
        assert_eq!(reread.to_string(), reduced);
    }
}

#[test]
fn custom_rules_are_used_for_rewriting() {
    let session = Session::new();
    let x = session.prop("x".to_string());
    let rules = RuleTable::new();
    let (pattern, replacement) = {
        let r = rules.session();
        let (p, q) = (r.prop("p".to_string()), r.prop("q".to_string()));
        (r.and(&p, &r.or(&p, &q)), p)
    };
    let rules = rules.with_rule(pattern, replacement).unwrap();

    let y = session.next(&session.prop("y".to_string()));
    let translator = Translator::new(&session).with_rules(rules);
    let prepared = translator.prepare(&session.and(&session.or(&y, &x), &x));
    assert_eq!(prepared, x);
}
