use fastrand::Rng;

use crate::{
    formula::{Formula, Session},
    graph::{AcceptancePlacement, ElementAttributes, Graph, GraphAttributes, GraphType},
    guard::{Guard, Literal},
    word::LassoWord,
    Map,
};

/// The name of the proposition with the given index.
pub fn proposition_name(index: usize) -> String {
    format!("p{index}")
}

/// Iterator producing random formulas of a fixed length over `names` propositions `p0`, `p1`, ...
///
/// The length counts operators and propositions. A formula of length one is a proposition, one of
/// length two negates or nexts a proposition. Longer formulas are, with probability
/// `until_or_release`, an until or a release whose operands split the remaining length, and
/// otherwise with equal chance a unary formula or a conjunction or disjunction.
///
/// ```
/// use ltl2buchi::{random::FormulaGenerator, Session};
///
/// let session = Session::new();
/// let mut rng = fastrand::Rng::with_seed(7);
/// let formulas = FormulaGenerator::new(&session, &mut rng, 10, 3, 1.0 / 3.0);
/// assert_eq!(formulas.take(5).count(), 5);
/// ```
pub struct FormulaGenerator<'a> {
    session: &'a Session<String>,
    rng: &'a mut Rng,
    length: usize,
    names: usize,
    until_or_release: f64,
}

impl<'a> FormulaGenerator<'a> {
    /// Creates a generator. Panics if `length` or `names` is zero or if `until_or_release` is not
    /// a probability.
    pub fn new(
        session: &'a Session<String>,
        rng: &'a mut Rng,
        length: usize,
        names: usize,
        until_or_release: f64,
    ) -> Self {
        assert!(length > 0, "formulas can not be empty");
        assert!(names > 0, "need at least one proposition");
        assert!(
            (0.0..=1.0).contains(&until_or_release),
            "{until_or_release} is not a probability"
        );
        Self {
            session,
            rng,
            length,
            names,
            until_or_release,
        }
    }

    fn formula(&mut self, length: usize) -> Formula<String> {
        let s = self.session;
        match length {
            0 | 1 => s.prop(proposition_name(self.rng.usize(..self.names))),
            2 => {
                let sub = self.formula(1);
                self.unary(&sub)
            }
            _ => {
                let split = 1 + self.rng.usize(..length - 2);
                if self.rng.f64() < self.until_or_release {
                    let (l, r) = (self.formula(split), self.formula(length - split - 1));
                    if self.rng.bool() {
                        s.until(&l, &r)
                    } else {
                        s.release(&l, &r)
                    }
                } else if self.rng.bool() {
                    let sub = self.formula(length - 1);
                    self.unary(&sub)
                } else {
                    let (l, r) = (self.formula(split), self.formula(length - split - 1));
                    if self.rng.bool() {
                        s.and(&l, &r)
                    } else {
                        s.or(&l, &r)
                    }
                }
            }
        }
    }

    fn unary(&mut self, sub: &Formula<String>) -> Formula<String> {
        if self.rng.bool() {
            self.session.not(sub)
        } else {
            self.session.next(sub)
        }
    }
}

impl<'a> Iterator for FormulaGenerator<'a> {
    type Item = Formula<String>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.formula(self.length))
    }
}

/// Draws a single random formula, see [`FormulaGenerator`].
pub fn random_formula(
    session: &Session<String>,
    rng: &mut Rng,
    length: usize,
    names: usize,
) -> Formula<String> {
    FormulaGenerator::new(session, rng, length, names, 1.0 / 3.0).formula(length)
}

/// Draws an ultimately periodic word over the propositions `p0`, `p1`, ... with a spoke of at most
/// `max_spoke` letters and a cycle of one to `max_cycle` letters. Each letter assigns every one of
/// the `names` propositions. Panics if `max_cycle` is zero.
///
/// ```
/// use ltl2buchi::random::random_word;
///
/// let mut rng = fastrand::Rng::with_seed(7);
/// let word = random_word(&mut rng, 2, 3, 2);
/// assert!(word.spoke().len() <= 3);
/// assert!((1..=2).contains(&word.cycle().len()));
/// ```
pub fn random_word(
    rng: &mut Rng,
    names: usize,
    max_spoke: usize,
    max_cycle: usize,
) -> LassoWord<String> {
    assert!(max_cycle > 0, "the cycle needs at least one letter");
    fn letter(rng: &mut Rng, names: usize) -> Map<String, bool> {
        (0..names)
            .map(|i| (proposition_name(i), rng.bool()))
            .collect()
    }

    let spoke = (0..rng.usize(..=max_spoke))
        .map(|_| letter(rng, names))
        .collect();
    let cycle = (0..=rng.usize(..max_cycle))
        .map(|_| letter(rng, names))
        .collect();
    LassoWord::ultimately_periodic(spoke, cycle)
}

/// Generates a random graph with `size` nodes over the propositions `p0` and `p1`. Every node gets
/// up to `max_degree` outgoing edges to uniformly drawn targets. The graph is a Büchi graph if
/// `sets` is one and a generalized Büchi graph otherwise, acceptance is placed on nodes or edges
/// with equal chance and every element carries each mark with probability one third.
pub fn random_graph(rng: &mut Rng, size: usize, max_degree: usize, sets: usize) -> Graph {
    let ty = match sets {
        0 | 1 => GraphType::Buchi,
        sets => GraphType::Generalized { sets },
    };
    let placement = if rng.bool() {
        AcceptancePlacement::Nodes
    } else {
        AcceptancePlacement::Edges
    };
    let mut graph = Graph::new(GraphAttributes::new(ty, placement));

    let marks = |rng: &mut Rng, carrier: AcceptancePlacement| {
        let mut attributes = ElementAttributes::new();
        if carrier == placement {
            for i in 0..ty.sets() {
                if rng.usize(..3) == 0 {
                    attributes.marks_mut().insert(i);
                }
            }
        }
        attributes
    };

    for _ in 0..size {
        let attributes = marks(rng, AcceptancePlacement::Nodes);
        graph.add_node(attributes);
    }
    for source in 0..size {
        for _ in 0..rng.usize(..=max_degree) {
            let target = rng.usize(..size);
            let guard: Guard<String> = (0..2)
                .filter_map(|i| match rng.usize(..3) {
                    0 => Some(Literal::Positive(proposition_name(i))),
                    1 => Some(Literal::Negative(proposition_name(i))),
                    _ => None,
                })
                .collect();
            let attributes = marks(rng, AcceptancePlacement::Edges);
            graph.add_edge(source, target, guard, "-".to_string(), attributes);
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::{random_formula, random_graph, random_word, FormulaGenerator};
    use crate::{
        formula::Session,
        graph::io::read_graph_str,
        rewrite::{Rewriter, RuleTable},
        tableau::{expand, MergeStrategy},
        translate::{TranslationOptions, Translator},
    };

    #[test]
    fn formulas_use_the_given_propositions() {
        let session = Session::new();
        let mut rng = fastrand::Rng::with_seed(1);
        for length in 1..12 {
            for f in FormulaGenerator::new(&session, &mut rng, length, 2, 0.5).take(20) {
                assert!(f
                    .subformulas()
                    .filter_map(|g| g.atom().cloned())
                    .all(|a| a == "p0" || a == "p1"));
            }
        }
    }

    #[test]
    fn negation_is_an_involution() {
        let session = Session::new();
        let mut rng = fastrand::Rng::with_seed(2);
        for _ in 0..500 {
            let f = random_formula(&session, &mut rng, 15, 3);
            assert_eq!(session.not(&session.not(&f)), f);
        }
    }

    #[test_log::test]
    fn rewriting_preserves_models() {
        let session = Session::new();
        let rules = RuleTable::default();
        let rewriter = Rewriter::new(&session, &rules);
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..300 {
            let f = random_formula(&session, &mut rng, 10, 3);
            let rewritten = rewriter.rewrite(&f);
            for _ in 0..25 {
                let word = random_word(&mut rng, 3, 3, 3);
                assert_eq!(
                    word.satisfies(&f),
                    word.satisfies(&rewritten),
                    "{f} and its rewriting {rewritten} disagree on {word}"
                );
            }
        }
    }

    #[test_log::test]
    fn automata_accept_exactly_the_models() {
        let session = Session::new();
        let mut rng = fastrand::Rng::with_seed(6);
        for _ in 0..60 {
            let f = random_formula(&session, &mut rng, 7, 2);
            let automata = [MergeStrategy::Exact, MergeStrategy::NextAndAcceptance]
                .into_iter()
                .flat_map(|merge| {
                    [true, false].map(|rewrite| {
                        let options = TranslationOptions::default()
                            .with_merge(merge)
                            .with_rewrite(rewrite);
                        Translator::new(&session)
                            .with_options(options)
                            .translate(&f)
                            .unwrap()
                    })
                })
                .collect::<Vec<_>>();
            for _ in 0..15 {
                let word = random_word(&mut rng, 2, 2, 3);
                let expected = word.satisfies(&f);
                for automaton in &automata {
                    assert_eq!(automaton.accepts(&word), expected, "{f} on {word}");
                }
            }
        }
    }

    #[test]
    fn strategies_produce_consistent_automata() {
        let session = Session::new();
        let mut rng = fastrand::Rng::with_seed(4);
        for _ in 0..50 {
            let f = random_formula(&session, &mut rng, 8, 2);
            let exact = expand(&f, MergeStrategy::Exact).unwrap();
            let merged = expand(&f, MergeStrategy::NextAndAcceptance).unwrap();
            assert!(merged.size() <= exact.size());
            assert_eq!(merged.acceptance_sets(), exact.acceptance_sets());
            for state in merged.states() {
                for t in state.transitions() {
                    assert!(t.target() < merged.size());
                }
            }
        }
    }

    #[test]
    fn graphs_survive_the_interchange_format() {
        let mut rng = fastrand::Rng::with_seed(5);
        for sets in 1..4 {
            let graph = random_graph(&mut rng, 6, 3, sets);
            let text = graph.to_string();
            assert_eq!(read_graph_str(&text).unwrap().to_string(), text);
        }
    }
}
