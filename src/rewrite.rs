use tracing::{debug, trace};

use crate::{
    formula::{Atom, Formula, Kind, Session},
    Map,
};

mod bindings;
use bindings::Bindings;

mod rules;
pub use rules::{Rule, RuleTable};

/// Tries to match `term` against `pattern`, extending `bindings` on success. Placeholders that are
/// already bound only match the identical subterm. Conjunctions and disjunctions are matched modulo
/// commutativity. On failure, `bindings` may contain bindings of a partial match.
fn unify<A: Atom>(
    term: &Formula<A>,
    pattern: &Formula<String>,
    bindings: &mut Bindings<A>,
) -> bool {
    if pattern.kind() == Kind::Proposition {
        let Some(name) = pattern.atom() else {
            return false;
        };
        return match bindings.get(name) {
            Some(bound) => bound == term,
            None => {
                bindings.bind(name, term.clone());
                true
            }
        };
    }
    if pattern.kind() != term.kind() {
        return false;
    }

    match (term.sub1(), term.sub2(), pattern.sub1(), pattern.sub2()) {
        (None, None, None, None) => true,
        (Some(t), None, Some(p), None) => unify(t, p, bindings),
        (Some(t1), Some(t2), Some(p1), Some(p2)) => {
            let snapshot = bindings.snapshot();
            if unify(t1, p1, bindings) && unify(t2, p2, bindings) {
                return true;
            }
            if matches!(term.kind(), Kind::And | Kind::Or) {
                bindings.restore(snapshot.clone());
                if unify(t1, p2, bindings) && unify(t2, p1, bindings) {
                    return true;
                }
            }
            bindings.restore(snapshot);
            false
        }
        _ => false,
    }
}

/// Simplifies formulas by exhaustively applying the rules of a [`RuleTable`].
///
/// A single pass rewrites the formula bottom-up and tries every rule once at every node. Since some
/// simplifications only become visible for the negation of a formula, [`Rewriter::rewrite`] alternates
/// passes on the formula and on its negation until neither changes anything.
///
/// ```
/// use ltl2buchi::prelude::*;
///
/// let session = Session::new();
/// let rules = RuleTable::default();
/// let (a, b) = (session.prop("a"), session.prop("b"));
/// let f = session.and(&session.always(&a), &session.always(&b));
///
/// let rewritten = Rewriter::new(&session, &rules).rewrite(&f);
/// assert_eq!(rewritten, session.always(&session.and(&a, &b)));
/// ```
pub struct Rewriter<'a, A> {
    session: &'a Session<A>,
    rules: &'a RuleTable,
}

impl<'a, A: Atom> Rewriter<'a, A> {
    /// Creates a rewriter building its results in `session`.
    pub fn new(session: &'a Session<A>, rules: &'a RuleTable) -> Self {
        Self { session, rules }
    }

    /// Rewrites `formula` until a fixpoint is reached. Literals and formulas that are results of a
    /// previous call with the same rule table are returned unchanged.
    pub fn rewrite(&self, formula: &Formula<A>) -> Formula<A> {
        if formula.is_literal() || formula.is_rewritten_by(self.rules.id()) {
            return formula.clone();
        }

        let mut current = formula.clone();
        let mut negated = false;
        let mut passes = 0usize;
        loop {
            let rewritten = self.pass(&current);
            let changed = rewritten != current;
            current = self.session.not(&rewritten);
            negated = !negated;
            passes += 1;
            if !changed && !negated {
                break;
            }
        }

        debug!(
            "rewrote formula of size {} to size {} in {passes} passes",
            formula.size(),
            current.size()
        );
        current.mark_rewritten_by(self.rules.id());
        current
    }

    /// Performs a single bottom-up pass.
    fn pass(&self, formula: &Formula<A>) -> Formula<A> {
        let mut done = Map::default();
        self.pass_node(formula, &mut done)
    }

    fn pass_node(&self, formula: &Formula<A>, done: &mut Map<usize, Formula<A>>) -> Formula<A> {
        if let Some(result) = done.get(&formula.id()) {
            return result.clone();
        }

        let s = self.session;
        let rebuilt = match (formula.kind(), formula.left(), formula.right()) {
            (Kind::Next, Some(sub), _) => s.next(&self.pass_node(sub, done)),
            (kind, Some(l), Some(r)) => {
                let (l, r) = (self.pass_node(l, done), self.pass_node(r, done));
                match kind {
                    Kind::And => s.and(&l, &r),
                    Kind::Or => s.or(&l, &r),
                    Kind::Until => s.until(&l, &r),
                    Kind::Release => s.release(&l, &r),
                    Kind::WeakUntil => s.weak_until(&l, &r),
                    _ => formula.clone(),
                }
            }
            _ => formula.clone(),
        };

        let result = self.apply_rules(rebuilt);
        done.insert(formula.id(), result.clone());
        result
    }

    fn apply_rules(&self, mut formula: Formula<A>) -> Formula<A> {
        for rule in self.rules.rules() {
            let mut bindings = Bindings::default();
            if !unify(&formula, rule.pattern(), &mut bindings) {
                continue;
            }
            match self.substitute(rule.replacement(), &bindings) {
                Some(replaced) => {
                    trace!(
                        "rule {rule} rewrites {formula} to {replaced} with {} bindings",
                        bindings.len()
                    );
                    formula = replaced;
                }
                None => trace!("rule {rule} matched {formula} but its replacement is not bound"),
            }
        }
        formula
    }

    /// Instantiates `template` with `bindings`, returns `None` if a placeholder is unbound.
    fn substitute(&self, template: &Formula<String>, bindings: &Bindings<A>) -> Option<Formula<A>> {
        let s = self.session;
        Some(match template.kind() {
            Kind::Proposition => bindings.get(template.atom()?)?.clone(),
            Kind::True => s.tt(),
            Kind::False => s.ff(),
            Kind::Not => s.not(&self.substitute(template.sub1()?, bindings)?),
            Kind::Next => s.next(&self.substitute(template.sub1()?, bindings)?),
            kind => {
                let l = self.substitute(template.left()?, bindings)?;
                let r = self.substitute(template.right()?, bindings)?;
                match kind {
                    Kind::And => s.and(&l, &r),
                    Kind::Or => s.or(&l, &r),
                    Kind::Until => s.until(&l, &r),
                    Kind::Release => s.release(&l, &r),
                    _ => s.weak_until(&l, &r),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::{bindings::Bindings, unify, Rewriter, RuleTable};
    use crate::{formula::Session, word::LassoWord, Map};

    fn letter(atoms: &[&'static str]) -> Map<&'static str, bool> {
        atoms.iter().map(|a| (*a, true)).collect()
    }

    /// Every word with a spoke of at most one and a cycle of one or two letters over `atoms`.
    fn short_words(atoms: &[&'static str]) -> Vec<LassoWord<&'static str>> {
        let letters = atoms
            .iter()
            .powerset()
            .map(|set| letter(&set.into_iter().copied().collect::<Vec<_>>()))
            .collect::<Vec<_>>();
        let spokes = std::iter::once(vec![]).chain(letters.iter().map(|l| vec![l.clone()]));
        let cycles = letters
            .iter()
            .map(|l| vec![l.clone()])
            .chain(
                letters
                    .iter()
                    .cartesian_product(&letters)
                    .map(|(x, y)| vec![x.clone(), y.clone()]),
            )
            .collect::<Vec<_>>();
        spokes
            .flat_map(|spoke| {
                cycles
                    .iter()
                    .map(move |cycle| LassoWord::ultimately_periodic(spoke.clone(), cycle.clone()))
            })
            .collect()
    }

    #[test_log::test]
    fn conjunction_of_equal_operands() {
        let table = RuleTable::new();
        let s = table.session();
        let p = s.prop("p".to_string());
        let pattern = s.and(&p, &p);
        let table = table.with_rule(pattern, p).unwrap();

        let session = Session::new();
        let x = session.prop("x");
        let f = session.and(&x, &x);
        assert_eq!(f.size(), 3);

        let rewritten = Rewriter::new(&session, &table).rewrite(&f);
        assert_eq!(rewritten, x);
        assert_eq!(rewritten.size(), 1);
    }

    #[test]
    fn failed_alternatives_leave_no_bindings() {
        let patterns = Session::new();
        let (p, q) = (patterns.prop("p".to_string()), patterns.prop("q".to_string()));
        let pattern = patterns.or(&patterns.and(&p, &q), &q);

        let s = Session::new();
        let (a, b) = (s.prop("a"), s.prop("b"));
        let term = s.or(&s.and(&a, &b), &a);

        let mut bindings = Bindings::default();
        assert!(unify(&term, &pattern, &mut bindings));
        assert_eq!(bindings.get("q"), Some(&a));
        assert_eq!(bindings.get("p"), Some(&b));

        let mut bindings = Bindings::default();
        assert!(!unify(&s.or(&s.and(&a, &b), &s.prop("c")), &pattern, &mut bindings));
    }

    #[test_log::test]
    fn default_rules_simplify() {
        let rules = RuleTable::default();
        let s = Session::new();
        let rewriter = Rewriter::new(&s, &rules);
        let (a, b) = (s.prop("a"), s.prop("b"));

        let ffa = s.until(&s.tt(), &s.eventually(&a));
        assert_eq!(rewriter.rewrite(&ffa), s.eventually(&a));

        let gfg = s.always(&s.eventually(&s.always(&a)));
        assert_eq!(rewriter.rewrite(&gfg), s.eventually(&s.always(&a)));

        let xx = s.until(&s.next(&a), &s.next(&b));
        assert_eq!(rewriter.rewrite(&xx), s.next(&s.until(&a, &b)));

        let absorbed = s.and(&a, &s.or(&b, &a));
        assert_eq!(rewriter.rewrite(&absorbed), a);

        let excluded = s.or(&s.next(&a), &s.and(&b, &s.not(&b)));
        assert_eq!(rewriter.rewrite(&excluded), s.next(&a));
    }

    #[test]
    fn rewriting_is_idempotent() {
        let rules = RuleTable::default();
        let s = Session::new();
        let rewriter = Rewriter::new(&s, &rules);
        let (a, b) = (s.prop("a"), s.prop("b"));
        let f = s.or(
            &s.until(&a, &s.eventually(&b)),
            &s.and(&s.always(&a), &s.always(&a)),
        );
        let once = rewriter.rewrite(&f);
        let twice = rewriter.rewrite(&once);
        assert_eq!(once.size(), twice.size());
        assert_eq!(once, twice);
        assert!(once.size() < f.size());
    }

    #[test]
    fn literals_are_left_alone() {
        let rules = RuleTable::default();
        let s = Session::new();
        let a = s.not(&s.prop("a"));
        assert_eq!(Rewriter::new(&s, &rules).rewrite(&a), a);
    }

    #[test_log::test]
    fn every_default_rule_preserves_models() {
        let rules = RuleTable::default();
        let s = Session::new();
        let rewriter = Rewriter::new(&s, &rules);
        let (a, b, c) = (s.prop("a"), s.prop("b"), s.prop("c"));
        let words = short_words(&["a", "b", "c"]);
        assert_eq!(words.len(), 9 * 72);

        let instantiations = [
            [a.clone(), b.clone(), c.clone()],
            [s.next(&a), s.until(&b, &c), s.or(&a, &s.not(&c))],
        ];
        for rule in rules.rules() {
            for [p, q, r] in &instantiations {
                let mut bindings = Bindings::default();
                bindings.bind("p", p.clone());
                bindings.bind("q", q.clone());
                bindings.bind("r", r.clone());
                let before = rewriter.substitute(rule.pattern(), &bindings).unwrap();
                let after = rewriter.substitute(rule.replacement(), &bindings).unwrap();
                for word in &words {
                    assert_eq!(
                        word.satisfies(&before),
                        word.satisfies(&after),
                        "rule {rule} changes the meaning of {before} on {word}"
                    );
                }
            }
        }
    }

    #[test_log::test]
    fn releases_are_merged_soundly() {
        let rules = RuleTable::default();
        let s = Session::new();
        let rewriter = Rewriter::new(&s, &rules);
        let (a, b, c) = (s.prop("a"), s.prop("b"), s.prop("c"));

        let either = s.or(&s.always(&a), &s.always(&b));
        let rewritten = rewriter.rewrite(&either);
        assert_ne!(rewritten, s.always(&s.or(&a, &b)));
        let alternating = LassoWord::periodic(vec![letter(&["a"]), letter(&["b"])]);
        assert!(!alternating.satisfies(&rewritten));

        let untils = s.or(&s.until(&a, &b), &s.until(&c, &b));
        let rewritten = rewriter.rewrite(&untils);
        assert_ne!(rewritten, s.until(&s.and(&a, &c), &b));
        let word = LassoWord::ultimately_periodic(vec![letter(&["a"])], vec![letter(&["b"])]);
        assert!(word.satisfies(&rewritten));

        let same_right = s.or(&s.release(&a, &b), &s.release(&c, &b));
        assert_eq!(rewriter.rewrite(&same_right), s.release(&s.or(&a, &c), &b));
        let same_left = s.and(&s.release(&a, &b), &s.release(&a, &c));
        assert_eq!(rewriter.rewrite(&same_left), s.release(&a, &s.and(&b, &c)));
    }
}
