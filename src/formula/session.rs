use std::cell::{Cell, RefCell};

use tracing::trace;

use super::{Atom, Formula, FormulaNode, Kind};
use crate::Map;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key<A> {
    kind: Kind,
    sub1: Option<usize>,
    sub2: Option<usize>,
    atom: Option<A>,
}

/// The interning context for [`Formula`]s.
///
/// Every formula is built through one of the smart constructors of a session, which canonicalize
/// the formula and then look it up in a table keyed by operator, children and atom. Within one
/// session, structurally equal formulas are therefore always the identical node. Formulas from
/// different sessions must not be mixed.
///
/// The constructors push negation inwards eagerly, so every formula is in negation normal form: a
/// [`Kind::Not`] node only ever sits directly above a proposition. Negation is an involution, i.e.
/// `s.not(&s.not(&f)) == f` holds for all formulas `f`.
///
/// ```
/// use ltl2buchi::prelude::*;
///
/// let s = Session::new();
/// let (a, b) = (s.prop("a"), s.prop("b"));
/// assert_eq!(s.and(&a, &b), s.and(&b, &a));
/// assert_eq!(s.not(&s.until(&a, &b)), s.release(&s.not(&a), &s.not(&b)));
/// ```
pub struct Session<A> {
    table: RefCell<Map<Key<A>, Formula<A>>>,
    next_id: Cell<usize>,
}

impl<A: Atom> Default for Session<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Atom> Session<A> {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self {
            table: RefCell::new(Map::default()),
            next_id: Cell::new(0),
        }
    }

    /// Forgets all interned formulas. Formulas created afterwards never compare equal to formulas
    /// created before, ids keep increasing.
    pub fn reset(&mut self) {
        trace!("resetting session with {} formulas", self.len());
        self.table.get_mut().clear();
    }

    /// The number of interned formulas.
    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    /// Returns true if no formula has been interned since creation or the last reset.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn intern(
        &self,
        kind: Kind,
        sub1: Option<&Formula<A>>,
        sub2: Option<&Formula<A>>,
        atom: Option<A>,
    ) -> Formula<A> {
        let key = Key {
            kind,
            sub1: sub1.map(Formula::id),
            sub2: sub2.map(Formula::id),
            atom,
        };
        if let Some(existing) = self.table.borrow().get(&key) {
            return existing.clone();
        }

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let formula = Formula::from_node(FormulaNode {
            id,
            kind,
            sub1: sub1.cloned(),
            sub2: sub2.cloned(),
            atom: key.atom.clone(),
            rewritten: Cell::new(None),
        });
        self.table.borrow_mut().insert(key, formula.clone());
        formula
    }

    /// The constant `true`.
    pub fn tt(&self) -> Formula<A> {
        self.intern(Kind::True, None, None, None)
    }

    /// The constant `false`.
    pub fn ff(&self) -> Formula<A> {
        self.intern(Kind::False, None, None, None)
    }

    /// The atomic proposition `atom`.
    pub fn prop(&self, atom: A) -> Formula<A> {
        self.intern(Kind::Proposition, None, None, Some(atom))
    }

    /// The negation of `f`, pushed inwards until it reaches the propositions.
    pub fn not(&self, f: &Formula<A>) -> Formula<A> {
        let operands = f.left().zip(f.right());
        match (f.kind(), operands) {
            (Kind::True, _) => self.ff(),
            (Kind::False, _) => self.tt(),
            (Kind::Proposition, _) => self.intern(Kind::Not, Some(f), None, None),
            (Kind::Not, _) => f.sub1().cloned().unwrap_or_else(|| f.clone()),
            (Kind::Next, _) => match f.sub1() {
                Some(sub) => self.next(&self.not(sub)),
                None => f.clone(),
            },
            (Kind::And, Some((l, r))) => self.or(&self.not(l), &self.not(r)),
            (Kind::Or, Some((l, r))) => self.and(&self.not(l), &self.not(r)),
            (Kind::Until, Some((l, r))) => self.release(&self.not(l), &self.not(r)),
            (Kind::Release, Some((l, r))) => self.until(&self.not(l), &self.not(r)),
            (Kind::WeakUntil, Some((l, r))) => {
                let (not_l, not_r) = (self.not(l), self.not(r));
                self.until(&not_r, &self.and(&not_l, &not_r))
            }
            (_, None) => unreachable!("binary formula {} without operands", f.id()),
        }
    }

    /// `X f`
    pub fn next(&self, f: &Formula<A>) -> Formula<A> {
        self.intern(Kind::Next, Some(f), None, None)
    }

    /// The conjunction of `l` and `r`, whose operands are ordered by creation id.
    pub fn and(&self, l: &Formula<A>, r: &Formula<A>) -> Formula<A> {
        let (l, r) = if l.id() <= r.id() { (l, r) } else { (r, l) };
        self.intern(Kind::And, Some(l), Some(r), None)
    }

    /// The disjunction of `l` and `r`, whose operands are ordered by creation id.
    pub fn or(&self, l: &Formula<A>, r: &Formula<A>) -> Formula<A> {
        let (l, r) = if l.id() <= r.id() { (l, r) } else { (r, l) };
        self.intern(Kind::Or, Some(l), Some(r), None)
    }

    /// `l U r`
    pub fn until(&self, l: &Formula<A>, r: &Formula<A>) -> Formula<A> {
        self.intern(Kind::Until, Some(l), Some(r), None)
    }

    /// `l W r`
    pub fn weak_until(&self, l: &Formula<A>, r: &Formula<A>) -> Formula<A> {
        self.intern(Kind::WeakUntil, Some(l), Some(r), None)
    }

    /// `l V r`, stored with swapped children. A release of the shape `l V (y \/ l)` is the weak
    /// until `y W l` and is represented as such, which keeps negation an involution on weak untils.
    pub fn release(&self, l: &Formula<A>, r: &Formula<A>) -> Formula<A> {
        if r.kind() == Kind::Or {
            let weak = match (r.sub1(), r.sub2()) {
                (Some(a), Some(b)) if a == l => Some(b),
                (Some(a), Some(b)) if b == l => Some(a),
                _ => None,
            };
            if let Some(y) = weak {
                return self.weak_until(y, l);
            }
        }
        self.intern(Kind::Release, Some(r), Some(l), None)
    }

    /// `G f`, which is `false V f`.
    pub fn always(&self, f: &Formula<A>) -> Formula<A> {
        self.release(&self.ff(), f)
    }

    /// `F f`, which is `true U f`.
    pub fn eventually(&self, f: &Formula<A>) -> Formula<A> {
        self.until(&self.tt(), f)
    }

    /// `l -> r`, which is `!l \/ r`.
    pub fn implies(&self, l: &Formula<A>, r: &Formula<A>) -> Formula<A> {
        self.or(&self.not(l), r)
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::formula::{Formula, Kind};

    fn sample(s: &Session<&'static str>) -> Vec<Formula<&'static str>> {
        let (a, b, c) = (s.prop("a"), s.prop("b"), s.prop("c"));
        vec![
            s.tt(),
            s.ff(),
            a.clone(),
            s.not(&a),
            s.next(&s.or(&a, &b)),
            s.until(&a, &s.and(&b, &c)),
            s.release(&a, &b),
            s.weak_until(&a, &b),
            s.weak_until(&s.next(&a), &s.until(&b, &c)),
            s.until(&b, &s.and(&a, &b)),
            s.always(&s.eventually(&c)),
            s.implies(&s.always(&a), &s.weak_until(&c, &s.not(&b))),
        ]
    }

    #[test]
    fn negation_is_an_involution() {
        let s = Session::new();
        for f in sample(&s) {
            assert_eq!(s.not(&s.not(&f)), f, "double negation of {f}");
        }
    }

    #[test]
    fn negation_normal_form() {
        let s = Session::new();
        for f in sample(&s) {
            for g in s.not(&f).subformulas() {
                if g.kind() == Kind::Not {
                    assert_eq!(g.sub1().map(Formula::kind), Some(Kind::Proposition));
                }
            }
        }
    }

    #[test]
    fn dualities() {
        let s = Session::new();
        let (a, b) = (s.prop("a"), s.prop("b"));
        let (na, nb) = (s.not(&a), s.not(&b));
        assert_eq!(s.not(&s.and(&a, &b)), s.or(&na, &nb));
        assert_eq!(s.not(&s.until(&a, &b)), s.release(&na, &nb));
        assert_eq!(s.not(&s.next(&a)), s.next(&na));
        assert_eq!(s.not(&s.weak_until(&a, &b)), s.until(&nb, &s.and(&na, &nb)));
        assert_eq!(s.not(&s.tt()), s.ff());
    }

    #[test]
    fn hash_consing() {
        let s = Session::new();
        let f = s.until(&s.prop("a"), &s.next(&s.prop("b")));
        let before = s.len();
        let g = s.until(&s.prop("a"), &s.next(&s.prop("b")));
        assert_eq!(f, g);
        assert_eq!(s.len(), before);
        assert_eq!(s.or(&f, &s.prop("a")), s.or(&s.prop("a"), &g));
    }

    #[test]
    fn weak_release_becomes_weak_until() {
        let s = Session::new();
        let (a, b) = (s.prop("a"), s.prop("b"));
        let f = s.release(&b, &s.or(&a, &b));
        assert_eq!(f.kind(), Kind::WeakUntil);
        assert_eq!(f, s.weak_until(&a, &b));
    }

    #[test]
    fn reset_forgets_formulas() {
        let mut s = Session::new();
        let a = s.prop("a");
        s.reset();
        assert!(s.is_empty());
        let a2 = s.prop("a");
        assert_ne!(a, a2);
        assert!(a2.id() > a.id());
    }
}
