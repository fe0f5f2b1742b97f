use std::{
    cell::Cell,
    collections::BTreeSet,
    fmt::{Debug, Display},
    hash::Hash,
    rc::Rc,
};

mod session;
pub use session::Session;

/// Values that can be used as atomic propositions of a [`Formula`]. This is implemented for every
/// type that can be cloned, hashed, compared for equality and printed.
pub trait Atom: Clone + Eq + Hash + Debug + Display {}
impl<T: Clone + Eq + Hash + Debug + Display> Atom for T {}

/// An ordered set of formulas. The order is the creation order of the formulas within their
/// [`Session`], which is what the tableau construction uses to pick the next obligation.
pub type FormulaSet<A> = BTreeSet<Formula<A>>;

/// The top-level operator of a [`Formula`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    /// An atomic proposition.
    Proposition,
    /// The constant `true`.
    True,
    /// The constant `false`.
    False,
    /// Negation, only ever directly above a [`Kind::Proposition`].
    Not,
    /// The next operator `X`.
    Next,
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// The (strong) until operator `U`.
    Until,
    /// The release operator `V`, dual to [`Kind::Until`].
    Release,
    /// The weak until operator `W`.
    WeakUntil,
}

impl Kind {
    fn symbol(&self) -> &'static str {
        match self {
            Kind::Proposition => "p",
            Kind::True => "true",
            Kind::False => "false",
            Kind::Not => "!",
            Kind::Next => "X",
            Kind::And => "/\\",
            Kind::Or => "\\/",
            Kind::Until => "U",
            Kind::Release => "V",
            Kind::WeakUntil => "W",
        }
    }
}

pub(crate) struct FormulaNode<A> {
    id: usize,
    kind: Kind,
    sub1: Option<Formula<A>>,
    sub2: Option<Formula<A>>,
    atom: Option<A>,
    rewritten: Cell<Option<usize>>,
}

/// A hash-consed LTL formula in negation normal form.
///
/// Formulas can only be built through a [`Session`], which guarantees that structurally equal
/// formulas are represented by the very same node. Consequently equality is pointer equality and
/// hashing as well as ordering use the creation id of the node, which makes all three constant
/// time operations.
///
/// Note that [`Kind::Release`] stores its operands swapped, such that [`Formula::sub1`] is the
/// logical right operand. This aligns the release with the until operator in the tableau, where the
/// first child is always the one that has to hold on the deferring branch. Use [`Formula::left`] and
/// [`Formula::right`] to obtain the logical operands.
pub struct Formula<A>(Rc<FormulaNode<A>>);

impl<A> Clone for Formula<A> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<A> PartialEq for Formula<A> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl<A> Eq for Formula<A> {}

impl<A> Hash for Formula<A> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state)
    }
}

impl<A> PartialOrd for Formula<A> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<A> Ord for Formula<A> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl<A> Formula<A> {
    pub(crate) fn from_node(node: FormulaNode<A>) -> Self {
        Self(Rc::new(node))
    }

    /// The top-level operator.
    pub fn kind(&self) -> Kind {
        self.0.kind
    }

    /// The creation id, unique within the session that built the formula.
    pub fn id(&self) -> usize {
        self.0.id
    }

    /// The first child in tableau order. For [`Kind::Release`] this is the logical right operand,
    /// for unary operators it is the operand.
    pub fn sub1(&self) -> Option<&Formula<A>> {
        self.0.sub1.as_ref()
    }

    /// The second child in tableau order. For [`Kind::Release`] this is the logical left operand.
    pub fn sub2(&self) -> Option<&Formula<A>> {
        self.0.sub2.as_ref()
    }

    /// The logical left operand of a binary operator, or the operand of a unary one.
    pub fn left(&self) -> Option<&Formula<A>> {
        match self.kind() {
            Kind::Release => self.sub2(),
            _ => self.sub1(),
        }
    }

    /// The logical right operand of a binary operator.
    pub fn right(&self) -> Option<&Formula<A>> {
        match self.kind() {
            Kind::Release => self.sub1(),
            _ => self.sub2(),
        }
    }

    /// The atomic proposition, present only for [`Kind::Proposition`].
    pub fn atom(&self) -> Option<&A> {
        self.0.atom.as_ref()
    }

    /// Literals are the constants, propositions and negated propositions.
    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind(),
            Kind::True | Kind::False | Kind::Proposition | Kind::Not
        )
    }

    /// Returns true if `self` and `other` are a proposition and its negation, in any order.
    pub fn contradicts(&self, other: &Formula<A>) -> bool {
        match (self.kind(), other.kind()) {
            (Kind::Not, _) => self.sub1() == Some(other),
            (_, Kind::Not) => other.sub1() == Some(self),
            (Kind::True, Kind::False) | (Kind::False, Kind::True) => true,
            _ => false,
        }
    }

    /// The number of nodes in the syntax tree, counting shared subterms once per occurrence.
    pub fn size(&self) -> usize {
        let mut size = 0;
        let mut stack = vec![self];
        while let Some(f) = stack.pop() {
            size += 1;
            stack.extend(f.sub1());
            stack.extend(f.sub2());
        }
        size
    }

    /// Iterates over all distinct subformulas, including `self`, in preorder. Shared subterms are
    /// visited once.
    pub fn subformulas(&self) -> impl Iterator<Item = Formula<A>> {
        let mut seen = crate::Set::default();
        let mut stack = vec![self.clone()];
        std::iter::from_fn(move || loop {
            let f = stack.pop()?;
            if !seen.insert(f.id()) {
                continue;
            }
            stack.extend(f.sub2().cloned());
            stack.extend(f.sub1().cloned());
            return Some(f);
        })
    }

    /// Decides whether the obligation `self` is already guaranteed by the formulas in `old`, which
    /// hold now, and the formulas in `next`, which are required to hold in the successor. This is a
    /// purely syntactic and therefore incomplete check, it may return `false` for implied formulas.
    pub fn is_synt_implied(&self, old: &FormulaSet<A>, next: &FormulaSet<A>) -> bool {
        if self.kind() == Kind::True || old.contains(self) {
            return true;
        }
        if self.is_literal() {
            return false;
        }

        let implied = |f: Option<&Formula<A>>| f.map_or(true, |f| f.is_synt_implied(old, next));
        let deferred = next.contains(self);

        match self.kind() {
            Kind::Until | Kind::WeakUntil => {
                implied(self.sub2()) || (implied(self.sub1()) && deferred)
            }
            Kind::Or => implied(self.sub2()) || implied(self.sub1()),
            Kind::Release => implied(self.sub1()) && (implied(self.sub2()) || deferred),
            Kind::Next => self.sub1().map_or(true, |f| next.contains(f)),
            Kind::And => implied(self.sub1()) && implied(self.sub2()),
            Kind::Proposition | Kind::True | Kind::False | Kind::Not => false,
        }
    }

    /// Returns true if the formula is the result of rewriting with the rule table `table`.
    pub(crate) fn is_rewritten_by(&self, table: usize) -> bool {
        self.0.rewritten.get() == Some(table)
    }

    pub(crate) fn mark_rewritten_by(&self, table: usize) {
        self.0.rewritten.set(Some(table))
    }
}

impl<A: Display> Display for Formula<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            Kind::Proposition => match self.atom() {
                Some(atom) => write!(f, "{atom}"),
                None => write!(f, "?"),
            },
            Kind::True | Kind::False => write!(f, "{}", self.kind().symbol()),
            Kind::Not | Kind::Next => match self.sub1() {
                Some(sub) => write!(f, "( {} {sub} )", self.kind().symbol()),
                None => write!(f, "( {} ? )", self.kind().symbol()),
            },
            _ => match (self.left(), self.right()) {
                (Some(l), Some(r)) => write!(f, "( {l} {} {r} )", self.kind().symbol()),
                _ => write!(f, "( ? {} ? )", self.kind().symbol()),
            },
        }
    }
}

impl<A: Display> Debug for Formula<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}[{}]", self.id())
    }
}
