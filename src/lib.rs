//! Library for translating formulas of linear temporal logic (LTL) into Büchi automata and for
//! shrinking the resulting automata.
//!
//! The pipeline consists of three parts which all operate on the types defined in this crate.
//! Formulas are hash-consed [`Formula`] trees that live in a [`Session`]. The session canonicalizes
//! every formula it builds, in particular negation is pushed inwards eagerly so that each formula is
//! in negation normal form. Before translation, a [`Rewriter`] simplifies the formula by applying the
//! rules of a [`RuleTable`] until a fixpoint is reached.
//!
//! The [`tableau`] module then expands the formula into a generalized Büchi automaton. Each state of
//! the expansion is a pair of formula sets `(old, next)` where `old` collects the obligations that are
//! satisfied now and `next` collects those that are deferred to the successor. Completed expansion
//! nodes that agree with an existing one (see [`MergeStrategy`]) are merged, which bounds the state
//! space. Note that the number of states is still exponential in the size of the formula in the worst
//! case, this is inherent to the construction and no attempt is made at capping it. The resulting
//! [`Automaton`] carries its acceptance on transitions, one acceptance set per until subformula.
//!
//! Finally, automata are exchanged as attributed [`Graph`]s, which can be read from and written to a
//! simple line based format (see [`graph::io`]). The function [`reduce`] computes the strongly connected
//! components of such a graph and removes states and acceptance marks which can not contribute to an
//! accepting run, until nothing changes anymore.
//!
//! ```
//! use ltl2buchi::prelude::*;
//!
//! let session = Session::new();
//! let p = session.prop("p".to_string());
//! let gfp = session.always(&session.eventually(&p));
//!
//! let graph = Translator::new(&session)
//!     .translate_to_graph(&gfp)
//!     .expect("translation succeeds");
//! assert_eq!(graph.size(), 2);
//! ```
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use ltl2buchi::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        error::{Error, Result},
        formula::{Atom, Formula, FormulaSet, Kind, Session},
        graph::{
            connected_components::{Scc, SccDecomposition},
            io::{read_graph, write_graph},
            AcceptancePlacement, ElementAttributes, Graph, GraphAttributes, GraphType,
        },
        guard::{AtomRanking, Guard, Literal},
        math::{AcceptanceMask, Map, Set},
        reduce::{reduce, ReductionSummary},
        rewrite::{Rewriter, Rule, RuleTable},
        tableau::{Automaton, MergeStrategy, State, Transition},
        translate::{TranslationOptions, Translator},
        word::LassoWord,
    };
}

/// Collection types and the acceptance bit vector that is shared between automata and graphs.
pub mod math;

/// Defines the error type used throughout the crate.
pub mod error;
pub use error::{Error, Result};

/// Hash-consed LTL formulas in negation normal form.
pub mod formula;
pub use formula::{Formula, Session};

/// Literals and conjunctive guards labelling transitions.
pub mod guard;
pub use guard::{Guard, Literal};

/// Rule based simplification of formulas.
pub mod rewrite;
pub use rewrite::{Rewriter, RuleTable};

/// The tableau construction turning a formula into a generalized Büchi automaton.
pub mod tableau;
pub use tableau::{Automaton, MergeStrategy};

/// Puts rewriting and the tableau construction together.
pub mod translate;
pub use translate::{TranslationOptions, Translator};

/// Ultimately periodic words and the evaluation of formulas on them.
pub mod word;
pub use word::LassoWord;

/// Attributed graphs, their strongly connected components and the interchange format.
pub mod graph;
pub use graph::Graph;

/// SCC based removal of useless states and acceptance marks.
pub mod reduce;
pub use reduce::reduce;

/// Generation of random formulas and graphs. This is feature gated behind the `random` feature.
#[cfg(feature = "random")]
pub mod random;

pub use math::{Map, Set};
