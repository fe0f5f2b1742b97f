use tracing::info;

use crate::{
    formula::{Atom, Formula, Session},
    graph::Graph,
    rewrite::{Rewriter, RuleTable},
    tableau::{self, Automaton, MergeStrategy},
    Result,
};

/// Options controlling a [`Translator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranslationOptions {
    /// The relation used to merge tableau nodes.
    pub merge: MergeStrategy,
    /// Whether the formula is simplified before the tableau construction.
    pub rewrite: bool,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            merge: MergeStrategy::default(),
            rewrite: true,
        }
    }
}

impl TranslationOptions {
    /// Sets the merge strategy.
    pub fn with_merge(self, merge: MergeStrategy) -> Self {
        Self { merge, ..self }
    }

    /// Enables or disables rewriting.
    pub fn with_rewrite(self, rewrite: bool) -> Self {
        Self { rewrite, ..self }
    }
}

/// Translates formulas of one [`Session`] into automata, by first rewriting them with a
/// [`RuleTable`] and then running the tableau construction.
///
/// ```
/// use ltl2buchi::prelude::*;
///
/// let session = Session::new();
/// let (a, b) = (session.prop("a"), session.prop("b"));
/// let automaton = Translator::new(&session)
///     .with_options(TranslationOptions::default().with_merge(MergeStrategy::Exact))
///     .translate(&session.until(&a, &b))
///     .unwrap();
/// assert_eq!(automaton.acceptance_sets(), 1);
/// ```
pub struct Translator<'s, A> {
    session: &'s Session<A>,
    rules: RuleTable,
    options: TranslationOptions,
}

impl<'s, A: Atom> Translator<'s, A> {
    /// Creates a translator with default options and the built-in rules.
    pub fn new(session: &'s Session<A>) -> Self {
        Self {
            session,
            rules: RuleTable::default(),
            options: TranslationOptions::default(),
        }
    }

    /// Replaces the options.
    pub fn with_options(self, options: TranslationOptions) -> Self {
        Self { options, ..self }
    }

    /// Replaces the rule table used for rewriting. Formulas that were already rewritten with
    /// another table are rewritten again.
    pub fn with_rules(self, rules: RuleTable) -> Self {
        Self { rules, ..self }
    }

    /// The active options.
    pub fn options(&self) -> TranslationOptions {
        self.options
    }

    /// Returns the formula the tableau is built for, i.e. `formula` after rewriting if enabled.
    pub fn prepare(&self, formula: &Formula<A>) -> Formula<A> {
        if self.options.rewrite {
            Rewriter::new(self.session, &self.rules).rewrite(formula)
        } else {
            formula.clone()
        }
    }

    /// Translates `formula` into a generalized Büchi automaton.
    pub fn translate(&self, formula: &Formula<A>) -> Result<Automaton<A>> {
        let prepared = self.prepare(formula);
        let automaton = tableau::expand(&prepared, self.options.merge)?;
        info!(
            "translated formula of size {} into automaton with {} states and {} acceptance sets",
            formula.size(),
            automaton.size(),
            automaton.acceptance_sets()
        );
        Ok(automaton)
    }

    /// Translates `formula` and converts the result into a [`Graph`].
    pub fn translate_to_graph(&self, formula: &Formula<A>) -> Result<Graph<A>> {
        Ok(self.translate(formula)?.to_graph())
    }
}
