use std::{
    fmt::Display,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::{
    formula::{Formula, Kind, Session},
    Error, Result, Set,
};

/// A rewrite rule. Every proposition in `pattern` is a placeholder that matches an arbitrary
/// subterm, repeated placeholders have to match identical subterms. The `replacement` may only use
/// placeholders that occur in the pattern.
#[derive(Clone)]
pub struct Rule {
    pattern: Formula<String>,
    replacement: Formula<String>,
}

impl Rule {
    /// The left-hand side of the rule.
    pub fn pattern(&self) -> &Formula<String> {
        &self.pattern
    }

    /// The right-hand side of the rule.
    pub fn replacement(&self) -> &Formula<String> {
        &self.replacement
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} => {}", self.pattern, self.replacement)
    }
}

fn placeholders(formula: &Formula<String>) -> Set<String> {
    formula
        .subformulas()
        .filter_map(|f| f.atom().cloned())
        .collect()
}

/// An ordered collection of [`Rule`]s together with the [`Session`] their patterns live in.
///
/// [`RuleTable::default`] returns the built-in simplifications, [`RuleTable::new`] an empty table
/// that can be filled with [`RuleTable::with_rule`]. Patterns and replacements must be built in the
/// session returned by [`RuleTable::session`].
///
/// ```
/// use ltl2buchi::prelude::*;
///
/// let table = RuleTable::new();
/// let s = table.session();
/// let p = s.prop("p".to_string());
/// let (pattern, replacement) = (s.and(&p, &p), p);
/// let table = table.with_rule(pattern, replacement).unwrap();
/// assert_eq!(table.len(), 1);
/// ```
pub struct RuleTable {
    id: usize,
    session: Session<String>,
    rules: Vec<Rule>,
}

/// Every table, and every change to a table, gets a fresh id. Formulas remember the id of the
/// table they were rewritten with.
fn fresh_id() -> usize {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

impl RuleTable {
    /// Creates a table without rules.
    pub fn new() -> Self {
        Self {
            id: fresh_id(),
            session: Session::new(),
            rules: vec![],
        }
    }

    /// Creates a table from formulas built in `session`, failing with [`Error::MalformedRule`] on
    /// the first rule that can not be used.
    pub fn try_from_pairs<I>(session: Session<String>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Formula<String>, Formula<String>)>,
    {
        let mut table = Self {
            id: fresh_id(),
            session,
            rules: vec![],
        };
        for (pattern, replacement) in pairs {
            table.add_rule(pattern, replacement)?;
        }
        Ok(table)
    }

    /// The session in which patterns and replacements have to be built.
    pub fn session(&self) -> &Session<String> {
        &self.session
    }

    /// Consumes the table and returns it with the given rule appended.
    pub fn with_rule(
        mut self,
        pattern: Formula<String>,
        replacement: Formula<String>,
    ) -> Result<Self> {
        self.add_rule(pattern, replacement)?;
        Ok(self)
    }

    /// Appends a rule, which is checked for well-formedness first.
    pub fn add_rule(
        &mut self,
        pattern: Formula<String>,
        replacement: Formula<String>,
    ) -> Result<()> {
        if pattern.kind() == Kind::Proposition {
            return Err(Error::MalformedRule(format!(
                "pattern {pattern} matches every formula"
            )));
        }
        let bound = placeholders(&pattern);
        if let Some(unbound) = placeholders(&replacement)
            .into_iter()
            .find(|name| !bound.contains(name))
        {
            return Err(Error::MalformedRule(format!(
                "placeholder {unbound} of {replacement} does not occur in {pattern}"
            )));
        }
        self.rules.push(Rule {
            pattern,
            replacement,
        });
        self.id = fresh_id();
        Ok(())
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    /// Iterates over the rules in the order in which they are tried.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter()
    }

    /// The number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the table holds no rule.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleTable {
    /// The built-in simplifications: idempotence, constant folding, distribution of temporal
    /// operators over the boolean ones, absorption of nested temporal operators and of boolean
    /// subterms, and contradictions.
    fn default() -> Self {
        let s = Session::new();
        let (p, q, r) = (
            s.prop("p".to_string()),
            s.prop("q".to_string()),
            s.prop("r".to_string()),
        );
        let (t, f) = (s.tt(), s.ff());
        let g = |x: &Formula<String>| s.always(x);
        let e = |x: &Formula<String>| s.eventually(x);
        let x = |x: &Formula<String>| s.next(x);

        let pairs = vec![
            (s.and(&p, &p), p.clone()),
            (s.or(&p, &p), p.clone()),
            (s.and(&p, &t), p.clone()),
            (s.and(&p, &f), f.clone()),
            (s.or(&p, &t), t.clone()),
            (s.or(&p, &f), p.clone()),
            (s.until(&p, &p), p.clone()),
            (s.release(&p, &p), p.clone()),
            (s.until(&p, &f), f.clone()),
            (s.release(&p, &t), t.clone()),
            (s.until(&f, &p), p.clone()),
            (s.release(&t, &p), p.clone()),
            (s.until(&p, &t), t.clone()),
            (s.release(&p, &f), f.clone()),
            (x(&t), t.clone()),
            (x(&f), f.clone()),
            (s.and(&g(&p), &g(&q)), g(&s.and(&p, &q))),
            (s.or(&e(&p), &e(&q)), e(&s.or(&p, &q))),
            (
                s.and(&s.until(&p, &q), &s.until(&r, &q)),
                s.until(&s.and(&p, &r), &q),
            ),
            (
                s.or(&s.until(&p, &q), &s.until(&p, &r)),
                s.until(&p, &s.or(&q, &r)),
            ),
            (
                s.or(&s.release(&p, &q), &s.release(&r, &q)),
                s.release(&s.or(&p, &r), &q),
            ),
            (
                s.and(&s.release(&p, &q), &s.release(&p, &r)),
                s.release(&p, &s.and(&q, &r)),
            ),
            (s.and(&x(&p), &x(&q)), x(&s.and(&p, &q))),
            (s.or(&x(&p), &x(&q)), x(&s.or(&p, &q))),
            (s.until(&x(&p), &x(&q)), x(&s.until(&p, &q))),
            (s.release(&x(&p), &x(&q)), x(&s.release(&p, &q))),
            (s.until(&p, &e(&q)), e(&q)),
            (s.release(&p, &g(&q)), g(&q)),
            (g(&e(&g(&p))), e(&g(&p))),
            (e(&g(&e(&p))), g(&e(&p))),
            (s.or(&g(&e(&p)), &g(&e(&q))), g(&e(&s.or(&p, &q)))),
            (s.and(&e(&g(&p)), &e(&g(&q))), e(&g(&s.and(&p, &q)))),
            (s.and(&p, &s.or(&p, &q)), p.clone()),
            (s.or(&p, &s.and(&p, &q)), p.clone()),
            (s.and(&p, &s.not(&p)), f.clone()),
            (s.or(&p, &s.not(&p)), t.clone()),
        ];

        Self::try_from_pairs(s, pairs).expect("built-in rules are well formed")
    }
}

/// Renders the rules as a table, one row per rule.
impl Display for RuleTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(["#", "Pattern", "Replacement"]);
        for (i, rule) in self.rules.iter().enumerate() {
            builder.push_record([
                i.to_string(),
                rule.pattern.to_string(),
                rule.replacement.to_string(),
            ]);
        }
        write!(
            f,
            "{}",
            builder
                .build()
                .with(tabled::settings::Style::rounded())
        )
    }
}
