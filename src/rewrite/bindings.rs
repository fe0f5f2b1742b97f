use im_rc::HashMap;

use crate::formula::Formula;

/// Assignment of pattern placeholders to subterms, built up while matching a pattern.
///
/// The map is persistent, so taking a [`Bindings::snapshot`] before trying an alternative and
/// [`Bindings::restore`]-ing it afterwards is cheap and guarantees that a failed alternative leaves
/// no trace.
pub(crate) struct Bindings<A>(HashMap<String, Formula<A>>);

impl<A> Clone for Bindings<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A> Default for Bindings<A> {
    fn default() -> Self {
        Self(HashMap::new())
    }
}

impl<A> Bindings<A> {
    pub fn get(&self, placeholder: &str) -> Option<&Formula<A>> {
        self.0.get(placeholder)
    }

    pub fn bind(&mut self, placeholder: &str, term: Formula<A>) {
        self.0.insert(placeholder.to_string(), term);
    }

    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    pub fn restore(&mut self, snapshot: Self) {
        *self = snapshot;
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
