//! Typing contexts.
//!
//! An ordered sequence of `(name, Type)` bindings. Names are unique within
//! one context; later bindings may mention earlier ones (the context is
//! dependent). Lookup is by name, innermost irrelevant since names never
//! repeat.

use crate::name::Name;
use crate::ty::Type;
use std::collections::HashSet;

/// Ordered, name-unique typing context.
#[derive(Clone, Debug, Default)]
pub struct Context {
    bindings: Vec<(Name, Type)>,
}

impl Context {
    /// Empty context.
    pub fn new() -> Self {
        Context::default()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the context is empty.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Look up a binding by name.
    pub fn lookup(&self, name: &Name) -> Option<&Type> {
        self.bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ty)| ty)
    }

    /// Whether `name` is bound.
    pub fn contains(&self, name: &Name) -> bool {
        self.lookup(name).is_some()
    }

    /// Append a binding. Returns `false` (and leaves the context unchanged)
    /// if the name is already bound; callers pick a fresh name first via
    /// [`Context::fresh_name`].
    pub fn push(&mut self, name: Name, ty: Type) -> bool {
        if self.contains(&name) {
            return false;
        }
        self.bindings.push((name, ty));
        true
    }

    /// A copy of this context extended with one binding. The binder is
    /// freshened against existing names, and the (possibly renamed) binder
    /// actually used is returned alongside.
    pub fn extended(&self, name: Name, ty: Type) -> (Context, Name) {
        let mut ctx = self.clone();
        let name = ctx.fresh_name(&name);
        let pushed = ctx.push(name.clone(), ty);
        debug_assert!(pushed, "freshened name must be unbound");
        (ctx, name)
    }

    /// A variant of `base` not bound in this context.
    pub fn fresh_name(&self, base: &Name) -> Name {
        let avoid: HashSet<Name> = self.bindings.iter().map(|(n, _)| n.clone()).collect();
        base.freshen(&avoid)
    }

    /// Iterate bindings in order.
    pub fn iter(&self) -> impl Iterator<Item = &(Name, Type)> {
        self.bindings.iter()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.bindings.len() == other.bindings.len()
            && self
                .bindings
                .iter()
                .zip(other.bindings.iter())
                .all(|((n1, t1), (n2, t2))| n1 == n2 && t1 == t2)
    }
}

impl Eq for Context {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    #[test]
    fn test_lookup_and_order() {
        let mut ctx = Context::new();
        assert!(ctx.push("n".into(), Type::new(Expr::const_("Nat"))));
        assert!(ctx.push("b".into(), Type::new(Expr::const_("Bool"))));

        assert_eq!(
            ctx.lookup(&"n".into()).map(Type::description),
            Some("Nat")
        );
        assert!(ctx.lookup(&"missing".into()).is_none());

        let names: Vec<_> = ctx.iter().map(|(n, _)| n.as_str().to_owned()).collect();
        assert_eq!(names, ["n", "b"]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut ctx = Context::new();
        assert!(ctx.push("x".into(), Type::new(Expr::const_("Nat"))));
        assert!(!ctx.push("x".into(), Type::new(Expr::const_("Bool"))));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_extended_freshens() {
        let mut ctx = Context::new();
        ctx.push("x".into(), Type::new(Expr::const_("Nat")));
        let (ctx2, used) = ctx.extended("x".into(), Type::new(Expr::const_("Bool")));
        assert_eq!(used.as_str(), "x'");
        assert_eq!(ctx2.len(), 2);
        // Original untouched.
        assert_eq!(ctx.len(), 1);
    }
}
