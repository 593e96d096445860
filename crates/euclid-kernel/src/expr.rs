//! Expression representation
//!
//! The core expression type used throughout euclid. Binders carry names
//! (not de Bruijn indices); structural equality of terms is therefore
//! alpha-equivalence, provided by [`Expr::alpha_eq`]. Substitution is
//! capture-avoiding: binders that would capture a free variable of the
//! substituted term are renamed with primes.

use crate::name::Name;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Minimum stack space to reserve before recursive calls (32 KB).
pub(crate) const MIN_STACK_RED_ZONE: usize = 32 * 1024;

/// Stack size to grow to when running low (1 MB).
pub(crate) const STACK_GROWTH_SIZE: usize = 1024 * 1024;

/// Literal values of the builtin base types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    /// Natural number literal
    Nat(u64),
    /// Boolean literal
    Bool(bool),
}

/// Core expression type.
///
/// Terms and types share one syntax. The variants cover the dependent
/// function space (Pi), dependent pairs (Sigma), binary sums, the path
/// (identity) type with its introduction and eliminator, universes, and
/// references to environment declarations.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Variable reference (free or bound by an enclosing binder)
    Var(Name),
    /// Reference to an environment declaration (`Nat`, `id`, ...)
    Const(Name),
    /// Universe at a level: `Sort(0)` is `Type`, `Sort(1)` is `Type 1`, ...
    Sort(u32),
    /// Literal value
    Lit(Literal),
    /// Function application
    App(Arc<Expr>, Arc<Expr>),
    /// Lambda abstraction: `λ(x : A). body`
    Lam {
        binder: Name,
        ty: Arc<Expr>,
        body: Arc<Expr>,
    },
    /// Dependent function type: `∀(x : A). B`
    Pi {
        binder: Name,
        domain: Arc<Expr>,
        codomain: Arc<Expr>,
    },
    /// Dependent pair type: `Σ(x : A). B`
    Sigma {
        binder: Name,
        fst_ty: Arc<Expr>,
        snd_ty: Arc<Expr>,
    },
    /// Pair introduction: `(a, b)`
    Pair(Arc<Expr>, Arc<Expr>),
    /// First projection
    Fst(Arc<Expr>),
    /// Second projection
    Snd(Arc<Expr>),
    /// Binary sum type: `A + B`
    Sum(Arc<Expr>, Arc<Expr>),
    /// Left injection
    Inl(Arc<Expr>),
    /// Right injection
    Inr(Arc<Expr>),
    /// Sum eliminator: `case s of inl a => l | inr b => r`
    Case {
        scrut: Arc<Expr>,
        left_binder: Name,
        left: Arc<Expr>,
        right_binder: Name,
        right: Arc<Expr>,
    },
    /// Path (identity) type: `Path A a b`
    Path {
        ty: Arc<Expr>,
        lhs: Arc<Expr>,
        rhs: Arc<Expr>,
    },
    /// Path introduction: `refl a : Path A a a`
    Refl(Arc<Expr>),
    /// Path eliminator: `transport C p b` carries `b : C a` along
    /// `p : Path A a b'` to `C b'`.
    Transport {
        motive: Arc<Expr>,
        path: Arc<Expr>,
        body: Arc<Expr>,
    },
}

impl Expr {
    /// Create a variable reference
    pub fn var(name: impl Into<Name>) -> Self {
        Expr::Var(name.into())
    }

    /// Create a constant reference
    pub fn const_(name: impl Into<Name>) -> Self {
        Expr::Const(name.into())
    }

    /// Create a universe: `Sort(0)` is `Type`
    pub fn sort(level: u32) -> Self {
        Expr::Sort(level)
    }

    /// Create `Type` (the lowest universe)
    pub fn type_() -> Self {
        Expr::Sort(0)
    }

    /// Create an application
    pub fn app(func: Expr, arg: Expr) -> Self {
        Expr::App(Arc::new(func), Arc::new(arg))
    }

    /// Apply `func` to several arguments left to right
    pub fn app_many(func: Expr, args: impl IntoIterator<Item = Expr>) -> Self {
        args.into_iter().fold(func, Expr::app)
    }

    /// Create a lambda
    pub fn lam(binder: impl Into<Name>, ty: Expr, body: Expr) -> Self {
        Expr::Lam {
            binder: binder.into(),
            ty: Arc::new(ty),
            body: Arc::new(body),
        }
    }

    /// Create a dependent function type
    pub fn pi(binder: impl Into<Name>, domain: Expr, codomain: Expr) -> Self {
        Expr::Pi {
            binder: binder.into(),
            domain: Arc::new(domain),
            codomain: Arc::new(codomain),
        }
    }

    /// Create a non-dependent function type `from → to`
    pub fn arrow(from: Expr, to: Expr) -> Self {
        Expr::pi("_", from, to)
    }

    /// Create a dependent pair type
    pub fn sigma(binder: impl Into<Name>, fst_ty: Expr, snd_ty: Expr) -> Self {
        Expr::Sigma {
            binder: binder.into(),
            fst_ty: Arc::new(fst_ty),
            snd_ty: Arc::new(snd_ty),
        }
    }

    /// Create a pair
    pub fn pair(fst: Expr, snd: Expr) -> Self {
        Expr::Pair(Arc::new(fst), Arc::new(snd))
    }

    /// Create a sum type
    pub fn sum(left: Expr, right: Expr) -> Self {
        Expr::Sum(Arc::new(left), Arc::new(right))
    }

    /// Create a path type
    pub fn path(ty: Expr, lhs: Expr, rhs: Expr) -> Self {
        Expr::Path {
            ty: Arc::new(ty),
            lhs: Arc::new(lhs),
            rhs: Arc::new(rhs),
        }
    }

    /// Create a reflexivity proof
    pub fn refl(e: Expr) -> Self {
        Expr::Refl(Arc::new(e))
    }

    /// Create a transport
    pub fn transport(motive: Expr, path: Expr, body: Expr) -> Self {
        Expr::Transport {
            motive: Arc::new(motive),
            path: Arc::new(path),
            body: Arc::new(body),
        }
    }

    /// Create a natural number literal
    pub fn nat_lit(n: u64) -> Self {
        Expr::Lit(Literal::Nat(n))
    }

    /// Check if this expression is a universe
    pub fn is_sort(&self) -> bool {
        matches!(self, Expr::Sort(_))
    }

    /// Get the head of an application spine
    pub fn get_app_fn(&self) -> &Expr {
        match self {
            Expr::App(f, _) => f.get_app_fn(),
            _ => self,
        }
    }

    /// Get all arguments of an application spine
    pub fn get_app_args(&self) -> Vec<&Expr> {
        let mut args = Vec::new();
        let mut curr = self;
        while let Expr::App(f, a) = curr {
            args.push(a.as_ref());
            curr = f.as_ref();
        }
        args.reverse();
        args
    }

    /// The set of free variables of this expression.
    pub fn free_vars(&self) -> HashSet<Name> {
        let mut out = HashSet::new();
        self.collect_free_vars(&mut Vec::new(), &mut out);
        out
    }

    fn collect_free_vars(&self, bound: &mut Vec<Name>, out: &mut HashSet<Name>) {
        match self {
            Expr::Var(n) => {
                if !bound.contains(n) {
                    out.insert(n.clone());
                }
            }
            Expr::Const(_) | Expr::Sort(_) | Expr::Lit(_) => {}
            Expr::App(f, a) => {
                f.collect_free_vars(bound, out);
                a.collect_free_vars(bound, out);
            }
            Expr::Lam { binder, ty, body } => {
                ty.collect_free_vars(bound, out);
                bound.push(binder.clone());
                body.collect_free_vars(bound, out);
                bound.pop();
            }
            Expr::Pi {
                binder,
                domain,
                codomain,
            } => {
                domain.collect_free_vars(bound, out);
                bound.push(binder.clone());
                codomain.collect_free_vars(bound, out);
                bound.pop();
            }
            Expr::Sigma {
                binder,
                fst_ty,
                snd_ty,
            } => {
                fst_ty.collect_free_vars(bound, out);
                bound.push(binder.clone());
                snd_ty.collect_free_vars(bound, out);
                bound.pop();
            }
            Expr::Pair(a, b) | Expr::Sum(a, b) => {
                a.collect_free_vars(bound, out);
                b.collect_free_vars(bound, out);
            }
            Expr::Fst(e) | Expr::Snd(e) | Expr::Inl(e) | Expr::Inr(e) | Expr::Refl(e) => {
                e.collect_free_vars(bound, out);
            }
            Expr::Case {
                scrut,
                left_binder,
                left,
                right_binder,
                right,
            } => {
                scrut.collect_free_vars(bound, out);
                bound.push(left_binder.clone());
                left.collect_free_vars(bound, out);
                bound.pop();
                bound.push(right_binder.clone());
                right.collect_free_vars(bound, out);
                bound.pop();
            }
            Expr::Path { ty, lhs, rhs } => {
                ty.collect_free_vars(bound, out);
                lhs.collect_free_vars(bound, out);
                rhs.collect_free_vars(bound, out);
            }
            Expr::Transport { motive, path, body } => {
                motive.collect_free_vars(bound, out);
                path.collect_free_vars(bound, out);
                body.collect_free_vars(bound, out);
            }
        }
    }

    /// Capture-avoiding substitution of `replacement` for the free variable
    /// `name`.
    ///
    /// A binder that shadows `name` stops the substitution below it. A binder
    /// whose name occurs free in `replacement` is renamed (primes appended)
    /// before descending, so the substituted term's variables are never
    /// captured: `(λy. x)[x := y]` yields `λy'. y`, not `λy. y`.
    #[must_use]
    pub fn subst(&self, name: &Name, replacement: &Expr) -> Expr {
        stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
            self.subst_impl(name, replacement)
        })
    }

    /// Rename a binder and its bound occurrences, returning the fresh name
    /// and the rewritten body. `extra_avoid` is the substitution target and
    /// the free variables of the replacement.
    fn avoid_capture(
        binder: &Name,
        body: &Expr,
        name: &Name,
        replacement: &Expr,
    ) -> (Name, Expr) {
        let repl_frees = replacement.free_vars();
        if !repl_frees.contains(binder) {
            return (binder.clone(), body.as_ref_clone());
        }
        let mut avoid = repl_frees;
        avoid.extend(body.free_vars());
        avoid.insert(name.clone());
        avoid.insert(binder.clone());
        let fresh = binder.freshen(&avoid);
        let renamed = body.subst_impl(binder, &Expr::Var(fresh.clone()));
        (fresh, renamed)
    }

    fn as_ref_clone(&self) -> Expr {
        self.clone()
    }

    fn subst_impl(&self, name: &Name, replacement: &Expr) -> Expr {
        match self {
            Expr::Var(n) => {
                if n == name {
                    replacement.clone()
                } else {
                    self.clone()
                }
            }
            Expr::Const(_) | Expr::Sort(_) | Expr::Lit(_) => self.clone(),
            Expr::App(f, a) => Expr::app(f.subst(name, replacement), a.subst(name, replacement)),
            Expr::Lam { binder, ty, body } => {
                let ty = ty.subst(name, replacement);
                if binder == name {
                    // Shadowed: the annotation is still open, the body is not.
                    Expr::Lam {
                        binder: binder.clone(),
                        ty: Arc::new(ty),
                        body: Arc::clone(body),
                    }
                } else {
                    let (binder, body) = Self::avoid_capture(binder, body, name, replacement);
                    Expr::lam(binder, ty, body.subst(name, replacement))
                }
            }
            Expr::Pi {
                binder,
                domain,
                codomain,
            } => {
                let domain = domain.subst(name, replacement);
                if binder == name {
                    Expr::Pi {
                        binder: binder.clone(),
                        domain: Arc::new(domain),
                        codomain: Arc::clone(codomain),
                    }
                } else {
                    let (binder, codomain) =
                        Self::avoid_capture(binder, codomain, name, replacement);
                    Expr::pi(binder, domain, codomain.subst(name, replacement))
                }
            }
            Expr::Sigma {
                binder,
                fst_ty,
                snd_ty,
            } => {
                let fst_ty = fst_ty.subst(name, replacement);
                if binder == name {
                    Expr::Sigma {
                        binder: binder.clone(),
                        fst_ty: Arc::new(fst_ty),
                        snd_ty: Arc::clone(snd_ty),
                    }
                } else {
                    let (binder, snd_ty) = Self::avoid_capture(binder, snd_ty, name, replacement);
                    Expr::sigma(binder, fst_ty, snd_ty.subst(name, replacement))
                }
            }
            Expr::Pair(a, b) => Expr::pair(a.subst(name, replacement), b.subst(name, replacement)),
            Expr::Sum(a, b) => Expr::sum(a.subst(name, replacement), b.subst(name, replacement)),
            Expr::Fst(e) => Expr::Fst(Arc::new(e.subst(name, replacement))),
            Expr::Snd(e) => Expr::Snd(Arc::new(e.subst(name, replacement))),
            Expr::Inl(e) => Expr::Inl(Arc::new(e.subst(name, replacement))),
            Expr::Inr(e) => Expr::Inr(Arc::new(e.subst(name, replacement))),
            Expr::Refl(e) => Expr::refl(e.subst(name, replacement)),
            Expr::Case {
                scrut,
                left_binder,
                left,
                right_binder,
                right,
            } => {
                let scrut = scrut.subst(name, replacement);
                let (left_binder, left) = if left_binder == name {
                    (left_binder.clone(), left.as_ref_clone())
                } else {
                    let (b, l) = Self::avoid_capture(left_binder, left, name, replacement);
                    (b, l.subst(name, replacement))
                };
                let (right_binder, right) = if right_binder == name {
                    (right_binder.clone(), right.as_ref_clone())
                } else {
                    let (b, r) = Self::avoid_capture(right_binder, right, name, replacement);
                    (b, r.subst(name, replacement))
                };
                Expr::Case {
                    scrut: Arc::new(scrut),
                    left_binder,
                    left: Arc::new(left),
                    right_binder,
                    right: Arc::new(right),
                }
            }
            Expr::Path { ty, lhs, rhs } => Expr::path(
                ty.subst(name, replacement),
                lhs.subst(name, replacement),
                rhs.subst(name, replacement),
            ),
            Expr::Transport { motive, path, body } => Expr::transport(
                motive.subst(name, replacement),
                path.subst(name, replacement),
                body.subst(name, replacement),
            ),
        }
    }

    /// Alpha-equivalence: structural equality up to bound-variable renaming.
    pub fn alpha_eq(&self, other: &Expr) -> bool {
        stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
            Self::alpha_eq_rec(self, other, &mut Vec::new())
        })
    }

    /// `pairs` holds the binder correspondences introduced so far,
    /// innermost last.
    fn alpha_eq_rec(a: &Expr, b: &Expr, pairs: &mut Vec<(Name, Name)>) -> bool {
        match (a, b) {
            (Expr::Var(x), Expr::Var(y)) => {
                for (bx, by) in pairs.iter().rev() {
                    match (bx == x, by == y) {
                        (true, true) => return true,
                        (true, false) | (false, true) => return false,
                        (false, false) => {}
                    }
                }
                x == y
            }
            (Expr::Const(x), Expr::Const(y)) => x == y,
            (Expr::Sort(i), Expr::Sort(j)) => i == j,
            (Expr::Lit(x), Expr::Lit(y)) => x == y,
            (Expr::App(f1, a1), Expr::App(f2, a2)) => {
                Self::alpha_eq_rec(f1, f2, pairs) && Self::alpha_eq_rec(a1, a2, pairs)
            }
            (
                Expr::Lam {
                    binder: b1,
                    ty: t1,
                    body: e1,
                },
                Expr::Lam {
                    binder: b2,
                    ty: t2,
                    body: e2,
                },
            )
            | (
                Expr::Pi {
                    binder: b1,
                    domain: t1,
                    codomain: e1,
                },
                Expr::Pi {
                    binder: b2,
                    domain: t2,
                    codomain: e2,
                },
            )
            | (
                Expr::Sigma {
                    binder: b1,
                    fst_ty: t1,
                    snd_ty: e1,
                },
                Expr::Sigma {
                    binder: b2,
                    fst_ty: t2,
                    snd_ty: e2,
                },
            ) => {
                if !Self::alpha_eq_rec(t1, t2, pairs) {
                    return false;
                }
                pairs.push((b1.clone(), b2.clone()));
                let ok = Self::alpha_eq_rec(e1, e2, pairs);
                pairs.pop();
                ok
            }
            (Expr::Pair(a1, b1), Expr::Pair(a2, b2))
            | (Expr::Sum(a1, b1), Expr::Sum(a2, b2)) => {
                Self::alpha_eq_rec(a1, a2, pairs) && Self::alpha_eq_rec(b1, b2, pairs)
            }
            (Expr::Fst(x), Expr::Fst(y))
            | (Expr::Snd(x), Expr::Snd(y))
            | (Expr::Inl(x), Expr::Inl(y))
            | (Expr::Inr(x), Expr::Inr(y))
            | (Expr::Refl(x), Expr::Refl(y)) => Self::alpha_eq_rec(x, y, pairs),
            (
                Expr::Case {
                    scrut: s1,
                    left_binder: lb1,
                    left: l1,
                    right_binder: rb1,
                    right: r1,
                },
                Expr::Case {
                    scrut: s2,
                    left_binder: lb2,
                    left: l2,
                    right_binder: rb2,
                    right: r2,
                },
            ) => {
                if !Self::alpha_eq_rec(s1, s2, pairs) {
                    return false;
                }
                pairs.push((lb1.clone(), lb2.clone()));
                let left_ok = Self::alpha_eq_rec(l1, l2, pairs);
                pairs.pop();
                if !left_ok {
                    return false;
                }
                pairs.push((rb1.clone(), rb2.clone()));
                let right_ok = Self::alpha_eq_rec(r1, r2, pairs);
                pairs.pop();
                right_ok
            }
            (
                Expr::Path {
                    ty: t1,
                    lhs: l1,
                    rhs: r1,
                },
                Expr::Path {
                    ty: t2,
                    lhs: l2,
                    rhs: r2,
                },
            ) => {
                Self::alpha_eq_rec(t1, t2, pairs)
                    && Self::alpha_eq_rec(l1, l2, pairs)
                    && Self::alpha_eq_rec(r1, r2, pairs)
            }
            (
                Expr::Transport {
                    motive: m1,
                    path: p1,
                    body: b1,
                },
                Expr::Transport {
                    motive: m2,
                    path: p2,
                    body: b2,
                },
            ) => {
                Self::alpha_eq_rec(m1, m2, pairs)
                    && Self::alpha_eq_rec(p1, p2, pairs)
                    && Self::alpha_eq_rec(b1, b2, pairs)
            }
            _ => false,
        }
    }

    /// Whether `needle` occurs as a subterm, up to alpha-equivalence.
    ///
    /// Descent stops under a binder that rebinds one of `needle`'s free
    /// variables: occurrences below refer to a different binding.
    pub fn contains_subterm(&self, needle: &Expr) -> bool {
        let frees = needle.free_vars();
        self.walk_subterms(needle, &frees, &mut |_| {}).is_some()
    }

    /// Replace every occurrence of `from` (up to alpha-equivalence) with
    /// `to`. The same binder guard as [`Expr::contains_subterm`] applies.
    #[must_use]
    pub fn replace_subterm(&self, from: &Expr, to: &Expr) -> Expr {
        let frees = from.free_vars();
        self.replace_rec(from, to, &frees)
    }

    /// Shared traversal: returns `Some(())` on first match and invokes `f`.
    fn walk_subterms(
        &self,
        needle: &Expr,
        needle_frees: &HashSet<Name>,
        f: &mut impl FnMut(&Expr),
    ) -> Option<()> {
        if self.alpha_eq(needle) {
            f(self);
            return Some(());
        }
        let guard = |binder: &Name| needle_frees.contains(binder);
        match self {
            Expr::Var(_) | Expr::Const(_) | Expr::Sort(_) | Expr::Lit(_) => None,
            Expr::App(a, b) | Expr::Pair(a, b) | Expr::Sum(a, b) => a
                .walk_subterms(needle, needle_frees, f)
                .or_else(|| b.walk_subterms(needle, needle_frees, f)),
            Expr::Lam { binder, ty, body } => {
                ty.walk_subterms(needle, needle_frees, f).or_else(|| {
                    if guard(binder) {
                        None
                    } else {
                        body.walk_subterms(needle, needle_frees, f)
                    }
                })
            }
            Expr::Pi {
                binder,
                domain,
                codomain,
            } => domain.walk_subterms(needle, needle_frees, f).or_else(|| {
                if guard(binder) {
                    None
                } else {
                    codomain.walk_subterms(needle, needle_frees, f)
                }
            }),
            Expr::Sigma {
                binder,
                fst_ty,
                snd_ty,
            } => fst_ty.walk_subterms(needle, needle_frees, f).or_else(|| {
                if guard(binder) {
                    None
                } else {
                    snd_ty.walk_subterms(needle, needle_frees, f)
                }
            }),
            Expr::Fst(e) | Expr::Snd(e) | Expr::Inl(e) | Expr::Inr(e) | Expr::Refl(e) => {
                e.walk_subterms(needle, needle_frees, f)
            }
            Expr::Case {
                scrut,
                left_binder,
                left,
                right_binder,
                right,
            } => scrut
                .walk_subterms(needle, needle_frees, f)
                .or_else(|| {
                    if guard(left_binder) {
                        None
                    } else {
                        left.walk_subterms(needle, needle_frees, f)
                    }
                })
                .or_else(|| {
                    if guard(right_binder) {
                        None
                    } else {
                        right.walk_subterms(needle, needle_frees, f)
                    }
                }),
            Expr::Path { ty, lhs, rhs } => ty
                .walk_subterms(needle, needle_frees, f)
                .or_else(|| lhs.walk_subterms(needle, needle_frees, f))
                .or_else(|| rhs.walk_subterms(needle, needle_frees, f)),
            Expr::Transport { motive, path, body } => motive
                .walk_subterms(needle, needle_frees, f)
                .or_else(|| path.walk_subterms(needle, needle_frees, f))
                .or_else(|| body.walk_subterms(needle, needle_frees, f)),
        }
    }

    fn replace_rec(&self, from: &Expr, to: &Expr, from_frees: &HashSet<Name>) -> Expr {
        if self.alpha_eq(from) {
            return to.clone();
        }
        let guard = |binder: &Name| from_frees.contains(binder);
        match self {
            Expr::Var(_) | Expr::Const(_) | Expr::Sort(_) | Expr::Lit(_) => self.clone(),
            Expr::App(f, a) => Expr::app(
                f.replace_rec(from, to, from_frees),
                a.replace_rec(from, to, from_frees),
            ),
            Expr::Lam { binder, ty, body } => {
                let body = if guard(binder) {
                    body.as_ref_clone()
                } else {
                    body.replace_rec(from, to, from_frees)
                };
                Expr::lam(
                    binder.clone(),
                    ty.replace_rec(from, to, from_frees),
                    body,
                )
            }
            Expr::Pi {
                binder,
                domain,
                codomain,
            } => {
                let codomain = if guard(binder) {
                    codomain.as_ref_clone()
                } else {
                    codomain.replace_rec(from, to, from_frees)
                };
                Expr::pi(
                    binder.clone(),
                    domain.replace_rec(from, to, from_frees),
                    codomain,
                )
            }
            Expr::Sigma {
                binder,
                fst_ty,
                snd_ty,
            } => {
                let snd_ty = if guard(binder) {
                    snd_ty.as_ref_clone()
                } else {
                    snd_ty.replace_rec(from, to, from_frees)
                };
                Expr::sigma(
                    binder.clone(),
                    fst_ty.replace_rec(from, to, from_frees),
                    snd_ty,
                )
            }
            Expr::Pair(a, b) => Expr::pair(
                a.replace_rec(from, to, from_frees),
                b.replace_rec(from, to, from_frees),
            ),
            Expr::Sum(a, b) => Expr::sum(
                a.replace_rec(from, to, from_frees),
                b.replace_rec(from, to, from_frees),
            ),
            Expr::Fst(e) => Expr::Fst(Arc::new(e.replace_rec(from, to, from_frees))),
            Expr::Snd(e) => Expr::Snd(Arc::new(e.replace_rec(from, to, from_frees))),
            Expr::Inl(e) => Expr::Inl(Arc::new(e.replace_rec(from, to, from_frees))),
            Expr::Inr(e) => Expr::Inr(Arc::new(e.replace_rec(from, to, from_frees))),
            Expr::Refl(e) => Expr::refl(e.replace_rec(from, to, from_frees)),
            Expr::Case {
                scrut,
                left_binder,
                left,
                right_binder,
                right,
            } => {
                let left = if guard(left_binder) {
                    left.as_ref_clone()
                } else {
                    left.replace_rec(from, to, from_frees)
                };
                let right = if guard(right_binder) {
                    right.as_ref_clone()
                } else {
                    right.replace_rec(from, to, from_frees)
                };
                Expr::Case {
                    scrut: Arc::new(scrut.replace_rec(from, to, from_frees)),
                    left_binder: left_binder.clone(),
                    left: Arc::new(left),
                    right_binder: right_binder.clone(),
                    right: Arc::new(right),
                }
            }
            Expr::Path { ty, lhs, rhs } => Expr::path(
                ty.replace_rec(from, to, from_frees),
                lhs.replace_rec(from, to, from_frees),
                rhs.replace_rec(from, to, from_frees),
            ),
            Expr::Transport { motive, path, body } => Expr::transport(
                motive.replace_rec(from, to, from_frees),
                path.replace_rec(from, to, from_frees),
                body.replace_rec(from, to, from_frees),
            ),
        }
    }

    /// Render the alpha-canonical form: bound variables as de Bruijn
    /// indices, free variables and constants by name. Two expressions have
    /// equal canonical forms iff they are alpha-equivalent, which makes this
    /// the input for [`crate::ty::TypeSignature`] hashing.
    pub fn alpha_canonical(&self) -> String {
        let mut out = String::new();
        stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
            self.canonical_rec(&mut Vec::new(), &mut out);
        });
        out
    }

    fn canonical_rec(&self, bound: &mut Vec<Name>, out: &mut String) {
        use std::fmt::Write;
        match self {
            Expr::Var(n) => {
                if let Some(idx) = bound.iter().rev().position(|b| b == n) {
                    let _ = write!(out, "#{idx}");
                } else {
                    let _ = write!(out, "${n}");
                }
            }
            Expr::Const(n) => {
                let _ = write!(out, "!{n}");
            }
            Expr::Sort(i) => {
                let _ = write!(out, "U{i}");
            }
            Expr::Lit(Literal::Nat(n)) => {
                let _ = write!(out, "n{n}");
            }
            Expr::Lit(Literal::Bool(b)) => {
                let _ = write!(out, "b{b}");
            }
            Expr::App(f, a) => {
                out.push_str("(@");
                f.canonical_rec(bound, out);
                out.push(' ');
                a.canonical_rec(bound, out);
                out.push(')');
            }
            Expr::Lam { binder, ty, body } => {
                out.push_str("(λ");
                ty.canonical_rec(bound, out);
                out.push('.');
                bound.push(binder.clone());
                body.canonical_rec(bound, out);
                bound.pop();
                out.push(')');
            }
            Expr::Pi {
                binder,
                domain,
                codomain,
            } => {
                out.push_str("(Π");
                domain.canonical_rec(bound, out);
                out.push('.');
                bound.push(binder.clone());
                codomain.canonical_rec(bound, out);
                bound.pop();
                out.push(')');
            }
            Expr::Sigma {
                binder,
                fst_ty,
                snd_ty,
            } => {
                out.push_str("(Σ");
                fst_ty.canonical_rec(bound, out);
                out.push('.');
                bound.push(binder.clone());
                snd_ty.canonical_rec(bound, out);
                bound.pop();
                out.push(')');
            }
            Expr::Pair(a, b) => {
                out.push_str("(pair ");
                a.canonical_rec(bound, out);
                out.push(' ');
                b.canonical_rec(bound, out);
                out.push(')');
            }
            Expr::Fst(e) => {
                out.push_str("(fst ");
                e.canonical_rec(bound, out);
                out.push(')');
            }
            Expr::Snd(e) => {
                out.push_str("(snd ");
                e.canonical_rec(bound, out);
                out.push(')');
            }
            Expr::Sum(a, b) => {
                out.push_str("(+ ");
                a.canonical_rec(bound, out);
                out.push(' ');
                b.canonical_rec(bound, out);
                out.push(')');
            }
            Expr::Inl(e) => {
                out.push_str("(inl ");
                e.canonical_rec(bound, out);
                out.push(')');
            }
            Expr::Inr(e) => {
                out.push_str("(inr ");
                e.canonical_rec(bound, out);
                out.push(')');
            }
            Expr::Case {
                scrut,
                left_binder,
                left,
                right_binder,
                right,
            } => {
                out.push_str("(case ");
                scrut.canonical_rec(bound, out);
                out.push(' ');
                bound.push(left_binder.clone());
                left.canonical_rec(bound, out);
                bound.pop();
                out.push(' ');
                bound.push(right_binder.clone());
                right.canonical_rec(bound, out);
                bound.pop();
                out.push(')');
            }
            Expr::Path { ty, lhs, rhs } => {
                out.push_str("(path ");
                ty.canonical_rec(bound, out);
                out.push(' ');
                lhs.canonical_rec(bound, out);
                out.push(' ');
                rhs.canonical_rec(bound, out);
                out.push(')');
            }
            Expr::Refl(e) => {
                out.push_str("(refl ");
                e.canonical_rec(bound, out);
                out.push(')');
            }
            Expr::Transport { motive, path, body } => {
                out.push_str("(transp ");
                motive.canonical_rec(bound, out);
                out.push(' ');
                path.canonical_rec(bound, out);
                out.push(' ');
                body.canonical_rec(bound, out);
                out.push(')');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Name {
        Name::new("x")
    }

    fn y() -> Name {
        Name::new("y")
    }

    #[test]
    fn test_subst_free_variable() {
        let e = Expr::var("x");
        assert_eq!(e.subst(&x(), &Expr::var("z")), Expr::var("z"));
        // Untouched when the variable differs.
        assert_eq!(e.subst(&y(), &Expr::var("z")), Expr::var("x"));
    }

    #[test]
    fn test_subst_shadowing_stops() {
        // (λ(x : Type). x)[x := y] is unchanged: the binder shadows.
        let lam = Expr::lam("x", Expr::type_(), Expr::var("x"));
        let result = lam.subst(&x(), &Expr::var("y"));
        assert_eq!(result, lam);
    }

    #[test]
    fn test_subst_capture_avoidance() {
        // (λ(y : Type). x)[x := y] must rename the binder: λ(y' : Type). y
        let lam = Expr::lam("y", Expr::type_(), Expr::var("x"));
        let result = lam.subst(&x(), &Expr::var("y"));
        let expected = Expr::lam("y'", Expr::type_(), Expr::var("y"));
        assert_eq!(result, expected);
    }

    #[test]
    fn test_subst_capture_avoidance_nested() {
        // (λ(y : Type). λ(y' : Type). x)[x := y] must avoid both binders.
        let inner = Expr::lam("y'", Expr::type_(), Expr::var("x"));
        let lam = Expr::lam("y", Expr::type_(), inner);
        let result = lam.subst(&x(), &Expr::var("y"));
        // Outer binder renamed away from y; inner body receives y.
        let expected = Expr::lam(
            "y''",
            Expr::type_(),
            Expr::lam("y'", Expr::type_(), Expr::var("y")),
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn test_alpha_eq_renamed_binder() {
        let a = Expr::lam("x", Expr::type_(), Expr::var("x"));
        let b = Expr::lam("y", Expr::type_(), Expr::var("y"));
        assert!(a.alpha_eq(&b));
        assert_ne!(a, b); // syntactic equality still distinguishes them
    }

    #[test]
    fn test_alpha_eq_free_variables_matter() {
        let a = Expr::lam("x", Expr::type_(), Expr::var("z"));
        let b = Expr::lam("y", Expr::type_(), Expr::var("w"));
        assert!(!a.alpha_eq(&b));
    }

    #[test]
    fn test_alpha_eq_mixed_binding() {
        // λx. λy. x vs λy. λx. y : equal (both project the outer binder)
        let a = Expr::lam(
            "x",
            Expr::type_(),
            Expr::lam("y", Expr::type_(), Expr::var("x")),
        );
        let b = Expr::lam(
            "y",
            Expr::type_(),
            Expr::lam("x", Expr::type_(), Expr::var("y")),
        );
        assert!(a.alpha_eq(&b));

        // λx. λy. x vs λx. λy. y : not equal
        let c = Expr::lam(
            "x",
            Expr::type_(),
            Expr::lam("y", Expr::type_(), Expr::var("y")),
        );
        assert!(!a.alpha_eq(&c));
    }

    #[test]
    fn test_free_vars() {
        let e = Expr::lam("x", Expr::var("A"), Expr::app(Expr::var("x"), Expr::var("y")));
        let frees = e.free_vars();
        assert!(frees.contains(&Name::new("A")));
        assert!(frees.contains(&Name::new("y")));
        assert!(!frees.contains(&Name::new("x")));
    }

    #[test]
    fn test_replace_subterm() {
        // (f a) with a -> b gives (f b)
        let e = Expr::app(Expr::var("f"), Expr::var("a"));
        let out = e.replace_subterm(&Expr::var("a"), &Expr::var("b"));
        assert_eq!(out, Expr::app(Expr::var("f"), Expr::var("b")));
    }

    #[test]
    fn test_replace_subterm_respects_binders() {
        // λ(a : Type). a must NOT have its bound occurrence replaced when
        // rewriting the free variable a.
        let e = Expr::lam("a", Expr::type_(), Expr::var("a"));
        let out = e.replace_subterm(&Expr::var("a"), &Expr::var("b"));
        assert_eq!(out, e);
    }

    #[test]
    fn test_canonical_stable_under_renaming() {
        let a = Expr::pi("n", Expr::const_("Nat"), Expr::var("n").into_path_over_nat());
        let b = Expr::pi("m", Expr::const_("Nat"), Expr::var("m").into_path_over_nat());
        assert_eq!(a.alpha_canonical(), b.alpha_canonical());

        let free = Expr::pi("n", Expr::const_("Nat"), Expr::var("k").into_path_over_nat());
        assert_ne!(a.alpha_canonical(), free.alpha_canonical());
    }

    impl Expr {
        /// Test helper: `Path Nat e e`.
        fn into_path_over_nat(self) -> Expr {
            Expr::path(Expr::const_("Nat"), self.clone(), self)
        }
    }

    #[test]
    fn test_app_spine_helpers() {
        let e = Expr::app_many(Expr::const_("f"), [Expr::var("a"), Expr::var("b")]);
        assert_eq!(e.get_app_fn(), &Expr::const_("f"));
        let args = e.get_app_args();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], &Expr::var("a"));
        assert_eq!(args[1], &Expr::var("b"));
    }
}
