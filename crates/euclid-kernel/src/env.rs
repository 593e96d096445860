//! Declaration environment.
//!
//! The theorem library behind `apply <theorem>`, `unfold <name>`,
//! `induction <var>` and the query surface. Holds definitions, theorems,
//! axioms and inductive types; ships the builtins (`Nat`, `Bool`, `id`,
//! `comp`, path lemmas) every session starts from.

use crate::expr::Expr;
use crate::name::Name;
use hashbrown::HashMap;
use thiserror::Error;

/// What kind of declaration a name refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclKind {
    /// Has a value that `unfold` and the normalizer may substitute.
    Definition,
    /// A proved statement (value is its proof term, if recorded).
    Theorem,
    /// A postulate; no value.
    Axiom,
    /// An inductive type former.
    Inductive,
    /// A constructor of an inductive type.
    Constructor,
}

/// A single named declaration.
#[derive(Clone, Debug)]
pub struct Declaration {
    pub name: Name,
    pub ty: Expr,
    pub value: Option<Expr>,
    pub kind: DeclKind,
}

/// A constructor of an inductive type: name plus named field types.
/// Field types are closed expressions (they may mention the inductive
/// itself, as in `Nat.succ : Nat → Nat`).
#[derive(Clone, Debug)]
pub struct Constructor {
    pub name: Name,
    pub fields: Vec<(Name, Expr)>,
}

/// An inductive type declaration.
#[derive(Clone, Debug)]
pub struct InductiveDecl {
    pub name: Name,
    /// Universe the type lives in (`0` for `Type`).
    pub universe: u32,
    pub constructors: Vec<Constructor>,
}

impl InductiveDecl {
    /// The name of the generated case eliminator (`Nat.cases`).
    pub fn cases_name(&self) -> Name {
        Name::new(format!("{}.cases", self.name))
    }

    /// Type of the case eliminator:
    /// `Π(C : Ind → Type). (per-constructor branch) → Π(x : Ind). C x`
    /// where the branch for a constructor `c` with fields `(f_i : T_i)` is
    /// `Π(f_1 : T_1). ... C (c f_1 ... f_n)`.
    ///
    /// This is case analysis, not full recursion: branches receive the
    /// constructor fields but no induction hypothesis.
    pub fn cases_type(&self) -> Expr {
        let ind = Expr::const_(self.name.clone());
        let motive = Name::new("C");
        let subject = Name::new("x");

        // Π(x : Ind). C x, the eliminator's final codomain.
        let mut ty = Expr::pi(
            subject.clone(),
            ind.clone(),
            Expr::app(Expr::var(motive.clone()), Expr::var(subject)),
        );

        // Branches, innermost (last constructor) first.
        for ctor in self.constructors.iter().rev() {
            let applied = Expr::app_many(
                Expr::const_(ctor.name.clone()),
                ctor.fields.iter().map(|(f, _)| Expr::var(f.clone())),
            );
            let mut branch = Expr::app(Expr::var(motive.clone()), applied);
            for (field, field_ty) in ctor.fields.iter().rev() {
                branch = Expr::pi(field.clone(), field_ty.clone(), branch);
            }
            ty = Expr::arrow(branch, ty);
        }

        Expr::pi(
            motive,
            Expr::arrow(ind, Expr::sort(self.universe)),
            ty,
        )
    }
}

/// Errors raised while populating an environment.
#[derive(Debug, Clone, Error)]
pub enum EnvError {
    #[error("duplicate declaration: {0}")]
    Duplicate(Name),
}

/// The declaration environment.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    decls: HashMap<Name, Declaration>,
    inductives: HashMap<Name, InductiveDecl>,
    /// Insertion order, for deterministic query output.
    order: Vec<Name>,
}

impl Environment {
    /// Empty environment.
    pub fn new() -> Self {
        Environment::default()
    }

    /// Environment preloaded with the builtin library.
    pub fn with_builtins() -> Self {
        let mut env = Environment::new();
        env.load_builtins()
            .expect("builtin declarations are duplicate-free");
        env
    }

    /// Add a declaration.
    pub fn add_decl(&mut self, decl: Declaration) -> Result<(), EnvError> {
        if self.decls.contains_key(&decl.name) {
            return Err(EnvError::Duplicate(decl.name));
        }
        self.order.push(decl.name.clone());
        self.decls.insert(decl.name.clone(), decl);
        Ok(())
    }

    /// Register an inductive type: the type former, its constructors and
    /// the generated case eliminator all become declarations.
    pub fn add_inductive(&mut self, ind: InductiveDecl) -> Result<(), EnvError> {
        self.add_decl(Declaration {
            name: ind.name.clone(),
            ty: Expr::sort(ind.universe),
            value: None,
            kind: DeclKind::Inductive,
        })?;
        for ctor in &ind.constructors {
            let mut ty = Expr::const_(ind.name.clone());
            for (field, field_ty) in ctor.fields.iter().rev() {
                ty = Expr::pi(field.clone(), field_ty.clone(), ty);
            }
            self.add_decl(Declaration {
                name: ctor.name.clone(),
                ty,
                value: None,
                kind: DeclKind::Constructor,
            })?;
        }
        self.add_decl(Declaration {
            name: ind.cases_name(),
            ty: ind.cases_type(),
            value: None,
            kind: DeclKind::Axiom,
        })?;
        self.inductives.insert(ind.name.clone(), ind);
        Ok(())
    }

    /// Look up a declaration by name.
    pub fn get_decl(&self, name: &Name) -> Option<&Declaration> {
        self.decls.get(name)
    }

    /// Look up an inductive type by name.
    pub fn get_inductive(&self, name: &Name) -> Option<&InductiveDecl> {
        self.inductives.get(name)
    }

    /// Iterate declarations in insertion order.
    pub fn iter_decls(&self) -> impl Iterator<Item = &Declaration> {
        self.order.iter().filter_map(|n| self.decls.get(n))
    }

    fn load_builtins(&mut self) -> Result<(), EnvError> {
        let nat = Expr::const_("Nat");
        let ty = Expr::type_();

        self.add_inductive(InductiveDecl {
            name: "Nat".into(),
            universe: 0,
            constructors: vec![
                Constructor {
                    name: "Nat.zero".into(),
                    fields: vec![],
                },
                Constructor {
                    name: "Nat.succ".into(),
                    fields: vec![("n".into(), nat.clone())],
                },
            ],
        })?;

        self.add_inductive(InductiveDecl {
            name: "Bool".into(),
            universe: 0,
            constructors: vec![
                Constructor {
                    name: "Bool.false".into(),
                    fields: vec![],
                },
                Constructor {
                    name: "Bool.true".into(),
                    fields: vec![],
                },
            ],
        })?;

        // id : ∀(A : Type). A → A
        self.add_decl(Declaration {
            name: "id".into(),
            ty: Expr::pi(
                "A",
                ty.clone(),
                Expr::arrow(Expr::var("A"), Expr::var("A")),
            ),
            value: Some(Expr::lam(
                "A",
                ty.clone(),
                Expr::lam("x", Expr::var("A"), Expr::var("x")),
            )),
            kind: DeclKind::Definition,
        })?;

        // comp : ∀(A B C : Type). (B → C) → (A → B) → A → C
        let comp_ty = Expr::pi(
            "A",
            ty.clone(),
            Expr::pi(
                "B",
                ty.clone(),
                Expr::pi(
                    "C",
                    ty.clone(),
                    Expr::arrow(
                        Expr::arrow(Expr::var("B"), Expr::var("C")),
                        Expr::arrow(
                            Expr::arrow(Expr::var("A"), Expr::var("B")),
                            Expr::arrow(Expr::var("A"), Expr::var("C")),
                        ),
                    ),
                ),
            ),
        );
        let comp_val = Expr::lam(
            "A",
            ty.clone(),
            Expr::lam(
                "B",
                ty.clone(),
                Expr::lam(
                    "C",
                    ty.clone(),
                    Expr::lam(
                        "g",
                        Expr::arrow(Expr::var("B"), Expr::var("C")),
                        Expr::lam(
                            "f",
                            Expr::arrow(Expr::var("A"), Expr::var("B")),
                            Expr::lam(
                                "x",
                                Expr::var("A"),
                                Expr::app(
                                    Expr::var("g"),
                                    Expr::app(Expr::var("f"), Expr::var("x")),
                                ),
                            ),
                        ),
                    ),
                ),
            ),
        );
        self.add_decl(Declaration {
            name: "comp".into(),
            ty: comp_ty,
            value: Some(comp_val),
            kind: DeclKind::Definition,
        })?;

        // Path.symm : ∀(A : Type). ∀(a : A). ∀(b : A). Path A a b → Path A b a
        self.add_decl(Declaration {
            name: "Path.symm".into(),
            ty: Expr::pi(
                "A",
                ty.clone(),
                Expr::pi(
                    "a",
                    Expr::var("A"),
                    Expr::pi(
                        "b",
                        Expr::var("A"),
                        Expr::arrow(
                            Expr::path(Expr::var("A"), Expr::var("a"), Expr::var("b")),
                            Expr::path(Expr::var("A"), Expr::var("b"), Expr::var("a")),
                        ),
                    ),
                ),
            ),
            value: None,
            kind: DeclKind::Axiom,
        })?;

        // Path.trans : ∀(A : Type). ∀(a b c : A). Path A a b → Path A b c → Path A a c
        self.add_decl(Declaration {
            name: "Path.trans".into(),
            ty: Expr::pi(
                "A",
                ty.clone(),
                Expr::pi(
                    "a",
                    Expr::var("A"),
                    Expr::pi(
                        "b",
                        Expr::var("A"),
                        Expr::pi(
                            "c",
                            Expr::var("A"),
                            Expr::arrow(
                                Expr::path(Expr::var("A"), Expr::var("a"), Expr::var("b")),
                                Expr::arrow(
                                    Expr::path(Expr::var("A"), Expr::var("b"), Expr::var("c")),
                                    Expr::path(Expr::var("A"), Expr::var("a"), Expr::var("c")),
                                ),
                            ),
                        ),
                    ),
                ),
            ),
            value: None,
            kind: DeclKind::Axiom,
        })?;

        Ok(())
    }
}
