//! Surface syntax parser.
//!
//! Parses the textual form produced by the kernel pretty printer, so
//! statements and proof terms round-trip through persistence. Both
//! Unicode and ASCII spellings are accepted:
//!
//! ```text
//! λ(x : A). b        \(x : A). b
//! ∀(x : A). B        forall (x : A). B        Π(x : A). B
//! Σ(x : A). B        Sigma (x : A). B
//! A → B              A -> B
//! ```
//!
//! All identifiers parse as [`Expr::Var`]; [`resolve_consts`] rewrites
//! free occurrences that name an environment declaration into
//! [`Expr::Const`]. Metavariable tokens (`?g0`) stay variables, which is
//! how partially-complete proof terms survive a save/load cycle.

use euclid_kernel::{Environment, Expr, Literal, Name};
use std::collections::HashSet;
use thiserror::Error;

mod lexer;

use lexer::{Lexer, Token, TokenKind};

/// Parse failures, with byte offsets into the input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input (expected {expected})")]
    UnexpectedEof { expected: String },
    #[error("unexpected `{found}` at offset {offset} (expected {expected})")]
    UnexpectedToken {
        found: String,
        expected: String,
        offset: usize,
    },
    #[error("unrecognized character `{ch}` at offset {offset}")]
    UnrecognizedChar { ch: char, offset: usize },
    #[error("number literal out of range at offset {offset}")]
    NumberOutOfRange { offset: usize },
}

/// Parse a complete expression; trailing input is an error.
pub fn parse_expr(input: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(input)?;
    let expr = parser.expr()?;
    parser.expect_eof()?;
    Ok(expr)
}

/// Rewrite free variables that name an environment declaration into
/// constant references. Bound occurrences are left alone, so a local
/// binder may shadow a global name.
pub fn resolve_consts(env: &Environment, expr: &Expr) -> Expr {
    fn go(env: &Environment, expr: &Expr, bound: &mut HashSet<Name>) -> Expr {
        match expr {
            Expr::Var(n) => {
                if !bound.contains(n) && !n.is_meta() && env.get_decl(n).is_some() {
                    Expr::const_(n.clone())
                } else {
                    expr.clone()
                }
            }
            Expr::Const(_) | Expr::Sort(_) | Expr::Lit(_) => expr.clone(),
            Expr::App(f, a) => Expr::app(go(env, f, bound), go(env, a, bound)),
            Expr::Lam { binder, ty, body } => {
                let ty = go(env, ty, bound);
                let fresh = bound.insert(binder.clone());
                let body = go(env, body, bound);
                if fresh {
                    bound.remove(binder);
                }
                Expr::lam(binder.clone(), ty, body)
            }
            Expr::Pi {
                binder,
                domain,
                codomain,
            } => {
                let domain = go(env, domain, bound);
                let fresh = bound.insert(binder.clone());
                let codomain = go(env, codomain, bound);
                if fresh {
                    bound.remove(binder);
                }
                Expr::pi(binder.clone(), domain, codomain)
            }
            Expr::Sigma {
                binder,
                fst_ty,
                snd_ty,
            } => {
                let fst_ty = go(env, fst_ty, bound);
                let fresh = bound.insert(binder.clone());
                let snd_ty = go(env, snd_ty, bound);
                if fresh {
                    bound.remove(binder);
                }
                Expr::sigma(binder.clone(), fst_ty, snd_ty)
            }
            Expr::Pair(a, b) => Expr::pair(go(env, a, bound), go(env, b, bound)),
            Expr::Fst(e) => Expr::Fst(go(env, e, bound).into()),
            Expr::Snd(e) => Expr::Snd(go(env, e, bound).into()),
            Expr::Sum(a, b) => Expr::sum(go(env, a, bound), go(env, b, bound)),
            Expr::Inl(e) => Expr::Inl(go(env, e, bound).into()),
            Expr::Inr(e) => Expr::Inr(go(env, e, bound).into()),
            Expr::Case {
                scrut,
                left_binder,
                left,
                right_binder,
                right,
            } => {
                let scrut = go(env, scrut, bound);
                let lf = bound.insert(left_binder.clone());
                let left = go(env, left, bound);
                if lf {
                    bound.remove(left_binder);
                }
                let rf = bound.insert(right_binder.clone());
                let right = go(env, right, bound);
                if rf {
                    bound.remove(right_binder);
                }
                Expr::Case {
                    scrut: scrut.into(),
                    left_binder: left_binder.clone(),
                    left: left.into(),
                    right_binder: right_binder.clone(),
                    right: right.into(),
                }
            }
            Expr::Path { ty, lhs, rhs } => Expr::path(
                go(env, ty, bound),
                go(env, lhs, bound),
                go(env, rhs, bound),
            ),
            Expr::Refl(e) => Expr::refl(go(env, e, bound)),
            Expr::Transport { motive, path, body } => Expr::transport(
                go(env, motive, bound),
                go(env, path, bound),
                go(env, body, bound),
            ),
        }
    }
    go(env, expr, &mut HashSet::new())
}

/// Parse and resolve in one step.
pub fn parse_resolved(env: &Environment, input: &str) -> Result<Expr, ParseError> {
    Ok(resolve_consts(env, &parse_expr(input)?))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self, ParseError> {
        Ok(Parser {
            tokens: Lexer::new(input).tokenize()?,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, ParseError> {
        match self.bump() {
            Some(tok) if &tok.kind == kind => Ok(tok),
            Some(tok) => Err(ParseError::UnexpectedToken {
                found: tok.kind.to_string(),
                expected: what.to_owned(),
                offset: tok.offset,
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: what.to_owned(),
            }),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<Name, ParseError> {
        match self.bump() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => Ok(Name::new(name)),
            Some(tok) => Err(ParseError::UnexpectedToken {
                found: tok.kind.to_string(),
                expected: what.to_owned(),
                offset: tok.offset,
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: what.to_owned(),
            }),
        }
    }

    fn expect_eof(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(tok) => Err(ParseError::UnexpectedToken {
                found: tok.kind.to_string(),
                expected: "end of input".to_owned(),
                offset: tok.offset,
            }),
        }
    }

    /// `(x : expr)` — the binder group shared by λ, ∀ and Σ.
    fn binder(&mut self) -> Result<(Name, Expr), ParseError> {
        self.expect(&TokenKind::LParen, "`(`")?;
        let name = self.expect_ident("binder name")?;
        self.expect(&TokenKind::Colon, "`:`")?;
        let ty = self.expr()?;
        self.expect(&TokenKind::RParen, "`)`")?;
        Ok((name, ty))
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Lambda) => {
                self.bump();
                let (name, ty) = self.binder()?;
                self.expect(&TokenKind::Dot, "`.`")?;
                Ok(Expr::lam(name, ty, self.expr()?))
            }
            Some(TokenKind::Forall) => {
                self.bump();
                let (name, ty) = self.binder()?;
                self.expect(&TokenKind::Dot, "`.`")?;
                Ok(Expr::pi(name, ty, self.expr()?))
            }
            Some(TokenKind::Sigma) => {
                self.bump();
                let (name, ty) = self.binder()?;
                self.expect(&TokenKind::Dot, "`.`")?;
                Ok(Expr::sigma(name, ty, self.expr()?))
            }
            Some(TokenKind::Case) => self.case(),
            _ => self.arrow(),
        }
    }

    fn case(&mut self) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::Case, "`case`")?;
        let scrut = self.arrow()?;
        self.expect(&TokenKind::Of, "`of`")?;
        self.expect(&TokenKind::Inl, "`inl`")?;
        let left_binder = self.expect_ident("left binder")?;
        self.expect(&TokenKind::FatArrow, "`=>`")?;
        let left = self.arrow()?;
        self.expect(&TokenKind::Pipe, "`|`")?;
        self.expect(&TokenKind::Inr, "`inr`")?;
        let right_binder = self.expect_ident("right binder")?;
        self.expect(&TokenKind::FatArrow, "`=>`")?;
        let right = self.expr()?;
        Ok(Expr::Case {
            scrut: scrut.into(),
            left_binder,
            left: left.into(),
            right_binder,
            right: right.into(),
        })
    }

    /// Right-associative arrows over sums: `sum (→ expr)?`.
    fn arrow(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.sum()?;
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Arrow)) {
            self.bump();
            let rhs = self.expr()?;
            return Ok(Expr::arrow(lhs, rhs));
        }
        Ok(lhs)
    }

    /// Right-associative `+` over applications.
    fn sum(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.app()?;
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Plus)) {
            self.bump();
            let rhs = self.sum()?;
            return Ok(Expr::sum(lhs, rhs));
        }
        Ok(lhs)
    }

    fn app(&mut self) -> Result<Expr, ParseError> {
        // Prefix operators bind like applications with a fixed arity.
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Fst) => {
                self.bump();
                return Ok(Expr::Fst(self.atom()?.into()));
            }
            Some(TokenKind::Snd) => {
                self.bump();
                return Ok(Expr::Snd(self.atom()?.into()));
            }
            Some(TokenKind::Inl) => {
                self.bump();
                return Ok(Expr::Inl(self.atom()?.into()));
            }
            Some(TokenKind::Inr) => {
                self.bump();
                return Ok(Expr::Inr(self.atom()?.into()));
            }
            Some(TokenKind::Refl) => {
                self.bump();
                return Ok(Expr::refl(self.atom()?));
            }
            Some(TokenKind::Path) => {
                self.bump();
                let ty = self.atom()?;
                let lhs = self.atom()?;
                let rhs = self.atom()?;
                return Ok(Expr::path(ty, lhs, rhs));
            }
            Some(TokenKind::Transport) => {
                self.bump();
                let motive = self.atom()?;
                let path = self.atom()?;
                let body = self.atom()?;
                return Ok(Expr::transport(motive, path, body));
            }
            _ => {}
        }
        let mut head = self.atom()?;
        while self.starts_atom() {
            head = Expr::app(head, self.atom()?);
        }
        Ok(head)
    }

    fn starts_atom(&self) -> bool {
        matches!(
            self.peek().map(|t| &t.kind),
            Some(
                TokenKind::Ident(_)
                    | TokenKind::Number(_)
                    | TokenKind::True
                    | TokenKind::False
                    | TokenKind::Type
                    | TokenKind::LParen
            )
        )
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        let tok = self.bump().ok_or(ParseError::UnexpectedEof {
            expected: "an expression".to_owned(),
        })?;
        match tok.kind {
            TokenKind::Ident(name) => Ok(Expr::var(name)),
            TokenKind::Number(n) => Ok(Expr::nat_lit(n)),
            TokenKind::True => Ok(Expr::Lit(Literal::Bool(true))),
            TokenKind::False => Ok(Expr::Lit(Literal::Bool(false))),
            TokenKind::Type => {
                // `Type` optionally followed by a level: `Type 2`.
                if let Some(Token {
                    kind: TokenKind::Number(n),
                    offset,
                }) = self.peek().cloned()
                {
                    self.bump();
                    let level =
                        u32::try_from(n).map_err(|_| ParseError::NumberOutOfRange { offset })?;
                    return Ok(Expr::sort(level));
                }
                Ok(Expr::type_())
            }
            TokenKind::LParen => {
                let first = self.expr()?;
                match self.bump() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(first),
                    Some(Token {
                        kind: TokenKind::Comma,
                        ..
                    }) => {
                        let second = self.expr()?;
                        self.expect(&TokenKind::RParen, "`)`")?;
                        Ok(Expr::pair(first, second))
                    }
                    Some(tok) => Err(ParseError::UnexpectedToken {
                        found: tok.kind.to_string(),
                        expected: "`)` or `,`".to_owned(),
                        offset: tok.offset,
                    }),
                    None => Err(ParseError::UnexpectedEof {
                        expected: "`)` or `,`".to_owned(),
                    }),
                }
            }
            kind => Err(ParseError::UnexpectedToken {
                found: kind.to_string(),
                expected: "an expression".to_owned(),
                offset: tok.offset,
            }),
        }
    }
}
