//! Type classification and signatures.
//!
//! Every [`Type`] is assigned a [`TypeSignature`] at construction: a
//! category tag, a content hash stable under alpha-renaming, and a
//! human-readable description. Equal hashes put two types on the O(1)
//! compatibility fast path; hash inequality says nothing, and the checker
//! falls back to the category table and structural comparison.

use crate::expr::Expr;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Coarse classification of a type, used by the compatibility table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeCategory {
    /// Base types and neutral type expressions (`Nat`, `P`, `C n`, ...)
    Base,
    /// Dependent function types (Π)
    Function,
    /// Dependent pair types (Σ)
    Product,
    /// Binary sums
    Sum,
    /// Universes (`Type i`)
    Universe,
    /// Path (identity) types
    Path,
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeCategory::Base => "base",
            TypeCategory::Function => "function",
            TypeCategory::Product => "product",
            TypeCategory::Sum => "sum",
            TypeCategory::Universe => "universe",
            TypeCategory::Path => "path",
        };
        write!(f, "{s}")
    }
}

/// Signature computed once per type.
///
/// The hash is the leading 64 bits of the Sha256 of the alpha-canonical
/// rendering, so alpha-equivalent types always share it. Two types with
/// equal hashes are treated as interchangeable on the fast path; the
/// converse does not hold, and a hash collision between distinct types is
/// tolerated only because user-visible decisions (discharging a goal)
/// re-verify structurally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSignature {
    pub category: TypeCategory,
    pub hash: u64,
    pub description: String,
}

impl TypeSignature {
    /// Fast, symmetric signature-level compatibility: equal hashes are
    /// compatible, and differing categories are incompatible. Same-category
    /// signatures with differing hashes are *potentially* compatible and
    /// need the checker's structural fallback — this function answers
    /// conservatively `true` for them, which keeps the relation symmetric.
    pub fn compatible(&self, other: &TypeSignature) -> bool {
        if self.hash == other.hash {
            return true;
        }
        self.category == other.category
    }
}

/// A classified type: the classifying expression plus its signature.
#[derive(Clone, Debug)]
pub struct Type {
    expr: Arc<Expr>,
    signature: TypeSignature,
}

impl Type {
    /// Classify an expression as a type, computing its signature.
    pub fn new(expr: Expr) -> Self {
        let category = classify(&expr);
        let canonical = expr.alpha_canonical();
        let hash = content_hash(&canonical);
        let description = expr.to_string();
        Type {
            expr: Arc::new(expr),
            signature: TypeSignature {
                category,
                hash,
                description,
            },
        }
    }

    /// The classifying expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The signature computed at construction.
    pub fn signature(&self) -> &TypeSignature {
        &self.signature
    }

    /// The category tag.
    pub fn category(&self) -> TypeCategory {
        self.signature.category
    }

    /// The alpha-stable content hash.
    pub fn hash(&self) -> u64 {
        self.signature.hash
    }

    /// The human-readable description.
    pub fn description(&self) -> &str {
        &self.signature.description
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        // Fast path on the cached hash, structural comparison on collision.
        if self.signature.hash != other.signature.hash {
            return false;
        }
        self.expr.alpha_eq(&other.expr)
    }
}

impl Eq for Type {}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature.description)
    }
}

/// Category of a type expression.
pub fn classify(expr: &Expr) -> TypeCategory {
    match expr {
        Expr::Pi { .. } => TypeCategory::Function,
        Expr::Sigma { .. } => TypeCategory::Product,
        Expr::Sum(_, _) => TypeCategory::Sum,
        Expr::Sort(_) => TypeCategory::Universe,
        Expr::Path { .. } => TypeCategory::Path,
        _ => TypeCategory::Base,
    }
}

/// Leading 64 bits of the Sha256 of the canonical form.
fn content_hash(canonical: &str) -> u64 {
    let digest = Sha256::digest(canonical.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().expect("Sha256 yields 32 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_categories() {
        assert_eq!(classify(&Expr::const_("Nat")), TypeCategory::Base);
        assert_eq!(
            classify(&Expr::arrow(Expr::const_("Nat"), Expr::const_("Nat"))),
            TypeCategory::Function
        );
        assert_eq!(
            classify(&Expr::sigma("x", Expr::const_("Nat"), Expr::const_("Bool"))),
            TypeCategory::Product
        );
        assert_eq!(
            classify(&Expr::sum(Expr::const_("Nat"), Expr::const_("Bool"))),
            TypeCategory::Sum
        );
        assert_eq!(classify(&Expr::type_()), TypeCategory::Universe);
        assert_eq!(
            classify(&Expr::path(
                Expr::const_("Nat"),
                Expr::var("a"),
                Expr::var("b")
            )),
            TypeCategory::Path
        );
    }

    #[test]
    fn test_hash_stable_under_alpha_renaming() {
        let a = Type::new(Expr::pi("x", Expr::const_("Nat"), Expr::var("x").clone_as_path()));
        let b = Type::new(Expr::pi("y", Expr::const_("Nat"), Expr::var("y").clone_as_path()));
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a, b);
    }

    impl Expr {
        /// Test helper: `Path Nat e e`.
        fn clone_as_path(&self) -> Expr {
            Expr::path(Expr::const_("Nat"), self.clone(), self.clone())
        }
    }

    #[test]
    fn test_hash_distinguishes_free_variables() {
        let a = Type::new(Expr::var("P"));
        let b = Type::new(Expr::var("Q"));
        assert_ne!(a.hash(), b.hash());
        assert_ne!(a, b);
    }

    #[test]
    fn test_signature_compatible_symmetric() {
        let cases = [
            Type::new(Expr::var("P")),
            Type::new(Expr::var("Q")),
            Type::new(Expr::arrow(Expr::var("P"), Expr::var("Q"))),
            Type::new(Expr::type_()),
            Type::new(Expr::sort(1)),
            Type::new(Expr::sum(Expr::var("P"), Expr::var("Q"))),
        ];
        for a in &cases {
            for b in &cases {
                assert_eq!(
                    a.signature().compatible(b.signature()),
                    b.signature().compatible(a.signature()),
                    "compatible must be symmetric for {a} / {b}"
                );
            }
        }
    }
}
