//! Typed predicate AST as produced by the proof-obligation generator.

use crate::types::Type;
use serde::{Deserialize, Serialize};

/// A literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Real(f64),
    Char(char),
    /// Quote literal `<NAME>`.
    Quote(String),
    /// String literal, a sequence of characters.
    Text(String),
    Nil,
}

/// A pattern on the left of a bind or definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// Identifier pattern `x`.
    Ident(String),
    /// Don't-care pattern `-`.
    Ignore,
    /// Tuple pattern `mk_(p1, p2, ...)`.
    Tuple(Vec<Pattern>),
    /// Record pattern `mk_R(p1, p2, ...)`.
    Record { tag: String, fields: Vec<Pattern> },
}

impl Pattern {
    pub fn ident(name: impl Into<String>) -> Self {
        Pattern::Ident(name.into())
    }

    /// The identifier if this is a bare identifier pattern.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Pattern::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// All identifiers bound by this pattern, left to right.
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Pattern::Ident(name) => out.push(name),
            Pattern::Ignore => {}
            Pattern::Tuple(items) | Pattern::Record { fields: items, .. } => {
                for item in items {
                    item.collect_names(out);
                }
            }
        }
    }
}

/// A pattern quantified over a type: `p : T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeBind {
    pub pattern: Pattern,
    pub ty: Type,
}

impl TypeBind {
    pub fn new(pattern: Pattern, ty: Type) -> Self {
        Self { pattern, ty }
    }
}

/// A single bind `p in set S`, `p in seq S` or `p : T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bind {
    Set { pattern: Pattern, set: Box<Expr> },
    Seq { pattern: Pattern, seq: Box<Expr> },
    Type(TypeBind),
}

impl Bind {
    pub fn pattern(&self) -> &Pattern {
        match self {
            Bind::Set { pattern, .. } | Bind::Seq { pattern, .. } => pattern,
            Bind::Type(tb) => &tb.pattern,
        }
    }
}

/// A multiple bind `p1, p2 in set S`, `p1, p2 in seq S` or `p1, p2 : T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipleBind {
    Set { patterns: Vec<Pattern>, set: Expr },
    Seq { patterns: Vec<Pattern>, seq: Expr },
    Type { patterns: Vec<Pattern>, ty: Type },
}

impl MultipleBind {
    pub fn patterns(&self) -> &[Pattern] {
        match self {
            MultipleBind::Set { patterns, .. }
            | MultipleBind::Seq { patterns, .. }
            | MultipleBind::Type { patterns, .. } => patterns,
        }
    }

    /// `x : T` shorthand.
    pub fn typed(name: impl Into<String>, ty: Type) -> Self {
        MultipleBind::Type {
            patterns: vec![Pattern::ident(name)],
            ty,
        }
    }

    /// `x in set S` shorthand.
    pub fn in_set(name: impl Into<String>, set: Expr) -> Self {
        MultipleBind::Set {
            patterns: vec![Pattern::ident(name)],
            set,
        }
    }

    /// `x in seq S` shorthand.
    pub fn in_seq(name: impl Into<String>, seq: Expr) -> Self {
        MultipleBind::Seq {
            patterns: vec![Pattern::ident(name)],
            seq,
        }
    }
}

/// A local value definition `p : T = e` in a `let` or `def`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub pattern: Pattern,
    #[serde(default)]
    pub ty: Option<Type>,
    pub value: Expr,
}

impl Definition {
    pub fn new(name: impl Into<String>, value: Expr) -> Self {
        Self {
            pattern: Pattern::ident(name),
            ty: None,
            value,
        }
    }
}

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    // Logical
    And,
    Or,
    Implies,
    Iff,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Rem,
    Mod,

    // Set
    InSet,
    NotInSet,
    Union,
    Inter,
    Diff,
    Subset,
    PSubset,

    // Sequence and map
    Concat,
    Munion,
}

impl BinOp {
    /// Get the precedence of this operator (higher = binds tighter).
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Iff => 1,
            BinOp::Implies => 2,
            BinOp::Or => 3,
            BinOp::And => 4,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 5,
            BinOp::InSet | BinOp::NotInSet | BinOp::Subset | BinOp::PSubset => 5,
            BinOp::Union | BinOp::Diff | BinOp::Concat | BinOp::Munion => 6,
            BinOp::Add | BinOp::Sub => 6,
            BinOp::Inter => 7,
            BinOp::Mul | BinOp::Div | BinOp::IntDiv | BinOp::Rem | BinOp::Mod => 7,
        }
    }

    /// Check if this operator is right-associative.
    pub fn is_right_assoc(self) -> bool {
        matches!(self, BinOp::Implies | BinOp::Iff)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Implies => "=>",
            BinOp::Iff => "<=>",
            BinOp::Eq => "=",
            BinOp::Ne => "<>",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::IntDiv => "div",
            BinOp::Rem => "rem",
            BinOp::Mod => "mod",
            BinOp::InSet => "in set",
            BinOp::NotInSet => "not in set",
            BinOp::Union => "union",
            BinOp::Inter => "inter",
            BinOp::Diff => "\\",
            BinOp::Subset => "subset",
            BinOp::PSubset => "psubset",
            BinOp::Concat => "^",
            BinOp::Munion => "munion",
        }
    }
}

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
    Abs,
    Floor,
    Card,
    Len,
    Elems,
    Inds,
    Hd,
    Tl,
    Dom,
    Rng,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Neg => "-",
            UnaryOp::Abs => "abs",
            UnaryOp::Floor => "floor",
            UnaryOp::Card => "card",
            UnaryOp::Len => "len",
            UnaryOp::Elems => "elems",
            UnaryOp::Inds => "inds",
            UnaryOp::Hd => "hd",
            UnaryOp::Tl => "tl",
            UnaryOp::Dom => "dom",
            UnaryOp::Rng => "rng",
        }
    }
}

/// An `elseif` arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElseIf {
    pub cond: Expr,
    pub then_branch: Expr,
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Literal(Literal),
    /// Variable reference.
    Var(String),

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Set enumeration `{a, b, c}`.
    SetEnum(Vec<Expr>),
    /// Sequence enumeration `[a, b, c]`.
    SeqEnum(Vec<Expr>),
    /// Map enumeration `{a |-> b}`.
    MapEnum(Vec<(Expr, Expr)>),
    /// Set range `{lo, ..., hi}`.
    SetRange {
        lo: Box<Expr>,
        hi: Box<Expr>,
    },
    /// Tuple constructor `mk_(a, b)`.
    Tuple(Vec<Expr>),
    /// Record constructor `mk_R(a, b)`.
    Mk {
        tag: String,
        args: Vec<Expr>,
    },
    /// Field access `e.f`.
    Field {
        base: Box<Expr>,
        field: String,
    },
    /// Application `f(args)`: sequence index, map lookup or function call.
    Apply {
        func: Box<Expr>,
        args: Vec<Expr>,
    },

    /// `if c then t elseif c2 then t2 else e`.
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        #[serde(default)]
        elseifs: Vec<ElseIf>,
        else_branch: Box<Expr>,
    },
    /// `let p = e, ... in body`.
    Let {
        defs: Vec<Definition>,
        body: Box<Expr>,
    },
    /// `def p = e; ... in body`.
    Def {
        defs: Vec<Definition>,
        body: Box<Expr>,
    },
    /// `let b be st P in body`.
    LetBeSt {
        bind: Bind,
        #[serde(default)]
        st: Option<Box<Expr>>,
        body: Box<Expr>,
    },

    Forall {
        binds: Vec<MultipleBind>,
        body: Box<Expr>,
    },
    Exists {
        binds: Vec<MultipleBind>,
        body: Box<Expr>,
    },
    Exists1 {
        bind: Bind,
        body: Box<Expr>,
    },
    Iota {
        bind: Bind,
        body: Box<Expr>,
    },
    Lambda {
        params: Vec<TypeBind>,
        body: Box<Expr>,
    },

    /// `{ e | binds & P }`.
    SetComp {
        element: Box<Expr>,
        binds: Vec<MultipleBind>,
        #[serde(default)]
        filter: Option<Box<Expr>>,
    },
    /// `[ e | b & P ]`.
    SeqComp {
        element: Box<Expr>,
        bind: Bind,
        #[serde(default)]
        filter: Option<Box<Expr>>,
    },
    /// `{ k |-> v | binds & P }`.
    MapComp {
        key: Box<Expr>,
        value: Box<Expr>,
        binds: Vec<MultipleBind>,
        #[serde(default)]
        filter: Option<Box<Expr>>,
    },
}

// === Construction helpers ===

impl Expr {
    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Var(name.into())
    }

    pub fn bool(b: bool) -> Expr {
        Expr::Literal(Literal::Bool(b))
    }

    pub fn int(n: i64) -> Expr {
        Expr::Literal(Literal::Int(n))
    }

    pub fn real(r: f64) -> Expr {
        Expr::Literal(Literal::Real(r))
    }

    pub fn nil() -> Expr {
        Expr::Literal(Literal::Nil)
    }

    pub fn quote(q: impl Into<String>) -> Expr {
        Expr::Literal(Literal::Quote(q.into()))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::Not, operand)
    }

    pub fn and(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinOp::And, left, right)
    }

    pub fn or(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinOp::Or, left, right)
    }

    pub fn implies(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinOp::Implies, left, right)
    }

    pub fn eq(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinOp::Eq, left, right)
    }

    pub fn ne(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinOp::Ne, left, right)
    }

    pub fn forall(binds: Vec<MultipleBind>, body: Expr) -> Expr {
        Expr::Forall {
            binds,
            body: Box::new(body),
        }
    }

    pub fn exists(binds: Vec<MultipleBind>, body: Expr) -> Expr {
        Expr::Exists {
            binds,
            body: Box::new(body),
        }
    }

    pub fn let_in(defs: Vec<Definition>, body: Expr) -> Expr {
        Expr::Let {
            defs,
            body: Box::new(body),
        }
    }

    pub fn field(base: Expr, field: impl Into<String>) -> Expr {
        Expr::Field {
            base: Box::new(base),
            field: field.into(),
        }
    }

    pub fn if_then_else(cond: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            elseifs: Vec::new(),
            else_branch: Box::new(else_branch),
        }
    }

    /// The literal if this is a literal expression.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Expr::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// The variable name if this is a bare variable reference.
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Expr::Var(name) => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&crate::pretty::pretty_print_expr(self))
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&crate::pretty::pretty_print_pattern(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binop_precedence() {
        assert!(BinOp::Mul.precedence() > BinOp::Add.precedence());
        assert!(BinOp::Add.precedence() > BinOp::Eq.precedence());
        assert!(BinOp::Eq.precedence() > BinOp::And.precedence());
        assert!(BinOp::And.precedence() > BinOp::Or.precedence());
        assert!(BinOp::Or.precedence() > BinOp::Implies.precedence());
    }

    #[test]
    fn test_pattern_names() {
        let pat = Pattern::Tuple(vec![
            Pattern::ident("a"),
            Pattern::Ignore,
            Pattern::Record {
                tag: "R".into(),
                fields: vec![Pattern::ident("b")],
            },
        ]);
        assert_eq!(pat.names(), vec!["a", "b"]);
        assert_eq!(pat.as_ident(), None);
        assert_eq!(Pattern::ident("x").as_ident(), Some("x"));
    }

    #[test]
    fn test_structural_equality() {
        let a = Expr::eq(Expr::var("x"), Expr::int(1));
        let b = Expr::eq(Expr::var("x"), Expr::int(1));
        let c = Expr::eq(Expr::var("x"), Expr::int(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
