//! Syntactic discharge of obligations that are true by their own structure.
//!
//! The prover walks the predicate carrying a stack of facts known to hold on
//! the current path (membership from `forall` binds, equalities from `let`
//! and `def`, branch conditions from `if`, antecedents from `=>`). A leaf is
//! discharged when it is structurally equal to a known fact, or when a purely
//! syntactic shortcut decides it. A binder that rebinds a name hides every
//! fact mentioning that name until its scope ends.

use crate::collect::{walk, Node};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;
use vdmcheck_syntax::{
    pretty_print_expr, BinOp, Definition, ElseIf, Expr, Literal, MultipleBind, Pattern, UnaryOp,
};

/// The facts that discharged an obligation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrivialProof {
    pub facts: Vec<String>,
}

/// Carries the known-truth stack during one proof attempt.
#[derive(Debug, Default)]
pub struct TrivialProver {
    known: Vec<Expr>,
    used: Vec<Expr>,
}

impl TrivialProver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `expr` is discharged by its own structure.
    pub fn is_trivial(expr: &Expr) -> bool {
        Self::new().prove(expr).is_some()
    }

    /// Attempt a proof; on success report the facts used.
    pub fn prove(&mut self, expr: &Expr) -> Option<TrivialProof> {
        self.known.clear();
        self.used.clear();
        if !self.trivial(expr) {
            return None;
        }
        let mut facts: Vec<String> = Vec::new();
        for fact in &self.used {
            let text = pretty_print_expr(fact);
            if !facts.contains(&text) {
                facts.push(text);
            }
        }
        debug!(facts = ?facts, "discharged by structure");
        Some(TrivialProof { facts })
    }

    fn trivial(&mut self, expr: &Expr) -> bool {
        let mark = self.known.len();
        let result = match expr {
            Expr::Forall { binds, body } => {
                let names: Vec<&str> = binds
                    .iter()
                    .flat_map(|b| b.patterns())
                    .flat_map(Pattern::names)
                    .collect();
                let saved = self.rebind(&names);
                for bind in binds {
                    self.push_membership(bind, &names);
                }
                let ok = self.trivial(body);
                self.known = saved;
                ok
            }
            Expr::Let { defs, body } | Expr::Def { defs, body } => {
                let names: Vec<&str> = defs.iter().flat_map(|d| d.pattern.names()).collect();
                let saved = self.rebind(&names);
                self.push_definitions(defs);
                let ok = self.trivial(body);
                self.known = saved;
                ok
            }
            Expr::If {
                cond,
                then_branch,
                elseifs,
                else_branch,
            } => self.trivial_if(cond, then_branch, elseifs, else_branch),
            Expr::Binary {
                op: BinOp::Implies,
                left,
                right,
            } => {
                self.assume((**left).clone());
                self.trivial(right)
            }
            Expr::Binary {
                op: BinOp::And,
                left,
                right,
            } => self.trivial(left) && self.trivial(right),
            Expr::Binary {
                op: BinOp::Or,
                left,
                right,
            } => self.trivial(left) || self.trivial(right),
            _ => self.leaf(expr),
        };
        self.known.truncate(mark);
        result
    }

    fn trivial_if(
        &mut self,
        cond: &Expr,
        then_branch: &Expr,
        elseifs: &[ElseIf],
        else_branch: &Expr,
    ) -> bool {
        let mark = self.known.len();
        self.assume(cond.clone());
        let mut ok = self.trivial(then_branch);
        self.known.truncate(mark);
        self.assume(Expr::not(cond.clone()));
        for arm in elseifs {
            if !ok {
                break;
            }
            let arm_mark = self.known.len();
            self.assume(arm.cond.clone());
            ok = self.trivial(&arm.then_branch);
            self.known.truncate(arm_mark);
            self.assume(Expr::not(arm.cond.clone()));
        }
        ok = ok && self.trivial(else_branch);
        self.known.truncate(mark);
        ok
    }

    /// Hide the facts that mention any of `names`. Returns the stack to
    /// restore when the binder's scope ends.
    fn rebind(&mut self, names: &[&str]) -> Vec<Expr> {
        let saved = self.known.clone();
        if !names.is_empty() {
            self.known.retain(|fact| !mentions(fact, names));
        }
        saved
    }

    /// `bound` are all names the enclosing `forall` binds; a collection
    /// that mentions one of them refers to an outer binding.
    fn push_membership(&mut self, bind: &MultipleBind, bound: &[&str]) {
        let (source, seq) = match bind {
            MultipleBind::Set { set, .. } => (set, false),
            MultipleBind::Seq { seq, .. } => (seq, true),
            MultipleBind::Type { .. } => return,
        };
        if mentions(source, bound) {
            return;
        }
        for pattern in bind.patterns() {
            if let Pattern::Ident(id) = pattern {
                let collection = if seq {
                    Expr::unary(UnaryOp::Elems, source.clone())
                } else {
                    source.clone()
                };
                self.known
                    .push(Expr::binary(BinOp::InSet, Expr::var(id.clone()), collection));
            }
        }
    }

    /// Definitions bind in order, so a value may refer to earlier ones but
    /// not to its own name or later ones.
    fn push_definitions(&mut self, defs: &[Definition]) {
        for (i, def) in defs.iter().enumerate() {
            let Pattern::Ident(id) = &def.pattern else {
                continue;
            };
            let later: Vec<&str> = defs[i..].iter().flat_map(|d| d.pattern.names()).collect();
            if !mentions(&def.value, &later) {
                self.assume(Expr::eq(Expr::var(id.clone()), def.value.clone()));
            }
        }
    }

    /// Push a fact and the equality corollary it implies.
    fn assume(&mut self, fact: Expr) {
        if let Some(corollary) = corollary(&fact) {
            self.known.push(corollary);
        }
        self.known.push(fact);
    }

    fn leaf(&mut self, expr: &Expr) -> bool {
        if let Some(decided) = shortcut(expr) {
            if decided {
                self.used.push(expr.clone());
            }
            return decided;
        }
        match self.known.iter().rev().find(|fact| *fact == expr) {
            Some(fact) => {
                self.used.push(fact.clone());
                true
            }
            None => false,
        }
    }
}

/// `a = b` gives `not (a <> b)`, `a <> b` gives `not (a = b)`, and the
/// negated forms give the plain comparison.
fn corollary(fact: &Expr) -> Option<Expr> {
    match fact {
        Expr::Binary {
            op: op @ (BinOp::Eq | BinOp::Ne),
            left,
            right,
        } => {
            let other = if *op == BinOp::Eq { BinOp::Ne } else { BinOp::Eq };
            Some(Expr::not(Expr::binary(
                other,
                (**left).clone(),
                (**right).clone(),
            )))
        }
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } => match &**operand {
            Expr::Binary {
                op: op @ (BinOp::Eq | BinOp::Ne),
                left,
                right,
            } => {
                let other = if *op == BinOp::Eq { BinOp::Ne } else { BinOp::Eq };
                Some(Expr::binary(other, (**left).clone(), (**right).clone()))
            }
            _ => None,
        },
        _ => None,
    }
}

/// Decide a leaf without any known facts, when its shape allows.
fn shortcut(expr: &Expr) -> Option<bool> {
    match expr {
        Expr::Literal(Literal::Bool(true)) => Some(true),
        Expr::Binary { op, left, right } => {
            if let (Some(a), Some(b)) = (number(left), number(right)) {
                return compare_numbers(*op, a, b);
            }
            let (a, b) = (enumeration_len(left)?, enumeration_len(right)?);
            match op {
                BinOp::Eq if a == 0 && b == 0 => Some(true),
                BinOp::Ne if (a == 0) != (b == 0) => Some(true),
                _ => None,
            }
        }
        _ => None,
    }
}

fn number(expr: &Expr) -> Option<&Literal> {
    match expr.as_literal()? {
        lit @ (Literal::Int(_) | Literal::Real(_)) => Some(lit),
        _ => None,
    }
}

/// Integers beyond this magnitude do not convert to `f64` exactly.
const EXACT_F64_INT: i64 = 1 << 53;

fn as_real(lit: &Literal) -> Option<f64> {
    match lit {
        Literal::Int(n) if n.unsigned_abs() <= EXACT_F64_INT as u64 => Some(*n as f64),
        Literal::Real(r) => Some(*r),
        _ => None,
    }
}

/// Integer pairs compare exactly; a real on either side compares as `f64`,
/// and is left undecided when the integer side would round.
fn compare_numbers(op: BinOp, a: &Literal, b: &Literal) -> Option<bool> {
    let ordering = match (a, b) {
        (Literal::Int(x), Literal::Int(y)) => x.cmp(y),
        _ => as_real(a)?.partial_cmp(&as_real(b)?)?,
    };
    match op {
        BinOp::Eq => Some(ordering == Ordering::Equal),
        BinOp::Ne => Some(ordering != Ordering::Equal),
        BinOp::Lt => Some(ordering == Ordering::Less),
        BinOp::Le => Some(ordering != Ordering::Greater),
        BinOp::Gt => Some(ordering == Ordering::Greater),
        BinOp::Ge => Some(ordering != Ordering::Less),
        _ => None,
    }
}

/// Whether any of `names` occurs in `expr`. Inner binders are ignored, so
/// this over-approximates the free variables.
fn mentions(expr: &Expr, names: &[&str]) -> bool {
    let mut found = false;
    walk(expr, &mut |node| {
        if let Node::Expr(Expr::Var(v)) = node {
            found |= names.contains(&v.as_str());
        }
    });
    found
}

/// Element count of a literal set, sequence or map enumeration.
fn enumeration_len(expr: &Expr) -> Option<usize> {
    match expr {
        Expr::SetEnum(items) | Expr::SeqEnum(items) => Some(items.len()),
        Expr::MapEnum(entries) => Some(entries.len()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdmcheck_syntax::Type;

    fn e() -> Expr {
        Expr::binary(BinOp::Add, Expr::var("a"), Expr::int(1))
    }

    #[test]
    fn test_let_equality() {
        let proved = Expr::let_in(
            vec![Definition::new("x", e())],
            Expr::eq(Expr::var("x"), e()),
        );
        assert!(TrivialProver::is_trivial(&proved));

        let other = Expr::let_in(
            vec![Definition::new("x", e())],
            Expr::eq(Expr::var("x"), Expr::int(2)),
        );
        assert!(!TrivialProver::is_trivial(&other));
    }

    #[test]
    fn test_forall_membership() {
        let s = Expr::var("S");
        let body = Expr::binary(BinOp::InSet, Expr::var("x"), s.clone());
        let proved = Expr::forall(vec![MultipleBind::in_set("x", s.clone())], body.clone());
        let proof = TrivialProver::new().prove(&proved).unwrap();
        assert_eq!(proof.facts, vec!["x in set S".to_string()]);

        let seq = Expr::forall(
            vec![MultipleBind::in_seq("x", s.clone())],
            Expr::binary(
                BinOp::InSet,
                Expr::var("x"),
                Expr::unary(UnaryOp::Elems, s.clone()),
            ),
        );
        assert!(TrivialProver::is_trivial(&seq));

        let typed = Expr::forall(vec![MultipleBind::typed("x", Type::nat())], body);
        assert!(!TrivialProver::is_trivial(&typed));
    }

    #[test]
    fn test_implies_and_corollary() {
        let p = Expr::eq(Expr::var("a"), Expr::var("b"));
        assert!(TrivialProver::is_trivial(&Expr::implies(p.clone(), p.clone())));

        let neg = Expr::not(Expr::ne(Expr::var("a"), Expr::var("b")));
        assert!(TrivialProver::is_trivial(&Expr::implies(p.clone(), neg)));

        let from_not = Expr::implies(
            Expr::not(Expr::eq(Expr::var("a"), Expr::var("b"))),
            Expr::ne(Expr::var("a"), Expr::var("b")),
        );
        assert!(TrivialProver::is_trivial(&from_not));

        let unrelated = Expr::implies(p, Expr::var("c"));
        assert!(!TrivialProver::is_trivial(&unrelated));
    }

    #[test]
    fn test_if_branches() {
        let c = Expr::var("c");
        let d = Expr::var("d");
        let proved = Expr::If {
            cond: Box::new(c.clone()),
            then_branch: Box::new(c.clone()),
            elseifs: vec![ElseIf {
                cond: d.clone(),
                then_branch: Expr::and(d.clone(), Expr::not(c.clone())),
            }],
            else_branch: Box::new(Expr::not(d.clone())),
        };
        assert!(TrivialProver::is_trivial(&proved));

        let unproved = Expr::if_then_else(c.clone(), c.clone(), c);
        assert!(!TrivialProver::is_trivial(&unproved));
    }

    #[test]
    fn test_shortcuts() {
        assert!(TrivialProver::is_trivial(&Expr::bool(true)));
        assert!(!TrivialProver::is_trivial(&Expr::bool(false)));
        assert!(TrivialProver::is_trivial(&Expr::binary(
            BinOp::Lt,
            Expr::int(1),
            Expr::real(1.5)
        )));
        assert!(!TrivialProver::is_trivial(&Expr::binary(
            BinOp::Gt,
            Expr::int(1),
            Expr::int(2)
        )));
        assert!(TrivialProver::is_trivial(&Expr::ne(
            Expr::SetEnum(vec![Expr::int(1)]),
            Expr::SetEnum(vec![])
        )));
        assert!(TrivialProver::is_trivial(&Expr::eq(
            Expr::SeqEnum(vec![]),
            Expr::SeqEnum(vec![])
        )));
    }

    #[test]
    fn test_rebinding_hides_outer_facts() {
        let x_is_1 = Expr::eq(Expr::var("x"), Expr::int(1));

        // let x = 1 in forall x:nat & x = 1
        let shadowed = Expr::let_in(
            vec![Definition::new("x", Expr::int(1))],
            Expr::forall(vec![MultipleBind::typed("x", Type::nat())], x_is_1.clone()),
        );
        assert!(!TrivialProver::is_trivial(&shadowed));

        // let x = 1 in let x = x + 1 in x = x + 1
        let incr = Expr::binary(BinOp::Add, Expr::var("x"), Expr::int(1));
        let self_ref = Expr::let_in(
            vec![Definition::new("x", Expr::int(1))],
            Expr::let_in(
                vec![Definition::new("x", incr.clone())],
                Expr::eq(Expr::var("x"), incr),
            ),
        );
        assert!(!TrivialProver::is_trivial(&self_ref));

        // (x = 1) => forall x in set {2} & x = 1
        let implied = Expr::implies(
            x_is_1.clone(),
            Expr::forall(
                vec![MultipleBind::in_set("x", Expr::SetEnum(vec![Expr::int(2)]))],
                x_is_1.clone(),
            ),
        );
        assert!(!TrivialProver::is_trivial(&implied));

        // Facts about other names survive, and the outer fact returns after
        // the inner scope closes.
        let y_is_1 = Expr::eq(Expr::var("y"), Expr::int(1));
        let unrelated = Expr::let_in(
            vec![Definition::new("y", Expr::int(1))],
            Expr::and(
                Expr::forall(vec![MultipleBind::typed("x", Type::nat())], y_is_1.clone()),
                y_is_1,
            ),
        );
        assert!(TrivialProver::is_trivial(&unrelated));

        let sequential = Expr::let_in(
            vec![
                Definition::new("a", Expr::int(1)),
                Definition::new("b", Expr::var("a")),
            ],
            Expr::eq(Expr::var("b"), Expr::var("a")),
        );
        assert!(TrivialProver::is_trivial(&sequential));
    }

    #[test]
    fn test_large_integer_literals_compare_exactly() {
        let big = Expr::int(9_007_199_254_740_993);
        let near = Expr::int(9_007_199_254_740_992);
        assert!(!TrivialProver::is_trivial(&Expr::eq(big.clone(), near.clone())));
        assert!(TrivialProver::is_trivial(&Expr::ne(big.clone(), near.clone())));
        assert!(TrivialProver::is_trivial(&Expr::binary(
            BinOp::Gt,
            big.clone(),
            near
        )));
        // Mixed with a real, an integer that would round is left undecided.
        assert!(!TrivialProver::is_trivial(&Expr::eq(
            big,
            Expr::real(9_007_199_254_740_992.0)
        )));
        assert!(TrivialProver::is_trivial(&Expr::binary(
            BinOp::Ge,
            Expr::int(i64::MAX),
            Expr::int(i64::MIN)
        )));
    }

    #[test]
    fn test_and_or() {
        let t = Expr::bool(true);
        let x = Expr::var("x");
        assert!(TrivialProver::is_trivial(&Expr::and(t.clone(), t.clone())));
        assert!(!TrivialProver::is_trivial(&Expr::and(t.clone(), x.clone())));
        assert!(TrivialProver::is_trivial(&Expr::or(x, t)));
    }
}
