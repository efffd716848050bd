//! Pretty printer rendering predicates in VDM-SL concrete syntax.

use crate::ast::*;

/// Pretty print an expression to a string.
pub fn pretty_print_expr(expr: &Expr) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_expr(expr, 0);
    printer.output
}

/// Pretty print a pattern to a string.
pub fn pretty_print_pattern(pattern: &Pattern) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_pattern(pattern);
    printer.output
}

/// Pretty print a single bind to a string.
pub fn pretty_print_bind(bind: &Bind) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_bind(bind);
    printer.output
}

/// Pretty print a multiple bind to a string.
pub fn pretty_print_multiple_bind(bind: &MultipleBind) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_multiple_bind(bind);
    printer.output
}

/// Render a literal.
pub fn pretty_print_literal(lit: &Literal) -> String {
    match lit {
        Literal::Bool(b) => b.to_string(),
        Literal::Int(n) => n.to_string(),
        Literal::Real(r) => format_real(*r),
        Literal::Char(c) => format!("'{}'", c),
        Literal::Quote(q) => format!("<{}>", q),
        Literal::Text(s) => format!("{:?}", s),
        Literal::Nil => "nil".to_string(),
    }
}

/// Reals always carry a fractional part so they read back as reals.
pub fn format_real(r: f64) -> String {
    if r.is_finite() && r.fract() == 0.0 && r.abs() < 1e15 {
        format!("{:.1}", r)
    } else {
        r.to_string()
    }
}

struct PrettyPrinter {
    output: String,
}

impl PrettyPrinter {
    fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn print_list(&mut self, exprs: &[Expr]) {
        for (i, e) in exprs.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.print_expr(e, 0);
        }
    }

    fn print_patterns(&mut self, patterns: &[Pattern]) {
        for (i, p) in patterns.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.print_pattern(p);
        }
    }

    fn print_pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Ident(name) => self.write(name),
            Pattern::Ignore => self.write("-"),
            Pattern::Tuple(items) => {
                self.write("mk_(");
                self.print_patterns(items);
                self.write(")");
            }
            Pattern::Record { tag, fields } => {
                self.write("mk_");
                self.write(tag);
                self.write("(");
                self.print_patterns(fields);
                self.write(")");
            }
        }
    }

    fn print_bind(&mut self, bind: &Bind) {
        match bind {
            Bind::Set { pattern, set } => {
                self.print_pattern(pattern);
                self.write(" in set ");
                self.print_expr(set, 0);
            }
            Bind::Seq { pattern, seq } => {
                self.print_pattern(pattern);
                self.write(" in seq ");
                self.print_expr(seq, 0);
            }
            Bind::Type(tb) => self.print_type_bind(tb),
        }
    }

    fn print_type_bind(&mut self, tb: &TypeBind) {
        self.print_pattern(&tb.pattern);
        self.write(":");
        self.write(&tb.ty.to_string());
    }

    fn print_multiple_bind(&mut self, bind: &MultipleBind) {
        match bind {
            MultipleBind::Set { patterns, set } => {
                self.print_patterns(patterns);
                self.write(" in set ");
                self.print_expr(set, 0);
            }
            MultipleBind::Seq { patterns, seq } => {
                self.print_patterns(patterns);
                self.write(" in seq ");
                self.print_expr(seq, 0);
            }
            MultipleBind::Type { patterns, ty } => {
                self.print_patterns(patterns);
                self.write(":");
                self.write(&ty.to_string());
            }
        }
    }

    fn print_multiple_binds(&mut self, binds: &[MultipleBind]) {
        for (i, b) in binds.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.print_multiple_bind(b);
        }
    }

    fn print_definitions(&mut self, defs: &[Definition], sep: &str) {
        for (i, d) in defs.iter().enumerate() {
            if i > 0 {
                self.write(sep);
            }
            self.print_pattern(&d.pattern);
            if let Some(ty) = &d.ty {
                self.write(":");
                self.write(&ty.to_string());
            }
            self.write(" = ");
            self.print_expr(&d.value, 0);
        }
    }

    fn print_filter(&mut self, filter: &Option<Box<Expr>>) {
        if let Some(f) = filter {
            self.write(" & ");
            self.print_expr(f, 0);
        }
    }

    /// Print an expression. `min_prec` is the precedence of the enclosing
    /// operator; binary expressions that bind looser get parenthesised.
    fn print_expr(&mut self, expr: &Expr, min_prec: u8) {
        match expr {
            Expr::Literal(lit) => self.write(&pretty_print_literal(lit)),
            Expr::Var(name) => self.write(name),

            Expr::Unary { op, operand } => {
                self.write(op.symbol());
                if *op != UnaryOp::Neg {
                    self.write(" ");
                }
                let needs_parens = matches!(**operand, Expr::Binary { .. });
                if needs_parens {
                    self.write("(");
                    self.print_expr(operand, 0);
                    self.write(")");
                } else {
                    self.print_expr(operand, u8::MAX);
                }
            }

            Expr::Binary { op, left, right } => {
                let prec = op.precedence();
                let parens = prec < min_prec;
                if parens {
                    self.write("(");
                }
                let (lp, rp) = if op.is_right_assoc() {
                    (prec + 1, prec)
                } else {
                    (prec, prec + 1)
                };
                self.print_expr(left, lp);
                self.write(" ");
                self.write(op.symbol());
                self.write(" ");
                self.print_expr(right, rp);
                if parens {
                    self.write(")");
                }
            }

            Expr::SetEnum(items) => {
                self.write("{");
                self.print_list(items);
                self.write("}");
            }
            Expr::SeqEnum(items) => {
                self.write("[");
                self.print_list(items);
                self.write("]");
            }
            Expr::MapEnum(entries) => {
                if entries.is_empty() {
                    self.write("{|->}");
                    return;
                }
                self.write("{");
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.print_expr(k, 0);
                    self.write(" |-> ");
                    self.print_expr(v, 0);
                }
                self.write("}");
            }
            Expr::SetRange { lo, hi } => {
                self.write("{");
                self.print_expr(lo, 0);
                self.write(", ..., ");
                self.print_expr(hi, 0);
                self.write("}");
            }
            Expr::Tuple(items) => {
                self.write("mk_(");
                self.print_list(items);
                self.write(")");
            }
            Expr::Mk { tag, args } => {
                self.write("mk_");
                self.write(tag);
                self.write("(");
                self.print_list(args);
                self.write(")");
            }
            Expr::Field { base, field } => {
                self.print_expr(base, u8::MAX);
                self.write(".");
                self.write(field);
            }
            Expr::Apply { func, args } => {
                self.print_expr(func, u8::MAX);
                self.write("(");
                self.print_list(args);
                self.write(")");
            }

            Expr::If {
                cond,
                then_branch,
                elseifs,
                else_branch,
            } => {
                self.write("(if ");
                self.print_expr(cond, 0);
                self.write(" then ");
                self.print_expr(then_branch, 0);
                for arm in elseifs {
                    self.write(" elseif ");
                    self.print_expr(&arm.cond, 0);
                    self.write(" then ");
                    self.print_expr(&arm.then_branch, 0);
                }
                self.write(" else ");
                self.print_expr(else_branch, 0);
                self.write(")");
            }
            Expr::Let { defs, body } => {
                self.write("(let ");
                self.print_definitions(defs, ", ");
                self.write(" in ");
                self.print_expr(body, 0);
                self.write(")");
            }
            Expr::Def { defs, body } => {
                self.write("(def ");
                self.print_definitions(defs, "; ");
                self.write(" in ");
                self.print_expr(body, 0);
                self.write(")");
            }
            Expr::LetBeSt { bind, st, body } => {
                self.write("(let ");
                self.print_bind(bind);
                if let Some(st) = st {
                    self.write(" be st ");
                    self.print_expr(st, 0);
                }
                self.write(" in ");
                self.print_expr(body, 0);
                self.write(")");
            }

            Expr::Forall { binds, body } => {
                self.write("(forall ");
                self.print_multiple_binds(binds);
                self.write(" & ");
                self.print_expr(body, 0);
                self.write(")");
            }
            Expr::Exists { binds, body } => {
                self.write("(exists ");
                self.print_multiple_binds(binds);
                self.write(" & ");
                self.print_expr(body, 0);
                self.write(")");
            }
            Expr::Exists1 { bind, body } => {
                self.write("(exists1 ");
                self.print_bind(bind);
                self.write(" & ");
                self.print_expr(body, 0);
                self.write(")");
            }
            Expr::Iota { bind, body } => {
                self.write("(iota ");
                self.print_bind(bind);
                self.write(" & ");
                self.print_expr(body, 0);
                self.write(")");
            }
            Expr::Lambda { params, body } => {
                self.write("(lambda ");
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.print_type_bind(p);
                }
                self.write(" & ");
                self.print_expr(body, 0);
                self.write(")");
            }

            Expr::SetComp {
                element,
                binds,
                filter,
            } => {
                self.write("{");
                self.print_expr(element, 0);
                self.write(" | ");
                self.print_multiple_binds(binds);
                self.print_filter(filter);
                self.write("}");
            }
            Expr::SeqComp {
                element,
                bind,
                filter,
            } => {
                self.write("[");
                self.print_expr(element, 0);
                self.write(" | ");
                self.print_bind(bind);
                self.print_filter(filter);
                self.write("]");
            }
            Expr::MapComp {
                key,
                value,
                binds,
                filter,
            } => {
                self.write("{");
                self.print_expr(key, 0);
                self.write(" |-> ");
                self.print_expr(value, 0);
                self.write(" | ");
                self.print_multiple_binds(binds);
                self.print_filter(filter);
                self.write("}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn test_forall() {
        let e = Expr::forall(
            vec![MultipleBind::typed("x", Type::nat1())],
            Expr::binary(BinOp::Gt, Expr::var("x"), Expr::int(0)),
        );
        assert_eq!(pretty_print_expr(&e), "(forall x:nat1 & x > 0)");
    }

    #[test]
    fn test_precedence_parens() {
        // (a or b) and c
        let e = Expr::and(Expr::or(Expr::var("a"), Expr::var("b")), Expr::var("c"));
        assert_eq!(pretty_print_expr(&e), "(a or b) and c");

        // a => b => c is right associative
        let e = Expr::implies(
            Expr::var("a"),
            Expr::implies(Expr::var("b"), Expr::var("c")),
        );
        assert_eq!(pretty_print_expr(&e), "a => b => c");
    }

    #[test]
    fn test_literals_and_collections() {
        assert_eq!(pretty_print_expr(&Expr::real(2.0)), "2.0");
        assert_eq!(pretty_print_expr(&Expr::MapEnum(vec![])), "{|->}");
        let e = Expr::SetRange {
            lo: Box::new(Expr::int(1)),
            hi: Box::new(Expr::int(3)),
        };
        assert_eq!(pretty_print_expr(&e), "{1, ..., 3}");
        assert_eq!(
            pretty_print_expr(&Expr::not(Expr::eq(Expr::var("x"), Expr::nil()))),
            "not (x = nil)"
        );
    }

    #[test]
    fn test_let_and_if() {
        let e = Expr::let_in(
            vec![Definition::new("y", Expr::int(1))],
            Expr::if_then_else(Expr::var("b"), Expr::var("y"), Expr::int(0)),
        );
        assert_eq!(
            pretty_print_expr(&e),
            "(let y = 1 in (if b then y else 0))"
        );
    }
}
