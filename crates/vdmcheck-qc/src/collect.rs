//! Bind and forall collection over predicate trees.

use vdmcheck_syntax::{Bind, BinOp, Definition, Expr, MultipleBind, TypeBind};

/// Any node of a predicate tree.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Expr(&'a Expr),
    Bind(&'a Bind),
    MultipleBind(&'a MultipleBind),
    Definition(&'a Definition),
    TypeBind(&'a TypeBind),
}

/// Visit `expr` and every node below it, parents before children.
pub fn walk<'a>(expr: &'a Expr, visit: &mut impl FnMut(Node<'a>)) {
    visit(Node::Expr(expr));
    match expr {
        Expr::Literal(_) | Expr::Var(_) => {}
        Expr::Unary { operand, .. } => walk(operand, visit),
        Expr::Binary { left, right, .. } => {
            walk(left, visit);
            walk(right, visit);
        }
        Expr::SetEnum(items) | Expr::SeqEnum(items) | Expr::Tuple(items) => {
            for item in items {
                walk(item, visit);
            }
        }
        Expr::MapEnum(entries) => {
            for (k, v) in entries {
                walk(k, visit);
                walk(v, visit);
            }
        }
        Expr::SetRange { lo, hi } => {
            walk(lo, visit);
            walk(hi, visit);
        }
        Expr::Mk { args, .. } => {
            for arg in args {
                walk(arg, visit);
            }
        }
        Expr::Field { base, .. } => walk(base, visit),
        Expr::Apply { func, args } => {
            walk(func, visit);
            for arg in args {
                walk(arg, visit);
            }
        }
        Expr::If {
            cond,
            then_branch,
            elseifs,
            else_branch,
        } => {
            walk(cond, visit);
            walk(then_branch, visit);
            for arm in elseifs {
                walk(&arm.cond, visit);
                walk(&arm.then_branch, visit);
            }
            walk(else_branch, visit);
        }
        Expr::Let { defs, body } | Expr::Def { defs, body } => {
            for def in defs {
                visit(Node::Definition(def));
                walk(&def.value, visit);
            }
            walk(body, visit);
        }
        Expr::LetBeSt { bind, st, body } => {
            walk_bind(bind, visit);
            if let Some(st) = st {
                walk(st, visit);
            }
            walk(body, visit);
        }
        Expr::Forall { binds, body } | Expr::Exists { binds, body } => {
            walk_multiple_binds(binds, visit);
            walk(body, visit);
        }
        Expr::Exists1 { bind, body } | Expr::Iota { bind, body } => {
            walk_bind(bind, visit);
            walk(body, visit);
        }
        Expr::Lambda { params, body } => {
            for param in params {
                visit(Node::TypeBind(param));
            }
            walk(body, visit);
        }
        Expr::SetComp {
            element,
            binds,
            filter,
        } => {
            walk_multiple_binds(binds, visit);
            walk(element, visit);
            if let Some(filter) = filter {
                walk(filter, visit);
            }
        }
        Expr::SeqComp {
            element,
            bind,
            filter,
        } => {
            walk_bind(bind, visit);
            walk(element, visit);
            if let Some(filter) = filter {
                walk(filter, visit);
            }
        }
        Expr::MapComp {
            key,
            value,
            binds,
            filter,
        } => {
            walk_multiple_binds(binds, visit);
            walk(key, visit);
            walk(value, visit);
            if let Some(filter) = filter {
                walk(filter, visit);
            }
        }
    }
}

fn walk_bind<'a>(bind: &'a Bind, visit: &mut impl FnMut(Node<'a>)) {
    visit(Node::Bind(bind));
    match bind {
        Bind::Set { set, .. } => walk(set, visit),
        Bind::Seq { seq, .. } => walk(seq, visit),
        Bind::Type(tb) => visit(Node::TypeBind(tb)),
    }
}

fn walk_multiple_binds<'a>(binds: &'a [MultipleBind], visit: &mut impl FnMut(Node<'a>)) {
    for bind in binds {
        visit(Node::MultipleBind(bind));
        match bind {
            MultipleBind::Set { set, .. } => walk(set, visit),
            MultipleBind::Seq { seq, .. } => walk(seq, visit),
            MultipleBind::Type { .. } => {}
        }
    }
}

/// Split a multiple type bind into one type bind per pattern.
pub fn type_binds_of(bind: &MultipleBind) -> Vec<TypeBind> {
    match bind {
        MultipleBind::Type { patterns, ty } => patterns
            .iter()
            .map(|p| TypeBind::new(p.clone(), ty.clone()))
            .collect(),
        MultipleBind::Set { .. } | MultipleBind::Seq { .. } => Vec::new(),
    }
}

/// Every type bind in `expr`, at any depth, in traversal order without
/// duplicates. Collection binds are skipped.
pub fn collect_type_binds(expr: &Expr) -> Vec<TypeBind> {
    let mut out: Vec<TypeBind> = Vec::new();
    let mut add = |tb: TypeBind| {
        if !out.contains(&tb) {
            out.push(tb);
        }
    };
    walk(expr, &mut |node| match node {
        Node::TypeBind(tb) => add(tb.clone()),
        Node::MultipleBind(mb) => type_binds_of(mb).into_iter().for_each(&mut add),
        Node::Expr(_) | Node::Bind(_) | Node::Definition(_) => {}
    });
    out
}

/// The `forall`s reachable from `expr` through `and` only.
pub fn conjunctive_foralls(expr: &Expr) -> Vec<&Expr> {
    let mut out = Vec::new();
    conjuncts(expr, &mut out);
    out
}

fn conjuncts<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    match expr {
        Expr::Forall { .. } => out.push(expr),
        Expr::Binary {
            op: BinOp::And,
            left,
            right,
        } => {
            conjuncts(left, out);
            conjuncts(right, out);
        }
        _ => {}
    }
}
