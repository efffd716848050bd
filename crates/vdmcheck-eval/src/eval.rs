//! Reference tree-walking evaluator for VDM predicates.

use crate::bindings::{match_pattern, Bindings};
use crate::value::Value;
use thiserror::Error;
use tracing::trace;
use vdmcheck_syntax::{
    pretty_print_bind, BinOp, Bind, Definition, Expr, Literal, MultipleBind, Pattern, Type,
    TypeBind, TypeEnv, UnaryOp,
};

/// Default number of evaluation steps per call.
pub const DEFAULT_STEP_LIMIT: u64 = 100_000;

/// Evaluation error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("unbound name: {0}")]
    UnboundName(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("no field {field} in {value}")]
    NoSuchField { field: String, value: String },

    #[error("empty sequence")]
    EmptySequence,

    #[error("value {value} does not match pattern {pattern}")]
    PatternMismatch { pattern: String, value: String },

    #[error("invariant of {ty} violated by {value}")]
    InvariantFailure { ty: String, value: String },

    #[error("no unique value satisfies {0}")]
    NoSatisfyingValue(String),

    #[error("cannot enumerate type bind {bind}")]
    InfiniteTypeBind { bind: String },

    #[error("step limit of {0} exhausted")]
    StepLimit(u64),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Evaluates predicates under a [`Bindings`] context.
#[derive(Debug, Clone)]
pub struct Interpreter<'env> {
    env: &'env TypeEnv,
    step_limit: u64,
}

/// Per-call evaluation state: local scope and step counter.
struct Frame<'a> {
    bindings: &'a Bindings,
    locals: Vec<(String, Value)>,
    steps: u64,
    limit: u64,
}

impl Frame<'_> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.locals
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .or_else(|| self.bindings.get(name))
    }
}

impl<'env> Interpreter<'env> {
    pub fn new(env: &'env TypeEnv) -> Self {
        Self {
            env,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = limit;
        self
    }

    pub fn env(&self) -> &'env TypeEnv {
        self.env
    }

    /// Evaluate an expression.
    pub fn eval(&self, expr: &Expr, bindings: &Bindings) -> EvalResult<Value> {
        let mut frame = Frame {
            bindings,
            locals: Vec::new(),
            steps: 0,
            limit: self.step_limit,
        };
        let result = self.eval_expr(expr, &mut frame);
        trace!(steps = frame.steps, ok = result.is_ok(), "evaluated");
        result
    }

    /// Evaluate a boolean expression.
    pub fn eval_bool(&self, expr: &Expr, bindings: &Bindings) -> EvalResult<bool> {
        expect_bool(&self.eval(expr, bindings)?)
    }

    fn tick(&self, frame: &mut Frame) -> EvalResult<()> {
        frame.steps += 1;
        if frame.steps > frame.limit {
            return Err(EvalError::StepLimit(frame.limit));
        }
        Ok(())
    }

    fn eval_expr(&self, expr: &Expr, frame: &mut Frame) -> EvalResult<Value> {
        self.tick(frame)?;
        match expr {
            Expr::Literal(lit) => Ok(literal_value(lit)),
            Expr::Var(name) => frame
                .lookup(name)
                .cloned()
                .ok_or_else(|| EvalError::UnboundName(name.clone())),

            Expr::Unary { op, operand } => {
                let v = self.eval_expr(operand, frame)?;
                eval_unary(*op, &v)
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right, frame),

            Expr::SetEnum(items) => {
                let mut set = Vec::new();
                for item in items {
                    Value::set_insert(&mut set, self.eval_expr(item, frame)?);
                }
                Ok(Value::Set(set))
            }
            Expr::SeqEnum(items) => {
                let seq = items
                    .iter()
                    .map(|e| self.eval_expr(e, frame))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::Seq(seq))
            }
            Expr::MapEnum(entries) => {
                let mut map = Vec::new();
                for (k, v) in entries {
                    let key = self.eval_expr(k, frame)?;
                    let value = self.eval_expr(v, frame)?;
                    if let Some(existing) = Value::map_get(&map, &key) {
                        if *existing != value {
                            return Err(EvalError::Unsupported(format!(
                                "incompatible maplets for key {}",
                                key
                            )));
                        }
                    }
                    Value::map_insert(&mut map, key, value);
                }
                Ok(Value::Map(map))
            }
            Expr::SetRange { lo, hi } => {
                let lo = expect_int(&self.eval_expr(lo, frame)?)?;
                let hi = expect_int(&self.eval_expr(hi, frame)?)?;
                let width = hi.saturating_sub(lo);
                if width > frame.limit as i64 {
                    return Err(EvalError::StepLimit(frame.limit));
                }
                Ok(Value::Set((lo..=hi).map(Value::Int).collect()))
            }
            Expr::Tuple(items) => {
                let values = items
                    .iter()
                    .map(|e| self.eval_expr(e, frame))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::Tuple(values))
            }
            Expr::Mk { tag, args } => self.eval_mk(tag, args, frame),
            Expr::Field { base, field } => {
                let v = self.eval_expr(base, frame)?;
                match v.unwrap_named() {
                    Value::Record { fields, .. } => fields
                        .iter()
                        .find(|(tag, _)| tag == field)
                        .map(|(_, v)| v.clone())
                        .ok_or_else(|| EvalError::NoSuchField {
                            field: field.clone(),
                            value: v.to_string(),
                        }),
                    _ => Err(type_mismatch("record", &v)),
                }
            }
            Expr::Apply { func, args } => {
                let f = self.eval_expr(func, frame)?;
                let args = args
                    .iter()
                    .map(|e| self.eval_expr(e, frame))
                    .collect::<EvalResult<Vec<_>>>()?;
                apply(&f, &args)
            }

            Expr::If {
                cond,
                then_branch,
                elseifs,
                else_branch,
            } => {
                if expect_bool(&self.eval_expr(cond, frame)?)? {
                    return self.eval_expr(then_branch, frame);
                }
                for arm in elseifs {
                    if expect_bool(&self.eval_expr(&arm.cond, frame)?)? {
                        return self.eval_expr(&arm.then_branch, frame);
                    }
                }
                self.eval_expr(else_branch, frame)
            }
            Expr::Let { defs, body } | Expr::Def { defs, body } => {
                let mark = frame.locals.len();
                let result = self
                    .bind_definitions(defs, frame)
                    .and_then(|()| self.eval_expr(body, frame));
                frame.locals.truncate(mark);
                result
            }
            Expr::LetBeSt { bind, st, body } => {
                let values = self.bind_values(bind, frame)?;
                let mark = frame.locals.len();
                for value in &values {
                    if !match_pattern(bind.pattern(), value, &mut frame.locals) {
                        frame.locals.truncate(mark);
                        continue;
                    }
                    let ok = match st {
                        Some(st) => expect_bool(&self.eval_expr(st, frame)?)?,
                        None => true,
                    };
                    if ok {
                        let result = self.eval_expr(body, frame);
                        frame.locals.truncate(mark);
                        return result;
                    }
                    frame.locals.truncate(mark);
                }
                Err(EvalError::NoSatisfyingValue(pretty_print_bind(bind)))
            }

            Expr::Forall { binds, body } => {
                let dims = self.multiple_bind_dims(binds, frame)?;
                let mut holds = true;
                self.for_each_binding(&dims, frame, &mut |this, frame| {
                    if !expect_bool(&this.eval_expr(body, frame)?)? {
                        holds = false;
                    }
                    Ok(holds)
                })?;
                Ok(Value::Bool(holds))
            }
            Expr::Exists { binds, body } => {
                let dims = self.multiple_bind_dims(binds, frame)?;
                let mut found = false;
                self.for_each_binding(&dims, frame, &mut |this, frame| {
                    if expect_bool(&this.eval_expr(body, frame)?)? {
                        found = true;
                    }
                    Ok(!found)
                })?;
                Ok(Value::Bool(found))
            }
            Expr::Exists1 { bind, body } => {
                let dims = vec![(bind.pattern(), self.bind_values(bind, frame)?)];
                let mut count = 0usize;
                self.for_each_binding(&dims, frame, &mut |this, frame| {
                    if expect_bool(&this.eval_expr(body, frame)?)? {
                        count += 1;
                    }
                    Ok(count < 2)
                })?;
                Ok(Value::Bool(count == 1))
            }
            Expr::Iota { bind, body } => {
                let values = self.bind_values(bind, frame)?;
                let mut found: Option<Value> = None;
                let mut unique = true;
                for value in &values {
                    let mark = frame.locals.len();
                    if match_pattern(bind.pattern(), value, &mut frame.locals) {
                        let ok = expect_bool(&self.eval_expr(body, frame)?)?;
                        if ok {
                            if found.is_some() {
                                unique = false;
                            }
                            found = Some(value.clone());
                        }
                    }
                    frame.locals.truncate(mark);
                }
                match found {
                    Some(v) if unique => Ok(v),
                    _ => Err(EvalError::NoSatisfyingValue(pretty_print_bind(bind))),
                }
            }
            Expr::Lambda { .. } => Err(EvalError::Unsupported("lambda expressions".into())),

            Expr::SetComp {
                element,
                binds,
                filter,
            } => {
                let dims = self.multiple_bind_dims(binds, frame)?;
                let mut out = Vec::new();
                self.for_each_binding(&dims, frame, &mut |this, frame| {
                    if this.filter_holds(filter.as_deref(), frame)? {
                        Value::set_insert(&mut out, this.eval_expr(element, frame)?);
                    }
                    Ok(true)
                })?;
                Ok(Value::Set(out))
            }
            Expr::SeqComp {
                element,
                bind,
                filter,
            } => {
                let dims = vec![(bind.pattern(), self.bind_values(bind, frame)?)];
                let mut out = Vec::new();
                self.for_each_binding(&dims, frame, &mut |this, frame| {
                    if this.filter_holds(filter.as_deref(), frame)? {
                        out.push(this.eval_expr(element, frame)?);
                    }
                    Ok(true)
                })?;
                Ok(Value::Seq(out))
            }
            Expr::MapComp {
                key,
                value,
                binds,
                filter,
            } => {
                let dims = self.multiple_bind_dims(binds, frame)?;
                let mut out: Vec<(Value, Value)> = Vec::new();
                self.for_each_binding(&dims, frame, &mut |this, frame| {
                    if this.filter_holds(filter.as_deref(), frame)? {
                        let k = this.eval_expr(key, frame)?;
                        let v = this.eval_expr(value, frame)?;
                        if let Some(existing) = Value::map_get(&out, &k) {
                            if *existing != v {
                                return Err(EvalError::Unsupported(format!(
                                    "map comprehension is not a function at {}",
                                    k
                                )));
                            }
                        }
                        Value::map_insert(&mut out, k, v);
                    }
                    Ok(true)
                })?;
                Ok(Value::Map(out))
            }
        }
    }

    fn filter_holds(&self, filter: Option<&Expr>, frame: &mut Frame) -> EvalResult<bool> {
        match filter {
            Some(f) => expect_bool(&self.eval_expr(f, frame)?),
            None => Ok(true),
        }
    }

    fn bind_definitions(&self, defs: &[Definition], frame: &mut Frame) -> EvalResult<()> {
        for def in defs {
            let value = self.eval_expr(&def.value, frame)?;
            if !match_pattern(&def.pattern, &value, &mut frame.locals) {
                return Err(EvalError::PatternMismatch {
                    pattern: def.pattern.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    fn eval_mk(&self, tag: &str, args: &[Expr], frame: &mut Frame) -> EvalResult<Value> {
        let def = self
            .env
            .record(tag)
            .map_err(|_| EvalError::UnboundName(format!("mk_{}", tag)))?;
        if def.fields.len() != args.len() {
            return Err(EvalError::TypeMismatch {
                expected: format!("{} fields", def.fields.len()),
                actual: format!("{} arguments", args.len()),
            });
        }
        let mut fields = Vec::with_capacity(args.len());
        for (field, arg) in def.fields.iter().zip(args) {
            fields.push((field.tag.clone(), self.eval_expr(arg, frame)?));
        }
        let record = Value::record(tag, fields);
        if let Some(inv) = &def.inv {
            let mark = frame.locals.len();
            let holds = if match_pattern(&inv.pattern, &record, &mut frame.locals) {
                self.eval_expr(&inv.body, frame)
                    .and_then(|v| expect_bool(&v))
            } else {
                Ok(false)
            };
            frame.locals.truncate(mark);
            if !holds? {
                return Err(EvalError::InvariantFailure {
                    ty: tag.to_string(),
                    value: record.to_string(),
                });
            }
        }
        Ok(record)
    }

    // === Binds ===

    /// Values for `patterns : ty`: a supplied range, or a finite enumeration
    /// for types that have one.
    fn type_values(&self, patterns: &[Pattern], ty: &Type, frame: &Frame) -> EvalResult<Vec<Value>> {
        let supplied = patterns.iter().find_map(|p| {
            frame
                .bindings
                .range(&TypeBind::new(p.clone(), ty.clone()))
                .map(|r| r.to_vec())
        });
        if let Some(values) = supplied {
            return Ok(values);
        }
        match self.env.resolve(ty) {
            Type::Boolean => Ok(vec![Value::Bool(false), Value::Bool(true)]),
            Type::Quote(q) => Ok(vec![Value::Quote(q.clone())]),
            _ => {
                let names: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
                Err(EvalError::InfiniteTypeBind {
                    bind: format!("{}:{}", names.join(", "), ty),
                })
            }
        }
    }

    fn collection_values(&self, expr: &Expr, seq: bool, frame: &mut Frame) -> EvalResult<Vec<Value>> {
        let v = self.eval_expr(expr, frame)?;
        let items = if seq { v.as_seq() } else { v.as_set() };
        items
            .map(|s| s.to_vec())
            .ok_or_else(|| type_mismatch(if seq { "seq" } else { "set" }, &v))
    }

    fn bind_values(&self, bind: &Bind, frame: &mut Frame) -> EvalResult<Vec<Value>> {
        match bind {
            Bind::Set { set, .. } => self.collection_values(set, false, frame),
            Bind::Seq { seq, .. } => self.collection_values(seq, true, frame),
            Bind::Type(tb) => self.type_values(std::slice::from_ref(&tb.pattern), &tb.ty, frame),
        }
    }

    /// One (pattern, values) dimension per pattern of each multiple bind.
    fn multiple_bind_dims<'b>(
        &self,
        binds: &'b [MultipleBind],
        frame: &mut Frame,
    ) -> EvalResult<Vec<(&'b Pattern, Vec<Value>)>> {
        let mut dims = Vec::new();
        for bind in binds {
            let values = match bind {
                MultipleBind::Set { set, .. } => self.collection_values(set, false, frame)?,
                MultipleBind::Seq { seq, .. } => self.collection_values(seq, true, frame)?,
                MultipleBind::Type { patterns, ty } => self.type_values(patterns, ty, frame)?,
            };
            for pattern in bind.patterns() {
                dims.push((pattern, values.clone()));
            }
        }
        Ok(dims)
    }

    /// Visit the Cartesian product of `dims`, binding each pattern in turn.
    /// The visitor returns `Ok(false)` to stop early.
    fn for_each_binding<F>(
        &self,
        dims: &[(&Pattern, Vec<Value>)],
        frame: &mut Frame,
        visit: &mut F,
    ) -> EvalResult<bool>
    where
        F: FnMut(&Self, &mut Frame) -> EvalResult<bool>,
    {
        let Some(((pattern, values), rest)) = dims.split_first() else {
            return visit(self, frame);
        };
        for value in values {
            self.tick(frame)?;
            let mark = frame.locals.len();
            let keep_going = if match_pattern(pattern, value, &mut frame.locals) {
                self.for_each_binding(rest, frame, visit)
            } else {
                Ok(true)
            };
            frame.locals.truncate(mark);
            if !keep_going? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // === Operators ===

    fn eval_binary(
        &self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        frame: &mut Frame,
    ) -> EvalResult<Value> {
        match op {
            BinOp::And => {
                if !expect_bool(&self.eval_expr(left, frame)?)? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(expect_bool(&self.eval_expr(right, frame)?)?))
            }
            BinOp::Or => {
                if expect_bool(&self.eval_expr(left, frame)?)? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(expect_bool(&self.eval_expr(right, frame)?)?))
            }
            BinOp::Implies => {
                if !expect_bool(&self.eval_expr(left, frame)?)? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(expect_bool(&self.eval_expr(right, frame)?)?))
            }
            _ => {
                let l = self.eval_expr(left, frame)?;
                let r = self.eval_expr(right, frame)?;
                eval_binary_values(op, &l, &r)
            }
        }
    }
}

/// The runtime value of a literal.
pub fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(n) => Value::Int(*n),
        Literal::Real(r) => Value::Real(*r),
        Literal::Char(c) => Value::Char(*c),
        Literal::Quote(q) => Value::Quote(q.clone()),
        Literal::Text(s) => Value::Seq(s.chars().map(Value::Char).collect()),
        Literal::Nil => Value::Nil,
    }
}

/// Evaluate a binary operator on already-evaluated operands.
pub fn eval_binary_values(op: BinOp, l: &Value, r: &Value) -> EvalResult<Value> {
    match op {
        BinOp::And | BinOp::Or | BinOp::Implies | BinOp::Iff => {
            let a = expect_bool(l)?;
            let b = expect_bool(r)?;
            Ok(Value::Bool(match op {
                BinOp::And => a && b,
                BinOp::Or => a || b,
                BinOp::Implies => !a || b,
                _ => a == b,
            }))
        }
        BinOp::Eq => Ok(Value::Bool(l == r)),
        BinOp::Ne => Ok(Value::Bool(l != r)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            if !l.is_numeric() {
                return Err(type_mismatch("number", l));
            }
            if !r.is_numeric() {
                return Err(type_mismatch("number", r));
            }
            let ord = l.cmp(r);
            Ok(Value::Bool(match op {
                BinOp::Lt => ord.is_lt(),
                BinOp::Le => ord.is_le(),
                BinOp::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            }))
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul => arith(op, l, r),
        BinOp::Div => {
            let b = expect_real(r)?;
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let q = expect_real(l)? / b;
            if !q.is_finite() {
                return Err(EvalError::Overflow);
            }
            Ok(Value::Real(q))
        }
        BinOp::IntDiv | BinOp::Rem | BinOp::Mod => {
            let a = expect_int(l)?;
            let b = expect_int(r)?;
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let result = match op {
                // VDM div truncates toward zero, rem takes the sign of the dividend,
                // mod takes the sign of the divisor.
                BinOp::IntDiv => a.checked_div(b),
                BinOp::Rem => a.checked_rem(b),
                _ => a.checked_rem(b).map(|m| if m != 0 && (m < 0) != (b < 0) { m + b } else { m }),
            };
            result.map(Value::Int).ok_or(EvalError::Overflow)
        }
        BinOp::InSet => Ok(Value::Bool(Value::set_contains(expect_set(r)?, l))),
        BinOp::NotInSet => Ok(Value::Bool(!Value::set_contains(expect_set(r)?, l))),
        BinOp::Union => {
            let mut out = expect_set(l)?.to_vec();
            for v in expect_set(r)? {
                Value::set_insert(&mut out, v.clone());
            }
            Ok(Value::Set(out))
        }
        BinOp::Inter => {
            let b = expect_set(r)?;
            Ok(Value::Set(
                expect_set(l)?
                    .iter()
                    .filter(|v| Value::set_contains(b, v))
                    .cloned()
                    .collect(),
            ))
        }
        BinOp::Diff => {
            let b = expect_set(r)?;
            Ok(Value::Set(
                expect_set(l)?
                    .iter()
                    .filter(|v| !Value::set_contains(b, v))
                    .cloned()
                    .collect(),
            ))
        }
        BinOp::Subset | BinOp::PSubset => {
            let a = expect_set(l)?;
            let b = expect_set(r)?;
            let subset = a.iter().all(|v| Value::set_contains(b, v));
            Ok(Value::Bool(if op == BinOp::Subset {
                subset
            } else {
                subset && a.len() < b.len()
            }))
        }
        BinOp::Concat => {
            let mut out = expect_seq(l)?.to_vec();
            out.extend_from_slice(expect_seq(r)?);
            Ok(Value::Seq(out))
        }
        BinOp::Munion => {
            let mut out = expect_map(l)?.to_vec();
            for (k, v) in expect_map(r)? {
                if let Some(existing) = Value::map_get(&out, k) {
                    if existing != v {
                        return Err(EvalError::Unsupported(format!(
                            "incompatible maps in munion at key {}",
                            k
                        )));
                    }
                }
                Value::map_insert(&mut out, k.clone(), v.clone());
            }
            Ok(Value::Map(out))
        }
    }
}

fn arith(op: BinOp, l: &Value, r: &Value) -> EvalResult<Value> {
    if let (Value::Int(a), Value::Int(b)) = (l.unwrap_named(), r.unwrap_named()) {
        let result = match op {
            BinOp::Add => a.checked_add(*b),
            BinOp::Sub => a.checked_sub(*b),
            _ => a.checked_mul(*b),
        };
        return result.map(Value::Int).ok_or(EvalError::Overflow);
    }
    let a = expect_real(l)?;
    let b = expect_real(r)?;
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        _ => a * b,
    };
    if result.is_finite() {
        Ok(Value::Real(result))
    } else {
        Err(EvalError::Overflow)
    }
}

/// Evaluate a unary operator on an evaluated operand.
pub fn eval_unary(op: UnaryOp, v: &Value) -> EvalResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!expect_bool(v)?)),
        UnaryOp::Neg => match v.unwrap_named() {
            Value::Int(n) => n.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
            Value::Real(r) => Ok(Value::Real(-r)),
            _ => Err(type_mismatch("number", v)),
        },
        UnaryOp::Abs => match v.unwrap_named() {
            Value::Int(n) => n.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
            Value::Real(r) => Ok(Value::Real(r.abs())),
            _ => Err(type_mismatch("number", v)),
        },
        UnaryOp::Floor => match v.unwrap_named() {
            Value::Int(n) => Ok(Value::Int(*n)),
            Value::Real(r) => {
                let f = r.floor();
                if f.abs() < i64::MAX as f64 {
                    Ok(Value::Int(f as i64))
                } else {
                    Err(EvalError::Overflow)
                }
            }
            _ => Err(type_mismatch("number", v)),
        },
        UnaryOp::Card => Ok(Value::Int(expect_set(v)?.len() as i64)),
        UnaryOp::Len => Ok(Value::Int(expect_seq(v)?.len() as i64)),
        UnaryOp::Elems => Ok(Value::set_from_iter(expect_seq(v)?.iter().cloned())),
        UnaryOp::Inds => Ok(Value::Set(
            (1..=expect_seq(v)?.len() as i64).map(Value::Int).collect(),
        )),
        UnaryOp::Hd => expect_seq(v)?
            .first()
            .cloned()
            .ok_or(EvalError::EmptySequence),
        UnaryOp::Tl => {
            let s = expect_seq(v)?;
            if s.is_empty() {
                return Err(EvalError::EmptySequence);
            }
            Ok(Value::Seq(s[1..].to_vec()))
        }
        UnaryOp::Dom => Ok(Value::Set(
            expect_map(v)?.iter().map(|(k, _)| k.clone()).collect(),
        )),
        UnaryOp::Rng => Ok(Value::set_from_iter(
            expect_map(v)?.iter().map(|(_, v)| v.clone()),
        )),
    }
}

fn apply(f: &Value, args: &[Value]) -> EvalResult<Value> {
    match f.unwrap_named() {
        Value::Seq(seq) => {
            let [index] = args else {
                return Err(EvalError::TypeMismatch {
                    expected: "one index".into(),
                    actual: format!("{} arguments", args.len()),
                });
            };
            let i = expect_int(index)?;
            if i < 1 || i as usize > seq.len() {
                return Err(EvalError::IndexOutOfBounds {
                    index: i,
                    length: seq.len(),
                });
            }
            Ok(seq[i as usize - 1].clone())
        }
        Value::Map(map) => {
            let key = match args {
                [key] => key.clone(),
                _ => Value::Tuple(args.to_vec()),
            };
            Value::map_get(map, &key)
                .cloned()
                .ok_or_else(|| EvalError::KeyNotFound(key.to_string()))
        }
        Value::Function { name } => Err(EvalError::Unsupported(format!(
            "application of function {}",
            name
        ))),
        _ => Err(type_mismatch("seq, map or function", f)),
    }
}

pub fn expect_bool(v: &Value) -> EvalResult<bool> {
    v.as_bool().ok_or_else(|| type_mismatch("bool", v))
}

pub fn expect_int(v: &Value) -> EvalResult<i64> {
    v.as_int().ok_or_else(|| type_mismatch("int", v))
}

pub fn expect_real(v: &Value) -> EvalResult<f64> {
    v.as_real().ok_or_else(|| type_mismatch("real", v))
}

pub fn expect_set(v: &Value) -> EvalResult<&[Value]> {
    v.as_set().ok_or_else(|| type_mismatch("set", v))
}

pub fn expect_seq(v: &Value) -> EvalResult<&[Value]> {
    v.as_seq().ok_or_else(|| type_mismatch("seq", v))
}

pub fn expect_map(v: &Value) -> EvalResult<&[(Value, Value)]> {
    v.as_map().ok_or_else(|| type_mismatch("map", v))
}

pub(crate) fn type_mismatch(expected: &str, actual: &Value) -> EvalError {
    EvalError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vdmcheck_syntax::{ElseIf, InvariantDef, RecordDef};

    fn eval_simple(expr: &Expr) -> EvalResult<Value> {
        let env = TypeEnv::new();
        Interpreter::new(&env).eval(expr, &Bindings::new())
    }

    fn gt(l: Expr, r: Expr) -> Expr {
        Expr::binary(BinOp::Gt, l, r)
    }

    #[test]
    fn test_arithmetic() {
        let add = Expr::binary(BinOp::Add, Expr::int(2), Expr::int(3));
        assert_eq!(eval_simple(&add).unwrap(), Value::Int(5));

        let div = Expr::binary(BinOp::Div, Expr::int(1), Expr::int(2));
        assert_eq!(eval_simple(&div).unwrap(), Value::Real(0.5));

        let modulo = Expr::binary(BinOp::Mod, Expr::int(-7), Expr::int(3));
        assert_eq!(eval_simple(&modulo).unwrap(), Value::Int(2));

        let rem = Expr::binary(BinOp::Rem, Expr::int(-7), Expr::int(3));
        assert_eq!(eval_simple(&rem).unwrap(), Value::Int(-1));

        let zero = Expr::binary(BinOp::IntDiv, Expr::int(1), Expr::int(0));
        assert_eq!(eval_simple(&zero), Err(EvalError::DivisionByZero));

        let overflow = Expr::binary(BinOp::Add, Expr::int(i64::MAX), Expr::int(1));
        assert_eq!(eval_simple(&overflow), Err(EvalError::Overflow));
    }

    #[test]
    fn test_logical_short_circuit() {
        // false and <error> = false
        let e = Expr::and(Expr::bool(false), Expr::var("undefined"));
        assert_eq!(eval_simple(&e).unwrap(), Value::Bool(false));

        let e = Expr::implies(Expr::bool(false), Expr::var("undefined"));
        assert_eq!(eval_simple(&e).unwrap(), Value::Bool(true));

        let e = Expr::or(Expr::bool(false), Expr::var("undefined"));
        assert_eq!(
            eval_simple(&e),
            Err(EvalError::UnboundName("undefined".into()))
        );
    }

    #[test]
    fn test_set_operations() {
        let s1 = Expr::SetEnum(vec![Expr::int(1), Expr::int(2)]);
        let s2 = Expr::SetEnum(vec![Expr::int(2), Expr::int(3)]);
        let union = Expr::binary(BinOp::Union, s1.clone(), s2.clone());
        assert_eq!(eval_simple(&union).unwrap().len(), Some(3));

        let inter = Expr::binary(BinOp::Inter, s1.clone(), s2);
        assert_eq!(eval_simple(&inter).unwrap(), Value::Set(vec![Value::Int(2)]));

        let member = Expr::binary(BinOp::InSet, Expr::int(1), s1.clone());
        assert_eq!(eval_simple(&member).unwrap(), Value::Bool(true));

        let card = Expr::unary(UnaryOp::Card, s1);
        assert_eq!(eval_simple(&card).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_sequences_and_maps() {
        let seq = Expr::SeqEnum(vec![Expr::int(10), Expr::int(20)]);
        let idx = Expr::Apply {
            func: Box::new(seq.clone()),
            args: vec![Expr::int(2)],
        };
        assert_eq!(eval_simple(&idx).unwrap(), Value::Int(20));

        let out = Expr::Apply {
            func: Box::new(seq.clone()),
            args: vec![Expr::int(3)],
        };
        assert!(matches!(
            eval_simple(&out),
            Err(EvalError::IndexOutOfBounds { index: 3, length: 2 })
        ));

        let hd = Expr::unary(UnaryOp::Hd, Expr::SeqEnum(vec![]));
        assert_eq!(eval_simple(&hd), Err(EvalError::EmptySequence));

        let map = Expr::MapEnum(vec![(Expr::int(1), Expr::bool(true))]);
        let dom = Expr::unary(UnaryOp::Dom, map);
        assert_eq!(eval_simple(&dom).unwrap(), Value::Set(vec![Value::Int(1)]));
    }

    #[test]
    fn test_forall_exists_over_sets() {
        let domain = Expr::SetRange {
            lo: Box::new(Expr::int(1)),
            hi: Box::new(Expr::int(5)),
        };
        let all = Expr::forall(
            vec![MultipleBind::in_set("x", domain.clone())],
            gt(Expr::var("x"), Expr::int(0)),
        );
        assert_eq!(eval_simple(&all).unwrap(), Value::Bool(true));

        let not_all = Expr::forall(
            vec![MultipleBind::in_set("x", domain.clone())],
            gt(Expr::var("x"), Expr::int(3)),
        );
        assert_eq!(eval_simple(&not_all).unwrap(), Value::Bool(false));

        let some = Expr::exists(
            vec![MultipleBind::in_set("x", domain.clone())],
            Expr::eq(Expr::var("x"), Expr::int(3)),
        );
        assert_eq!(eval_simple(&some).unwrap(), Value::Bool(true));

        let unique = Expr::Exists1 {
            bind: Bind::Set {
                pattern: Pattern::ident("x"),
                set: Box::new(domain),
            },
            body: Box::new(gt(Expr::var("x"), Expr::int(3))),
        };
        assert_eq!(eval_simple(&unique).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_inner_binder_shadows_outer() {
        // exists x in set {1} & exists x in set {2} & x = 2
        let nested = Expr::exists(
            vec![MultipleBind::in_set("x", Expr::SetEnum(vec![Expr::int(1)]))],
            Expr::exists(
                vec![MultipleBind::in_set("x", Expr::SetEnum(vec![Expr::int(2)]))],
                Expr::eq(Expr::var("x"), Expr::int(2)),
            ),
        );
        assert_eq!(eval_simple(&nested).unwrap(), Value::Bool(true));

        // let x = 1 in let x = x + 1 in x
        let lets = Expr::let_in(
            vec![Definition::new("x", Expr::int(1))],
            Expr::let_in(
                vec![Definition::new(
                    "x",
                    Expr::binary(BinOp::Add, Expr::var("x"), Expr::int(1)),
                )],
                Expr::var("x"),
            ),
        );
        assert_eq!(eval_simple(&lets).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_type_bind_uses_supplied_range() {
        let env = TypeEnv::new();
        let interp = Interpreter::new(&env);
        let tb = TypeBind::new(Pattern::ident("x"), Type::nat());
        let e = Expr::forall(
            vec![MultipleBind::typed("x", Type::nat())],
            Expr::binary(BinOp::Lt, Expr::var("x"), Expr::int(3)),
        );

        assert!(matches!(
            interp.eval(&e, &Bindings::new()),
            Err(EvalError::InfiniteTypeBind { .. })
        ));

        let mut b = Bindings::new();
        b.set_range(tb.clone(), Arc::new(vec![Value::Int(0), Value::Int(1)]));
        assert_eq!(interp.eval_bool(&e, &b), Ok(true));

        b.set_range(tb, Arc::new(vec![Value::Int(0), Value::Int(5)]));
        assert_eq!(interp.eval_bool(&e, &b), Ok(false));

        // Booleans enumerate without a supplied range.
        let e = Expr::exists(
            vec![MultipleBind::typed("b", Type::Boolean)],
            Expr::var("b"),
        );
        assert_eq!(interp.eval_bool(&e, &Bindings::new()), Ok(true));
    }

    #[test]
    fn test_let_if_and_bindings() {
        let e = Expr::let_in(
            vec![Definition::new("y", Expr::int(5))],
            Expr::If {
                cond: Box::new(gt(Expr::var("x"), Expr::var("y"))),
                then_branch: Box::new(Expr::int(1)),
                elseifs: vec![ElseIf {
                    cond: Expr::eq(Expr::var("x"), Expr::var("y")),
                    then_branch: Expr::int(0),
                }],
                else_branch: Box::new(Expr::int(-1)),
            },
        );
        let env = TypeEnv::new();
        let interp = Interpreter::new(&env);
        for (x, expected) in [(7, 1), (5, 0), (2, -1)] {
            let mut b = Bindings::new();
            b.bind("x", Value::Int(x));
            assert_eq!(interp.eval(&e, &b).unwrap(), Value::Int(expected));
        }
    }

    #[test]
    fn test_mk_checks_record_invariant() {
        let mut env = TypeEnv::new();
        env.define_record(
            RecordDef::new("Pos", [("v".to_string(), Type::int())]).with_inv(InvariantDef::new(
                Pattern::Record {
                    tag: "Pos".into(),
                    fields: vec![Pattern::ident("v")],
                },
                gt(Expr::var("v"), Expr::int(0)),
            )),
        )
        .unwrap();
        let interp = Interpreter::new(&env);

        let ok = Expr::Mk {
            tag: "Pos".into(),
            args: vec![Expr::int(3)],
        };
        assert_eq!(
            interp.eval(&ok, &Bindings::new()).unwrap().to_string(),
            "mk_Pos(3)"
        );

        let bad = Expr::Mk {
            tag: "Pos".into(),
            args: vec![Expr::int(0)],
        };
        assert!(matches!(
            interp.eval(&bad, &Bindings::new()),
            Err(EvalError::InvariantFailure { .. })
        ));

        let field = Expr::Field {
            base: Box::new(ok),
            field: "v".into(),
        };
        assert_eq!(interp.eval(&field, &Bindings::new()).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_comprehensions() {
        let domain = Expr::SetEnum(vec![Expr::int(1), Expr::int(2), Expr::int(3)]);
        let squares = Expr::SetComp {
            element: Box::new(Expr::binary(BinOp::Mul, Expr::var("x"), Expr::var("x"))),
            binds: vec![MultipleBind::in_set("x", domain.clone())],
            filter: Some(Box::new(gt(Expr::var("x"), Expr::int(1)))),
        };
        assert_eq!(
            eval_simple(&squares).unwrap(),
            Value::Set(vec![Value::Int(4), Value::Int(9)])
        );

        let map = Expr::MapComp {
            key: Box::new(Expr::var("x")),
            value: Box::new(Expr::bool(true)),
            binds: vec![MultipleBind::in_set("x", domain)],
            filter: None,
        };
        assert_eq!(eval_simple(&map).unwrap().len(), Some(3));
    }

    #[test]
    fn test_step_limit() {
        let env = TypeEnv::new();
        let interp = Interpreter::new(&env).with_step_limit(10);
        let domain = Expr::SetRange {
            lo: Box::new(Expr::int(1)),
            hi: Box::new(Expr::int(5)),
        };
        let e = Expr::forall(
            vec![
                MultipleBind::in_set("x", domain.clone()),
                MultipleBind::in_set("y", domain),
            ],
            Expr::bool(true),
        );
        assert_eq!(
            interp.eval(&e, &Bindings::new()),
            Err(EvalError::StepLimit(10))
        );
    }

    #[test]
    fn test_lambda_unsupported() {
        let e = Expr::Lambda {
            params: vec![TypeBind::new(Pattern::ident("x"), Type::nat())],
            body: Box::new(Expr::var("x")),
        };
        assert!(matches!(eval_simple(&e), Err(EvalError::Unsupported(_))));
    }
}
