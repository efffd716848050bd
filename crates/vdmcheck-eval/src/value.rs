//! Runtime values for VDM predicates.
//!
//! Equality and ordering are structural, with three exceptions:
//! numbers compare by numeric value across `Int` and `Real`, a `Named`
//! wrapper is transparent, and objects compare by identity.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use vdmcheck_syntax::format_real;

/// Identity of a class instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    pub id: u64,
    pub class: String,
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Char(char),
    /// `mk_token(v)`.
    Token(Box<Value>),
    /// `<NAME>`.
    Quote(String),
    Int(i64),
    Real(f64),
    Nil,
    /// A value of a named type, carrying the type's name for display.
    Named { name: String, value: Box<Value> },
    /// `mk_R(...)`; fields in declaration order.
    Record {
        tag: String,
        fields: Vec<(String, Value)>,
    },
    /// Sorted, deduplicated elements.
    Set(Vec<Value>),
    Seq(Vec<Value>),
    /// Sorted by key, keys unique.
    Map(Vec<(Value, Value)>),
    Tuple(Vec<Value>),
    Object(ObjectRef),
    /// Opaque function value; only its name is observable.
    Function { name: String },
}

// === Constructors ===

impl Value {
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    pub fn token(n: i64) -> Self {
        Value::Token(Box::new(Value::Int(n)))
    }

    pub fn empty_set() -> Self {
        Value::Set(Vec::new())
    }

    pub fn empty_seq() -> Self {
        Value::Seq(Vec::new())
    }

    pub fn empty_map() -> Self {
        Value::Map(Vec::new())
    }

    pub fn set_from_iter(iter: impl IntoIterator<Item = Value>) -> Self {
        let mut v: Vec<Value> = iter.into_iter().collect();
        v.sort();
        v.dedup();
        Value::Set(v)
    }

    /// Build a map; later entries for an existing key win.
    pub fn map_from_iter(iter: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut map: Vec<(Value, Value)> = Vec::new();
        for (k, v) in iter {
            Value::map_insert(&mut map, k, v);
        }
        Value::Map(map)
    }

    pub fn named(name: impl Into<String>, value: Value) -> Self {
        Value::Named {
            name: name.into(),
            value: Box::new(value),
        }
    }

    pub fn record(tag: impl Into<String>, fields: Vec<(String, Value)>) -> Self {
        Value::Record {
            tag: tag.into(),
            fields,
        }
    }

    pub fn set_insert(set: &mut Vec<Value>, val: Value) -> bool {
        match set.binary_search(&val) {
            Ok(_) => false,
            Err(pos) => {
                set.insert(pos, val);
                true
            }
        }
    }

    pub fn set_contains(set: &[Value], val: &Value) -> bool {
        set.binary_search(val).is_ok()
    }

    pub fn map_get<'a>(map: &'a [(Value, Value)], key: &Value) -> Option<&'a Value> {
        map.binary_search_by(|(k, _)| k.cmp(key))
            .ok()
            .map(|idx| &map[idx].1)
    }

    pub fn map_insert(map: &mut Vec<(Value, Value)>, key: Value, value: Value) {
        match map.binary_search_by(|(k, _)| k.cmp(&key)) {
            Ok(idx) => map[idx].1 = value,
            Err(pos) => map.insert(pos, (key, value)),
        }
    }
}

// === Accessors ===

impl Value {
    /// Look through any `Named` wrappers.
    pub fn unwrap_named(&self) -> &Value {
        let mut v = self;
        while let Value::Named { value, .. } = v {
            v = value;
        }
        v
    }

    pub fn type_name(&self) -> &'static str {
        match self.unwrap_named() {
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Token(_) => "token",
            Value::Quote(_) => "quote",
            Value::Int(_) => "int",
            Value::Real(_) => "real",
            Value::Nil => "nil",
            Value::Named { .. } => "named",
            Value::Record { .. } => "record",
            Value::Set(_) => "set",
            Value::Seq(_) => "seq",
            Value::Map(_) => "map",
            Value::Tuple(_) => "tuple",
            Value::Object(_) => "object",
            Value::Function { .. } => "function",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.unwrap_named() {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.unwrap_named() {
            Value::Int(n) => Some(*n),
            Value::Real(r) if r.fract() == 0.0 && r.abs() < i64::MAX as f64 => Some(*r as i64),
            _ => None,
        }
    }

    /// Any numeric value as a float.
    pub fn as_real(&self) -> Option<f64> {
        match self.unwrap_named() {
            Value::Int(n) => Some(*n as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.unwrap_named(), Value::Int(_) | Value::Real(_))
    }

    pub fn as_set(&self) -> Option<&[Value]> {
        match self.unwrap_named() {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self.unwrap_named() {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self.unwrap_named() {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Number of elements of a set, sequence or map.
    pub fn len(&self) -> Option<usize> {
        match self.unwrap_named() {
            Value::Set(s) | Value::Seq(s) => Some(s.len()),
            Value::Map(m) => Some(m.len()),
            _ => None,
        }
    }

    pub fn is_empty_collection(&self) -> bool {
        self.len() == Some(0)
    }
}

// === Ordering ===

impl Value {
    /// Variant rank for cross-variant ordering. Numbers share one rank.
    fn rank(&self) -> u8 {
        match self {
            Value::Nil => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Real(_) => 2,
            Value::Char(_) => 3,
            Value::Quote(_) => 4,
            Value::Token(_) => 5,
            Value::Tuple(_) => 6,
            Value::Record { .. } => 7,
            Value::Set(_) => 8,
            Value::Seq(_) => 9,
            Value::Map(_) => 10,
            Value::Object(_) => 11,
            Value::Function { .. } => 12,
            Value::Named { .. } => 13,
        }
    }
}

fn cmp_slices(a: &[Value], b: &[Value]) -> Ordering {
    a.iter().cmp(b.iter())
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.unwrap_named();
        let b = other.unwrap_named();
        match (a, b) {
            (Value::Int(x), Value::Int(y)) => x.cmp(y),
            (Value::Int(_) | Value::Real(_), Value::Int(_) | Value::Real(_)) => {
                let x = a.as_real().unwrap_or(0.0);
                let y = b.as_real().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or_else(|| x.total_cmp(&y))
            }
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Char(x), Value::Char(y)) => x.cmp(y),
            (Value::Quote(x), Value::Quote(y)) => x.cmp(y),
            (Value::Token(x), Value::Token(y)) => x.cmp(y),
            (Value::Nil, Value::Nil) => Ordering::Equal,
            (Value::Tuple(x), Value::Tuple(y)) => cmp_slices(x, y),
            (
                Value::Record {
                    tag: ta,
                    fields: fa,
                },
                Value::Record {
                    tag: tb,
                    fields: fb,
                },
            ) => ta
                .cmp(tb)
                .then_with(|| fa.iter().map(|f| &f.1).cmp(fb.iter().map(|f| &f.1))),
            (Value::Set(x), Value::Set(y)) | (Value::Seq(x), Value::Seq(y)) => cmp_slices(x, y),
            (Value::Map(x), Value::Map(y)) => x.iter().cmp(y.iter()),
            (Value::Object(x), Value::Object(y)) => x.id.cmp(&y.id),
            (Value::Function { name: x }, Value::Function { name: y }) => x.cmp(y),
            _ => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let v = self.unwrap_named();
        v.rank().hash(state);
        match v {
            // Equal numbers must hash alike across Int and Real.
            Value::Int(_) | Value::Real(_) => {
                let r = v.as_real().unwrap_or(0.0);
                if r == 0.0 {
                    0u64.hash(state)
                } else {
                    r.to_bits().hash(state)
                }
            }
            Value::Bool(b) => b.hash(state),
            Value::Char(c) => c.hash(state),
            Value::Quote(q) => q.hash(state),
            Value::Token(t) => t.hash(state),
            Value::Nil => {}
            Value::Tuple(items) | Value::Set(items) | Value::Seq(items) => items.hash(state),
            Value::Record { tag, fields } => {
                tag.hash(state);
                for (_, f) in fields {
                    f.hash(state);
                }
            }
            Value::Map(entries) => entries.hash(state),
            Value::Object(obj) => obj.id.hash(state),
            Value::Function { name } => name.hash(state),
            Value::Named { .. } => {}
        }
    }
}

// === Display ===

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "'{}'", c),
            Value::Token(t) => write!(f, "mk_token({})", t),
            Value::Quote(q) => write!(f, "<{}>", q),
            Value::Int(n) => write!(f, "{}", n),
            Value::Real(r) => write!(f, "{}", format_real(*r)),
            Value::Nil => write!(f, "nil"),
            Value::Named { value, .. } => write!(f, "{}", value),
            Value::Record { tag, fields } => {
                write!(f, "mk_{}(", tag)?;
                for (i, (_, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
            Value::Set(items) => {
                write!(f, "{{")?;
                write_list(f, items)?;
                write!(f, "}}")
            }
            Value::Seq(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Value::Map(entries) => {
                if entries.is_empty() {
                    return write!(f, "{{|->}}");
                }
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} |-> {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Tuple(items) => {
                write!(f, "mk_(")?;
                write_list(f, items)?;
                write!(f, ")")
            }
            Value::Object(obj) => write!(f, "{}{{#{}}}", obj.class, obj.id),
            Value::Function { name } => write!(f, "<function {}>", name),
        }
    }
}
