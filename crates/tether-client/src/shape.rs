//! Declared message shapes and their validators.
//!
//! A [`Shape`] is a small declarative description of a JSON value. Shapes
//! are plain data so they can be stored in the RPC registry and rendered
//! into documentation. Checking a value is done by a [`Validator`], compiled
//! once from a shape and reused for every message.
//!
//! ```
//! use tether_client::{Shape, Validator};
//! use serde_json::json;
//!
//! let shape = Shape::object()
//!     .required("type", Shape::literal("echo"))
//!     .required("msg", Shape::String);
//! let validator = Validator::new(&shape.into());
//!
//! assert!(validator.is_valid(&json!({"type": "echo", "msg": "hi"})));
//! assert!(!validator.is_valid(&json!({"type": "echo"})));
//! ```

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Any,
    String,
    /// An integer (signed or unsigned).
    Int,
    Number,
    Bool,
    Null,
    Literal { value: Value },
    Array { items: Box<Shape> },
    /// An object with arbitrary keys whose values all match.
    Map { values: Box<Shape> },
    Object(ObjectShape),
    /// At least one of the alternatives matches.
    OneOf { options: Vec<Shape> },
}

impl Shape {
    pub fn literal(value: impl Into<Value>) -> Self {
        Shape::Literal {
            value: value.into(),
        }
    }

    pub fn array(items: Shape) -> Self {
        Shape::Array {
            items: Box::new(items),
        }
    }

    pub fn map(values: Shape) -> Self {
        Shape::Map {
            values: Box::new(values),
        }
    }

    pub fn one_of(options: impl IntoIterator<Item = Shape>) -> Self {
        Shape::OneOf {
            options: options.into_iter().collect(),
        }
    }

    pub fn object() -> ObjectShape {
        ObjectShape::default()
    }

    pub fn as_object(&self) -> Option<&ObjectShape> {
        match self {
            Shape::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl From<ObjectShape> for Shape {
    fn from(object: ObjectShape) -> Self {
        Shape::Object(object)
    }
}

/// An object with named fields. Closed by default: keys not declared are
/// violations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectShape {
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub shape: Shape,
    pub required: bool,
}

impl ObjectShape {
    pub fn required(self, name: impl Into<String>, shape: Shape) -> Self {
        self.with_field(name, shape, true)
    }

    pub fn optional(self, name: impl Into<String>, shape: Shape) -> Self {
        self.with_field(name, shape, false)
    }

    /// Allow keys beyond the declared fields.
    pub fn open(mut self) -> Self {
        self.open = true;
        self
    }

    /// Add a field, replacing any existing field of the same name.
    pub fn with_field(mut self, name: impl Into<String>, shape: Shape, required: bool) -> Self {
        let name = name.into();
        self.fields.retain(|f| f.name != name);
        self.fields.push(Field {
            name,
            shape,
            required,
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One way a value failed to match a shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Location of the offending value, e.g. `$.body.msg`.
    pub path: String,
    pub problem: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.problem)
    }
}

/// A compiled, reusable checker for one [`Shape`].
#[derive(Debug, Clone)]
pub struct Validator {
    root: Node,
}

#[derive(Debug, Clone)]
enum Node {
    Any,
    String,
    Int,
    Number,
    Bool,
    Null,
    Literal(Value),
    Array(Box<Node>),
    Map(Box<Node>),
    Object {
        fields: HashMap<String, (Node, bool)>,
        // Declaration order, for stable reporting of missing keys.
        order: Vec<String>,
        open: bool,
    },
    OneOf(Vec<Node>),
}

impl Validator {
    pub fn new(shape: &Shape) -> Self {
        Self {
            root: compile(shape),
        }
    }

    /// Every violation found; empty when the value matches.
    pub fn validate(&self, value: &Value) -> Vec<Violation> {
        let mut out = Vec::new();
        check(&self.root, value, "$", &mut out);
        out
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.validate(value).is_empty()
    }
}

fn compile(shape: &Shape) -> Node {
    match shape {
        Shape::Any => Node::Any,
        Shape::String => Node::String,
        Shape::Int => Node::Int,
        Shape::Number => Node::Number,
        Shape::Bool => Node::Bool,
        Shape::Null => Node::Null,
        Shape::Literal { value } => Node::Literal(value.clone()),
        Shape::Array { items } => Node::Array(Box::new(compile(items))),
        Shape::Map { values } => Node::Map(Box::new(compile(values))),
        Shape::Object(object) => Node::Object {
            fields: object
                .fields
                .iter()
                .map(|f| (f.name.clone(), (compile(&f.shape), f.required)))
                .collect(),
            order: object.fields.iter().map(|f| f.name.clone()).collect(),
            open: object.open,
        },
        Shape::OneOf { options } => Node::OneOf(options.iter().map(compile).collect()),
    }
}

fn check(node: &Node, value: &Value, path: &str, out: &mut Vec<Violation>) {
    match node {
        Node::Any => {}
        Node::String if value.is_string() => {}
        Node::String => push(out, path, format!("expected a string, got {}", describe(value))),
        Node::Int if value.is_i64() || value.is_u64() => {}
        Node::Int => push(out, path, format!("expected an integer, got {}", describe(value))),
        Node::Number if value.is_number() => {}
        Node::Number => push(out, path, format!("expected a number, got {}", describe(value))),
        Node::Bool if value.is_boolean() => {}
        Node::Bool => push(out, path, format!("expected a boolean, got {}", describe(value))),
        Node::Null if value.is_null() => {}
        Node::Null => push(out, path, format!("expected null, got {}", describe(value))),
        Node::Literal(expected) if expected == value => {}
        Node::Literal(expected) => push(out, path, format!("expected {expected}, got {value}")),
        Node::Array(items) => match value.as_array() {
            Some(elements) => {
                for (i, element) in elements.iter().enumerate() {
                    check(items, element, &format!("{path}[{i}]"), out);
                }
            }
            None => push(out, path, format!("expected an array, got {}", describe(value))),
        },
        Node::Map(values) => match value.as_object() {
            Some(map) => {
                for (key, v) in map {
                    check(values, v, &format!("{path}.{key}"), out);
                }
            }
            None => push(out, path, format!("expected an object, got {}", describe(value))),
        },
        Node::Object {
            fields,
            order,
            open,
        } => {
            let Some(map) = value.as_object() else {
                push(out, path, format!("expected an object, got {}", describe(value)));
                return;
            };
            for name in order {
                let (shape, required) = &fields[name];
                match map.get(name) {
                    Some(v) => check(shape, v, &format!("{path}.{name}"), out),
                    None if *required => {
                        push(out, &format!("{path}.{name}"), "missing required key".into())
                    }
                    None => {}
                }
            }
            if !open {
                for key in map.keys().filter(|k| !fields.contains_key(*k)) {
                    push(out, &format!("{path}.{key}"), "unexpected key".into());
                }
            }
        }
        Node::OneOf(options) => {
            let matched = options.iter().any(|option| {
                let mut scratch = Vec::new();
                check(option, value, path, &mut scratch);
                scratch.is_empty()
            });
            if !matched {
                push(out, path, format!("{} matched none of {} alternatives", describe(value), options.len()));
            }
        }
    }
}

fn push(out: &mut Vec<Violation>, path: &str, problem: String) {
    out.push(Violation {
        path: path.to_string(),
        problem,
    });
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_f64() => "a float",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
