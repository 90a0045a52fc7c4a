//! Runtime object model validated by the engine
//!
//! Beans are shared behind `Arc<dyn Bean>` and compared by identity; every
//! other value is plain data. A bean may answer property reads itself through
//! [`Bean::property`], which the engine consults before a declared
//! [`Accessor`].
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// An object whose type declares constraints
pub trait Bean: Send + Sync + 'static {
    /// Name of the declaring type, used to look up metadata
    fn bean_type(&self) -> &str;

    /// Enhanced access: answer a property read directly
    ///
    /// Returning `None` falls back to the accessor declared for the property.
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Downcasting hook for typed accessors
    fn as_any(&self) -> &dyn Any;
}

/// A user-defined container type, resolved against registered value extractors
pub trait Container: Send + Sync + 'static {
    /// Name of the container type
    fn container_type(&self) -> &str;

    /// Downcasting hook for value extractors
    fn as_any(&self) -> &dyn Any;
}

/// Identity of a bean within one validation call
pub fn bean_identity(bean: &Arc<dyn Bean>) -> usize {
    Arc::as_ptr(bean) as *const () as usize
}

/// A runtime value
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Set(Vec<Value>),
    /// Ordered key/value pairs
    Map(Vec<(Value, Value)>),
    Optional(Option<Box<Value>>),
    Bean(Arc<dyn Bean>),
    Container(Arc<dyn Container>),
}

impl Value {
    /// Type name used for extractor resolution and error messages
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Text(_) => "Text",
            Value::List(_) => "List",
            Value::Set(_) => "Set",
            Value::Map(_) => "Map",
            Value::Optional(_) => "Optional",
            Value::Bean(bean) => bean.bean_type(),
            Value::Container(container) => container.container_type(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bean(&self) -> Option<&Arc<dyn Bean>> {
        match self {
            Value::Bean(bean) => Some(bean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view of `Int` and `Float` values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Element count of text (in chars) and collections
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Text(text) => Some(text.chars().count()),
            Value::List(items) | Value::Set(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// True for empty text and empty collections
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Build a `Value::Bean` from a concrete bean
    pub fn bean<B: Bean>(bean: B) -> Self {
        Value::Bean(Arc::new(bean))
    }

    /// Build a `Value::Text`
    pub fn text<S: Into<String>>(text: S) -> Self {
        Value::Text(text.into())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Optional(a), Value::Optional(b)) => a == b,
            (Value::Bean(a), Value::Bean(b)) => bean_identity(a) == bean_identity(b),
            (Value::Container(a), Value::Container(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Text(text) => write!(f, "Text({:?})", text),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Set(items) => f.debug_tuple("Set").field(items).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Value::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            // Beans may be cyclic, never recurse into them
            Value::Bean(bean) => write!(f, "Bean({}@{:#x})", bean.bean_type(), bean_identity(bean)),
            Value::Container(container) => write!(f, "Container({})", container.container_type()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(text) => write!(f, "{}", text),
            Value::List(items) | Value::Set(items) => {
                write!(f, "[")?;
                join(f, items)?;
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Optional(Some(inner)) => write!(f, "Optional[{}]", inner),
            Value::Optional(None) => write!(f, "Optional.empty"),
            Value::Bean(bean) => write!(f, "{}", bean.bean_type()),
            Value::Container(container) => write!(f, "{}", container.container_type()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<Arc<dyn Bean>> for Value {
    fn from(bean: Arc<dyn Bean>) -> Self {
        Value::Bean(bean)
    }
}

type AccessorFn = dyn Fn(&dyn Bean) -> Option<Value> + Send + Sync;

/// Reads the current value of a property from a bean
#[derive(Clone)]
pub struct Accessor(Arc<AccessorFn>);

impl Accessor {
    /// Wrap an untyped accessor function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn Bean) -> Option<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Build an accessor for a concrete bean type
    ///
    /// Reading from a bean of another type yields `None`.
    pub fn of<T, F>(f: F) -> Self
    where
        T: Bean,
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self::new(move |bean| bean.as_any().downcast_ref::<T>().map(|typed| f(typed)))
    }

    pub fn read(&self, bean: &dyn Bean) -> Option<Value> {
        (self.0)(bean)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Accessor")
    }
}

/// A bean backed by a property map
///
/// Properties can be replaced after construction, which makes back-references
/// (and therefore cyclic graphs) expressible.
pub struct DynamicBean {
    bean_type: String,
    properties: RwLock<BTreeMap<String, Value>>,
}

impl DynamicBean {
    pub fn new<S: Into<String>>(bean_type: S) -> Self {
        Self {
            bean_type: bean_type.into(),
            properties: RwLock::new(BTreeMap::new()),
        }
    }

    /// Builder-style property assignment
    pub fn with<K, V>(self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.set(name, value);
        self
    }

    /// Replace a property value
    pub fn set<K, V>(&self, name: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.properties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn into_arc(self) -> Arc<dyn Bean> {
        Arc::new(self)
    }
}

impl Bean for DynamicBean {
    fn bean_type(&self) -> &str {
        &self.bean_type
    }

    fn property(&self, name: &str) -> Option<Value> {
        Some(self.get(name).unwrap_or(Value::Null))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for DynamicBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let properties = self.properties.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("DynamicBean")
            .field("bean_type", &self.bean_type)
            .field("properties", &*properties)
            .finish()
    }
}
