//! Dynamic value model for host-native data.
//!
//! Hosts hand the framework opaque objects whose shape is only known at
//! runtime. [`Value`] is the common currency between a host and the canonical
//! model: primitives are carried inline, everything else is an [`ObjectRef`]
//! that can be read by field or accessor name.
//!
//! Canonical objects (for example [`User`](crate::User)) implement [`Object`]
//! as well, so transformer outputs travel through the same channel and are
//! recovered with [`FromValue`].

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{ValueError, ValueResult};

/// Shared handle to a dynamic object.
pub type ObjectRef = Arc<dyn Object>;

// =============================================================================
// TypeKey
// =============================================================================

/// Name of a runtime type, as seen by the transformer registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Cow<'static, str>);

impl TypeKey {
    /// Satisfied by every value.
    pub const ANY: TypeKey = TypeKey::from_static("any");
    /// Type of [`Value::Null`].
    pub const NULL: TypeKey = TypeKey::from_static("null");
    /// Type of [`Value::Bool`].
    pub const BOOL: TypeKey = TypeKey::from_static("bool");
    /// Type of [`Value::Int`].
    pub const INT: TypeKey = TypeKey::from_static("int");
    /// Type of [`Value::Float`].
    pub const FLOAT: TypeKey = TypeKey::from_static("float");
    /// Type of [`Value::Str`].
    pub const STRING: TypeKey = TypeKey::from_static("string");
    /// Type of [`Value::List`].
    pub const LIST: TypeKey = TypeKey::from_static("list");

    /// Creates a key from a static string.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates a key from any string.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Returns the type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TypeKey {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

// =============================================================================
// Object
// =============================================================================

/// A dynamically typed object living on the host side (or a canonical object
/// travelling through the dynamic channel).
pub trait Object: Any + Send + Sync {
    /// Fully qualified runtime type name.
    fn type_name(&self) -> &str;

    /// Field-like lookup. Returns `None` when the object has no such field.
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Accessor-like lookup (a zero-argument method). Returns `None` when the
    /// object has no such accessor.
    fn call(&self, _accessor: &str) -> Option<Value> {
        None
    }

    /// Writes a field back into the object. Returns `false` if the object has
    /// no writable field with that name.
    fn set_field(&self, _name: &str, _value: Value) -> bool {
        false
    }

    /// Returns `self` as `&dyn Any` for downcasting by reference.
    fn as_any(&self) -> &dyn Any;

    /// Converts the shared handle into `Arc<dyn Any>` for owned downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A canonical object type with a fixed runtime type name.
///
/// Lets generic code (bridge transformers, for instance) name the type key of
/// `T` without holding an instance.
pub trait Canonical: Object {
    /// Runtime type name of every instance.
    const TYPE: TypeKey;
}

/// Implements [`Object`] and [`Canonical`] for a canonical type that only
/// needs a type name.
#[macro_export]
macro_rules! canonical_object {
    ($ty:ty, $name:expr) => {
        impl $crate::Canonical for $ty {
            const TYPE: $crate::TypeKey = $crate::TypeKey::from_static($name);
        }

        impl $crate::Object for $ty {
            fn type_name(&self) -> &str {
                $name
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::sync::Arc<dyn ::std::any::Any + Send + Sync> {
                self
            }
        }
    };
}

// =============================================================================
// Value
// =============================================================================

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Str(String),
    /// Ordered list.
    List(Vec<Value>),
    /// Opaque object.
    Object(ObjectRef),
}

impl Value {
    /// Wraps an object into a value.
    pub fn object<T: Object>(object: T) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Returns the runtime type of this value.
    pub fn type_key(&self) -> TypeKey {
        match self {
            Self::Null => TypeKey::NULL,
            Self::Bool(_) => TypeKey::BOOL,
            Self::Int(_) => TypeKey::INT,
            Self::Float(_) => TypeKey::FLOAT,
            Self::Str(_) => TypeKey::STRING,
            Self::List(_) => TypeKey::LIST,
            Self::Object(obj) => TypeKey::new(obj.type_name().to_owned()),
        }
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric content as a float. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the boolean content, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the list content, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the object, if this is an object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrows the object as a concrete type.
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.as_object()?.as_any().downcast_ref::<T>()
    }

    /// Takes the object as a concrete shared type.
    pub fn downcast<T: Object>(self) -> Option<Arc<T>> {
        match self {
            Self::Object(obj) => obj.into_any().downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Float(x) => write!(f, "Float({x})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Object(obj) => write!(f, "Object({})", obj.type_name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// =============================================================================
// FromValue
// =============================================================================

/// Conversion from a dynamic [`Value`] into a canonical field type.
pub trait FromValue: Sized {
    /// Converts the value.
    fn from_value(value: Value) -> ValueResult<Self>;

    /// Value used when a platform-specific field is absent on the host.
    ///
    /// Types without a natural empty value return `None`, which makes an
    /// absent field a conversion error.
    fn absent() -> Option<Self> {
        None
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> ValueResult<Self> {
        Ok(value)
    }

    fn absent() -> Option<Self> {
        Some(Value::Null)
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: Value) -> ValueResult<Self> {
        match value {
            Value::Object(obj) => Ok(obj),
            other => Err(ValueError::mismatch("object", other.type_key())),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> ValueResult<Self> {
        value
            .as_bool()
            .ok_or_else(|| ValueError::mismatch("bool", value.type_key()))
    }

    fn absent() -> Option<Self> {
        Some(false)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> ValueResult<Self> {
        value
            .as_int()
            .ok_or_else(|| ValueError::mismatch("int", value.type_key()))
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> ValueResult<Self> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide).map_err(|e| ValueError::invalid("i32", e.to_string()))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> ValueResult<Self> {
        value
            .as_float()
            .ok_or_else(|| ValueError::mismatch("float", value.type_key()))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> ValueResult<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> ValueResult<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(ValueError::mismatch("string", other.type_key())),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> ValueResult<Self> {
        let raw = String::from_value(value)?;
        Uuid::parse_str(&raw).map_err(|e| ValueError::invalid("uuid", e.to_string()))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> ValueResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn absent() -> Option<Self> {
        Some(None)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> ValueResult<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ValueError::mismatch("list", other.type_key())),
        }
    }

    fn absent() -> Option<Self> {
        Some(Vec::new())
    }
}

/// Implements [`FromValue`] for a cloneable canonical [`Object`] by downcasting.
#[macro_export]
macro_rules! from_object_value {
    ($ty:ty, $expected:expr) => {
        impl $crate::FromValue for $ty {
            fn from_value(value: $crate::Value) -> $crate::ValueResult<Self> {
                let found = value.type_key();
                value
                    .downcast::<$ty>()
                    .map(|shared| (*shared).clone())
                    .ok_or_else(|| $crate::ValueError::mismatch($expected, found))
            }
        }
    };
}
