//! Mapping descriptors for canonical objects.
//!
//! A [`MappingSpec`] lists, per canonical field, where the value may be found
//! on a host-native object and how it is converted. Specs are normally
//! generated by `#[derive(MappedEvent)]` and cached for the lifetime of the
//! process.

use crate::error::{MappingError, MappingResult};
use crate::foundation::value::{FromValue, TypeKey, Value};

// =============================================================================
// Source Names
// =============================================================================

/// One candidate location of a field on a host object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceName {
    /// A field, looked up with [`Object::field`](crate::Object::field).
    Field(&'static str),
    /// An accessor, looked up with [`Object::call`](crate::Object::call).
    Accessor(&'static str),
}

impl SourceName {
    /// Parses a raw alias. A trailing `()` marks an accessor.
    pub fn parse(raw: &'static str) -> Self {
        match raw.strip_suffix("()") {
            Some(name) => Self::Accessor(name),
            None => Self::Field(raw),
        }
    }

    /// Returns the bare name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Field(name) | Self::Accessor(name) => name,
        }
    }

    /// Returns `true` for field-like sources.
    pub fn is_field(&self) -> bool {
        matches!(self, Self::Field(_))
    }
}

// =============================================================================
// Specs
// =============================================================================

/// Transform applied to a resolved field value.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSpec {
    pub to: TypeKey,
    pub data: &'static [&'static str],
}

impl TransformSpec {
    /// Creates a transform to `to` without parameters.
    pub fn new(to: impl Into<TypeKey>) -> Self {
        Self {
            to: to.into(),
            data: &[],
        }
    }

    /// Sets free-form string parameters passed to the transformer.
    pub fn data(mut self, data: &'static [&'static str]) -> Self {
        self.data = data;
        self
    }
}

/// Mapping of a single canonical field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub sources: Vec<SourceName>,
    pub platform_specific: bool,
    pub transform: Option<TransformSpec>,
}

impl FieldSpec {
    /// Creates a field mapping from its raw aliases.
    pub fn new(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            aliases,
            sources: aliases.iter().copied().map(SourceName::parse).collect(),
            platform_specific: false,
            transform: None,
        }
    }

    /// Marks the field as absent on some hosts.
    pub fn platform_specific(mut self) -> Self {
        self.platform_specific = true;
        self
    }

    /// Attaches a transform.
    pub fn transform(mut self, transform: TransformSpec) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Field-like sources in declaration order, followed by accessor-like
    /// sources in declaration order.
    pub fn lookup_order(&self) -> impl Iterator<Item = &SourceName> {
        let fields = self.sources.iter().filter(|s| s.is_field());
        let accessors = self.sources.iter().filter(|s| !s.is_field());
        fields.chain(accessors)
    }
}

/// Mapping of a whole canonical object.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingSpec {
    pub target: &'static str,
    pub natives: &'static [&'static str],
    pub fields: Vec<FieldSpec>,
}

impl MappingSpec {
    /// Creates an empty spec for `target`.
    pub fn new(target: &'static str) -> Self {
        Self {
            target,
            natives: &[],
            fields: Vec::new(),
        }
    }

    /// Sets the host-native type names this object is built from.
    pub fn natives(mut self, natives: &'static [&'static str]) -> Self {
        self.natives = natives;
        self
    }

    /// Appends a field mapping.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Looks a field mapping up by canonical name.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// =============================================================================
// Resolved Fields
// =============================================================================

/// Field values resolved by the mapper, in spec order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedFields {
    values: Vec<(&'static str, Value)>,
}

impl MappedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a resolved value.
    pub fn insert(&mut self, name: &'static str, value: Value) {
        self.values.push((name, value));
    }

    /// Borrows a resolved value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// Takes a field and converts it into its canonical type.
    ///
    /// An absent field (never resolved, or resolved to [`Value::Null`]) takes
    /// the type's [`FromValue::absent`] value when it has one.
    pub fn take<T: FromValue>(&mut self, name: &'static str) -> MappingResult<T> {
        let value = self
            .values
            .iter_mut()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| std::mem::take(value))
            .unwrap_or_default();
        if value.is_null() {
            if let Some(absent) = T::absent() {
                return Ok(absent);
            }
        }
        T::from_value(value).map_err(|source| MappingError::Value {
            field: name,
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A canonical type that can be built from a host object.
pub trait Mapped: Sized {
    /// The cached mapping spec.
    fn mapping_spec() -> &'static MappingSpec;

    /// Builds the value from resolved fields.
    fn from_fields(fields: MappedFields) -> MappingResult<Self>;
}
