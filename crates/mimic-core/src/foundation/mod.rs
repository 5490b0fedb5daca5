//! Foundation layer: the dynamic value model, host type resolution, mapping
//! descriptors and canonical user objects.

pub mod mapping;
pub mod resolver;
pub mod user;
pub mod value;

pub use mapping::{FieldSpec, Mapped, MappedFields, MappingSpec, SourceName, TransformSpec};
pub use resolver::{HostFunction, HostMethod, HostType, TypeResolver};
pub use user::{GameMode, User};
pub use value::{Canonical, FromValue, Object, ObjectRef, TypeKey, Value};
