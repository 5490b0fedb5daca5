//! The host's own copy of the presentation family.
//!
//! Types are laid out like the Adventure library: `key.Key`,
//! `text.Component`, `title.Title$Times`, `bossbar.BossBar$Color` and so on,
//! under a configurable package prefix.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use mimic_core::{
    BossBarColor, BossBarFlag, BossBarOverlay, HostCallError, HostFunction, HostMethod,
    HostResult, HostType, SoundSource, TitlePart, Value,
};

use crate::object::{MockObject, receiver};

// =============================================================================
// MockType
// =============================================================================

/// A host type assembled from closures.
pub struct MockType {
    name: String,
    functions: HashMap<String, HostFunction>,
    methods: HashMap<String, HostMethod>,
    constants: HashMap<String, Value>,
}

impl MockType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: HashMap::new(),
            methods: HashMap::new(),
            constants: HashMap::new(),
        }
    }

    pub fn with_function<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> HostResult<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.to_owned(), Arc::new(f));
        self
    }

    pub fn with_method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> HostResult<Value> + Send + Sync + 'static,
    {
        self.methods.insert(name.to_owned(), Arc::new(f));
        self
    }

    /// Adds a method returning the receiver's field of the same name.
    pub fn with_getter(self, name: &str) -> Self {
        let field = name.to_owned();
        self.with_method(name, move |this, _| Ok(receiver(this)?.get(&field)))
    }

    /// Adds a static function that builds an instance, taking `fields` as
    /// positional arguments.
    pub fn with_constructor(self, name: &str, fields: &'static [&'static str]) -> Self {
        let type_name = self.name.clone();
        let function = name.to_owned();
        self.with_function(name, move |args| {
            if args.len() != fields.len() {
                return Err(HostCallError::new(format!(
                    "{type_name}.{function} takes {} arguments, got {}",
                    fields.len(),
                    args.len()
                )));
            }
            let object = fields
                .iter()
                .zip(args)
                .fold(MockObject::new(type_name.clone()), |object, (field, arg)| {
                    object.with_field(*field, arg.clone())
                });
            Ok(object.into_value())
        })
    }

    pub fn with_constant(mut self, name: &str, value: Value) -> Self {
        self.constants.insert(name.to_owned(), value);
        self
    }
}

impl HostType for MockType {
    fn name(&self) -> &str {
        &self.name
    }

    fn function(&self, name: &str) -> Option<HostFunction> {
        self.functions.get(name).cloned()
    }

    fn method(&self, name: &str) -> Option<HostMethod> {
        self.methods.get(name).cloned()
    }

    fn constant(&self, name: &str) -> Option<Value> {
        self.constants.get(name).cloned()
    }
}

impl fmt::Debug for MockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockType")
            .field("name", &self.name)
            .field("functions", &self.functions.len())
            .field("methods", &self.methods.len())
            .field("constants", &self.constants.len())
            .finish()
    }
}

// =============================================================================
// Presentation types
// =============================================================================

/// An enum type whose constants are interned objects with a `name()` method.
fn enum_type<'a>(name: String, constants: impl IntoIterator<Item = &'a str>) -> MockType {
    let values: HashMap<String, Value> = constants
        .into_iter()
        .map(|constant| {
            let value = MockObject::new(name.clone())
                .with_field("name", constant)
                .into_value();
            (constant.to_owned(), value)
        })
        .collect();

    let lookup = values.clone();
    let type_name = name.clone();
    let mut ty = MockType::new(name)
        .with_function("valueOf", move |args| {
            let constant = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| HostCallError::new("valueOf expects a string"))?;
            lookup.get(constant).cloned().ok_or_else(|| {
                HostCallError::new(format!("no constant {constant} in {type_name}"))
            })
        })
        .with_getter("name");
    for (constant, value) in values {
        ty = ty.with_constant(&constant, value);
    }
    ty
}

fn string_arg<'a>(args: &'a [Value], index: usize, what: &str) -> HostResult<&'a str> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| HostCallError::new(format!("{what} must be a string")))
}

fn key_type(prefix: &str) -> MockType {
    let type_name = format!("{prefix}.key.Key");
    let owned = type_name.clone();
    MockType::new(type_name)
        .with_function("key", move |args| {
            let namespace = string_arg(args, 0, "namespace")?;
            let value = string_arg(args, 1, "value")?;
            Ok(MockObject::new(owned.clone())
                .with_field("namespace", namespace)
                .with_field("value", value)
                .into_value())
        })
        .with_getter("namespace")
        .with_getter("value")
}

/// Components are stored as their JSON interchange form.
fn component_types(prefix: &str) -> [MockType; 2] {
    let component = format!("{prefix}.text.Component");
    let owned = component.clone();
    let serializer = MockType::new(format!("{prefix}.text.serializer.JsonComponentSerializer"))
        .with_function("deserialize", move |args| {
            let json = string_arg(args, 0, "json")?;
            serde_json::from_str::<serde_json::Value>(json)
                .map_err(|err| HostCallError::new(format!("malformed component: {err}")))?;
            Ok(MockObject::new(owned.clone())
                .with_field("json", json)
                .into_value())
        })
        .with_function("serialize", |args| {
            let component = args
                .first()
                .ok_or_else(|| HostCallError::new("serialize expects a component"))?;
            Ok(receiver(component)?.get("json"))
        });
    [MockType::new(component), serializer]
}

fn title_part_type(prefix: &str) -> MockType {
    let type_name = format!("{prefix}.title.TitlePart");
    TitlePart::ALL
        .iter()
        .fold(MockType::new(type_name.clone()), |ty, part| {
            let constant = MockObject::new(type_name.clone())
                .with_field("name", part.as_str())
                .into_value();
            ty.with_constant(part.as_str(), constant)
        })
}

fn sound_stop_type(prefix: &str) -> MockType {
    let type_name = format!("{prefix}.sound.SoundStop");
    let stop = move |sound: Value, source: Value| {
        MockObject::new(type_name.clone())
            .with_field("sound", sound)
            .with_field("source", source)
            .into_value()
    };
    let all = stop.clone();
    let named = stop.clone();
    let source = stop.clone();
    let named_on_source = stop;

    let arg = |args: &[Value], index: usize| args.get(index).cloned().unwrap_or_default();
    MockType::new(format!("{prefix}.sound.SoundStop"))
        .with_function("all", move |_| Ok(all(Value::Null, Value::Null)))
        .with_function("named", move |args| Ok(named(arg(args, 0), Value::Null)))
        .with_function("source", move |args| Ok(source(Value::Null, arg(args, 0))))
        .with_function("namedOnSource", move |args| {
            Ok(named_on_source(arg(args, 0), arg(args, 1)))
        })
        .with_getter("sound")
        .with_getter("source")
}

/// Every presentation type under `prefix` (for example `"adventure"`).
pub fn adventure_types(prefix: &str) -> Vec<MockType> {
    let [component, serializer] = component_types(prefix);
    vec![
        key_type(prefix),
        component,
        serializer,
        MockType::new(format!("{prefix}.title.Title"))
            .with_constructor("title", &["title", "subtitle", "times"])
            .with_getter("title")
            .with_getter("subtitle")
            .with_getter("times"),
        MockType::new(format!("{prefix}.title.Title$Times"))
            .with_constructor("times", &["fadeIn", "stay", "fadeOut"])
            .with_getter("fadeIn")
            .with_getter("stay")
            .with_getter("fadeOut"),
        title_part_type(prefix),
        MockType::new(format!("{prefix}.bossbar.BossBar"))
            .with_constructor("bossBar", &["name", "progress", "color", "overlay", "flags"])
            .with_getter("name")
            .with_getter("progress")
            .with_getter("color")
            .with_getter("overlay")
            .with_getter("flags"),
        enum_type(
            format!("{prefix}.bossbar.BossBar$Color"),
            BossBarColor::ALL.iter().map(|c| c.as_str()),
        ),
        enum_type(
            format!("{prefix}.bossbar.BossBar$Overlay"),
            BossBarOverlay::ALL.iter().map(|o| o.as_str()),
        ),
        enum_type(
            format!("{prefix}.bossbar.BossBar$Flag"),
            BossBarFlag::ALL.iter().map(|f| f.as_str()),
        ),
        MockType::new(format!("{prefix}.sound.Sound"))
            .with_constructor("sound", &["name", "source", "volume", "pitch"])
            .with_getter("name")
            .with_getter("source")
            .with_getter("volume")
            .with_getter("pitch"),
        enum_type(
            format!("{prefix}.sound.Sound$Source"),
            SoundSource::ALL.iter().map(|s| s.as_str()),
        ),
        sound_stop_type(prefix),
        MockType::new(format!("{prefix}.inventory.Book"))
            .with_constructor("book", &["title", "author", "pages"])
            .with_getter("title")
            .with_getter("author")
            .with_getter("pages"),
    ]
}
