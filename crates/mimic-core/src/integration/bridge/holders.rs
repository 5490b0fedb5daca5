//! Resolved host handles, one holder per bridged leaf type.
//!
//! Holders only resolve. They never call into the host while being built, so
//! building one twice is wasteful but harmless.

use crate::error::{BridgeInitError, BridgeResult, ValueError};
use crate::foundation::resolver::{
    HostFunction, HostMethod, HostType, require_constant, require_function, require_method,
};
use crate::foundation::value::{FromValue, Value};

use super::{BridgedType, translation};

/// Invokes a host function, scoping failures to the current conversion.
pub(super) fn invoke(
    bridged: BridgedType,
    function: &HostFunction,
    args: &[Value],
) -> BridgeResult<Value> {
    function(args).map_err(|err| translation(bridged, err))
}

/// Invokes a zero-argument host method on `receiver`.
pub(super) fn read(
    bridged: BridgedType,
    method: &HostMethod,
    receiver: &Value,
) -> BridgeResult<Value> {
    method(receiver, &[]).map_err(|err| translation(bridged, err))
}

/// Converts a host result into a canonical primitive.
pub(super) fn expect<T: FromValue>(bridged: BridgedType, value: Value) -> BridgeResult<T> {
    T::from_value(value).map_err(|err| translation(bridged, err))
}

// =============================================================================
// Enums
// =============================================================================

/// A host enum looked up by constant name.
pub(crate) struct EnumHolder {
    pub(crate) host_type: String,
    bridged: BridgedType,
    value_of: HostFunction,
    name: HostMethod,
}

impl EnumHolder {
    fn build(bridged: BridgedType, ty: &dyn HostType) -> Result<Self, BridgeInitError> {
        Ok(Self {
            host_type: ty.name().to_owned(),
            bridged,
            value_of: require_function(ty, "valueOf")?,
            name: require_method(ty, "name")?,
        })
    }

    /// Returns the host constant named `name`.
    pub(crate) fn to_host(&self, name: &str) -> BridgeResult<Value> {
        invoke(self.bridged, &self.value_of, &[Value::from(name)])
    }

    /// Returns the canonical constant matching a host constant.
    pub(crate) fn from_host<T>(&self, value: &Value) -> BridgeResult<T>
    where
        T: std::str::FromStr<Err = ValueError>,
    {
        let name: String = expect(self.bridged, read(self.bridged, &self.name, value)?)?;
        name.parse().map_err(|err| translation(self.bridged, err))
    }
}

// =============================================================================
// Leaf Holders
// =============================================================================

pub(crate) struct KeyHolder {
    pub(crate) host_type: String,
    pub(crate) create: HostFunction,
    pub(crate) namespace: HostMethod,
    pub(crate) value: HostMethod,
}

impl KeyHolder {
    pub(super) fn build(ty: &dyn HostType) -> Result<Self, BridgeInitError> {
        Ok(Self {
            host_type: ty.name().to_owned(),
            create: require_function(ty, "key")?,
            namespace: require_method(ty, "namespace")?,
            value: require_method(ty, "value")?,
        })
    }
}

/// Rich text goes through the host's JSON serializer.
pub(crate) struct ComponentHolder {
    pub(crate) host_type: String,
    pub(crate) deserialize: HostFunction,
    pub(crate) serialize: HostFunction,
}

impl ComponentHolder {
    pub(super) fn build(
        ty: &dyn HostType,
        serializer: &dyn HostType,
    ) -> Result<Self, BridgeInitError> {
        Ok(Self {
            host_type: ty.name().to_owned(),
            deserialize: require_function(serializer, "deserialize")?,
            serialize: require_function(serializer, "serialize")?,
        })
    }
}

pub(crate) struct TimesHolder {
    pub(crate) host_type: String,
    pub(crate) create: HostFunction,
    pub(crate) fade_in: HostMethod,
    pub(crate) stay: HostMethod,
    pub(crate) fade_out: HostMethod,
}

impl TimesHolder {
    pub(super) fn build(ty: &dyn HostType) -> Result<Self, BridgeInitError> {
        Ok(Self {
            host_type: ty.name().to_owned(),
            create: require_function(ty, "times")?,
            fade_in: require_method(ty, "fadeIn")?,
            stay: require_method(ty, "stay")?,
            fade_out: require_method(ty, "fadeOut")?,
        })
    }
}

/// Title parts are host singletons compared by identity.
pub(crate) struct TitlePartHolder {
    pub(crate) host_type: String,
    pub(crate) title: Value,
    pub(crate) subtitle: Value,
    pub(crate) times: Value,
}

impl TitlePartHolder {
    pub(super) fn build(ty: &dyn HostType) -> Result<Self, BridgeInitError> {
        Ok(Self {
            host_type: ty.name().to_owned(),
            title: require_constant(ty, "TITLE")?,
            subtitle: require_constant(ty, "SUBTITLE")?,
            times: require_constant(ty, "TIMES")?,
        })
    }
}

pub(crate) struct TitleHolder {
    pub(crate) host_type: String,
    pub(crate) create: HostFunction,
    pub(crate) title: HostMethod,
    pub(crate) subtitle: HostMethod,
    pub(crate) times: HostMethod,
}

impl TitleHolder {
    pub(super) fn build(ty: &dyn HostType) -> Result<Self, BridgeInitError> {
        Ok(Self {
            host_type: ty.name().to_owned(),
            create: require_function(ty, "title")?,
            title: require_method(ty, "title")?,
            subtitle: require_method(ty, "subtitle")?,
            times: require_method(ty, "times")?,
        })
    }
}

pub(crate) struct BossBarHolder {
    pub(crate) host_type: String,
    pub(crate) create: HostFunction,
    pub(crate) name: HostMethod,
    pub(crate) progress: HostMethod,
    pub(crate) color_of: HostMethod,
    pub(crate) overlay_of: HostMethod,
    pub(crate) flags_of: HostMethod,
    pub(crate) color: EnumHolder,
    pub(crate) overlay: EnumHolder,
    pub(crate) flag: EnumHolder,
}

impl BossBarHolder {
    pub(super) fn build(
        ty: &dyn HostType,
        color: &dyn HostType,
        overlay: &dyn HostType,
        flag: &dyn HostType,
    ) -> Result<Self, BridgeInitError> {
        Ok(Self {
            host_type: ty.name().to_owned(),
            create: require_function(ty, "bossBar")?,
            name: require_method(ty, "name")?,
            progress: require_method(ty, "progress")?,
            color_of: require_method(ty, "color")?,
            overlay_of: require_method(ty, "overlay")?,
            flags_of: require_method(ty, "flags")?,
            color: EnumHolder::build(BridgedType::BossBarColor, color)?,
            overlay: EnumHolder::build(BridgedType::BossBarOverlay, overlay)?,
            flag: EnumHolder::build(BridgedType::BossBarFlag, flag)?,
        })
    }
}

pub(crate) struct SoundHolder {
    pub(crate) host_type: String,
    pub(crate) create: HostFunction,
    pub(crate) name: HostMethod,
    pub(crate) source_of: HostMethod,
    pub(crate) volume: HostMethod,
    pub(crate) pitch: HostMethod,
    pub(crate) source: EnumHolder,
}

impl SoundHolder {
    pub(super) fn build(ty: &dyn HostType, source: &dyn HostType) -> Result<Self, BridgeInitError> {
        Ok(Self {
            host_type: ty.name().to_owned(),
            create: require_function(ty, "sound")?,
            name: require_method(ty, "name")?,
            source_of: require_method(ty, "source")?,
            volume: require_method(ty, "volume")?,
            pitch: require_method(ty, "pitch")?,
            source: EnumHolder::build(BridgedType::SoundSource, source)?,
        })
    }
}

pub(crate) struct SoundStopHolder {
    pub(crate) host_type: String,
    pub(crate) all: HostFunction,
    pub(crate) named: HostFunction,
    pub(crate) source: HostFunction,
    pub(crate) named_on_source: HostFunction,
    pub(crate) sound_of: HostMethod,
    pub(crate) source_of: HostMethod,
}

impl SoundStopHolder {
    pub(super) fn build(ty: &dyn HostType) -> Result<Self, BridgeInitError> {
        Ok(Self {
            host_type: ty.name().to_owned(),
            all: require_function(ty, "all")?,
            named: require_function(ty, "named")?,
            source: require_function(ty, "source")?,
            named_on_source: require_function(ty, "namedOnSource")?,
            sound_of: require_method(ty, "sound")?,
            source_of: require_method(ty, "source")?,
        })
    }
}

pub(crate) struct BookHolder {
    pub(crate) host_type: String,
    pub(crate) create: HostFunction,
    pub(crate) title: HostMethod,
    pub(crate) author: HostMethod,
    pub(crate) pages: HostMethod,
}

impl BookHolder {
    pub(super) fn build(ty: &dyn HostType) -> Result<Self, BridgeInitError> {
        Ok(Self {
            host_type: ty.name().to_owned(),
            create: require_function(ty, "book")?,
            title: require_method(ty, "title")?,
            author: require_method(ty, "author")?,
            pages: require_method(ty, "pages")?,
        })
    }
}

/// Maps a host `null` to `None` before converting.
pub(super) fn optional<T>(
    value: Value,
    convert: impl FnOnce(&Value) -> BridgeResult<T>,
) -> BridgeResult<Option<T>> {
    if value.is_null() {
        Ok(None)
    } else {
        convert(&value).map(Some)
    }
}

