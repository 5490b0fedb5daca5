//! Cross-runtime bridge for presentation types.
//!
//! Hosts ship their own copy of the presentation family (rich text, keys,
//! titles, boss bars, sounds, books). The copies are structurally identical to
//! the canonical types in [`presentation`](crate::presentation) but nominally
//! distinct, and which one is present is only known at runtime.
//!
//! The [`Bridge`] converts between the two. For every bridged leaf type it
//! holds a lazily built holder with the resolved host constructors, accessors
//! and enum lookups:
//!
//! ```text
//! canonical value ──▶ Bridged::to_host ──▶ holder (OnceLock) ──▶ host ctor
//!                                              │
//!                          first use: TypeResolver::resolve_first(candidates)
//! ```
//!
//! Rich text is the one open-ended recursive type. It is not walked by hand:
//! the canonical tree is serialized to its JSON interchange form and the
//! host's own serializer parses it.
//!
//! # Failure policy
//!
//! A holder that cannot be built (missing type, function, method or constant)
//! is a packaging or version defect. The failure is logged at `error` level
//! once, cached, and returned as [`BridgeError::Init`] on every later use. A
//! failure of one conversion call is reported as
//! [`BridgeError::Translation`] and affects that call only.

mod convert;
mod holders;

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{BridgeError, BridgeInitError, BridgeResult};
use crate::foundation::resolver::{HostType, TypeResolver};
use crate::foundation::value::{TypeKey, Value};

use holders::{
    BookHolder, BossBarHolder, ComponentHolder, KeyHolder, SoundHolder, SoundStopHolder,
    TimesHolder, TitleHolder, TitlePartHolder,
};

// =============================================================================
// Bridged Types
// =============================================================================

/// Identifies a bridged presentation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgedType {
    Key,
    Component,
    Title,
    TitleTimes,
    TitlePart,
    BossBar,
    BossBarColor,
    BossBarOverlay,
    BossBarFlag,
    Sound,
    SoundSource,
    SoundStop,
    Book,
}

impl BridgedType {
    /// Every bridged type.
    pub const ALL: [BridgedType; 13] = [
        Self::Key,
        Self::Component,
        Self::Title,
        Self::TitleTimes,
        Self::TitlePart,
        Self::BossBar,
        Self::BossBarColor,
        Self::BossBarOverlay,
        Self::BossBarFlag,
        Self::Sound,
        Self::SoundSource,
        Self::SoundStop,
        Self::Book,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Component => "component",
            Self::Title => "title",
            Self::TitleTimes => "title_times",
            Self::TitlePart => "title_part",
            Self::BossBar => "boss_bar",
            Self::BossBarColor => "boss_bar_color",
            Self::BossBarOverlay => "boss_bar_overlay",
            Self::BossBarFlag => "boss_bar_flag",
            Self::Sound => "sound",
            Self::SoundSource => "sound_source",
            Self::SoundStop => "sound_stop",
            Self::Book => "book",
        }
    }
}

impl fmt::Display for BridgedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical presentation type that has a host counterpart.
pub trait Bridged: Sized {
    /// Which bridge this type goes through.
    const BRIDGED: BridgedType;

    /// Converts the canonical value into the host's copy.
    fn to_host(&self, bridge: &Bridge) -> BridgeResult<Value>;

    /// Converts a host value into the canonical copy.
    fn from_host(value: &Value, bridge: &Bridge) -> BridgeResult<Self>;
}

// =============================================================================
// Configuration
// =============================================================================

/// Ordered host type names to try, per bridged type.
///
/// The first name the resolver can load wins, so one canonical definition can
/// target several mutually exclusive hosts. Nested enum types are not listed:
/// they are resolved as `<parent>$<Enum>` from the type that was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub key: Vec<String>,
    pub component: Vec<String>,
    pub component_serializer: Vec<String>,
    pub title: Vec<String>,
    pub title_times: Vec<String>,
    pub title_part: Vec<String>,
    pub boss_bar: Vec<String>,
    pub sound: Vec<String>,
    pub sound_stop: Vec<String>,
    pub book: Vec<String>,
}

fn candidates(path: &str) -> Vec<String> {
    vec![format!("adventure.{path}"), format!("shaded.adventure.{path}")]
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            key: candidates("key.Key"),
            component: candidates("text.Component"),
            component_serializer: candidates("text.serializer.JsonComponentSerializer"),
            title: candidates("title.Title"),
            title_times: candidates("title.Title$Times"),
            title_part: candidates("title.TitlePart"),
            boss_bar: candidates("bossbar.BossBar"),
            sound: candidates("sound.Sound"),
            sound_stop: candidates("sound.SoundStop"),
            book: candidates("inventory.Book"),
        }
    }
}

impl BridgeConfig {
    /// Returns every configured candidate list with the type it belongs to.
    pub fn entries(&self) -> [(&'static str, &[String]); 10] {
        [
            ("key", self.key.as_slice()),
            ("component", self.component.as_slice()),
            ("component_serializer", self.component_serializer.as_slice()),
            ("title", self.title.as_slice()),
            ("title_times", self.title_times.as_slice()),
            ("title_part", self.title_part.as_slice()),
            ("boss_bar", self.boss_bar.as_slice()),
            ("sound", self.sound.as_slice()),
            ("sound_stop", self.sound_stop.as_slice()),
            ("book", self.book.as_slice()),
        ]
    }
}

// =============================================================================
// Bridge
// =============================================================================

type Holder<T> = OnceLock<Result<Arc<T>, BridgeInitError>>;

/// Converts presentation values between the canonical and the host copy.
///
/// One bridge is owned by each framework instance. Holders are built on first
/// use and are immutable afterwards, so the bridge is freely shareable.
pub struct Bridge {
    resolver: Arc<dyn TypeResolver>,
    config: BridgeConfig,
    key: Holder<KeyHolder>,
    component: Holder<ComponentHolder>,
    title: Holder<TitleHolder>,
    title_times: Holder<TimesHolder>,
    title_part: Holder<TitlePartHolder>,
    boss_bar: Holder<BossBarHolder>,
    sound: Holder<SoundHolder>,
    sound_stop: Holder<SoundStopHolder>,
    book: Holder<BookHolder>,
}

impl Bridge {
    /// Creates a bridge over the given resolver.
    pub fn new(resolver: Arc<dyn TypeResolver>, config: BridgeConfig) -> Self {
        Self {
            resolver,
            config,
            key: OnceLock::new(),
            component: OnceLock::new(),
            title: OnceLock::new(),
            title_times: OnceLock::new(),
            title_part: OnceLock::new(),
            boss_bar: OnceLock::new(),
            sound: OnceLock::new(),
            sound_stop: OnceLock::new(),
            book: OnceLock::new(),
        }
    }

    /// Returns the resolver.
    pub fn resolver(&self) -> &Arc<dyn TypeResolver> {
        &self.resolver
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns the host platform name.
    pub fn platform(&self) -> &str {
        self.resolver.platform()
    }

    /// Converts a canonical value into the host's copy.
    pub fn to_host<T: Bridged>(&self, value: &T) -> BridgeResult<Value> {
        value.to_host(self)
    }

    /// Converts a host value into the canonical copy.
    pub fn from_host<T: Bridged>(&self, value: &Value) -> BridgeResult<T> {
        T::from_host(value, self)
    }

    /// Builds every holder now, returning the first failure.
    ///
    /// Calling this during startup turns a version mismatch into an early,
    /// loud error instead of a failure on the first conversion.
    pub fn load(&self) -> BridgeResult<()> {
        for bridged in BridgedType::ALL {
            self.host_type(bridged)?;
        }
        Ok(())
    }

    /// Returns `true` if the bridge for `bridged` is usable on this host.
    pub fn is_available(&self, bridged: BridgedType) -> bool {
        self.host_type(bridged).is_ok()
    }

    /// Returns the fully qualified host type name used for `bridged`.
    pub fn host_type(&self, bridged: BridgedType) -> BridgeResult<String> {
        let name = match bridged {
            BridgedType::Key => self.key_holder()?.host_type.clone(),
            BridgedType::Component => self.component_holder()?.host_type.clone(),
            BridgedType::Title => self.title_holder()?.host_type.clone(),
            BridgedType::TitleTimes => self.times_holder()?.host_type.clone(),
            BridgedType::TitlePart => self.title_part_holder()?.host_type.clone(),
            BridgedType::BossBar => self.boss_bar_holder()?.host_type.clone(),
            BridgedType::BossBarColor => self.boss_bar_holder()?.color.host_type.clone(),
            BridgedType::BossBarOverlay => self.boss_bar_holder()?.overlay.host_type.clone(),
            BridgedType::BossBarFlag => self.boss_bar_holder()?.flag.host_type.clone(),
            BridgedType::Sound => self.sound_holder()?.host_type.clone(),
            BridgedType::SoundSource => self.sound_holder()?.source.host_type.clone(),
            BridgedType::SoundStop => self.sound_stop_holder()?.host_type.clone(),
            BridgedType::Book => self.book_holder()?.host_type.clone(),
        };
        Ok(name)
    }

    /// Returns the host type key used for `bridged`, for transformer
    /// registration.
    pub fn host_type_key(&self, bridged: BridgedType) -> BridgeResult<TypeKey> {
        self.host_type(bridged).map(TypeKey::from)
    }

    // -------------------------------------------------------------------------
    // Holder access
    // -------------------------------------------------------------------------

    fn cached<T>(
        &self,
        cell: &Holder<T>,
        bridged: BridgedType,
        build: impl FnOnce() -> Result<T, BridgeInitError>,
    ) -> Result<Arc<T>, BridgeInitError> {
        cell.get_or_init(|| {
            let built = build().map(Arc::new);
            match &built {
                Ok(_) => debug!(
                    bridged = %bridged,
                    platform = self.platform(),
                    "Bridge initialized"
                ),
                Err(err) => error!(
                    bridged = %bridged,
                    platform = self.platform(),
                    error = %err,
                    "Bridge initialization failed; host presentation types are incompatible"
                ),
            }
            built
        })
        .clone()
    }

    fn resolve(
        &self,
        bridged: BridgedType,
        candidates: &[String],
    ) -> Result<Arc<dyn HostType>, BridgeInitError> {
        self.resolver
            .resolve_first(candidates)
            .ok_or_else(|| BridgeInitError::TypeNotFound {
                bridged,
                candidates: candidates.to_vec(),
            })
    }

    fn resolve_nested(
        &self,
        bridged: BridgedType,
        parent: &dyn HostType,
        nested: &str,
    ) -> Result<Arc<dyn HostType>, BridgeInitError> {
        let name = format!("{}${}", parent.name(), nested);
        self.resolver
            .resolve(&name)
            .ok_or(BridgeInitError::TypeNotFound {
                bridged,
                candidates: vec![name],
            })
    }

    pub(crate) fn key_holder(&self) -> Result<Arc<KeyHolder>, BridgeInitError> {
        self.cached(&self.key, BridgedType::Key, || {
            let ty = self.resolve(BridgedType::Key, &self.config.key)?;
            KeyHolder::build(ty.as_ref())
        })
    }

    pub(crate) fn component_holder(&self) -> Result<Arc<ComponentHolder>, BridgeInitError> {
        self.cached(&self.component, BridgedType::Component, || {
            let ty = self.resolve(BridgedType::Component, &self.config.component)?;
            let serializer =
                self.resolve(BridgedType::Component, &self.config.component_serializer)?;
            ComponentHolder::build(ty.as_ref(), serializer.as_ref())
        })
    }

    pub(crate) fn times_holder(&self) -> Result<Arc<TimesHolder>, BridgeInitError> {
        self.cached(&self.title_times, BridgedType::TitleTimes, || {
            let ty = self.resolve(BridgedType::TitleTimes, &self.config.title_times)?;
            TimesHolder::build(ty.as_ref())
        })
    }

    pub(crate) fn title_part_holder(&self) -> Result<Arc<TitlePartHolder>, BridgeInitError> {
        self.cached(&self.title_part, BridgedType::TitlePart, || {
            let ty = self.resolve(BridgedType::TitlePart, &self.config.title_part)?;
            TitlePartHolder::build(ty.as_ref())
        })
    }

    pub(crate) fn title_holder(&self) -> Result<Arc<TitleHolder>, BridgeInitError> {
        self.cached(&self.title, BridgedType::Title, || {
            self.depends_on(BridgedType::Title, self.component_holder())?;
            self.depends_on(BridgedType::Title, self.times_holder())?;
            let ty = self.resolve(BridgedType::Title, &self.config.title)?;
            TitleHolder::build(ty.as_ref())
        })
    }

    pub(crate) fn boss_bar_holder(&self) -> Result<Arc<BossBarHolder>, BridgeInitError> {
        self.cached(&self.boss_bar, BridgedType::BossBar, || {
            self.depends_on(BridgedType::BossBar, self.component_holder())?;
            let ty = self.resolve(BridgedType::BossBar, &self.config.boss_bar)?;
            let color = self.resolve_nested(BridgedType::BossBarColor, ty.as_ref(), "Color")?;
            let overlay =
                self.resolve_nested(BridgedType::BossBarOverlay, ty.as_ref(), "Overlay")?;
            let flag = self.resolve_nested(BridgedType::BossBarFlag, ty.as_ref(), "Flag")?;
            BossBarHolder::build(ty.as_ref(), color.as_ref(), overlay.as_ref(), flag.as_ref())
        })
    }

    pub(crate) fn sound_holder(&self) -> Result<Arc<SoundHolder>, BridgeInitError> {
        self.cached(&self.sound, BridgedType::Sound, || {
            self.depends_on(BridgedType::Sound, self.key_holder())?;
            let ty = self.resolve(BridgedType::Sound, &self.config.sound)?;
            let source = self.resolve_nested(BridgedType::SoundSource, ty.as_ref(), "Source")?;
            SoundHolder::build(ty.as_ref(), source.as_ref())
        })
    }

    pub(crate) fn sound_stop_holder(&self) -> Result<Arc<SoundStopHolder>, BridgeInitError> {
        self.cached(&self.sound_stop, BridgedType::SoundStop, || {
            self.depends_on(BridgedType::SoundStop, self.sound_holder())?;
            let ty = self.resolve(BridgedType::SoundStop, &self.config.sound_stop)?;
            SoundStopHolder::build(ty.as_ref())
        })
    }

    pub(crate) fn book_holder(&self) -> Result<Arc<BookHolder>, BridgeInitError> {
        self.cached(&self.book, BridgedType::Book, || {
            self.depends_on(BridgedType::Book, self.component_holder())?;
            let ty = self.resolve(BridgedType::Book, &self.config.book)?;
            BookHolder::build(ty.as_ref())
        })
    }

    fn depends_on<T>(
        &self,
        bridged: BridgedType,
        dependency: Result<Arc<T>, BridgeInitError>,
    ) -> Result<Arc<T>, BridgeInitError> {
        dependency.map_err(|source| BridgeInitError::Dependency {
            bridged,
            source: Box::new(source),
        })
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("platform", &self.platform())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// Conversion errors for a single call.
pub(crate) fn translation(bridged: BridgedType, reason: impl fmt::Display) -> BridgeError {
    BridgeError::translation(bridged, reason.to_string())
}
