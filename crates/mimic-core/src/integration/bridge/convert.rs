//! [`Bridged`] implementations for the canonical presentation types.

use std::time::Duration;

use super::holders::{expect, invoke, optional, read};
use super::{Bridge, Bridged, BridgedType, translation};
use crate::error::BridgeResult;
use crate::foundation::value::Value;
use crate::presentation::{
    Book, BossBar, BossBarColor, BossBarFlag, BossBarOverlay, Component, Key, Sound, SoundSource,
    SoundStop, Title, TitlePart, TitleTimes,
};

impl Bridged for Key {
    const BRIDGED: BridgedType = BridgedType::Key;

    fn to_host(&self, bridge: &Bridge) -> BridgeResult<Value> {
        let holder = bridge.key_holder()?;
        invoke(
            Self::BRIDGED,
            &holder.create,
            &[self.namespace().into(), self.value().into()],
        )
    }

    fn from_host(value: &Value, bridge: &Bridge) -> BridgeResult<Self> {
        let holder = bridge.key_holder()?;
        let namespace: String =
            expect(Self::BRIDGED, read(Self::BRIDGED, &holder.namespace, value)?)?;
        let path: String = expect(Self::BRIDGED, read(Self::BRIDGED, &holder.value, value)?)?;
        Key::new(namespace, path).map_err(|err| translation(Self::BRIDGED, err))
    }
}

impl Bridged for Component {
    const BRIDGED: BridgedType = BridgedType::Component;

    fn to_host(&self, bridge: &Bridge) -> BridgeResult<Value> {
        let holder = bridge.component_holder()?;
        let json = self.to_json().map_err(|err| translation(Self::BRIDGED, err))?;
        invoke(Self::BRIDGED, &holder.deserialize, &[Value::Str(json)])
    }

    fn from_host(value: &Value, bridge: &Bridge) -> BridgeResult<Self> {
        let holder = bridge.component_holder()?;
        let json: String = expect(
            Self::BRIDGED,
            invoke(Self::BRIDGED, &holder.serialize, std::slice::from_ref(value))?,
        )?;
        Component::from_json(&json).map_err(|err| translation(Self::BRIDGED, err))
    }
}

fn millis(duration: Duration) -> Value {
    Value::Int(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
}

fn duration(bridged: BridgedType, value: Value) -> BridgeResult<Duration> {
    let raw: i64 = expect(bridged, value)?;
    u64::try_from(raw)
        .map(Duration::from_millis)
        .map_err(|_| translation(bridged, format!("negative duration {raw}ms")))
}

impl Bridged for TitleTimes {
    const BRIDGED: BridgedType = BridgedType::TitleTimes;

    fn to_host(&self, bridge: &Bridge) -> BridgeResult<Value> {
        let holder = bridge.times_holder()?;
        invoke(
            Self::BRIDGED,
            &holder.create,
            &[millis(self.fade_in), millis(self.stay), millis(self.fade_out)],
        )
    }

    fn from_host(value: &Value, bridge: &Bridge) -> BridgeResult<Self> {
        let holder = bridge.times_holder()?;
        Ok(TitleTimes::new(
            duration(Self::BRIDGED, read(Self::BRIDGED, &holder.fade_in, value)?)?,
            duration(Self::BRIDGED, read(Self::BRIDGED, &holder.stay, value)?)?,
            duration(Self::BRIDGED, read(Self::BRIDGED, &holder.fade_out, value)?)?,
        ))
    }
}

impl Bridged for TitlePart {
    const BRIDGED: BridgedType = BridgedType::TitlePart;

    fn to_host(&self, bridge: &Bridge) -> BridgeResult<Value> {
        let holder = bridge.title_part_holder()?;
        Ok(match self {
            TitlePart::Title => holder.title.clone(),
            TitlePart::Subtitle => holder.subtitle.clone(),
            TitlePart::Times => holder.times.clone(),
        })
    }

    fn from_host(value: &Value, bridge: &Bridge) -> BridgeResult<Self> {
        let holder = bridge.title_part_holder()?;
        if *value == holder.title {
            Ok(TitlePart::Title)
        } else if *value == holder.subtitle {
            Ok(TitlePart::Subtitle)
        } else if *value == holder.times {
            Ok(TitlePart::Times)
        } else {
            Err(translation(
                Self::BRIDGED,
                format!("unknown title part {value:?}"),
            ))
        }
    }
}

impl Bridged for Title {
    const BRIDGED: BridgedType = BridgedType::Title;

    fn to_host(&self, bridge: &Bridge) -> BridgeResult<Value> {
        let holder = bridge.title_holder()?;
        let times = match &self.times {
            Some(times) => times.to_host(bridge)?,
            None => Value::Null,
        };
        invoke(
            Self::BRIDGED,
            &holder.create,
            &[self.title.to_host(bridge)?, self.subtitle.to_host(bridge)?, times],
        )
    }

    fn from_host(value: &Value, bridge: &Bridge) -> BridgeResult<Self> {
        let holder = bridge.title_holder()?;
        let title = Component::from_host(&read(Self::BRIDGED, &holder.title, value)?, bridge)?;
        let subtitle =
            Component::from_host(&read(Self::BRIDGED, &holder.subtitle, value)?, bridge)?;
        let times = optional(read(Self::BRIDGED, &holder.times, value)?, |times| {
            TitleTimes::from_host(times, bridge)
        })?;
        Ok(Title {
            title,
            subtitle,
            times,
        })
    }
}

// =============================================================================
// Enums
// =============================================================================

macro_rules! bridged_enum {
    ($ty:ty, $bridged:expr, $holder:ident . $field:ident) => {
        impl Bridged for $ty {
            const BRIDGED: BridgedType = $bridged;

            fn to_host(&self, bridge: &Bridge) -> BridgeResult<Value> {
                bridge.$holder()?.$field.to_host(self.as_str())
            }

            fn from_host(value: &Value, bridge: &Bridge) -> BridgeResult<Self> {
                bridge.$holder()?.$field.from_host(value)
            }
        }
    };
}

bridged_enum!(BossBarColor, BridgedType::BossBarColor, boss_bar_holder.color);
bridged_enum!(BossBarOverlay, BridgedType::BossBarOverlay, boss_bar_holder.overlay);
bridged_enum!(BossBarFlag, BridgedType::BossBarFlag, boss_bar_holder.flag);
bridged_enum!(SoundSource, BridgedType::SoundSource, sound_holder.source);

// =============================================================================
// Composite Types
// =============================================================================

impl Bridged for BossBar {
    const BRIDGED: BridgedType = BridgedType::BossBar;

    fn to_host(&self, bridge: &Bridge) -> BridgeResult<Value> {
        let holder = bridge.boss_bar_holder()?;
        let flags = self
            .get_flags()
            .iter()
            .map(|flag| flag.to_host(bridge))
            .collect::<BridgeResult<Vec<_>>>()?;
        invoke(
            Self::BRIDGED,
            &holder.create,
            &[
                self.name().to_host(bridge)?,
                Value::from(self.progress()),
                self.color().to_host(bridge)?,
                self.overlay().to_host(bridge)?,
                Value::List(flags),
            ],
        )
    }

    fn from_host(value: &Value, bridge: &Bridge) -> BridgeResult<Self> {
        let holder = bridge.boss_bar_holder()?;
        let name = Component::from_host(&read(Self::BRIDGED, &holder.name, value)?, bridge)?;
        let progress: f32 = expect(Self::BRIDGED, read(Self::BRIDGED, &holder.progress, value)?)?;
        let color =
            BossBarColor::from_host(&read(Self::BRIDGED, &holder.color_of, value)?, bridge)?;
        let overlay =
            BossBarOverlay::from_host(&read(Self::BRIDGED, &holder.overlay_of, value)?, bridge)?;
        let flags = match read(Self::BRIDGED, &holder.flags_of, value)? {
            Value::List(items) => items
                .iter()
                .map(|item| BossBarFlag::from_host(item, bridge))
                .collect::<BridgeResult<Vec<_>>>()?,
            other => {
                return Err(translation(
                    Self::BRIDGED,
                    format!("flags must be a list, got {}", other.type_key()),
                ));
            }
        };
        BossBar::new(name, progress, color, overlay)
            .map(|bar| bar.flags(flags))
            .map_err(|err| translation(Self::BRIDGED, err))
    }
}

impl Bridged for Sound {
    const BRIDGED: BridgedType = BridgedType::Sound;

    fn to_host(&self, bridge: &Bridge) -> BridgeResult<Value> {
        let holder = bridge.sound_holder()?;
        invoke(
            Self::BRIDGED,
            &holder.create,
            &[
                self.name.to_host(bridge)?,
                self.source.to_host(bridge)?,
                Value::from(self.volume),
                Value::from(self.pitch),
            ],
        )
    }

    fn from_host(value: &Value, bridge: &Bridge) -> BridgeResult<Self> {
        let holder = bridge.sound_holder()?;
        Ok(Sound::new(
            Key::from_host(&read(Self::BRIDGED, &holder.name, value)?, bridge)?,
            SoundSource::from_host(&read(Self::BRIDGED, &holder.source_of, value)?, bridge)?,
            expect(Self::BRIDGED, read(Self::BRIDGED, &holder.volume, value)?)?,
            expect(Self::BRIDGED, read(Self::BRIDGED, &holder.pitch, value)?)?,
        ))
    }
}

impl Bridged for SoundStop {
    const BRIDGED: BridgedType = BridgedType::SoundStop;

    fn to_host(&self, bridge: &Bridge) -> BridgeResult<Value> {
        let holder = bridge.sound_stop_holder()?;
        match (&self.sound, self.source) {
            (None, None) => invoke(Self::BRIDGED, &holder.all, &[]),
            (Some(sound), None) => invoke(Self::BRIDGED, &holder.named, &[sound.to_host(bridge)?]),
            (None, Some(source)) => {
                invoke(Self::BRIDGED, &holder.source, &[source.to_host(bridge)?])
            }
            (Some(sound), Some(source)) => invoke(
                Self::BRIDGED,
                &holder.named_on_source,
                &[sound.to_host(bridge)?, source.to_host(bridge)?],
            ),
        }
    }

    fn from_host(value: &Value, bridge: &Bridge) -> BridgeResult<Self> {
        let holder = bridge.sound_stop_holder()?;
        let sound = optional(read(Self::BRIDGED, &holder.sound_of, value)?, |sound| {
            Key::from_host(sound, bridge)
        })?;
        let source = optional(read(Self::BRIDGED, &holder.source_of, value)?, |source| {
            SoundSource::from_host(source, bridge)
        })?;
        Ok(SoundStop { sound, source })
    }
}

impl Bridged for Book {
    const BRIDGED: BridgedType = BridgedType::Book;

    fn to_host(&self, bridge: &Bridge) -> BridgeResult<Value> {
        let holder = bridge.book_holder()?;
        let pages = self
            .pages
            .iter()
            .map(|page| page.to_host(bridge))
            .collect::<BridgeResult<Vec<_>>>()?;
        invoke(
            Self::BRIDGED,
            &holder.create,
            &[
                self.title.to_host(bridge)?,
                self.author.to_host(bridge)?,
                Value::List(pages),
            ],
        )
    }

    fn from_host(value: &Value, bridge: &Bridge) -> BridgeResult<Self> {
        let holder = bridge.book_holder()?;
        let title = Component::from_host(&read(Self::BRIDGED, &holder.title, value)?, bridge)?;
        let author = Component::from_host(&read(Self::BRIDGED, &holder.author, value)?, bridge)?;
        let pages = match read(Self::BRIDGED, &holder.pages, value)? {
            Value::List(items) => items
                .iter()
                .map(|item| Component::from_host(item, bridge))
                .collect::<BridgeResult<Vec<_>>>()?,
            other => {
                return Err(translation(
                    Self::BRIDGED,
                    format!("pages must be a list, got {}", other.type_key()),
                ));
            }
        };
        Ok(Book::new(title, author, pages))
    }
}
