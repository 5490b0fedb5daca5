//! Sounds and sound stops.

use super::key::Key;

named_enum! {
    /// The mixer channel a sound plays on.
    pub enum SoundSource {
        Master => "MASTER",
        Music => "MUSIC",
        Record => "RECORD",
        Weather => "WEATHER",
        Block => "BLOCK",
        Hostile => "HOSTILE",
        Neutral => "NEUTRAL",
        Player => "PLAYER",
        Ambient => "AMBIENT",
        Voice => "VOICE",
    }
}

/// A sound to play.
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    pub name: Key,
    pub source: SoundSource,
    pub volume: f32,
    pub pitch: f32,
}

impl Sound {
    /// Creates a sound.
    pub fn new(name: Key, source: SoundSource, volume: f32, pitch: f32) -> Self {
        Self {
            name,
            source,
            volume,
            pitch,
        }
    }

    /// Returns a stop matching this sound.
    pub fn as_stop(&self) -> SoundStop {
        SoundStop::named_on_source(self.name.clone(), self.source)
    }
}

crate::canonical_object!(Sound, "mimic.Sound");
crate::from_object_value!(Sound, "sound");

/// Which sounds to stop. Both parts empty means every sound.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SoundStop {
    pub sound: Option<Key>,
    pub source: Option<SoundSource>,
}

impl SoundStop {
    /// Stops every sound.
    pub fn all() -> Self {
        Self::default()
    }

    /// Stops a sound on every source.
    pub fn named(sound: Key) -> Self {
        Self {
            sound: Some(sound),
            source: None,
        }
    }

    /// Stops every sound on one source.
    pub fn source(source: SoundSource) -> Self {
        Self {
            sound: None,
            source: Some(source),
        }
    }

    /// Stops one sound on one source.
    pub fn named_on_source(sound: Key, source: SoundSource) -> Self {
        Self {
            sound: Some(sound),
            source: Some(source),
        }
    }
}

crate::canonical_object!(SoundStop, "mimic.SoundStop");
crate::from_object_value!(SoundStop, "sound stop");
