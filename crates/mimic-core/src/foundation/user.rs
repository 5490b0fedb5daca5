//! Canonical users and game modes.

use std::fmt;

use uuid::Uuid;

use crate::foundation::value::{ObjectRef, TypeKey};

/// A connected user, independent of the host's player type.
///
/// The host's native object is kept alongside so that host glue can reach
/// back into it when sending messages or applying state.
#[derive(Clone)]
pub struct User {
    id: Uuid,
    name: String,
    native: Option<ObjectRef>,
}

impl User {
    /// Type key of canonical users.
    pub const TYPE: TypeKey = TypeKey::from_static("mimic.User");

    /// Creates a user without a native handle.
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            native: None,
        }
    }

    /// Attaches the host's native object.
    pub fn with_native(mut self, native: ObjectRef) -> Self {
        self.native = Some(native);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the host's native object, if known.
    pub fn native(&self) -> Option<&ObjectRef> {
        self.native.as_ref()
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("native", &self.native.as_ref().map(|n| n.type_name().to_owned()))
            .finish()
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

crate::canonical_object!(User, "mimic.User");
crate::from_object_value!(User, "user");

/// The game mode of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    /// Type key of canonical game modes.
    pub const TYPE: TypeKey = TypeKey::from_static("mimic.GameMode");

    /// Every game mode.
    pub const ALL: [GameMode; 4] = [
        Self::Survival,
        Self::Creative,
        Self::Adventure,
        Self::Spectator,
    ];

    /// Returns the constant name used by hosts.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Survival => "SURVIVAL",
            Self::Creative => "CREATIVE",
            Self::Adventure => "ADVENTURE",
            Self::Spectator => "SPECTATOR",
        }
    }

    /// Looks a game mode up by its host constant name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

crate::canonical_object!(GameMode, "mimic.GameMode");
crate::from_object_value!(GameMode, "game mode");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FromValue, Value};

    #[test]
    fn test_user_round_trips_through_value() {
        let user = User::new(Uuid::new_v4(), "Steve");
        let value = Value::object(user.clone());
        assert_eq!(value.type_key(), User::TYPE);
        assert_eq!(User::from_value(value).unwrap(), user);
    }

    #[test]
    fn test_game_mode_lookup() {
        assert_eq!(GameMode::from_name("creative"), Some(GameMode::Creative));
        assert_eq!(GameMode::from_name("hardcore"), None);
    }
}
