//! Canonical presentation types.
//!
//! These are the framework's own copy of the presentation family that hosts
//! ship in their own, nominally distinct, versions: rich text, identifiers,
//! titles, boss bars, sounds and books. Host copies are reached through the
//! [`Bridge`](crate::Bridge).

/// Declares a closed enum whose variants are identified by a constant name on
/// the host side.
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the constant name used by hosts.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::ValueError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::ValueError::invalid(
                        stringify!($name),
                        format!("unknown constant {other}"),
                    )),
                }
            }
        }
    };
}

mod book;
mod bossbar;
mod component;
mod key;
mod sound;
mod title;

pub use book::Book;
pub use bossbar::{BossBar, BossBarColor, BossBarFlag, BossBarOverlay};
pub use component::{Component, ContentKind, NamedColor, TextColor};
pub use key::Key;
pub use sound::{Sound, SoundSource, SoundStop};
pub use title::{Title, TitlePart, TitleTimes};
