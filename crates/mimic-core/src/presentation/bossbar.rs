//! Boss bars.

use std::collections::BTreeSet;

use super::component::Component;
use crate::error::ValueError;

named_enum! {
    /// Color of a boss bar.
    pub enum BossBarColor {
        Pink => "PINK",
        Blue => "BLUE",
        Red => "RED",
        Green => "GREEN",
        Yellow => "YELLOW",
        Purple => "PURPLE",
        White => "WHITE",
    }
}

named_enum! {
    /// Segmentation of a boss bar.
    pub enum BossBarOverlay {
        Progress => "PROGRESS",
        Notched6 => "NOTCHED_6",
        Notched10 => "NOTCHED_10",
        Notched12 => "NOTCHED_12",
        Notched20 => "NOTCHED_20",
    }
}

named_enum! {
    /// Extra client-side effects of a boss bar.
    pub enum BossBarFlag {
        DarkenScreen => "DARKEN_SCREEN",
        PlayBossMusic => "PLAY_BOSS_MUSIC",
        CreateWorldFog => "CREATE_WORLD_FOG",
    }
}

/// A boss bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BossBar {
    name: Component,
    progress: f32,
    color: BossBarColor,
    overlay: BossBarOverlay,
    flags: BTreeSet<BossBarFlag>,
}

impl BossBar {
    /// Creates a boss bar. `progress` must be within `0.0..=1.0`.
    pub fn new(
        name: impl Into<Component>,
        progress: f32,
        color: BossBarColor,
        overlay: BossBarOverlay,
    ) -> Result<Self, ValueError> {
        Ok(Self {
            name: name.into(),
            progress: check_progress(progress)?,
            color,
            overlay,
            flags: BTreeSet::new(),
        })
    }

    /// Adds a flag.
    pub fn flag(mut self, flag: BossBarFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    /// Replaces the flags.
    pub fn flags(mut self, flags: impl IntoIterator<Item = BossBarFlag>) -> Self {
        self.flags = flags.into_iter().collect();
        self
    }

    pub fn name(&self) -> &Component {
        &self.name
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn color(&self) -> BossBarColor {
        self.color
    }

    pub fn overlay(&self) -> BossBarOverlay {
        self.overlay
    }

    pub fn get_flags(&self) -> &BTreeSet<BossBarFlag> {
        &self.flags
    }

    /// Sets the progress. `progress` must be within `0.0..=1.0`.
    pub fn set_progress(&mut self, progress: f32) -> Result<(), ValueError> {
        self.progress = check_progress(progress)?;
        Ok(())
    }
}

crate::canonical_object!(BossBar, "mimic.BossBar");
crate::from_object_value!(BossBar, "boss bar");

fn check_progress(progress: f32) -> Result<f32, ValueError> {
    if (0.0..=1.0).contains(&progress) {
        Ok(progress)
    } else {
        Err(ValueError::invalid(
            "boss bar progress",
            format!("{progress} is outside 0..=1"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bounds() {
        assert!(BossBar::new("Boss", 1.5, BossBarColor::Red, BossBarOverlay::Progress).is_err());
        let mut bar =
            BossBar::new("Boss", 0.5, BossBarColor::Red, BossBarOverlay::Progress).unwrap();
        assert!(bar.set_progress(-0.1).is_err());
        assert_eq!(bar.progress(), 0.5);
    }

    #[test]
    fn test_flags_are_a_set() {
        let bar = BossBar::new("Boss", 0.0, BossBarColor::Blue, BossBarOverlay::Notched6)
            .unwrap()
            .flag(BossBarFlag::DarkenScreen)
            .flag(BossBarFlag::DarkenScreen);
        assert_eq!(bar.get_flags().len(), 1);
        assert_eq!(BossBarOverlay::Notched6.as_str(), "NOTCHED_6");
    }
}
