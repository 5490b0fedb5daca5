//! Rich text components.
//!
//! A [`Component`] is a tree of styled text nodes. Its serde representation is
//! the widely used chat JSON form, which doubles as the host-independent
//! interchange format used by the bridge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

// =============================================================================
// Colors
// =============================================================================

/// The sixteen legacy named colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

impl NamedColor {
    const ALL: [NamedColor; 16] = [
        Self::Black,
        Self::DarkBlue,
        Self::DarkGreen,
        Self::DarkAqua,
        Self::DarkRed,
        Self::DarkPurple,
        Self::Gold,
        Self::Gray,
        Self::DarkGray,
        Self::Blue,
        Self::Green,
        Self::Aqua,
        Self::Red,
        Self::LightPurple,
        Self::Yellow,
        Self::White,
    ];

    /// Returns the serialized name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::DarkBlue => "dark_blue",
            Self::DarkGreen => "dark_green",
            Self::DarkAqua => "dark_aqua",
            Self::DarkRed => "dark_red",
            Self::DarkPurple => "dark_purple",
            Self::Gold => "gold",
            Self::Gray => "gray",
            Self::DarkGray => "dark_gray",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Aqua => "aqua",
            Self::Red => "red",
            Self::LightPurple => "light_purple",
            Self::Yellow => "yellow",
            Self::White => "white",
        }
    }

    /// Returns the RGB value of this color.
    pub fn rgb(self) -> u32 {
        match self {
            Self::Black => 0x000000,
            Self::DarkBlue => 0x0000aa,
            Self::DarkGreen => 0x00aa00,
            Self::DarkAqua => 0x00aaaa,
            Self::DarkRed => 0xaa0000,
            Self::DarkPurple => 0xaa00aa,
            Self::Gold => 0xffaa00,
            Self::Gray => 0xaaaaaa,
            Self::DarkGray => 0x555555,
            Self::Blue => 0x5555ff,
            Self::Green => 0x55ff55,
            Self::Aqua => 0x55ffff,
            Self::Red => 0xff5555,
            Self::LightPurple => 0xff55ff,
            Self::Yellow => 0xffff55,
            Self::White => 0xffffff,
        }
    }
}

/// A text color, either named or arbitrary RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TextColor {
    /// One of the legacy named colors.
    Named(NamedColor),
    /// 24-bit RGB color.
    Hex(u32),
}

impl TextColor {
    /// Returns the RGB value.
    pub fn rgb(self) -> u32 {
        match self {
            Self::Named(named) => named.rgb(),
            Self::Hex(rgb) => rgb,
        }
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(named) => f.write_str(named.as_str()),
            Self::Hex(rgb) => write!(f, "#{rgb:06x}"),
        }
    }
}

impl FromStr for TextColor {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(hex) = s.strip_prefix('#') {
            return u32::from_str_radix(hex, 16)
                .ok()
                .filter(|rgb| hex.len() == 6 && *rgb <= 0xffffff)
                .map(Self::Hex)
                .ok_or_else(|| ValueError::invalid("text color", format!("bad hex color {s}")));
        }
        NamedColor::ALL
            .into_iter()
            .find(|named| named.as_str() == s)
            .map(Self::Named)
            .ok_or_else(|| ValueError::invalid("text color", format!("unknown color {s}")))
    }
}

impl TryFrom<String> for TextColor {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TextColor> for String {
    fn from(color: TextColor) -> Self {
        color.to_string()
    }
}

impl From<NamedColor> for TextColor {
    fn from(named: NamedColor) -> Self {
        Self::Named(named)
    }
}

// =============================================================================
// Component
// =============================================================================

/// The content kind of a component node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind<'a> {
    /// Literal text.
    Text(&'a str),
    /// Translation key resolved by the client.
    Translatable(&'a str),
    /// Key binding name resolved by the client.
    Keybind(&'a str),
}

/// A rich text node with optional style and children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    translate: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    with: Vec<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keybind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<TextColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    underlined: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    obfuscated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    insertion: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    extra: Vec<Component>,
}

crate::canonical_object!(Component, "mimic.Component");
crate::from_object_value!(Component, "component");

impl Component {
    /// An empty text component.
    pub fn empty() -> Self {
        Self::text("")
    }

    /// A literal text component.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// A translatable component with arguments.
    pub fn translatable(key: impl Into<String>, args: Vec<Component>) -> Self {
        Self {
            translate: Some(key.into()),
            with: args,
            ..Default::default()
        }
    }

    /// A key binding component.
    pub fn keybind(key: impl Into<String>) -> Self {
        Self {
            keybind: Some(key.into()),
            ..Default::default()
        }
    }

    /// Returns the content of this node.
    pub fn content(&self) -> ContentKind<'_> {
        if let Some(key) = &self.translate {
            ContentKind::Translatable(key)
        } else if let Some(key) = &self.keybind {
            ContentKind::Keybind(key)
        } else {
            ContentKind::Text(self.text.as_deref().unwrap_or(""))
        }
    }

    /// Sets the color.
    pub fn color(mut self, color: impl Into<TextColor>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the bold decoration.
    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    /// Sets the italic decoration.
    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    /// Sets the underlined decoration.
    pub fn underlined(mut self, underlined: bool) -> Self {
        self.underlined = Some(underlined);
        self
    }

    /// Sets the strikethrough decoration.
    pub fn strikethrough(mut self, strikethrough: bool) -> Self {
        self.strikethrough = Some(strikethrough);
        self
    }

    /// Sets the obfuscated decoration.
    pub fn obfuscated(mut self, obfuscated: bool) -> Self {
        self.obfuscated = Some(obfuscated);
        self
    }

    /// Sets the text inserted on shift-click.
    pub fn insertion(mut self, insertion: impl Into<String>) -> Self {
        self.insertion = Some(insertion.into());
        self
    }

    /// Appends a child component.
    pub fn append(mut self, child: Component) -> Self {
        self.extra.push(child);
        self
    }

    /// Returns the color, if set.
    pub fn get_color(&self) -> Option<TextColor> {
        self.color
    }

    /// Returns whether the node is explicitly bold.
    pub fn is_bold(&self) -> bool {
        self.bold.unwrap_or(false)
    }

    /// Returns the children of this node.
    pub fn children(&self) -> &[Component] {
        &self.extra
    }

    /// Renders the tree as plain text. Translatable and keybind nodes render
    /// their key.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_plain(&mut out);
        out
    }

    fn write_plain(&self, out: &mut String) {
        match self.content() {
            ContentKind::Text(text) => out.push_str(text),
            ContentKind::Translatable(key) | ContentKind::Keybind(key) => out.push_str(key),
        }
        for child in &self.extra {
            child.write_plain(out);
        }
    }

    /// Serializes into the JSON interchange form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses the JSON interchange form. A bare JSON string is accepted as a
    /// text component.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<serde_json::Value>(json)? {
            serde_json::Value::String(text) => Ok(Self::text(text)),
            other => serde_json::from_value(other),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain_text())
    }
}

impl From<&str> for Component {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Component {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}
