//! Core types for spark-tui-host.
//!
//! Element tags, dimensions and the flex keyword enums that style maps are
//! parsed into before they reach the layout engine.

use std::fmt;
use std::str::FromStr;

use crate::error::TagError;

// =============================================================================
// Element Tags
// =============================================================================

/// Built-in element tags.
///
/// The set is fixed: a reconciler may only create elements with these names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Tag {
    /// The single root container created at mount.
    Root = 0,
    /// Flex container.
    #[default]
    Box = 1,
    /// Text block. Owns a measured layout leaf.
    Text = 2,
    /// Inline text segment inside a `text`. Never owns a layout node.
    Span = 3,
    /// Hard line break inside a `text`. Never owns a layout node.
    Newline = 4,
}

impl Tag {
    /// Tag name as a reconciler spells it.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Box => "box",
            Self::Text => "text",
            Self::Span => "span",
            Self::Newline => "newline",
        }
    }

    /// Whether elements with this tag own a layout node.
    pub const fn participates_in_layout(self) -> bool {
        matches!(self, Self::Root | Self::Box | Self::Text)
    }

    /// Whether elements with this tag need a text measure function.
    pub const fn is_measured(self) -> bool {
        matches!(self, Self::Text)
    }
}

impl FromStr for Tag {
    type Err = TagError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "root" => Ok(Self::Root),
            "box" => Ok(Self::Box),
            "text" => Ok(Self::Text),
            "span" => Ok(Self::Span),
            "newline" => Ok(Self::Newline),
            other => Err(TagError(other.to_string())),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Dimension
// =============================================================================

/// Dimension value for width, height, flex-basis and friends.
///
/// ```
/// use spark_tui_host::types::Dimension;
///
/// let width = Dimension::Cells(50);       // 50 characters
/// let height = Dimension::Percent(100.0); // Full parent height
/// let auto = Dimension::Auto;             // Content-determined
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    /// Size from content.
    #[default]
    Auto,
    /// Absolute size in terminal cells.
    Cells(u16),
    /// Percentage of parent size (0-100).
    Percent(f32),
}

// =============================================================================
// Flex Enums
// =============================================================================

/// Flex direction for container layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FlexDirection {
    Column = 0,
    #[default]
    Row = 1,
    ColumnReverse = 2,
    RowReverse = 3,
}

impl FlexDirection {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "column" => Some(Self::Column),
            "row" => Some(Self::Row),
            "column-reverse" => Some(Self::ColumnReverse),
            "row-reverse" => Some(Self::RowReverse),
            _ => None,
        }
    }
}

/// Flex wrap behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FlexWrap {
    #[default]
    NoWrap = 0,
    Wrap = 1,
    WrapReverse = 2,
}

impl FlexWrap {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "nowrap" => Some(Self::NoWrap),
            "wrap" => Some(Self::Wrap),
            "wrap-reverse" => Some(Self::WrapReverse),
            _ => None,
        }
    }
}

/// Justify content (main axis alignment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum JustifyContent {
    #[default]
    FlexStart = 0,
    Center = 1,
    FlexEnd = 2,
    SpaceBetween = 3,
    SpaceAround = 4,
    SpaceEvenly = 5,
}

impl JustifyContent {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "flex-start" => Some(Self::FlexStart),
            "center" => Some(Self::Center),
            "flex-end" => Some(Self::FlexEnd),
            "space-between" => Some(Self::SpaceBetween),
            "space-around" => Some(Self::SpaceAround),
            "space-evenly" => Some(Self::SpaceEvenly),
            _ => None,
        }
    }
}

/// Align items (cross axis alignment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AlignItems {
    #[default]
    Stretch = 0,
    FlexStart = 1,
    Center = 2,
    FlexEnd = 3,
    Baseline = 4,
}

impl AlignItems {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "stretch" => Some(Self::Stretch),
            "flex-start" => Some(Self::FlexStart),
            "center" => Some(Self::Center),
            "flex-end" => Some(Self::FlexEnd),
            "baseline" => Some(Self::Baseline),
            _ => None,
        }
    }
}

/// Align self (item override for align items).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AlignSelf {
    #[default]
    Auto = 0,
    Stretch = 1,
    FlexStart = 2,
    Center = 3,
    FlexEnd = 4,
    Baseline = 5,
}

impl AlignSelf {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "auto" => Some(Self::Auto),
            "stretch" => Some(Self::Stretch),
            "flex-start" => Some(Self::FlexStart),
            "center" => Some(Self::Center),
            "flex-end" => Some(Self::FlexEnd),
            "baseline" => Some(Self::Baseline),
            _ => None,
        }
    }
}

/// Align content (multi-line cross axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AlignContent {
    #[default]
    Stretch = 0,
    FlexStart = 1,
    Center = 2,
    FlexEnd = 3,
    SpaceBetween = 4,
    SpaceAround = 5,
}

impl AlignContent {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "stretch" => Some(Self::Stretch),
            "flex-start" => Some(Self::FlexStart),
            "center" => Some(Self::Center),
            "flex-end" => Some(Self::FlexEnd),
            "space-between" => Some(Self::SpaceBetween),
            "space-around" => Some(Self::SpaceAround),
            _ => None,
        }
    }
}

/// Position type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Position {
    #[default]
    Relative = 0,
    Absolute = 1,
}

impl Position {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "relative" => Some(Self::Relative),
            "absolute" => Some(Self::Absolute),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
