//! Style maps and their translation to Taffy styles.
//!
//! A style object arrives from the reconciler as a [`StyleMap`] of camelCase
//! keys. Recognized keys are applied on top of the tag's default style;
//! anything else is ignored.

use std::collections::BTreeMap;

use taffy::{
    AlignContent as TaffyAlignContent, AlignItems as TaffyAlignItems,
    AlignSelf as TaffyAlignSelf, Dimension as TaffyDimension, Display,
    FlexDirection as TaffyFlexDirection, FlexWrap as TaffyFlexWrap,
    JustifyContent as TaffyJustifyContent, LengthPercentage, LengthPercentageAuto,
    Position as TaffyPosition, Style,
};
use tracing::trace;

use crate::types::{
    AlignContent, AlignItems, AlignSelf, Dimension, FlexDirection, FlexWrap, JustifyContent,
    Position, Tag,
};

// =============================================================================
// STYLE VALUES
// =============================================================================

/// A single style attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// Plain number, in terminal cells for lengths.
    Number(f32),
    /// Percentage of the parent (0-100).
    Percent(f32),
    /// `auto`.
    Auto,
    /// Any other keyword, e.g. `column` or `space-between`.
    Keyword(String),
}

impl From<f32> for StyleValue {
    fn from(value: f32) -> Self {
        Self::Number(value)
    }
}

impl From<u16> for StyleValue {
    fn from(value: u16) -> Self {
        Self::Number(f32::from(value))
    }
}

impl From<&str> for StyleValue {
    /// Parses `auto`, `50%` and plain numbers; everything else is a keyword.
    fn from(value: &str) -> Self {
        let value = value.trim();
        if value == "auto" {
            return Self::Auto;
        }
        if let Some(percent) = value.strip_suffix('%') {
            if let Ok(p) = percent.trim().parse::<f32>() {
                return Self::Percent(p);
            }
        }
        match value.parse::<f32>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Keyword(value.to_string()),
        }
    }
}

impl StyleValue {
    fn as_dimension(&self) -> Option<Dimension> {
        match self {
            Self::Number(n) if n.is_finite() => Some(Dimension::Cells(n.max(0.0).round() as u16)),
            Self::Percent(p) if p.is_finite() => Some(Dimension::Percent(*p)),
            Self::Auto => Some(Dimension::Auto),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    fn as_keyword(&self) -> Option<&str> {
        match self {
            Self::Keyword(k) => Some(k.as_str()),
            Self::Auto => Some("auto"),
            _ => None,
        }
    }
}

/// Style object attached to an element.
///
/// Keys are kept sorted so iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleMap {
    entries: BTreeMap<String, StyleValue>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<StyleValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<StyleValue>> FromIterator<(K, V)> for StyleMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}

// =============================================================================
// STYLE KEYS
// =============================================================================

bitflags::bitflags! {
    /// Box edges addressed by a spacing key.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Edges: u8 {
        const TOP = 1 << 0;
        const RIGHT = 1 << 1;
        const BOTTOM = 1 << 2;
        const LEFT = 1 << 3;
        const X = Self::LEFT.bits() | Self::RIGHT.bits();
        const Y = Self::TOP.bits() | Self::BOTTOM.bits();
        const ALL = Self::X.bits() | Self::Y.bits();
    }
}

/// A style key the layout bridge knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKey {
    Width,
    Height,
    MinWidth,
    MinHeight,
    MaxWidth,
    MaxHeight,
    FlexDirection,
    FlexWrap,
    FlexGrow,
    FlexShrink,
    FlexBasis,
    JustifyContent,
    AlignItems,
    AlignSelf,
    AlignContent,
    Padding(Edges),
    Margin(Edges),
    Gap,
    RowGap,
    ColumnGap,
    Display,
    Position,
}

impl StyleKey {
    pub fn parse(key: &str) -> Option<Self> {
        let key = match key {
            "width" => Self::Width,
            "height" => Self::Height,
            "minWidth" => Self::MinWidth,
            "minHeight" => Self::MinHeight,
            "maxWidth" => Self::MaxWidth,
            "maxHeight" => Self::MaxHeight,
            "flexDirection" => Self::FlexDirection,
            "flexWrap" => Self::FlexWrap,
            "flexGrow" => Self::FlexGrow,
            "flexShrink" => Self::FlexShrink,
            "flexBasis" => Self::FlexBasis,
            "justifyContent" => Self::JustifyContent,
            "alignItems" => Self::AlignItems,
            "alignSelf" => Self::AlignSelf,
            "alignContent" => Self::AlignContent,
            "gap" => Self::Gap,
            "rowGap" => Self::RowGap,
            "columnGap" => Self::ColumnGap,
            "display" => Self::Display,
            "position" => Self::Position,
            other => {
                if let Some(side) = other.strip_prefix("padding") {
                    Self::Padding(parse_edges(side)?)
                } else if let Some(side) = other.strip_prefix("margin") {
                    Self::Margin(parse_edges(side)?)
                } else {
                    return None;
                }
            }
        };
        Some(key)
    }

    /// Shorthands apply first so specific keys override them.
    fn precedence(self) -> u8 {
        match self {
            Self::Padding(edges) | Self::Margin(edges) => 4 - edges.bits().count_ones() as u8,
            Self::RowGap | Self::ColumnGap => 1,
            _ => 0,
        }
    }
}

fn parse_edges(side: &str) -> Option<Edges> {
    match side {
        "" => Some(Edges::ALL),
        "X" => Some(Edges::X),
        "Y" => Some(Edges::Y),
        "Top" => Some(Edges::TOP),
        "Right" => Some(Edges::RIGHT),
        "Bottom" => Some(Edges::BOTTOM),
        "Left" => Some(Edges::LEFT),
        _ => None,
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

fn to_taffy_dimension(dim: Dimension) -> TaffyDimension {
    match dim {
        Dimension::Auto => TaffyDimension::Auto,
        Dimension::Cells(n) => TaffyDimension::Length(f32::from(n)),
        Dimension::Percent(p) => TaffyDimension::Percent(p / 100.0),
    }
}

fn to_taffy_lpa(dim: Dimension) -> LengthPercentageAuto {
    match dim {
        Dimension::Auto => LengthPercentageAuto::Auto,
        Dimension::Cells(n) => LengthPercentageAuto::Length(f32::from(n)),
        Dimension::Percent(p) => LengthPercentageAuto::Percent(p / 100.0),
    }
}

fn to_taffy_lp(dim: Dimension) -> Option<LengthPercentage> {
    match dim {
        Dimension::Auto => None,
        Dimension::Cells(n) => Some(LengthPercentage::Length(f32::from(n))),
        Dimension::Percent(p) => Some(LengthPercentage::Percent(p / 100.0)),
    }
}

fn to_taffy_flex_direction(dir: FlexDirection) -> TaffyFlexDirection {
    match dir {
        FlexDirection::Column => TaffyFlexDirection::Column,
        FlexDirection::Row => TaffyFlexDirection::Row,
        FlexDirection::ColumnReverse => TaffyFlexDirection::ColumnReverse,
        FlexDirection::RowReverse => TaffyFlexDirection::RowReverse,
    }
}

fn to_taffy_flex_wrap(wrap: FlexWrap) -> TaffyFlexWrap {
    match wrap {
        FlexWrap::NoWrap => TaffyFlexWrap::NoWrap,
        FlexWrap::Wrap => TaffyFlexWrap::Wrap,
        FlexWrap::WrapReverse => TaffyFlexWrap::WrapReverse,
    }
}

fn to_taffy_justify_content(justify: JustifyContent) -> TaffyJustifyContent {
    match justify {
        JustifyContent::FlexStart => TaffyJustifyContent::FlexStart,
        JustifyContent::Center => TaffyJustifyContent::Center,
        JustifyContent::FlexEnd => TaffyJustifyContent::FlexEnd,
        JustifyContent::SpaceBetween => TaffyJustifyContent::SpaceBetween,
        JustifyContent::SpaceAround => TaffyJustifyContent::SpaceAround,
        JustifyContent::SpaceEvenly => TaffyJustifyContent::SpaceEvenly,
    }
}

fn to_taffy_align_items(align: AlignItems) -> TaffyAlignItems {
    match align {
        AlignItems::Stretch => TaffyAlignItems::Stretch,
        AlignItems::FlexStart => TaffyAlignItems::FlexStart,
        AlignItems::Center => TaffyAlignItems::Center,
        AlignItems::FlexEnd => TaffyAlignItems::FlexEnd,
        AlignItems::Baseline => TaffyAlignItems::Baseline,
    }
}

fn to_taffy_align_self(align: AlignSelf) -> Option<TaffyAlignSelf> {
    match align {
        AlignSelf::Auto => None, // inherit from parent
        AlignSelf::Stretch => Some(TaffyAlignSelf::Stretch),
        AlignSelf::FlexStart => Some(TaffyAlignSelf::FlexStart),
        AlignSelf::Center => Some(TaffyAlignSelf::Center),
        AlignSelf::FlexEnd => Some(TaffyAlignSelf::FlexEnd),
        AlignSelf::Baseline => Some(TaffyAlignSelf::Baseline),
    }
}

fn to_taffy_align_content(align: AlignContent) -> TaffyAlignContent {
    match align {
        AlignContent::Stretch => TaffyAlignContent::Stretch,
        AlignContent::FlexStart => TaffyAlignContent::FlexStart,
        AlignContent::Center => TaffyAlignContent::Center,
        AlignContent::FlexEnd => TaffyAlignContent::FlexEnd,
        AlignContent::SpaceBetween => TaffyAlignContent::SpaceBetween,
        AlignContent::SpaceAround => TaffyAlignContent::SpaceAround,
    }
}

fn to_taffy_position(position: Position) -> TaffyPosition {
    match position {
        Position::Relative => TaffyPosition::Relative,
        Position::Absolute => TaffyPosition::Absolute,
    }
}

// =============================================================================
// STYLE BUILDING
// =============================================================================

/// Base style for a tag before any style map is applied.
pub fn default_style(tag: Tag) -> Style {
    let flex_direction = match tag {
        Tag::Root => TaffyFlexDirection::Column,
        _ => TaffyFlexDirection::Row,
    };
    Style {
        display: Display::Flex,
        flex_direction,
        ..Default::default()
    }
}

/// Build the Taffy style for an element from its tag and style map.
pub fn build_style(tag: Tag, map: &StyleMap) -> Style {
    let mut style = default_style(tag);

    let mut recognized: Vec<(StyleKey, &str, &StyleValue)> = Vec::with_capacity(map.len());
    for (name, value) in map.iter() {
        match StyleKey::parse(name) {
            Some(key) => recognized.push((key, name, value)),
            None => trace!(key = %name, "ignoring unrecognized style key"),
        }
    }
    recognized.sort_by_key(|(key, _, _)| key.precedence());

    for (key, name, value) in recognized {
        if !apply_attribute(&mut style, key, value) {
            trace!(key = %name, ?value, "ignoring unparsable style value");
        }
    }

    style
}

/// Apply one attribute. Returns false if the value doesn't fit the key.
fn apply_attribute(style: &mut Style, key: StyleKey, value: &StyleValue) -> bool {
    match key {
        StyleKey::Width => set_dimension(&mut style.size.width, value),
        StyleKey::Height => set_dimension(&mut style.size.height, value),
        StyleKey::MinWidth => set_dimension(&mut style.min_size.width, value),
        StyleKey::MinHeight => set_dimension(&mut style.min_size.height, value),
        StyleKey::MaxWidth => set_dimension(&mut style.max_size.width, value),
        StyleKey::MaxHeight => set_dimension(&mut style.max_size.height, value),
        StyleKey::FlexBasis => set_dimension(&mut style.flex_basis, value),
        StyleKey::FlexGrow => set_number(&mut style.flex_grow, value),
        StyleKey::FlexShrink => set_number(&mut style.flex_shrink, value),
        StyleKey::FlexDirection => value
            .as_keyword()
            .and_then(FlexDirection::from_keyword)
            .map(|dir| style.flex_direction = to_taffy_flex_direction(dir))
            .is_some(),
        StyleKey::FlexWrap => value
            .as_keyword()
            .and_then(FlexWrap::from_keyword)
            .map(|wrap| style.flex_wrap = to_taffy_flex_wrap(wrap))
            .is_some(),
        StyleKey::JustifyContent => value
            .as_keyword()
            .and_then(JustifyContent::from_keyword)
            .map(|j| style.justify_content = Some(to_taffy_justify_content(j)))
            .is_some(),
        StyleKey::AlignItems => value
            .as_keyword()
            .and_then(AlignItems::from_keyword)
            .map(|a| style.align_items = Some(to_taffy_align_items(a)))
            .is_some(),
        StyleKey::AlignSelf => value
            .as_keyword()
            .and_then(AlignSelf::from_keyword)
            .map(|a| style.align_self = to_taffy_align_self(a))
            .is_some(),
        StyleKey::AlignContent => value
            .as_keyword()
            .and_then(AlignContent::from_keyword)
            .map(|a| style.align_content = Some(to_taffy_align_content(a)))
            .is_some(),
        StyleKey::Position => value
            .as_keyword()
            .and_then(Position::from_keyword)
            .map(|p| style.position = to_taffy_position(p))
            .is_some(),
        StyleKey::Display => match value.as_keyword() {
            Some("flex") => {
                style.display = Display::Flex;
                true
            }
            Some("none") => {
                style.display = Display::None;
                true
            }
            _ => false,
        },
        StyleKey::Padding(edges) => {
            let Some(lp) = value.as_dimension().and_then(to_taffy_lp) else {
                return false;
            };
            apply_edges(&mut style.padding, edges, lp);
            true
        }
        StyleKey::Margin(edges) => {
            let Some(lpa) = value.as_dimension().map(to_taffy_lpa) else {
                return false;
            };
            apply_edges(&mut style.margin, edges, lpa);
            true
        }
        StyleKey::Gap => {
            let Some(lp) = value.as_dimension().and_then(to_taffy_lp) else {
                return false;
            };
            style.gap.width = lp;
            style.gap.height = lp;
            true
        }
        StyleKey::ColumnGap => match value.as_dimension().and_then(to_taffy_lp) {
            Some(lp) => {
                style.gap.width = lp;
                true
            }
            None => false,
        },
        StyleKey::RowGap => match value.as_dimension().and_then(to_taffy_lp) {
            Some(lp) => {
                style.gap.height = lp;
                true
            }
            None => false,
        },
    }
}

fn set_dimension(slot: &mut TaffyDimension, value: &StyleValue) -> bool {
    match value.as_dimension() {
        Some(dim) => {
            *slot = to_taffy_dimension(dim);
            true
        }
        None => false,
    }
}

fn set_number(slot: &mut f32, value: &StyleValue) -> bool {
    match value.as_number() {
        Some(n) if n >= 0.0 => {
            *slot = n;
            true
        }
        _ => false,
    }
}

fn apply_edges<T: Copy>(rect: &mut taffy::Rect<T>, edges: Edges, value: T) {
    if edges.contains(Edges::TOP) {
        rect.top = value;
    }
    if edges.contains(Edges::RIGHT) {
        rect.right = value;
    }
    if edges.contains(Edges::BOTTOM) {
        rect.bottom = value;
    }
    if edges.contains(Edges::LEFT) {
        rect.left = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_value_parsing() {
        assert_eq!(StyleValue::from("auto"), StyleValue::Auto);
        assert_eq!(StyleValue::from("50%"), StyleValue::Percent(50.0));
        assert_eq!(StyleValue::from("12"), StyleValue::Number(12.0));
        assert_eq!(StyleValue::from("column"), StyleValue::Keyword("column".into()));
    }

    #[test]
    fn test_style_key_parsing() {
        assert_eq!(StyleKey::parse("paddingX"), Some(StyleKey::Padding(Edges::X)));
        assert_eq!(StyleKey::parse("marginTop"), Some(StyleKey::Margin(Edges::TOP)));
        assert_eq!(StyleKey::parse("margin"), Some(StyleKey::Margin(Edges::ALL)));
        assert_eq!(StyleKey::parse("paddingDiagonal"), None);
        assert_eq!(StyleKey::parse("color"), None);
    }

    #[test]
    fn test_dimension_conversion() {
        assert!(matches!(to_taffy_dimension(Dimension::Auto), TaffyDimension::Auto));
        assert!(matches!(to_taffy_dimension(Dimension::Cells(50)), TaffyDimension::Length(50.0)));
        // Percent: 50% → 0.5
        if let TaffyDimension::Percent(p) = to_taffy_dimension(Dimension::Percent(50.0)) {
            assert!((p - 0.5).abs() < 0.001);
        } else {
            panic!("Expected Percent variant");
        }
    }

    #[test]
    fn test_build_style_applies_recognized_keys() {
        let map = StyleMap::new()
            .with("width", 20u16)
            .with("flexDirection", "column")
            .with("color", "red");
        let style = build_style(Tag::Box, &map);

        assert!(matches!(style.size.width, TaffyDimension::Length(w) if w == 20.0));
        assert_eq!(style.flex_direction, TaffyFlexDirection::Column);
    }

    #[test]
    fn test_specific_edges_override_shorthand() {
        let map = StyleMap::new().with("paddingLeft", 3u16).with("padding", 1u16);
        let style = build_style(Tag::Box, &map);

        assert!(matches!(style.padding.left, LengthPercentage::Length(v) if v == 3.0));
        assert!(matches!(style.padding.top, LengthPercentage::Length(v) if v == 1.0));
    }

    #[test]
    fn test_unparsable_value_keeps_default() {
        let map = StyleMap::new().with("flexDirection", "diagonal");
        let style = build_style(Tag::Root, &map);
        assert_eq!(style.flex_direction, TaffyFlexDirection::Column);
    }

    #[test]
    fn test_display_none() {
        let style = build_style(Tag::Box, &StyleMap::new().with("display", "none"));
        assert_eq!(style.display, Display::None);
    }
}
