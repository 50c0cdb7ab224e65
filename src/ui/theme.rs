//! Color palette shared by every pane

use ratatui::style::Color;

pub struct Theme {
    /// Default text
    pub fg: Color,
    /// Step counter, brackets, report labels
    pub accent: Color,
    /// Current output line and the playing badge
    pub highlight: Color,
    /// Comments, separators, unfocused chrome
    pub muted: Color,
    /// Nodes charged by the last footprint
    pub charged: Color,
    pub error: Color,
    pub keyword: Color,
    pub string: Color,
    pub number: Color,
    pub border_focused: Color,
    pub border_normal: Color,
    pub line_bg: Color,
    pub class_name: Color,
    /// Node type column in the heap pane
    pub type_name: Color,
    /// Byte counts
    pub size: Color,
}

const BLUE: Color = Color::Rgb(137, 180, 250);
const PEACH: Color = Color::Rgb(250, 179, 135);
const YELLOW: Color = Color::Rgb(249, 226, 175);
const OVERLAY: Color = Color::Rgb(108, 112, 134);

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    accent: BLUE,
    highlight: PEACH,
    muted: OVERLAY,
    charged: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    keyword: Color::Rgb(203, 166, 247),
    string: PEACH,
    number: Color::Rgb(250, 179, 135),
    border_focused: YELLOW,
    border_normal: OVERLAY,
    line_bg: Color::Rgb(50, 50, 70),
    class_name: YELLOW,
    type_name: Color::Rgb(148, 226, 213),
    size: Color::Rgb(245, 194, 231),
};
