use scene::{DisasterKind, MarkerCategory};
use serde::Serialize;

/// Linear RGBA in `[0, 1]`.
pub type Color = [f32; 4];

pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}

pub const BLUE: Color = rgb(0x3b, 0x82, 0xf6);
pub const RED: Color = rgb(0xef, 0x44, 0x44);
pub const AMBER: Color = rgb(0xf5, 0x9e, 0x0b);
pub const PURPLE: Color = rgb(0x8b, 0x5c, 0xf6);
pub const GRAY: Color = rgb(0x6b, 0x72, 0x80);
pub const GREEN: Color = rgb(0x22, 0xc5, 0x5e);
pub const ORANGE: Color = rgb(0xf9, 0x73, 0x16);

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub color: Color,
    pub size_px: f32,
    /// Whether the handle carries the pulsing incident treatment.
    pub pulsing: bool,
}

impl MarkerStyle {
    pub fn for_category(category: MarkerCategory) -> Self {
        let color = match category {
            MarkerCategory::Shelter => GREEN,
            MarkerCategory::Danger => RED,
            MarkerCategory::Evacuation => ORANGE,
            MarkerCategory::Resource => BLUE,
            MarkerCategory::General => GRAY,
        };
        Self {
            color,
            size_px: 24.0,
            pulsing: false,
        }
    }

    pub fn location_pin() -> Self {
        Self {
            color: RED,
            size_px: 18.0,
            pulsing: true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: Color,
    pub width_px: f32,
    pub opacity: f32,
    /// Dash pattern in line widths (`[dash, gap]`); solid when `None`.
    pub dash: Option<[f32; 2]>,
}

impl LineStyle {
    /// Wide translucent underlay drawn beneath the route.
    pub fn route_glow() -> Self {
        Self {
            color: BLUE,
            width_px: 12.0,
            opacity: 0.35,
            dash: None,
        }
    }

    pub fn route_line() -> Self {
        Self {
            color: BLUE,
            width_px: 4.0,
            opacity: 1.0,
            dash: None,
        }
    }

    pub fn area_outline(kind: DisasterKind) -> Self {
        Self {
            color: disaster_color(kind),
            width_px: 2.0,
            opacity: 0.9,
            dash: Some([2.0, 2.0]),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(tag = "paint", rename_all = "snake_case")]
pub enum PolygonPaint {
    Fill { color: Color, opacity: f32 },
    Outline(LineStyle),
}

impl PolygonPaint {
    pub fn area_fill(kind: DisasterKind) -> Self {
        PolygonPaint::Fill {
            color: disaster_color(kind),
            opacity: 0.25,
        }
    }

    pub fn area_outline(kind: DisasterKind) -> Self {
        PolygonPaint::Outline(LineStyle::area_outline(kind))
    }
}

pub fn disaster_color(kind: DisasterKind) -> Color {
    match kind {
        DisasterKind::Flood => BLUE,
        DisasterKind::Fire => RED,
        DisasterKind::Earthquake => AMBER,
        DisasterKind::Hurricane => PURPLE,
        DisasterKind::Other => GRAY,
    }
}

#[cfg(test)]
mod tests {
    use super::{AMBER, BLUE, GRAY, LineStyle, PURPLE, PolygonPaint, RED, disaster_color};
    use scene::DisasterKind;

    #[test]
    fn disaster_palette_by_kind() {
        assert_eq!(disaster_color(DisasterKind::Flood), BLUE);
        assert_eq!(disaster_color(DisasterKind::Fire), RED);
        assert_eq!(disaster_color(DisasterKind::Earthquake), AMBER);
        assert_eq!(disaster_color(DisasterKind::Hurricane), PURPLE);
        assert_eq!(disaster_color(DisasterKind::Other), GRAY);
    }

    #[test]
    fn outlines_are_dashed() {
        let PolygonPaint::Outline(style) = PolygonPaint::area_outline(DisasterKind::Fire) else {
            panic!("expected outline paint");
        };
        assert!(style.dash.is_some());
    }

    #[test]
    fn glow_is_wider_and_fainter_than_line() {
        let glow = LineStyle::route_glow();
        let line = LineStyle::route_line();
        assert!(glow.width_px > line.width_px);
        assert!(glow.opacity < line.opacity);
    }
}
