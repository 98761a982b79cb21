use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, pos2, vec2};

use crate::graph::LayoutMode;
use crate::mindmap::NodeKind;

pub(super) const LABEL_MAX_CHARS: usize = 28;
pub(super) const ENTER_SECONDS: f32 = 0.45;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * alpha.clamp(0.0, 1.0)) as u8,
    )
}

pub(super) fn kind_color(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::Root => Color32::from_rgb(139, 124, 246),
        NodeKind::Topic => Color32::from_rgb(96, 165, 250),
        NodeKind::Option => Color32::from_rgb(45, 212, 191),
        NodeKind::Outcome => Color32::from_rgb(251, 191, 36),
        NodeKind::Pro => Color32::from_rgb(74, 222, 128),
        NodeKind::Con => Color32::from_rgb(248, 113, 113),
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(15, 17, 26));

    let step = (48.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let dot = Color32::from_rgba_unmultiplied(90, 100, 130, 60);

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
        while y < rect.bottom() {
            painter.circle_filled(pos2(x, y), 1.0, dot);
            y += step;
        }
        x += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

/// On-screen radius grows with the square root of zoom so labels stay
/// readable when zoomed out.
pub(super) fn screen_radius(world_radius: f32, zoom: f32) -> f32 {
    world_radius * zoom.max(0.0).sqrt()
}

/// Ease-out progress of the entry animation, `1.0` once it is over.
pub(super) fn entry_progress(age: f32) -> f32 {
    let t = (age / ENTER_SECONDS).clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Shape of one parent-child link on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum LinkPath {
    Straight([Pos2; 2]),
    /// Horizontal S-curve; control points share the midpoint x.
    Cubic([Pos2; 4]),
}

impl LinkPath {
    pub(super) fn between(mode: LayoutMode, start: Pos2, end: Pos2) -> Self {
        match mode {
            LayoutMode::Organic => Self::Straight([start, end]),
            LayoutMode::Organized => {
                let mid_x = (start.x + end.x) * 0.5;
                Self::Cubic([start, pos2(mid_x, start.y), pos2(mid_x, end.y), end])
            }
        }
    }

    pub(super) fn draw(self, painter: &Painter, stroke: Stroke) {
        match self {
            Self::Straight(points) => {
                painter.line_segment(points, stroke);
            }
            Self::Cubic(points) => {
                painter.add(eframe::egui::epaint::CubicBezierShape::from_points_stroke(
                    points,
                    false,
                    Color32::TRANSPARENT,
                    stroke,
                ));
            }
        }
    }
}

pub(super) fn label_offset(radius: f32) -> Vec2 {
    vec2(0.0, radius + 10.0)
}

#[cfg(test)]
mod tests {
    use eframe::egui::Rect;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn organic_links_are_straight_and_organized_links_curve() {
        let start = pos2(0.0, 0.0);
        let end = pos2(100.0, 40.0);
        assert_eq!(
            LinkPath::between(LayoutMode::Organic, start, end),
            LinkPath::Straight([start, end])
        );
        assert_eq!(
            LinkPath::between(LayoutMode::Organized, start, end),
            LinkPath::Cubic([start, pos2(50.0, 0.0), pos2(50.0, 40.0), end])
        );
    }

    #[test]
    fn screen_and_world_transforms_invert() {
        let rect = Rect::from_min_size(pos2(10.0, 20.0), vec2(800.0, 600.0));
        let pan = vec2(-35.0, 12.0);
        let world = vec2(140.0, -75.0);
        let screen = world_to_screen(rect, pan, 1.75, world);
        let back = screen_to_world(rect, pan, 1.75, screen);
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn entry_animation_eases_out_and_finishes() {
        assert_eq!(entry_progress(0.0), 0.0);
        assert!(entry_progress(ENTER_SECONDS * 0.5) > 0.5);
        assert_eq!(entry_progress(ENTER_SECONDS), 1.0);
        assert_eq!(entry_progress(10.0), 1.0);
    }

    #[test]
    fn radius_scales_with_square_root_of_zoom() {
        assert_eq!(screen_radius(10.0, 4.0), 20.0);
        assert_eq!(screen_radius(10.0, 0.25), 5.0);
    }

    #[test]
    fn every_kind_has_a_distinct_color() {
        let kinds = [
            NodeKind::Root,
            NodeKind::Topic,
            NodeKind::Option,
            NodeKind::Outcome,
            NodeKind::Pro,
            NodeKind::Con,
        ];
        for (index, kind) in kinds.iter().enumerate() {
            for other in &kinds[index + 1..] {
                assert_ne!(kind_color(*kind), kind_color(*other));
            }
        }
    }
}
