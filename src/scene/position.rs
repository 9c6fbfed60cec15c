use crate::foundation::core::{Point, Size};
use crate::scene::model::{Anchor, Position};

/// Resolve a template position into absolute canvas pixels.
///
/// Pixel points pass through unchanged; anchors are computed from `canvas`; anchor offsets are
/// added afterwards.
pub fn resolve(position: Position, canvas: Size) -> Point {
    match position {
        Position::Pixel(p) => p,
        Position::Anchor(anchor) => anchor_point(anchor, canvas),
        Position::Offset { anchor, offset } => anchor_point(anchor, canvas) + offset,
    }
}

/// Top-left corner of a box of `size` centered on `center`, rounded to whole pixels.
pub fn center_to_top_left(center: Point, size: Size) -> Point {
    Point::new(
        (center.x - f64::from(size.width) / 2.0).round(),
        (center.y - f64::from(size.height) / 2.0).round(),
    )
}

fn anchor_point(anchor: Anchor, canvas: Size) -> Point {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    let (x, y) = match anchor {
        Anchor::Center => (w / 2.0, h / 2.0),
        Anchor::TopCenter => (w / 2.0, 0.0),
        Anchor::BottomCenter => (w / 2.0, h),
        Anchor::LeftCenter => (0.0, h / 2.0),
        Anchor::RightCenter => (w, h / 2.0),
        Anchor::TopLeft => (0.0, 0.0),
        Anchor::TopRight => (w, 0.0),
        Anchor::BottomLeft => (0.0, h),
        Anchor::BottomRight => (w, h),
    };
    Point::new(x, y)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/position.rs"]
mod tests;
