// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Intersection geometry.

use kurbo::Rect;

/// Shrinks `viewport` by `margin` on every side.
///
/// A margin larger than half the viewport yields an empty root at the
/// viewport's center.
#[must_use]
pub fn observation_root(viewport: Rect, margin: f64) -> Rect {
    let viewport = viewport.abs();
    let center = viewport.center();
    let x0 = (viewport.x0 + margin).min(center.x);
    let y0 = (viewport.y0 + margin).min(center.y);
    let x1 = (viewport.x1 - margin).max(center.x);
    let y1 = (viewport.y1 - margin).max(center.y);
    Rect::new(x0, y0, x1, y1)
}

/// Result of intersecting one element with the observation root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// The element touches the root.
    pub intersecting: bool,
    /// Visible fraction of the element's area, in `0.0..=1.0`.
    pub ratio: f64,
}

/// Intersects `bounds` with `root`.
///
/// Edge-adjacent boxes count as intersecting with a zero ratio. A zero-area
/// element that touches the root has a ratio of 1.
#[must_use]
pub fn intersect(bounds: Rect, root: Rect) -> Intersection {
    let bounds = bounds.abs();
    let x0 = bounds.x0.max(root.x0);
    let y0 = bounds.y0.max(root.y0);
    let x1 = bounds.x1.min(root.x1);
    let y1 = bounds.y1.min(root.y1);
    if x0 > x1 || y0 > y1 {
        return Intersection {
            intersecting: false,
            ratio: 0.0,
        };
    }
    let area = bounds.area();
    let ratio = if area > 0.0 {
        (Rect::new(x0, y0, x1, y1).area() / area).clamp(0.0, 1.0)
    } else {
        1.0
    };
    Intersection {
        intersecting: true,
        ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_inset_on_every_side() {
        let root = observation_root(Rect::new(0.0, 0.0, 400.0, 800.0), 120.0);
        assert_eq!(root, Rect::new(120.0, 120.0, 280.0, 680.0));
    }

    #[test]
    fn oversized_margin_collapses_to_center() {
        let root = observation_root(Rect::new(0.0, 0.0, 100.0, 100.0), 80.0);
        assert_eq!(root, Rect::new(50.0, 50.0, 50.0, 50.0));
    }

    #[test]
    fn partial_overlap_ratio() {
        let root = Rect::new(0.0, 0.0, 100.0, 100.0);
        let hit = intersect(Rect::new(0.0, 50.0, 100.0, 150.0), root);
        assert!(hit.intersecting);
        assert!((hit.ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn disjoint_is_not_intersecting() {
        let root = Rect::new(0.0, 0.0, 100.0, 100.0);
        let miss = intersect(Rect::new(0.0, 200.0, 100.0, 300.0), root);
        assert_eq!(
            miss,
            Intersection {
                intersecting: false,
                ratio: 0.0
            }
        );
    }

    #[test]
    fn edge_contact_has_zero_ratio() {
        let root = Rect::new(0.0, 0.0, 100.0, 100.0);
        let touch = intersect(Rect::new(0.0, 100.0, 100.0, 200.0), root);
        assert!(touch.intersecting);
        assert_eq!(touch.ratio, 0.0);
    }
}
