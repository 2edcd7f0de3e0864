//! Rectangles.

use cgmath::{Point2, Vector2, Zero};

/// A rectangle; also the placement record of [`AbsoluteLayout`](crate::layout::AbsoluteLayout).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Rectangle origin.
    pub origin: Point2<f64>,

    /// Rectangle size.
    pub size: Vector2<f64>,
}

impl Rect {
    /// Creates a new rectangle from its origin coordinates and dimensions.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Rect {
        Rect {
            origin: Point2::new(x, y),
            size: Vector2::new(width, height),
        }
    }

    /// Returns a zero-sized rectangle at the origin.
    pub fn zero() -> Rect {
        Rect {
            origin: Point2::new(0., 0.),
            size: Vector2::zero(),
        }
    }
}

impl Default for Rect {
    fn default() -> Self {
        Rect::zero()
    }
}

#[test]
fn test_absolute_placement() {
    use crate::component::Component;
    use crate::layout::AbsoluteLayout;
    use crate::tree::ComponentTree;

    let mut tree = ComponentTree::new();
    let canvas = tree.create_container(Component::new("canvas"), AbsoluteLayout);
    let a = tree.create(Component::new("a"));
    let b = tree.create(Component::new("b"));
    tree.add(canvas, a).unwrap();
    tree.add_with(canvas, b, Rect::from_xywh(4., 8., 20., 10.)).unwrap();

    assert_eq!(tree.constraints_as::<Rect>(a), Some(&Rect::default()));
    let placed = tree.constraints_as::<Rect>(b).unwrap();
    assert_eq!(placed.origin, Point2::new(4., 8.));
    assert_eq!(placed.size, Vector2::new(20., 10.));
}
