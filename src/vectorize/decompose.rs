//! Pixel-edge outline extraction.
//!
//! Outlines run along pixel edges, so every point lies on the
//! pixel-corner grid and consecutive points are one unit apart. Each edge
//! is walked with the selected pixel on the left, which makes outer
//! boundaries counterclockwise and holes clockwise in the y-up frame.
//! Selected pixels that touch only at a corner belong to one outline.

use crate::bitmap::Mask;
use crate::geom::IntPoint;

/// A closed boundary on the pixel-corner grid (y-up, origin at the
/// bottom-left corner of the mask).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelOutline {
    /// Cyclic: the last point is followed by the first.
    pub points: Vec<IntPoint>,
    /// True for holes.
    pub clockwise: bool,
}

impl PixelOutline {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub type PixelOutlineList = Vec<PixelOutline>;

/// One side of a pixel. The discriminants are the counterclockwise order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Right = 0,
    Top = 1,
    Left = 2,
    Bottom = 3,
}

impl Edge {
    /// Order in which a pixel's edges are tried when starting an outline.
    const START_ORDER: [Edge; 4] = [Edge::Top, Edge::Left, Edge::Bottom, Edge::Right];

    fn from_index(i: u8) -> Self {
        match i % 4 {
            0 => Edge::Right,
            1 => Edge::Top,
            2 => Edge::Left,
            _ => Edge::Bottom,
        }
    }

    /// Next edge counterclockwise on the same pixel.
    fn next(self) -> Self {
        Self::from_index(self as u8 + 1)
    }

    /// Previous edge, i.e. next clockwise.
    fn prev(self) -> Self {
        Self::from_index(self as u8 + 3)
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Direction of travel along the edge, as (row, col) steps.
    fn direction(self) -> (i64, i64) {
        match self {
            Edge::Top => (0, -1),
            Edge::Left => (1, 0),
            Edge::Bottom => (0, 1),
            Edge::Right => (-1, 0),
        }
    }

    /// Offset of the pixel across the edge.
    fn outside(self) -> (i64, i64) {
        match self {
            Edge::Top => (-1, 0),
            Edge::Left => (0, -1),
            Edge::Bottom => (1, 0),
            Edge::Right => (0, 1),
        }
    }

    /// Corner where traversal of this edge of pixel `(row, col)` begins.
    fn start_corner(self, row: i64, col: i64, height: i64) -> IntPoint {
        let (x, y) = match self {
            Edge::Top => (col + 1, height - row),
            Edge::Left => (col, height - row),
            Edge::Bottom => (col, height - row - 1),
            Edge::Right => (col + 1, height - row - 1),
        };
        IntPoint::new(x as i32, y as i32)
    }
}

/// Traversal state: which edges have been walked already.
struct Tracer<'a, M> {
    mask: &'a M,
    width: i64,
    height: i64,
    marks: Vec<u8>,
}

impl<'a, M: Mask> Tracer<'a, M> {
    fn new(mask: &'a M) -> Self {
        let width = mask.width() as i64;
        let height = mask.height() as i64;
        Self {
            mask,
            width,
            height,
            marks: vec![0; (width * height) as usize],
        }
    }

    fn is_black(&self, row: i64, col: i64) -> bool {
        row >= 0
            && col >= 0
            && row < self.height
            && col < self.width
            && self.mask.is_black(row as u32, col as u32)
    }

    /// A black pixel's edge facing a white (or off-mask) pixel.
    fn is_outline(&self, row: i64, col: i64, edge: Edge) -> bool {
        let (dr, dc) = edge.outside();
        self.is_black(row, col) && !self.is_black(row + dr, col + dc)
    }

    fn is_marked(&self, row: i64, col: i64, edge: Edge) -> bool {
        self.marks[(row * self.width + col) as usize] & edge.bit() != 0
    }

    fn mark(&mut self, row: i64, col: i64, edge: Edge) {
        self.marks[(row * self.width + col) as usize] |= edge.bit();
    }

    /// First unwalked outline edge of a pixel, in start order.
    fn unmarked_edge(&self, row: i64, col: i64) -> Option<Edge> {
        Edge::START_ORDER
            .into_iter()
            .find(|&e| self.is_outline(row, col, e) && !self.is_marked(row, col, e))
    }

    /// The edge that continues the outline after `edge` of `(row, col)`.
    fn next_edge(&self, row: i64, col: i64, edge: Edge) -> (i64, i64, Edge) {
        let (dr, dc) = edge.direction();
        let (or, oc) = edge.outside();

        let (diag_row, diag_col) = (row + dr + or, col + dc + oc);
        if self.is_outline(diag_row, diag_col, edge.prev()) {
            return (diag_row, diag_col, edge.prev());
        }

        let (ahead_row, ahead_col) = (row + dr, col + dc);
        if self.is_outline(ahead_row, ahead_col, edge) {
            return (ahead_row, ahead_col, edge);
        }

        (row, col, edge.next())
    }

    fn trace(&mut self, row: i64, col: i64, edge: Edge) -> PixelOutline {
        let clockwise = edge == Edge::Bottom;
        let mut points = Vec::new();
        let (mut r, mut c, mut e) = (row, col, edge);

        loop {
            debug_assert!(self.is_outline(r, c, e));
            self.mark(r, c, e);
            points.push(e.start_corner(r, c, self.height));

            (r, c, e) = self.next_edge(r, c, e);
            if (r, c, e) == (row, col, edge) {
                break;
            }
        }

        debug_assert!(points.windows(2).all(|w| unit_step(w[0], w[1])));
        PixelOutline { points, clockwise }
    }
}

fn unit_step(a: IntPoint, b: IntPoint) -> bool {
    (a.x - b.x).abs() + (a.y - b.y).abs() == 1
}

/// Trace every closed boundary of the mask.
///
/// Pixels are scanned row by row from the top; each selected pixel yields
/// outlines until all of its boundary edges have been walked. An outline
/// first entered through a pixel's bottom edge is a hole.
pub fn decompose<M: Mask>(mask: &M) -> PixelOutlineList {
    let mut tracer = Tracer::new(mask);
    let mut outlines = Vec::new();

    for row in 0..tracer.height {
        for col in 0..tracer.width {
            if !tracer.is_black(row, col) {
                continue;
            }
            while let Some(edge) = tracer.unmarked_edge(row, col) {
                outlines.push(tracer.trace(row, col, edge));
            }
        }
    }

    outlines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{Bitmap, Mask};
    use proptest::prelude::*;

    /// Twice the signed enclosed area. Positive = counterclockwise.
    fn double_area(o: &PixelOutline) -> i64 {
        let n = o.len();
        (0..n)
            .map(|i| {
                let a = o.points[i];
                let b = o.points[(i + 1) % n];
                a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
            })
            .sum()
    }

    fn selected_count(mask: &Bitmap) -> usize {
        let mut count = 0;
        for row in 0..mask.height() {
            for col in 0..mask.width() {
                count += usize::from(mask.get(row, col));
            }
        }
        count
    }

    fn square(size: u32, margin: u32) -> Bitmap {
        let total = size + 2 * margin;
        Bitmap::from_fn(total, total, |r, c| {
            (margin..margin + size).contains(&r) && (margin..margin + size).contains(&c)
        })
    }

    #[test]
    fn empty_mask_has_no_outlines() {
        assert!(decompose(&Bitmap::new(5, 5)).is_empty());
    }

    #[test]
    fn single_pixel_is_four_point_square() {
        let outlines = decompose(&square(1, 0));
        assert_eq!(outlines.len(), 1);
        let o = &outlines[0];
        assert!(!o.clockwise);
        assert_eq!(
            o.points,
            vec![
                IntPoint::new(1, 1),
                IntPoint::new(0, 1),
                IntPoint::new(0, 0),
                IntPoint::new(1, 0),
            ]
        );
        assert_eq!(double_area(o), 2);
    }

    #[test]
    fn square_outline_has_unit_steps_and_corners() {
        let outlines = decompose(&square(10, 0));
        assert_eq!(outlines.len(), 1);
        let o = &outlines[0];
        assert_eq!(o.len(), 40);
        assert!(!o.clockwise);
        assert_eq!(o.points[1], IntPoint::new(0, 10));
        assert_eq!(o.points[11], IntPoint::new(0, 0));
        assert_eq!(o.points[21], IntPoint::new(10, 0));
        assert_eq!(o.points[31], IntPoint::new(10, 10));
        assert!(unit_step(o.points[39], o.points[0]));
    }

    #[test]
    fn margin_does_not_change_shape_only_position() {
        let o = &decompose(&square(3, 2))[0];
        assert_eq!(o.len(), 12);
        assert_eq!(o.points[0], IntPoint::new(3, 5));
    }

    #[test]
    fn annulus_has_counterclockwise_outer_and_clockwise_hole() {
        let mask = Bitmap::from_fn(9, 9, |r, c| {
            let inside_outer = (1..8).contains(&r) && (1..8).contains(&c);
            let inside_hole = (3..6).contains(&r) && (3..6).contains(&c);
            inside_outer && !inside_hole
        });
        let outlines = decompose(&mask);
        assert_eq!(outlines.len(), 2);
        assert!(!outlines[0].clockwise);
        assert!(outlines[1].clockwise);
        assert_eq!(outlines[0].len(), 28);
        assert_eq!(outlines[1].len(), 12);
        assert_eq!(double_area(&outlines[0]), 2 * 49);
        assert_eq!(double_area(&outlines[1]), -2 * 9);
    }

    #[test]
    fn diagonal_pixels_share_one_outline() {
        let mask = Bitmap::from_fn(2, 2, |r, c| r == c);
        let outlines = decompose(&mask);
        assert_eq!(outlines.len(), 1);
        assert_eq!(outlines[0].len(), 8);
    }

    #[test]
    fn single_pixel_hole() {
        let mask = Bitmap::from_fn(3, 3, |r, c| !(r == 1 && c == 1));
        let outlines = decompose(&mask);
        assert_eq!(outlines.len(), 2);
        assert!(outlines[1].clockwise);
        assert_eq!(outlines[1].len(), 4);
    }

    fn mask_strategy() -> impl Strategy<Value = Bitmap> {
        (1u32..8, 1u32..8).prop_flat_map(|(w, h)| {
            prop::collection::vec(any::<bool>(), (w * h) as usize).prop_map(move |bits| {
                Bitmap::from_fn(w, h, |r, c| bits[(r * w + c) as usize])
            })
        })
    }

    fn boundary_edge_count(mask: &Bitmap) -> usize {
        let tracer = Tracer::new(mask);
        let mut count = 0;
        for row in 0..tracer.height {
            for col in 0..tracer.width {
                for e in Edge::START_ORDER {
                    if tracer.is_outline(row, col, e) {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    proptest! {
        #[test]
        fn outlines_are_closed_and_cover_every_boundary_edge(mask in mask_strategy()) {
            let outlines = decompose(&mask);
            let mut total = 0;
            let mut area = 0;
            for o in &outlines {
                prop_assert!(o.len() >= 4);
                for i in 0..o.len() {
                    prop_assert!(unit_step(o.points[i], o.points[(i + 1) % o.len()]));
                }
                prop_assert_eq!(o.clockwise, double_area(o) < 0);
                total += o.len();
                area += double_area(o);
            }
            prop_assert_eq!(total, boundary_edge_count(&mask));
            prop_assert_eq!(area, 2 * selected_count(&mask) as i64);
        }
    }
}
