//! Midpoint line rasterizer: integer points only, no toolkit line primitive.

/// Lazily yields the points of a line from `(x1, y1)` towards `(x2, y2)`.
///
/// Steps one unit along the dominant axis per point and keeps an integer decision
/// variable for the minor axis. The end point itself is not emitted. When `|dx| == |dy|`
/// the y axis is treated as dominant.
#[derive(Debug, Clone)]
pub struct MidpointLine {
    x: i32,
    y: i32,
    x2: i32,
    y2: i32,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    d: i32,
    x_major: bool,
}

impl MidpointLine {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        let dx = (x2 - x1).abs();
        let dy = (y2 - y1).abs();
        let x_major = dx > dy;
        let d = if x_major { 2 * dy - dx } else { 2 * dx - dy };
        Self {
            x: x1,
            y: y1,
            x2,
            y2,
            dx,
            dy,
            sx: if x2 > x1 { 1 } else { -1 },
            sy: if y2 > y1 { 1 } else { -1 },
            d,
            x_major,
        }
    }
}

impl Iterator for MidpointLine {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        let point = (self.x, self.y);
        if self.x_major {
            if self.x == self.x2 {
                return None;
            }
            if self.d > 0 {
                self.y += self.sy;
                self.d -= 2 * self.dx;
            }
            self.d += 2 * self.dy;
            self.x += self.sx;
        } else {
            if self.y == self.y2 {
                return None;
            }
            if self.d > 0 {
                self.x += self.sx;
                self.d -= 2 * self.dy;
            }
            self.d += 2 * self.dx;
            self.y += self.sy;
        }
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.x_major {
            self.x2.abs_diff(self.x)
        } else {
            self.y2.abs_diff(self.y)
        };
        (left as usize, Some(left as usize))
    }
}

impl ExactSizeIterator for MidpointLine {}

pub fn midpoint_line(x1: i32, y1: i32, x2: i32, y2: i32) -> MidpointLine {
    MidpointLine::new(x1, y1, x2, y2)
}

/// Closed square outline with its top-left corner at `(x, y)`: top, right, bottom, left edges.
pub fn block_outline(x: i32, y: i32, size: i32) -> impl Iterator<Item = (i32, i32)> {
    midpoint_line(x, y, x + size, y)
        .chain(midpoint_line(x + size, y, x + size, y + size))
        .chain(midpoint_line(x + size, y + size, x, y + size))
        .chain(midpoint_line(x, y + size, x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line_excludes_end() {
        let pts: Vec<_> = midpoint_line(0, 0, 4, 0).collect();
        assert_eq!(pts, vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
    }

    #[test]
    fn test_reverse_vertical_line() {
        let pts: Vec<_> = midpoint_line(2, 3, 2, 0).collect();
        assert_eq!(pts, vec![(2, 3), (2, 2), (2, 1)]);
    }

    #[test]
    fn test_degenerate_line_is_empty() {
        assert_eq!(midpoint_line(5, 5, 5, 5).count(), 0);
    }

    #[test]
    fn test_diagonal_tie_goes_to_y_axis() {
        // dx == dy: y-major branch, x steps on every point.
        let pts: Vec<_> = midpoint_line(0, 0, 3, 3).collect();
        assert_eq!(pts, vec![(0, 0), (1, 1), (2, 2)]);
        let pts: Vec<_> = midpoint_line(0, 0, -3, 3).collect();
        assert_eq!(pts, vec![(0, 0), (-1, 1), (-2, 2)]);
    }

    #[test]
    fn test_shallow_slope() {
        let pts: Vec<_> = midpoint_line(0, 0, 5, 2).collect();
        assert_eq!(pts, vec![(0, 0), (1, 0), (2, 1), (3, 1), (4, 2)]);
    }

    #[test]
    fn test_steep_negative_slope() {
        let pts: Vec<_> = midpoint_line(0, 0, -2, -5).collect();
        assert_eq!(pts, vec![(0, 0), (0, -1), (-1, -2), (-1, -3), (-2, -4)]);
    }

    #[test]
    fn test_consecutive_points_are_adjacent() {
        let pts: Vec<_> = midpoint_line(-7, 13, 29, -4).collect();
        assert_eq!(pts.len(), 36);
        for w in pts.windows(2) {
            assert!((w[1].0 - w[0].0).abs() <= 1 && (w[1].1 - w[0].1).abs() <= 1);
        }
    }

    #[test]
    fn test_size_hint_matches_count() {
        let line = midpoint_line(3, -2, -9, 4);
        let hint = line.len();
        assert_eq!(hint, line.count());
    }

    #[test]
    fn test_block_outline_is_closed_square() {
        let pts: Vec<_> = block_outline(10, 20, 3).collect();
        assert_eq!(pts.len(), 12);
        assert_eq!(pts[0], (10, 20));
        assert!(pts.contains(&(13, 20)));
        assert!(pts.contains(&(13, 23)));
        assert!(pts.contains(&(10, 23)));
        assert!(pts.iter().all(|&(x, y)| x == 10 || x == 13 || y == 20 || y == 23));
    }
}
