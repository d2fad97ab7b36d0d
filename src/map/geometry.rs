use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_pixel(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Draw a closed outline through projected vertices, skipping edges that
/// cannot touch a `width` x `height` canvas.
pub fn draw_polygon(canvas: &mut BrailleCanvas, points: &[(i32, i32)], width: i32, height: i32) {
    if points.len() < 2 {
        return;
    }

    let edges = points.iter().zip(points.iter().cycle().skip(1));
    for (&(x0, y0), &(x1, y1)) in edges {
        let off_canvas = x0.max(x1) < 0 || x0.min(x1) >= width || y0.max(y1) < 0 || y0.min(y1) >= height;
        if !off_canvas {
            draw_line(canvas, x0, y0, x1, y1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        // Top dots of every cell
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_polygon_closes() {
        let mut canvas = BrailleCanvas::new(4, 2);
        draw_polygon(&mut canvas, &[(0, 0), (7, 0), (7, 7), (0, 7)], 8, 8);
        let s = canvas.to_string();
        // Corners and both vertical edges are set
        assert!(s.starts_with('⡏'));
        assert!(s.ends_with('⣸'));
    }

    #[test]
    fn test_polygon_off_canvas_draws_nothing() {
        let mut canvas = BrailleCanvas::new(2, 2);
        draw_polygon(&mut canvas, &[(-50, -50), (-40, -50), (-40, -40)], 4, 8);
        assert_eq!(canvas.cells().count(), 0);
    }
}
