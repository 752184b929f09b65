//! Braille dot canvas.
//!
//! Each terminal cell packs a 2x4 dot grid (U+2800 block). Dots carry a small
//! tag; when a cell holds dots with different tags the highest one wins, so
//! arcs and markers stay visible over country fill.

/// Dot offsets within a cell mapped to braille bit values.
const DOT_BITS: [[u8; 2]; 4] = [
    [0x01, 0x08],
    [0x02, 0x10],
    [0x04, 0x20],
    [0x40, 0x80],
];

pub struct BrailleCanvas {
    dot_w: usize,
    dot_h: usize,
    dots: Vec<u8>,
}

impl BrailleCanvas {
    /// Canvas sized for a terminal of `cells_w` x `cells_h` cells.
    pub fn new(cells_w: usize, cells_h: usize) -> Self {
        Self {
            dot_w: cells_w * 2,
            dot_h: cells_h * 4,
            dots: vec![0; cells_w * 2 * cells_h * 4],
        }
    }

    pub fn resize(&mut self, cells_w: usize, cells_h: usize) {
        self.dot_w = cells_w * 2;
        self.dot_h = cells_h * 4;
        self.dots = vec![0; self.dot_w * self.dot_h];
    }

    pub fn clear(&mut self) {
        self.dots.fill(0);
    }

    /// Dot-space dimensions (2x and 4x the cell dimensions).
    pub fn dot_size(&self) -> (usize, usize) {
        (self.dot_w, self.dot_h)
    }

    /// Set one dot; out-of-bounds is ignored, higher tags win.
    pub fn set_dot(&mut self, x: i32, y: i32, tag: u8) {
        if x < 0 || y < 0 || x as usize >= self.dot_w || y as usize >= self.dot_h {
            return;
        }
        let idx = y as usize * self.dot_w + x as usize;
        if self.dots[idx] < tag {
            self.dots[idx] = tag;
        }
    }

    /// Bresenham line in dot space.
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, tag: u8) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);
        loop {
            self.set_dot(x, y, tag);
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

    /// Filled diamond blot, used for endpoint markers.
    pub fn blot(&mut self, cx: i32, cy: i32, radius: i32, tag: u8) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs() + dy.abs() <= radius {
                    self.set_dot(cx + dx, cy + dy, tag);
                }
            }
        }
    }

    /// Non-empty cells as (cell_x, cell_y, braille char, dominant tag).
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, char, u8)> + '_ {
        let cells_w = self.dot_w / 2;
        let cells_h = self.dot_h / 4;
        (0..cells_h).flat_map(move |cy| {
            (0..cells_w).filter_map(move |cx| {
                let mut bits: u8 = 0;
                let mut tag: u8 = 0;
                for row in 0..4 {
                    for col in 0..2 {
                        let dot = self.dots[(cy * 4 + row) * self.dot_w + cx * 2 + col];
                        if dot > 0 {
                            bits |= DOT_BITS[row][col];
                            tag = tag.max(dot);
                        }
                    }
                }
                (bits > 0).then(|| {
                    let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
                    (cx, cy, ch, tag)
                })
            })
        })
    }
}
