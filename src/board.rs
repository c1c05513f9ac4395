use crate::Position;

/// Playing field. The border sits on row/column 0 and on `width`/`height`;
/// everything strictly between them is interior.
#[derive(Debug, Clone)]
pub struct Board {
    width: i16,
    height: i16,
    area: Vec<Position>,
}

impl Board {
    pub fn new(width: i16, height: i16) -> Self {
        debug_assert!(width >= 2 && height >= 2, "board must have an interior");

        let mut area = Vec::with_capacity((width as usize - 1) * (height as usize - 1));
        for x in 1..width {
            for y in 1..height {
                area.push((x, y));
            }
        }

        Board { width, height, area }
    }

    pub fn width(&self) -> i16 {
        self.width
    }

    pub fn height(&self) -> i16 {
        self.height
    }

    /// Every interior cell, column by column.
    pub fn area(&self) -> &[Position] {
        &self.area
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.0 > 0 && pos.1 > 0 && pos.0 < self.width && pos.1 < self.height
    }
}
