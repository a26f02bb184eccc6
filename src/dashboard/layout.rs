use ratatui::layout::Rect;

/// Cells between columns.
pub const COLUMN_GAP: u16 = 2;
/// Rows between stacked cards.
pub const ROW_GAP: u16 = 1;

/// `(max width exclusive, columns)`, narrowest first. Anything wider gets
/// [`DEFAULT_COLUMNS`].
const BREAKPOINTS: [(u16, usize); 3] = [(70, 1), (110, 2), (160, 3)];
const DEFAULT_COLUMNS: usize = 4;

pub fn columns_for_width(width: u16) -> usize {
    BREAKPOINTS
        .iter()
        .find(|(below, _)| width < *below)
        .map(|(_, cols)| *cols)
        .unwrap_or(DEFAULT_COLUMNS)
}

/// Width of one column when `width` cells are split for masonry.
pub fn column_width(width: u16) -> u16 {
    let columns = columns_for_width(width) as u16;
    width.saturating_sub(COLUMN_GAP * (columns - 1)) / columns
}

/// Masonry placement: each card, in order, goes to the currently shortest
/// column (leftmost on ties). Returns one rect per card height, clipped to
/// `area`; a card that starts below the area gets a zero-height rect.
pub fn masonry(area: Rect, heights: &[u16]) -> Vec<Rect> {
    let columns = columns_for_width(area.width);
    let col_width = column_width(area.width);

    let mut filled = vec![0u16; columns];
    let mut rects = Vec::with_capacity(heights.len());

    for &height in heights {
        let (col, used) = filled
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|&(i, used)| (used, i))
            .unwrap_or((0, 0));

        let x = area.x + col as u16 * (col_width + COLUMN_GAP);
        let y = area.y.saturating_add(used);
        let visible = area.bottom().saturating_sub(y).min(height);
        rects.push(Rect {
            x,
            y: y.min(area.bottom()),
            width: col_width,
            height: visible,
        });

        filled[col] = used.saturating_add(height).saturating_add(ROW_GAP);
    }

    rects
}
