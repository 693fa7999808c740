//! Shared grid-shape helpers used by several primitive families. Not a
//! primitive module itself (no `register()`); pure `Grid` arithmetic
//! factored out because `2pic_cbind`/`pic_rotate_90ccw`/`pic_autohalves_as_pics`/
//! etc. all reshuffle rows/cols the same handful of ways.

use arc_synth_core::Grid;

/// `np.hstack`: same height required, concatenated column-wise.
pub fn hstack(a: &Grid, b: &Grid) -> Option<Grid> {
    if a.rows() != b.rows() {
        return None;
    }
    let cols = a.cols() + b.cols();
    let mut cells = Vec::with_capacity(a.rows() * cols);
    for r in 0..a.rows() {
        cells.extend_from_slice(a.row(r));
        cells.extend_from_slice(b.row(r));
    }
    Some(Grid::from_cells(a.rows(), cols, cells))
}

/// `np.vstack`: same width required, concatenated row-wise.
pub fn vstack(a: &Grid, b: &Grid) -> Option<Grid> {
    if a.cols() != b.cols() {
        return None;
    }
    let mut cells = Vec::with_capacity((a.rows() + b.rows()) * a.cols());
    cells.extend_from_slice(a.cells());
    cells.extend_from_slice(b.cells());
    Some(Grid::from_cells(a.rows() + b.rows(), a.cols(), cells))
}

/// `np.rot90` (k=1, counter-clockwise): result[r][c] = src[c][w-1-r].
pub fn rotate_90ccw(g: &Grid) -> Grid {
    let (rows, cols) = g.shape();
    let mut cells = vec![0; rows * cols];
    for r in 0..cols {
        for c in 0..rows {
            cells[r * rows + c] = g.get(c, cols - 1 - r);
        }
    }
    Grid::from_cells(cols, rows, cells)
}

pub fn transpose(g: &Grid) -> Grid {
    let (rows, cols) = g.shape();
    let mut cells = vec![0; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            cells[c * rows + r] = g.get(r, c);
        }
    }
    Grid::from_cells(cols, rows, cells)
}

pub fn flip_left_right(g: &Grid) -> Grid {
    let (rows, cols) = g.shape();
    let mut cells = vec![0; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            cells[r * cols + c] = g.get(r, cols - 1 - c);
        }
    }
    Grid::from_cells(rows, cols, cells)
}

pub fn flip_up_down(g: &Grid) -> Grid {
    let (rows, cols) = g.shape();
    let mut cells = vec![0; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            cells[r * cols + c] = g.get(rows - 1 - r, c);
        }
    }
    Grid::from_cells(rows, cols, cells)
}

/// Sub-rectangle `[oy..oy+dy) x [ox..ox+dx)`. `None` if it doesn't fit.
pub fn crop(g: &Grid, oy: usize, ox: usize, dy: usize, dx: usize) -> Option<Grid> {
    let (rows, cols) = g.shape();
    if oy + dy > rows || ox + dx > cols {
        return None;
    }
    let mut cells = Vec::with_capacity(dy * dx);
    for r in oy..oy + dy {
        cells.extend_from_slice(&g.row(r)[ox..ox + dx]);
    }
    Some(Grid::from_cells(dy, dx, cells))
}

/// Bounding box of cells matching `pred`; `None` if no cell matches.
pub fn bounding_box(g: &Grid, pred: impl Fn(i32) -> bool) -> Option<(usize, usize, usize, usize)> {
    let (rows, cols) = g.shape();
    let (mut r0, mut r1, mut c0, mut c1) = (rows, 0usize, cols, 0usize);
    let mut any = false;
    for r in 0..rows {
        for c in 0..cols {
            if pred(g.get(r, c)) {
                any = true;
                r0 = r0.min(r);
                r1 = r1.max(r);
                c0 = c0.min(c);
                c1 = c1.max(c);
            }
        }
    }
    if !any {
        return None;
    }
    Some((r0, c0, r1 - r0 + 1, c1 - c0 + 1))
}

/// Repeat each cell `t` times along both axes (`np.repeat` x2).
pub fn zoom_in(g: &Grid, t: usize) -> Grid {
    let (rows, cols) = g.shape();
    let mut cells = vec![0; rows * t * cols * t];
    let new_cols = cols * t;
    for r in 0..rows {
        for c in 0..cols {
            let v = g.get(r, c);
            for dr in 0..t {
                for dc in 0..t {
                    let rr = r * t + dr;
                    let cc = c * t + dc;
                    cells[rr * new_cols + cc] = v;
                }
            }
        }
    }
    Grid::from_cells(rows * t, new_cols, cells)
}

/// Maximum of each `t x t` block (`np.amax` over reshaped blocks).
pub fn zoom_out(g: &Grid, t: usize) -> Option<Grid> {
    let (rows, cols) = g.shape();
    if rows % t != 0 || cols % t != 0 {
        return None;
    }
    let (ey, ex) = (rows / t, cols / t);
    let mut cells = vec![0; ey * ex];
    for r in 0..ey {
        for c in 0..ex {
            let mut m = 0;
            for dr in 0..t {
                for dc in 0..t {
                    m = m.max(g.get(r * t + dr, c * t + dc));
                }
            }
            cells[r * ex + c] = m;
        }
    }
    Some(Grid::from_cells(ey, ex, cells))
}

/// Tile `pat` to exactly cover `(dy, dx)` (`np.tile` + crop to shape).
pub fn tile_to_shape(pat: &Grid, dy: usize, dx: usize) -> Grid {
    let (oy, ox) = pat.shape();
    let mut cells = vec![0; dy * dx];
    for r in 0..dy {
        for c in 0..dx {
            cells[r * dx + c] = pat.get(r % oy, c % ox);
        }
    }
    Grid::from_cells(dy, dx, cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_90ccw_matches_numpy_rot90() {
        let g = Grid::from_rows(vec![vec![1, 2, 3]]).unwrap();
        let r = rotate_90ccw(&g);
        assert_eq!(r.to_rows(), vec![vec![3], vec![2], vec![1]]);
    }

    #[test]
    fn hstack_requires_equal_height() {
        let a = Grid::from_rows(vec![vec![1]]).unwrap();
        let b = Grid::from_rows(vec![vec![2], vec![3]]).unwrap();
        assert!(hstack(&a, &b).is_none());
    }

    #[test]
    fn crop_out_of_bounds_is_none() {
        let g = Grid::from_rows(vec![vec![1, 2]]).unwrap();
        assert!(crop(&g, 0, 0, 2, 2).is_none());
    }
}
