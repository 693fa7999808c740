//! Single-grid (and single-grid-plus-scalar/tuple) morphology. Grounded on
//! `BopForward.py`'s `pat_*`/`pic_*` single-subject family. See
//! `combine.rs` for the argument-order convention shared by every module
//! here (`args[i]` is the original function's `i`-th positional parameter).

use super::grid_ops::{crop, flip_left_right, flip_up_down, rotate_90ccw, transpose, zoom_in, zoom_out};
use super::{Primitive, PrimitiveRegistry};
use arc_synth_core::{Grid, Mask, Type, Value};

fn grid(v: &Value) -> &Grid {
    v.as_grid().expect("type-checked by executor")
}

fn int(v: &Value) -> i32 {
    v.as_integer().expect("type-checked by executor")
}

fn int_pair(v: &Value) -> (i32, i32) {
    v.as_int_pair().expect("type-checked by executor")
}

pub fn register(reg: &mut PrimitiveRegistry) {
    reg.register(Primitive::pure("pat_flip_left_right", &[Type::MaskedGrid], Type::MaskedGrid, |a| {
        let (pic, mask) = a[0].as_masked_grid().expect("type-checked");
        Value::MaskedGrid(flip_left_right(pic), flip_mask_lr(mask))
    }));

    reg.register(Primitive::pure("pat_flip_up_down", &[Type::MaskedGrid], Type::MaskedGrid, |a| {
        let (pic, mask) = a[0].as_masked_grid().expect("type-checked");
        Value::MaskedGrid(flip_up_down(pic), flip_mask_ud(mask))
    }));

    reg.register(Primitive::pure(
        "pat_nesw_drag_all",
        &[Type::MaskedGrid, Type::Nesw],
        Type::MaskedGrid,
        |a| {
            let (pic, mask) = a[0].as_masked_grid().expect("type-checked");
            let nesw = a[1].as_nesw().expect("type-checked");
            let (dpic, dmask) = nesw_drag(pic, mask, nesw);
            Value::MaskedGrid(dpic, dmask)
        },
    ));

    reg.register(Primitive::pure(
        "pic_2intp_crop",
        &[Type::Grid, Type::IntPair, Type::IntPair],
        Type::Grid,
        |a| {
            let pic = grid(&a[0]);
            let (oy, ox) = int_pair(&a[1]);
            let (dy, dx) = int_pair(&a[2]);
            match crop(pic, oy as usize, ox as usize, dy as usize, dx as usize) {
                Some(g) => Value::Grid(g),
                None => Value::error("Image too small for required crop"),
            }
        },
    ));

    reg.register(Primitive::pure("pic_int_copy_border", &[Type::Grid, Type::Integer], Type::Grid, |a| {
        let mut pic = grid(&a[0]).clone();
        let tt = int(&a[1]).max(0) as usize;
        for _ in 0..tt {
            let (rows, cols) = pic.shape();
            let mut cells = Vec::with_capacity(rows * (cols + 2));
            for r in 0..rows {
                let row = pic.row(r);
                cells.push(row[0]);
                cells.extend_from_slice(row);
                cells.push(row[cols - 1]);
            }
            let mut g = Grid::from_cells(rows, cols + 2, cells);
            let (rows, cols) = g.shape();
            let top = g.row(0).to_vec();
            let bot = g.row(rows - 1).to_vec();
            let mut cells2 = Vec::with_capacity((rows + 2) * cols);
            cells2.extend_from_slice(&top);
            cells2.extend_from_slice(g.cells());
            cells2.extend_from_slice(&bot);
            g = Grid::from_cells(rows + 2, cols, cells2);
            pic = g;
        }
        Value::Grid(pic)
    }));

    reg.register(Primitive::pure("pic_int_empty_border", &[Type::Grid, Type::Integer], Type::Grid, |a| {
        let (rows, cols) = grid(&a[0]).shape();
        let cc = int(&a[1]);
        let mut g = Grid::filled(rows, cols, 0);
        for c in 0..cols {
            g.set(0, c, cc);
            g.set(rows - 1, c, cc);
        }
        for r in 0..rows {
            g.set(r, 0, cc);
            g.set(r, cols - 1, cc);
        }
        Value::Grid(g)
    }));

    reg.register(Primitive::pure("pic_int_filter_color", &[Type::Grid, Type::Integer], Type::Grid, |a| {
        let cc = int(&a[1]);
        Value::Grid(grid(&a[0]).map(|v| if v == cc { v } else { 0 }))
    }));

    reg.register(Primitive::pure("pic_int_recolor_all", &[Type::Grid, Type::Integer], Type::Grid, |a| {
        let col = int(&a[1]);
        Value::Grid(grid(&a[0]).map(|v| if v != 0 { col } else { 0 }))
    }));

    reg.register(Primitive::pure("pic_int_slide_rows_west", &[Type::Grid, Type::Integer], Type::Grid, |a| {
        let mut pic = grid(&a[0]).clone();
        let hh = int(&a[1]);
        let (_, ww) = pic.shape();
        // Mirrors the reversed(range(hh-1))/range(1,hh) zip: as xx grows
        // 1..hh, yy counts down from hh-2..0, each row sliding left by xx.
        let mut xx = 1usize;
        let mut yy = (hh - 2).max(-1);
        while yy >= 0 && (xx as i32) < hh {
            let y = yy as usize;
            if xx < ww {
                let mut row = pic.row(y)[xx..ww].to_vec();
                row.resize(ww, 0);
                for (c, v) in row.into_iter().enumerate() {
                    pic.set(y, c, v);
                }
            } else {
                for c in 0..ww {
                    pic.set(y, c, 0);
                }
            }
            yy -= 1;
            xx += 1;
        }
        Value::Grid(pic)
    }));

    reg.register(Primitive::pure("pic_int_zoom_in", &[Type::Grid, Type::Integer], Type::Grid, |a| {
        let tt = int(&a[1]).max(1) as usize;
        Value::Grid(zoom_in(grid(&a[0]), tt))
    }));

    reg.register(Primitive::pure("pic_int_zoom_out", &[Type::Grid, Type::Integer], Type::Grid, |a| {
        let tt = int(&a[1]).max(1) as usize;
        match zoom_out(grid(&a[0]), tt) {
            Some(g) => Value::Grid(g),
            None => Value::error("Wrong shapes for scale"),
        }
    }));

    reg.register(Primitive::pure("pic_intp_recolor", &[Type::Grid, Type::IntPair], Type::Grid, |a| {
        let (c1, c2) = int_pair(&a[1]);
        Value::Grid(grid(&a[0]).map(|v| if v == c1 { c2 } else { v }))
    }));

    reg.register(Primitive::pure("pic_intp_select_columns", &[Type::Grid, Type::IntPair], Type::Grid, |a| {
        let pic = grid(&a[0]);
        let (ox, ex) = int_pair(&a[1]);
        if ox < 0 || ex < ox || ex as usize > pic.cols() {
            return Value::error("Column range out of bounds");
        }
        let (ox, ex) = (ox as usize, ex as usize);
        let rows = pic.rows();
        let mut cells = Vec::with_capacity(rows * (ex - ox));
        for r in 0..rows {
            cells.extend_from_slice(&pic.row(r)[ox..ex]);
        }
        Value::Grid(Grid::from_cells(rows, ex - ox, cells))
    }));

    reg.register(Primitive::pure("pic_intp_swap_colors", &[Type::Grid, Type::IntPair], Type::Grid, |a| {
        let (c1, c2) = int_pair(&a[1]);
        Value::Grid(grid(&a[0]).map(|v| if v == c1 { c2 } else if v == c2 { c1 } else { v }))
    }));

    reg.register(Primitive::pure("pic_intp_zoom_fit", &[Type::Grid, Type::IntPair], Type::Grid, |a| {
        let pic = grid(&a[0]);
        let (oy, ox) = pic.shape();
        let (ey, ex) = int_pair(&a[1]);
        let (ey, ex) = (ey as usize, ex as usize);
        if oy < ey {
            let tt = ey / oy;
            if ey != oy * tt || ex != ox * tt {
                return Value::error("Not an integer scale for zoom_in");
            }
            return Value::Grid(zoom_in(pic, tt));
        }
        if oy > ey {
            let tt = oy / ey;
            if oy != ey * tt || ox != ex * tt {
                return Value::error("Not an integer scale for zoom_out");
            }
            return match zoom_out(pic, tt) {
                Some(g) => Value::Grid(g),
                None => Value::error("Wrong shapes for scale"),
            };
        }
        if ox != ex {
            return Value::error("X scale != Y scale");
        }
        Value::Grid(pic.clone())
    }));

    reg.register(Primitive::pure("pic_nesw_extend", &[Type::Grid, Type::Nesw], Type::Grid, |a| {
        let pic = grid(&a[0]);
        let nesw = a[1].as_nesw().expect("type-checked");
        Value::Grid(nesw_extend(pic, nesw))
    }));

    reg.register(Primitive::pure("pic_nesw_gravity", &[Type::Grid, Type::Nesw], Type::Grid, |a| {
        let mut pic = grid(&a[0]).clone();
        let nesw = a[1].as_nesw().expect("type-checked");
        let (hh, ww) = pic.shape();

        if nesw.north > 0 {
            let n = nesw.north as usize;
            for y in 0..hh.saturating_sub(n) {
                for x in 0..ww {
                    if pic.get(y, x) == 0 {
                        pic.set(y, x, pic.get(y + n, x));
                        pic.set(y + n, x, 0);
                    }
                }
            }
        }
        if nesw.east > 0 {
            let e = nesw.east as usize;
            for x in (0..ww.saturating_sub(e)).rev() {
                for y in 0..hh {
                    if pic.get(y, x + e) == 0 {
                        pic.set(y, x + e, pic.get(y, x));
                        pic.set(y, x, 0);
                    }
                }
            }
        }
        if nesw.south > 0 {
            let s = nesw.south as usize;
            for y in (0..hh.saturating_sub(s)).rev() {
                for x in 0..ww {
                    if pic.get(y + s, x) == 0 {
                        pic.set(y + s, x, pic.get(y, x));
                        pic.set(y, x, 0);
                    }
                }
            }
        }
        if nesw.west > 0 {
            let w = nesw.west as usize;
            for x in 0..ww.saturating_sub(w) {
                for y in 0..hh {
                    if pic.get(y, x) == 0 {
                        pic.set(y, x, pic.get(y, x + w));
                        pic.set(y, x + w, 0);
                    }
                }
            }
        }
        Value::Grid(pic)
    }));

    reg.register(Primitive::pure("pic_outline_4n", &[Type::Grid], Type::Grid, |a| {
        let pic = grid(&a[0]);
        let (hh, ww) = pic.shape();
        let mut out = pic.clone();
        for y in 0..hh {
            for x in 0..ww {
                let c = pic.get(y, x);
                if c == 0 {
                    continue;
                }
                let n = if y > 0 { pic.get(y - 1, x) } else { 0 };
                let s = if y + 1 < hh { pic.get(y + 1, x) } else { 0 };
                let w = if x + 1 < ww { pic.get(y, x + 1) } else { 0 };
                let e = if x > 0 { pic.get(y, x - 1) } else { 0 };
                if n == c && s == c && w == c && e == c {
                    out.set(y, x, 0);
                }
            }
        }
        Value::Grid(out)
    }));

    reg.register(Primitive::pure("pic_rotate_90ccw", &[Type::Grid], Type::Grid, |a| {
        Value::Grid(rotate_90ccw(grid(&a[0])))
    }));

    reg.register(Primitive::pure("pic_transpose", &[Type::Grid], Type::Grid, |a| {
        Value::Grid(transpose(grid(&a[0])))
    }));

    reg.register(Primitive::pure("pic_two_col_reverse", &[Type::Grid], Type::Grid, |a| {
        let pic = grid(&a[0]);
        let colors = pic.distinct_colors();
        if colors.len() != 2 {
            return Value::error("Only two colors expected");
        }
        let (c0, c1) = (colors[0], colors[1]);
        Value::Grid(pic.map(|v| if v == c0 { c1 } else { c0 }))
    }));

    reg.register(Primitive::pure("pic_v_axis", &[Type::Grid], Type::Grid, |a| {
        let pic = grid(&a[0]);
        let (hh, ww) = pic.shape();
        if ww % 2 != 1 {
            return Value::error("pic_v_axis() expects odd width");
        }
        let mut g = Grid::filled(hh, ww, 0);
        for r in 0..hh {
            g.set(r, ww / 2, 1);
        }
        Value::Grid(g)
    }));

    reg.register(Primitive::pure("pic_vec_recolor_each", &[Type::Grid, Type::Vector], Type::Grid, |a| {
        let pic = grid(&a[0]);
        let vv = a[1].as_vector().expect("type-checked");
        if vv.is_empty() {
            return Value::error("Empty vector");
        }
        let (hh, ww) = pic.shape();
        let n = vv.len();
        let mut cells = vec![0; hh * ww];
        for (i, cell) in cells.iter_mut().enumerate() {
            *cell = vv[i % n];
        }
        Value::Grid(Grid::from_cells(hh, ww, cells))
    }));

    reg.register(Primitive::pure("pic_corners", &[Type::Grid], Type::Grid, |a| {
        let (ey, ex) = grid(&a[0]).shape();
        let mut g = Grid::filled(ey, ex, 0);
        g.set(0, 0, 1);
        g.set(0, ex - 1, 1);
        g.set(ey - 1, 0, 1);
        g.set(ey - 1, ex - 1, 1);
        Value::Grid(g)
    }));

    reg.register(Primitive::pure("pic_filter_axes", &[Type::Grid], Type::Grid, |a| {
        let pic = grid(&a[0]);
        let (hh, ww) = pic.shape();
        let mut keep = vec![false; hh * ww];
        for x in 0..ww {
            let cc = pic.get(0, x);
            if (0..hh).all(|y| pic.get(y, x) == cc) {
                for y in 0..hh {
                    keep[y * ww + x] = true;
                }
            }
        }
        for y in 0..hh {
            let cc = pic.get(y, 0);
            if (0..ww).all(|x| pic.get(y, x) == cc) {
                for x in 0..ww {
                    keep[y * ww + x] = true;
                }
            }
        }
        let cells: Vec<i32> = (0..hh * ww).map(|i| if keep[i] { pic.cells()[i] } else { 0 }).collect();
        Value::Grid(Grid::from_cells(hh, ww, cells))
    }));

    reg.register(Primitive::pure("pic_filter_leastfreq_col", &[Type::Grid], Type::Grid, |a| {
        Value::Grid(filter_by_freq(grid(&a[0]), true))
    }));

    reg.register(Primitive::pure("pic_filter_mostfreq_col", &[Type::Grid], Type::Grid, |a| {
        Value::Grid(filter_by_freq(grid(&a[0]), false))
    }));
}

fn flip_mask_lr(m: &Mask) -> Mask {
    let (rows, cols) = m.shape();
    let mut bits = vec![false; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            bits[r * cols + c] = m.get(r, cols - 1 - c);
        }
    }
    Mask::new(rows, cols, bits)
}

fn flip_mask_ud(m: &Mask) -> Mask {
    let (rows, cols) = m.shape();
    let mut bits = vec![false; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            bits[r * cols + c] = m.get(rows - 1 - r, c);
        }
    }
    Mask::new(rows, cols, bits)
}

/// Drag: shift content in each NESW direction by that many cells, filling
/// the vacated border with black/unselected and discarding whatever falls
/// off the far edge (as opposed to `nesw_extend`, which grows the canvas).
fn nesw_drag(pic: &Grid, mask: &Mask, nesw: arc_synth_core::Nesw) -> (Grid, Mask) {
    let (hh, ww) = pic.shape();
    let mut cells = pic.cells().to_vec();
    let mut bits = mask.bits().to_vec();

    if nesw.north > 0 {
        let n = nesw.north as usize;
        let mut nc = vec![0; hh * ww];
        let mut nb = vec![false; hh * ww];
        for r in 0..hh {
            if r + n < hh {
                nc[r * ww..(r + 1) * ww].copy_from_slice(&cells[(r + n) * ww..(r + n + 1) * ww]);
                nb[r * ww..(r + 1) * ww].copy_from_slice(&bits[(r + n) * ww..(r + n + 1) * ww]);
            }
        }
        cells = nc;
        bits = nb;
    }
    if nesw.east > 0 {
        let e = nesw.east as usize;
        let mut nc = vec![0; hh * ww];
        let mut nb = vec![false; hh * ww];
        for r in 0..hh {
            for c in 0..ww {
                if c >= e {
                    nc[r * ww + c] = cells[r * ww + (c - e)];
                    nb[r * ww + c] = bits[r * ww + (c - e)];
                }
            }
        }
        cells = nc;
        bits = nb;
    }
    if nesw.south > 0 {
        let s = nesw.south as usize;
        let mut nc = vec![0; hh * ww];
        let mut nb = vec![false; hh * ww];
        for r in 0..hh {
            if r >= s {
                nc[r * ww..(r + 1) * ww].copy_from_slice(&cells[(r - s) * ww..(r - s + 1) * ww]);
                nb[r * ww..(r + 1) * ww].copy_from_slice(&bits[(r - s) * ww..(r - s + 1) * ww]);
            }
        }
        cells = nc;
        bits = nb;
    }
    if nesw.west > 0 {
        let w = nesw.west as usize;
        let mut nc = vec![0; hh * ww];
        let mut nb = vec![false; hh * ww];
        for r in 0..hh {
            for c in 0..ww {
                if c + w < ww {
                    nc[r * ww + c] = cells[r * ww + (c + w)];
                    nb[r * ww + c] = bits[r * ww + (c + w)];
                }
            }
        }
        cells = nc;
        bits = nb;
    }

    (Grid::from_cells(hh, ww, cells), Mask::new(hh, ww, bits))
}

fn nesw_extend(pic: &Grid, nesw: arc_synth_core::Nesw) -> Grid {
    let (hh, ww) = pic.shape();
    let (n, e, s, w) = (nesw.north as usize, nesw.east as usize, nesw.south as usize, nesw.west as usize);
    let new_h = hh + n + s;
    let new_w = ww + e + w;
    let mut cells = vec![0; new_h * new_w];
    for r in 0..hh {
        for c in 0..ww {
            cells[(r + n) * new_w + (c + w)] = pic.get(r, c);
        }
    }
    Grid::from_cells(new_h, new_w, cells)
}

/// `np.argmin`/`np.argmax` over `np.unique` counts both return the *first*
/// tied index, so both branches walk ascending and only replace on strict
/// improvement (`Iterator::max_by_key` would wrongly favor the last tie).
fn filter_by_freq(pic: &Grid, least: bool) -> Grid {
    let mut counts = [0usize; 10];
    for &c in pic.cells() {
        counts[c as usize] += 1;
    }
    let mut target = (0..10).find(|&c| counts[c] > 0).unwrap_or(0);
    for c in (target + 1)..10 {
        if counts[c] == 0 {
            continue;
        }
        let better = if least { counts[c] < counts[target] } else { counts[c] > counts[target] };
        if better {
            target = c;
        }
    }
    pic.map(|v| if v == target as i32 { v } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::{execute, VmState};

    fn g(rows: Vec<Vec<i32>>) -> Value {
        Value::Grid(Grid::from_rows(rows).unwrap())
    }

    #[test]
    fn rotate_90ccw_single_row_becomes_column() {
        let reg = super::super::default_registry();
        let mut s = VmState::new();
        let prog = vec![g(vec![vec![1, 2, 3]]), Value::Function(reg.get("pic_rotate_90ccw").unwrap().handle())];
        let result = execute(&mut s, &reg, &prog).unwrap();
        assert_eq!(result, g(vec![vec![3], vec![2], vec![1]]));
    }

    #[test]
    fn two_col_reverse_swaps_the_only_two_colors() {
        let reg = super::super::default_registry();
        let mut s = VmState::new();
        let prog =
            vec![g(vec![vec![1, 2, 3], vec![3, 2, 1]]), Value::Function(reg.get("pic_two_col_reverse").unwrap().handle())];
        execute(&mut s, &reg, &prog);
        assert!(!s.ok);
        match s.stack.last() {
            Some(Value::Error(msg)) => assert!(msg.starts_with("Only two colors expected")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn zoom_in_repeats_each_pixel() {
        let reg = super::super::default_registry();
        let mut s = VmState::new();
        let prog = vec![
            g(vec![vec![1, 2]]),
            Value::Integer(2),
            Value::Function(reg.get("pic_int_zoom_in").unwrap().handle()),
        ];
        let result = execute(&mut s, &reg, &prog).unwrap();
        assert_eq!(result, g(vec![vec![1, 1, 2, 2], vec![1, 1, 2, 2]]));
    }

    fn gravity(nesw: arc_synth_core::Nesw, pic: Value) -> Value {
        let reg = super::super::default_registry();
        let mut s = VmState::new();
        let prog = vec![pic, Value::Nesw(nesw), Value::Function(reg.get("pic_nesw_gravity").unwrap().handle())];
        execute(&mut s, &reg, &prog).unwrap()
    }

    #[test]
    fn gravity_north_pulls_a_value_up_toward_row_zero() {
        let result = gravity(arc_synth_core::Nesw::new(1, 0, 0, 0).unwrap(), g(vec![vec![0], vec![5]]));
        assert_eq!(result, g(vec![vec![5], vec![0]]));
    }

    #[test]
    fn gravity_south_pulls_a_value_down_toward_the_last_row() {
        let result = gravity(arc_synth_core::Nesw::new(0, 0, 1, 0).unwrap(), g(vec![vec![5], vec![0]]));
        assert_eq!(result, g(vec![vec![0], vec![5]]));
    }

    #[test]
    fn gravity_east_pulls_a_value_right_toward_the_last_column() {
        let result = gravity(arc_synth_core::Nesw::new(0, 1, 0, 0).unwrap(), g(vec![vec![5, 0]]));
        assert_eq!(result, g(vec![vec![0, 5]]));
    }

    #[test]
    fn gravity_west_pulls_a_value_left_toward_column_zero() {
        let result = gravity(arc_synth_core::Nesw::new(0, 0, 0, 1).unwrap(), g(vec![vec![0, 5]]));
        assert_eq!(result, g(vec![vec![5, 0]]));
    }

    #[test]
    fn slide_rows_west_shifts_rows_further_from_the_band_edge_by_more() {
        // hh=3 only touches rows (hh-2)..=0, shifting row `y` left by `hh-1-y`:
        // row 1 slides left by 1, row 0 slides left by 2, rows below are untouched.
        let reg = super::super::default_registry();
        let mut s = VmState::new();
        let prog = vec![
            g(vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8], vec![9, 9, 9, 9], vec![1, 1, 1, 1]]),
            Value::Integer(3),
            Value::Function(reg.get("pic_int_slide_rows_west").unwrap().handle()),
        ];
        let result = execute(&mut s, &reg, &prog).unwrap();
        assert_eq!(result, g(vec![vec![3, 4, 0, 0], vec![6, 7, 8, 0], vec![9, 9, 9, 9], vec![1, 1, 1, 1]]));
    }
}
