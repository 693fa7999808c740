//! Two-grid (and pictures-plus-layout) arithmetic. Grounded on
//! `BopForward.py`'s `2pat_*`/`2pic_*`/`pics_pic_*` family; names keep the
//! original's `bopforward_` prefix stripped, since that catalogue is the
//! authoritative set of ~70 opcodes, not a paraphrased alias list.
//!
//! Argument order follows the original interpreter's calling convention:
//! declared `arg_types` are popped top-of-stack first into `args[0]`, so
//! `args[0]` is the Python function's *first* positional parameter (the
//! value pushed *last*), matching `Core.execute`'s pop loop.

use super::grid_ops::{hstack, tile_to_shape, vstack};
use super::{Primitive, PrimitiveRegistry};
use arc_synth_core::{Grid, Mask, Type, Value};

fn grid(v: &Value) -> &Grid {
    v.as_grid().expect("type-checked by executor")
}

pub fn register(reg: &mut PrimitiveRegistry) {
    reg.register(Primitive::pure(
        "2pat_merge",
        &[Type::MaskedGrid, Type::MaskedGrid],
        Type::MaskedGrid,
        |a| {
            let (pic1, mask1) = a[0].as_masked_grid().expect("type-checked");
            let (pic2, mask2) = a[1].as_masked_grid().expect("type-checked");
            if pic1.shape() != pic2.shape() {
                return Value::error("pic1.shape != pic2.shape");
            }
            let (rows, cols) = pic1.shape();
            let mut cells = vec![0; rows * cols];
            let mut bits = vec![false; rows * cols];
            for r in 0..rows {
                for c in 0..cols {
                    let v1 = if mask1.get(r, c) { pic1.get(r, c) } else { 0 };
                    let v2 = if mask2.get(r, c) { pic2.get(r, c) } else { 0 };
                    cells[r * cols + c] = v1.max(v2);
                    bits[r * cols + c] = mask1.get(r, c) || mask2.get(r, c);
                }
            }
            Value::MaskedGrid(Grid::from_cells(rows, cols, cells), Mask::new(rows, cols, bits))
        },
    ));

    reg.register(Primitive::pure(
        "2pat_merge_as_pic",
        &[Type::MaskedGrid, Type::MaskedGrid],
        Type::Grid,
        |a| {
            let (pic1, mask1) = a[0].as_masked_grid().expect("type-checked");
            let (pic2, mask2) = a[1].as_masked_grid().expect("type-checked");
            if pic1.shape() != pic2.shape() {
                return Value::error("pic1.shape != pic2.shape");
            }
            let (rows, cols) = pic1.shape();
            let mut cells = vec![0; rows * cols];
            for r in 0..rows {
                for c in 0..cols {
                    let v1 = if mask1.get(r, c) { pic1.get(r, c) } else { 0 };
                    let v2 = if mask2.get(r, c) { pic2.get(r, c) } else { 0 };
                    cells[r * cols + c] = v1.max(v2);
                }
            }
            Value::Grid(Grid::from_cells(rows, cols, cells))
        },
    ));

    reg.register(Primitive::pure(
        "2pat_merge_if_disjoint_as_pic",
        &[Type::MaskedGrid, Type::MaskedGrid],
        Type::Grid,
        |a| {
            let (pic1, mask1) = a[0].as_masked_grid().expect("type-checked");
            let (pic2, mask2) = a[1].as_masked_grid().expect("type-checked");
            if pic1.shape() != pic2.shape() {
                return Value::error("pic1.shape != pic2.shape");
            }
            let (rows, cols) = pic1.shape();
            let overlap = (0..rows).any(|r| (0..cols).any(|c| mask1.get(r, c) && mask2.get(r, c)));
            if overlap {
                return Value::Grid(pic1.clone());
            }
            let mut cells = vec![0; rows * cols];
            for r in 0..rows {
                for c in 0..cols {
                    let v1 = if mask1.get(r, c) { pic1.get(r, c) } else { 0 };
                    let v2 = if mask2.get(r, c) { pic2.get(r, c) } else { 0 };
                    cells[r * cols + c] = v1 + v2;
                }
            }
            Value::Grid(Grid::from_cells(rows, cols, cells))
        },
    ));

    reg.register(Primitive::pure("2pic_and_masks_to_1", &[Type::Grid, Type::Grid], Type::Grid, |a| {
        let (pic1, pic2) = (grid(&a[0]), grid(&a[1]));
        if pic1.shape() != pic2.shape() {
            return Value::error("pic1.shape != pic2.shape");
        }
        let (rows, cols) = pic1.shape();
        let cells: Vec<i32> = (0..rows * cols)
            .map(|i| ((pic1.cells()[i] != 0) && (pic2.cells()[i] != 0)) as i32)
            .collect();
        Value::Grid(Grid::from_cells(rows, cols, cells))
    }));

    reg.register(Primitive::pure("2pic_cbind", &[Type::Grid, Type::Grid], Type::Grid, |a| {
        let (pic1, pic2) = (grid(&a[0]), grid(&a[1]));
        match hstack(pic1, pic2) {
            Some(g) => Value::Grid(g),
            None => Value::error("pic1.shape and pic2.shape not same height"),
        }
    }));

    reg.register(Primitive::pure("2pic_maximum", &[Type::Grid, Type::Grid], Type::Grid, |a| {
        let (pic1, pic2) = (grid(&a[0]), grid(&a[1]));
        if pic1.shape() != pic2.shape() {
            return Value::error("pic1.shape != pic2.shape");
        }
        let (rows, cols) = pic1.shape();
        let cells: Vec<i32> = (0..rows * cols)
            .map(|i| pic1.cells()[i].max(pic2.cells()[i]))
            .collect();
        Value::Grid(Grid::from_cells(rows, cols, cells))
    }));

    reg.register(Primitive::pure("2pic_multiply", &[Type::Grid, Type::Grid], Type::Grid, |a| {
        let (brick, layout) = (grid(&a[0]), grid(&a[1]));
        let (ly, lx) = layout.shape();
        let (by, bx) = brick.shape();
        let (dy, dx) = (ly * by, lx * bx);
        let mut cells = vec![0; dy * dx];
        for ry in 0..ly {
            for rx in 0..lx {
                if layout.get(ry, rx) == 0 {
                    continue;
                }
                for yy in 0..by {
                    for xx in 0..bx {
                        cells[(ry * by + yy) * dx + (rx * bx + xx)] = brick.get(yy, xx);
                    }
                }
            }
        }
        Value::Grid(Grid::from_cells(dy, dx, cells))
    }));

    reg.register(Primitive::pure("2pic_rbind", &[Type::Grid, Type::Grid], Type::Grid, |a| {
        let (pic1, pic2) = (grid(&a[0]), grid(&a[1]));
        match vstack(pic1, pic2) {
            Some(g) => Value::Grid(g),
            None => Value::error("pic1.shape and pic2.shape not same width"),
        }
    }));

    // `pic` recolored (anything non-black recolors as whatever is non-black
    // in `rec_pat`) tiling `rec_pat` right-to-left: the tile's right margin
    // is adjusted, not the left one, per BopForward's explicit comment.
    reg.register(Primitive::pure("2pic_recolor_any_rtl", &[Type::Grid, Type::Grid], Type::Grid, |a| {
        let (pic, rec_pat) = (grid(&a[0]), grid(&a[1]));
        let (dy, dx) = pic.shape();
        let (oy, ox) = rec_pat.shape();
        // Vertical tiling is top-aligned (truncate the bottom of an
        // oversized tile); horizontal tiling is right-aligned (truncate the
        // *left* margin instead) — the "rtl" in the name. `margin` is how
        // many tiled columns to the left of column 0 are discarded.
        let nx = (dx + ox - 1) / ox;
        let margin = nx * ox - dx;
        let mut cells = vec![0; dy * dx];
        for r in 0..dy {
            let pr = r % oy;
            for c in 0..dx {
                let pc = (margin + c) % ox;
                let tv = rec_pat.get(pr, pc);
                let pv = pic.get(r, c);
                cells[r * dx + c] = if pv > 0 && tv > 0 { tv } else { pv };
            }
        }
        Value::Grid(Grid::from_cells(dy, dx, cells))
    }));

    reg.register(Primitive::pure("2pic_tile_all", &[Type::Grid, Type::Grid], Type::Grid, |a| {
        let (canvas, rep_pat) = (grid(&a[0]), grid(&a[1]));
        let (dy, dx) = canvas.shape();
        Value::Grid(tile_to_shape(rep_pat, dy, dx))
    }));

    reg.register(Primitive::pure("2pic_xor_masks_to_1", &[Type::Grid, Type::Grid], Type::Grid, |a| {
        let (pic1, pic2) = (grid(&a[0]), grid(&a[1]));
        if pic1.shape() != pic2.shape() {
            return Value::error("pic1.shape != pic2.shape");
        }
        let (rows, cols) = pic1.shape();
        let cells: Vec<i32> = (0..rows * cols)
            .map(|i| (((pic1.cells()[i] != 0) ^ (pic2.cells()[i] != 0)) as i32))
            .collect();
        Value::Grid(Grid::from_cells(rows, cols, cells))
    }));

    reg.register(Primitive::pure(
        "pics_pic_multiply_as_pic",
        &[Type::GridTuple, Type::Grid],
        Type::Grid,
        |a| {
            let bricks = a[0].as_grid_tuple().expect("type-checked");
            let layout = grid(&a[1]);
            let (ey, ex) = layout.shape();

            let mut pics: Vec<Grid> = Vec::with_capacity(bricks.len());
            let mut brick_shape = None;
            for brick in bricks {
                let bbox = super::grid_ops::bounding_box(brick, |c| c != 0);
                let cropped = match bbox {
                    Some((r0, c0, dy, dx)) => super::grid_ops::crop(brick, r0, c0, dy, dx).unwrap(),
                    None => brick.clone(),
                };
                match brick_shape {
                    None => brick_shape = Some(cropped.shape()),
                    Some(s) if s != cropped.shape() => {
                        return Value::error("All bricks must have the same shape")
                    }
                    _ => {}
                }
                pics.push(cropped);
            }
            let n = ex * ey;
            let m = pics.len();
            if m == 0 || n % m != 0 {
                return Value::error("Output cells not a multiple of bricks");
            }
            let (by, bx) = brick_shape.unwrap();
            let mut rows_out: Vec<Vec<i32>> = Vec::with_capacity(ey * by);
            for _ in 0..ey * by {
                rows_out.push(Vec::with_capacity(ex * bx));
            }
            let mut idx = 0usize;
            for yy in 0..ey {
                for xx in 0..ex {
                    let _ = xx;
                    let pic = &pics[idx % m];
                    for r in 0..by {
                        rows_out[yy * by + r].extend_from_slice(pic.row(r));
                    }
                    idx += 1;
                }
            }
            Value::Grid(Grid::from_rows(rows_out).expect("shape built consistently"))
        },
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::{execute, VmState};
    use arc_synth_core::Grid;

    fn g(rows: Vec<Vec<i32>>) -> Value {
        Value::Grid(Grid::from_rows(rows).unwrap())
    }

    #[test]
    fn cbind_concatenates_same_height() {
        let reg = super::super::default_registry();
        let mut s = VmState::new();
        let prog = vec![g(vec![vec![1]]), g(vec![vec![2]]), Value::Function(reg.get("2pic_cbind").unwrap().handle())];
        let result = execute(&mut s, &reg, &prog).unwrap();
        assert_eq!(result, g(vec![vec![2, 1]]));
    }

    #[test]
    fn cbind_rejects_mismatched_height() {
        let reg = super::super::default_registry();
        let mut s = VmState::new();
        let prog = vec![
            g(vec![vec![1], vec![1]]),
            g(vec![vec![2]]),
            Value::Function(reg.get("2pic_cbind").unwrap().handle()),
        ];
        execute(&mut s, &reg, &prog);
        assert!(!s.ok);
    }

    #[test]
    fn triple_multiply_builds_cross_of_crosses() {
        let reg = super::super::default_registry();
        let mut s = VmState::new();
        let cross = g(vec![vec![0, 1, 0], vec![1, 1, 1], vec![0, 1, 0]]);
        let prog = vec![cross.clone(), cross, Value::Function(reg.get("2pic_multiply").unwrap().handle())];
        let result = execute(&mut s, &reg, &prog).unwrap();
        let grid = result.as_grid().unwrap();
        assert_eq!(grid.shape(), (9, 9));
        assert_eq!(grid.get(0, 0), 0);
        assert_eq!(grid.get(1, 1), 1);
    }
}
