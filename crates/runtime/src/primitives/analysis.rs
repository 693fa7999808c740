//! Partition/fork/filter primitives: split one picture into many, or filter
//! a `GridTuple` down by some predicate. Grounded on `BopForward.py`'s
//! `pic_*_as_pics`/`pics_filter_*`/`pics_*_as_*` family.

use super::grid_ops::{bounding_box, crop};
use super::{Primitive, PrimitiveRegistry};
use arc_synth_core::{Grid, Type, Value};

fn grid(v: &Value) -> &Grid {
    v.as_grid().expect("type-checked by executor")
}

fn tuple(v: &Value) -> &[Grid] {
    v.as_grid_tuple().expect("type-checked by executor")
}

/// Color with the highest cell count (`np.argmax` over `np.unique` counts;
/// `np.argmax` returns the *first* maximal index, so ties favor the lowest
/// color, not the highest — `Iterator::max_by_key` would pick the last tied
/// element, so this walks ascending and only replaces on strict improvement).
fn main_color(g: &Grid) -> i32 {
    let mut counts = [0usize; 10];
    for &c in g.cells() {
        counts[c as usize] += 1;
    }
    let mut best = 0usize;
    for c in 1..10 {
        if counts[c] > counts[best] {
            best = c;
        }
    }
    best as i32
}

fn auto_locate_grid_color(pic: &Grid) -> i32 {
    let (hh, ww) = pic.shape();
    for xx in 1..ww.saturating_sub(1) {
        let cc = pic.get(0, xx);
        if (0..hh).all(|y| pic.get(y, xx) == cc) {
            return cc;
        }
    }
    for yy in 1..hh.saturating_sub(1) {
        let cc = pic.get(yy, 0);
        if (0..ww).all(|x| pic.get(yy, x) == cc) {
            return cc;
        }
    }
    0
}

/// Partitions `0..len` on either axis into runs separated by a full row/col
/// of `cc`, skipping empty runs. Shared by `pic_fork_on_auto_grid_as_pics`
/// and `pic_shape_on_auto_grid`.
fn grid_runs(len: usize, mut is_divider: impl FnMut(usize) -> bool) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut o = 0usize;
    while o < len {
        let mut e = o + 1;
        while e < len && !is_divider(e) {
            e += 1;
        }
        if e - o > 0 {
            runs.push((o, e));
        }
        o = e + 1;
    }
    runs
}

pub fn register(reg: &mut PrimitiveRegistry) {
    reg.register(Primitive::pure("pic_autohalves_as_pics", &[Type::Grid], Type::GridTuple, |a| {
        let pic = grid(&a[0]);
        let (hh, ww) = pic.shape();
        if hh > ww {
            let vv = hh / 2;
            let top = crop(pic, 0, 0, vv, ww).unwrap();
            let bot = crop(pic, hh - vv, 0, vv, ww).unwrap();
            Value::GridTuple(vec![top, bot])
        } else {
            let vv = ww / 2;
            let left = crop(pic, 0, 0, hh, vv).unwrap();
            let right = crop(pic, 0, ww - vv, hh, vv).unwrap();
            Value::GridTuple(vec![left, right])
        }
    }));

    reg.register(Primitive::pure("pic_base_height_as_int", &[Type::Grid], Type::Integer, |a| {
        let pic = grid(&a[0]);
        let (hh, ww) = pic.shape();
        for yy in (0..hh).rev() {
            if (0..ww).any(|x| pic.get(yy, x) != 0) {
                return Value::Integer(yy as i32 + 1);
            }
        }
        Value::Integer(0)
    }));

    reg.register(Primitive::pure("pic_distinct_border_colors", &[Type::Grid], Type::Grid, |a| {
        let pic = grid(&a[0]);
        let (ey, ex) = pic.shape();
        let mut hh = vec![pic.get(0, 0)];
        for x in 1..ex {
            let c = pic.get(0, x);
            if c != *hh.last().unwrap() {
                hh.push(c);
            }
        }
        let mut vv = vec![pic.get(0, 0)];
        for y in 1..ey {
            let c = pic.get(y, 0);
            if c != *vv.last().unwrap() {
                vv.push(c);
            }
        }
        if hh.len() > vv.len() {
            Value::Grid(Grid::from_cells(1, hh.len(), hh))
        } else {
            let n = vv.len();
            Value::Grid(Grid::from_cells(n, 1, vv))
        }
    }));

    reg.register(Primitive::pure("pic_fork_by_color_as_pics", &[Type::Grid], Type::GridTuple, |a| {
        let pic = grid(&a[0]);
        let mut pics = Vec::new();
        for color in 1..=9 {
            if let Some((r0, c0, dy, dx)) = bounding_box(pic, |c| c == color) {
                pics.push(crop(pic, r0, c0, dy, dx).unwrap());
            }
        }
        Value::GridTuple(pics)
    }));

    reg.register(Primitive::pure("pic_fork_color_rest_black_as_pics", &[Type::Grid], Type::GridTuple, |a| {
        let pic = grid(&a[0]);
        let mut pics = Vec::new();
        for color in 1..=9 {
            if !pic.cells().iter().any(|&c| c == color) {
                continue;
            }
            let cells = pic.cells().iter().map(|&c| if c == color { c } else { 0 }).collect();
            pics.push(Grid::from_cells(pic.rows(), pic.cols(), cells));
        }
        Value::GridTuple(pics)
    }));

    reg.register(Primitive::pure("pic_fork_on_auto_grid_as_pics", &[Type::Grid], Type::GridTuple, |a| {
        let pic = grid(&a[0]);
        let (hh, ww) = pic.shape();
        let cc = auto_locate_grid_color(pic);
        let row_is_divider = |y: usize| (0..ww).all(|x| pic.get(y, x) == cc);
        let col_is_divider = |x: usize| (0..hh).all(|y| pic.get(y, x) == cc);
        let row_runs = grid_runs(hh, row_is_divider);
        let col_runs = grid_runs(ww, col_is_divider);
        let mut pics = Vec::new();
        for &(oy, ey) in &row_runs {
            for &(ox, ex) in &col_runs {
                pics.push(crop(pic, oy, ox, ey - oy, ex - ox).unwrap());
            }
        }
        Value::GridTuple(pics)
    }));

    reg.register(Primitive::pure("pic_fork_on_h_axis_as_pics", &[Type::Grid], Type::GridTuple, |a| {
        let pic = grid(&a[0]);
        let (hh, ww) = pic.shape();
        let vv = hh / 2;
        let top = crop(pic, 0, 0, vv, ww).unwrap();
        let bot = crop(pic, hh - vv, 0, vv, ww).unwrap();
        Value::GridTuple(vec![top, bot])
    }));

    reg.register(Primitive::pure("pic_fork_on_v_axis_as_pics", &[Type::Grid], Type::GridTuple, |a| {
        let pic = grid(&a[0]);
        let (hh, ww) = pic.shape();
        let vv = ww / 2;
        let left = crop(pic, 0, 0, hh, vv).unwrap();
        let right = crop(pic, 0, ww - vv, hh, vv).unwrap();
        Value::GridTuple(vec![left, right])
    }));

    reg.register(Primitive::pure(
        "pic_intp_fork_on_shape_as_pics",
        &[Type::Grid, Type::IntPair],
        Type::GridTuple,
        |a| {
            let pic = grid(&a[0]);
            let (oh, ow) = a[1].as_int_pair().expect("type-checked");
            let (oh, ow) = (oh as usize, ow as usize);
            let (hh, ww) = pic.shape();

            if oh == hh {
                if ow == 0 || ww % ow != 0 {
                    return Value::error("Pic width not a multiple of output");
                }
                let tt = ww / ow;
                let mut pics = Vec::with_capacity(tt);
                for ii in 0..tt {
                    pics.push(crop(pic, 0, ii * ow, hh, ow).unwrap());
                }
                Value::GridTuple(pics)
            } else if ow == ww {
                if oh == 0 || hh % oh != 0 {
                    return Value::error("Pic height not a multiple of output");
                }
                let tt = hh / oh;
                let mut pics = Vec::with_capacity(tt);
                for ii in 0..tt {
                    pics.push(crop(pic, ii * oh, 0, oh, ww).unwrap());
                }
                Value::GridTuple(pics)
            } else {
                Value::error("Neither height nor width match output")
            }
        },
    ));

    reg.register(Primitive::pure("pic_shape_on_auto_grid", &[Type::Grid], Type::Grid, |a| {
        let pic = grid(&a[0]);
        let (hh, ww) = pic.shape();
        let cc = auto_locate_grid_color(pic);
        let row_is_divider = |y: usize| (0..ww).all(|x| pic.get(y, x) == cc);
        let col_is_divider = |x: usize| (0..hh).all(|y| pic.get(y, x) == cc);
        let dy = grid_runs(hh, row_is_divider).len();
        let dx = grid_runs(ww, col_is_divider).len();
        Value::Grid(Grid::filled(dy, dx, 0))
    }));

    reg.register(Primitive::pure("pics_filter_single_color", &[Type::GridTuple], Type::GridTuple, |a| {
        let pics = tuple(&a[0]);
        let filtered: Vec<Grid> = pics
            .iter()
            .filter(|p| p.cells().iter().filter(|&&c| c != 0).collect::<std::collections::HashSet<_>>().len() == 1)
            .cloned()
            .collect();
        if filtered.is_empty() {
            return Value::error("Filter not found");
        }
        Value::GridTuple(filtered)
    }));

    reg.register(Primitive::pure("pics_filter_unique_pattern_as_pic", &[Type::GridTuple], Type::Grid, |a| {
        let pics = tuple(&a[0]);
        let keys: Vec<Vec<bool>> = pics.iter().map(|p| p.cells().iter().map(|&c| c != 0).collect()).collect();
        let mut ret: Option<&Grid> = None;
        for (i, key) in keys.iter().enumerate() {
            let count = keys.iter().filter(|k| *k == key).count();
            if count == 1 {
                if ret.is_some() {
                    return Value::error("More than one unique pictures");
                }
                ret = Some(&pics[i]);
            }
        }
        match ret {
            Some(g) => Value::Grid(g.clone()),
            None => Value::error("No unique pictures"),
        }
    }));

    reg.register(Primitive::pure("pics_filter_unique_picture_as_pic", &[Type::GridTuple], Type::Grid, |a| {
        let pics = tuple(&a[0]);
        let mut ret: Option<&Grid> = None;
        for (i, p) in pics.iter().enumerate() {
            let count = pics.iter().filter(|q| *q == p).count();
            if count == 1 {
                if ret.is_some() {
                    return Value::error("More than one unique pictures");
                }
                ret = Some(&pics[i]);
            }
        }
        match ret {
            Some(g) => Value::Grid(g.clone()),
            None => Value::error("No unique pictures"),
        }
    }));

    reg.register(Primitive::pure("pics_filter_v_symmetric", &[Type::GridTuple], Type::GridTuple, |a| {
        let pics = tuple(&a[0]);
        let filtered: Vec<Grid> = pics
            .iter()
            .filter(|p| {
                let (rows, cols) = p.shape();
                (0..rows).all(|r| (0..cols).all(|c| p.get(r, c) == p.get(r, cols - 1 - c)))
            })
            .cloned()
            .collect();
        if filtered.is_empty() {
            return Value::error("Filter not found");
        }
        Value::GridTuple(filtered)
    }));

    reg.register(Primitive::pure("pics_main_color_as_vec", &[Type::GridTuple], Type::Vector, |a| {
        let pics = tuple(&a[0]);
        Value::Vector(pics.iter().map(main_color).collect())
    }));

    reg.register(Primitive::pure("pics_maximum_as_pic", &[Type::GridTuple], Type::Grid, |a| {
        let pics = tuple(&a[0]);
        if pics.is_empty() {
            return Value::error("Pics cannot be empty");
        }
        let (hh, ww) = pics[0].shape();
        let mut cells = vec![0; hh * ww];
        for p in pics {
            if p.shape() != (hh, ww) {
                return Value::error("All pics must have the same shape");
            }
            for i in 0..cells.len() {
                cells[i] = cells[i].max(p.cells()[i]);
            }
        }
        Value::Grid(Grid::from_cells(hh, ww, cells))
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::{execute, VmState};

    fn g(rows: Vec<Vec<i32>>) -> Value {
        Value::Grid(Grid::from_rows(rows).unwrap())
    }

    #[test]
    fn autohalves_splits_taller_grid_top_and_bottom() {
        let reg = super::super::default_registry();
        let mut s = VmState::new();
        let pic = g(vec![vec![1], vec![2], vec![3], vec![4]]);
        let prog = vec![pic, Value::Function(reg.get("pic_autohalves_as_pics").unwrap().handle())];
        let result = execute(&mut s, &reg, &prog).unwrap();
        let tup = result.as_grid_tuple().unwrap();
        assert_eq!(tup.len(), 2);
        assert_eq!(tup[0].to_rows(), vec![vec![1], vec![2]]);
        assert_eq!(tup[1].to_rows(), vec![vec![3], vec![4]]);
    }

    #[test]
    fn fork_by_color_crops_to_each_colors_bounding_box() {
        let reg = super::super::default_registry();
        let mut s = VmState::new();
        let pic = g(vec![vec![1, 0, 2], vec![0, 0, 2]]);
        let prog = vec![pic, Value::Function(reg.get("pic_fork_by_color_as_pics").unwrap().handle())];
        let result = execute(&mut s, &reg, &prog).unwrap();
        let tup = result.as_grid_tuple().unwrap();
        assert_eq!(tup.len(), 2);
        assert_eq!(tup[0].to_rows(), vec![vec![1]]);
        assert_eq!(tup[1].to_rows(), vec![vec![2], vec![2]]);
    }

    #[test]
    fn maximum_rejects_mismatched_shapes() {
        let reg = super::super::default_registry();
        let prim = reg.get("pics_maximum_as_pic").unwrap();
        let pics = vec![Grid::from_rows(vec![vec![1]]).unwrap(), Grid::from_rows(vec![vec![1, 2]]).unwrap()];
        let ret = prim.call(&mut VmState::new(), &[Value::GridTuple(pics)]).unwrap();
        assert!(ret.is_error());
    }

    #[test]
    fn main_color_as_vec_breaks_ties_by_ascending_color() {
        let reg = super::super::default_registry();
        let prim = reg.get("pics_main_color_as_vec").unwrap();
        let pic = Grid::from_rows(vec![vec![1, 2]]).unwrap();
        let ret = prim.call(&mut VmState::new(), &[Value::GridTuple(vec![pic])]).unwrap();
        assert_eq!(ret.as_vector().unwrap(), &[1]);
    }
}
