//! Conversions between the value kinds: integers/vectors/patterns/pictures.
//! Grounded on the handful of `bopforward_*_as_*` functions in
//! `BopForward.py` that exist purely to cross a type boundary rather than
//! transform picture content.

use super::{Primitive, PrimitiveRegistry};
use arc_synth_core::{Grid, Mask, Type, Value};

pub fn register(reg: &mut PrimitiveRegistry) {
    reg.register(Primitive::pure("int_black_box_as_pic", &[Type::Integer], Type::Grid, |a| {
        let n = a[0].as_integer().unwrap();
        if n <= 0 {
            return Value::error("int_black_box_as_pic() expects a positive size");
        }
        Value::Grid(Grid::filled(n as usize, n as usize, 0))
    }));

    reg.register(Primitive::pure("pat_as_pic", &[Type::MaskedGrid], Type::Grid, |a| {
        let (g, m) = a[0].as_masked_grid().unwrap();
        let cells = g.cells().iter().zip(m.bits()).map(|(&c, &b)| if b { c } else { 0 }).collect();
        Value::Grid(Grid::from_cells(g.rows(), g.cols(), cells))
    }));

    reg.register(Primitive::pure("pic_all_as_pat", &[Type::Grid], Type::MaskedGrid, |a| {
        let g = a[0].as_grid().unwrap();
        let mask = Mask::from_grid_nonzero(g);
        Value::MaskedGrid(g.clone(), mask)
    }));

    reg.register(Primitive::pure("pic_all_colors_as_vec", &[Type::Grid], Type::Vector, |a| {
        let g = a[0].as_grid().unwrap();
        Value::Vector(g.distinct_non_background_colors())
    }));

    reg.register(Primitive::pure("vec_as_int", &[Type::Vector], Type::Integer, |a| {
        let v = a[0].as_vector().unwrap();
        if v.len() != 1 {
            return Value::error("vec_as_int() expects vector of length 1");
        }
        Value::Integer(v[0])
    }));

    reg.register(Primitive::pure("vec_length_as_int", &[Type::Vector], Type::Integer, |a| {
        let v = a[0].as_vector().unwrap();
        Value::Integer(v.len() as i32)
    }));

    reg.register(Primitive::pure("vec_row_as_pic", &[Type::Vector], Type::Grid, |a| {
        let v = a[0].as_vector().unwrap();
        Value::Grid(Grid::from_cells(1, v.len(), v.to_vec()))
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::default_registry;

    #[test]
    fn black_box_is_all_zero_square() {
        let reg = default_registry();
        let prim = reg.get("int_black_box_as_pic").unwrap();
        let ret = prim.call(&mut crate::vm::VmState::new(), &[Value::Integer(2)]).unwrap();
        assert_eq!(ret.as_grid().unwrap().to_rows(), vec![vec![0, 0], vec![0, 0]]);
    }

    #[test]
    fn pat_as_pic_zeroes_unmasked_cells() {
        let reg = default_registry();
        let prim = reg.get("pat_as_pic").unwrap();
        let g = Grid::from_rows(vec![vec![3, 4]]).unwrap();
        let mask = Mask::new(1, 2, vec![true, false]);
        let ret = prim.call(&mut crate::vm::VmState::new(), &[Value::MaskedGrid(g, mask)]).unwrap();
        assert_eq!(ret.as_grid().unwrap().to_rows(), vec![vec![3, 0]]);
    }

    #[test]
    fn all_colors_excludes_background_and_is_sorted() {
        let reg = default_registry();
        let prim = reg.get("pic_all_colors_as_vec").unwrap();
        let g = Grid::from_rows(vec![vec![3, 0, 1]]).unwrap();
        let ret = prim.call(&mut crate::vm::VmState::new(), &[Value::Grid(g)]).unwrap();
        assert_eq!(ret.as_vector().unwrap(), &[1, 3]);
    }

    #[test]
    fn vec_as_int_rejects_non_singleton() {
        let reg = default_registry();
        let prim = reg.get("vec_as_int").unwrap();
        let ret = prim.call(&mut crate::vm::VmState::new(), &[Value::Vector(vec![1, 2])]).unwrap();
        assert!(ret.is_error());
    }
}
