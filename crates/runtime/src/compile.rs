//! Textual program grammar: a sequence of whitespace-free statements, each
//! either a literal (`(i,)` integer, `(i,j)` int_pair, `(i,j,k,l)` nesw,
//! `[[..]]` picture, `[..]` vector) or an opcode name resolved against a
//! `PrimitiveRegistry`. Grounded on `Field.py::compile`/`decompile`; the
//! three `rex_*` regexes there become three cheap prefix/suffix checks
//! here (no nested brackets appear in any of the three literal grammars,
//! so a regex crate buys nothing a couple of `starts_with`/`ends_with`
//! checks don't already give).

use crate::error::CompileError;
use crate::primitives::PrimitiveRegistry;
use arc_synth_core::{FunctionHandle, Grid, Nesw, Value};

/// Splits `s` on top-level commas, i.e. commas not nested inside an inner
/// `[...]` or `(...)`. Used to parse tuple/vector/picture-row literals
/// without pulling in a regex or JSON dependency for three tiny grammars.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut depth = 0i32;
    let mut start = 0usize;
    let mut parts = Vec::new();
    for (i, c) in s.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_ints(parts: &[&str]) -> Option<Vec<i32>> {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<i32>().ok())
        .collect()
}

fn is_tuple_literal(s: &str) -> bool {
    s.starts_with('(') && s.ends_with(')')
}

fn is_picture_literal(s: &str) -> bool {
    s.starts_with("[[") && s.ends_with("]]")
}

fn is_vector_literal(s: &str) -> bool {
    s.starts_with('[') && s.ends_with(']') && !s.starts_with("[[")
}

fn compile_tuple(statement: &str) -> Result<Value, CompileError> {
    let inner = &statement[1..statement.len() - 1];
    let ints = parse_ints(&split_top_level(inner))
        .ok_or_else(|| CompileError::MalformedTuple(statement.to_string()))?;
    match ints.len() {
        1 => Ok(Value::Integer(ints[0])),
        2 => Ok(Value::IntPair((ints[0], ints[1]))),
        4 => {
            let nesw = Nesw::new(ints[0], ints[1], ints[2], ints[3])
                .map_err(|_| CompileError::MalformedTuple(statement.to_string()))?;
            Ok(Value::Nesw(nesw))
        }
        _ => Err(CompileError::BadTupleArity(statement.to_string())),
    }
}

fn compile_picture(statement: &str) -> Result<Value, CompileError> {
    let inner = &statement[1..statement.len() - 1];
    let rows: Result<Vec<Vec<i32>>, CompileError> = split_top_level(inner)
        .into_iter()
        .map(|row| {
            let row = row.trim();
            if !(row.starts_with('[') && row.ends_with(']')) {
                return Err(CompileError::MalformedPicture(statement.to_string()));
            }
            let row_inner = &row[1..row.len() - 1];
            parse_ints(&split_top_level(row_inner)).ok_or_else(|| CompileError::MalformedPicture(statement.to_string()))
        })
        .collect();
    let grid = Grid::from_rows(rows?).map_err(|_| CompileError::MalformedPicture(statement.to_string()))?;
    Ok(Value::Grid(grid))
}

fn compile_vector(statement: &str) -> Result<Value, CompileError> {
    let inner = &statement[1..statement.len() - 1];
    let ints = parse_ints(&split_top_level(inner))
        .ok_or_else(|| CompileError::MalformedVector(statement.to_string()))?;
    Ok(Value::Vector(ints))
}

/// Compile a sequence of statements into the program a `VmState` can run.
/// Each non-literal statement must name a primitive in `registry`.
pub fn compile(source: &[String], registry: &PrimitiveRegistry) -> Result<Vec<Value>, CompileError> {
    if source.is_empty() {
        return Err(CompileError::EmptySource);
    }
    let mut program = Vec::with_capacity(source.len());
    for statement in source {
        let s = statement.trim();
        let block = if is_tuple_literal(s) {
            compile_tuple(s)?
        } else if is_picture_literal(s) {
            compile_picture(s)?
        } else if is_vector_literal(s) {
            compile_vector(s)?
        } else {
            match registry.get(s) {
                Some(prim) => Value::Function(prim.handle()),
                None => return Err(CompileError::UnknownOpcode(s.to_string())),
            }
        };
        program.push(block);
    }
    Ok(program)
}

/// Render a program back to the textual grammar `compile` accepts
/// (`pretty=false` in the original): one statement per block, in order.
pub fn decompile(program: &[Value]) -> Vec<String> {
    program.iter().map(decompile_one).collect()
}

fn decompile_one(v: &Value) -> String {
    match v {
        Value::Function(FunctionHandle { name, .. }) => name.to_string(),
        Value::Grid(g) => format!("{:?}", g.to_rows()),
        Value::Integer(i) => format!("({i},)"),
        Value::IntPair((a, b)) => format!("({a}, {b})"),
        Value::Nesw(n) => format!("({}, {}, {}, {})", n.north, n.east, n.south, n.west),
        Value::Vector(v) => format!("{v:?}"),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::default_registry;

    fn src(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn compiles_integer_pair_and_nesw_tuples() {
        let reg = default_registry();
        let prog = compile(&src(&["(3,)", "(1, 2)", "(1, 0, 1, 0)"]), &reg).unwrap();
        assert_eq!(prog[0], Value::Integer(3));
        assert_eq!(prog[1], Value::IntPair((1, 2)));
        assert!(matches!(prog[2], Value::Nesw(_)));
    }

    #[test]
    fn compiles_picture_and_vector_literals() {
        let reg = default_registry();
        let prog = compile(&src(&["[[1, 2], [3, 4]]", "[1, 2, 3]"]), &reg).unwrap();
        assert_eq!(prog[0], Value::Grid(Grid::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap()));
        assert_eq!(prog[1], Value::Vector(vec![1, 2, 3]));
    }

    #[test]
    fn unknown_opcode_is_rejected_with_exact_prefix() {
        let reg = default_registry();
        let err = compile(&src(&["not_a_real_opcode"]), &reg).unwrap_err();
        assert_eq!(err.to_string(), "Unknown opcode: not_a_real_opcode");
    }

    #[test]
    fn empty_source_is_rejected() {
        let reg = default_registry();
        let err = compile(&[], &reg).unwrap_err();
        assert_eq!(err.to_string(), "Empty source");
    }

    #[test]
    fn five_element_tuple_is_a_bad_arity() {
        let reg = default_registry();
        let err = compile(&src(&["(1, 2, 3, 4, 5)"]), &reg).unwrap_err();
        assert!(err.to_string().starts_with("Tuple must be (color, int_pair or nesw): "));
    }

    #[test]
    fn recognises_a_real_opcode_name() {
        let reg = default_registry();
        let prog = compile(&src(&["pic_rotate_90ccw"]), &reg).unwrap();
        assert!(matches!(prog[0], Value::Function(_)));
    }

    #[test]
    fn decompile_round_trips_a_picture_literal() {
        let reg = default_registry();
        let prog = compile(&src(&["[[1, 2]]"]), &reg).unwrap();
        let lines = decompile(&prog);
        assert_eq!(lines[0], "[[1, 2]]");
    }
}
