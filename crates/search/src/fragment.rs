//! Fragment mining: cuts known-solution snippets into stack-neutral,
//! grid-producing "code items", groups them by form/variant, and aggregates
//! how often each is seen into a prior the search engine can query by
//! current stack shape. Grounded on `CodeTree.py` end to end.

use crate::codebase::CodeBase;
use arc_synth_core::{Grid, Type};
use arc_synth_runtime::{decompile, Multicore, PrimitiveRegistry, Value};
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

/// A cut snippet: a sequence of blocks whose net effect on the stack is
/// self-contained (it neither needs nor leaves behind more than its own
/// declared stack frame).
pub type CodeItem = Vec<Value>;

/// A stack-use signature: how many trailing pictures a code item expects on
/// the stack (`npic`), and how much further below that it reaches
/// (`depth`), packed into one key. Grounded on `CodeTree.py::stack_use`.
pub type StackUse = i64;

fn stack_use(npic: i64, depth: i64) -> StackUse {
    let npic = npic.min(depth);
    let depth = if depth <= npic { 0 } else { depth };
    1000 * npic + depth
}

fn stack_npic_depth(use_: StackUse) -> (i64, i64) {
    (use_ / 1000, use_ % 1000)
}

/// Counts trailing grid-typed values from the top of `stack`.
pub fn stack_npic(stack: &[Value]) -> i64 {
    let mut n = 0i64;
    for v in stack.iter().rev() {
        if !matches!(v, Value::Grid(_)) {
            break;
        }
        n += 1;
    }
    n
}

/// One element of a code item's "variant": the exact primitive at a
/// function position, or just the tag at a literal position. Two code
/// items with the same variant are "alleles" — identical but for their
/// literal values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum VariantElem {
    Op(&'static str, &'static [Type], Type),
    Literal(Type),
}

type Variant = Vec<VariantElem>;

/// One element of a code item's "form": like a variant, but a function
/// position keeps only its signature, not its identity. Code items with the
/// same form are isomorphisms of each other (interchangeable opcodes of
/// matching type).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FormElem {
    Op(&'static [Type], Type),
    Literal(Type),
}

type Form = Vec<FormElem>;

fn item_variant(item: &[Value]) -> Variant {
    item.iter()
        .map(|v| match v {
            Value::Function(h) => VariantElem::Op(h.name, h.arg_types, h.ret_type),
            other => VariantElem::Literal(other.tag()),
        })
        .collect()
}

fn item_form(item: &[Value]) -> Form {
    item.iter()
        .map(|v| match v {
            Value::Function(h) => FormElem::Op(h.arg_types, h.ret_type),
            other => FormElem::Literal(other.tag()),
        })
        .collect()
}

/// A content hash of a code item (same decompiled text, same digest).
/// Stands in for `CodeTree.py::hash_code`'s md5-of-decompile, minus the
/// cryptographic strength this use has no need of.
pub fn item_digest(item: &[Value]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for s in decompile(item) {
        s.hash(&mut hasher);
    }
    hasher.finish()
}

/// Register reads/writes and stack swaps recognised by the cut-rule. This
/// is intentionally narrower than `PrimitiveRegistry::classify`'s general
/// `OpcodeClass::RegisterRead`, which also counts `get_answer` — the
/// original's `get_or_swap` set used for segmentation does not, and the
/// fragment miner must match it exactly to mine the same boundaries the
/// original does. `sto_*` membership, by contrast, is identical in both
/// places, so the cut-rule below still calls through
/// `PrimitiveRegistry::classify` for that half of the check.
pub(crate) fn is_get_or_swap_name(name: &str) -> bool {
    matches!(name, "get_question" | "get_a" | "get_b" | "get_c" | "get_d" | "get_e" | "swap_top2" | "swap_top3")
}

/// The mined inventory: every code item seen while cutting a corpus of known
/// solutions, grouped by stack-use signature and scored by how often it (or
/// one of its isomorphisms) occurred.
pub struct FragmentInventory {
    variant_by_stackuse: HashMap<StackUse, Vec<Variant>>,
    alleles_by_variant: HashMap<Variant, Vec<CodeItem>>,
    prior_by_item: HashMap<u64, f64>,
    /// `(hash(items before this one), hash(this item))` pairs actually
    /// observed back to back in a mined solution — the corrected,
    /// set-reified version of the original's always-true string-truthiness
    /// check (see DESIGN.md's Open Question decision).
    in_snippets: HashSet<(u64, u64)>,
    item_prior_by_stackuse: HashMap<StackUse, Vec<(CodeItem, f64)>>,
}

impl FragmentInventory {
    /// Mines `code_base`, builds isomorphisms, and normalizes priors — the
    /// equivalent of `CodeTree.__init__`'s four-step construction sequence.
    pub fn build(code_base: &CodeBase, registry: &PrimitiveRegistry, weight_prior_by_form: f64) -> FragmentInventory {
        let mut inv = FragmentInventory {
            variant_by_stackuse: HashMap::new(),
            alleles_by_variant: HashMap::new(),
            prior_by_item: HashMap::new(),
            in_snippets: HashSet::new(),
            item_prior_by_stackuse: HashMap::new(),
        };

        for entry in code_base.iter() {
            mine_entry(&mut inv, &entry.program, &entry.sample, registry);
        }

        inv.build_isomorphisms(registry);
        inv.aggregate_priors(weight_prior_by_form);
        inv
    }

    fn push_item(&mut self, item: CodeItem, npic: i64, depth: i64, prior: f64) {
        let use_ = stack_use(npic, depth);
        let variant = item_variant(&item);

        let variants = self.variant_by_stackuse.entry(use_).or_default();
        if !variants.contains(&variant) {
            variants.push(variant.clone());
        }

        let alleles = self.alleles_by_variant.entry(variant).or_default();
        let digest = item_digest(&item);
        if !alleles.iter().any(|existing| existing == &item) {
            alleles.push(item);
        }

        *self.prior_by_item.entry(digest).or_insert(0.0) += prior;
    }

    fn build_isomorphisms(&mut self, registry: &PrimitiveRegistry) {
        let mut seen_digest: HashSet<u64> = self.prior_by_item.keys().copied().collect();
        let mut candidates: Vec<(CodeItem, i64, i64)> = Vec::new();

        let snapshot: Vec<(StackUse, Vec<Variant>)> = self.variant_by_stackuse.iter().map(|(u, v)| (*u, v.clone())).collect();

        for (use_, variants) in &snapshot {
            let (npic, depth) = stack_npic_depth(*use_);
            for variant in variants {
                let items = self.alleles_by_variant.get(variant).cloned().unwrap_or_default();
                for item in &items {
                    let digest = item_digest(item);
                    let raw = self.prior_by_item.get(&digest).copied().unwrap_or(0.0);
                    if raw > 1.0 {
                        for iso in isomorphisms_of(item, registry) {
                            let iso_digest = item_digest(&iso);
                            if !seen_digest.contains(&iso_digest) {
                                seen_digest.insert(iso_digest);
                                candidates.push((iso, npic, depth));
                            }
                        }
                    }
                }
            }
        }

        for (iso, npic, depth) in candidates {
            self.push_item(iso, npic, depth, 0.0);
        }
    }

    fn aggregate_priors(&mut self, weight_prior_by_form: f64) {
        for v in self.prior_by_item.values_mut() {
            *v = (1.0 + *v).ln();
        }

        // The original asserts min==0 (a placeholder isomorphism) and max>0 here, since
        // its corpus always yields both. A small or single-snippet corpus need not, so
        // this only normalizes when there is a positive spread to normalize by.
        let max_prior = self.prior_by_item.values().cloned().fold(f64::NEG_INFINITY, f64::max);

        if max_prior > 0.0 {
            for v in self.prior_by_item.values_mut() {
                *v /= max_prior;
            }
        }

        let mut sum_by_form: HashMap<Form, f64> = HashMap::new();
        let mut n_by_form: HashMap<Form, u32> = HashMap::new();
        let mut form_by_digest: HashMap<u64, Form> = HashMap::new();

        for items in self.alleles_by_variant.values() {
            for item in items {
                let digest = item_digest(item);
                let form = item_form(item);
                let prior = self.prior_by_item.get(&digest).copied().unwrap_or(0.0);
                *sum_by_form.entry(form.clone()).or_insert(0.0) += prior;
                *n_by_form.entry(form.clone()).or_insert(0) += 1;
                form_by_digest.insert(digest, form);
            }
        }

        let avg_by_form: HashMap<Form, f64> =
            sum_by_form.iter().map(|(form, sum)| (form.clone(), sum / *n_by_form.get(form).unwrap() as f64)).collect();

        let w = weight_prior_by_form;
        let digests: Vec<u64> = form_by_digest.keys().copied().collect();
        for digest in digests {
            let form = &form_by_digest[&digest];
            let p = self.prior_by_item.get(&digest).copied().unwrap_or(0.0);
            let avg = avg_by_form.get(form).copied().unwrap_or(0.0);
            self.prior_by_item.insert(digest, (1.0 - w) * p + w * avg);
        }

        self.item_prior_by_stackuse.clear();
        for (use_, variants) in &self.variant_by_stackuse {
            let mut list: Vec<(CodeItem, f64)> = Vec::new();
            for variant in variants {
                for item in &self.alleles_by_variant[variant] {
                    let digest = item_digest(item);
                    let prior = self.prior_by_item.get(&digest).copied().unwrap_or(0.0);
                    list.push((item.clone(), prior));
                }
            }
            list.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
            self.item_prior_by_stackuse.insert(*use_, list);
        }
    }

    /// Every mined item whose stack-use signature fits under a stack
    /// currently holding `stack_npic` trailing pictures at height
    /// `stack_height`, sorted by descending prior.
    pub fn items_for(&self, stack_npic: i64, stack_height: i64) -> Vec<(CodeItem, f64)> {
        let mut out = Vec::new();
        for (&use_, list) in &self.item_prior_by_stackuse {
            let (npic, depth) = stack_npic_depth(use_);
            if npic <= stack_npic && depth <= stack_height {
                out.extend(list.iter().cloned());
            }
        }
        out.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        out
    }

    pub fn in_snippet(&self, prev_digest: u64, item_digest: u64) -> bool {
        self.in_snippets.contains(&(prev_digest, item_digest))
    }

    #[cfg(test)]
    fn item_count(&self) -> usize {
        self.alleles_by_variant.values().map(|v| v.len()).sum()
    }
}

fn isomorphisms_of(item: &[Value], registry: &PrimitiveRegistry) -> Vec<CodeItem> {
    const ISO_RET_TYPES: [Type; 3] = [Type::Grid, Type::GridTuple, Type::MaskedGrid];

    let mut out = Vec::new();
    for (i, op) in item.iter().enumerate() {
        if let Value::Function(h) = op {
            if ISO_RET_TYPES.contains(&h.ret_type) && !h.arg_types.contains(&Type::Core) {
                for alt in registry.by_ret_type(h.ret_type) {
                    if alt.arg_types == h.arg_types && alt.name != h.name {
                        let mut iso = item.to_vec();
                        iso[i] = Value::Function(alt.handle());
                        out.push(iso);
                    }
                }
            }
        }
    }
    out
}

/// Cuts one corpus entry's program into code items and feeds them to `inv`.
/// Runs the program against a single lane seeded only with `sample` as its
/// question — no demo pairs, no answer register — since mining only needs
/// to observe stack shape, never a reward.
fn mine_entry(inv: &mut FragmentInventory, program: &[Value], sample: &Grid, registry: &PrimitiveRegistry) {
    let mut mc = Multicore::clear(&[], std::slice::from_ref(sample));

    let mut o_stack_npic: i64 = 0;
    let mut o_stack_size: i64 = 0;
    let mut o_min_height: i64 = 0;

    let mut l_stack_npic: i64 = 0;
    let mut l_stack_size: i64 = 0;

    let mut prev_items: CodeItem = Vec::new();
    let mut item: CodeItem = Vec::new();
    let mut last_op: Option<Value> = None;

    for opcode in program {
        let stack_before = mc.states()[0].stack.len() as i64;
        let mut stack_height = stack_before;
        if let Value::Function(h) = opcode {
            for ty in h.arg_types {
                if *ty != Type::Core {
                    stack_height -= 1;
                }
            }
        }

        let ret = mc.run_all(std::slice::from_ref(opcode), registry, true);
        debug_assert_eq!(ret, Value::NoError, "mining must replay a known-good solution");

        let npic_now = stack_npic(&mc.states()[0].stack);

        let opcode_is_sto = matches!(opcode, Value::Function(h) if matches!(h.name, "sto_a" | "sto_b" | "sto_c" | "sto_d" | "sto_e"));
        let last_is_get_or_swap = matches!(&last_op, Some(Value::Function(h)) if is_get_or_swap_name(h.name));
        let last_is_function = matches!(&last_op, Some(Value::Function(_)));

        if l_stack_npic > 0 && !opcode_is_sto && !last_is_get_or_swap && last_is_function {
            inv.push_item(item.clone(), o_stack_npic, (o_stack_size - o_min_height).max(0), 1.0);
            inv.in_snippets.insert((item_digest(&prev_items), item_digest(&item)));

            prev_items.append(&mut item);

            o_stack_npic = l_stack_npic;
            o_stack_size = l_stack_size;
            o_min_height = l_stack_size;
        }

        item.push(opcode.clone());
        o_min_height = o_min_height.min(stack_height);

        l_stack_npic = npic_now;
        l_stack_size = mc.states()[0].stack.len() as i64;
        last_op = Some(opcode.clone());
    }

    inv.push_item(item.clone(), o_stack_npic, (o_stack_size - o_min_height).max(0), 1.0);
    inv.in_snippets.insert((item_digest(&prev_items), item_digest(&item)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebase::CodeBase;
    use arc_synth_runtime::{compile, default_registry};

    fn g(rows: Vec<Vec<i32>>) -> Grid {
        Grid::from_rows(rows).unwrap()
    }

    fn src(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn mining_one_snippet_yields_at_least_one_code_item() {
        let reg = default_registry();
        let mut cb = CodeBase::new();
        let program = compile(&src(&["get_question", "pic_rotate_90ccw", "pic_rotate_90ccw"]), &reg).unwrap();
        cb.add("rotate_twice".into(), crate::problem::Source::new(vec![]), program, g(vec![vec![1, 2], vec![3, 4]])).unwrap();

        let inv = FragmentInventory::build(&cb, &reg, 0.3);
        assert!(inv.item_count() > 0);
    }

    #[test]
    fn items_for_only_returns_signatures_the_stack_can_afford() {
        let reg = default_registry();
        let mut cb = CodeBase::new();
        let program = compile(&src(&["get_question", "pic_rotate_90ccw"]), &reg).unwrap();
        cb.add("rotate_once".into(), crate::problem::Source::new(vec![]), program, g(vec![vec![1, 2]])).unwrap();

        let inv = FragmentInventory::build(&cb, &reg, 0.3);
        let none = inv.items_for(-1, -1);
        assert!(none.is_empty());
    }

    #[test]
    fn is_get_or_swap_excludes_get_answer() {
        assert!(is_get_or_swap_name("get_a"));
        assert!(is_get_or_swap_name("swap_top2"));
        assert!(!is_get_or_swap_name("get_answer"));
    }
}
