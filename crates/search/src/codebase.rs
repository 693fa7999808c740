//! The `.bopDB` text corpus: named, compiled code snippets paired with a
//! sample picture, used both as fragment-mining raw material and as
//! reward-classifier training fodder. Grounded on `CodeBase.py`'s `load`/
//! `save`/`add` state machine, traced line by line against its test suite.

use crate::harness::HarnessError;
use crate::problem::Source;
use arc_synth_core::Grid;
use arc_synth_runtime::{compile, decompile, PrimitiveRegistry, Value};
use std::collections::HashMap;
use std::path::Path;

const MIN_NAME_LEN: usize = 3;

/// One named snippet: its textual source, the compiled program, and a
/// sample picture it was mined or demonstrated against.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBaseEntry {
    pub name: String,
    pub source: Source,
    pub program: Vec<Value>,
    pub sample: Grid,
}

/// A corpus of named snippets, loaded from or saved to the `.bopDB` format.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodeBase {
    name: String,
    entries: Vec<CodeBaseEntry>,
    idx_by_name: HashMap<String, usize>,
}

impl CodeBase {
    pub fn new() -> Self {
        CodeBase::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        CodeBase { name: name.into(), ..CodeBase::default() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_items(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodeBaseEntry> {
        self.entries.iter()
    }

    pub fn by_name(&self, name: &str) -> Option<&CodeBaseEntry> {
        self.idx_by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Adds one entry, rejecting too-short or duplicate names — the only
    /// validation the original performs at `add()` time, deliberately not
    /// during line-scanning (a 2-character name parses cleanly through
    /// every `.bopDB` line and only fails here).
    pub fn add(&mut self, name: String, source: Source, program: Vec<Value>, sample: Grid) -> Result<(), HarnessError> {
        if name.len() < MIN_NAME_LEN {
            return Err(HarnessError::NameTooShort(name));
        }
        if self.idx_by_name.contains_key(&name) {
            return Err(HarnessError::DuplicateName(name));
        }
        self.idx_by_name.insert(name.clone(), self.entries.len());
        self.entries.push(CodeBaseEntry { name, source, program, sample });
        Ok(())
    }

    /// Parses the `.bopDB` text format: a `.bopDB: <name>` header, two blank
    /// lines, then repeated blocks of (name line, dash line, source lines,
    /// blank line, sample picture line, blank line) terminated by `.eof.`.
    /// Header validation is a bare prefix check, as is the dash line's —
    /// only name length/uniqueness is enforced, and only inside `add()`.
    pub fn parse(text: &str, registry: &PrimitiveRegistry) -> Result<CodeBase, HarnessError> {
        let lines: Vec<&str> = text.lines().collect();
        let mut i = 0usize;

        let header = lines.first().copied().unwrap_or("");
        if !header.starts_with(".bopDB") {
            return Err(HarnessError::InvalidHeader(header.to_string()));
        }
        let name = header.splitn(2, ':').nth(1).map(|s| s.trim().to_string()).unwrap_or_default();
        i += 1;

        // Two blank separator lines between the header and the first block.
        i += 1;
        i += 1;

        let mut cb = CodeBase::named(name);

        loop {
            if i >= lines.len() {
                return Err(HarnessError::InvalidEnding);
            }
            if lines[i].trim() == ".eof." {
                break;
            }

            let entry_name = lines[i].to_string();
            i += 1;

            if i >= lines.len() || !lines[i].starts_with('-') {
                return Err(HarnessError::InvalidEnding);
            }
            i += 1;

            let mut source_lines = Vec::new();
            while i < lines.len() && !lines[i].trim().is_empty() {
                source_lines.push(lines[i].to_string());
                i += 1;
            }
            if i >= lines.len() {
                return Err(HarnessError::InvalidEnding);
            }
            i += 1; // blank line triggers compiling the accumulated source

            let program = compile(&source_lines, registry)?;

            if i >= lines.len() {
                return Err(HarnessError::InvalidEnding);
            }
            let sample_line = lines[i].trim();
            i += 1;
            let sample =
                parse_sample_picture(sample_line, registry).ok_or_else(|| HarnessError::MissingSample(entry_name.clone()))?;

            if i >= lines.len() || !lines[i].trim().is_empty() {
                return Err(HarnessError::InvalidEnding);
            }
            i += 1; // blank line triggers add()

            cb.add(entry_name, Source::new(source_lines), program, sample)?;
        }

        Ok(cb)
    }

    /// Renders the corpus back to the `.bopDB` text format `parse` reads.
    pub fn render(&self) -> String {
        let mut out = format!(".bopDB: {}\n\n\n", self.name);
        for entry in &self.entries {
            out.push_str(&entry.name);
            out.push('\n');
            out.push_str(&"-".repeat(entry.name.len()));
            out.push('\n');
            for line in decompile(&entry.program) {
                out.push_str(&line);
                out.push('\n');
            }
            out.push('\n');
            out.push_str(&format!("{:?}\n", entry.sample.to_rows()));
            out.push('\n');
        }
        out.push_str(".eof.\n");
        out
    }

    pub fn load_file(path: &Path, registry: &PrimitiveRegistry) -> Result<CodeBase, HarnessError> {
        let text = std::fs::read_to_string(path)?;
        CodeBase::parse(&text, registry)
    }

    pub fn save_file(&self, path: &Path) -> Result<(), HarnessError> {
        std::fs::write(path, self.render())?;
        Ok(())
    }
}

fn parse_sample_picture(line: &str, registry: &PrimitiveRegistry) -> Option<Grid> {
    if !(line.starts_with("[[") && line.ends_with("]]")) {
        return None;
    }
    match compile(&[line.to_string()], registry).ok()?.into_iter().next()? {
        Value::Grid(g) => Some(g),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_synth_runtime::default_registry;

    fn sample_codebase_text() -> String {
        let reg = default_registry();
        let mut cb = CodeBase::named("demo");
        let program = compile(&["get_question".to_string(), "pic_rotate_90ccw".to_string()], &reg).unwrap();
        cb.add(
            "rot".to_string(),
            Source::new(vec!["get_question".to_string(), "pic_rotate_90ccw".to_string()]),
            program,
            Grid::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap(),
        )
        .unwrap();
        cb.render()
    }

    #[test]
    fn parses_a_rendered_codebase_back_out() {
        let reg = default_registry();
        let text = sample_codebase_text();
        let cb = CodeBase::parse(&text, &reg).unwrap();
        assert_eq!(cb.num_items(), 1);
        assert_eq!(cb.name(), "demo");
        assert!(cb.by_name("rot").is_some());
    }

    #[test]
    fn rejects_a_header_without_the_bopdb_prefix() {
        let reg = default_registry();
        let err = CodeBase::parse("not a header\n\n\n.eof.\n", &reg).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidHeader(_)));
    }

    #[test]
    fn rejects_text_that_never_reaches_eof() {
        let reg = default_registry();
        let text = ".bopDB: demo\n\n\nrot\n---\nget_question\n\n[[1, 2]]\n\n";
        let err = CodeBase::parse(text, &reg).unwrap_err();
        assert_eq!(err, HarnessError::InvalidEnding);
    }

    #[test]
    fn add_rejects_a_name_shorter_than_three_characters() {
        let mut cb = CodeBase::new();
        let reg = default_registry();
        let program = compile(&["get_question".to_string()], &reg).unwrap();
        let err = cb.add("aa".to_string(), Source::new(vec![]), program, Grid::from_rows(vec![vec![1]]).unwrap()).unwrap_err();
        assert_eq!(err, HarnessError::NameTooShort("aa".to_string()));
    }

    #[test]
    fn add_rejects_a_duplicate_name() {
        let mut cb = CodeBase::new();
        let reg = default_registry();
        let program = compile(&["get_question".to_string()], &reg).unwrap();
        cb.add("rot".to_string(), Source::new(vec![]), program.clone(), Grid::from_rows(vec![vec![1]]).unwrap()).unwrap();
        let err = cb.add("rot".to_string(), Source::new(vec![]), program, Grid::from_rows(vec![vec![1]]).unwrap()).unwrap_err();
        assert_eq!(err, HarnessError::DuplicateName("rot".to_string()));
    }
}
