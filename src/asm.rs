//! AsmWriter: the section/fragment text buffer, label allocation, and literal pool
//! (spec §4.3). Grounded directly on `original_source/tools/compile/codegen.py`'s
//! `Fragment`/`Section`/`Asm` classes — each definition owns its own fragment so the
//! external linker can drop unreferenced ones, and labels are minted through small
//! per-section counters rather than any process-global state (spec §9).

use std::collections::HashMap;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Text,
    Rodata,
    Data,
    Bss,
}

impl SectionKind {
    fn directive(self) -> &'static str {
        match self {
            SectionKind::Text => ".text",
            SectionKind::Rodata => ".rodata",
            SectionKind::Data => ".data",
            SectionKind::Bss => ".bss",
        }
    }

    fn tag(self) -> char {
        match self {
            SectionKind::Text => 't',
            SectionKind::Rodata => 'r',
            SectionKind::Data => 'd',
            SectionKind::Bss => 'b',
        }
    }
}

/// A buffer of indented lines. `own_fragment` on the owning [`Section`] seals the
/// current one and opens a fresh one.
#[derive(Debug, Default)]
pub struct Fragment {
    lines: Vec<String>,
}

impl Fragment {
    fn add(&mut self, s: &str, indent: &str) {
        self.lines.push(format!("{indent}{s}"));
    }

    fn add_empty_line(&mut self) {
        self.lines.push(String::new());
    }

    fn add_raw(&mut self, s: &str) {
        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.ends_with(':') {
                self.lines.push(line.to_string());
            } else {
                self.add(line, "    ");
            }
        }
    }

    fn save(&self, out: &mut String) {
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }
}

/// A section made of fragments, in emission order.
pub struct Section {
    kind: SectionKind,
    fragments: Vec<Fragment>,
    local_label_counter: u32,
    static_label_counter: u32,
}

impl Section {
    fn new(kind: SectionKind) -> Section {
        let mut s = Section {
            kind,
            fragments: Vec::new(),
            local_label_counter: 0,
            static_label_counter: 0,
        };
        s.add_fragment();
        s
    }

    fn add_fragment(&mut self) -> &mut Fragment {
        self.fragments.push(Fragment::default());
        self.fragments.last_mut().unwrap()
    }

    /// Seal the current fragment and open a new one, so that the definition about
    /// to follow owns its own fragment (enables dead-section elimination by the
    /// external linker).
    pub fn own_fragment(&mut self) {
        self.add_fragment();
    }

    fn cur(&mut self) -> &mut Fragment {
        self.fragments.last_mut().unwrap()
    }

    pub fn emit(&mut self, s: &str) {
        self.cur().add(s, "    ");
    }

    pub fn emit_lines<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) {
        for line in lines {
            self.emit(line);
        }
    }

    pub fn emit_empty_line(&mut self) {
        self.cur().add_empty_line();
    }

    pub fn emit_raw(&mut self, s: &str) {
        self.cur().add_raw(s);
    }

    pub fn emit_label(&mut self, name: &str) {
        self.cur().add(&format!("{name}:"), "");
    }

    /// Mint a function-local label, globally disambiguated by a monotonically
    /// increasing per-section counter (spec §4.3).
    pub fn new_local_label(&mut self, purpose: &str) -> String {
        self.local_label_counter += 1;
        let label = format!(".L{}{}.{purpose}", self.kind.tag(), self.local_label_counter);
        label
    }

    /// Mint a static-variable label embedding the function name and an ordinal.
    pub fn new_static_label(&mut self, func_name: &str, var_name: &str) -> String {
        self.static_label_counter += 1;
        format!("{func_name}.{var_name}.{}", self.static_label_counter)
    }

    pub fn emit_constant(&mut self, v: &Value) {
        match v {
            Value::IntConstant { value, ty } => {
                let size = ty.size().unwrap_or(4);
                let d = match size {
                    1 => "db",
                    2 => "dh",
                    4 => "dw",
                    8 => "dq",
                    _ => "dw",
                };
                self.emit(&format!(".{d} {value}"));
            }
            Value::PtrConstant { value, .. } => {
                self.emit(&format!(".dw {value}"));
            }
            Value::SymConstant { name, offset, .. } => {
                if *offset == 0 {
                    self.emit(&format!(".dw ${name}"));
                } else {
                    self.emit(&format!(".dw +(${name} {offset})"));
                }
            }
            _ => unreachable!("emit_constant called on a non-constant value"),
        }
    }

    fn save(&self, out: &mut String) {
        out.push_str(self.kind.directive());
        out.push('\n');
        for fragment in &self.fragments {
            fragment.save(out);
        }
    }
}

/// Byte-content → `.LS_n` label pool (invariant 5, invariant 7): minted by Sema as
/// string literals decay to pointers, and later drained into `.rodata` by
/// [`AsmWriter::flush_str_pool`] so both walkers agree on label assignment without
/// Sema needing to touch the section buffers directly.
#[derive(Debug, Default)]
pub struct StrPool {
    labels: HashMap<Vec<u8>, String>,
    order: Vec<(String, String)>,
    counter: u32,
}

impl StrPool {
    pub fn new() -> StrPool {
        StrPool::default()
    }

    pub fn intern(&mut self, bytes: &[u8], source_form: &str) -> String {
        if let Some(label) = self.labels.get(bytes) {
            return label.clone();
        }
        self.counter += 1;
        let label = format!(".LS_{}", self.counter);
        self.labels.insert(bytes.to_vec(), label.clone());
        self.order.push((label.clone(), source_form.to_string()));
        label
    }
}

/// The four sections plus the string literal pool, producing the final assembly
/// text.
pub struct AsmWriter {
    pub text: Section,
    pub rodata: Section,
    pub data: Section,
    pub bss: Section,
}

impl AsmWriter {
    pub fn new() -> AsmWriter {
        AsmWriter {
            text: Section::new(SectionKind::Text),
            rodata: Section::new(SectionKind::Rodata),
            data: Section::new(SectionKind::Data),
            bss: Section::new(SectionKind::Bss),
        }
    }

    pub fn section(&mut self, kind: SectionKind) -> &mut Section {
        match kind {
            SectionKind::Text => &mut self.text,
            SectionKind::Rodata => &mut self.rodata,
            SectionKind::Data => &mut self.data,
            SectionKind::Bss => &mut self.bss,
        }
    }

    /// Emit every literal Sema interned into `.rodata`, in mint order.
    pub fn flush_str_pool(&mut self, pool: &StrPool) {
        for (label, source_form) in &pool.order {
            self.rodata.own_fragment();
            self.rodata.emit_label(label);
            self.rodata.emit(&format!(".asciz {source_form}"));
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.text.save(&mut out);
        self.rodata.save(&mut out);
        self.data.save(&mut out);
        self.bss.save(&mut out);
        out
    }
}

impl Default for AsmWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// `log2` of a power-of-two alignment, for `.align P2`.
pub fn p2align(alignment: usize) -> u32 {
    alignment.trailing_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::builtin;

    #[test]
    fn equal_strings_share_a_label() {
        let mut pool = StrPool::new();
        let l1 = pool.intern(b"hi\0", "\"hi\"");
        let l2 = pool.intern(b"hi\0", "\"hi\"");
        assert_eq!(l1, l2);
        let l3 = pool.intern(b"bye\0", "\"bye\"");
        assert_ne!(l1, l3);
    }

    #[test]
    fn emit_constant_picks_width_directive() {
        let mut w = AsmWriter::new();
        w.data.emit_constant(&Value::IntConstant { value: 7, ty: builtin::char() });
        let text = w.to_text();
        assert!(text.contains(".db 7"));
    }

    #[test]
    fn own_fragment_keeps_definitions_separable() {
        let mut w = AsmWriter::new();
        w.text.own_fragment();
        w.text.emit_label("foo");
        w.text.own_fragment();
        w.text.emit_label("bar");
        let text = w.to_text();
        assert!(text.contains("foo:"));
        assert!(text.contains("bar:"));
    }
}
