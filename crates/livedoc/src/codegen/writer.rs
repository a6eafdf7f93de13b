// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Indentation-aware source buffer.

const INDENT: &str = "    ";

/// Line-oriented writer for generated Rust source.
#[derive(Debug, Default)]
pub struct CodeWriter {
    buf: String,
    depth: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current depth.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    /// Write `header {` and indent.
    pub fn open(&mut self, header: impl AsRef<str>) -> &mut Self {
        let header = header.as_ref();
        if header.is_empty() {
            self.line("{");
        } else {
            self.line(format!("{header} {{"));
        }
        self.depth += 1;
        self
    }

    /// Dedent and write `}`.
    pub fn close(&mut self) -> &mut Self {
        self.close_with("")
    }

    /// Dedent and write `}` followed by `suffix` (`;`, `,`, `)` ...).
    pub fn close_with(&mut self, suffix: &str) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.line(format!("}}{suffix}"))
    }

    /// Write a multi-line block, re-indenting each line to the current depth.
    pub fn block(&mut self, text: &str) -> &mut Self {
        for line in text.trim_matches('\n').lines() {
            self.line(line.trim_end());
        }
        self
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_blocks() {
        let mut w = CodeWriter::new();
        w.open("impl Foo");
        w.open("fn bar(&self) -> i32");
        w.line("1");
        w.close();
        w.close();
        assert_eq!(
            w.finish(),
            "impl Foo {\n    fn bar(&self) -> i32 {\n        1\n    }\n}\n"
        );
    }

    #[test]
    fn test_close_with_suffix_and_blank_lines() {
        let mut w = CodeWriter::new();
        w.open("let x = match y");
        w.line("_ => 0,");
        w.close_with(";");
        w.blank();
        w.line("");
        assert_eq!(w.finish(), "let x = match y {\n    _ => 0,\n};\n\n\n");
    }
}
