//! Line-oriented text accumulation for the emitter. Mirrors the teacher's
//! `Writer`/`BatchWriter` pattern of queuing output units and flushing once,
//! except the unit here is a line of HW-dialect text rather than a terminal
//! command, and "flushing" just joins the queued lines (spec §4.5.5:
//! byte-stable output).

pub struct TextWriter {
    lines: Vec<String>,
    indent: usize,
}

impl Default for TextWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextWriter {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            indent: 0,
        }
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let pad = "  ".repeat(self.indent);
        self.lines.push(format!("{pad}{}", text.as_ref()));
    }

    /// Opens a `header {` block and indents everything emitted until the
    /// matching [`TextWriter::close_block`].
    pub fn open_block(&mut self, header: impl AsRef<str>) {
        self.line(format!("{} {{", header.as_ref()));
        self.indent += 1;
    }

    pub fn close_block(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    pub fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}
