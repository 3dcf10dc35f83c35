/// Indentation-aware line buffer for generated source.
#[derive(Debug, Default)]
pub struct CodeWriter {
    buf: String,
    depth: usize,
}

const INDENT: &str = "    ";

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one line at the current depth. Empty text writes a bare newline.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    /// Writes a blank line unless the buffer already ends with one or is
    /// at the start of a block.
    pub fn blank(&mut self) {
        if self.buf.is_empty() || self.buf.ends_with("\n\n") || self.buf.ends_with("{\n") {
            return;
        }
        self.buf.push('\n');
    }

    /// Writes `text` and opens a block.
    pub fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.indent();
    }

    /// Closes a block with `text` (usually `}`).
    pub fn close(&mut self, text: impl AsRef<str>) {
        self.dedent();
        self.line(text);
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Writes each line of `comment` as a `///` doc comment.
    pub fn doc(&mut self, comment: &str) {
        for line in comment.trim().lines() {
            let line = line.trim_end();
            if line.is_empty() {
                self.line("///");
            } else {
                self.line(format!("/// {}", line));
            }
        }
    }

    /// Writes a framed section banner.
    pub fn banner(&mut self, title: &str) {
        self.blank();
        self.line(format!("// {}", "=".repeat(76)));
        self.line(format!("// {}", title));
        self.line(format!("// {}", "=".repeat(76)));
        self.blank();
    }

    pub fn finish(self) -> String {
        let mut out = self.buf;
        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }
}
