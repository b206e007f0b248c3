//! LaTeX primitives: escaping, templates and a small document writer.

pub use crate::config::*;

use std::collections::BTreeMap;

/// The placeholder names that the report templates may use.
pub const PLACEHOLDERS: [&str; 5] = ["group", "date", "generated", "year", "period"];

/// Escapes the characters that have a meaning in LaTeX.
///
/// Line breaks are kept (a blank line still separates paragraphs), control
/// characters are dropped.
pub fn escape_tex(text: &str) -> String {
    let mut res = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => res.push_str("\\&"),
            '%' => res.push_str("\\%"),
            '$' => res.push_str("\\$"),
            '#' => res.push_str("\\#"),
            '_' => res.push_str("\\_"),
            '{' => res.push_str("\\{"),
            '}' => res.push_str("\\}"),
            '~' => res.push_str("\\textasciitilde{}"),
            '^' => res.push_str("\\textasciicircum{}"),
            '\\' => res.push_str("\\textbackslash{}"),
            '<' => res.push_str("\\textless{}"),
            '>' => res.push_str("\\textgreater{}"),
            '|' => res.push_str("\\textbar{}"),
            '\n' | '\t' => res.push(c),
            '\r' => {}
            c if c.is_control() => {}
            c => res.push(c),
        }
    }
    res
}

/// Escapes a text that goes into a single-line context (titles, headings).
pub fn escape_tex_inline(text: &str) -> String {
    let flat: Vec<&str> = text.split_whitespace().collect();
    escape_tex(&flat.join(" "))
}

/// The values of the template placeholders. Values are escaped when filled in.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct TemplateVars {
    values: BTreeMap<String, String>,
}

impl TemplateVars {
    pub fn new() -> TemplateVars {
        TemplateVars::default()
    }

    pub fn set(&mut self, name: &str, value: &str) -> &mut TemplateVars {
        self.values.insert(name.to_string(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&String> {
        self.values.get(name)
    }
}

/// Fills the `{{name}}` placeholders of a template.
///
/// The template itself is LaTeX and is copied as is. A run of three braces
/// `{{{name}}}` is read as a literal brace around a placeholder.
pub fn fill_template(template: &str, vars: &TemplateVars) -> Result<String, RenderError> {
    let mut res = String::with_capacity(template.len());
    for token in tokenize(template)? {
        match token {
            Token::Literal(s) => res.push_str(s),
            Token::Placeholder(name) => {
                let value = vars
                    .get(name)
                    .ok_or_else(|| RenderError::UnknownPlaceholder(name.to_string()))?;
                res.push_str(&escape_tex_inline(value));
            }
        }
    }
    Ok(res)
}

/// Checks that a template only uses the given placeholder names.
pub fn check_template(template: &str, known: &[&str]) -> Result<(), RenderError> {
    for token in tokenize(template)? {
        if let Token::Placeholder(name) = token {
            if !known.contains(&name) {
                return Err(RenderError::UnknownPlaceholder(name.to_string()));
            }
        }
    }
    Ok(())
}

enum Token<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn tokenize(template: &str) -> Result<Vec<Token>, RenderError> {
    let mut tokens = Vec::new();
    let mut rest = template;
    while let Some(start) = find_open(rest) {
        if start > 0 {
            tokens.push(Token::Literal(&rest[..start]));
        }
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| RenderError::UnterminatedPlaceholder(template.to_string()))?;
        tokens.push(Token::Placeholder(after[..end].trim()));
        rest = &after[end + 2..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Literal(rest));
    }
    Ok(tokens)
}

// Position of the next "{{" that is not followed by a third brace.
fn find_open(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'{' && bytes[i + 1] == b'{' {
            if bytes.get(i + 2) == Some(&b'{') {
                i += 1;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Package {
    pub name: String,
    pub options: Option<String>,
}

/// Preamble and title block of a document. `title`, `author` and `date` are
/// templates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DocumentSettings {
    pub document_class: String,
    pub packages: Vec<Package>,
    /// Raw LaTeX inserted at the end of the preamble.
    pub preamble: String,
    pub title: String,
    pub author: String,
    pub date: String,
}

/// Accumulates the source of a document.
pub struct LatexWriter {
    buf: String,
}

impl LatexWriter {
    /// Starts a document: preamble, title block and `\begin{document}`.
    pub fn begin(settings: &DocumentSettings, vars: &TemplateVars) -> Result<LatexWriter, RenderError> {
        let mut buf = String::new();
        buf.push_str(&format!("\\documentclass{{{}}}\n", settings.document_class));
        for p in settings.packages.iter() {
            match &p.options {
                Some(opts) => buf.push_str(&format!("\\usepackage[{}]{{{}}}\n", opts, p.name)),
                None => buf.push_str(&format!("\\usepackage{{{}}}\n", p.name)),
            }
        }
        if !settings.preamble.is_empty() {
            buf.push('\n');
            buf.push_str(settings.preamble.trim_end());
            buf.push('\n');
        }
        buf.push('\n');
        buf.push_str(&format!("\\title{{{}}}\n", fill_template(&settings.title, vars)?));
        buf.push_str(&format!("\\author{{{}}}\n", fill_template(&settings.author, vars)?));
        buf.push_str(&format!("\\date{{{}}}\n", fill_template(&settings.date, vars)?));
        buf.push_str("\n\\begin{document}\n\n\\maketitle\n\n");
        Ok(LatexWriter { buf })
    }

    pub fn section(&mut self, title: &str) {
        self.heading("section", title);
    }

    pub fn subsection(&mut self, title: &str) {
        self.heading("subsection", title);
    }

    pub fn subsubsection(&mut self, title: &str) {
        self.heading("subsubsection", title);
    }

    fn heading(&mut self, level: &str, title: &str) {
        self.buf
            .push_str(&format!("\\{}{{{}}}\n\n", level, escape_tex_inline(title)));
    }

    /// A run-in paragraph heading followed by its (escaped) text.
    pub fn paragraph(&mut self, title: &str, text: &str) {
        self.buf.push_str(&format!(
            "\\paragraph{{{}}} {}\n\n",
            escape_tex_inline(title),
            escape_tex(text)
        ));
    }

    /// A bold label followed by an escaped value, as its own paragraph.
    pub fn labeled(&mut self, label: &str, value: &str) {
        self.buf.push_str(&format!(
            "\\textbf{{{}:}} {}\n\n",
            escape_tex_inline(label),
            escape_tex(value)
        ));
    }

    pub fn begin_itemize(&mut self) {
        self.buf.push_str("\\begin{itemize}\n");
    }

    pub fn end_itemize(&mut self) {
        self.buf.push_str("\\end{itemize}\n\n");
    }

    /// `value` must already be LaTeX.
    pub fn item(&mut self, label: &str, value: &str) {
        self.buf.push_str(&format!(
            "    \\item \\textbf{{{}:}} {}\n",
            escape_tex_inline(label),
            value
        ));
    }

    /// Appends raw LaTeX.
    pub fn raw(&mut self, latex: &str) {
        self.buf.push_str(latex);
    }

    pub fn finish(mut self) -> String {
        self.buf.push_str("\\end{document}\n");
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> TemplateVars {
        let mut v = TemplateVars::new();
        v.set("group", "R&D_1").set("date", "June 1, 2024");
        v
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_tex("50% & $5 #1 a_b"), "50\\% \\& \\$5 \\#1 a\\_b");
        assert_eq!(escape_tex("{x}"), "\\{x\\}");
        assert_eq!(
            escape_tex("a\\b~c^d"),
            "a\\textbackslash{}b\\textasciitilde{}c\\textasciicircum{}d"
        );
        assert_eq!(escape_tex("a<b>c|d"), "a\\textless{}b\\textgreater{}c\\textbar{}d");
        assert_eq!(escape_tex("line\r\n\u{7}next"), "line\nnext");
        assert_eq!(escape_tex("Zürich — ok"), "Zürich — ok");
    }

    #[test]
    fn inline_escaping_has_no_paragraph_break() {
        assert_eq!(escape_tex_inline("  Safety\n\n Committee "), "Safety Committee");
    }

    #[test]
    fn templates() {
        assert_eq!(
            fill_template("Committee Report: {{group}}", &vars()).unwrap(),
            "Committee Report: R\\&D\\_1"
        );
        assert_eq!(
            fill_template("\\textit{{{ date }}}", &vars()).unwrap(),
            "\\textit{June 1, 2024}"
        );
        assert_eq!(fill_template("no placeholders {x}", &vars()).unwrap(), "no placeholders {x}");
        assert_eq!(
            fill_template("{{year}}", &vars()),
            Err(RenderError::UnknownPlaceholder("year".to_string()))
        );
        assert!(matches!(
            fill_template("{{group", &vars()),
            Err(RenderError::UnterminatedPlaceholder(_))
        ));
        assert!(check_template("{{year}} {{period}}", &PLACEHOLDERS).is_ok());
        assert!(check_template("{{committee}}", &PLACEHOLDERS).is_err());
    }

    #[test]
    fn document_skeleton() {
        let settings = DocumentSettings {
            document_class: "article".to_string(),
            packages: vec![
                Package {
                    name: "geometry".to_string(),
                    options: Some("margin=1in".to_string()),
                },
                Package {
                    name: "hyperref".to_string(),
                    options: None,
                },
            ],
            preamble: "\\hypersetup{colorlinks=true}\n".to_string(),
            title: "Committee Report: {{group}}".to_string(),
            author: "HFES".to_string(),
            date: "{{date}}".to_string(),
        };
        let mut w = LatexWriter::begin(&settings, &vars()).unwrap();
        w.section("Info & More");
        w.begin_itemize();
        w.item("Chair", &escape_tex("Dr. O'Neil"));
        w.end_itemize();
        let doc = w.finish();
        assert!(doc.starts_with("\\documentclass{article}\n\\usepackage[margin=1in]{geometry}\n\\usepackage{hyperref}\n"));
        assert!(doc.contains("\\hypersetup{colorlinks=true}\n"));
        assert!(doc.contains("\\title{Committee Report: R\\&D\\_1}\n"));
        assert!(doc.contains("\\date{June 1, 2024}\n"));
        assert!(doc.contains("\\section{Info \\& More}\n"));
        assert!(doc.contains("    \\item \\textbf{Chair:} Dr. O'Neil\n"));
        assert!(doc.ends_with("\\end{document}\n"));
    }
}
