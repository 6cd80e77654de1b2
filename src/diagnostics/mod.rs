use crate::span::{LineIndex, Span};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Scan error: {msg}")]
    Scan { msg: String, span: Span },

    #[error("Syntax error: {msg}")]
    Syntax { msg: String, span: Span },

    #[error("Identification error: {msg}")]
    Identification { msg: String, span: Span },

    #[error("Type error: {msg}")]
    Type { msg: String, span: Span },

    #[error("Codegen error: {msg}")]
    Codegen { msg: String, span: Option<Span> },

    #[error("I/O error: {msg}")]
    Io { msg: String },
}

impl CompileError {
    pub fn scan(msg: impl Into<String>, span: Span) -> Self {
        Self::Scan { msg: msg.into(), span }
    }

    pub fn syntax(msg: impl Into<String>, span: Span) -> Self {
        Self::Syntax { msg: msg.into(), span }
    }

    pub fn ident(msg: impl Into<String>, span: Span) -> Self {
        Self::Identification { msg: msg.into(), span }
    }

    pub fn type_err(msg: impl Into<String>, span: Span) -> Self {
        Self::Type { msg: msg.into(), span }
    }

    pub fn codegen(msg: impl Into<String>) -> Self {
        Self::Codegen { msg: msg.into(), span: None }
    }

    pub fn codegen_at(msg: impl Into<String>, span: Span) -> Self {
        Self::Codegen { msg: msg.into(), span: Some(span) }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io { msg: msg.into() }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Scan { span, .. }
            | Self::Syntax { span, .. }
            | Self::Identification { span, .. }
            | Self::Type { span, .. } => Some(*span),
            Self::Codegen { span, .. } => *span,
            Self::Io { .. } => None,
        }
    }

    fn kind_str(&self) -> &'static str {
        match self {
            Self::Scan { .. } => "scan",
            Self::Syntax { .. } => "syntax",
            Self::Identification { .. } => "identification",
            Self::Type { .. } => "type",
            Self::Codegen { .. } => "codegen",
            Self::Io { .. } => "io",
        }
    }

    fn msg(&self) -> &str {
        match self {
            Self::Scan { msg, .. }
            | Self::Syntax { msg, .. }
            | Self::Identification { msg, .. }
            | Self::Type { msg, .. }
            | Self::Codegen { msg, .. }
            | Self::Io { msg } => msg,
        }
    }
}

impl From<std::io::Error> for CompileError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

/// Ordered sink for every error a compilation run produces.
#[derive(Debug)]
pub struct Reporter {
    errors: Vec<CompileError>,
}

impl Reporter {
    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    /// One `*** line:col: message` line per error, in report order.
    pub fn render_lines(&self, source: &str) -> Vec<String> {
        let index = LineIndex::new(source);
        self.errors
            .iter()
            .map(|err| match err.span() {
                Some(span) => {
                    let (line, col) = index.line_col(span.start.min(source.len()));
                    format!("*** {line}:{col}: {err}")
                }
                None => format!("*** {err}"),
            })
            .collect()
    }
}

impl FromIterator<CompileError> for Reporter {
    fn from_iter<I: IntoIterator<Item = CompileError>>(iter: I) -> Self {
        Self { errors: iter.into_iter().collect() }
    }
}

impl From<CompileError> for Reporter {
    fn from(err: CompileError) -> Self {
        Self { errors: vec![err] }
    }
}

/// Render a CompileError with ariadne for nice terminal output.
pub fn render_error(source: &str, filename: &str, err: &CompileError) -> std::io::Result<()> {
    use ariadne::{Label, Report, ReportKind, Source};

    match err.span() {
        Some(span) => {
            let end = span.end.max(span.start + 1).min(source.len().max(1));
            Report::build(ReportKind::Error, (), span.start)
                .with_message(format!("{} error in {filename}", err.kind_str()))
                .with_label(Label::new(span.start..end).with_message(err.msg()))
                .finish()
                .eprint(Source::from(source))
        }
        None => {
            eprintln!("error[{}]: {}", err.kind_str(), err.msg());
            Ok(())
        }
    }
}
