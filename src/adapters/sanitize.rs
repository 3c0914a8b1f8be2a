//! Log sanitization for clinical values and secrets.
//!
//! Formatted log lines pass through [`SanitizingMakeWriter`] before they reach
//! the sink. The following are replaced with `[REDACTED-*]` markers:
//! - clinical feature assignments (`age=55`, `"chol": 250`)
//! - UUIDs and email addresses
//! - JWTs, contextual secrets (`api_key=...`) and long hex key material
//! - PEM private key blocks
//!
//! Handlers never log request bodies. This writer is the backstop for values
//! that end up in formatted messages anyway (e.g. `Debug` of a record).
//!
//! Input is capped at [`SANITIZE_MAX_BYTES`] per line; the rest is dropped
//! and marked `[TRUNCATED]`.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

pub const SANITIZE_MAX_BYTES: usize = 16 * 1024;

static PATTERNS: OnceLock<RedactionPatterns> = OnceLock::new();

struct Redaction {
    regex: Regex,
    replacement: &'static str,
}

struct RedactionPatterns {
    set: RegexSet,
    rules: Vec<Redaction>,
    pem: Redaction,
}

const RULES: &[(&str, &str)] = &[
    // Clinical feature assignments, keeping the field name.
    (
        r#"(?i)\b(age|sex|cp|trestbps|chol|fbs|restecg|thalach|exang|oldpeak|slope|ca|thal)\b("?\s*[:=]\s*)"?-?[0-9]+(?:\.[0-9]+)?"?"#,
        "${1}${2}[REDACTED]",
    ),
    (
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        "[REDACTED-UUID]",
    ),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (
        r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b",
        "[REDACTED-JWT]",
    ),
    (
        r"(?i)\b(?:api[_-]?key|access[_-]?token|secret|password|private[_-]?key|seed|signing[_-]?key|token)\b\s*[:=]\s*[A-Za-z0-9+/]{32,}={0,2}",
        "[REDACTED-SECRET]",
    ),
    (r"\b[0-9a-fA-F]{32,}\b", "[REDACTED-KEY]"),
];

const PEM_PRIVATE_KEY: &str = r"(?s)-----BEGIN [A-Z0-9 ]{0,40}PRIVATE KEY-----[\s\S]{0,8192}-----END [A-Z0-9 ]{0,40}PRIVATE KEY-----";

fn patterns() -> &'static RedactionPatterns {
    PATTERNS.get_or_init(|| {
        let set = RegexSet::new(RULES.iter().map(|(p, _)| *p)).expect("valid redaction set");
        let rules = RULES
            .iter()
            .map(|&(pattern, replacement)| Redaction {
                regex: Regex::new(pattern).expect("valid redaction pattern"),
                replacement,
            })
            .collect();
        let pem = Redaction {
            regex: Regex::new(PEM_PRIVATE_KEY).expect("valid PEM pattern"),
            replacement: "[REDACTED-PEM-PRIVATE-KEY]",
        };

        RedactionPatterns { set, rules, pem }
    })
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact clinical values and secrets from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, SANITIZE_MAX_BYTES)
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).iter() {
        let rule = &patterns.rules[idx];
        result = rule.regex.replace_all(&result, rule.replacement).into_owned();
    }

    if result.contains("-----BEGIN ") {
        result = patterns
            .pem
            .regex
            .replace_all(&result, patterns.pem.replacement)
            .into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Whether `input` holds anything [`sanitize`] would redact.
#[must_use]
pub fn contains_sensitive(input: &str) -> bool {
    let patterns = patterns();
    let (prefix, _) = truncate_to_char_boundary(input, SANITIZE_MAX_BYTES);
    patterns.set.is_match(prefix)
        || (prefix.contains("-----BEGIN ") && patterns.pem.regex.is_match(prefix))
}

/// A `tracing_subscriber` writer that sanitizes each formatted line.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    /// Sanitize one line (without its newline) and write it out.
    fn write_line(&mut self, line: &[u8], newline: bool) -> std::io::Result<()> {
        let sanitized = sanitize(&String::from_utf8_lossy(line));
        self.inner.write_all(sanitized.as_bytes())?;
        if newline {
            self.inner.write_all(b"\n")?;
        }
        Ok(())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_line(&line[..pos], true)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.flush_lines()?;

        // An unterminated line longer than twice the cap is emitted truncated.
        if self.buffer.len() > SANITIZE_MAX_BYTES * 2 {
            let pending = std::mem::take(&mut self.buffer);
            self.write_line(&pending, true)?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_line(&pending, false)?;
        }
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = std::io::Write::flush(self);
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}
