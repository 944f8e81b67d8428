//! Log sanitization for patient identifiers and request secrets.
//!
//! Formatted log lines pass through [`SanitizingMakeWriter`] before they hit
//! the sink. Patterns covered:
//! - Patient identifiers (`P001`, `P0002`)
//! - SSN and MRN shaped numbers
//! - Emails and phone numbers
//! - Bearer tokens and JWTs
//! - Inline base64 image data URLs
//!
//! Input is capped per call (`MEDLENS_SANITIZE_MAX_BYTES`, default 16 KiB).
//! Controllers already avoid logging query text, so this is a second line.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PII_PATTERNS: OnceLock<Option<PiiPatterns>> = OnceLock::new();

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct PiiPattern {
    regex: Regex,
    replacement: &'static str,
}

struct PiiPatterns {
    set: RegexSet,
    patterns: Vec<PiiPattern>,
}

// Order matters: data URLs and tokens go before the shorter numeric rules
// so a long base64 payload is replaced whole.
const RULES: &[(&str, &str)] = &[
    (
        r"data:image/[a-zA-Z0-9.+-]{1,32};base64,[A-Za-z0-9+/=]{16,}",
        "[REDACTED-IMAGE-DATA]",
    ),
    (
        r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b",
        "[REDACTED-JWT]",
    ),
    (r"(?i)\bbearer\s+[A-Za-z0-9._~+/-]{16,}=*", "[REDACTED-TOKEN]"),
    (r"\b\d{3}-\d{2}-\d{4}\b", "[REDACTED-SSN]"),
    (r"\bMRN[:\s]?\d{6,10}\b", "[REDACTED-MRN]"),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (
        r"\b(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b",
        "[REDACTED-PHONE]",
    ),
    (r"\bP\d{3,6}\b", "[REDACTED-PATIENT]"),
];

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("MEDLENS_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn compile() -> Result<PiiPatterns, regex::Error> {
    let set = RegexSet::new(RULES.iter().map(|(p, _)| *p))?;
    let patterns = RULES
        .iter()
        .map(|&(pattern, replacement)| {
            Ok(PiiPattern {
                regex: Regex::new(pattern)?,
                replacement,
            })
        })
        .collect::<Result<Vec<_>, regex::Error>>()?;
    Ok(PiiPatterns { set, patterns })
}

fn get_patterns() -> Option<&'static PiiPatterns> {
    PII_PATTERNS.get_or_init(|| compile().ok()).as_ref()
}

/// Replace every recognised identifier or secret in `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = match get_patterns() {
        Some(patterns) => {
            let mut out = prefix.to_string();
            for idx in patterns.set.matches(prefix).iter() {
                let pattern = &patterns.patterns[idx];
                out = pattern
                    .regex
                    .replace_all(&out, pattern.replacement)
                    .into_owned();
            }
            out
        }
        // Fail closed if the rules cannot compile.
        None => "[REDACTED-UNSANITIZED]".to_string(),
    };

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Check if a string contains something [`sanitize`] would redact.
#[must_use]
pub fn contains_pii(input: &str) -> bool {
    let (prefix, _truncated) = truncate_to_char_boundary(input, max_sanitize_bytes());
    get_patterns().map_or(true, |p| p.set.is_match(prefix))
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log lines
/// before they reach the underlying sink.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M: Clone> Clone for SanitizingMakeWriter<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W, max_bytes: usize) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            max_bytes,
        }
    }
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let sanitized = sanitize_with_limit(&String::from_utf8_lossy(&line), self.max_bytes);
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A line with no newline must not grow the buffer without bound.
        let hard_cap = self.max_bytes.saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let s = String::from_utf8_lossy(&self.buffer).into_owned();
            let sanitized = sanitize_with_limit(&s, self.max_bytes);
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let sanitized =
                sanitize_with_limit(&String::from_utf8_lossy(&self.buffer), self.max_bytes);
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }

        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer(), max_sanitize_bytes())
    }
}
