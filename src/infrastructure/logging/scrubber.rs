//! Secret redaction for log output.

use regex::Regex;
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Redacts bearer tokens and credential fields from formatted log output
#[derive(Clone)]
pub struct SecretScrubber {
    bearer_pattern: Regex,
    token_field_pattern: Regex,
    password_pattern: Regex,
    jwt_pattern: Regex,
}

impl SecretScrubber {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            bearer_pattern: Regex::new(r"Bearer\s+[a-zA-Z0-9\-_\.=]+")?,
            // "token": "..." / auth_token=... / accessToken: ...
            token_field_pattern: Regex::new(
                r#"(?i)(["']?(?:auth_token|access_?token|token)["']?\s*[:=]\s*)["']?[^"'\s,}]+["']?"#,
            )?,
            password_pattern: Regex::new(
                r#"(?i)(["']?(?:password|arg1)["']?\s*[:=]\s*)["']?[^"'\s,}]+["']?"#,
            )?,
            jwt_pattern: Regex::new(r"eyJ[a-zA-Z0-9\-_]+\.[a-zA-Z0-9\-_]+\.[a-zA-Z0-9\-_]+")?,
        })
    }

    /// Scrub a message of sensitive data
    pub fn scrub(&self, message: &str) -> String {
        let scrubbed = self
            .bearer_pattern
            .replace_all(message, "Bearer [TOKEN_REDACTED]");
        let scrubbed = self
            .token_field_pattern
            .replace_all(&scrubbed, "${1}[REDACTED]");
        let scrubbed = self
            .password_pattern
            .replace_all(&scrubbed, "${1}[REDACTED]");
        self.jwt_pattern
            .replace_all(&scrubbed, "[TOKEN_REDACTED]")
            .into_owned()
    }
}

impl fmt::Debug for SecretScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScrubber").finish()
    }
}

/// Wraps a [`MakeWriter`] so every formatted event is scrubbed before it
/// reaches the sink.
#[derive(Clone)]
pub struct ScrubbingMakeWriter<M> {
    inner: M,
    scrubber: Arc<SecretScrubber>,
}

impl<M> ScrubbingMakeWriter<M> {
    pub fn new(inner: M, scrubber: Arc<SecretScrubber>) -> Self {
        Self { inner, scrubber }
    }
}

impl<'a, M> MakeWriter<'a> for ScrubbingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = ScrubbingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        ScrubbingWriter {
            inner: self.inner.make_writer(),
            scrubber: Arc::clone(&self.scrubber),
        }
    }
}

/// Writer that redacts each buffer before passing it on.
pub struct ScrubbingWriter<W> {
    inner: W,
    scrubber: Arc<SecretScrubber>,
}

impl<W: io::Write> io::Write for ScrubbingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        self.inner
            .write_all(self.scrubber.scrub(&text).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
