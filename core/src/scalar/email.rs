use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::schema::ScalarType;
use crate::value::ScalarValue;

use super::{ParseOutcome, ScalarParser};

static DOT_ATOM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*$")
        .expect("static regex must compile")
});
static HOST_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?$").expect("static regex must compile")
});

const MAX_LOCAL_PART: usize = 64;
const MAX_DOMAIN: usize = 253;
const MAX_LABEL: usize = 63;

/// Why a mailbox did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailboxError {
    #[error("missing '@' separator")]
    MissingAt,
    #[error("invalid local part")]
    InvalidLocalPart,
    #[error("invalid domain")]
    InvalidDomain,
    #[error("unbalanced angle brackets")]
    UnbalancedBrackets,
}

/// A parsed email mailbox.
///
/// The domain is stored lowercased; the local part keeps its case.
///
/// ```
/// use docshape_core::Mailbox;
///
/// let m = Mailbox::parse("Ada Lovelace <Ada@Example.ORG>").unwrap();
/// assert_eq!(m.display_name(), Some("Ada Lovelace"));
/// assert_eq!(m.address(), "Ada@example.org");
/// assert_eq!(m.to_string(), "Ada Lovelace <Ada@example.org>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox {
    display_name: Option<String>,
    local_part: String,
    domain: String,
}

impl Mailbox {
    /// Strictly parses `local@domain` or `Display Name <local@domain>`.
    pub fn parse(input: &str) -> Result<Self, MailboxError> {
        let input = input.trim();
        let (display_name, addr) = match (input.find('<'), input.ends_with('>')) {
            (Some(open), true) => {
                let name = unquote(input[..open].trim());
                let addr = &input[open + 1..input.len() - 1];
                if addr.contains(['<', '>']) {
                    return Err(MailboxError::UnbalancedBrackets);
                }
                ((!name.is_empty()).then_some(name), addr.trim())
            }
            (None, false) => (None, input),
            _ => return Err(MailboxError::UnbalancedBrackets),
        };

        let (local, domain) = addr.rsplit_once('@').ok_or(MailboxError::MissingAt)?;
        if !is_valid_local_part(local) {
            return Err(MailboxError::InvalidLocalPart);
        }
        if !is_valid_domain(domain) {
            return Err(MailboxError::InvalidDomain);
        }

        Ok(Self {
            display_name,
            local_part: local.to_string(),
            domain: domain.to_ascii_lowercase(),
        })
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Canonical `local@domain` form.
    pub fn address(&self) -> String {
        format!("{}@{}", self.local_part, self.domain)
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            None => write!(f, "{}", self.address()),
            Some(name) if name.chars().all(|c| c.is_alphanumeric() || c == ' ') => {
                write!(f, "{name} <{}>", self.address())
            }
            Some(name) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{}>", self.address())
            }
        }
    }
}

fn unquote(name: &str) -> String {
    match name.strip_prefix('"').and_then(|n| n.strip_suffix('"')) {
        Some(inner) => {
            let mut out = String::with_capacity(inner.len());
            let mut chars = inner.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                } else {
                    out.push(c);
                }
            }
            out
        }
        None => name.to_string(),
    }
}

fn is_valid_local_part(local: &str) -> bool {
    if local.is_empty() || local.len() > MAX_LOCAL_PART {
        return false;
    }
    match local.strip_prefix('"').and_then(|l| l.strip_suffix('"')) {
        Some(inner) => is_valid_quoted_content(inner),
        None => DOT_ATOM_RE.is_match(local),
    }
}

fn is_valid_quoted_content(inner: &str) -> bool {
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) if escaped.is_ascii() && !escaped.is_ascii_control() => {}
                _ => return false,
            },
            '"' => return false,
            c if c == ' ' || c.is_ascii_graphic() => {}
            _ => return false,
        }
    }
    true
}

fn is_valid_domain(domain: &str) -> bool {
    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        return match literal.strip_prefix("IPv6:") {
            Some(v6) => v6.parse::<Ipv6Addr>().is_ok(),
            None => literal.parse::<Ipv4Addr>().is_ok(),
        };
    }
    !domain.is_empty()
        && domain.len() <= MAX_DOMAIN
        && domain
            .split('.')
            .all(|label| label.len() <= MAX_LABEL && HOST_LABEL_RE.is_match(label))
}

/// Parses email addresses. A `String` target receives the canonical
/// address; a `Mailbox` target receives the structured mailbox.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailParser;

impl ScalarParser for EmailParser {
    fn parse(&self, target: &ScalarType, raw: &str, path: &str) -> ParseOutcome {
        match Mailbox::parse(raw) {
            Ok(mailbox) => match target {
                ScalarType::Mailbox => ParseOutcome::Success(ScalarValue::Mailbox(mailbox)),
                _ => ParseOutcome::Success(ScalarValue::String(mailbox.address())),
            },
            Err(_) => ParseOutcome::failure(ErrorKind::InvalidEmail, path, raw),
        }
    }
}
