//! Variable interpolation and `.env` files.
//!
//! Supported forms: `$VAR`, `${VAR}`, `${VAR:-default}`, `${VAR-default}`,
//! `${VAR:?message}`, `${VAR?message}`, `${VAR:+replacement}`,
//! `${VAR+replacement}` and `$$` for a literal dollar sign. Defaults and
//! replacements are interpolated themselves.

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Name of the per-directory environment file.
pub const DOTENV_FILE: &str = ".env";

/// Variables visible to interpolation.
///
/// # Examples
///
/// ```
/// use qec::document::Environment;
///
/// let env: Environment = [("TAG".to_string(), "1.2".to_string())].into_iter().collect();
/// let out = env.interpolate("nginx:${TAG} on ${HOST:-localhost}").unwrap();
/// assert_eq!(out.value, "nginx:1.2 on localhost");
/// assert!(out.unset.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

/// Result of interpolating one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolated {
    /// The expanded text.
    pub value: String,
    /// Variables that were referenced without a value or default.
    pub unset: Vec<String>,
}

/// A failed interpolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpolationError {
    /// The variable being expanded (empty for syntax errors).
    pub variable: String,
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for InterpolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.variable, self.message)
    }
}

impl std::error::Error for InterpolationError {}

impl FromIterator<(String, String)> for Environment {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

impl Environment {
    /// An empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the process environment. Non-UTF-8 entries are dropped.
    #[must_use]
    pub fn from_os() -> Self {
        env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Sets a variable.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Looks up a variable.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Adds entries from `fallback` that are not already set.
    #[must_use]
    pub fn with_fallback(mut self, fallback: BTreeMap<String, String>) -> Self {
        for (key, value) in fallback {
            self.vars.entry(key).or_insert(value);
        }
        self
    }

    /// Reads `dir/.env` if present.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than the file not existing.
    pub fn read_dotenv(dir: &Path) -> io::Result<Option<BTreeMap<String, String>>> {
        match fs::read_to_string(dir.join(DOTENV_FILE)) {
            Ok(contents) => Ok(Some(parse_dotenv(&contents))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Expands every variable reference in `input`.
    ///
    /// # Errors
    ///
    /// Fails on malformed references and on `?` forms whose variable is
    /// missing.
    pub fn interpolate(&self, input: &str) -> Result<Interpolated, InterpolationError> {
        let mut value = String::with_capacity(input.len());
        let mut unset = Vec::new();
        self.expand(input, &mut value, &mut unset)?;
        Ok(Interpolated { value, unset })
    }

    fn expand(
        &self,
        input: &str,
        out: &mut String,
        unset: &mut Vec<String>,
    ) -> Result<(), InterpolationError> {
        let mut rest = input;
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix('$') {
                out.push('$');
                rest = tail;
            } else if let Some(body_start) = after.strip_prefix('{') {
                let end = closing_brace(body_start).ok_or_else(|| InterpolationError {
                    variable: String::new(),
                    message: format!("missing closing brace in '{input}'"),
                })?;
                self.expand_braced(&body_start[..end], out, unset)?;
                rest = &body_start[end + 1..];
            } else {
                let len = name_len(after);
                if len == 0 {
                    out.push('$');
                } else {
                    let name = &after[..len];
                    match self.get(name) {
                        Some(value) => out.push_str(value),
                        None => unset.push(name.to_string()),
                    }
                }
                rest = &after[len..];
            }
        }
        out.push_str(rest);
        Ok(())
    }

    fn expand_braced(
        &self,
        body: &str,
        out: &mut String,
        unset: &mut Vec<String>,
    ) -> Result<(), InterpolationError> {
        let len = name_len(body);
        let (name, op) = body.split_at(len);
        if name.is_empty() {
            return Err(InterpolationError {
                variable: body.to_string(),
                message: "invalid interpolation format".to_string(),
            });
        }

        let value = self.get(name);
        let non_empty = value.filter(|v| !v.is_empty());

        let (modifier, arg) = if let Some(arg) = op.strip_prefix(":-") {
            (":-", arg)
        } else if let Some(arg) = op.strip_prefix(":?") {
            (":?", arg)
        } else if let Some(arg) = op.strip_prefix(":+") {
            (":+", arg)
        } else if op.is_empty() {
            ("", "")
        } else {
            op.split_at(op.chars().next().map_or(0, char::len_utf8))
        };

        match modifier {
            "" => match value {
                Some(v) => out.push_str(v),
                None => unset.push(name.to_string()),
            },
            ":-" => match non_empty {
                Some(v) => out.push_str(v),
                None => self.expand(arg, out, unset)?,
            },
            "-" => match value {
                Some(v) => out.push_str(v),
                None => self.expand(arg, out, unset)?,
            },
            ":?" | "?" => {
                let present = if modifier == ":?" { non_empty } else { value };
                match present {
                    Some(v) => out.push_str(v),
                    None => {
                        let message = self.interpolate(arg)?.value;
                        return Err(InterpolationError {
                            variable: name.to_string(),
                            message: if message.is_empty() {
                                "required variable is missing a value".to_string()
                            } else {
                                message
                            },
                        });
                    }
                }
            }
            ":+" => {
                if non_empty.is_some() {
                    self.expand(arg, out, unset)?;
                }
            }
            "+" => {
                if value.is_some() {
                    self.expand(arg, out, unset)?;
                }
            }
            _ => {
                return Err(InterpolationError {
                    variable: name.to_string(),
                    message: format!("invalid interpolation format '${{{body}}}'"),
                })
            }
        }
        Ok(())
    }
}

fn name_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    if bytes.first().is_some_and(u8::is_ascii_digit) {
        return 0;
    }
    bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
        .count()
}

fn closing_brace(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses `.env` contents.
///
/// Accepts `KEY=VALUE`, an optional `export ` prefix, single or double
/// quoted values and `#` comments. Lines without `=` are ignored.
///
/// # Examples
///
/// ```
/// use qec::document::parse_dotenv;
///
/// let vars = parse_dotenv("# db\nexport DB_PORT=5432\nNAME=\"my app\" # quoted\n");
/// assert_eq!(vars["DB_PORT"], "5432");
/// assert_eq!(vars["NAME"], "my app");
/// ```
#[must_use]
pub fn parse_dotenv(contents: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, raw)) = line.split_once('=') else {
            log::debug!("ignoring malformed .env line: {line}");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), dotenv_value(raw.trim()));
    }
    vars
}

fn dotenv_value(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix('"') {
        if let Some(end) = inner.find('"') {
            return inner[..end]
                .replace("\\n", "\n")
                .replace("\\t", "\t")
                .replace("\\\"", "\"");
        }
    }
    if let Some(inner) = raw.strip_prefix('\'') {
        if let Some(end) = inner.find('\'') {
            return inner[..end].to_string();
        }
    }
    match raw.find(" #") {
        Some(pos) => raw[..pos].trim_end().to_string(),
        None => raw.to_string(),
    }
}
