//! Import-declaration parser for Go source files.
//!
//! Only the file header is read: the `package` clause followed by any number
//! of `import` declarations. Parsing stops at the first other top-level token,
//! so function bodies are never tokenized.
//!
//! Supported forms:
//!
//! ```go
//! import "fmt"
//! import alias "github.com/x/y"
//! import . "github.com/x/dot"
//! import _ "github.com/x/side/effect"
//! import (
//!     "os"
//!     raw `github.com/x/raw`
//! )
//! ```

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;

use crate::core::GdmError;

use super::constraint::BuildTarget;

/// Imports found in one package directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirScan {
    /// Imports of regular source files
    pub imports: BTreeSet<String>,
    /// Imports of `_test.go` files
    pub test_imports: BTreeSet<String>,
    /// Number of regular source files considered
    pub go_files: usize,
    /// Number of test files considered
    pub test_files: usize,
}

impl DirScan {
    /// Whether the directory holds any Go file at all.
    pub const fn has_go_files(&self) -> bool {
        self.go_files + self.test_files > 0
    }

    /// Imports to follow, optionally including test files.
    pub fn all_imports(&self, include_tests: bool) -> BTreeSet<String> {
        let mut all = self.imports.clone();
        if include_tests {
            all.extend(self.test_imports.iter().cloned());
        }
        all
    }
}

/// Reads every eligible `.go` file directly inside `dir`.
///
/// Files whose names start with `_` or `.` are skipped, as are files whose
/// name suffix or build constraint excludes them on `target`.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or a file header is
/// malformed ([`GdmError::ImportParseFailed`]).
pub fn scan_dir(dir: &Path, target: &BuildTarget) -> Result<DirScan> {
    let mut scan = DirScan::default();
    let mut names: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| is_go_source(name) && target.matches_file_name(name))
        .collect();
    names.sort();

    for name in names {
        let path = dir.join(&name);
        let source = std::fs::read_to_string(&path)?;
        if !target.matches_source(&source) {
            tracing::trace!(target: "crawler", "Skipping {} (build constraints)", path.display());
            continue;
        }
        let imports = parse_imports(&source).map_err(|reason| GdmError::ImportParseFailed {
            file: path.display().to_string(),
            reason,
        })?;
        if name.ends_with("_test.go") {
            scan.test_files += 1;
            scan.test_imports.extend(imports);
        } else {
            scan.go_files += 1;
            scan.imports.extend(imports);
        }
    }

    Ok(scan)
}

fn is_go_source(name: &str) -> bool {
    name.ends_with(".go") && !name.starts_with('_') && !name.starts_with('.')
}

/// Parses the import paths declared in a Go source file.
///
/// # Errors
///
/// Returns a message describing the first syntax error in the header.
pub fn parse_imports(source: &str) -> std::result::Result<Vec<String>, String> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut lexer = Lexer::new(source);

    match lexer.next_token()? {
        Some(Token::Ident("package")) => {}
        Some(other) => return Err(format!("expected 'package', found {other}")),
        None => return Err("expected 'package', found end of file".to_string()),
    }
    match lexer.next_token()? {
        Some(Token::Ident(_)) => {}
        other => return Err(format!("expected package name, found {}", describe(other.as_ref()))),
    }

    let mut imports = Vec::new();
    loop {
        match lexer.next_token()? {
            Some(Token::Punct(';')) => {}
            Some(Token::Ident("import")) => match lexer.next_token()? {
                Some(Token::Punct('(')) => loop {
                    match lexer.next_token()? {
                        Some(Token::Punct(')')) => break,
                        Some(Token::Punct(';')) => {}
                        token => imports.push(import_spec(&mut lexer, token)?),
                    }
                },
                token => imports.push(import_spec(&mut lexer, token)?),
            },
            _ => break,
        }
    }
    Ok(imports)
}

fn import_spec(lexer: &mut Lexer<'_>, first: Option<Token<'_>>) -> std::result::Result<String, String> {
    let path = match first {
        Some(Token::Str(path)) => path,
        Some(Token::Ident(_) | Token::Punct('.')) => match lexer.next_token()? {
            Some(Token::Str(path)) => path,
            other => return Err(format!("expected import path, found {}", describe(other.as_ref()))),
        },
        other => return Err(format!("expected import path, found {}", describe(other.as_ref()))),
    };
    if path.is_empty() {
        return Err("empty import path".to_string());
    }
    Ok(path)
}

fn describe(token: Option<&Token<'_>>) -> String {
    token.map_or_else(|| "end of file".to_string(), ToString::to_string)
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Str(String),
    Punct(char),
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ident(ident) => write!(f, "'{ident}'"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Punct(c) => write!(f, "'{c}'"),
        }
    }
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    const fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_trivia(&mut self) -> std::result::Result<(), String> {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if trimmed.starts_with("//") {
                let end = trimmed.find('\n').unwrap_or(trimmed.len());
                self.pos += end;
            } else if let Some(body) = trimmed.strip_prefix("/*") {
                let end = body.find("*/").ok_or("unterminated block comment")?;
                self.pos += 2 + end + 2;
            } else {
                return Ok(());
            }
        }
    }

    fn next_token(&mut self) -> std::result::Result<Option<Token<'a>>, String> {
        self.skip_trivia()?;
        let rest = self.rest();
        let Some(c) = rest.chars().next() else {
            return Ok(None);
        };

        if c.is_alphabetic() || c == '_' {
            let len = rest.find(|ch: char| !(ch.is_alphanumeric() || ch == '_')).unwrap_or(rest.len());
            self.pos += len;
            return Ok(Some(Token::Ident(&rest[..len])));
        }

        if c == '`' {
            let end = rest[1..].find('`').ok_or("unterminated raw string")?;
            self.pos += end + 2;
            return Ok(Some(Token::Str(rest[1..=end].to_string())));
        }

        if c == '"' {
            let mut value = String::new();
            let mut chars = rest[1..].char_indices();
            while let Some((i, ch)) = chars.next() {
                match ch {
                    '"' => {
                        self.pos += i + 2;
                        return Ok(Some(Token::Str(value)));
                    }
                    '\n' => break,
                    '\\' => match chars.next() {
                        Some((_, 'n')) => value.push('\n'),
                        Some((_, 't')) => value.push('\t'),
                        Some((_, escaped @ ('\\' | '"' | '\''))) => value.push(escaped),
                        Some((_, other)) => {
                            value.push('\\');
                            value.push(other);
                        }
                        None => break,
                    },
                    _ => value.push(ch),
                }
            }
            return Err("unterminated string literal".to_string());
        }

        self.pos += c.len_utf8();
        Ok(Some(Token::Punct(c)))
    }
}
