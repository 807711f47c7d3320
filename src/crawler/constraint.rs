//! Build constraints: `_GOOS`/`_GOARCH` file-name suffixes and
//! `//go:build` / `// +build` lines.
//!
//! Files excluded for the target platform are never parsed, so an import
//! that only a Windows file makes does not have to exist on a Linux host.
//!
//! Satisfied tags are the target `GOOS` and `GOARCH`, `unix` on Unix-like
//! systems, `gc`, `cgo` and every `go1.N` release tag. `ignore` and any
//! custom tag are never satisfied.

/// Operating systems Go knows about, as used in file-name suffixes.
const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux", "nacl",
    "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

/// Architectures Go knows about, as used in file-name suffixes.
const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle", "mips64",
    "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv", "riscv64", "s390", "s390x",
    "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux", "netbsd", "openbsd",
    "solaris",
];

/// The `GOOS`/`GOARCH` pair files are selected for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    /// Go operating system name
    pub goos: String,
    /// Go architecture name
    pub goarch: String,
}

impl Default for BuildTarget {
    fn default() -> Self {
        Self::host()
    }
}

impl BuildTarget {
    /// Creates a target for an explicit pair.
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
        }
    }

    /// The platform gdm runs on, in Go's names.
    pub fn host() -> Self {
        Self::new(go_os(std::env::consts::OS), go_arch(std::env::consts::ARCH))
    }

    /// The host platform, overridden by non-empty `GOOS`/`GOARCH` values.
    pub fn from_vars(goos: Option<&str>, goarch: Option<&str>) -> Self {
        let host = Self::host();
        Self {
            goos: goos.filter(|v| !v.is_empty()).map_or(host.goos, str::to_string),
            goarch: goarch.filter(|v| !v.is_empty()).map_or(host.goarch, str::to_string),
        }
    }

    /// Whether a build tag holds for this target.
    pub fn matches_tag(&self, tag: &str) -> bool {
        if tag == self.goos || tag == self.goarch {
            return true;
        }
        match tag {
            "gc" | "cgo" => true,
            "unix" => UNIX_OS.contains(&self.goos.as_str()),
            "linux" => self.goos == "android",
            "solaris" => self.goos == "illumos",
            "darwin" => self.goos == "ios",
            _ => tag
                .strip_prefix("go1.")
                .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit())),
        }
    }

    /// Whether a file name's `_GOOS`, `_GOARCH` or `_GOOS_GOARCH` suffix
    /// allows it on this target. Names without a known suffix always match.
    pub fn matches_file_name(&self, name: &str) -> bool {
        let stem = name.split_once('.').map_or(name, |(stem, _)| stem);
        let Some(underscore) = stem.find('_') else {
            return true;
        };
        let mut parts: Vec<&str> = stem[underscore..].split('_').collect();
        if parts.last() == Some(&"test") {
            parts.pop();
        }
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.matches_tag(parts[n - 2]) && self.matches_tag(parts[n - 1]);
        }
        match parts.last() {
            Some(last) if KNOWN_OS.contains(last) || KNOWN_ARCH.contains(last) => self.matches_tag(last),
            _ => true,
        }
    }

    /// Whether the constraint lines in the header of `source` allow the file.
    ///
    /// A `//go:build` line takes precedence over `// +build` lines. Lines
    /// after the `package` clause are not constraints. A malformed expression
    /// does not exclude the file.
    pub fn matches_source(&self, source: &str) -> bool {
        let mut go_build = None;
        let mut plus_build = Vec::new();
        for line in source.lines() {
            let line = line.trim();
            if line.starts_with("package") {
                break;
            }
            if let Some(expr) = line.strip_prefix("//go:build") {
                if go_build.is_none() {
                    go_build = Some(expr.trim());
                }
            } else if let Some(expr) = line.strip_prefix("// +build") {
                plus_build.push(expr.trim());
            }
        }

        if let Some(expr) = go_build {
            return match Expr::parse(expr) {
                Some(parsed) => parsed.eval(&|tag| self.matches_tag(tag)),
                None => {
                    tracing::trace!(target: "crawler", "Malformed build constraint: {}", expr);
                    true
                }
            };
        }
        plus_build.iter().all(|line| self.matches_plus_build(line))
    }

    /// `// +build a,b c` means `(a && b) || c`; `!` negates a single tag.
    fn matches_plus_build(&self, line: &str) -> bool {
        line.split_whitespace().any(|alternative| {
            alternative.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !self.matches_tag(tag),
                None => self.matches_tag(term),
            })
        })
    }
}

fn go_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn go_arch(arch: &str) -> &str {
    let little = cfg!(target_endian = "little");
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "loongarch64" => "loong64",
        "wasm32" => "wasm",
        "powerpc" => "ppc",
        "powerpc64" if little => "ppc64le",
        "powerpc64" => "ppc64",
        "mips" if little => "mipsle",
        "mips64" if little => "mips64le",
        other => other,
    }
}

/// A parsed `//go:build` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn parse(text: &str) -> Option<Self> {
        let tokens = tokenize(text)?;
        let mut parser = ExprParser {
            tokens,
            pos: 0,
        };
        let expr = parser.or()?;
        (parser.pos == parser.tokens.len()).then_some(expr)
    }

    fn eval(&self, tag: &impl Fn(&str) -> bool) -> bool {
        match self {
            Self::Tag(name) => tag(name),
            Self::Not(inner) => !inner.eval(tag),
            Self::And(a, b) => a.eval(tag) && b.eval(tag),
            Self::Or(a, b) => a.eval(tag) || b.eval(tag),
        }
    }
}

fn tokenize(text: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' | '!' => {
                tokens.push(c.to_string());
                chars.next();
            }
            '&' | '|' => {
                chars.next();
                if chars.next() != Some(c) {
                    return None;
                }
                tokens.push(format!("{c}{c}"));
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut tag = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_alphanumeric() || c == '_' || c == '.') {
                        break;
                    }
                    tag.push(c);
                    chars.next();
                }
                tokens.push(tag);
            }
            _ => return None,
        }
    }
    Some(tokens)
}

struct ExprParser {
    tokens: Vec<String>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn or(&mut self) -> Option<Expr> {
        let mut left = self.and()?;
        while self.peek() == Some("||") {
            self.pos += 1;
            left = Expr::Or(Box::new(left), Box::new(self.and()?));
        }
        Some(left)
    }

    fn and(&mut self) -> Option<Expr> {
        let mut left = self.not()?;
        while self.peek() == Some("&&") {
            self.pos += 1;
            left = Expr::And(Box::new(left), Box::new(self.not()?));
        }
        Some(left)
    }

    fn not(&mut self) -> Option<Expr> {
        if self.peek() == Some("!") {
            self.pos += 1;
            return Some(Expr::Not(Box::new(self.not()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Option<Expr> {
        let token = self.peek()?.to_string();
        self.pos += 1;
        match token.as_str() {
            "(" => {
                let inner = self.or()?;
                (self.peek() == Some(")")).then(|| {
                    self.pos += 1;
                    inner
                })
            }
            ")" | "&&" | "||" => None,
            _ => Some(Expr::Tag(token)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux() -> BuildTarget {
        BuildTarget::new("linux", "amd64")
    }

    #[test]
    fn test_file_name_suffixes() {
        let t = linux();
        assert!(t.matches_file_name("main.go"));
        assert!(t.matches_file_name("linux.go"));
        assert!(t.matches_file_name("sys_linux.go"));
        assert!(t.matches_file_name("sys_linux_amd64.go"));
        assert!(t.matches_file_name("sys_amd64.go"));
        assert!(t.matches_file_name("sys_linux_test.go"));
        assert!(t.matches_file_name("my_helper.go"));
        assert!(!t.matches_file_name("sys_windows.go"));
        assert!(!t.matches_file_name("sys_windows_test.go"));
        assert!(!t.matches_file_name("sys_linux_arm64.go"));
        assert!(!t.matches_file_name("sys_386.go"));
        assert!(BuildTarget::new("android", "arm64").matches_file_name("sys_linux.go"));
    }

    #[test]
    fn test_go_build_expressions() {
        let t = linux();
        assert!(t.matches_source("//go:build linux\n\npackage x\n"));
        assert!(t.matches_source("//go:build (linux || darwin) && !386\n\npackage x\n"));
        assert!(t.matches_source("//go:build unix && go1.18\n\npackage x\n"));
        assert!(!t.matches_source("//go:build windows\n\npackage x\n"));
        assert!(!t.matches_source("//go:build ignore\n\npackage x\n"));
        assert!(!t.matches_source("//go:build linux && customtag\n\npackage x\n"));
        assert!(!t.matches_source("//go:build !linux\n\npackage x\n"));
        // After the package clause it is just a comment.
        assert!(t.matches_source("package x\n//go:build windows\n"));
        // Malformed expressions do not exclude the file.
        assert!(t.matches_source("//go:build linux &&\n\npackage x\n"));
    }

    #[test]
    fn test_plus_build_lines() {
        let t = linux();
        assert!(t.matches_source("// +build linux darwin\n\npackage x\n"));
        assert!(t.matches_source("// +build linux,amd64\n\npackage x\n"));
        assert!(!t.matches_source("// +build linux,!amd64\n\npackage x\n"));
        assert!(!t.matches_source("// +build ignore\n\npackage x\n"));
        // Multiple lines are ANDed.
        assert!(!t.matches_source("// +build linux\n// +build windows\n\npackage x\n"));
        // `//go:build` wins over `// +build`.
        assert!(t.matches_source("//go:build linux\n// +build windows\n\npackage x\n"));
    }

    #[test]
    fn test_from_vars_overrides_host() {
        let host = BuildTarget::host();
        assert_eq!(BuildTarget::from_vars(None, Some("")), host);
        let t = BuildTarget::from_vars(Some("windows"), None);
        assert_eq!(t.goos, "windows");
        assert_eq!(t.goarch, host.goarch);
    }
}
