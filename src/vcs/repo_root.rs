//! Import path to repository root resolution.
//!
//! An import path such as `github.com/user/project/sub/pkg` lives inside the
//! repository `github.com/user/project`. Resolution tries, in order:
//!
//! 1. static rules for well-known hosts (no network)
//! 2. the VCS-suffix rule (`example.com/repo.git/sub`)
//! 3. `?go-get=1` meta-tag discovery over HTTPS, unless offline
//!
//! Dynamic results are memoized for the lifetime of one resolver, so a save of
//! a project importing twenty packages from one vanity host performs one
//! lookup. Nothing is cached across invocations.

use anyhow::Result;
use dashmap::DashMap;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::constants::{META_LOOKUP_BACKOFF_MS, META_LOOKUP_RETRIES, META_LOOKUP_TIMEOUT};
use crate::core::GdmError;

use super::{RepoRoot, VcsKind};

const ELEM: &str = r"[A-Za-z0-9_.\-]+";

static GITHUB: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<root>github\.com/{ELEM}/{ELEM})(/{ELEM})*$")).ok()
});

static BITBUCKET: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<root>bitbucket\.org/{ELEM}/{ELEM})(/{ELEM})*$")).ok()
});

static LAUNCHPAD: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<root>launchpad\.net/(?:(?P<project>{ELEM})|~{ELEM}/(?:\+junk|{ELEM})/{ELEM}))(/{ELEM})*$"
    ))
    .ok()
});

static APACHE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<root>git\.apache\.org/[a-z0-9_.\-]+\.git)(/{ELEM})*$")).ok()
});

static GOPKG: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<root>gopkg\.in/(?:[A-Za-z0-9][-A-Za-z0-9]*/)?[A-Za-z][-.A-Za-z0-9]*\.v[0-9]+(?:-unstable)?)(?:\.git)?(/{ELEM})*$"
    ))
    .ok()
});

static GOLANG_X: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<root>golang\.org/x/(?P<repo>{ELEM}))(/{ELEM})*$")).ok()
});

static VCS_SUFFIX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<root>(?:[a-z0-9.\-]+\.)+[a-z0-9.\-]+(?::[0-9]+)?(?:/~?[A-Za-z0-9_.\-]+)+?\.(?P<vcs>bzr|git|hg|svn))(/~?[A-Za-z0-9_.\-]+)*$",
    )
    .ok()
});

static META_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\s[^>]*>").ok());

static META_ATTR: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z\-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).ok()
});

/// Resolves import paths to [`RepoRoot`]s.
///
/// # Examples
///
/// ```rust,no_run
/// use gdm_cli::vcs::{RepoRootResolver, VcsKind};
///
/// # async fn example() -> anyhow::Result<()> {
/// let resolver = RepoRootResolver::new();
/// let root = resolver.resolve("github.com/user/project/sub").await?;
/// assert_eq!(root.root, "github.com/user/project");
/// assert_eq!(root.kind, VcsKind::Git);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RepoRootResolver {
    offline: bool,
    insecure: bool,
    client: reqwest::Client,
    memo: DashMap<String, RepoRoot>,
}

impl Default for RepoRootResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl RepoRootResolver {
    /// Creates a resolver that may perform HTTPS meta-tag lookups.
    pub fn new() -> Self {
        Self {
            offline: false,
            insecure: false,
            client: reqwest::Client::new(),
            memo: DashMap::new(),
        }
    }

    /// Disables meta-tag discovery; only static and suffix rules apply.
    pub const fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Allows falling back to plain HTTP for meta-tag discovery.
    pub const fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Resolves the repository that contains `import_path`.
    pub async fn resolve(&self, import_path: &str) -> Result<RepoRoot> {
        validate_import_path(import_path)?;

        if let Some(root) = match_static(import_path) {
            return Ok(root);
        }

        let memoized = self
            .memo
            .iter()
            .find(|entry| entry.value().contains(import_path))
            .map(|entry| entry.value().clone());
        if let Some(root) = memoized {
            tracing::trace!(target: "vcs", "Repository root for {} from memo", import_path);
            return Ok(root);
        }

        if self.offline {
            return Err(GdmError::UnknownRepository {
                import_path: import_path.to_string(),
                reason: "no static rule matches and meta-tag discovery is disabled (offline)"
                    .to_string(),
            }
            .into());
        }

        let root = self.discover(import_path).await?;
        self.memo.insert(root.root.clone(), root.clone());
        Ok(root)
    }

    async fn discover(&self, import_path: &str) -> Result<RepoRoot> {
        let body = match Retry::spawn(backoff(), || self.fetch("https", import_path)).await {
            Ok(body) => body,
            Err(e) if self.insecure => {
                tracing::debug!(
                    target: "vcs",
                    "HTTPS lookup for {} failed ({}), trying HTTP",
                    import_path,
                    e
                );
                Retry::spawn(backoff(), || self.fetch("http", import_path)).await.map_err(|e| {
                    GdmError::UnknownRepository {
                        import_path: import_path.to_string(),
                        reason: e.to_string(),
                    }
                })?
            }
            Err(e) => {
                return Err(GdmError::UnknownRepository {
                    import_path: import_path.to_string(),
                    reason: e.to_string(),
                }
                .into());
            }
        };

        match_meta_imports(import_path, &parse_meta_imports(&body))
    }

    async fn fetch(&self, scheme: &str, import_path: &str) -> Result<String, reqwest::Error> {
        let url = format!("{scheme}://{import_path}?go-get=1");
        tracing::debug!(target: "vcs", "Fetching {}", url);
        self.client
            .get(&url)
            .timeout(META_LOOKUP_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

fn backoff() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(META_LOOKUP_BACKOFF_MS).map(jitter).take(META_LOOKUP_RETRIES)
}

fn validate_import_path(import_path: &str) -> Result<()> {
    let invalid = import_path.is_empty()
        || import_path.starts_with('/')
        || import_path.contains("://")
        || import_path.split('/').any(|elem| elem.is_empty() || elem == "." || elem == "..")
        || import_path.chars().any(char::is_whitespace);
    if invalid {
        return Err(GdmError::UnknownRepository {
            import_path: import_path.to_string(),
            reason: "invalid import path".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Applies the static host rules and the VCS-suffix rule.
pub fn match_static(import_path: &str) -> Option<RepoRoot> {
    let https = |kind: VcsKind, root: &str| RepoRoot::new(kind, format!("https://{root}"), root);

    for (regex, kind) in [
        (&*GITHUB, VcsKind::Git),
        (&*BITBUCKET, VcsKind::Git),
        (&*APACHE, VcsKind::Git),
        (&*GOPKG, VcsKind::Git),
    ] {
        if let Some(caps) = regex.as_ref().and_then(|re| re.captures(import_path)) {
            return Some(https(kind, &caps["root"]));
        }
    }

    if let Some(caps) = LAUNCHPAD.as_ref().and_then(|re| re.captures(import_path)) {
        // A project path may carry a series element; the branch is the project.
        let root = match caps.name("project") {
            Some(project) => format!("launchpad.net/{}", project.as_str()),
            None => caps["root"].to_string(),
        };
        return Some(https(VcsKind::Bazaar, &root));
    }

    if let Some(caps) = GOLANG_X.as_ref().and_then(|re| re.captures(import_path)) {
        return Some(RepoRoot::new(
            VcsKind::Git,
            format!("https://go.googlesource.com/{}", &caps["repo"]),
            &caps["root"],
        ));
    }

    if let Some(caps) = VCS_SUFFIX.as_ref().and_then(|re| re.captures(import_path)) {
        let kind = VcsKind::from_name(&caps["vcs"])?;
        return Some(https(kind, &caps["root"]));
    }

    None
}

/// One `<meta name="go-import" content="prefix vcs repo">` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaImport {
    /// Import-path prefix served by the repository
    pub prefix: String,
    /// VCS short name
    pub vcs: String,
    /// Fetch URL
    pub repo: String,
}

/// Extracts every well-formed `go-import` meta tag from an HTML document.
pub fn parse_meta_imports(html: &str) -> Vec<MetaImport> {
    let mut imports = Vec::new();
    let (Some(tag_re), Some(attr_re)) = (META_TAG.as_ref(), META_ATTR.as_ref()) else {
        return imports;
    };
    for tag in tag_re.find_iter(html) {
        let mut name = None;
        let mut content = None;
        for attr in attr_re.captures_iter(tag.as_str()) {
            let value = attr.get(2).or_else(|| attr.get(3)).map_or("", |m| m.as_str());
            match attr[1].to_ascii_lowercase().as_str() {
                "name" => name = Some(value.to_string()),
                "content" => content = Some(value.to_string()),
                _ => {}
            }
        }
        if name.as_deref() != Some("go-import") {
            continue;
        }
        let Some(content) = content else {
            continue;
        };
        let fields: Vec<&str> = content.split_whitespace().collect();
        if let [prefix, vcs, repo] = fields.as_slice() {
            imports.push(MetaImport {
                prefix: (*prefix).to_string(),
                vcs: (*vcs).to_string(),
                repo: (*repo).to_string(),
            });
        }
    }
    imports
}

/// Picks the meta import whose prefix contains `import_path`.
pub fn match_meta_imports(import_path: &str, imports: &[MetaImport]) -> Result<RepoRoot> {
    let matching: Vec<&MetaImport> = imports
        .iter()
        .filter(|m| m.vcs != "mod")
        .filter(|m| {
            import_path == m.prefix
                || import_path.strip_prefix(&m.prefix).is_some_and(|rest| rest.starts_with('/'))
        })
        .collect();

    let unknown = |reason: String| GdmError::UnknownRepository {
        import_path: import_path.to_string(),
        reason,
    };

    match matching.as_slice() {
        [] => Err(unknown("no go-import meta tag matches the import path".to_string()).into()),
        [single] => {
            let kind = VcsKind::from_name(&single.vcs)
                .ok_or_else(|| unknown(format!("unsupported VCS \"{}\"", single.vcs)))?;
            Ok(RepoRoot::new(kind, single.repo.clone(), single.prefix.clone()))
        }
        [first, second, ..] => Err(unknown(format!(
            "multiple go-import meta tags match ({} and {})",
            first.prefix, second.prefix
        ))
        .into()),
    }
}
