use regex::Regex;
use warden_core::{AppError, AppResult};

use crate::RequestMethod;

/// Path patterns that impersonated requests may never mutate, with a label
/// naming the protected category.
const FORBIDDEN_PATTERNS: &[(&str, &str)] = &[
    (r"/users$", "user management"),
    (r"/users/\w+$", "user management"),
    (r"/billing", "billing"),
    (r"/subscription", "subscription"),
    (r"/payment", "payments"),
    (r"/support-access/tokens$", "support access tokens"),
    (r"/api-keys", "api keys"),
];

#[derive(Debug, Clone)]
struct ForbiddenRule {
    pattern: Regex,
    category: &'static str,
}

/// Static deny-list applied to impersonated requests regardless of scope.
#[derive(Debug, Clone)]
pub struct ForbiddenActionGuard {
    rules: Vec<ForbiddenRule>,
}

impl ForbiddenActionGuard {
    /// Compiles the deny-list.
    pub fn new() -> AppResult<Self> {
        let rules = FORBIDDEN_PATTERNS
            .iter()
            .map(|(pattern, category)| {
                Regex::new(pattern)
                    .map(|pattern| ForbiddenRule {
                        pattern,
                        category: *category,
                    })
                    .map_err(|error| {
                        AppError::Internal(format!(
                            "failed to compile forbidden action pattern '{pattern}': {error}"
                        ))
                    })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Rejects mutating requests whose path matches a forbidden pattern.
    pub fn check(&self, method: RequestMethod, path: &str) -> AppResult<()> {
        if !method.is_mutating() {
            return Ok(());
        }

        let path = normalize_path(path);
        match self.rules.iter().find(|rule| rule.pattern.is_match(path)) {
            Some(rule) => Err(AppError::ForbiddenAction(format!(
                "{} {} is not allowed during support access ({})",
                method.as_str(),
                path,
                rule.category
            ))),
            None => Ok(()),
        }
    }
}

/// Rejects paths that a URL parser would rewrite before they reach the
/// upstream: dot segments (plain or percent-encoded), backslashes, query or
/// fragment delimiters and empty segments other than a trailing slash.
///
/// Scope and deny-list checks only hold for the path that is forwarded, so
/// every impersonated path must pass this first.
pub fn ensure_canonical_path(path: &str) -> AppResult<()> {
    let rejected = |reason: &str| {
        Err(AppError::ForbiddenAction(format!(
            "path '{path}' is not allowed during support access ({reason})"
        )))
    };

    let Some(rest) = path.strip_prefix('/') else {
        return rejected("must start with '/'");
    };
    if path.contains(['\\', '?', '#']) {
        return rejected("reserved characters");
    }

    let segments: Vec<&str> = rest.split('/').collect();
    let last = segments.len().saturating_sub(1);
    for (index, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            if index == last {
                continue;
            }
            return rejected("empty segment");
        }

        if is_dot_segment(segment) {
            return rejected("dot segment");
        }
    }

    Ok(())
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

fn normalize_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[cfg(test)]
mod tests {
    use warden_core::AppError;

    use super::{ForbiddenActionGuard, ensure_canonical_path};
    use crate::RequestMethod;

    fn guard() -> ForbiddenActionGuard {
        ForbiddenActionGuard::new().unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn mutating_user_management_is_blocked() {
        let guard = guard();
        assert!(matches!(
            guard.check(RequestMethod::Post, "/api/users"),
            Err(AppError::ForbiddenAction(_))
        ));
        assert!(guard.check(RequestMethod::Delete, "/api/users/42/").is_err());
        assert!(guard.check(RequestMethod::Patch, "/api/billing/plan").is_err());
        assert!(guard.check(RequestMethod::Post, "/api/support-access/tokens").is_err());
        assert!(guard.check(RequestMethod::Put, "/api/api-keys/rotate").is_err());
    }

    #[test]
    fn reads_are_never_blocked() {
        let guard = guard();
        assert!(guard.check(RequestMethod::Get, "/api/users").is_ok());
        assert!(guard.check(RequestMethod::Get, "/api/billing").is_ok());
    }

    #[test]
    fn unrelated_or_nested_paths_are_allowed() {
        let guard = guard();
        assert!(guard.check(RequestMethod::Post, "/api/contacts").is_ok());
        assert!(guard.check(RequestMethod::Post, "/api/users/42/avatar").is_ok());
        assert!(guard.check(RequestMethod::Get, "/api/support-access/tokens").is_ok());
    }

    #[test]
    fn query_string_is_ignored() {
        let guard = guard();
        assert!(guard.check(RequestMethod::Post, "/api/users?invite=true").is_err());
    }

    #[test]
    fn dot_and_empty_segments_are_rejected() {
        for path in [
            "/users/x/..",
            "/agents/../leads/5",
            "/agents/./leads",
            "/agents/%2e%2E/leads",
            "/agents/.%2e",
            "/agents//leads",
            "/agents\\..\\leads",
            "/agents?/../leads",
            "agents",
        ] {
            assert!(
                matches!(
                    ensure_canonical_path(path),
                    Err(AppError::ForbiddenAction(_))
                ),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn ordinary_paths_are_canonical() {
        for path in ["/", "/campaigns", "/campaigns/c-1/", "/files/report.v2..csv", "/a/...b"] {
            assert!(ensure_canonical_path(path).is_ok(), "{path} should pass");
        }
    }
}
