//! Environment variable policy for the bash tool's spawned child processes.
//!
//! The bash tool runs with a default-deny policy for sensitive environment
//! variables: anything that looks like a credential is stripped from the
//! child environment unless it is on the explicit allow list. This is
//! distinct from (and composes with) hook/plugin spawn hardening — the
//! concern here is "don't leak secrets to shell commands the model asked
//! for", not "don't let untrusted config inject code".

/// Name fragments that mark an environment variable as sensitive. Matching
/// is case-insensitive substring containment against the full variable
/// name.
const DENY_PATTERNS: &[&str] = &[
    "_API_KEY",
    "_APIKEY",
    "_SECRET",
    "_TOKEN",
    "_PASSWORD",
    "_CREDENTIAL",
    "AWS_",
    "AZURE_",
    "GOOGLE_APPLICATION_CREDENTIALS",
    "PRIVATE_KEY",
];

/// Variables that are always safe to pass through even if they would
/// otherwise match a deny pattern (none currently do, but this is the
/// escape hatch the deny list is checked against first).
const ALLOW_LIST: &[&str] = &[
    "PATH", "HOME", "LANG", "LC_ALL", "TERM", "USER", "SHELL", "PWD", "TZ",
];

/// Returns `true` if `key` should be passed through to a spawned bash
/// command's environment.
#[must_use]
pub fn is_allowed_bash_env(key: &str) -> bool {
    if ALLOW_LIST.iter().any(|k| k.eq_ignore_ascii_case(key)) {
        return true;
    }
    let upper = key.to_ascii_uppercase();
    !DENY_PATTERNS.iter().any(|p| upper.contains(p))
}

/// Filter an environment variable map down to the entries allowed through
/// to a spawned bash command.
pub fn filter_bash_env<'a, I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    vars.into_iter()
        .filter(|(k, _)| is_allowed_bash_env(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denies_credential_like_vars() {
        assert!(!is_allowed_bash_env("OPENAI_API_KEY"));
        assert!(!is_allowed_bash_env("STRIPE_SECRET"));
        assert!(!is_allowed_bash_env("GITHUB_TOKEN"));
        assert!(!is_allowed_bash_env("DB_PASSWORD"));
        assert!(!is_allowed_bash_env("AWS_ACCESS_KEY_ID"));
        assert!(!is_allowed_bash_env("GOOGLE_APPLICATION_CREDENTIALS"));
    }

    #[test]
    fn allows_basics() {
        assert!(is_allowed_bash_env("PATH"));
        assert!(is_allowed_bash_env("HOME"));
        assert!(is_allowed_bash_env("LANG"));
        assert!(is_allowed_bash_env("lang"));
    }

    #[test]
    fn allows_unrelated_vars() {
        assert!(is_allowed_bash_env("EDITOR"));
        assert!(is_allowed_bash_env("MY_PROJECT_NAME"));
    }

    #[test]
    fn filters_a_map() {
        let a = "AWS_SECRET_ACCESS_KEY".to_string();
        let b = "v".to_string();
        let c = "PATH".to_string();
        let d = "/usr/bin".to_string();
        let vars = vec![(&a, &b), (&c, &d)];
        let filtered = filter_bash_env(vars);
        assert_eq!(filtered, vec![("PATH".to_string(), "/usr/bin".to_string())]);
    }
}
