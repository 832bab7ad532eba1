// GitHub account and repository name checks.
// Identities end up in both request paths and cache keys, so anything GitHub would not accept is refused.

use crate::error::{GhError, Result};

const MAX_LOGIN_LEN: usize = 39;
const MAX_REPO_NAME_LEN: usize = 100;

/// Accept a login of ASCII letters, digits and hyphens that does not start with a hyphen.
pub fn validate_login(login: &str) -> Result<&str> {
    let valid = !login.is_empty()
        && login.len() <= MAX_LOGIN_LEN
        && !login.starts_with('-')
        && login.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

    if valid {
        Ok(login)
    } else {
        Err(GhError::InvalidIdentity(login.to_string()))
    }
}

/// Accept a repository name of ASCII letters, digits, `.`, `-` and `_`, except `.` and `..`.
pub fn validate_repo_name(name: &str) -> Result<&str> {
    let valid = !name.is_empty()
        && name.len() <= MAX_REPO_NAME_LEN
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));

    if valid {
        Ok(name)
    } else {
        Err(GhError::InvalidIdentity(name.to_string()))
    }
}
