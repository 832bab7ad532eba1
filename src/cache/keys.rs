// Cache key construction.
// Builds deterministic store keys for each resource kind from an injected prefix set.

use serde::{Deserialize, Serialize};

/// Kind of resource held in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    User,
    Followers,
    Following,
}

impl ResourceKind {
    /// Whether keys of this kind carry a page number.
    pub fn is_paginated(&self) -> bool {
        !matches!(self, ResourceKind::User)
    }
}

/// Key namespace prefixes for every resource kind and for expiry records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPrefixes {
    pub user: String,
    pub followers: String,
    pub following: String,
    pub expiry: String,
}

impl Default for KeyPrefixes {
    fn default() -> Self {
        Self {
            user: "user_".to_string(),
            followers: "followers_".to_string(),
            following: "following_".to_string(),
            expiry: "expiry_".to_string(),
        }
    }
}

impl KeyPrefixes {
    pub fn for_kind(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::User => &self.user,
            ResourceKind::Followers => &self.followers,
            ResourceKind::Following => &self.following,
        }
    }

    /// Key of the expiry record paired with `key`.
    pub fn expiry_key(&self, key: &str) -> String {
        format!("{}{}", self.expiry, key)
    }

    /// Key for a resource. Logins are case-insensitive, so the identity is lower-cased.
    pub fn key(&self, kind: ResourceKind, login: &str, page: Option<u32>) -> String {
        let base = format!("{}{}", self.for_kind(kind), login.to_lowercase());
        match page {
            Some(page) if kind.is_paginated() => format!("{}_{}", base, page),
            _ => base,
        }
    }

    /// Prefix shared by every page of a paginated resource for `login`.
    pub fn page_family(&self, kind: ResourceKind, login: &str) -> String {
        format!("{}{}_", self.for_kind(kind), login.to_lowercase())
    }

    fn named(&self) -> [(&'static str, &str); 4] {
        [
            ("user", self.user.as_str()),
            ("followers", self.followers.as_str()),
            ("following", self.following.as_str()),
            ("expiry", self.expiry.as_str()),
        ]
    }

    /// Namespaces must be non-empty and disjoint: no prefix may start with another.
    pub fn check_disjoint(&self) -> Result<(), String> {
        let named = self.named();
        for (name, prefix) in named {
            if prefix.is_empty() {
                return Err(format!("{} prefix must not be empty", name));
            }
        }
        for (i, (name, prefix)) in named.iter().enumerate() {
            for (other_name, other) in named.iter().skip(i + 1) {
                if prefix.starts_with(*other) || other.starts_with(*prefix) {
                    return Err(format!(
                        "{} prefix {:?} overlaps {} prefix {:?}",
                        name, prefix, other_name, other
                    ));
                }
            }
        }
        Ok(())
    }

    /// Whether `key` lives in any cache namespace (value or expiry record).
    pub fn owns(&self, key: &str) -> bool {
        self.named().iter().any(|(_, prefix)| key.starts_with(*prefix))
    }

    /// Whether `key` belongs to `login`'s cache scope, including paired expiry records.
    pub fn belongs_to(&self, key: &str, login: &str) -> bool {
        let user_key = self.key(ResourceKind::User, login, None);
        let families = [
            self.page_family(ResourceKind::Followers, login),
            self.page_family(ResourceKind::Following, login),
        ];

        let bare = key.strip_prefix(self.expiry.as_str()).unwrap_or(key);
        bare == user_key || families.iter().any(|family| bare.starts_with(family))
    }
}
