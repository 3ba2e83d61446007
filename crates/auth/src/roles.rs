use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier carried in access tokens.
///
/// Roles stay opaque strings at this layer; the API maps them to permissions.
/// Two roles are known to the service: [`Role::USER`] and [`Role::ADMIN`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Regular end user (uploads, analyses, own appointments).
    pub const USER: Role = Role(Cow::Borrowed("user"));

    /// Staff: catalog management, appointment handling, user listing.
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.as_str() == Self::ADMIN.as_str()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
