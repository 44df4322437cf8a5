//! External identity providers used at sign-in.
//!
//! Users are not linked to a provider by foreign key, so deleting a provider
//! leaves existing accounts and sessions untouched.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityProviderType {
    #[serde(rename = "OAUTH2")]
    OAuth2,
    #[serde(rename = "OIDC")]
    Oidc,
}

impl IdentityProviderType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OAuth2 => "OAUTH2",
            Self::Oidc => "OIDC",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OAUTH2" => Some(Self::OAuth2),
            "OIDC" => Some(Self::Oidc),
            _ => None,
        }
    }
}

/// Claims read from the provider's user info response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub identifier: String,
    pub display_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub user_info_url: String,
    pub scopes: Vec<String>,
    /// Discovery issuer; only meaningful for OIDC providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    pub field_mapping: FieldMapping,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProvider {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: IdentityProviderType,
    /// Regex applied to the mapped identifier; empty accepts all.
    pub identifier_filter: String,
    pub config: IdentityProviderConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindIdentityProvider {
    pub id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateIdentityProvider {
    pub id: i32,
    pub name: Option<String>,
    pub identifier_filter: Option<String>,
    pub config: Option<IdentityProviderConfig>,
}

impl UpdateIdentityProvider {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.identifier_filter.is_none() && self.config.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteIdentityProvider {
    pub id: i32,
}
