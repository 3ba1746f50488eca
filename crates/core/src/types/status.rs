//! Status and role enums.

use serde::{Deserialize, Serialize};

/// Order lifecycle status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Only orders that have not been confirmed yet may be cancelled by the customer.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Wire name, e.g. `PENDING`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// A role granted to an account.
///
/// The backend spells roles both as Spring-style authorities (`ROLE_ADMIN`)
/// and as bare names (`ADMIN`); both parse to the same variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Store administrator.
    Admin,
    /// Regular customer account.
    Customer,
    /// Any role this client does not interpret.
    Other(String),
}

impl Role {
    /// Authority string, e.g. `ROLE_ADMIN`.
    #[must_use]
    pub fn authority(&self) -> String {
        match self {
            Self::Admin => "ROLE_ADMIN".to_string(),
            Self::Customer => "ROLE_USER".to_string(),
            Self::Other(name) => name.clone(),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        let name = value.trim();
        let bare = name.strip_prefix("ROLE_").unwrap_or(name);
        match bare.to_ascii_uppercase().as_str() {
            "ADMIN" => Self::Admin,
            "USER" | "CUSTOMER" => Self::Customer,
            _ => Self::Other(name.to_string()),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => "ADMIN".to_string(),
            Role::Customer => "USER".to_string(),
            Role::Other(name) => name,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from(self.clone()))
    }
}

/// A granted authority as returned by the login endpoint: `{"authority": "ROLE_ADMIN"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub authority: String,
}

impl Authority {
    /// Interpret this authority as a [`Role`].
    #[must_use]
    pub fn role(&self) -> Role {
        Role::from(self.authority.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parses_both_spellings() {
        assert_eq!(Role::from("ROLE_ADMIN"), Role::Admin);
        assert_eq!(Role::from("ADMIN"), Role::Admin);
        assert_eq!(Role::from("ROLE_USER"), Role::Customer);
        assert_eq!(
            Role::from("ROLE_AUDITOR"),
            Role::Other("ROLE_AUDITOR".to_string())
        );
    }

    #[test]
    fn test_role_serde_uses_bare_names() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::Customer);
    }

    #[test]
    fn test_authority_role() {
        let auth: Authority = serde_json::from_str(r#"{"authority":"ROLE_ADMIN"}"#).unwrap();
        assert_eq!(auth.role(), Role::Admin);
    }

    #[test]
    fn test_order_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"SHIPPED\"");
        assert_eq!("cancelled".parse::<OrderStatus>(), Ok(OrderStatus::Cancelled));
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_only_pending_is_cancellable() {
        let cancellable: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.is_cancellable())
            .collect();
        assert_eq!(cancellable, vec![OrderStatus::Pending]);
    }
}
