//! Operator session (`user-storage`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::User;

pub const STORE_NAME: &str = "user-storage";

/// Role that bypasses every permission check
pub const SUPER_ADMIN: &str = "super_admin";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub logged_in_at: Option<DateTime<Utc>>,
}

/// Strip a leading `Bearer ` so the prefix is never stored or sent twice
pub fn clean_token(token: &str) -> &str {
    let token = token.trim();
    token.strip_prefix("Bearer ").unwrap_or(token).trim()
}

impl SessionState {
    /// Record the operator. Role and permissions come from the user record,
    /// role defaulting to `user`.
    pub fn set_user(&mut self, user: User) {
        self.role = Some(user.role.clone().unwrap_or_else(|| "user".to_string()));
        self.permissions = user.permissions.clone();
        self.user = Some(user);
    }

    pub fn set_token(&mut self, token: &str) {
        let token = clean_token(token);
        if token.is_empty() {
            return;
        }
        if self.token.is_none() {
            self.logged_in_at = Some(Utc::now());
        }
        self.token = Some(token.to_string());
    }

    pub fn clear(&mut self) {
        *self = SessionState::default();
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref().is_some_and(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(SUPER_ADMIN)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_super_admin() || self.permissions.iter().any(|p| p == permission)
    }

    pub fn update_factory_id(&mut self, factory_id: &str) {
        if let Some(user) = self.user.as_mut() {
            user.factory_id = Some(factory_id.to_string());
        }
    }

    pub fn factory_id(&self) -> Option<&str> {
        self.user.as_ref()?.factory_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Option<&str>) -> User {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "username": "zhang",
            "role": role,
            "permissions": ["personnel"],
        }))
        .unwrap()
    }

    #[test]
    fn test_token_prefix_stripped() {
        let mut session = SessionState::default();
        session.set_token("Bearer abc.def");
        assert_eq!(session.token.as_deref(), Some("abc.def"));
        assert!(session.is_authenticated());
        assert!(session.logged_in_at.is_some());

        session.set_token("   ");
        assert_eq!(session.token.as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_roles_and_permissions() {
        let mut session = SessionState::default();
        session.set_user(user(None));
        assert!(session.has_role("user"));
        assert!(session.has_permission("personnel"));
        assert!(!session.has_permission("salary"));

        session.set_user(user(Some("SUPER_ADMIN")));
        assert!(session.is_super_admin());
        assert!(session.has_permission("salary"));
    }

    #[test]
    fn test_clear_and_factory() {
        let mut session = SessionState::default();
        session.set_user(user(Some("admin")));
        session.set_token("t");
        session.update_factory_id("f-2");
        assert_eq!(session.factory_id(), Some("f-2"));

        session.clear();
        assert!(!session.is_authenticated());
        assert!(session.user.is_none());
        assert!(session.permissions.is_empty());
    }
}
