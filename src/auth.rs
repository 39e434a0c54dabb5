use spdlog::warn;

use crate::config::AdminUser;
use crate::storage::Committer;

/// The admins allowed to write posts, identified by their bearer token.
pub struct AdminAuth {
    users: Vec<AdminUser>,
}

/// Token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl AdminAuth {
    pub fn new(users: Vec<AdminUser>) -> Self {
        let users = users.into_iter()
            .filter(|user| {
                if user.token.is_empty() {
                    warn!("Ignoring admin user {:?} with an empty token", user.name);
                }
                !user.token.is_empty()
            })
            .collect();
        AdminAuth { users }
    }

    /// Committer identity of the admin owning the token carried by the header, if any.
    pub fn authorize(&self, authorization: Option<&str>) -> Option<Committer> {
        let token = authorization.and_then(extract_bearer_token)?;
        self.users.iter()
            .find(|user| user.token == token)
            .map(|user| Committer::new(user.name.as_deref(), user.email.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin_auth() -> AdminAuth {
        AdminAuth::new(vec![
            AdminUser { token: "t0ken".to_string(), name: Some("dogma".to_string()), email: None },
            AdminUser { token: "".to_string(), name: Some("nobody".to_string()), email: None },
        ])
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_authorize() {
        let auth = admin_auth();

        let committer = auth.authorize(Some("Bearer t0ken")).unwrap();
        assert_eq!(committer.name, "dogma");
        assert_eq!(committer.email, "anonymous@example.com");

        assert!(auth.authorize(Some("Bearer wrong")).is_none());
        assert!(auth.authorize(Some("t0ken")).is_none());
        assert!(auth.authorize(Some("Bearer ")).is_none());
        assert!(auth.authorize(None).is_none());
    }
}
