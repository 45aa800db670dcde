//! The single gated resource: the flipbook document URL.

use flipgate_types::FlipbookUrlResponse;

use crate::auth::types::AuthUser;

/// Releases the configured URL to verified callers.
///
/// Any holder of a valid session token is authorized; the allowlist was
/// already enforced when the token was issued.
#[derive(Debug, Clone)]
pub struct FlipbookResolver {
    url: String,
}

impl FlipbookResolver {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn resolve(&self, user: &AuthUser) -> FlipbookUrlResponse {
        tracing::info!("Flipbook access requested by: {}", user.email);
        FlipbookUrlResponse {
            success: true,
            url: self.url.clone(),
            user: user.session_user(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::LoginMethod;

    #[test]
    fn test_resolve_echoes_caller() {
        let resolver = FlipbookResolver::new("https://books.example.com/1");
        let user = AuthUser {
            email: "demo@gmail.com".to_string(),
            name: Some("Demo User".to_string()),
            login_method: LoginMethod::Google,
        };

        let resp = resolver.resolve(&user);
        assert!(resp.success);
        assert_eq!(resp.url, "https://books.example.com/1");
        assert_eq!(resp.user.email, "demo@gmail.com");
        assert_eq!(resp.user.name.as_deref(), Some("Demo User"));
    }
}
