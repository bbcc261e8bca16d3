//! Authentication handlers applied to outgoing requests.

use anyhow::Result;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Request;
use reqwest::header::{AUTHORIZATION, HeaderValue};

/// Mutates an outgoing request to carry credentials.
pub trait Auth: Send + Sync {
    fn apply(&self, request: &mut Request) -> Result<()>;
}

impl<F> Auth for F
where
    F: Fn(&mut Request) -> Result<()> + Send + Sync,
{
    fn apply(&self, request: &mut Request) -> Result<()> {
        self(request)
    }
}

/// `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &mask_secret(&self.token))
            .finish()
    }
}

impl Auth for BearerAuth {
    fn apply(&self, request: &mut Request) -> Result<()> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// HTTP basic auth: `Authorization: Basic base64(user:password)`.
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

impl Auth for BasicAuth {
    fn apply(&self, request: &mut Request) -> Result<()> {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.password));
        let mut value = HeaderValue::from_str(&format!("Basic {}", encoded))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// Keeps the first and last four characters of a secret for log output.
pub(crate) fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{Method, Url};

    fn request() -> Request {
        Request::new(Method::GET, Url::parse("https://example.com/").unwrap())
    }

    #[test]
    fn test_bearer_auth_sets_sensitive_header() {
        let mut req = request();
        BearerAuth::new("abc123").apply(&mut req).unwrap();

        let value = req.headers().get(AUTHORIZATION).unwrap();
        assert_eq!(value, "Bearer abc123");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_bearer_auth_replaces_existing_header() {
        let mut req = request();
        req.headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_static("Token old"));
        BearerAuth::new("new").apply(&mut req).unwrap();

        assert_eq!(req.headers().get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(req.headers()[AUTHORIZATION], "Bearer new");
    }

    #[test]
    fn test_bearer_auth_rejects_invalid_token() {
        let mut req = request();
        assert!(BearerAuth::new("bad\ntoken").apply(&mut req).is_err());
    }

    #[test]
    fn test_basic_auth_encodes_credentials() {
        let mut req = request();
        BasicAuth::new("Aladdin", "open sesame")
            .apply(&mut req)
            .unwrap();

        assert_eq!(
            req.headers()[AUTHORIZATION],
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn test_closure_auth() {
        let auth = |req: &mut Request| -> Result<()> {
            req.headers_mut()
                .insert("x-api-key", HeaderValue::from_static("k"));
            Ok(())
        };
        let mut req = request();
        auth.apply(&mut req).unwrap();
        assert_eq!(req.headers()["x-api-key"], "k");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let bearer = format!("{:?}", BearerAuth::new("ghp_1234567890abcdef"));
        assert!(!bearer.contains("1234567890"));
        assert!(bearer.contains("ghp_"));

        let basic = format!("{:?}", BasicAuth::new("user", "hunter2"));
        assert!(!basic.contains("hunter2"));
    }

    #[test]
    fn test_mask_secret_short() {
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret(""), "");
    }
}
