//! Fixture and identity generation
//!
//! Produces request payload values that are valid but disposable: user
//! emails and passwords for registration, and client-supplied post ids.
//! A [`RunFixture`] is built once per run and then only read.

use rand::distr::{Alphanumeric, SampleString};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::common::{Error, Result};

/// Largest id handed out by [`FixtureProvider::next_id`]
///
/// Ids stay within the range a JSON number can carry without losing
/// precision in a JavaScript-backed service.
pub const MAX_CLIENT_ID: i64 = 9_007_199_254_740_991;

const EMAIL_LOCAL_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const EMAIL_LOCAL_LEN: usize = 16;

/// Rules a generated password must satisfy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordConstraints {
    /// Total number of characters, prefix included
    pub length: usize,
    /// At least one ASCII uppercase letter in the generated part
    pub require_uppercase: bool,
    /// Fixed string the password starts with
    pub literal_prefix: String,
}

impl Default for PasswordConstraints {
    fn default() -> Self {
        Self {
            length: 20,
            require_uppercase: true,
            literal_prefix: "Hello ".to_string(),
        }
    }
}

/// Credentials for a user registered during the run
#[derive(Debug, Clone, Serialize)]
pub struct UserCredentials {
    pub email: String,
    pub password: String,
}

/// Source of synthetic entity data
pub struct FixtureProvider {
    rng: StdRng,
    email_domain: String,
}

impl FixtureProvider {
    /// Provider seeded from the operating system
    pub fn new(email_domain: impl Into<String>) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            email_domain: email_domain.into(),
        }
    }

    /// Deterministic provider for tests
    pub fn seeded(seed: u64, email_domain: impl Into<String>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            email_domain: email_domain.into(),
        }
    }

    /// A syntactically valid email with a random local part
    pub fn next_email(&mut self) -> String {
        let local: String = (0..EMAIL_LOCAL_LEN)
            .map(|_| {
                let idx = self.rng.random_range(0..EMAIL_LOCAL_CHARS.len());
                EMAIL_LOCAL_CHARS[idx] as char
            })
            .collect();
        format!("qa.{}@{}", local, self.email_domain)
    }

    /// A password satisfying `constraints`
    ///
    /// Fails when the prefix does not fit in the requested length, or when
    /// an uppercase letter is required but the prefix fills the password
    /// without providing one.
    pub fn next_password(&mut self, constraints: &PasswordConstraints) -> Result<String> {
        let prefix_len = constraints.literal_prefix.chars().count();
        if prefix_len > constraints.length {
            return Err(Error::Fixture(format!(
                "prefix '{}' is longer than the password length {}",
                constraints.literal_prefix, constraints.length
            )));
        }

        let remaining = constraints.length - prefix_len;
        if constraints.require_uppercase
            && remaining == 0
            && !constraints
                .literal_prefix
                .chars()
                .any(|c| c.is_ascii_uppercase())
        {
            return Err(Error::Fixture(format!(
                "no room for an uppercase letter after prefix '{}' in {} characters",
                constraints.literal_prefix, constraints.length
            )));
        }

        let mut generated: Vec<char> = Alphanumeric
            .sample_string(&mut self.rng, remaining)
            .chars()
            .collect();

        if constraints.require_uppercase
            && remaining > 0
            && !generated.iter().any(|c| c.is_ascii_uppercase())
        {
            let pos = self.rng.random_range(0..remaining);
            generated[pos] = self.rng.random_range(b'A'..=b'Z') as char;
        }

        let mut password = constraints.literal_prefix.clone();
        password.extend(generated);
        Ok(password)
    }

    /// An id for scenarios that supply their own entity id
    pub fn next_id(&mut self) -> i64 {
        self.rng.random_range(1..=MAX_CLIENT_ID)
    }
}

/// Values generated once at suite start and shared read-only by every
/// scenario in the run
#[derive(Debug, Clone, Serialize)]
pub struct RunFixture {
    pub user: UserCredentials,
    pub post_id: i64,
}

impl RunFixture {
    /// Draw a fresh set of run values from `provider`
    pub fn generate(provider: &mut FixtureProvider, constraints: &PasswordConstraints) -> Result<Self> {
        let email = provider.next_email();
        let password = provider.next_password(constraints)?;
        let post_id = provider.next_id();
        tracing::debug!(%email, post_id, "generated run fixture");
        Ok(Self {
            user: UserCredentials { email, password },
            post_id,
        })
    }

    /// Template variables exposed to scenario steps
    pub fn variables(&self) -> Vec<(&'static str, serde_json::Value)> {
        vec![
            ("user.email", self.user.email.clone().into()),
            ("user.password", self.user.password.clone().into()),
            ("post.id", self.post_id.into()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn provider() -> FixtureProvider {
        FixtureProvider::seeded(7, "example.com")
    }

    #[test]
    fn test_email_shape() {
        let email = provider().next_email();
        let (local, domain) = email.split_once('@').unwrap();
        assert_eq!(domain, "example.com");
        assert!(local.starts_with("qa."));
        assert_eq!(local.len(), 3 + EMAIL_LOCAL_LEN);
        assert!(local[3..].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_emails_do_not_repeat() {
        let mut p = FixtureProvider::new("example.com");
        let emails: HashSet<String> = (0..500).map(|_| p.next_email()).collect();
        assert_eq!(emails.len(), 500);
    }

    #[test]
    fn test_default_password_constraints() {
        let constraints = PasswordConstraints::default();
        let mut p = provider();
        for _ in 0..200 {
            let password = p.next_password(&constraints).unwrap();
            assert_eq!(password.chars().count(), 20);
            assert!(password.starts_with("Hello "));
            assert!(password["Hello ".len()..].chars().any(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_password_without_uppercase_requirement() {
        let constraints = PasswordConstraints {
            length: 8,
            require_uppercase: false,
            literal_prefix: String::new(),
        };
        let password = provider().next_password(&constraints).unwrap();
        assert_eq!(password.len(), 8);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_prefix_longer_than_length_fails() {
        let constraints = PasswordConstraints {
            length: 3,
            require_uppercase: false,
            literal_prefix: "Hello ".to_string(),
        };
        assert!(matches!(
            provider().next_password(&constraints),
            Err(Error::Fixture(_))
        ));
    }

    #[test]
    fn test_prefix_filling_length_needs_its_own_uppercase() {
        let lower = PasswordConstraints {
            length: 5,
            require_uppercase: true,
            literal_prefix: "hello".to_string(),
        };
        assert!(provider().next_password(&lower).is_err());

        let upper = PasswordConstraints {
            length: 5,
            require_uppercase: true,
            literal_prefix: "Hello".to_string(),
        };
        assert_eq!(provider().next_password(&upper).unwrap(), "Hello");
    }

    #[test]
    fn test_ids_in_range() {
        let mut p = provider();
        for _ in 0..1000 {
            let id = p.next_id();
            assert!((1..=MAX_CLIENT_ID).contains(&id));
        }
    }

    #[test]
    fn test_seeded_providers_agree() {
        let a = FixtureProvider::seeded(42, "example.com").next_email();
        let b = FixtureProvider::seeded(42, "example.com").next_email();
        assert_eq!(a, b);
    }

    #[test]
    fn test_run_fixture_variables() {
        let fixture =
            RunFixture::generate(&mut provider(), &PasswordConstraints::default()).unwrap();
        let vars = fixture.variables();
        let names: Vec<&str> = vars.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["user.email", "user.password", "post.id"]);
        assert_eq!(vars[2].1, serde_json::json!(fixture.post_id));
    }
}
