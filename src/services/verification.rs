//! Verification code service
//!
//! Issues the 5-digit codes used to confirm email ownership. A code is
//! generated, delivered through the [`Mailer`], and only then cached
//! under a per-address key with a short TTL. A delivery failure leaves
//! nothing behind, so a code the user never received can never verify.

use anyhow::{Context, Result};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, CacheLayer};
use crate::services::email::Mailer;

/// How long an issued code stays valid
const DEFAULT_CODE_TTL: Duration = Duration::from_secs(120);

/// Verification code service
pub struct VerificationService {
    cache: Arc<Cache>,
    mailer: Arc<dyn Mailer>,
    ttl: Duration,
}

impl VerificationService {
    /// Create a verification service with the default two-minute code TTL
    pub fn new(cache: Arc<Cache>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            cache,
            mailer,
            ttl: DEFAULT_CODE_TTL,
        }
    }

    /// Create a verification service with a custom code TTL
    pub fn with_ttl(cache: Arc<Cache>, mailer: Arc<dyn Mailer>, ttl: Duration) -> Self {
        Self { cache, mailer, ttl }
    }

    /// How long issued codes stay valid
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a fresh code, email it, and cache it for later verification
    ///
    /// The email goes out before the code is cached. If delivery fails the
    /// code is discarded and the previous code, if any, stays valid.
    pub async fn send_code(&self, email: &str) -> Result<()> {
        let code = generate_code();

        self.mailer
            .send_verification_code(email, code)
            .await
            .context("Failed to send verification email")?;

        self.cache
            .set(&code_key(email), &code, self.ttl)
            .await
            .context("Failed to store verification code")?;

        Ok(())
    }

    /// Check a submitted code against the cached one
    ///
    /// Returns false when no code is cached for the address, which covers
    /// both never-requested and expired codes. A successful check leaves
    /// the code in place until its TTL runs out.
    pub async fn verify_code(&self, email: &str, code: u32) -> Result<bool> {
        let cached: Option<u32> = self
            .cache
            .get(&code_key(email))
            .await
            .context("Failed to read verification code")?;

        Ok(cached == Some(code))
    }
}

/// Cache key holding the pending code for an address
fn code_key(email: &str) -> String {
    format!("verification_code:{}", email)
}

/// Generate a random 5-digit code (10000 to 99999)
fn generate_code() -> u32 {
    rand::thread_rng().gen_range(10_000..=99_999)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Mailer that records every delivery instead of sending
    struct RecordingMailer {
        sent: Mutex<Vec<(String, u32)>>,
    }

    impl RecordingMailer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
            })
        }

        fn last_code(&self) -> Option<u32> {
            self.sent.lock().unwrap().last().map(|(_, code)| *code)
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_verification_code(&self, to: &str, code: u32) -> Result<()> {
            self.sent.lock().unwrap().push((to.to_string(), code));
            Ok(())
        }
    }

    /// Mailer that fails every delivery
    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_verification_code(&self, _to: &str, _code: u32) -> Result<()> {
            Err(anyhow::anyhow!("smtp connection refused"))
        }
    }

    fn test_cache() -> Arc<Cache> {
        Arc::new(Cache::Memory(MemoryCache::new()))
    }

    #[tokio::test]
    async fn test_send_code_emails_and_caches() {
        let cache = test_cache();
        let mailer = RecordingMailer::new();
        let service = VerificationService::new(cache, mailer.clone());

        service
            .send_code("alice@example.com")
            .await
            .expect("Failed to send code");

        assert_eq!(mailer.sent_count(), 1);
        let code = mailer.last_code().unwrap();
        assert!((10_000..=99_999).contains(&code));
        assert!(service
            .verify_code("alice@example.com", code)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_verify_wrong_code_fails() {
        let cache = test_cache();
        let mailer = RecordingMailer::new();
        let service = VerificationService::new(cache, mailer.clone());

        service
            .send_code("alice@example.com")
            .await
            .expect("Failed to send code");
        let code = mailer.last_code().unwrap();
        let wrong = if code == 99_999 { code - 1 } else { code + 1 };

        assert!(!service.verify_code("alice@example.com", wrong).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_unknown_email_fails() {
        let service = VerificationService::new(test_cache(), RecordingMailer::new());

        assert!(!service
            .verify_code("nobody@example.com", 12345)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delivery_failure_leaves_no_code() {
        let cache = test_cache();
        let service = VerificationService::new(cache.clone(), Arc::new(FailingMailer));

        let result = service.send_code("bob@example.com").await;

        assert!(result.is_err());
        let cached: Option<u32> = cache.get("verification_code:bob@example.com").await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_code_survives_successful_verification() {
        let cache = test_cache();
        let mailer = RecordingMailer::new();
        let service = VerificationService::new(cache, mailer.clone());

        service
            .send_code("alice@example.com")
            .await
            .expect("Failed to send code");
        let code = mailer.last_code().unwrap();

        assert!(service.verify_code("alice@example.com", code).await.unwrap());
        // Still valid until its TTL runs out
        assert!(service.verify_code("alice@example.com", code).await.unwrap());
    }

    #[tokio::test]
    async fn test_code_expires_after_ttl() {
        let cache = test_cache();
        let mailer = RecordingMailer::new();
        let service =
            VerificationService::with_ttl(cache, mailer.clone(), Duration::from_millis(40));

        service
            .send_code("alice@example.com")
            .await
            .expect("Failed to send code");
        let code = mailer.last_code().unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(!service.verify_code("alice@example.com", code).await.unwrap());
    }

    #[tokio::test]
    async fn test_resend_replaces_previous_code() {
        let cache = test_cache();
        let mailer = RecordingMailer::new();
        let service = VerificationService::new(cache, mailer.clone());

        service
            .send_code("alice@example.com")
            .await
            .expect("Failed to send code");
        let first = mailer.last_code().unwrap();

        service
            .send_code("alice@example.com")
            .await
            .expect("Failed to send code");
        let second = mailer.last_code().unwrap();

        assert!(service.verify_code("alice@example.com", second).await.unwrap());
        if first != second {
            assert!(!service.verify_code("alice@example.com", first).await.unwrap());
        }
    }

    #[test]
    fn test_generated_codes_are_five_digits() {
        for _ in 0..1_000 {
            let code = generate_code();
            assert!((10_000..=99_999).contains(&code), "out of range: {}", code);
        }
    }
}
