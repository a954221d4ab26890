use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use subtle::ConstantTimeEq;

use crate::config::SponsorCodeConfig;
use crate::models::{LoginCode, Provider};
use crate::services::error::{CodeRejection, ServiceError};
use crate::services::mail::MailSender;
use crate::services::resolver::{IdentityResolver, Resolution};
use crate::services::store::IdentityStore;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Passwordless sponsor login: a short-lived one-time code is mailed to a
/// directory-listed sponsor, then traded for a session.
pub struct SponsorService {
    store: Arc<dyn IdentityStore>,
    mailer: Arc<dyn MailSender>,
    resolver: IdentityResolver,
    config: SponsorCodeConfig,
}

impl SponsorService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        mailer: Arc<dyn MailSender>,
        resolver: IdentityResolver,
        config: SponsorCodeConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            resolver,
            config,
        }
    }

    /// Issues and mails a fresh code for `email`.
    ///
    /// This never reports failure to the caller: an unknown email, a store
    /// hiccup and a mail outage all look identical from the outside, so the
    /// endpoint cannot be used to probe the sponsor directory.
    #[tracing::instrument(skip_all)]
    pub async fn request_code(&self, email: &str) {
        if let Err(e) = self.try_request_code(email).await {
            tracing::warn!(error = %e, "Sponsor code request failed; responding success anyway");
        }
    }

    async fn try_request_code(&self, email: &str) -> Result<(), ServiceError> {
        let Some(sponsor) = self.store.get_sponsor(email).await? else {
            tracing::info!("Sponsor code requested for an email not in the directory");
            return Ok(());
        };

        let code = generate_code(self.config.code_length);
        let record = LoginCode::new(
            sponsor.email.clone(),
            code.clone(),
            self.config.code_ttl_seconds,
        );
        // Replaces any previous code; at most one is live per sponsor.
        self.store.upsert_login_code(&record).await?;

        let mut substitutions = HashMap::new();
        substitutions.insert("code".to_string(), code);
        substitutions.insert(
            "ttl_minutes".to_string(),
            (self.config.code_ttl_seconds / 60).to_string(),
        );
        self.mailer
            .send(&sponsor.email, &self.config.mail_template, &substitutions)
            .await?;

        tracing::info!("Sponsor login code issued");
        Ok(())
    }

    /// Trades a code for a session.
    ///
    /// Every authentication failure collapses to `BadCode` on the wire; the
    /// attached [`CodeRejection`] records the real cause for logs and tests.
    /// Store failures are not authentication failures and propagate as such.
    #[tracing::instrument(skip_all)]
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<Resolution, ServiceError> {
        let sponsor = self
            .store
            .get_sponsor(email)
            .await?
            .ok_or(ServiceError::BadCode(CodeRejection::UnknownSponsor))?;

        let record = self
            .store
            .get_login_code(email)
            .await?
            .ok_or(ServiceError::BadCode(CodeRejection::NoActiveCode))?;

        if record.is_expired() {
            return Err(ServiceError::BadCode(CodeRejection::Expired));
        }

        if !codes_match(&record.code, code) {
            return Err(ServiceError::BadCode(CodeRejection::Mismatch));
        }

        // Single use: the code is gone before the session exists.
        self.store.delete_login_code(email).await?;

        let resolution = self
            .resolver
            .resolve_from_profile(Provider::Sponsor, &sponsor.user_id, &sponsor.email, false)
            .await;
        Ok(resolution)
    }
}

/// Uniform draw over `A-Z0-9`, fixed length.
fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

fn codes_match(expected: &str, provided: &str) -> bool {
    // Length is fixed by configuration and not secret.
    if expected.len() != provided.len() {
        return false;
    }
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaffConfig;
    use crate::models::{Role, Sponsor};
    use crate::services::mail::{MockMailer, SPONSOR_CODE_TEMPLATE};
    use crate::services::store::MemoryIdentityStore;
    use chrono::Utc;

    struct Fixture {
        service: SponsorService,
        store: Arc<MemoryIdentityStore>,
        mailer: Arc<MockMailer>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryIdentityStore::new());
        let mailer = Arc::new(MockMailer::new());
        let resolver = IdentityResolver::new(
            store.clone(),
            StaffConfig {
                domain: "hackillinois.org".to_string(),
                admins: vec![],
            },
        );
        let service = SponsorService::new(
            store.clone(),
            mailer.clone(),
            resolver,
            SponsorCodeConfig {
                code_length: 6,
                code_ttl_seconds: 600,
                mail_template: SPONSOR_CODE_TEMPLATE.to_string(),
            },
        );
        Fixture {
            service,
            store,
            mailer,
        }
    }

    fn seed_sponsor(store: &MemoryIdentityStore) {
        store.seed_sponsor(Sponsor {
            user_id: "sponsor-7".to_string(),
            email: "recruiter@bigco.com".to_string(),
        });
    }

    #[test]
    fn test_generated_code_shape() {
        let code = generate_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_codes_match_requires_exact_equality() {
        assert!(codes_match("AB12CD", "AB12CD"));
        assert!(!codes_match("AB12CD", "AB12CE"));
        assert!(!codes_match("AB12CD", "AB12C"));
    }

    #[tokio::test]
    async fn test_request_for_unknown_email_stores_and_sends_nothing() {
        let f = fixture();

        f.service.request_code("stranger@evil.com").await;

        assert!(f.store.stored_login_code("stranger@evil.com").is_none());
        assert!(f.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_request_for_known_sponsor_stores_code_and_mails_it() {
        let f = fixture();
        seed_sponsor(&f.store);

        f.service.request_code("recruiter@bigco.com").await;

        let record = f.store.stored_login_code("recruiter@bigco.com").unwrap();
        assert_eq!(record.code.len(), 6);
        assert!(record.expiry_epoch_seconds > Utc::now().timestamp());

        let sent = f.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "recruiter@bigco.com");
        assert_eq!(sent[0].substitutions.get("code").unwrap(), &record.code);
    }

    #[tokio::test]
    async fn test_request_swallows_mail_failure() {
        let f = fixture();
        seed_sponsor(&f.store);
        f.mailer.set_fail(true);

        // Must not panic or surface anything; the endpoint stays a 200.
        f.service.request_code("recruiter@bigco.com").await;
        assert!(f.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_verify_unknown_sponsor_is_tagged() {
        let f = fixture();
        let result = f.service.verify_code("stranger@evil.com", "AB12CD").await;
        assert!(matches!(
            result,
            Err(ServiceError::BadCode(CodeRejection::UnknownSponsor))
        ));
    }

    #[tokio::test]
    async fn test_verify_without_active_code_is_tagged() {
        let f = fixture();
        seed_sponsor(&f.store);
        let result = f.service.verify_code("recruiter@bigco.com", "AB12CD").await;
        assert!(matches!(
            result,
            Err(ServiceError::BadCode(CodeRejection::NoActiveCode))
        ));
    }

    #[tokio::test]
    async fn test_verify_expired_code_is_tagged_and_kept() {
        let f = fixture();
        seed_sponsor(&f.store);
        f.store
            .upsert_login_code(&LoginCode::new(
                "recruiter@bigco.com".to_string(),
                "AB12CD".to_string(),
                -60,
            ))
            .await
            .unwrap();

        let result = f.service.verify_code("recruiter@bigco.com", "AB12CD").await;
        assert!(matches!(
            result,
            Err(ServiceError::BadCode(CodeRejection::Expired))
        ));
        // Expiry is logical; the stale record is only replaced by the next
        // request, never reaped here.
        assert!(f.store.stored_login_code("recruiter@bigco.com").is_some());
    }

    #[tokio::test]
    async fn test_verify_wrong_code_is_tagged_and_code_survives() {
        let f = fixture();
        seed_sponsor(&f.store);
        f.service.request_code("recruiter@bigco.com").await;

        let result = f.service.verify_code("recruiter@bigco.com", "WRONG1").await;
        assert!(matches!(
            result,
            Err(ServiceError::BadCode(CodeRejection::Mismatch))
        ));
        assert!(f.store.stored_login_code("recruiter@bigco.com").is_some());
    }

    #[tokio::test]
    async fn test_verify_success_grants_sponsor_roles_and_consumes_code() {
        let f = fixture();
        seed_sponsor(&f.store);
        f.service.request_code("recruiter@bigco.com").await;
        let code = f.store.stored_login_code("recruiter@bigco.com").unwrap().code;

        let resolution = f
            .service
            .verify_code("recruiter@bigco.com", &code)
            .await
            .unwrap();

        assert_eq!(resolution.payload.id, "sponsor-7");
        assert_eq!(resolution.payload.roles, vec![Role::User, Role::Sponsor]);
        assert!(f.store.stored_login_code("recruiter@bigco.com").is_none());

        // Replay of the same code must fail now that it is consumed.
        let replay = f.service.verify_code("recruiter@bigco.com", &code).await;
        assert!(matches!(
            replay,
            Err(ServiceError::BadCode(CodeRejection::NoActiveCode))
        ));
    }

    #[tokio::test]
    async fn test_verify_store_failure_is_not_a_bad_code() {
        let f = fixture();
        f.store.set_fail_reads(true);

        let result = f.service.verify_code("recruiter@bigco.com", "AB12CD").await;
        assert!(matches!(result, Err(ServiceError::Internal(_))));
    }
}
