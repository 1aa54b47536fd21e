//! Rotating caller: drive one unit through the key pool.
//!
//! Keys are tried in pool order, each at most once per unit. There is no
//! backoff inside a rotation: a rate-limited key is skipped, not waited on,
//! because waiting is what the pause/resume cycle is for.
//!
//! ## Outcome rules
//!
//! * success with any key → [`CallSuccess`]
//! * rate limit / transient → log and try the next key
//! * invalid key → remember it and try the next key
//! * malformed request / content rejected / unrecognised → abort now,
//!   another key would not change the answer
//! * loop ends with no success → `AllCredentialsExhausted` if any key failed
//!   recoverably, otherwise `InvalidCredential`

use crate::error::{truncate_detail, Doc2WordError, RemoteError};
use crate::keys::KeyPool;
use crate::pipeline::classify::{classify, FailureKind};
use crate::pipeline::gemini::RemoteModel;
use crate::pipeline::request::PromptPart;
use tracing::{debug, warn};

/// A unit's text together with how many keys it took to get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSuccess {
    pub text: String,
    /// 1-based: the key that succeeded was the `attempts`-th one tried.
    pub attempts: usize,
}

/// Send `parts` using each key of `pool` in order until one succeeds.
///
/// `unit_num` is 1-based and only used in logs and in the exhaustion error.
pub async fn call_with_rotation(
    remote: &dyn RemoteModel,
    model: &str,
    pool: &KeyPool,
    parts: &[PromptPart],
    unit_num: usize,
) -> Result<CallSuccess, Doc2WordError> {
    let keys = pool.load();
    let mut saw_recoverable = false;
    let mut last_invalid: Option<RemoteError> = None;

    for (i, key) in keys.iter().enumerate() {
        match remote.generate(model, parts, key).await {
            Ok(text) => {
                debug!(
                    "Unit {}: key {} succeeded ({} chars)",
                    unit_num,
                    key.masked(),
                    text.len()
                );
                return Ok(CallSuccess {
                    text,
                    attempts: i + 1,
                });
            }
            Err(e) => {
                let kind = classify(&e);
                match kind {
                    FailureKind::RateLimited | FailureKind::Transient => {
                        warn!(
                            "Unit {}: key {} {:?} ({}/{}), rotating: {}",
                            unit_num,
                            key.masked(),
                            kind,
                            i + 1,
                            keys.len(),
                            e
                        );
                        saw_recoverable = true;
                    }
                    FailureKind::InvalidCredential => {
                        warn!(
                            "Unit {}: key {} rejected as invalid ({}/{}): {}",
                            unit_num,
                            key.masked(),
                            i + 1,
                            keys.len(),
                            e
                        );
                        last_invalid = Some(e);
                    }
                    FailureKind::MalformedRequest => {
                        return Err(Doc2WordError::MalformedRequest {
                            detail: truncate_detail(&e.to_string()),
                        });
                    }
                    FailureKind::ContentRejected => {
                        return Err(Doc2WordError::ContentRejected {
                            detail: truncate_detail(&e.to_string()),
                        });
                    }
                    FailureKind::Unrecognized => {
                        return Err(Doc2WordError::RemoteFailure {
                            detail: truncate_detail(&e.to_string()),
                        });
                    }
                }
            }
        }
    }

    match last_invalid {
        Some(e) if !saw_recoverable => Err(Doc2WordError::InvalidCredential {
            detail: truncate_detail(&e.to_string()),
        }),
        _ => Err(Doc2WordError::AllCredentialsExhausted {
            unit: unit_num,
            attempted: keys.len(),
        }),
    }
}
