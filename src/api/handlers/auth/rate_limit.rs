//! Rate limiting seam for auth flows.
//!
//! The service itself never throttles; deployments plug a real limiter in
//! at construction time and the default allows everything.

/// What the caller is about to do.
#[derive(Clone, Copy, Debug)]
pub enum RateLimitAction {
    Register,
    Login,
    VerifyEmail,
    ResendVerification,
}

/// Which request attribute the limit is keyed on.
#[derive(Clone, Copy, Debug)]
pub enum RateLimitScope<'a> {
    /// Client IP, when one could be extracted from proxy headers.
    Ip(Option<&'a str>),
    /// Normalized account email.
    Email(&'a str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

pub trait RateLimiter: Send + Sync {
    fn check(&self, scope: RateLimitScope<'_>, action: RateLimitAction) -> RateLimitDecision;
}

/// Default limiter: every request is allowed.
#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check(&self, _scope: RateLimitScope<'_>, _action: RateLimitAction) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_rate_limiter_allows_every_scope() {
        let limiter = NoopRateLimiter;
        for scope in [
            RateLimitScope::Ip(Some("203.0.113.10")),
            RateLimitScope::Ip(None),
            RateLimitScope::Email("user@example.com"),
        ] {
            assert_eq!(
                limiter.check(scope, RateLimitAction::Register),
                RateLimitDecision::Allowed
            );
        }
    }
}
