//! Pure classification of provider/session error text. No I/O: both the
//! classifier hook and the retry-backoff hook call this independently since
//! it needs no shared state.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorCategory {
    Retryable,
    ContextOverflow,
    NonRetryable,
}

impl ProviderErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorCategory::Retryable => "retryable",
            ProviderErrorCategory::ContextOverflow => "context_overflow",
            ProviderErrorCategory::NonRetryable => "non_retryable",
        }
    }
}

const CONTEXT_OVERFLOW_PATTERNS: &[&str] = &[
    "context length",
    "maximum context",
    "context_length_exceeded",
    "too many tokens",
    "prompt is too long",
];

const NON_RETRYABLE_PATTERNS: &[&str] = &[
    "invalid api key",
    "unauthorized",
    "forbidden",
    "invalid request",
    "content policy",
    "permission denied",
];

const RETRYABLE_PATTERNS: &[&str] = &[
    "rate limit",
    "overloaded",
    "timeout",
    "timed out",
    "connection reset",
    "503",
    "502",
    "internal server error",
];

pub fn classify_provider_retry_reason(message: &str) -> ProviderErrorCategory {
    let lower = message.to_lowercase();

    if CONTEXT_OVERFLOW_PATTERNS.iter().any(|p| lower.contains(p)) {
        return ProviderErrorCategory::ContextOverflow;
    }
    if NON_RETRYABLE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return ProviderErrorCategory::NonRetryable;
    }
    if RETRYABLE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return ProviderErrorCategory::Retryable;
    }
    ProviderErrorCategory::Retryable
}
