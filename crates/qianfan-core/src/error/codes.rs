//! Application error codes returned inside response bodies

/// Backend service temporarily unavailable
pub const SERVICE_UNAVAILABLE: i64 = 2;
/// Per-second request quota exceeded
pub const QPS_LIMIT_REACHED: i64 = 18;
/// Access token is malformed or revoked
pub const ACCESS_TOKEN_INVALID: i64 = 110;
/// Access token has expired
pub const ACCESS_TOKEN_EXPIRED: i64 = 111;
/// Model server is overloaded
pub const SERVER_HIGH_LOAD: i64 = 336100;
/// Per-minute request quota exceeded
pub const RPM_LIMIT_REACHED: i64 = 336501;
/// Per-minute token quota exceeded
pub const TPM_LIMIT_REACHED: i64 = 336502;

/// Codes retried by default
pub const DEFAULT_RETRYABLE: &[i64] = &[
    SERVICE_UNAVAILABLE,
    QPS_LIMIT_REACHED,
    SERVER_HIGH_LOAD,
    RPM_LIMIT_REACHED,
    TPM_LIMIT_REACHED,
];

/// Codes meaning the cached access token must be exchanged again
pub const TOKEN_EXPIRED: &[i64] = &[ACCESS_TOKEN_INVALID, ACCESS_TOKEN_EXPIRED];
