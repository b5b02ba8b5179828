//! Traits for credential access
//!
//! The request pipeline never reaches for a global store; it is given a
//! `CredentialStore` when it is built, which keeps independent clients (and
//! tests) from sharing state.

/// Read/write access to the bearer credentials
///
/// Empty strings stand for "no token".
pub trait CredentialStore: Send + Sync {
    /// Current access token, empty when signed out
    fn access_token(&self) -> String;

    /// Current refresh token, empty when none is held
    fn refresh_token(&self) -> String;

    /// Overwrite both tokens. An empty value clears that token.
    fn store_tokens(&self, access: &str, refresh: &str);

    /// Forget the whole session.
    fn clear(&self);
}

impl<T: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<T> {
    fn access_token(&self) -> String {
        (**self).access_token()
    }

    fn refresh_token(&self) -> String {
        (**self).refresh_token()
    }

    fn store_tokens(&self, access: &str, refresh: &str) {
        (**self).store_tokens(access, refresh);
    }

    fn clear(&self) {
        (**self).clear();
    }
}
