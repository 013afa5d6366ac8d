//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! Expensive resources (JWT keys, store handles) are built once here.
//! Every field is an `Arc` or wraps `Arc`s, so cloning per request is cheap.

use crate::auth::{LockoutPolicy, PasswordService, TokenIssuer};
use crate::config::AppConfig;
use crate::rate_limit::RateLimits;
use crate::repositories::Stores;
use crate::routes::cookie::RefreshCookie;
use crate::services::{AuthService, BookingService, CredentialStore, PetService};
use secrecy::ExposeSecret;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Store handles
    pub stores: Stores,
    /// Application configuration
    pub config: Arc<AppConfig>,
    auth: AuthService,
    pets: PetService,
    bookings: BookingService,
    cookie: RefreshCookie,
    rate_limits: Option<RateLimits>,
}

impl AppState {
    /// Create a new application state
    ///
    /// Derives the JWT keys from the configured secrets; call once at
    /// startup.
    pub fn new(stores: Stores, config: AppConfig) -> Self {
        let tokens = TokenIssuer::new(
            config.jwt.access_secret.expose_secret(),
            config.jwt.refresh_secret.expose_secret(),
            config.jwt.access_token_expiry_secs,
            config.jwt.refresh_token_expiry_secs,
        );
        let credentials = CredentialStore::new(
            stores.users.clone(),
            PasswordService::new(config.security.bcrypt_cost),
            LockoutPolicy::from(&config.security),
        );
        let cookie = RefreshCookie::new(
            config.cookie.name.clone(),
            config.cookie.secure,
            config.jwt.refresh_token_expiry_secs,
        );

        let pets = PetService::new(stores.pets.clone());
        let bookings = BookingService::new(stores.bookings.clone(), pets.clone(), stores.users.clone());

        Self {
            auth: AuthService::new(credentials, stores.refresh_tokens.clone(), tokens),
            pets,
            bookings,
            cookie,
            rate_limits: RateLimits::from_settings(&config.rate_limit),
            config: Arc::new(config),
            stores,
        }
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    #[inline]
    pub fn pets(&self) -> &PetService {
        &self.pets
    }

    #[inline]
    pub fn bookings(&self) -> &BookingService {
        &self.bookings
    }

    #[inline]
    pub fn cookie(&self) -> &RefreshCookie {
        &self.cookie
    }

    /// Installed limiters; `None` when rate limiting is disabled
    #[inline]
    pub fn rate_limits(&self) -> Option<&RateLimits> {
        self.rate_limits.as_ref()
    }
}
