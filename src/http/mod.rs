//! HTTP client module
//!
//! Provides the HTTP client with retry, rate limiting, and backoff strategies.
//!
//! # Features
//!
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Authentication**: Credential headers applied on every attempt
//! - **Fatal Classification**: 401/403 abort immediately, never retried

mod client;

pub use client::{HttpClient, HttpClientConfig, RateLimiter, RateLimiterConfig, RequestConfig};
