/// Per-client rate limiting (fixed window).
///
/// Request counts are tracked per peer address; a window resets once its
/// length has elapsed, and requests over the ceiling get 429 with a computed
/// retry-after in seconds. The counter map is the only shared mutable state
/// in the process: entries are mutated under the lock and stale windows are
/// swept so the map does not grow without bound.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;

use crate::error::{AppError, PolicyError};

// Above this many tracked clients, a check also sweeps dead windows.
const SWEEP_THRESHOLD: usize = 4096;

struct Window {
    count: u32,
    started_at: Instant,
}

pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(window_secs: u64, max_requests: u32) -> Self {
        Self {
            window: Duration::from_secs(window_secs),
            max_requests,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Count a request from `key`. Over the ceiling returns the rejection
    /// with its retry hint.
    pub fn check(&self, key: &str) -> Result<(), PolicyError> {
        let mut windows = match self.windows.lock() {
            Ok(windows) => windows,
            // A poisoned lock fails open: limiting is protection, not
            // correctness.
            Err(poisoned) => poisoned.into_inner(),
        };

        let now = Instant::now();

        if windows.len() > SWEEP_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started_at) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started_at: now,
        });

        let elapsed = now.duration_since(entry.started_at);
        if elapsed >= self.window {
            entry.count = 0;
            entry.started_at = now;
        }

        if entry.count >= self.max_requests {
            let remaining = self.window.saturating_sub(elapsed);
            let retry_after = remaining.as_secs().max(1);
            return Err(PolicyError::RateLimitExceeded { retry_after });
        }

        entry.count += 1;
        Ok(())
    }

    /// Drop every window older than the window length. Returns how many
    /// were removed.
    pub fn sweep(&self) -> usize {
        let mut windows = match self.windows.lock() {
            Ok(windows) => windows,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        let before = windows.len();
        let window = self.window;
        windows.retain(|_, w| now.duration_since(w.started_at) < window);
        before - windows.len()
    }
}

/// Actix middleware wrapping a shared `RateLimiter`.
pub struct RateLimit {
    limiter: Arc<RateLimiter>,
}

impl RateLimit {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RateLimitService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
    limiter: Arc<RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let key = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        let outcome = self.limiter.check(&key);
        let service = self.service.clone();

        Box::pin(async move {
            match outcome {
                Ok(()) => service.call(req).await,
                Err(e) => {
                    tracing::warn!(client = %key, "Rate limit exceeded");
                    Err(AppError::Policy(e).into())
                }
            }
        })
    }
}
