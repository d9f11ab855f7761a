/// Request logging middleware
///
/// Logs one event per request at a level chosen by the response status:
/// `>= 500` error, `>= 400` warn, otherwise info.
///
/// Keep-alive traffic (health probes, pollers) is throttled: after a
/// keep-alive request is logged, further keep-alive requests stay quiet
/// until the configured threshold has elapsed.

use crate::app::AppState;
use axum::{
    extract::{Request, State},
    http::header::CONNECTION,
    middleware::Next,
    response::Response,
};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Deadline before which keep-alive requests are not logged
#[derive(Debug)]
pub struct LogThrottle {
    window: Duration,
    deadline: Mutex<Option<Instant>>,
}

impl LogThrottle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: Mutex::new(None),
        }
    }

    /// Whether a request seen at `now` should be logged
    pub fn should_log(&self, keep_alive: bool, now: Instant) -> bool {
        if !keep_alive {
            return true;
        }

        // A poisoned lock only means another request panicked mid-update
        let mut deadline = match self.deadline.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match *deadline {
            Some(until) if now < until => false,
            _ => {
                *deadline = Some(now + self.window);
                true
            }
        }
    }
}

pub async fn log_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let keep_alive = req
        .headers()
        .get(CONNECTION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("keep-alive"))
        .unwrap_or(false);

    let started = Instant::now();
    if !state.log_throttle.should_log(keep_alive, started) {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;

    match status {
        500.. => error!(%method, path, status, latency_ms, "Request failed"),
        400..=499 => warn!(%method, path, status, latency_ms, "Request rejected"),
        _ => info!(%method, path, status, latency_ms, "Request handled"),
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_keep_alive_always_logged() {
        let throttle = LogThrottle::new(Duration::from_secs(60));
        let now = Instant::now();
        assert!(throttle.should_log(false, now));
        assert!(throttle.should_log(false, now));
    }

    #[test]
    fn test_keep_alive_throttled_until_deadline() {
        let throttle = LogThrottle::new(Duration::from_secs(60));
        let start = Instant::now();

        assert!(throttle.should_log(true, start));
        assert!(!throttle.should_log(true, start + Duration::from_secs(30)));
        assert!(throttle.should_log(true, start + Duration::from_secs(60)));
        assert!(!throttle.should_log(true, start + Duration::from_secs(61)));
    }

    #[test]
    fn test_keep_alive_does_not_silence_other_requests() {
        let throttle = LogThrottle::new(Duration::from_secs(60));
        let start = Instant::now();

        assert!(throttle.should_log(true, start));
        assert!(throttle.should_log(false, start + Duration::from_secs(1)));
    }
}
