//! Floating IP assignment: request, bounded poll, address fetch.
//!
//! Assignment is asynchronous on the provider side; the assign call returns
//! an action id whose status resolves over time. The poll loop runs against
//! a deadline computed once at entry, so the configured timeout bounds the
//! whole wait regardless of how long individual status fetches take.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use tokio::time::sleep;

use crate::provider::Server;

use super::error::HcloudApiError;
use super::types::{ActionResponse, ActionStatus, AssignRequest, FloatingIpResponse};
use super::HcloudApi;

/// Terminal observation of a polled action.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(in crate::hcloud) enum WaitVerdict {
    Success,
    Failed(ActionStatus),
    TimedOut,
}

impl HcloudApi {
    /// Assigns the configured floating IP to the server and returns the
    /// resulting address.
    ///
    /// An absent or blank id resolves to `Ok(None)` without any request; a
    /// non-numeric id fails before any request is made.
    pub(in crate::hcloud) async fn assign_ip(
        &self,
        raw_id: Option<&str>,
        server: &Server,
    ) -> Result<Option<String>, HcloudApiError> {
        let Some(floating_ip_id) = parse_floating_ip_id(raw_id)? else {
            tracing::debug!("no floating IP configured; skipping assignment");
            return Ok(None);
        };

        let action_id = self.request_assignment(floating_ip_id, server.id).await?;
        tracing::info!(floating_ip_id, action_id, "floating IP assignment requested");

        let verdict = poll_action_with(self.assignment_timeout, self.poll_interval, || {
            self.fetch_assignment_status(floating_ip_id, action_id)
        })
        .await?;
        match verdict {
            WaitVerdict::Success => {}
            WaitVerdict::Failed(status) => {
                return Err(HcloudApiError::AssignmentFailed {
                    status: status.to_string(),
                });
            }
            WaitVerdict::TimedOut => {
                return Err(HcloudApiError::AssignmentTimeout {
                    floating_ip_id,
                    timeout: self.assignment_timeout,
                });
            }
        }

        let address = self.fetch_floating_ip(floating_ip_id).await?;
        Ok(Some(address))
    }

    async fn request_assignment(
        &self,
        floating_ip_id: u64,
        server_id: i64,
    ) -> Result<i64, HcloudApiError> {
        let response = self
            .post(
                &format!("/floating_ips/{floating_ip_id}/actions/assign"),
                &AssignRequest { server: server_id },
            )
            .await?;
        if response.status != StatusCode::CREATED {
            return Err(response.api_error());
        }
        let parsed: ActionResponse = response.json()?;
        Ok(parsed.action.id)
    }

    async fn fetch_assignment_status(
        &self,
        floating_ip_id: u64,
        action_id: i64,
    ) -> Result<ActionStatus, HcloudApiError> {
        let response = self
            .get(&format!("/floating_ips/{floating_ip_id}/actions/{action_id}"))
            .await?;
        if response.status != StatusCode::OK {
            return Err(response.api_error());
        }
        let parsed: ActionResponse = response.json()?;
        parsed
            .action
            .status
            .ok_or_else(|| HcloudApiError::InvalidResponse {
                message: String::from("action response is missing a status"),
            })
    }

    async fn fetch_floating_ip(&self, floating_ip_id: u64) -> Result<String, HcloudApiError> {
        let response = self.get(&format!("/floating_ips/{floating_ip_id}")).await?;
        if response.status != StatusCode::OK {
            return Err(response.api_error());
        }
        let parsed: FloatingIpResponse = response.json()?;
        Ok(parsed.floating_ip.ip)
    }
}

/// Validates the raw configured floating IP id. `None` and blank values mean
/// the assignment is skipped.
fn parse_floating_ip_id(raw: Option<&str>) -> Result<Option<u64>, HcloudApiError> {
    match raw.map(str::trim) {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => raw.parse::<u64>().map(Some).map_err(|_| {
            HcloudApiError::Config(format!("floating IP id '{raw}' is not numeric"))
        }),
    }
}

/// Polls `fetch_status` at a fixed interval until a terminal status is
/// observed or the deadline passes while the action is still running.
///
/// Status-fetch errors abort the loop immediately. The fetch is a closure so
/// the state machine is testable without HTTP.
pub(in crate::hcloud) async fn poll_action_with<F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut fetch_status: F,
) -> Result<WaitVerdict, HcloudApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ActionStatus, HcloudApiError>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match fetch_status().await? {
            ActionStatus::Success => return Ok(WaitVerdict::Success),
            ActionStatus::Running => {}
            status => return Ok(WaitVerdict::Failed(status)),
        }
        if Instant::now() >= deadline {
            return Ok(WaitVerdict::TimedOut);
        }
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    #[test]
    fn absent_and_blank_ids_skip_assignment() {
        assert_eq!(parse_floating_ip_id(None).expect("skip"), None);
        assert_eq!(parse_floating_ip_id(Some("")).expect("skip"), None);
        assert_eq!(parse_floating_ip_id(Some("   ")).expect("skip"), None);
    }

    #[test]
    fn numeric_ids_parse_with_surrounding_whitespace() {
        assert_eq!(
            parse_floating_ip_id(Some(" 1337 ")).expect("parses"),
            Some(1337)
        );
    }

    #[test]
    fn non_numeric_ids_fail_before_any_request() {
        let err = parse_floating_ip_id(Some("hello world")).expect_err("rejected");
        assert!(matches!(err, HcloudApiError::Config(_)));
    }

    fn scripted(
        statuses: Vec<Result<ActionStatus, HcloudApiError>>,
    ) -> impl FnMut() -> std::future::Ready<Result<ActionStatus, HcloudApiError>> {
        let queue = RefCell::new(VecDeque::from(statuses));
        move || {
            let next = queue
                .borrow_mut()
                .pop_front()
                .unwrap_or(Ok(ActionStatus::Running));
            std::future::ready(next)
        }
    }

    #[tokio::test]
    async fn poll_resolves_after_running_then_success() {
        let verdict = poll_action_with(
            Duration::from_secs(1),
            Duration::from_millis(1),
            scripted(vec![Ok(ActionStatus::Running), Ok(ActionStatus::Success)]),
        )
        .await
        .expect("poll completes");
        assert_eq!(verdict, WaitVerdict::Success);
    }

    #[tokio::test]
    async fn poll_stops_on_terminal_error() {
        let verdict = poll_action_with(
            Duration::from_secs(1),
            Duration::from_millis(1),
            scripted(vec![Ok(ActionStatus::Running), Ok(ActionStatus::Error)]),
        )
        .await
        .expect("poll completes");
        assert_eq!(verdict, WaitVerdict::Failed(ActionStatus::Error));
    }

    #[tokio::test]
    async fn poll_treats_unknown_terminal_status_as_failure() {
        let verdict = poll_action_with(
            Duration::from_secs(1),
            Duration::from_millis(1),
            scripted(vec![Ok(ActionStatus::Unknown)]),
        )
        .await
        .expect("poll completes");
        assert_eq!(verdict, WaitVerdict::Failed(ActionStatus::Unknown));
    }

    #[tokio::test]
    async fn poll_times_out_while_still_running() {
        let verdict = poll_action_with(
            Duration::from_millis(5),
            Duration::from_millis(1),
            scripted(Vec::new()),
        )
        .await
        .expect("poll completes");
        assert_eq!(verdict, WaitVerdict::TimedOut);
    }

    #[tokio::test]
    async fn poll_surfaces_fetch_errors() {
        let err = poll_action_with(
            Duration::from_secs(1),
            Duration::from_millis(1),
            scripted(vec![Err(HcloudApiError::Transport {
                message: String::from("connection refused"),
            })]),
        )
        .await
        .expect_err("fetch error aborts");
        assert!(matches!(err, HcloudApiError::Transport { .. }));
    }
}
