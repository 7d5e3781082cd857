// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Periodic roster refresh

use crate::client::RestClient;
use crate::error::RestClientResult;
use conf_rest_api_contract::EventAttendeeResponse;
use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Fetch the attendee roster of `event_id` every `interval`.
///
/// The first fetch happens immediately. Fetch errors are handed to
/// `on_update` like results; the loop keeps going until the callback breaks
/// or `shutdown` completes.
pub async fn poll_attendees<F, S>(
    client: &RestClient,
    event_id: i64,
    interval: Duration,
    shutdown: S,
    mut on_update: F,
) where
    F: FnMut(RestClientResult<Vec<EventAttendeeResponse>>) -> ControlFlow<()>,
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::debug!(event_id, "Attendee polling stopped");
                return;
            }
            _ = ticker.tick() => {
                let result = client.event_attendees(event_id).await;
                if let Err(err) = &result {
                    tracing::warn!(event_id, error = %err, "Attendee refresh failed");
                }
                if on_update(result).is_break() {
                    return;
                }
            }
        }
    }
}
