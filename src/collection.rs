/*
 * SPDX-FileCopyrightText: Copyright (c) 2023 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: MIT
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
 * THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
 * FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
 * DEALINGS IN THE SOFTWARE.
 */
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::model::online_update::{OnlineUpdateRequest, UpdateCollection};
use crate::oem::{OemVariant, OnlineUpdateEndpoints};
use crate::task::{check_task_status, DEFAULT_ONLINE_UPDATE_TIMEOUT};
use crate::{Redfish, RedfishError};

/// A collection younger than this is reused instead of running a new check.
pub const CACHE_DURATION: Duration = Duration::from_secs(6 * 60 * 60);

/// Wait before reading the collection when a check returned no task.
pub const CHECK_WITHOUT_TASK_DELAY: Duration = Duration::from_secs(5);

/// Fixed number of reads with a fixed pause while the iRMC reports the
/// collection as in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryBudget {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryBudget {
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        RetryBudget { attempts, delay }
    }
}

/// Used to decide whether the existing collection is fresh.
pub const CACHE_PROBE: RetryBudget = RetryBudget::new(2, Duration::from_secs(1));
/// Reading a fresh collection for the check view.
pub const CACHED_READ: RetryBudget = RetryBudget::new(5, Duration::from_secs(5));
/// Reading a fresh collection before executing updates.
pub const CACHED_READ_BEFORE_EXECUTE: RetryBudget = RetryBudget::new(3, Duration::from_secs(1));
/// Reading the collection produced by a check we just triggered.
pub const AFTER_CHECK: RetryBudget = RetryBudget::new(12, Duration::from_secs(5));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionFetch {
    InProgress,
    Ready(UpdateCollection),
}

/// One read of the update collection.
pub async fn get_online_update_collection(
    redfish: &dyn Redfish,
    url: &str,
) -> Result<CollectionFetch, RedfishError> {
    let resp = redfish.get_online_update_collection(url).await?;
    if resp.is_in_progress() {
        return Ok(CollectionFetch::InProgress);
    }
    Ok(CollectionFetch::Ready(resp.into()))
}

/// Reads the collection, retrying only while it is in progress. Errors are
/// returned at once.
pub async fn get_online_update_collection_with_retry(
    redfish: &dyn Redfish,
    url: &str,
    budget: RetryBudget,
) -> Result<UpdateCollection, RedfishError> {
    for attempt in 1..=budget.attempts {
        match get_online_update_collection(redfish, url).await? {
            CollectionFetch::Ready(collection) => return Ok(collection),
            CollectionFetch::InProgress => {
                debug!(
                    "Update collection in progress (attempt {attempt}/{})",
                    budget.attempts
                );
                sleep(budget.delay).await;
            }
        }
    }
    Err(RedfishError::CollectionNotReady {
        url: url.to_string(),
        attempts: budget.attempts,
    })
}

/// Whether `collection` was refreshed less than [`CACHE_DURATION`] before `now`.
/// An unparseable date is never fresh.
pub fn is_fresh(collection: &UpdateCollection, now: DateTime<Utc>) -> bool {
    let Ok(changed) = DateTime::parse_from_rfc3339(&collection.last_status_change_date) else {
        return false;
    };
    let age = now.signed_duration_since(changed.with_timezone(&Utc));
    match chrono::Duration::from_std(CACHE_DURATION) {
        Ok(window) => age < window,
        Err(_) => false,
    }
}

/// Whether the collection the iRMC already has can be reused. Never fails:
/// any problem reading it means "run a new check".
pub async fn is_cache_valid(redfish: &dyn Redfish, url: &str) -> bool {
    match get_online_update_collection_with_retry(redfish, url, CACHE_PROBE).await {
        Ok(collection) => is_fresh(&collection, Utc::now()),
        Err(e) => {
            debug!("Existing update collection not usable: {e}");
            false
        }
    }
}

/// Asks the iRMC to look for updates. Returns the task location; a response
/// without one is accepted.
pub async fn trigger_online_update_check(
    redfish: &dyn Redfish,
    url: &str,
) -> Result<Option<String>, RedfishError> {
    let location = redfish
        .online_update(url, &OnlineUpdateRequest::check_for_update())
        .await?;
    if location.is_none() {
        warn!("Task Location header not found in online update check response");
    }
    Ok(location)
}

/// Returns an update collection, reusing the iRMC's current one when it is
/// fresh and running a new check otherwise. `cached_read` is the retry budget
/// for the reuse path.
pub async fn fetch_update_collection(
    redfish: &dyn Redfish,
    variant: OemVariant,
    endpoints: &OnlineUpdateEndpoints,
    cached_read: RetryBudget,
) -> Result<UpdateCollection, RedfishError> {
    if is_cache_valid(redfish, &endpoints.collection).await {
        info!("Using cached online update collection");
        return get_online_update_collection_with_retry(redfish, &endpoints.collection, cached_read)
            .await;
    }

    info!("Triggering online update check");
    match trigger_online_update_check(redfish, &endpoints.check).await? {
        Some(location) => {
            check_task_status(redfish, variant, &location, DEFAULT_ONLINE_UPDATE_TIMEOUT).await?
        }
        None => sleep(CHECK_WITHOUT_TASK_DELAY).await,
    }
    get_online_update_collection_with_retry(redfish, &endpoints.collection, AFTER_CHECK).await
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use reqwest::StatusCode;
    use tokio::time::Instant;

    use super::*;
    use crate::model::online_update::{ExecutionMode, UpdateCollectionResponse, UpdateItem};
    use crate::model::task::{Task, TaskState, TaskStatus};
    use crate::MockRedfish;

    pub(crate) fn item(designation: &str, component: &str) -> UpdateItem {
        UpdateItem {
            designation: designation.to_string(),
            component: component.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn ready(date: &str, items: Vec<UpdateItem>) -> UpdateCollectionResponse {
        UpdateCollectionResponse {
            status: "Finished".to_string(),
            last_status_change_date: date.to_string(),
            update_collection: items,
        }
    }

    pub(crate) fn in_progress() -> UpdateCollectionResponse {
        UpdateCollectionResponse {
            status: "InProgress".to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn rfc3339_ago(age: ChronoDuration) -> String {
        (Utc::now() - age).to_rfc3339()
    }

    pub(crate) fn completed_task() -> Task {
        Task {
            odata_id: None,
            id: "1".to_string(),
            name: None,
            task_state: Some(TaskState::Completed),
            task_status: Some(TaskStatus::OK),
            percent_complete: Some(100),
            start_time: None,
            end_time: None,
            messages: vec![],
        }
    }

    fn endpoints() -> OnlineUpdateEndpoints {
        OemVariant::Fujitsu.online_update_endpoints()
    }

    fn collection_at(date: &str) -> UpdateCollection {
        UpdateCollection {
            last_status_change_date: date.to_string(),
            items: vec![],
        }
    }

    #[test]
    fn test_is_fresh_window() {
        let now: DateTime<Utc> = "2026-03-02T12:00:00Z".parse().unwrap();
        assert!(is_fresh(&collection_at("2026-03-02T06:00:01Z"), now));
        assert!(is_fresh(&collection_at("2026-03-02T07:00:01+01:00"), now));
        assert!(!is_fresh(&collection_at("2026-03-02T07:00:00+01:00"), now));
        assert!(!is_fresh(&collection_at("2026-03-02T06:00:00Z"), now));
        assert!(!is_fresh(&collection_at("2026-03-01T12:00:00Z"), now));
    }

    #[test]
    fn test_is_fresh_needs_rfc3339() {
        let now = Utc::now();
        assert!(!is_fresh(&collection_at(""), now));
        assert!(!is_fresh(&collection_at("02.03.2026 11:00"), now));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_returns_ready_collection() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut redfish = MockRedfish::new();
        redfish
            .expect_get_online_update_collection()
            .returning(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Ok(in_progress())
                } else {
                    Ok(ready("2026-03-02T06:00:00Z", vec![item("Storage/B", "Storage")]))
                }
            });
        let start = Instant::now();
        let collection =
            get_online_update_collection_with_retry(&redfish, &endpoints().collection, AFTER_CHECK)
                .await
                .unwrap();
        assert_eq!(collection.items.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), AFTER_CHECK.delay * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_exhausted() {
        let mut redfish = MockRedfish::new();
        redfish
            .expect_get_online_update_collection()
            .times(AFTER_CHECK.attempts as usize)
            .returning(|_| Ok(in_progress()));
        let err =
            get_online_update_collection_with_retry(&redfish, &endpoints().collection, AFTER_CHECK)
                .await
                .unwrap_err();
        assert!(matches!(
            err,
            RedfishError::CollectionNotReady { attempts: 12, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_does_not_retry_errors() {
        let mut redfish = MockRedfish::new();
        redfish
            .expect_get_online_update_collection()
            .times(1)
            .returning(|url| {
                Err(RedfishError::HTTPErrorCode {
                    url: url.to_string(),
                    status_code: StatusCode::SERVICE_UNAVAILABLE,
                    response_body: String::new(),
                })
            });
        let err = get_online_update_collection_with_retry(&redfish, "c", CACHED_READ)
            .await
            .unwrap_err();
        assert!(matches!(err, RedfishError::HTTPErrorCode { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_valid_for_recent_collection() {
        let mut redfish = MockRedfish::new();
        redfish
            .expect_get_online_update_collection()
            .times(1)
            .returning(|_| Ok(ready(&rfc3339_ago(ChronoDuration::hours(1)), vec![])));
        assert!(is_cache_valid(&redfish, &endpoints().collection).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_invalid_for_old_collection() {
        let mut redfish = MockRedfish::new();
        redfish
            .expect_get_online_update_collection()
            .returning(|_| Ok(ready(&rfc3339_ago(ChronoDuration::hours(7)), vec![])));
        assert!(!is_cache_valid(&redfish, &endpoints().collection).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_invalid_swallows_errors() {
        let mut redfish = MockRedfish::new();
        redfish
            .expect_get_online_update_collection()
            .returning(|url| {
                Err(RedfishError::HTTPErrorCode {
                    url: url.to_string(),
                    status_code: StatusCode::BAD_REQUEST,
                    response_body: String::new(),
                })
            });
        assert!(!is_cache_valid(&redfish, &endpoints().collection).await);

        let mut redfish = MockRedfish::new();
        redfish
            .expect_get_online_update_collection()
            .times(CACHE_PROBE.attempts as usize)
            .returning(|_| Ok(in_progress()));
        assert!(!is_cache_valid(&redfish, &endpoints().collection).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_uses_cache() {
        let mut redfish = MockRedfish::new();
        redfish
            .expect_get_online_update_collection()
            .times(2)
            .returning(|_| {
                Ok(ready(
                    &rfc3339_ago(ChronoDuration::minutes(10)),
                    vec![item("SystemBoard/A", "SystemBoard")],
                ))
            });
        redfish.expect_online_update().never();
        let collection =
            fetch_update_collection(&redfish, OemVariant::Fujitsu, &endpoints(), CACHED_READ)
                .await
                .unwrap();
        assert_eq!(collection.items[0].designation, "SystemBoard/A");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_without_task_location_sleeps() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut redfish = MockRedfish::new();
        // First read is the stale cache probe, the second the fresh result
        redfish
            .expect_get_online_update_collection()
            .times(2)
            .returning(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(ready("2020-01-01T00:00:00Z", vec![]))
                } else {
                    Ok(ready(
                        &Utc::now().to_rfc3339(),
                        vec![item("Storage/B", "Storage")],
                    ))
                }
            });
        redfish
            .expect_online_update()
            .withf(|url, req| {
                url == endpoints().check && req.execution_mode == ExecutionMode::CheckForUpdate
            })
            .times(1)
            .returning(|_, _| Ok(None));
        redfish.expect_get_task().never();

        let start = Instant::now();
        let collection =
            fetch_update_collection(&redfish, OemVariant::Fujitsu, &endpoints(), CACHED_READ)
                .await
                .unwrap();
        assert_eq!(collection.items[0].designation, "Storage/B");
        assert_eq!(start.elapsed(), CHECK_WITHOUT_TASK_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_polls_check_task() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut redfish = MockRedfish::new();
        redfish
            .expect_get_online_update_collection()
            .returning(move |_| match counter.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(ready("not a date", vec![])),
                1 => Ok(in_progress()),
                _ => Ok(ready("2026-03-02T06:00:00Z", vec![item("Storage/B", "Storage")])),
            });
        redfish
            .expect_online_update()
            .times(1)
            .returning(|_, _| Ok(Some("/redfish/v1/TaskService/Tasks/3".to_string())));
        redfish
            .expect_get_task()
            .withf(|l| l == "/redfish/v1/TaskService/Tasks/3")
            .times(1)
            .returning(|_| Ok(completed_task()));

        let collection =
            fetch_update_collection(&redfish, OemVariant::Fujitsu, &endpoints(), CACHED_READ)
                .await
                .unwrap();
        assert_eq!(collection.items.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_aborts_on_failed_check_task() {
        let mut redfish = MockRedfish::new();
        redfish
            .expect_get_online_update_collection()
            .times(1)
            .returning(|_| Ok(ready("2020-01-01T00:00:00Z", vec![])));
        redfish
            .expect_online_update()
            .returning(|_, _| Ok(Some("/redfish/v1/TaskService/Tasks/3".to_string())));
        redfish.expect_get_task().returning(|_| {
            let mut task = completed_task();
            task.task_state = Some(TaskState::Exception);
            Ok(task)
        });
        redfish
            .expect_get_task_log()
            .returning(|_| Ok("no repository".to_string()));
        let err = fetch_update_collection(&redfish, OemVariant::Fujitsu, &endpoints(), CACHED_READ)
            .await
            .unwrap_err();
        assert!(matches!(err, RedfishError::TaskFailed { task_log, .. } if task_log == "no repository"));
    }
}
