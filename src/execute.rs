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

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::model::online_update::{
    ExecutionMode, OnlineUpdateRequest, OperationTime, UpdateCollectionModifications,
};
use crate::oem::OemVariant;
use crate::selection::{Reconciliation, UpdateSelection};
use crate::task::{check_task_status, DEFAULT_ONLINE_UPDATE_TIMEOUT};
use crate::{Redfish, RedfishError};

/// Pause after an immediate execution that produced no task to follow.
pub const EXECUTE_WITHOUT_TASK_DELAY: Duration = Duration::from_secs(10);

pub const NO_MATCHING_UPDATES: &str = "No matching updates found: the update list did not match \
    any available updates in the collection. No updates were executed.";

/// Marks each designation as deselected, one request at a time. Stops at the
/// first failure.
pub async fn deselect_updates(
    redfish: &dyn Redfish,
    url: &str,
    designations: &[String],
) -> Result<(), RedfishError> {
    for designation in designations {
        debug!("Deselecting update {designation}");
        let change = UpdateCollectionModifications::deselect(designation);
        redfish
            .modify_online_update_collection(url, &change)
            .await
            .map_err(|e| RedfishError::DeselectFailed {
                designation: designation.clone(),
                source: Box::new(e),
            })?;
    }
    Ok(())
}

/// Start date to send for `operation_time`. `Once` needs a non-blank schedule
/// time; `Immediately` never sends one.
pub fn start_date(
    operation_time: OperationTime,
    schedule_time: Option<&str>,
) -> Result<Option<String>, RedfishError> {
    let schedule_time = schedule_time.map(str::trim).filter(|s| !s.is_empty());
    match (operation_time, schedule_time) {
        (OperationTime::Once, Some(start)) => Ok(Some(start.to_string())),
        (OperationTime::Once, None) => Err(RedfishError::InvalidInput(
            "execute_online_upd_schedule_time is required when \
             execute_online_upd_operation_time is 'Once'"
                .to_string(),
        )),
        (OperationTime::Immediately, _) => Ok(None),
    }
}

/// Body for the execute action, plus a warning when a schedule time was given
/// but will not be used.
pub fn build_execute_payload(
    operation_time: OperationTime,
    schedule_time: Option<&str>,
) -> Result<(OnlineUpdateRequest, Option<String>), RedfishError> {
    let start_date = start_date(operation_time, schedule_time)?;
    let ignored_schedule = operation_time == OperationTime::Immediately
        && schedule_time.is_some_and(|s| !s.trim().is_empty());
    let warning = ignored_schedule.then(|| {
        let warning = "execute_online_upd_schedule_time is provided but \
             execute_online_upd_operation_time is 'Immediately'. The schedule time is ignored."
            .to_string();
        warn!("{warning}");
        warning
    });
    Ok((
        OnlineUpdateRequest {
            execution_mode: ExecutionMode::ExecuteUpdate,
            scheduling_type: operation_time,
            start_date,
        },
        warning,
    ))
}

/// Execution runs when something is left selected, or when the caller asked
/// for everything.
pub fn should_execute(selection: &UpdateSelection, reconciliation: &Reconciliation) -> bool {
    selection.is_all() || !reconciliation.selected.is_empty()
}

/// Posts the execute request. The iRMC must answer with a task location.
pub async fn trigger_online_update_execute(
    redfish: &dyn Redfish,
    url: &str,
    payload: &OnlineUpdateRequest,
) -> Result<String, RedfishError> {
    redfish
        .online_update(url, payload)
        .await?
        .ok_or_else(|| RedfishError::MissingTaskLocation {
            url: url.to_string(),
        })
}

/// Waits for an immediate execution to finish. Scheduled executions return at
/// once. Returns whether anything was waited for.
pub async fn await_execution(
    redfish: &dyn Redfish,
    variant: OemVariant,
    operation_time: OperationTime,
    location: Option<&str>,
) -> Result<bool, RedfishError> {
    if operation_time == OperationTime::Once {
        info!("Online update scheduled, not waiting for it");
        return Ok(false);
    }
    match location {
        Some(location) => {
            check_task_status(redfish, variant, location, DEFAULT_ONLINE_UPDATE_TIMEOUT).await?
        }
        None => sleep(EXECUTE_WITHOUT_TASK_DELAY).await,
    }
    Ok(true)
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use reqwest::StatusCode;
    use serde_json::json;
    use tokio::time::Instant;

    use super::*;
    use crate::collection::test::completed_task;
    use crate::model::online_update::ItemExecution;
    use crate::MockRedfish;

    const MODIFY: &str = "/redfish/v1/Systems/0/Oem/ts_fujitsu/eLCM/Actions/FTSeLCM.OnlineUpdateModifyCollection";
    const CHECK: &str = "/redfish/v1/Systems/0/Oem/ts_fujitsu/eLCM/Actions/FTSeLCM.OnlineUpdate";

    fn designations(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_deselect_each_in_order() {
        let seen = Arc::new(Mutex::new(vec![]));
        let recorder = seen.clone();
        let mut mock = MockRedfish::new();
        mock.expect_modify_online_update_collection()
            .times(2)
            .withf(|url, _| url == MODIFY)
            .returning(move |_, m| {
                let change = &m.update_collection_modifications[0];
                assert_eq!(change.execution, ItemExecution::Deselected);
                recorder.lock().unwrap().push(change.designation.clone());
                Ok(())
            });
        deselect_updates(&mock, MODIFY, &designations(&["Storage/B", "LanController/C"]))
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["Storage/B", "LanController/C"]);
    }

    #[tokio::test]
    async fn test_deselect_nothing() {
        let mut mock = MockRedfish::new();
        mock.expect_modify_online_update_collection().never();
        deselect_updates(&mock, MODIFY, &[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_deselect_stops_at_first_failure() {
        let mut mock = MockRedfish::new();
        mock.expect_modify_online_update_collection()
            .times(1)
            .returning(|url, _| {
                Err(RedfishError::UnexpectedStatus {
                    url: url.to_string(),
                    status_code: StatusCode::BAD_REQUEST,
                })
            });
        let err = deselect_updates(&mock, MODIFY, &designations(&["Storage/B", "Agent-Lx/D"]))
            .await
            .unwrap_err();
        match err {
            RedfishError::DeselectFailed { designation, source } => {
                assert_eq!(designation, "Storage/B");
                assert!(matches!(*source, RedfishError::UnexpectedStatus { .. }));
            }
            e => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn test_payload_immediately() {
        let (payload, warning) = build_execute_payload(OperationTime::Immediately, None).unwrap();
        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({"ExecutionMode": "ExecuteUpdate", "SchedulingType": "Immediately"})
        );
        assert!(warning.is_none());
    }

    #[test]
    fn test_payload_once_with_schedule() {
        let (payload, warning) =
            build_execute_payload(OperationTime::Once, Some("2026-11-01T02:00:00")).unwrap();
        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({
                "ExecutionMode": "ExecuteUpdate",
                "SchedulingType": "Once",
                "StartDate": "2026-11-01T02:00:00"
            })
        );
        assert!(warning.is_none());
    }

    #[test]
    fn test_payload_once_needs_schedule() {
        for schedule in [None, Some(""), Some("   ")] {
            assert!(matches!(
                build_execute_payload(OperationTime::Once, schedule),
                Err(RedfishError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_payload_immediately_drops_schedule() {
        let (payload, warning) =
            build_execute_payload(OperationTime::Immediately, Some("2026-11-01T02:00:00")).unwrap();
        assert!(payload.start_date.is_none());
        assert!(warning.unwrap().contains("ignored"));
    }

    #[test]
    fn test_should_execute() {
        let none_selected = Reconciliation {
            deselected: designations(&["Storage/B"]),
            ..Default::default()
        };
        let some_selected = Reconciliation {
            selected: designations(&["SystemBoard/A"]),
            deselected: designations(&["Storage/B"]),
            ..Default::default()
        };
        let explicit = UpdateSelection::Explicit(designations(&["Nope"]));
        assert!(should_execute(&UpdateSelection::All, &Reconciliation::default()));
        assert!(!should_execute(&explicit, &none_selected));
        assert!(should_execute(&explicit, &some_selected));
    }

    #[tokio::test]
    async fn test_trigger_execute_returns_location() {
        let mut mock = MockRedfish::new();
        mock.expect_online_update()
            .withf(|url, req| url == CHECK && req.execution_mode == ExecutionMode::ExecuteUpdate)
            .returning(|_, _| Ok(Some("/redfish/v1/TaskService/Tasks/4".to_string())));
        let (payload, _) = build_execute_payload(OperationTime::Immediately, None).unwrap();
        let location = trigger_online_update_execute(&mock, CHECK, &payload)
            .await
            .unwrap();
        assert_eq!(location, "/redfish/v1/TaskService/Tasks/4");
    }

    #[tokio::test]
    async fn test_trigger_execute_needs_location() {
        let mut mock = MockRedfish::new();
        mock.expect_online_update().returning(|_, _| Ok(None));
        let (payload, _) = build_execute_payload(OperationTime::Immediately, None).unwrap();
        let err = trigger_online_update_execute(&mock, CHECK, &payload)
            .await
            .unwrap_err();
        assert!(matches!(err, RedfishError::MissingTaskLocation { url } if url == CHECK));
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_scheduled_returns_at_once() {
        let mut mock = MockRedfish::new();
        mock.expect_get_task().never();
        let waited = await_execution(
            &mock,
            OemVariant::Fujitsu,
            OperationTime::Once,
            Some("/redfish/v1/TaskService/Tasks/4"),
        )
        .await
        .unwrap();
        assert!(!waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_immediate_polls_task() {
        let mut mock = MockRedfish::new();
        mock.expect_get_task()
            .withf(|location| location == "/redfish/v1/TaskService/Tasks/4")
            .times(1)
            .returning(|_| Ok(completed_task()));
        let waited = await_execution(
            &mock,
            OemVariant::Fsas,
            OperationTime::Immediately,
            Some("/redfish/v1/TaskService/Tasks/4"),
        )
        .await
        .unwrap();
        assert!(waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_immediate_without_task_sleeps() {
        let mock = MockRedfish::new();
        let start = Instant::now();
        await_execution(&mock, OemVariant::Fujitsu, OperationTime::Immediately, None)
            .await
            .unwrap();
        assert!(start.elapsed() >= EXECUTE_WITHOUT_TASK_DELAY);
    }
}
