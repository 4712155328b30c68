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
use serde::Serialize;
use tracing::{info, warn};

use crate::collection::{fetch_update_collection, CACHED_READ, CACHED_READ_BEFORE_EXECUTE};
use crate::config::OnlineUpdateConfig;
use crate::execute::{
    await_execution, build_execute_payload, deselect_updates, should_execute,
    trigger_online_update_execute, NO_MATCHING_UPDATES,
};
use crate::license::check_elcm_license;
use crate::model::online_update::UpdateItem;
use crate::oem::{detect_variant, OemVariant, OnlineUpdateEndpoints};
use crate::selection::reconcile;
use crate::{Redfish, RedfishError};

/// Read-only view of the updates the iRMC offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnlineUpdateCheck {
    /// The OnlineUpdate action URL; identifies the target.
    pub id: String,
    pub last_status_change_date: String,
    pub update_collection: Vec<UpdateItem>,
}

/// What happened to the execute request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Execution {
    /// Nothing to run, or nothing matched.
    NotTriggered,
    /// Accepted with a schedule; the iRMC runs it later.
    Submitted { task_location: String },
    /// Ran immediately and its task completed.
    Completed { task_location: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnlineUpdateOutcome {
    pub id: String,
    pub selected: Vec<String>,
    pub deselected: Vec<String>,
    pub execution: Execution,
    pub warnings: Vec<String>,
}

async fn prepare(
    redfish: &dyn Redfish,
) -> Result<(OemVariant, OnlineUpdateEndpoints), RedfishError> {
    let variant = detect_variant(redfish).await?;
    let endpoints = variant.online_update_endpoints();
    check_elcm_license(redfish, &endpoints.license).await?;
    Ok((variant, endpoints))
}

/// Lists the available updates, running a new check only if the iRMC has no
/// recent result.
pub async fn check_online_updates(
    redfish: &dyn Redfish,
) -> Result<OnlineUpdateCheck, RedfishError> {
    info!("Online update check starts");
    let (variant, endpoints) = prepare(redfish).await?;
    let collection = fetch_update_collection(redfish, variant, &endpoints, CACHED_READ).await?;
    info!(
        "Online update check found {} update(s)",
        collection.items.len()
    );
    Ok(OnlineUpdateCheck {
        id: endpoints.check,
        last_status_change_date: collection.last_status_change_date,
        update_collection: collection.items,
    })
}

/// Brings the iRMC's update selection in line with `config` and runs it.
pub async fn apply_online_updates(
    redfish: &dyn Redfish,
    config: &OnlineUpdateConfig,
) -> Result<OnlineUpdateOutcome, RedfishError> {
    info!("Online update starts");
    config.validate()?;
    let (variant, endpoints) = prepare(redfish).await?;
    let collection =
        fetch_update_collection(redfish, variant, &endpoints, CACHED_READ_BEFORE_EXECUTE).await?;

    let mut outcome = OnlineUpdateOutcome {
        id: endpoints.check.clone(),
        selected: vec![],
        deselected: vec![],
        execution: Execution::NotTriggered,
        warnings: vec![],
    };
    if collection.items.is_empty() {
        info!("Online update check completed, but no updates are available for this system");
        return Ok(outcome);
    }

    let selection = config.selection();
    let reconciliation = reconcile(&selection, &collection);
    outcome.warnings.extend(
        reconciliation
            .ignored
            .iter()
            .map(|entry| format!("Ignored unrecognized update '{entry}'")),
    );

    deselect_updates(redfish, &endpoints.modify_collection, &reconciliation.deselected).await?;

    let operation_time = config.execute_online_upd_operation_time;
    let (payload, warning) = build_execute_payload(
        operation_time,
        config.execute_online_upd_schedule_time.as_deref(),
    )?;
    outcome.warnings.extend(warning);

    if should_execute(&selection, &reconciliation) {
        let task_location =
            trigger_online_update_execute(redfish, &endpoints.check, &payload).await?;
        info!("Online update {operation_time} accepted, task {task_location}");
        outcome.execution =
            if await_execution(redfish, variant, operation_time, Some(&task_location)).await? {
                Execution::Completed { task_location }
            } else {
                Execution::Submitted { task_location }
            };
    } else {
        warn!("{NO_MATCHING_UPDATES}");
        outcome.warnings.push(NO_MATCHING_UPDATES.to_string());
    }

    outcome.selected = reconciliation.selected;
    outcome.deselected = reconciliation.deselected;
    info!("Online update ends");
    Ok(outcome)
}
