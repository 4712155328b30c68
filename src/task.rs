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

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::model::task::Task;
use crate::oem::OemVariant;
use crate::{Redfish, RedfishError};

/// How long an online update check or execution task may run.
pub const DEFAULT_ONLINE_UPDATE_TIMEOUT: Duration = Duration::from_secs(6000);

/// Time between two task polls.
pub const TASK_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Polls the task at `location` until it reaches a terminal state. Returns
/// whether it completed successfully. Running past `timeout`, measured from
/// the first poll, is an error.
pub async fn wait_for_task_end(
    redfish: &dyn Redfish,
    location: &str,
    timeout: Duration,
) -> Result<bool, RedfishError> {
    let (succeeded, _task) = poll_task(redfish, location, timeout).await?;
    Ok(succeeded)
}

async fn poll_task(
    redfish: &dyn Redfish,
    location: &str,
    timeout: Duration,
) -> Result<(bool, Task), RedfishError> {
    let deadline = Instant::now() + timeout;
    loop {
        let task = redfish.get_task(location).await?;
        if let Some(succeeded) = task.outcome() {
            debug!("{} finished", task.summary());
            return Ok((succeeded, task));
        }
        debug!(
            "Task {location} is {} ({}%)",
            task.task_state
                .map(|s| s.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            task.percent_complete.unwrap_or_default()
        );
        if Instant::now() + TASK_POLL_INTERVAL > deadline {
            return Err(RedfishError::TaskTimeout {
                location: location.to_string(),
                timeout,
            });
        }
        sleep(TASK_POLL_INTERVAL).await;
    }
}

/// Waits for the task and turns anything but success into a `TaskFailed`
/// error carrying the task log. The log is fetched best-effort.
pub async fn check_task_status(
    redfish: &dyn Redfish,
    variant: OemVariant,
    location: &str,
    timeout: Duration,
) -> Result<(), RedfishError> {
    let details = match poll_task(redfish, location, timeout).await {
        Ok((true, _)) => {
            info!("Task {location} completed");
            return Ok(());
        }
        Ok((false, task)) => task.summary(),
        Err(e) => e.to_string(),
    };
    let log_url = variant.task_log_url(location);
    let task_log = match redfish.get_task_log(&log_url).await {
        Ok(log) => log,
        Err(e) => {
            warn!("Could not fetch task log from {log_url}: {e}");
            String::new()
        }
    };
    Err(RedfishError::TaskFailed {
        location: location.to_string(),
        details,
        task_log,
    })
}
