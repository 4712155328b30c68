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
use std::fmt;

use serde::{Deserialize, Serialize};

/// https://redfish.dmtf.org/schemas/v1/Task.v1_7_1.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Task {
    #[serde(rename = "@odata.id")]
    pub odata_id: Option<String>,
    pub id: String,
    pub name: Option<String>,
    pub task_state: Option<TaskState>,
    pub task_status: Option<TaskStatus>,
    pub percent_complete: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub messages: Vec<TaskMessage>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskState {
    New,
    Starting,
    Running,
    Suspended,
    Interrupted,
    Pending,
    Stopping,
    Completed,
    Killed,
    Exception,
    Service,
    Cancelling,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Killed | TaskState::Exception | TaskState::Cancelled
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    OK,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskMessage {
    pub message_id: String,
    pub message: String,
    pub severity: Option<String>,
}

impl Task {
    /// None while the task is still running. Some(true) only for a
    /// completed task that did not report a critical status.
    pub fn outcome(&self) -> Option<bool> {
        let state = self.task_state?;
        if !state.is_terminal() {
            return None;
        }
        Some(state == TaskState::Completed && self.task_status != Some(TaskStatus::Critical))
    }

    /// Human readable summary used in failure diagnostics.
    pub fn summary(&self) -> String {
        let state = self
            .task_state
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        let messages = self
            .messages
            .iter()
            .map(|m| m.message.as_str())
            .filter(|m| !m.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        if messages.is_empty() {
            format!("task {} state {state}", self.id)
        } else {
            format!("task {} state {state}: {messages}", self.id)
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Task, TaskState, TaskStatus};

    #[test]
    fn test_task_parser() {
        let data = include_str!("testdata/task_completed.json");
        let task: Task = serde_json::from_str(data).unwrap();
        assert_eq!(task.id, "7");
        assert_eq!(task.task_state, Some(TaskState::Completed));
        assert_eq!(task.task_status, Some(TaskStatus::OK));
        assert_eq!(task.percent_complete, Some(100));
        assert_eq!(task.outcome(), Some(true));
    }

    #[test]
    fn test_task_outcome() {
        let mut task: Task =
            serde_json::from_str(r#"{"Id": "1", "TaskState": "Running"}"#).unwrap();
        assert_eq!(task.outcome(), None);

        task.task_state = Some(TaskState::Completed);
        task.task_status = Some(TaskStatus::Critical);
        assert_eq!(task.outcome(), Some(false));

        task.task_status = Some(TaskStatus::Warning);
        assert_eq!(task.outcome(), Some(true));

        task.task_state = Some(TaskState::Exception);
        assert_eq!(task.outcome(), Some(false));

        task.task_state = None;
        assert_eq!(task.outcome(), None);
    }

    #[test]
    fn test_task_summary() {
        let task: Task = serde_json::from_str(
            r#"{"Id": "4", "TaskState": "Exception", "Messages": [{"MessageId": "Base.1.0.GeneralError", "Message": "Download failed"}]}"#,
        )
        .unwrap();
        assert_eq!(task.summary(), "task 4 state Exception: Download failed");
    }
}
