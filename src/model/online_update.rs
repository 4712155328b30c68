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
use serde_with::{serde_as, DefaultOnNull};

/// `Status` value of a collection that the iRMC is still building.
pub const COLLECTION_IN_PROGRESS: &str = "InProgress";

/// Body of `<prefix>eLCM.OnlineUpdateGetCollection`. iRMC sends `null` for
/// fields it has not filled yet.
#[serde_as]
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UpdateCollectionResponse {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub status: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub last_status_change_date: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub update_collection: Vec<UpdateItem>,
}

impl UpdateCollectionResponse {
    pub fn is_in_progress(&self) -> bool {
        self.status == COLLECTION_IN_PROGRESS
    }
}

impl From<UpdateCollectionResponse> for UpdateCollection {
    fn from(resp: UpdateCollectionResponse) -> Self {
        UpdateCollection {
            last_status_change_date: resp.last_status_change_date,
            items: resp.update_collection,
        }
    }
}

/// Snapshot of the updates available for a system, as of
/// `last_status_change_date`. A new fetch replaces it entirely.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateCollection {
    pub last_status_change_date: String,
    #[serde(rename = "update_collection")]
    pub items: Vec<UpdateItem>,
}

/// One available firmware update. Everything except `downloaded` is an
/// opaque string reported by the iRMC.
#[serde_as]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "PascalCase"), default)]
pub struct UpdateItem {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub designation: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub component: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub sub_component: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(rename(deserialize = "Current"))]
    pub current_version: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(rename(deserialize = "New"))]
    pub new_version: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub severity: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub status: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(rename(deserialize = "Reboot"))]
    pub reboot_required: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub downloaded: bool,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(rename(deserialize = "Execution"))]
    pub execution_status: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(rename(deserialize = "RelNotePath"))]
    pub release_note_path: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExecutionMode {
    CheckForUpdate,
    ExecuteUpdate,
}

/// When an online update action runs. `Once` needs a start date.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum,
)]
pub enum OperationTime {
    #[default]
    Immediately,
    Once,
}

impl fmt::Display for OperationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Body of `<prefix>eLCM.OnlineUpdate`; the mode decides between a check
/// and an execution.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct OnlineUpdateRequest {
    pub execution_mode: ExecutionMode,
    pub scheduling_type: OperationTime,
    pub start_date: Option<String>,
}

impl OnlineUpdateRequest {
    pub fn check_for_update() -> Self {
        OnlineUpdateRequest {
            execution_mode: ExecutionMode::CheckForUpdate,
            scheduling_type: OperationTime::Immediately,
            start_date: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemExecution {
    Deselected,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateCollectionModification {
    pub designation: String,
    pub execution: ItemExecution,
}

/// Body of `<prefix>eLCM.OnlineUpdateModifyCollection`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateCollectionModifications {
    pub update_collection_modifications: Vec<UpdateCollectionModification>,
}

impl UpdateCollectionModifications {
    pub fn deselect(designation: &str) -> Self {
        UpdateCollectionModifications {
            update_collection_modifications: vec![UpdateCollectionModification {
                designation: designation.to_string(),
                execution: ItemExecution::Deselected,
            }],
        }
    }
}
