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

//! Online Update (eLCM) orchestration for Fujitsu / Fsas iRMC BMCs.
//!
//! The iRMC keeps a collection of firmware updates it found on the update
//! repository. This crate asks it to refresh that collection (or reuses a
//! recent one), narrows it down to what the caller asked for, and triggers the
//! update execution, waiting for the resulting Redfish task when it runs
//! immediately.

pub mod model;
use model::license::Licenses;
use model::online_update::{
    OnlineUpdateRequest, UpdateCollectionModifications, UpdateCollectionResponse,
};
pub use model::online_update::{OperationTime, UpdateCollection, UpdateItem};
use model::service_root::ServiceRoot;
use model::task::Task;

pub mod collection;
pub mod config;
mod error;
pub mod execute;
pub mod license;
pub mod lock;
mod network;
pub mod oem;
pub mod online_update;
pub mod selection;
mod standard;
pub mod task;

pub use config::OnlineUpdateConfig;
pub use error::RedfishError;
pub use lock::{TargetGuard, TargetLocks};
pub use network::{Endpoint, RedfishClientPool, RedfishClientPoolBuilder, REDFISH_ENDPOINT};
pub use oem::{OemVariant, OnlineUpdateEndpoints};
pub use online_update::{
    apply_online_updates, check_online_updates, Execution, OnlineUpdateCheck,
    OnlineUpdateOutcome,
};
pub use selection::UpdateSelection;

/// The iRMC calls the online update workflows need. All calls will include
/// one HTTP network call.
///
/// URLs are either absolute paths (`/redfish/v1/...`, as returned by
/// [`OnlineUpdateEndpoints`] and task `Location` headers) or relative to the
/// Redfish root.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait::async_trait]
pub trait Redfish: Send + Sync + 'static {
    /// Returns info about operations that the service supports.
    async fn get_service_root(&self) -> Result<ServiceRoot, RedfishError>;

    /// License keys installed on the iRMC. Anything but 200 is an error.
    async fn get_licenses(&self, url: &str) -> Result<Licenses, RedfishError>;

    /// Posts to the OnlineUpdate action. Returns the task location, if the
    /// iRMC gave one.
    async fn online_update(
        &self,
        url: &str,
        request: &OnlineUpdateRequest,
    ) -> Result<Option<String>, RedfishError>;

    /// Current update collection snapshot, possibly still in progress.
    async fn get_online_update_collection(
        &self,
        url: &str,
    ) -> Result<UpdateCollectionResponse, RedfishError>;

    /// Changes the execution flag of items in the update collection.
    async fn modify_online_update_collection(
        &self,
        url: &str,
        modifications: &UpdateCollectionModifications,
    ) -> Result<(), RedfishError>;

    // Get information about a task by its location
    async fn get_task(&self, location: &str) -> Result<Task, RedfishError>;

    // Raw task log, used for diagnostics only
    async fn get_task_log(&self, url: &str) -> Result<String, RedfishError>;
}
