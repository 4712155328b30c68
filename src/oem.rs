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

use tracing::debug;

use crate::{Redfish, RedfishError};

/// The two OEM namespaces iRMC firmware uses for the eLCM API. Firmware
/// branded Fujitsu uses `ts_fujitsu` / `FTS`, Fsas Technologies firmware
/// uses `Fsas` for both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OemVariant {
    Fujitsu,
    Fsas,
}

impl fmt::Display for OemVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Action targets of the eLCM online update API plus the license list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OnlineUpdateEndpoints {
    /// OnlineUpdate action, used for both check and execute.
    pub check: String,
    pub collection: String,
    pub modify_collection: String,
    pub license: String,
}

impl OemVariant {
    /// Key under `Oem` in resource bodies and URLs.
    pub fn namespace(self) -> &'static str {
        match self {
            OemVariant::Fujitsu => "ts_fujitsu",
            OemVariant::Fsas => "Fsas",
        }
    }

    /// Prefix of OEM action and type names.
    pub fn action_prefix(self) -> &'static str {
        match self {
            OemVariant::Fujitsu => "FTS",
            OemVariant::Fsas => "Fsas",
        }
    }

    pub fn online_update_endpoints(self) -> OnlineUpdateEndpoints {
        let ns = self.namespace();
        let prefix = self.action_prefix();
        let action = |name: &str| {
            format!("/redfish/v1/Systems/0/Oem/{ns}/eLCM/Actions/{prefix}eLCM.{name}")
        };
        OnlineUpdateEndpoints {
            check: action("OnlineUpdate"),
            collection: action("OnlineUpdateGetCollection"),
            modify_collection: action("OnlineUpdateModifyCollection"),
            license: format!("/redfish/v1/Managers/iRMC/Oem/{ns}/iRMCConfiguration/Licenses"),
        }
    }

    /// Where the iRMC keeps the log of a task it created.
    pub fn task_log_url(self, task_location: &str) -> String {
        format!(
            "{}/Oem/{}/TaskLog",
            task_location.trim_end_matches('/'),
            self.namespace()
        )
    }
}

/// Asks the service root which OEM namespace the target speaks. Anything that
/// is not an iRMC aborts the workflow.
pub async fn detect_variant(redfish: &dyn Redfish) -> Result<OemVariant, RedfishError> {
    let root = redfish.get_service_root().await?;
    let variant = root.oem_variant().ok_or_else(|| {
        RedfishError::UnsupportedVendor(
            root.vendor_string()
                .unwrap_or_else(|| "unknown".to_string()),
        )
    })?;
    debug!("Detected iRMC OEM variant {variant}");
    Ok(variant)
}
