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
use serde::{Deserialize, Serialize};

use crate::execute::start_date;
use crate::model::online_update::OperationTime;
use crate::selection::UpdateSelection;
use crate::RedfishError;

/// What the caller declares for an online update run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnlineUpdateConfig {
    /// Designations, component categories or `Others`. `None` applies every
    /// available update.
    pub update_list: Option<Vec<String>>,
    pub execute_online_upd_operation_time: OperationTime,
    /// Start date passed to the iRMC as is. Required for `Once`.
    pub execute_online_upd_schedule_time: Option<String>,
}

impl OnlineUpdateConfig {
    pub fn selection(&self) -> UpdateSelection {
        UpdateSelection::from_list(self.update_list.as_deref())
    }

    /// Rejects combinations the iRMC would refuse, before anything is sent.
    pub fn validate(&self) -> Result<(), RedfishError> {
        start_date(
            self.execute_online_upd_operation_time,
            self.execute_online_upd_schedule_time.as_deref(),
        )
        .map(|_| ())
    }
}
