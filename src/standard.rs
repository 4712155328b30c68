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

use reqwest::{Method, StatusCode};

use crate::model::license::Licenses;
use crate::model::online_update::{
    OnlineUpdateRequest, UpdateCollectionModifications, UpdateCollectionResponse,
};
use crate::model::service_root::ServiceRoot;
use crate::model::task::Task;
use crate::network::RedfishHttpClient;
use crate::{Redfish, RedfishError};

// iRMC answers actions with any of these, depending on firmware and on
// whether it created a task.
const ACTION_ACCEPTED: [StatusCode; 4] = [
    StatusCode::OK,
    StatusCode::CREATED,
    StatusCode::ACCEPTED,
    StatusCode::NO_CONTENT,
];
const MODIFY_ACCEPTED: [StatusCode; 2] = [StatusCode::OK, StatusCode::NO_CONTENT];

// Task logs of a long update run can be large.
const TASK_LOG_TIMEOUT: Duration = Duration::from_secs(60);

/// The calls that use plain Redfish plus the iRMC eLCM OEM actions.
pub struct RedfishStandard {
    pub client: RedfishHttpClient,
}

impl RedfishStandard {
    pub fn new(client: RedfishHttpClient) -> Self {
        Self { client }
    }

    fn expect_status(
        &self,
        url: &str,
        status_code: StatusCode,
        accepted: &[StatusCode],
    ) -> Result<(), RedfishError> {
        if accepted.contains(&status_code) {
            Ok(())
        } else {
            Err(RedfishError::UnexpectedStatus {
                url: self.client.url(url),
                status_code,
            })
        }
    }
}

#[async_trait::async_trait]
impl Redfish for RedfishStandard {
    async fn get_service_root(&self) -> Result<ServiceRoot, RedfishError> {
        let (_status_code, body) = self.client.get("").await?;
        Ok(body)
    }

    async fn get_licenses(&self, url: &str) -> Result<Licenses, RedfishError> {
        let (status_code, body) = self.client.get(url).await?;
        self.expect_status(url, status_code, &[StatusCode::OK])?;
        Ok(body)
    }

    async fn online_update(
        &self,
        url: &str,
        request: &OnlineUpdateRequest,
    ) -> Result<Option<String>, RedfishError> {
        let (status_code, _body, location): (_, Option<serde_json::Value>, _) =
            self.client.post(url, request).await?;
        self.expect_status(url, status_code, &ACTION_ACCEPTED)?;
        Ok(location)
    }

    async fn get_online_update_collection(
        &self,
        url: &str,
    ) -> Result<UpdateCollectionResponse, RedfishError> {
        let empty = serde_json::Map::new();
        let (status_code, body, _location) = self.client.post(url, &empty).await?;
        self.expect_status(url, status_code, &[StatusCode::OK])?;
        body.ok_or(RedfishError::NoContent)
    }

    async fn modify_online_update_collection(
        &self,
        url: &str,
        modifications: &UpdateCollectionModifications,
    ) -> Result<(), RedfishError> {
        let (status_code, _body, _location): (_, Option<serde_json::Value>, _) =
            self.client.post(url, modifications).await?;
        self.expect_status(url, status_code, &MODIFY_ACCEPTED)
    }

    async fn get_task(&self, location: &str) -> Result<Task, RedfishError> {
        let (_status_code, body) = self.client.get(location).await?;
        Ok(body)
    }

    async fn get_task_log(&self, url: &str) -> Result<String, RedfishError> {
        let (_status_code, body, _headers) = self
            .client
            .req_text::<String>(Method::GET, url, None, Some(TASK_LOG_TIMEOUT))
            .await?;
        Ok(body)
    }
}

#[cfg(test)]
mod test {
    use reqwest::StatusCode;

    use super::{RedfishStandard, ACTION_ACCEPTED};
    use crate::network::RedfishHttpClient;
    use crate::{Endpoint, RedfishError};

    #[test]
    fn test_expect_status() {
        let s = RedfishStandard::new(RedfishHttpClient::new(
            reqwest::Client::new(),
            Endpoint {
                host: "irmc".to_string(),
                ..Default::default()
            },
        ));
        let path = "/redfish/v1/Systems/0/Oem/ts_fujitsu/eLCM/Actions/FTSeLCM.OnlineUpdate";
        for code in ACTION_ACCEPTED {
            assert!(s.expect_status(path, code, &ACTION_ACCEPTED).is_ok());
        }
        let err = s
            .expect_status(path, StatusCode::PARTIAL_CONTENT, &ACTION_ACCEPTED)
            .unwrap_err();
        match err {
            RedfishError::UnexpectedStatus { url, status_code } => {
                assert_eq!(url, format!("https://irmc{path}"));
                assert_eq!(status_code, StatusCode::PARTIAL_CONTENT);
            }
            e => panic!("unexpected error {e}"),
        }
    }
}
