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
use tracing::debug;

use crate::{Redfish, RedfishError};

/// License key that unlocks eLCM, and with it the online update API.
pub const ELCM_LICENSE: &str = "eLCM";

/// Fails unless the iRMC has an eLCM license installed. Checked once before
/// any online update call; nothing is retried.
pub async fn check_elcm_license(redfish: &dyn Redfish, url: &str) -> Result<(), RedfishError> {
    let licenses = redfish.get_licenses(url).await?;
    if licenses.contains(ELCM_LICENSE) {
        debug!("eLCM license present");
        Ok(())
    } else {
        Err(RedfishError::LicenseMissing {
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod test {
    use reqwest::StatusCode;

    use super::check_elcm_license;
    use crate::model::license::{LicenseKey, Licenses};
    use crate::{MockRedfish, RedfishError};

    const URL: &str = "/redfish/v1/Managers/iRMC/Oem/ts_fujitsu/iRMCConfiguration/Licenses";

    fn licenses(names: &[&str]) -> Licenses {
        Licenses {
            keys: names
                .iter()
                .map(|n| LicenseKey {
                    name: n.to_string(),
                    license_type: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_license_present() {
        let mut redfish = MockRedfish::new();
        redfish
            .expect_get_licenses()
            .withf(|url| url == URL)
            .times(1)
            .returning(|_| Ok(licenses(&["iRMC advanced Pack", "eLCM"])));
        assert!(check_elcm_license(&redfish, URL).await.is_ok());
    }

    #[tokio::test]
    async fn test_license_missing() {
        let mut redfish = MockRedfish::new();
        redfish
            .expect_get_licenses()
            .times(1)
            .returning(|_| Ok(licenses(&["iRMC advanced Pack"])));
        let err = check_elcm_license(&redfish, URL).await.unwrap_err();
        assert!(matches!(err, RedfishError::LicenseMissing { url } if url == URL));
    }

    #[tokio::test]
    async fn test_license_endpoint_error_is_fatal() {
        let mut redfish = MockRedfish::new();
        redfish.expect_get_licenses().times(1).returning(|url| {
            Err(RedfishError::HTTPErrorCode {
                url: url.to_string(),
                status_code: StatusCode::NOT_FOUND,
                response_body: String::new(),
            })
        });
        let err = check_elcm_license(&redfish, URL).await.unwrap_err();
        assert!(matches!(err, RedfishError::HTTPErrorCode { .. }));
    }
}
