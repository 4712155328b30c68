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

/* iRMC online update client
 * Runs the eLCM update check or the full update against one BMC.
 *
 * USAGE: ./client -H 10.153.145.103 -U TheBMCUsername -P TheBMCPassword -c check
 * -H: IP address of the BMC's Redfish API. Should be HTTPS on port 443.
 * Run with no params for help.
 * Run with `-v` for more output.
 */

use anyhow::{anyhow, Context};
use clap::ValueEnum;
use libelcm::{
    apply_online_updates, check_online_updates, Endpoint, OnlineUpdateConfig, OperationTime,
    RedfishClientPool, TargetLocks,
};
use tracing::{info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = getopts::Options::new();

    opts.optflag("h", "help", "Print this help");
    opts.optflag("v", "verbose", "Log at DEBUG level. Default is INFO");
    opts.optflag("k", "insecure", "Accept self-signed BMC certificates");
    opts.optopt(
        "H",
        "hostname",
        "Required. Hostname or IP address of BMC Redfish API",
        "HOST",
    );
    opts.optopt("p", "port", "BMC Redfish port", "PORT");
    opts.optopt("U", "username", "BMC username", "USER");
    opts.optopt("P", "password", "BMC password", "PASS");
    opts.optopt(
        "c",
        "cmd",
        "Command to run:
                check
                update",
        "CMD",
    );
    opts.optmulti(
        "u",
        "update",
        "Update to keep selected: a designation (Component/Name), a component \
         category or Others. Repeat for more. Default is all updates",
        "UPDATE",
    );
    opts.optopt(
        "t",
        "operation-time",
        "When to run the update: Immediately (default) or Once",
        "TIME",
    );
    opts.optopt("s", "schedule", "Start date for Once", "DATE");

    let args_given = opts.parse(&args[1..])?;
    if args_given.opt_present("h") || !args_given.opt_present("H") {
        eprintln!(
            "{}",
            opts.usage("client -H bmc_ip -U bmc_user -P bmc_pass -c check|update")
        );
        return Ok(());
    }

    let log_level = if args_given.opt_present("v") {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(log_level.into())
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("rustls=warn".parse()?);
    tracing_subscriber::registry()
        .with(Layer::default().compact())
        .with(env_filter)
        .init();

    let host = args_given
        .opt_str("H")
        .ok_or_else(|| anyhow!("-H is required"))?;
    let port = args_given
        .opt_str("p")
        .map(|p| p.parse::<u16>())
        .transpose()
        .context("Invalid port")?;
    let endpoint = Endpoint {
        host,
        port,
        user: args_given.opt_str("U"),
        password: args_given.opt_str("P"),
    };

    let updates = args_given.opt_strs("u");
    let mut config = OnlineUpdateConfig {
        update_list: if updates.is_empty() {
            None
        } else {
            Some(updates)
        },
        execute_online_upd_schedule_time: args_given.opt_str("s"),
        ..Default::default()
    };
    if let Some(t) = args_given.opt_str("t") {
        config.execute_online_upd_operation_time =
            OperationTime::from_str(&t, true).map_err(|e| anyhow!(e))?;
    }

    let mut builder = RedfishClientPool::builder();
    if !args_given.opt_present("k") {
        builder = builder.reject_invalid_certs();
    }
    let pool = builder.build()?;
    let locks = TargetLocks::new();
    let target = format!("{}:{}", endpoint.host, endpoint.port.unwrap_or(443));
    let redfish = pool.create_client(endpoint);

    let cmd = args_given.opt_str("c").unwrap_or_else(|| "check".to_string());
    match cmd.as_str() {
        "check" => {
            let _guard = locks.acquire(&target, "check_online_update").await;
            let check = check_online_updates(redfish.as_ref()).await?;
            info!(
                "{} update(s) available as of {}",
                check.update_collection.len(),
                check.last_status_change_date
            );
            println!("{}", serde_json::to_string_pretty(&check)?);
        }
        "update" => {
            config.validate()?;
            let _guard = locks.acquire(&target, "online_update").await;
            let outcome = apply_online_updates(redfish.as_ref(), &config).await?;
            for w in &outcome.warnings {
                warn!("{w}");
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        _ => {
            return Err(anyhow!("Unknown command '{cmd}'"));
        }
    }
    Ok(())
}
