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
use std::collections::HashSet;

use tracing::warn;

use crate::model::online_update::UpdateCollection;

/// Catch-all keyword: every update whose component is not a known category.
pub const OTHERS: &str = "Others";

/// Component categories the iRMC update repository knows about.
pub const KNOWN_COMPONENTS: [&str; 10] = [
    "Agent-Lx",
    "Agent-Win",
    "FibreChannelController",
    "LanController",
    "ManagementController",
    "PrimSupportPack-Win",
    "ScsiController",
    "Storage",
    "SystemBoard",
    OTHERS,
];

pub fn is_known_component(component: &str) -> bool {
    KNOWN_COMPONENTS.contains(&component)
}

/// Which updates of the collection the caller wants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UpdateSelection {
    /// Everything the iRMC offers. No update gets deselected.
    #[default]
    All,
    /// Non-blank, trimmed entries: designations (`Component/Name`), component
    /// categories or [`OTHERS`].
    Explicit(Vec<String>),
}

impl UpdateSelection {
    /// `None` and lists holding only blank entries select everything.
    pub fn from_list(list: Option<&[String]>) -> Self {
        let entries: Vec<String> = list
            .unwrap_or_default()
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();
        if entries.is_empty() {
            UpdateSelection::All
        } else {
            UpdateSelection::Explicit(entries)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, UpdateSelection::All)
    }
}

/// Designations split by whether they stay selected on the iRMC. Both lists
/// keep collection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub selected: Vec<String>,
    pub deselected: Vec<String>,
    /// Entries that are neither a designation, a known component nor `Others`.
    pub ignored: Vec<String>,
}

#[derive(Default)]
struct Requested<'a> {
    designations: HashSet<&'a str>,
    components: HashSet<&'a str>,
    others: bool,
    ignored: Vec<String>,
}

impl<'a> Requested<'a> {
    fn parse(entries: &'a [String]) -> Self {
        let mut requested = Requested::default();
        for entry in entries {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            if entry == OTHERS {
                requested.others = true;
            } else if entry.contains('/') {
                requested.designations.insert(entry);
            } else if is_known_component(entry) {
                requested.components.insert(entry);
            } else {
                warn!(
                    "Ignoring unrecognized update '{entry}'. It is not a known component type, \
                     a designation like 'Component/Name', or the keyword '{OTHERS}'."
                );
                requested.ignored.push(entry.to_string());
            }
        }
        requested
    }

    fn wants(&self, designation: &str, component: &str) -> bool {
        self.designations.contains(designation)
            || self.components.contains(component)
            || (self.others && !is_known_component(component))
    }
}

/// Splits the collection into what to keep selected and what to deselect.
pub fn reconcile(selection: &UpdateSelection, collection: &UpdateCollection) -> Reconciliation {
    let entries = match selection {
        UpdateSelection::All => {
            return Reconciliation {
                selected: collection
                    .items
                    .iter()
                    .map(|i| i.designation.clone())
                    .collect(),
                ..Default::default()
            }
        }
        UpdateSelection::Explicit(entries) => entries,
    };

    let requested = Requested::parse(entries);
    let mut out = Reconciliation::default();
    for item in &collection.items {
        if requested.wants(&item.designation, &item.component) {
            out.selected.push(item.designation.clone());
        } else {
            out.deselected.push(item.designation.clone());
        }
    }
    out.ignored = requested.ignored;
    out
}
