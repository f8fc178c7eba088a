//! Copyright © 2025 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Liu.
//! The Liu project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde_json::Value;

thread_local! {
    static LOG_CONTEXT: RefCell<BTreeMap<String, Value>> = RefCell::new(BTreeMap::new());
}

/// Per-thread key/values merged into every log line, such as the job run id.
#[derive(Debug, Default)]
pub struct LiuLogContext;

impl LiuLogContext {
    /// Add or update contextual key/value pairs.
    pub fn put<I, K, V>(pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        LOG_CONTEXT.with(|ctx| {
            let mut map = ctx.borrow_mut();
            for (k, v) in pairs {
                map.insert(k.into(), v.into());
            }
        });
    }

    pub fn remove(key: &str) {
        LOG_CONTEXT.with(|ctx| {
            ctx.borrow_mut().remove(key);
        });
    }

    /// Snapshot of the current context.
    pub fn get() -> BTreeMap<String, Value> {
        LOG_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    pub fn clear() {
        LOG_CONTEXT.with(|ctx| ctx.borrow_mut().clear());
    }

    /// Sets pairs for the lifetime of the returned guard, restoring the
    /// previous values when it drops.
    pub fn scoped<I, K, V>(pairs: I) -> LiuLogContextGuard
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let previous = Self::get();
        Self::put(pairs);
        LiuLogContextGuard { previous }
    }
}

#[derive(Debug)]
#[must_use = "the context is restored when the guard drops"]
pub struct LiuLogContextGuard {
    previous: BTreeMap<String, Value>,
}

impl Drop for LiuLogContextGuard {
    fn drop(&mut self) {
        let previous = std::mem::take(&mut self.previous);
        LOG_CONTEXT.with(|ctx| *ctx.borrow_mut() = previous);
    }
}
