/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::message::Envelope;

/// Hook invoked when a message arrives on an input connection, before the
/// port handler sees it.
pub trait InputHook: Send + Sync {
    /// Called with every envelope received on the hooked connection.
    fn on_receive(&self, envelope: &Envelope);
}

/// Named hook registry.
///
/// Connection contexts carry hook *names* so they stay serializable across
/// nodes; the registry resolves those names to implementations when an
/// instance is bound to its transport.
#[derive(Default)]
pub struct HookRegistry {
    hooks: DashMap<String, Arc<dyn InputHook>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook under a name referenced by connection definitions.
    pub fn register(&self, name: impl Into<String>, hook: Arc<dyn InputHook>) {
        self.hooks.insert(name.into(), hook);
    }

    /// Looks up a hook by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn InputHook>> {
        self.hooks.get(name).map(|hook| hook.value().clone())
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.hooks.iter().map(|entry| entry.key().clone()).collect();
        f.debug_struct("HookRegistry").field("hooks", &names).finish()
    }
}
