//! Optional features contributed by plugins.
//!
//! Every plugin is *installed*; the configured subset is *enabled*. Slug lookups use all
//! installed plugins so shifts keep working after their plugin is switched off, while new
//! shifts may only choose from enabled plugins.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::config::PluginConfig;
use crate::signup::method::SignupMethod;
use crate::signup::methods::{
    InstantConfirmationSignupMethod, NoSelfServiceSignupMethod, RequestConfirmSignupMethod,
};
use crate::signup::registry::{RegistryError, SignupMethodRegistry};

pub const BASE_SIGNUP_PLUGIN: &str = "basesignup";
pub const GUESTS_PLUGIN: &str = "guests";

/// Extension point implemented by optional features.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Answer to the signup-method registration broadcast.
    fn register_signup_methods(&self) -> Vec<Arc<dyn SignupMethod>> {
        Vec::new()
    }
}

/// Ships the built-in signup methods.
#[derive(Debug, Default)]
pub struct BaseSignupPlugin;

impl Plugin for BaseSignupPlugin {
    fn name(&self) -> &'static str {
        BASE_SIGNUP_PLUGIN
    }

    fn description(&self) -> &'static str {
        "Instant confirmation, request and confirm, and disposition-only signup."
    }

    fn register_signup_methods(&self) -> Vec<Arc<dyn SignupMethod>> {
        vec![
            Arc::new(InstantConfirmationSignupMethod),
            Arc::new(RequestConfirmSignupMethod),
            Arc::new(NoSelfServiceSignupMethod),
        ]
    }
}

/// Lets people without an account sign up with their contact details.
#[derive(Debug, Default)]
pub struct GuestsPlugin;

impl Plugin for GuestsPlugin {
    fn name(&self) -> &'static str {
        GUESTS_PLUGIN
    }

    fn description(&self) -> &'static str {
        "Allow guests without a user account to sign up for shifts."
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginSummary {
    pub name: &'static str,
    pub description: &'static str,
    pub enabled: bool,
}

/// Installed plugins plus the enabled subset, with the signup-method registries they yield.
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
    enabled: BTreeSet<&'static str>,
    installed_methods: SignupMethodRegistry,
    enabled_methods: SignupMethodRegistry,
}

impl PluginRegistry {
    /// Install `plugins` in order. `enabled = None` enables all of them.
    pub fn new(plugins: Vec<Box<dyn Plugin>>, enabled: Option<&BTreeSet<String>>) -> Self {
        let enabled: BTreeSet<&'static str> = plugins
            .iter()
            .map(|plugin| plugin.name())
            .filter(|name| enabled.map_or(true, |names| names.contains(*name)))
            .collect();

        let mut installed_methods = SignupMethodRegistry::new();
        let mut enabled_methods = SignupMethodRegistry::new();
        for plugin in &plugins {
            let methods = plugin.register_signup_methods();
            if enabled.contains(plugin.name()) {
                enabled_methods.extend(methods.iter().cloned());
            }
            installed_methods.extend(methods);
        }

        tracing::info!(
            installed = plugins.len(),
            enabled = enabled.len(),
            signup_methods = installed_methods.len(),
            "plugins loaded"
        );

        Self {
            plugins,
            enabled,
            installed_methods,
            enabled_methods,
        }
    }

    /// Every built-in plugin, filtered by the configured enabled set.
    pub fn builtin(config: &PluginConfig) -> Self {
        Self::new(
            vec![Box::new(BaseSignupPlugin), Box::new(GuestsPlugin)],
            config.enabled.as_ref(),
        )
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }

    pub fn installed_signup_methods(&self) -> &SignupMethodRegistry {
        &self.installed_methods
    }

    pub fn enabled_signup_methods(&self) -> &SignupMethodRegistry {
        &self.enabled_methods
    }

    /// Resolve the method stored on a shift, whether or not its plugin is enabled.
    pub fn signup_method(&self, slug: &str) -> Result<Arc<dyn SignupMethod>, RegistryError> {
        self.installed_methods.from_slug(slug)
    }

    pub fn summaries(&self) -> Vec<PluginSummary> {
        self.plugins
            .iter()
            .map(|plugin| PluginSummary {
                name: plugin.name(),
                description: plugin.description(),
                enabled: self.is_enabled(plugin.name()),
            })
            .collect()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::builtin(&PluginConfig::default())
    }
}
