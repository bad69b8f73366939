use std::sync::Arc;

use super::method::SignupMethod;

/// Lookup failure for signup methods.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("signup method '{0}' was not found")]
    UnknownMethod(String),
}

/// Ordered collection of every registered signup method.
///
/// Registrations are kept as collected, duplicates included. A slug lookup returns the most
/// recently registered method with that slug.
#[derive(Clone, Default)]
pub struct SignupMethodRegistry {
    methods: Vec<Arc<dyn SignupMethod>>,
}

impl SignupMethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, method: Arc<dyn SignupMethod>) {
        tracing::debug!(slug = method.slug(), "registered signup method");
        self.methods.push(method);
    }

    pub fn extend(&mut self, methods: impl IntoIterator<Item = Arc<dyn SignupMethod>>) {
        for method in methods {
            self.register(method);
        }
    }

    pub fn methods(&self) -> &[Arc<dyn SignupMethod>] {
        &self.methods
    }

    pub fn slugs(&self) -> Vec<&'static str> {
        self.methods.iter().map(|method| method.slug()).collect()
    }

    pub fn from_slug(&self, slug: &str) -> Result<Arc<dyn SignupMethod>, RegistryError> {
        self.methods
            .iter()
            .rev()
            .find(|method| method.slug() == slug)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownMethod(slug.to_string()))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl std::fmt::Debug for SignupMethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupMethodRegistry")
            .field("methods", &self.slugs())
            .finish()
    }
}
