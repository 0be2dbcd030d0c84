//! # Emitter Registry
//!
//! Maps format identifiers to emitter factories. The orchestrator resolves
//! the requested format here before reading any input, so a typo in
//! `--format` fails immediately.

use std::collections::BTreeMap;

use glean_core::ConfigurationError;

use crate::emitter::Emitter;
use crate::kotlin::KotlinEmitter;
use crate::markdown::MarkdownEmitter;
use crate::swift::SwiftEmitter;

/// Builds a fresh emitter.
pub type EmitterFactory = fn() -> Box<dyn Emitter>;

/// Format identifier → factory.
#[derive(Clone)]
pub struct EmitterRegistry {
    factories: BTreeMap<&'static str, EmitterFactory>,
}

impl std::fmt::Debug for EmitterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmitterRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

impl Default for EmitterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl EmitterRegistry {
    /// A registry with no formats.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// The built-in formats: `kotlin`, `markdown`, `swift`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("kotlin", || Box::new(KotlinEmitter));
        registry.register("markdown", || Box::new(MarkdownEmitter));
        registry.register("swift", || Box::new(SwiftEmitter));
        registry
    }

    /// Add or replace a format.
    pub fn register(&mut self, format: &'static str, factory: EmitterFactory) {
        self.factories.insert(format, factory);
    }

    /// Instantiate the emitter for `format`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownFormat`] listing the registered
    /// formats if `format` is not one of them.
    pub fn create(&self, format: &str) -> Result<Box<dyn Emitter>, ConfigurationError> {
        self.factories
            .get(format)
            .map(|factory| factory())
            .ok_or_else(|| ConfigurationError::UnknownFormat {
                format: format.to_string(),
                available: self.formats().join(", "),
            })
    }

    /// Registered formats, sorted.
    pub fn formats(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_registered() {
        let registry = EmitterRegistry::with_defaults();
        assert_eq!(registry.formats(), vec!["kotlin", "markdown", "swift"]);
        for format in registry.formats() {
            assert_eq!(registry.create(format).unwrap().format(), format);
        }
    }

    #[test]
    fn unknown_format_lists_available() {
        let Err(err) = EmitterRegistry::with_defaults().create("cobol") else {
            panic!("expected an error for unknown format");
        };
        assert_eq!(
            err,
            ConfigurationError::UnknownFormat {
                format: "cobol".into(),
                available: "kotlin, markdown, swift".into(),
            }
        );
        assert!(err.to_string().contains("cobol"));
    }

    #[test]
    fn empty_registry_has_no_formats() {
        assert!(EmitterRegistry::empty().create("kotlin").is_err());
    }
}
