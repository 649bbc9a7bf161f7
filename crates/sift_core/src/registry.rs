//! Ordered registry of detector factories.

use tracing::debug;

use crate::detector::Detector;

/// Builds a fresh detector instance.
pub type DetectorFactory = fn() -> Box<dyn Detector>;

/// Detector factories in registration order.
///
/// Issues are reported in this order, so the order is part of the output.
/// A new instance is built from each factory for every module scope.
#[derive(Default, Clone)]
pub struct DetectorRegistry {
    entries: Vec<(&'static str, DetectorFactory)>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a factory under the name of the detector it builds. A
    /// factory for an already registered name replaces it in place.
    pub fn register(&mut self, factory: DetectorFactory) {
        let name = factory().meta().name;
        debug!("Registering rule: {}", name);
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = factory,
            None => self.entries.push((name, factory)),
        }
    }

    pub fn with(mut self, factory: DetectorFactory) -> Self {
        self.register(factory);
        self
    }

    pub fn get(&self, name: &str) -> Option<DetectorFactory> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == name)
            .map(|(_, factory)| *factory)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Rule names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }

    /// Fresh instances of every detector, in registration order.
    pub fn instantiate(&self) -> Vec<Box<dyn Detector>> {
        self.entries.iter().map(|(_, factory)| factory()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("rules", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{DetectScope, DetectorMeta, IssueSink};
    use crate::issue::Severity;

    struct Named(DetectorMeta);

    impl Detector for Named {
        fn meta(&self) -> &DetectorMeta {
            &self.0
        }

        fn detect(&self, _scope: &DetectScope<'_>, _sink: &mut IssueSink) {}
    }

    fn first() -> Box<dyn Detector> {
        Box::new(Named(DetectorMeta::new("first", "aws_instance", "ami", Severity::Error)))
    }

    fn second() -> Box<dyn Detector> {
        Box::new(Named(DetectorMeta::new("second", "aws_instance", "ami", Severity::Warning)))
    }

    fn second_notice() -> Box<dyn Detector> {
        Box::new(Named(DetectorMeta::new("second", "aws_instance", "ami", Severity::Notice)))
    }

    #[test]
    fn test_registry_keeps_order() {
        let registry = DetectorRegistry::new().with(second).with(first);
        assert_eq!(registry.names(), vec!["second", "first"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("first"));
        assert!(!registry.contains("third"));
    }

    #[test]
    fn test_register_replaces_in_place() {
        let registry = DetectorRegistry::new()
            .with(first)
            .with(second)
            .with(second_notice);
        assert_eq!(registry.names(), vec!["first", "second"]);

        let factory = registry.get("second").unwrap();
        assert_eq!(factory().meta().severity, Severity::Notice);
    }

    #[test]
    fn test_instantiate_builds_fresh_instances() {
        let registry = DetectorRegistry::new().with(first).with(second);
        let detectors = registry.instantiate();
        assert_eq!(detectors.len(), 2);
        assert_eq!(detectors[0].meta().name, "first");
        assert!(DetectorRegistry::new().is_empty());
    }
}
