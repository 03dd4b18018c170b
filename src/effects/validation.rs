//! Authoring-time container validation.
//!
//! Configuration mistakes are reported here, when content is loaded or
//! edited. At runtime the builder treats the same mistakes as inert: an
//! entry with nothing to apply simply applies nothing.

use super::container::EffectContainer;
use super::definition::EffectClassId;
use super::EffectCatalog;

/// A configuration error in an authored container.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    /// The container has no entries.
    #[error("container `{container}` has no entries")]
    NoEntries { container: String },

    /// An entry has no target strategy. Only reported by [`validate_targeted`].
    #[error("entry {entry} of `{container}` has no target strategy")]
    MissingTargetStrategy { container: String, entry: usize },

    /// An entry lists no effect entries at all.
    #[error("entry {entry} of `{container}` has an empty effect list")]
    EmptyEffectList { container: String, entry: usize },

    /// An effect entry lists no classes.
    #[error("effect entry {effect} in entry {entry} of `{container}` lists no effect classes")]
    EmptyClassList { container: String, entry: usize, effect: usize },

    /// A listed class is not in the catalog.
    #[error("entry {entry} of `{container}` references unknown {class}")]
    UnknownEffectClass { container: String, entry: usize, class: EffectClassId },
}

/// Validate a container against the catalog.
///
/// Entries without a target strategy are legal (targets may be supplied by
/// the caller), so they are not reported. Use [`validate_targeted`] for
/// containers that must resolve their own targets.
pub fn validate_container(container: &EffectContainer, catalog: &EffectCatalog) -> Result<(), Vec<ContainerError>> {
    let mut errors = Vec::new();
    let name = || container.name.clone();

    if container.entries.is_empty() {
        errors.push(ContainerError::NoEntries { container: name() });
    }

    for (entry_index, entry) in container.entries.iter().enumerate() {
        if entry.effects.is_empty() {
            errors.push(ContainerError::EmptyEffectList {
                container: name(),
                entry: entry_index,
            });
        }

        for (effect_index, effects) in entry.effects.iter().enumerate() {
            if effects.classes.is_empty() {
                errors.push(ContainerError::EmptyClassList {
                    container: name(),
                    entry: entry_index,
                    effect: effect_index,
                });
            }
            for class in &effects.classes {
                if !catalog.contains(*class) {
                    errors.push(ContainerError::UnknownEffectClass {
                        container: name(),
                        entry: entry_index,
                        class: *class,
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Like [`validate_container`], but every entry must carry a target strategy.
pub fn validate_targeted(container: &EffectContainer, catalog: &EffectCatalog) -> Result<(), Vec<ContainerError>> {
    let mut errors = validate_container(container, catalog).err().unwrap_or_default();

    for (entry_index, entry) in container.entries.iter().enumerate() {
        if entry.target.is_none() {
            errors.push(ContainerError::MissingTargetStrategy {
                container: container.name.clone(),
                entry: entry_index,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{ContainerEntry, EffectDefinition, EffectEntry, TargetStrategy};

    fn catalog() -> EffectCatalog {
        let mut catalog = EffectCatalog::new();
        catalog.register(EffectDefinition::new(EffectClassId::new(1), "Bite"));
        catalog
    }

    #[test]
    fn test_valid_container() {
        let container = EffectContainer::new("Bite").with_entry(
            ContainerEntry::new(TargetStrategy::UseEventData)
                .with_effects(EffectEntry::new([EffectClassId::new(1)])),
        );
        assert!(validate_container(&container, &catalog()).is_ok());
        assert!(validate_targeted(&container, &catalog()).is_ok());
    }

    #[test]
    fn test_empty_container() {
        let errors = validate_container(&EffectContainer::new("Empty"), &catalog()).unwrap_err();
        assert_eq!(errors, vec![ContainerError::NoEntries { container: "Empty".into() }]);
    }

    #[test]
    fn test_reports_every_problem() {
        let container = EffectContainer::new("Broken")
            .with_entry(ContainerEntry::new(TargetStrategy::UseOwner))
            .with_entry(
                ContainerEntry::external()
                    .with_effects(EffectEntry::default())
                    .with_effects(EffectEntry::new([EffectClassId::new(7)])),
            );

        let errors = validate_container(&container, &catalog()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ContainerError::EmptyEffectList { container: "Broken".into(), entry: 0 }));
        assert!(errors.contains(&ContainerError::EmptyClassList { container: "Broken".into(), entry: 1, effect: 0 }));
        assert!(errors.contains(&ContainerError::UnknownEffectClass {
            container: "Broken".into(),
            entry: 1,
            class: EffectClassId::new(7),
        }));

        let targeted = validate_targeted(&container, &catalog()).unwrap_err();
        assert!(targeted.contains(&ContainerError::MissingTargetStrategy { container: "Broken".into(), entry: 1 }));
    }

    #[test]
    fn test_error_messages() {
        let error = ContainerError::UnknownEffectClass {
            container: "Bite".into(),
            entry: 0,
            class: EffectClassId::new(3),
        };
        assert_eq!(error.to_string(), "entry 0 of `Bite` references unknown Effect(3)");
    }
}
