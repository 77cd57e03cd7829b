// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{errors::MetadataError, events::TestCaseRef};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, map::Entry};
use serde::Deserialize;
use tracing::debug;

/// Metadata declared on a test method.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestMetadata {
    /// The description, if one was declared.
    pub description: Option<String>,

    /// Custom `(key, value)` properties, in declaration order.
    pub properties: Vec<(String, String)>,

    /// Category labels, one per category declaration.
    pub categories: Vec<String>,

    /// The fully qualified runtime name of the declaring class.
    pub declaring_type: String,
}

/// Looks up metadata for tests.
///
/// Implementations may cache per binary. One provider is used for a single run.
pub trait MetadataProvider {
    /// Resolves metadata for `test`.
    fn resolve(&mut self, test: &TestCaseRef) -> Result<TestMetadata, MetadataError>;
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for &mut P {
    fn resolve(&mut self, test: &TestCaseRef) -> Result<TestMetadata, MetadataError> {
        (**self).resolve(test)
    }
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for Box<P> {
    fn resolve(&mut self, test: &TestCaseRef) -> Result<TestMetadata, MetadataError> {
        (**self).resolve(test)
    }
}

/// Splits a qualified name into `(class, method)` at the last `.`.
pub fn split_qualified_name(qualified_name: &str) -> Result<(&str, &str), MetadataError> {
    match qualified_name.rsplit_once('.') {
        Some((class_name, method_name)) if !class_name.is_empty() && !method_name.is_empty() => {
            Ok((class_name, method_name))
        }
        _ => Err(MetadataError::MalformedName {
            qualified_name: qualified_name.to_owned(),
        }),
    }
}

/// Loads the test metadata contained in a test binary.
pub trait BinaryLoader {
    /// Loads the binary at `source`.
    fn load(&self, source: &Utf8Path) -> Result<TestBinary, MetadataError>;
}

/// The test classes declared in a test binary.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TestBinary {
    /// The classes that declare tests.
    #[serde(default)]
    pub types: Vec<TypeMetadata>,
}

impl TestBinary {
    /// Finds a class by its dotted name.
    pub fn find_type(&self, class_name: &str) -> Option<&TypeMetadata> {
        self.types.iter().find(|ty| ty.name == class_name)
    }
}

/// A class that declares tests.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TypeMetadata {
    /// The dotted name, as it appears in qualified test names.
    pub name: String,

    /// The runtime name, if it differs from `name` (e.g. `Outer+Inner` for nested classes).
    #[serde(default)]
    pub full_name: Option<String>,

    /// Test methods.
    #[serde(default)]
    pub methods: Vec<MethodMetadata>,
}

impl TypeMetadata {
    /// Finds a method by name.
    pub fn find_method(&self, method_name: &str) -> Option<&MethodMetadata> {
        self.methods.iter().find(|method| method.name == method_name)
    }

    /// Returns the runtime name of the class.
    pub fn runtime_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.name)
    }
}

/// A test method and the metadata declared on it.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct MethodMetadata {
    /// The method name.
    pub name: String,

    /// The declared description.
    #[serde(default)]
    pub description: Option<String>,

    /// Custom property declarations.
    #[serde(default)]
    pub properties: Vec<PropertyDeclaration>,

    /// Category declarations. Each declaration may list several labels.
    #[serde(default)]
    pub categories: Vec<Vec<String>>,
}

/// A custom property declared on a test method.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct PropertyDeclaration {
    /// The key.
    pub key: String,

    /// The value.
    pub value: String,
}

/// A [`MetadataProvider`] that loads test binaries through a [`BinaryLoader`].
///
/// Each binary is loaded at most once; later lookups use the cached copy. A binary that fails to
/// load is not retried: later lookups return [`MetadataError::BinaryUnavailable`].
#[derive(Debug)]
pub struct BinaryMetadataProvider<L> {
    loader: L,
    // None for binaries that failed to load.
    binaries: IndexMap<Utf8PathBuf, Option<TestBinary>>,
}

impl<L: BinaryLoader> BinaryMetadataProvider<L> {
    /// Creates a new provider with an empty cache.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            binaries: IndexMap::new(),
        }
    }

    /// Returns the number of binaries loaded so far.
    pub fn loaded_count(&self) -> usize {
        self.binaries.values().filter(|binary| binary.is_some()).count()
    }

    fn binary(&mut self, source: &Utf8Path) -> Result<&TestBinary, MetadataError> {
        match self.binaries.entry(source.to_owned()) {
            Entry::Occupied(entry) => {
                entry
                    .into_mut()
                    .as_ref()
                    .ok_or_else(|| MetadataError::BinaryUnavailable {
                        path: source.to_owned(),
                    })
            }
            Entry::Vacant(entry) => {
                debug!(%source, "loading test binary metadata");
                match self.loader.load(source) {
                    Ok(binary) => Ok(entry.insert(None).insert(binary)),
                    Err(error) => {
                        entry.insert(None);
                        Err(error)
                    }
                }
            }
        }
    }
}

impl<L: BinaryLoader> MetadataProvider for BinaryMetadataProvider<L> {
    fn resolve(&mut self, test: &TestCaseRef) -> Result<TestMetadata, MetadataError> {
        let (class_name, method_name) = split_qualified_name(&test.qualified_name)?;
        let binary = self.binary(test.source())?;

        let ty = binary
            .find_type(class_name)
            .ok_or_else(|| MetadataError::TypeNotFound {
                class_name: class_name.to_owned(),
                source_path: test.source.clone(),
            })?;
        let method = ty
            .find_method(method_name)
            .ok_or_else(|| MetadataError::MethodNotFound {
                class_name: class_name.to_owned(),
                method_name: method_name.to_owned(),
                source_path: test.source.clone(),
            })?;

        Ok(TestMetadata {
            description: method.description.clone(),
            properties: method
                .properties
                .iter()
                .map(|p| (p.key.clone(), p.value.clone()))
                .collect(),
            // Only the first label of each declaration is reported.
            categories: method
                .categories
                .iter()
                .filter_map(|labels| labels.first().cloned())
                .collect(),
            declaring_type: ty.runtime_name().to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use test_case::test_case;

    #[test_case("Suite.ClassA.TestOne" => Some(("Suite.ClassA", "TestOne")); "nested namespace")]
    #[test_case("ClassA.TestOne" => Some(("ClassA", "TestOne")); "single level")]
    #[test_case("NoDots" => None; "no separator")]
    #[test_case(".TestOne" => None; "empty class")]
    #[test_case("Suite.ClassA." => None; "empty method")]
    fn split(qualified_name: &str) -> Option<(&str, &str)> {
        split_qualified_name(qualified_name).ok()
    }

    struct CountingLoader {
        loads: Cell<usize>,
    }

    impl BinaryLoader for CountingLoader {
        fn load(&self, source: &Utf8Path) -> Result<TestBinary, MetadataError> {
            self.loads.set(self.loads.get() + 1);
            if source.as_str() == "missing.dll" {
                return Err(MetadataError::LoadFailed {
                    path: source.to_owned(),
                    error: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            Ok(TestBinary {
                types: vec![TypeMetadata {
                    name: "Suite.Outer.Inner".to_owned(),
                    full_name: Some("Suite.Outer+Inner".to_owned()),
                    methods: vec![
                        MethodMetadata {
                            name: "TestOne".to_owned(),
                            description: Some("first test".to_owned()),
                            properties: vec![
                                PropertyDeclaration {
                                    key: "owner".to_owned(),
                                    value: "ci".to_owned(),
                                },
                                PropertyDeclaration {
                                    key: "owner".to_owned(),
                                    value: "qa".to_owned(),
                                },
                            ],
                            categories: vec![
                                vec!["Fast".to_owned(), "Ignored".to_owned()],
                                vec![],
                                vec!["Network".to_owned()],
                            ],
                        },
                        MethodMetadata {
                            name: "TestTwo".to_owned(),
                            ..Default::default()
                        },
                    ],
                }],
            })
        }
    }

    fn provider() -> BinaryMetadataProvider<CountingLoader> {
        BinaryMetadataProvider::new(CountingLoader {
            loads: Cell::new(0),
        })
    }

    #[test]
    fn resolves_declared_metadata() {
        let mut provider = provider();
        let metadata = provider
            .resolve(&TestCaseRef::new(
                "Suite.Outer.Inner.TestOne",
                "TestOne",
                "suite.dll",
            ))
            .expect("resolves");
        assert_eq!(
            metadata,
            TestMetadata {
                description: Some("first test".to_owned()),
                properties: vec![
                    ("owner".to_owned(), "ci".to_owned()),
                    ("owner".to_owned(), "qa".to_owned()),
                ],
                categories: vec!["Fast".to_owned(), "Network".to_owned()],
                declaring_type: "Suite.Outer+Inner".to_owned(),
            }
        );
    }

    #[test]
    fn binaries_are_loaded_once() {
        let mut provider = provider();
        for method in ["TestOne", "TestTwo", "TestOne"] {
            provider
                .resolve(&TestCaseRef::new(
                    format!("Suite.Outer.Inner.{method}"),
                    method,
                    "suite.dll",
                ))
                .expect("resolves");
        }
        assert_eq!(provider.loader.loads.get(), 1);
        assert_eq!(provider.loaded_count(), 1);
    }

    #[test]
    fn missing_pieces_are_errors() {
        let mut provider = provider();

        let error = provider
            .resolve(&TestCaseRef::new("Suite.Nope.TestOne", "TestOne", "suite.dll"))
            .expect_err("class is missing");
        assert!(
            matches!(&error, MetadataError::TypeNotFound { class_name, .. } if class_name == "Suite.Nope"),
            "{error:?}"
        );

        let error = provider
            .resolve(&TestCaseRef::new(
                "Suite.Outer.Inner.TestNine",
                "TestNine",
                "suite.dll",
            ))
            .expect_err("method is missing");
        assert!(
            matches!(&error, MetadataError::MethodNotFound { method_name, .. } if method_name == "TestNine"),
            "{error:?}"
        );

        let error = provider
            .resolve(&TestCaseRef::new("Suite.A.TestOne", "TestOne", "missing.dll"))
            .expect_err("binary is missing");
        assert!(matches!(error, MetadataError::LoadFailed { .. }), "{error:?}");

        let error = provider
            .resolve(&TestCaseRef::new("TestOne", "TestOne", "suite.dll"))
            .expect_err("name is malformed");
        assert!(
            matches!(error, MetadataError::MalformedName { .. }),
            "{error:?}"
        );
    }

    #[test]
    fn failed_loads_are_not_retried() {
        let mut provider = provider();
        let results: Vec<_> = (0..5)
            .map(|i| {
                provider.resolve(&TestCaseRef::new(
                    format!("Suite.A.Test{i}"),
                    format!("Test{i}"),
                    "missing.dll",
                ))
            })
            .collect();
        assert_eq!(provider.loader.loads.get(), 1);
        assert_eq!(provider.loaded_count(), 0);

        assert!(
            matches!(results[0], Err(MetadataError::LoadFailed { .. })),
            "{:?}",
            results[0]
        );
        for result in &results[1..] {
            assert!(
                matches!(result, Err(MetadataError::BinaryUnavailable { path }) if path.as_str() == "missing.dll"),
                "{result:?}"
            );
        }
    }
}
