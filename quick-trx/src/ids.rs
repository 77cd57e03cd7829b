// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed UUIDs for the identifiers that appear in a TRX document.

use newtype_uuid::{TypedUuid, TypedUuidKind, TypedUuidTag};

macro_rules! uuid_kind {
    ($(#[$attr:meta])* $kind:ident, $alias:ident, $tag:literal) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $kind {}

        impl TypedUuidKind for $kind {
            fn tag() -> TypedUuidTag {
                const TAG: TypedUuidTag = TypedUuidTag::new($tag);
                TAG
            }
        }

        #[doc = concat!("A [`TypedUuid`] tagged with [`", stringify!($kind), "`].")]
        pub type $alias = TypedUuid<$kind>;
    };
}

uuid_kind!(
    /// Kind tag for the identifier of a whole test run (`TestRun/@id`).
    RunKind,
    RunUuid,
    "trx-run"
);

uuid_kind!(
    /// Kind tag for the per-run identifier of a single test execution.
    ///
    /// The same execution UUID ties together a result, its definition and its entry.
    ExecutionKind,
    ExecutionUuid,
    "trx-execution"
);

uuid_kind!(
    /// Kind tag for a test identifier. These are usually derived from a test name, so they are
    /// stable across runs.
    TestKind,
    TestUuid,
    "trx-test"
);

uuid_kind!(
    /// Kind tag for a test list identifier.
    TestListKind,
    TestListUuid,
    "trx-test-list"
);
