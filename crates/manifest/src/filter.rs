//! Operation-kind and dispatch-name selection.

use dispatchgen_library::{DispatchDescriptor, OperationKind, Result};
use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Only(OperationKind),
}

impl KindFilter {
    pub fn matches(&self, kind: OperationKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Only(only) => *only == kind,
        }
    }
}

impl FromStr for KindFilter {
    type Err = dispatchgen_library::DispatchError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "all" => Ok(KindFilter::All),
            other => other.parse::<OperationKind>().map(KindFilter::Only),
        }
    }
}

/// Kind filter AND an exact-match name allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchFilter {
    kind: KindFilter,
    names: Option<BTreeSet<String>>,
}

impl DispatchFilter {
    /// `dispatch_names` is comma delimited; an empty list disables name filtering.
    pub fn parse(operation_kind: &str, dispatch_names: &str) -> Result<Self> {
        let kind: KindFilter = operation_kind.parse()?;
        let names: BTreeSet<String> = dispatch_names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self {
            kind,
            names: if names.is_empty() { None } else { Some(names) },
        })
    }

    pub fn kind(&self) -> KindFilter {
        self.kind
    }

    pub fn names(&self) -> Option<&BTreeSet<String>> {
        self.names.as_ref()
    }

    pub fn matches(&self, descriptor: &DispatchDescriptor) -> bool {
        self.kind.matches(descriptor.kind())
            && self
                .names
                .as_ref()
                .map_or(true, |names| names.contains(descriptor.name()))
    }
}
