use std::{io, path::Path};

use crate::{
    config::Tracepoint,
    error::{BoxError, LoadError},
};

/// Turns a probe binary on disk into live kernel objects.
///
/// The session only talks to the kernel through this trait, so it can be
/// driven by a fake in tests.
pub trait ProbeLoader {
    /// The parsed, not yet loaded, probe binary.
    type Spec;
    type Collection: Collection;

    /// Lifts whatever resource limit stands in the way of loading probes.
    fn relax_memlock(&self) -> io::Result<()>;

    fn load_spec(&self, path: &Path) -> Result<Self::Spec, LoadError>;

    fn instantiate(&self, spec: Self::Spec) -> Result<Self::Collection, LoadError>;
}

/// Programs and maps loaded from one probe binary.
///
/// Dropping the collection unloads it. Links handed out by
/// [`Collection::attach_tracepoint`] must be dropped first.
pub trait Collection {
    type Link;

    fn program_names(&self) -> Vec<String>;

    fn contains_program(&self, name: &str) -> bool {
        self.program_names().iter().any(|n| n == name)
    }

    fn attach_tracepoint(
        &mut self,
        program: &str,
        tracepoint: &Tracepoint,
    ) -> Result<Self::Link, BoxError>;
}
