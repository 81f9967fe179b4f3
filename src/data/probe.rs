use std::path::Path;

// ---------------------------------------------------------------------------
// Existence probe – the pipeline's only filesystem dependency besides I/O
// ---------------------------------------------------------------------------

/// Answers whether a filesystem entry exists at a path.  The annotation
/// pass takes this as a capability instead of touching the filesystem
/// directly, so tests can run against a fixed set of "existing" paths.
pub trait ExistenceProbe {
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl ExistenceProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Closures stand in as probes, which keeps test setups to one line.
impl<F> ExistenceProbe for F
where
    F: Fn(&Path) -> bool,
{
    fn exists(&self, path: &Path) -> bool {
        self(path)
    }
}
