//! Scoped umask clearing.

use super::FileSystem;

/// Clears the process umask for as long as it is alive.
///
/// The umask is process-wide state. Hold the guard only while the driver's
/// registry lock is held so concurrent operations cannot interleave mask
/// changes.
#[must_use = "the umask is restored as soon as the guard is dropped"]
pub struct UmaskGuard<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    previous: u32,
}

impl<'a, F: FileSystem + ?Sized> UmaskGuard<'a, F> {
    /// Clear the umask, remembering the current value.
    pub fn clear(fs: &'a F) -> Self {
        let previous = fs.umask(0);
        Self { fs, previous }
    }

    /// The mask that will be restored.
    #[must_use]
    pub const fn previous(&self) -> u32 {
        self.previous
    }
}

impl<F: FileSystem + ?Sized> Drop for UmaskGuard<'_, F> {
    fn drop(&mut self) {
        self.fs.umask(self.previous);
    }
}
