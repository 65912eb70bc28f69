//! Process-scoped engine handle
//!
//! The native engine is process-global: it may be set up once and outlives any single
//! session (a host may destroy and re-create its activity, and with it the session,
//! several times). [`Engine`] is created once by the outermost entry point and handed to
//! every [`SessionController`](crate::session::SessionController) it creates, carrying the
//! sticky "already initialized" state explicitly instead of in a global.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::SessionError;
use crate::vm::VmHandle;

pub struct Engine<V: VmHandle> {
    vm: Arc<V>,
    /// Sticky: set after the first successful native setup, never cleared
    initialized: Mutex<bool>,
}

impl<V: VmHandle> Engine<V> {
    pub fn new(vm: V) -> Arc<Self> {
        Self::from_arc(Arc::new(vm))
    }

    pub fn from_arc(vm: Arc<V>) -> Arc<Self> {
        Arc::new(Self {
            vm,
            initialized: Mutex::new(false),
        })
    }

    /// The shared VM handle
    pub fn vm(&self) -> &Arc<V> {
        &self.vm
    }

    pub fn is_initialized(&self) -> bool {
        *self.initialized.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run native setup exactly once per process.
    ///
    /// Returns `Ok(true)` if this call performed the setup, `Ok(false)` if an earlier call
    /// already did. A native failure leaves the flag clear so a later call may retry.
    pub fn initialize_once(
        &self,
        storage_path: &Path,
        platform_version: i32,
    ) -> Result<bool, SessionError> {
        let mut initialized = self.initialized.lock().unwrap_or_else(|e| e.into_inner());
        if *initialized {
            tracing::debug!("Engine already initialized, skipping native setup");
            return Ok(false);
        }

        tracing::info!(
            "Initializing native engine (storage: {}, platform version: {})",
            storage_path.display(),
            platform_version
        );
        if !self.vm.initialize(storage_path, platform_version) {
            tracing::error!("Native engine initialization failed");
            return Err(SessionError::InitializeFailed);
        }

        *initialized = true;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestVm, VmCall};

    #[test]
    fn test_initialize_once_calls_native_once() {
        let engine = Engine::new(TestVm::new());
        let path = Path::new("/tmp/storage");

        assert_eq!(engine.initialize_once(path, 33), Ok(true));
        assert_eq!(engine.initialize_once(path, 33), Ok(false));
        assert!(engine.is_initialized());
        assert_eq!(engine.vm().count(|c| matches!(c, VmCall::Initialize { .. })), 1);
    }

    #[test]
    fn test_initialize_failure_is_not_sticky() {
        let vm = TestVm::new();
        vm.set_initialize_result(false);
        let engine = Engine::new(vm);
        let path = Path::new("/tmp/storage");

        assert_eq!(
            engine.initialize_once(path, 33),
            Err(SessionError::InitializeFailed)
        );
        assert!(!engine.is_initialized());

        engine.vm().set_initialize_result(true);
        assert_eq!(engine.initialize_once(path, 33), Ok(true));
        assert_eq!(engine.vm().count(|c| matches!(c, VmCall::Initialize { .. })), 2);
    }
}
