//! Native code generation.
//!
//! The generator only builds IR; turning it into machine code is the job of
//! a `Backend`.

mod native;

pub use native::ObjectBackend;

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::BackendError;
use crate::ir::Module;

pub trait Backend {
    fn name(&self) -> &'static str;

    /// Produce the bytes of a relocatable object file for `module`.
    fn emit(&self, module: &Module) -> Result<Vec<u8>, BackendError>;

    fn emit_to_file(&self, module: &Module, path: &Path) -> Result<(), BackendError> {
        let bytes = self.emit(module)?;
        fs::write(path, &bytes)?;
        info!(
            backend = self.name(),
            bytes = bytes.len(),
            "wrote {}",
            path.display()
        );
        Ok(())
    }
}
