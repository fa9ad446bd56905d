//! Seam between the session controller and the document assembler.

use super::{AssembledAgreement, AssemblerError};

/// Trait for document generators.
pub trait Generator<Req> {
    /// Write a document for `request` to persistent storage.
    fn generate(&self, request: &Req) -> Result<AssembledAgreement, AssemblerError>;
}
