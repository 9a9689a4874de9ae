//! Error taxonomy of the override core.
//!
//! None of these are fatal. Callers log them and carry on with whatever part
//! of the pipeline still works.

use fontswap_fonts::LoadError;
use thiserror::Error;

use crate::schema::InvokeError;

#[derive(Debug, Error)]
pub enum FontSwapError {
    /// A required member could not be located on a host type.
    #[error("no member for role {role} on {type_name}")]
    SchemaResolution {
        role: &'static str,
        type_name: String,
    },

    /// A resolved member failed when used.
    #[error("{role} failed")]
    Invocation {
        role: &'static str,
        #[source]
        source: InvokeError,
    },

    /// The replacement bundle could not be loaded.
    #[error(transparent)]
    AssetLoad(#[from] LoadError),
}

impl FontSwapError {
    pub(crate) fn invocation(role: &'static str, source: InvokeError) -> Self {
        FontSwapError::Invocation { role, source }
    }
}

pub type Result<T> = std::result::Result<T, FontSwapError>;
