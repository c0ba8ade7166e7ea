use thiserror::Error;

use crate::extract::RenderError;
use crate::graph::BuildError;
use crate::parser::ParseError;
use crate::wire::WireError;

/// Any error the crate can raise.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
