use std::io;

use http::Method;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FakeError {
    #[error("no recorded request matches {method} {path}")]
    NotFound { method: Method, path: String },

    #[error("failed to start service {name}: {source}")]
    Bind {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("fake services need a running tokio runtime")]
    NoRuntime,

    #[error("service layer is already shut down")]
    ShutDown,

    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },
}

impl FakeError {
    pub fn not_found<S: ToString>(method: &Method, path: S) -> Self {
        Self::NotFound { method: method.clone(), path: path.to_string() }
    }

    pub fn bind<S: ToString>(name: S, source: io::Error) -> Self {
        Self::Bind { name: name.to_string(), source }
    }

    pub fn invalid_query<S: ToString>(reason: S) -> Self {
        Self::InvalidQuery { reason: reason.to_string() }
    }
}
