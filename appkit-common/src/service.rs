//! Service objects: one-shot operations constructed per invocation
//!
//! A service is built from its arguments and immediately invoked through one
//! of two entry points:
//!
//! - [`call`]: perform the primary action and return its result
//! - [`save`]: perform a persistence-oriented action and return its result
//!
//! Implementors override whichever of [`ApplicationService::call`] /
//! [`ApplicationService::save`] they support. The provided defaults fail with
//! [`ServiceError::NotImplemented`] naming the concrete service and method.
//!
//! ```rust,ignore
//! struct Greet { name: String }
//!
//! impl ApplicationService for Greet {
//!     type Args = String;
//!     type Output = String;
//!
//!     fn new(name: String) -> Self { Self { name } }
//!
//!     fn call(self) -> ServiceResult<String> {
//!         Ok(format!("Hello, {}", self.name))
//!     }
//! }
//!
//! let greeting = service::call::<Greet>("Ada".to_string())?;
//! ```

use thiserror::Error;

/// Result type returned by service entry points
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Failures surfaced by services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Entry point not provided by the concrete service
    #[error("{service}#{method} not implemented")]
    NotImplemented {
        service: &'static str,
        method: &'static str,
    },

    /// Domain failure raised by a concrete service
    #[error(transparent)]
    Domain(#[from] anyhow::Error),
}

impl ServiceError {
    /// Wrap a domain-specific failure
    pub fn domain<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Domain(anyhow::Error::new(error))
    }

    /// Domain failure from a plain message
    pub fn domain_msg(message: impl std::fmt::Display) -> Self {
        Self::Domain(anyhow::anyhow!("{}", message))
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }
}

/// Base abstraction for service objects
pub trait ApplicationService: Sized {
    /// Construction arguments, fixed at the call site
    type Args;

    /// Value returned by `call` / `save`
    type Output;

    fn new(args: Self::Args) -> Self;

    fn call(self) -> ServiceResult<Self::Output> {
        Err(not_implemented::<Self>("call"))
    }

    fn save(self) -> ServiceResult<Self::Output> {
        Err(not_implemented::<Self>("save"))
    }

    /// Short name of the concrete type, used in error messages
    fn service_name() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Construct `S` from `args` and run its primary action
pub fn call<S: ApplicationService>(args: S::Args) -> ServiceResult<S::Output> {
    S::new(args).call()
}

/// Construct `S` from `args` and run its persistence action
pub fn save<S: ApplicationService>(args: S::Args) -> ServiceResult<S::Output> {
    S::new(args).save()
}

fn not_implemented<S: ApplicationService>(method: &'static str) -> ServiceError {
    ServiceError::NotImplemented {
        service: S::service_name(),
        method,
    }
}

/// `my_crate::services::Foo<Bar>` -> `Foo`
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
