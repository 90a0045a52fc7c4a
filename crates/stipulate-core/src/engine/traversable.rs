//! Traversable resolution
//!
//! Lets callers keep properties out of a validation, e.g. lazily loaded
//! associations that must not be read. A property that is not reachable is
//! neither read nor validated; a reachable property that is not cascadable is
//! validated but not cascaded into.
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::path::PropertyPath;
use crate::value::Bean;

/// Decides which bean properties a validation may visit
///
/// `path_to_bean` is the path from the root to `bean` (empty for the root
/// itself). An error aborts the validation call.
pub trait TraversableResolver: Send + Sync {
    fn is_reachable(
        &self,
        bean: &dyn Bean,
        property: &str,
        root_bean_type: &str,
        path_to_bean: &PropertyPath,
    ) -> anyhow::Result<bool>;

    fn is_cascadable(
        &self,
        bean: &dyn Bean,
        property: &str,
        root_bean_type: &str,
        path_to_bean: &PropertyPath,
    ) -> anyhow::Result<bool>;
}

/// Every property is reachable and cascadable
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTraversableResolver;

impl TraversableResolver for DefaultTraversableResolver {
    fn is_reachable(&self, _: &dyn Bean, _: &str, _: &str, _: &PropertyPath) -> anyhow::Result<bool> {
        Ok(true)
    }

    fn is_cascadable(&self, _: &dyn Bean, _: &str, _: &str, _: &PropertyPath) -> anyhow::Result<bool> {
        Ok(true)
    }
}

pub(crate) fn wrap_error(bean: &dyn Bean, property: &str) -> impl FnOnce(anyhow::Error) -> Error {
    let bean_type = bean.bean_type().to_string();
    let property = property.to_string();
    move |source| Error::TraversableResolver {
        bean_type,
        property,
        source,
    }
}
