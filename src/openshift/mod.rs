// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod context_policy;
mod error;
pub mod field_selectors;
pub mod pager;
pub mod policy;
pub mod resolver;
pub mod resources;

pub use context_policy::{ContextPolicy, DEFAULT_ALLOWED_CONTEXT};
pub use error::{OpenShiftError, ResolveError};
pub use resolver::{ClientResolver, ResolvedClient};
