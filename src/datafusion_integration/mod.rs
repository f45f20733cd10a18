// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! DataFusion integration for ocsql
//!
//! Every OpenShift kind is registered as a TableProvider, so queries get full
//! SQL support including JOINs, aggregations, and subqueries.

mod context;
mod convert;
mod provider;

pub use context::OcSessionContext;
