// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the OpenStudio window.

pub mod canvas;
pub mod sidebar;
pub mod timeline;
pub mod toolbar;
