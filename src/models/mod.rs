// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for the OpenStudio annotation demo.

pub mod annotation;
pub mod drawing;
pub mod frame_strip;
pub mod playhead;
pub mod session;
pub mod store;
pub mod studio;
pub mod track;
