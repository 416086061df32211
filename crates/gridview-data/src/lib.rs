// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod faker;
pub mod fixtures;
pub mod json;

pub use faker::*;
pub use fixtures::*;
pub use json::*;
