// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod debounce;
pub mod ids;
pub mod model;
pub mod perf;
pub mod pipeline;
pub mod state;
pub mod viewport;

pub use debounce::*;
pub use ids::*;
pub use model::*;
pub use perf::*;
pub use pipeline::*;
pub use state::*;
pub use viewport::*;
