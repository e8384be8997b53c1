// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Each submodule covers one pipeline stage.

mod capacity_bounds;
mod cidr_allocation;
mod graph_soundness;
