// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Entry Point
//!
//! This test suite uses proptest to verify properties that must hold for
//! every valid claim: CIDR plans stay disjoint and contained, capacity
//! bounds survive compilation, and graphs are topologically sound.

mod property;
