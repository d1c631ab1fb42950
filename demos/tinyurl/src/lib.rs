// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A TinyURL service modelled with DSim.
//!
//! A [`Generator`](dsim_components::generator::Generator) ramps up a load of
//! `create` and `get` calls into a queued front end. Each route makes one
//! call to a DB under a deadline.

pub mod config;
pub mod model;
