// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Named numeric properties of components.
//!
//! Each component describes its configurable values with a static table of
//! [`PropertySpec`]s, normally generated by the
//! [`Properties`](dsim_model_builder::Properties) derive. Configuration
//! tooling reads and writes them by name; a write that is out of bounds is
//! rejected and leaves the value unchanged.

use crate::sim_error;
use crate::types::SimResult;

/// The schema of one property.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropertySpec {
    pub name: &'static str,
    pub default: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub units: &'static str,

    /// The field holds a whole number, so fractional values are rejected.
    pub integer: bool,
}

impl PropertySpec {
    /// Check that `value` is valid for this property.
    pub fn check(&self, value: f64) -> SimResult {
        if value.is_nan() {
            return sim_error!(format!("{} cannot be NaN", self.name));
        }
        if self.integer && value.fract() != 0.0 {
            return sim_error!(format!("{} must be a whole number, got {value}", self.name));
        }
        if let Some(min) = self.min {
            if value < min {
                return sim_error!(format!("{} must be >= {min}, got {value}", self.name));
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return sim_error!(format!("{} must be <= {max}, got {value}", self.name));
            }
        }
        Ok(())
    }
}

/// Access to a component's properties by name.
pub trait Properties {
    /// The schema of every property, in declaration order.
    fn property_specs(&self) -> &'static [PropertySpec] {
        &[]
    }

    /// The current value of a property.
    fn property(&self, _name: &str) -> Option<f64> {
        None
    }

    /// Set a property, checking it against its bounds first.
    fn set_property(&mut self, name: &str, _value: f64) -> SimResult {
        sim_error!(format!("Unknown property: {name}"))
    }

    /// Find the schema of a property.
    fn property_spec(&self, name: &str) -> Option<&'static PropertySpec> {
        self.property_specs().iter().find(|spec| spec.name == name)
    }
}
