//! Initial-condition profiles.
//!
//! Profiles are evaluated at interior cell centers once, when a
//! [`Simulation`][crate::simulation::Simulation] is created. Variables without
//! an entry start at zero.

use std::{ collections::HashMap, f64::consts::PI };
use ndarray as nd;
use serde::{ Deserialize, Serialize };
use crate::{
    domain::Domain,
    error::ConfigError,
};

/// Named profile generator for the interior values of a single variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialCondition {
    /// Same value everywhere.
    Constant(f64),
    /// `offset + amplitude exp(-((x - center) / width)²)`.
    Gaussian {
        center: f64,
        width: f64,
        amplitude: f64,
        #[serde(default)]
        offset: f64,
    },
    /// `left` for `x < location`, `right` otherwise.
    Step { location: f64, left: f64, right: f64 },
    /// `left` up to `start`, `right` from `end`, and linear in between.
    Rarefaction { start: f64, end: f64, left: f64, right: f64 },
    /// `offset + amplitude sin(2π x / wavelength)`.
    Sine {
        amplitude: f64,
        wavelength: f64,
        #[serde(default)]
        offset: f64,
    },
    /// Explicit interior values, one per cell.
    Values(Vec<f64>),
}

impl InitialCondition {
    /// Gaussian bump on a zero background.
    pub fn gaussian(center: f64, width: f64, amplitude: f64) -> Self {
        Self::Gaussian { center, width, amplitude, offset: 0.0 }
    }

    /// Linear ramp between two plateaus.
    pub fn rarefaction(start: f64, end: f64, left: f64, right: f64) -> Self {
        Self::Rarefaction { start, end, left, right }
    }

    /// Evaluate the profile at the given interior coordinates.
    pub fn sample<S>(&self, x: &crate::Arr1<S>) -> nd::Array1<f64>
    where S: nd::Data<Elem = f64>
    {
        match self {
            Self::Constant(c) => nd::Array1::from_elem(x.len(), *c),
            Self::Gaussian { center, width, amplitude, offset } => {
                x.mapv(|xk| {
                    offset + amplitude * (-((xk - center) / width).powi(2)).exp()
                })
            },
            Self::Step { location, left, right } => {
                x.mapv(|xk| if xk < *location { *left } else { *right })
            },
            Self::Rarefaction { start, end, left, right } => {
                x.mapv(|xk| {
                    if xk <= *start {
                        *left
                    } else if xk >= *end {
                        *right
                    } else {
                        left + (right - left) * (xk - start) / (end - start)
                    }
                })
            },
            Self::Sine { amplitude, wavelength, offset } => {
                x.mapv(|xk| offset + amplitude * (2.0 * PI * xk / wavelength).sin())
            },
            Self::Values(v) => nd::Array1::from(v.clone()),
        }
    }
}

/// Mapping from variable name to initial profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InitialConditions {
    entries: HashMap<String, InitialCondition>,
}

impl InitialConditions {
    pub fn new() -> Self { Self::default() }

    /// Assign a profile to `var`, replacing any previous one.
    pub fn set(mut self, var: &str, ic: InitialCondition) -> Self {
        self.entries.insert(var.to_string(), ic);
        self
    }

    /// Look up the profile assigned to `var`.
    pub fn get(&self, var: &str) -> Option<&InitialCondition> {
        self.entries.get(var)
    }

    /// Write every profile into the interior of `domain`.
    pub fn apply(&self, domain: &mut Domain) -> Result<(), ConfigError> {
        // validate everything before touching the domain
        let mut columns: Vec<(usize, nd::Array1<f64>)>
            = Vec::with_capacity(self.entries.len());
        for (name, ic) in self.entries.iter() {
            let var = domain.require_variable(name)?;
            let values = ic.sample(&domain.interior_x());
            (values.len() == domain.nx()).then_some(())
                .ok_or(ConfigError::InitialLength {
                    var: name.clone(),
                    got: values.len(),
                    expected: domain.nx(),
                })?;
            columns.push((var, values));
        }
        for (var, values) in columns.into_iter() {
            domain.interior_mut().column_mut(var).assign(&values);
        }
        Ok(())
    }
}
