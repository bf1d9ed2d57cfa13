//! Ising problem description submitted to samplers.
//!
//! An Ising problem is an energy function over spin variables s_i ∈ {-1, +1}:
//!
//!   E(s) = Σ_i h_i · s_i  +  Σ_(i,j) J_ij · s_i · s_j

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A single quadratic coupling J_uv between two variables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coupling {
    /// First variable.
    pub u: u32,
    /// Second variable.
    pub v: u32,
    /// Coupling strength.
    pub bias: f64,
}

impl Coupling {
    /// Create a new coupling.
    pub fn new(u: u32, v: u32, bias: f64) -> Self {
        Self { u, v, bias }
    }
}

/// Ising problem with linear biases and pairwise couplings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsingProblem {
    /// Linear biases as `(variable, h)` pairs.
    pub linear: Vec<(u32, f64)>,
    /// Pairwise couplings.
    pub quadratic: Vec<Coupling>,
}

impl IsingProblem {
    /// Create an empty problem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or accumulate onto) a linear bias.
    pub fn add_linear(&mut self, variable: u32, bias: f64) {
        match self.linear.iter_mut().find(|(v, _)| *v == variable) {
            Some((_, h)) => *h += bias,
            None => self.linear.push((variable, bias)),
        }
    }

    /// Add a coupling. Repeated pairs (in either order) accumulate.
    pub fn add_quadratic(&mut self, u: u32, v: u32, bias: f64) {
        let existing = self
            .quadratic
            .iter_mut()
            .find(|c| (c.u == u && c.v == v) || (c.u == v && c.v == u));
        match existing {
            Some(c) => c.bias += bias,
            None => self.quadratic.push(Coupling::new(u, v, bias)),
        }
    }

    /// All variables referenced by the problem, sorted ascending.
    pub fn variables(&self) -> Vec<u32> {
        let mut vars: BTreeSet<u32> = self.linear.iter().map(|(v, _)| *v).collect();
        for c in &self.quadratic {
            vars.insert(c.u);
            vars.insert(c.v);
        }
        vars.into_iter().collect()
    }

    /// Number of variables referenced by the problem.
    pub fn num_variables(&self) -> usize {
        self.variables().len()
    }

    /// Edges of the interaction graph.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.quadratic.iter().map(|c| (c.u, c.v))
    }

    /// Energy of a spin assignment.
    ///
    /// `spin` maps a variable to its value; variables it does not know are
    /// treated as +1.
    pub fn energy(&self, spin: impl Fn(u32) -> Option<i8>) -> f64 {
        let s = |v: u32| f64::from(spin(v).unwrap_or(1));
        let linear: f64 = self.linear.iter().map(|(v, h)| h * s(*v)).sum();
        let quadratic: f64 = self.quadratic.iter().map(|c| c.bias * s(c.u) * s(c.v)).sum();
        linear + quadratic
    }
}
