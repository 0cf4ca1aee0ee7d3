// Copyright © 2021-2022 HQS Quantum Simulations GmbH. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the
// License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either
// express or implied. See the License for the specific language governing permissions and
// limitations under the License.

//! The symbolic expression contract of spec.md §6, built on top of
//! [`qoqo_calculator::CalculatorFloat`] rather than a hand-rolled algebra.

use std::collections::{HashMap, HashSet};
use std::ops::{Add, Neg};

use qoqo_calculator::{Calculator, CalculatorFloat};

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "json_schema")]
use schemars::JsonSchema;

/// An opaque symbolic expression, in units of half-turns of π where that
/// convention matters (rotation angles, global phase).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
pub struct Expr(CalculatorFloat);

impl Expr {
    /// The constant zero.
    pub const ZERO: Expr = Expr(CalculatorFloat::ZERO);

    /// Wraps a numeric value.
    pub fn from_f64(value: f64) -> Self {
        Expr(CalculatorFloat::from(value))
    }

    /// Wraps a free symbol by name.
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr(CalculatorFloat::from(name.into()))
    }

    /// Returns the underlying calculator value.
    pub fn inner(&self) -> &CalculatorFloat {
        &self.0
    }

    /// True if the expression is a plain numeric literal.
    pub fn is_numeric(&self) -> bool {
        self.0.is_float()
    }

    /// Evaluates the expression to a plain `f64`, if it is non-symbolic.
    pub fn eval(&self) -> Option<f64> {
        self.0.float().ok()
    }

    /// Evaluates `self mod n` to a plain `f64` in `[0, n)`, if non-symbolic.
    pub fn eval_mod(&self, n: f64) -> Option<f64> {
        let v = self.eval()?;
        let r = v.rem_euclid(n);
        Some(r)
    }

    /// `(self mod n) == 0`. Numeric comparisons are exact up to a small
    /// floating point tolerance; a non-reducible symbolic expression always
    /// returns `false` (never panics, never guesses), per spec.md §9.
    pub fn equiv_0(&self, n: f64) -> bool {
        match self.eval_mod(n) {
            Some(r) => r.abs() < 1e-10 || (n - r).abs() < 1e-10,
            None => false,
        }
    }

    /// `equiv_0(self - value, n)`.
    pub fn equiv_val(&self, value: f64, n: f64) -> bool {
        (self.clone() - Expr::from_f64(value)).equiv_0(n)
    }

    /// `equiv_0(self - other, n)`.
    pub fn equiv_expr(&self, other: &Expr, n: f64) -> bool {
        (self.clone() - other.clone()).equiv_0(n)
    }

    /// Multiplies by an integer scalar.
    pub fn scale(&self, factor: i64) -> Expr {
        Expr(self.0.clone() * CalculatorFloat::from(factor as f64))
    }

    /// Negates the expression (dagger of a rotation parameter).
    pub fn negate(&self) -> Expr {
        -self.clone()
    }

    /// The free symbol names appearing in the expression.
    pub fn free_symbols(&self) -> HashSet<String> {
        if self.0.is_float() {
            HashSet::new()
        } else {
            extract_identifiers(&self.0.to_string())
        }
    }

    /// Substitutes free symbols by name, returning a new expression.
    pub fn substitute(&self, map: &HashMap<String, Expr>) -> Expr {
        if self.0.is_float() {
            return self.clone();
        }
        let mut calc = Calculator::new();
        for (name, value) in map {
            if let Some(v) = value.eval() {
                calc.set_variable(name, v);
            }
        }
        match calc.parse_get(self.0.to_string()) {
            Ok(v) => Expr(CalculatorFloat::from(v)),
            Err(_) => self.clone(),
        }
    }
}

fn extract_identifiers(s: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    let mut current = String::new();
    for c in s.chars() {
        if c.is_alphanumeric() || c == '_' {
            current.push(c);
        } else if !current.is_empty() {
            if current.chars().next().unwrap().is_alphabetic() || current.starts_with('_') {
                out.insert(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if !current.is_empty()
        && (current.chars().next().unwrap().is_alphabetic() || current.starts_with('_'))
    {
        out.insert(current);
    }
    out
}

impl Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr(self.0 - rhs.0)
    }
}

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr(-self.0)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::from_f64(value)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

use std::fmt;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_equiv_0_mod_2pi() {
        let e = Expr::from_f64(std::f64::consts::TAU);
        assert!(e.equiv_0(std::f64::consts::TAU));
    }

    #[test]
    fn symbolic_equiv_is_false_not_panic() {
        let e = Expr::symbol("theta");
        assert!(!e.equiv_0(std::f64::consts::TAU));
        assert!(!e.equiv_val(0.0, std::f64::consts::TAU));
    }

    #[test]
    fn free_symbols_extracted() {
        let e = Expr::symbol("theta");
        let syms = e.free_symbols();
        assert!(syms.contains("theta"));
    }

    #[test]
    fn add_and_negate() {
        let a = Expr::from_f64(0.3);
        let b = Expr::from_f64(-0.3);
        let sum = a + b;
        assert!(sum.equiv_0(std::f64::consts::TAU));
    }
}
