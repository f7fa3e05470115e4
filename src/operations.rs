//! The four arithmetic operations a calculation can hold.
//!
//! The set is closed: new operation types require a new enum variant, and any
//! other tag is rejected at parse time.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Unknown operation type: {0}")]
    InvalidOperation(String),

    #[error("Cannot divide by zero")]
    DivisionByZero,

    #[error("{0} result is out of range")]
    Overflow(Operation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Subtract => "Subtract",
            Self::Multiply => "Multiply",
            Self::Divide => "Divide",
        }
    }

    /// Apply the operation to two operands.
    ///
    /// Division truncates toward zero (Rust's native integer division), for
    /// negative operands too: `7 / -2 == -3` and `-7 / 2 == -3`. Results that
    /// do not fit in an `i64` are rejected rather than wrapped; that includes
    /// `i64::MIN / -1`.
    pub fn evaluate(self, a: i64, b: i64) -> Result<i64, OperationError> {
        let result = match self {
            Self::Add => a.checked_add(b),
            Self::Subtract => a.checked_sub(b),
            Self::Multiply => a.checked_mul(b),
            Self::Divide => {
                if b == 0 {
                    return Err(OperationError::DivisionByZero);
                }
                a.checked_div(b)
            }
        };

        result.ok_or(OperationError::Overflow(self))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Add" => Ok(Self::Add),
            "Subtract" => Ok(Self::Subtract),
            "Multiply" => Ok(Self::Multiply),
            "Divide" => Ok(Self::Divide),
            other => Err(OperationError::InvalidOperation(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_identities() {
        assert_eq!(Operation::Add.evaluate(10, 5), Ok(15));
        assert_eq!(Operation::Subtract.evaluate(50, 10), Ok(40));
        assert_eq!(Operation::Multiply.evaluate(20, 5), Ok(100));
        assert_eq!(Operation::Add.evaluate(-3, 3), Ok(0));
        assert_eq!(Operation::Multiply.evaluate(-4, 6), Ok(-24));
    }

    #[test]
    fn test_division() {
        assert_eq!(Operation::Divide.evaluate(20, 4), Ok(5));
        assert_eq!(Operation::Divide.evaluate(10, 3), Ok(3));
        assert_eq!(
            Operation::Divide.evaluate(1, 0),
            Err(OperationError::DivisionByZero)
        );
    }

    #[test]
    fn test_division_truncates_toward_zero() {
        assert_eq!(Operation::Divide.evaluate(7, -2), Ok(-3));
        assert_eq!(Operation::Divide.evaluate(-7, 2), Ok(-3));
        assert_eq!(Operation::Divide.evaluate(-7, -2), Ok(3));
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert_eq!(
            Operation::Add.evaluate(i64::MAX, 1),
            Err(OperationError::Overflow(Operation::Add))
        );
        assert_eq!(
            Operation::Multiply.evaluate(i64::MAX, 2),
            Err(OperationError::Overflow(Operation::Multiply))
        );
        assert_eq!(
            Operation::Divide.evaluate(i64::MIN, -1),
            Err(OperationError::Overflow(Operation::Divide))
        );
    }

    #[test]
    fn test_parse_round_trip() {
        for op in [
            Operation::Add,
            Operation::Subtract,
            Operation::Multiply,
            Operation::Divide,
        ] {
            assert_eq!(op.as_str().parse::<Operation>(), Ok(op));
        }

        assert_eq!(
            "Modulo".parse::<Operation>(),
            Err(OperationError::InvalidOperation("Modulo".to_string()))
        );
        assert_eq!(
            "add".parse::<Operation>(),
            Err(OperationError::InvalidOperation("add".to_string()))
        );
    }
}
