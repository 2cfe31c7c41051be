//! Efficiency function
//!
//! Pure mapping from (usage, benchmark, rate) to a 0..=100 score and a
//! credit amount. Savings below the benchmark earn credits at `rate` per
//! unit saved, rounded down; usage at or above the benchmark earns nothing.

use crate::{Error, Result};
use ledger_core::Amount;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Efficiency result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Efficiency {
    /// Percentage saved against the benchmark (0..=100)
    pub score: u32,

    /// Credits earned (base units)
    pub credits: Amount,
}

/// Score usage against a benchmark
pub fn evaluate(usage: Amount, benchmark: Amount, rate: Decimal) -> Result<Efficiency> {
    if benchmark == 0 {
        return Err(Error::InvalidAmount("benchmark must be positive".to_string()));
    }
    if rate.is_sign_negative() {
        return Err(Error::InvalidAmount(format!("negative credit rate {}", rate)));
    }
    if usage >= benchmark {
        return Ok(Efficiency {
            score: 0,
            credits: 0,
        });
    }

    let savings = benchmark - usage;
    let score = savings
        .checked_mul(100)
        .map(|scaled| scaled / benchmark)
        .ok_or_else(|| Error::ArithmeticOverflow(format!("score for savings {}", savings)))?;

    let credits = Decimal::from_u128(savings)
        .and_then(|savings| savings.checked_mul(rate))
        .and_then(|credits| credits.floor().to_u128())
        .ok_or_else(|| {
            Error::ArithmeticOverflow(format!("credits for savings {} at rate {}", savings, rate))
        })?;

    Ok(Efficiency {
        // savings < benchmark, so score < 100
        score: score as u32,
        credits,
    })
}
