// Aggregates derived from the sales table. Pure functions, no I/O.

use crate::ledger::SaleRecord;
use serde::Serialize;

/// Sum of every sale total; 0 for an empty table
pub fn total_sales(sales: &[SaleRecord]) -> f64 {
    sales.iter().map(|s| s.total).sum()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesSummary {
    pub count: usize,
    pub units: i64,
    pub total: f64,
}

pub fn summarize(sales: &[SaleRecord]) -> SalesSummary {
    SalesSummary {
        count: sales.len(),
        units: sales
            .iter()
            .fold(0i64, |units, s| units.saturating_add(s.quantity)),
        total: total_sales(sales),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_of_empty_is_zero() {
        assert_eq!(total_sales(&[]), 0.0);
    }

    #[test]
    fn test_total_sales() {
        let sales = vec![SaleRecord::new("p", 2, 5.0), SaleRecord::new("p", 1, 3.0)];
        assert_eq!(total_sales(&sales), 13.0);
    }

    #[test]
    fn test_summary() {
        let sales = vec![
            SaleRecord::new("apple", 5, 200.0),
            SaleRecord::new("rice", 2, 400.0),
        ];

        let summary = summarize(&sales);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.units, 7);
        assert_eq!(summary.total, 1800.0);
        assert_eq!(summarize(&[]), SalesSummary::default());
    }

    #[test]
    fn test_summary_units_saturate() {
        let sales = vec![
            SaleRecord::new("bulk", i64::MAX, 1.0),
            SaleRecord::new("bulk", 1, 1.0),
        ];

        let summary = summarize(&sales);
        assert_eq!(summary.units, i64::MAX);
        assert_eq!(summary.count, 2);
    }
}
