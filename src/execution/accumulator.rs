// Per-group aggregate state

use std::fmt::Debug;

use crate::error::{Error, Result};
use crate::planner::logical_expr::AggregateFunction;
use crate::types::ScalarValue;

/// Running state of one aggregate function for one group
///
/// Values are fed one row at a time; nulls arrive as `None` and are ignored by
/// every accumulator.
pub trait Accumulator: Debug + Send {
    /// Fold one input value into the running state
    fn accumulate(&mut self, value: Option<ScalarValue>) -> Result<()>;

    /// Current result; `None` when nothing has been accumulated
    fn final_value(&self) -> Option<ScalarValue>;
}

/// Creates a fresh accumulator for a new group
pub type AccumulatorFactory = fn() -> Box<dyn Accumulator>;

/// Factory for the accumulator that implements `func`
pub fn accumulator_factory(func: AggregateFunction) -> AccumulatorFactory {
    match func {
        AggregateFunction::Max => new_max,
        AggregateFunction::Min => new_min,
        AggregateFunction::Count => new_count,
        AggregateFunction::Sum => new_sum,
        AggregateFunction::Avg => new_avg,
    }
}

fn new_max() -> Box<dyn Accumulator> {
    Box::<MaxAccumulator>::default()
}

fn new_min() -> Box<dyn Accumulator> {
    Box::<MinAccumulator>::default()
}

fn new_count() -> Box<dyn Accumulator> {
    Box::<CountAccumulator>::default()
}

fn new_sum() -> Box<dyn Accumulator> {
    Box::<SumAccumulator>::default()
}

fn new_avg() -> Box<dyn Accumulator> {
    Box::<AvgAccumulator>::default()
}

/// Replace `current` with `value` when `replace` accepts their ordering
fn fold_extreme(
    current: &mut Option<ScalarValue>,
    value: ScalarValue,
    replace: fn(std::cmp::Ordering) -> bool,
) -> Result<()> {
    match current {
        None => *current = Some(value),
        Some(existing) => {
            let ordering = value.partial_cmp(existing).ok_or_else(|| {
                Error::TypeMismatch(format!(
                    "cannot compare {} with {}",
                    value.data_type(),
                    existing.data_type()
                ))
            })?;
            if replace(ordering) {
                *existing = value;
            }
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct MaxAccumulator {
    value: Option<ScalarValue>,
}

impl Accumulator for MaxAccumulator {
    fn accumulate(&mut self, value: Option<ScalarValue>) -> Result<()> {
        match value {
            Some(v) => fold_extreme(&mut self.value, v, |o| o.is_gt()),
            None => Ok(()),
        }
    }

    fn final_value(&self) -> Option<ScalarValue> {
        self.value.clone()
    }
}

#[derive(Debug, Default)]
pub struct MinAccumulator {
    value: Option<ScalarValue>,
}

impl Accumulator for MinAccumulator {
    fn accumulate(&mut self, value: Option<ScalarValue>) -> Result<()> {
        match value {
            Some(v) => fold_extreme(&mut self.value, v, |o| o.is_lt()),
            None => Ok(()),
        }
    }

    fn final_value(&self) -> Option<ScalarValue> {
        self.value.clone()
    }
}

/// Counts non-null values
#[derive(Debug, Default)]
pub struct CountAccumulator {
    count: i64,
}

impl Accumulator for CountAccumulator {
    fn accumulate(&mut self, value: Option<ScalarValue>) -> Result<()> {
        if value.is_some() {
            self.count += 1;
        }
        Ok(())
    }

    fn final_value(&self) -> Option<ScalarValue> {
        Some(ScalarValue::Int64(self.count))
    }
}

/// Sum in the input's own type; integer overflow is an error
#[derive(Debug, Default)]
pub struct SumAccumulator {
    sum: Option<ScalarValue>,
}

impl Accumulator for SumAccumulator {
    fn accumulate(&mut self, value: Option<ScalarValue>) -> Result<()> {
        let Some(value) = value else {
            return Ok(());
        };
        if value.as_f64().is_none() {
            return Err(Error::UnsupportedOperation(format!(
                "SUM is not defined for {}",
                value.data_type()
            )));
        }
        self.sum = Some(match self.sum.take() {
            None => value,
            Some(sum) => sum.checked_add(&value)?,
        });
        Ok(())
    }

    fn final_value(&self) -> Option<ScalarValue> {
        self.sum.clone()
    }
}

/// Mean as Float64
#[derive(Debug, Default)]
pub struct AvgAccumulator {
    sum: f64,
    count: u64,
}

impl Accumulator for AvgAccumulator {
    fn accumulate(&mut self, value: Option<ScalarValue>) -> Result<()> {
        let Some(value) = value else {
            return Ok(());
        };
        let v = value.as_f64().ok_or_else(|| {
            Error::UnsupportedOperation(format!("AVG is not defined for {}", value.data_type()))
        })?;
        self.sum += v;
        self.count += 1;
        Ok(())
    }

    fn final_value(&self) -> Option<ScalarValue> {
        (self.count > 0).then(|| ScalarValue::Float64(self.sum / self.count as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(func: AggregateFunction, values: Vec<Option<ScalarValue>>) -> Result<Option<ScalarValue>> {
        let mut acc = accumulator_factory(func)();
        for v in values {
            acc.accumulate(v)?;
        }
        Ok(acc.final_value())
    }

    fn ints(values: &[i64]) -> Vec<Option<ScalarValue>> {
        values.iter().map(|v| Some(ScalarValue::Int64(*v))).collect()
    }

    #[test]
    fn test_max_min() {
        let values = ints(&[100, 300, 50, 200]);
        assert_eq!(
            feed(AggregateFunction::Max, values.clone()).unwrap(),
            Some(ScalarValue::Int64(300))
        );
        assert_eq!(
            feed(AggregateFunction::Min, values).unwrap(),
            Some(ScalarValue::Int64(50))
        );
    }

    #[test]
    fn test_max_of_strings() {
        let values = vec![
            Some(ScalarValue::Utf8("ES".into())),
            Some(ScalarValue::Utf8("FR".into())),
            None,
        ];
        assert_eq!(
            feed(AggregateFunction::Max, values).unwrap(),
            Some(ScalarValue::Utf8("FR".into()))
        );
    }

    #[test]
    fn test_sum_count_avg() {
        let mut values = ints(&[100, 200, 300]);
        values.push(None);
        assert_eq!(
            feed(AggregateFunction::Sum, values.clone()).unwrap(),
            Some(ScalarValue::Int64(600))
        );
        assert_eq!(
            feed(AggregateFunction::Count, values.clone()).unwrap(),
            Some(ScalarValue::Int64(3))
        );
        assert_eq!(
            feed(AggregateFunction::Avg, values).unwrap(),
            Some(ScalarValue::Float64(200.0))
        );
    }

    #[test]
    fn test_empty_state() {
        assert_eq!(feed(AggregateFunction::Sum, vec![None]).unwrap(), None);
        assert_eq!(feed(AggregateFunction::Max, vec![]).unwrap(), None);
        assert_eq!(feed(AggregateFunction::Avg, vec![]).unwrap(), None);
        assert_eq!(
            feed(AggregateFunction::Count, vec![]).unwrap(),
            Some(ScalarValue::Int64(0))
        );
    }

    #[test]
    fn test_sum_overflow() {
        let result = feed(AggregateFunction::Sum, ints(&[i64::MAX, 1]));
        assert!(matches!(result, Err(Error::Overflow(_))));
    }

    #[test]
    fn test_sum_rejects_strings() {
        let result = feed(
            AggregateFunction::Sum,
            vec![Some(ScalarValue::Utf8("ES".into()))],
        );
        assert!(matches!(result, Err(Error::UnsupportedOperation(_))));
    }

    #[test]
    fn test_factories_are_independent() {
        let factory = accumulator_factory(AggregateFunction::Count);
        let mut a = factory();
        let b = factory();
        a.accumulate(Some(ScalarValue::Int64(1))).unwrap();
        assert_eq!(a.final_value(), Some(ScalarValue::Int64(1)));
        assert_eq!(b.final_value(), Some(ScalarValue::Int64(0)));
    }
}
