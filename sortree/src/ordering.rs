//! Child ordering for sorted nodes.
//!
//! A node either sorts its children by the payloads' own `PartialOrd`
//! (`Natural`, or `NaturalReversed` for descending) or by a caller supplied
//! comparator (`Custom`).

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::errors::{TreeError, TreeResult};

pub type Comparator<T> = Rc<dyn Fn(&T, &T) -> Ordering>;

pub enum ChildOrdering<T> {
    Natural,
    NaturalReversed,
    Custom(Comparator<T>),
}

impl<T> ChildOrdering<T> {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        ChildOrdering::Custom(Rc::new(f))
    }

    /// Same ordering with arguments swapped.
    pub fn reversed(&self) -> Self
    where
        T: 'static,
    {
        match self {
            ChildOrdering::Natural => ChildOrdering::NaturalReversed,
            ChildOrdering::NaturalReversed => ChildOrdering::Natural,
            ChildOrdering::Custom(f) => {
                let f = Rc::clone(f);
                ChildOrdering::custom(move |a, b| f(b, a))
            }
        }
    }

    pub fn is_natural(&self) -> bool {
        matches!(self, ChildOrdering::Natural)
    }
}

impl<T: PartialOrd> ChildOrdering<T> {
    pub fn compare(&self, a: &T, b: &T) -> TreeResult<Ordering> {
        match self {
            ChildOrdering::Natural => a.partial_cmp(b).ok_or(TreeError::Incomparable),
            ChildOrdering::NaturalReversed => b.partial_cmp(a).ok_or(TreeError::Incomparable),
            ChildOrdering::Custom(f) => Ok(f(a, b)),
        }
    }
}

impl<T> Default for ChildOrdering<T> {
    fn default() -> Self {
        ChildOrdering::Natural
    }
}

impl<T> Clone for ChildOrdering<T> {
    fn clone(&self) -> Self {
        match self {
            ChildOrdering::Natural => ChildOrdering::Natural,
            ChildOrdering::NaturalReversed => ChildOrdering::NaturalReversed,
            ChildOrdering::Custom(f) => ChildOrdering::Custom(Rc::clone(f)),
        }
    }
}

impl<T> From<Option<Comparator<T>>> for ChildOrdering<T> {
    fn from(value: Option<Comparator<T>>) -> Self {
        value.map_or(ChildOrdering::Natural, ChildOrdering::Custom)
    }
}

impl<T> fmt::Debug for ChildOrdering<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildOrdering::Natural => write!(f, "Natural"),
            ChildOrdering::NaturalReversed => write!(f, "NaturalReversed"),
            ChildOrdering::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_compare() {
        let ord = ChildOrdering::<i32>::Natural;
        assert_eq!(ord.compare(&1, &2), Ok(Ordering::Less));
        assert_eq!(ord.compare(&2, &2), Ok(Ordering::Equal));
    }

    #[test]
    fn test_natural_compare_nan_is_incomparable() {
        let ord = ChildOrdering::<f64>::Natural;
        assert_eq!(ord.compare(&f64::NAN, &1.0), Err(TreeError::Incomparable));
    }

    #[test]
    fn test_reversed_natural_keeps_nan_incomparable() {
        let ord = ChildOrdering::<f64>::Natural.reversed();
        assert_eq!(ord.compare(&2.0, &1.0), Ok(Ordering::Less));
        assert_eq!(ord.compare(&1.0, &f64::NAN), Err(TreeError::Incomparable));
        assert!(ord.reversed().is_natural());
    }

    #[test]
    fn test_reversed_custom() {
        let ord = ChildOrdering::custom(|a: &String, b: &String| a.len().cmp(&b.len()));
        let rev = ord.reversed();
        assert_eq!(
            rev.compare(&"a".to_string(), &"bbb".to_string()),
            Ok(Ordering::Greater)
        );
    }

    #[test]
    fn test_from_none_is_natural() {
        let ord: ChildOrdering<i32> = None.into();
        assert!(ord.is_natural());
    }
}
