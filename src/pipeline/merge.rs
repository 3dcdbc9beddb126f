//! Reattaching labels to the unmodified evidence records

use crate::anomaly::AnomalyLabel;
use crate::config::LabelEncoding;
use crate::error::{EvidentiaError, Result};
use polars::prelude::*;

/// Copy `original` and append `labels` as column `column`, in row order.
///
/// A label count that differs from the row count is a pipeline defect and
/// fails with [`EvidentiaError::RowCountMismatch`]; nothing is padded or cut.
pub fn attach_labels(
    original: &DataFrame,
    labels: &[AnomalyLabel],
    column: &str,
    encoding: LabelEncoding,
) -> Result<DataFrame> {
    if labels.len() != original.height() {
        return Err(EvidentiaError::RowCountMismatch {
            expected: original.height(),
            actual: labels.len(),
        });
    }

    let series = match encoding {
        LabelEncoding::Text => {
            let values: Vec<&str> = labels.iter().map(|l| l.as_str()).collect();
            Series::new(column.into(), values)
        }
        LabelEncoding::Sign => {
            let values: Vec<i32> = labels.iter().map(|l| l.sign()).collect();
            Series::new(column.into(), values)
        }
    };

    let mut scored = original.clone();
    scored.with_column(series)?;
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> DataFrame {
        df!("event_type" => &["a", "b", "c"], "bytes" => &[1i64, 2, 3]).unwrap()
    }

    #[test]
    fn test_labels_appended_in_order() {
        let labels = [AnomalyLabel::Normal, AnomalyLabel::Anomaly, AnomalyLabel::Normal];
        let scored = attach_labels(&records(), &labels, "is_anomaly", LabelEncoding::Text).unwrap();

        assert_eq!(scored.width(), 3);
        let col = scored.column("is_anomaly").unwrap().str().unwrap();
        let values: Vec<Option<&str>> = col.into_iter().collect();
        assert_eq!(values, vec![Some("normal"), Some("anomaly"), Some("normal")]);
    }

    #[test]
    fn test_sign_encoding() {
        let labels = [AnomalyLabel::Anomaly, AnomalyLabel::Normal, AnomalyLabel::Normal];
        let scored = attach_labels(&records(), &labels, "is_anomaly", LabelEncoding::Sign).unwrap();
        let col = scored.column("is_anomaly").unwrap().i32().unwrap();
        assert_eq!(col.get(0), Some(-1));
        assert_eq!(col.get(1), Some(1));
    }

    #[test]
    fn test_count_mismatch_is_fatal() {
        let labels = [AnomalyLabel::Normal, AnomalyLabel::Normal];
        let err = attach_labels(&records(), &labels, "is_anomaly", LabelEncoding::Text).unwrap_err();
        assert!(matches!(
            err,
            EvidentiaError::RowCountMismatch { expected: 3, actual: 2 }
        ));
    }
}
