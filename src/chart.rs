use serde::Serialize;

use crate::experiment::QuantificationRecord;

/// UI frameworks annotate result objects with `$$`-prefixed bookkeeping
/// keys; those are not target genes and never reach the chart.
const BOOKKEEPING_PREFIX: &str = "$$";

/// One bar of the RQ chart: `value` is the bar height, `error` the full
/// symmetric error-bar length (whisker half-length is a rendering concern).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
    pub error: f64,
}

/// Projects one detector's quantification record into render-ready points,
/// one per target gene, in the record's iteration order. Pure.
pub fn derive(record: &QuantificationRecord) -> Vec<ChartPoint> {
    record
        .iter()
        .filter(|(name, _)| !name.starts_with(BOOKKEEPING_PREFIX))
        .map(|(name, gene)| ChartPoint {
            name: name.clone(),
            value: gene.rq,
            error: gene.rq_err,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::experiment::TargetGene;

    use super::*;

    #[test]
    fn bookkeeping_keys_are_filtered() {
        let mut record = QuantificationRecord::new();
        record.insert(
            "GeneA".to_string(),
            TargetGene {
                rq: 2.0,
                rq_err: 0.4,
                ..TargetGene::default()
            },
        );
        record.insert("$$hashKey".to_string(), TargetGene::default());

        let points = derive(&record);
        assert_eq!(
            points,
            vec![ChartPoint {
                name: "GeneA".to_string(),
                value: 2.0,
                error: 0.4,
            }]
        );
    }
}
