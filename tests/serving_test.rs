//! Serving path: normalize → derive → align → score, with fixed literals.

mod common;

use churn_pipeline::error::{PipelineError, SchemaError, Stage};
use churn_pipeline::features::{
    CONTRACT_TYPE_RISK, HIGH_MONTHLY_CHARGES_FLAG, MONTHLY_TO_TOTAL_RATIO, PAYMENT_METHOD_RISK,
    TENURE_BUCKET,
};
use churn_pipeline::logging::{CollectingSink, ImputeStrategy, NullSink, QualityEvent};
use churn_pipeline::model::ChurnModel;
use churn_pipeline::reconcile::{AlignedTable, SchemaReconciler, TargetSchema};
use churn_pipeline::table::{ColumnValues, RawTable, RawValue};
use churn_pipeline::{
    BatchScorer, FeatureDeriver, FeatureTable, Mode, Normalizer, PipelineConfig,
};
use common::{example_serving_table, serving_row, serving_table, ConstantModel};
use std::sync::Arc;

fn serve_features(raw: &RawTable) -> Result<FeatureTable, PipelineError> {
    let config = PipelineConfig::default();
    let normalizer = Normalizer::new(config.input.clone(), config.serving.clone());
    let deriver = FeatureDeriver::new(config.serving);
    let normalized = normalizer.normalize(raw, Mode::Serving, &NullSink)?;
    deriver.derive(&normalized, Mode::Serving, &NullSink)
}

fn values<'a>(table: &'a FeatureTable, name: &str) -> &'a ColumnValues {
    &table.frame().column(name).expect("column present").values
}

#[test]
fn example_row_derives_documented_features() {
    let features = serve_features(&example_serving_table()).unwrap();

    assert_eq!(
        values(&features, TENURE_BUCKET),
        &ColumnValues::Categorical(vec![Some("0-1".to_string())])
    );
    assert_eq!(
        values(&features, MONTHLY_TO_TOTAL_RATIO),
        &ColumnValues::Numeric(vec![0.2])
    );
    assert_eq!(
        values(&features, HIGH_MONTHLY_CHARGES_FLAG),
        &ColumnValues::Ordinal(vec![1])
    );
    assert_eq!(values(&features, PAYMENT_METHOD_RISK), &ColumnValues::Ordinal(vec![2]));
    assert_eq!(values(&features, CONTRACT_TYPE_RISK), &ColumnValues::Ordinal(vec![2]));
}

#[test]
fn example_row_scores_with_threshold() {
    let model = ConstantModel::new(0.73);
    let scorer = BatchScorer::new(&PipelineConfig::default());
    let raw = example_serving_table();

    let out = scorer.score(&raw, &model, &NullSink).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out.rows[0].churn_probability, 0.73);
    assert_eq!(out.rows[0].churn_prediction, 1);
    assert_eq!(out.model, "constant");

    // original columns and values survive untouched, id included
    assert_eq!(out.columns, raw.columns);
    assert_eq!(out.rows[0].values, raw.rows[0]);

    let table = out.to_raw_table();
    let n = table.columns.len();
    assert_eq!(table.columns[n - 2], "churn_probability");
    assert_eq!(table.columns[n - 1], "churn_prediction");
    assert_eq!(table.rows[0][n - 1], RawValue::Number(1.0));
}

#[test]
fn missing_payment_method_is_schema_error() {
    let raw = example_serving_table();
    let idx = raw.column_index("PaymentMethod").unwrap();
    let mut columns = raw.columns.clone();
    columns.remove(idx);
    let rows = raw
        .rows
        .iter()
        .map(|r| {
            let mut r = r.clone();
            r.remove(idx);
            r
        })
        .collect();
    let raw = RawTable::new(columns, rows);

    let err = serve_features(&raw).unwrap_err();
    match err {
        PipelineError::Schema(SchemaError::MissingColumns { stage, columns }) => {
            assert_eq!(stage, Stage::Normalize);
            assert_eq!(columns, vec!["PaymentMethod".to_string()]);
        }
        other => panic!("expected missing column error, got {other:?}"),
    }

    let scorer = BatchScorer::new(&PipelineConfig::default());
    let err = scorer.score(&raw, &ConstantModel::new(0.1), &NullSink).unwrap_err();
    assert!(err.is_schema());
}

#[test]
fn zero_total_ratio_equals_monthly_charges() {
    let raw = serving_table(vec![
        serving_row("A", 0.0, 64.35, 0.0.into(), "Mailed check", "One year"),
        // blank total is coerced to missing, then imputed with the literal 0
        serving_row("B", 0.0, 19.7, " ".into(), "Mailed check", "Two year"),
    ]);
    let features = serve_features(&raw).unwrap();
    assert_eq!(
        values(&features, MONTHLY_TO_TOTAL_RATIO),
        &ColumnValues::Numeric(vec![64.35, 19.7])
    );
}

#[test]
fn every_non_negative_tenure_lands_in_one_bucket() {
    let tenures = [0.0, 0.5, 12.0, 12.01, 24.0, 47.0, 48.0, 72.0, 72.5, 500.0, 999.0, 1500.0];
    let rows = tenures
        .iter()
        .map(|t| serving_row("X", *t, 20.0, 100.0.into(), "Mailed check", "One year"))
        .collect();
    let features = serve_features(&serving_table(rows)).unwrap();

    let expected = [
        "0-1", "0-1", "0-1", "1-2", "1-2", "2-4", "2-4", "4-6", "6+", "6+", "6+", "6+",
    ];
    let ColumnValues::Categorical(labels) = values(&features, TENURE_BUCKET) else {
        panic!("tenure_bucket must be categorical");
    };
    let labels: Vec<&str> = labels.iter().map(|l| l.as_deref().unwrap()).collect();
    assert_eq!(labels, expected);
}

#[test]
fn unknown_payment_and_contract_use_fallback_levels() {
    let raw = serving_table(vec![serving_row(
        "X",
        10.0,
        50.0,
        500.0.into(),
        "Crypto",
        "Three year",
    )]);
    let features = serve_features(&raw).unwrap();
    assert_eq!(values(&features, PAYMENT_METHOD_RISK), &ColumnValues::Ordinal(vec![1]));
    assert_eq!(values(&features, CONTRACT_TYPE_RISK), &ColumnValues::Ordinal(vec![2]));
    assert_eq!(
        values(&features, HIGH_MONTHLY_CHARGES_FLAG),
        &ColumnValues::Ordinal(vec![0])
    );
}

#[test]
fn serving_imputes_literal_defaults() {
    let mut row = serving_row("X", 3.0, 80.5, 241.5.into(), "Mailed check", "One year");
    row[1] = RawValue::Null; // gender
    row[4] = RawValue::Null; // MonthlyCharges
    let raw = serving_table(vec![row]);

    let config = PipelineConfig::default();
    let sink = CollectingSink::new();
    let normalized = Normalizer::new(config.input, config.serving)
        .normalize(&raw, Mode::Serving, &sink)
        .unwrap();

    let frame = normalized.frame();
    assert_eq!(
        frame.column("MonthlyCharges").unwrap().values,
        ColumnValues::Numeric(vec![0.0])
    );
    assert_eq!(
        frame.column("gender").unwrap().values,
        ColumnValues::Categorical(vec![Some("Unknown".to_string())])
    );
    assert!(sink.events().iter().all(|e| matches!(
        e,
        QualityEvent::Imputed {
            strategy: ImputeStrategy::Default,
            count: 1,
            ..
        }
    )));
    assert_eq!(sink.events().len(), 2);
    assert_eq!(normalized.ids(), Some(&[RawValue::from("X")][..]));
}

#[test]
fn probability_is_rounded_but_decision_is_not() {
    let scorer = BatchScorer::new(&PipelineConfig::default());
    let out = scorer
        .score(&example_serving_table(), &ConstantModel::new(0.499_96), &NullSink)
        .unwrap();
    assert_eq!(out.rows[0].churn_probability, 0.5);
    assert_eq!(out.rows[0].churn_prediction, 0);

    let out = scorer
        .score(&example_serving_table(), &ConstantModel::new(0.123_456), &NullSink)
        .unwrap();
    assert_eq!(out.rows[0].churn_probability, 0.1235);
}

struct BrokenModel {
    schema: TargetSchema,
    output: Vec<f64>,
}

impl ChurnModel for BrokenModel {
    fn name(&self) -> &str {
        "broken"
    }

    fn target_schema(&self) -> &TargetSchema {
        &self.schema
    }

    fn predict_probability(&self, _features: &AlignedTable) -> churn_pipeline::error::Result<Vec<f64>> {
        Ok(self.output.clone())
    }
}

#[test]
fn invalid_model_output_aborts_the_batch() {
    let scorer = BatchScorer::new(&PipelineConfig::default());
    let raw = example_serving_table();

    for output in [vec![], vec![0.2, 0.3], vec![1.2], vec![f64::NAN]] {
        let model = BrokenModel {
            schema: common::fitted_schema(),
            output,
        };
        let err = scorer.score(&raw, &model, &NullSink).unwrap_err();
        assert!(matches!(err, PipelineError::Model(_)), "{err:?}");
    }
}

#[test]
fn serving_features_do_not_depend_on_batch_composition() {
    let rows = vec![
        serving_row("A", 5.0, 90.0, 450.0.into(), "Electronic check", "Month-to-month"),
        serving_row("B", 40.0, 20.0, 800.0.into(), "Bank transfer (automatic)", "Two year"),
        serving_row("C", 80.0, 85.0, 6800.0.into(), "Mailed check", "One year"),
    ];
    let schema = common::fitted_schema();
    let reconciler = SchemaReconciler::new(&schema);

    let together = reconciler
        .align(&serve_features(&serving_table(rows.clone())).unwrap(), &NullSink)
        .unwrap();
    for (i, row) in rows.into_iter().enumerate() {
        let alone = reconciler
            .align(&serve_features(&serving_table(vec![row])).unwrap(), &NullSink)
            .unwrap();
        assert_eq!(alone.matrix.row(0), together.matrix.row(i));
    }
}

#[test]
fn shared_model_scores_concurrently() {
    let model: Arc<dyn ChurnModel> = Arc::new(ConstantModel::new(0.61));
    let scorer = BatchScorer::new(&PipelineConfig::default());
    let raw = example_serving_table();

    let results: Vec<Vec<f64>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let model = Arc::clone(&model);
                let scorer = &scorer;
                let raw = &raw;
                s.spawn(move || {
                    scorer
                        .score(raw, model.as_ref(), &NullSink)
                        .unwrap()
                        .probabilities()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(results.iter().all(|r| r == &vec![0.61]));
}

/// Training table with an extra free-text `Region` column the input schema
/// does not declare.
fn training_with_region() -> RawTable {
    let mut raw = common::training_table();
    raw.columns.push("Region".to_string());
    for (i, row) in raw.rows.iter_mut().enumerate() {
        row.push(if i % 2 == 0 { "North" } else { "South" }.into());
    }
    raw
}

#[test]
fn undeclared_column_takes_its_kind_from_the_fitted_layout() {
    let schema = churn_pipeline::TrainingPipeline::new(&PipelineConfig::default())
        .prepare(&training_with_region(), &NullSink)
        .unwrap()
        .schema;
    assert!(schema.feature_names().contains(&"Region=North".to_string()));
    let model = ConstantModel {
        schema,
        probability: 0.73,
    };

    let mut raw = example_serving_table();
    raw.columns.push("Region".to_string());
    raw.rows[0].push(RawValue::Null);
    let mut numeric_looking = serving_row("C10", 30.0, 40.0, 1200.0.into(), "Mailed check", "One year");
    numeric_looking.push(RawValue::Number(7.0));
    let single = raw.clone();
    raw.rows.push(numeric_looking);

    let scorer = BatchScorer::new(&PipelineConfig::default());
    let sink = CollectingSink::new();
    let out = scorer.score(&single, &model, &sink).unwrap();
    assert_eq!(out.rows[0].churn_prediction, 1);
    let events = sink.take();
    assert!(events.contains(&QualityEvent::Imputed {
        column: "Region".to_string(),
        count: 1,
        strategy: ImputeStrategy::Default,
        value: "Unknown".to_string(),
    }));
    assert!(events.contains(&QualityEvent::UnseenCategory {
        column: "Region".to_string(),
        value: Some("Unknown".to_string()),
        count: 1,
    }));

    // a number in a categorical column is just another unseen category
    let out = scorer.score(&raw, &model, &sink).unwrap();
    assert_eq!(out.len(), 2);
    assert!(sink.events().contains(&QualityEvent::UnseenCategory {
        column: "Region".to_string(),
        value: Some("7".to_string()),
        count: 1,
    }));
}

#[test]
fn infinite_charges_are_coerced_and_imputed() {
    let schema = common::fitted_schema();
    let width = schema.width();
    let model = churn_pipeline::LinearChurnModel::new(schema, 0.0, vec![0.0; width]).unwrap();

    let mut raw = example_serving_table();
    let idx = raw.column_index("TotalCharges").unwrap();
    raw.rows[0][idx] = "inf".into();

    let sink = CollectingSink::new();
    let out = BatchScorer::new(&PipelineConfig::default())
        .score(&raw, &model, &sink)
        .unwrap();
    assert_eq!(out.rows[0].churn_probability, 0.5);

    let events = sink.events();
    assert!(events.contains(&QualityEvent::CoercionFailed {
        column: "TotalCharges".to_string(),
        count: 1,
        sample: vec!["inf".to_string()],
    }));
    assert!(events.contains(&QualityEvent::Imputed {
        column: "TotalCharges".to_string(),
        count: 1,
        strategy: ImputeStrategy::Default,
        value: "0".to_string(),
    }));

    // the same holds for an infinite number handed over directly
    raw.rows[0][idx] = RawValue::Number(f64::INFINITY);
    let out = BatchScorer::new(&PipelineConfig::default())
        .score(&raw, &model, &NullSink)
        .unwrap();
    assert_eq!(out.rows[0].churn_probability, 0.5);
}
