use edge_consensus::consensus::{ConsensusResolver, WeightedTarget};
use edge_consensus::forest::{ForestCodec, ModelDocument, ModelRegistry, TrainedEnsemble};
use edge_consensus::profile::{feature_names, EnvironmentPreference, FeatureEncoder, PersonProfile};
use edge_consensus::trainer::RandomForestTrainer;
use edge_consensus::weighting::{parse_timestamp, WeightAggregator};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

const NOW: &str = "202510191230";

fn aggregator() -> WeightAggregator {
    WeightAggregator::at(parse_timestamp(NOW).unwrap())
}

fn population() -> Vec<PersonProfile> {
    let types = ["ISFP", "ENTJ", "INFJ", "ESTP", "ISTJ", "ENFP", "INTP", "ESFJ"];
    types
        .iter()
        .enumerate()
        .map(|(i, mbti)| {
            let stress = 40.0 + (i as f64) * 7.0;
            let updated = format!("2025101{}0900", i % 10);
            PersonProfile::new(format!("user_{}", i), *mbti)
                .with_metrics(Some(stress), Some(5.0 + i as f64))
                .with_updated_at(updated)
        })
        .collect()
}

fn training_rows(profiles: &[PersonProfile]) -> (Vec<Vec<f64>>, Vec<f64>) {
    let aggregator = aggregator();
    profiles
        .iter()
        .map(|p| {
            (
                FeatureEncoder::encode(p).as_slice().to_vec(),
                aggregator.training_label(p),
            )
        })
        .unzip()
}

#[test]
fn test_codec_preserves_fitted_predictions() {
    let profiles = population();
    let (samples, labels) = training_rows(&profiles);

    let fitted = RandomForestTrainer::default()
        .fit_forest(&samples, &labels)
        .unwrap();
    let codec = ForestCodec::default();
    let forest = codec.encode_forest(&fitted, &feature_names()).unwrap();

    // Through the wire format, as the edge would see it
    let body = serde_json::to_string(&ModelDocument::from_forest(&forest)).unwrap();
    let decoded = codec.decode_document(&body, feature_names().len()).unwrap();

    assert_eq!(decoded.len(), 15);
    for tree in decoded.trees() {
        assert!(tree.depth() <= 6);
    }

    let probes = [
        [1.0, 1.0, 1.0, 1.0, 85.0, 10.0],
        [0.0, 0.0, 0.0, 0.0, 20.0, 3.0],
        [1.0, 0.0, 1.0, 0.0, 60.0, 12.5],
        [0.0, 1.0, 0.0, 1.0, 80.0, 0.0],
    ];
    let mut rows: Vec<Vec<f64>> = probes.iter().map(|p| p.to_vec()).collect();
    rows.extend(samples.iter().cloned());

    for row in &rows {
        let direct = fitted.predict(row).unwrap();
        let via_wire = decoded.predict(row).unwrap();
        assert!((direct - via_wire).abs() < 1e-9, "{} vs {}", direct, via_wire);
    }
}

#[test]
fn test_two_tree_mean() {
    let model_forest = vec![
        json!({"type": "leaf", "value": 3.0}),
        json!({"type": "leaf", "value": 5.0}),
    ];
    let forest = ForestCodec::default()
        .decode(&model_forest, feature_names())
        .unwrap();

    let features = [0.0; 6];
    assert_eq!(forest.predict(&features), Some(4.0));
}

#[test]
fn test_high_stress_fresh_profile() {
    let profile = PersonProfile::new("isfp", "ISFP")
        .with_metrics(Some(85.0), None)
        .with_updated_at(NOW);
    let encoded = FeatureEncoder::encode(&profile);
    assert_eq!(encoded.into_array(), [1.0, 1.0, 1.0, 1.0, 85.0, 10.0]);

    let aggregator = aggregator();
    assert_eq!(aggregator.stress_bonus(&profile), 1.0);
    assert!((aggregator.recency_bonus(&profile) - 3.0).abs() < 1e-9);
}

#[test]
fn test_missing_timestamp_is_stale() {
    let profile = PersonProfile::new("nobody", "ISTJ");
    let breakdown = aggregator().final_weight(&profile, Some(1.0));
    assert!((breakdown.recency_bonus - 0.0003).abs() < 1e-9);
    assert!((breakdown.final_weight - 1.0003).abs() < 1e-9);
}

#[test]
fn test_weighted_consensus_scenario() {
    let target = |temperature: f64, weight: f64| {
        WeightedTarget::new(
            EnvironmentPreference {
                temperature,
                ..EnvironmentPreference::default()
            },
            weight,
        )
    };

    let decision =
        ConsensusResolver::resolve(&[target(20.0, 2.0), target(24.0, 2.0), target(26.0, 4.0)])
            .unwrap();
    assert_eq!(decision.temperature, 24.0);
    assert_eq!(decision.humidity, 3);
    assert_eq!(decision.brightness, 5);
}

#[tokio::test]
async fn test_trained_forest_drives_consensus() {
    let profiles = population();
    let (samples, labels) = training_rows(&profiles);
    let fitted = RandomForestTrainer::default()
        .fit_forest(&samples, &labels)
        .unwrap();
    let forest = ForestCodec::default()
        .encode_forest(&fitted, &feature_names())
        .unwrap();

    let registry = ModelRegistry::new();
    assert_eq!(registry.publish(forest).await, Some(1));
    let snapshot = registry.current().await.unwrap();

    let aggregator = aggregator();
    let targets: Vec<WeightedTarget> = profiles
        .iter()
        .take(3)
        .map(|p| {
            let prediction = snapshot.forest.predict(FeatureEncoder::encode(p).as_slice());
            let weight = aggregator.final_weight(p, prediction);
            assert!(!weight.used_fallback);
            assert!(weight.final_weight > 0.0);
            WeightedTarget::new(p.preferences, weight.final_weight)
        })
        .collect();

    let decision = ConsensusResolver::resolve(&targets).unwrap();
    assert_eq!(decision.temperature, 24.0);
}

#[tokio::test]
#[ignore] // Run with: cargo test --release -- --ignored --nocapture
async fn stress_test_readers_during_republish() {
    let profiles = population();
    let (samples, labels) = training_rows(&profiles);
    let codec = ForestCodec::default();

    let registry = ModelRegistry::new();
    let fitted = RandomForestTrainer::default()
        .fit_forest(&samples, &labels)
        .unwrap();
    registry
        .publish(codec.encode_forest(&fitted, &feature_names()).unwrap())
        .await;

    let start = Instant::now();
    let probe = Arc::new(samples[0].clone());
    let mut readers = Vec::new();
    for _ in 0..64 {
        let registry = registry.clone();
        let probe = Arc::clone(&probe);
        readers.push(tokio::spawn(async move {
            let mut served = 0u64;
            for _ in 0..2_000 {
                let snapshot = registry.current().await.unwrap();
                assert!(snapshot.forest.predict(&probe).unwrap().is_finite());
                served += 1;
            }
            served
        }));
    }

    for seed in 0..20 {
        let trainer = RandomForestTrainer {
            seed,
            ..RandomForestTrainer::default()
        };
        let fitted = trainer.fit_forest(&samples, &labels).unwrap();
        registry
            .publish(codec.encode_forest(&fitted, &feature_names()).unwrap())
            .await;
    }

    let mut total = 0;
    for reader in readers {
        total += reader.await.unwrap();
    }

    println!(
        "📊 {} predictions across 21 snapshots in {:?}",
        total,
        start.elapsed()
    );
    assert_eq!(total, 64 * 2_000);
}
