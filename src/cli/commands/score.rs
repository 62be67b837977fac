use crate::config::Config;
use crate::moderation::{BullyingClassifier, ModelClassifier, ReputationPolicy, normalize};

pub async fn cmd_score_text(config: &Config, text: &str) -> anyhow::Result<()> {
    let classifier = ModelClassifier::load(&config.classifier);
    let policy = ReputationPolicy::from_config(&config.moderation);

    if let Some(reason) = classifier.degraded_reason() {
        println!("Classifier degraded: {reason}");
    }

    let score = classifier.score(text).await;

    println!("Normalized: {}", normalize(text));
    println!("Score:      {score:.4}");
    println!(
        "Bullying:   {}",
        if policy.is_bullying(score) { "yes" } else { "no" }
    );

    Ok(())
}
