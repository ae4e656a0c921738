use crate::classifier::{Classifier, LlmClassifier};
use crate::cli::ClassifyArgs;
use crate::input::load_reviews;
use crate::output::{report_dir, write_classifications};
use crate::pipeline::ReviewLabeler;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn execute(args: ClassifyArgs) -> anyhow::Result<()> {
    let mut config = args.config.load()?;
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(output_dir) = args.output_dir.clone() {
        config.output_dir = output_dir;
    }
    config.validate()?;

    if let Some(text) = &args.text {
        let classifier = LlmClassifier::from_config(&config)?;
        let classification = classifier.classify_review(text).await?;
        println!("{}", serde_json::to_string_pretty(&classification)?);
        return Ok(());
    }

    let Some(input) = &args.input else {
        anyhow::bail!("Either a reviews file or --text is required");
    };

    let reviews = load_reviews(input)?;
    let classifier = Arc::new(LlmClassifier::from_config(&config)?);
    info!(
        "Classifying {} reviews with concurrency {}",
        reviews.len(),
        config.concurrency
    );

    let outcomes = ReviewLabeler::new(classifier, config.concurrency)
        .classify_all(&reviews)
        .await;

    println!("{}", serde_json::to_string_pretty(&outcomes)?);

    let failures = outcomes.iter().filter(|o| o.error.is_some()).count();
    if failures > 0 {
        warn!("{} of {} reviews failed to classify", failures, outcomes.len());
    }

    if args.output_dir.is_some() {
        let dir = report_dir(&config.output_dir);
        write_classifications(&dir, &reviews, &outcomes)?;
        info!("Classifications written to {:?}", dir);
    }

    Ok(())
}
