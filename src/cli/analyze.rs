use crate::classifier::LlmClassifier;
use crate::cli::AnalyzeArgs;
use crate::config::{Config, ExecutionMode};
use crate::input::load_reviews;
use crate::output::{report_dir, write_classifications, write_report};
use crate::pipeline::{per_review_chunks, plan_with, NarrativeStatus, Pipeline, Strategy};
use crate::review::Review;
use std::sync::Arc;
use tracing::{error, info, warn};

pub async fn execute(args: AnalyzeArgs) -> anyhow::Result<()> {
    let mut config = args.config.load()?;

    // Apply CLI overrides
    if let Some(chunks) = args.chunks {
        config.target_chunk_count = chunks;
        config.max_reviews_per_chunk = None;
    }
    if let Some(max) = args.max_per_chunk {
        config.max_reviews_per_chunk = Some(max);
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if args.sequential {
        config.mode = ExecutionMode::Sequential;
    }
    if let Some(policy) = args.policy {
        config.failed_chunk_policy = policy;
    }
    if args.no_label {
        config.classify_unlabeled = false;
    }

    config.validate()?;

    let reviews = load_reviews(&args.input)?;
    info!("Loaded {} reviews from {:?}", reviews.len(), args.input);

    if args.dry_run {
        info!("DRY RUN - no provider calls will be made");
        print_chunk_plan(&config, reviews, args.per_review);
        return Ok(());
    }

    let classifier = Arc::new(LlmClassifier::from_config(&config)?);
    let strategy = if args.per_review {
        Strategy::PerReview
    } else {
        Strategy::Chunked(config.mode)
    };
    let pipeline = Pipeline::new(&config, classifier).with_strategy(strategy);

    let input_reviews = reviews.clone();
    let report = pipeline.run(reviews).await;

    let report_dir = report_dir(&config.output_dir);
    write_report(&report_dir, &report)?;
    if !report.labeling.is_empty() {
        write_classifications(&report_dir, &input_reviews, &report.labeling)?;
    }
    info!("Reports written to {:?}", report_dir);

    println!("{}", serde_json::to_string_pretty(&report.summary)?);

    info!(
        "Completed in {:.1}s: {} reviews across {} chunks",
        report.duration.as_secs_f64(),
        report.summary.total_reviews,
        report.coverage.chunks_total
    );
    if report.labeling_failures() > 0 {
        warn!(
            "{} reviews could not be labelled and were summarized without labels",
            report.labeling_failures()
        );
    }
    if report.coverage.partial {
        warn!(
            "Partial coverage: {} of {} chunks failed ({} reviews excluded)",
            report.coverage.chunks_failed,
            report.coverage.chunks_total,
            report.coverage.reviews_excluded
        );
    }

    if let NarrativeStatus::Unavailable { error } = &report.narrative {
        error!("Counts were written but the narrative is missing");
        anyhow::bail!("{}", error.message);
    }

    Ok(())
}

fn print_chunk_plan(config: &Config, reviews: Vec<Review>, per_review: bool) {
    let total = reviews.len();
    let labelled = reviews.iter().filter(|r| r.is_labelled()).count();
    let chunks = if per_review {
        per_review_chunks(reviews)
    } else {
        plan_with(reviews, config.chunking())
    };

    println!("\n=== Chunk Plan ===\n");
    println!("Reviews: {} ({} labelled)", total, labelled);
    println!("Provider: {}", config.provider);
    println!(
        "Mode: {}",
        if per_review {
            "per-review"
        } else if config.mode == ExecutionMode::Sequential {
            "sequential"
        } else {
            "parallel"
        }
    );
    println!("Concurrency: {}", config.concurrency);
    println!("Failed chunk policy: {}", config.failed_chunk_policy);
    println!("Output dir: {:?}", config.output_dir);

    println!("\nChunks ({}):", chunks.len());
    for chunk in &chunks {
        println!("  - chunk {}: {} reviews", chunk.id, chunk.len());
    }
    println!();
}
