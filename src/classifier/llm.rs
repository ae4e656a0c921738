use super::parse::{parse_batch_summary, parse_classification, parse_synthesis};
use super::prompts::{classify_prompt, summarize_prompt, synthesize_prompt};
use super::retry::retry_with_backoff;
use super::{BatchSummary, Classification, Classifier, Synthesis};
use crate::config::{Config, RetryConfig};
use crate::error::ClassifierError;
use crate::provider::{create_runner, Runner};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Classifier backed by a language model behind a provider [`Runner`].
pub struct LlmClassifier {
    runner: Arc<dyn Runner>,
    timeout: Duration,
    retry: RetryConfig,
}

impl LlmClassifier {
    /// Build from config. Fails early when the provider is misconfigured.
    pub fn from_config(config: &Config) -> Result<Self, ClassifierError> {
        let runner = create_runner(config.provider, &config.providers)?;
        debug!("Using {} provider", runner.name());
        Ok(Self::new(runner, config.call_timeout(), config.retry.clone()))
    }

    pub fn new(runner: Arc<dyn Runner>, timeout: Duration, retry: RetryConfig) -> Self {
        Self {
            runner,
            timeout,
            retry,
        }
    }

    /// Send a prompt and parse the answer, retrying transport failures and
    /// malformed answers.
    async fn ask<T, P>(&self, prompt: String, parse: P) -> Result<T, ClassifierError>
    where
        P: Fn(&str) -> Result<T, ClassifierError>,
    {
        let runner = self.runner.clone();
        let timeout = self.timeout;
        let prompt = &prompt;
        let parse = &parse;

        retry_with_backoff(
            &self.retry,
            |e: &ClassifierError| {
                matches!(
                    e,
                    ClassifierError::Transport(_) | ClassifierError::Classification(_)
                )
            },
            || {
                let runner = runner.clone();
                async move {
                    let output = runner.execute(prompt, timeout).await?;
                    debug!(
                        "{} answered in {:?} (exit {}, {} bytes)",
                        runner.name(),
                        output.duration,
                        output.exit_code,
                        output.stdout.len()
                    );
                    if !output.stderr.trim().is_empty() {
                        debug!("{} stderr: {}", runner.name(), output.stderr.trim());
                    }
                    parse(&output.stdout)
                }
            },
        )
        .await
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify_review(&self, text: &str) -> Result<Classification, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::InputValidation(
                "review text is empty".to_string(),
            ));
        }
        self.ask(classify_prompt(text), parse_classification).await
    }

    async fn summarize_batch(
        &self,
        formatted_reviews: &str,
    ) -> Result<BatchSummary, ClassifierError> {
        if formatted_reviews.trim().is_empty() {
            return Err(ClassifierError::InputValidation(
                "no reviews to summarize".to_string(),
            ));
        }
        self.ask(summarize_prompt(formatted_reviews), parse_batch_summary)
            .await
    }

    async fn synthesize_summaries(
        &self,
        concatenated_summaries: &str,
    ) -> Result<Synthesis, ClassifierError> {
        if concatenated_summaries.trim().is_empty() {
            return Err(ClassifierError::InputValidation(
                "no summaries to synthesize".to_string(),
            ));
        }
        self.ask(synthesize_prompt(concatenated_summaries), parse_synthesis)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::ProviderOutput;
    use crate::review::Sentiment;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays canned answers in order; `None` means a transport failure.
    struct ScriptedRunner {
        answers: Mutex<Vec<Option<String>>>,
        calls: AtomicU32,
    }

    impl ScriptedRunner {
        fn new(answers: Vec<Option<&str>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(
                    answers
                        .into_iter()
                        .rev()
                        .map(|a| a.map(String::from))
                        .collect(),
                ),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl Runner for ScriptedRunner {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn execute(
            &self,
            _prompt: &str,
            timeout: Duration,
        ) -> Result<ProviderOutput, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.answers.lock().unwrap().pop().flatten();
            match next {
                Some(stdout) => Ok(ProviderOutput {
                    stdout,
                    stderr: String::new(),
                    duration: Duration::from_millis(1),
                    exit_code: 0,
                }),
                None => Err(ProviderError::Timeout(timeout)),
            }
        }
    }

    fn retry(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            backoff_base_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_classify_review_parses_answer() {
        let runner = ScriptedRunner::new(vec![Some(
            r#"{"summary": "Friendly staff", "sentiment": "Positive", "tags": ["Customer Support"]}"#,
        )]);
        let classifier = LlmClassifier::new(runner.clone(), Duration::from_secs(1), retry(1));

        let c = classifier.classify_review("Great support team").await.unwrap();
        assert_eq!(c.sentiment, Sentiment::Positive);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_retried() {
        let runner = ScriptedRunner::new(vec![
            None,
            Some(r#"{"Final_summary": "ok", "Final_key_insights": []}"#),
        ]);
        let classifier = LlmClassifier::new(runner.clone(), Duration::from_secs(1), retry(3));

        let s = classifier.synthesize_summaries("a\nb").await.unwrap();
        assert_eq!(s.summary, "ok");
        assert_eq!(runner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_after_attempts() {
        let runner = ScriptedRunner::new(vec![None, None]);
        let classifier = LlmClassifier::new(runner.clone(), Duration::from_secs(1), retry(2));

        let err = classifier.summarize_batch("1. text").await.unwrap_err();
        assert!(matches!(err, ClassifierError::Transport(_)));
        assert_eq!(runner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_input_is_not_sent() {
        let runner = ScriptedRunner::new(vec![]);
        let classifier = LlmClassifier::new(runner.clone(), Duration::from_secs(1), retry(3));

        let err = classifier.classify_review("  ").await.unwrap_err();
        assert!(matches!(err, ClassifierError::InputValidation(_)));
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }
}
