use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::providers::{AspectRatio, ImageGenerator};

/// Blocking wait between calls; swapped out in tests so nothing sleeps.
pub trait Pacer: Send + Sync {
    fn pause(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// Exponential backoff with jitter for rate-limited image calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `attempt`-th failure (1-based); `jitter` is in `[0, 1)`.
    pub fn delay_for(&self, attempt: u32, jitter: f64) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor) + self.max_jitter.mul_f64(jitter.clamp(0.0, 1.0))
    }
}

/// Turns prompts into data URLs. Never fails: exhausted or terminal errors yield `""`.
#[derive(Clone)]
pub struct ImageFetcher {
    generator: Arc<dyn ImageGenerator>,
    policy: RetryPolicy,
    pacer: Arc<dyn Pacer>,
}

impl ImageFetcher {
    pub fn new(generator: Arc<dyn ImageGenerator>, policy: RetryPolicy) -> Self {
        Self {
            generator,
            policy,
            pacer: Arc::new(ThreadPacer),
        }
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn pacer(&self) -> &dyn Pacer {
        self.pacer.as_ref()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn fetch(&self, prompt: &str, aspect: AspectRatio) -> String {
        self.fetch_with_ceiling(prompt, aspect, self.policy.max_attempts)
    }

    pub fn fetch_with_ceiling(&self, prompt: &str, aspect: AspectRatio, max_attempts: u32) -> String {
        let mut attempt = 0;
        while attempt < max_attempts {
            match self.generator.generate_image(prompt, aspect) {
                Ok(image) => {
                    debug!(attempt = attempt + 1, bytes = image.bytes.len(), "image ready");
                    return image.to_data_url();
                }
                Err(err) => {
                    attempt += 1;
                    if !err.is_rate_limited() {
                        warn!(
                            provider = self.generator.name(),
                            error = %err,
                            "image generation failed; continuing without image"
                        );
                        return String::new();
                    }
                    if attempt >= max_attempts {
                        warn!(
                            provider = self.generator.name(),
                            attempts = attempt,
                            error = %err,
                            "image generation still rate limited; continuing without image"
                        );
                        return String::new();
                    }
                    let delay = self.policy.delay_for(attempt, rand::thread_rng().gen::<f64>());
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "image generation rate limited; retrying"
                    );
                    self.pacer.pause(delay);
                }
            }
        }
        String::new()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::providers::{AspectRatio, GeneratedImage, ImageGenerator, ProviderError};

    use super::Pacer;

    #[derive(Default)]
    pub struct RecordingPacer {
        pub pauses: Mutex<Vec<Duration>>,
    }

    impl RecordingPacer {
        pub fn recorded(&self) -> Vec<Duration> {
            self.pauses.lock().map(|rows| rows.clone()).unwrap_or_default()
        }
    }

    impl Pacer for RecordingPacer {
        fn pause(&self, duration: Duration) {
            if let Ok(mut rows) = self.pauses.lock() {
                rows.push(duration);
            }
        }
    }

    pub enum Scripted {
        Image(&'static str),
        RateLimited,
        Fails,
    }

    /// Replays scripted outcomes, then succeeds with the prompt echoed as bytes.
    #[derive(Default)]
    pub struct ScriptedImages {
        pub script: Mutex<VecDeque<Scripted>>,
        pub calls: Mutex<Vec<(String, AspectRatio)>>,
    }

    impl ScriptedImages {
        pub fn with(script: Vec<Scripted>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<(String, AspectRatio)> {
            self.calls.lock().map(|rows| rows.clone()).unwrap_or_default()
        }
    }

    impl ImageGenerator for ScriptedImages {
        fn name(&self) -> &str {
            "scripted"
        }

        fn generate_image(
            &self,
            prompt: &str,
            aspect: AspectRatio,
        ) -> Result<GeneratedImage, ProviderError> {
            if let Ok(mut rows) = self.calls.lock() {
                rows.push((prompt.to_string(), aspect));
            }
            let next = self.script.lock().ok().and_then(|mut rows| rows.pop_front());
            match next {
                Some(Scripted::RateLimited) => Err(ProviderError::Http {
                    provider: "Imagen",
                    status: 429,
                    body: "RESOURCE_EXHAUSTED".to_string(),
                }),
                Some(Scripted::Fails) => Err(ProviderError::Http {
                    provider: "Imagen",
                    status: 400,
                    body: "prompt rejected".to_string(),
                }),
                Some(Scripted::Image(bytes)) => Ok(GeneratedImage {
                    bytes: bytes.as_bytes().to_vec(),
                    mime_type: "image/png".to_string(),
                }),
                None => Ok(GeneratedImage {
                    bytes: prompt.as_bytes().to_vec(),
                    mime_type: "image/png".to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::testing::{RecordingPacer, Scripted, ScriptedImages};
    use super::*;

    fn fetcher(script: Vec<Scripted>) -> (ImageFetcher, Arc<ScriptedImages>, Arc<RecordingPacer>) {
        let images = Arc::new(ScriptedImages::with(script));
        let pacer = Arc::new(RecordingPacer::default());
        let fetcher = ImageFetcher::new(images.clone(), RetryPolicy::default())
            .with_pacer(pacer.clone());
        (fetcher, images, pacer)
    }

    #[test]
    fn delay_doubles_per_attempt_plus_jitter() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1, 0.0), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2, 0.0), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(1, 0.5), Duration::from_millis(2500));
    }

    #[test]
    fn always_rate_limited_gives_up_after_ceiling() {
        let (fetcher, images, pacer) = fetcher(vec![
            Scripted::RateLimited,
            Scripted::RateLimited,
            Scripted::RateLimited,
        ]);
        assert_eq!(fetcher.fetch("rocket", AspectRatio::Wide), "");
        assert_eq!(images.calls().len(), 3);

        let pauses = pacer.recorded();
        assert_eq!(pauses.len(), 2);
        assert!(pauses[0] >= Duration::from_millis(2000) && pauses[0] < Duration::from_millis(3000));
        assert!(pauses[1] >= Duration::from_millis(4000) && pauses[1] < Duration::from_millis(5000));
    }

    #[test]
    fn recovers_on_second_attempt() {
        let (fetcher, images, pacer) =
            fetcher(vec![Scripted::RateLimited, Scripted::Image("png")]);
        assert_eq!(
            fetcher.fetch("rocket", AspectRatio::Square),
            "data:image/png;base64,cG5n"
        );
        assert_eq!(images.calls().len(), 2);
        assert_eq!(pacer.recorded().len(), 1);
    }

    #[test]
    fn terminal_error_stops_immediately() {
        let (fetcher, images, pacer) = fetcher(vec![Scripted::Fails, Scripted::Image("png")]);
        assert_eq!(fetcher.fetch("rocket", AspectRatio::Wide), "");
        assert_eq!(images.calls().len(), 1);
        assert!(pacer.recorded().is_empty());
    }

    #[test]
    fn zero_ceiling_never_calls_backend() {
        let (fetcher, images, _) = fetcher(Vec::new());
        assert_eq!(fetcher.fetch_with_ceiling("rocket", AspectRatio::Wide, 0), "");
        assert!(images.calls().is_empty());
    }
}
