use parking_lot::Mutex;
use std::sync::Arc;

use super::data::{AnalysisResult, ProfileData, ProfileField, StoredImage};
use super::gallery::Gallery;
use crate::ai::{FieldSuggester, ImageGenerator, ProfileAnalyzer};
use crate::error::SoulError;

/// Where a submission currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Analyzing,
    Creating,
}

impl Phase {
    pub fn is_busy(&self) -> bool {
        *self != Phase::Idle
    }
}

/// How a call to [`Controller::submit`] ended
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Another submission was still running
    Ignored,
    /// The image was generated and stored
    Completed(StoredImage),
    /// A collaborator or the store failed
    Failed(SoulError),
}

/// Everything the UI renders, copied out of the controller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub phase: Phase,
    pub analysis: Option<AnalysisResult>,
    pub image_url: Option<String>,
    pub error: Option<String>,
    /// Gallery mirror, newest first
    pub gallery: Vec<StoredImage>,
    pub gallery_loading: bool,
    pub suggesting: Option<ProfileField>,
}

/// The remote services a controller talks to
#[derive(Clone)]
pub struct Collaborators {
    pub analyzer: Arc<dyn ProfileAnalyzer>,
    pub generator: Arc<dyn ImageGenerator>,
    pub suggester: Arc<dyn FieldSuggester>,
}

impl Collaborators {
    /// Use one service for all three roles
    pub fn from_single<S>(service: Arc<S>) -> Self
    where
        S: ProfileAnalyzer + ImageGenerator + FieldSuggester + 'static,
    {
        Self {
            analyzer: service.clone(),
            generator: service.clone(),
            suggester: service,
        }
    }
}

/// Runs the analyze → generate → store workflow.
///
/// Cloning is cheap; clones share the same state and gallery handle.
/// At most one submission and one field suggestion run at a time.
#[derive(Clone)]
pub struct Controller {
    services: Collaborators,
    gallery: Arc<Gallery>,
    state: Arc<Mutex<Snapshot>>,
}

impl Controller {
    pub fn new(gallery: Arc<Gallery>, services: Collaborators) -> Self {
        Self {
            services,
            gallery,
            state: Arc::new(Mutex::new(Snapshot {
                gallery_loading: true,
                ..Snapshot::default()
            })),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    /// Read the stored gallery into the in-memory mirror.
    ///
    /// On failure the mirror stays empty and the error is shown.
    pub async fn load_gallery(&self) -> Result<usize, SoulError> {
        let gallery = Arc::clone(&self.gallery);
        let result = tokio::task::spawn_blocking(move || gallery.get_all())
            .await
            .map_err(SoulError::from)
            .and_then(|images| images.map_err(SoulError::from));

        let mut state = self.state.lock();
        state.gallery_loading = false;
        match result {
            Ok(images) => {
                log::info!("🖼️  Loaded {} images from the gallery", images.len());
                let count = images.len();
                state.gallery = images;
                Ok(count)
            }
            Err(err) => {
                log::error!("Failed to load gallery: {}", err);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Run one submission: analyze the profile, generate the image, store it.
    ///
    /// Returns [`SubmitOutcome::Ignored`] without calling anything if a
    /// submission is already in flight.
    pub async fn submit(&self, profile: ProfileData) -> SubmitOutcome {
        {
            let mut state = self.state.lock();
            if state.phase.is_busy() {
                log::debug!("Ignoring submission while {:?}", state.phase);
                return SubmitOutcome::Ignored;
            }
            state.phase = Phase::Analyzing;
            state.error = None;
            state.analysis = None;
            state.image_url = None;
        }

        let outcome = match self.run(&profile).await {
            Ok(image) => SubmitOutcome::Completed(image),
            Err(err) => {
                log::error!("Submission failed: {}", err);
                SubmitOutcome::Failed(err)
            }
        };

        let mut state = self.state.lock();
        state.phase = Phase::Idle;
        if let SubmitOutcome::Failed(err) = &outcome {
            state.error = Some(err.to_string());
        }
        outcome
    }

    async fn run(&self, profile: &ProfileData) -> Result<StoredImage, SoulError> {
        log::info!("👻 Analyzing profile {}", profile.username);
        let analysis = self.services.analyzer.analyze(profile).await?;
        let visual_prompt = analysis.visual_prompt.clone();
        {
            let mut state = self.state.lock();
            state.analysis = Some(analysis);
            state.phase = Phase::Creating;
        }

        log::info!("🎨 Creating ghost image");
        let image_url = self.services.generator.generate(&visual_prompt).await?;
        self.state.lock().image_url = Some(image_url.clone());

        let gallery = Arc::clone(&self.gallery);
        let stored = tokio::task::spawn_blocking(move || gallery.insert(&image_url)).await??;

        self.state.lock().gallery.insert(0, stored.clone());
        log::info!("✅ Stored image {} in the gallery", stored.id);
        Ok(stored)
    }

    /// Ask the suggester for a value for `field`.
    ///
    /// Returns `None` if another suggestion is running or the suggester
    /// failed; failures are logged and never shown as errors.
    pub async fn suggest(&self, field: ProfileField) -> Option<String> {
        {
            let mut state = self.state.lock();
            if state.suggesting.is_some() {
                return None;
            }
            state.suggesting = Some(field);
        }

        let result = self.services.suggester.suggest(field).await;
        self.state.lock().suggesting = None;

        match result {
            Ok(text) => Some(text),
            Err(err) => {
                log::warn!("Failed to generate suggestion for {}: {}", field.name(), err);
                None
            }
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("gallery", &self.gallery)
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            username: "@spectral".to_string(),
            soul_description: "A gentle dreamer.".to_string(),
            visual_prompt: "A ghost with headphones".to_string(),
        }
    }

    fn profile() -> ProfileData {
        ProfileData {
            username: "@spectral".to_string(),
            bio: "Coder, dreamer".to_string(),
            latest_post: "Shipped it".to_string(),
            ..ProfileData::default()
        }
    }

    /// Analyzer that optionally waits for the test to release it
    #[derive(Default)]
    struct MockAnalyzer {
        calls: AtomicUsize,
        gate: Option<Notify>,
        fail: bool,
    }

    #[async_trait]
    impl ProfileAnalyzer for MockAnalyzer {
        async fn analyze(&self, _profile: &ProfileData) -> Result<AnalysisResult, SoulError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                Err(SoulError::Analysis("analysis down".to_string()))
            } else {
                Ok(analysis())
            }
        }
    }

    #[derive(Default)]
    struct MockGenerator {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ImageGenerator for MockGenerator {
        async fn generate(&self, visual_prompt: &str) -> Result<String, SoulError> {
            self.prompts.lock().push(visual_prompt.to_string());
            if self.fail {
                Err(SoulError::Generation("ether unstable".to_string()))
            } else {
                Ok("data:image/png;base64,QUJD".to_string())
            }
        }
    }

    #[derive(Default)]
    struct MockSuggester {
        fail: bool,
    }

    #[async_trait]
    impl FieldSuggester for MockSuggester {
        async fn suggest(&self, field: ProfileField) -> Result<String, SoulError> {
            if self.fail {
                Err(SoulError::Suggestion(format!("no {}", field.name())))
            } else {
                Ok(format!("suggested {}", field.name()))
            }
        }
    }

    struct Harness {
        controller: Controller,
        gallery: Arc<Gallery>,
        analyzer: Arc<MockAnalyzer>,
        generator: Arc<MockGenerator>,
    }

    fn harness_with(
        gallery: Gallery,
        analyzer: MockAnalyzer,
        generator: MockGenerator,
        suggester: MockSuggester,
    ) -> Harness {
        let gallery = Arc::new(gallery);
        let analyzer = Arc::new(analyzer);
        let generator = Arc::new(generator);
        let services = Collaborators {
            analyzer: analyzer.clone(),
            generator: generator.clone(),
            suggester: Arc::new(suggester),
        };
        Harness {
            controller: Controller::new(gallery.clone(), services),
            gallery,
            analyzer,
            generator,
        }
    }

    fn harness(analyzer: MockAnalyzer, generator: MockGenerator) -> Harness {
        harness_with(
            Gallery::open_in_memory().unwrap(),
            analyzer,
            generator,
            MockSuggester::default(),
        )
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let h = harness(MockAnalyzer::default(), MockGenerator::default());
        h.controller.load_gallery().await.unwrap();

        let outcome = h.controller.submit(profile()).await;
        let stored = match outcome {
            SubmitOutcome::Completed(image) => image,
            other => panic!("unexpected outcome: {:?}", other),
        };

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.analysis, Some(analysis()));
        assert_eq!(snapshot.image_url.as_deref(), Some("data:image/png;base64,QUJD"));
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.gallery, vec![stored.clone()]);

        assert_eq!(h.gallery.get_all().unwrap(), vec![stored]);
        assert_eq!(*h.generator.prompts.lock(), vec!["A ghost with headphones".to_string()]);
    }

    #[tokio::test]
    async fn test_mirror_prepends_newest() {
        let h = harness(MockAnalyzer::default(), MockGenerator::default());
        h.gallery.insert("data:image/png;base64,OLD").unwrap();
        h.controller.load_gallery().await.unwrap();

        let stored = match h.controller.submit(profile()).await {
            SubmitOutcome::Completed(image) => image,
            other => panic!("unexpected outcome: {:?}", other),
        };

        let mirror = h.controller.snapshot().gallery;
        assert_eq!(mirror.len(), 2);
        assert_eq!(mirror[0], stored);
        assert_eq!(mirror[1].url, "data:image/png;base64,OLD");
    }

    #[tokio::test]
    async fn test_second_submission_ignored_while_analyzing() {
        let h = harness(
            MockAnalyzer {
                gate: Some(Notify::new()),
                ..MockAnalyzer::default()
            },
            MockGenerator::default(),
        );

        let first = {
            let controller = h.controller.clone();
            tokio::spawn(async move { controller.submit(profile()).await })
        };

        while h.analyzer.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(h.controller.phase(), Phase::Analyzing);

        assert_eq!(h.controller.submit(profile()).await, SubmitOutcome::Ignored);
        assert_eq!(h.controller.phase(), Phase::Analyzing);
        assert_eq!(h.analyzer.calls.load(Ordering::SeqCst), 1);

        if let Some(gate) = &h.analyzer.gate {
            gate.notify_one();
        }
        assert!(matches!(first.await.unwrap(), SubmitOutcome::Completed(_)));
        assert_eq!(h.analyzer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.controller.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_generation_failure_returns_to_idle() {
        let h = harness(
            MockAnalyzer::default(),
            MockGenerator {
                fail: true,
                ..MockGenerator::default()
            },
        );
        h.controller.load_gallery().await.unwrap();

        let outcome = h.controller.submit(profile()).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Failed(SoulError::Generation("ether unstable".to_string()))
        );

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.error.as_deref(), Some("ether unstable"));
        assert_eq!(snapshot.image_url, None);
        assert!(snapshot.gallery.is_empty());
        assert_eq!(h.gallery.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_analysis_failure_skips_generator() {
        let h = harness(
            MockAnalyzer {
                fail: true,
                ..MockAnalyzer::default()
            },
            MockGenerator::default(),
        );

        let outcome = h.controller.submit(profile()).await;
        assert!(matches!(outcome, SubmitOutcome::Failed(SoulError::Analysis(_))));
        assert!(h.generator.prompts.lock().is_empty());

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.analysis, None);
        assert_eq!(snapshot.error.as_deref(), Some("analysis down"));
    }

    #[tokio::test]
    async fn test_new_submission_clears_previous_error_and_result() {
        let h = harness(
            MockAnalyzer {
                fail: true,
                ..MockAnalyzer::default()
            },
            MockGenerator::default(),
        );
        {
            let mut state = h.controller.state.lock();
            state.analysis = Some(analysis());
            state.image_url = Some("data:image/png;base64,PREV".to_string());
        }

        h.controller.submit(profile()).await;

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.analysis, None);
        assert_eq!(snapshot.image_url, None);
        assert_eq!(snapshot.error.as_deref(), Some("analysis down"));
    }

    #[tokio::test]
    async fn test_store_failure_keeps_displayed_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.db");
        let h = harness_with(
            Gallery::open(&path).unwrap(),
            MockAnalyzer::default(),
            MockGenerator::default(),
            MockSuggester::default(),
        );
        h.controller.load_gallery().await.unwrap();

        rusqlite::Connection::open(&path)
            .unwrap()
            .execute("DROP TABLE soul_images", [])
            .unwrap();

        let outcome = h.controller.submit(profile()).await;
        assert!(matches!(outcome, SubmitOutcome::Failed(SoulError::Storage(_))));

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.analysis, Some(analysis()));
        assert_eq!(snapshot.image_url.as_deref(), Some("data:image/png;base64,QUJD"));
        assert!(snapshot.gallery.is_empty());
        assert!(snapshot.error.is_some());
    }

    #[tokio::test]
    async fn test_load_gallery_newest_first() {
        let h = harness(MockAnalyzer::default(), MockGenerator::default());
        assert!(h.controller.snapshot().gallery_loading);

        for n in 0..3 {
            h.gallery.insert(&format!("data:image/png;base64,{}", n)).unwrap();
        }

        assert_eq!(h.controller.load_gallery().await.unwrap(), 3);
        let snapshot = h.controller.snapshot();
        assert!(!snapshot.gallery_loading);
        assert_eq!(snapshot.gallery, h.gallery.get_all().unwrap());
    }

    #[tokio::test]
    async fn test_suggestion() {
        let h = harness(MockAnalyzer::default(), MockGenerator::default());
        assert_eq!(
            h.controller.suggest(ProfileField::MoodWords).await.as_deref(),
            Some("suggested moodWords")
        );
        assert_eq!(h.controller.snapshot().suggesting, None);
    }

    #[tokio::test]
    async fn test_suggestion_failure_is_swallowed() {
        let h = harness_with(
            Gallery::open_in_memory().unwrap(),
            MockAnalyzer::default(),
            MockGenerator::default(),
            MockSuggester { fail: true },
        );

        assert_eq!(h.controller.suggest(ProfileField::Bio).await, None);
        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.suggesting, None);
    }

    #[tokio::test]
    async fn test_suggestion_single_flight() {
        let h = harness(MockAnalyzer::default(), MockGenerator::default());
        h.controller.state.lock().suggesting = Some(ProfileField::Bio);

        assert_eq!(h.controller.suggest(ProfileField::Emojis).await, None);
        assert_eq!(h.controller.snapshot().suggesting, Some(ProfileField::Bio));
    }
}
