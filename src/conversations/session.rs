use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};

use super::fallback::canned_reply;
use super::report::TranscriptReport;
use super::types::{ChatEvent, PlaybackOutcome, Role, TranscriptMessage};
use crate::error::SpeechError;
use crate::i18n::{Language, INPUT_PLACEHOLDER};
use crate::speech::{
    NoopRecognizer, NoopSynthesizer, PlaybackSlot, PlaybackToggle, SpeechRecognizer,
    SpeechSynthesizer, Utterance,
};
use crate::webhook::{FarmerContext, OutboundPayload, TurnInput, WebhookTransport};

/// Caption sent with an image when no speech could be captured.
pub const IMAGE_PLACEHOLDER_CAPTION: &str = "Image uploaded for analysis";

pub type ChatEventSender = mpsc::UnboundedSender<ChatEvent>;

/// Headless chat screen: owns the transcript and drives one relay call per
/// user turn.
///
/// All methods take `&self`, so overlapping turns are allowed; replies are
/// appended in the order their calls resolve.
pub struct ChatSession {
    transport: Arc<dyn WebhookTransport>,
    recognizer: Arc<dyn SpeechRecognizer>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    context: FarmerContext,
    language: RwLock<Language>,
    transcript: RwLock<Vec<TranscriptMessage>>,
    in_flight: AtomicUsize,
    recording: AtomicBool,
    capture_generation: AtomicU64,
    playback: PlaybackSlot,
    events: Option<ChatEventSender>,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn WebhookTransport>, context: FarmerContext) -> Self {
        let language = Language::default();
        Self {
            transport,
            recognizer: Arc::new(NoopRecognizer),
            synthesizer: Arc::new(NoopSynthesizer),
            context,
            language: RwLock::new(language),
            transcript: RwLock::new(vec![TranscriptMessage::welcome(language)]),
            in_flight: AtomicUsize::new(0),
            recording: AtomicBool::new(false),
            capture_generation: AtomicU64::new(0),
            playback: PlaybackSlot::new(),
            events: None,
        }
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_events(mut self, events: ChatEventSender) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: ChatEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    pub async fn language(&self) -> Language {
        *self.language.read().await
    }

    pub async fn placeholder(&self) -> &'static str {
        INPUT_PLACEHOLDER.get(self.language().await)
    }

    /// Switch language and restart the conversation with the new welcome.
    pub async fn toggle_language(&self) -> Language {
        let language = {
            let mut current = self.language.write().await;
            *current = current.toggled();
            *current
        };
        info!("Language switched to {}", language);
        self.restart(language).await;
        language
    }

    /// Drop local state: stop playback and restore the welcome transcript.
    pub async fn reset(&self) {
        if self.playback.clear().is_some() {
            self.synthesizer.cancel();
            self.emit(ChatEvent::PlaybackChanged(None));
        }
        let language = self.language().await;
        self.restart(language).await;
    }

    async fn restart(&self, language: Language) {
        *self.transcript.write().await = vec![TranscriptMessage::welcome(language)];
        self.emit(ChatEvent::TranscriptReset { language });
    }

    pub async fn transcript(&self) -> Vec<TranscriptMessage> {
        self.transcript.read().await.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// Whether the host offers speech capture at all.
    pub fn can_listen(&self) -> bool {
        self.recognizer.is_available()
    }

    pub fn currently_playing(&self) -> Option<String> {
        self.playback.current()
    }

    async fn append(&self, message: TranscriptMessage) {
        let id = message.id.clone();
        self.transcript.write().await.push(message);
        self.emit(ChatEvent::MessageAppended { id });
    }

    pub async fn submit_text(&self, text: &str) -> Option<TranscriptMessage> {
        self.send(TurnInput::Text(text.to_string())).await
    }

    /// Capture one spoken query and send it. Does nothing when speech is
    /// unavailable or nothing was heard.
    pub async fn submit_voice(&self) -> Option<TranscriptMessage> {
        match self.capture_speech().await {
            Ok(transcript) => self.send(TurnInput::Speech(transcript)).await,
            Err(e) => {
                debug!("Voice turn dropped: {}", e);
                None
            }
        }
    }

    /// Send an image, captioned by speech when it can be captured.
    pub async fn submit_image(&self, image: String) -> Option<TranscriptMessage> {
        let caption = match self.capture_speech().await {
            Ok(transcript) => transcript,
            Err(e) => {
                debug!("No caption for image ({}), using placeholder", e);
                IMAGE_PLACEHOLDER_CAPTION.to_string()
            }
        };
        self.send(TurnInput::ImageSpeech { caption, image }).await
    }

    async fn capture_speech(&self) -> Result<String, SpeechError> {
        if !self.recognizer.is_available() {
            return Err(SpeechError::Unavailable);
        }
        let locale = self.language().await.locale();

        // single capture at a time
        self.recognizer.stop();
        let recording = RecordingGuard::start(self);
        let result = self.recognizer.recognize(locale).await;
        drop(recording);

        match result {
            Ok(transcript) if transcript.trim().is_empty() => Err(SpeechError::NoMatch),
            other => other,
        }
    }

    pub fn stop_recording(&self) {
        if self.is_recording() {
            self.recognizer.stop();
            self.set_recording(false);
        }
    }

    fn set_recording(&self, recording: bool) {
        if self.recording.swap(recording, Ordering::SeqCst) != recording {
            self.emit(ChatEvent::RecordingChanged(recording));
        }
    }

    /// Run one turn. Returns the assistant reply, or `None` when the turn
    /// was rejected as empty.
    pub async fn send(&self, turn: TurnInput) -> Option<TranscriptMessage> {
        if !turn.is_sendable() {
            debug!("Ignoring empty {} turn", turn.payload_type().as_str());
            return None;
        }

        let language = self.language().await;
        self.append(TranscriptMessage::user(&turn)).await;

        let payload = OutboundPayload::from_turn(&turn, language, &self.context);
        let loading = LoadingGuard::begin(self);

        let transport = Arc::clone(&self.transport);
        let outcome = tokio::spawn(async move { transport.submit(&payload).await }).await;

        let reply = match outcome {
            Ok(envelope) if envelope.success => TranscriptMessage::from_envelope(&envelope),
            Ok(envelope) => {
                warn!(
                    "Webhook via {} failed ({}), using offline reply",
                    self.transport.name(),
                    envelope.error.as_deref().unwrap_or(&envelope.message)
                );
                canned_reply(&turn, language)
            }
            Err(e) => {
                error!("API call failed: {}", e);
                canned_reply(&turn, language)
            }
        };

        drop(loading);
        self.append(reply.clone()).await;
        Some(reply)
    }


    /// Read an assistant message aloud, or stop it if it is already playing.
    pub async fn play_message(&self, message_id: &str) -> PlaybackOutcome {
        if !self.synthesizer.is_available() {
            warn!("Speech synthesis not supported on this platform");
            return PlaybackOutcome::Unsupported;
        }

        let text = {
            let transcript = self.transcript.read().await;
            match transcript
                .iter()
                .find(|msg| msg.id == message_id && msg.role == Role::Assistant)
            {
                Some(msg) => msg.content.clone(),
                None => return PlaybackOutcome::UnknownMessage,
            }
        };

        match self.playback.toggle(message_id) {
            PlaybackToggle::Released => {
                self.synthesizer.cancel();
                self.emit(ChatEvent::PlaybackChanged(None));
                PlaybackOutcome::Stopped
            }
            PlaybackToggle::Acquired { released } => {
                if let Some(previous) = released {
                    debug!("Interrupting playback of {}", previous);
                }
                self.synthesizer.cancel();

                let language = self.language().await;
                let voices = self.synthesizer.voices();
                let utterance = Utterance::for_language(text, language, &voices);

                match self.synthesizer.speak(utterance) {
                    Ok(()) => {
                        self.emit(ChatEvent::PlaybackChanged(Some(message_id.to_string())));
                        PlaybackOutcome::Playing
                    }
                    Err(e) => {
                        warn!("Speech synthesis error: {}", e);
                        self.playback.release(message_id);
                        self.emit(ChatEvent::PlaybackChanged(None));
                        PlaybackOutcome::Stopped
                    }
                }
            }
        }
    }

    /// Called by the host when an utterance ends or errors.
    pub fn playback_finished(&self, message_id: &str) {
        if self.playback.release(message_id) {
            self.emit(ChatEvent::PlaybackChanged(None));
        }
    }

    pub async fn export_report(&self) -> TranscriptReport {
        let language = self.language().await;
        let transcript = self.transcript.read().await;
        TranscriptReport::new(language, &transcript)
    }

    pub async fn write_report(&self, dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        self.export_report().await.write_to(dir)
    }
}

/// Counts one in-flight turn; the count drops even if the turn is cancelled.
struct LoadingGuard<'a> {
    session: &'a ChatSession,
}

impl<'a> LoadingGuard<'a> {
    fn begin(session: &'a ChatSession) -> Self {
        if session.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            session.emit(ChatEvent::LoadingChanged(true));
        }
        Self { session }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.session.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.session.emit(ChatEvent::LoadingChanged(false));
        }
    }
}

/// Holds the recording flag for one capture. A newer capture takes over the
/// flag, so an older one finishing leaves it alone.
struct RecordingGuard<'a> {
    session: &'a ChatSession,
    generation: u64,
}

impl<'a> RecordingGuard<'a> {
    fn start(session: &'a ChatSession) -> Self {
        let generation = session.capture_generation.fetch_add(1, Ordering::SeqCst) + 1;
        session.set_recording(true);
        Self {
            session,
            generation,
        }
    }
}

impl Drop for RecordingGuard<'_> {
    fn drop(&mut self) {
        if self.session.capture_generation.load(Ordering::SeqCst) == self.generation {
            self.session.set_recording(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversations::types::Analysis;
    use crate::speech::Voice;
    use crate::webhook::{PayloadType, RelayClient, ResponseEnvelope};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records payloads and answers with a fixed envelope.
    struct StubTransport {
        reply: ResponseEnvelope,
        seen: Mutex<Vec<OutboundPayload>>,
    }

    impl StubTransport {
        fn new(reply: ResponseEnvelope) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn payloads(&self) -> Vec<OutboundPayload> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WebhookTransport for StubTransport {
        async fn submit(&self, payload: &OutboundPayload) -> ResponseEnvelope {
            self.seen.lock().unwrap().push(payload.clone());
            self.reply.clone()
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    struct PanickingTransport;

    #[async_trait]
    impl WebhookTransport for PanickingTransport {
        async fn submit(&self, _payload: &OutboundPayload) -> ResponseEnvelope {
            panic!("transport blew up");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    /// Replies after a delay taken from the query, echoing it back.
    struct DelayedEchoTransport;

    #[async_trait]
    impl WebhookTransport for DelayedEchoTransport {
        async fn submit(&self, payload: &OutboundPayload) -> ResponseEnvelope {
            let millis = if payload.query == "slow" { 150 } else { 10 };
            tokio::time::sleep(Duration::from_millis(millis)).await;
            ResponseEnvelope::success("ok", payload.query.clone())
        }

        fn name(&self) -> &'static str {
            "delayed"
        }
    }

    /// Never answers within a test's patience.
    struct StalledTransport;

    #[async_trait]
    impl WebhookTransport for StalledTransport {
        async fn submit(&self, _payload: &OutboundPayload) -> ResponseEnvelope {
            tokio::time::sleep(Duration::from_secs(5)).await;
            ResponseEnvelope::success("ok", "late")
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    /// Takes a while to hear anything.
    struct SlowRecognizer;

    #[async_trait]
    impl SpeechRecognizer for SlowRecognizer {
        async fn recognize(&self, _locale: &str) -> Result<String, SpeechError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok("sowing time for maize".to_string())
        }

        fn stop(&self) {}
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ChatEvent>) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    struct ScriptedRecognizer {
        result: Result<String, SpeechError>,
        locales: Mutex<Vec<String>>,
    }

    impl ScriptedRecognizer {
        fn new(result: Result<String, SpeechError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                locales: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SpeechRecognizer for ScriptedRecognizer {
        async fn recognize(&self, locale: &str) -> Result<String, SpeechError> {
            self.locales.lock().unwrap().push(locale.to_string());
            self.result.clone()
        }

        fn stop(&self) {}
    }

    #[derive(Default)]
    struct LoggingSynthesizer {
        calls: Mutex<Vec<String>>,
    }

    impl LoggingSynthesizer {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SpeechSynthesizer for LoggingSynthesizer {
        fn voices(&self) -> Vec<Voice> {
            vec![Voice::new("Samantha", "en-US")]
        }

        fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("speak:{}:{}", utterance.lang, utterance.text));
            Ok(())
        }

        fn cancel(&self) {
            self.calls.lock().unwrap().push("cancel".to_string());
        }
    }

    fn ok_envelope(body: &str) -> ResponseEnvelope {
        ResponseEnvelope::success("Webhook processed successfully", body)
    }

    fn failed_envelope() -> ResponseEnvelope {
        ResponseEnvelope::failure("Failed to communicate with webhook service", "connection refused")
    }

    #[tokio::test]
    async fn starts_with_welcome_message() {
        let session = ChatSession::new(StubTransport::new(ok_envelope("x")), FarmerContext::default());
        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role, Role::Assistant);
        assert!(transcript[0].content.starts_with("Hello!"));
    }

    #[tokio::test]
    async fn empty_turn_is_rejected_without_side_effects() {
        let transport = StubTransport::new(ok_envelope("x"));
        let session = ChatSession::new(transport.clone(), FarmerContext::default());

        assert!(session.submit_text("   ").await.is_none());
        assert_eq!(session.transcript().await.len(), 1);
        assert!(transport.payloads().is_empty());
    }

    #[tokio::test]
    async fn successful_turn_appends_user_and_reply() {
        let transport = StubTransport::new(ok_envelope("Apply 50kg DAP per acre"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = ChatSession::new(transport.clone(), FarmerContext::default()).with_events(tx);

        let reply = session.submit_text("fertilizer for wheat").await.unwrap();
        assert_eq!(reply.content, "Apply 50kg DAP per acre");
        assert_eq!(reply.analysis, Some(Analysis::pipeline_notice()));

        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].role, Role::User);
        assert_eq!(transcript[1].message_type, Some(PayloadType::Text));
        assert_eq!(transcript[2].id, reply.id);

        let payload = &transport.payloads()[0];
        assert_eq!(payload.payload_type, PayloadType::Text);
        assert_eq!(payload.query, "fertilizer for wheat");
        assert_eq!(payload.farmer_name.as_deref(), Some("Smart Kissan User"));

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                ChatEvent::MessageAppended {
                    id: transcript[1].id.clone()
                },
                ChatEvent::LoadingChanged(true),
                ChatEvent::LoadingChanged(false),
                ChatEvent::MessageAppended { id: reply.id.clone() },
            ]
        );
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn empty_workflow_body_shows_status_message() {
        let session = ChatSession::new(StubTransport::new(ok_envelope("")), FarmerContext::default());
        let reply = session.submit_text("hello").await.unwrap();
        assert_eq!(reply.content, "Webhook processed successfully");
    }

    #[tokio::test]
    async fn failed_relay_falls_back_to_english_disease_analysis() {
        let session = ChatSession::new(StubTransport::new(failed_envelope()), FarmerContext::default());

        let reply = session.submit_text("disease").await.unwrap();
        assert!(reply.content.contains("leaf blight"));
        let analysis = reply.analysis.unwrap();
        assert_eq!(analysis.confidence, Some(87));
        assert_eq!(analysis.disease.as_deref(), Some("Leaf Blight"));
    }

    #[tokio::test]
    async fn unreachable_relay_falls_back_to_canned_reply() {
        let transport = Arc::new(RelayClient::new("http://127.0.0.1:1/webhook"));
        let session = ChatSession::new(transport, FarmerContext::default());

        let reply = session.submit_text("disease").await.unwrap();
        assert!(reply.analysis.unwrap().confidence.is_some());
    }

    #[tokio::test]
    async fn panicking_transport_falls_back_to_canned_reply() {
        let session = ChatSession::new(Arc::new(PanickingTransport), FarmerContext::default());

        let reply = session.submit_text("what to sow in march").await.unwrap();
        let analysis = reply.analysis.unwrap();
        assert!(analysis.disease.is_none());
        assert_eq!(analysis.recommendations[0], "Maintain proper soil pH (6.0-7.0)");
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn toggled_language_is_sent_and_used_for_fallback() {
        let transport = StubTransport::new(failed_envelope());
        let session = ChatSession::new(transport.clone(), FarmerContext::default());

        assert_eq!(session.toggle_language().await, Language::Ur);
        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 1);
        assert!(transcript[0].content.starts_with("السلام"));

        let reply = session.submit_text("بیماری").await.unwrap();
        assert_eq!(transport.payloads()[0].language, Language::Ur);
        assert_eq!(reply.analysis.unwrap().disease.as_deref(), Some("پتوں کا جھلساؤ"));
    }

    #[tokio::test]
    async fn voice_turn_uses_recognized_transcript() {
        let transport = StubTransport::new(ok_envelope("ok"));
        let recognizer = ScriptedRecognizer::new(Ok("when to irrigate cotton".to_string()));
        let session = ChatSession::new(transport.clone(), FarmerContext::default())
            .with_recognizer(recognizer.clone());
        session.toggle_language().await;

        session.submit_voice().await.unwrap();

        let payload = &transport.payloads()[0];
        assert_eq!(payload.payload_type, PayloadType::Speech);
        assert_eq!(payload.content, "when to irrigate cotton");
        assert!(payload.image.is_none());
        assert_eq!(recognizer.locales.lock().unwrap().as_slice(), ["ur-PK"]);
        assert!(!session.is_recording());
    }

    #[tokio::test]
    async fn newer_capture_keeps_recording_flag_when_older_one_ends() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = ChatSession::new(StubTransport::new(ok_envelope("ok")), FarmerContext::default())
            .with_recognizer(Arc::new(SlowRecognizer))
            .with_events(tx);

        let first = session.submit_voice();
        let second = async {
            tokio::time::sleep(Duration::from_millis(40)).await;
            session.submit_voice().await
        };
        let between = async {
            // first capture has ended, second is still listening
            tokio::time::sleep(Duration::from_millis(120)).await;
            session.is_recording()
        };

        let (first, second, recording_between) = futures::join!(first, second, between);
        assert!(first.is_some());
        assert!(second.is_some());
        assert!(recording_between);
        assert!(!session.is_recording());

        let recording_events: Vec<ChatEvent> = drain(&mut rx)
            .into_iter()
            .filter(|event| matches!(event, ChatEvent::RecordingChanged(_)))
            .collect();
        assert_eq!(
            recording_events,
            vec![
                ChatEvent::RecordingChanged(true),
                ChatEvent::RecordingChanged(false)
            ]
        );
    }

    #[tokio::test]
    async fn cancelled_turn_clears_loading() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = ChatSession::new(Arc::new(StalledTransport), FarmerContext::default())
            .with_events(tx);

        let outcome =
            tokio::time::timeout(Duration::from_millis(50), session.submit_text("q")).await;
        assert!(outcome.is_err());
        assert!(!session.is_loading());

        let loading_events: Vec<ChatEvent> = drain(&mut rx)
            .into_iter()
            .filter(|event| matches!(event, ChatEvent::LoadingChanged(_)))
            .collect();
        assert_eq!(
            loading_events,
            vec![
                ChatEvent::LoadingChanged(true),
                ChatEvent::LoadingChanged(false)
            ]
        );
    }

    #[tokio::test]
    async fn voice_turn_without_speech_does_nothing() {
        let transport = StubTransport::new(ok_envelope("ok"));
        let session = ChatSession::new(transport.clone(), FarmerContext::default());

        assert!(!session.can_listen());
        assert!(session.submit_voice().await.is_none());
        assert!(transport.payloads().is_empty());
        assert_eq!(session.transcript().await.len(), 1);
    }

    #[tokio::test]
    async fn scripted_recognizer_can_listen() {
        let session = ChatSession::new(StubTransport::new(ok_envelope("ok")), FarmerContext::default())
            .with_recognizer(ScriptedRecognizer::new(Ok("wheat rust".to_string())));

        assert!(session.can_listen());
        let reply = session.submit_voice().await.unwrap();
        assert_eq!(reply.content, "ok");
    }

    #[tokio::test]
    async fn image_turn_uses_spoken_caption() {
        let transport = StubTransport::new(ok_envelope("ok"));
        let recognizer = ScriptedRecognizer::new(Ok("brown spots".to_string()));
        let session = ChatSession::new(transport.clone(), FarmerContext::default())
            .with_recognizer(recognizer);

        session
            .submit_image("data:image/png;base64,AAAA".to_string())
            .await
            .unwrap();

        let payload = &transport.payloads()[0];
        assert_eq!(payload.payload_type, PayloadType::ImageSpeech);
        assert_eq!(payload.speech_text.as_deref(), Some("brown spots"));
        assert_eq!(payload.image.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[tokio::test]
    async fn image_turn_falls_back_to_placeholder_caption() {
        let transport = StubTransport::new(ok_envelope("ok"));
        let recognizer = ScriptedRecognizer::new(Err(SpeechError::Engine("no-speech".to_string())));
        let session = ChatSession::new(transport.clone(), FarmerContext::default())
            .with_recognizer(recognizer);

        session
            .submit_image("data:image/png;base64,AAAA".to_string())
            .await
            .unwrap();

        let payload = &transport.payloads()[0];
        assert_eq!(payload.content, IMAGE_PLACEHOLDER_CAPTION);
        assert_eq!(payload.speech_text.as_deref(), Some(IMAGE_PLACEHOLDER_CAPTION));
    }

    #[tokio::test]
    async fn image_turn_failure_selects_disease_reply() {
        let session = ChatSession::new(StubTransport::new(failed_envelope()), FarmerContext::default());
        let reply = session
            .submit_image("data:image/png;base64,AAAA".to_string())
            .await
            .unwrap();
        assert_eq!(reply.analysis.unwrap().severity, Some(65));
    }

    #[tokio::test]
    async fn overlapping_turns_append_in_resolution_order() {
        let session = ChatSession::new(Arc::new(DelayedEchoTransport), FarmerContext::default());

        let (slow, fast) = futures::join!(session.submit_text("slow"), session.submit_text("fast"));
        assert_eq!(slow.unwrap().content, "slow");
        assert_eq!(fast.unwrap().content, "fast");

        let replies: Vec<String> = session
            .transcript()
            .await
            .into_iter()
            .skip(1)
            .filter(|msg| msg.role == Role::Assistant)
            .map(|msg| msg.content)
            .collect();
        assert_eq!(replies, vec!["fast".to_string(), "slow".to_string()]);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn playing_another_message_stops_the_current_one() {
        let synth = Arc::new(LoggingSynthesizer::default());
        let session = ChatSession::new(StubTransport::new(ok_envelope("reply")), FarmerContext::default())
            .with_synthesizer(synth.clone());

        let b = session.transcript().await[0].id.clone();
        let a = session.submit_text("question").await.unwrap().id;

        assert_eq!(session.play_message(&b).await, PlaybackOutcome::Playing);
        assert_eq!(session.play_message(&a).await, PlaybackOutcome::Playing);
        assert_eq!(session.currently_playing(), Some(a.clone()));

        let calls = synth.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[2], "cancel");
        assert_eq!(calls[3], "speak:en-US:reply");
    }

    #[tokio::test]
    async fn playing_the_current_message_toggles_it_off() {
        let synth = Arc::new(LoggingSynthesizer::default());
        let session = ChatSession::new(StubTransport::new(ok_envelope("reply")), FarmerContext::default())
            .with_synthesizer(synth.clone());
        let id = session.transcript().await[0].id.clone();

        assert_eq!(session.play_message(&id).await, PlaybackOutcome::Playing);
        assert_eq!(session.play_message(&id).await, PlaybackOutcome::Stopped);
        assert!(session.currently_playing().is_none());
        assert_eq!(synth.calls().last().map(String::as_str), Some("cancel"));
    }

    #[tokio::test]
    async fn finished_playback_releases_only_its_own_slot() {
        let synth = Arc::new(LoggingSynthesizer::default());
        let session = ChatSession::new(StubTransport::new(ok_envelope("reply")), FarmerContext::default())
            .with_synthesizer(synth);
        let first = session.transcript().await[0].id.clone();
        let second = session.submit_text("q").await.unwrap().id;

        session.play_message(&first).await;
        session.play_message(&second).await;
        session.playback_finished(&first);
        assert_eq!(session.currently_playing(), Some(second.clone()));
        session.playback_finished(&second);
        assert!(session.currently_playing().is_none());
    }

    #[tokio::test]
    async fn playback_without_synthesizer_is_unsupported() {
        let session = ChatSession::new(StubTransport::new(ok_envelope("x")), FarmerContext::default());
        let id = session.transcript().await[0].id.clone();
        assert_eq!(session.play_message(&id).await, PlaybackOutcome::Unsupported);
        assert!(session.currently_playing().is_none());
    }

    #[tokio::test]
    async fn user_messages_are_not_played() {
        let synth = Arc::new(LoggingSynthesizer::default());
        let session = ChatSession::new(StubTransport::new(ok_envelope("x")), FarmerContext::default())
            .with_synthesizer(synth);
        session.submit_text("question").await;
        let user_id = session.transcript().await[1].id.clone();
        assert_eq!(session.play_message(&user_id).await, PlaybackOutcome::UnknownMessage);
    }

    #[tokio::test]
    async fn reset_restores_welcome_and_stops_playback() {
        let synth = Arc::new(LoggingSynthesizer::default());
        let session = ChatSession::new(StubTransport::new(ok_envelope("x")), FarmerContext::default())
            .with_synthesizer(synth);
        let reply = session.submit_text("question").await.unwrap();
        session.play_message(&reply.id).await;

        session.reset().await;

        assert!(session.currently_playing().is_none());
        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 1);
        assert!(transcript[0].content.starts_with("Hello!"));
    }

    #[tokio::test]
    async fn report_reflects_transcript() {
        let session = ChatSession::new(StubTransport::new(failed_envelope()), FarmerContext::default());
        session.submit_text("disease").await;

        let report = session.export_report().await;
        assert_eq!(report.language, Language::En);
        assert_eq!(report.messages.len(), 3);
        assert_eq!(report.messages[2].analysis.as_ref().unwrap().confidence, Some(87));

        let dir = tempfile::tempdir().unwrap();
        let path = session.write_report(dir.path()).await.unwrap();
        assert!(path.exists());
    }
}
