//! Council QR scan state machine.
//!
//! # Design
//! The camera delivers decoded frames far faster than a scan can be handled,
//! so acceptance is gated three ways: a busy flag while a scan is being
//! processed, a lock that holds after every terminal result until reset, and
//! a debounce window between accepted scans.
//!
//! ```text
//! Idle --scan--> Processing --finish--> Success | Denied | Invalid
//!   ^                                              |
//!   +------------- reset / auto-reset -------------+
//! ```
//!
//! Time is passed in by the caller so the machine stays deterministic. Side
//! effects (speech) are returned as `ScanEffect` values for the host to
//! perform.

pub mod processors;

use std::fmt;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;

pub const SCAN_DEBOUNCE: Duration = Duration::from_millis(1100);
pub const AUTO_RESET_DELAY: Duration = Duration::from_millis(7000);

pub const EMPTY_SCAN_MESSAGE: &str = "올바른 QR 코드가 아니에요.";
pub const SCAN_FAILED_MESSAGE: &str = "QR 정보를 확인할 수 없어요. 다시 시도해주세요.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Success,
    Denied,
    Invalid,
}

/// What a processor decided about one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub outcome: ScanOutcome,
    pub message: Option<String>,
    pub action_label: Option<String>,
    pub speech: Option<String>,
}

impl ScanResult {
    pub fn success() -> Self {
        Self::new(ScanOutcome::Success, None)
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self::new(ScanOutcome::Denied, Some(message.into()))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ScanOutcome::Invalid, Some(message.into()))
    }

    fn new(outcome: ScanOutcome, message: Option<String>) -> Self {
        Self {
            outcome,
            message,
            action_label: None,
            speech: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_action_label(mut self, label: impl Into<String>) -> Self {
        self.action_label = Some(label.into());
        self
    }

    pub fn with_speech(mut self, speech: impl Into<String>) -> Self {
        self.speech = Some(speech.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Processing { raw: String },
    Success(ScanResult),
    Denied(ScanResult),
    Invalid(ScanResult),
}

impl ScanState {
    fn finished(result: ScanResult) -> Self {
        match result.outcome {
            ScanOutcome::Success => ScanState::Success(result),
            ScanOutcome::Denied => ScanState::Denied(result),
            ScanOutcome::Invalid => ScanState::Invalid(result),
        }
    }

    pub fn result(&self) -> Option<&ScanResult> {
        match self {
            ScanState::Success(r) | ScanState::Denied(r) | ScanState::Invalid(r) => Some(r),
            ScanState::Idle | ScanState::Processing { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.result().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A scan is still being processed.
    Busy,
    /// A result is on screen; reset first.
    Locked,
    /// Too soon after the last accepted scan.
    Debounced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanDecision {
    Ignored(IgnoreReason),
    /// Run the processor on this trimmed token, then call `finish`.
    Process(String),
    /// Resolved without a processor (blank scan).
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSettings {
    pub language: String,
    pub pitch: f32,
    pub rate: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            language: "ko-KR".to_string(),
            pitch: 0.92,
            rate: 0.92,
        }
    }
}

/// Side effects for the host's text-to-speech engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEffect {
    Stop,
    Speak {
        text: String,
        voice: Option<String>,
        language: String,
        pitch: f32,
        rate: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScannerConfig {
    pub scan_debounce: Duration,
    pub auto_reset_delay: Duration,
    pub success_action_label: String,
    pub denied_action_label: String,
    pub invalid_action_label: String,
    pub success_speech: Option<String>,
    pub denied_speech: Option<String>,
    pub speech: SpeechSettings,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scan_debounce: SCAN_DEBOUNCE,
            auto_reset_delay: AUTO_RESET_DELAY,
            success_action_label: "확인".to_string(),
            denied_action_label: "확인".to_string(),
            invalid_action_label: "확인".to_string(),
            success_speech: None,
            denied_speech: None,
            speech: SpeechSettings::default(),
        }
    }
}

/// A TTS voice reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub identifier: String,
    pub name: String,
    pub language: String,
}

static MALE_VOICE: Lazy<Option<Regex>> = Lazy::new(|| match Regex::new("(?i)male|남자|남성|ho|hun|hyun|joon|min") {
    Ok(re) => Some(re),
    Err(err) => {
        tracing::warn!(error = %err, "voice pattern failed to compile");
        None
    }
});

/// Best-effort pick of a male-sounding Korean voice, else the first Korean
/// one.
pub fn select_korean_voice(voices: &[Voice]) -> Option<&Voice> {
    let is_korean = |v: &&Voice| v.language.starts_with("ko");
    let male = MALE_VOICE.as_ref().and_then(|re| {
        voices
            .iter()
            .filter(is_korean)
            .find(|v| re.is_match(&format!("{}{}", v.name, v.identifier)))
    });
    male.or_else(|| voices.iter().find(is_korean))
}

pub struct QrScanner {
    config: ScannerConfig,
    state: ScanState,
    processing: bool,
    locked: bool,
    last_accepted: Option<Instant>,
    finished_at: Option<Instant>,
    sound_enabled: bool,
    camera: CameraFacing,
    voice: Option<String>,
}

impl fmt::Debug for QrScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QrScanner")
            .field("state", &self.state)
            .field("processing", &self.processing)
            .field("locked", &self.locked)
            .field("sound_enabled", &self.sound_enabled)
            .field("camera", &self.camera)
            .finish()
    }
}

impl QrScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            state: ScanState::Idle,
            processing: false,
            locked: false,
            last_accepted: None,
            finished_at: None,
            sound_enabled: false,
            camera: CameraFacing::Back,
            voice: None,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Button text for the current result: the processor's label, else the
    /// configured one for the outcome.
    pub fn action_label(&self) -> Option<&str> {
        let result = self.state.result()?;
        let fallback = match result.outcome {
            ScanOutcome::Success => &self.config.success_action_label,
            ScanOutcome::Denied => &self.config.denied_action_label,
            ScanOutcome::Invalid => &self.config.invalid_action_label,
        };
        Some(result.action_label.as_deref().unwrap_or(fallback))
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn camera(&self) -> CameraFacing {
        self.camera
    }

    /// Pick the announcement voice from what the host's engine offers.
    pub fn set_voices(&mut self, voices: &[Voice]) {
        self.voice = select_korean_voice(voices).map(|v| v.identifier.clone());
    }

    pub fn toggle_sound(&mut self) -> Vec<ScanEffect> {
        self.sound_enabled = !self.sound_enabled;
        if self.sound_enabled {
            Vec::new()
        } else {
            vec![ScanEffect::Stop]
        }
    }

    pub fn toggle_camera(&mut self) -> CameraFacing {
        self.camera = match self.camera {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        };
        self.camera
    }

    /// First half of a scan: decide whether the frame is accepted.
    pub fn begin_scan(&mut self, raw: &str, now: Instant) -> ScanDecision {
        if self.processing {
            return ScanDecision::Ignored(IgnoreReason::Busy);
        }
        if self.locked {
            return ScanDecision::Ignored(IgnoreReason::Locked);
        }
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.config.scan_debounce {
                return ScanDecision::Ignored(IgnoreReason::Debounced);
            }
        }

        self.last_accepted = Some(now);
        self.processing = true;
        self.state = ScanState::Processing { raw: raw.to_string() };
        tracing::debug!("scan accepted");

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.complete(ScanResult::invalid(EMPTY_SCAN_MESSAGE), now);
            return ScanDecision::Completed;
        }
        ScanDecision::Process(trimmed.to_string())
    }

    /// Second half: record the processor's answer. An error becomes
    /// `Invalid` with its message.
    pub fn finish<E: fmt::Display>(&mut self, result: Result<ScanResult, E>, now: Instant) -> Vec<ScanEffect> {
        if !matches!(self.state, ScanState::Processing { .. }) {
            tracing::debug!("stale scan result dropped");
            return Vec::new();
        }
        let result = result.unwrap_or_else(|err| {
            let message = err.to_string();
            ScanResult::invalid(if message.trim().is_empty() { SCAN_FAILED_MESSAGE.to_string() } else { message })
        });
        self.complete(result, now)
    }

    /// `begin_scan`, the processor, and `finish` in one call.
    pub fn scan<P: processors::ScanProcessor + ?Sized>(
        &mut self,
        raw: &str,
        now: Instant,
        processor: &mut P,
    ) -> Vec<ScanEffect> {
        match self.begin_scan(raw, now) {
            ScanDecision::Process(token) => {
                let result = processor.process(&token);
                self.finish(result, now)
            }
            ScanDecision::Completed => self.speech_effects(),
            ScanDecision::Ignored(_) => Vec::new(),
        }
    }

    fn complete(&mut self, result: ScanResult, now: Instant) -> Vec<ScanEffect> {
        tracing::debug!(outcome = ?result.outcome, "scan finished");
        self.processing = false;
        self.locked = true;
        self.finished_at = Some(now);
        self.state = ScanState::finished(result);
        self.speech_effects()
    }

    fn speech_effects(&self) -> Vec<ScanEffect> {
        if !self.sound_enabled {
            return Vec::new();
        }
        let text = match &self.state {
            ScanState::Success(r) => r.speech.as_ref().or(self.config.success_speech.as_ref()),
            ScanState::Denied(r) => r.speech.as_ref().or(self.config.denied_speech.as_ref()),
            _ => None,
        };
        let Some(text) = text else {
            return Vec::new();
        };
        let speech = &self.config.speech;
        vec![
            ScanEffect::Stop,
            ScanEffect::Speak {
                text: text.clone(),
                voice: self.voice.clone(),
                language: speech.language.clone(),
                pitch: speech.pitch,
                rate: speech.rate,
            },
        ]
    }

    /// Auto-reset once a result has been shown for `auto_reset_delay`.
    pub fn tick(&mut self, now: Instant) -> Vec<ScanEffect> {
        let Some(finished_at) = self.finished_at else {
            return Vec::new();
        };
        if !self.state.is_terminal() || now.saturating_duration_since(finished_at) < self.config.auto_reset_delay {
            return Vec::new();
        }
        self.reset()
    }

    /// Back to `Idle`, clearing both locks.
    pub fn reset(&mut self) -> Vec<ScanEffect> {
        tracing::debug!("scanner reset");
        self.processing = false;
        self.locked = false;
        self.finished_at = None;
        self.state = ScanState::Idle;
        if self.sound_enabled {
            vec![ScanEffect::Stop]
        } else {
            Vec::new()
        }
    }
}

impl Default for QrScanner {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}
