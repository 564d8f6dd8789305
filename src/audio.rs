//! Audio cues and the read-aloud toggle.
//!
//! Nothing here makes a sound. Cues resolve to tone descriptors that the
//! presentation layer synthesizes, and the speech toggle yields commands.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One oscillator burst with an exponential (or, with `sweep_to`, linear) fade.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tone {
    pub frequency: f64,
    pub waveform: Waveform,
    /// Seconds
    pub duration: f64,
    /// Seconds after the cue fires
    pub offset: f64,
    pub volume: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_to: Option<f64>,
}

const fn tone(frequency: f64, waveform: Waveform, duration: f64, offset: f64, volume: f64) -> Tone {
    Tone {
        frequency,
        waveform,
        duration,
        offset,
        volume,
        sweep_to: None,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AudioCue {
    Click,
    Hover,
    Success,
    Error,
    Typing,
    Scan,
}

impl AudioCue {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "click" => Some(AudioCue::Click),
            "hover" => Some(AudioCue::Hover),
            "success" => Some(AudioCue::Success),
            "error" => Some(AudioCue::Error),
            "typing" => Some(AudioCue::Typing),
            "scan" => Some(AudioCue::Scan),
            _ => None,
        }
    }

    fn tones(&self) -> Vec<Tone> {
        use Waveform::*;
        match self {
            AudioCue::Click => vec![tone(1200.0, Sine, 0.05, 0.0, 0.05)],
            AudioCue::Hover => vec![tone(2000.0, Sine, 0.03, 0.0, 0.01)],
            // Ascending C major arpeggio
            AudioCue::Success => vec![
                tone(523.25, Sine, 0.4, 0.0, 0.1),
                tone(659.25, Sine, 0.4, 0.1, 0.1),
                tone(783.99, Sine, 0.6, 0.2, 0.1),
                tone(1046.50, Sine, 0.8, 0.3, 0.05),
            ],
            AudioCue::Error => vec![
                tone(150.0, Sawtooth, 0.3, 0.0, 0.1),
                tone(140.0, Sawtooth, 0.3, 0.1, 0.1),
            ],
            AudioCue::Typing => vec![tone(800.0, Triangle, 0.03, 0.0, 0.02)],
            AudioCue::Scan => vec![Tone {
                sweep_to: Some(800.0),
                ..tone(100.0, Square, 1.5, 0.0, 0.05)
            }],
        }
    }
}

/// Resolve a cue to tones; silent when audio is disabled.
pub fn cue_tones(cue: AudioCue, enabled: bool) -> Vec<Tone> {
    if enabled {
        cue.tones()
    } else {
        Vec::new()
    }
}

/// Spoken playback language.
pub const SPEECH_LANG: &str = "es-ES";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SpeechCommand {
    Speak { text: String, lang: &'static str },
    Stop,
}

/// Read-aloud state. A second press stops playback; requests are never queued.
#[derive(Debug, Default)]
pub struct SpeechToggle {
    speaking: bool,
}

impl SpeechToggle {
    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn toggle(&mut self, text: &str) -> SpeechCommand {
        if self.speaking {
            self.speaking = false;
            SpeechCommand::Stop
        } else {
            self.speaking = true;
            SpeechCommand::Speak {
                text: text.to_string(),
                lang: SPEECH_LANG,
            }
        }
    }

    /// Playback ran to completion on the client.
    pub fn finished(&mut self) {
        self.speaking = false;
    }
}
