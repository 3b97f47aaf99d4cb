// src/dispatch/speech.rs
// Speech collaborator. Text-to-speech runs on the companion phone; the belt only
// hands over the sentence.

use log::info;

use crate::error::DispatchError;

/// Speech engine collaborator
pub trait SpeechDispatch {
    /// Queues `message` for speaking. Must not block until it has been spoken.
    fn notify(&mut self, message: &str) -> Result<(), DispatchError>;
}

/// Stand-in that logs every message instead of speaking it
#[derive(Debug, Default)]
pub struct LogSpeech {
    last: Option<String>,
}

impl LogSpeech {
    /// Stand-in with nothing spoken yet
    pub fn new() -> Self {
        LogSpeech::default()
    }

    /// Most recent accepted message
    pub fn last_message(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

impl SpeechDispatch for LogSpeech {
    fn notify(&mut self, message: &str) -> Result<(), DispatchError> {
        if message.trim().is_empty() {
            return Err(DispatchError::speech("empty message"));
        }
        info!("Audio: {}", message);
        self.last = Some(message.to_string());
        Ok(())
    }
}
