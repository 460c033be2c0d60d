pub mod interface;
pub mod playback;
pub mod voice;

pub use interface::{
    NoopRecognizer, NoopSynthesizer, SpeechRecognizer, SpeechSynthesizer, Utterance, Voice,
};
pub use playback::{PlaybackSlot, PlaybackToggle};
pub use voice::select_voice;
