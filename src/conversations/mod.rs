pub mod fallback;
pub mod image;
pub mod report;
pub mod session;
pub mod types;

pub use image::{encode_image_data_url, image_data_url_from_path};
pub use report::TranscriptReport;
pub use session::{ChatSession, IMAGE_PLACEHOLDER_CAPTION};
pub use types::{Analysis, ChatEvent, PlaybackOutcome, Role, TranscriptMessage};
