//! Clients for external collaborators
//!
//! The intent classifier, the messaging transport, speech services and the
//! invoice document renderer are all remote services; the backend only
//! knows their interfaces.

pub mod classifier;
pub mod renderer;
pub mod speech;
pub mod telegram;

pub use classifier::{ClassifiedIntent, ClassifierClient, Intent};
pub use renderer::RendererClient;
pub use speech::SpeechClient;
pub use telegram::TelegramClient;
