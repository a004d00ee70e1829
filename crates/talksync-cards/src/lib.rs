//! Social-card generation for talks: a per-run avatar cache with concurrent
//! prefetch, and a card compositor (template + circular speaker avatars +
//! wrapped title text).

pub mod avatars;
pub mod card;
pub mod error;
pub mod text;

pub use avatars::AvatarCache;
pub use card::{CardFormat, CardGenerator, CardSpeaker};
pub use error::CardError;
