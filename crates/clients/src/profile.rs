//! Turn free text (or partial JSON) into a structured student profile.

use std::sync::Arc;

use catalog::UserProfile;
use tracing::{debug, warn};

use crate::llm::{ChatBackend, ChatRequest};
use crate::oracle::strip_code_fence;
use crate::prompts;

/// GPA assumed when nothing better is known.
pub const DEFAULT_GPA: f64 = 80.0;

/// Profile used when extraction yields nothing.
pub fn default_profile() -> UserProfile {
    let mut profile = UserProfile::default();
    profile.academic.gpa = Some(DEFAULT_GPA);
    profile
}

/// Whether a parsed profile carries enough structure to skip extraction.
fn is_structured(profile: &UserProfile) -> bool {
    profile.academic.gpa.is_some() || !profile.preference_text().is_empty()
}

fn parse_profile(text: &str) -> Option<UserProfile> {
    serde_json::from_str::<UserProfile>(strip_code_fence(text)).ok()
}

/// Extracts a `UserProfile` with a chat model.
///
/// ## Algorithm
/// 1. Blank input → `default_profile()`
/// 2. Input that parses as a profile with a GPA or preference text is used
///    as-is
/// 3. Otherwise ask the model; a parseable answer wins
/// 4. On any failure fall back to the parsed input (if any), else the default
#[derive(Clone)]
pub struct ProfileExtractor {
    chat: Arc<dyn ChatBackend>,
}

impl ProfileExtractor {
    pub fn new(chat: Arc<dyn ChatBackend>) -> Self {
        Self { chat }
    }

    pub async fn extract(&self, text: &str) -> UserProfile {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return default_profile();
        }

        let base = if trimmed.starts_with('{') && trimmed.ends_with('}') {
            parse_profile(trimmed)
        } else {
            None
        };
        if let Some(profile) = base.as_ref().filter(|p| is_structured(p)) {
            debug!("Input is already a structured profile");
            return profile.clone();
        }

        let request = ChatRequest::new(
            prompts::PROFILE_EXTRACTION_PROMPT,
            prompts::profile_user_prompt(trimmed),
        )
        .json();

        match self.chat.chat(&request).await {
            Ok(answer) => match parse_profile(&answer) {
                Some(profile) => return profile,
                None => warn!("Profile extraction returned an unparseable profile"),
            },
            Err(err) => warn!("Profile extraction failed: {}", err),
        }

        base.filter(|p| !p.is_blank()).unwrap_or_else(default_profile)
    }
}
