//! Prompt text for the language-model collaborators.

use catalog::CandidateRef;
use pipeline::ScoreCategory;
use serde_json::json;

use crate::reference::ReferenceTables;

// =============================================================================
// Scoring
// =============================================================================

pub const SCORING_SYSTEM_PROMPT: &str = "You are an elite study-abroad placement API. \
Rank a list of eligible universities based on a student's preferences. Rely on your internal \
knowledge of global universities, cultures, and geography. Return ONLY valid JSON. \
No markdown, no explanations.";

/// Category rubric, one line per score category.
fn category_rubric(category: ScoreCategory) -> &'static str {
    match category {
        ScoreCategory::AcademicFit => {
            "Score based strictly on the university's standing in the Shanghai Ranking (ARWU). \
             Reward research output, STEM focus and global prestige."
        }
        ScoreCategory::LifestyleFit => {
            "Campus typology, city scale and academic pacing, plus party vibe, ease of making \
             friends and international/Erasmus presence. Use the social sentiment table as guidance."
        }
        ScoreCategory::SocialFit => "Social scene and how easy it is to build a circle of friends.",
        ScoreCategory::LocationFit => "Nature/hikes, nightlife, art, culture, weather.",
        ScoreCategory::FinancialFit => {
            "Total cost of the exchange (rent, food, travel) based on the reference cost table, \
             adjusted for outlier cities. Mention an estimated semester total in the reasoning."
        }
        ScoreCategory::JewishIsraeliCommunityFit => {
            "EXCLUSIVELY antisemitism levels on and around campus, access to the local Jewish \
             community (Chabad, synagogues, kosher food) and presence of Israeli students. \
             Ignore general crime rates."
        }
        ScoreCategory::OtherPreferencesFit => {
            "Any specific request that fits no other category (sports, dietary needs, hobbies)."
        }
    }
}

pub fn scoring_user_prompt(
    candidates: &[CandidateRef],
    preference_text: &str,
    tables: &ReferenceTables,
) -> String {
    let universities: Vec<_> = candidates
        .iter()
        .map(|c| json!({"university_name": c.name, "country": c.country}))
        .collect();
    let universities = serde_json::to_string_pretty(&universities).unwrap_or_else(|_| "[]".into());

    let rubric: String = ScoreCategory::ALL
        .iter()
        .map(|c| format!("- `{}`: {}\n", c.key(), category_rubric(*c)))
        .collect();
    let schema_scores: String = ScoreCategory::ALL
        .iter()
        .map(|c| format!("\"{}\": int or null", c.key()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Eligible Universities:\n{universities}\n\n\
         Social Media Sentiment Table:\n{social}\n\
         Reference Data for `financial_fit` (Global Semester Pure Cost - $0 Tuition):\n{financial}\n\
         Student Preferences: \"{preference_text}\"\n\n\
         Rules:\n\
         1. Evaluate and score EVERY university in the provided list.\n\
         2. Grade each university (integer 0-100) in these categories ONLY if the student's input \
         relates to them; otherwise output null.\n\
         {rubric}\
         3. Provide a short `reasoning` explicitly referencing the evaluated traits.\n\n\
         Return ONLY a JSON object with this exact structure:\n\
         {{\"scored_universities\": [{{\"university_name\": \"string\", \"country\": \"string\", \
         \"scores\": {{{schema_scores}}}, \"reasoning\": \"string\"}}]}}\n",
        social = tables.social,
        financial = tables.financial,
    )
}

// =============================================================================
// Routing
// =============================================================================

pub const ROUTER_SYSTEM_PROMPT: &str = "You are an expert workflow router for a university \
exchange agent. Given a user's free-form input, decide which task fits best: 'filter', 'rank', \
or 'analyze'. Prefer small tweaks (rank) over big changes (filter), and pick analyze for deep \
dives into already recommended universities. Respond ONLY with one of: filter, rank, analyze.";

pub fn router_user_prompt(turn_text: &str) -> String {
    format!("User input: {turn_text}")
}

// =============================================================================
// Profile extraction
// =============================================================================

pub const PROFILE_EXTRACTION_PROMPT: &str = r#"You are a university exchange profile extractor. Given a user's free-text or partial input, output a structured JSON profile.

RULES:
- Extract: academic (gpa, major, study_level, semesters_completed), preferences (free_text_preferences, must_be_erasmus), language (non_english_languages, english_test_type, english_test_level), availability (start_month, end_month, start_day, end_day).
- Use sensible defaults when missing: gpa 80 if not stated, empty strings for preferences.
- study_level is "msc" or "bsc" when known.
- free_text_preferences: summarize their vibe, location wishes, social/cultural preferences.
- Output ONLY valid JSON, no markdown.

OUTPUT SCHEMA:
{
  "academic": {"gpa": float|null, "major": str|null, "study_level": str|null, "semesters_completed": int|null},
  "preferences": {"free_text_preferences": str, "must_be_erasmus": bool|null},
  "language": {"non_english_languages": [], "english_test_type": [], "english_test_level": str|null},
  "availability": {"start_month": int|null, "end_month": int|null, "start_day": int|null, "end_day": int|null}
}
"#;

/// Longest user input forwarded to the extractor, in characters.
pub const PROFILE_INPUT_LIMIT: usize = 2000;

pub fn profile_user_prompt(text: &str) -> String {
    let clipped: String = text.chars().take(PROFILE_INPUT_LIMIT).collect();
    format!("User input:\n{clipped}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_prompt_lists_candidates_and_categories() {
        let prompt = scoring_user_prompt(
            &[CandidateRef::new("CTU", "Czech Republic")],
            "party vibe",
            &ReferenceTables::standard(),
        );

        assert!(prompt.contains("\"university_name\": \"CTU\""));
        assert!(prompt.contains("Student Preferences: \"party vibe\""));
        for category in ScoreCategory::ALL {
            assert!(prompt.contains(category.key()));
        }
        assert!(prompt.contains("| Eastern Europe |"));
    }

    #[test]
    fn test_profile_prompt_is_clipped() {
        let long = "x".repeat(PROFILE_INPUT_LIMIT + 50);
        let prompt = profile_user_prompt(&long);
        assert_eq!(prompt.len(), "User input:\n".len() + PROFILE_INPUT_LIMIT);
    }
}
