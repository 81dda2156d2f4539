// Insight LLM prompt templates.
// All prompts for the insights module are defined here. `{json_only}` is
// filled with the shared JSON-enforcement fragment at call time.

pub const ANALYZE_SYSTEM: &str = "\
You are an AI assistant designed to analyze a series of journal entries and provide insights \
into the user's mental state and behaviors. {json_only}";

pub const ANALYZE_PROMPT: &str = r#"The user may provide text entries and accompanying images or voice notes. Consider every provided modality when analyzing.

Analyze the following journal entries:
{entries}
Based on ALL the provided entries, identify overall recurring themes, expressed emotions, and potential stressors.
Provide a consolidated summary of your findings and recommend holistic actions based on your complete analysis.

Output your findings as a JSON object with the following keys:
- themes: A list of recurring themes found across all journal entries.
- emotions: A list of emotions expressed across all journal entries.
- stressors: A list of potential stressors identified across all journal entries.
- summary: A comprehensive summary of the insights gained from all journal entries.
- recommendations: Recommended actions based on the identified themes, emotions, and stressors from all entries."#;

pub const RECOMMEND_SYSTEM: &str = "\
You are an AI assistant that recommends well-being actions. {json_only}";

pub const RECOMMEND_PROMPT: &str = r#"Based on the identified themes and emotions in the user's journal entries, recommend specific actions the user can take to address potential stressors and improve their well-being.

Themes: {themes}
Emotions: {emotions}

Return a JSON object with a single key:
- actions: Recommended actions to address stressors and improve well-being."#;
