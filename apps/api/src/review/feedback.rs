use serde::{Deserialize, Serialize};

use crate::llm_client::strip_json_fences;

pub const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    /// Short title.
    pub tip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub score: u32,
    #[serde(default)]
    pub tips: Vec<Tip>,
}

/// Structured review of one resume against one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub overall_score: u32,
    #[serde(rename = "ATS")]
    pub ats: Category,
    pub tone_and_style: Category,
    pub content: Category,
    pub structure: Category,
    pub skills: Category,
}

impl Feedback {
    /// Parses a model reply, tolerating markdown code fences, and checks every score.
    pub fn parse(reply: &str) -> Result<Self, String> {
        let feedback: Feedback = serde_json::from_str(strip_json_fences(reply))
            .map_err(|e| format!("Feedback is not valid JSON: {e}"))?;
        feedback.validate()?;
        Ok(feedback)
    }

    fn categories(&self) -> [(&'static str, &Category); 5] {
        [
            ("ATS", &self.ats),
            ("toneAndStyle", &self.tone_and_style),
            ("content", &self.content),
            ("structure", &self.structure),
            ("skills", &self.skills),
        ]
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.overall_score > MAX_SCORE {
            return Err(format!(
                "overallScore {} exceeds {MAX_SCORE}",
                self.overall_score
            ));
        }
        for (name, category) in self.categories() {
            if category.score > MAX_SCORE {
                return Err(format!("{name} score {} exceeds {MAX_SCORE}", category.score));
            }
            if category.tips.iter().any(|t| t.tip.trim().is_empty()) {
                return Err(format!("{name} contains an empty tip"));
            }
        }
        Ok(())
    }
}
