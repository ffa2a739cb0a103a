// Prompt text for the resume review call.

/// Shape the model must reply with. Mirrors `feedback::Feedback`.
pub const FEEDBACK_FORMAT: &str = r#"interface Feedback {
  overallScore: number; //max 100
  ATS: {
    score: number; //rate based on ATS suitability
    tips: {
      type: "good" | "improve";
      tip: string; //give 3-4 tips
    }[];
  };
  toneAndStyle: {
    score: number; //max 100
    tips: {
      type: "good" | "improve";
      tip: string; //make it a short "title" for the actual explanation
      explanation: string; //explain in detail here
    }[]; //give 3-4 tips
  };
  content: {
    score: number; //max 100
    tips: {
      type: "good" | "improve";
      tip: string; //make it a short "title" for the actual explanation
      explanation: string; //explain in detail here
    }[]; //give 3-4 tips
  };
  structure: {
    score: number; //max 100
    tips: {
      type: "good" | "improve";
      tip: string; //make it a short "title" for the actual explanation
      explanation: string; //explain in detail here
    }[]; //give 3-4 tips
  };
  skills: {
    score: number; //max 100
    tips: {
      type: "good" | "improve";
      tip: string; //make it a short "title" for the actual explanation
      explanation: string; //explain in detail here
    }[]; //give 3-4 tips
  };
}"#;

const ANALYST_PROMPT_TEMPLATE: &str = r#"You are an experienced ATS (Applicant Tracking System) and resume analyst. Be honest and constructive.

CONTEXT: The resume text below was extracted programmatically from a PDF, the same way an ATS parses resumes.

ATS PARSING ASSESSMENT - Evaluate the extracted text for these issues:

MINOR issues (small penalty): skills or secondary sections appearing slightly out of order because of multi-column layouts. Most ATS systems cope with these.

MAJOR issues (heavy penalty, each should lower the ATS score by 10-15 points):
- Spaced-out letters in words (e.g. "T E C H N I C A L" instead of "TECHNICAL"); keywords cannot be matched
- Bullets separated from their company name and dates; experience cannot be attributed
- Sidebar content (contact info, intro) injected in the middle of work experience
- Dates appearing as a disconnected block rather than next to their roles
- Garbled, unreadable or fundamentally disordered text

A resume with 2+ major issues should score below 50 on ATS regardless of how good the content is.

SCORING GUIDELINES:
- 0-30: severely broken, cannot be parsed at all
- 31-50: multiple major structural problems causing real parsing failures
- 51-65: parseable but with structural issues, weak keyword alignment or notable gaps
- 66-80: good resume with clear structure and decent keyword match
- 81-90: strong resume, well structured, strong keyword alignment with minor gaps
- 91-100: near-perfect match, reserved for resumes tailored precisely to the role

Do NOT inflate scores. Score how well the extracted text can be parsed, not what the original layout may have looked like.

Analyze this resume for the following role:
Job title: {job_title}
Job description: {job_description}

Provide the feedback using the following format:
{format}

Return the analysis as a JSON object, without any other text and without code fences."#;

/// Builds the instruction message sent alongside the resume text.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    ANALYST_PROMPT_TEMPLATE
        .replace("{format}", FEEDBACK_FORMAT)
        .replace("{job_title}", job_title.trim())
        .replace("{job_description}", job_description.trim())
}
