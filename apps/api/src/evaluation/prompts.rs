// Evaluator prompts. Response shapes here must stay in step with the structs
// in judgement.rs; a renamed field shows up as a malformed payload.

use serde_json::Value;

use super::payload::{
    ApplicationPayload, CheckInPayload, MatchPayload, MicroshipPayload, ProfilePayload,
    WarningPayload,
};
use crate::llm_client::prompts::{or_missing, yes_no, JSON_ONLY, RANGE_INSTRUCTION};
use crate::models::applicant::ApplicantRole;

// ────────────────────────────────────────────────────────────────────────────
// Application screening
// ────────────────────────────────────────────────────────────────────────────

pub const SCREENING_SYSTEM: &str = "You evaluate applications to a work-experience \
    fellowship for early-career tech talent. Look for evidence of what applicants have \
    built, not what they claim. Evaluate on demonstrated capability, not credentials.";

pub fn screening_prompt(p: &ApplicationPayload) -> String {
    format!(
        r#"Evaluate this application.

## Applicant
- Name: {name}
- Role applied: {role}
- Portfolio URL: {portfolio}
- GitHub URL: {github}
- Project description: {project}
- Time commitment confirmed: {commitment}

## Criteria (each 0-100)
1. completeness: are the fields filled with substantive detail?
2. portfolio_quality: evidence of building things relevant to the role
3. role_fit: does their background align with the role?
4. commitment_signals: application effort, confirmed time commitment

## Output
{{
    "scores": {{
        "completeness": <0-100>,
        "portfolio_quality": <0-100>,
        "role_fit": <0-100>,
        "commitment_signals": <0-100>
    }},
    "overall_score": <0-100>,
    "reasoning": "<2-3 sentences>",
    "flags": ["<concerns or notable points>"],
    "confidence": <0.0-1.0>
}}

{range}"#,
        name = p.name,
        role = p.role,
        portfolio = or_missing(p.portfolio_url.as_deref(), "Not provided"),
        github = or_missing(p.github_url.as_deref(), "Not provided"),
        project = or_missing(p.project_description.as_deref(), "Not provided"),
        commitment = yes_no(Some(p.time_commitment)),
        range = RANGE_INSTRUCTION,
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Microship
// ────────────────────────────────────────────────────────────────────────────

pub const MICROSHIP_SYSTEM: &str = "You are a senior practitioner evaluating 24-hour \
    individual challenge submissions to judge readiness for team-based work.\n\
    Scoring scale (0-4): 4 exceeds expectations, 3 meets expectations, 2 below \
    expectations, 1 does not meet, 0 nothing to assess. 3 is the target, not the minimum. \
    Do not inflate scores.\n\
    Automatic disqualifiers: plagiarism or copied work without attribution, no \
    submission at all, complete silence despite issues.";

/// What the technical_execution dimension means for each role.
fn artifact_focus(role: ApplicantRole) -> &'static str {
    match role {
        ApplicantRole::Frontend | ApplicantRole::Backend | ApplicantRole::Qa => {
            "code: correctness, structure, tests, and a README someone else could follow"
        }
        ApplicantRole::ProductManager => {
            "PRD: problem framing, user needs, scoped requirements, and success metrics"
        }
        ApplicantRole::ProductDesigner => {
            "design file: user flow, visual hierarchy, consistency, and handoff readiness"
        }
    }
}

fn render_communication_log(log: &Value) -> String {
    let entries = match log.as_array() {
        Some(entries) if !entries.is_empty() => entries,
        _ => return "No communication logged.".to_string(),
    };
    entries
        .iter()
        .map(|e| {
            let field = |k: &str, default: &'static str| {
                e.get(k)
                    .and_then(Value::as_str)
                    .unwrap_or(default)
                    .to_string()
            };
            format!(
                "- {}: {} - {}",
                field("timestamp", "N/A"),
                field("type", "message"),
                field("content", "")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn microship_prompt(p: &MicroshipPayload) -> String {
    let when = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| t.to_rfc3339()).unwrap_or_else(|| "Unknown".into())
    };
    format!(
        r#"Evaluate this microship submission for a {role} candidate.

## Submission
- URL: {url}
- Type: {kind}
- Submitted: {submitted}
- Deadline: {deadline}
- On time: {on_time}

## Communication log
{log}

## Content
{content}

## Dimensions (each 0-4)
- technical_execution: quality of the {focus}
- execution_discipline: met the deadline, scoped sensibly, finished what was started
- professional_behavior: communicated proactively, asked clarifying questions when blocked
- instruction_following: delivered what the brief asked for in the requested format

## Output
{{
    "scores": {{
        "technical_execution": <0-4>,
        "execution_discipline": <0-4>,
        "professional_behavior": <0-4>,
        "instruction_following": <0-4>
    }},
    "evidence": {{
        "technical": "<observations>",
        "execution": "<observations>",
        "professional": "<observations>",
        "instructions": "<observations>"
    }},
    "disqualifiers": ["<list if any>"],
    "strengths": ["<notable positives>"],
    "concerns": ["<red flags>"],
    "confidence": <0.0-1.0>,
    "reasoning": "<2-3 sentence overall assessment>"
}}

{range}"#,
        role = p.role,
        url = or_missing(p.submission_url.as_deref(), "Not provided"),
        kind = or_missing(p.submission_type.as_deref(), "unknown"),
        submitted = when(p.submitted_at),
        deadline = when(p.deadline),
        on_time = yes_no(p.on_time),
        log = render_communication_log(&p.communication_log),
        content = or_missing(p.content.as_deref(), "No content provided"),
        focus = artifact_focus(p.role),
        range = RANGE_INSTRUCTION,
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Check-ins
// ────────────────────────────────────────────────────────────────────────────

pub const CHECK_IN_SYSTEM: &str = "You are an empathetic program manager reading weekly \
    check-ins from fellows. Identify risks and blockers and give the team actionable \
    insight.\n\
    sentiment_score (-1.0 to 1.0): 1.0 energised and progressing, 0.0 neutral, -1.0 \
    significant blockers.\n\
    risk_contribution (0.0 to 1.0): below 0.2 on track, 0.2-0.4 monitor, 0.4-0.6 needs \
    intervention, 0.6 and above at risk or critical.\n\
    Watch for repeated blockers, energy below 4/10, struggling collaboration, self \
    assessment below expectations, vague answers, burnout language, no plan for next week.";

pub fn check_in_prompt(p: &CheckInPayload) -> String {
    format!(
        r#"Analyse this weekly check-in.

## Fellow
- Name: {name}
- Role: {role}
- Week: {week}

## Responses
**Accomplished this week:** {accomplishments}
**Focus next week:** {next_focus}
**Blockers:** {blockers}
**Needs help with:** {needs_help}
**Self assessment:** {self_assessment}
**Collaboration:** {collaboration}
**Energy (1-10):** {energy}

## Output
{{
    "sentiment_score": <-1.0 to 1.0>,
    "risk_contribution": <0.0 to 1.0>,
    "blockers_extracted": ["<specific blockers>"],
    "action_items": ["<actions for program managers>"],
    "themes": ["<2-3 key themes>"],
    "concerns": ["<concerns to monitor>"],
    "positive_signals": ["<strengths>"],
    "confidence": <0.0-1.0>,
    "summary": "<2-3 sentence summary>"
}}

{range}"#,
        name = p.fellow_name,
        role = p.role,
        week = p.week,
        accomplishments = or_missing(p.accomplishments.as_deref(), "No response"),
        next_focus = or_missing(p.next_focus.as_deref(), "No response"),
        blockers = or_missing(p.blockers.as_deref(), "None mentioned"),
        needs_help = or_missing(p.needs_help.as_deref(), "Nothing"),
        self_assessment = or_missing(p.self_assessment.as_deref(), "Not given"),
        collaboration = or_missing(p.collaboration_rating.as_deref(), "Not given"),
        energy = p
            .energy_level
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Not given".into()),
        range = RANGE_INSTRUCTION,
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Placement
// ────────────────────────────────────────────────────────────────────────────

pub const PROFILE_SYSTEM: &str = "You write honest, compelling professional profiles for \
    fellowship graduates. Highlight demonstrated capability, position them for junior \
    roles, and do not oversell.";

pub fn profile_prompt(p: &ProfilePayload) -> String {
    let scores = if p.milestone_scores.is_empty() {
        "none yet".to_string()
    } else {
        p.milestone_scores
            .iter()
            .map(|s| format!("{s:.1}/4.0"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        r#"Generate a professional profile.

## Fellow
- Name: {name}
- Role: {role}
- Portfolio: {portfolio}
- GitHub: {github}

## Performance
- Microship score: {microship}
- Milestone scores: {scores}

## Program highlights
Accomplishments: {accomplishments}
Themes: {themes}

## Output
{{
    "headline": "<role-focused headline, ~10 words>",
    "summary": "<2-3 paragraphs leading with what they can do>",
    "skills": [
        {{
            "name": "<skill>",
            "proficiency": "<beginner|intermediate|advanced>",
            "evidence": "<how demonstrated>"
        }}
    ],
    "linkedin_summary": "<first-person summary, ~150 words>"
}}"#,
        name = p.fellow_name,
        role = p.role,
        portfolio = or_missing(p.portfolio_url.as_deref(), "Not provided"),
        github = or_missing(p.github_url.as_deref(), "Not provided"),
        microship = p
            .microship_score
            .map(|s| format!("{s:.2}/4.0"))
            .unwrap_or_else(|| "n/a".into()),
        scores = scores,
        accomplishments = p.accomplishments.join("; "),
        themes = p.themes.join(", "),
    )
}

pub const MATCHING_SYSTEM: &str = "You match fellowship graduates with job opportunities. \
    Score fit objectively, name strengths and gaps honestly. Low fit is an acceptable answer.";

pub fn matching_prompt(p: &MatchPayload) -> String {
    let opportunities = p
        .opportunities
        .iter()
        .map(|o| {
            format!(
                "- id: {id}\n  {title} at {employer} ({level}, {location}{remote})\n  \
                 Requirements: {reqs}\n  Preferred: {preferred}",
                id = o.id,
                title = o.title,
                employer = o.employer_name,
                level = o.experience_level.as_deref().unwrap_or("any level"),
                location = o.location.as_deref().unwrap_or("location n/a"),
                remote = if o.remote_ok { ", remote ok" } else { "" },
                reqs = o.requirements.join(", "),
                preferred = o.preferred_skills.join(", "),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Match this fellow with the opportunities below.

## Fellow
- Name: {name}
- Role: {role}
- Headline: {headline}
- Summary: {summary}
- Skills: {skills}

## Opportunities ({count})
{opportunities}

## Output
{{
    "matches": [
        {{
            "opportunity_id": "<id exactly as listed above>",
            "match_score": <0-100>,
            "reasoning": "<why this score>",
            "strengths": ["<what makes them a fit>"],
            "gaps": ["<what they are missing>"]
        }}
    ]
}}

Return one entry per opportunity. {range}"#,
        name = p.fellow_name,
        role = p.role,
        headline = p.profile.headline,
        summary = p.profile.summary,
        skills = p.profile.skills.join(", "),
        count = p.opportunities.len(),
        opportunities = opportunities,
        range = RANGE_INSTRUCTION,
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Warnings
// ────────────────────────────────────────────────────────────────────────────

pub const FIRST_WARNING_SYSTEM: &str = "You are an empathetic program manager drafting a \
    FIRST warning to a fellow. Be supportive and constructive, specific about observable \
    concerns, clear about 2-4 measurable requirements with a 1-2 week timeline, and \
    express confidence that they can course-correct. Avoid generic language and \
    comparisons to other fellows.";

pub const FINAL_WARNING_SYSTEM: &str = "You are a program manager drafting a FINAL warning \
    to a fellow who has already received one. Be firm and professional, state that further \
    issues lead to a removal review, list specific requirements with a one-week timeline, \
    and still offer support.";

pub fn warning_system(warning_number: i32) -> &'static str {
    if warning_number <= 1 {
        FIRST_WARNING_SYSTEM
    } else {
        FINAL_WARNING_SYSTEM
    }
}

pub fn warning_prompt(p: &WarningPayload) -> String {
    let risk = match (p.risk_level, p.risk_score) {
        (Some(level), Some(score)) => format!("{level} ({score:.2})"),
        _ => "not assessed".to_string(),
    };
    format!(
        r#"Draft warning #{number} for this fellow.

## Fellow
- Name: {name}
- Role: {role}
- Current risk: {risk}

## Concerns
{concerns}

## Recent blockers
{blockers}

## Output
{{
    "message": "<the complete warning message>",
    "tone": "<short tone label>",
    "key_points": ["<2-4 main points>"],
    "requirements": ["<specific, measurable requirements>"],
    "timeline": "<review timeline>",
    "recommended_followup": "<next action for the program team>"
}}"#,
        number = p.warning_number,
        name = p.fellow_name,
        role = p.role,
        risk = risk,
        concerns = bullet_list(&p.concerns, "None recorded"),
        blockers = bullet_list(&p.recent_blockers, "None recorded"),
    )
}

fn bullet_list(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// System prompts are sent with the JSON-only suffix attached.
pub fn with_json_only(system: &str) -> String {
    format!("{system}\n\n{JSON_ONLY}")
}
