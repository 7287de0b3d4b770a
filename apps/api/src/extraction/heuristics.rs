//! Heuristic field extraction: pure Rust, deterministic, no network.
//!
//! Produces every key in `RESUME_FIELDS`; absent ones are `null`.

use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::Datelike;
use regex::Regex;

use super::{read_document, ExtractionError, ResumeExtractor};
use crate::models::record::{FieldValue, ParsedRecord};

static RE_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static RE_PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\+?\d[\d\s().-]{8,}\d").unwrap());
static RE_DEGREE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \b(?:Bachelor|Master)(?:'s)?\s+of\s+[A-Z][A-Za-z]*(?:\s+[A-Z][A-Za-z]*)*
        | \bPh\.?\s?D\b
        | \bMBA\b | \bMCA\b | \bBCA\b
        | \b[BM]\.\s?(?:Tech|Sc|E|S|A)\b\.?
        | \b[BM]Tech\b | \bBSc\b | \bMSc\b",
    )
    .unwrap()
});
static RE_YEAR_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b((?:19|20)\d{2})\s*(?:-|–|—|to)\s*((?:19|20)\d{2}|present|current|now)\b")
        .unwrap()
});
static RE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:engineer|developer|programmer|manager|analyst|intern|consultant|designer|architect|scientist|lead|director|administrator|specialist|officer|researcher|associate)\b",
    )
    .unwrap()
});
/// Separators between role and employer on one line: `Role, Company`, `Role at Company`,
/// `Role | Company`, `Role - Company`.
static RE_ROLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+at\s+|\s*[,|@]\s*|\s+[-–—]\s+").unwrap());
static RE_INSTITUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:university|college|institute|school of)\b").unwrap());

/// Section headings, lower-cased without trailing colon.
const EXPERIENCE_HEADINGS: &[&str] = &[
    "experience",
    "work experience",
    "professional experience",
    "employment history",
    "work history",
];
const OTHER_HEADINGS: &[&str] = &[
    "education",
    "skills",
    "technical skills",
    "projects",
    "certifications",
    "summary",
    "profile",
    "objective",
    "awards",
    "publications",
    "interests",
    "languages",
    "references",
];

/// Skill vocabulary: canonical name and whether matching is case-insensitive.
/// Short names that collide with English words match case-sensitively.
const SKILLS: &[(&str, bool)] = &[
    ("Go", false),
    ("Rust", false),
    ("Python", true),
    ("Java", true),
    ("JavaScript", true),
    ("TypeScript", true),
    ("C++", true),
    ("C#", true),
    ("Ruby", true),
    ("PHP", true),
    ("Kotlin", true),
    ("Swift", false),
    ("Scala", true),
    ("R", false),
    ("SQL", true),
    ("NoSQL", true),
    ("PostgreSQL", true),
    ("MySQL", true),
    ("MongoDB", true),
    ("Redis", true),
    ("Kafka", true),
    ("Docker", true),
    ("Kubernetes", true),
    ("Terraform", true),
    ("AWS", true),
    ("Azure", true),
    ("GCP", true),
    ("Linux", true),
    ("Git", true),
    ("HTML", true),
    ("CSS", true),
    ("React", true),
    ("Angular", true),
    ("Vue", true),
    ("Node.js", true),
    ("Django", true),
    ("Flask", true),
    ("Spring", false),
    ("Pandas", true),
    ("NumPy", true),
    ("TensorFlow", true),
    ("PyTorch", true),
    ("Machine Learning", true),
    ("Deep Learning", true),
    ("Data Analysis", true),
    ("Excel", true),
    ("Tableau", true),
    ("Power BI", true),
    ("Agile", true),
    ("Scrum", true),
    ("REST", false),
    ("GraphQL", true),
    ("Communication", true),
    ("Leadership", true),
];

static SKILL_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    SKILLS
        .iter()
        .map(|(name, insensitive)| {
            let flags = if *insensitive { "(?i)" } else { "" };
            let pattern = format!(
                r"{flags}(?:^|[^\w+#.]){}(?:$|[^\w+#])",
                regex::escape(name)
            );
            (*name, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// Pattern-based extractor over locally extracted document text.
pub struct HeuristicExtractor;

#[async_trait]
impl ResumeExtractor for HeuristicExtractor {
    async fn extract(&self, path: &Path) -> Result<ParsedRecord, ExtractionError> {
        let document = read_document(path).await?;
        Ok(extract_fields(&document.text, document.pages))
    }

    fn backend(&self) -> &'static str {
        "heuristic"
    }
}

/// Extracts the known fields from resume text. `pages` is the document's page count.
pub fn extract_fields(text: &str, pages: Option<u32>) -> ParsedRecord {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let experience = section_lines(&lines, EXPERIENCE_HEADINGS);
    let current_year = chrono::Utc::now().year();
    let (designations, companies) = find_roles(&experience);

    ParsedRecord::new()
        .with("name", optional_text(find_name(&lines)))
        .with(
            "email",
            optional_text(RE_EMAIL.find(text).map(|m| m.as_str().to_string())),
        )
        .with("mobile_number", optional_text(find_phone(text)))
        .with("skills", optional_list(find_skills(text)))
        .with("college_name", optional_list(find_institutions(&lines)))
        .with("degree", optional_list(find_degrees(text)))
        .with("designation", optional_list(designations))
        .with(
            "experience",
            optional_list(experience.iter().map(|l| l.to_string()).collect()),
        )
        .with("company_names", optional_list(companies))
        .with(
            "no_of_pages",
            pages.map(FieldValue::number).unwrap_or(FieldValue::Missing),
        )
        .with(
            "total_experience",
            total_experience_years(&experience, current_year)
                .map(FieldValue::number)
                .unwrap_or(FieldValue::Missing),
        )
}

fn optional_text(value: Option<String>) -> FieldValue {
    value.map(FieldValue::text).unwrap_or(FieldValue::Missing)
}

fn optional_list(items: Vec<String>) -> FieldValue {
    if items.is_empty() {
        FieldValue::Missing
    } else {
        FieldValue::list(items)
    }
}

fn normalize_heading(line: &str) -> String {
    line.trim_end_matches(':').trim().to_lowercase()
}

fn is_heading(line: &str) -> bool {
    let normalized = normalize_heading(line);
    EXPERIENCE_HEADINGS
        .iter()
        .chain(OTHER_HEADINGS)
        .any(|h| *h == normalized)
}

/// Name: the first of the leading lines that reads as 2–4 capitalized words.
fn find_name(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .take(5)
        .find(|line| {
            let words: Vec<&str> = line.split_whitespace().collect();
            (2..=4).contains(&words.len())
                && !is_heading(line)
                && !line.to_lowercase().contains("resume")
                && !line.to_lowercase().contains("curriculum")
                && words.iter().all(|w| {
                    w.chars().next().is_some_and(char::is_uppercase)
                        && w.chars()
                            .all(|c| c.is_alphabetic() || matches!(c, '.' | '\'' | '-'))
                })
        })
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// First digit run with 10–15 digits, which excludes dates and year ranges.
fn find_phone(text: &str) -> Option<String> {
    RE_PHONE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .find(|candidate| {
            let digits = candidate.chars().filter(char::is_ascii_digit).count();
            (10..=15).contains(&digits)
        })
}

/// Skills in order of first appearance in the text.
fn find_skills(text: &str) -> Vec<String> {
    let mut found: Vec<(usize, &str)> = SKILL_PATTERNS
        .iter()
        .filter_map(|(name, re)| re.find(text).map(|m| (m.start(), *name)))
        .collect();
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, name)| name.to_string()).collect()
}

fn find_degrees(text: &str) -> Vec<String> {
    let mut degrees: Vec<String> = Vec::new();
    for m in RE_DEGREE.find_iter(text) {
        let degree = m.as_str().trim().to_string();
        if !degrees.contains(&degree) {
            degrees.push(degree);
        }
    }
    degrees
}

fn find_institutions(lines: &[&str]) -> Vec<String> {
    let mut institutions: Vec<String> = Vec::new();
    for line in lines.iter().filter(|l| RE_INSTITUTION.is_match(l) && !is_heading(l)) {
        let line = line.to_string();
        if !institutions.contains(&line) {
            institutions.push(line);
        }
    }
    institutions
}

/// Job titles and employers from experience lines shaped like `Title, Company  2019 - 2023`.
/// Lines without a recognisable title are descriptions and are skipped.
fn find_roles(experience: &[&str]) -> (Vec<String>, Vec<String>) {
    let mut designations: Vec<String> = Vec::new();
    let mut companies: Vec<String> = Vec::new();
    for line in experience {
        let without_dates = RE_YEAR_RANGE.replace_all(line, "");
        let parts: Vec<&str> = RE_ROLE_SEPARATOR
            .split(without_dates.trim())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        let Some(title_at) = parts.iter().position(|p| RE_TITLE.is_match(p)) else {
            continue;
        };
        push_unique(&mut designations, parts[title_at]);
        if let Some(company) = parts
            .iter()
            .enumerate()
            .find(|(i, p)| *i != title_at && !RE_TITLE.is_match(p))
            .map(|(_, p)| *p)
        {
            push_unique(&mut companies, company);
        }
    }
    (designations, companies)
}

fn push_unique(items: &mut Vec<String>, item: &str) {
    if !items.iter().any(|existing| existing == item) {
        items.push(item.to_string());
    }
}

/// Lines between a heading from `headings` and the next recognised heading.
fn section_lines<'a>(lines: &[&'a str], headings: &[&str]) -> Vec<&'a str> {
    let Some(start) = lines
        .iter()
        .position(|l| headings.contains(&normalize_heading(l).as_str()))
    else {
        return Vec::new();
    };
    lines[start + 1..]
        .iter()
        .take_while(|l| !is_heading(l))
        .copied()
        .collect()
}

/// Sum of `YYYY - YYYY|present` ranges in whole years; `None` when no range is found.
fn total_experience_years(lines: &[&str], current_year: i32) -> Option<i64> {
    let mut total = 0i64;
    let mut found = false;
    for line in lines {
        for caps in RE_YEAR_RANGE.captures_iter(line) {
            let Ok(start) = caps[1].parse::<i64>() else {
                continue;
            };
            let end = caps[2].parse::<i64>().unwrap_or(i64::from(current_year));
            if end >= start {
                total += end - start;
                found = true;
            }
        }
    }
    found.then_some(total)
}
