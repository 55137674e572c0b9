//! QTI assessment parsing into per-question problem records.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::{lookup, ContentParser, TextTree};
use crate::cartridge::ResourceType;
use crate::processors::ProcessingContext;
use crate::xml::{self, QtiItem, RespCondition, XmlElement};

#[derive(Error, Debug)]
pub enum QtiError {
    #[error("Unknown cc_profile: \"{0}\"")]
    UnknownProfile(String),

    #[error("{0} problems are not supported")]
    NotImplemented(QtiProfile),

    #[error("QTI item without ident")]
    MissingIdent,

    #[error("response label of problem {item} has no ident")]
    MissingResponseIdent { item: String },

    #[error("fill-in-the-blank problem {item} has no answers")]
    NoAnswers { item: String },

    #[error("problem {ident} has no {profile} data")]
    MissingProblemData { ident: String, profile: QtiProfile },
}

/// Question type grammar named by an item's `cc_profile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QtiProfile {
    MultipleChoice,
    MultipleResponse,
    FillInBlank,
    Essay,
    Boolean,
    PatternMatch,
}

impl QtiProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            QtiProfile::MultipleChoice => "cc.multiple_choice.v0p1",
            QtiProfile::MultipleResponse => "cc.multiple_response.v0p1",
            QtiProfile::FillInBlank => "cc.fib.v0p1",
            QtiProfile::Essay => "cc.essay.v0p1",
            QtiProfile::Boolean => "cc.true_false.v0p1",
            QtiProfile::PatternMatch => "cc.pattern_match.v0p1",
        }
    }
}

impl FromStr for QtiProfile {
    type Err = QtiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cc.multiple_choice.v0p1" => Ok(QtiProfile::MultipleChoice),
            "cc.multiple_response.v0p1" => Ok(QtiProfile::MultipleResponse),
            "cc.fib.v0p1" => Ok(QtiProfile::FillInBlank),
            "cc.essay.v0p1" => Ok(QtiProfile::Essay),
            "cc.true_false.v0p1" => Ok(QtiProfile::Boolean),
            "cc.pattern_match.v0p1" => Ok(QtiProfile::PatternMatch),
            other => Err(QtiError::UnknownProfile(other.to_string())),
        }
    }
}

impl fmt::Display for QtiProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One assessment item.
///
/// `data` stays `None` for recognized profiles that cannot be converted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Problem {
    pub ident: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub cc_profile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ProblemData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemData {
    Choice(ChoiceProblem),
    FillInBlank(FibProblem),
    Essay(EssayProblem),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceProblem {
    pub problem_description: String,
    /// Response label ident to choice, in presentation order.
    pub choices: IndexMap<String, Choice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub text: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FibProblem {
    pub problem_description: String,
    pub answer: String,
    pub additional_answers: Vec<String>,
    pub is_regexp: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EssayProblem {
    pub problem_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_fb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_fb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_incorrect_fb: Option<String>,
}

impl EssayProblem {
    pub fn has_feedback(&self) -> bool {
        self.general_fb.is_some()
            || self.correct_fb.is_some()
            || self.general_incorrect_fb.is_some()
    }
}

impl TextTree for Problem {
    fn visit_text(&mut self, visit: &mut dyn FnMut(&mut String)) {
        self.ident.visit_text(visit);
        self.title.visit_text(visit);
        self.cc_profile.visit_text(visit);
        match &mut self.data {
            Some(ProblemData::Choice(choice)) => {
                choice.problem_description.visit_text(visit);
                choice.choices.visit_text(visit);
            }
            Some(ProblemData::FillInBlank(fib)) => {
                fib.problem_description.visit_text(visit);
                fib.answer.visit_text(visit);
                fib.additional_answers.visit_text(visit);
            }
            Some(ProblemData::Essay(essay)) => {
                essay.problem_description.visit_text(visit);
                essay.sample_solution.visit_text(visit);
                essay.general_fb.visit_text(visit);
                essay.correct_fb.visit_text(visit);
                essay.general_incorrect_fb.visit_text(visit);
            }
            None => {}
        }
    }
}

impl TextTree for Choice {
    fn visit_text(&mut self, visit: &mut dyn FnMut(&mut String)) {
        self.text.visit_text(visit);
    }
}

/// Feedback kinds an essay may carry, in rubric order.
pub const ESSAY_FEEDBACK_TYPES: [&str; 3] = ["general_fb", "correct_fb", "general_incorrect_fb"];

pub struct QtiParser;

impl ContentParser for QtiParser {
    type Content = Vec<Problem>;

    fn parse(
        &self,
        idref: Option<&str>,
        cx: &mut ProcessingContext<'_>,
    ) -> anyhow::Result<Option<Self::Content>> {
        let Some(resource) = lookup(idref, cx.cartridge) else {
            return Ok(None);
        };
        if !resource.is(ResourceType::QtiAssessment) {
            return Ok(None);
        }
        let Some(resource_file) = resource.first_file() else {
            return Ok(None);
        };

        let path = cx.cartridge.build_resource_file_path(&resource_file.href);
        let root = xml::load(&path)?;
        Ok(Some(parse_qti(&root, &path)?))
    }
}

/// Parses every item of an assessment document, in document order.
pub fn parse_qti(root: &XmlElement, path: &Path) -> Result<Vec<Problem>, QtiError> {
    xml::items(root)
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_problem(item, index, path))
        .collect()
}

// Canvas exports may reuse one ident for several items, so the item position
// is always appended.
fn parse_problem(item: QtiItem<'_>, index: usize, path: &Path) -> Result<Problem, QtiError> {
    let raw_ident = item.ident().ok_or(QtiError::MissingIdent)?;
    let cc_profile = item.profile().unwrap_or_default();
    let profile: QtiProfile = cc_profile.parse()?;

    let title = item.title().filter(|title| !title.is_empty());
    let mut problem = Problem {
        ident: format!("{}{}", raw_ident, index),
        title: title.map(str::to_string),
        cc_profile,
        data: None,
    };

    match parse_problem_data(profile, item) {
        Ok(data) => problem.data = Some(data),
        Err(QtiError::NotImplemented(_)) => {
            info!("Problem with ID {} can't be converted.", raw_ident);
            info!("    Profile {} is not supported.", profile);
            info!("    At file {}.", path.display());
        }
        Err(err) => return Err(err),
    }

    Ok(problem)
}

fn parse_problem_data(profile: QtiProfile, item: QtiItem<'_>) -> Result<ProblemData, QtiError> {
    match profile {
        QtiProfile::MultipleChoice | QtiProfile::MultipleResponse | QtiProfile::Boolean => {
            parse_choice_problem(item).map(ProblemData::Choice)
        }
        QtiProfile::FillInBlank => parse_fib_problem(item).map(ProblemData::FillInBlank),
        QtiProfile::Essay => Ok(ProblemData::Essay(parse_essay_problem(item))),
        QtiProfile::PatternMatch => Err(QtiError::NotImplemented(profile)),
    }
}

fn parse_choice_problem(item: QtiItem<'_>) -> Result<ChoiceProblem, QtiError> {
    let item_id = || item.ident().unwrap_or_default().to_string();

    let labels = item
        .response_labels()
        .into_iter()
        .map(|label| {
            let ident = label
                .ident()
                .ok_or_else(|| QtiError::MissingResponseIdent { item: item_id() })?;
            Ok((ident.to_string(), label.text().unwrap_or_default()))
        })
        .collect::<Result<Vec<_>, QtiError>>()?;

    let correct = correct_response_idents(&item.respconditions());
    let choices = labels
        .into_iter()
        .map(|(ident, text)| {
            let choice = Choice {
                correct: correct.contains(&ident),
                text,
            };
            (ident, choice)
        })
        .collect();

    Ok(ChoiceProblem {
        problem_description: item.description().unwrap_or_default(),
        choices,
    })
}

/// Response idents named by the equality assertions of the scanned
/// conditions.
///
/// Nested `and`/`or` assertions are merged into one flat list and every
/// named ident counts as correct; no boolean evaluation takes place.
fn correct_response_idents(conditions: &[RespCondition<'_>]) -> HashSet<String> {
    let mut correct = HashSet::new();
    for condition in conditions {
        let mut answers = condition.varequals();
        if answers.is_empty() {
            answers = condition.and_varequals();
            answers.extend(condition.or_varequals());
        }
        correct.extend(answers);

        if condition.stops_scan() {
            break;
        }
    }
    correct
}

fn parse_fib_problem(item: QtiItem<'_>) -> Result<FibProblem, QtiError> {
    let mut exact_answers = Vec::new();
    let mut answer_patterns = Vec::new();
    for condition in item.respconditions() {
        exact_answers.extend(condition.varequals());
        answer_patterns.extend(condition.varsubstrings());

        if condition.stops_scan() {
            break;
        }
    }

    let is_regexp = !answer_patterns.is_empty();
    let mut answers = if is_regexp {
        answer_patterns
            .into_iter()
            .chain(exact_answers.iter().map(|answer| regex::escape(answer)))
            .collect::<Vec<_>>()
    } else {
        exact_answers
    };
    if answers.is_empty() {
        return Err(QtiError::NoAnswers {
            item: item.ident().unwrap_or_default().to_string(),
        });
    }
    let answer = answers.remove(0);

    Ok(FibProblem {
        problem_description: item.description().unwrap_or_default(),
        answer,
        additional_answers: answers,
        is_regexp,
    })
}

fn parse_essay_problem(item: QtiItem<'_>) -> EssayProblem {
    let mut essay = EssayProblem {
        problem_description: item.description().unwrap_or_default(),
        sample_solution: item.solution_text().filter(|text| !text.is_empty()),
        ..Default::default()
    };

    if item.has_itemfeedback() {
        let conditions = item.respconditions();
        let feedback_text = |feedback_type: &str| {
            conditions
                .first()
                .filter(|condition| condition.has_display_feedback(feedback_type))
                .and_then(|_| item.itemfeedback_text(feedback_type))
                .filter(|text| !text.is_empty())
        };
        essay.general_fb = feedback_text(ESSAY_FEEDBACK_TYPES[0]);
        essay.correct_fb = feedback_text(ESSAY_FEEDBACK_TYPES[1]);
        essay.general_incorrect_fb = feedback_text(ESSAY_FEEDBACK_TYPES[2]);
    }

    essay
}
